//! Per-session watcher thread.
//!
//! One watcher owns one session's capture pipeline end to end: it
//! attaches `tmux pipe-pane` to a private FIFO, reads the FIFO
//! non-blocking on a poll loop, decodes and strips the bytes, runs the
//! trigger engine, and forwards match events to the dispatcher channel.
//! Stopping the watcher detaches the pipe and removes the FIFO; the
//! tmux session itself is never touched.

use std::os::fd::{AsFd, AsRawFd, FromRawFd, OwnedFd};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use nix::poll::{PollFd, PollFlags, PollTimeout};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use vigil_trigger::{EngineConfig, MatchEvent, TriggerEngine, TriggerSet};
use vigil_types::{VigilError, WatchConfig};

use crate::decode::StreamDecoder;
use crate::tmux;

/// Counters for one watcher's lifetime.
#[derive(Debug, Clone, Default)]
pub struct WatcherStats {
    /// Decoded chunks handed to the trigger engine.
    pub chunks: u64,
    /// Raw bytes read from the FIFO.
    pub bytes: u64,
    /// Match events forwarded to the dispatcher.
    pub events: u64,
    /// Trigger evaluations skipped for exceeding the match budget.
    pub match_timeouts: u64,
}

/// Lifecycle notices emitted by the watcher thread.
#[derive(Debug, Clone)]
pub enum WatcherEvent {
    /// The tmux session disappeared while being watched.
    SessionEnded,
    /// The FIFO read failed; the watcher is shutting down.
    StreamError(String),
    /// The watcher thread finished, cleanly or not.
    Stopped { stats: WatcherStats },
}

/// Watches one tmux session until stopped or the session ends.
pub struct SessionWatcher {
    session_id: String,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<WatcherStats>>,
}

impl SessionWatcher {
    /// Attach to a session and start the watcher thread.
    ///
    /// Fails with [`VigilError::SessionNotFound`] if the session does
    /// not exist, and with [`VigilError::AlreadyWatching`] if another
    /// live watcher already holds the pane's pipe. A pipe left behind
    /// by a dead watcher is detached once and acquisition retried.
    pub fn start(
        session_id: &str,
        set: Arc<TriggerSet>,
        config: &WatchConfig,
        match_tx: UnboundedSender<MatchEvent>,
        event_tx: Option<mpsc::Sender<WatcherEvent>>,
    ) -> Result<Self, VigilError> {
        if !tmux::has_session(session_id)? {
            return Err(VigilError::SessionNotFound(session_id.to_string()));
        }

        let fifo = fifo_path(session_id);

        if tmux::pane_pipe_active(session_id)? {
            if fifo_has_reader(&fifo) {
                return Err(VigilError::AlreadyWatching(session_id.to_string()));
            }
            // Pipe attached but nobody reading: a previous watcher died
            // without detaching. Clean up once and re-check.
            info!(session = %session_id, "detaching stale pipe-pane");
            tmux::pipe_pane_close(session_id)?;
            if tmux::pane_pipe_active(session_id)? {
                return Err(VigilError::AlreadyWatching(session_id.to_string()));
            }
        }

        let _ = std::fs::remove_file(&fifo);
        nix::unistd::mkfifo(&fifo, nix::sys::stat::Mode::from_bits_truncate(0o600))
            .map_err(|e| VigilError::Stream(format!("mkfifo failed: {e}")))?;

        // O_RDONLY | O_NONBLOCK so open() doesn't block waiting for a writer.
        let raw_fd = nix::fcntl::open(
            &fifo,
            nix::fcntl::OFlag::O_RDONLY | nix::fcntl::OFlag::O_NONBLOCK,
            nix::sys::stat::Mode::empty(),
        )
        .map_err(|e| {
            let _ = std::fs::remove_file(&fifo);
            VigilError::Stream(format!("open pipe failed: {e}"))
        })?;
        let pipe_fd = unsafe { OwnedFd::from_raw_fd(raw_fd) };

        if let Err(e) = tmux::pipe_pane_open(session_id, &fifo) {
            let _ = std::fs::remove_file(&fifo);
            return Err(e);
        }

        info!(session = %session_id, fifo = %fifo.display(), "watcher attached");

        let stop = Arc::new(AtomicBool::new(false));
        let worker = WatcherWorker {
            session_id: session_id.to_string(),
            fifo,
            pipe_fd,
            decoder: StreamDecoder::new(),
            engine: TriggerEngine::new(set, session_id, EngineConfig::from_watch(config)),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            liveness_interval: Duration::from_millis(config.liveness_interval_ms),
            stop: Arc::clone(&stop),
            match_tx,
            event_tx,
        };

        let thread_name = format!("vigil-watch-{session_id}");
        let handle = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || worker.run())
            .map_err(|e| VigilError::Stream(format!("spawn watcher thread: {e}")))?;

        Ok(Self {
            session_id: session_id.to_string(),
            stop,
            handle: Some(handle),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Whether the watcher thread is still running.
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the watcher thread to stop and wait for it to finish.
    ///
    /// Idempotent; returns the final stats on the first call.
    pub fn stop(&mut self) -> Option<WatcherStats> {
        self.stop.store(true, Ordering::SeqCst);
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(stats) => Some(stats),
            Err(_) => {
                warn!(session = %self.session_id, "watcher thread panicked");
                None
            }
        }
    }
}

impl Drop for SessionWatcher {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// State owned by the watcher thread.
struct WatcherWorker {
    session_id: String,
    fifo: PathBuf,
    pipe_fd: OwnedFd,
    decoder: StreamDecoder,
    engine: TriggerEngine,
    poll_interval: Duration,
    liveness_interval: Duration,
    stop: Arc<AtomicBool>,
    match_tx: UnboundedSender<MatchEvent>,
    event_tx: Option<mpsc::Sender<WatcherEvent>>,
}

impl WatcherWorker {
    fn run(mut self) -> WatcherStats {
        let mut stats = WatcherStats::default();
        let mut buf = [0u8; 4096];
        let mut last_liveness = Instant::now();

        while !self.stop.load(Ordering::SeqCst) {
            match self.poll_readable() {
                Ok(true) => match self.read_pipe(&mut buf) {
                    Ok(0) => {}
                    Ok(n) => {
                        stats.bytes += n as u64;
                        let text = self.decoder.feed(&buf[..n]);
                        if !text.is_empty() {
                            stats.chunks += 1;
                            for event in self.engine.process(&text) {
                                stats.events += 1;
                                if self.match_tx.send(event).is_err() {
                                    debug!(session = %self.session_id, "dispatcher channel closed");
                                }
                            }
                        }
                    }
                    Err(e) => {
                        warn!(session = %self.session_id, error = %e, "pipe read failed");
                        self.notify(WatcherEvent::StreamError(e.to_string()));
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    warn!(session = %self.session_id, error = %e, "pipe poll failed");
                    self.notify(WatcherEvent::StreamError(e.to_string()));
                    break;
                }
            }

            if last_liveness.elapsed() >= self.liveness_interval {
                last_liveness = Instant::now();
                if !tmux::has_session(&self.session_id).unwrap_or(false) {
                    info!(session = %self.session_id, "session ended");
                    self.notify(WatcherEvent::SessionEnded);
                    break;
                }
            }
        }

        self.cleanup();
        stats.match_timeouts = self.engine.stats().match_timeouts;
        info!(
            session = %self.session_id,
            chunks = stats.chunks,
            events = stats.events,
            "watcher stopped"
        );
        self.notify(WatcherEvent::Stopped {
            stats: stats.clone(),
        });
        stats
    }

    fn poll_readable(&self) -> Result<bool, VigilError> {
        let borrowed = self.pipe_fd.as_fd();
        let mut poll_fd = [PollFd::new(borrowed, PollFlags::POLLIN)];
        let timeout = PollTimeout::try_from(self.poll_interval.as_millis().min(i32::MAX as u128) as u32)
            .unwrap_or(PollTimeout::MAX);

        match nix::poll::poll(&mut poll_fd, timeout) {
            Ok(0) => Ok(false),
            Ok(_) => {
                let revents = poll_fd[0].revents().unwrap_or(PollFlags::empty());
                Ok(revents.contains(PollFlags::POLLIN) || revents.contains(PollFlags::POLLHUP))
            }
            Err(nix::errno::Errno::EINTR) => Ok(false),
            Err(e) => Err(VigilError::Stream(format!("poll pipe: {e}"))),
        }
    }

    fn read_pipe(&self, buf: &mut [u8]) -> Result<usize, VigilError> {
        match nix::unistd::read(self.pipe_fd.as_raw_fd(), buf) {
            Ok(n) => Ok(n),
            Err(nix::errno::Errno::EAGAIN) => Ok(0),
            Err(nix::errno::Errno::EIO) => Ok(0),
            Err(e) => Err(VigilError::Stream(format!("pipe read: {e}"))),
        }
    }

    fn notify(&self, event: WatcherEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }

    /// Detach the pipe and remove the FIFO. The session keeps running.
    fn cleanup(&self) {
        if let Err(e) = tmux::pipe_pane_close(&self.session_id) {
            debug!(session = %self.session_id, error = %e, "pipe-pane detach failed");
        }
        let _ = std::fs::remove_file(&self.fifo);
    }
}

/// FIFO path for a session, under `$TMPDIR` (or `/tmp`).
fn fifo_path(session_id: &str) -> PathBuf {
    let dir = std::env::var("TMPDIR").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(dir).join(format!("vigil-{}.pipe", sanitize(session_id)))
}

/// Session names can contain characters unfit for filenames.
fn sanitize(session_id: &str) -> String {
    session_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            c
        } else {
            '-'
        })
        .collect()
}

/// Probe whether some process holds the FIFO's read end open.
///
/// Opening a FIFO write-only non-blocking fails with ENXIO when there
/// is no reader, which is exactly the stale-watcher case.
fn fifo_has_reader(fifo: &Path) -> bool {
    match nix::fcntl::open(
        fifo,
        nix::fcntl::OFlag::O_WRONLY | nix::fcntl::OFlag::O_NONBLOCK,
        nix::sys::stat::Mode::empty(),
    ) {
        Ok(raw_fd) => {
            let fd = unsafe { OwnedFd::from_raw_fd(raw_fd) };
            drop(fd);
            true
        }
        Err(_) => false,
    }
}
