//! Trigger evaluation over newly arrived chunks and the rolling buffer.
//!
//! `process()` is deterministic and strictly ordered: transient triggers
//! see the chunk, the chunk enters the buffer, persistent triggers see
//! the refreshed snapshot. All matching triggers fire independently;
//! there is no early exit after the first match. The only cross-call
//! state is the per-session presence map for persistent triggers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use regex::Captures;
use tracing::{debug, warn};
use vigil_types::{TriggerMode, VigilError, WatchConfig};

use crate::buffer::RollingBuffer;
use crate::compile::{Trigger, TriggerSet};
use crate::event::{MatchEvent, MatchKind};

/// Presence state of one persistent trigger for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Absent,
    Present,
}

/// Engine tuning derived from [`WatchConfig`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Rolling buffer cap in complete lines.
    pub buffer_lines: usize,
    /// Per-trigger evaluation budget per chunk.
    pub match_budget: Duration,
}

impl EngineConfig {
    pub fn from_watch(config: &WatchConfig) -> Self {
        Self {
            buffer_lines: config.buffer_lines,
            match_budget: Duration::from_millis(config.match_budget_ms),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_watch(&WatchConfig::default())
    }
}

/// Counters collected while processing a session's stream.
#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    /// Chunks passed through `process()`.
    pub chunks: u64,
    /// Match events emitted.
    pub events: u64,
    /// Trigger evaluations skipped for exceeding the match budget.
    pub match_timeouts: u64,
}

/// Applies the compiled trigger set to one session's output.
pub struct TriggerEngine {
    set: Arc<TriggerSet>,
    session_id: String,
    buffer: RollingBuffer,
    /// Presence per persistent trigger, created lazily on first
    /// evaluation and discarded with the engine.
    presence: HashMap<String, Presence>,
    budget: Duration,
    stats: EngineStats,
}

impl TriggerEngine {
    pub fn new(set: Arc<TriggerSet>, session_id: &str, config: EngineConfig) -> Self {
        Self {
            set,
            session_id: session_id.to_string(),
            buffer: RollingBuffer::new(config.buffer_lines),
            presence: HashMap::new(),
            budget: config.match_budget,
            stats: EngineStats::default(),
        }
    }

    /// Evaluate every enabled trigger against a newly arrived chunk.
    ///
    /// Transient triggers match the chunk only, once per non-overlapping
    /// occurrence, with no deduplication across calls: the stream's own
    /// progression is the uniqueness boundary. Persistent triggers match
    /// the refreshed buffer snapshot and fire on presence transitions.
    pub fn process(&mut self, chunk: &str) -> Vec<MatchEvent> {
        self.stats.chunks += 1;
        let mut events = Vec::new();
        let set = Arc::clone(&self.set);

        for trigger in set.enabled().filter(|t| t.mode == TriggerMode::Transient) {
            let started = Instant::now();
            let mut found = Vec::new();
            for caps in trigger.regex.captures_iter(chunk) {
                found.push(self.event_from_captures(trigger, MatchKind::Match, &caps));
            }
            if self.over_budget(trigger, started) {
                continue;
            }
            events.extend(found);
        }

        self.buffer.append(chunk);

        let snapshot = self.buffer.snapshot();
        for trigger in set.enabled().filter(|t| t.mode == TriggerMode::Persistent) {
            let started = Instant::now();
            let captured = trigger
                .regex
                .captures(&snapshot)
                .map(|caps| self.event_from_captures(trigger, MatchKind::Appear, &caps));
            if self.over_budget(trigger, started) {
                continue;
            }

            let state = self
                .presence
                .entry(trigger.name.clone())
                .or_insert(Presence::Absent);
            match (*state, captured) {
                (Presence::Absent, Some(event)) => {
                    *state = Presence::Present;
                    debug!(trigger = %trigger.name, session = %self.session_id, "persistent trigger appeared");
                    events.push(event);
                }
                (Presence::Present, None) => {
                    *state = Presence::Absent;
                    if trigger.on_disappear {
                        debug!(trigger = %trigger.name, session = %self.session_id, "persistent trigger disappeared");
                        events.push(MatchEvent::new(
                            &trigger.name,
                            MatchKind::Disappear,
                            HashMap::new(),
                            String::new(),
                            &self.session_id,
                        ));
                    }
                }
                // Still present, or still absent: no transition, no event.
                (Presence::Present, Some(_)) | (Presence::Absent, None) => {}
            }
        }

        self.stats.events += events.len() as u64;
        events
    }

    /// Stats snapshot for the owning watcher.
    pub fn stats(&self) -> EngineStats {
        self.stats.clone()
    }

    /// Current buffer line count, for tests and diagnostics.
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Budget check run after each trigger's evaluation. The regex crate
    /// guarantees linear-time matching, so a cooperative post-hoc check
    /// bounds the damage to one trigger for one chunk; we do not attempt
    /// preemptive cancellation.
    fn over_budget(&mut self, trigger: &Trigger, started: Instant) -> bool {
        let elapsed = started.elapsed();
        if elapsed > self.budget {
            self.stats.match_timeouts += 1;
            let timeout = VigilError::MatchTimeout {
                trigger: trigger.name.clone(),
                elapsed_ms: elapsed.as_millis() as u64,
                budget_ms: self.budget.as_millis() as u64,
            };
            warn!(
                session = %self.session_id,
                error = %timeout,
                "skipping trigger for this chunk"
            );
            true
        } else {
            false
        }
    }

    fn event_from_captures(
        &self,
        trigger: &Trigger,
        kind: MatchKind,
        caps: &Captures<'_>,
    ) -> MatchEvent {
        let mut variables = HashMap::new();
        for name in trigger.regex.capture_names().flatten() {
            if let Some(m) = caps.name(name) {
                variables.insert(name.to_string(), m.as_str().to_string());
            }
        }
        let matched_text = caps
            .get(0)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        MatchEvent::new(&trigger.name, kind, variables, matched_text, &self.session_id)
    }
}
