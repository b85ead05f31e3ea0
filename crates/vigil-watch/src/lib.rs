//! Session output acquisition for Vigil.
//!
//! Attaches to existing tmux sessions with `pipe-pane`, decodes the raw
//! byte stream (incremental UTF-8, stateful ANSI stripping), and drives
//! the trigger engine from a per-session watcher thread. Acquisition is
//! non-destructive: the session keeps running after the watcher detaches.

pub mod ansi;
pub mod decode;
pub mod tmux;
mod watcher;

pub use ansi::AnsiFilter;
pub use decode::{StreamDecoder, Utf8Decoder};
pub use watcher::{SessionWatcher, WatcherEvent, WatcherStats};
