//! Trigger matching for Vigil session output.
//!
//! Compiles trigger definitions into an immutable [`TriggerSet`], keeps
//! a bounded [`RollingBuffer`] of recent output per session, and runs
//! the [`TriggerEngine`] over each arriving chunk under two temporal
//! semantics: transient (per-occurrence, chunk-only) and persistent
//! (presence transitions over the buffer window).

mod buffer;
mod compile;
mod engine;
mod event;

pub use buffer::RollingBuffer;
pub use compile::{CompileDiagnostic, Trigger, TriggerSet};
pub use engine::{EngineConfig, EngineStats, TriggerEngine};
pub use event::{MatchEvent, MatchKind};
