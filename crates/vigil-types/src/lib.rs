//! Shared types for the Vigil trigger/action engine.
//!
//! Home of the error taxonomy, the trigger definition schema, the
//! catalog loader with its per-session override merge, and watcher
//! tuning knobs. Downstream crates (`vigil-trigger`, `vigil-watch`,
//! `vigil-action`) all build on these types.

mod catalog;
mod config;
mod error;
mod trigger;

pub use catalog::{builtin_triggers, SessionOverride, TriggerCatalog};
pub use config::WatchConfig;
pub use error::VigilError;
pub use trigger::{ActionConfig, TriggerDef, TriggerMode};
