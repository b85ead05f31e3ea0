//! Watcher and engine tuning knobs.

use serde::{Deserialize, Serialize};

/// Runtime settings for a session watcher and its trigger engine.
///
/// All fields have defaults so a catalog file can omit the `[watch]`
/// table entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Maximum complete lines retained by the rolling buffer.
    #[serde(default = "default_buffer_lines")]
    pub buffer_lines: usize,

    /// Per-trigger pattern evaluation budget per chunk, in milliseconds.
    #[serde(default = "default_match_budget_ms")]
    pub match_budget_ms: u64,

    /// How long the read loop blocks waiting for output before checking
    /// the stop flag, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How often the watcher verifies the session still exists, in
    /// milliseconds.
    #[serde(default = "default_liveness_interval_ms")]
    pub liveness_interval_ms: u64,
}

fn default_buffer_lines() -> usize {
    300
}

fn default_match_budget_ms() -> u64 {
    25
}

fn default_poll_interval_ms() -> u64 {
    200
}

fn default_liveness_interval_ms() -> u64 {
    1000
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            buffer_lines: default_buffer_lines(),
            match_budget_ms: default_match_budget_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            liveness_interval_ms: default_liveness_interval_ms(),
        }
    }
}
