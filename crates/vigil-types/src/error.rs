//! Error types shared across all Vigil crates.

/// Errors that can occur across the Vigil engine.
///
/// Only `Config` and terminal stream conditions surface to the owning
/// process. Match timeouts and action failures are contained inside the
/// engine and reported through logging; their variants exist so contained
/// subsystems can describe what they swallowed.
#[derive(Debug, thiserror::Error)]
pub enum VigilError {
    /// Invalid trigger catalog, duplicate trigger names, or a trigger
    /// referencing an unregistered action. Raised at load time, never
    /// during stream processing.
    #[error("configuration error: {0}")]
    Config(String),

    /// The tmux session to watch does not exist.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Another watcher already owns the session's output redirection.
    #[error("session already being watched: {0}")]
    AlreadyWatching(String),

    /// The output stream failed or closed unexpectedly. Terminal for the
    /// watcher; never auto-retried.
    #[error("stream error: {0}")]
    Stream(String),

    /// A trigger's pattern evaluation exceeded its per-chunk time budget.
    /// Degrades to skipping that trigger for that one chunk.
    #[error("pattern evaluation for trigger {trigger:?} over budget ({elapsed_ms}ms > {budget_ms}ms)")]
    MatchTimeout {
        trigger: String,
        elapsed_ms: u64,
        budget_ms: u64,
    },

    /// An action handler failed. Isolated to that single dispatch.
    #[error("action error: {0}")]
    Action(String),
}
