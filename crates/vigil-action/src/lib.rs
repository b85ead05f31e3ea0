//! Side effects for Vigil match events.
//!
//! The [`ActionDispatcher`] consumes match events from the watcher
//! channel and invokes the handler named by the firing trigger. Every
//! dispatch runs as its own task: a slow or failing action never delays
//! stream processing or sibling actions. Handlers are registered in an
//! [`ActionRegistry`], which is validated against the trigger set at
//! startup so a trigger can never name an action that does not exist.

mod dispatcher;
pub mod handlers;
mod template;

pub use dispatcher::{ActionDispatcher, ActionRegistry, DispatcherHandle};
pub use template::{render, DEFAULT_TEMPLATE};

use async_trait::async_trait;
use vigil_trigger::MatchEvent;
use vigil_types::ActionConfig;

/// Errors produced by action handlers.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The handler itself failed (bad exit status, refused payload, ...).
    #[error("handler error: {0}")]
    Handler(String),

    /// A setting the handler requires is absent from the trigger's
    /// action config.
    #[error("missing action config key {0:?}")]
    MissingConfig(String),

    /// HTTP request failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Spawning or waiting on a helper process failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for handler results.
pub type ActionResult<T> = Result<T, ActionError>;

/// Everything a handler gets for one dispatch.
#[derive(Debug, Clone)]
pub struct ActionInvocation {
    /// The match event that fired the trigger.
    pub event: MatchEvent,
    /// The firing trigger's action settings.
    pub config: ActionConfig,
    /// The trigger's template rendered against the event.
    pub rendered: String,
}

/// A named side effect invoked when a trigger fires.
///
/// Implementations must tolerate concurrent invocations; the dispatcher
/// runs each dispatch on its own task. Handlers that need internal
/// ordering (speech) serialize themselves.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Registry name, referenced by triggers' `action` field.
    fn name(&self) -> &str;

    /// Perform the side effect for one event.
    async fn invoke(&self, invocation: &ActionInvocation) -> ActionResult<()>;
}
