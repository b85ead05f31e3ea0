//! Synthetic input back into the watched session.
//!
//! Sends text to the event's own tmux session with `send-keys`. The
//! trigger's `keys` setting is the text to type (the rendered template
//! when absent); `enter` controls whether Enter follows, defaulting to
//! true. The tmux calls are blocking subprocesses, so they run on the
//! blocking pool.

use async_trait::async_trait;

use crate::{ActionError, ActionHandler, ActionInvocation, ActionResult};

/// Types text into the session that produced the match.
pub struct SendKeysHandler;

#[async_trait]
impl ActionHandler for SendKeysHandler {
    fn name(&self) -> &str {
        "send-keys"
    }

    async fn invoke(&self, invocation: &ActionInvocation) -> ActionResult<()> {
        let keys = invocation
            .config
            .get_str("keys")
            .map(str::to_string)
            .unwrap_or_else(|| invocation.rendered.clone());
        let press_enter = invocation.config.get_bool("enter").unwrap_or(true);
        let session = invocation.event.session_id.clone();

        tokio::task::spawn_blocking(move || {
            vigil_watch::tmux::send_keys(&session, &keys)?;
            if press_enter {
                vigil_watch::tmux::send_special(&session, "Enter")?;
            }
            Ok(())
        })
        .await
        .map_err(|e| ActionError::Handler(format!("send-keys task failed: {e}")))?
        .map_err(|e: vigil_types::VigilError| ActionError::Handler(e.to_string()))
    }
}
