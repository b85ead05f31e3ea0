//! Built-in action handlers.

mod broadcast;
mod keys;
mod notify;
mod sound;
mod speech;
mod webhook;

pub use broadcast::{BroadcastHandler, UiNotice};
pub use keys::SendKeysHandler;
pub use notify::NotifyHandler;
pub use sound::SoundHandler;
pub use speech::{HttpSpeechBackend, SpeechBackend, SpeechHandler};
pub use webhook::{WebhookHandler, WebhookPayload};

use std::sync::Arc;

use crate::{ActionRegistry, ActionResult};

/// Capacity of the UI broadcast channel.
const BROADCAST_CAPACITY: usize = 64;

/// Assemble a registry with every built-in handler.
///
/// Returns the registry plus the broadcast handler so callers can
/// attach UI subscribers via [`BroadcastHandler::subscribe`].
pub fn builtin_registry(
    speech_backend: Arc<dyn SpeechBackend>,
) -> ActionResult<(ActionRegistry, Arc<BroadcastHandler>)> {
    let broadcast = Arc::new(BroadcastHandler::new(BROADCAST_CAPACITY));

    let mut registry = ActionRegistry::new();
    registry.register(Arc::new(SpeechHandler::new(speech_backend)));
    registry.register(Arc::new(WebhookHandler::new()?));
    registry.register(Arc::new(NotifyHandler));
    registry.register(Arc::new(SoundHandler));
    registry.register(Arc::new(SendKeysHandler));
    registry.register(Arc::clone(&broadcast) as Arc<dyn crate::ActionHandler>);

    Ok((registry, broadcast))
}
