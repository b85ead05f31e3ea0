//! In-process fan-out to UI subscribers.
//!
//! Publishes a [`UiNotice`] on a `tokio::sync::broadcast` channel.
//! Subscribers (a TUI, a status bar) attach with
//! [`BroadcastHandler::subscribe`]; having no subscriber is normal and
//! not an error. Slow subscribers lose old notices, never block the
//! dispatcher.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::{ActionHandler, ActionInvocation, ActionResult};

/// One notice published to UI subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct UiNotice {
    pub id: Uuid,
    pub session_id: String,
    pub trigger: String,
    pub kind: String,
    /// The rendered template.
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Publishes match events to in-process subscribers.
pub struct BroadcastHandler {
    tx: broadcast::Sender<UiNotice>,
}

impl BroadcastHandler {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Attach a new subscriber. Each subscriber sees every notice
    /// published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<UiNotice> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl ActionHandler for BroadcastHandler {
    fn name(&self) -> &str {
        "broadcast"
    }

    async fn invoke(&self, invocation: &ActionInvocation) -> ActionResult<()> {
        let notice = UiNotice {
            id: invocation.event.id,
            session_id: invocation.event.session_id.clone(),
            trigger: invocation.event.trigger_name.clone(),
            kind: invocation.event.kind.to_string(),
            text: invocation.rendered.clone(),
            timestamp: invocation.event.timestamp,
        };

        match self.tx.send(notice) {
            Ok(receivers) => debug!(receivers, "notice broadcast"),
            Err(_) => debug!("no broadcast subscribers, notice dropped"),
        }
        Ok(())
    }
}
