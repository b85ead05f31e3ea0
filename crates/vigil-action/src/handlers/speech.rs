//! Spoken announcements.
//!
//! Synthesis goes through a pluggable [`SpeechBackend`]; the default
//! backend POSTs to a local speech server. Utterances are serialized
//! through a mutex so overlapping matches never talk over each other,
//! even though each dispatch runs on its own task.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{ActionError, ActionHandler, ActionInvocation, ActionResult};

/// Longest utterance forwarded to a backend, in characters.
const MAX_UTTERANCE_CHARS: usize = 500;

/// Pluggable speech synthesis backend.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Speak one utterance, returning once playback is done (or the
    /// request was accepted, for fire-and-forget servers).
    async fn speak(&self, text: &str) -> ActionResult<()>;
}

/// Backend that POSTs utterances to a speech server as JSON.
pub struct HttpSpeechBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSpeechBackend {
    pub fn new(endpoint: &str) -> ActionResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl SpeechBackend for HttpSpeechBackend {
    async fn speak(&self, text: &str) -> ActionResult<()> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ActionError::Handler(format!(
                "speech server returned HTTP {}",
                resp.status().as_u16()
            )));
        }
        Ok(())
    }
}

/// Speaks the rendered template through the configured backend.
pub struct SpeechHandler {
    backend: Arc<dyn SpeechBackend>,
    /// Serializes utterances across concurrent dispatch tasks.
    order: Mutex<()>,
}

impl SpeechHandler {
    pub fn new(backend: Arc<dyn SpeechBackend>) -> Self {
        Self {
            backend,
            order: Mutex::new(()),
        }
    }
}

#[async_trait]
impl ActionHandler for SpeechHandler {
    fn name(&self) -> &str {
        "speech"
    }

    async fn invoke(&self, invocation: &ActionInvocation) -> ActionResult<()> {
        let text = sanitize_utterance(&invocation.rendered);
        if text.is_empty() {
            debug!(trigger = %invocation.event.trigger_name, "empty utterance, skipping");
            return Ok(());
        }

        let _guard = self.order.lock().await;
        self.backend.speak(&text).await
    }
}

/// Strip control characters, collapse the text to a bounded utterance.
fn sanitize_utterance(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .take(MAX_UTTERANCE_CHARS)
        .collect::<String>()
        .trim()
        .to_string()
}
