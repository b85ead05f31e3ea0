//! Webhook dispatch.
//!
//! POSTs a self-describing JSON payload to the URL configured on the
//! firing trigger. The payload carries a version field, the full match
//! event, and the rendered template as a pre-formatted `text` field for
//! direct use in chat messages.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use vigil_trigger::MatchEvent;

use crate::{ActionError, ActionHandler, ActionInvocation, ActionResult};

/// Top-level webhook payload.
#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    /// Payload schema version (currently "1").
    pub version: &'static str,
    /// Pre-formatted human-readable summary.
    pub text: &'a str,
    /// The match event that fired the trigger.
    pub event: &'a MatchEvent,
}

/// POSTs match events to the trigger's `url`.
pub struct WebhookHandler {
    client: reqwest::Client,
}

impl WebhookHandler {
    pub fn new() -> ActionResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ActionHandler for WebhookHandler {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn invoke(&self, invocation: &ActionInvocation) -> ActionResult<()> {
        let url = invocation
            .config
            .get_str("url")
            .ok_or_else(|| ActionError::MissingConfig("url".into()))?;

        let payload = WebhookPayload {
            version: "1",
            text: &invocation.rendered,
            event: &invocation.event,
        };

        let resp = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("User-Agent", "vigil-action/0.1")
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ActionError::Handler(format!(
                "webhook returned HTTP {}",
                resp.status().as_u16()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use vigil_trigger::MatchKind;
    use vigil_types::ActionConfig;

    #[test]
    fn payload_serializes_with_version_and_event() {
        let mut vars = HashMap::new();
        vars.insert("message".to_string(), "it broke".to_string());
        let event = MatchEvent::new(
            "error-line",
            MatchKind::Match,
            vars,
            "error: it broke".into(),
            "s1",
        );
        let payload = WebhookPayload {
            version: "1",
            text: "s1: it broke",
            event: &event,
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["version"], "1");
        assert_eq!(json["text"], "s1: it broke");
        assert_eq!(json["event"]["trigger_name"], "error-line");
        assert_eq!(json["event"]["variables"]["message"], "it broke");
    }

    #[tokio::test]
    async fn missing_url_is_a_config_error() {
        let handler = WebhookHandler::new().unwrap();
        let invocation = ActionInvocation {
            event: MatchEvent::new("t", MatchKind::Match, HashMap::new(), "x".into(), "s1"),
            config: ActionConfig::default(),
            rendered: "x".into(),
        };
        let err = handler.invoke(&invocation).await.unwrap_err();
        assert!(matches!(err, ActionError::MissingConfig(_)));
    }
}
