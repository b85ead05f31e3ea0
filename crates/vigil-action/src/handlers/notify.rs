//! Desktop notifications.
//!
//! Shells out to the platform notifier: `osascript` on macOS,
//! `notify-send` elsewhere. The trigger's `title` setting overrides the
//! default summary line; the rendered template is the body.

use async_trait::async_trait;
use tokio::process::Command;

use crate::{ActionError, ActionHandler, ActionInvocation, ActionResult};

const DEFAULT_TITLE: &str = "Vigil";

/// Shows a desktop notification for the event.
pub struct NotifyHandler;

#[async_trait]
impl ActionHandler for NotifyHandler {
    fn name(&self) -> &str {
        "notify"
    }

    async fn invoke(&self, invocation: &ActionInvocation) -> ActionResult<()> {
        let title = invocation.config.get_str("title").unwrap_or(DEFAULT_TITLE);
        show(title, &invocation.rendered).await
    }
}

#[cfg(target_os = "macos")]
async fn show(title: &str, body: &str) -> ActionResult<()> {
    let script = format!(
        "display notification \"{}\" with title \"{}\"",
        escape_applescript(body),
        escape_applescript(title)
    );
    let status = Command::new("osascript")
        .args(["-e", &script])
        .status()
        .await?;
    if !status.success() {
        return Err(ActionError::Handler(format!(
            "osascript exited with {status}"
        )));
    }
    Ok(())
}

#[cfg(not(target_os = "macos"))]
async fn show(title: &str, body: &str) -> ActionResult<()> {
    let status = Command::new("notify-send")
        .args([title, body])
        .status()
        .await?;
    if !status.success() {
        return Err(ActionError::Handler(format!(
            "notify-send exited with {status}"
        )));
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(all(test, target_os = "macos"))]
mod tests {
    use super::*;

    #[test]
    fn applescript_quotes_are_escaped() {
        assert_eq!(escape_applescript(r#"say "hi""#), r#"say \"hi\""#);
    }
}
