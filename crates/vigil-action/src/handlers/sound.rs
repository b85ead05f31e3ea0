//! Sound alerts.
//!
//! Plays a sound file through the platform player: `afplay` on macOS,
//! `paplay` elsewhere. The trigger's `sound` setting names the file;
//! without it a stock system sound is used.

use async_trait::async_trait;
use tokio::process::Command;

use crate::{ActionError, ActionHandler, ActionInvocation, ActionResult};

#[cfg(target_os = "macos")]
const DEFAULT_SOUND: &str = "/System/Library/Sounds/Glass.aiff";
#[cfg(not(target_os = "macos"))]
const DEFAULT_SOUND: &str = "/usr/share/sounds/freedesktop/stereo/complete.oga";

#[cfg(target_os = "macos")]
const PLAYER: &str = "afplay";
#[cfg(not(target_os = "macos"))]
const PLAYER: &str = "paplay";

/// Plays a sound file when the trigger fires.
pub struct SoundHandler;

#[async_trait]
impl ActionHandler for SoundHandler {
    fn name(&self) -> &str {
        "sound"
    }

    async fn invoke(&self, invocation: &ActionInvocation) -> ActionResult<()> {
        let sound = invocation.config.get_str("sound").unwrap_or(DEFAULT_SOUND);
        let status = Command::new(PLAYER).arg(sound).status().await?;
        if !status.success() {
            return Err(ActionError::Handler(format!(
                "{PLAYER} exited with {status}"
            )));
        }
        Ok(())
    }
}
