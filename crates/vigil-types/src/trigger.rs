//! Trigger definition schema.
//!
//! A [`TriggerDef`] pairs a text pattern with an action and an
//! action-specific settings table. Definitions are plain data; pattern
//! compilation happens once at load time in `vigil-trigger`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Temporal semantics of a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// Evaluated only against newly arrived text; fires once per match
    /// occurrence, no memory across calls.
    Transient,
    /// Evaluated against the rolling window of recent output; fires on
    /// presence state transitions, not per chunk.
    Persistent,
}

impl std::fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerMode::Transient => write!(f, "transient"),
            TriggerMode::Persistent => write!(f, "persistent"),
        }
    }
}

/// Action-specific settings attached to a trigger (`template`, `url`,
/// `sound`, `on_disappear`, `keys`, ...). Keys an action does not know
/// are ignored by that action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionConfig(pub BTreeMap<String, toml::Value>);

impl ActionConfig {
    /// Look up a string-valued setting.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_str())
    }

    /// Look up a boolean setting.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(|v| v.as_bool())
    }

    /// Insert a string setting (used when assembling built-in triggers).
    pub fn set_str(&mut self, key: &str, value: &str) {
        self.0
            .insert(key.to_string(), toml::Value::String(value.to_string()));
    }

    /// Insert a boolean setting.
    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.0.insert(key.to_string(), toml::Value::Boolean(value));
    }
}

/// A single trigger definition as it appears in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDef {
    /// Unique name within a merged trigger set.
    pub name: String,
    /// Pattern source with optional named capture groups.
    pub pattern: String,
    /// Transient or persistent evaluation.
    pub mode: TriggerMode,
    /// Name of the action handler to invoke on a match.
    pub action: String,
    /// Disabled triggers stay in the catalog but never evaluate.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Whether this definition ships with Vigil (as opposed to coming
    /// from the user's catalog file).
    #[serde(default)]
    pub builtin: bool,
    /// Settings forwarded to the action handler.
    #[serde(default)]
    pub action_config: ActionConfig,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_def_toml_roundtrip() {
        let toml_src = r#"
            name = "quoted-say"
            pattern = 'say "(?P<text>[^"]+)"'
            mode = "transient"
            action = "speech"

            [action_config]
            template = "{text}"
        "#;

        let def: TriggerDef = toml::from_str(toml_src).unwrap();
        assert_eq!(def.name, "quoted-say");
        assert_eq!(def.mode, TriggerMode::Transient);
        assert!(def.enabled, "enabled should default to true");
        assert!(!def.builtin, "builtin should default to false");
        assert_eq!(def.action_config.get_str("template"), Some("{text}"));

        let back: TriggerDef = toml::from_str(&toml::to_string(&def).unwrap()).unwrap();
        assert_eq!(back, def);
    }

    #[test]
    fn mode_parses_lowercase() {
        let def: TriggerDef = toml::from_str(
            r#"
            name = "block"
            pattern = "x"
            mode = "persistent"
            action = "broadcast"
        "#,
        )
        .unwrap();
        assert_eq!(def.mode, TriggerMode::Persistent);
    }

    #[test]
    fn action_config_typed_getters() {
        let mut config = ActionConfig::default();
        config.set_str("url", "https://example.com/hook");
        config.set_bool("on_disappear", true);

        assert_eq!(config.get_str("url"), Some("https://example.com/hook"));
        assert_eq!(config.get_bool("on_disappear"), Some(true));
        assert_eq!(config.get_str("on_disappear"), None);
        assert_eq!(config.get_bool("missing"), None);
    }
}
