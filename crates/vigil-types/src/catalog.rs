//! Trigger catalog loading and per-session override merge.
//!
//! The catalog is read once at watcher start; configuration changes
//! require a restart, not a hot swap. Merge order for a session is:
//! built-in triggers, replaced by name with file-level globals, replaced
//! by name with that session's overrides. An override fully replaces the
//! matching entry -- there is no field-level merge.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ActionConfig, TriggerDef, TriggerMode, VigilError, WatchConfig};

/// Per-session trigger overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionOverride {
    /// Definitions replacing (by name) or extending the global set for
    /// one session.
    #[serde(default, rename = "trigger")]
    pub triggers: Vec<TriggerDef>,
}

/// The full trigger configuration: global definitions, per-session
/// overrides, and watcher tuning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerCatalog {
    /// Global trigger definitions.
    #[serde(default, rename = "trigger")]
    pub triggers: Vec<TriggerDef>,

    /// Overrides keyed by session id.
    #[serde(default)]
    pub session_overrides: BTreeMap<String, SessionOverride>,

    /// Watcher and engine settings.
    #[serde(default)]
    pub watch: WatchConfig,
}

impl TriggerCatalog {
    /// Parse a catalog from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, VigilError> {
        let catalog: Self =
            toml::from_str(content).map_err(|e| VigilError::Config(e.to_string()))?;
        validate_unique(&catalog.triggers, "global")?;
        for (session, overrides) in &catalog.session_overrides {
            validate_unique(&overrides.triggers, session)?;
        }
        Ok(catalog)
    }

    /// Load a catalog from a TOML file.
    pub fn load(path: &Path) -> Result<Self, VigilError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VigilError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Resolve the effective trigger list for one session.
    ///
    /// Starts from the built-in set, then applies global definitions,
    /// then that session's overrides. Replacement is by name and always
    /// whole-record. Other sessions are unaffected by an override.
    pub fn triggers_for(&self, session: &str) -> Vec<TriggerDef> {
        let mut merged = builtin_triggers();
        apply_layer(&mut merged, &self.triggers);
        if let Some(overrides) = self.session_overrides.get(session) {
            apply_layer(&mut merged, &overrides.triggers);
        }
        merged
    }
}

/// Replace entries in `base` by name, appending entries with new names.
fn apply_layer(base: &mut Vec<TriggerDef>, layer: &[TriggerDef]) {
    for def in layer {
        match base.iter_mut().find(|t| t.name == def.name) {
            Some(existing) => {
                debug!(
                    trigger = %def.name,
                    was_builtin = existing.builtin,
                    "trigger definition replaced by later layer"
                );
                *existing = def.clone();
            }
            None => base.push(def.clone()),
        }
    }
}

/// Duplicate names within a single definition list are a config error.
fn validate_unique(defs: &[TriggerDef], scope: &str) -> Result<(), VigilError> {
    let mut seen = HashSet::new();
    for def in defs {
        if !seen.insert(def.name.as_str()) {
            return Err(VigilError::Config(format!(
                "duplicate trigger name {:?} in {scope} trigger list",
                def.name
            )));
        }
    }
    Ok(())
}

/// Trigger definitions that ship with Vigil.
///
/// Any of these can be replaced by name from the catalog file or a
/// session override.
pub fn builtin_triggers() -> Vec<TriggerDef> {
    let mut permission_config = ActionConfig::default();
    permission_config.set_str("template", "Agent in {session} is asking: {question}");

    let mut error_config = ActionConfig::default();
    error_config.set_str("template", "{session}: {message}");

    let mut working_config = ActionConfig::default();
    working_config.set_str("template", "{session} finished working");
    working_config.set_bool("on_disappear", true);

    vec![
        TriggerDef {
            name: "permission-prompt".into(),
            pattern: r"Do you want to (?P<question>[^?]+)\?".into(),
            mode: TriggerMode::Persistent,
            action: "speech".into(),
            enabled: true,
            builtin: true,
            action_config: permission_config,
        },
        TriggerDef {
            name: "error-line".into(),
            pattern: r"(?m)^\s*(?i:error)(?:\[\w+\])?: (?P<message>.+)$".into(),
            mode: TriggerMode::Transient,
            action: "notify".into(),
            enabled: true,
            builtin: true,
            action_config: error_config,
        },
        TriggerDef {
            name: "agent-working".into(),
            pattern: r"esc to interrupt".into(),
            mode: TriggerMode::Persistent,
            action: "broadcast".into(),
            enabled: true,
            builtin: true,
            action_config: working_config,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
        [watch]
        buffer_lines = 120

        [[trigger]]
        name = "quoted-say"
        pattern = 'say "(?P<text>[^"]+)"'
        mode = "transient"
        action = "speech"

        [[session_overrides.billing.trigger]]
        name = "quoted-say"
        pattern = 'announce "(?P<text>[^"]+)"'
        mode = "transient"
        action = "webhook"
        [session_overrides.billing.trigger.action_config]
        url = "https://example.com/hook"
    "#;

    #[test]
    fn parses_sample_catalog() {
        let catalog = TriggerCatalog::from_toml(SAMPLE).unwrap();
        assert_eq!(catalog.watch.buffer_lines, 120);
        assert_eq!(catalog.triggers.len(), 1);
        assert!(catalog.session_overrides.contains_key("billing"));
    }

    #[test]
    fn builtins_present_in_merged_set() {
        let catalog = TriggerCatalog::from_toml(SAMPLE).unwrap();
        let merged = catalog.triggers_for("some-session");
        assert!(merged.iter().any(|t| t.name == "permission-prompt" && t.builtin));
        assert!(merged.iter().any(|t| t.name == "quoted-say"));
    }

    #[test]
    fn override_fully_replaces_for_that_session_only() {
        let catalog = TriggerCatalog::from_toml(SAMPLE).unwrap();

        let billing = catalog.triggers_for("billing");
        let overridden = billing.iter().find(|t| t.name == "quoted-say").unwrap();
        assert_eq!(overridden.action, "webhook");
        assert!(overridden.pattern.starts_with("announce"));
        assert_eq!(
            overridden.action_config.get_str("url"),
            Some("https://example.com/hook")
        );
        // Full replacement: the global's template does not leak through.
        assert_eq!(overridden.action_config.get_str("template"), None);

        let other = catalog.triggers_for("other");
        let original = other.iter().find(|t| t.name == "quoted-say").unwrap();
        assert_eq!(original.action, "speech");
        assert!(original.pattern.starts_with("say"));
    }

    #[test]
    fn global_replaces_builtin_by_name() {
        let toml_src = r#"
            [[trigger]]
            name = "permission-prompt"
            pattern = "Allow\\?"
            mode = "transient"
            action = "notify"
        "#;
        let catalog = TriggerCatalog::from_toml(toml_src).unwrap();
        let merged = catalog.triggers_for("s");
        let replaced = merged.iter().find(|t| t.name == "permission-prompt").unwrap();
        assert_eq!(replaced.mode, TriggerMode::Transient);
        assert!(!replaced.builtin, "file definitions are not marked builtin");
        // Only one entry with that name survives the merge.
        assert_eq!(
            merged.iter().filter(|t| t.name == "permission-prompt").count(),
            1
        );
    }

    #[test]
    fn duplicate_names_rejected() {
        let toml_src = r#"
            [[trigger]]
            name = "dup"
            pattern = "a"
            mode = "transient"
            action = "notify"

            [[trigger]]
            name = "dup"
            pattern = "b"
            mode = "transient"
            action = "notify"
        "#;
        let err = TriggerCatalog::from_toml(toml_src).unwrap_err();
        assert!(matches!(err, VigilError::Config(_)));
        assert!(err.to_string().contains("dup"));
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = TriggerCatalog::from_toml("not [valid").unwrap_err();
        assert!(matches!(err, VigilError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let catalog = TriggerCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.triggers.len(), 1);
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let err = TriggerCatalog::load(Path::new("/nonexistent/vigil.toml")).unwrap_err();
        assert!(matches!(err, VigilError::Config(_)));
    }

    #[test]
    fn empty_catalog_still_has_builtins() {
        let catalog = TriggerCatalog::from_toml("").unwrap();
        let merged = catalog.triggers_for("s");
        assert_eq!(merged.len(), builtin_triggers().len());
    }
}
