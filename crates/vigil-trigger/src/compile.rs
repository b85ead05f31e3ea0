//! Trigger compilation: patterns are compiled exactly once at load time.
//!
//! An invalid pattern produces a load-time diagnostic and is excluded
//! from the active set; it never reaches evaluation. Valid triggers are
//! unaffected by a sibling's compile failure.

use regex::Regex;
use vigil_types::{ActionConfig, TriggerDef, TriggerMode};

/// A trigger with its pattern compiled. Immutable once built.
pub struct Trigger {
    pub name: String,
    pub regex: Regex,
    pub mode: TriggerMode,
    pub action: String,
    pub config: ActionConfig,
    pub enabled: bool,
    /// Whether a Present->Absent transition emits a disappear event.
    pub on_disappear: bool,
}

/// A load-time problem with one trigger definition.
#[derive(Debug, Clone)]
pub struct CompileDiagnostic {
    pub trigger: String,
    pub message: String,
}

impl std::fmt::Display for CompileDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "trigger {:?}: {}", self.trigger, self.message)
    }
}

/// The compiled, immutable set of triggers for a session.
///
/// Shared by reference (`Arc<TriggerSet>`) across the engine and the
/// dispatcher; nothing mutates it after compilation.
pub struct TriggerSet {
    triggers: Vec<Trigger>,
}

impl TriggerSet {
    /// Compile a definition list.
    ///
    /// Definitions whose pattern fails to compile are excluded and
    /// reported as diagnostics; everything else enters the active set.
    pub fn compile(defs: &[TriggerDef]) -> (Self, Vec<CompileDiagnostic>) {
        let mut triggers = Vec::with_capacity(defs.len());
        let mut diagnostics = Vec::new();

        for def in defs {
            match Regex::new(&def.pattern) {
                Ok(regex) => triggers.push(Trigger {
                    name: def.name.clone(),
                    regex,
                    mode: def.mode,
                    action: def.action.clone(),
                    config: def.action_config.clone(),
                    enabled: def.enabled,
                    on_disappear: def.action_config.get_bool("on_disappear").unwrap_or(false),
                }),
                Err(e) => {
                    tracing::warn!(
                        trigger = %def.name,
                        error = %e,
                        "invalid trigger pattern, excluding from active set"
                    );
                    diagnostics.push(CompileDiagnostic {
                        trigger: def.name.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        (Self { triggers }, diagnostics)
    }

    /// Look up a trigger by name.
    pub fn get(&self, name: &str) -> Option<&Trigger> {
        self.triggers.iter().find(|t| t.name == name)
    }

    /// All compiled triggers, enabled or not.
    pub fn iter(&self) -> impl Iterator<Item = &Trigger> {
        self.triggers.iter()
    }

    /// Enabled triggers only.
    pub fn enabled(&self) -> impl Iterator<Item = &Trigger> {
        self.triggers.iter().filter(|t| t.enabled)
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(name: &str, pattern: &str) -> TriggerDef {
        TriggerDef {
            name: name.into(),
            pattern: pattern.into(),
            mode: TriggerMode::Transient,
            action: "notify".into(),
            enabled: true,
            builtin: false,
            action_config: ActionConfig::default(),
        }
    }

    #[test]
    fn compiles_valid_patterns() {
        let (set, diags) = TriggerSet::compile(&[def("a", r"\d+"), def("b", "hello")]);
        assert_eq!(set.len(), 2);
        assert!(diags.is_empty());
        assert!(set.get("a").is_some());
        assert!(set.get("missing").is_none());
    }

    #[test]
    fn invalid_pattern_excluded_with_diagnostic() {
        let (set, diags) = TriggerSet::compile(&[def("bad", "[unclosed"), def("good", "ok")]);
        assert_eq!(set.len(), 1, "valid trigger still compiles");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].trigger, "bad");
        assert!(set.get("bad").is_none());
        assert!(set.get("good").is_some());
    }

    #[test]
    fn on_disappear_extracted_from_action_config() {
        let mut with_flag = def("block", "x");
        with_flag.action_config.set_bool("on_disappear", true);
        let (set, _) = TriggerSet::compile(&[with_flag, def("plain", "y")]);
        assert!(set.get("block").unwrap().on_disappear);
        assert!(!set.get("plain").unwrap().on_disappear);
    }

    #[test]
    fn enabled_filter_skips_disabled() {
        let mut disabled = def("off", "x");
        disabled.enabled = false;
        let (set, _) = TriggerSet::compile(&[disabled, def("on", "y")]);
        let enabled: Vec<_> = set.enabled().map(|t| t.name.as_str()).collect();
        assert_eq!(enabled, vec!["on"]);
        assert_eq!(set.len(), 2, "disabled triggers stay in the set");
    }
}
