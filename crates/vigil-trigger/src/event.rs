//! Match events produced by trigger evaluation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// How a trigger fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// A persistent trigger's pattern became present in the buffer.
    Appear,
    /// A persistent trigger's pattern left the buffer (emitted only when
    /// the trigger requests it).
    Disappear,
    /// A transient trigger matched a chunk occurrence.
    Match,
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchKind::Appear => write!(f, "appear"),
            MatchKind::Disappear => write!(f, "disappear"),
            MatchKind::Match => write!(f, "match"),
        }
    }
}

/// Result of a successful trigger evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct MatchEvent {
    /// Unique id for this event.
    pub id: Uuid,
    /// Name of the trigger that fired.
    pub trigger_name: String,
    /// Appear, disappear, or per-occurrence match.
    pub kind: MatchKind,
    /// Named capture groups extracted from the match. Empty for
    /// disappear events (the text is already gone).
    pub variables: HashMap<String, String>,
    /// Full text matched by the pattern. Empty for disappear events.
    pub matched_text: String,
    /// Session the output came from.
    pub session_id: String,
    /// When the engine observed the match.
    pub timestamp: DateTime<Utc>,
}

impl MatchEvent {
    pub fn new(
        trigger_name: &str,
        kind: MatchKind,
        variables: HashMap<String, String>,
        matched_text: String,
        session_id: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            trigger_name: trigger_name.to_string(),
            kind,
            variables,
            matched_text,
            session_id: session_id.to_string(),
            timestamp: Utc::now(),
        }
    }
}
