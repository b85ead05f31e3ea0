//! Message templates rendered against match events.
//!
//! Templates substitute `{name}` placeholders from the event's named
//! captures, plus a few event-level values (`{session}`, `{trigger}`,
//! `{kind}`, `{matched}`, `{timestamp}`). A capture variable shadows an
//! event-level name. Unknown placeholders are left intact so a typo is
//! visible in the output instead of silently vanishing.

use vigil_trigger::MatchEvent;

/// Template used when a trigger configures none.
pub const DEFAULT_TEMPLATE: &str = "{matched}";

/// Render a template against one event.
pub fn render(template: &str, event: &MatchEvent) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match lookup(key, event) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            // Unclosed brace: emit the tail as-is.
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

fn lookup(key: &str, event: &MatchEvent) -> Option<String> {
    if let Some(value) = event.variables.get(key) {
        return Some(value.clone());
    }
    match key {
        "session" => Some(event.session_id.clone()),
        "trigger" => Some(event.trigger_name.clone()),
        "kind" => Some(event.kind.to_string()),
        "matched" => Some(event.matched_text.clone()),
        "timestamp" => Some(event.timestamp.to_rfc3339()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use vigil_trigger::MatchKind;

    fn event_with(vars: &[(&str, &str)]) -> MatchEvent {
        let variables: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        MatchEvent::new("prompt", MatchKind::Match, variables, "raw match".into(), "s1")
    }

    #[test]
    fn substitutes_capture_variables() {
        let event = event_with(&[("text", "hello")]);
        assert_eq!(render("say {text}!", &event), "say hello!");
    }

    #[test]
    fn substitutes_event_fields() {
        let event = event_with(&[]);
        assert_eq!(
            render("[{session}] {trigger}: {matched}", &event),
            "[s1] prompt: raw match"
        );
        assert_eq!(render("{kind}", &event), "match");
    }

    #[test]
    fn capture_shadows_event_field() {
        let event = event_with(&[("session", "from-capture")]);
        assert_eq!(render("{session}", &event), "from-capture");
    }

    #[test]
    fn unknown_placeholder_left_intact() {
        let event = event_with(&[]);
        assert_eq!(render("x {nope} y", &event), "x {nope} y");
    }

    #[test]
    fn unclosed_brace_passes_through() {
        let event = event_with(&[]);
        assert_eq!(render("tail {matched", &event), "tail {matched");
    }

    #[test]
    fn default_template_is_matched_text() {
        let event = event_with(&[]);
        assert_eq!(render(DEFAULT_TEMPLATE, &event), "raw match");
    }
}
