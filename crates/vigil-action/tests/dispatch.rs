//! End-to-end dispatch tests: events in, handler side effects out.

use std::collections::HashMap;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use vigil_action::{
    ActionDispatcher, ActionError, ActionHandler, ActionInvocation, ActionRegistry, ActionResult,
};
use vigil_trigger::{MatchEvent, MatchKind, TriggerSet};
use vigil_types::{ActionConfig, TriggerDef, TriggerMode, VigilError};

/// Forwards each invocation's (trigger, rendered) pair to the test.
struct RecordingHandler {
    name: &'static str,
    tx: Mutex<Sender<(String, String)>>,
}

#[async_trait]
impl ActionHandler for RecordingHandler {
    fn name(&self) -> &str {
        self.name
    }

    async fn invoke(&self, invocation: &ActionInvocation) -> ActionResult<()> {
        let pair = (
            invocation.event.trigger_name.clone(),
            invocation.rendered.clone(),
        );
        self.tx
            .lock()
            .unwrap()
            .send(pair)
            .map_err(|e| ActionError::Handler(e.to_string()))
    }
}

/// Always fails.
struct FailingHandler;

#[async_trait]
impl ActionHandler for FailingHandler {
    fn name(&self) -> &str {
        "fail"
    }

    async fn invoke(&self, _invocation: &ActionInvocation) -> ActionResult<()> {
        Err(ActionError::Handler("synthetic failure".into()))
    }
}

fn trigger(name: &str, action: &str, config: ActionConfig) -> TriggerDef {
    TriggerDef {
        name: name.into(),
        pattern: "x".into(),
        mode: TriggerMode::Transient,
        action: action.into(),
        enabled: true,
        builtin: false,
        action_config: config,
    }
}

fn event(trigger_name: &str, vars: &[(&str, &str)], matched: &str) -> MatchEvent {
    let variables: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    MatchEvent::new(trigger_name, MatchKind::Match, variables, matched.into(), "s1")
}

#[test]
fn events_reach_the_right_handler() {
    let (tx, rx) = mpsc::channel();
    let mut registry = ActionRegistry::new();
    registry.register(Arc::new(RecordingHandler {
        name: "record",
        tx: Mutex::new(tx),
    }));

    let (set, _) = TriggerSet::compile(&[trigger("hit", "record", ActionConfig::default())]);
    let dispatcher = ActionDispatcher::spawn(registry, Arc::new(set)).unwrap();

    let handle = dispatcher.handle();
    assert!(handle.dispatch(event("hit", &[], "payload text")));

    let (name, rendered) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(name, "hit");
    assert_eq!(rendered, "payload text", "default template is the matched text");

    // Live handles keep the loop running; drop before joining.
    drop(handle);
    dispatcher.shutdown();
}

#[test]
fn configured_template_is_rendered() {
    let (tx, rx) = mpsc::channel();
    let mut registry = ActionRegistry::new();
    registry.register(Arc::new(RecordingHandler {
        name: "record",
        tx: Mutex::new(tx),
    }));

    let mut config = ActionConfig::default();
    config.set_str("template", "{session} says {text}");
    let (set, _) = TriggerSet::compile(&[trigger("say", "record", config)]);
    let dispatcher = ActionDispatcher::spawn(registry, Arc::new(set)).unwrap();

    dispatcher
        .handle()
        .dispatch(event("say", &[("text", "hello")], r#"say "hello""#));

    let (_, rendered) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(rendered, "s1 says hello");

    dispatcher.shutdown();
}

#[test]
fn failing_action_does_not_block_siblings() {
    let (tx, rx) = mpsc::channel();
    let mut registry = ActionRegistry::new();
    registry.register(Arc::new(FailingHandler));
    registry.register(Arc::new(RecordingHandler {
        name: "record",
        tx: Mutex::new(tx),
    }));

    let (set, _) = TriggerSet::compile(&[
        trigger("boom", "fail", ActionConfig::default()),
        trigger("ok", "record", ActionConfig::default()),
    ]);
    let dispatcher = ActionDispatcher::spawn(registry, Arc::new(set)).unwrap();

    let handle = dispatcher.handle();
    // Interleave failures with a success; the success must still land.
    handle.dispatch(event("boom", &[], "x"));
    handle.dispatch(event("ok", &[], "fine"));
    handle.dispatch(event("boom", &[], "x"));

    let (name, rendered) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(name, "ok");
    assert_eq!(rendered, "fine");

    drop(handle);
    dispatcher.shutdown();
}

#[test]
fn unknown_action_fails_at_spawn_not_at_dispatch() {
    let registry = ActionRegistry::new();
    let (set, _) = TriggerSet::compile(&[trigger("typo", "nonexistent", ActionConfig::default())]);

    match ActionDispatcher::spawn(registry, Arc::new(set)) {
        Err(VigilError::Config(message)) => {
            assert!(message.contains("typo"));
            assert!(message.contains("nonexistent"));
        }
        Err(other) => panic!("expected a config error, got {other}"),
        Ok(_) => panic!("spawn should have failed validation"),
    }
}
