//! Background action dispatch loop.
//!
//! The [`ActionDispatcher`] runs on a dedicated `std::thread` with its
//! own single-threaded tokio runtime. It consumes [`MatchEvent`]s from
//! the watcher channel, resolves the firing trigger's handler, and
//! spawns one task per dispatch so a slow or failing action never
//! blocks the loop or a sibling action.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use vigil_trigger::{MatchEvent, TriggerSet};
use vigil_types::VigilError;

use crate::template::{self, DEFAULT_TEMPLATE};
use crate::{ActionHandler, ActionInvocation};

/// The set of registered action handlers, keyed by name.
#[derive(Default)]
pub struct ActionRegistry {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own name. Replaces any previous
    /// handler with the same name.
    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) {
        self.handlers.insert(handler.name().to_string(), handler);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Verify every trigger in the set names a registered action.
    ///
    /// Runs at startup, before any stream processing: a catalog typo
    /// should fail loudly at load time, not one silent drop per match.
    pub fn validate(&self, set: &TriggerSet) -> Result<(), VigilError> {
        for trigger in set.iter() {
            if !self.handlers.contains_key(&trigger.action) {
                return Err(VigilError::Config(format!(
                    "trigger {:?} references unknown action {:?}",
                    trigger.name, trigger.action
                )));
            }
        }
        Ok(())
    }
}

/// Cloneable sending side of the dispatcher channel.
#[derive(Clone)]
pub struct DispatcherHandle {
    tx: UnboundedSender<MatchEvent>,
}

impl DispatcherHandle {
    /// Queue an event for dispatch. Returns false if the dispatcher
    /// has shut down.
    pub fn dispatch(&self, event: MatchEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// The raw sender, for wiring directly into a watcher.
    pub fn sender(&self) -> UnboundedSender<MatchEvent> {
        self.tx.clone()
    }
}

/// Owns the dispatcher thread.
///
/// The loop exits when every handle (including this dispatcher's own)
/// is dropped; [`shutdown`](ActionDispatcher::shutdown) does that and
/// then waits for in-flight actions to finish.
pub struct ActionDispatcher {
    handle: DispatcherHandle,
    thread: std::thread::JoinHandle<()>,
}

impl ActionDispatcher {
    /// Validate the registry against the trigger set and start the
    /// dispatch thread.
    pub fn spawn(registry: ActionRegistry, set: Arc<TriggerSet>) -> Result<Self, VigilError> {
        registry.validate(&set)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let thread = std::thread::Builder::new()
            .name("vigil-action".into())
            .spawn(move || run(registry, set, rx))
            .map_err(|e| VigilError::Action(format!("spawn dispatcher thread: {e}")))?;

        Ok(Self {
            handle: DispatcherHandle { tx },
            thread,
        })
    }

    pub fn handle(&self) -> DispatcherHandle {
        self.handle.clone()
    }

    /// Close this dispatcher's sender and wait for the loop to drain.
    ///
    /// Other live handles keep the loop running until they drop too.
    pub fn shutdown(self) {
        let Self { handle, thread } = self;
        drop(handle);
        if thread.join().is_err() {
            warn!("action dispatcher thread panicked");
        }
    }
}

/// Run the dispatch loop on the current thread.
fn run(registry: ActionRegistry, set: Arc<TriggerSet>, rx: UnboundedReceiver<MatchEvent>) {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("failed to create tokio runtime for action dispatcher: {e}");
            return;
        }
    };

    rt.block_on(run_loop(registry, set, rx));
}

async fn run_loop(
    registry: ActionRegistry,
    set: Arc<TriggerSet>,
    mut rx: UnboundedReceiver<MatchEvent>,
) {
    let mut in_flight: Vec<tokio::task::JoinHandle<()>> = Vec::new();

    info!(
        handlers = registry.len(),
        triggers = set.len(),
        "action dispatcher started"
    );

    while let Some(event) = rx.recv().await {
        in_flight.retain(|task| !task.is_finished());

        let Some(trigger) = set.get(&event.trigger_name) else {
            debug!(trigger = %event.trigger_name, "event for unknown trigger, dropping");
            continue;
        };
        let Some(handler) = registry.get(&trigger.action) else {
            // validate() ran at spawn; reachable only if the event came
            // from a different trigger set than this dispatcher's.
            warn!(
                trigger = %trigger.name,
                action = %trigger.action,
                "no handler for action, dropping event"
            );
            continue;
        };

        let template = trigger.config.get_str("template").unwrap_or(DEFAULT_TEMPLATE);
        let invocation = ActionInvocation {
            rendered: template::render(template, &event),
            config: trigger.config.clone(),
            event,
        };
        let action = trigger.action.clone();

        in_flight.push(tokio::spawn(async move {
            let started = Instant::now();
            match handler.invoke(&invocation).await {
                Ok(()) => debug!(
                    action = %action,
                    trigger = %invocation.event.trigger_name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "action completed"
                ),
                Err(e) => warn!(
                    action = %action,
                    trigger = %invocation.event.trigger_name,
                    error = %e,
                    "action failed"
                ),
            }
        }));
    }

    // Channel closed: let in-flight actions finish before exiting.
    for task in in_flight {
        let _ = task.await;
    }
    info!("action dispatcher shutting down (channel closed)");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use vigil_types::{ActionConfig, TriggerDef, TriggerMode};

    use crate::ActionResult;

    struct NopHandler;

    #[async_trait]
    impl ActionHandler for NopHandler {
        fn name(&self) -> &str {
            "nop"
        }

        async fn invoke(&self, _invocation: &ActionInvocation) -> ActionResult<()> {
            Ok(())
        }
    }

    fn def(name: &str, action: &str) -> TriggerDef {
        TriggerDef {
            name: name.into(),
            pattern: "x".into(),
            mode: TriggerMode::Transient,
            action: action.into(),
            enabled: true,
            builtin: false,
            action_config: ActionConfig::default(),
        }
    }

    #[test]
    fn validate_accepts_known_actions() {
        let mut registry = ActionRegistry::new();
        registry.register(Arc::new(NopHandler));
        let (set, _) = TriggerSet::compile(&[def("a", "nop")]);
        assert!(registry.validate(&set).is_ok());
    }

    #[test]
    fn validate_rejects_unknown_action() {
        let registry = ActionRegistry::new();
        let (set, _) = TriggerSet::compile(&[def("a", "nope")]);
        let err = registry.validate(&set).unwrap_err();
        assert!(matches!(err, VigilError::Config(_)));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn validate_covers_disabled_triggers_too() {
        // A disabled trigger can be re-enabled later; its action must
        // still exist.
        let registry = ActionRegistry::new();
        let mut disabled = def("off", "missing");
        disabled.enabled = false;
        let (set, _) = TriggerSet::compile(&[disabled]);
        assert!(registry.validate(&set).is_err());
    }

    #[test]
    fn dispatcher_exits_on_shutdown() {
        let mut registry = ActionRegistry::new();
        registry.register(Arc::new(NopHandler));
        let (set, _) = TriggerSet::compile(&[def("a", "nop")]);

        let dispatcher = ActionDispatcher::spawn(registry, Arc::new(set)).unwrap();
        dispatcher.shutdown();
    }

    #[test]
    fn spawn_fails_fast_on_bad_catalog() {
        let registry = ActionRegistry::new();
        let (set, _) = TriggerSet::compile(&[def("a", "ghost")]);
        assert!(matches!(
            ActionDispatcher::spawn(registry, Arc::new(set)),
            Err(VigilError::Config(_))
        ));
    }
}
