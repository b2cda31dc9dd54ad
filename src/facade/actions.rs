use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

use crate::protocol::SessionResult;

/// Handler for a `client_action`, called with the reply's data and the full result
pub type ActionHandler = Arc<dyn Fn(Option<&Value>, &SessionResult) + Send + Sync>;

/// Table of client action handlers, keyed by action name
///
/// A pure registry: the session never calls into it. The navigation layer
/// looks handlers up (or calls `route`) after a request returns.
#[derive(Default)]
pub struct ActionRegistry {
    handlers: RwLock<HashMap<String, ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `action`; a later registration replaces it
    pub fn register<F>(&self, action: &str, handler: F)
    where
        F: Fn(Option<&Value>, &SessionResult) + Send + Sync + 'static,
    {
        if action.is_empty() {
            warn!("Ignoring handler registered for an empty action name");
            return;
        }

        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        if handlers
            .insert(action.to_string(), Arc::new(handler))
            .is_some()
        {
            debug!("Replaced handler for {}", action);
        } else {
            debug!("Registered handler for {}", action);
        }
    }

    pub fn get(&self, action: &str) -> Option<ActionHandler> {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        handlers.get(action).cloned()
    }

    /// Registered action names, sorted
    pub fn actions(&self) -> Vec<String> {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        let mut actions: Vec<String> = handlers.keys().cloned().collect();
        actions.sort();
        actions
    }

    /// Call the handler for `result.action`; `false` when there is none
    pub fn route(&self, result: &SessionResult) -> bool {
        let Some(handler) = result.action.as_deref().and_then(|action| self.get(action)) else {
            return false;
        };

        handler(result.data.as_ref(), result);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_last_registration_wins() {
        let registry = ActionRegistry::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&first);
        registry.register(
            "SHOW_ROUTINE",
            move |_: Option<&Value>, _: &SessionResult| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );
        let counter = Arc::clone(&second);
        registry.register(
            "SHOW_ROUTINE",
            move |_: Option<&Value>, _: &SessionResult| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        let result = SessionResult {
            action: Some("SHOW_ROUTINE".to_string()),
            ..SessionResult::default()
        };
        assert!(registry.route(&result));
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(registry.actions(), vec!["SHOW_ROUTINE".to_string()]);
    }

    #[test]
    fn test_empty_action_is_ignored() {
        let registry = ActionRegistry::new();
        registry.register("", |_: Option<&Value>, _: &SessionResult| {});
        assert!(registry.actions().is_empty());
    }

    #[test]
    fn test_route_without_handler() {
        let registry = ActionRegistry::new();
        let result = SessionResult {
            action: Some("UNKNOWN".to_string()),
            ..SessionResult::default()
        };
        assert!(!registry.route(&result));
        assert!(!registry.route(&SessionResult::default()));
    }
}
