//! Method routing table.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::SchemaError;
use crate::handlers::{ClientsInterestsHandler, MethodHandler, OnlineScoreHandler};

/// Name of the online score method.
pub const ONLINE_SCORE: &str = "online_score";

/// Name of the clients interests method.
pub const CLIENTS_INTERESTS: &str = "clients_interests";

/// Maps method names to handlers.
///
/// Filled once at startup and then shared read-only through the
/// [`Dispatcher`](crate::Dispatcher).
#[derive(Clone, Default)]
pub struct MethodRegistry {
    handlers: HashMap<String, Arc<dyn MethodHandler>>,
}

impl MethodRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with `online_score` and `clients_interests`.
    pub fn standard() -> Result<Self, SchemaError> {
        let mut registry = Self::new();
        registry.register(OnlineScoreHandler::new()?);
        registry.register(ClientsInterestsHandler::new()?);
        Ok(registry)
    }

    /// Registers a handler under its own name, replacing any previous one.
    pub fn register<H: MethodHandler + 'static>(&mut self, handler: H) {
        self.register_arc(Arc::new(handler));
    }

    /// Registers a shared handler under its own name.
    pub fn register_arc(&mut self, handler: Arc<dyn MethodHandler>) {
        let name = handler.name();
        if self.handlers.insert(name.to_string(), handler).is_some() {
            tracing::warn!(method = name, "handler replaced");
        }
    }

    /// Looks up a handler.
    #[must_use]
    pub fn get(&self, method: &str) -> Option<&Arc<dyn MethodHandler>> {
        self.handlers.get(method)
    }

    /// Returns `true` if a handler is registered for `method`.
    #[must_use]
    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered method names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.names())
            .finish()
    }
}
