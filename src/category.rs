//! Explicit registry of per-category handlers.
//!
//! Categories are free-form strings in storage; components that dispatch on a
//! category receive a [`CategoryRegistry`] built once at startup instead of
//! consulting process-wide state.

use std::collections::BTreeMap;

/// Anything that handles exactly one category.
pub trait CategoryHandler {
    /// Category name this handler is registered under, e.g. `"sleep"`.
    fn category(&self) -> &str;
}

/// Owned map from category name to handler.
#[derive(Debug, Clone)]
pub struct CategoryRegistry<H> {
    handlers: BTreeMap<String, H>,
}

impl<H> Default for CategoryRegistry<H> {
    fn default() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }
}

impl<H: CategoryHandler> CategoryRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `handler` under its own category name, returning any handler it replaced.
    pub fn register(&mut self, handler: H) -> Option<H> {
        let name = handler.category().to_string();
        self.handlers.insert(name, handler)
    }

    pub fn get(&self, category: &str) -> Option<&H> {
        self.handlers.get(category)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.handlers.contains_key(category)
    }

    /// Registered category names in sorted order.
    pub fn categories(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &H)> {
        self.handlers.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<H: CategoryHandler> FromIterator<H> for CategoryRegistry<H> {
    fn from_iter<I: IntoIterator<Item = H>>(iter: I) -> Self {
        let mut registry = Self::new();
        for handler in iter {
            registry.register(handler);
        }
        registry
    }
}
