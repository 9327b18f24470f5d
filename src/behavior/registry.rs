//! Name -> modifier lookup table used by schema readers.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{Behavior, BehaviorModifier, Timestampable};
use crate::error::{StrataError, StrataResult};

/// Behavior factories keyed by behavior name.
#[derive(Clone, Default)]
pub struct BehaviorRegistry {
    modifiers: BTreeMap<String, Arc<dyn BehaviorModifier>>,
}

impl BehaviorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the bundled behaviors (`timestampable`).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("timestampable", Timestampable);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, modifier: impl BehaviorModifier + 'static) {
        self.modifiers.insert(name.into().to_lowercase(), Arc::new(modifier));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modifiers.contains_key(&name.to_lowercase())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modifiers.keys().map(String::as_str)
    }

    /// A fresh behavior with the registered modifier's defaults.
    pub fn create(&self, name: &str) -> StrataResult<Behavior> {
        let modifier = self
            .modifiers
            .get(&name.to_lowercase())
            .ok_or_else(|| StrataError::UnknownBehavior(name.to_string()))?;
        Ok(Behavior::with_modifier(name, Arc::clone(modifier)))
    }
}
