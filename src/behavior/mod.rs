//! Behavior protocol.
//!
//! A [`Behavior`] is a named, parameterized value attached to a database or
//! an entity. What it does to the model is defined by its
//! [`BehaviorModifier`], a stateless handler shared by every copy of the
//! behavior.
//!
//! # Example
//! ```ignore
//! use strata::behavior::{Behavior, BehaviorRegistry};
//!
//! let registry = BehaviorRegistry::with_builtins();
//! let mut behavior = registry.create("timestampable")?;
//! behavior.set_parameter("create_column", Some("created_on"));
//! database.add_behavior(behavior)?;
//! ```

mod registry;
mod timestampable;

pub use registry::BehaviorRegistry;
pub use timestampable::Timestampable;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::StrataResult;
use crate::model::{Database, Entity};

/// Default position in the entity behavior queue. Lower runs first.
pub const DEFAULT_MODIFICATION_ORDER: i32 = 50;

/// Generator lifecycle points a behavior can contribute code to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    PreSave,
    PostSave,
    PreInsert,
    PostInsert,
    PreUpdate,
    PostUpdate,
    PreDelete,
    PostDelete,
}

/// Generator builders a behavior can customize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderKind {
    Object,
    Query,
    Repository,
    EntityMap,
}

/// What a behavior does to the model.
///
/// Implementations hold no per-instance state: everything configurable lives
/// in the [`Behavior`] parameters handed to each call.
pub trait BehaviorModifier: Send + Sync {
    /// Parameters every new behavior starts with.
    fn default_parameters(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    /// Whether one entity may carry several behaviors with the same id.
    fn allow_multiple(&self) -> bool {
        false
    }

    fn modification_order(&self) -> i32 {
        DEFAULT_MODIFICATION_ORDER
    }

    /// Called once for a database-scope behavior.
    ///
    /// The default copies the behavior onto every entity that does not have
    /// one with the same id yet.
    fn modify_database(&self, behavior: &Behavior, database: &mut Database) -> StrataResult<()> {
        propagate_to_entities(behavior, database)
    }

    /// Called once for each entity-scope behavior instance.
    fn modify_entity(
        &self,
        _behavior: &Behavior,
        _database: &mut Database,
        _entity: &str,
    ) -> StrataResult<()> {
        Ok(())
    }

    /// Code contributed at a generator lifecycle point.
    fn hook(&self, _behavior: &Behavior, _hook: Hook, _entity: &Entity) -> Option<String> {
        None
    }

    /// Code contributed to a generator builder.
    fn builder_modification(
        &self,
        _behavior: &Behavior,
        _builder: BuilderKind,
        _entity: &Entity,
    ) -> Option<String> {
        None
    }
}

/// Copy `behavior` onto each entity of `database` lacking its id. Running it
/// twice attaches nothing new.
pub fn propagate_to_entities(behavior: &Behavior, database: &mut Database) -> StrataResult<()> {
    for entity in database.entities_mut() {
        if entity.has_behavior(behavior.id()) {
            continue;
        }
        let mut copy = behavior.clone();
        copy.set_entity_modified(false);
        tracing::debug!(
            "Propagating behavior '{}' to entity '{}'",
            behavior.id(),
            crate::model::Named::name(entity)
        );
        entity.add_behavior(copy)?;
    }
    Ok(())
}

/// Handler for behaviors that only carry parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopModifier;

impl BehaviorModifier for NoopModifier {}

/// A named, parameterized model mutator.
///
/// `Clone` is a deep copy of the parameters: mutating a clone never affects
/// the original. The modifier itself is shared.
#[derive(Clone)]
pub struct Behavior {
    id: String,
    name: String,
    parameters: BTreeMap<String, String>,
    entity_modification_order: i32,
    entity_modified: bool,
    entity: Option<String>,
    modifier: Arc<dyn BehaviorModifier>,
}

impl Behavior {
    pub fn new(name: impl Into<String>, modifier: impl BehaviorModifier + 'static) -> Self {
        Self::with_modifier(name, Arc::new(modifier))
    }

    /// A behavior backed by an already shared modifier.
    pub fn with_modifier(name: impl Into<String>, modifier: Arc<dyn BehaviorModifier>) -> Self {
        let name = name.into();
        let parameters = modifier
            .default_parameters()
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        Self {
            id: name.clone(),
            name,
            parameters,
            entity_modification_order: modifier.modification_order(),
            entity_modified: false,
            entity: None,
            modifier,
        }
    }

    /// A behavior with no effect on the model.
    pub fn plain(name: impl Into<String>) -> Self {
        Self::new(name, NoopModifier)
    }

    /// Stable key for "already applied" checks; defaults to the name.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning entity, `None` for database-scope behaviors.
    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    pub(crate) fn set_entity(&mut self, entity: Option<String>) {
        self.entity = entity;
    }

    // ---- parameters ----

    /// Case-insensitive lookup.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// Set a parameter. `None` leaves the current value in place so
    /// incomplete input never clobbers a default.
    pub fn set_parameter(&mut self, name: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.parameters.insert(name.to_lowercase(), value.to_string());
        }
    }

    pub fn set_parameters<'a>(&mut self, parameters: impl IntoIterator<Item = (&'a str, &'a str)>) {
        for (name, value) in parameters {
            self.set_parameter(name, Some(value));
        }
    }

    /// Truthy parameter check (`true`, `1`, `yes`, `y`, `on`).
    pub fn is_parameter_true(&self, name: &str) -> bool {
        self.parameter(name).is_some_and(|v| {
            matches!(
                v.to_lowercase().as_str(),
                "true" | "1" | "yes" | "y" | "on"
            )
        })
    }

    // ---- scheduling ----

    pub fn entity_modification_order(&self) -> i32 {
        self.entity_modification_order
    }

    pub fn set_entity_modification_order(&mut self, order: i32) {
        self.entity_modification_order = order;
    }

    pub fn is_entity_modified(&self) -> bool {
        self.entity_modified
    }

    pub fn set_entity_modified(&mut self, modified: bool) {
        self.entity_modified = modified;
    }

    pub fn allow_multiple(&self) -> bool {
        self.modifier.allow_multiple()
    }

    pub fn modifier(&self) -> &Arc<dyn BehaviorModifier> {
        &self.modifier
    }

    // ---- protocol ----

    pub fn modify_database(&self, database: &mut Database) -> StrataResult<()> {
        self.modifier.modify_database(self, database)
    }

    pub fn modify_entity(&self, database: &mut Database, entity: &str) -> StrataResult<()> {
        self.modifier.modify_entity(self, database, entity)
    }

    pub fn hook(&self, hook: Hook, entity: &Entity) -> Option<String> {
        self.modifier.hook(self, hook, entity)
    }

    pub fn builder_modification(&self, builder: BuilderKind, entity: &Entity) -> Option<String> {
        self.modifier.builder_modification(self, builder, entity)
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("entity_modification_order", &self.entity_modification_order)
            .field("entity_modified", &self.entity_modified)
            .field("entity", &self.entity)
            .finish()
    }
}
