//! Foreign keys.

use std::fmt;
use std::str::FromStr;

use super::entity::Entity;
use super::naming::{MAX_IDENTIFIER_LENGTH, hashed_name, lcfirst};
use crate::error::StrataError;

/// Referential action for ON DELETE / ON UPDATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelationAction {
    /// No clause is emitted.
    #[default]
    None,
    Cascade,
    Restrict,
    SetNull,
    SetDefault,
    NoAction,
}

impl RelationAction {
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Cascade => "CASCADE",
            Self::Restrict => "RESTRICT",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::NoAction => "NO ACTION",
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::None
    }
}

impl fmt::Display for RelationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for RelationAction {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(['_', ' '], "");
        match normalized.as_str() {
            "" | "NONE" => Ok(Self::None),
            "CASCADE" => Ok(Self::Cascade),
            "RESTRICT" => Ok(Self::Restrict),
            "SETNULL" => Ok(Self::SetNull),
            "SETDEFAULT" => Ok(Self::SetDefault),
            "NOACTION" => Ok(Self::NoAction),
            _ => Err(StrataError::InvalidAction(s.to_string())),
        }
    }
}

/// Pointer to a relation: owning entity name + relation name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationRef {
    pub entity: String,
    pub relation: String,
}

impl RelationRef {
    pub fn new(entity: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            relation: relation.into(),
        }
    }
}

/// A foreign key: positional local/foreign field pairs pointing at another
/// entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    name: Option<String>,
    field: Option<String>,
    entity: Option<String>,
    table: Option<String>,
    foreign_entity: String,
    foreign_table: Option<String>,
    local_fields: Vec<String>,
    foreign_fields: Vec<String>,
    on_delete: RelationAction,
    on_update: RelationAction,
    skip_sql: bool,
    name_limit: usize,
}

impl Relation {
    pub fn new(foreign_entity: impl Into<String>) -> Self {
        Self {
            name: None,
            field: None,
            entity: None,
            table: None,
            foreign_entity: foreign_entity.into(),
            foreign_table: None,
            local_fields: Vec::new(),
            foreign_fields: Vec::new(),
            on_delete: RelationAction::None,
            on_update: RelationAction::None,
            skip_sql: false,
            name_limit: MAX_IDENTIFIER_LENGTH,
        }
    }

    // ---- builder helpers ----

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Property name of the relation (`author` in `authorId`).
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn reference(mut self, local: impl Into<String>, foreign: impl Into<String>) -> Self {
        self.add_reference(local, foreign);
        self
    }

    pub fn on_delete(mut self, action: RelationAction) -> Self {
        self.on_delete = action;
        self
    }

    pub fn on_update(mut self, action: RelationAction) -> Self {
        self.on_update = action;
        self
    }

    // ---- naming ----

    /// Explicit name, or `[table_]fk_xxxxxx` hashed from the foreign table
    /// and both field lists.
    pub fn name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let parts = vec![
            self.foreign_table_name().to_string(),
            self.local_fields.join(","),
            self.foreign_fields.join(","),
        ];
        hashed_name(self.table.as_deref(), "fk_", &parts, self.name_limit)
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn is_auto_naming(&self) -> bool {
        self.name.is_none()
    }

    /// Property name, defaulting to lcfirst of the foreign entity's short name.
    pub fn field_name(&self) -> String {
        match &self.field {
            Some(field) => field.clone(),
            None => {
                let short = self
                    .foreign_entity
                    .rsplit('.')
                    .next()
                    .unwrap_or(&self.foreign_entity);
                lcfirst(short)
            }
        }
    }

    // ---- ownership ----

    /// Name of the owning entity.
    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    pub(crate) fn set_name_limit(&mut self, limit: usize) {
        self.name_limit = limit;
    }

    pub(crate) fn set_owner(&mut self, entity: Option<String>, table: Option<String>) {
        self.entity = entity;
        self.table = table;
    }

    pub fn foreign_entity(&self) -> &str {
        &self.foreign_entity
    }

    pub fn set_foreign_entity(&mut self, foreign_entity: impl Into<String>) {
        self.foreign_entity = foreign_entity.into();
        self.foreign_table = None;
    }

    /// Full table name of the foreign entity once resolved, else the
    /// foreign entity name as written.
    pub fn foreign_table_name(&self) -> &str {
        self.foreign_table.as_deref().unwrap_or(&self.foreign_entity)
    }

    pub(crate) fn set_foreign_table(&mut self, table: Option<String>) {
        self.foreign_table = table;
    }

    // ---- references ----

    /// Append one local -> foreign pair; both lists always stay equal length.
    pub fn add_reference(&mut self, local: impl Into<String>, foreign: impl Into<String>) {
        self.local_fields.push(local.into());
        self.foreign_fields.push(foreign.into());
    }

    pub fn has_references(&self) -> bool {
        !self.local_fields.is_empty()
    }

    pub fn local_fields(&self) -> &[String] {
        &self.local_fields
    }

    pub fn foreign_fields(&self) -> &[String] {
        &self.foreign_fields
    }

    pub fn references(&self) -> impl Iterator<Item = (&str, &str)> {
        self.local_fields
            .iter()
            .map(String::as_str)
            .zip(self.foreign_fields.iter().map(String::as_str))
    }

    pub fn local_field_for(&self, foreign: &str) -> Option<&str> {
        self.references()
            .find(|(_, f)| *f == foreign)
            .map(|(l, _)| l)
    }

    pub fn foreign_field_for(&self, local: &str) -> Option<&str> {
        self.references()
            .find(|(l, _)| *l == local)
            .map(|(_, f)| f)
    }

    pub fn is_composite(&self) -> bool {
        self.local_fields.len() > 1
    }

    /// Local fields are exactly the primary key of `entity` (the owner).
    pub fn matches_local_primary_key(&self, entity: &Entity) -> bool {
        same_set(&self.local_fields, &entity.primary_key_names())
    }

    /// Foreign fields are exactly the primary key of `foreign`.
    pub fn matches_foreign_primary_key(&self, foreign: &Entity) -> bool {
        same_set(&self.foreign_fields, &foreign.primary_key_names())
    }

    /// Whether `other` is the structural mirror of this relation.
    pub fn is_inverse_of(&self, other: &Relation) -> bool {
        self.local_fields == other.foreign_fields && self.foreign_fields == other.local_fields
    }

    // ---- actions ----

    pub fn get_on_delete(&self) -> RelationAction {
        self.on_delete
    }

    pub fn set_on_delete(&mut self, action: RelationAction) {
        self.on_delete = action;
    }

    pub fn get_on_update(&self) -> RelationAction {
        self.on_update
    }

    pub fn set_on_update(&mut self, action: RelationAction) {
        self.on_update = action;
    }

    pub fn is_skip_sql(&self) -> bool {
        self.skip_sql
    }

    pub fn set_skip_sql(&mut self, skip_sql: bool) {
        self.skip_sql = skip_sql;
    }
}

fn same_set(fields: &[String], keys: &[&str]) -> bool {
    !keys.is_empty()
        && fields.len() == keys.len()
        && fields.iter().all(|f| keys.contains(&f.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_normalization() {
        assert_eq!("setnull".parse::<RelationAction>().unwrap(), RelationAction::SetNull);
        assert_eq!("SET NULL".parse::<RelationAction>().unwrap(), RelationAction::SetNull);
        assert_eq!("no action".parse::<RelationAction>().unwrap(), RelationAction::NoAction);
        assert_eq!("".parse::<RelationAction>().unwrap(), RelationAction::None);
        assert!("sometimes".parse::<RelationAction>().is_err());
    }

    #[test]
    fn test_auto_name_uses_foreign_table_and_fields() {
        let mut a = Relation::new("author").reference("authorId", "id");
        let b = Relation::new("publisher").reference("authorId", "id");
        assert_ne!(a.name(), b.name());

        let before = a.name();
        a.set_owner(Some("book".into()), Some("book".into()));
        assert!(a.name().starts_with("book_fk_"));
        assert_ne!(before, a.name());
    }

    #[test]
    fn test_field_name_defaults() {
        assert_eq!(Relation::new("Author").field_name(), "author");
        assert_eq!(Relation::new("library.Author").field_name(), "author");
        assert_eq!(Relation::new("Author").field("writer").field_name(), "writer");
    }

    #[test]
    fn test_reference_mapping() {
        let relation = Relation::new("author")
            .reference("authorId", "id")
            .reference("authorVersion", "version");
        assert!(relation.is_composite());
        assert_eq!(relation.foreign_field_for("authorVersion"), Some("version"));
        assert_eq!(relation.local_field_for("id"), Some("authorId"));
        assert_eq!(relation.local_fields().len(), relation.foreign_fields().len());
    }
}
