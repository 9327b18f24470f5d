//! Tables.

use std::fmt;
use std::str::FromStr;

use super::field::Field;
use super::index::Index;
use super::naming::MAX_IDENTIFIER_LENGTH;
use super::relation::{Relation, RelationRef};
use super::traits::{Describable, Named, VendorCarrier};
use super::vendor::VendorInfo;
use crate::behavior::Behavior;
use crate::error::{StrataError, StrataResult};

/// How primary key values are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdMethod {
    /// The database generates keys (auto-increment, serial, sequences).
    #[default]
    Native,
    /// Keys are supplied by the application.
    None,
}

impl IdMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::None => "none",
        }
    }
}

impl fmt::Display for IdMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdMethod {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "native" => Ok(Self::Native),
            "none" => Ok(Self::None),
            other => Err(StrataError::Config(format!(
                "Unknown id method '{}'. Expected: native or none",
                other
            ))),
        }
    }
}

/// A table: ordered fields, outgoing relations, inbound referrers, indices,
/// unique constraints and behaviors.
#[derive(Debug, Clone)]
pub struct Entity {
    name: String,
    table_name: Option<String>,
    namespace: Option<String>,
    schema: Option<String>,
    description: Option<String>,
    database: Option<String>,
    fields: Vec<Field>,
    relations: Vec<Relation>,
    referrers: Vec<RelationRef>,
    indices: Vec<Index>,
    unices: Vec<Index>,
    behaviors: Vec<Behavior>,
    vendor: Vec<VendorInfo>,
    id_method: Option<IdMethod>,
    id_method_parameter: Option<String>,
    sequence_name: Option<String>,
    heavy_indexing: Option<bool>,
    skip_sql: bool,
    alias: Option<String>,
    reference_only: bool,
    is_cross_ref: bool,
    contains_foreign_pk: bool,
    needs_transaction_in_postgres: bool,
    primary_key_name: Option<String>,
    name_limit: usize,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_name: None,
            namespace: None,
            schema: None,
            description: None,
            database: None,
            fields: Vec::new(),
            relations: Vec::new(),
            referrers: Vec::new(),
            indices: Vec::new(),
            unices: Vec::new(),
            behaviors: Vec::new(),
            vendor: Vec::new(),
            id_method: None,
            id_method_parameter: None,
            sequence_name: None,
            heavy_indexing: None,
            skip_sql: false,
            alias: None,
            reference_only: false,
            is_cross_ref: false,
            contains_foreign_pk: false,
            needs_transaction_in_postgres: false,
            primary_key_name: None,
            name_limit: MAX_IDENTIFIER_LENGTH,
        }
    }

    // ---- naming ----

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.rewire_children();
    }

    /// `namespace.Name` when a namespace is set.
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{}.{}", ns, self.name),
            _ => self.name.clone(),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn set_namespace(&mut self, namespace: Option<String>) {
        self.namespace = namespace;
    }

    /// Table name; defaults to the entity name.
    pub fn table_name(&self) -> &str {
        self.table_name.as_deref().unwrap_or(&self.name)
    }

    pub fn set_table_name(&mut self, table_name: Option<String>) {
        self.table_name = table_name;
        self.rewire_children();
    }

    /// `schema.table` when a database schema is set.
    pub fn full_table_name(&self) -> String {
        match &self.schema {
            Some(schema) if !schema.is_empty() => format!("{}.{}", schema, self.table_name()),
            _ => self.table_name().to_string(),
        }
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn set_schema(&mut self, schema: Option<String>) {
        self.schema = schema;
    }

    /// Whether `name` designates this entity, by short or qualified name.
    pub fn is_named(&self, name: &str) -> bool {
        self.name == name || self.full_name() == name
    }

    /// Length cap for generated index, unique and foreign key names.
    pub fn name_limit(&self) -> usize {
        self.name_limit
    }

    pub fn set_name_limit(&mut self, limit: usize) {
        self.name_limit = limit;
        for index in self.indices.iter_mut().chain(self.unices.iter_mut()) {
            index.set_name_limit(limit);
        }
        for relation in &mut self.relations {
            relation.set_name_limit(limit);
        }
    }

    /// Copy of this entity under another table name. Every constraint keeps
    /// the name it had on the old table.
    pub fn retabled(&self, table: &str) -> Entity {
        let mut moved = self.clone();
        moved.primary_key_name = Some(self.primary_key_name());
        for index in moved.indices.iter_mut().chain(moved.unices.iter_mut()) {
            index.set_name(Some(index.name()));
        }
        for relation in &mut moved.relations {
            relation.set_name(Some(relation.name()));
        }
        moved.set_table_name(Some(table.to_string()));
        moved
    }

    fn rewire_children(&mut self) {
        let name = self.name.clone();
        let table = self.table_name().to_string();
        for field in &mut self.fields {
            field.set_entity(Some(name.clone()));
        }
        for index in self.indices.iter_mut().chain(self.unices.iter_mut()) {
            index.set_table(Some(table.clone()));
        }
        for relation in &mut self.relations {
            relation.set_owner(Some(name.clone()), Some(table.clone()));
        }
    }

    // ---- database back-reference ----

    /// Name of the owning database.
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub(crate) fn set_database(&mut self, database: Option<String>) {
        self.database = database;
    }

    // ---- fields ----

    /// Append a field. Its position becomes `len + 1`.
    pub fn add_field(&mut self, mut field: Field) -> StrataResult<&mut Field> {
        if self.has_field(field.name()) {
            return Err(StrataError::DuplicateField {
                entity: self.name.clone(),
                field: field.name().to_string(),
            });
        }
        if field.is_inheritance()
            && let Some(existing) = self.inheritance_field()
        {
            return Err(StrataError::DuplicateInheritance {
                entity: self.name.clone(),
                existing: existing.name().to_string(),
                field: field.name().to_string(),
            });
        }

        field.set_position(self.fields.len() + 1);
        field.set_entity(Some(self.name.clone()));
        if field.requires_transaction_in_postgres() {
            self.needs_transaction_in_postgres = true;
        }
        if field.is_primary_key() && self.is_foreign_key_field(field.name()) {
            self.contains_foreign_pk = true;
        }
        self.fields.push(field);
        let last = self.fields.len() - 1;
        Ok(&mut self.fields[last])
    }

    /// Detach a field; later fields move up one position.
    pub fn remove_field(&mut self, name: &str) -> Option<Field> {
        let idx = self.fields.iter().position(|f| f.name() == name)?;
        let mut field = self.fields.remove(idx);
        field.set_entity(None);
        field.set_position(0);
        for (i, f) in self.fields.iter_mut().enumerate() {
            f.set_position(i + 1);
        }
        Some(field)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> impl Iterator<Item = &mut Field> {
        self.fields.iter_mut()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name() == name)
    }

    pub fn field_by_column(&self, column: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.column_name().eq_ignore_ascii_case(column))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn primary_key(&self) -> Vec<&Field> {
        self.fields.iter().filter(|f| f.is_primary_key()).collect()
    }

    pub fn primary_key_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.is_primary_key())
            .map(|f| f.name())
            .collect()
    }

    pub fn has_primary_key(&self) -> bool {
        self.fields.iter().any(Field::is_primary_key)
    }

    pub fn has_composite_primary_key(&self) -> bool {
        self.primary_key().len() > 1
    }

    pub fn auto_increment_field(&self) -> Option<&Field> {
        self.fields.iter().find(|f| f.is_auto_increment())
    }

    pub fn has_auto_increment(&self) -> bool {
        self.auto_increment_field().is_some()
    }

    pub fn has_auto_increment_primary_key(&self) -> bool {
        self.fields
            .iter()
            .any(|f| f.is_primary_key() && f.is_auto_increment())
    }

    pub fn inheritance_field(&self) -> Option<&Field> {
        self.fields.iter().find(|f| f.is_inheritance())
    }

    fn is_foreign_key_field(&self, name: &str) -> bool {
        self.relations
            .iter()
            .any(|r| r.local_fields().iter().any(|l| l == name))
    }

    // ---- indices ----

    /// Attach a non-unique index after validating its members.
    pub fn add_index(&mut self, index: Index) -> StrataResult<()> {
        let index = self.prepare_index(index)?;
        self.indices.push(index);
        Ok(())
    }

    /// Attach a unique constraint after validating its members.
    pub fn add_unique(&mut self, unique: Index) -> StrataResult<()> {
        let unique = self.prepare_index(unique)?;
        self.unices.push(unique);
        Ok(())
    }

    fn prepare_index(&self, mut index: Index) -> StrataResult<Index> {
        index.set_table(Some(self.table_name().to_string()));
        index.set_name_limit(self.name_limit);
        let name = index.name();
        if index.is_empty() {
            return Err(StrataError::EmptyIndex {
                entity: self.name.clone(),
                index: name,
            });
        }
        if let Some(missing) = index.fields().iter().find(|f| !self.has_field(&f.name)) {
            return Err(StrataError::UnknownField {
                entity: self.name.clone(),
                field: missing.name.clone(),
                context: format!("index '{}'", name),
            });
        }
        if self.has_index(&name) {
            return Err(StrataError::DuplicateIndex {
                entity: self.name.clone(),
                index: name,
            });
        }
        Ok(index)
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indices
            .iter()
            .chain(self.unices.iter())
            .any(|i| i.name() == name)
    }

    /// Remove an index or unique constraint by name.
    pub fn remove_index(&mut self, name: &str) -> Option<Index> {
        let removed = if let Some(pos) = self.indices.iter().position(|i| i.name() == name) {
            self.indices.remove(pos)
        } else {
            let pos = self.unices.iter().position(|i| i.name() == name)?;
            self.unices.remove(pos)
        };
        let mut removed = removed;
        // Pin the name before detaching so it does not change.
        removed.set_name(Some(removed.name()));
        removed.set_table(None);
        Some(removed)
    }

    pub fn indices(&self) -> &[Index] {
        &self.indices
    }

    pub fn indices_mut(&mut self) -> impl Iterator<Item = &mut Index> {
        self.indices.iter_mut()
    }

    pub fn unices(&self) -> &[Index] {
        &self.unices
    }

    pub fn unices_mut(&mut self) -> impl Iterator<Item = &mut Index> {
        self.unices.iter_mut()
    }

    /// Whether some index, unique constraint or the primary key starts with
    /// exactly these fields.
    pub fn is_indexed(&self, names: &[&str]) -> bool {
        if names.is_empty() {
            return false;
        }
        let pk = self.primary_key_names();
        if names.len() <= pk.len() && pk[..names.len()] == *names {
            return true;
        }
        self.indices
            .iter()
            .chain(self.unices.iter())
            .any(|i| i.covers_prefix(names))
    }

    /// Whether the set of `names` is the primary key or a unique constraint.
    /// A field's `unique` flag only counts once finalization turned it into
    /// a constraint.
    pub fn is_unique_on(&self, names: &[&str]) -> bool {
        let same_set = |other: &[&str]| {
            other.len() == names.len() && names.iter().all(|n| other.contains(n))
        };
        same_set(&self.primary_key_names())
            || self.unices.iter().any(|u| same_set(&u.field_names()))
    }

    // ---- relations ----

    /// Attach an outgoing relation.
    pub fn add_relation(&mut self, mut relation: Relation) -> &mut Relation {
        relation.set_owner(Some(self.name.clone()), Some(self.table_name().to_string()));
        relation.set_name_limit(self.name_limit);
        let touches_pk = relation
            .local_fields()
            .iter()
            .any(|l| self.field(l).is_some_and(Field::is_primary_key));
        if touches_pk {
            self.contains_foreign_pk = true;
        }
        self.relations.push(relation);
        let last = self.relations.len() - 1;
        &mut self.relations[last]
    }

    pub fn remove_relation(&mut self, name: &str) -> Option<Relation> {
        let pos = self.relations.iter().position(|r| r.name() == name)?;
        let mut relation = self.relations.remove(pos);
        relation.set_name(Some(relation.name()));
        relation.set_owner(None, None);
        Some(relation)
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub(crate) fn relations_vec_mut(&mut self) -> &mut Vec<Relation> {
        &mut self.relations
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name() == name)
    }

    pub fn relation_mut(&mut self, name: &str) -> Option<&mut Relation> {
        self.relations.iter_mut().find(|r| r.name() == name)
    }

    /// Outgoing relations pointing at `foreign_entity`.
    pub fn relations_to(&self, foreign_entity: &str) -> Vec<&Relation> {
        self.relations
            .iter()
            .filter(|r| r.foreign_entity() == foreign_entity)
            .collect()
    }

    // ---- referrers ----

    /// Relations of other entities pointing at this one. Filled by
    /// finalization.
    pub fn referrers(&self) -> &[RelationRef] {
        &self.referrers
    }

    pub fn has_referrer(&self, reference: &RelationRef) -> bool {
        self.referrers.contains(reference)
    }

    pub fn add_referrer(&mut self, reference: RelationRef) {
        if !self.has_referrer(&reference) {
            self.referrers.push(reference);
        }
    }

    pub fn clear_referrers(&mut self) {
        self.referrers.clear();
        for field in &mut self.fields {
            field.clear_referrers();
        }
    }

    // ---- behaviors ----

    /// Attach a behavior. A second behavior with the same id is refused
    /// unless the behavior allows multiple instances.
    pub fn add_behavior(&mut self, mut behavior: Behavior) -> StrataResult<()> {
        if self.has_behavior(behavior.id()) && !behavior.allow_multiple() {
            return Err(StrataError::DuplicateBehavior {
                owner: self.name.clone(),
                behavior: behavior.id().to_string(),
            });
        }
        behavior.set_entity(Some(self.name.clone()));
        self.behaviors.push(behavior);
        Ok(())
    }

    pub fn has_behavior(&self, id: &str) -> bool {
        self.behaviors.iter().any(|b| b.id() == id)
    }

    pub fn behavior(&self, id: &str) -> Option<&Behavior> {
        self.behaviors.iter().find(|b| b.id() == id)
    }

    pub fn behavior_mut(&mut self, id: &str) -> Option<&mut Behavior> {
        self.behaviors.iter_mut().find(|b| b.id() == id)
    }

    pub fn behaviors(&self) -> &[Behavior] {
        &self.behaviors
    }

    pub(crate) fn behavior_at_mut(&mut self, idx: usize) -> Option<&mut Behavior> {
        self.behaviors.get_mut(idx)
    }

    // ---- id generation ----

    pub fn id_method(&self) -> IdMethod {
        self.id_method.unwrap_or_default()
    }

    pub fn has_explicit_id_method(&self) -> bool {
        self.id_method.is_some()
    }

    pub fn set_id_method(&mut self, id_method: IdMethod) {
        self.id_method = Some(id_method);
    }

    pub fn is_native_id_method(&self) -> bool {
        self.id_method() == IdMethod::Native
    }

    pub fn id_method_parameter(&self) -> Option<&str> {
        self.id_method_parameter.as_deref()
    }

    pub fn set_id_method_parameter(&mut self, value: Option<String>) {
        self.id_method_parameter = value;
    }

    /// Sequence picked during finalization, else the id method parameter,
    /// else `<table>_SEQ`.
    pub fn sequence_name(&self) -> String {
        match (&self.sequence_name, &self.id_method_parameter) {
            (Some(seq), _) | (None, Some(seq)) => seq.clone(),
            (None, None) => format!("{}_SEQ", self.table_name()),
        }
    }

    pub fn set_sequence_name(&mut self, sequence_name: Option<String>) {
        self.sequence_name = sequence_name;
    }

    /// Primary key constraint name, `<table>_pk` unless pinned.
    pub fn primary_key_name(&self) -> String {
        self.primary_key_name
            .clone()
            .unwrap_or_else(|| format!("{}_pk", self.table_name()))
    }

    pub fn set_primary_key_name(&mut self, name: Option<String>) {
        self.primary_key_name = name;
    }

    // ---- flags ----

    /// Explicit heavy-indexing setting; `None` defers to the database.
    pub fn heavy_indexing(&self) -> Option<bool> {
        self.heavy_indexing
    }

    pub fn set_heavy_indexing(&mut self, heavy_indexing: Option<bool>) {
        self.heavy_indexing = heavy_indexing;
    }

    pub fn is_skip_sql(&self) -> bool {
        self.skip_sql
    }

    pub fn set_skip_sql(&mut self, skip_sql: bool) {
        self.skip_sql = skip_sql;
    }

    /// Entity whose table this entity aliases.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn set_alias(&mut self, alias: Option<String>) {
        self.alias = alias;
    }

    pub fn is_alias(&self) -> bool {
        self.alias.is_some()
    }

    pub fn is_reference_only(&self) -> bool {
        self.reference_only
    }

    pub fn set_reference_only(&mut self, reference_only: bool) {
        self.reference_only = reference_only;
    }

    /// Many-to-many pivot table.
    pub fn is_cross_ref(&self) -> bool {
        self.is_cross_ref
    }

    pub fn set_cross_ref(&mut self, is_cross_ref: bool) {
        self.is_cross_ref = is_cross_ref;
    }

    pub fn contains_foreign_pk(&self) -> bool {
        self.contains_foreign_pk
    }

    pub fn set_contains_foreign_pk(&mut self, value: bool) {
        self.contains_foreign_pk = value;
    }

    pub fn needs_transaction_in_postgres(&self) -> bool {
        self.needs_transaction_in_postgres
    }

    /// Rendered by `getAddEntitiesDDL`: not an alias, not reference-only,
    /// not skipped.
    pub fn is_sql_eligible(&self) -> bool {
        !self.skip_sql && !self.reference_only && self.alias.is_none()
    }
}

impl Named for Entity {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Describable for Entity {
    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }
}

impl VendorCarrier for Entity {
    fn vendor_infos(&self) -> &[VendorInfo] {
        &self.vendor
    }

    fn vendor_infos_mut(&mut self) -> &mut Vec<VendorInfo> {
        &mut self.vendor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field::Inheritance;
    use crate::model::types::FieldType;

    fn book() -> Entity {
        let mut entity = Entity::new("book");
        entity
            .add_field(Field::new("id", FieldType::Integer).primary_key().auto_increment())
            .unwrap();
        entity.add_field(Field::new("title", FieldType::Varchar).size(100)).unwrap();
        entity
    }

    #[test]
    fn test_positions_follow_insertion() {
        let mut entity = book();
        entity.add_field(Field::new("isbn", FieldType::Varchar)).unwrap();
        let positions: Vec<usize> = entity.fields().iter().map(Field::position).collect();
        assert_eq!(positions, vec![1, 2, 3]);

        let removed = entity.remove_field("title").unwrap();
        assert_eq!(removed.entity(), None);
        let positions: Vec<usize> = entity.fields().iter().map(Field::position).collect();
        assert_eq!(positions, vec![1, 2]);
        assert_eq!(entity.field("isbn").unwrap().position(), 2);
    }

    #[test]
    fn test_duplicate_field_fails() {
        let mut entity = book();
        let err = entity.add_field(Field::new("title", FieldType::Varchar)).unwrap_err();
        assert!(matches!(err, StrataError::DuplicateField { .. }));
    }

    #[test]
    fn test_single_inheritance_field() {
        let mut entity = book();
        let mut kind = Field::new("kind", FieldType::Varchar);
        kind.add_inheritance(Inheritance::new("novel", "Novel"));
        entity.add_field(kind).unwrap();

        let mut other = Field::new("kind2", FieldType::Varchar);
        other.add_inheritance(Inheritance::new("essay", "Essay"));
        let err = entity.add_field(other).unwrap_err();
        assert!(matches!(err, StrataError::DuplicateInheritance { .. }));
    }

    #[test]
    fn test_primary_key_derivations() {
        let entity = book();
        assert!(entity.has_primary_key());
        assert!(entity.has_auto_increment_primary_key());
        assert!(!entity.has_composite_primary_key());
        assert_eq!(entity.primary_key_names(), vec!["id"]);
    }

    #[test]
    fn test_index_validation() {
        let mut entity = book();
        let err = entity.add_index(Index::new(Vec::<String>::new())).unwrap_err();
        assert!(matches!(err, StrataError::EmptyIndex { .. }));

        let err = entity.add_index(Index::new(["missing"])).unwrap_err();
        assert!(matches!(err, StrataError::UnknownField { .. }));

        entity.add_index(Index::new(["title"])).unwrap();
        let err = entity.add_index(Index::new(["title"])).unwrap_err();
        assert!(matches!(err, StrataError::DuplicateIndex { .. }));

        let name = entity.indices()[0].name();
        assert!(name.starts_with("book_i_"));
        let removed = entity.remove_index(&name).unwrap();
        assert_eq!(removed.table(), None);
        assert_eq!(removed.name(), name);
        assert!(entity.indices().is_empty());
    }

    #[test]
    fn test_is_indexed_uses_prefixes() {
        let mut entity = book();
        entity.add_field(Field::new("isbn", FieldType::Varchar)).unwrap();
        entity.add_index(Index::new(["title", "isbn"])).unwrap();
        assert!(entity.is_indexed(&["id"]));
        assert!(entity.is_indexed(&["title"]));
        assert!(entity.is_indexed(&["title", "isbn"]));
        assert!(!entity.is_indexed(&["isbn"]));
    }

    #[test]
    fn test_table_names() {
        let mut entity = book();
        entity.set_table_name(Some("books".into()));
        entity.set_schema(Some("library".into()));
        entity.set_namespace(Some("App".into()));
        assert_eq!(entity.full_table_name(), "library.books");
        assert_eq!(entity.full_name(), "App.book");
        assert!(entity.is_named("App.book"));
        assert!(entity.is_named("book"));
    }

    #[test]
    fn test_unique_flag_is_not_a_constraint() {
        let mut entity = book();
        entity.add_field(Field::new("isbn", FieldType::Varchar).unique()).unwrap();
        assert!(entity.is_unique_on(&["id"]));
        assert!(!entity.is_unique_on(&["isbn"]));
        entity.add_unique(Index::unique(["isbn"])).unwrap();
        assert!(entity.is_unique_on(&["isbn"]));
    }

    #[test]
    fn test_retabled_keeps_constraint_names() {
        let mut entity = book();
        entity.add_index(Index::new(["title"])).unwrap();
        entity.add_relation(Relation::new("author").reference("title", "name"));
        let index = entity.indices()[0].name();
        let relation = entity.relations()[0].name();

        let moved = entity.retabled("books");
        assert_eq!(moved.table_name(), "books");
        assert_eq!(moved.primary_key_name(), "book_pk");
        assert_eq!(moved.indices()[0].name(), index);
        assert_eq!(moved.indices()[0].table(), Some("books"));
        assert_eq!(moved.relations()[0].name(), relation);
        assert_eq!(entity.primary_key_name(), "book_pk");
    }

    #[test]
    fn test_name_limit_reaches_children() {
        let mut entity = Entity::new("t".repeat(80));
        entity.add_field(Field::new("title", FieldType::Varchar)).unwrap();
        entity.add_index(Index::new(["title"])).unwrap();
        entity.set_name_limit(63);
        entity.add_unique(Index::unique(["title"])).unwrap();
        assert_eq!(entity.indices()[0].name().len(), 63);
        assert_eq!(entity.unices()[0].name().len(), 63);
    }

    #[test]
    fn test_sql_eligibility() {
        let mut entity = book();
        assert!(entity.is_sql_eligible());
        entity.set_reference_only(true);
        assert!(!entity.is_sql_eligible());
    }
}
