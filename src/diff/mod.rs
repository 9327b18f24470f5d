//! Structural differences between two versions of a database.
//!
//! A [`DatabaseDiff`] owns both sides and records changes by name; the
//! platform resolves names against `from` (dropped / changed-away shapes)
//! or `to` (created / changed-to shapes) when rendering migration DDL.
//!
//! [`compare`] fills a diff by name. It never reports renames: those have
//! to be declared with [`DatabaseDiff::rename_entity`] /
//! [`EntityDiff::rename_field`].

use std::borrow::Cow;

use crate::error::{StrataError, StrataResult};
use crate::model::{Database, Entity, Field, Index, Named, Relation};

/// A field present on both sides, possibly under another name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDiff {
    pub from: String,
    pub to: String,
}

impl FieldDiff {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn is_rename(&self) -> bool {
        self.from != self.to
    }
}

/// Changes inside one entity present on both sides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityDiff {
    /// Entity name in `from`.
    pub from_entity: String,
    /// Entity name in `to`.
    pub to_entity: String,
    pub added_fields: Vec<String>,
    pub removed_fields: Vec<String>,
    pub renamed_fields: Vec<FieldDiff>,
    pub modified_fields: Vec<FieldDiff>,
    pub modified_pk: bool,
    pub added_indices: Vec<String>,
    pub removed_indices: Vec<String>,
    /// `(from name, to name)`
    pub modified_indices: Vec<(String, String)>,
    pub added_relations: Vec<String>,
    pub removed_relations: Vec<String>,
    /// `(from name, to name)`
    pub modified_relations: Vec<(String, String)>,
}

impl EntityDiff {
    pub fn new(entity: impl Into<String>) -> Self {
        let entity = entity.into();
        Self {
            from_entity: entity.clone(),
            to_entity: entity,
            ..Self::default()
        }
    }

    pub fn add_field(mut self, name: impl Into<String>) -> Self {
        self.added_fields.push(name.into());
        self
    }

    pub fn remove_field(mut self, name: impl Into<String>) -> Self {
        self.removed_fields.push(name.into());
        self
    }

    pub fn rename_field(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.renamed_fields.push(FieldDiff::new(from, to));
        self
    }

    pub fn modify_field(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.modified_fields.push(FieldDiff::new(name.clone(), name));
        self
    }

    pub fn modify_pk(mut self) -> Self {
        self.modified_pk = true;
        self
    }

    pub fn add_index(mut self, name: impl Into<String>) -> Self {
        self.added_indices.push(name.into());
        self
    }

    pub fn remove_index(mut self, name: impl Into<String>) -> Self {
        self.removed_indices.push(name.into());
        self
    }

    pub fn modify_index(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.modified_indices.push((from.into(), to.into()));
        self
    }

    pub fn add_relation(mut self, name: impl Into<String>) -> Self {
        self.added_relations.push(name.into());
        self
    }

    pub fn remove_relation(mut self, name: impl Into<String>) -> Self {
        self.removed_relations.push(name.into());
        self
    }

    pub fn modify_relation(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.modified_relations.push((from.into(), to.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.added_fields.is_empty()
            && self.removed_fields.is_empty()
            && self.renamed_fields.is_empty()
            && self.modified_fields.is_empty()
            && !self.modified_pk
            && self.added_indices.is_empty()
            && self.removed_indices.is_empty()
            && self.modified_indices.is_empty()
            && self.added_relations.is_empty()
            && self.removed_relations.is_empty()
            && self.modified_relations.is_empty()
    }
}

/// Changes between two versions of one database.
#[derive(Debug, Clone)]
pub struct DatabaseDiff {
    pub from: Database,
    pub to: Database,
    pub added_entities: Vec<String>,
    pub removed_entities: Vec<String>,
    /// `(from name, to name)`
    pub renamed_entities: Vec<(String, String)>,
    pub modified_entities: Vec<EntityDiff>,
}

impl DatabaseDiff {
    pub fn new(from: Database, to: Database) -> Self {
        Self {
            from,
            to,
            added_entities: Vec::new(),
            removed_entities: Vec::new(),
            renamed_entities: Vec::new(),
            modified_entities: Vec::new(),
        }
    }

    pub fn add_entity(mut self, name: impl Into<String>) -> Self {
        self.added_entities.push(name.into());
        self
    }

    pub fn remove_entity(mut self, name: impl Into<String>) -> Self {
        self.removed_entities.push(name.into());
        self
    }

    pub fn rename_entity(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.renamed_entities.push((from.into(), to.into()));
        self
    }

    pub fn modify_entity(mut self, diff: EntityDiff) -> Self {
        self.modified_entities.push(diff);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.added_entities.is_empty()
            && self.removed_entities.is_empty()
            && self.renamed_entities.is_empty()
            && self.modified_entities.iter().all(EntityDiff::is_empty)
    }

    // ---- resolution ----

    pub fn from_entity(&self, name: &str) -> StrataResult<&Entity> {
        lookup_entity(&self.from, name, "from")
    }

    pub fn to_entity(&self, name: &str) -> StrataResult<&Entity> {
        lookup_entity(&self.to, name, "to")
    }

    /// The `from` side of `entity_diff` as it stands once the entity renames
    /// of this diff have run: old constraint names on the new table.
    pub fn source_entity(&self, entity_diff: &EntityDiff) -> StrataResult<Cow<'_, Entity>> {
        let from = self.from_entity(&entity_diff.from_entity)?;
        let Some((_, renamed)) = self
            .renamed_entities
            .iter()
            .find(|(old, _)| *old == entity_diff.from_entity)
        else {
            return Ok(Cow::Borrowed(from));
        };
        let to = self.to_entity(renamed)?;
        if to.table_name() == from.table_name() {
            return Ok(Cow::Borrowed(from));
        }
        Ok(Cow::Owned(from.retabled(to.table_name())))
    }
}

fn lookup_entity<'a>(db: &'a Database, name: &str, side: &str) -> StrataResult<&'a Entity> {
    db.entity(name).ok_or_else(|| {
        StrataError::InvalidDiff(format!(
            "entity '{}' does not exist in the '{}' database '{}'",
            name,
            side,
            db.name()
        ))
    })
}

/// Resolve a field by name on one side of an entity diff.
pub fn lookup_field<'a>(entity: &'a Entity, name: &str) -> StrataResult<&'a Field> {
    entity.field(name).ok_or_else(|| {
        StrataError::InvalidDiff(format!(
            "field '{}' does not exist in entity '{}'",
            name,
            entity.name()
        ))
    })
}

/// Resolve an index or unique constraint by name.
pub fn lookup_index<'a>(entity: &'a Entity, name: &str) -> StrataResult<&'a Index> {
    entity
        .indices()
        .iter()
        .chain(entity.unices().iter())
        .find(|i| i.name() == name)
        .ok_or_else(|| {
            StrataError::InvalidDiff(format!(
                "index '{}' does not exist in entity '{}'",
                name,
                entity.name()
            ))
        })
}

pub fn lookup_relation<'a>(entity: &'a Entity, name: &str) -> StrataResult<&'a Relation> {
    entity.relation(name).ok_or_else(|| {
        StrataError::InvalidDiff(format!(
            "relation '{}' does not exist in entity '{}'",
            name,
            entity.name()
        ))
    })
}

/// Name-based comparison of two finalized databases.
pub fn compare(from: &Database, to: &Database) -> DatabaseDiff {
    let mut diff = DatabaseDiff::new(from.clone(), to.clone());

    for entity in to.entities_for_sql() {
        match from.entity(entity.name()) {
            None => diff.added_entities.push(entity.name().to_string()),
            Some(old) => {
                let entity_diff = compare_entities(old, entity);
                if !entity_diff.is_empty() {
                    diff.modified_entities.push(entity_diff);
                }
            }
        }
    }
    for entity in from.entities_for_sql() {
        if to.entity(entity.name()).is_none() {
            diff.removed_entities.push(entity.name().to_string());
        }
    }
    diff
}

/// Field-, index- and relation-level comparison of one entity.
pub fn compare_entities(from: &Entity, to: &Entity) -> EntityDiff {
    let mut diff = EntityDiff {
        from_entity: from.name().to_string(),
        to_entity: to.name().to_string(),
        ..EntityDiff::default()
    };

    for field in to.fields() {
        match from.field(field.name()) {
            None => diff.added_fields.push(field.name().to_string()),
            Some(old) if fields_differ(old, field) => {
                diff.modified_fields
                    .push(FieldDiff::new(old.name(), field.name()));
            }
            Some(_) => {}
        }
    }
    for field in from.fields() {
        if !to.has_field(field.name()) {
            diff.removed_fields.push(field.name().to_string());
        }
    }
    diff.modified_pk = from.primary_key_names() != to.primary_key_names();

    let old_indices: Vec<&Index> = from.indices().iter().chain(from.unices()).collect();
    let new_indices: Vec<&Index> = to.indices().iter().chain(to.unices()).collect();
    for index in &new_indices {
        let name = index.name();
        match old_indices.iter().find(|i| i.name() == name) {
            None => diff.added_indices.push(name),
            Some(old) if old.fields() != index.fields() || old.is_unique() != index.is_unique() => {
                diff.modified_indices.push((name.clone(), name));
            }
            Some(_) => {}
        }
    }
    for index in &old_indices {
        let name = index.name();
        if !new_indices.iter().any(|i| i.name() == name) {
            diff.removed_indices.push(name);
        }
    }

    for relation in to.relations() {
        let name = relation.name();
        match from.relation(&name) {
            None => diff.added_relations.push(name),
            Some(old) if relations_differ(old, relation) => {
                diff.modified_relations.push((name.clone(), name));
            }
            Some(_) => {}
        }
    }
    for relation in from.relations() {
        let name = relation.name();
        if to.relation(&name).is_none() {
            diff.removed_relations.push(name);
        }
    }
    diff
}

fn fields_differ(a: &Field, b: &Field) -> bool {
    a.column_name() != b.column_name()
        || a.field_type() != b.field_type()
        || a.sql_type() != b.sql_type()
        || a.get_size() != b.get_size()
        || a.get_scale() != b.get_scale()
        || a.is_not_null() != b.is_not_null()
        || a.is_auto_increment() != b.is_auto_increment()
        || a.is_unique() != b.is_unique()
        || a.get_default_value() != b.get_default_value()
        || a.value_set() != b.value_set()
}

fn relations_differ(a: &Relation, b: &Relation) -> bool {
    a.foreign_table_name() != b.foreign_table_name()
        || a.local_fields() != b.local_fields()
        || a.foreign_fields() != b.foreign_fields()
        || a.get_on_delete() != b.get_on_delete()
        || a.get_on_update() != b.get_on_update()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDefaultValue, FieldType};

    fn bookstore(with_isbn: bool) -> Database {
        let mut db = Database::new("bookstore");
        let mut book = Entity::new("book");
        book.add_field(Field::new("id", FieldType::Integer).primary_key())
            .unwrap();
        book.add_field(Field::new("title", FieldType::Varchar).size(100))
            .unwrap();
        if with_isbn {
            book.add_field(Field::new("isbn", FieldType::Varchar).size(24))
                .unwrap();
        }
        db.add_entity(book).unwrap();
        db
    }

    #[test]
    fn test_compare_detects_field_changes() {
        let from = bookstore(false);
        let mut to = bookstore(true);
        to.entity_mut("book")
            .unwrap()
            .field_mut("title")
            .unwrap()
            .set_default_value(Some(FieldDefaultValue::new("untitled")));
        to.add_entity(Entity::new("author")).unwrap();

        let diff = compare(&from, &to);
        assert_eq!(diff.added_entities, vec!["author"]);
        let book = &diff.modified_entities[0];
        assert_eq!(book.added_fields, vec!["isbn"]);
        assert_eq!(book.modified_fields, vec![FieldDiff::new("title", "title")]);
        assert!(!book.modified_pk);
    }

    #[test]
    fn test_compare_sees_unique_flag() {
        let from = bookstore(false);
        let mut to = bookstore(false);
        to.entity_mut("book")
            .unwrap()
            .field_mut("title")
            .unwrap()
            .set_unique(true);
        let diff = compare(&from, &to);
        assert_eq!(
            diff.modified_entities[0].modified_fields,
            vec![FieldDiff::new("title", "title")]
        );
    }

    #[test]
    fn test_source_entity_follows_renames() {
        let from = bookstore(false);
        let mut to = bookstore(false);
        to.entity_mut("book")
            .unwrap()
            .set_table_name(Some("books".into()));
        let plain = DatabaseDiff::new(from, to);
        let entity_diff = EntityDiff::new("book");
        assert_eq!(plain.source_entity(&entity_diff).unwrap().table_name(), "book");

        let renamed = plain.rename_entity("book", "book");
        let source = renamed.source_entity(&entity_diff).unwrap();
        assert_eq!(source.table_name(), "books");
        assert_eq!(source.primary_key_name(), "book_pk");
    }

    #[test]
    fn test_compare_identical_is_empty() {
        let diff = compare(&bookstore(true), &bookstore(true));
        assert!(diff.is_empty());
    }

    #[test]
    fn test_unresolvable_name_is_invalid_diff() {
        let diff = DatabaseDiff::new(bookstore(false), bookstore(false));
        assert!(matches!(
            diff.from_entity("author"),
            Err(StrataError::InvalidDiff(_))
        ));
    }
}
