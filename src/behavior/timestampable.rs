//! `timestampable`: creation/update timestamp columns.

use std::collections::BTreeMap;

use super::{Behavior, BehaviorModifier};
use crate::error::{StrataError, StrataResult};
use crate::model::{Database, Field, FieldType};

/// Adds `created_at` / `updated_at` TIMESTAMP fields to its entity.
///
/// Parameters: `create_column`, `update_column`, `disable_created_at`,
/// `disable_updated_at`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Timestampable;

impl BehaviorModifier for Timestampable {
    fn default_parameters(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("create_column".to_string(), "created_at".to_string()),
            ("update_column".to_string(), "updated_at".to_string()),
            ("disable_created_at".to_string(), "false".to_string()),
            ("disable_updated_at".to_string(), "false".to_string()),
        ])
    }

    fn modify_entity(
        &self,
        behavior: &Behavior,
        database: &mut Database,
        entity: &str,
    ) -> StrataResult<()> {
        let available: Vec<String> = database.entity_names().map(str::to_string).collect();
        let target = database.entity_mut(entity).ok_or_else(|| {
            StrataError::unknown_entity(
                entity,
                format!("behavior '{}'", behavior.id()),
                available.iter().map(String::as_str),
            )
        })?;

        let columns = [
            ("disable_created_at", "create_column"),
            ("disable_updated_at", "update_column"),
        ];
        for (disable, column) in columns {
            if behavior.is_parameter_true(disable) {
                continue;
            }
            let Some(name) = behavior.parameter(column) else {
                continue;
            };
            if target.has_field(name) {
                continue;
            }
            tracing::debug!("timestampable: adding '{}' to '{}'", name, entity);
            target.add_field(Field::new(name, FieldType::Timestamp))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Entity;

    #[test]
    fn test_adds_columns_once() {
        let mut db = Database::new("bookstore");
        db.add_entity(Entity::new("book")).unwrap();
        let behavior = Behavior::new("timestampable", Timestampable);

        behavior.modify_entity(&mut db, "book").unwrap();
        behavior.modify_entity(&mut db, "book").unwrap();

        let book = db.entity("book").unwrap();
        assert_eq!(book.fields().len(), 2);
        assert_eq!(book.field("updated_at").unwrap().field_type(), FieldType::Timestamp);
    }

    #[test]
    fn test_disable_column() {
        let mut db = Database::new("bookstore");
        db.add_entity(Entity::new("book")).unwrap();
        let mut behavior = Behavior::new("timestampable", Timestampable);
        behavior.set_parameter("disable_updated_at", Some("true"));

        behavior.modify_entity(&mut db, "book").unwrap();

        let book = db.entity("book").unwrap();
        assert!(book.has_field("created_at"));
        assert!(!book.has_field("updated_at"));
    }
}
