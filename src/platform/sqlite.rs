//! SQLite dialect.
//!
//! Foreign keys can only be declared in `CREATE TABLE`, and most column
//! changes need the table to be rebuilt through a temporary copy.

use super::{Platform, PlatformConfig, PlatformKind, ddl, migration};
use crate::diff::{DatabaseDiff, EntityDiff, lookup_field, lookup_index};
use crate::error::StrataResult;
use crate::model::{Database, Domain, Entity, Field, FieldType, Named, Relation};

#[derive(Debug, Clone, Default)]
pub struct SqlitePlatform {
    config: PlatformConfig,
}

impl SqlitePlatform {
    pub fn new(config: PlatformConfig) -> Self {
        Self { config }
    }

    /// The single auto-increment primary key, rendered inline.
    fn inline_key<'a>(&self, entity: &'a Entity) -> Option<&'a Field> {
        let pk = entity.primary_key();
        match pk.as_slice() {
            [field] if field.is_auto_increment() => Some(field),
            _ => None,
        }
    }

    /// Copy the old table aside, create the new shape and move rows back.
    fn rebuild_ddl(
        &self,
        diff: &DatabaseDiff,
        from: &Entity,
        to: &Entity,
        entity_diff: &EntityDiff,
    ) -> StrataResult<String> {
        let mut from_columns = Vec::new();
        let mut to_columns = Vec::new();
        for field in to.fields() {
            if entity_diff.added_fields.iter().any(|f| f == field.name()) {
                continue;
            }
            let source = entity_diff
                .renamed_fields
                .iter()
                .find(|r| r.to == field.name())
                .map(|r| r.from.as_str())
                .unwrap_or(field.name());
            if let Some(old) = from.field(source) {
                from_columns.push(old.column_name());
                to_columns.push(field.column_name());
            }
        }

        let temp = self.quote_identifier(&format!("{}__temp__", to.table_name()));
        let from_table = self.table_identifier(from);
        let from_list = self.column_list_ddl(&from_columns);
        tracing::debug!("Rebuilding table '{}' through a temporary copy", to.table_name());

        Ok(format!(
            "\nCREATE TEMPORARY TABLE {temp} AS SELECT {from_list} FROM {from_table};\nDROP TABLE {from_table};\n{create}{indices}\nINSERT INTO {to_table} ({to_list}) SELECT {from_list} FROM {temp};\nDROP TABLE {temp};\n",
            create = self.add_entity_ddl(&diff.to, to)?,
            indices = self.add_indices_ddl(to),
            to_table = self.table_identifier(to),
            to_list = self.column_list_ddl(&to_columns),
        ))
    }
}

impl Platform for SqlitePlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Sqlite
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }

    fn domain_for_type(&self, field_type: FieldType) -> Option<Domain> {
        let sql_type = match field_type {
            FieldType::LongVarchar | FieldType::Clob | FieldType::Array | FieldType::Json => "TEXT",
            FieldType::Binary
            | FieldType::VarBinary
            | FieldType::LongVarBinary
            | FieldType::Blob
            | FieldType::Object
            | FieldType::Geometry => "BLOB",
            FieldType::Enum => "TINYINT",
            FieldType::Set | FieldType::BooleanEmu => "INTEGER",
            FieldType::Uuid => "CHAR",
            other => return ddl::standard_domain(other),
        };
        let domain = Domain::with_sql_type(field_type, sql_type);
        Some(if field_type == FieldType::Uuid {
            domain.with_size(36)
        } else {
            domain
        })
    }

    fn has_size(&self, sql_type: &str) -> bool {
        !matches!(sql_type.to_uppercase().as_str(), "TEXT" | "BLOB" | "INTEGER")
    }

    /// Only an inline `INTEGER PRIMARY KEY` can auto-increment.
    fn auto_increment_token(&self) -> &'static str {
        ""
    }

    fn column_ddl(&self, entity: &Entity, field: &Field) -> StrataResult<String> {
        if self.inline_key(entity).is_some_and(|key| key.name() == field.name()) {
            return Ok(format!(
                "{} INTEGER PRIMARY KEY AUTOINCREMENT",
                self.quote_identifier(&field.column_name())
            ));
        }
        ddl::column_ddl(self, entity, field)
    }

    fn primary_key_ddl(&self, entity: &Entity) -> String {
        if self.inline_key(entity).is_some() {
            return String::new();
        }
        ddl::primary_key_ddl(self, entity)
    }

    fn add_foreign_key_ddl(&self, _database: &Database, _entity: &Entity, _relation: &Relation) -> String {
        String::new()
    }

    fn drop_foreign_key_ddl(&self, _entity: &Entity, _relation: &Relation) -> String {
        String::new()
    }

    fn drop_entity_ddl(&self, entity: &Entity) -> String {
        format!("\nDROP TABLE IF EXISTS {};\n", self.table_identifier(entity))
    }

    fn add_entity_ddl(&self, database: &Database, entity: &Entity) -> StrataResult<String> {
        let mut lines = Vec::new();
        for field in entity.fields() {
            lines.push(self.column_ddl(entity, field)?);
        }
        let pk = self.primary_key_ddl(entity);
        if !pk.is_empty() {
            lines.push(pk);
        }
        for unique in entity.unices() {
            lines.push(self.unique_ddl(entity, unique));
        }
        for relation in entity.relations() {
            if relation.is_skip_sql() {
                continue;
            }
            lines.push(
                self.foreign_key_ddl(database, entity, relation)
                    .replace("\n    ", "\n        "),
            );
        }
        Ok(format!(
            "\nCREATE TABLE {}\n(\n    {}\n);\n",
            self.table_identifier(entity),
            lines.join(",\n    ")
        ))
    }

    fn rename_field_ddl(&self, entity: &Entity, from: &Field, to: &Field) -> StrataResult<String> {
        Ok(format!(
            "\nALTER TABLE {} RENAME COLUMN {} TO {};\n",
            self.table_identifier(entity),
            self.quote_identifier(&from.column_name()),
            self.quote_identifier(&to.column_name())
        ))
    }

    fn add_fields_ddl(&self, entity: &Entity, fields: &[&Field]) -> StrataResult<String> {
        let mut ret = String::new();
        for field in fields {
            ret.push_str(&format!(
                "\nALTER TABLE {} ADD COLUMN {};\n",
                self.table_identifier(entity),
                self.column_ddl(entity, field)?
            ));
        }
        Ok(ret)
    }

    /// Renames, added columns and index changes map to plain statements;
    /// anything else rebuilds the table.
    fn modify_entity_ddl(&self, diff: &DatabaseDiff, entity_diff: &EntityDiff) -> StrataResult<String> {
        let source = diff.source_entity(entity_diff)?;
        let from = &*source;
        let to = diff.to_entity(&entity_diff.to_entity)?;

        let needs_rebuild = !entity_diff.modified_fields.is_empty()
            || !entity_diff.removed_fields.is_empty()
            || entity_diff.modified_pk
            || !entity_diff.added_relations.is_empty()
            || !entity_diff.removed_relations.is_empty()
            || !entity_diff.modified_relations.is_empty();
        if needs_rebuild {
            return self.rebuild_ddl(diff, from, to, entity_diff);
        }

        let mut ret = String::new();
        let dropped = entity_diff
            .removed_indices
            .iter()
            .chain(entity_diff.modified_indices.iter().map(|(old, _)| old));
        for name in dropped {
            ret.push_str(&self.drop_index_ddl(from, lookup_index(from, name)?));
        }
        for rename in &entity_diff.renamed_fields {
            ret.push_str(&self.rename_field_ddl(
                to,
                lookup_field(from, &rename.from)?,
                lookup_field(to, &rename.to)?,
            )?);
        }
        ret.push_str(&self.add_fields_ddl(to, &migration::added_fields(to, entity_diff)?)?);
        ret.push_str(&migration::add_constraints_ddl(self, diff, to, entity_diff)?);
        Ok(ret)
    }
}
