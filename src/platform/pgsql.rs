//! PostgreSQL dialect.

use super::{NamingCache, Platform, PlatformConfig, PlatformKind, ddl};
use crate::error::StrataResult;
use crate::model::naming::truncate;
use crate::model::Named;
use crate::model::{Database, Describable, Domain, Entity, Field, FieldType, Index};

const UNSIZED_TYPES: &[&str] = &["BYTEA", "TEXT", "DOUBLE PRECISION"];

/// NAMEDATALEN - 1.
const MAX_IDENTIFIER_LENGTH: usize = 63;

#[derive(Debug, Clone, Default)]
pub struct PgsqlPlatform {
    config: PlatformConfig,
}

impl PgsqlPlatform {
    pub fn new(config: PlatformConfig) -> Self {
        Self { config }
    }

    /// Whether the entity owns an explicitly named sequence.
    fn has_own_sequence(entity: &Entity) -> bool {
        entity.is_native_id_method() && entity.id_method_parameter().is_some()
    }

    fn sequence_identifier(&self, entity: &Entity) -> String {
        self.quote_identifier(&entity.sequence_name().to_lowercase())
    }

    fn comments_ddl(&self, entity: &Entity) -> String {
        let mut ret = String::new();
        let table = self.table_identifier(entity);
        if let Some(description) = entity.description()
            && !description.is_empty()
        {
            ret.push_str(&format!(
                "\nCOMMENT ON TABLE {} IS {};\n",
                table,
                self.quote(description)
            ));
        }
        for field in entity.fields() {
            if let Some(description) = field.description()
                && !description.is_empty()
            {
                ret.push_str(&format!(
                    "\nCOMMENT ON COLUMN {}.{} IS {};\n",
                    table,
                    self.quote_identifier(&field.column_name()),
                    self.quote(description)
                ));
            }
        }
        ret
    }

    fn alter_column(&self, entity: &Entity, field: &Field, change: &str) -> String {
        format!(
            "\nALTER TABLE {} ALTER COLUMN {} {};\n",
            self.table_identifier(entity),
            self.quote_identifier(&field.column_name()),
            change
        )
    }
}

impl Platform for PgsqlPlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Pgsql
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }

    fn domain_for_type(&self, field_type: FieldType) -> Option<Domain> {
        let sql_type = match field_type {
            FieldType::TinyInt | FieldType::SmallInt | FieldType::Enum => "INT2",
            FieldType::BigInt => "INT8",
            FieldType::Set => "INT4",
            FieldType::Real => "REAL",
            FieldType::Float | FieldType::Double => "DOUBLE PRECISION",
            FieldType::Decimal | FieldType::Numeric => "NUMERIC",
            FieldType::LongVarchar | FieldType::Clob | FieldType::Array => "TEXT",
            FieldType::Binary
            | FieldType::VarBinary
            | FieldType::LongVarBinary
            | FieldType::Blob
            | FieldType::Object => "BYTEA",
            FieldType::BooleanEmu => "INT2",
            FieldType::Json => "JSON",
            FieldType::Geometry => "GEOMETRY",
            other => return ddl::standard_domain(other),
        };
        Some(Domain::with_sql_type(field_type, sql_type))
    }

    fn has_size(&self, sql_type: &str) -> bool {
        !UNSIZED_TYPES.contains(&sql_type.to_uppercase().as_str())
    }

    fn max_identifier_length(&self) -> usize {
        MAX_IDENTIFIER_LENGTH
    }

    fn supports_schemas(&self) -> bool {
        true
    }

    fn boolean_string(&self, value: &str) -> String {
        if ddl::is_truthy(value) { "TRUE" } else { "FALSE" }.to_string()
    }

    /// Auto-increment is expressed through the column type.
    fn auto_increment_token(&self) -> &'static str {
        ""
    }

    /// `serial` / `bigserial` unless the entity names its own sequence.
    fn column_sql_type(&self, entity: &Entity, field: &Field) -> StrataResult<String> {
        if field.is_auto_increment() && entity.id_method_parameter().is_none() {
            let serial = if field.field_type() == FieldType::BigInt {
                "bigserial"
            } else {
                "serial"
            };
            return Ok(serial.to_string());
        }
        ddl::column_sql_type(self, entity, field)
    }

    fn unique_ddl(&self, entity: &Entity, unique: &Index) -> String {
        let columns: Vec<String> = unique
            .field_names()
            .iter()
            .map(|n| ddl::field_column(entity, n))
            .collect();
        format!(
            "CONSTRAINT {} UNIQUE ({})",
            self.quote_identifier(&unique.name()),
            self.column_list_ddl(&columns)
        )
    }

    fn drop_entity_ddl(&self, entity: &Entity) -> String {
        let mut ret = format!(
            "\nDROP TABLE IF EXISTS {} CASCADE;\n",
            self.table_identifier(entity)
        );
        if Self::has_own_sequence(entity) {
            ret.push_str(&format!("\nDROP SEQUENCE {};\n", self.sequence_identifier(entity)));
        }
        ret
    }

    fn add_entity_ddl(&self, database: &Database, entity: &Entity) -> StrataResult<String> {
        let mut ret = String::new();
        if Self::has_own_sequence(entity) {
            ret.push_str(&format!("\nCREATE SEQUENCE {};\n", self.sequence_identifier(entity)));
        }
        ret.push_str(&ddl::add_entity_ddl(self, database, entity)?);
        ret.push_str(&self.comments_ddl(entity));
        Ok(ret)
    }

    /// Pick the sequence name, shortening overlong ones through `cache`.
    fn finalize_entity(
        &self,
        database: &mut Database,
        name: &str,
        cache: &mut NamingCache,
    ) -> StrataResult<()> {
        let Some(entity) = database.entity_mut(name) else {
            return Ok(());
        };
        if !entity.is_native_id_method() {
            return Ok(());
        }
        let sequence = match entity.id_method_parameter() {
            Some(parameter) => {
                let mut sequence = parameter.to_string();
                truncate(&mut sequence, MAX_IDENTIFIER_LENGTH);
                sequence
            }
            None => cache.shortened(entity.table_name(), "_SEQ", MAX_IDENTIFIER_LENGTH),
        };
        tracing::debug!("Sequence for '{}' is '{}'", entity.name(), sequence);
        entity.set_sequence_name(Some(sequence));
        Ok(())
    }

    /// One `ALTER COLUMN` per changed property.
    fn modify_fields_ddl(&self, entity: &Entity, changes: &[(&Field, &Field)]) -> StrataResult<String> {
        let mut ret = String::new();
        for (from, to) in changes {
            let from_type = self.column_sql_type(entity, from)?;
            let to_type = self.column_sql_type(entity, to)?;
            if from_type != to_type {
                ret.push_str(&self.alter_column(entity, to, &format!("TYPE {}", to_type)));
            }
            if from.get_default_value() != to.get_default_value() {
                let default = self.column_default_value_ddl(entity, to)?;
                let change = if default.is_empty() {
                    "DROP DEFAULT".to_string()
                } else {
                    format!("SET {}", default)
                };
                ret.push_str(&self.alter_column(entity, to, &change));
            }
            if from.is_not_null() != to.is_not_null() {
                let change = if to.is_not_null() { "SET NOT NULL" } else { "DROP NOT NULL" };
                ret.push_str(&self.alter_column(entity, to, change));
            }
        }
        Ok(ret)
    }

    fn add_fields_ddl(&self, entity: &Entity, fields: &[&Field]) -> StrataResult<String> {
        let mut ret = String::new();
        for field in fields {
            ret.push_str(&format!(
                "\nALTER TABLE {} ADD {};\n",
                self.table_identifier(entity),
                self.column_ddl(entity, field)?
            ));
        }
        Ok(ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{DatabaseDiff, EntityDiff};
    use crate::model::FieldDefaultValue;
    use crate::platform::finalize_database;
    use pretty_assertions::assert_eq;

    fn platform() -> PgsqlPlatform {
        PgsqlPlatform::default()
    }

    fn bookstore() -> Database {
        let mut db = Database::new("bookstore");
        let book = db.add_entity(Entity::new("book")).unwrap();
        book.add_field(Field::new("id", FieldType::BigInt).primary_key().auto_increment())
            .unwrap();
        book.add_field(Field::new("title", FieldType::LongVarchar))
            .unwrap();
        book.add_field(
            Field::new("available", FieldType::Boolean)
                .default_value(FieldDefaultValue::new("true")),
        )
        .unwrap();
        db
    }

    #[test]
    fn test_serial_and_boolean() {
        let db = bookstore();
        let sql = platform()
            .add_entity_ddl(&db, db.entity("book").unwrap())
            .unwrap();
        assert_eq!(
            sql,
            "\nCREATE TABLE \"book\"\n(\n    \"id\" bigserial NOT NULL,\n    \"title\" TEXT,\n    \"available\" BOOLEAN DEFAULT TRUE,\n    PRIMARY KEY (\"id\")\n);\n"
        );
    }

    #[test]
    fn test_explicit_sequence() {
        let mut db = bookstore();
        db.entity_mut("book")
            .unwrap()
            .set_id_method_parameter(Some("Book_Id_Seq".to_string()));
        let p = platform();
        finalize_database(&mut db, &p).unwrap();
        let book = db.entity("book").unwrap();
        assert_eq!(book.sequence_name(), "Book_Id_Seq");
        let sql = p.add_entity_ddl(&db, book).unwrap();
        assert!(sql.starts_with("\nCREATE SEQUENCE \"book_id_seq\";\n"));
        assert!(sql.contains("\"id\" INT8 NOT NULL"));
        assert!(p.drop_entity_ddl(book).ends_with("\nDROP SEQUENCE \"book_id_seq\";\n"));
    }

    #[test]
    fn test_long_sequence_names_are_counted() {
        let mut db = Database::new("bookstore");
        for prefix in ["a", "b"] {
            let mut entity = Entity::new(format!("{}{}", prefix, "x".repeat(62)));
            entity
                .add_field(Field::new("id", FieldType::Integer).primary_key().auto_increment())
                .unwrap();
            db.add_entity(entity).unwrap();
        }
        finalize_database(&mut db, &platform()).unwrap();
        let names: Vec<String> = db.entities().iter().map(Entity::sequence_name).collect();
        assert!(names[0].ends_with("_SEQ_1"));
        assert!(names[1].ends_with("_SEQ_2"));
        assert!(names.iter().all(|n| n.len() == MAX_IDENTIFIER_LENGTH));
    }

    #[test]
    fn test_schema_qualified_names() {
        let mut db = bookstore();
        db.entity_mut("book")
            .unwrap()
            .set_schema(Some("library".to_string()));
        let p = platform();
        let book = db.entity("book").unwrap();
        assert_eq!(p.table_identifier(book), "\"library\".\"book\"");
    }

    #[test]
    fn test_alter_column_per_property() {
        let from = bookstore();
        let mut to = bookstore();
        let title = to.entity_mut("book").unwrap().field_mut("title").unwrap();
        title.set_not_null(true);
        let diff = DatabaseDiff::new(from, to)
            .modify_entity(EntityDiff::new("book").modify_field("title"));
        assert_eq!(
            platform().get_modify_database_ddl(&diff).unwrap(),
            "\nALTER TABLE \"book\" ALTER COLUMN \"title\" SET NOT NULL;\n"
        );
    }
}
