//! SQL dialects.
//!
//! [`Platform`] is the DDL compiler. Its default methods render generic
//! SQL; each dialect overrides what it does differently and reaches the
//! generic rendering through the free functions in [`ddl`] and
//! [`migration`].
//!
//! # Example
//! ```ignore
//! use strata::platform::{PlatformConfig, PlatformKind};
//!
//! let platform = PlatformKind::from_name("mysql")?.platform(&PlatformConfig::default());
//! schema.finalize(platform.as_ref())?;
//! let sql = platform.get_add_entities_ddl(schema.database("bookstore").unwrap())?;
//! ```

pub mod ddl;
pub mod finalize;
pub mod migration;
mod mysql;
mod pgsql;
mod sql;
mod sqlite;

pub use finalize::{NamingCache, finalize_database};
pub use mysql::MysqlPlatform;
pub use pgsql::PgsqlPlatform;
pub use sql::SqlPlatform;
pub use sqlite::SqlitePlatform;

use std::fmt;
use std::str::FromStr;

use crate::diff::{DatabaseDiff, EntityDiff};
use crate::error::{StrataError, StrataResult};
use crate::model::naming::MAX_IDENTIFIER_LENGTH;
use crate::model::{Database, Domain, Entity, Field, FieldType, Index, Relation};

/// Rendering options shared by every dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Quote table, column and constraint names.
    pub identifier_quoting: bool,
    /// MySQL storage engine used when an entity does not name one.
    pub mysql_table_type: String,
    /// `ENGINE` (or the legacy `TYPE`) in MySQL table options.
    pub mysql_table_engine_keyword: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            identifier_quoting: true,
            mysql_table_type: "InnoDB".to_string(),
            mysql_table_engine_keyword: "ENGINE".to_string(),
        }
    }
}

/// The closed set of supported dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlatformKind {
    /// Generic SQL.
    #[default]
    Sql,
    Mysql,
    Pgsql,
    Sqlite,
}

/// Accepted identifiers, first entry per dialect is canonical.
const PLATFORM_NAMES: &[(&str, PlatformKind)] = &[
    ("sql", PlatformKind::Sql),
    ("default", PlatformKind::Sql),
    ("generic", PlatformKind::Sql),
    ("mysql", PlatformKind::Mysql),
    ("pgsql", PlatformKind::Pgsql),
    ("postgres", PlatformKind::Pgsql),
    ("postgresql", PlatformKind::Pgsql),
    ("sqlite", PlatformKind::Sqlite),
];

impl PlatformKind {
    pub const ALL: [PlatformKind; 4] = [Self::Sql, Self::Mysql, Self::Pgsql, Self::Sqlite];

    /// Stable identifier; also the vendor namespace key.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::Mysql => "mysql",
            Self::Pgsql => "pgsql",
            Self::Sqlite => "sqlite",
        }
    }

    pub fn from_name(name: &str) -> StrataResult<Self> {
        let lower = name.trim().to_lowercase();
        PLATFORM_NAMES
            .iter()
            .find(|(n, _)| *n == lower)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| StrataError::UnknownPlatform(name.to_string()))
    }

    /// Every accepted identifier for this dialect.
    pub fn aliases(&self) -> Vec<&'static str> {
        PLATFORM_NAMES
            .iter()
            .filter(|(_, kind)| kind == self)
            .map(|(n, _)| *n)
            .collect()
    }

    pub fn platform(&self, config: &PlatformConfig) -> Box<dyn Platform> {
        match self {
            Self::Sql => Box::new(SqlPlatform::new(config.clone())),
            Self::Mysql => Box::new(MysqlPlatform::new(config.clone())),
            Self::Pgsql => Box::new(PgsqlPlatform::new(config.clone())),
            Self::Sqlite => Box::new(SqlitePlatform::new(config.clone())),
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformKind {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// Dialect-specific DDL rendering and model finalization.
///
/// All rendering methods are pure functions of the (finalized) model.
pub trait Platform: Send + Sync {
    fn kind(&self) -> PlatformKind;

    fn config(&self) -> &PlatformConfig;

    /// Vendor namespace key.
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    // ---- capabilities ----

    /// Native domain for an abstract type, `None` when unmappable.
    fn domain_for_type(&self, field_type: FieldType) -> Option<Domain> {
        ddl::standard_domain(field_type)
    }

    /// Whether `sql_type` takes a `(size[,scale])` suffix.
    fn has_size(&self, _sql_type: &str) -> bool {
        true
    }

    /// Size the dialect assumes when none is given.
    fn default_type_size(&self, _field_type: FieldType) -> Option<u32> {
        None
    }

    fn max_identifier_length(&self) -> usize {
        MAX_IDENTIFIER_LENGTH
    }

    fn supports_index_size(&self) -> bool {
        false
    }

    fn supports_schemas(&self) -> bool {
        false
    }

    fn supports_foreign_keys(&self, _entity: &Entity) -> bool {
        true
    }

    // ---- literals ----

    fn quote_identifier(&self, text: &str) -> String {
        ddl::quote_identifier(self, text, '"', '"')
    }

    /// Quoted string literal.
    fn quote(&self, text: &str) -> String {
        ddl::quote(text)
    }

    fn boolean_string(&self, value: &str) -> String {
        ddl::boolean_string(value)
    }

    fn auto_increment_token(&self) -> &'static str {
        "IDENTITY"
    }

    fn null_string(&self, not_null: bool) -> &'static str {
        if not_null { "NOT NULL" } else { "" }
    }

    fn table_identifier(&self, entity: &Entity) -> String {
        ddl::table_identifier(self, entity)
    }

    // ---- fields ----

    fn column_sql_type(&self, entity: &Entity, field: &Field) -> StrataResult<String> {
        ddl::column_sql_type(self, entity, field)
    }

    fn column_default_value_ddl(&self, entity: &Entity, field: &Field) -> StrataResult<String> {
        ddl::column_default_value_ddl(self, entity, field)
    }

    fn column_ddl(&self, entity: &Entity, field: &Field) -> StrataResult<String> {
        ddl::column_ddl(self, entity, field)
    }

    fn column_list_ddl(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    // ---- keys & indices ----

    fn primary_key_fields<'a>(&self, entity: &'a Entity) -> Vec<&'a Field> {
        entity.primary_key()
    }

    fn primary_key_name(&self, entity: &Entity) -> String {
        entity.primary_key_name()
    }

    fn primary_key_ddl(&self, entity: &Entity) -> String {
        ddl::primary_key_ddl(self, entity)
    }

    fn unique_ddl(&self, entity: &Entity, unique: &Index) -> String {
        ddl::unique_ddl(self, entity, unique)
    }

    /// `UNIQUE `, a vendor `Index_type` or nothing.
    fn index_type_ddl(&self, index: &Index) -> String {
        ddl::index_type_ddl(self, index)
    }

    fn index_column_list_ddl(&self, entity: &Entity, index: &Index) -> String {
        ddl::index_column_list_ddl(self, entity, index)
    }

    fn add_index_ddl(&self, entity: &Entity, index: &Index) -> String {
        ddl::add_index_ddl(self, entity, index)
    }

    fn add_indices_ddl(&self, entity: &Entity) -> String {
        entity
            .indices()
            .iter()
            .map(|i| self.add_index_ddl(entity, i))
            .collect()
    }

    fn drop_index_ddl(&self, entity: &Entity, index: &Index) -> String {
        ddl::drop_index_ddl(self, entity, index)
    }

    fn foreign_key_ddl(&self, database: &Database, entity: &Entity, relation: &Relation) -> String {
        ddl::foreign_key_ddl(self, database, entity, relation)
    }

    fn add_foreign_key_ddl(
        &self,
        database: &Database,
        entity: &Entity,
        relation: &Relation,
    ) -> String {
        ddl::add_foreign_key_ddl(self, database, entity, relation)
    }

    fn add_foreign_keys_ddl(&self, database: &Database, entity: &Entity) -> String {
        entity
            .relations()
            .iter()
            .map(|r| self.add_foreign_key_ddl(database, entity, r))
            .collect()
    }

    fn drop_foreign_key_ddl(&self, entity: &Entity, relation: &Relation) -> String {
        ddl::drop_foreign_key_ddl(self, entity, relation)
    }

    // ---- entities ----

    fn comment_block_ddl(&self, comment: &str) -> String {
        ddl::comment_block_ddl(comment, "--")
    }

    fn comment_line_ddl(&self, comment: &str) -> String {
        format!("-- {} \n", comment)
    }

    /// Prologue of a full script.
    fn begin_ddl(&self) -> String {
        String::new()
    }

    /// Epilogue of a full script.
    fn end_ddl(&self) -> String {
        String::new()
    }

    fn drop_entity_ddl(&self, entity: &Entity) -> String {
        format!("\nDROP TABLE {};\n", self.table_identifier(entity))
    }

    fn add_entity_ddl(&self, database: &Database, entity: &Entity) -> StrataResult<String> {
        ddl::add_entity_ddl(self, database, entity)
    }

    /// Dialect adjustments applied to a copy of the model before rendering.
    fn normalize_entity(&self, database: &mut Database, entity: &str) -> StrataResult<()> {
        ddl::normalize_entity(self, database, entity)
    }

    /// Full creation script of every SQL-eligible entity.
    fn get_add_entities_ddl(&self, database: &Database) -> StrataResult<String> {
        ddl::add_entities_ddl(self, database)
    }

    // ---- finalization ----

    /// Dialect pass run after relations and referrers are wired.
    fn finalize_entity(
        &self,
        _database: &mut Database,
        _entity: &str,
        _cache: &mut NamingCache,
    ) -> StrataResult<()> {
        Ok(())
    }

    // ---- migration ----

    fn rename_entity_ddl(&self, from: &Entity, to: &Entity) -> String {
        format!(
            "\nALTER TABLE {} RENAME TO {};\n",
            self.table_identifier(from),
            self.quote_identifier(to.table_name())
        )
    }

    fn drop_primary_key_ddl(&self, entity: &Entity) -> String {
        format!(
            "\nALTER TABLE {} DROP CONSTRAINT {};\n",
            self.table_identifier(entity),
            self.quote_identifier(&self.primary_key_name(entity))
        )
    }

    fn add_primary_key_ddl(&self, entity: &Entity) -> String {
        format!(
            "\nALTER TABLE {} ADD {};\n",
            self.table_identifier(entity),
            self.primary_key_ddl(entity)
        )
    }

    fn rename_field_ddl(&self, entity: &Entity, from: &Field, to: &Field) -> StrataResult<String> {
        Ok(format!(
            "\nALTER TABLE {} RENAME COLUMN {} TO {};\n",
            self.table_identifier(entity),
            self.quote_identifier(&from.column_name()),
            self.quote_identifier(&to.column_name())
        ))
    }

    /// `changes` pairs the old definition with the new one.
    fn modify_fields_ddl(&self, entity: &Entity, changes: &[(&Field, &Field)]) -> StrataResult<String> {
        migration::modify_fields_ddl(self, entity, changes)
    }

    fn add_fields_ddl(&self, entity: &Entity, fields: &[&Field]) -> StrataResult<String> {
        migration::add_fields_ddl(self, entity, fields)
    }

    fn remove_field_ddl(&self, entity: &Entity, field: &Field) -> String {
        format!(
            "\nALTER TABLE {} DROP COLUMN {};\n",
            self.table_identifier(entity),
            self.quote_identifier(&field.column_name())
        )
    }

    fn modify_entity_ddl(&self, diff: &DatabaseDiff, entity_diff: &EntityDiff) -> StrataResult<String> {
        migration::modify_entity_ddl(self, diff, entity_diff)
    }

    /// Migration script for a database diff; empty when nothing changed.
    fn get_modify_database_ddl(&self, diff: &DatabaseDiff) -> StrataResult<String> {
        migration::modify_database_ddl(self, diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_table() {
        assert_eq!(PlatformKind::from_name("MySQL").unwrap(), PlatformKind::Mysql);
        assert_eq!(PlatformKind::from_name("postgres").unwrap(), PlatformKind::Pgsql);
        assert_eq!(PlatformKind::from_name("default").unwrap(), PlatformKind::Sql);
        assert!(matches!(
            PlatformKind::from_name("oracle"),
            Err(StrataError::UnknownPlatform(_))
        ));
    }

    #[test]
    fn test_identity_matches_vendor_key() {
        let config = PlatformConfig::default();
        for kind in PlatformKind::ALL {
            let platform = kind.platform(&config);
            assert_eq!(platform.kind(), kind);
            assert_eq!(platform.name(), kind.as_str());
            assert_eq!(kind.aliases()[0], kind.as_str());
        }
    }
}
