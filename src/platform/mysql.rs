//! MySQL dialect.
//!
//! Indices, unique constraints and (on InnoDB/NDB) foreign keys are written
//! inside `CREATE TABLE`. Column changes of one table are merged into a
//! single `ALTER TABLE` statement.

use std::collections::BTreeMap;

use super::{NamingCache, Platform, PlatformConfig, PlatformKind, ddl, migration};
use crate::diff::{DatabaseDiff, EntityDiff, lookup_field};
use crate::error::{StrataError, StrataResult};
use crate::model::naming::hashed_name;
use crate::model::{
    Database, Describable, Domain, Entity, Field, FieldType, Index, Named, Relation,
    VendorCarrier, VendorInfo,
};

/// Table options MySQL accepts, keyed by vendor parameter name.
const TABLE_OPTIONS: &[(&str, &str)] = &[
    ("AutoIncrement", "AUTO_INCREMENT"),
    ("AvgRowLength", "AVG_ROW_LENGTH"),
    ("Charset", "CHARACTER SET"),
    ("Checksum", "CHECKSUM"),
    ("Collate", "COLLATE"),
    ("Connection", "CONNECTION"),
    ("DataDirectory", "DATA DIRECTORY"),
    ("Delay_key_write", "DELAY_KEY_WRITE"),
    ("DelayKeyWrite", "DELAY_KEY_WRITE"),
    ("IndexDirectory", "INDEX DIRECTORY"),
    ("InsertMethod", "INSERT_METHOD"),
    ("KeyBlockSize", "KEY_BLOCK_SIZE"),
    ("MaxRows", "MAX_ROWS"),
    ("MinRows", "MIN_ROWS"),
    ("Pack_Keys", "PACK_KEYS"),
    ("PackKeys", "PACK_KEYS"),
    ("RowFormat", "ROW_FORMAT"),
    ("Union", "UNION"),
];

/// Options whose values are keywords, never string literals.
const UNQUOTED_OPTIONS: &[&str] = &["InsertMethod", "Pack_Keys", "PackKeys", "RowFormat"];

/// Engines that index foreign keys themselves.
const FK_ENGINES: &[&str] = &["innodb", "ndb"];

const UNSIZED_TYPES: &[&str] = &["MEDIUMTEXT", "LONGTEXT", "BLOB", "MEDIUMBLOB", "LONGBLOB"];

const TEXT_BLOB_TYPES: &[&str] = &[
    "TINYTEXT",
    "TEXT",
    "MEDIUMTEXT",
    "LONGTEXT",
    "TINYBLOB",
    "BLOB",
    "MEDIUMBLOB",
    "LONGBLOB",
];

#[derive(Debug, Clone, Default)]
pub struct MysqlPlatform {
    config: PlatformConfig,
}

impl MysqlPlatform {
    pub fn new(config: PlatformConfig) -> Self {
        Self { config }
    }

    /// Storage engine from the entity's `Type` / `Engine` vendor parameter,
    /// else the configured default.
    pub fn table_engine(&self, entity: &Entity) -> String {
        let vendor = entity.vendor_info_for(self.name());
        vendor
            .parameter("Type")
            .or_else(|| vendor.parameter("Engine"))
            .unwrap_or(self.config.mysql_table_type.as_str())
            .to_string()
    }

    fn uses_fk_engine(&self, entity: &Entity) -> bool {
        let engine = self.table_engine(entity).to_lowercase();
        FK_ENGINES.contains(&engine.as_str())
    }

    /// `NAME=value` pairs from the merged database and entity vendor info.
    pub fn table_options(&self, database: &Database, entity: &Entity) -> Vec<String> {
        let vendor: VendorInfo = database
            .vendor_info_for(self.name())
            .merge(&entity.vendor_info_for(self.name()));
        for key in vendor.parameters().keys() {
            let known = TABLE_OPTIONS.iter().any(|(k, _)| *k == key.as_str())
                || matches!(key.as_str(), "Type" | "Engine");
            if !known {
                tracing::warn!("Ignoring unknown MySQL table option '{}' on '{}'", key, entity.name());
            }
        }
        TABLE_OPTIONS
            .iter()
            .filter_map(|(key, option)| {
                let value = vendor.parameter(key)?;
                let value = if value.parse::<f64>().is_ok() || UNQUOTED_OPTIONS.contains(key) {
                    value.to_string()
                } else {
                    self.quote(value)
                };
                Some(format!("{}={}", option, value))
            })
            .collect()
    }

    /// SQL type name before any size suffix.
    fn base_sql_type(&self, entity: &Entity, field: &Field) -> StrataResult<String> {
        if field.domain().has_sql_type() {
            return Ok(field.domain().sql_type().to_uppercase());
        }
        Ok(ddl::native_domain(self, entity, field)?
            .sql_type()
            .to_uppercase())
    }

    fn unique_index_ddl(&self, entity: &Entity, unique: &Index) -> String {
        format!(
            "UNIQUE INDEX {} ({})",
            self.quote_identifier(&unique.name()),
            self.index_column_list_ddl(entity, unique)
        )
    }

    fn index_ddl(&self, entity: &Entity, index: &Index) -> String {
        format!(
            "{}INDEX {} ({})",
            self.index_type_ddl(index),
            self.quote_identifier(&index.name()),
            self.index_column_list_ddl(entity, index)
        )
    }

    /// `ADD <column> FIRST` / `ADD <column> AFTER <previous>`.
    fn add_column_bits(&self, entity: &Entity, field: &Field) -> StrataResult<String> {
        let position = match field.position() {
            0 | 1 => " FIRST".to_string(),
            n => match entity.fields().get(n - 2) {
                Some(previous) => format!(" AFTER {}", self.quote_identifier(&previous.column_name())),
                None => String::new(),
            },
        };
        Ok(format!("ADD {}{}", self.column_ddl(entity, field)?, position))
    }
}

impl Platform for MysqlPlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Mysql
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }

    fn domain_for_type(&self, field_type: FieldType) -> Option<Domain> {
        let domain = match field_type {
            FieldType::Boolean => Domain::with_sql_type(field_type, "TINYINT").with_size(1),
            FieldType::Numeric => Domain::with_sql_type(field_type, "DECIMAL"),
            FieldType::LongVarchar => Domain::with_sql_type(field_type, "TEXT"),
            FieldType::Binary => Domain::with_sql_type(field_type, "BLOB"),
            FieldType::VarBinary => Domain::with_sql_type(field_type, "MEDIUMBLOB"),
            FieldType::LongVarBinary => Domain::with_sql_type(field_type, "LONGBLOB"),
            FieldType::Blob => Domain::with_sql_type(field_type, "LONGBLOB"),
            FieldType::Clob => Domain::with_sql_type(field_type, "LONGTEXT"),
            FieldType::Timestamp => Domain::with_sql_type(field_type, "DATETIME"),
            FieldType::Object => Domain::with_sql_type(field_type, "MEDIUMBLOB"),
            FieldType::Array => Domain::with_sql_type(field_type, "TEXT"),
            FieldType::Enum => Domain::with_sql_type(field_type, "TINYINT"),
            FieldType::Set => Domain::with_sql_type(field_type, "INT"),
            FieldType::Real => Domain::with_sql_type(field_type, "DOUBLE"),
            FieldType::BooleanEmu => Domain::with_sql_type(field_type, "TINYINT"),
            FieldType::Json => Domain::with_sql_type(field_type, "JSON"),
            FieldType::Uuid => Domain::with_sql_type(field_type, "BINARY").with_size(16),
            FieldType::Geometry => Domain::with_sql_type(field_type, "GEOMETRY"),
            other => return ddl::standard_domain(other),
        };
        Some(domain)
    }

    fn has_size(&self, sql_type: &str) -> bool {
        !UNSIZED_TYPES.contains(&sql_type.to_uppercase().as_str())
    }

    fn default_type_size(&self, field_type: FieldType) -> Option<u32> {
        match field_type {
            FieldType::Char => Some(1),
            FieldType::TinyInt => Some(4),
            FieldType::SmallInt => Some(6),
            FieldType::Integer => Some(11),
            FieldType::BigInt => Some(20),
            FieldType::Decimal => Some(10),
            _ => None,
        }
    }

    fn supports_index_size(&self) -> bool {
        true
    }

    fn supports_foreign_keys(&self, entity: &Entity) -> bool {
        self.uses_fk_engine(entity)
    }

    fn quote_identifier(&self, text: &str) -> String {
        ddl::quote_identifier(self, text, '`', '`')
    }

    /// Backslash escaping like `addslashes`.
    fn quote(&self, text: &str) -> String {
        let mut quoted = String::with_capacity(text.len() + 2);
        quoted.push('\'');
        for c in text.chars() {
            match c {
                '\'' | '"' | '\\' => {
                    quoted.push('\\');
                    quoted.push(c);
                }
                '\0' => quoted.push_str("\\0"),
                _ => quoted.push(c),
            }
        }
        quoted.push('\'');
        quoted
    }

    fn auto_increment_token(&self) -> &'static str {
        "AUTO_INCREMENT"
    }

    fn column_sql_type(&self, entity: &Entity, field: &Field) -> StrataResult<String> {
        if field.is_enum_type() && !field.value_set().is_empty() && !field.domain().is_replaced() {
            let keyword = if field.field_type() == FieldType::Set { "SET" } else { "ENUM" };
            let values: Vec<String> = field.value_set().iter().map(|v| self.quote(v)).collect();
            return Ok(format!("{}({})", keyword, values.join(", ")));
        }
        ddl::column_sql_type(self, entity, field)
    }

    fn column_default_value_ddl(&self, entity: &Entity, field: &Field) -> StrataResult<String> {
        let Some(default) = field.get_default_value() else {
            return Ok(String::new());
        };
        let sql_type = self.base_sql_type(entity, field)?;
        if TEXT_BLOB_TYPES.contains(&sql_type.as_str()) {
            return Err(StrataError::illegal_default(
                entity.name(),
                field.name(),
                format!("{} columns cannot have a default value in MySQL", sql_type),
            ));
        }
        if sql_type == "DATE" && default.is_expression() {
            return Err(StrataError::illegal_default(
                entity.name(),
                field.name(),
                "DATE columns cannot have default expressions in MySQL",
            ));
        }
        ddl::column_default_value_ddl(self, entity, field)
    }

    fn column_ddl(&self, entity: &Entity, field: &Field) -> StrataResult<String> {
        let sql_type = self.base_sql_type(entity, field)?;
        let mut not_null = self.null_string(field.is_not_null()).to_string();
        let mut default = self.column_default_value_ddl(entity, field)?;
        let is_timestamp = sql_type == "TIMESTAMP";
        if is_timestamp {
            if not_null.is_empty() {
                not_null = "NULL".to_string();
            }
            if default.is_empty() && not_null == "NOT NULL" {
                default = "DEFAULT CURRENT_TIMESTAMP".to_string();
            }
        }

        let mut ddl = vec![
            self.quote_identifier(&field.column_name()),
            self.column_sql_type(entity, field)?,
        ];
        let vendor = field.vendor_info_for(self.name());
        if let Some(unsigned) = vendor.parameter("Unsigned")
            && !unsigned.eq_ignore_ascii_case("false")
        {
            ddl.push("UNSIGNED".to_string());
        }
        if let Some(charset) = vendor.parameter("Charset") {
            ddl.push(format!("CHARACTER SET {}", self.quote(charset)));
        }
        if let Some(collation) = vendor
            .parameter("Collation")
            .or_else(|| vendor.parameter("Collate"))
        {
            ddl.push(format!("COLLATE {}", self.quote(collation)));
        }

        let ordered = if is_timestamp {
            [not_null, default]
        } else {
            [default, not_null]
        };
        ddl.extend(ordered.into_iter().filter(|s| !s.is_empty()));

        if let Some(token) = ddl::auto_increment_ddl(self, entity, field)? {
            ddl.push(token);
        }
        if let Some(description) = field.description()
            && !description.is_empty()
        {
            ddl.push(format!("COMMENT {}", self.quote(description)));
        }
        Ok(ddl.join(" "))
    }

    /// The auto-increment column has to lead a composite key.
    fn primary_key_fields<'a>(&self, entity: &'a Entity) -> Vec<&'a Field> {
        let mut fields = entity.primary_key();
        if let Some(pos) = fields.iter().position(|f| f.is_auto_increment()) {
            let auto = fields.remove(pos);
            fields.insert(0, auto);
        }
        fields
    }

    /// Indices live inside `CREATE TABLE`.
    fn add_indices_ddl(&self, _entity: &Entity) -> String {
        String::new()
    }

    fn drop_index_ddl(&self, entity: &Entity, index: &Index) -> String {
        format!(
            "\nDROP INDEX {} ON {};\n",
            self.quote_identifier(&index.name()),
            self.table_identifier(entity)
        )
    }

    /// Foreign keys live inside `CREATE TABLE`.
    fn add_foreign_keys_ddl(&self, _database: &Database, _entity: &Entity) -> String {
        String::new()
    }

    fn drop_foreign_key_ddl(&self, entity: &Entity, relation: &Relation) -> String {
        if relation.is_skip_sql() || !self.supports_foreign_keys(entity) {
            return String::new();
        }
        format!(
            "\nALTER TABLE {} DROP FOREIGN KEY {};\n",
            self.table_identifier(entity),
            self.quote_identifier(&relation.name())
        )
    }

    fn comment_block_ddl(&self, comment: &str) -> String {
        ddl::comment_block_ddl(comment, "-- ")
    }

    fn begin_ddl(&self) -> String {
        "\nSET FOREIGN_KEY_CHECKS = 0;\n".to_string()
    }

    fn end_ddl(&self) -> String {
        "\nSET FOREIGN_KEY_CHECKS = 1;\n".to_string()
    }

    fn drop_entity_ddl(&self, entity: &Entity) -> String {
        format!("\nDROP TABLE IF EXISTS {};\n", self.table_identifier(entity))
    }

    fn add_entity_ddl(&self, database: &Database, entity: &Entity) -> StrataResult<String> {
        let mut lines = Vec::new();
        for field in entity.fields() {
            lines.push(self.column_ddl(entity, field)?);
        }
        if entity.has_primary_key() {
            lines.push(self.primary_key_ddl(entity));
        }
        for unique in entity.unices() {
            lines.push(self.unique_index_ddl(entity, unique));
        }
        for index in entity.indices() {
            lines.push(self.index_ddl(entity, index));
        }
        if self.supports_foreign_keys(entity) {
            for relation in entity.relations() {
                if relation.is_skip_sql() {
                    continue;
                }
                lines.push(
                    self.foreign_key_ddl(database, entity, relation)
                        .replace("\n    ", "\n        "),
                );
            }
        }

        let mut options = self.table_options(database, entity);
        let description = match entity.description() {
            Some(d) if !d.is_empty() => {
                options.push(format!("COMMENT={}", self.quote(d)));
                self.comment_line_ddl(d)
            }
            _ => String::new(),
        };
        let options = if options.is_empty() {
            String::new()
        } else {
            format!(" {}", options.join(" "))
        };

        Ok(format!(
            "\n{}CREATE TABLE {}\n(\n    {}\n) {}={}{};\n",
            description,
            self.table_identifier(entity),
            lines.join(",\n    "),
            self.config.mysql_table_engine_keyword,
            self.table_engine(entity),
            options
        ))
    }

    fn get_add_entities_ddl(&self, database: &Database) -> StrataResult<String> {
        let mut db = database.clone();
        let names = ddl::sql_entity_names(&db);
        for name in &names {
            self.normalize_entity(&mut db, name)?;
        }
        let mut ret = self.begin_ddl();
        for entity in names.iter().filter_map(|n| db.entity(n)) {
            ret.push_str(&self.comment_block_ddl(entity.table_name()));
            ret.push_str(&self.drop_entity_ddl(entity));
            ret.push_str(&self.add_entity_ddl(&db, entity)?);
        }
        ret.push_str(&self.end_ddl());
        Ok(ret)
    }

    /// Engines without implicit foreign key indices get one index per
    /// uncovered relation and referrer column list.
    fn finalize_entity(
        &self,
        database: &mut Database,
        name: &str,
        _cache: &mut NamingCache,
    ) -> StrataResult<()> {
        let Some(entity) = database.entity(name) else {
            return Ok(());
        };
        if self.uses_fk_engine(entity) {
            return Ok(());
        }

        // "a,b" -> names of the indices whose leftmost prefix is exactly a, b
        let mut indexed: BTreeMap<String, Vec<String>> = BTreeMap::new();
        collect_indexed(&mut indexed, "PRIMARY", entity.primary_key_names());
        for index in entity.indices().iter().chain(entity.unices()) {
            collect_indexed(&mut indexed, &index.name(), index.field_names());
        }

        let mut additions: Vec<Index> = Vec::new();
        let mut counter = 0;
        for reference in entity.referrers() {
            let Some(relation) = database.relation(reference) else {
                continue;
            };
            let fields: Vec<&str> = relation.foreign_fields().iter().map(String::as_str).collect();
            if fields.is_empty() || indexed.contains_key(&fields.join(",")) {
                continue;
            }
            counter += 1;
            let mut index_name = format!("i_referenced_{}_{}", relation.name(), counter);
            if index_name.len() > self.max_identifier_length() {
                index_name = hashed_name(None, "i_referenced_", &[index_name], self.max_identifier_length());
            }
            collect_indexed(&mut indexed, &index_name, fields.clone());
            additions.push(Index::new(fields).named(index_name));
        }
        for relation in entity.relations() {
            let fields: Vec<&str> = relation.local_fields().iter().map(String::as_str).collect();
            if fields.is_empty() || indexed.contains_key(&fields.join(",")) {
                continue;
            }
            let fk_name = relation.name();
            let index_name = match fk_name.rfind("fk_") {
                Some(pos) => format!("{}fi_{}", &fk_name[..pos], &fk_name[pos + 3..]),
                None => format!("fi_{}", fk_name),
            };
            collect_indexed(&mut indexed, &index_name, fields.clone());
            additions.push(Index::new(fields).named(index_name));
        }

        let Some(entity) = database.entity_mut(name) else {
            return Ok(());
        };
        for index in additions {
            if entity.has_index(&index.name()) {
                continue;
            }
            tracing::debug!("Adding foreign key index '{}' to '{}'", index.name(), entity.name());
            entity.add_index(index)?;
        }
        Ok(())
    }

    fn rename_entity_ddl(&self, from: &Entity, to: &Entity) -> String {
        format!(
            "\nRENAME TABLE {} TO {};\n",
            self.table_identifier(from),
            self.table_identifier(to)
        )
    }

    fn drop_primary_key_ddl(&self, entity: &Entity) -> String {
        format!("\nALTER TABLE {} DROP PRIMARY KEY;\n", self.table_identifier(entity))
    }

    fn rename_field_ddl(&self, entity: &Entity, from: &Field, to: &Field) -> StrataResult<String> {
        Ok(format!(
            "\nALTER TABLE {} CHANGE {} {};\n",
            self.table_identifier(entity),
            self.quote_identifier(&from.column_name()),
            self.column_ddl(entity, to)?
        ))
    }

    fn modify_fields_ddl(&self, entity: &Entity, changes: &[(&Field, &Field)]) -> StrataResult<String> {
        let mut ret = String::new();
        for (from, to) in changes {
            ret.push_str(&self.rename_field_ddl(entity, from, to)?);
        }
        Ok(ret)
    }

    fn add_fields_ddl(&self, entity: &Entity, fields: &[&Field]) -> StrataResult<String> {
        let mut ret = String::new();
        for field in fields {
            ret.push_str(&format!(
                "\nALTER TABLE {} {};\n",
                self.table_identifier(entity),
                self.add_column_bits(entity, field)?
            ));
        }
        Ok(ret)
    }

    /// One merged `ALTER TABLE` between the constraint drops and re-creates.
    fn modify_entity_ddl(&self, diff: &DatabaseDiff, entity_diff: &EntityDiff) -> StrataResult<String> {
        let source = diff.source_entity(entity_diff)?;
        let from = &*source;
        let to = diff.to_entity(&entity_diff.to_entity)?;

        let mut ret = migration::drop_constraints_ddl(self, from, entity_diff)?;

        let mut changes = Vec::new();
        if entity_diff.modified_pk && from.has_primary_key() {
            changes.push("DROP PRIMARY KEY".to_string());
        }
        for rename in &entity_diff.renamed_fields {
            changes.push(format!(
                "CHANGE {} {}",
                self.quote_identifier(&lookup_field(from, &rename.from)?.column_name()),
                self.column_ddl(to, lookup_field(to, &rename.to)?)?
            ));
        }
        for (old, new) in migration::modified_field_pairs(from, to, entity_diff)? {
            changes.push(format!(
                "CHANGE {} {}",
                self.quote_identifier(&old.column_name()),
                self.column_ddl(to, new)?
            ));
        }
        for field in migration::added_fields(to, entity_diff)? {
            changes.push(self.add_column_bits(to, field)?);
        }
        for field in migration::removed_fields(from, entity_diff)? {
            changes.push(format!("DROP {}", self.quote_identifier(&field.column_name())));
        }
        if entity_diff.modified_pk && to.has_primary_key() {
            changes.push(format!("ADD {}", self.primary_key_ddl(to)));
        }
        if !changes.is_empty() {
            ret.push_str(&format!(
                "\nALTER TABLE {}\n\n  {};\n",
                self.table_identifier(to),
                changes.join(",\n\n  ")
            ));
        }

        ret.push_str(&migration::add_constraints_ddl(self, diff, to, entity_diff)?);
        Ok(ret)
    }
}

fn collect_indexed(indexed: &mut BTreeMap<String, Vec<String>>, index: &str, fields: Vec<&str>) {
    for len in 1..=fields.len() {
        indexed
            .entry(fields[..len].join(","))
            .or_default()
            .push(index.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDefaultValue, RelationAction};
    use crate::platform::finalize_database;
    use pretty_assertions::assert_eq;

    fn platform() -> MysqlPlatform {
        MysqlPlatform::default()
    }

    fn book() -> Entity {
        let mut book = Entity::new("book");
        book.add_field(Field::new("id", FieldType::Integer).primary_key().auto_increment())
            .unwrap();
        book.add_field(Field::new("title", FieldType::Varchar).size(255).not_null())
            .unwrap();
        book
    }

    fn bookstore() -> Database {
        let mut db = Database::new("bookstore");
        let author = db.add_entity(Entity::new("author")).unwrap();
        author
            .add_field(Field::new("id", FieldType::Integer).primary_key().auto_increment())
            .unwrap();
        let book = db.add_entity(book()).unwrap();
        book.add_field(Field::new("author_id", FieldType::Integer)).unwrap();
        book.add_relation(
            Relation::new("author")
                .named("book_fk_author")
                .reference("author_id", "id")
                .on_delete(RelationAction::SetNull),
        );
        db
    }

    #[test]
    fn test_column_ddl() {
        let book = book();
        let p = platform();
        assert_eq!(
            p.column_ddl(&book, book.field("id").unwrap()).unwrap(),
            "`id` INTEGER NOT NULL AUTO_INCREMENT"
        );
    }

    #[test]
    fn test_native_enum_and_uuid() {
        let mut entity = book();
        entity
            .add_field(Field::new("status", FieldType::Enum).values(["draft", "published"]))
            .unwrap();
        entity.add_field(Field::new("token", FieldType::Uuid)).unwrap();
        let p = platform();
        assert_eq!(
            p.column_sql_type(&entity, entity.field("status").unwrap()).unwrap(),
            "ENUM('draft', 'published')"
        );
        assert_eq!(
            p.column_sql_type(&entity, entity.field("token").unwrap()).unwrap(),
            "BINARY(16)"
        );
    }

    #[test]
    fn test_vendor_column_options() {
        let mut entity = book();
        let mut stock = Field::new("stock", FieldType::Integer).not_null();
        stock.add_vendor_info(VendorInfo::new("mysql").with("Unsigned", "true"));
        stock.set_description(Some("Units in stock".to_string()));
        entity.add_field(stock).unwrap();
        assert_eq!(
            platform()
                .column_ddl(&entity, entity.field("stock").unwrap())
                .unwrap(),
            "`stock` INTEGER UNSIGNED NOT NULL COMMENT 'Units in stock'"
        );
    }

    #[test]
    fn test_text_default_is_rejected() {
        let mut entity = book();
        entity
            .add_field(
                Field::new("body", FieldType::LongVarchar)
                    .default_value(FieldDefaultValue::new("none")),
            )
            .unwrap();
        entity
            .add_field(
                Field::new("published", FieldType::Date)
                    .default_value(FieldDefaultValue::expression("CURRENT_DATE")),
            )
            .unwrap();
        let p = platform();
        assert!(matches!(
            p.column_ddl(&entity, entity.field("body").unwrap()),
            Err(StrataError::IllegalDefault { .. })
        ));
        assert!(matches!(
            p.column_ddl(&entity, entity.field("published").unwrap()),
            Err(StrataError::IllegalDefault { .. })
        ));
    }

    #[test]
    fn test_timestamp_not_null_gets_current_timestamp() {
        let mut entity = book();
        let mut field = Field::new("touched", FieldType::Timestamp).not_null();
        field.domain_mut().replace_sql_type("TIMESTAMP");
        entity.add_field(field).unwrap();
        assert_eq!(
            platform()
                .column_ddl(&entity, entity.field("touched").unwrap())
                .unwrap(),
            "`touched` TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP"
        );
    }

    #[test]
    fn test_auto_increment_leads_primary_key() {
        let mut entity = Entity::new("line");
        entity
            .add_field(Field::new("order_id", FieldType::Integer).primary_key())
            .unwrap();
        entity
            .add_field(Field::new("id", FieldType::Integer).primary_key().auto_increment())
            .unwrap();
        assert_eq!(platform().primary_key_ddl(&entity), "PRIMARY KEY (`id`, `order_id`)");
    }

    #[test]
    fn test_create_table_with_inline_constraints() {
        let mut db = bookstore();
        db.entity_mut("book")
            .unwrap()
            .add_vendor_info(VendorInfo::new("mysql").with("Charset", "utf8mb4").with("RowFormat", "COMPACT"));
        let p = platform();
        let sql = p.add_entity_ddl(&db, db.entity("book").unwrap()).unwrap();
        assert_eq!(
            sql,
            "\nCREATE TABLE `book`\n(\n    \
             `id` INTEGER NOT NULL AUTO_INCREMENT,\n    \
             `title` VARCHAR(255) NOT NULL,\n    \
             `author_id` INTEGER,\n    \
             PRIMARY KEY (`id`),\n    \
             CONSTRAINT `book_fk_author`\n        FOREIGN KEY (`author_id`)\n        REFERENCES `author` (`id`)\n        ON DELETE SET NULL\n\
             ) ENGINE=InnoDB CHARACTER SET='utf8mb4' ROW_FORMAT=COMPACT;\n"
        );
    }

    #[test]
    fn test_myisam_finalization_adds_fk_indices() {
        let mut db = bookstore();
        for entity in db.entities_mut() {
            entity.add_vendor_info(VendorInfo::new("mysql").with("Engine", "MyISAM"));
        }
        let p = platform();
        finalize_database(&mut db, &p).unwrap();

        let book = db.entity("book").unwrap();
        assert_eq!(book.indices()[0].name(), "book_fi_author");
        assert_eq!(book.indices()[0].field_names(), vec!["author_id"]);
        // author.id is the primary key, no referrer index needed
        assert!(db.entity("author").unwrap().indices().is_empty());

        let sql = p.get_add_entities_ddl(&db).unwrap();
        assert!(sql.contains("INDEX `book_fi_author` (`author_id`)"));
        assert!(!sql.contains("FOREIGN KEY"));
        assert!(sql.contains(") ENGINE=MyISAM;"));
    }

    #[test]
    fn test_merged_alter_table() {
        let from = bookstore();
        let mut to = bookstore();
        let book = to.entity_mut("book").unwrap();
        book.add_field(Field::new("isbn", FieldType::Varchar).size(24)).unwrap();
        book.remove_field("title");
        let diff = DatabaseDiff::new(from, to).modify_entity(
            EntityDiff::new("book")
                .add_field("isbn")
                .remove_field("title"),
        );
        let sql = platform().get_modify_database_ddl(&diff).unwrap();
        assert!(sql.contains(
            "\nALTER TABLE `book`\n\n  ADD `isbn` VARCHAR(24) AFTER `author_id`,\n\n  DROP `title`;\n"
        ));
        assert!(sql.starts_with(&platform().begin_ddl()));
    }
}
