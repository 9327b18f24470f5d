//! Generic SQL rendering.
//!
//! These functions back the default methods of [`Platform`]. Dialects that
//! override a method call the matching function here to get the generic
//! result.

use super::Platform;
use crate::error::{StrataError, StrataResult};
use crate::model::{
    Database, Describable, Domain, Entity, Field, FieldType, Index, Named, Relation,
    VendorCarrier,
};

/// Generic native type for every abstract type except GEOMETRY.
pub fn standard_domain(field_type: FieldType) -> Option<Domain> {
    let sql_type = match field_type {
        FieldType::Char => "CHAR",
        FieldType::Varchar => "VARCHAR",
        FieldType::LongVarchar => "LONGVARCHAR",
        FieldType::Clob => "CLOB",
        FieldType::Numeric => "NUMERIC",
        FieldType::Decimal => "DECIMAL",
        FieldType::TinyInt => "TINYINT",
        FieldType::SmallInt => "SMALLINT",
        FieldType::Integer => "INTEGER",
        FieldType::BigInt => "BIGINT",
        FieldType::Real => "REAL",
        FieldType::Float => "FLOAT",
        FieldType::Double => "DOUBLE",
        FieldType::Binary => "BINARY",
        FieldType::VarBinary => "VARBINARY",
        FieldType::LongVarBinary => "LONGVARBINARY",
        FieldType::Blob => "BLOB",
        FieldType::Date => "DATE",
        FieldType::Time => "TIME",
        FieldType::Timestamp => "TIMESTAMP",
        FieldType::Boolean => "BOOLEAN",
        FieldType::BooleanEmu => "INTEGER",
        FieldType::Object => "LONGVARBINARY",
        FieldType::Array => "LONGVARCHAR",
        FieldType::Enum | FieldType::Set => "VARCHAR",
        FieldType::Json => "LONGVARCHAR",
        FieldType::Uuid => "UUID",
        FieldType::Geometry => return None,
    };
    Some(Domain::with_sql_type(field_type, sql_type))
}

// ---- literals ----

/// Wrap `text` in the given quote characters; dotted names are quoted per
/// part. Returns `text` untouched when quoting is disabled.
pub fn quote_identifier<P: Platform + ?Sized>(
    platform: &P,
    text: &str,
    open: char,
    close: char,
) -> String {
    if !platform.config().identifier_quoting {
        return text.to_string();
    }
    let inner = format!("{}.{}", close, open);
    format!("{}{}{}", open, text.replace('.', &inner), close)
}

/// Standard SQL string literal: embedded quotes are doubled.
pub fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// `1`, `true`, `y`, `yes` (any case) count as true.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "y" | "yes"
    )
}

pub fn boolean_string(value: &str) -> String {
    if is_truthy(value) { "1" } else { "0" }.to_string()
}

/// `a, b` -> `||a | b||`; `None` for an empty list.
pub fn array_string(value: &str) -> Option<String> {
    let values: Vec<&str> = value.split(',').map(str::trim).collect();
    if values.len() == 1 && values[0].is_empty() {
        return None;
    }
    Some(format!("||{}||", values.join(" | ")))
}

/// Numeric defaults go through a float parse: `10.0` -> `10`, `1.50` -> `1.5`.
pub fn numeric_string(entity: &Entity, field: &Field, value: &str) -> StrataResult<String> {
    value
        .trim()
        .parse::<f64>()
        .map(|n| n.to_string())
        .map_err(|_| StrataError::InvalidNumericDefault {
            entity: entity.name().to_string(),
            field: field.name().to_string(),
            value: value.to_string(),
        })
}

// ---- names ----

/// Quoted table name, schema-qualified where the dialect supports schemas.
pub fn table_identifier<P: Platform + ?Sized>(platform: &P, entity: &Entity) -> String {
    if platform.supports_schemas() {
        platform.quote_identifier(&entity.full_table_name())
    } else {
        platform.quote_identifier(entity.table_name())
    }
}

/// Column name of field `name`, or `name` itself when the entity lacks it.
pub fn field_column(entity: &Entity, name: &str) -> String {
    entity
        .field(name)
        .map(Field::column_name)
        .unwrap_or_else(|| name.to_string())
}

fn columns_of(entity: &Entity, names: &[String]) -> Vec<String> {
    names.iter().map(|n| field_column(entity, n)).collect()
}

// ---- fields ----

/// Dialect domain for `field`, failing when the dialect has none.
pub fn native_domain<P: Platform + ?Sized>(
    platform: &P,
    entity: &Entity,
    field: &Field,
) -> StrataResult<Domain> {
    platform
        .domain_for_type(field.field_type())
        .ok_or_else(|| StrataError::UnmappableType {
            platform: platform.name().to_string(),
            field: format!("{}.{}", entity.name(), field.name()),
            field_type: field.field_type().to_string(),
        })
}

/// SQL type plus `(size[,scale])`. The size is only appended to the
/// dialect's own type for the field and never to a replaced domain.
pub fn column_sql_type<P: Platform + ?Sized>(
    platform: &P,
    entity: &Entity,
    field: &Field,
) -> StrataResult<String> {
    let domain = field.domain();
    let native = platform.domain_for_type(field.field_type());
    let (sql_type, is_default) = if domain.has_sql_type() {
        let sql_type = domain.sql_type().to_string();
        let is_default = native
            .as_ref()
            .is_some_and(|n| n.sql_type().eq_ignore_ascii_case(&sql_type));
        (sql_type, is_default)
    } else {
        let native = native_domain(platform, entity, field)?;
        (native.sql_type().to_string(), true)
    };

    if domain.is_replaced() || !is_default || !platform.has_size(&sql_type) {
        return Ok(sql_type);
    }
    let size = domain.size().or_else(|| native.and_then(|n| n.size()));
    Ok(match (size, domain.scale()) {
        (Some(size), Some(scale)) => format!("{}({},{})", sql_type, size, scale),
        (Some(size), None) => format!("{}({})", sql_type, size),
        _ => sql_type,
    })
}

/// `DEFAULT <literal>` or an empty string.
pub fn column_default_value_ddl<P: Platform + ?Sized>(
    platform: &P,
    entity: &Entity,
    field: &Field,
) -> StrataResult<String> {
    let Some(default) = field.get_default_value() else {
        return Ok(String::new());
    };
    let value = default.value();
    let field_type = field.field_type();

    let literal = if default.is_expression() {
        Some(value.to_string())
    } else if field.is_text_type() || field.is_enum_type() {
        Some(platform.quote(value))
    } else if field_type.is_boolean() {
        Some(platform.boolean_string(value))
    } else if field_type.is_array() {
        array_string(value).map(|v| platform.quote(&v))
    } else if field_type.is_numeric() {
        Some(numeric_string(entity, field, value)?)
    } else {
        Some(value.to_string())
    };

    Ok(literal
        .map(|l| format!("DEFAULT {}", l))
        .unwrap_or_default())
}

/// The dialect auto-increment token for `field`, if it has one.
pub fn auto_increment_ddl<P: Platform + ?Sized>(
    platform: &P,
    entity: &Entity,
    field: &Field,
) -> StrataResult<Option<String>> {
    if !field.is_auto_increment() {
        return Ok(None);
    }
    if !entity.is_native_id_method() {
        return Err(StrataError::AutoIncrementWithoutNativeId {
            entity: entity.name().to_string(),
            field: field.name().to_string(),
        });
    }
    let token = platform.auto_increment_token();
    Ok((!token.is_empty()).then(|| token.to_string()))
}

/// Name, type, default, null-ness, auto-increment.
pub fn column_ddl<P: Platform + ?Sized>(
    platform: &P,
    entity: &Entity,
    field: &Field,
) -> StrataResult<String> {
    let mut ddl = vec![
        platform.quote_identifier(&field.column_name()),
        platform.column_sql_type(entity, field)?,
    ];
    let default = platform.column_default_value_ddl(entity, field)?;
    if !default.is_empty() {
        ddl.push(default);
    }
    let not_null = platform.null_string(field.is_not_null());
    if !not_null.is_empty() {
        ddl.push(not_null.to_string());
    }
    if let Some(token) = auto_increment_ddl(platform, entity, field)? {
        ddl.push(token);
    }
    Ok(ddl.join(" "))
}

// ---- keys & indices ----

pub fn primary_key_ddl<P: Platform + ?Sized>(platform: &P, entity: &Entity) -> String {
    let columns: Vec<String> = platform
        .primary_key_fields(entity)
        .iter()
        .map(|f| f.column_name())
        .collect();
    if columns.is_empty() {
        return String::new();
    }
    format!("PRIMARY KEY ({})", platform.column_list_ddl(&columns))
}

pub fn unique_ddl<P: Platform + ?Sized>(platform: &P, entity: &Entity, unique: &Index) -> String {
    let columns: Vec<String> = unique
        .field_names()
        .iter()
        .map(|n| field_column(entity, n))
        .collect();
    format!("UNIQUE ({})", platform.column_list_ddl(&columns))
}

pub fn index_type_ddl<P: Platform + ?Sized>(platform: &P, index: &Index) -> String {
    let vendor = index.vendor_info_for(platform.name());
    if let Some(index_type) = vendor.parameter("Index_type") {
        format!("{} ", index_type)
    } else if index.is_unique() {
        "UNIQUE ".to_string()
    } else {
        String::new()
    }
}

/// Quoted columns with `(size)` prefixes where the dialect allows them.
pub fn index_column_list_ddl<P: Platform + ?Sized>(
    platform: &P,
    entity: &Entity,
    index: &Index,
) -> String {
    index
        .fields()
        .iter()
        .map(|f| {
            let column = platform.quote_identifier(&field_column(entity, &f.name));
            match f.size {
                Some(size) if platform.supports_index_size() => format!("{}({})", column, size),
                _ => column,
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn add_index_ddl<P: Platform + ?Sized>(platform: &P, entity: &Entity, index: &Index) -> String {
    format!(
        "\nCREATE {}INDEX {} ON {} ({});\n",
        platform.index_type_ddl(index),
        platform.quote_identifier(&index.name()),
        platform.table_identifier(entity),
        platform.index_column_list_ddl(entity, index)
    )
}

pub fn drop_index_ddl<P: Platform + ?Sized>(platform: &P, _entity: &Entity, index: &Index) -> String {
    format!("\nDROP INDEX {};\n", platform.quote_identifier(&index.name()))
}

/// `CONSTRAINT ... FOREIGN KEY ... REFERENCES ...` without a statement
/// terminator; empty for skipped relations.
pub fn foreign_key_ddl<P: Platform + ?Sized>(
    platform: &P,
    database: &Database,
    entity: &Entity,
    relation: &Relation,
) -> String {
    if relation.is_skip_sql() {
        return String::new();
    }
    let foreign = database.entity(relation.foreign_entity());
    let foreign_table = match foreign {
        Some(foreign) => platform.table_identifier(foreign),
        None => platform.quote_identifier(relation.foreign_table_name()),
    };
    let foreign_columns = match foreign {
        Some(foreign) => columns_of(foreign, relation.foreign_fields()),
        None => relation.foreign_fields().to_vec(),
    };

    let mut script = format!(
        "CONSTRAINT {}\n    FOREIGN KEY ({})\n    REFERENCES {} ({})",
        platform.quote_identifier(&relation.name()),
        platform.column_list_ddl(&columns_of(entity, relation.local_fields())),
        foreign_table,
        platform.column_list_ddl(&foreign_columns)
    );
    if !relation.get_on_update().is_none() {
        script.push_str(&format!("\n    ON UPDATE {}", relation.get_on_update()));
    }
    if !relation.get_on_delete().is_none() {
        script.push_str(&format!("\n    ON DELETE {}", relation.get_on_delete()));
    }
    script
}

pub fn add_foreign_key_ddl<P: Platform + ?Sized>(
    platform: &P,
    database: &Database,
    entity: &Entity,
    relation: &Relation,
) -> String {
    if relation.is_skip_sql() || !platform.supports_foreign_keys(entity) {
        return String::new();
    }
    format!(
        "\nALTER TABLE {} ADD {};\n",
        platform.table_identifier(entity),
        platform.foreign_key_ddl(database, entity, relation)
    )
}

pub fn drop_foreign_key_ddl<P: Platform + ?Sized>(
    platform: &P,
    entity: &Entity,
    relation: &Relation,
) -> String {
    if relation.is_skip_sql() || !platform.supports_foreign_keys(entity) {
        return String::new();
    }
    format!(
        "\nALTER TABLE {} DROP CONSTRAINT {};\n",
        platform.table_identifier(entity),
        platform.quote_identifier(&relation.name())
    )
}

// ---- entities ----

pub fn comment_block_ddl(comment: &str, rule_prefix: &str) -> String {
    let rule = format!("{}{}", rule_prefix, "-".repeat(71 - rule_prefix.len()));
    format!("\n{}\n-- {}\n{}\n", rule, comment, rule)
}

/// `CREATE TABLE` with columns, primary key and unique constraints.
pub fn add_entity_ddl<P: Platform + ?Sized>(
    platform: &P,
    _database: &Database,
    entity: &Entity,
) -> StrataResult<String> {
    let mut lines = Vec::new();
    for field in entity.fields() {
        lines.push(platform.column_ddl(entity, field)?);
    }
    let pk = platform.primary_key_ddl(entity);
    if !pk.is_empty() {
        lines.push(pk);
    }
    for unique in entity.unices() {
        lines.push(platform.unique_ddl(entity, unique));
    }
    let description = match entity.description() {
        Some(d) if !d.is_empty() => platform.comment_line_ddl(d),
        _ => String::new(),
    };
    Ok(format!(
        "\n{}CREATE TABLE {}\n(\n    {}\n);\n",
        description,
        platform.table_identifier(entity),
        lines.join(",\n    ")
    ))
}

/// Make relation targets unique, drop index sizes the dialect cannot use
/// and sizes equal to the dialect default.
pub fn normalize_entity<P: Platform + ?Sized>(
    platform: &P,
    database: &mut Database,
    name: &str,
) -> StrataResult<()> {
    let Some(entity) = database.entity(name) else {
        return Ok(());
    };

    let mut uniques: Vec<(String, Vec<String>)> = Vec::new();
    for relation in entity.relations() {
        if relation.is_skip_sql() || !relation.has_references() {
            continue;
        }
        let Some(foreign) = database.entity(relation.foreign_entity()) else {
            continue;
        };
        let columns: Vec<&str> = relation.foreign_fields().iter().map(String::as_str).collect();
        if !foreign.is_unique_on(&columns) && columns.iter().all(|c| foreign.has_field(c)) {
            uniques.push((foreign.name().to_string(), relation.foreign_fields().to_vec()));
        }
    }
    for (foreign, columns) in uniques {
        if let Some(target) = database.entity_mut(&foreign) {
            let names: Vec<&str> = columns.iter().map(String::as_str).collect();
            if !target.is_unique_on(&names) {
                tracing::debug!("Adding unique constraint on {}({})", foreign, columns.join(", "));
                target.add_unique(Index::unique(columns))?;
            }
        }
    }

    let Some(entity) = database.entity_mut(name) else {
        return Ok(());
    };
    if !platform.supports_index_size() {
        for index in entity.indices_mut() {
            index.reset_fields_size();
        }
        for unique in entity.unices_mut() {
            unique.reset_fields_size();
        }
    }
    for field in entity.fields_mut() {
        if let (Some(size), Some(default)) =
            (field.get_size(), platform.default_type_size(field.field_type()))
            && field.get_scale().is_none()
            && size == default
        {
            field.domain_mut().set_size(None);
        }
    }
    Ok(())
}

pub(crate) fn sql_entity_names(database: &Database) -> Vec<String> {
    database
        .entities_for_sql()
        .iter()
        .map(|e| e.name().to_string())
        .collect()
}

/// Normalize a copy of `database`, then emit per entity comment, drop,
/// create and indices, followed by every foreign key.
pub fn add_entities_ddl<P: Platform + ?Sized>(
    platform: &P,
    database: &Database,
) -> StrataResult<String> {
    let mut db = database.clone();
    let names = sql_entity_names(&db);
    for name in &names {
        platform.normalize_entity(&mut db, name)?;
    }

    let mut ret = platform.begin_ddl();
    for entity in names.iter().filter_map(|n| db.entity(n)) {
        ret.push_str(&platform.comment_block_ddl(entity.table_name()));
        ret.push_str(&platform.drop_entity_ddl(entity));
        ret.push_str(&platform.add_entity_ddl(&db, entity)?);
        ret.push_str(&platform.add_indices_ddl(entity));
    }
    for entity in names.iter().filter_map(|n| db.entity(n)) {
        ret.push_str(&platform.add_foreign_keys_ddl(&db, entity));
    }
    ret.push_str(&platform.end_ddl());
    Ok(ret)
}
