//! Migration DDL from a [`DatabaseDiff`].
//!
//! Statement order inside one entity: drop foreign keys, drop indices, drop
//! the primary key, rename, modify, add and remove columns, then re-create
//! the primary key, indices and foreign keys. Removed and changed-away
//! shapes are resolved against `from`, created shapes against `to`.

use super::Platform;
use crate::diff::{DatabaseDiff, EntityDiff, lookup_field, lookup_index, lookup_relation};
use crate::error::StrataResult;
use crate::model::Named;
use crate::model::{Entity, Field};

/// `ALTER TABLE x MODIFY (...)` with one line per changed column.
pub fn modify_fields_ddl<P: Platform + ?Sized>(
    platform: &P,
    entity: &Entity,
    changes: &[(&Field, &Field)],
) -> StrataResult<String> {
    if changes.is_empty() {
        return Ok(String::new());
    }
    let mut lines = Vec::with_capacity(changes.len());
    for (_, to) in changes {
        lines.push(platform.column_ddl(entity, to)?);
    }
    Ok(format!(
        "\nALTER TABLE {} MODIFY\n(\n    {}\n);\n",
        platform.table_identifier(entity),
        lines.join(",\n    ")
    ))
}

/// `ALTER TABLE x ADD (...)` with one line per new column.
pub fn add_fields_ddl<P: Platform + ?Sized>(
    platform: &P,
    entity: &Entity,
    fields: &[&Field],
) -> StrataResult<String> {
    if fields.is_empty() {
        return Ok(String::new());
    }
    let mut lines = Vec::with_capacity(fields.len());
    for field in fields {
        lines.push(platform.column_ddl(entity, field)?);
    }
    Ok(format!(
        "\nALTER TABLE {} ADD\n(\n    {}\n);\n",
        platform.table_identifier(entity),
        lines.join(",\n    ")
    ))
}

/// Resolved `(old, new)` pairs of the modified columns.
pub fn modified_field_pairs<'a>(
    from: &'a Entity,
    to: &'a Entity,
    diff: &EntityDiff,
) -> StrataResult<Vec<(&'a Field, &'a Field)>> {
    diff.modified_fields
        .iter()
        .map(|f| Ok((lookup_field(from, &f.from)?, lookup_field(to, &f.to)?)))
        .collect()
}

pub fn added_fields<'a>(to: &'a Entity, diff: &EntityDiff) -> StrataResult<Vec<&'a Field>> {
    diff.added_fields
        .iter()
        .map(|name| lookup_field(to, name))
        .collect()
}

pub fn removed_fields<'a>(from: &'a Entity, diff: &EntityDiff) -> StrataResult<Vec<&'a Field>> {
    diff.removed_fields
        .iter()
        .map(|name| lookup_field(from, name))
        .collect()
}

/// Foreign key and index drops that open an entity migration.
pub fn drop_constraints_ddl<P: Platform + ?Sized>(
    platform: &P,
    from: &Entity,
    diff: &EntityDiff,
) -> StrataResult<String> {
    let mut ret = String::new();
    let dropped_relations = diff
        .removed_relations
        .iter()
        .chain(diff.modified_relations.iter().map(|(old, _)| old));
    for name in dropped_relations {
        ret.push_str(&platform.drop_foreign_key_ddl(from, lookup_relation(from, name)?));
    }
    let dropped_indices = diff
        .removed_indices
        .iter()
        .chain(diff.modified_indices.iter().map(|(old, _)| old));
    for name in dropped_indices {
        ret.push_str(&platform.drop_index_ddl(from, lookup_index(from, name)?));
    }
    Ok(ret)
}

/// Index and foreign key creation that closes an entity migration.
pub fn add_constraints_ddl<P: Platform + ?Sized>(
    platform: &P,
    diff: &DatabaseDiff,
    to: &Entity,
    entity_diff: &EntityDiff,
) -> StrataResult<String> {
    let mut ret = String::new();
    let added_indices = entity_diff
        .modified_indices
        .iter()
        .map(|(_, new)| new)
        .chain(entity_diff.added_indices.iter());
    for name in added_indices {
        ret.push_str(&platform.add_index_ddl(to, lookup_index(to, name)?));
    }
    let added_relations = entity_diff
        .modified_relations
        .iter()
        .map(|(_, new)| new)
        .chain(entity_diff.added_relations.iter());
    for name in added_relations {
        ret.push_str(&platform.add_foreign_key_ddl(&diff.to, to, lookup_relation(to, name)?));
    }
    Ok(ret)
}

pub fn modify_entity_ddl<P: Platform + ?Sized>(
    platform: &P,
    diff: &DatabaseDiff,
    entity_diff: &EntityDiff,
) -> StrataResult<String> {
    let source = diff.source_entity(entity_diff)?;
    let from = &*source;
    let to = diff.to_entity(&entity_diff.to_entity)?;

    let mut ret = drop_constraints_ddl(platform, from, entity_diff)?;

    if entity_diff.modified_pk && from.has_primary_key() {
        ret.push_str(&platform.drop_primary_key_ddl(from));
    }
    for rename in &entity_diff.renamed_fields {
        ret.push_str(&platform.rename_field_ddl(
            to,
            lookup_field(from, &rename.from)?,
            lookup_field(to, &rename.to)?,
        )?);
    }
    ret.push_str(&platform.modify_fields_ddl(to, &modified_field_pairs(from, to, entity_diff)?)?);
    ret.push_str(&platform.add_fields_ddl(to, &added_fields(to, entity_diff)?)?);
    for field in removed_fields(from, entity_diff)? {
        ret.push_str(&platform.remove_field_ddl(to, field));
    }
    if entity_diff.modified_pk && to.has_primary_key() {
        ret.push_str(&platform.add_primary_key_ddl(to));
    }

    ret.push_str(&add_constraints_ddl(platform, diff, to, entity_diff)?);
    Ok(ret)
}

/// Drops, renames, modifications, then creations with their indices and
/// foreign keys.
pub fn modify_database_ddl<P: Platform + ?Sized>(
    platform: &P,
    diff: &DatabaseDiff,
) -> StrataResult<String> {
    let mut body = String::new();

    for name in &diff.removed_entities {
        body.push_str(&platform.drop_entity_ddl(diff.from_entity(name)?));
    }
    for (from, to) in &diff.renamed_entities {
        body.push_str(&platform.rename_entity_ddl(diff.from_entity(from)?, diff.to_entity(to)?));
    }
    for entity_diff in &diff.modified_entities {
        body.push_str(&platform.modify_entity_ddl(diff, entity_diff)?);
    }

    let mut created = Vec::with_capacity(diff.added_entities.len());
    for name in &diff.added_entities {
        created.push(diff.to_entity(name)?);
    }
    for entity in &created {
        body.push_str(&platform.add_entity_ddl(&diff.to, entity)?);
        body.push_str(&platform.add_indices_ddl(entity));
    }
    for entity in &created {
        body.push_str(&platform.add_foreign_keys_ddl(&diff.to, entity));
    }

    if body.is_empty() {
        return Ok(body);
    }
    tracing::debug!("Rendered migration for database '{}'", diff.to.name());
    Ok(format!("{}{}{}", platform.begin_ddl(), body, platform.end_ddl()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Database, FieldType, Index};
    use crate::platform::{PlatformConfig, SqlPlatform};
    use pretty_assertions::assert_eq;

    fn book_db(with_isbn: bool) -> Database {
        let mut db = Database::new("bookstore");
        let book = db.add_entity(Entity::new("book")).unwrap();
        book.add_field(Field::new("id", FieldType::Integer).primary_key())
            .unwrap();
        book.add_field(Field::new("title", FieldType::Varchar).size(255))
            .unwrap();
        if with_isbn {
            book.add_field(Field::new("isbn", FieldType::Varchar).size(24))
                .unwrap();
            book.add_index(Index::new(["isbn"]).named("book_isbn"))
                .unwrap();
        }
        db
    }

    #[test]
    fn test_empty_diff_renders_nothing() {
        let platform = SqlPlatform::new(PlatformConfig::default());
        let diff = DatabaseDiff::new(book_db(false), book_db(false));
        assert_eq!(modify_database_ddl(&platform, &diff).unwrap(), "");
    }

    #[test]
    fn test_add_column_and_index() {
        let platform = SqlPlatform::new(PlatformConfig::default());
        let diff = DatabaseDiff::new(book_db(false), book_db(true)).modify_entity(
            EntityDiff::new("book")
                .add_field("isbn")
                .add_index("book_isbn"),
        );
        let sql = modify_database_ddl(&platform, &diff).unwrap();
        assert_eq!(
            sql,
            "\nALTER TABLE \"book\" ADD\n(\n    \"isbn\" VARCHAR(24)\n);\n\
             \nCREATE INDEX \"book_isbn\" ON \"book\" (\"isbn\");\n"
        );
    }

    #[test]
    fn test_drop_precedes_column_removal() {
        let platform = SqlPlatform::new(PlatformConfig::default());
        let diff = DatabaseDiff::new(book_db(true), book_db(false)).modify_entity(
            EntityDiff::new("book")
                .remove_field("isbn")
                .remove_index("book_isbn"),
        );
        let sql = modify_database_ddl(&platform, &diff).unwrap();
        let drop_index = sql.find("DROP INDEX").unwrap();
        let drop_column = sql.find("DROP COLUMN").unwrap();
        assert!(drop_index < drop_column);
    }

    #[test]
    fn test_drops_after_rename_use_new_table() {
        let platform = SqlPlatform::new(PlatformConfig::default());
        let mut from = book_db(false);
        from.entity_mut("book")
            .unwrap()
            .add_index(Index::new(["title"]).named("t_idx"))
            .unwrap();
        let mut to = Database::new("bookstore");
        let books = to.add_entity(Entity::new("books")).unwrap();
        books
            .add_field(Field::new("id", FieldType::Integer).primary_key())
            .unwrap();
        books
            .add_field(Field::new("title", FieldType::Varchar).size(255).primary_key())
            .unwrap();

        let mut book = EntityDiff::new("book").remove_index("t_idx").modify_pk();
        book.to_entity = "books".to_string();
        let diff = DatabaseDiff::new(from, to)
            .rename_entity("book", "books")
            .modify_entity(book);
        assert_eq!(
            modify_database_ddl(&platform, &diff).unwrap(),
            "\nALTER TABLE \"book\" RENAME TO \"books\";\n\
             \nDROP INDEX \"t_idx\";\n\
             \nALTER TABLE \"books\" DROP CONSTRAINT \"book_pk\";\n\
             \nALTER TABLE \"books\" ADD PRIMARY KEY (\"id\", \"title\");\n"
        );
    }

    #[test]
    fn test_unknown_name_is_invalid_diff() {
        let platform = SqlPlatform::new(PlatformConfig::default());
        let diff = DatabaseDiff::new(book_db(false), book_db(false))
            .modify_entity(EntityDiff::new("book").remove_field("ghost"));
        assert!(modify_database_ddl(&platform, &diff).is_err());
    }
}
