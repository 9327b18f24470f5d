//! Model finalization.
//!
//! Runs once per database before any DDL is rendered:
//! behaviors, then per entity the dialect's name limit, unique field
//! constraints, heavy indexing, id method downgrade and relation
//! references, then referrers, then the dialect pass. Referrers are
//! registered in their own sweep so the dialect pass sees every inbound
//! relation regardless of entity order.

use std::collections::BTreeMap;

use super::Platform;
use crate::error::{StrataError, StrataResult};
use crate::model::naming::{lcfirst, studly_case, truncate};
use crate::model::{Database, Entity, Field, IdMethod, Index, Named, RelationRef};

/// Generated-name bookkeeping scoped to one finalization run.
#[derive(Debug, Default)]
pub struct NamingCache {
    counters: BTreeMap<String, usize>,
    names: BTreeMap<String, String>,
}

impl NamingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `base + suffix` when it fits in `max_len`; otherwise `base` is cut
    /// and a per-suffix counter appended (`<base>_SEQ_1`, `<base>_SEQ_2`, ...).
    /// Asking twice for the same inputs yields the same name.
    pub fn shortened(&mut self, base: &str, suffix: &str, max_len: usize) -> String {
        let full = format!("{}{}", base, suffix);
        if full.len() <= max_len {
            return full;
        }
        if let Some(name) = self.names.get(&full) {
            return name.clone();
        }
        let counter = self.counters.entry(suffix.to_string()).or_insert(0);
        *counter += 1;
        let tail = format!("{}_{}", suffix, counter);
        let mut head = base.to_string();
        truncate(&mut head, max_len.saturating_sub(tail.len()));
        let name = format!("{}{}", head, tail);
        self.names.insert(full, name.clone());
        name
    }
}

/// Finalize `database` for `platform`.
pub fn finalize_database(database: &mut Database, platform: &dyn Platform) -> StrataResult<()> {
    tracing::debug!("Finalizing database '{}' for {}", database.name(), platform.name());
    database.apply_behaviors()?;

    let names: Vec<String> = database.entity_names().map(str::to_string).collect();
    let heavy_indexing = database.is_heavy_indexing();

    for name in &names {
        if let Some(entity) = database.entity_mut(name) {
            entity.set_name_limit(platform.max_identifier_length());
            add_unique_field_constraints(entity)?;
            if entity.heavy_indexing().unwrap_or(heavy_indexing) {
                add_heavy_indices(entity)?;
            }
            downgrade_id_method(entity);
        }
        setup_relation_references(database, name)?;
    }
    for name in &names {
        setup_referrers(database, name)?;
    }

    let mut cache = NamingCache::new();
    for name in &names {
        platform.finalize_entity(database, name, &mut cache)?;
    }
    Ok(())
}

/// A single-column unique constraint for every field flagged `unique`.
fn add_unique_field_constraints(entity: &mut Entity) -> StrataResult<()> {
    let flagged: Vec<String> = entity
        .fields()
        .iter()
        .filter(|f| f.is_unique() && !entity.is_unique_on(&[f.name()]))
        .map(|f| f.name().to_string())
        .collect();
    for name in flagged {
        tracing::debug!("Unique constraint on {}({})", entity.name(), name);
        entity.add_unique(Index::unique([name]))?;
    }
    Ok(())
}

/// One index per primary key suffix `pk[i..]`, `i >= 1`.
fn add_heavy_indices(entity: &mut Entity) -> StrataResult<()> {
    let pk: Vec<String> = entity
        .primary_key_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    for i in 1..pk.len() {
        let suffix: Vec<&str> = pk[i..].iter().map(String::as_str).collect();
        if entity.is_indexed(&suffix) {
            continue;
        }
        tracing::debug!("Heavy index on {}({})", entity.name(), suffix.join(", "));
        entity.add_index(Index::new(suffix))?;
    }
    Ok(())
}

fn downgrade_id_method(entity: &mut Entity) {
    if entity.is_native_id_method() && !entity.has_auto_increment() {
        tracing::debug!("Entity '{}' has no auto-increment field, id method set to none", entity.name());
        entity.set_id_method(IdMethod::None);
    }
}

/// Wire the reference pairs of every outgoing relation of `name`.
fn setup_relation_references(database: &mut Database, name: &str) -> StrataResult<()> {
    let Some(idx) = database.entity_position(name) else {
        return Ok(());
    };
    let relation_count = database.entities()[idx].relations().len();

    for ri in 0..relation_count {
        let entity = &database.entities()[idx];
        let relation = &entity.relations()[ri];
        let foreign = database.entity(relation.foreign_entity()).ok_or_else(|| {
            StrataError::unknown_entity(
                relation.foreign_entity(),
                &format!("relation '{}' of entity '{}'", relation.name(), entity.name()),
                database.entity_names(),
            )
        })?;
        let foreign_table = foreign.full_table_name();

        if relation.has_references() {
            let mut hidden = Vec::new();
            for (local, foreign_field) in relation.references() {
                if !entity.has_field(local) {
                    return Err(StrataError::UnknownField {
                        entity: entity.name().to_string(),
                        field: local.to_string(),
                        context: format!("relation '{}'", relation.name()),
                    });
                }
                if foreign.field(foreign_field).is_some_and(Field::is_primary_key) {
                    hidden.push(local.to_string());
                }
            }
            if relation.matches_local_primary_key(entity) {
                hidden.clear();
            }
            let entity = database.entity_at_mut(idx);
            for local in hidden {
                if let Some(field) = entity.field_mut(&local) {
                    field.set_implementation_detail(true);
                }
            }
            entity.relations_vec_mut()[ri].set_foreign_table(Some(foreign_table));
            continue;
        }

        let pk = foreign.primary_key();
        if pk.is_empty() {
            return Err(StrataError::MissingForeignPrimaryKey {
                entity: entity.name().to_string(),
                relation: relation.name(),
                foreign: foreign.name().to_string(),
            });
        }
        let prefix = lcfirst(&relation.field_name());
        let mut synthesized = Vec::with_capacity(pk.len());
        for pk_field in pk {
            let field_name = format!("{}{}", prefix, studly_case(pk_field.name()));
            if entity.has_field(&field_name) {
                return Err(StrataError::SynthesizedFieldCollision {
                    entity: entity.name().to_string(),
                    relation: relation.name(),
                    field: field_name,
                });
            }
            let mut field = Field::with_domain(field_name, pk_field.domain().clone());
            field.set_implementation_detail(true);
            synthesized.push((field, pk_field.name().to_string()));
        }

        let entity = database.entity_at_mut(idx);
        for (field, foreign_field) in synthesized {
            tracing::debug!("Synthesized field {}.{}", entity.name(), field.name());
            let local = entity.add_field(field)?.name().to_string();
            entity.relations_vec_mut()[ri].add_reference(local, foreign_field);
        }
        entity.relations_vec_mut()[ri].set_foreign_table(Some(foreign_table));
    }
    Ok(())
}

/// Register every outgoing relation of `name` on its foreign entity and
/// the referenced foreign fields.
fn setup_referrers(database: &mut Database, name: &str) -> StrataResult<()> {
    let Some(entity) = database.entity(name) else {
        return Ok(());
    };
    let mut registrations = Vec::new();
    let mut contains_foreign_pk = false;

    for relation in entity.relations() {
        let foreign = database.entity(relation.foreign_entity()).ok_or_else(|| {
            StrataError::unknown_entity(
                relation.foreign_entity(),
                &format!("relation '{}' of entity '{}'", relation.name(), entity.name()),
                database.entity_names(),
            )
        })?;
        for (local, foreign_field) in relation.references() {
            if !foreign.has_field(foreign_field) {
                return Err(StrataError::UnknownField {
                    entity: foreign.name().to_string(),
                    field: foreign_field.to_string(),
                    context: format!("relation '{}' of entity '{}'", relation.name(), entity.name()),
                });
            }
            if entity.field(local).is_some_and(Field::is_primary_key) {
                contains_foreign_pk = true;
            }
        }
        registrations.push((
            foreign.name().to_string(),
            RelationRef::new(entity.name(), relation.name()),
            relation.foreign_fields().to_vec(),
        ));
    }

    if contains_foreign_pk && let Some(entity) = database.entity_mut(name) {
        entity.set_contains_foreign_pk(true);
    }
    for (foreign, reference, fields) in registrations {
        let Some(foreign) = database.entity_mut(&foreign) else {
            continue;
        };
        foreign.add_referrer(reference.clone());
        for field in &fields {
            if let Some(field) = foreign.field_mut(field) {
                field.add_referrer(reference.clone());
            }
        }
    }
    Ok(())
}
