//! Databases: entities, domains, sequences and the behavior pass.

use std::collections::BTreeMap;

use super::domain::Domain;
use super::entity::{Entity, IdMethod};
use super::relation::{Relation, RelationRef};
use super::traits::{Named, VendorCarrier};
use super::vendor::VendorInfo;
use crate::behavior::Behavior;
use crate::error::{StrataError, StrataResult};
use crate::platform::{Platform, PlatformKind};

/// Upper bound on entity behavior applications in one pass.
pub const MAX_BEHAVIOR_ITERATIONS: usize = 10_000;

/// Many-to-many structure seen from one side.
///
/// `incoming` is the pivot's relation pointing at the entity the cross
/// relation was computed for; `outgoing` are the pivot's other relations.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossRelation {
    pub middle_entity: String,
    pub incoming: RelationRef,
    pub outgoing: Vec<RelationRef>,
}

impl CrossRelation {
    pub fn is_composite(&self) -> bool {
        self.outgoing.len() > 1
    }
}

/// One connection's worth of entities.
#[derive(Debug, Clone)]
pub struct Database {
    name: String,
    schema: Option<String>,
    namespace: Option<String>,
    parent_schema: Option<String>,
    platform: Option<PlatformKind>,
    entities: Vec<Entity>,
    domains: BTreeMap<String, Domain>,
    sequences: Vec<String>,
    behaviors: Vec<Behavior>,
    default_id_method: IdMethod,
    heavy_indexing: bool,
    vendor: Vec<VendorInfo>,
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            namespace: None,
            parent_schema: None,
            platform: None,
            entities: Vec::new(),
            domains: BTreeMap::new(),
            sequences: Vec::new(),
            behaviors: Vec::new(),
            default_id_method: IdMethod::Native,
            heavy_indexing: false,
            vendor: Vec::new(),
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        for entity in &mut self.entities {
            entity.set_database(Some(self.name.clone()));
        }
    }

    /// SQL schema applied to entities that do not declare their own.
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn set_schema(&mut self, schema: Option<String>) {
        self.schema = schema;
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn set_namespace(&mut self, namespace: Option<String>) {
        self.namespace = namespace;
    }

    /// Name of the owning [`Schema`](super::Schema).
    pub fn parent_schema(&self) -> Option<&str> {
        self.parent_schema.as_deref()
    }

    pub(crate) fn set_parent_schema(&mut self, schema: Option<String>) {
        self.parent_schema = schema;
    }

    pub fn platform(&self) -> Option<PlatformKind> {
        self.platform
    }

    pub fn set_platform(&mut self, platform: Option<PlatformKind>) {
        self.platform = platform;
    }

    pub fn default_id_method(&self) -> IdMethod {
        self.default_id_method
    }

    pub fn set_default_id_method(&mut self, id_method: IdMethod) {
        self.default_id_method = id_method;
    }

    pub fn is_heavy_indexing(&self) -> bool {
        self.heavy_indexing
    }

    pub fn set_heavy_indexing(&mut self, heavy_indexing: bool) {
        self.heavy_indexing = heavy_indexing;
    }

    // ---- entities ----

    /// Take ownership of `entity` and point its back-reference here.
    /// Unset id method, schema and namespace are inherited.
    pub fn add_entity(&mut self, mut entity: Entity) -> StrataResult<&mut Entity> {
        if self.has_entity(entity.name()) {
            return Err(StrataError::DuplicateEntity {
                database: self.name.clone(),
                entity: entity.name().to_string(),
            });
        }
        entity.set_database(Some(self.name.clone()));
        if !entity.has_explicit_id_method() {
            entity.set_id_method(self.default_id_method);
        }
        if entity.schema().is_none() && self.schema.is_some() {
            entity.set_schema(self.schema.clone());
        }
        if entity.namespace().is_none() && self.namespace.is_some() {
            entity.set_namespace(self.namespace.clone());
        }
        self.entities.push(entity);
        let last = self.entities.len() - 1;
        Ok(&mut self.entities[last])
    }

    pub fn remove_entity(&mut self, name: &str) -> Option<Entity> {
        let pos = self.entity_position(name)?;
        let mut entity = self.entities.remove(pos);
        entity.set_database(None);
        Some(entity)
    }

    /// Lookup by short or namespace-qualified name.
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.is_named(name))
    }

    pub fn entity_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.is_named(name))
    }

    pub fn entity_by_table(&self, table: &str) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|e| e.table_name() == table || e.full_table_name() == table)
    }

    pub(crate) fn entity_position(&self, name: &str) -> Option<usize> {
        self.entities.iter().position(|e| e.is_named(name))
    }

    pub(crate) fn entity_at_mut(&mut self, idx: usize) -> &mut Entity {
        &mut self.entities[idx]
    }

    pub fn has_entity(&self, name: &str) -> bool {
        self.entity(name).is_some()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }

    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|e| e.name())
    }

    /// Entities that produce DDL.
    pub fn entities_for_sql(&self) -> Vec<&Entity> {
        self.entities.iter().filter(|e| e.is_sql_eligible()).collect()
    }

    /// Resolve a relation pointer.
    pub fn relation(&self, reference: &RelationRef) -> Option<&Relation> {
        self.entity(&reference.entity)?.relation(&reference.relation)
    }

    /// The structurally mirrored relation on the foreign entity, if any.
    pub fn inverse_relation(&self, entity: &str, relation: &str) -> Option<&Relation> {
        let owner = self.entity(entity)?;
        let relation = owner.relation(relation)?;
        let foreign = self.entity(relation.foreign_entity())?;
        foreign
            .relations()
            .iter()
            .find(|r| owner.is_named(r.foreign_entity()) && r.is_inverse_of(relation))
    }

    /// Many-to-many relations reaching `entity` through cross-ref pivots.
    pub fn cross_relations(&self, entity: &str) -> Vec<CrossRelation> {
        let Some(target) = self.entity(entity) else {
            return Vec::new();
        };
        target
            .referrers()
            .iter()
            .filter_map(|incoming| {
                let middle = self.entity(&incoming.entity)?;
                if !middle.is_cross_ref() {
                    return None;
                }
                let outgoing = middle
                    .relations()
                    .iter()
                    .map(|r| RelationRef::new(middle.name(), r.name()))
                    .filter(|r| r.relation != incoming.relation)
                    .collect();
                Some(CrossRelation {
                    middle_entity: middle.name().to_string(),
                    incoming: incoming.clone(),
                    outgoing,
                })
            })
            .collect()
    }

    // ---- domains & sequences ----

    /// Register a custom domain, replacing any domain of the same name.
    pub fn add_domain(&mut self, domain: Domain) {
        self.domains.insert(domain.name().to_string(), domain);
    }

    pub fn domain(&self, name: &str) -> Option<&Domain> {
        self.domains.get(name)
    }

    pub fn domains(&self) -> impl Iterator<Item = &Domain> {
        self.domains.values()
    }

    pub fn add_sequence(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.has_sequence(&name) {
            self.sequences.push(name);
        }
    }

    pub fn has_sequence(&self, name: &str) -> bool {
        self.sequences.iter().any(|s| s == name)
    }

    pub fn sequences(&self) -> &[String] {
        &self.sequences
    }

    // ---- behaviors ----

    pub fn add_behavior(&mut self, behavior: Behavior) -> StrataResult<()> {
        if self.has_behavior(behavior.id()) && !behavior.allow_multiple() {
            return Err(StrataError::DuplicateBehavior {
                owner: self.name.clone(),
                behavior: behavior.id().to_string(),
            });
        }
        self.behaviors.push(behavior);
        Ok(())
    }

    pub fn has_behavior(&self, id: &str) -> bool {
        self.behaviors.iter().any(|b| b.id() == id)
    }

    pub fn behaviors(&self) -> &[Behavior] {
        &self.behaviors
    }

    /// The next unapplied entity behavior: first in insertion order among
    /// the lowest modification order.
    pub fn next_entity_behavior(&self) -> Option<(&Entity, &Behavior)> {
        let (ei, bi) = self.next_behavior_position()?;
        let entity = &self.entities[ei];
        Some((entity, &entity.behaviors()[bi]))
    }

    fn next_behavior_position(&self) -> Option<(usize, usize)> {
        let mut buckets: BTreeMap<i32, Vec<(usize, usize)>> = BTreeMap::new();
        for (ei, entity) in self.entities.iter().enumerate() {
            for (bi, behavior) in entity.behaviors().iter().enumerate() {
                if !behavior.is_entity_modified() {
                    buckets
                        .entry(behavior.entity_modification_order())
                        .or_default()
                        .push((ei, bi));
                }
            }
        }
        buckets.into_values().next()?.into_iter().next()
    }

    /// Propagate database behaviors, then apply entity behaviors until none
    /// is left. The queue is re-scanned after every application because
    /// behaviors may add entities or behaviors.
    pub fn apply_behaviors(&mut self) -> StrataResult<()> {
        let database_behaviors = self.behaviors.clone();
        for behavior in &database_behaviors {
            tracing::debug!("Applying database behavior '{}' to '{}'", behavior.id(), self.name);
            behavior.modify_database(self)?;
        }

        let mut iterations = 0;
        while let Some((ei, bi)) = self.next_behavior_position() {
            iterations += 1;
            if iterations > MAX_BEHAVIOR_ITERATIONS {
                return Err(StrataError::BehaviorLoop(MAX_BEHAVIOR_ITERATIONS));
            }
            let entity = self.entities[ei].name().to_string();
            let behavior = match self.entities[ei].behavior_at_mut(bi) {
                Some(behavior) => {
                    behavior.set_entity_modified(true);
                    behavior.clone()
                }
                None => continue,
            };
            tracing::trace!(
                "Applying behavior '{}' (order {}) to entity '{}'",
                behavior.id(),
                behavior.entity_modification_order(),
                entity
            );
            behavior.modify_entity(self, &entity)?;
        }
        Ok(())
    }

    // ---- DDL ----

    /// Full creation script for this database.
    pub fn sql_dump(&self, platform: &dyn Platform) -> StrataResult<String> {
        platform.get_add_entities_ddl(self)
    }
}

impl Named for Database {
    fn name(&self) -> &str {
        &self.name
    }
}

impl VendorCarrier for Database {
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
    use crate::behavior::BehaviorModifier;
    use crate::model::{Field, FieldType};

    fn two_tables() -> Database {
        let mut db = Database::new("bookstore");
        db.add_entity(Entity::new("table1")).unwrap();
        db.add_entity(Entity::new("table2")).unwrap();
        db
    }

    #[test]
    fn test_add_entity_sets_back_reference() {
        let mut db = two_tables();
        assert_eq!(db.entity("table1").unwrap().database(), Some("bookstore"));

        let removed = db.remove_entity("table1").unwrap();
        assert_eq!(removed.database(), None);
        assert!(!db.has_entity("table1"));
        assert!(matches!(
            db.add_entity(Entity::new("table2")),
            Err(StrataError::DuplicateEntity { .. })
        ));
    }

    #[test]
    fn test_entity_inherits_id_method() {
        let mut db = Database::new("bookstore");
        db.set_default_id_method(IdMethod::None);
        db.add_entity(Entity::new("book")).unwrap();
        assert_eq!(db.entity("book").unwrap().id_method(), IdMethod::None);
    }

    #[test]
    fn test_database_behavior_propagation_is_idempotent() {
        let mut db = two_tables();
        db.add_behavior(Behavior::plain("timestampable")).unwrap();

        db.apply_behaviors().unwrap();
        db.apply_behaviors().unwrap();

        for entity in db.entities() {
            let count = entity
                .behaviors()
                .iter()
                .filter(|b| b.id() == "timestampable")
                .count();
            assert_eq!(count, 1);
            assert!(entity.behaviors()[0].is_entity_modified());
        }
    }

    #[test]
    fn test_scheduler_picks_lowest_order_first() {
        let mut db = two_tables();
        let mut late = Behavior::plain("late");
        late.set_entity_modification_order(80);
        let mut early = Behavior::plain("early");
        early.set_entity_modification_order(10);
        db.entity_mut("table1").unwrap().add_behavior(late).unwrap();
        db.entity_mut("table2").unwrap().add_behavior(early).unwrap();

        let (entity, behavior) = db.next_entity_behavior().unwrap();
        assert_eq!(entity.name(), "table2");
        assert_eq!(behavior.id(), "early");
    }

    struct Spawner;

    impl BehaviorModifier for Spawner {
        fn modify_entity(&self, _b: &Behavior, db: &mut Database, entity: &str) -> StrataResult<()> {
            if entity == "table1" {
                let mut archive = Entity::new("table1_archive");
                archive.add_behavior(Behavior::plain("archived"))?;
                db.add_entity(archive)?;
            }
            Ok(())
        }
    }

    #[test]
    fn test_behaviors_added_mid_loop_are_applied() {
        let mut db = two_tables();
        db.entity_mut("table1")
            .unwrap()
            .add_behavior(Behavior::new("spawner", Spawner))
            .unwrap();

        db.apply_behaviors().unwrap();

        let archive = db.entity("table1_archive").unwrap();
        assert!(archive.behavior("archived").unwrap().is_entity_modified());
        assert!(db.next_entity_behavior().is_none());
    }

    struct Forever;

    impl BehaviorModifier for Forever {
        fn allow_multiple(&self) -> bool {
            true
        }

        fn modify_entity(&self, b: &Behavior, db: &mut Database, entity: &str) -> StrataResult<()> {
            if let Some(e) = db.entity_mut(entity) {
                e.add_behavior(Behavior::with_modifier(b.name(), b.modifier().clone()))?;
            }
            Ok(())
        }
    }

    #[test]
    fn test_runaway_behavior_is_stopped() {
        let mut db = two_tables();
        db.entity_mut("table1")
            .unwrap()
            .add_behavior(Behavior::new("forever", Forever))
            .unwrap();
        assert!(matches!(db.apply_behaviors(), Err(StrataError::BehaviorLoop(_))));
    }

    #[test]
    fn test_cross_relations() {
        let mut db = Database::new("bookstore");
        for name in ["book", "author"] {
            let mut entity = Entity::new(name);
            entity.add_field(Field::new("id", FieldType::Integer).primary_key()).unwrap();
            db.add_entity(entity).unwrap();
        }
        let mut pivot = Entity::new("book_author");
        pivot.set_cross_ref(true);
        pivot.add_field(Field::new("bookId", FieldType::Integer).primary_key()).unwrap();
        pivot.add_field(Field::new("authorId", FieldType::Integer).primary_key()).unwrap();
        pivot.add_relation(crate::model::Relation::new("book").reference("bookId", "id"));
        pivot.add_relation(crate::model::Relation::new("author").reference("authorId", "id"));
        let to_book = pivot.relations()[0].name();
        db.add_entity(pivot).unwrap();
        db.entity_mut("book")
            .unwrap()
            .add_referrer(RelationRef::new("book_author", to_book.clone()));

        let cross = db.cross_relations("book");
        assert_eq!(cross.len(), 1);
        assert_eq!(cross[0].middle_entity, "book_author");
        assert_eq!(cross[0].incoming.relation, to_book);
        assert_eq!(cross[0].outgoing.len(), 1);
    }
}
