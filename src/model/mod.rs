//! Schema model graph.
//!
//! Ownership is a tree: [`Schema`] -> [`Database`] -> [`Entity`] ->
//! [`Field`] / [`Index`] / [`Relation`]. Back-references (a field's entity,
//! an entity's database, a relation's referrers) are names resolved through
//! the owning [`Database`].

mod database;
mod default_value;
mod domain;
mod entity;
mod field;
mod index;
pub mod naming;
mod relation;
mod schema;
mod traits;
mod types;
mod vendor;

pub use database::{CrossRelation, Database, MAX_BEHAVIOR_ITERATIONS};
pub use default_value::{DefaultKind, FieldDefaultValue};
pub use domain::Domain;
pub use entity::{Entity, IdMethod};
pub use field::{Field, Inheritance};
pub use index::{Index, IndexField};
pub use relation::{Relation, RelationAction, RelationRef};
pub use schema::Schema;
pub use traits::{Describable, Named, VendorCarrier};
pub use types::FieldType;
pub use vendor::VendorInfo;
