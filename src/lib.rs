//! # strata
//!
//! A relational schema model and a dialect-aware DDL compiler.
//!
//! A [`Schema`](model::Schema) holds databases of entities, fields,
//! indices and relations. Behaviors extend the model before it is
//! finalized against a [`Platform`](platform::Platform), which then renders
//! `CREATE`/`DROP` scripts or migration DDL from a
//! [`DatabaseDiff`](diff::DatabaseDiff).
//!
//! ## Quick Example
//!
//! ```rust
//! use strata::prelude::*;
//!
//! let mut db = Database::new("bookstore");
//! let author = db.add_entity(Entity::new("author")).unwrap();
//! author
//!     .add_field(Field::new("id", FieldType::Integer).primary_key().auto_increment())
//!     .unwrap();
//! let book = db.add_entity(Entity::new("book")).unwrap();
//! book.add_field(Field::new("id", FieldType::Integer).primary_key().auto_increment())
//!     .unwrap();
//! book.add_relation(Relation::new("author"));
//!
//! let platform = PlatformKind::Mysql.platform(&PlatformConfig::default());
//! finalize_database(&mut db, platform.as_ref()).unwrap();
//! let sql = platform.get_add_entities_ddl(&db).unwrap();
//! assert!(sql.contains("`author_id` INTEGER"));
//! ```

pub mod behavior;
pub mod config;
pub mod diff;
pub mod document;
pub mod error;
pub mod model;
pub mod platform;

pub mod prelude {
    pub use crate::behavior::{Behavior, BehaviorModifier, BehaviorRegistry};
    pub use crate::config::Config;
    pub use crate::diff::{DatabaseDiff, EntityDiff, FieldDiff, compare};
    pub use crate::document::SchemaDocument;
    pub use crate::error::*;
    pub use crate::model::*;
    pub use crate::platform::{
        Platform, PlatformConfig, PlatformKind, finalize_database,
    };
}

/// Load a JSON schema file with the built-in behaviors, finalize it and
/// render the creation script of every database.
pub fn compile_file(
    path: impl AsRef<std::path::Path>,
    platform: &dyn platform::Platform,
) -> error::StrataResult<String> {
    let registry = behavior::BehaviorRegistry::with_builtins();
    let mut schema = document::load_schema(path, &registry)?;
    schema.finalize(platform)?;
    let mut sql = String::new();
    for database in schema.databases() {
        sql.push_str(&database.sql_dump(platform)?);
    }
    Ok(sql)
}
