//! JSON schema documents.
//!
//! A thin serde mapping of the model. Everything is built through the public
//! mutation API, so the usual integrity checks apply while loading.
//!
//! ```json
//! {
//!   "databases": [{
//!     "name": "bookstore",
//!     "entities": [{
//!       "name": "book",
//!       "fields": [
//!         { "name": "id", "type": "INTEGER", "primary_key": true, "auto_increment": true },
//!         { "name": "title", "type": "VARCHAR", "size": 255, "not_null": true }
//!       ],
//!       "relations": [{ "foreign_entity": "author", "on_delete": "CASCADE" }]
//!     }]
//!   }]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::behavior::{Behavior, BehaviorRegistry};
use crate::error::{StrataError, StrataResult};
use crate::model::{
    Database, Describable, Domain, Entity, Field, FieldDefaultValue, FieldType, IdMethod, Index,
    IndexField, Inheritance, Named, Relation, Schema, VendorCarrier, VendorInfo,
};
use crate::platform::PlatformKind;

/// Root of a schema document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub databases: Vec<DatabaseDoc>,
    /// Included schemas, joined during finalization.
    #[serde(default)]
    pub external_schemas: Vec<SchemaDocument>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseDoc {
    pub name: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub default_id_method: Option<String>,
    #[serde(default)]
    pub heavy_indexing: bool,
    #[serde(default)]
    pub domains: Vec<DomainDoc>,
    #[serde(default)]
    pub sequences: Vec<String>,
    #[serde(default)]
    pub behaviors: Vec<BehaviorDoc>,
    #[serde(default)]
    pub vendor: Vec<VendorDoc>,
    #[serde(default)]
    pub entities: Vec<EntityDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub sql_type: Option<String>,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub scale: Option<u32>,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityDoc {
    pub name: String,
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub id_method: Option<String>,
    #[serde(default)]
    pub id_method_parameter: Option<String>,
    #[serde(default)]
    pub heavy_indexing: Option<bool>,
    #[serde(default)]
    pub skip_sql: bool,
    #[serde(default)]
    pub reference_only: bool,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub is_cross_ref: bool,
    #[serde(default)]
    pub fields: Vec<FieldDoc>,
    #[serde(default)]
    pub indices: Vec<IndexDoc>,
    #[serde(default)]
    pub uniques: Vec<IndexDoc>,
    #[serde(default)]
    pub relations: Vec<RelationDoc>,
    #[serde(default)]
    pub behaviors: Vec<BehaviorDoc>,
    #[serde(default)]
    pub vendor: Vec<VendorDoc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldDoc {
    pub name: String,
    /// Abstract type; optional when `domain` is given.
    #[serde(rename = "type", default)]
    pub field_type: Option<String>,
    /// Name of a domain declared on the database.
    #[serde(default)]
    pub domain: Option<String>,
    /// Replaces the dialect SQL type verbatim.
    #[serde(default)]
    pub sql_type: Option<String>,
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub scale: Option<u32>,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub default_expr: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub inheritance: Vec<InheritanceDoc>,
    #[serde(default)]
    pub vendor: Vec<VendorDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InheritanceDoc {
    pub key: String,
    pub class: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDoc {
    #[serde(default)]
    pub name: Option<String>,
    pub fields: Vec<IndexFieldDoc>,
    #[serde(default)]
    pub vendor: Vec<VendorDoc>,
}

/// `"title"` or `{ "name": "title", "size": 10 }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexFieldDoc {
    Name(String),
    Sized { name: String, size: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationDoc {
    pub foreign_entity: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Property name on the owning side.
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub references: Vec<ReferenceDoc>,
    #[serde(default)]
    pub on_delete: Option<String>,
    #[serde(default)]
    pub on_update: Option<String>,
    #[serde(default)]
    pub skip_sql: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceDoc {
    pub local: String,
    pub foreign: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorDoc {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorDoc {
    #[serde(rename = "type")]
    pub vendor_type: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl SchemaDocument {
    pub fn from_json(json: &str) -> StrataResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> StrataResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        tracing::debug!("Loaded schema document {}", path.display());
        Self::from_json(&content)
    }

    /// Build the model graph. Behaviors are resolved through `registry`.
    pub fn into_schema(self, registry: &BehaviorRegistry) -> StrataResult<Schema> {
        let mut schema = match self.name {
            Some(name) => Schema::named(name),
            None => Schema::new(),
        };
        for database in self.databases {
            schema.add_database(database.into_database(registry)?)?;
        }
        for external in self.external_schemas {
            schema.add_external_schema(external.into_schema(registry)?);
        }
        Ok(schema)
    }
}

/// Read and build a schema file in one step.
pub fn load_schema(path: impl AsRef<Path>, registry: &BehaviorRegistry) -> StrataResult<Schema> {
    SchemaDocument::from_path(path)?.into_schema(registry)
}

impl DatabaseDoc {
    fn into_database(self, registry: &BehaviorRegistry) -> StrataResult<Database> {
        let mut database = Database::new(self.name);
        database.set_schema(self.schema);
        database.set_namespace(self.namespace);
        if let Some(platform) = &self.platform {
            database.set_platform(Some(PlatformKind::from_name(platform)?));
        }
        if let Some(id_method) = &self.default_id_method {
            database.set_default_id_method(id_method.parse()?);
        }
        database.set_heavy_indexing(self.heavy_indexing);
        apply_vendor(&mut database, self.vendor);

        for domain in self.domains {
            database.add_domain(domain.into_domain()?);
        }
        for sequence in self.sequences {
            database.add_sequence(sequence);
        }
        for behavior in self.behaviors {
            database.add_behavior(behavior.into_behavior(registry)?)?;
        }
        for entity in self.entities {
            let entity = entity.into_entity(&database, registry)?;
            database.add_entity(entity)?;
        }
        Ok(database)
    }
}

impl DomainDoc {
    fn into_domain(self) -> StrataResult<Domain> {
        let mut domain = Domain::named(self.name, self.field_type.parse::<FieldType>()?);
        if let Some(sql_type) = self.sql_type {
            domain.replace_sql_type(sql_type);
        }
        domain.set_size(self.size);
        domain.set_scale(self.scale);
        domain.set_default_value(self.default.map(FieldDefaultValue::new));
        domain.set_description(self.description);
        Ok(domain)
    }
}

impl EntityDoc {
    fn into_entity(self, database: &Database, registry: &BehaviorRegistry) -> StrataResult<Entity> {
        let mut entity = Entity::new(self.name);
        entity.set_table_name(self.table_name);
        entity.set_namespace(self.namespace);
        entity.set_schema(self.schema);
        entity.set_description(self.description);
        if let Some(id_method) = &self.id_method {
            entity.set_id_method(id_method.parse::<IdMethod>()?);
        }
        entity.set_id_method_parameter(self.id_method_parameter);
        entity.set_heavy_indexing(self.heavy_indexing);
        entity.set_skip_sql(self.skip_sql);
        entity.set_reference_only(self.reference_only);
        entity.set_alias(self.alias);
        entity.set_cross_ref(self.is_cross_ref);
        apply_vendor(&mut entity, self.vendor);

        for field in self.fields {
            let field = field.into_field(database, entity.name())?;
            entity.add_field(field)?;
        }
        for index in self.indices {
            entity.add_index(index.into_index(false))?;
        }
        for unique in self.uniques {
            entity.add_unique(unique.into_index(true))?;
        }
        for relation in self.relations {
            let relation = relation.into_relation()?;
            entity.add_relation(relation);
        }
        for behavior in self.behaviors {
            entity.add_behavior(behavior.into_behavior(registry)?)?;
        }
        Ok(entity)
    }
}

impl FieldDoc {
    fn into_field(self, database: &Database, entity: &str) -> StrataResult<Field> {
        let mut domain = match (&self.domain, &self.field_type) {
            (Some(name), _) => database.domain(name).cloned().ok_or_else(|| {
                StrataError::UnknownDomain {
                    domain: name.clone(),
                    context: format!("field '{}.{}'", entity, self.name),
                    available: database.domains().map(Domain::name).collect::<Vec<_>>().join(", "),
                }
            })?,
            (None, Some(field_type)) => Domain::new(field_type.parse::<FieldType>()?),
            (None, None) => {
                return Err(StrataError::Config(format!(
                    "Field '{}.{}' needs a type or a domain",
                    entity, self.name
                )));
            }
        };
        if self.domain.is_some()
            && let Some(field_type) = &self.field_type
        {
            domain.set_field_type(field_type.parse::<FieldType>()?);
        }
        if let Some(sql_type) = self.sql_type {
            domain.replace_sql_type(sql_type);
        }
        if self.size.is_some() {
            domain.set_size(self.size);
        }
        if self.scale.is_some() {
            domain.set_scale(self.scale);
        }
        if let Some(expression) = self.default_expr {
            domain.set_default_value(Some(FieldDefaultValue::expression(expression)));
        } else if let Some(value) = self.default {
            domain.set_default_value(Some(FieldDefaultValue::new(value)));
        }

        let mut field = Field::with_domain(self.name, domain);
        field.set_column_name(self.column);
        field.set_primary_key(self.primary_key);
        field.set_auto_increment(self.auto_increment);
        field.set_unique(self.unique);
        if self.not_null {
            field.set_not_null(true);
        }
        field.set_description(self.description);
        if !self.values.is_empty() {
            field.set_value_set(self.values);
        }
        for inheritance in self.inheritance {
            field.add_inheritance(Inheritance::new(inheritance.key, inheritance.class));
        }
        apply_vendor(&mut field, self.vendor);
        Ok(field)
    }
}

impl IndexDoc {
    fn into_index(self, unique: bool) -> Index {
        let mut index = if unique {
            Index::unique(Vec::<String>::new())
        } else {
            Index::new(Vec::<String>::new())
        };
        index.set_name(self.name);
        index.set_fields(
            self.fields
                .into_iter()
                .map(|f| match f {
                    IndexFieldDoc::Name(name) => IndexField::new(name),
                    IndexFieldDoc::Sized { name, size } => IndexField::sized(name, size),
                })
                .collect(),
        );
        apply_vendor(&mut index, self.vendor);
        index
    }
}

impl RelationDoc {
    fn into_relation(self) -> StrataResult<Relation> {
        let mut relation = Relation::new(self.foreign_entity);
        relation.set_name(self.name);
        if let Some(field) = self.field {
            relation = relation.field(field);
        }
        for reference in self.references {
            relation.add_reference(reference.local, reference.foreign);
        }
        if let Some(action) = &self.on_delete {
            relation.set_on_delete(action.parse()?);
        }
        if let Some(action) = &self.on_update {
            relation.set_on_update(action.parse()?);
        }
        relation.set_skip_sql(self.skip_sql);
        Ok(relation)
    }
}

impl BehaviorDoc {
    fn into_behavior(self, registry: &BehaviorRegistry) -> StrataResult<Behavior> {
        let mut behavior = registry.create(&self.name)?;
        if let Some(id) = self.id {
            behavior.set_id(id);
        }
        for (name, value) in &self.parameters {
            behavior.set_parameter(name, value.as_deref());
        }
        Ok(behavior)
    }
}

fn apply_vendor(target: &mut impl VendorCarrier, vendor: Vec<VendorDoc>) {
    for doc in vendor {
        let mut info = VendorInfo::new(doc.vendor_type);
        for (name, value) in doc.parameters {
            info.set_parameter(name, value);
        }
        target.add_vendor_info(info);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::RelationAction;

    const BOOKSTORE: &str = r#"{
        "databases": [{
            "name": "bookstore",
            "platform": "mysql",
            "domains": [{ "name": "price", "type": "DECIMAL", "size": 10, "scale": 2 }],
            "entities": [
                {
                    "name": "author",
                    "fields": [{ "name": "id", "type": "INTEGER", "primary_key": true, "auto_increment": true }]
                },
                {
                    "name": "book",
                    "vendor": [{ "type": "mysql", "parameters": { "Engine": "MyISAM" } }],
                    "fields": [
                        { "name": "id", "type": "INTEGER", "primary_key": true, "auto_increment": true },
                        { "name": "title", "type": "VARCHAR", "size": 255, "not_null": true },
                        { "name": "price", "domain": "price" },
                        { "name": "status", "type": "ENUM", "values": ["draft", "published"], "default": "draft" }
                    ],
                    "indices": [{ "name": "book_title", "fields": [{ "name": "title", "size": 20 }] }],
                    "relations": [{ "foreign_entity": "author", "field": "author", "on_delete": "set null" }],
                    "behaviors": [{ "name": "timestampable", "parameters": { "disable_updated_at": "true" } }]
                }
            ]
        }]
    }"#;

    #[test]
    fn test_builds_model() {
        let schema = SchemaDocument::from_json(BOOKSTORE)
            .unwrap()
            .into_schema(&BehaviorRegistry::with_builtins())
            .unwrap();
        let db = schema.database("bookstore").unwrap();
        assert_eq!(db.platform(), Some(PlatformKind::Mysql));

        let book = db.entity("book").unwrap();
        assert_eq!(book.database(), Some("bookstore"));
        assert_eq!(book.fields().len(), 4);
        let price = book.field("price").unwrap();
        assert_eq!(price.field_type(), FieldType::Decimal);
        assert_eq!(price.get_size(), Some(10));
        assert_eq!(price.get_scale(), Some(2));
        assert_eq!(book.field("status").unwrap().value_set(), ["draft", "published"]);
        assert_eq!(book.indices()[0].field_size("title"), Some(20));
        assert_eq!(book.relations()[0].get_on_delete(), RelationAction::SetNull);
        assert_eq!(book.behaviors()[0].name(), "timestampable");
        assert_eq!(
            book.vendor_info_for("mysql").parameter("Engine"),
            Some("MyISAM")
        );
    }

    #[test]
    fn test_unknown_type() {
        let json = r#"{ "databases": [{ "name": "db", "entities": [
            { "name": "t", "fields": [{ "name": "x", "type": "MONEY" }] }
        ] }] }"#;
        let err = SchemaDocument::from_json(json)
            .unwrap()
            .into_schema(&BehaviorRegistry::new())
            .unwrap_err();
        assert!(matches!(err, StrataError::UnknownType(_)));
    }

    #[test]
    fn test_unknown_domain() {
        let json = r#"{ "databases": [{
            "name": "db",
            "domains": [{ "name": "price", "type": "DECIMAL", "size": 10, "scale": 2 }],
            "entities": [{ "name": "t", "fields": [{ "name": "x", "domain": "money" }] }]
        }] }"#;
        let err = SchemaDocument::from_json(json)
            .unwrap()
            .into_schema(&BehaviorRegistry::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaIntegrity);
        assert!(matches!(
            &err,
            StrataError::UnknownDomain { domain, available, .. } if domain == "money" && available == "price"
        ));
        assert!(err.to_string().contains("field 't.x'"));
    }

    #[test]
    fn test_unknown_behavior() {
        let json = r#"{ "databases": [{ "name": "db", "behaviors": [{ "name": "sluggable" }] }] }"#;
        let err = SchemaDocument::from_json(json)
            .unwrap()
            .into_schema(&BehaviorRegistry::with_builtins())
            .unwrap_err();
        assert!(matches!(err, StrataError::UnknownBehavior(_)));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            SchemaDocument::from_json("{ \"databases\": 3 }"),
            Err(StrataError::Document(_))
        ));
    }

    #[test]
    fn test_entity_names_survive() {
        let schema = SchemaDocument::from_json(BOOKSTORE)
            .unwrap()
            .into_schema(&BehaviorRegistry::with_builtins())
            .unwrap();
        let names: Vec<&str> = schema.databases()[0]
            .entities()
            .iter()
            .map(|e| e.name())
            .collect();
        assert_eq!(names, ["author", "book"]);
    }
}
