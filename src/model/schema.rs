//! Schemas: the root of the model graph.

use super::database::Database;
use super::traits::Named;
use crate::error::{StrataError, StrataResult};
use crate::platform::{Platform, finalize::finalize_database};

/// One or more databases plus included external schemas.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    name: Option<String>,
    databases: Vec<Database>,
    external_schemas: Vec<Schema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn add_database(&mut self, mut database: Database) -> StrataResult<&mut Database> {
        if self.database(database.name()).is_some() {
            return Err(StrataError::DuplicateDatabase(database.name().to_string()));
        }
        database.set_parent_schema(self.name.clone());
        self.databases.push(database);
        let last = self.databases.len() - 1;
        Ok(&mut self.databases[last])
    }

    pub fn database(&self, name: &str) -> Option<&Database> {
        self.databases.iter().find(|d| d.name() == name)
    }

    pub fn database_mut(&mut self, name: &str) -> Option<&mut Database> {
        self.databases.iter_mut().find(|d| d.name() == name)
    }

    pub fn databases(&self) -> &[Database] {
        &self.databases
    }

    pub fn databases_mut(&mut self) -> impl Iterator<Item = &mut Database> {
        self.databases.iter_mut()
    }

    pub fn has_multiple_databases(&self) -> bool {
        self.databases.len() > 1
    }

    pub fn add_external_schema(&mut self, schema: Schema) {
        self.external_schemas.push(schema);
    }

    pub fn external_schemas(&self) -> &[Schema] {
        &self.external_schemas
    }

    /// Move the databases of every external schema into this one.
    ///
    /// A database whose name already exists here has its entities and
    /// missing behaviors merged into ours; any other database is moved as a
    /// whole. External schemas keep existing with an empty database list.
    pub fn join_schemas(&mut self) -> StrataResult<()> {
        let mut externals = std::mem::take(&mut self.external_schemas);
        for external in &mut externals {
            external.join_schemas()?;
            for mut incoming in std::mem::take(&mut external.databases) {
                match self.database_mut(incoming.name()) {
                    Some(target) => merge_database(target, &mut incoming)?,
                    None => {
                        tracing::debug!("Joining external database '{}'", incoming.name());
                        self.add_database(incoming)?;
                    }
                }
            }
        }
        self.external_schemas = externals;
        Ok(())
    }

    /// Join external schemas, then finalize every database.
    pub fn finalize(&mut self, platform: &dyn Platform) -> StrataResult<()> {
        self.join_schemas()?;
        for database in &mut self.databases {
            finalize_database(database, platform)?;
        }
        Ok(())
    }

    /// Like [`Schema::finalize`], with the dialect picked per database.
    pub fn finalize_each<F>(&mut self, mut platform_for: F) -> StrataResult<()>
    where
        F: FnMut(&Database) -> StrataResult<Box<dyn Platform>>,
    {
        self.join_schemas()?;
        for database in &mut self.databases {
            let platform = platform_for(database)?;
            finalize_database(database, platform.as_ref())?;
        }
        Ok(())
    }
}

fn merge_database(target: &mut Database, incoming: &mut Database) -> StrataResult<()> {
    let names: Vec<String> = incoming.entity_names().map(str::to_string).collect();
    for name in names {
        if target.has_entity(&name) {
            return Err(StrataError::DuplicateEntity {
                database: target.name().to_string(),
                entity: name,
            });
        }
        if let Some(entity) = incoming.remove_entity(&name) {
            tracing::debug!("Joining external entity '{}' into '{}'", name, target.name());
            target.add_entity(entity)?;
        }
    }
    for behavior in incoming.behaviors() {
        if !target.has_behavior(behavior.id()) {
            target.add_behavior(behavior.clone())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::Behavior;
    use crate::model::Entity;

    fn schema_with(db: &str, entities: &[&str]) -> Schema {
        let mut schema = Schema::new();
        let mut database = Database::new(db);
        for name in entities {
            database.add_entity(Entity::new(*name)).unwrap();
        }
        schema.add_database(database).unwrap();
        schema
    }

    #[test]
    fn test_join_merges_same_database() {
        let mut main = schema_with("bookstore", &["book"]);
        let mut external = schema_with("bookstore", &["author"]);
        external
            .database_mut("bookstore")
            .unwrap()
            .add_behavior(Behavior::plain("timestampable"))
            .unwrap();
        main.add_external_schema(external);

        main.join_schemas().unwrap();

        let db = main.database("bookstore").unwrap();
        assert!(db.has_entity("author"));
        assert_eq!(db.entity("author").unwrap().database(), Some("bookstore"));
        assert!(db.has_behavior("timestampable"));
        assert!(main.external_schemas()[0].databases().is_empty());
    }

    #[test]
    fn test_join_moves_other_database() {
        let mut main = schema_with("bookstore", &["book"]);
        main.add_external_schema(schema_with("crm", &["customer"]));
        main.join_schemas().unwrap();
        assert!(main.has_multiple_databases());
        assert!(main.database("crm").unwrap().has_entity("customer"));
    }

    #[test]
    fn test_join_rejects_duplicate_entity() {
        let mut main = schema_with("bookstore", &["book"]);
        main.add_external_schema(schema_with("bookstore", &["book"]));
        assert!(matches!(
            main.join_schemas(),
            Err(StrataError::DuplicateEntity { .. })
        ));
    }
}
