use pretty_assertions::assert_eq;
use strata::prelude::*;

#[test]
fn test_field_positions_stay_dense() {
    let mut entity = Entity::new("book");
    for name in ["id", "title", "isbn", "price"] {
        entity.add_field(Field::new(name, FieldType::Varchar)).unwrap();
    }
    let positions: Vec<usize> = entity.fields().iter().map(Field::position).collect();
    assert_eq!(positions, vec![1, 2, 3, 4]);

    let removed = entity.remove_field("title").unwrap();
    assert_eq!(removed.entity(), None);
    entity.add_field(Field::new("subtitle", FieldType::Varchar)).unwrap();
    let layout: Vec<(&str, usize)> = entity
        .fields()
        .iter()
        .map(|f| (f.name(), f.position()))
        .collect();
    assert_eq!(
        layout,
        vec![("id", 1), ("isbn", 2), ("price", 3), ("subtitle", 4)]
    );
}

#[test]
fn test_back_references() {
    let mut db = Database::new("bookstore");
    let book = db.add_entity(Entity::new("book")).unwrap();
    book.add_field(Field::new("id", FieldType::Integer)).unwrap();
    db.add_entity(Entity::new("author")).unwrap();

    for entity in db.entities() {
        assert_eq!(entity.database(), Some("bookstore"));
        for field in entity.fields() {
            assert_eq!(field.entity(), Some(entity.name()));
        }
    }

    let mut book = db.remove_entity("book").unwrap();
    assert_eq!(book.database(), None);
    assert!(!db.has_entity("book"));

    book.set_name("novel");
    let mut other = Database::new("archive");
    let novel = other.add_entity(book).unwrap();
    assert_eq!(novel.database(), Some("archive"));
    assert_eq!(novel.field("id").unwrap().entity(), Some("novel"));
}

#[test]
fn test_behavior_propagation_is_idempotent() {
    let registry = BehaviorRegistry::with_builtins();
    let mut db = Database::new("shop");
    db.add_entity(Entity::new("product")).unwrap();
    db.add_behavior(registry.create("timestampable").unwrap())
        .unwrap();

    let behavior = db.behaviors()[0].clone();
    behavior.modify_database(&mut db).unwrap();
    behavior.modify_database(&mut db).unwrap();

    let product = db.entity("product").unwrap();
    let count = product
        .behaviors()
        .iter()
        .filter(|b| b.id() == "timestampable")
        .count();
    assert_eq!(count, 1);
}

#[test]
fn test_domain_copy_keeps_unset_size() {
    let mut target = Domain::new(FieldType::Varchar).with_size(40).with_scale(2);
    let source = Domain::with_sql_type(FieldType::Decimal, "NUMERIC");
    target.copy(&source);
    assert_eq!(target.field_type(), source.field_type());
    assert_eq!(target.sql_type(), source.sql_type());
    assert_eq!(target.size(), Some(40));
    assert_eq!(target.scale(), Some(2));

    target.copy(&Domain::new(FieldType::Char).with_size(3));
    assert_eq!(target.size(), Some(3));
    assert_eq!(target.scale(), Some(2));
}

#[test]
fn test_index_auto_naming() {
    let mut entity = Entity::new("book");
    for name in ["title", "isbn"] {
        entity.add_field(Field::new(name, FieldType::Varchar)).unwrap();
    }
    let first = Index::new(["title", "isbn"]);
    let second = Index::new(["title", "isbn"]);
    assert_eq!(first.name(), second.name());

    entity.add_index(first).unwrap();
    let added = entity.indices()[0].name();
    assert!(added.starts_with("book_i_"));
    assert_eq!(added, entity.indices()[0].name());

    let reordered = Index::new(["isbn", "title"]);
    assert!(!entity.has_index(&reordered.name()));

    let index = entity.indices_mut().next().unwrap();
    index.add_field(IndexField::new("isbn"));
    let grown = index.name();
    assert_ne!(grown, added);
    assert_eq!(grown, entity.indices()[0].name());
}

#[test]
fn test_default_value_equivalence() {
    assert_eq!(
        FieldDefaultValue::new("CURRENT_TIMESTAMP"),
        FieldDefaultValue::new("now()")
    );
    assert_ne!(
        FieldDefaultValue::new("CURRENT_TIMESTAMP"),
        FieldDefaultValue::expression("now()")
    );
    assert_ne!(FieldDefaultValue::new("0"), FieldDefaultValue::new("1"));
}

#[test]
fn test_duplicate_and_empty_index_are_rejected() {
    let mut entity = Entity::new("book");
    entity.add_field(Field::new("title", FieldType::Varchar)).unwrap();
    assert!(matches!(
        entity.add_field(Field::new("title", FieldType::Varchar)),
        Err(StrataError::DuplicateField { .. })
    ));
    assert!(matches!(
        entity.add_index(Index::new(Vec::<String>::new())),
        Err(StrataError::EmptyIndex { .. })
    ));
    assert!(matches!(
        entity.add_index(Index::new(["missing"])),
        Err(StrataError::UnknownField { .. })
    ));
    entity.add_index(Index::new(["title"]).named("idx_title")).unwrap();
    let err = entity
        .add_index(Index::new(["title"]).named("idx_title"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SchemaIntegrity);
}

#[test]
fn test_lookup_misses_are_options() {
    let db = Database::new("bookstore");
    assert!(db.entity("nothing").is_none());
    assert!(db.domain("nothing").is_none());
    assert!(Entity::new("book").field("nothing").is_none());
}
