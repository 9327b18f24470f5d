//! Indices and unique constraints.

use super::naming::{MAX_IDENTIFIER_LENGTH, hashed_name};
use super::traits::VendorCarrier;
use super::vendor::VendorInfo;

/// One member of an index with an optional prefix length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexField {
    pub name: String,
    pub size: Option<u32>,
}

impl IndexField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: None,
        }
    }

    pub fn sized(name: impl Into<String>, size: u32) -> Self {
        Self {
            name: name.into(),
            size: Some(size),
        }
    }
}

/// An ordered set of fields. A unique index is the constrained variant
/// built with [`Index::unique`].
///
/// Without an explicit name the index is auto-named from a hash of its
/// members, so the name follows membership changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    name: Option<String>,
    unique: bool,
    fields: Vec<IndexField>,
    table: Option<String>,
    name_limit: usize,
    vendor: Vec<VendorInfo>,
}

impl Index {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            unique: false,
            fields: fields.into_iter().map(|f| IndexField::new(f)).collect(),
            table: None,
            name_limit: MAX_IDENTIFIER_LENGTH,
            vendor: Vec::new(),
        }
    }

    pub fn unique<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            unique: true,
            ..Self::new(fields)
        }
    }

    /// Builder-style explicit name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// The explicit name, or the generated `[table_]i_xxxxxx` / `u_xxxxxx`.
    pub fn name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let parts: Vec<String> = self
            .fields
            .iter()
            .flat_map(|f| {
                [
                    f.name.clone(),
                    f.size.map(|s| s.to_string()).unwrap_or_default(),
                ]
            })
            .collect();
        let prefix = if self.unique { "u_" } else { "i_" };
        hashed_name(self.table.as_deref(), prefix, &parts, self.name_limit)
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// True while the name is derived rather than user-supplied.
    pub fn is_auto_naming(&self) -> bool {
        self.name.is_none()
    }

    /// Table name of the owning entity.
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub(crate) fn set_table(&mut self, table: Option<String>) {
        self.table = table;
    }

    /// Length cap for the generated name.
    pub(crate) fn set_name_limit(&mut self, limit: usize) {
        self.name_limit = limit;
    }

    pub fn fields(&self) -> &[IndexField] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn add_field(&mut self, field: IndexField) {
        self.fields.push(field);
    }

    pub fn set_fields(&mut self, fields: Vec<IndexField>) {
        self.fields = fields;
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn field_size(&self, name: &str) -> Option<u32> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| f.size)
    }

    pub fn reset_fields_size(&mut self) {
        for field in &mut self.fields {
            field.size = None;
        }
    }

    /// Whether the leading members of this index are exactly `names`.
    pub fn covers_prefix(&self, names: &[&str]) -> bool {
        names.len() <= self.fields.len()
            && self.fields.iter().zip(names).all(|(f, n)| f.name == *n)
    }
}

impl VendorCarrier for Index {
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

    #[test]
    fn test_auto_name_is_deterministic() {
        let mut a = Index::new(["title", "isbn"]);
        let mut b = Index::new(["title", "isbn"]);
        a.set_table(Some("book".into()));
        b.set_table(Some("book".into()));
        assert_eq!(a.name(), b.name());
        assert!(a.name().starts_with("book_i_"));
        assert!(a.is_auto_naming());
    }

    #[test]
    fn test_auto_name_follows_membership() {
        let mut index = Index::new(["title"]);
        let before = index.name();
        index.add_field(IndexField::new("isbn"));
        let after = index.name();
        assert_ne!(before, after);
        assert_eq!(after, index.name());
    }

    #[test]
    fn test_explicit_name_is_kept() {
        let mut index = Index::new(["title"]).named("book_title");
        index.add_field(IndexField::new("isbn"));
        assert_eq!(index.name(), "book_title");
        assert!(!index.is_auto_naming());
    }

    #[test]
    fn test_size_changes_name() {
        let plain = Index::new(["title"]);
        let mut sized = Index::new(["title"]);
        sized.set_fields(vec![IndexField::sized("title", 10)]);
        assert_ne!(plain.name(), sized.name());
    }

    #[test]
    fn test_name_limit_keeps_hash() {
        let mut index = Index::new(["title"]);
        index.set_table(Some("t".repeat(80)));
        index.set_name_limit(63);
        let name = index.name();
        assert_eq!(name.len(), 63);
        assert!(name.contains("_i_"));
    }

    #[test]
    fn test_unique_prefix() {
        assert!(Index::unique(["isbn"]).name().starts_with("u_"));
    }
}
