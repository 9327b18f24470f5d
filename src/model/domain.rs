//! Reusable column type definitions.

use super::default_value::FieldDefaultValue;
use super::traits::{Describable, Named};
use super::types::FieldType;

/// Abstract type + dialect SQL type + size/scale + default.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    name: String,
    field_type: FieldType,
    sql_type: Option<String>,
    size: Option<u32>,
    scale: Option<u32>,
    default_value: Option<FieldDefaultValue>,
    description: Option<String>,
    replaced: bool,
}

impl Domain {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            name: field_type.as_str().to_string(),
            field_type,
            sql_type: None,
            size: None,
            scale: None,
            default_value: None,
            description: None,
            replaced: false,
        }
    }

    /// A domain with an explicit dialect SQL type (platform type maps use this).
    pub fn with_sql_type(field_type: FieldType, sql_type: impl Into<String>) -> Self {
        Self {
            sql_type: Some(sql_type.into()),
            ..Self::new(field_type)
        }
    }

    /// A named custom domain (type alias declared on a database).
    pub fn named(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            ..Self::new(field_type)
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn set_field_type(&mut self, field_type: FieldType) {
        self.field_type = field_type;
    }

    /// Dialect SQL type; falls back to the abstract type name.
    pub fn sql_type(&self) -> &str {
        self.sql_type
            .as_deref()
            .unwrap_or_else(|| self.field_type.as_str())
    }

    pub fn has_sql_type(&self) -> bool {
        self.sql_type.is_some()
    }

    pub fn set_sql_type(&mut self, sql_type: impl Into<String>) {
        self.sql_type = Some(sql_type.into());
    }

    /// Explicitly override the SQL type. Renderers will not append the size
    /// definition to a replaced type.
    pub fn replace_sql_type(&mut self, sql_type: impl Into<String>) {
        self.sql_type = Some(sql_type.into());
        self.replaced = true;
    }

    pub fn is_replaced(&self) -> bool {
        self.replaced
    }

    pub fn size(&self) -> Option<u32> {
        self.size
    }

    pub fn set_size(&mut self, size: Option<u32>) {
        self.size = size;
    }

    pub fn scale(&self) -> Option<u32> {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Option<u32>) {
        self.scale = scale;
    }

    pub fn default_value(&self) -> Option<&FieldDefaultValue> {
        self.default_value.as_ref()
    }

    pub fn set_default_value(&mut self, value: Option<FieldDefaultValue>) {
        self.default_value = value;
    }

    /// `(size,scale)`, `(size)` or nothing.
    pub fn size_definition(&self) -> String {
        match (self.size, self.scale) {
            (Some(size), Some(scale)) => format!("({},{})", size, scale),
            (Some(size), None) => format!("({})", size),
            _ => String::new(),
        }
    }

    /// Copy `other` into this domain. Size and scale are only taken when the
    /// source has them, so existing values survive a partial source.
    pub fn copy(&mut self, other: &Domain) {
        self.name = other.name.clone();
        self.field_type = other.field_type;
        self.sql_type = other.sql_type.clone();
        self.default_value = other.default_value.clone();
        self.description = other.description.clone();
        self.replaced = other.replaced;
        if other.size.is_some() {
            self.size = other.size;
        }
        if other.scale.is_some() {
            self.scale = other.scale;
        }
    }
}

impl Named for Domain {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Describable for Domain {
    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_type_defaults_to_abstract_type() {
        let domain = Domain::new(FieldType::Varchar);
        assert_eq!(domain.sql_type(), "VARCHAR");
        assert!(!domain.has_sql_type());
    }

    #[test]
    fn test_copy_preserves_size_and_scale() {
        let source = Domain::with_sql_type(FieldType::Decimal, "NUMERIC");
        let mut target = Domain::new(FieldType::Integer).with_size(10).with_scale(2);

        target.copy(&source);

        assert_eq!(target.field_type(), FieldType::Decimal);
        assert_eq!(target.sql_type(), "NUMERIC");
        assert_eq!(target.size(), Some(10));
        assert_eq!(target.scale(), Some(2));
    }

    #[test]
    fn test_copy_takes_size_when_set() {
        let source = Domain::new(FieldType::Varchar).with_size(100);
        let mut target = Domain::new(FieldType::Varchar).with_size(255);
        target.copy(&source);
        assert_eq!(target.size(), Some(100));
    }

    #[test]
    fn test_size_definition() {
        assert_eq!(Domain::new(FieldType::Decimal).with_size(10).with_scale(2).size_definition(), "(10,2)");
        assert_eq!(Domain::new(FieldType::Varchar).with_size(50).size_definition(), "(50)");
        assert_eq!(Domain::new(FieldType::Integer).size_definition(), "");
    }
}
