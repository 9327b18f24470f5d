//! Columns.

use super::default_value::FieldDefaultValue;
use super::domain::Domain;
use super::naming::snake_case;
use super::relation::RelationRef;
use super::traits::{Describable, Named, VendorCarrier};
use super::types::FieldType;
use super::vendor::VendorInfo;

/// One discriminator value of an inheritance field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inheritance {
    pub key: String,
    pub class_name: String,
    pub ancestor: Option<String>,
}

impl Inheritance {
    pub fn new(key: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            class_name: class_name.into(),
            ancestor: None,
        }
    }
}

/// A table column.
///
/// `entity` and `position` are owned by the entity the field is added to.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    column_name: Option<String>,
    domain: Domain,
    position: usize,
    entity: Option<String>,
    description: Option<String>,
    primary_key: bool,
    auto_increment: bool,
    unique: bool,
    not_null: bool,
    implementation_detail: bool,
    inheritance: Vec<Inheritance>,
    value_set: Vec<String>,
    referrers: Vec<RelationRef>,
    vendor: Vec<VendorInfo>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::with_domain(name, Domain::new(field_type))
    }

    pub fn with_domain(name: impl Into<String>, domain: Domain) -> Self {
        Self {
            name: name.into(),
            column_name: None,
            domain,
            position: 0,
            entity: None,
            description: None,
            primary_key: false,
            auto_increment: false,
            unique: false,
            not_null: false,
            implementation_detail: false,
            inheritance: Vec::new(),
            value_set: Vec::new(),
            referrers: Vec::new(),
            vendor: Vec::new(),
        }
    }

    // ---- builder helpers ----

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.domain.set_size(Some(size));
        self
    }

    pub fn scale(mut self, scale: u32) -> Self {
        self.domain.set_scale(Some(scale));
        self
    }

    pub fn default_value(mut self, value: FieldDefaultValue) -> Self {
        self.domain.set_default_value(Some(value));
        self
    }

    pub fn column(mut self, column_name: impl Into<String>) -> Self {
        self.column_name = Some(column_name.into());
        self
    }

    pub fn values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value_set = values.into_iter().map(Into::into).collect();
        self
    }

    // ---- identity ----

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Column name; defaults to the snake_case field name.
    pub fn column_name(&self) -> String {
        self.column_name
            .clone()
            .unwrap_or_else(|| snake_case(&self.name))
    }

    pub fn set_column_name(&mut self, column_name: Option<String>) {
        self.column_name = column_name;
    }

    /// 1-based position within the owning entity; 0 when detached.
    pub fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    /// Name of the owning entity.
    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    pub(crate) fn set_entity(&mut self, entity: Option<String>) {
        self.entity = entity;
    }

    // ---- domain ----

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn domain_mut(&mut self) -> &mut Domain {
        &mut self.domain
    }

    pub fn set_domain(&mut self, domain: Domain) {
        self.domain = domain;
    }

    pub fn field_type(&self) -> FieldType {
        self.domain.field_type()
    }

    pub fn sql_type(&self) -> &str {
        self.domain.sql_type()
    }

    pub fn get_size(&self) -> Option<u32> {
        self.domain.size()
    }

    pub fn get_scale(&self) -> Option<u32> {
        self.domain.scale()
    }

    pub fn size_definition(&self) -> String {
        self.domain.size_definition()
    }

    pub fn get_default_value(&self) -> Option<&FieldDefaultValue> {
        self.domain.default_value()
    }

    pub fn set_default_value(&mut self, value: Option<FieldDefaultValue>) {
        self.domain.set_default_value(value);
    }

    pub fn is_text_type(&self) -> bool {
        self.field_type().is_text()
    }

    pub fn is_numeric_type(&self) -> bool {
        self.field_type().is_numeric()
    }

    pub fn is_lob_type(&self) -> bool {
        self.field_type().is_lob()
    }

    pub fn is_array_type(&self) -> bool {
        self.field_type().is_array()
    }

    pub fn is_enum_type(&self) -> bool {
        matches!(self.field_type(), FieldType::Enum | FieldType::Set)
    }

    pub fn value_set(&self) -> &[String] {
        &self.value_set
    }

    pub fn set_value_set(&mut self, values: Vec<String>) {
        self.value_set = values;
    }

    pub fn requires_transaction_in_postgres(&self) -> bool {
        self.field_type().needs_transaction_in_postgres()
    }

    // ---- flags ----

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn set_primary_key(&mut self, primary_key: bool) {
        self.primary_key = primary_key;
    }

    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }

    pub fn set_auto_increment(&mut self, auto_increment: bool) {
        self.auto_increment = auto_increment;
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn set_unique(&mut self, unique: bool) {
        self.unique = unique;
    }

    /// Primary keys are always NOT NULL.
    pub fn is_not_null(&self) -> bool {
        self.not_null || self.primary_key
    }

    pub fn set_not_null(&mut self, not_null: bool) {
        self.not_null = not_null;
    }

    /// The field only exists to carry a foreign key value.
    pub fn is_implementation_detail(&self) -> bool {
        self.implementation_detail
    }

    pub fn set_implementation_detail(&mut self, implementation_detail: bool) {
        self.implementation_detail = implementation_detail;
    }

    // ---- inheritance ----

    pub fn is_inheritance(&self) -> bool {
        !self.inheritance.is_empty()
    }

    pub fn inheritance(&self) -> &[Inheritance] {
        &self.inheritance
    }

    pub fn add_inheritance(&mut self, inheritance: Inheritance) {
        self.inheritance.push(inheritance);
    }

    // ---- referrers ----

    /// Relations of other entities pointing at this field.
    pub fn referrers(&self) -> &[RelationRef] {
        &self.referrers
    }

    pub fn has_referrer(&self, reference: &RelationRef) -> bool {
        self.referrers.contains(reference)
    }

    /// Register a referrer; registering the same relation twice is a no-op.
    pub fn add_referrer(&mut self, reference: RelationRef) {
        if !self.has_referrer(&reference) {
            self.referrers.push(reference);
        }
    }

    pub fn clear_referrers(&mut self) {
        self.referrers.clear();
    }
}

impl Named for Field {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Describable for Field {
    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }
}

impl VendorCarrier for Field {
    fn vendor_infos(&self) -> &[VendorInfo] {
        &self.vendor
    }

    fn vendor_infos_mut(&mut self) -> &mut Vec<VendorInfo> {
        &mut self.vendor
    }
}
