//! Dialect-specific tuning parameters.

use std::collections::BTreeMap;

/// A flat parameter bag namespaced by platform name (`"mysql"`, `"pgsql"`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorInfo {
    vendor_type: String,
    parameters: BTreeMap<String, String>,
}

impl VendorInfo {
    pub fn new(vendor_type: impl Into<String>) -> Self {
        Self {
            vendor_type: vendor_type.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Builder-style parameter setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_parameter(name, value);
        self
    }

    pub fn vendor_type(&self) -> &str {
        &self.vendor_type
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(name.into(), value.into());
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// Union of both bags; `other` wins on conflicting keys.
    pub fn merge(&self, other: &VendorInfo) -> VendorInfo {
        let mut parameters = self.parameters.clone();
        parameters.extend(
            other
                .parameters
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        VendorInfo {
            vendor_type: self.vendor_type.clone(),
            parameters,
        }
    }
}
