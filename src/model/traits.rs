//! Capability traits shared by model objects.
//!
//! Each concrete type implements the ones it needs; there is no common base.

use super::vendor::VendorInfo;

/// Something with a name.
pub trait Named {
    fn name(&self) -> &str;
}

/// Something with an optional free-text description.
pub trait Describable {
    fn description(&self) -> Option<&str>;

    fn set_description(&mut self, description: Option<String>);

    fn has_description(&self) -> bool {
        self.description().is_some_and(|d| !d.is_empty())
    }
}

/// Something that carries dialect-specific parameter bags.
pub trait VendorCarrier {
    fn vendor_infos(&self) -> &[VendorInfo];

    fn vendor_infos_mut(&mut self) -> &mut Vec<VendorInfo>;

    fn add_vendor_info(&mut self, info: VendorInfo) {
        self.vendor_infos_mut().push(info);
    }

    /// All bags for `vendor_type` merged in insertion order. Empty when none
    /// was attached.
    fn vendor_info_for(&self, vendor_type: &str) -> VendorInfo {
        self.vendor_infos()
            .iter()
            .filter(|v| v.vendor_type() == vendor_type)
            .fold(VendorInfo::new(vendor_type), |acc, v| acc.merge(v))
    }
}
