//! Store configuration.

use serde::Deserialize;

/// Behaviour switches for a `RealDataCache`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Reject fields that are not declared on the object's class or a base.
    pub check_field_class: bool,
    /// Give every new object a fresh random guid.
    pub assign_guids: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            check_field_class: true,
            assign_guids: true,
        }
    }
}
