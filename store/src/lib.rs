//! Cellar Store
//!
//! Typed property cache over the metadata registry.
//!
//! Responsibilities:
//! - Hold every object record, keyed by handle
//! - Typed getters and setters checked against field metadata
//! - Maintain the ownership tree and sequence ordinals
//! - Map guids to handles
//! - Record reversible changes for the transaction layer

mod access;
mod cache;
mod change;
mod error;
mod guid_index;
mod options;
mod ownership;
mod record;

pub use cache::{InsertPosition, RealDataCache};
pub use change::{Change, ChangeLog};
pub use error::{StoreError, StoreResult};
pub use guid_index::GuidIndex;
pub use options::StoreOptions;
pub use ownership::OwnershipViolation;
pub use record::{ObjectRecord, OwnerLink, PropKey};
