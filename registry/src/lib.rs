//! Cellar Registry
//!
//! Runtime metadata lookup. Single source of truth for classes and fields.
//!
//! Responsibilities:
//! - Register classes (with single inheritance from one root) and fields
//! - Enforce unique class names, field names across the inheritance chain,
//!   and registry-wide unique flids
//! - Answer introspection queries (names, types, bases, field sets)
//! - Merge declarative schema sources, once per source
//! - Accept virtual fields at runtime

mod error;
mod registry;
mod schema;
mod types;

pub use error::{MetaDataError, MetaDataResult};
pub use registry::MetaDataCache;
pub use schema::{ClassSpec, FieldSpec, SchemaSource};
pub use types::*;
