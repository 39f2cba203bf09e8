//! Metadata error types.

use cellar_core::{Clid, ErrorKind, Flid};
use thiserror::Error;

/// Errors that can occur while building or querying the registry.
#[derive(Debug, Error)]
pub enum MetaDataError {
    #[error("Unknown class: {name}")]
    UnknownClass { name: String },

    #[error("Unknown field: {field} on class {class}")]
    UnknownField { class: String, field: String },

    #[error("Unknown field id: {0}")]
    UnknownFlid(Flid),

    #[error("Duplicate class: {name}")]
    DuplicateClass { name: String },

    #[error("Duplicate field: {field} on class {class}")]
    DuplicateField { class: String, field: String },

    #[error("Duplicate field id: {0}")]
    DuplicateFlid(Flid),

    #[error("Invalid property type ordinal: {0}")]
    InvalidType(i32),

    #[error("Invalid identifier: {name:?}")]
    InvalidName { name: String },

    #[error("Class {0} is the root class and has no base class")]
    NoSuchBaseClass(Clid),

    #[error("Class {name} has no base but {root} is already the root class")]
    MultipleRoots { name: String, root: String },

    #[error("Schema source already loaded: {name}")]
    DuplicateSchemaSource { name: String },

    #[error("Schema source declares no classes: {name}")]
    EmptySchema { name: String },

    #[error("Object field {field} on class {class} needs a destination class")]
    MissingDestination { class: String, field: String },

    #[error("Basic field {field} on class {class} cannot have a destination class")]
    UnexpectedDestination { class: String, field: String },

    #[error("Class id {0} leaves no room for conventional field ids")]
    ClidOutOfRange(Clid),

    #[error("Class {0} has no free conventional field id")]
    NoFreeFlid(Clid),

    #[error("Malformed schema source: {message}")]
    MalformedSchema { message: String },
}

impl MetaDataError {
    pub fn unknown_class(name: impl Into<String>) -> Self {
        Self::UnknownClass { name: name.into() }
    }

    pub fn unknown_field(class: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            class: class.into(),
            field: field.into(),
        }
    }

    pub fn duplicate_class(name: impl Into<String>) -> Self {
        Self::DuplicateClass { name: name.into() }
    }

    pub fn duplicate_field(class: impl Into<String>, field: impl Into<String>) -> Self {
        Self::DuplicateField {
            class: class.into(),
            field: field.into(),
        }
    }

    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidName { name: name.into() }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedSchema {
            message: message.into(),
        }
    }

    /// Collapse to the shared error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownClass { .. } => ErrorKind::UnknownClass,
            Self::UnknownField { .. } | Self::UnknownFlid(_) => ErrorKind::UnknownField,
            Self::DuplicateClass { .. } => ErrorKind::DuplicateClass,
            Self::DuplicateField { .. } => ErrorKind::DuplicateField,
            Self::DuplicateFlid(_) => ErrorKind::DuplicateFlid,
            Self::InvalidType(_) => ErrorKind::InvalidType,
            Self::InvalidName { .. } => ErrorKind::InvalidName,
            Self::NoSuchBaseClass(_) => ErrorKind::NoSuchBaseClass,
            Self::DuplicateSchemaSource { .. } => ErrorKind::DuplicateSchemaSource,
            Self::EmptySchema { .. } => ErrorKind::EmptySchema,
            Self::MultipleRoots { .. }
            | Self::MissingDestination { .. }
            | Self::UnexpectedDestination { .. }
            | Self::MalformedSchema { .. } => ErrorKind::InvalidSchema,
            Self::ClidOutOfRange(_) | Self::NoFreeFlid(_) => ErrorKind::InvalidArgument,
        }
    }
}

impl From<serde_json::Error> for MetaDataError {
    fn from(err: serde_json::Error) -> Self {
        MetaDataError::malformed(err.to_string())
    }
}

/// Result type for registry operations.
pub type MetaDataResult<T> = Result<T, MetaDataError>;
