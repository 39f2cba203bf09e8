//! Store error types.

use cellar_core::{Clid, ErrorKind, Flid, Hvo, PropertyType};
use cellar_registry::MetaDataError;
use thiserror::Error;
use uuid::Uuid;

/// Errors from property access and object lifecycle operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Registry lookup failed.
    #[error("metadata error: {0}")]
    MetaData(#[from] MetaDataError),

    #[error("Unknown object: {0}")]
    UnknownObject(Hvo),

    #[error("Property {flid} of {hvo} is not set")]
    PropertyNotSet { hvo: Hvo, flid: Flid },

    #[error("Field {flid} holds {dest} objects, not {clid}")]
    WrongDestinationClass { flid: Flid, clid: Clid, dest: Clid },

    #[error("Field {flid} holds {field_type}, not {requested}")]
    TypeMismatch {
        flid: Flid,
        field_type: PropertyType,
        requested: &'static str,
    },

    #[error("Buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("Field {flid} is not defined on {clid} or its bases")]
    FieldNotInClass { flid: Flid, clid: Clid },

    #[error("Field {0} is multilingual and needs a writing system")]
    WsRequired(Flid),

    #[error("Index {index} out of range for vector of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Object {0} would be owned twice")]
    DuplicateOwnership(Hvo),

    #[error("Making {owner} own {child} would create an ownership cycle")]
    OwnershipCycle { owner: Hvo, child: Hvo },

    #[error("Field {0} is not an owning field")]
    NotAnOwningField(Flid),

    #[error("Class {0} is abstract")]
    AbstractClass(Clid),

    #[error("Guid {0} is already assigned")]
    DuplicateGuid(Uuid),

    #[error("Field {0} is maintained by the store and cannot be written")]
    ReadOnlyField(Flid),

    #[error("Value {value} of field {flid} does not fit in Int32")]
    ValueOutOfRange { flid: Flid, value: u32 },
}

impl StoreError {
    pub fn type_mismatch(flid: Flid, field_type: PropertyType, requested: &'static str) -> Self {
        Self::TypeMismatch {
            flid,
            field_type,
            requested,
        }
    }

    pub fn not_set(hvo: Hvo, flid: Flid) -> Self {
        Self::PropertyNotSet { hvo, flid }
    }

    /// Collapse to the shared error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MetaData(e) => e.kind(),
            Self::UnknownObject(_) => ErrorKind::UnknownObject,
            Self::PropertyNotSet { .. } => ErrorKind::PropertyNotSet,
            Self::TypeMismatch { .. }
            | Self::WrongDestinationClass { .. }
            | Self::WsRequired(_) => ErrorKind::TypeMismatch,
            Self::BufferTooSmall { .. } => ErrorKind::BufferTooSmall,
            Self::FieldNotInClass { .. } => ErrorKind::UnknownField,
            Self::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            Self::DuplicateOwnership(_)
            | Self::OwnershipCycle { .. }
            | Self::NotAnOwningField(_) => ErrorKind::InvalidOwnership,
            Self::AbstractClass(_) => ErrorKind::AbstractClass,
            Self::DuplicateGuid(_) => ErrorKind::DuplicateGuid,
            Self::ReadOnlyField(_) => ErrorKind::ReadOnlyField,
            Self::ValueOutOfRange { .. } => ErrorKind::InvalidArgument,
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
