//! Flat error taxonomy shared by all Cellar crates.
//!
//! Each crate has its own error enum carrying context; `kind()` on any of
//! them collapses to one of these so callers can match across layers.

use std::fmt;

/// The kind of a Cellar error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownClass,
    UnknownField,
    UnknownObject,
    DuplicateClass,
    DuplicateField,
    DuplicateFlid,
    DuplicateSchemaSource,
    EmptySchema,
    InvalidType,
    InvalidName,
    InvalidSchema,
    NoSuchBaseClass,
    PropertyNotSet,
    TypeMismatch,
    BufferTooSmall,
    IndexOutOfRange,
    InvalidOwnership,
    AbstractClass,
    DuplicateGuid,
    ReadOnlyField,
    BlockedOperation,
    InvalidUndoState,
    InvalidArgument,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
