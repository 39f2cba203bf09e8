//! Field property types.
//!
//! Every field in the registry carries exactly one `PropertyType`. The
//! store dispatches on it to decide how a slot is typed, keyed and owned.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a field stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    Bool,
    Int32,
    Int64,
    Guid,
    Time,
    Unicode,
    String,
    MultiUnicode,
    MultiString,
    Binary,
    GenericComInterface,
    OwningAtom,
    OwningCollection,
    OwningSequence,
    ReferenceAtom,
    ReferenceCollection,
    ReferenceSequence,
}

impl PropertyType {
    /// All property types, in ordinal order.
    pub const ALL: [PropertyType; 17] = [
        PropertyType::Bool,
        PropertyType::Int32,
        PropertyType::Int64,
        PropertyType::Time,
        PropertyType::Guid,
        PropertyType::GenericComInterface,
        PropertyType::Binary,
        PropertyType::String,
        PropertyType::MultiString,
        PropertyType::Unicode,
        PropertyType::MultiUnicode,
        PropertyType::OwningAtom,
        PropertyType::ReferenceAtom,
        PropertyType::OwningCollection,
        PropertyType::ReferenceCollection,
        PropertyType::OwningSequence,
        PropertyType::ReferenceSequence,
    ];

    /// Stable integer code of this type.
    pub fn ordinal(&self) -> i32 {
        match self {
            PropertyType::Bool => 1,
            PropertyType::Int32 => 2,
            PropertyType::Int64 => 3,
            PropertyType::Time => 5,
            PropertyType::Guid => 6,
            PropertyType::GenericComInterface => 7,
            PropertyType::Binary => 9,
            PropertyType::String => 13,
            PropertyType::MultiString => 14,
            PropertyType::Unicode => 15,
            PropertyType::MultiUnicode => 16,
            PropertyType::OwningAtom => 23,
            PropertyType::ReferenceAtom => 24,
            PropertyType::OwningCollection => 25,
            PropertyType::ReferenceCollection => 26,
            PropertyType::OwningSequence => 27,
            PropertyType::ReferenceSequence => 28,
        }
    }

    /// Decode an ordinal. Returns `None` for codes outside the valid set.
    pub fn from_ordinal(ordinal: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.ordinal() == ordinal)
    }

    /// Returns true for fields whose values are object handles.
    pub fn is_object(self) -> bool {
        self.is_owning() || self.is_reference()
    }

    /// Returns true for owning atom, collection and sequence fields.
    pub fn is_owning(self) -> bool {
        matches!(
            self,
            PropertyType::OwningAtom | PropertyType::OwningCollection | PropertyType::OwningSequence
        )
    }

    /// Returns true for reference atom, collection and sequence fields.
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            PropertyType::ReferenceAtom
                | PropertyType::ReferenceCollection
                | PropertyType::ReferenceSequence
        )
    }

    /// Returns true for single-object fields.
    pub fn is_atomic(self) -> bool {
        matches!(self, PropertyType::OwningAtom | PropertyType::ReferenceAtom)
    }

    /// Returns true for multi-object fields (collections and sequences).
    pub fn is_vector(self) -> bool {
        self.is_object() && !self.is_atomic()
    }

    /// Returns true for ordered multi-object fields.
    pub fn is_sequence(self) -> bool {
        matches!(
            self,
            PropertyType::OwningSequence | PropertyType::ReferenceSequence
        )
    }

    /// Returns true for types keyed by an extra writing system.
    pub fn is_multi(self) -> bool {
        matches!(self, PropertyType::MultiUnicode | PropertyType::MultiString)
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
