//! Handle types for Cellar objects and metadata.
//!
//! All handles are 32-bit values that are:
//! - Unique within their namespace
//! - Immutable once assigned
//! - Never reused within the lifetime of a cache

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of one domain object instance. Zero means "no object".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Hvo(pub u32);

impl Hvo {
    /// The reserved "no object" handle.
    pub const NULL: Hvo = Hvo(0);

    /// Create a new Hvo from a raw value.
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Returns true if this is the null handle.
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Hvo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hvo{}", self.0)
    }
}

/// Identifier for a class in the metadata registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Clid(pub u32);

impl Clid {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Clid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clid{}", self.0)
    }
}

/// Identifier for a field in the metadata registry.
///
/// Conventionally `clid * 1000 + local_index`, but any injective scheme works.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Flid(pub u32);

impl Flid {
    /// Built-in object guid.
    pub const GUID: Flid = Flid(101);
    /// Built-in class id of an object (read-only).
    pub const CLASS: Flid = Flid(102);
    /// Built-in owner back-pointer (read-only).
    pub const OWNER: Flid = Flid(103);
    /// Built-in owning field back-pointer (read-only).
    pub const OWN_FLID: Flid = Flid(104);
    /// Built-in rank within an owning sequence (read-only).
    pub const OWN_ORD: Flid = Flid(105);

    /// Every flid the store handles itself.
    pub const RESERVED: [Flid; 5] = [
        Flid::GUID,
        Flid::CLASS,
        Flid::OWNER,
        Flid::OWN_FLID,
        Flid::OWN_ORD,
    ];

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Fields per class in the conventional numbering.
    pub const PER_CLASS: u32 = 1000;

    /// Build the conventional flid for the `local_index`th field of a class.
    ///
    /// `None` when the index does not fit the class's block or the id
    /// would not fit in 32 bits.
    pub fn conventional(clid: Clid, local_index: u32) -> Option<Self> {
        if local_index >= Self::PER_CLASS {
            return None;
        }
        clid.0
            .checked_mul(Self::PER_CLASS)?
            .checked_add(local_index)
            .map(Self)
    }

    /// Returns true for the built-in object fields.
    pub fn is_reserved(&self) -> bool {
        Self::RESERVED.contains(self)
    }
}

impl fmt::Display for Flid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "flid{}", self.0)
    }
}

/// Writing-system key selecting one alternative of a multilingual property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ws(pub u32);

impl Ws {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Ws {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ws{}", self.0)
    }
}
