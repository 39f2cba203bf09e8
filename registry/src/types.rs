//! Metadata definition types.

use cellar_core::{Clid, Flid, PropertyType};

/// Class definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef {
    /// Unique identifier.
    pub clid: Clid,
    /// Class name, unique within the registry.
    pub name: String,
    /// Whether this class can be instantiated.
    pub is_abstract: bool,
    /// Base class; equals `clid` for the root class.
    pub base_clid: Clid,
}

impl ClassDef {
    pub fn new(clid: Clid, name: impl Into<String>, is_abstract: bool, base_clid: Clid) -> Self {
        Self {
            clid,
            name: name.into(),
            is_abstract,
            base_clid,
        }
    }

    /// Returns true if this is the root of the class hierarchy.
    pub fn is_root(&self) -> bool {
        self.base_clid == self.clid
    }
}

/// Field definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Unique identifier across the whole registry.
    pub flid: Flid,
    /// Field name, unique across the class's inherited and derived fields.
    pub name: String,
    /// Declaring class.
    pub owner_clid: Clid,
    /// What the field stores.
    pub property_type: PropertyType,
    /// Class of the referenced or owned objects (object fields only).
    pub dest_clid: Option<Clid>,
    /// Whether the field was added at runtime rather than by a schema.
    pub is_virtual: bool,
}

impl FieldDef {
    pub fn new(
        flid: Flid,
        name: impl Into<String>,
        owner_clid: Clid,
        property_type: PropertyType,
    ) -> Self {
        Self {
            flid,
            name: name.into(),
            owner_clid,
            property_type,
            dest_clid: None,
            is_virtual: false,
        }
    }

    pub fn with_dest(mut self, dest_clid: Clid) -> Self {
        self.dest_clid = Some(dest_clid);
        self
    }

    pub fn virtual_field(mut self) -> Self {
        self.is_virtual = true;
        self
    }
}

/// Selects which fields `get_fields` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldFilter {
    /// Every field.
    #[default]
    All,
    /// Owning atoms, collections and sequences.
    Owning,
    /// Reference atoms, collections and sequences.
    Reference,
    /// Every object-valued field.
    AllObject,
    /// Owning and reference atoms.
    AllAtomic,
    /// Owning and reference collections and sequences.
    AllVector,
    /// Every non-object field.
    Basic,
    /// Runtime-added fields only.
    Virtual,
    /// Fields of exactly one type.
    Only(PropertyType),
}

impl FieldFilter {
    /// Check whether a field passes this filter.
    pub fn matches(&self, field: &FieldDef) -> bool {
        let ty = field.property_type;
        match self {
            FieldFilter::All => true,
            FieldFilter::Owning => ty.is_owning(),
            FieldFilter::Reference => ty.is_reference(),
            FieldFilter::AllObject => ty.is_object(),
            FieldFilter::AllAtomic => ty.is_atomic(),
            FieldFilter::AllVector => ty.is_vector(),
            FieldFilter::Basic => !ty.is_object(),
            FieldFilter::Virtual => field.is_virtual,
            FieldFilter::Only(only) => ty == *only,
        }
    }
}
