//! Object records.

use cellar_core::{Clid, Flid, Hvo, Value, Ws};
use indexmap::IndexMap;
use uuid::Uuid;

/// Key of one property slot: the field plus, for multilingual fields, the
/// writing system of the alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropKey {
    pub flid: Flid,
    pub ws: Option<Ws>,
}

impl PropKey {
    /// Key of a single-valued slot.
    pub fn basic(flid: Flid) -> Self {
        Self { flid, ws: None }
    }

    /// Key of one alternative of a multilingual slot.
    pub fn alt(flid: Flid, ws: Ws) -> Self {
        Self { flid, ws: Some(ws) }
    }
}

/// Where an object sits in the ownership tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OwnerLink {
    pub owner: Hvo,
    pub flid: Option<Flid>,
    /// Position within an owning sequence; `None` for atoms and collections.
    pub ord: Option<u32>,
}

impl OwnerLink {
    pub const UNOWNED: OwnerLink = OwnerLink {
        owner: Hvo::NULL,
        flid: None,
        ord: None,
    };

    pub fn new(owner: Hvo, flid: Flid, ord: Option<u32>) -> Self {
        Self {
            owner,
            flid: Some(flid),
            ord,
        }
    }

    pub fn is_owned(&self) -> bool {
        !self.owner.is_null()
    }
}

/// One domain object: its class, its owner back-pointers and its
/// property slots in write order.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    pub hvo: Hvo,
    pub clid: Clid,
    pub owner: Hvo,
    pub own_flid: Option<Flid>,
    pub own_ord: Option<u32>,
    props: IndexMap<PropKey, Value>,
}

impl ObjectRecord {
    pub fn new(hvo: Hvo, clid: Clid) -> Self {
        Self {
            hvo,
            clid,
            owner: Hvo::NULL,
            own_flid: None,
            own_ord: None,
            props: IndexMap::new(),
        }
    }

    pub fn owner_link(&self) -> OwnerLink {
        OwnerLink {
            owner: self.owner,
            flid: self.own_flid,
            ord: self.own_ord,
        }
    }

    pub fn set_owner_link(&mut self, link: OwnerLink) {
        self.owner = link.owner;
        self.own_flid = link.flid;
        self.own_ord = link.ord;
    }

    pub fn get(&self, key: &PropKey) -> Option<&Value> {
        self.props.get(key)
    }

    /// Store a value, returning the previous one.
    pub fn set(&mut self, key: PropKey, value: Value) -> Option<Value> {
        self.props.insert(key, value)
    }

    /// Clear a slot, keeping the order of the remaining ones.
    pub fn remove(&mut self, key: &PropKey) -> Option<Value> {
        self.props.shift_remove(key)
    }

    pub fn contains(&self, key: &PropKey) -> bool {
        self.props.contains_key(key)
    }

    /// All set slots in write order.
    pub fn props(&self) -> impl Iterator<Item = (&PropKey, &Value)> {
        self.props.iter()
    }

    /// The value of the built-in guid slot.
    pub fn guid(&self) -> Option<Uuid> {
        self.get(&PropKey::basic(Flid::GUID)).and_then(Value::as_guid)
    }
}
