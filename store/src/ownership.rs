//! Ownership tree and sequence maintenance.
//!
//! Every owned object records `(owner, own_flid, own_ord)` and appears
//! exactly once in that field of its owner. Sequence children are numbered
//! densely from zero in vector order; atom and collection children carry
//! no ordinal.

use crate::cache::RealDataCache;
use crate::error::{StoreError, StoreResult};
use crate::record::{OwnerLink, PropKey};
use cellar_core::{Flid, Hvo, Value};
use std::collections::HashSet;
use std::fmt;

/// A broken ownership invariant, as reported by `check_ownership_invariants`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnershipViolation {
    /// The child names an owner that does not exist.
    DanglingOwner { child: Hvo, owner: Hvo },
    /// The child names an owner whose field does not hold it.
    MissingFromOwner { child: Hvo, owner: Hvo, flid: Option<Flid> },
    /// The child appears more than once in its owning vector.
    DuplicateChild { owner: Hvo, flid: Flid, child: Hvo },
    /// The child's ordinal disagrees with its position.
    WrongOrdinal {
        child: Hvo,
        expected: Option<u32>,
        actual: Option<u32>,
    },
    /// An owning field holds an object that does not point back.
    ChildNotBackLinked { owner: Hvo, flid: Flid, child: Hvo },
}

impl fmt::Display for OwnershipViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingOwner { child, owner } => {
                write!(f, "{child} names missing owner {owner}")
            }
            Self::MissingFromOwner { child, owner, flid } => {
                write!(f, "{child} is not in {owner} field {flid:?}")
            }
            Self::DuplicateChild { owner, flid, child } => {
                write!(f, "{child} appears twice in {owner} field {flid}")
            }
            Self::WrongOrdinal {
                child,
                expected,
                actual,
            } => write!(f, "{child} has ordinal {actual:?}, expected {expected:?}"),
            Self::ChildNotBackLinked { owner, flid, child } => {
                write!(f, "{owner} field {flid} holds {child} which does not point back")
            }
        }
    }
}

impl RealDataCache {
    // ==================== Queries ====================

    /// The object's owner, `Hvo::NULL` if unowned.
    pub fn get_owner(&self, hvo: Hvo) -> StoreResult<Hvo> {
        Ok(self.record(hvo)?.owner)
    }

    pub fn get_owning_flid(&self, hvo: Hvo) -> StoreResult<Option<Flid>> {
        Ok(self.record(hvo)?.own_flid)
    }

    /// Position within the owning sequence, `None` outside sequences.
    pub fn get_own_ord(&self, hvo: Hvo) -> StoreResult<Option<u32>> {
        Ok(self.record(hvo)?.own_ord)
    }

    /// Every object directly owned by `hvo`, over all owning fields.
    pub fn owned_objects(&self, hvo: Hvo) -> Vec<Hvo> {
        let Ok(record) = self.record(hvo) else {
            return Vec::new();
        };
        record
            .props()
            .filter(|(key, _)| self.is_owning_flid(key.flid))
            .flat_map(|(_, value)| match value {
                Value::Object(child) if !child.is_null() => vec![*child],
                Value::Vector(children) => children.clone(),
                _ => Vec::new(),
            })
            .collect()
    }

    /// Owners of `hvo` from the direct owner up to the top of the tree.
    pub fn owner_chain(&self, hvo: Hvo) -> Vec<Hvo> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([hvo]);
        let mut current = self.record(hvo).map(|r| r.owner).unwrap_or(Hvo::NULL);
        while !current.is_null() && seen.insert(current) {
            chain.push(current);
            current = self.record(current).map(|r| r.owner).unwrap_or(Hvo::NULL);
        }
        chain
    }

    /// Check every owner back-pointer against the owning fields.
    pub fn check_ownership_invariants(&self) -> Vec<OwnershipViolation> {
        let mut violations = Vec::new();

        for hvo in self.all_objects() {
            let Ok(record) = self.record(hvo) else { continue };

            let link = record.owner_link();
            if link.is_owned() {
                self.check_back_pointer(hvo, link, &mut violations);
            }

            for (key, value) in record.props() {
                if !self.is_owning_flid(key.flid) {
                    continue;
                }
                let children = match value {
                    Value::Object(child) if !child.is_null() => vec![*child],
                    Value::Vector(children) => children.clone(),
                    _ => continue,
                };
                for child in children {
                    let points_back = self
                        .record(child)
                        .map(|c| c.owner == hvo && c.own_flid == Some(key.flid))
                        .unwrap_or(false);
                    if !points_back {
                        violations.push(OwnershipViolation::ChildNotBackLinked {
                            owner: hvo,
                            flid: key.flid,
                            child,
                        });
                    }
                }
            }
        }

        violations
    }

    fn check_back_pointer(&self, child: Hvo, link: OwnerLink, out: &mut Vec<OwnershipViolation>) {
        let Ok(owner) = self.record(link.owner) else {
            out.push(OwnershipViolation::DanglingOwner {
                child,
                owner: link.owner,
            });
            return;
        };
        let missing = OwnershipViolation::MissingFromOwner {
            child,
            owner: link.owner,
            flid: link.flid,
        };
        let Some(flid) = link.flid else {
            out.push(missing);
            return;
        };

        match owner.get(&PropKey::basic(flid)) {
            Some(Value::Object(held)) if *held == child => {
                if link.ord.is_some() {
                    out.push(OwnershipViolation::WrongOrdinal {
                        child,
                        expected: None,
                        actual: link.ord,
                    });
                }
            }
            Some(Value::Vector(items)) => {
                let positions: Vec<usize> = items
                    .iter()
                    .enumerate()
                    .filter(|(_, h)| **h == child)
                    .map(|(i, _)| i)
                    .collect();
                match positions.as_slice() {
                    [] => out.push(missing),
                    [index] => {
                        let expected = self.is_sequence_flid(flid).then_some(*index as u32);
                        if link.ord != expected {
                            out.push(OwnershipViolation::WrongOrdinal {
                                child,
                                expected,
                                actual: link.ord,
                            });
                        }
                    }
                    _ => out.push(OwnershipViolation::DuplicateChild {
                        owner: link.owner,
                        flid,
                        child,
                    }),
                }
            }
            _ => out.push(missing),
        }
    }

    fn is_owning_flid(&self, flid: Flid) -> bool {
        !flid.is_reserved()
            && self
                .mdc()
                .field(flid)
                .is_some_and(|f| f.property_type.is_owning())
    }

    fn is_sequence_flid(&self, flid: Flid) -> bool {
        self.mdc()
            .field(flid)
            .is_some_and(|f| f.property_type.is_sequence())
    }

    // ==================== Raw Slot Reads ====================

    /// Vector contents, empty when never written.
    pub(crate) fn vector(&self, hvo: Hvo, flid: Flid) -> Vec<Hvo> {
        self.record(hvo)
            .ok()
            .and_then(|r| r.get(&PropKey::basic(flid)))
            .and_then(Value::as_vector)
            .map(<[Hvo]>::to_vec)
            .unwrap_or_default()
    }

    /// Atom target, `Hvo::NULL` when never written.
    pub(crate) fn atom(&self, hvo: Hvo, flid: Flid) -> Hvo {
        self.record(hvo)
            .ok()
            .and_then(|r| r.get(&PropKey::basic(flid)))
            .and_then(Value::as_object)
            .unwrap_or(Hvo::NULL)
    }

    // ==================== Ownership Changes ====================

    /// True if `child` is `owner` or one of its owners.
    pub(crate) fn would_cycle(&self, owner: Hvo, child: Hvo) -> bool {
        owner == child || self.owner_chain(owner).contains(&child)
    }

    /// Validate splicing `items` into an owning vector.
    ///
    /// Items already held elsewhere in the same vector are allowed; the
    /// splice moves them.
    pub(crate) fn check_owning_splice(&self, owner: Hvo, items: &[Hvo]) -> StoreResult<()> {
        let mut seen = HashSet::new();
        for &item in items {
            if !seen.insert(item) {
                return Err(StoreError::DuplicateOwnership(item));
            }
            if self.would_cycle(owner, item) {
                return Err(StoreError::OwnershipCycle { owner, child: item });
            }
        }
        Ok(())
    }

    /// Splice into an owning vector, moving items from their previous
    /// owners and orphaning removed items that are not re-added.
    /// `start..end` must already be clamped and the splice validated.
    ///
    /// Items already held outside `start..end` of this vector are taken
    /// out of their old slot first; the range is given in the positions
    /// before that removal.
    pub(crate) fn splice_owning(
        &mut self,
        owner: Hvo,
        flid: Flid,
        start: usize,
        end: usize,
        items: &[Hvo],
    ) {
        for &item in items {
            let link = self.record(item).map(|r| r.owner_link()).unwrap_or_default();
            if link.owner != owner || link.flid != Some(flid) {
                self.detach(item);
            }
        }

        let mut next = self.vector(owner, flid);
        let moving: HashSet<Hvo> = items
            .iter()
            .copied()
            .filter(|h| next[..start].contains(h) || next[end..].contains(h))
            .collect();
        let shift = next[..start].iter().filter(|h| moving.contains(h)).count();
        next.retain(|h| !moving.contains(h));
        let removed: Vec<Hvo> = next
            .splice(start - shift..end - shift, items.iter().copied())
            .filter(|h| !items.contains(h))
            .collect();
        for orphan in removed {
            self.write_owner(orphan, OwnerLink::UNOWNED);
        }

        self.write_prop(owner, PropKey::basic(flid), Some(Value::Vector(next.clone())));
        self.relink(owner, flid, &next);
    }

    /// Point an owning atom at `child`, orphaning the previous child.
    pub(crate) fn set_owning_atom(&mut self, owner: Hvo, flid: Flid, child: Hvo) {
        let previous = self.atom(owner, flid);
        if previous == child && !child.is_null() {
            return;
        }
        if !child.is_null() {
            self.detach(child);
        }
        if !previous.is_null() {
            self.write_owner(previous, OwnerLink::UNOWNED);
        }
        self.write_prop(owner, PropKey::basic(flid), Some(Value::Object(child)));
        if !child.is_null() {
            self.write_owner(child, OwnerLink::new(owner, flid, None));
        }
    }

    /// Orphan every child held by an owning field.
    pub(crate) fn orphan_children(&mut self, owner: Hvo, flid: Flid) {
        let children = match self
            .record(owner)
            .ok()
            .and_then(|r| r.get(&PropKey::basic(flid)))
        {
            Some(Value::Object(child)) => vec![*child],
            Some(Value::Vector(items)) => items.clone(),
            _ => Vec::new(),
        };
        for child in children.into_iter().filter(|c| !c.is_null()) {
            self.write_owner(child, OwnerLink::UNOWNED);
        }
    }

    /// Remove an object from its owner's field and clear its back-pointers.
    pub(crate) fn detach(&mut self, child: Hvo) {
        let link = match self.record(child) {
            Ok(record) => record.owner_link(),
            Err(_) => return,
        };
        if let (true, Some(flid)) = (self.is_valid_object(link.owner), link.flid) {
            let key = PropKey::basic(flid);
            match self.mdc().field(flid).map(|f| f.property_type) {
                Some(ty) if ty.is_atomic() => {
                    if self.atom(link.owner, flid) == child {
                        self.write_prop(link.owner, key, Some(Value::Object(Hvo::NULL)));
                    }
                }
                Some(ty) if ty.is_vector() => {
                    let mut items = self.vector(link.owner, flid);
                    if let Some(index) = items.iter().position(|h| *h == child) {
                        items.remove(index);
                        self.write_prop(link.owner, key, Some(Value::Vector(items.clone())));
                        self.relink(link.owner, flid, &items);
                    }
                }
                _ => {}
            }
        }
        self.write_owner(child, OwnerLink::UNOWNED);
    }

    /// Rewrite the back-pointers of every item of an owning vector.
    fn relink(&mut self, owner: Hvo, flid: Flid, items: &[Hvo]) {
        let sequence = self.is_sequence_flid(flid);
        for (index, &item) in items.iter().enumerate() {
            let ord = sequence.then_some(index as u32);
            self.write_owner(item, OwnerLink::new(owner, flid, ord));
        }
    }
}
