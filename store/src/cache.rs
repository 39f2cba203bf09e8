//! The RealDataCache - in-memory object table.

use crate::change::{Change, ChangeLog};
use crate::error::{StoreError, StoreResult};
use crate::guid_index::GuidIndex;
use crate::options::StoreOptions;
use crate::record::{ObjectRecord, OwnerLink, PropKey};
use cellar_core::{Clid, Flid, Hvo, PropertyType, Value};
use cellar_registry::MetaDataCache;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Where `make_new_object` places the new object in an owning vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    /// Insert before this index; indexes past the end append.
    At(usize),
    Append,
}

impl InsertPosition {
    fn resolve(self, len: usize) -> usize {
        match self {
            InsertPosition::At(index) => index.min(len),
            InsertPosition::Append => len,
        }
    }
}

/// Handle allocator. Handles are never reused.
#[derive(Debug, Clone)]
struct HvoAllocator {
    next: u32,
}

impl HvoAllocator {
    fn new() -> Self {
        Self { next: 1 }
    }

    fn alloc(&mut self) -> Hvo {
        let hvo = Hvo::new(self.next);
        self.next += 1;
        hvo
    }
}

/// The typed property store.
///
/// Holds every object record, keyed by handle, together with the registry
/// that describes them. All writes go through `apply_change`, which keeps
/// the guid index in step and feeds the change log while recording is on.
/// Not thread-safe.
#[derive(Debug, Clone)]
pub struct RealDataCache {
    mdc: MetaDataCache,
    options: StoreOptions,
    objects: HashMap<Hvo, ObjectRecord>,
    guids: GuidIndex,
    hvo_alloc: HvoAllocator,
    log: ChangeLog,
}

impl RealDataCache {
    /// Create an empty store over a registry.
    pub fn new(mdc: MetaDataCache) -> Self {
        Self::with_options(mdc, StoreOptions::default())
    }

    pub fn with_options(mdc: MetaDataCache, options: StoreOptions) -> Self {
        Self {
            mdc,
            options,
            objects: HashMap::new(),
            guids: GuidIndex::new(),
            hvo_alloc: HvoAllocator::new(),
            log: ChangeLog::new(),
        }
    }

    pub fn mdc(&self) -> &MetaDataCache {
        &self.mdc
    }

    /// Mutable registry access, for adding virtual fields at runtime.
    pub fn mdc_mut(&mut self) -> &mut MetaDataCache {
        &mut self.mdc
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    // ==================== Change Recording ====================

    pub fn is_recording(&self) -> bool {
        self.log.is_recording()
    }

    pub fn set_recording(&mut self, recording: bool) {
        self.log.set_recording(recording);
    }

    /// Position in the change log; pass to `split_changes` later.
    pub fn change_mark(&self) -> usize {
        self.log.mark()
    }

    /// Remove and return the changes recorded after `mark`.
    pub fn split_changes(&mut self, mark: usize) -> Vec<Change> {
        self.log.split_off(mark)
    }

    pub fn take_changes(&mut self) -> Vec<Change> {
        self.log.take()
    }

    /// Apply one primitive change and record it.
    ///
    /// Never fails: a change that no longer fits the current state is
    /// skipped with a warning.
    pub fn apply_change(&mut self, change: Change) {
        match &change {
            Change::Property { hvo, key, new, .. } => {
                let Some(record) = self.objects.get_mut(hvo) else {
                    warn!(%hvo, flid = %key.flid, "skipping property change on missing object");
                    return;
                };
                match new {
                    Some(value) => {
                        record.set(*key, value.clone());
                    }
                    None => {
                        record.remove(key);
                    }
                }
                if key.flid == Flid::GUID {
                    self.guids.remove_hvo(*hvo);
                    if let Some(guid) = new.as_ref().and_then(Value::as_guid) {
                        self.index_guid(guid, *hvo);
                    }
                }
            }
            Change::Owner { hvo, new, .. } => {
                let Some(record) = self.objects.get_mut(hvo) else {
                    warn!(%hvo, "skipping owner change on missing object");
                    return;
                };
                record.set_owner_link(*new);
            }
            Change::Created { record } => {
                if self.objects.contains_key(&record.hvo) {
                    warn!(hvo = %record.hvo, "skipping creation of existing object");
                    return;
                }
                if let Some(guid) = record.guid() {
                    self.index_guid(guid, record.hvo);
                }
                self.objects.insert(record.hvo, record.clone());
            }
            Change::Deleted { record } => {
                if self.objects.remove(&record.hvo).is_none() {
                    warn!(hvo = %record.hvo, "skipping deletion of missing object");
                    return;
                }
                self.guids.remove_hvo(record.hvo);
            }
        }
        self.log.push(change);
    }

    /// Undo `changes` by applying their inverses newest first. Nothing is
    /// recorded while reverting.
    pub fn revert(&mut self, changes: &[Change]) {
        let recording = self.log.is_recording();
        self.log.set_recording(false);
        for change in changes.iter().rev() {
            self.apply_change(change.inverse());
        }
        self.log.set_recording(recording);
    }

    fn index_guid(&mut self, guid: Uuid, hvo: Hvo) {
        if let Some(holder) = self.guids.lookup(&guid).filter(|h| *h != hvo) {
            warn!(%guid, %hvo, %holder, "guid moved between objects");
        }
        self.guids.insert(guid, hvo);
    }

    /// Write one slot, recording the previous value. No-op writes are dropped.
    pub(crate) fn write_prop(&mut self, hvo: Hvo, key: PropKey, new: Option<Value>) {
        let old = self.objects.get(&hvo).and_then(|r| r.get(&key)).cloned();
        if old == new {
            return;
        }
        trace!(%hvo, flid = %key.flid, "write property");
        self.apply_change(Change::Property { hvo, key, old, new });
    }

    pub(crate) fn write_owner(&mut self, hvo: Hvo, new: OwnerLink) {
        let Some(old) = self.objects.get(&hvo).map(ObjectRecord::owner_link) else {
            return;
        };
        if old == new {
            return;
        }
        self.apply_change(Change::Owner { hvo, old, new });
    }

    // ==================== Objects ====================

    /// Get an object record by handle.
    pub fn record(&self, hvo: Hvo) -> StoreResult<&ObjectRecord> {
        self.objects.get(&hvo).ok_or(StoreError::UnknownObject(hvo))
    }

    pub fn is_valid_object(&self, hvo: Hvo) -> bool {
        self.objects.contains_key(&hvo)
    }

    /// Get the class of an object.
    pub fn get_class_id(&self, hvo: Hvo) -> StoreResult<Clid> {
        Ok(self.record(hvo)?.clid)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// All live handles in ascending order.
    pub fn all_objects(&self) -> Vec<Hvo> {
        let mut hvos: Vec<Hvo> = self.objects.keys().copied().collect();
        hvos.sort();
        hvos
    }

    /// Objects of a class, optionally including instances of its subclasses.
    pub fn objects_of_class(&self, clid: Clid, include_subclasses: bool) -> Vec<Hvo> {
        let mut hvos: Vec<Hvo> = self
            .objects
            .values()
            .filter(|r| {
                r.clid == clid
                    || (include_subclasses && self.mdc.is_same_or_subclass_of(r.clid, clid))
            })
            .map(|r| r.hvo)
            .collect();
        hvos.sort();
        hvos
    }

    /// Find the object holding a guid.
    pub fn get_obj_from_guid(&self, guid: &Uuid) -> Option<Hvo> {
        self.guids.lookup(guid)
    }

    /// True if an object other than `hvo` holds `guid`.
    pub fn is_guid_taken(&self, guid: &Uuid, hvo: Hvo) -> bool {
        self.guids.is_taken(guid, hvo)
    }

    /// Create an object of a concrete class.
    ///
    /// With a non-null `owner`, the object is placed in the owner's
    /// `own_flid`: set as the atom (orphaning the previous child) or
    /// inserted into the vector at `position`, clamped to the vector length.
    pub fn make_new_object(
        &mut self,
        clid: Clid,
        owner: Hvo,
        own_flid: Flid,
        position: InsertPosition,
    ) -> StoreResult<Hvo> {
        if self.mdc.class_def(clid)?.is_abstract {
            return Err(StoreError::AbstractClass(clid));
        }
        let owning_type = if owner.is_null() {
            None
        } else {
            let ty = self.owning_field_type(owner, own_flid)?;
            self.check_destination(own_flid, clid)?;
            Some(ty)
        };

        let hvo = self.hvo_alloc.alloc();
        self.apply_change(Change::Created {
            record: ObjectRecord::new(hvo, clid),
        });
        if self.options.assign_guids {
            self.write_prop(
                hvo,
                PropKey::basic(Flid::GUID),
                Some(Value::Guid(Uuid::new_v4())),
            );
        }

        match owning_type {
            Some(ty) if ty.is_atomic() => self.set_owning_atom(owner, own_flid, hvo),
            Some(_) => {
                let index = position.resolve(self.vector(owner, own_flid).len());
                self.splice_owning(owner, own_flid, index, index, &[hvo]);
            }
            None => {}
        }

        debug!(%hvo, %clid, %owner, "created object");
        Ok(hvo)
    }

    /// Delete an object and, recursively, everything it owns.
    ///
    /// The object is first removed from its owner's field. References held
    /// by other objects are left in place.
    pub fn delete_object(&mut self, hvo: Hvo) -> StoreResult<()> {
        self.record(hvo)?;
        self.detach(hvo);
        let count = self.delete_subtree(hvo);
        debug!(%hvo, count, "deleted object");
        Ok(())
    }

    /// Delete `root` and its descendants, children before their owners.
    fn delete_subtree(&mut self, root: Hvo) -> usize {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut pending = vec![root];
        while let Some(hvo) = pending.pop() {
            if seen.insert(hvo) {
                pending.extend(self.owned_objects(hvo));
                order.push(hvo);
            }
        }

        let mut count = 0;
        for hvo in order.into_iter().rev() {
            if let Some(record) = self.objects.get(&hvo).cloned() {
                self.apply_change(Change::Deleted { record });
                count += 1;
            }
        }
        count
    }

    // ==================== Field Checks ====================

    /// Type of a field as seen from a particular object.
    pub(crate) fn field_type(&self, hvo: Hvo, flid: Flid) -> StoreResult<PropertyType> {
        let clid = self.record(hvo)?.clid;
        if let Some(ty) = builtin_type(flid) {
            return Ok(ty);
        }
        let field = self.mdc.field_def(flid)?;
        if self.options.check_field_class && !self.mdc.is_field_of_class(clid, flid) {
            return Err(StoreError::FieldNotInClass { flid, clid });
        }
        Ok(field.property_type)
    }

    /// Check that a field has one of the accepted types.
    pub(crate) fn expect_type(
        &self,
        hvo: Hvo,
        flid: Flid,
        requested: &'static str,
        accept: fn(PropertyType) -> bool,
    ) -> StoreResult<PropertyType> {
        let ty = self.field_type(hvo, flid)?;
        if !accept(ty) {
            return Err(StoreError::type_mismatch(flid, ty, requested));
        }
        Ok(ty)
    }

    /// Check that an object of class `clid` may be stored in `flid`.
    ///
    /// Object fields admit their destination class and its subclasses.
    pub(crate) fn check_destination(&self, flid: Flid, clid: Clid) -> StoreResult<()> {
        let Some(dest) = self.mdc.field(flid).and_then(|f| f.dest_clid) else {
            return Ok(());
        };
        if !self.mdc.is_same_or_subclass_of(clid, dest) {
            return Err(StoreError::WrongDestinationClass { flid, clid, dest });
        }
        Ok(())
    }

    pub(crate) fn owning_field_type(&self, owner: Hvo, flid: Flid) -> StoreResult<PropertyType> {
        let ty = self.field_type(owner, flid)?;
        if !ty.is_owning() || flid.is_reserved() {
            return Err(StoreError::NotAnOwningField(flid));
        }
        Ok(ty)
    }
}

/// Types of the fields every object has without declaring them.
pub(crate) fn builtin_type(flid: Flid) -> Option<PropertyType> {
    match flid {
        Flid::GUID => Some(PropertyType::Guid),
        Flid::CLASS | Flid::OWN_FLID | Flid::OWN_ORD => Some(PropertyType::Int32),
        Flid::OWNER => Some(PropertyType::ReferenceAtom),
        _ => None,
    }
}
