//! Typed property access.
//!
//! Each getter and setter checks the object, the field and the field's
//! declared type before touching a slot. Getters on never-written
//! non-vector slots fail with `PropertyNotSet`; vectors read as empty.

use crate::cache::RealDataCache;
use crate::error::{StoreError, StoreResult};
use crate::record::PropKey;
use cellar_core::{Flid, Hvo, OpaqueValue, PropertyType, TsString, Value, Ws};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use PropertyType as T;

fn is_bool(t: PropertyType) -> bool {
    t == T::Bool
}
fn is_int32(t: PropertyType) -> bool {
    t == T::Int32
}
fn is_int64(t: PropertyType) -> bool {
    t == T::Int64
}
fn is_guid(t: PropertyType) -> bool {
    t == T::Guid
}
fn is_time(t: PropertyType) -> bool {
    t == T::Time
}
fn is_unicode(t: PropertyType) -> bool {
    t == T::Unicode
}
fn is_string(t: PropertyType) -> bool {
    t == T::String
}
fn is_multi_unicode(t: PropertyType) -> bool {
    t == T::MultiUnicode
}
fn is_multi_string(t: PropertyType) -> bool {
    t == T::MultiString
}
fn is_binary(t: PropertyType) -> bool {
    t == T::Binary
}
fn is_unknown(t: PropertyType) -> bool {
    t == T::GenericComInterface
}

impl RealDataCache {
    /// Read a slot, failing with `PropertyNotSet` when empty.
    fn read(&self, hvo: Hvo, key: PropKey) -> StoreResult<&Value> {
        self.record(hvo)?
            .get(&key)
            .ok_or(StoreError::not_set(hvo, key.flid))
    }

    /// Read a slot and convert it with `extract`.
    fn read_as<'a, V>(
        &'a self,
        hvo: Hvo,
        key: PropKey,
        ty: PropertyType,
        requested: &'static str,
        extract: impl FnOnce(&'a Value) -> Option<V>,
    ) -> StoreResult<V> {
        extract(self.read(hvo, key)?)
            .ok_or_else(|| StoreError::type_mismatch(key.flid, ty, requested))
    }

    fn check_writable(flid: Flid) -> StoreResult<()> {
        if flid.is_reserved() && flid != Flid::GUID {
            return Err(StoreError::ReadOnlyField(flid));
        }
        Ok(())
    }

    /// Validate and store a non-object value.
    fn set_basic(
        &mut self,
        hvo: Hvo,
        key: PropKey,
        requested: &'static str,
        accept: fn(PropertyType) -> bool,
        value: Value,
    ) -> StoreResult<()> {
        Self::check_writable(key.flid)?;
        self.expect_type(hvo, key.flid, requested, accept)?;
        self.write_prop(hvo, key, Some(value));
        Ok(())
    }

    // ==================== Scalars ====================

    pub fn get_bool(&self, hvo: Hvo, flid: Flid) -> StoreResult<bool> {
        let ty = self.expect_type(hvo, flid, "Bool", is_bool)?;
        self.read_as(hvo, PropKey::basic(flid), ty, "Bool", Value::as_bool)
    }

    pub fn set_bool(&mut self, hvo: Hvo, flid: Flid, value: bool) -> StoreResult<()> {
        self.set_basic(hvo, PropKey::basic(flid), "Bool", is_bool, Value::Bool(value))
    }

    /// Read an `Int32` field.
    ///
    /// Also answers the built-in class, owning-field and ordinal fields. An
    /// unowned object has owning field 0; an object outside a sequence has
    /// ordinal -1. A built-in id too large for `i32` fails with
    /// `ValueOutOfRange` instead of wrapping.
    pub fn get_int(&self, hvo: Hvo, flid: Flid) -> StoreResult<i32> {
        let ty = self.expect_type(hvo, flid, "Int32", is_int32)?;
        let record = self.record(hvo)?;
        let narrow = |value: u32| {
            i32::try_from(value).map_err(|_| StoreError::ValueOutOfRange { flid, value })
        };
        match flid {
            Flid::CLASS => narrow(record.clid.raw()),
            Flid::OWN_FLID => record.own_flid.map_or(Ok(0), |f| narrow(f.raw())),
            Flid::OWN_ORD => record.own_ord.map_or(Ok(-1), narrow),
            _ => self.read_as(hvo, PropKey::basic(flid), ty, "Int32", Value::as_int32),
        }
    }

    pub fn set_int(&mut self, hvo: Hvo, flid: Flid, value: i32) -> StoreResult<()> {
        self.set_basic(hvo, PropKey::basic(flid), "Int32", is_int32, Value::Int32(value))
    }

    pub fn get_int64(&self, hvo: Hvo, flid: Flid) -> StoreResult<i64> {
        let ty = self.expect_type(hvo, flid, "Int64", is_int64)?;
        self.read_as(hvo, PropKey::basic(flid), ty, "Int64", Value::as_int64)
    }

    pub fn set_int64(&mut self, hvo: Hvo, flid: Flid, value: i64) -> StoreResult<()> {
        self.set_basic(hvo, PropKey::basic(flid), "Int64", is_int64, Value::Int64(value))
    }

    /// Read a `Guid` field; `Flid::GUID` is the object's own guid.
    pub fn get_guid(&self, hvo: Hvo, flid: Flid) -> StoreResult<Uuid> {
        let ty = self.expect_type(hvo, flid, "Guid", is_guid)?;
        self.read_as(hvo, PropKey::basic(flid), ty, "Guid", Value::as_guid)
    }

    /// Write a `Guid` field. Writing `Flid::GUID` re-keys the object in the
    /// guid index and fails with `DuplicateGuid` if another object holds it.
    pub fn set_guid(&mut self, hvo: Hvo, flid: Flid, guid: Uuid) -> StoreResult<()> {
        if flid == Flid::GUID {
            self.record(hvo)?;
            if self.is_guid_taken(&guid, hvo) {
                tracing::debug!(%guid, %hvo, "guid already assigned");
                return Err(StoreError::DuplicateGuid(guid));
            }
        }
        self.set_basic(hvo, PropKey::basic(flid), "Guid", is_guid, Value::Guid(guid))
    }

    pub fn get_time(&self, hvo: Hvo, flid: Flid) -> StoreResult<DateTime<Utc>> {
        let ty = self.expect_type(hvo, flid, "Time", is_time)?;
        self.read_as(hvo, PropKey::basic(flid), ty, "Time", Value::as_time)
    }

    pub fn set_time(&mut self, hvo: Hvo, flid: Flid, value: DateTime<Utc>) -> StoreResult<()> {
        self.set_basic(hvo, PropKey::basic(flid), "Time", is_time, Value::Time(value))
    }

    // ==================== Text ====================

    pub fn get_unicode(&self, hvo: Hvo, flid: Flid) -> StoreResult<&str> {
        let ty = self.expect_type(hvo, flid, "Unicode", is_unicode)?;
        self.read_as(hvo, PropKey::basic(flid), ty, "Unicode", Value::as_unicode)
    }

    pub fn set_unicode(&mut self, hvo: Hvo, flid: Flid, text: &str) -> StoreResult<()> {
        let value = Value::Unicode(text.to_string());
        self.set_basic(hvo, PropKey::basic(flid), "Unicode", is_unicode, value)
    }

    pub fn get_string(&self, hvo: Hvo, flid: Flid) -> StoreResult<&TsString> {
        let ty = self.expect_type(hvo, flid, "String", is_string)?;
        self.read_as(hvo, PropKey::basic(flid), ty, "String", Value::as_string)
    }

    pub fn set_string(&mut self, hvo: Hvo, flid: Flid, text: TsString) -> StoreResult<()> {
        self.set_basic(hvo, PropKey::basic(flid), "String", is_string, Value::String(text))
    }

    pub fn get_multi_unicode_alt(&self, hvo: Hvo, flid: Flid, ws: Ws) -> StoreResult<&str> {
        let ty = self.expect_type(hvo, flid, "MultiUnicode", is_multi_unicode)?;
        self.read_as(hvo, PropKey::alt(flid, ws), ty, "MultiUnicode", Value::as_unicode)
    }

    pub fn set_multi_unicode_alt(
        &mut self,
        hvo: Hvo,
        flid: Flid,
        ws: Ws,
        text: &str,
    ) -> StoreResult<()> {
        let value = Value::Unicode(text.to_string());
        self.set_basic(hvo, PropKey::alt(flid, ws), "MultiUnicode", is_multi_unicode, value)
    }

    pub fn get_multi_string_alt(&self, hvo: Hvo, flid: Flid, ws: Ws) -> StoreResult<&TsString> {
        let ty = self.expect_type(hvo, flid, "MultiString", is_multi_string)?;
        self.read_as(hvo, PropKey::alt(flid, ws), ty, "MultiString", Value::as_string)
    }

    pub fn set_multi_string_alt(
        &mut self,
        hvo: Hvo,
        flid: Flid,
        ws: Ws,
        text: TsString,
    ) -> StoreResult<()> {
        let value = Value::String(text);
        self.set_basic(hvo, PropKey::alt(flid, ws), "MultiString", is_multi_string, value)
    }

    /// Writing systems with a stored alternative, in write order.
    pub fn get_multi_alternatives(&self, hvo: Hvo, flid: Flid) -> StoreResult<Vec<Ws>> {
        self.expect_type(hvo, flid, "MultiUnicode or MultiString", PropertyType::is_multi)?;
        Ok(self
            .record(hvo)?
            .props()
            .filter(|(key, _)| key.flid == flid)
            .filter_map(|(key, _)| key.ws)
            .collect())
    }

    // ==================== Binary & Opaque ====================

    /// Copy a binary value into `buf`, returning the byte count.
    pub fn get_binary(&self, hvo: Hvo, flid: Flid, buf: &mut [u8]) -> StoreResult<usize> {
        let bytes = self.get_binary_vec(hvo, flid)?;
        if buf.len() < bytes.len() {
            return Err(StoreError::BufferTooSmall {
                needed: bytes.len(),
                available: buf.len(),
            });
        }
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(bytes.len())
    }

    pub fn get_binary_vec(&self, hvo: Hvo, flid: Flid) -> StoreResult<&[u8]> {
        let ty = self.expect_type(hvo, flid, "Binary", is_binary)?;
        self.read_as(hvo, PropKey::basic(flid), ty, "Binary", Value::as_binary)
    }

    pub fn set_binary(&mut self, hvo: Hvo, flid: Flid, bytes: &[u8]) -> StoreResult<()> {
        let value = Value::Binary(bytes.to_vec());
        self.set_basic(hvo, PropKey::basic(flid), "Binary", is_binary, value)
    }

    pub fn get_unknown(&self, hvo: Hvo, flid: Flid) -> StoreResult<OpaqueValue> {
        let ty = self.expect_type(hvo, flid, "GenericComInterface", is_unknown)?;
        self.read_as(hvo, PropKey::basic(flid), ty, "GenericComInterface", |v| {
            v.as_opaque().cloned()
        })
    }

    pub fn set_unknown(&mut self, hvo: Hvo, flid: Flid, value: OpaqueValue) -> StoreResult<()> {
        let value = Value::Opaque(value);
        self.set_basic(hvo, PropKey::basic(flid), "GenericComInterface", is_unknown, value)
    }

    // ==================== Object Atoms ====================

    /// Read an atom; `Flid::OWNER` yields the object's owner.
    pub fn get_obj_prop(&self, hvo: Hvo, flid: Flid) -> StoreResult<Hvo> {
        let ty = self.expect_type(hvo, flid, "Atom", PropertyType::is_atomic)?;
        if flid == Flid::OWNER {
            return Ok(self.record(hvo)?.owner);
        }
        self.read_as(hvo, PropKey::basic(flid), ty, "Atom", Value::as_object)
    }

    /// Point an atom at `target`; `Hvo::NULL` clears the link.
    ///
    /// For owning atoms the target is moved from its previous owner and the
    /// previous child is orphaned, not deleted.
    pub fn set_obj_prop(&mut self, hvo: Hvo, flid: Flid, target: Hvo) -> StoreResult<()> {
        Self::check_writable(flid)?;
        let ty = self.expect_type(hvo, flid, "Atom", PropertyType::is_atomic)?;
        if !target.is_null() {
            let clid = self.record(target)?.clid;
            self.check_destination(flid, clid)?;
        }
        if ty.is_owning() {
            if !target.is_null() && self.would_cycle(hvo, target) {
                return Err(StoreError::OwnershipCycle {
                    owner: hvo,
                    child: target,
                });
            }
            self.set_owning_atom(hvo, flid, target);
        } else {
            self.write_prop(hvo, PropKey::basic(flid), Some(Value::Object(target)));
        }
        Ok(())
    }

    // ==================== Object Vectors ====================

    fn expect_vector(&self, hvo: Hvo, flid: Flid) -> StoreResult<PropertyType> {
        self.expect_type(hvo, flid, "Vector", PropertyType::is_vector)
    }

    pub fn get_vec(&self, hvo: Hvo, flid: Flid) -> StoreResult<Vec<Hvo>> {
        self.expect_vector(hvo, flid)?;
        Ok(self.vector(hvo, flid))
    }

    pub fn get_vec_size(&self, hvo: Hvo, flid: Flid) -> StoreResult<usize> {
        Ok(self.get_vec(hvo, flid)?.len())
    }

    pub fn get_vec_item(&self, hvo: Hvo, flid: Flid, index: usize) -> StoreResult<Hvo> {
        let items = self.get_vec(hvo, flid)?;
        items.get(index).copied().ok_or(StoreError::IndexOutOfRange {
            index,
            len: items.len(),
        })
    }

    /// Position of `child` in a vector, if present.
    pub fn get_obj_index(&self, hvo: Hvo, flid: Flid, child: Hvo) -> StoreResult<Option<usize>> {
        Ok(self.get_vec(hvo, flid)?.iter().position(|h| *h == child))
    }

    /// Replace `[start, end)` of a vector with `items`.
    ///
    /// `start` and `end` are clamped to the vector, so this one call covers
    /// insert (`start == end`), append (`start == len`), remove (no items)
    /// and overwrite. Every item must be of the field's destination class
    /// or a subclass. Owning vectors reject repeated items and cycles, move
    /// items from their previous owners or slots and orphan removed items
    /// that are not re-added.
    pub fn replace(
        &mut self,
        hvo: Hvo,
        flid: Flid,
        start: usize,
        end: usize,
        items: &[Hvo],
    ) -> StoreResult<()> {
        let ty = self.expect_vector(hvo, flid)?;
        for &item in items {
            let clid = self.record(item)?.clid;
            self.check_destination(flid, clid)?;
        }

        let len = self.vector(hvo, flid).len();
        let start = start.min(len);
        let end = end.clamp(start, len);

        if ty.is_owning() {
            self.check_owning_splice(hvo, items)?;
            self.splice_owning(hvo, flid, start, end, items);
        } else {
            let mut next = self.vector(hvo, flid);
            next.splice(start..end, items.iter().copied());
            self.write_prop(hvo, PropKey::basic(flid), Some(Value::Vector(next)));
        }
        Ok(())
    }

    // ==================== Generic Access ====================

    /// Check whether a slot holds a value.
    ///
    /// For multilingual fields without `ws`, true if any alternative is set.
    /// Built-in fields other than the guid are always set.
    pub fn is_property_set(&self, hvo: Hvo, flid: Flid, ws: Option<Ws>) -> StoreResult<bool> {
        let ty = self.field_type(hvo, flid)?;
        let record = self.record(hvo)?;
        if flid.is_reserved() && flid != Flid::GUID {
            return Ok(true);
        }
        Ok(match (ty.is_multi(), ws) {
            (true, Some(ws)) => record.contains(&PropKey::alt(flid, ws)),
            (true, None) => record.props().any(|(key, _)| key.flid == flid),
            (false, _) => record.contains(&PropKey::basic(flid)),
        })
    }

    /// Read any slot as a `Value`. Multilingual fields need `ws`.
    pub fn get_value(&self, hvo: Hvo, flid: Flid, ws: Option<Ws>) -> StoreResult<Value> {
        let ty = self.field_type(hvo, flid)?;
        let record = self.record(hvo)?;
        match flid {
            Flid::CLASS | Flid::OWN_FLID | Flid::OWN_ORD => {
                return self.get_int(hvo, flid).map(Value::Int32)
            }
            Flid::OWNER => return Ok(Value::Object(record.owner)),
            _ => {}
        }
        let key = match (ty.is_multi(), ws) {
            (true, Some(ws)) => PropKey::alt(flid, ws),
            (true, None) => return Err(StoreError::WsRequired(flid)),
            (false, _) => PropKey::basic(flid),
        };
        match record.get(&key) {
            Some(value) => Ok(value.clone()),
            None if ty.is_vector() => Ok(Value::Vector(Vec::new())),
            None => Err(StoreError::not_set(hvo, flid)),
        }
    }

    /// Clear a slot back to "not set".
    ///
    /// Clearing an owning field orphans its children. `ws` is only consulted
    /// for multilingual fields, where it is required.
    pub fn remove_property(&mut self, hvo: Hvo, flid: Flid, ws: Option<Ws>) -> StoreResult<()> {
        if flid == Flid::GUID {
            return Err(StoreError::ReadOnlyField(flid));
        }
        Self::check_writable(flid)?;
        let ty = self.field_type(hvo, flid)?;
        let key = match (ty.is_multi(), ws) {
            (true, Some(ws)) => PropKey::alt(flid, ws),
            (true, None) => return Err(StoreError::WsRequired(flid)),
            (false, _) => PropKey::basic(flid),
        };
        if ty.is_owning() {
            self.orphan_children(hvo, flid);
        }
        self.write_prop(hvo, key, None);
        Ok(())
    }
}
