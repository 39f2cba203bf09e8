//! Value types for Cellar properties.
//!
//! Values are the data held in one property slot. Each `PropertyType` maps
//! to exactly one `Value` variant; `Value::matches` is the single place that
//! mapping is spelled out.

use crate::{Hvo, PropertyType, TsString};
use chrono::{DateTime, Utc};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// An opaque shared object stored in a `GenericComInterface` field.
///
/// Compared by identity: two opaque values are equal only if they share
/// the same allocation.
#[derive(Clone)]
pub struct OpaqueValue(pub Arc<dyn Any + Send + Sync>);

impl OpaqueValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the inner object as `T` if it has that type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl PartialEq for OpaqueValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpaqueValue({:p})", Arc::as_ptr(&self.0))
    }
}

/// A value that can be stored in a property slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Guid(Uuid),
    Time(DateTime<Utc>),
    /// Plain text (`Unicode` and `MultiUnicode` slots).
    Unicode(String),
    /// Rich text (`String` and `MultiString` slots).
    String(TsString),
    Binary(Vec<u8>),
    Opaque(OpaqueValue),
    /// Atom target; `Hvo::NULL` means the link is cleared.
    Object(Hvo),
    /// Collection or sequence members in stored order.
    Vector(Vec<Hvo>),
}

impl Value {
    /// Short name of the value kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "Bool",
            Value::Int32(_) => "Int32",
            Value::Int64(_) => "Int64",
            Value::Guid(_) => "Guid",
            Value::Time(_) => "Time",
            Value::Unicode(_) => "Unicode",
            Value::String(_) => "String",
            Value::Binary(_) => "Binary",
            Value::Opaque(_) => "GenericComInterface",
            Value::Object(_) => "Object",
            Value::Vector(_) => "Vector",
        }
    }

    /// Returns true if this value may be stored in a slot of type `ty`.
    pub fn matches(&self, ty: PropertyType) -> bool {
        match self {
            Value::Bool(_) => ty == PropertyType::Bool,
            Value::Int32(_) => ty == PropertyType::Int32,
            Value::Int64(_) => ty == PropertyType::Int64,
            Value::Guid(_) => ty == PropertyType::Guid,
            Value::Time(_) => ty == PropertyType::Time,
            Value::Unicode(_) => matches!(ty, PropertyType::Unicode | PropertyType::MultiUnicode),
            Value::String(_) => matches!(ty, PropertyType::String | PropertyType::MultiString),
            Value::Binary(_) => ty == PropertyType::Binary,
            Value::Opaque(_) => ty == PropertyType::GenericComInterface,
            Value::Object(_) => ty.is_atomic(),
            Value::Vector(_) => ty.is_vector(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int32(&self) -> Option<i32> {
        match self {
            Value::Int32(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_int64(&self) -> Option<i64> {
        match self {
            Value::Int64(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_guid(&self) -> Option<Uuid> {
        match self {
            Value::Guid(g) => Some(*g),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_unicode(&self) -> Option<&str> {
        match self {
            Value::Unicode(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&TsString> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&OpaqueValue> {
        match self {
            Value::Opaque(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<Hvo> {
        match self {
            Value::Object(h) => Some(*h),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[Hvo]> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int32(i)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int64(i)
    }
}

impl From<Uuid> for Value {
    fn from(g: Uuid) -> Self {
        Value::Guid(g)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Unicode(s.to_string())
    }
}

impl From<TsString> for Value {
    fn from(s: TsString) -> Self {
        Value::String(s)
    }
}

impl From<Hvo> for Value {
    fn from(h: Hvo) -> Self {
        Value::Object(h)
    }
}
