//! Cellar Core Types
//!
//! This crate provides the foundational types shared by every Cellar crate:
//! - Handle types (Hvo, Clid, Flid, Ws)
//! - The `PropertyType` tag describing what a field stores
//! - Value types (the `Value` enum and rich text)
//! - The flat `ErrorKind` taxonomy used across crate boundaries

mod id;
mod kind;
mod property_type;
mod text;
mod value;

pub use id::*;
pub use kind::ErrorKind;
pub use property_type::PropertyType;
pub use text::{TextRun, TsString};
pub use value::*;
