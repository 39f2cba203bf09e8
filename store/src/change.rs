//! Primitive change records.
//!
//! Every mutation the store performs is expressed as a sequence of
//! `Change`s. While recording is on, each applied change is appended to the
//! change log together with the state it replaced, so that applying the
//! inverses in reverse order restores the store exactly.

use crate::record::{ObjectRecord, OwnerLink, PropKey};
use cellar_core::{Hvo, Value};

/// One reversible store mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// A property slot changed. `None` means "not set".
    Property {
        hvo: Hvo,
        key: PropKey,
        old: Option<Value>,
        new: Option<Value>,
    },

    /// An object's owner back-pointers changed.
    Owner {
        hvo: Hvo,
        old: OwnerLink,
        new: OwnerLink,
    },

    /// An object was inserted with the given initial state.
    Created { record: ObjectRecord },

    /// An object was removed; `record` is its full state at removal.
    Deleted { record: ObjectRecord },
}

impl Change {
    /// The change that undoes this one.
    pub fn inverse(&self) -> Change {
        match self {
            Change::Property { hvo, key, old, new } => Change::Property {
                hvo: *hvo,
                key: *key,
                old: new.clone(),
                new: old.clone(),
            },
            Change::Owner { hvo, old, new } => Change::Owner {
                hvo: *hvo,
                old: *new,
                new: *old,
            },
            Change::Created { record } => Change::Deleted {
                record: record.clone(),
            },
            Change::Deleted { record } => Change::Created {
                record: record.clone(),
            },
        }
    }
}

/// Append-only buffer of applied changes, active only while recording.
#[derive(Debug, Clone, Default)]
pub struct ChangeLog {
    recording: bool,
    changes: Vec<Change>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
    }

    pub fn push(&mut self, change: Change) {
        if self.recording {
            self.changes.push(change);
        }
    }

    /// Current length, usable as a mark for `split_off`.
    pub fn mark(&self) -> usize {
        self.changes.len()
    }

    /// Remove and return everything recorded after `mark`.
    pub fn split_off(&mut self, mark: usize) -> Vec<Change> {
        if mark >= self.changes.len() {
            return Vec::new();
        }
        self.changes.split_off(mark)
    }

    pub fn take(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.changes)
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}
