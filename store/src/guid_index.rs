//! Guid to object lookup.

use cellar_core::Hvo;
use std::collections::HashMap;
use uuid::Uuid;

/// Bidirectional guid/hvo map. Each guid names at most one object and
/// each object has at most one guid.
#[derive(Debug, Clone, Default)]
pub struct GuidIndex {
    by_guid: HashMap<Uuid, Hvo>,
    by_hvo: HashMap<Hvo, Uuid>,
}

impl GuidIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, guid: &Uuid) -> Option<Hvo> {
        self.by_guid.get(guid).copied()
    }

    /// Check whether `guid` is held by an object other than `hvo`.
    pub fn is_taken(&self, guid: &Uuid, hvo: Hvo) -> bool {
        self.by_guid.get(guid).is_some_and(|owner| *owner != hvo)
    }

    /// Point `guid` at `hvo`, dropping any guid `hvo` held before.
    pub fn insert(&mut self, guid: Uuid, hvo: Hvo) {
        self.remove_hvo(hvo);
        if let Some(previous) = self.by_guid.insert(guid, hvo) {
            self.by_hvo.remove(&previous);
        }
        self.by_hvo.insert(hvo, guid);
    }

    pub fn remove_hvo(&mut self, hvo: Hvo) -> Option<Uuid> {
        let guid = self.by_hvo.remove(&hvo)?;
        self.by_guid.remove(&guid);
        Some(guid)
    }

    pub fn len(&self) -> usize {
        self.by_guid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_guid.is_empty()
    }
}
