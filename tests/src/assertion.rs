//! Whole-store assertions for the integration suites.

use cellar_core::{Flid, Hvo};
use cellar_store::{ObjectRecord, RealDataCache};

/// Expected state of a store, checked in one go.
///
/// Unset expectations are not checked. Ownership invariants are always
/// checked.
#[derive(Debug, Default)]
pub struct StoreAssertion {
    pub object_count: Option<usize>,
    pub present: Vec<Hvo>,
    pub absent: Vec<Hvo>,
    /// `(owner, flid, children)`: the vector holds exactly these children,
    /// in order.
    pub vectors: Vec<(Hvo, Flid, Vec<Hvo>)>,
    /// Sequences whose children must be numbered `0..n`.
    pub dense: Vec<(Hvo, Flid)>,
}

impl StoreAssertion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object_count(mut self, count: usize) -> Self {
        self.object_count = Some(count);
        self
    }

    pub fn present(mut self, hvo: Hvo) -> Self {
        self.present.push(hvo);
        self
    }

    pub fn absent(mut self, hvo: Hvo) -> Self {
        self.absent.push(hvo);
        self
    }

    pub fn vector(mut self, owner: Hvo, flid: Flid, children: &[Hvo]) -> Self {
        self.vectors.push((owner, flid, children.to_vec()));
        self
    }

    pub fn dense(mut self, owner: Hvo, flid: Flid) -> Self {
        self.dense.push((owner, flid));
        self
    }

    /// Collect every failed expectation.
    pub fn check(&self, cache: &RealDataCache) -> Result<(), Vec<String>> {
        let mut failures: Vec<String> = cache
            .check_ownership_invariants()
            .iter()
            .map(ToString::to_string)
            .collect();

        if let Some(expected) = self.object_count {
            let actual = cache.object_count();
            if actual != expected {
                failures.push(format!("expected {expected} objects, found {actual}"));
            }
        }
        for hvo in &self.present {
            if !cache.is_valid_object(*hvo) {
                failures.push(format!("{hvo} should exist"));
            }
        }
        for hvo in &self.absent {
            if cache.is_valid_object(*hvo) {
                failures.push(format!("{hvo} should not exist"));
            }
        }
        for (owner, flid, expected) in &self.vectors {
            match cache.get_vec(*owner, *flid) {
                Ok(actual) if actual == *expected => {}
                Ok(actual) => {
                    failures.push(format!("{owner} {flid}: expected {expected:?}, found {actual:?}"))
                }
                Err(e) => failures.push(format!("{owner} {flid}: {e}")),
            }
        }
        for (owner, flid) in &self.dense {
            let children = cache.get_vec(*owner, *flid).unwrap_or_default();
            for (index, child) in children.iter().enumerate() {
                let ord = cache.get_own_ord(*child).ok().flatten();
                if ord != Some(index as u32) {
                    failures.push(format!("{child} at {index} has ordinal {ord:?}"));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }

    /// Panic with every failed expectation.
    pub fn assert(&self, cache: &RealDataCache) {
        if let Err(failures) = self.check(cache) {
            panic!("store assertion failed:\n  {}", failures.join("\n  "));
        }
    }
}

/// Every object record, sorted by handle, for before/after comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub records: Vec<ObjectRecord>,
}

impl Snapshot {
    pub fn of(cache: &RealDataCache) -> Self {
        let mut hvos = cache.all_objects();
        hvos.sort();
        let records = hvos
            .into_iter()
            .filter_map(|hvo| cache.record(hvo).ok().cloned())
            .collect();
        Self { records }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::Lexicon;
    use cellar_store::InsertPosition;

    // ========== TEST: check_reports_failures ==========
    #[test]
    fn test_check_reports_failures() {
        let mut lex = Lexicon::new();
        let entry = lex.new_entry();
        let senses = lex.flid("LexEntry", "Senses");

        let result = StoreAssertion::new()
            .object_count(5)
            .absent(entry)
            .vector(entry, senses, &[Hvo::new(999)])
            .check(lex.cache());

        let failures = result.unwrap_err();
        assert_eq!(failures.len(), 3);
    }

    // ========== TEST: snapshot_sees_property_changes ==========
    #[test]
    fn test_snapshot_sees_property_changes() {
        let mut lex = Lexicon::new();
        let entry = lex.new_entry();
        lex.new_sense(entry, InsertPosition::Append);
        let before = Snapshot::of(lex.cache());

        let number = lex.flid("LexEntry", "HomographNumber");
        lex.cache_mut().set_int(entry, number, 2).unwrap();

        assert_ne!(Snapshot::of(lex.cache()), before);
        assert_eq!(before.records.len(), 3);
    }
}
