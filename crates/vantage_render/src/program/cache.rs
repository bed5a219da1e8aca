//! Program Cache
//!
//! Maps each [`VariantKey`] to its [`ProgramRecord`]. The cache is filled in
//! one step once every variant has compiled and is read-only afterwards, so
//! render-time lookups are a single hash probe with no locking.

use rustc_hash::{FxHashMap, FxHashSet};
use vantage_core::VariantKey;

use super::record::ProgramRecord;

pub struct ProgramCache<P, U> {
    programs: FxHashMap<VariantKey, ProgramRecord<P, U>>,
    /// Keys in the order they were inserted.
    order: Vec<VariantKey>,
}

impl<P, U> Default for ProgramCache<P, U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, U> ProgramCache<P, U> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            programs: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    /// Stores every record at once.
    ///
    /// If any key is already present or repeated nothing is stored and the
    /// records are handed back so their programs can be released.
    pub fn fill(
        &mut self,
        records: Vec<ProgramRecord<P, U>>,
    ) -> Result<(), Vec<ProgramRecord<P, U>>> {
        let mut seen = FxHashSet::default();
        let conflict = records
            .iter()
            .any(|record| self.programs.contains_key(&record.key) || !seen.insert(record.key));
        if conflict {
            return Err(records);
        }
        for record in records {
            self.order.push(record.key);
            self.programs.insert(record.key, record);
        }
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn get(&self, key: VariantKey) -> Option<&ProgramRecord<P, U>> {
        self.programs.get(&key)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, key: VariantKey) -> bool {
        self.programs.contains_key(&key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> &[VariantKey] {
        &self.order
    }

    /// Removes and returns every record, in insertion order.
    pub fn drain(&mut self) -> Vec<ProgramRecord<P, U>> {
        let mut records = Vec::with_capacity(self.order.len());
        for key in self.order.drain(..) {
            if let Some(record) = self.programs.remove(&key) {
                records.push(record);
            }
        }
        records
    }
}
