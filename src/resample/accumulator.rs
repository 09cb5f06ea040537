//! Per-pixel coverage accumulation and ranking

use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Identifier as an ordered map key (IEEE total order, bit-exact equality)
#[derive(Debug, Clone, Copy)]
struct IdKey(f32);

impl PartialEq for IdKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for IdKey {}

impl PartialOrd for IdKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IdKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// One identifier with its accumulated coverage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedEntry {
    pub id: f32,
    pub coverage: f32,
}

/// Identifier → coverage for a single destination pixel
#[derive(Debug, Default, Clone)]
pub struct CoverageAccumulator {
    entries: BTreeMap<IdKey, f32>,
}

impl CoverageAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add(&mut self, id: f32, coverage: f32) {
        *self.entries.entry(IdKey(id)).or_insert(0.0) += coverage;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Fill `out` with the entries in descending coverage order.
    ///
    /// Equal coverage falls back to ascending identifier order, so the order is
    /// fully determined by the key set and no entry is ever dropped on a tie.
    pub fn ranked_into(&self, out: &mut Vec<RankedEntry>) {
        out.clear();
        out.extend(self.entries.iter().map(|(k, &coverage)| RankedEntry { id: k.0, coverage }));
        out.sort_by(|a, b| b.coverage.total_cmp(&a.coverage).then(a.id.total_cmp(&b.id)));
    }
}

// Inspection helpers for tests; the resampler only needs `ranked_into`
#[cfg(test)]
impl CoverageAccumulator {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn coverage(&self, id: f32) -> Option<f32> {
        self.entries.get(&IdKey(id)).copied()
    }

    fn total(&self) -> f32 {
        self.entries.values().sum()
    }

    fn ranked(&self) -> Vec<RankedEntry> {
        let mut out = Vec::with_capacity(self.entries.len());
        self.ranked_into(&mut out);
        out
    }
}
