//! Length bounds and exact running mean.

use serde::{Deserialize, Serialize};

/// Min / max / mean of observed lengths.
///
/// The mean is derived from an integer total rather than stored, so merging
/// two partitions gives a bit-identical mean regardless of grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LengthStats {
    count: u64,
    min: u64,
    max: u64,
    total: u64,
}

impl LengthStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observed length.
    pub fn observe(&mut self, len: u64) {
        if self.count == 0 {
            self.min = len;
            self.max = len;
        } else {
            self.min = self.min.min(len);
            self.max = self.max.max(len);
        }
        self.count += 1;
        self.total = self.total.saturating_add(len);
    }

    /// Fold another accumulator into this one.
    pub fn merge(&mut self, other: &Self) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.count += other.count;
        self.total = self.total.saturating_add(other.total);
    }

    /// Number of observations.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn min(&self) -> Option<u64> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<u64> {
        (self.count > 0).then_some(self.max)
    }

    /// Sum of all observed lengths.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Arithmetic mean, `None` when nothing was observed.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total as f64 / self.count as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
