//! Sparse count histogram over small integer buckets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Histogram keyed by an integer bucket (for example "number of repetitions
/// of a field in one message"). Bucket 0 is an ordinary bucket.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountHistogram {
    buckets: BTreeMap<u32, u64>,
}

impl CountHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one observation in `bucket`.
    pub fn record(&mut self, bucket: u32) {
        self.record_n(bucket, 1);
    }

    /// Count `n` observations in `bucket`.
    pub fn record_n(&mut self, bucket: u32, n: u64) {
        if n == 0 {
            return;
        }
        *self.buckets.entry(bucket).or_insert(0) += n;
    }

    /// Fold another histogram into this one.
    pub fn merge(&mut self, other: &Self) {
        for (bucket, n) in &other.buckets {
            self.record_n(*bucket, *n);
        }
    }

    /// Count in `bucket`.
    pub fn get(&self, bucket: u32) -> u64 {
        self.buckets.get(&bucket).copied().unwrap_or(0)
    }

    /// Sum over all buckets.
    pub fn total(&self) -> u64 {
        self.buckets.values().sum()
    }

    /// Highest bucket with a non-zero count.
    pub fn max_bucket(&self) -> Option<u32> {
        self.buckets.keys().next_back().copied()
    }

    /// Buckets in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        self.buckets.iter().map(|(b, n)| (*b, *n))
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
