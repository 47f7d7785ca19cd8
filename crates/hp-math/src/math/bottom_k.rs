//! Capped distinct-value set with exact counts.
//!
//! A first-come capped set is not mergeable: which values survive depends on
//! arrival order, so two partitionings of the same input disagree. A
//! bottom-k set keeps the `cap` smallest distinct values instead. The kept
//! set is a function of the distinct values seen, so union-then-trim is
//! associative and commutative.
//!
//! Counts stay exact for every kept value. A value is evicted only when `cap`
//! smaller distinct values are already present; those values remain present
//! in every later state, so an evicted value can never be part of any final
//! bottom-k and its missing counts never surface.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The `cap` smallest distinct values, each with its occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Ord + Serialize",
    deserialize = "T: Ord + Deserialize<'de>"
))]
pub struct BottomK<T: Ord> {
    cap: usize,
    values: BTreeMap<T, u64>,
    /// More than `cap` distinct values were seen.
    overflowed: bool,
}

impl<T: Ord + Clone> BottomK<T> {
    pub fn new(cap: usize) -> Self {
        BottomK {
            cap,
            values: BTreeMap::new(),
            overflowed: false,
        }
    }

    /// Count one occurrence of `value`.
    pub fn insert(&mut self, value: T) {
        self.insert_count(value, 1);
    }

    /// Count `n` occurrences of `value`.
    pub fn insert_count(&mut self, value: T, n: u64) {
        if n == 0 {
            return;
        }
        *self.values.entry(value).or_insert(0) += n;
        self.trim();
    }

    /// Fold another set into this one.
    ///
    /// When caps differ the smaller one wins, which keeps the operation
    /// commutative.
    pub fn merge(&mut self, other: &Self) {
        self.cap = self.cap.min(other.cap);
        self.overflowed |= other.overflowed;
        for (value, n) in &other.values {
            *self.values.entry(value.clone()).or_insert(0) += n;
        }
        self.trim();
    }

    fn trim(&mut self) {
        while self.values.len() > self.cap {
            self.values.pop_last();
            self.overflowed = true;
        }
    }

    /// Drop every kept value. The overflow flag is reset too.
    pub fn clear(&mut self) {
        self.values.clear();
        self.overflowed = false;
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when more distinct values were seen than could be kept.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Count for `value`, if kept.
    pub fn count(&self, value: &T) -> Option<u64> {
        self.values.get(value).copied()
    }

    /// Sum of counts over the kept values.
    pub fn kept_total(&self) -> u64 {
        self.values.values().sum()
    }

    /// Kept values in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, u64)> + '_ {
        self.values.iter().map(|(v, n)| (v, *n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_smallest_values() {
        let mut set = BottomK::new(2);
        for v in ["m", "c", "x", "a", "c"] {
            set.insert(v.to_string());
        }
        let kept: Vec<(&String, u64)> = set.iter().collect();
        assert_eq!(kept, vec![(&"a".to_string(), 1), (&"c".to_string(), 2)]);
        assert!(set.overflowed());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_no_overflow_under_cap() {
        let mut set = BottomK::new(3);
        set.insert(1u32);
        set.insert(1u32);
        set.insert(2u32);
        assert!(!set.overflowed());
        assert_eq!(set.count(&1), Some(2));
        assert_eq!(set.kept_total(), 3);
    }

    #[test]
    fn test_merge_is_cap_aware() {
        let mut a = BottomK::new(3);
        for v in [1u32, 2, 3] {
            a.insert(v);
        }
        let mut b = BottomK::new(3);
        for v in [0u32, 4] {
            b.insert(v);
        }
        assert!(!a.overflowed() && !b.overflowed());
        a.merge(&b);
        assert_eq!(a.len(), 3);
        assert!(a.overflowed());
        let kept: Vec<u32> = a.iter().map(|(v, _)| *v).collect();
        assert_eq!(kept, vec![0, 1, 2]);
    }

    #[test]
    fn test_counts_exact_after_eviction() {
        // "b" is evicted in the first partition, so it must not survive the
        // merge with a stale partial count.
        let mut a = BottomK::new(1);
        a.insert("b");
        a.insert("a");
        a.insert("b");
        let mut b = BottomK::new(1);
        b.insert("b");
        a.merge(&b);
        assert_eq!(a.count(&"a"), Some(1));
        assert_eq!(a.count(&"b"), None);
    }

    #[test]
    fn test_values_are_not_normalized() {
        let mut set = BottomK::new(10);
        set.insert("Doe".to_string());
        set.insert("DOE".to_string());
        set.insert("Doe ".to_string());
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_merge_empty_identity() {
        let mut a = BottomK::new(4);
        a.insert(7u8);
        let before = a.clone();
        a.merge(&BottomK::new(4));
        assert_eq!(a, before);
    }
}
