//! Segment-order profiling.
//!
//! [`SequenceProfiler::observe`] counts each message's collapsed signature
//! per message type and tracks per-segment presence. Tables merge by summing
//! counts. [`generalize`] runs once on the fully merged table.

mod generalize;
mod signature;

pub use generalize::{generalize, Pattern, PatternElement};
pub use signature::{Signature, SignatureElement};

use crate::decode::Message;
use hp_common::SegmentCode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// How often one segment code appeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SegmentPresence {
    /// Messages containing the segment at least once.
    pub messages: u64,
    /// Messages where it appeared in a consecutive run.
    pub repeated: u64,
}

impl SegmentPresence {
    fn merge(&mut self, other: &SegmentPresence) {
        self.messages += other.messages;
        self.repeated += other.repeated;
    }
}

/// Signature frequencies and segment presence for one message type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SignatureTable {
    pub messages: u64,
    pub signatures: BTreeMap<Signature, u64>,
    pub segments: BTreeMap<SegmentCode, SegmentPresence>,
}

impl SignatureTable {
    pub fn observe(&mut self, msg: &Message) {
        let signature = Signature::from_codes(msg.segment_codes());
        let mut present: BTreeSet<&SegmentCode> = BTreeSet::new();
        let mut repeated: BTreeSet<&SegmentCode> = BTreeSet::new();
        for element in signature.elements() {
            present.insert(&element.code);
            if element.repeated {
                repeated.insert(&element.code);
            }
        }
        for code in present {
            let entry = self.segments.entry(code.clone()).or_default();
            entry.messages += 1;
            if repeated.contains(code) {
                entry.repeated += 1;
            }
        }
        self.messages += 1;
        *self.signatures.entry(signature).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: &SignatureTable) {
        self.messages += other.messages;
        for (sig, n) in &other.signatures {
            *self.signatures.entry(sig.clone()).or_insert(0) += n;
        }
        for (code, presence) in &other.segments {
            self.segments.entry(code.clone()).or_default().merge(presence);
        }
    }

    pub fn generalize(&self, rarity_threshold: f64) -> Vec<Pattern> {
        generalize(&self.signatures, rarity_threshold)
    }
}

/// Signature tables keyed by message type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SequenceProfiler {
    pub types: BTreeMap<String, SignatureTable>,
}

impl SequenceProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, msg: &Message) {
        self.types
            .entry(msg.message_type.clone())
            .or_default()
            .observe(msg);
    }

    pub fn merge_from(&mut self, other: &SequenceProfiler) {
        for (message_type, table) in &other.types {
            self.types
                .entry(message_type.clone())
                .or_default()
                .merge(table);
        }
    }

    pub fn merge(mut self, other: &SequenceProfiler) -> SequenceProfiler {
        self.merge_from(other);
        self
    }

    /// Every type's table folded together.
    pub fn combined(&self) -> SignatureTable {
        let mut combined = SignatureTable::default();
        for table in self.types.values() {
            combined.merge(table);
        }
        combined
    }
}
