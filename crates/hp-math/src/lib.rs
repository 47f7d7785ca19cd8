//! HL7 profiler math utilities.
//!
//! Every accumulator here forms a commutative monoid under `merge`: the
//! empty value is the identity, and any grouping or order of merges yields
//! the same value. That property is what lets partitions be profiled
//! independently and folded together afterwards.

pub mod math;

pub use math::align::{align_indel, AlignStep, Alignment};
pub use math::bottom_k::BottomK;
pub use math::histogram::CountHistogram;
pub use math::length::LengthStats;
