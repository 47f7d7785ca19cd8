//! PHI classification for the HL7 profiler.
//!
//! This crate decides which field paths carry Protected Health Information.
//! The profiler still counts presence, lengths and types for those paths but
//! never collects their values.
//!
//! # Key Features
//!
//! - **Path rules**: a rule on `PID.5` covers `PID.5` and every component
//!   below it; a rule on `PID.3.1` also covers the enclosing `PID.3`, whose
//!   whole-field value contains the component.
//! - **Path patterns**: regexes over the dotted path (`^Z..\.` for all
//!   Z-segments).
//! - **Value detection**: values shaped like SSNs, e-mail addresses or phone
//!   numbers are withheld from any field, flagged or not.
//! - **Fail-closed**: a policy that fails to compile is an error, never an
//!   empty classifier.
//!
//! # Example
//!
//! ```
//! use hp_redact::{PhiClassifier, PhiPolicy};
//!
//! let classifier = PhiClassifier::new(&PhiPolicy::default()).unwrap();
//! let name = "PID.5.1".parse().unwrap();
//! assert!(classifier.is_phi(&name));
//! ```

pub mod category;
pub mod classify;
pub mod detect;
pub mod error;
pub mod policy;

pub use category::PhiCategory;
pub use classify::PhiClassifier;
pub use detect::ValueDetector;
pub use error::{RedactionError, Result};
pub use policy::{PathPattern, PathRule, PhiPolicy, PHI_POLICY_SCHEMA_VERSION};
