//! Output schema versioning.

/// Version of the emitted specification shape.
///
/// Bumped whenever a field is added to or removed from the serialized
/// `Specification`; consumers compare it before reading.
pub const SPEC_SCHEMA_VERSION: &str = "1.0.0";
