//! PHI categories.

use serde::{Deserialize, Serialize};

/// Kind of protected information a path or value carries.
///
/// Categories only label the reason for suppression; every category is
/// suppressed the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhiCategory {
    /// Person names (patient, next of kin, guarantor, alias)
    Name,
    /// Record numbers, account numbers, SSNs, licence numbers
    Identifier,
    /// Birth dates and other person-level dates
    Date,
    /// Street addresses and birth places
    Address,
    /// Phone numbers and e-mail addresses
    Contact,
    /// Anything flagged by a custom rule without a better label
    Other,
}

impl PhiCategory {
    /// Parse a category from its snake_case name.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "name" => Some(PhiCategory::Name),
            "identifier" => Some(PhiCategory::Identifier),
            "date" => Some(PhiCategory::Date),
            "address" => Some(PhiCategory::Address),
            "contact" => Some(PhiCategory::Contact),
            "other" => Some(PhiCategory::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for PhiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PhiCategory::Name => "name",
            PhiCategory::Identifier => "identifier",
            PhiCategory::Date => "date",
            PhiCategory::Address => "address",
            PhiCategory::Contact => "contact",
            PhiCategory::Other => "other",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_matches_display() {
        for c in [
            PhiCategory::Name,
            PhiCategory::Identifier,
            PhiCategory::Date,
            PhiCategory::Address,
            PhiCategory::Contact,
            PhiCategory::Other,
        ] {
            assert_eq!(PhiCategory::parse_str(&c.to_string()), Some(c));
        }
        assert_eq!(PhiCategory::parse_str("ssn"), None);
    }
}
