//! Field path identity types.
//!
//! A [`FieldPath`] names one statistic bucket across the whole corpus:
//! segment code, 1-based field index and optional component/subcomponent
//! indices. Repetition indices are never part of a path; every repetition of
//! a field lands in the same bucket.
//!
//! Paths render as dotted strings (`PID.5`, `PID.5.1`, `PID.3.4.2`) and order
//! numerically within a segment, so `PID.2 < PID.10` and `PID.5 < PID.5.1`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Three-character segment identifier (`MSH`, `PID`, `ZPD`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SegmentCode(String);

impl SegmentCode {
    /// Parse a segment code; it must be exactly three ASCII uppercase letters
    /// or digits, starting with a letter.
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 3 || !bytes[0].is_ascii_uppercase() {
            return None;
        }
        if !bytes
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            return None;
        }
        Some(SegmentCode(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the message header segment.
    pub fn is_header(&self) -> bool {
        self.0 == "MSH"
    }
}

impl fmt::Display for SegmentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SegmentCode {
    type Error = PathParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SegmentCode::parse(&value).ok_or(PathParseError::InvalidSegment(value))
    }
}

impl From<SegmentCode> for String {
    fn from(code: SegmentCode) -> Self {
        code.0
    }
}

/// Errors from parsing a dotted field path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathParseError {
    #[error("invalid segment code: {0:?}")]
    InvalidSegment(String),

    #[error("invalid index {0:?}: indices are 1-based integers")]
    InvalidIndex(String),

    #[error("field path must have 2 to 4 dotted parts, got {0}")]
    WrongDepth(usize),
}

/// Stable identity of one field position, independent of repetition index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segment: SegmentCode,
    field: u16,
    component: Option<u16>,
    subcomponent: Option<u16>,
}

impl FieldPath {
    /// Path of a whole field (`PID.5`).
    pub fn field(segment: SegmentCode, field: u16) -> Self {
        FieldPath {
            segment,
            field,
            component: None,
            subcomponent: None,
        }
    }

    /// Path of a component of this field (`PID.5` → `PID.5.2`).
    ///
    /// Any subcomponent index on `self` is discarded.
    pub fn with_component(&self, component: u16) -> Self {
        FieldPath {
            segment: self.segment.clone(),
            field: self.field,
            component: Some(component),
            subcomponent: None,
        }
    }

    /// Path of a subcomponent (`PID.3.4` → `PID.3.4.1`).
    ///
    /// Returns `None` when `self` is not a component path.
    pub fn with_subcomponent(&self, subcomponent: u16) -> Option<Self> {
        let component = self.component?;
        Some(FieldPath {
            segment: self.segment.clone(),
            field: self.field,
            component: Some(component),
            subcomponent: Some(subcomponent),
        })
    }

    pub fn segment(&self) -> &SegmentCode {
        &self.segment
    }

    pub fn field_index(&self) -> u16 {
        self.field
    }

    pub fn component_index(&self) -> Option<u16> {
        self.component
    }

    pub fn subcomponent_index(&self) -> Option<u16> {
        self.subcomponent
    }

    /// The enclosing whole-field path.
    pub fn field_path(&self) -> FieldPath {
        FieldPath::field(self.segment.clone(), self.field)
    }

    /// 1 for fields, 2 for components, 3 for subcomponents.
    pub fn depth(&self) -> u8 {
        match (self.component, self.subcomponent) {
            (None, _) => 1,
            (Some(_), None) => 2,
            (Some(_), Some(_)) => 3,
        }
    }

    /// True when `self` equals `prefix` or lies underneath it.
    ///
    /// `PID.5.1` starts with `PID.5`; `PID.50` does not.
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        if self.segment != prefix.segment || self.field != prefix.field {
            return false;
        }
        match (prefix.component, self.component) {
            (None, _) => true,
            (Some(p), Some(c)) if p == c => match (prefix.subcomponent, self.subcomponent) {
                (None, _) => true,
                (Some(p), Some(s)) => p == s,
                (Some(_), None) => false,
            },
            _ => false,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.segment, self.field)?;
        if let Some(c) = self.component {
            write!(f, ".{}", c)?;
        }
        if let Some(s) = self.subcomponent {
            write!(f, ".{}", s)?;
        }
        Ok(())
    }
}

fn parse_index(s: &str) -> Result<u16, PathParseError> {
    match s.parse::<u16>() {
        Ok(0) | Err(_) => Err(PathParseError::InvalidIndex(s.to_string())),
        Ok(n) => Ok(n),
    }
}

impl FromStr for FieldPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if !(2..=4).contains(&parts.len()) {
            return Err(PathParseError::WrongDepth(parts.len()));
        }
        let segment = SegmentCode::parse(parts[0])
            .ok_or_else(|| PathParseError::InvalidSegment(parts[0].to_string()))?;
        let field = parse_index(parts[1])?;
        let component = parts.get(2).map(|p| parse_index(p)).transpose()?;
        let subcomponent = parts.get(3).map(|p| parse_index(p)).transpose()?;
        Ok(FieldPath {
            segment,
            field,
            component,
            subcomponent,
        })
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(s: &str) -> SegmentCode {
        SegmentCode::parse(s).unwrap()
    }

    #[test]
    fn test_segment_code_validation() {
        assert!(SegmentCode::parse("PID").is_some());
        assert!(SegmentCode::parse("ZP1").is_some());
        assert!(SegmentCode::parse("pid").is_none());
        assert!(SegmentCode::parse("PI").is_none());
        assert!(SegmentCode::parse("1AB").is_none());
        assert!(SegmentCode::parse("PIDX").is_none());
    }

    #[test]
    fn test_display_and_parse() {
        let p = FieldPath::field(seg("PID"), 5).with_component(1);
        assert_eq!(p.to_string(), "PID.5.1");
        assert_eq!("PID.5.1".parse::<FieldPath>().unwrap(), p);

        let s = FieldPath::field(seg("PID"), 3)
            .with_component(4)
            .with_subcomponent(2)
            .unwrap();
        assert_eq!(s.to_string(), "PID.3.4.2");
        assert_eq!(s.depth(), 3);
    }

    #[test]
    fn test_parse_rejects_bad_paths() {
        assert!("PID".parse::<FieldPath>().is_err());
        assert!("PID.0".parse::<FieldPath>().is_err());
        assert!("PID.x".parse::<FieldPath>().is_err());
        assert!("PID.1.2.3.4".parse::<FieldPath>().is_err());
        assert!("pid.1".parse::<FieldPath>().is_err());
    }

    #[test]
    fn test_numeric_ordering() {
        let mut paths: Vec<FieldPath> = ["PID.10", "PID.2", "PID.5.1", "PID.5", "MSH.9"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        paths.sort();
        let rendered: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
        assert_eq!(rendered, vec!["MSH.9", "PID.2", "PID.5", "PID.5.1", "PID.10"]);
    }

    #[test]
    fn test_starts_with() {
        let field: FieldPath = "PID.5".parse().unwrap();
        let comp: FieldPath = "PID.5.1".parse().unwrap();
        let other: FieldPath = "PID.50".parse().unwrap();
        let sub: FieldPath = "PID.5.1.2".parse().unwrap();
        assert!(comp.starts_with(&field));
        assert!(field.starts_with(&field));
        assert!(!other.starts_with(&field));
        assert!(!field.starts_with(&comp));
        assert!(sub.starts_with(&comp));
        assert!(!"PID.5.2".parse::<FieldPath>().unwrap().starts_with(&comp));
    }

    #[test]
    fn test_serde_as_string() {
        let p: FieldPath = "OBX.5.2".parse().unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"OBX.5.2\"");
        let back: FieldPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
