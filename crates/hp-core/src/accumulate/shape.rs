//! Observed value shapes and the shapes each declared type expects.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{8}$").unwrap());
static DATETIME_MINUTES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{12}([+-]\d{4})?$").unwrap());
static DATETIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{14}(\.\d{1,4})?([+-]\d{4})?$").unwrap());
static INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-+]?\d+$").unwrap());
static FLOAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?(\d+\.\d*|\.\d+)([eE][-+]?\d+)?$").unwrap());

/// Shape of one observed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Shape {
    #[serde(rename = "yyyyMMdd")]
    Date,
    #[serde(rename = "yyyyMMddHHmm")]
    DateTimeMinutes,
    #[serde(rename = "yyyyMMddHHmmss")]
    DateTime,
    #[serde(rename = "uuid")]
    Uuid,
    #[serde(rename = "int")]
    Int,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "string")]
    String,
    /// A value the record itself split into components.
    #[serde(rename = "composite")]
    Composite,
}

impl Shape {
    pub const ALL: [Shape; 9] = [
        Shape::Date,
        Shape::DateTimeMinutes,
        Shape::DateTime,
        Shape::Uuid,
        Shape::Int,
        Shape::Float,
        Shape::Boolean,
        Shape::String,
        Shape::Composite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Date => "yyyyMMdd",
            Shape::DateTimeMinutes => "yyyyMMddHHmm",
            Shape::DateTime => "yyyyMMddHHmmss",
            Shape::Uuid => "uuid",
            Shape::Int => "int",
            Shape::Float => "float",
            Shape::Boolean => "boolean",
            Shape::String => "string",
            Shape::Composite => "composite",
        }
    }

    /// Classify one scalar value. Callers skip empty values.
    pub fn classify(value: &str) -> Shape {
        let v = value.trim();
        if DATE.is_match(v) {
            Shape::Date
        } else if DATETIME.is_match(v) {
            Shape::DateTime
        } else if DATETIME_MINUTES.is_match(v) {
            Shape::DateTimeMinutes
        } else if INT.is_match(v) {
            Shape::Int
        } else if uuid::Uuid::parse_str(v).is_ok() {
            Shape::Uuid
        } else if FLOAT.is_match(v) {
            Shape::Float
        } else if matches!(
            v.to_ascii_lowercase().as_str(),
            "true" | "false" | "y" | "n"
        ) {
            Shape::Boolean
        } else {
            Shape::String
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Shape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Shape::ALL
            .into_iter()
            .find(|shape| shape.as_str() == s)
            .ok_or_else(|| format!("unknown shape: {}", s))
    }
}

/// Shapes a declared scalar type accepts; `None` means any shape.
pub fn expected_shapes(data_type: &str) -> Option<&'static [Shape]> {
    match data_type {
        "NM" => Some(&[Shape::Int, Shape::Float]),
        "SI" => Some(&[Shape::Int]),
        "DT" => Some(&[Shape::Date]),
        "DTM" | "TS" => Some(&[Shape::Date, Shape::DateTimeMinutes, Shape::DateTime]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_dates() {
        assert_eq!(Shape::classify("19800101"), Shape::Date);
        assert_eq!(Shape::classify("202401011230"), Shape::DateTimeMinutes);
        assert_eq!(Shape::classify("20240101123045"), Shape::DateTime);
        assert_eq!(Shape::classify("20240101123045.12-0500"), Shape::DateTime);
    }

    #[test]
    fn test_classify_numbers_and_words() {
        assert_eq!(Shape::classify("42"), Shape::Int);
        assert_eq!(Shape::classify("-7"), Shape::Int);
        assert_eq!(Shape::classify("3.14"), Shape::Float);
        assert_eq!(Shape::classify(".5"), Shape::Float);
        assert_eq!(Shape::classify("Y"), Shape::Boolean);
        assert_eq!(Shape::classify("false"), Shape::Boolean);
        assert_eq!(Shape::classify("Doe"), Shape::String);
        assert_eq!(
            Shape::classify("550e8400-e29b-41d4-a716-446655440000"),
            Shape::Uuid
        );
    }

    #[test]
    fn test_expected_shapes() {
        assert!(expected_shapes("NM").unwrap().contains(&Shape::Float));
        assert!(!expected_shapes("SI").unwrap().contains(&Shape::String));
        assert!(expected_shapes("ST").is_none());
        assert!(expected_shapes("XPN").is_none());
    }

    #[test]
    fn test_shape_names_roundtrip() {
        for shape in Shape::ALL {
            assert_eq!(shape.as_str().parse::<Shape>().unwrap(), shape);
        }
    }
}
