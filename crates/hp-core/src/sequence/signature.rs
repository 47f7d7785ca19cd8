//! Collapsed segment-order signatures.

use hp_common::SegmentCode;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// One run of same-code segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignatureElement {
    pub code: SegmentCode,
    /// The run was longer than one segment.
    pub repeated: bool,
}

/// A message's segment skeleton with consecutive repeats collapsed.
///
/// Renders as comma-separated codes with a `+` after repeated runs:
/// `MSH,PID,OBR,OBX+`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Signature(pub Vec<SignatureElement>);

impl Signature {
    /// Collapse runs of identical codes.
    pub fn from_codes<'a>(codes: impl IntoIterator<Item = &'a SegmentCode>) -> Self {
        let mut elements: Vec<SignatureElement> = Vec::new();
        for code in codes {
            match elements.last_mut() {
                Some(last) if &last.code == code => last.repeated = true,
                _ => elements.push(SignatureElement {
                    code: code.clone(),
                    repeated: false,
                }),
            }
        }
        Signature(elements)
    }

    pub fn elements(&self) -> &[SignatureElement] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_code(&self, code: &SegmentCode) -> bool {
        self.0.iter().any(|e| &e.code == code)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", e.code)?;
            if e.repeated {
                f.write_str("+")?;
            }
        }
        Ok(())
    }
}

impl FromStr for Signature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Signature::default());
        }
        s.split(',')
            .map(|part| {
                let (code, repeated) = match part.strip_suffix('+') {
                    Some(code) => (code, true),
                    None => (part, false),
                };
                SegmentCode::parse(code)
                    .map(|code| SignatureElement { code, repeated })
                    .ok_or_else(|| format!("invalid segment code in signature: {:?}", code))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Signature)
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
