//! Static HL7 schema tables.
//!
//! Three read-only lookups consumed by the decoder and the specification
//! builder:
//!
//! - segment code → description (`hl7_segments.json`)
//! - `"SEG.N"` → field name and declared data type (`hl7_fields.json`)
//! - data type → component layout (`hl7_datatypes.json`); a type with a
//!   component table is composite, every other type is scalar
//!
//! Tables are immutable once built and shared by reference across workers.

use std::collections::BTreeMap;
use std::path::Path;

use hp_common::FieldPath;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::builtin;
use crate::validate::{ValidationError, ValidationResult};

pub const SEGMENTS_FILE: &str = "hl7_segments.json";
pub const FIELDS_FILE: &str = "hl7_fields.json";
pub const DATATYPES_FILE: &str = "hl7_datatypes.json";

/// Description of a schema gap in field descriptions.
pub const UNKNOWN_FIELD: &str = "Unknown field";

/// One field of a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub field_name: String,
    pub field_type: String,
}

/// One component of a composite data type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDef {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

/// Component layout of a composite data type, keyed by 1-based position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTypeDef {
    components: BTreeMap<u16, ComponentDef>,
}

impl DataTypeDef {
    pub fn component(&self, index: u16) -> Option<&ComponentDef> {
        self.components.get(&index)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &ComponentDef)> + '_ {
        self.components.iter().map(|(i, c)| (*i, c))
    }
}

/// Segment entries may be a bare description or an object carrying one.
#[derive(Deserialize)]
#[serde(untagged)]
enum SegmentEntry {
    Description(String),
    Object {
        #[serde(alias = "name")]
        description: String,
    },
}

/// Immutable schema lookup tables.
#[derive(Debug, Clone)]
pub struct SchemaTables {
    segments: BTreeMap<String, String>,
    fields: BTreeMap<(String, u16), FieldDef>,
    datatypes: BTreeMap<String, DataTypeDef>,
    fingerprint: String,
}

impl SchemaTables {
    /// The built-in HL7 v2 subset.
    pub fn builtin() -> Self {
        let segments = builtin::SEGMENTS
            .iter()
            .map(|(code, desc)| (code.to_string(), desc.to_string()))
            .collect();

        let mut fields = BTreeMap::new();
        for (segment, defs) in builtin::FIELDS {
            for (i, (name, ty)) in defs.iter().enumerate() {
                fields.insert(
                    (segment.to_string(), i as u16 + 1),
                    FieldDef {
                        field_name: name.to_string(),
                        field_type: ty.to_string(),
                    },
                );
            }
        }

        let mut datatypes = BTreeMap::new();
        for (ty, components) in builtin::DATATYPES {
            let components = components
                .iter()
                .enumerate()
                .map(|(i, (name, sub))| {
                    (
                        i as u16 + 1,
                        ComponentDef {
                            name: name.to_string(),
                            data_type: Some(sub.to_string()),
                        },
                    )
                })
                .collect();
            datatypes.insert(ty.to_string(), DataTypeDef { components });
        }

        Self::assemble(segments, fields, datatypes)
    }

    /// Load the three table files from `dir`.
    pub fn load_dir(dir: &Path) -> ValidationResult<Self> {
        let read = |name: &str| {
            let path = dir.join(name);
            std::fs::read_to_string(&path).map_err(|e| {
                ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
            })
        };
        Self::from_json_strs(
            &read(SEGMENTS_FILE)?,
            &read(FIELDS_FILE)?,
            &read(DATATYPES_FILE)?,
        )
    }

    /// Parse tables from the JSON text of the three files.
    pub fn from_json_strs(
        segments_json: &str,
        fields_json: &str,
        datatypes_json: &str,
    ) -> ValidationResult<Self> {
        let raw_segments: BTreeMap<String, SegmentEntry> = parse(SEGMENTS_FILE, segments_json)?;
        let raw_fields: BTreeMap<String, FieldDef> = parse(FIELDS_FILE, fields_json)?;
        let raw_types: BTreeMap<String, BTreeMap<String, ComponentDef>> =
            parse(DATATYPES_FILE, datatypes_json)?;

        let segments = raw_segments
            .into_iter()
            .map(|(code, entry)| {
                let desc = match entry {
                    SegmentEntry::Description(d) | SegmentEntry::Object { description: d } => d,
                };
                (code, desc)
            })
            .collect();

        let mut fields = BTreeMap::new();
        for (key, def) in raw_fields {
            let (segment, index) = key
                .split_once('.')
                .and_then(|(s, i)| Some((s.to_string(), parse_index(i)?)))
                .ok_or_else(|| {
                    ValidationError::SchemaError(format!(
                        "{}: key {:?} is not SEG.N",
                        FIELDS_FILE, key
                    ))
                })?;
            fields.insert((segment, index), def);
        }

        let mut datatypes = BTreeMap::new();
        for (ty, raw) in raw_types {
            let mut components = BTreeMap::new();
            for (key, def) in raw {
                let index = parse_index(&key).ok_or_else(|| {
                    ValidationError::SchemaError(format!(
                        "{}: {} has non-numeric component key {:?}",
                        DATATYPES_FILE, ty, key
                    ))
                })?;
                components.insert(index, def);
            }
            datatypes.insert(ty, DataTypeDef { components });
        }

        Ok(Self::assemble(segments, fields, datatypes))
    }

    fn assemble(
        segments: BTreeMap<String, String>,
        fields: BTreeMap<(String, u16), FieldDef>,
        datatypes: BTreeMap<String, DataTypeDef>,
    ) -> Self {
        let mut tables = Self {
            segments,
            fields,
            datatypes,
            fingerprint: String::new(),
        };
        tables.fingerprint = tables.compute_fingerprint();
        tables
    }

    /// Description of a segment code.
    pub fn segment_description(&self, code: &str) -> Option<&str> {
        self.segments.get(code).map(String::as_str)
    }

    pub fn field_def(&self, segment: &str, field: u16) -> Option<&FieldDef> {
        self.fields.get(&(segment.to_string(), field))
    }

    /// Component table of a composite type; `None` for scalar types.
    pub fn datatype(&self, data_type: &str) -> Option<&DataTypeDef> {
        self.datatypes.get(data_type).filter(|d| !d.is_empty())
    }

    pub fn is_composite(&self, data_type: &str) -> bool {
        self.datatype(data_type).is_some()
    }

    /// Declared type of the component at `index` within `data_type`.
    pub fn component_type(&self, data_type: &str, index: u16) -> Option<&str> {
        self.datatype(data_type)?
            .component(index)?
            .data_type
            .as_deref()
    }

    /// Declared data type at any depth of a field path.
    ///
    /// `None` for schema gaps and for components whose table entry carries
    /// no type.
    pub fn declared_type(&self, path: &FieldPath) -> Option<&str> {
        let field_type = self
            .field_def(path.segment().as_str(), path.field_index())?
            .field_type
            .as_str();
        let Some(component) = path.component_index() else {
            return Some(field_type);
        };
        let component_type = self.component_type(field_type, component)?;
        match path.subcomponent_index() {
            None => Some(component_type),
            Some(sub) => self.component_type(component_type, sub),
        }
    }

    /// True when every level of `path` is described by the tables.
    pub fn knows(&self, path: &FieldPath) -> bool {
        let Some(def) = self.field_def(path.segment().as_str(), path.field_index()) else {
            return false;
        };
        let Some(component) = path.component_index() else {
            return true;
        };
        let Some(component_def) = self
            .datatype(&def.field_type)
            .and_then(|d| d.component(component))
        else {
            return false;
        };
        match path.subcomponent_index() {
            None => true,
            Some(sub) => component_def
                .data_type
                .as_deref()
                .and_then(|t| self.datatype(t))
                .is_some_and(|d| d.component(sub).is_some()),
        }
    }

    /// Human-readable description, e.g. `"Patient Name - Family Name"`.
    pub fn describe(&self, path: &FieldPath) -> String {
        let Some(def) = self.field_def(path.segment().as_str(), path.field_index()) else {
            return UNKNOWN_FIELD.to_string();
        };
        let mut parts = vec![def.field_name.clone()];
        let mut current_type = Some(def.field_type.as_str());
        for index in [path.component_index(), path.subcomponent_index()]
            .into_iter()
            .flatten()
        {
            let component = current_type
                .and_then(|t| self.datatype(t))
                .and_then(|d| d.component(index));
            match component {
                Some(c) => {
                    parts.push(c.name.clone());
                    current_type = c.data_type.as_deref();
                }
                None => {
                    parts.push(format!("Component {}", index));
                    current_type = None;
                }
            }
        }
        parts.join(" - ")
    }

    /// SHA-256 over the canonical JSON form of all three tables.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    fn compute_fingerprint(&self) -> String {
        let fields: BTreeMap<String, &FieldDef> = self
            .fields
            .iter()
            .map(|((seg, idx), def)| (format!("{}.{:04}", seg, idx), def))
            .collect();
        let datatypes: BTreeMap<&str, BTreeMap<u16, &ComponentDef>> = self
            .datatypes
            .iter()
            .map(|(ty, def)| (ty.as_str(), def.components.iter().map(|(i, c)| (*i, c)).collect()))
            .collect();
        let canonical = serde_json::json!({
            "segments": self.segments,
            "fields": fields,
            "datatypes": datatypes,
        });
        let mut hasher = Sha256::new();
        hasher.update(canonical.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn datatype_count(&self) -> usize {
        self.datatypes.len()
    }
}

impl Default for SchemaTables {
    fn default() -> Self {
        Self::builtin()
    }
}

fn parse<T: serde::de::DeserializeOwned>(file: &str, json: &str) -> ValidationResult<T> {
    serde_json::from_str(json)
        .map_err(|e| ValidationError::ParseError(format!("{}: invalid JSON: {}", file, e)))
}

fn parse_index(s: &str) -> Option<u16> {
    s.parse::<u16>().ok().filter(|i| *i >= 1)
}
