//! HL7 v2 record decoder.
//!
//! Turns one raw record into a tree of segments, fields, repetitions,
//! components and subcomponents. Delimiters always come from the record's own
//! header; nothing is hard-coded beyond the `MSH` segment name.
//!
//! A value splits into components (and a component into subcomponents) only
//! where the raw text carries that level's separator, and never when the
//! static schema declares a scalar type for it. `Doe^John` is two components
//! but `SYS` stays a scalar even though its declared type is composite.
//! Fields the schema does not describe follow the separators alone.

mod encode;
mod escape;

pub use encode::{encode_field, encode_message, encode_segment, encode_value};
pub use escape::{escape, unescape};

use hp_common::{DecodeError, DecodeErrorKind, SegmentCode};
use hp_config::SchemaTables;
use serde::Serialize;

/// Message type reported when the header carries none.
pub const UNKNOWN_MESSAGE_TYPE: &str = "UNKNOWN";

/// 1-based index of the message type field in the header.
const MESSAGE_TYPE_FIELD: usize = 9;

/// The delimiter set a record declares in its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Delimiters {
    pub field: char,
    pub component: char,
    pub repetition: char,
    pub escape: Option<char>,
    pub subcomponent: Option<char>,
    pub truncation: Option<char>,
}

impl Default for Delimiters {
    /// `|^~\&`
    fn default() -> Self {
        Delimiters {
            field: '|',
            component: '^',
            repetition: '~',
            escape: Some('\\'),
            subcomponent: Some('&'),
            truncation: None,
        }
    }
}

impl Delimiters {
    /// Read the delimiters from a header segment line.
    ///
    /// Returns them with the verbatim encoding characters text.
    pub fn from_header(line: &str) -> Result<(Delimiters, &str), DecodeError> {
        let rest = line.strip_prefix("MSH").ok_or_else(|| {
            DecodeError::new(DecodeErrorKind::MissingHeader, "segment is not a header")
        })?;
        let field = rest.chars().next().ok_or_else(|| {
            DecodeError::new(DecodeErrorKind::TruncatedHeader, "header has no field separator")
        })?;
        if !usable_delimiter(field) {
            return Err(DecodeError::new(
                DecodeErrorKind::DelimiterConflict,
                "field separator is alphanumeric or whitespace",
            ));
        }

        let after = &rest[field.len_utf8()..];
        let encoding = after.split(field).next().unwrap_or("");
        let chars: Vec<char> = encoding.chars().collect();
        if !(2..=5).contains(&chars.len()) {
            return Err(DecodeError::new(
                DecodeErrorKind::InvalidEncodingCharacters,
                format!("expected 2 to 5 encoding characters, found {}", chars.len()),
            ));
        }

        let mut seen = vec![field];
        for &c in &chars {
            if !usable_delimiter(c) {
                return Err(DecodeError::new(
                    DecodeErrorKind::DelimiterConflict,
                    "encoding character is alphanumeric or whitespace",
                ));
            }
            if seen.contains(&c) {
                return Err(DecodeError::new(
                    DecodeErrorKind::DelimiterConflict,
                    format!("delimiter {:?} is used twice", c),
                ));
            }
            seen.push(c);
        }

        let delims = Delimiters {
            field,
            component: chars[0],
            repetition: chars[1],
            escape: chars.get(2).copied(),
            subcomponent: chars.get(3).copied(),
            truncation: chars.get(4).copied(),
        };
        Ok((delims, encoding))
    }

    /// The encoding characters field as it would be written in a header.
    pub fn encoding_chars(&self) -> String {
        let mut s = String::with_capacity(5);
        s.push(self.component);
        s.push(self.repetition);
        for c in [self.escape, self.subcomponent, self.truncation]
            .into_iter()
            .map_while(|c| c)
        {
            s.push(c);
        }
        s
    }
}

fn usable_delimiter(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace()
}

/// A decoded value: either text or an ordered list of parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(String),
    Composite(Vec<Value>),
}

impl Value {
    /// True when no text is present at any depth.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Scalar(s) => s.is_empty(),
            Value::Composite(parts) => parts.iter().all(Value::is_empty),
        }
    }

    /// Character length of the text, summed over parts for composites.
    pub fn text_len(&self) -> u64 {
        match self {
            Value::Scalar(s) => s.chars().count() as u64,
            Value::Composite(parts) => parts.iter().map(Value::text_len).sum(),
        }
    }

    /// Part at 1-based `index`; `None` for scalars.
    pub fn part(&self, index: usize) -> Option<&Value> {
        match self {
            Value::Scalar(_) => None,
            Value::Composite(parts) => index.checked_sub(1).and_then(|i| parts.get(i)),
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            Value::Composite(_) => None,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Value::Composite(_))
    }
}

/// One field occurrence with its repetitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub repetitions: Vec<Value>,
}

impl Field {
    pub fn scalar(text: impl Into<String>) -> Self {
        Field {
            repetitions: vec![Value::Scalar(text.into())],
        }
    }

    /// Number of repetitions carrying any text.
    pub fn non_empty_repetitions(&self) -> usize {
        self.repetitions.iter().filter(|v| !v.is_empty()).count()
    }

    pub fn is_present(&self) -> bool {
        self.non_empty_repetitions() > 0
    }
}

/// One segment of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub code: SegmentCode,
    /// 0-based count of earlier segments with the same code.
    pub occurrence: u32,
    /// `fields[0]` is field 1.
    pub fields: Vec<Field>,
}

impl Segment {
    /// Field at 1-based `index`.
    pub fn field(&self, index: usize) -> Option<&Field> {
        index.checked_sub(1).and_then(|i| self.fields.get(i))
    }
}

/// A decoded record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// `MSH-9` components joined with `^`, or [`UNKNOWN_MESSAGE_TYPE`].
    pub message_type: String,
    pub delimiters: Delimiters,
    pub segments: Vec<Segment>,
    /// Lines whose name is not a valid segment code.
    #[serde(skip_serializing_if = "is_zero")]
    pub skipped_lines: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl Message {
    pub fn segment_codes(&self) -> impl Iterator<Item = &SegmentCode> + '_ {
        self.segments.iter().map(|s| &s.code)
    }
}

/// Decode one raw record.
///
/// `\r`, `\n` and `\r\n` all terminate segments; blank lines are ignored.
pub fn decode(raw: &str, tables: &SchemaTables) -> Result<Message, DecodeError> {
    let mut lines = raw
        .trim()
        .split(['\r', '\n'])
        .filter(|line| !line.trim().is_empty());

    let Some(header) = lines.next() else {
        return Err(DecodeError::new(DecodeErrorKind::Empty, "record is empty"));
    };
    if !header.starts_with("MSH") {
        let detail = match header.get(..3).and_then(SegmentCode::parse) {
            Some(code) => format!("first segment is {}", code),
            None => "first segment is not a header".to_string(),
        };
        return Err(DecodeError::new(DecodeErrorKind::MissingHeader, detail));
    }

    let (delimiters, _) = Delimiters::from_header(header)?;
    let decoder = SegmentDecoder {
        delims: &delimiters,
        tables,
    };

    let mut segments: Vec<Segment> = Vec::new();
    let mut skipped_lines = 0;
    for line in std::iter::once(header).chain(lines) {
        let name = line.split(delimiters.field).next().unwrap_or("");
        let Some(code) = SegmentCode::parse(name) else {
            skipped_lines += 1;
            continue;
        };
        let occurrence = segments.iter().filter(|s| s.code == code).count() as u32;
        let fields = decoder.fields(&code, &line[name.len()..]);
        segments.push(Segment {
            code,
            occurrence,
            fields,
        });
    }

    let message_type = message_type(header, &delimiters);
    Ok(Message {
        message_type,
        delimiters,
        segments,
        skipped_lines,
    })
}

struct SegmentDecoder<'a> {
    delims: &'a Delimiters,
    tables: &'a SchemaTables,
}

#[derive(Clone, Copy)]
enum Depth {
    Component,
    Subcomponent,
}

impl SegmentDecoder<'_> {
    /// Decode the text following the segment name.
    fn fields(&self, code: &SegmentCode, body: &str) -> Vec<Field> {
        let sep = self.delims.field;
        let Some(body) = body.strip_prefix(sep) else {
            return Vec::new();
        };

        if code.is_header() {
            // MSH-1 is the separator itself and MSH-2 is never split.
            let mut parts = body.splitn(2, sep);
            let encoding = parts.next().unwrap_or("");
            let mut fields = vec![Field::scalar(sep), Field::scalar(encoding)];
            if let Some(rest) = parts.next() {
                fields.extend(
                    rest.split(sep)
                        .enumerate()
                        .map(|(i, raw)| self.field(code, i + 3, raw)),
                );
            }
            return fields;
        }

        body.split(sep)
            .enumerate()
            .map(|(i, raw)| self.field(code, i + 1, raw))
            .collect()
    }

    fn field(&self, code: &SegmentCode, index: usize, raw: &str) -> Field {
        let declared = u16::try_from(index)
            .ok()
            .and_then(|i| self.tables.field_def(code.as_str(), i))
            .map(|def| def.field_type.as_str());
        let repetitions = raw
            .split(self.delims.repetition)
            .map(|rep| self.value(rep, declared, Depth::Component))
            .collect();
        Field { repetitions }
    }

    fn value(&self, raw: &str, data_type: Option<&str>, depth: Depth) -> Value {
        let sep = match depth {
            Depth::Component => Some(self.delims.component),
            Depth::Subcomponent => self.delims.subcomponent,
        };
        // Declared scalars never split; anything else splits only where
        // this level's separator occurs.
        let splittable = data_type.map_or(true, |t| self.tables.is_composite(t));
        let Some(sep) = sep.filter(|s| splittable && raw.contains(*s)) else {
            return Value::Scalar(unescape(raw, self.delims).into_owned());
        };

        let parts = raw
            .split(sep)
            .enumerate()
            .map(|(i, part)| {
                let part_type = data_type.and_then(|t| {
                    u16::try_from(i + 1)
                        .ok()
                        .and_then(|idx| self.tables.component_type(t, idx))
                });
                match depth {
                    Depth::Component => self.value(part, part_type, Depth::Subcomponent),
                    Depth::Subcomponent => {
                        Value::Scalar(unescape(part, self.delims).into_owned())
                    }
                }
            })
            .collect();
        Value::Composite(parts)
    }
}

/// `MSH-9` read from the raw header, independent of the schema tables.
fn message_type(header: &str, delims: &Delimiters) -> String {
    // header fields: [MSH, MSH-2, MSH-3, ...]; MSH-n sits at index n - 1
    let raw = header
        .split(delims.field)
        .nth(MESSAGE_TYPE_FIELD - 1)
        .unwrap_or("");
    let first = raw.split(delims.repetition).next().unwrap_or("");
    let mut parts: Vec<String> = first
        .split(delims.component)
        .map(|c| unescape(c, delims).trim().to_string())
        .collect();
    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    if parts.is_empty() {
        UNKNOWN_MESSAGE_TYPE.to_string()
    } else {
        parts.join("^")
    }
}
