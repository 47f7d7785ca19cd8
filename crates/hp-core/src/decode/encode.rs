//! Structural re-encoder.

use super::{escape, Delimiters, Field, Message, Segment, Value};

/// Write a decoded message back out with `delims`, segments joined by `\r`.
///
/// The header's `MSH-1` and `MSH-2` are regenerated from `delims`.
pub fn encode_message(msg: &Message, delims: &Delimiters) -> String {
    msg.segments
        .iter()
        .map(|s| encode_segment(s, delims))
        .collect::<Vec<_>>()
        .join("\r")
}

pub fn encode_segment(segment: &Segment, delims: &Delimiters) -> String {
    let mut out = String::from(segment.code.as_str());
    let fields: &[Field] = if segment.code.is_header() {
        out.push(delims.field);
        out.push_str(&delims.encoding_chars());
        segment.fields.get(2..).unwrap_or(&[])
    } else {
        &segment.fields
    };
    for field in fields {
        out.push(delims.field);
        out.push_str(&encode_field(field, delims));
    }
    out
}

pub fn encode_field(field: &Field, delims: &Delimiters) -> String {
    let sep = delims.repetition.to_string();
    field
        .repetitions
        .iter()
        .map(|v| encode_value(v, delims))
        .collect::<Vec<_>>()
        .join(&sep)
}

/// Encode one repetition value.
pub fn encode_value(value: &Value, delims: &Delimiters) -> String {
    encode_at(value, delims, 0)
}

fn encode_at(value: &Value, delims: &Delimiters, depth: usize) -> String {
    match value {
        Value::Scalar(s) => escape(s, delims),
        Value::Composite(parts) => {
            let sep = if depth == 0 {
                delims.component
            } else {
                delims.subcomponent.unwrap_or(delims.component)
            };
            parts
                .iter()
                .map(|p| encode_at(p, delims, depth + 1))
                .collect::<Vec<_>>()
                .join(&sep.to_string())
        }
    }
}
