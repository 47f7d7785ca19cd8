//! Escape sequence handling.
//!
//! Recognised sequences map to the message's own delimiters:
//!
//! | Sequence | Meaning |
//! |---|---|
//! | `\F\` | field separator |
//! | `\S\` | component separator |
//! | `\T\` | subcomponent separator |
//! | `\R\` | repetition separator |
//! | `\E\` | escape character |
//! | `\P\` | truncation character |
//! | `\Xhh..\` | hex-encoded bytes |
//!
//! Anything else (formatting commands such as `\.br\`, highlight `\H\`,
//! unterminated sequences) is kept verbatim.

use super::Delimiters;
use std::borrow::Cow;

/// Replace escape sequences in `raw` with the characters they stand for.
pub fn unescape<'a>(raw: &'a str, delims: &Delimiters) -> Cow<'a, str> {
    let Some(esc) = delims.escape else {
        return Cow::Borrowed(raw);
    };
    if !raw.contains(esc) {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find(esc) {
        out.push_str(&rest[..start]);
        let after = &rest[start + esc.len_utf8()..];
        let Some(end) = after.find(esc) else {
            // unterminated: keep the tail as is
            out.push_str(&rest[start..]);
            return Cow::Owned(out);
        };
        let body = &after[..end];
        match resolve(body, delims) {
            Some(text) => out.push_str(&text),
            None => {
                out.push(esc);
                out.push_str(body);
                out.push(esc);
            }
        }
        rest = &after[end + esc.len_utf8()..];
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn resolve(body: &str, delims: &Delimiters) -> Option<String> {
    let single = |c: Option<char>| c.map(String::from);
    match body {
        "F" => single(Some(delims.field)),
        "S" => single(Some(delims.component)),
        "T" => single(delims.subcomponent),
        "R" => single(Some(delims.repetition)),
        "E" => single(delims.escape),
        "P" => single(delims.truncation),
        _ => {
            let hex = body.strip_prefix('X')?;
            decode_hex(hex)
        }
    }
}

fn decode_hex(hex: &str) -> Option<String> {
    if hex.is_empty() || hex.len() % 2 != 0 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let bytes: Vec<u8> = (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
        .collect::<Result<_, _>>()
        .ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Escape every delimiter character in `value` so it survives as one scalar.
///
/// Without an escape character nothing can be escaped and the value is
/// returned unchanged.
pub fn escape(value: &str, delims: &Delimiters) -> String {
    let Some(esc) = delims.escape else {
        return value.to_string();
    };
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        let code = if c == esc {
            Some("E")
        } else if c == delims.field {
            Some("F")
        } else if c == delims.component {
            Some("S")
        } else if c == delims.repetition {
            Some("R")
        } else if Some(c) == delims.subcomponent {
            Some("T")
        } else if Some(c) == delims.truncation {
            Some("P")
        } else if c == '\r' {
            Some("X0D")
        } else if c == '\n' {
            Some("X0A")
        } else {
            None
        };
        match code {
            Some(code) => {
                out.push(esc);
                out.push_str(code);
                out.push(esc);
            }
            None => out.push(c),
        }
    }
    out
}
