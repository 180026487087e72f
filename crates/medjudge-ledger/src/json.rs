//! JSON encoding in the external grader's format.
//!
//! The grader parses history lines and answers with an encoder that writes
//! `", "` between items, `": "` after keys, and escapes every non-ASCII
//! character as `\uXXXX`. `{"a":1}` from plain `serde_json` would not match
//! text the grader compares literally, so everything the ledger or the
//! grading contract emits goes through `encode`.

use std::io;

use serde::Serialize;
use serde_json::{ser::Formatter, Serializer, Value};

/// Compact formatter with spaced separators and ASCII-only output.
#[derive(Debug, Default, Clone, Copy)]
pub struct GraderFormatter;

impl Formatter for GraderFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if ch.is_ascii() && ch != '\u{7f}' {
                continue;
            }
            writer.write_all(fragment[start..idx].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Encode `value` in the grader's JSON format.
///
/// # Panics
///
/// Panics if writing to an in-memory buffer fails, which cannot happen for a
/// `serde_json::Value`.
pub fn encode(value: &Value) -> String {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, GraderFormatter);
    value
        .serialize(&mut serializer)
        .expect("serde_json::Value must always be serializable");
    // The formatter only ever writes ASCII.
    String::from_utf8(buf).expect("grader JSON output must be valid UTF-8")
}
