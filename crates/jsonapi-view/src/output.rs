//! JSON text output
//!
//! serde_json never escapes `<`, `>`, `&` or `'`, and always writes `"` as
//! `\"`. `EscapingFormatter` wraps the compact or pretty formatter and
//! rewrites those characters as `\uXXXX` sequences according to `JsonFlags`.

use crate::error::ViewError;
use crate::options::JsonFlags;
use serde::Serialize;
use serde_json::ser::{CharEscape, CompactFormatter, Formatter, PrettyFormatter, Serializer};
use std::io;

const INDENT: &[u8] = b"    ";

/// Serialize `value` to a string honouring `flags`.
pub fn to_string<T: Serialize + ?Sized>(value: &T, flags: JsonFlags) -> Result<String, ViewError> {
    let mut buf = Vec::with_capacity(256);

    if flags.contains(JsonFlags::PRETTY_PRINT) {
        let formatter = EscapingFormatter::new(PrettyFormatter::with_indent(INDENT), flags);
        let mut ser = Serializer::with_formatter(&mut buf, formatter);
        value.serialize(&mut ser)?;
    } else {
        let formatter = EscapingFormatter::new(CompactFormatter, flags);
        let mut ser = Serializer::with_formatter(&mut buf, formatter);
        value.serialize(&mut ser)?;
    }

    String::from_utf8(buf).map_err(|e| ViewError::serialization_untyped(e.to_string()))
}

/// Formatter applying the `HEX_*` flags on top of another formatter.
pub struct EscapingFormatter<F> {
    inner: F,
    flags: JsonFlags,
}

impl<F> EscapingFormatter<F> {
    pub fn new(inner: F, flags: JsonFlags) -> Self {
        Self { inner, flags }
    }

    fn escapes(&self, c: char) -> bool {
        match c {
            '<' | '>' => self.flags.contains(JsonFlags::HEX_TAG),
            '&' => self.flags.contains(JsonFlags::HEX_AMP),
            '\'' => self.flags.contains(JsonFlags::HEX_APOS),
            _ => false,
        }
    }
}

fn write_unicode_escape<W: ?Sized + io::Write>(writer: &mut W, c: char) -> io::Result<()> {
    write!(writer, "\\u{:04X}", c as u32)
}

impl<F: Formatter> Formatter for EscapingFormatter<F> {
    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            if self.escapes(c) {
                if start < i {
                    self.inner.write_string_fragment(writer, &fragment[start..i])?;
                }
                write_unicode_escape(writer, c)?;
                start = i + c.len_utf8();
            }
        }
        if start < fragment.len() {
            self.inner.write_string_fragment(writer, &fragment[start..])?;
        }
        Ok(())
    }

    fn write_char_escape<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        char_escape: CharEscape,
    ) -> io::Result<()> {
        match char_escape {
            CharEscape::Quote if self.flags.contains(JsonFlags::HEX_QUOT) => {
                write_unicode_escape(writer, '"')
            }
            other => self.inner.write_char_escape(writer, other),
        }
    }

    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_object_key(writer, first)
    }

    fn end_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_key(writer)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_value(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_flags_escape_markup() {
        let value = json!({ "html": "<b>\"Tom\" & 'Jerry'</b>" });
        let out = to_string(&value, JsonFlags::default()).unwrap();

        assert_eq!(
            out,
            r#"{"html":"\u003Cb\u003E\u0022Tom\u0022 \u0026 \u0027Jerry\u0027\u003C/b\u003E"}"#
        );
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn test_no_flags_is_plain_serde_json() {
        let value = json!({ "html": "<b>\"x\" & 'y'</b>", "n": [1, 2] });
        let out = to_string(&value, JsonFlags::empty()).unwrap();
        assert_eq!(out, serde_json::to_string(&value).unwrap());
    }

    #[test]
    fn test_single_flag() {
        let value = json!("a&b<c");
        let out = to_string(&value, JsonFlags::HEX_AMP).unwrap();
        assert_eq!(out, r#""a\u0026b<c""#);
    }

    #[test]
    fn test_pretty_print_round_trips() {
        let value = json!({ "data": { "type": "articles", "id": "1" }, "meta": { "total": 5 } });

        let compact = to_string(&value, JsonFlags::default()).unwrap();
        let pretty = to_string(&value, JsonFlags::default() | JsonFlags::PRETTY_PRINT).unwrap();

        assert!(!compact.contains('\n'));
        assert!(pretty.contains("\n    \"data\": {"));
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&compact).unwrap(),
            serde_json::from_str::<serde_json::Value>(&pretty).unwrap()
        );
    }

    #[test]
    fn test_keys_are_escaped_too() {
        let value = json!({ "a<b": 1 });
        let out = to_string(&value, JsonFlags::HEX_TAG).unwrap();
        assert_eq!(out, r#"{"a\u003Cb":1}"#);
    }
}
