//! Line protocol escaping.
//!
//! Every context scans its input once and copies it in bulk when nothing
//! needs escaping. Otherwise each special byte is prefixed with `\`. All
//! special characters are ASCII, so multi-byte UTF-8 sequences never match
//! and are copied verbatim.

use super::buffer::ByteBuffer;

/// Where in a record a string is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeContext {
    /// Measurement name: `,` and space
    Measurement,
    /// Tag keys, tag values and field keys: `,`, `=` and space
    Key,
    /// Quoted field string value: `"`
    FieldString,
}

impl EscapeContext {
    #[inline]
    fn is_special(self, byte: u8) -> bool {
        match self {
            EscapeContext::Measurement => matches!(byte, b',' | b' '),
            EscapeContext::Key => matches!(byte, b',' | b'=' | b' '),
            EscapeContext::FieldString => byte == b'"',
        }
    }
}

/// True if `s` contains a byte that must be escaped in `context`.
#[inline]
pub fn needs_escape(context: EscapeContext, s: &str) -> bool {
    s.bytes().any(|b| context.is_special(b))
}

/// Write `s` escaped for `context` into `buf`.
pub fn escape_into(context: EscapeContext, s: &str, buf: &mut ByteBuffer) {
    buf.ensure_capacity(s.len());

    if !needs_escape(context, s) {
        buf.put_slice(s.as_bytes());
        return;
    }

    for &byte in s.as_bytes() {
        if context.is_special(byte) {
            buf.put(b'\\');
        }
        buf.put(byte);
    }
}
