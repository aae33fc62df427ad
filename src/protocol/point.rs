//! The reusable record builder.
//!
//! A [`Point`] encodes one line protocol record into two segments:
//!
//! - the tag segment holds the escaped measurement and, at serialize time,
//!   the sorted `,key=value` tag pairs
//! - the field segment starts with a single space and receives each field
//!   as soon as it is added, in call order, followed by the timestamp at
//!   serialize time
//!
//! Writing a record is a copy of the two segments into the sink. Nothing is
//! freed on [`Point::reset`], so a pooled point reaches a steady state where
//! encoding allocates nothing.

use super::buffer::ByteBuffer;
use super::escape::{escape_into, EscapeContext};
use super::sort::sort_by_key;
use super::time::TimeUnit;
use crate::core::{LineError, Result};
use std::io::Write;

/// Initial size in bytes of each segment buffer
pub const DEFAULT_BUFFER_SIZE: usize = 128;

/// Worst case for ` <timestamp>`: a space, a sign and 19 digits
const TIMESTAMP_MAX_LEN: usize = 21;

const TRUE_BYTES: &[u8] = b"=t";
const FALSE_BYTES: &[u8] = b"=f";

/// A field value the encoder knows how to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    /// Written double quoted, with `"` escaped
    String(&'a str),
    /// Written in decimal with a trailing `i`
    Integer(i64),
    /// Written as `t` or `f`
    Boolean(bool),
}

impl<'a> From<&'a str> for FieldValue<'a> {
    fn from(value: &'a str) -> Self {
        FieldValue::String(value)
    }
}

impl<'a> From<&'a String> for FieldValue<'a> {
    fn from(value: &'a String) -> Self {
        FieldValue::String(value.as_str())
    }
}

impl From<bool> for FieldValue<'_> {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

macro_rules! integer_field_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FieldValue<'_> {
                fn from(value: $ty) -> Self {
                    FieldValue::Integer(i64::from(value))
                }
            }
        )*
    };
}

integer_field_value!(i8, i16, i32, i64, u8, u16, u32);

/// Byte offsets of one tag inside the shared tag string.
#[derive(Debug, Clone, Copy)]
struct TagSpan {
    key_start: usize,
    key_end: usize,
    value_end: usize,
}

/// Mutable, reusable line protocol record builder.
#[derive(Debug)]
pub struct Point {
    /// Pool slot this instance was created for
    slot: usize,
    tags_buf: ByteBuffer,
    fields_buf: ByteBuffer,
    /// Bytes of `tags_buf` taken by the escaped measurement
    measurement_len: usize,
    /// Raw tag keys and values back to back, in insertion order
    tag_data: String,
    tags: Vec<TagSpan>,
    /// Scratch permutation for sorting tags
    order: Vec<usize>,
    timestamp: Option<i64>,
    has_field: bool,
}

impl Point {
    /// Create a standalone point whose segments start at `initial_buffer_size` bytes.
    pub fn new(initial_buffer_size: usize) -> Self {
        Self::with_slot(0, initial_buffer_size)
    }

    pub(crate) fn with_slot(slot: usize, initial_buffer_size: usize) -> Self {
        let mut fields_buf = ByteBuffer::with_capacity(initial_buffer_size);
        fields_buf.put(b' ');

        Self {
            slot,
            tags_buf: ByteBuffer::with_capacity(initial_buffer_size),
            fields_buf,
            measurement_len: 0,
            tag_data: String::new(),
            tags: Vec::new(),
            order: Vec::new(),
            timestamp: None,
            has_field: false,
        }
    }

    /// Pool slot this instance belongs to; stable across acquire/release.
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Set the measurement name, replacing any previous one.
    pub fn measurement(&mut self, name: &str) -> &mut Self {
        self.tags_buf.clear();
        escape_into(EscapeContext::Measurement, name, &mut self.tags_buf);
        self.measurement_len = self.tags_buf.len();
        self
    }

    /// Add a tag. Tags are kept as given and sorted by key when serialized.
    pub fn tag(&mut self, key: &str, value: &str) -> &mut Self {
        let key_start = self.tag_data.len();
        self.tag_data.push_str(key);
        let key_end = self.tag_data.len();
        self.tag_data.push_str(value);

        self.tags.push(TagSpan {
            key_start,
            key_end,
            value_end: self.tag_data.len(),
        });
        self
    }

    /// Add a field. Fields are encoded immediately, in call order.
    pub fn field<'v, V>(&mut self, key: &str, value: V) -> &mut Self
    where
        V: Into<FieldValue<'v>>,
    {
        self.begin_field(key);

        match value.into() {
            FieldValue::String(s) => {
                self.fields_buf.put(b'=');
                self.fields_buf.put(b'"');
                escape_into(EscapeContext::FieldString, s, &mut self.fields_buf);
                self.fields_buf.put(b'"');
            },
            FieldValue::Integer(i) => {
                self.fields_buf.put(b'=');
                self.fields_buf.put_i64(i);
                self.fields_buf.put(b'i');
            },
            FieldValue::Boolean(b) => {
                self.fields_buf
                    .put_slice(if b { TRUE_BYTES } else { FALSE_BYTES });
            },
        }
        self
    }

    /// Set the timestamp; the last call wins.
    pub fn timestamp(&mut self, value: i64, unit: TimeUnit) -> &mut Self {
        self.timestamp = Some(unit.to_nanos(value));
        self
    }

    /// True once at least one field has been added
    #[inline]
    pub fn has_field(&self) -> bool {
        self.has_field
    }

    /// Number of tags added so far
    #[inline]
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// Timestamp in nanoseconds, if set
    #[inline]
    pub fn timestamp_nanos(&self) -> Option<i64> {
        self.timestamp
    }

    /// Serialize the record into `sink`. No line terminator is written.
    ///
    /// Fails with [`LineError::InvalidState`] when the measurement is missing
    /// or no field was added. Sink errors are returned as [`LineError::Io`].
    /// Serializing again without changes produces the same bytes.
    pub fn write_to<W>(&mut self, sink: &mut W) -> Result<()>
    where
        W: Write + ?Sized,
    {
        if self.measurement_len == 0 {
            return Err(LineError::invalid_state("Point must have a measurement"));
        }
        if !self.has_field {
            return Err(LineError::invalid_state("Point must have at least one field"));
        }

        self.tags_buf.truncate(self.measurement_len);
        if !self.tags.is_empty() {
            self.serialize_tags();
        }

        let fields_len = self.fields_buf.len();
        if let Some(timestamp) = self.timestamp {
            self.fields_buf.ensure_capacity(TIMESTAMP_MAX_LEN);
            self.fields_buf.put(b' ');
            self.fields_buf.put_i64(timestamp);
        }

        let written = sink
            .write_all(self.tags_buf.as_bytes())
            .and_then(|()| sink.write_all(self.fields_buf.as_bytes()));

        self.fields_buf.truncate(fields_len);
        written.map_err(LineError::from)
    }

    /// Serialize into a fresh byte vector.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.tags_buf.len() + self.fields_buf.len() + 64);
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Return to the empty state, keeping all allocated memory.
    pub fn reset(&mut self) {
        self.tags_buf.clear();
        self.fields_buf.clear();
        self.fields_buf.put(b' ');
        self.measurement_len = 0;
        self.tag_data.clear();
        self.tags.clear();
        self.order.clear();
        self.timestamp = None;
        self.has_field = false;
    }

    fn begin_field(&mut self, key: &str) {
        self.fields_buf.ensure_capacity(key.len() + 1);
        if self.has_field {
            self.fields_buf.put(b',');
        }
        self.has_field = true;
        escape_into(EscapeContext::Key, key, &mut self.fields_buf);
    }

    fn serialize_tags(&mut self) {
        let data = self.tag_data.as_str();
        let tags = &self.tags;
        sort_by_key(&mut self.order, tags.len(), |i| {
            &data[tags[i].key_start..tags[i].key_end]
        });

        for &index in &self.order {
            let tag = tags[index];
            self.tags_buf.put(b',');
            escape_into(
                EscapeContext::Key,
                &data[tag.key_start..tag.key_end],
                &mut self.tags_buf,
            );
            self.tags_buf.put(b'=');
            escape_into(
                EscapeContext::Key,
                &data[tag.key_end..tag.value_end],
                &mut self.tags_buf,
            );
        }
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(point: &mut Point) -> String {
        String::from_utf8(point.to_bytes().unwrap()).unwrap()
    }

    #[test]
    fn test_fields_only() {
        let mut point = Point::default();
        point.measurement("testMeasurement").field("boolean", true);
        assert_eq!(line(&mut point), "testMeasurement boolean=t");
    }

    #[test]
    fn test_no_field_is_invalid_state() {
        let mut point = Point::default();
        point.measurement("testMeasurement").tag("host", "a");

        let mut out = Vec::new();
        let err = point.write_to(&mut out).unwrap_err();
        assert!(matches!(err, LineError::InvalidState(_)));
        assert!(out.is_empty());

        point.field("value", 1);
        assert_eq!(line(&mut point), "testMeasurement,host=a value=1i");
    }

    #[test]
    fn test_missing_measurement_is_invalid_state() {
        let mut point = Point::default();
        point.field("value", 1);
        assert!(matches!(point.to_bytes(), Err(LineError::InvalidState(_))));
    }

    #[test]
    fn test_measurement_replaced() {
        let mut point = Point::default();
        point.measurement("first").measurement("second").field("v", false);
        assert_eq!(line(&mut point), "second v=f");
    }

    #[test]
    fn test_serialize_twice_is_stable() {
        let mut point = Point::default();
        point
            .measurement("cpu")
            .tag("host", "a")
            .field("load", 3)
            .timestamp(10, TimeUnit::Seconds);

        let first = line(&mut point);
        let second = line(&mut point);
        assert_eq!(first, "cpu,host=a load=3i 10000000000");
        assert_eq!(first, second);
    }

    #[test]
    fn test_timestamp_last_write_wins() {
        let mut point = Point::default();
        point
            .measurement("m")
            .field("f", 1)
            .timestamp(1, TimeUnit::Nanoseconds)
            .timestamp(2, TimeUnit::Microseconds);

        assert_eq!(point.timestamp_nanos(), Some(2_000));
        assert_eq!(line(&mut point), "m f=1i 2000");
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut point = Point::default();
        point
            .measurement("m")
            .tag("k", "v")
            .field("f", "x")
            .timestamp(5, TimeUnit::Seconds);
        point.reset();

        assert!(!point.has_field());
        assert_eq!(point.tag_count(), 0);
        assert_eq!(point.timestamp_nanos(), None);

        point.measurement("n").field("g", true);
        assert_eq!(line(&mut point), "n g=t");
    }

    #[test]
    fn test_integer_field_conversions() {
        let mut point = Point::default();
        point
            .measurement("m")
            .field("a", 1u8)
            .field("b", -2i16)
            .field("c", u32::MAX)
            .field("d", i64::MIN);
        assert_eq!(
            line(&mut point),
            "m a=1i,b=-2i,c=4294967295i,d=-9223372036854775808i"
        );
    }

    #[test]
    fn test_owned_string_field() {
        let value = String::from("say \"hi\"");
        let mut point = Point::default();
        point.measurement("m").field("s", &value);
        assert_eq!(line(&mut point), "m s=\"say \\\"hi\\\"\"");
    }

    #[test]
    fn test_sink_error_propagates() {
        struct FailingSink;

        impl Write for FailingSink {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut point = Point::default();
        point.measurement("m").field("f", 1).timestamp(1, TimeUnit::Seconds);

        let err = point.write_to(&mut FailingSink).unwrap_err();
        match err {
            LineError::Io(inner) => assert_eq!(inner.to_string(), "disk full"),
            other => panic!("Expected Io, got {:?}", other),
        }

        // The failed write left the point usable
        assert_eq!(line(&mut point), "m f=1i 1000000000");
    }

    #[test]
    fn test_tiny_buffers_grow() {
        let mut point = Point::new(1);
        let long = "x".repeat(1000);
        point
            .measurement(&long)
            .tag(&long, &long)
            .field(&long, long.as_str());

        let expected = format!("{l},{l}={l} {l}=\"{l}\"", l = long);
        assert_eq!(line(&mut point), expected);
    }
}
