//! Growable byte buffer backing each segment of a point.
//!
//! The buffer owns a fixed region and a write cursor. Clearing moves the
//! cursor back to the start and keeps the region, so a pooled point stops
//! allocating once its buffers have grown to fit the records it encodes.

/// Append-only byte region with doubling growth.
#[derive(Debug, Clone)]
pub struct ByteBuffer {
    data: Box<[u8]>,
    len: usize,
}

impl ByteBuffer {
    /// Create a buffer with the given initial capacity (at least one byte).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity.max(1)].into_boxed_slice(),
            len: 0,
        }
    }

    /// Number of committed bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when nothing has been written since the last clear
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current size of the backing region
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes left before the region has to grow
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.len
    }

    /// Committed bytes
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Move the cursor back to the start without releasing memory.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Drop everything past `len`. No-op if `len` is beyond the cursor.
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        if len < self.len {
            self.len = len;
        }
    }

    /// Make room for a write of `len` bytes with 2x headroom.
    ///
    /// Escaping can at most double a string, so reserving twice the raw
    /// length up front means an escaped write never has to grow mid-copy.
    pub fn ensure_capacity(&mut self, len: usize) {
        self.reserve(len.saturating_mul(2));
    }

    /// Append one byte
    #[inline]
    pub fn put(&mut self, byte: u8) {
        if self.len == self.data.len() {
            self.reserve(1);
        }
        self.data[self.len] = byte;
        self.len += 1;
    }

    /// Append a byte slice
    #[inline]
    pub fn put_slice(&mut self, bytes: &[u8]) {
        self.reserve(bytes.len());
        let end = self.len + bytes.len();
        self.data[self.len..end].copy_from_slice(bytes);
        self.len = end;
    }

    /// Append the decimal form of `value`, covering the whole `i64` range.
    pub fn put_i64(&mut self, value: i64) {
        // u64::MAX has 20 digits
        let mut digits = [0u8; 20];
        let mut pos = digits.len();
        let mut n = value.unsigned_abs();

        loop {
            pos -= 1;
            digits[pos] = b'0' + (n % 10) as u8;
            n /= 10;
            if n == 0 {
                break;
            }
        }

        if value < 0 {
            self.put(b'-');
        }
        self.put_slice(&digits[pos..]);
    }

    /// Double the region until `additional` bytes fit after the cursor.
    fn reserve(&mut self, additional: usize) {
        if self.remaining() >= additional {
            return;
        }

        let mut capacity = self.data.len();
        while capacity - self.len < additional {
            capacity = capacity.saturating_mul(2);
        }

        let mut grown = vec![0u8; capacity].into_boxed_slice();
        grown[..self.len].copy_from_slice(&self.data[..self.len]);
        self.data = grown;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_clear() {
        let mut buf = ByteBuffer::with_capacity(8);
        buf.put_slice(b"cpu");
        buf.put(b',');
        assert_eq!(buf.as_bytes(), b"cpu,");
        assert_eq!(buf.len(), 4);

        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 8);
    }

    #[test]
    fn test_growth_preserves_contents() {
        let mut buf = ByteBuffer::with_capacity(4);
        buf.put_slice(b"abc");
        buf.put_slice(b"defghijklmnop");
        buf.put(b'q');

        assert_eq!(buf.as_bytes(), b"abcdefghijklmnopq");
        assert!(buf.capacity() >= 17);
        // Growth is by doubling from the initial size
        assert!(buf.capacity().is_power_of_two());
    }

    #[test]
    fn test_ensure_capacity_reserves_headroom() {
        let mut buf = ByteBuffer::with_capacity(16);
        buf.put_slice(b"0123456789");
        buf.ensure_capacity(5);

        assert!(buf.remaining() >= 10);
        assert_eq!(buf.capacity(), 32);
        assert_eq!(buf.as_bytes(), b"0123456789");
    }

    #[test]
    fn test_ensure_capacity_grows_more_than_once() {
        let mut buf = ByteBuffer::with_capacity(2);
        buf.ensure_capacity(100);
        assert!(buf.remaining() >= 200);
    }

    #[test]
    fn test_zero_capacity_still_writes() {
        let mut buf = ByteBuffer::with_capacity(0);
        buf.put(b'x');
        assert_eq!(buf.as_bytes(), b"x");
    }

    #[test]
    fn test_truncate() {
        let mut buf = ByteBuffer::with_capacity(8);
        buf.put_slice(b"abcdef");
        buf.truncate(3);
        assert_eq!(buf.as_bytes(), b"abc");

        buf.truncate(10);
        assert_eq!(buf.as_bytes(), b"abc");
    }

    #[test]
    fn test_put_i64() {
        let cases: [(i64, &[u8]); 6] = [
            (0, b"0"),
            (7, b"7"),
            (-42, b"-42"),
            (123456, b"123456"),
            (i64::MAX, b"9223372036854775807"),
            (i64::MIN, b"-9223372036854775808"),
        ];

        for (value, expected) in cases {
            let mut buf = ByteBuffer::with_capacity(4);
            buf.put_i64(value);
            assert_eq!(buf.as_bytes(), expected, "value {}", value);
        }
    }
}
