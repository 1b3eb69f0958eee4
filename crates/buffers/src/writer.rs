//! Binary buffer writer with auto-growing capacity.

/// A binary buffer writer that grows automatically as needed.
///
/// Multi-byte integers and floats are written big-endian.
///
/// # Example
///
/// ```
/// use echo_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.u8(0x01);
/// writer.u16(0x0203);
/// let data = writer.flush();
/// assert_eq!(data, [0x01, 0x02, 0x03]);
/// ```
#[derive(Debug, Default)]
pub struct Writer {
    uint8: Vec<u8>,
}

impl Writer {
    /// Creates a new writer with a small initial allocation.
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates a new writer with a custom initial allocation.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            uint8: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written since the last flush.
    pub fn len(&self) -> usize {
        self.uint8.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the bytes written since the last flush and starts a new
    /// buffer.
    pub fn flush(&mut self) -> Vec<u8> {
        let capacity = self.uint8.capacity();
        std::mem::replace(&mut self.uint8, Vec::with_capacity(capacity))
    }

    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.uint8.push(val);
    }

    #[inline]
    pub fn i8(&mut self, val: i8) {
        self.uint8.push(val as u8);
    }

    #[inline]
    pub fn u16(&mut self, val: u16) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    pub fn i16(&mut self, val: i16) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    pub fn u32(&mut self, val: u32) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    pub fn i32(&mut self, val: i32) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    pub fn u64(&mut self, val: u64) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    pub fn i64(&mut self, val: i64) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    pub fn f32(&mut self, val: f32) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    #[inline]
    pub fn f64(&mut self, val: f64) {
        self.uint8.extend_from_slice(&val.to_be_bytes());
    }

    /// Writes a byte slice.
    pub fn buf(&mut self, buf: &[u8]) {
        self.uint8.extend_from_slice(buf);
    }

    /// Writes a UTF-8 string. Returns the number of bytes written.
    pub fn utf8(&mut self, s: &str) -> usize {
        self.uint8.extend_from_slice(s.as_bytes());
        s.len()
    }

    /// Writes an unsigned LEB128 varint (7 bits per byte, low groups first).
    pub fn vuint(&mut self, mut val: u64) {
        loop {
            let byte = (val & 0x7f) as u8;
            val >>= 7;
            if val == 0 {
                self.uint8.push(byte);
                return;
            }
            self.uint8.push(byte | 0x80);
        }
    }

    /// Writes a zigzag-encoded signed varint.
    pub fn vint(&mut self, val: i64) {
        self.vuint(crate::zigzag_encode(val));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_big_endian() {
        let mut writer = Writer::new();
        writer.u32(0x0102_0304);
        writer.i16(-2);
        assert_eq!(writer.flush(), vec![1, 2, 3, 4, 0xff, 0xfe]);
        assert!(writer.is_empty());
    }

    #[test]
    fn varint_layout() {
        let mut writer = Writer::new();
        writer.vuint(0);
        writer.vuint(127);
        writer.vuint(128);
        writer.vuint(300);
        assert_eq!(writer.flush(), vec![0x00, 0x7f, 0x80, 0x01, 0xac, 0x02]);

        writer.vint(-1);
        writer.vint(1);
        assert_eq!(writer.flush(), vec![0x01, 0x02]);
    }
}
