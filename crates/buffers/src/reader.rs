//! Binary buffer reader with cursor tracking.

use std::str;

use crate::BufferError;

/// A binary buffer reader that reads data from a byte slice.
///
/// Every read checks the remaining length and reports
/// [`BufferError::EndOfBuffer`] instead of panicking, so decoders can surface
/// truncated input as an error.
///
/// # Example
///
/// ```
/// use echo_buffers::Reader;
///
/// let data = [0x01, 0x02, 0x03, 0x04];
/// let mut reader = Reader::new(&data);
///
/// assert_eq!(reader.u8().unwrap(), 0x01);
/// assert_eq!(reader.u16().unwrap(), 0x0203);
/// assert_eq!(reader.size(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    uint8: &'a [u8],
    /// Current cursor position.
    x: usize,
}

macro_rules! read_be {
    ($name:ident, $ty:ty, $size:expr) => {
        #[inline]
        pub fn $name(&mut self) -> Result<$ty, BufferError> {
            let bytes = self.buf($size)?;
            let mut raw = [0u8; $size];
            raw.copy_from_slice(bytes);
            Ok(<$ty>::from_be_bytes(raw))
        }
    };
}

impl<'a> Reader<'a> {
    /// Creates a new reader for the given byte slice.
    pub fn new(uint8: &'a [u8]) -> Self {
        Self { uint8, x: 0 }
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.x
    }

    /// Returns the number of remaining bytes.
    pub fn size(&self) -> usize {
        self.uint8.len() - self.x
    }

    pub fn is_eof(&self) -> bool {
        self.x >= self.uint8.len()
    }

    fn check(&self, needed: usize) -> Result<(), BufferError> {
        if self.size() < needed {
            Err(BufferError::EndOfBuffer {
                offset: self.x,
                needed,
            })
        } else {
            Ok(())
        }
    }

    /// Peeks at the current byte without advancing the cursor.
    pub fn peek(&self) -> Result<u8, BufferError> {
        self.check(1)?;
        Ok(self.uint8[self.x])
    }

    #[inline]
    pub fn u8(&mut self) -> Result<u8, BufferError> {
        self.check(1)?;
        let val = self.uint8[self.x];
        self.x += 1;
        Ok(val)
    }

    #[inline]
    pub fn i8(&mut self) -> Result<i8, BufferError> {
        self.u8().map(|b| b as i8)
    }

    read_be!(u16, u16, 2);
    read_be!(i16, i16, 2);
    read_be!(u32, u32, 4);
    read_be!(i32, i32, 4);
    read_be!(u64, u64, 8);
    read_be!(i64, i64, 8);
    read_be!(f32, f32, 4);
    read_be!(f64, f64, 8);

    /// Reads `size` raw bytes and advances the cursor.
    pub fn buf(&mut self, size: usize) -> Result<&'a [u8], BufferError> {
        self.check(size)?;
        let start = self.x;
        self.x += size;
        Ok(&self.uint8[start..self.x])
    }

    /// Reads a UTF-8 string of `size` bytes.
    pub fn utf8(&mut self, size: usize) -> Result<&'a str, BufferError> {
        let start = self.x;
        let bytes = self.buf(size)?;
        std::str::from_utf8(bytes).map_err(|_| BufferError::InvalidUtf8(start))
    }

    /// Reads an unsigned LEB128 varint.
    pub fn vuint(&mut self) -> Result<u64, BufferError> {
        let start = self.x;
        let mut result: u64 = 0;
        let mut shift: u32 = 0;
        loop {
            let byte = self.u8()?;
            let part = (byte & 0x7f) as u64;
            if shift == 63 && part > 1 {
                return Err(BufferError::VarintOverflow(start));
            }
            result |= part << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
            if shift > 63 {
                return Err(BufferError::VarintOverflow(start));
            }
        }
    }

    /// Reads a zigzag-encoded signed varint.
    pub fn vint(&mut self) -> Result<i64, BufferError> {
        self.vuint().map(crate::zigzag_decode)
    }
}
