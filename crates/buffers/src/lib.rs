//! Binary buffer utilities for echo codecs.
//!
//! - [`Writer`] appends big-endian integers, floats, raw bytes, UTF-8 and
//!   LEB128 varints to a growing buffer.
//! - [`Reader`] reads the same primitives back from a byte slice with cursor
//!   tracking; every read is bounds-checked.
//!
//! # Example
//!
//! ```
//! use echo_buffers::{Reader, Writer};
//!
//! let mut writer = Writer::new();
//! writer.u8(0x01);
//! writer.u16(0x0203);
//! writer.vuint(300);
//! writer.utf8("hello");
//! let data = writer.flush();
//!
//! let mut reader = Reader::new(&data);
//! assert_eq!(reader.u8().unwrap(), 0x01);
//! assert_eq!(reader.u16().unwrap(), 0x0203);
//! assert_eq!(reader.vuint().unwrap(), 300);
//! assert_eq!(reader.utf8(5).unwrap(), "hello");
//! assert!(reader.is_eof());
//! ```

use thiserror::Error;

mod reader;
mod varint;
mod writer;

pub use reader::Reader;
pub use varint::{zigzag_decode, zigzag_encode};
pub use writer::Writer;

/// Error type for buffer operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("end of buffer: needed {needed} bytes at offset {offset}")]
    EndOfBuffer { offset: usize, needed: usize },
    #[error("invalid UTF-8 sequence at offset {0}")]
    InvalidUtf8(usize),
    #[error("varint at offset {0} overflows 64 bits")]
    VarintOverflow(usize),
}
