//! Tagged binary encoding.
//!
//! ```text
//! document := 0xEC mode node
//! node     := tag:u8 payload
//! ```
//!
//! `tag` is the [`TagType`](echo_core::TagType) discriminant. In
//! [`BinaryMode::Compact`] integers wider than one byte and all lengths are
//! LEB128 varints, zigzag-encoded when signed. In [`BinaryMode::Fast`] they
//! are fixed-width big-endian and lengths are `u32`. Floats are always
//! big-endian IEEE 754; decimals are stored as their string form.

mod decoder;
mod encoder;

pub use decoder::BinaryDecoder;
pub use encoder::BinaryEncoder;

use echo_core::EchoObject;

use crate::{CodecError, EchoCodec, EncodingFormat};

pub const HEADER: u8 = 0xEC;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinaryMode {
    /// Varints; smaller output.
    #[default]
    Compact,
    /// Fixed-width integers; cheaper to read and write.
    Fast,
}

impl BinaryMode {
    pub fn as_u8(self) -> u8 {
        match self {
            BinaryMode::Compact => 0,
            BinaryMode::Fast => 1,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(BinaryMode::Compact),
            1 => Some(BinaryMode::Fast),
            _ => None,
        }
    }
}

/// Writes documents in a fixed mode and reads documents in either mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec {
    mode: BinaryMode,
}

impl BinaryCodec {
    pub fn new(mode: BinaryMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> BinaryMode {
        self.mode
    }
}

impl EchoCodec for BinaryCodec {
    fn id(&self) -> &'static str {
        match self.mode {
            BinaryMode::Compact => "binary-compact",
            BinaryMode::Fast => "binary-fast",
        }
    }

    fn format(&self) -> EncodingFormat {
        EncodingFormat::Binary
    }

    fn encode(&self, node: &EchoObject) -> Result<Vec<u8>, CodecError> {
        BinaryEncoder::new(self.mode).encode(node)
    }

    fn decode(&self, bytes: &[u8]) -> Result<EchoObject, CodecError> {
        BinaryDecoder::new().decode(bytes)
    }
}
