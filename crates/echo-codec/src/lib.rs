//! Wire encodings for echo trees.
//!
//! Two codecs round-trip every [`TagType`](echo_core::TagType), including a
//! distinguishable null:
//!
//! - [`BinaryCodec`]: tagged binary, in [`BinaryMode::Compact`] (varints) or
//!   [`BinaryMode::Fast`] (fixed-width integers).
//! - [`TextCodec`]: JSON with `$`-prefixed wrappers for the kinds JSON has no
//!   literal for, in [`TextStyle::Compact`] or [`TextStyle::Pretty`].
//!
//! ```
//! use echo_codec::{Codecs, EchoCodec, EncodingFormat};
//! use echo_core::EchoObject;
//!
//! let tree = EchoObject::from_entries([("hp", EchoObject::from(7u8))]).unwrap();
//! let codecs = Codecs::default();
//! let bytes = codecs.get(EncodingFormat::Binary).encode(&tree).unwrap();
//! assert_eq!(codecs.decode_any(&bytes).unwrap(), tree);
//!
//! let text = codecs.text.encode_to_string(&tree).unwrap();
//! assert_eq!(text, r#"{"hp":{"$u8":7}}"#);
//! ```

pub mod binary;
mod error;
pub mod text;

pub use binary::{BinaryCodec, BinaryMode};
pub use error::CodecError;
pub use text::{from_json, to_json, TextCodec, TextStyle};

use echo_core::EchoObject;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingFormat {
    Binary,
    Text,
}

pub trait EchoCodec {
    fn id(&self) -> &'static str;
    fn format(&self) -> EncodingFormat;
    fn encode(&self, node: &EchoObject) -> Result<Vec<u8>, CodecError>;
    fn decode(&self, bytes: &[u8]) -> Result<EchoObject, CodecError>;
}

/// One codec per encoding format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Codecs {
    pub binary: BinaryCodec,
    pub text: TextCodec,
}

impl Codecs {
    pub fn new(mode: BinaryMode, style: TextStyle) -> Self {
        Self {
            binary: BinaryCodec::new(mode),
            text: TextCodec::new(style),
        }
    }

    pub fn get(&self, format: EncodingFormat) -> &dyn EchoCodec {
        match format {
            EncodingFormat::Binary => &self.binary,
            EncodingFormat::Text => &self.text,
        }
    }

    /// Binary documents start with [`binary::HEADER`], which is never the
    /// first byte of UTF-8 JSON.
    pub fn detect(bytes: &[u8]) -> EncodingFormat {
        match bytes.first() {
            Some(&binary::HEADER) => EncodingFormat::Binary,
            _ => EncodingFormat::Text,
        }
    }

    pub fn decode_any(&self, bytes: &[u8]) -> Result<EchoObject, CodecError> {
        self.get(Self::detect(bytes)).decode(bytes)
    }
}
