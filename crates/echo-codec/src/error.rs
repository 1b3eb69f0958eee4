use echo_buffers::BufferError;
use echo_core::{EchoError, TagType};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("not an echo binary document: header byte {0:#04x}")]
    InvalidHeader(u8),
    #[error("unknown binary mode {0}")]
    UnknownMode(u8),
    #[error("unknown tag {0}")]
    UnknownTag(u8),
    #[error("{tag} value out of range")]
    OutOfRange { tag: TagType },
    #[error("{0} unexpected trailing bytes")]
    TrailingBytes(usize),
    #[error("invalid `{key}` wrapper")]
    InvalidWrapper { key: String },
    #[error("invalid decimal `{0}`")]
    InvalidDecimal(String),
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
    #[error(transparent)]
    Echo(#[from] EchoError),
}
