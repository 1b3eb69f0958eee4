use thiserror::Error;

use crate::TagType;

/// Errors raised by tree edits: wrong node shape or invalid arguments.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EchoError {
    #[error("expected a {expected} node, found {found}")]
    Shape { expected: &'static str, found: TagType },
    #[error("compound keys must not be blank")]
    BlankKey,
    #[error("key `{0}` already exists")]
    DuplicateKey(String),
    #[error("key `{0}` does not exist")]
    MissingKey(String),
    #[error("node already has a parent; clone it first")]
    AlreadyAttached,
    #[error("a node cannot be attached to itself or to one of its descendants")]
    SelfAttachment,
    #[error("index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("value must be a primitive node, found {0}")]
    NotPrimitive(TagType),
    #[error("target node is not reachable from the given ancestor")]
    Unreachable,
}

/// Errors raised while decoding or replaying a delta. A failed replay leaves
/// no partially patched result behind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeltaError {
    #[error("path `{0}` does not resolve")]
    UnresolvedPath(String),
    #[error("node at `{0}` is not a compound")]
    NotCompound(String),
    #[error("node at `{0}` is not a list")]
    NotList(String),
    #[error("unknown delta operation `{0}`")]
    UnknownOperation(String),
    #[error("malformed delta: {0}")]
    Malformed(String),
    #[error(transparent)]
    Edit(#[from] EchoError),
}
