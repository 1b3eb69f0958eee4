use echo_core::EchoError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("no dependency scope is open")]
    NoOpenScope,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeNameError {
    #[error("type name is empty")]
    Empty,
    #[error("unbalanced brackets in type name `{0}`")]
    Unbalanced(String),
    #[error("invalid type name `{0}`")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("no format can handle type `{type_name}`")]
    UnsupportedType { type_name: String },
    #[error("expected a value of type `{expected}`, found `{found}`")]
    TypeMismatch { expected: String, found: String },
    #[error("cannot decode: {0}")]
    Decode(String),
    #[error(transparent)]
    Echo(#[from] EchoError),
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    TypeName(#[from] TypeNameError),
}

impl SerializeError {
    pub(crate) fn unsupported(type_name: &str) -> Self {
        SerializeError::UnsupportedType {
            type_name: type_name.to_string(),
        }
    }

    pub(crate) fn mismatch(expected: &str, found: &str) -> Self {
        SerializeError::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
