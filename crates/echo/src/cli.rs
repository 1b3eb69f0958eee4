//! Command-line tools for echo documents.
//!
//! - `echo-diff <from> <to>` prints the delta that turns `from` into `to`.
//! - `echo-patch <base> <delta>` prints `base` with the delta applied.
//!
//! Inputs may be JSON text or binary documents; the encoding is detected from
//! the first byte. Output is compact JSON text unless `--pretty` or
//! `--binary` is given.

use std::path::{Path, PathBuf};

use echo_codec::{BinaryCodec, BinaryMode, CodecError, Codecs, EchoCodec, TextCodec, TextStyle};
use echo_core::{apply_delta_tree, create_delta, DeltaError, EchoObject};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Delta(#[from] DeltaError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Output {
    #[default]
    Text,
    Pretty,
    Binary,
}

impl Output {
    pub fn encode(self, node: &EchoObject) -> Result<Vec<u8>, CodecError> {
        match self {
            Output::Text => TextCodec::new(TextStyle::Compact).encode(node),
            Output::Pretty => TextCodec::new(TextStyle::Pretty).encode(node),
            Output::Binary => BinaryCodec::new(BinaryMode::Compact).encode(node),
        }
    }
}

/// Parsed arguments: two positional paths plus the output flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub first: PathBuf,
    pub second: PathBuf,
    pub output: Output,
}

impl Invocation {
    /// Parses the arguments after the program name.
    pub fn parse<I, S>(args: I, usage: &str) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut output = Output::default();
        let mut paths = Vec::new();
        for arg in args {
            let arg = arg.into();
            match arg.as_str() {
                "--text" => output = Output::Text,
                "--pretty" => output = Output::Pretty,
                "--binary" => output = Output::Binary,
                flag if flag.starts_with("--") => {
                    return Err(CliError::Usage(format!("unknown option {flag}\n{usage}")));
                }
                _ => paths.push(PathBuf::from(arg)),
            }
        }
        let [first, second]: [PathBuf; 2] = paths
            .try_into()
            .map_err(|_| CliError::Usage(usage.to_string()))?;
        Ok(Self {
            first,
            second,
            output,
        })
    }
}

pub fn read_document(path: &Path) -> Result<EchoObject, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Codecs::default().decode_any(&bytes)?)
}

/// The delta turning `from` into `to`, in its tree form.
pub fn diff_documents(from: &EchoObject, to: &EchoObject) -> EchoObject {
    let delta = create_delta(from, to);
    debug!(operations = delta.len(), "diffed documents");
    delta.to_echo()
}

/// `base` with a delta tree applied. `base` itself is not modified.
pub fn patch_document(base: &EchoObject, delta: &EchoObject) -> Result<EchoObject, CliError> {
    Ok(apply_delta_tree(base, delta)?)
}

pub fn run_diff(invocation: &Invocation) -> Result<Vec<u8>, CliError> {
    let from = read_document(&invocation.first)?;
    let to = read_document(&invocation.second)?;
    Ok(invocation.output.encode(&diff_documents(&from, &to))?)
}

pub fn run_patch(invocation: &Invocation) -> Result<Vec<u8>, CliError> {
    let base = read_document(&invocation.first)?;
    let delta = read_document(&invocation.second)?;
    Ok(invocation.output.encode(&patch_document(&base, &delta)?)?)
}
