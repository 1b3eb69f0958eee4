//! echo: self-describing, diffable object trees.
//!
//! This crate gathers the workspace behind one dependency:
//!
//! - the tree model, change events and delta engine from `echo-core`
//!   (re-exported at the root),
//! - [`serializer`]: type-preserving conversion of Rust values to trees,
//! - [`codec`]: binary and JSON text encodings,
//! - [`path`]: `/`-delimited path helpers,
//! - [`cli`]: the logic behind the `echo-diff` and `echo-patch` binaries.

pub mod cli;
pub mod logging;

pub use echo_codec as codec;
pub use echo_core::*;
pub use echo_path as path;
pub use echo_serializer as serializer;
