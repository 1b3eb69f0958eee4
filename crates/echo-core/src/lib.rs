//! Core tree model for echo.
//!
//! An [`EchoObject`] is a node of a self-describing tree of tagged values:
//! null, eleven numeric kinds, strings, byte arrays, booleans, lists and
//! string-keyed compounds. Nodes know their parent and the key or index they
//! are stored under, raise [`ChangeEvent`]s that bubble up to the root, and
//! can be diffed and patched with the [`delta`] engine.
//!
//! # Example
//!
//! ```
//! use echo_core::{apply_delta, create_delta, EchoObject};
//!
//! let from = EchoObject::new_compound();
//! from.add("Health", 100i32.into()).unwrap();
//!
//! let to = EchoObject::new_compound();
//! to.add("Health", 75i32.into()).unwrap();
//! to.add("Mana", 10i32.into()).unwrap();
//!
//! let delta = create_delta(&from, &to);
//! assert_eq!(delta.len(), 2);
//! assert_eq!(apply_delta(&from, &delta).unwrap(), to);
//! ```
//!
//! Trees are single-threaded (`Rc`-based); ownership flows from parent to
//! child and parent links are weak. Clone, equality, traversal, diff and
//! apply recurse once per tree level.

pub mod delta;
mod error;
mod event;
mod node;
mod query;
mod tag;
mod value;

pub use bigdecimal::BigDecimal;
pub use delta::{apply_delta, apply_delta_tree, create_delta, Delta, DeltaOp};
pub use error::{DeltaError, EchoError};
pub use event::{ChangeEvent, ChangeKind, ChangeValue};
pub use node::{EchoObject, Primitive};
pub use tag::TagType;
pub use value::FromEcho;

/// Returns the crate version at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
