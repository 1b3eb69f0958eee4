//! Serialization of Rust values into echo trees.
//!
//! A [`Serializer`] turns values into [`EchoObject`](echo_core::EchoObject)
//! trees and back. Each value is routed to the first [`Format`] that can
//! handle its runtime type; built-in formats cover primitives, registered
//! enums, sequences, shared (`Rc<RefCell<_>>`) handles and described structs.
//!
//! Type information is written only where the reader could not recover it:
//! under [`TypeMode::Auto`] a value whose runtime type differs from the
//! declared one is wrapped in a type envelope (`{ "$t", "$v" }` for simple
//! values, a `$type` field for everything else).
//!
//! ```
//! use echo_serializer::{field, SerializationContext, Serializer, TypeDescriptor, TypeRegistry};
//!
//! #[derive(Default)]
//! struct Player {
//!     name: String,
//!     health: i32,
//! }
//!
//! let types = TypeRegistry::with_builtins();
//! types.register_object::<Player>(
//!     "game.Player",
//!     TypeDescriptor::new::<Player>(vec![
//!         field!(Player, "Name", name: String),
//!         field!(Player, "Health", health: i32),
//!     ]),
//! );
//! let serializer = Serializer::with_types(types);
//!
//! let mut ctx = SerializationContext::default();
//! let player = Player { name: "Ada".into(), health: 100 };
//! let tree = serializer.serialize_value(&player, &mut ctx).unwrap();
//! assert_eq!(tree.find("Health").unwrap().get_value(0i32), 100);
//! assert!(!tree.contains("$type"));
//!
//! let back: Player = serializer.deserialize_value(&tree, &mut ctx).unwrap().unwrap();
//! assert_eq!(back.name, "Ada");
//! ```

mod context;
mod descriptor;
mod error;
pub mod format;
mod reflect;
mod registry;
mod scanner;
mod serializer;
mod type_name;

pub use context::{SerializationContext, TypeMode};
pub use descriptor::{FieldDescriptor, TypeDescriptor};
pub use error::{ContextError, SerializeError, TypeNameError};
pub use format::{
    EchoEnum, EnumFormat, Format, FormatRegistry, ObjectFormat, PrimitiveFormat, SequenceFormat,
    Shared, SharedFormat,
};
pub use reflect::{downcast, Reflect, TypeInfo};
pub use registry::{TypeEntry, TypeKind, TypeRegistry};
pub use scanner::{DependencyScanner, KeyDependencyScanner};
pub use serializer::Serializer;
pub use type_name::TypeName;

/// Full type name field of a complex type envelope.
pub const TYPE_KEY: &str = "$type";
/// Payload field of a complex type envelope.
pub const VALUE_KEY: &str = "$value";
/// Compact type name field of a simple type envelope.
pub const COMPACT_TYPE_KEY: &str = "$t";
/// Payload field of a simple type envelope.
pub const COMPACT_VALUE_KEY: &str = "$v";
/// Identity of a shared object on its first occurrence.
pub const ID_KEY: &str = "$id";
/// Back-reference to a shared object that was already written.
pub const REF_KEY: &str = "$ref";
/// Key under which pre-built trees embed foreign dependency ids.
pub const DEPENDENCY_KEY: &str = "$dep";
