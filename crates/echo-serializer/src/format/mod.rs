//! Pluggable value formats and their ordered registry.

mod enums;
mod object;
mod primitive;
mod sequence;
mod shared;

use std::any::TypeId;
use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;
use echo_core::EchoObject;
use tracing::debug;

pub use enums::{EchoEnum, EnumCodec, EnumFormat};
pub use object::ObjectFormat;
pub(crate) use primitive::primitive_table;
pub use primitive::PrimitiveFormat;
pub use sequence::{SequenceCodec, SequenceFormat};
pub use shared::{Shared, SharedCodec, SharedFormat};

use crate::{Reflect, SerializationContext, SerializeError, Serializer, TypeInfo, TypeRegistry};

/// Encoder/decoder for one category of runtime values.
pub trait Format: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this format handles values of type `ty`. `types` is the
    /// catalog of the serializer doing the lookup.
    fn can_handle(&self, ty: TypeInfo, types: &TypeRegistry) -> bool;

    fn serialize(
        &self,
        serializer: &Serializer,
        ty: TypeInfo,
        value: &dyn Reflect,
        ctx: &mut SerializationContext,
    ) -> Result<EchoObject, SerializeError>;

    fn deserialize(
        &self,
        serializer: &Serializer,
        node: &EchoObject,
        ty: TypeInfo,
        ctx: &mut SerializationContext,
    ) -> Result<Option<Box<dyn Reflect>>, SerializeError>;
}

/// Ordered list of formats, tried first to last.
///
/// Built-ins come in a fixed order and end with the [`ObjectFormat`]
/// catch-all. Formats added with [`FormatRegistry::register`] go in front of
/// everything registered before them. Lookups are memoized per type; the memo
/// is dropped on registration and whenever the type catalog changes.
pub struct FormatRegistry {
    formats: RwLock<Vec<Arc<dyn Format>>>,
    memo: DashMap<TypeId, (u64, Arc<dyn Format>)>,
}

impl FormatRegistry {
    pub fn with_builtins() -> Self {
        let formats: Vec<Arc<dyn Format>> = vec![
            Arc::new(PrimitiveFormat),
            Arc::new(EnumFormat),
            Arc::new(SequenceFormat),
            Arc::new(SharedFormat),
            Arc::new(ObjectFormat),
        ];
        Self {
            formats: RwLock::new(formats),
            memo: DashMap::new(),
        }
    }

    pub fn register(&self, format: Arc<dyn Format>) {
        debug!(format = format.name(), "registering format");
        self.formats
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(0, format);
        self.memo.clear();
    }

    pub fn len(&self) -> usize {
        self.formats
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn names(&self) -> Vec<String> {
        self.formats
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|format| format.name().to_string())
            .collect()
    }

    /// First format that handles `ty`.
    pub fn find(&self, ty: TypeInfo, types: &TypeRegistry) -> Option<Arc<dyn Format>> {
        let generation = types.generation();
        if let Some(entry) = self.memo.get(&ty.id()) {
            if entry.0 == generation {
                return Some(entry.1.clone());
            }
        }
        let found = self
            .formats
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|format| format.can_handle(ty, types))
            .cloned()?;
        self.memo.insert(ty.id(), (generation, found.clone()));
        Some(found)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
