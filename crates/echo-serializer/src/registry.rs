//! Type catalog: names, descriptors and per-type codecs.

use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use tracing::debug;

use crate::format::{primitive_table, EchoEnum, EnumCodec, SequenceCodec, Shared, SharedCodec};
use crate::{TypeDescriptor, TypeInfo, TypeName};

#[derive(Clone)]
pub enum TypeKind {
    Primitive { code: &'static str },
    Enum { name: String, codec: EnumCodec },
    Object { name: String, descriptor: Arc<TypeDescriptor> },
    Sequence { element: TypeInfo, codec: SequenceCodec },
    Shared { inner: TypeInfo, optional: bool, codec: SharedCodec },
}

#[derive(Clone)]
pub struct TypeEntry {
    pub info: TypeInfo,
    pub kind: TypeKind,
}

/// Registered types and the names they are written under.
///
/// Names follow [`TypeName`] notation: primitives use compact codes (`i`,
/// `st`, ...), enums `e:Name`, structs their registered name, sequences
/// `Elem[]` and shared handles `Shared<Inner>`. Lookups in both directions are
/// memoized; [`TypeRegistry::clear_cache`] drops the memos so a reloaded
/// catalog is picked up.
pub struct TypeRegistry {
    entries: DashMap<TypeId, TypeEntry>,
    names: DashMap<TypeId, String>,
    resolved: DashMap<String, Option<TypeInfo>>,
    generation: AtomicU64,
}

impl TypeRegistry {
    /// An empty catalog. Most callers want [`TypeRegistry::with_builtins`].
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            names: DashMap::new(),
            resolved: DashMap::new(),
            generation: AtomicU64::new(0),
        }
    }

    /// Primitives plus `Vec` of every primitive except `u8`, which is a byte
    /// array.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for primitive in primitive_table() {
            registry.insert(TypeEntry {
                info: primitive.info,
                kind: TypeKind::Primitive {
                    code: primitive.code,
                },
            });
        }
        registry.register_sequence::<i8>();
        registry.register_sequence::<i16>();
        registry.register_sequence::<u16>();
        registry.register_sequence::<i32>();
        registry.register_sequence::<u32>();
        registry.register_sequence::<i64>();
        registry.register_sequence::<u64>();
        registry.register_sequence::<f32>();
        registry.register_sequence::<f64>();
        registry.register_sequence::<bigdecimal::BigDecimal>();
        registry.register_sequence::<String>();
        registry.register_sequence::<bool>();
        registry.register_sequence::<char>();
        registry.register_sequence::<Vec<u8>>();
        registry.register_sequence::<uuid::Uuid>();
        registry
    }

    /// The process-wide catalog used by [`Serializer::global`](crate::Serializer::global).
    pub fn global() -> Arc<TypeRegistry> {
        static GLOBAL: OnceLock<Arc<TypeRegistry>> = OnceLock::new();
        GLOBAL
            .get_or_init(|| Arc::new(TypeRegistry::with_builtins()))
            .clone()
    }

    fn insert(&self, entry: TypeEntry) {
        self.entries.insert(entry.info.id(), entry);
        self.invalidate();
    }

    pub fn register_enum<T: EchoEnum>(&self, name: &str) {
        debug!(name, "registering enum");
        self.insert(TypeEntry {
            info: TypeInfo::of::<T>(),
            kind: TypeKind::Enum {
                name: name.to_string(),
                codec: EnumCodec::of::<T>(),
            },
        });
        self.register_sequence::<T>();
    }

    /// Registers a struct under `name`, together with `Vec<T>`.
    pub fn register_object<T: Any>(&self, name: &str, descriptor: TypeDescriptor) {
        debug!(name, fields = descriptor.fields.len(), "registering object type");
        self.insert(TypeEntry {
            info: TypeInfo::of::<T>(),
            kind: TypeKind::Object {
                name: name.to_string(),
                descriptor: Arc::new(descriptor),
            },
        });
        self.register_sequence::<T>();
    }

    pub fn register_sequence<T: Any>(&self) {
        self.insert(TypeEntry {
            info: TypeInfo::of::<Vec<T>>(),
            kind: TypeKind::Sequence {
                element: TypeInfo::of::<T>(),
                codec: SequenceCodec::of::<T>(),
            },
        });
    }

    /// Registers `Shared<T>`, `Option<Shared<T>>` and `Vec<Shared<T>>`.
    /// `T` itself must be registered separately.
    pub fn register_shared<T: Any>(&self) {
        let inner = TypeInfo::of::<T>();
        self.insert(TypeEntry {
            info: TypeInfo::of::<Shared<T>>(),
            kind: TypeKind::Shared {
                inner,
                optional: false,
                codec: SharedCodec::of::<T>(),
            },
        });
        self.insert(TypeEntry {
            info: TypeInfo::of::<Option<Shared<T>>>(),
            kind: TypeKind::Shared {
                inner,
                optional: true,
                codec: SharedCodec::optional_of::<T>(),
            },
        });
        self.register_sequence::<Shared<T>>();
    }

    pub fn entry(&self, ty: TypeInfo) -> Option<TypeEntry> {
        self.entries.get(&ty.id()).map(|entry| entry.value().clone())
    }

    pub fn descriptor(&self, ty: TypeInfo) -> Option<Arc<TypeDescriptor>> {
        match self.entry(ty)?.kind {
            TypeKind::Object { descriptor, .. } => Some(descriptor),
            _ => None,
        }
    }

    /// Values written with the compact `{ "$t", "$v" }` envelope.
    pub fn is_simple(&self, ty: TypeInfo) -> bool {
        matches!(
            self.entry(ty).map(|entry| entry.kind),
            Some(TypeKind::Primitive { .. } | TypeKind::Enum { .. })
        )
    }

    /// Bumped on every registration and cache clear.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn clear_cache(&self) {
        debug!(generation = self.generation(), "clearing type name caches");
        self.invalidate();
    }

    fn invalidate(&self) {
        self.names.clear();
        self.resolved.clear();
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// The name `ty` is written under, or `None` when it is not registered.
    pub fn name_of(&self, ty: TypeInfo) -> Option<String> {
        if let Some(name) = self.names.get(&ty.id()) {
            return Some(name.value().clone());
        }
        let name = self.type_name(ty)?.to_string();
        self.names.insert(ty.id(), name.clone());
        Some(name)
    }

    fn type_name(&self, ty: TypeInfo) -> Option<TypeName> {
        Some(match self.entry(ty)?.kind {
            TypeKind::Primitive { code } => TypeName::named(code),
            TypeKind::Enum { name, .. } => TypeName::Enum(name),
            TypeKind::Object { name, .. } => TypeName::Named(name),
            TypeKind::Sequence { element, .. } => TypeName::array(self.type_name(element)?),
            TypeKind::Shared {
                inner, optional, ..
            } => {
                let shared = TypeName::Generic {
                    base: "Shared".into(),
                    args: vec![self.type_name(inner)?],
                };
                if optional {
                    TypeName::Generic {
                        base: "Option".into(),
                        args: vec![shared],
                    }
                } else {
                    shared
                }
            }
        })
    }

    /// The registered type written as `name`.
    pub fn resolve(&self, name: &str) -> Option<TypeInfo> {
        if let Some(found) = self.resolved.get(name) {
            return *found;
        }
        let found = TypeName::parse(name).ok().and_then(|parsed| {
            let canonical = parsed.canonical().to_string();
            let known: Vec<TypeInfo> = self.entries.iter().map(|entry| entry.info).collect();
            known
                .into_iter()
                .find(|info| self.name_of(*info).as_deref() == Some(canonical.as_str()))
        });
        self.resolved.insert(name.to_string(), found);
        found
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
