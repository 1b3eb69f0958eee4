//! Serialize/deserialize dispatch and type envelopes.

use std::any::Any;
use std::sync::{Arc, OnceLock};

use echo_core::{EchoObject, Primitive};
use tracing::{trace, warn};

use crate::{
    downcast, DependencyScanner, FormatRegistry, KeyDependencyScanner, Reflect,
    SerializationContext, SerializeError, TypeInfo, TypeMode, TypeRegistry, COMPACT_TYPE_KEY,
    COMPACT_VALUE_KEY, TYPE_KEY, VALUE_KEY,
};

/// Routes values to formats and decides where type envelopes are needed.
#[derive(Clone)]
pub struct Serializer {
    formats: Arc<FormatRegistry>,
    types: Arc<TypeRegistry>,
    scanner: Arc<dyn DependencyScanner>,
}

impl Serializer {
    pub fn new(formats: Arc<FormatRegistry>, types: Arc<TypeRegistry>) -> Self {
        Self {
            formats,
            types,
            scanner: Arc::new(KeyDependencyScanner::default()),
        }
    }

    /// Built-in formats over the given catalog.
    pub fn with_types(types: TypeRegistry) -> Self {
        Self::new(Arc::new(FormatRegistry::with_builtins()), Arc::new(types))
    }

    /// A serializer over the process-wide registries.
    pub fn global() -> Self {
        static FORMATS: OnceLock<Arc<FormatRegistry>> = OnceLock::new();
        let formats = FORMATS
            .get_or_init(|| Arc::new(FormatRegistry::with_builtins()))
            .clone();
        Self::new(formats, TypeRegistry::global())
    }

    pub fn with_scanner(mut self, scanner: Arc<dyn DependencyScanner>) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Serializes `value` for a slot declared as `declared`.
    pub fn serialize(
        &self,
        declared: TypeInfo,
        value: Option<&dyn Reflect>,
        ctx: &mut SerializationContext,
    ) -> Result<EchoObject, SerializeError> {
        let Some(value) = value else {
            return Ok(EchoObject::null());
        };
        if let Some(node) = value.as_any().downcast_ref::<EchoObject>() {
            let copy = node.deep_clone();
            self.scanner.scan(&copy, ctx)?;
            return Ok(copy);
        }
        let actual = value.type_info();
        let preserve = match ctx.mode() {
            TypeMode::Aggressive => true,
            TypeMode::None => false,
            TypeMode::Auto => actual != declared,
        };
        let format = self
            .formats
            .find(actual, &self.types)
            .ok_or_else(|| SerializeError::unsupported(actual.name()))?;
        trace!(format = format.name(), ty = actual.name(), "serializing");
        let payload = format.serialize(self, actual, value, ctx)?;
        if preserve {
            self.wrap(actual, payload)
        } else {
            Ok(payload)
        }
    }

    /// Serializes with the declared type equal to `T`.
    pub fn serialize_value<T: Any>(
        &self,
        value: &T,
        ctx: &mut SerializationContext,
    ) -> Result<EchoObject, SerializeError> {
        self.serialize(TypeInfo::of::<T>(), Some(value), ctx)
    }

    /// Serializes for a slot that may hold any value.
    pub fn serialize_dyn(
        &self,
        value: &dyn Reflect,
        ctx: &mut SerializationContext,
    ) -> Result<EchoObject, SerializeError> {
        self.serialize(TypeInfo::dynamic(), Some(value), ctx)
    }

    fn wrap(&self, actual: TypeInfo, payload: EchoObject) -> Result<EchoObject, SerializeError> {
        if actual == TypeInfo::of::<String>() {
            return Ok(payload);
        }
        let name = self
            .types
            .name_of(actual)
            .unwrap_or_else(|| actual.name().to_string());
        if self.types.is_simple(actual) {
            return Ok(EchoObject::from_entries([
                (COMPACT_TYPE_KEY, EchoObject::from(name)),
                (COMPACT_VALUE_KEY, payload),
            ])?);
        }
        if payload.is_compound() && !payload.contains(TYPE_KEY) {
            let out = EchoObject::from_entries([(TYPE_KEY, EchoObject::from(name))])?;
            for (key, child) in payload.tags()? {
                payload.remove(&key)?;
                out.add(&key, child)?;
            }
            return Ok(out);
        }
        Ok(EchoObject::from_entries([
            (TYPE_KEY, EchoObject::from(name)),
            (VALUE_KEY, payload),
        ])?)
    }

    /// Strips a type envelope, returning the payload and the type to decode
    /// it as.
    fn unwrap(&self, node: &EchoObject, declared: TypeInfo) -> (EchoObject, TypeInfo) {
        if !node.is_compound() {
            return (node.clone(), declared);
        }
        let compact = node.get(COMPACT_TYPE_KEY).zip(node.get(COMPACT_VALUE_KEY));
        if let Some((name, payload)) = compact.filter(|_| node.len() == 2) {
            return (payload, self.resolve_or(&name, declared));
        }
        let Some(name) = node.get(TYPE_KEY) else {
            return (node.clone(), declared);
        };
        let target = self.resolve_or(&name, declared);
        match node.get(VALUE_KEY) {
            Some(payload) if node.len() == 2 => (payload, target),
            _ => (node.clone(), target),
        }
    }

    fn resolve_or(&self, name: &EchoObject, declared: TypeInfo) -> TypeInfo {
        let name = name.get_value(String::new());
        match self.types.resolve(&name) {
            Some(ty) => ty,
            None => {
                warn!(type_name = %name, fallback = declared.name(), "unresolved type name, using declared type");
                declared
            }
        }
    }

    /// Deserializes `node` for a slot declared as `declared`. Returns `None`
    /// for null.
    pub fn deserialize(
        &self,
        node: Option<&EchoObject>,
        declared: TypeInfo,
        ctx: &mut SerializationContext,
    ) -> Result<Option<Box<dyn Reflect>>, SerializeError> {
        let Some(node) = node.filter(|node| !node.is_null()) else {
            return Ok(None);
        };
        if declared == TypeInfo::of::<EchoObject>() {
            return Ok(Some(Box::new(node.clone())));
        }
        let (payload, target) = self.unwrap(node, declared);
        if target.is_dynamic() {
            return Ok(natural_value(&payload));
        }
        let format = self
            .formats
            .find(target, &self.types)
            .ok_or_else(|| SerializeError::unsupported(target.name()))?;
        trace!(format = format.name(), ty = target.name(), "deserializing");
        format.deserialize(self, &payload, target, ctx)
    }

    pub fn deserialize_value<T: Any>(
        &self,
        node: &EchoObject,
        ctx: &mut SerializationContext,
    ) -> Result<Option<T>, SerializeError> {
        self.deserialize(Some(node), TypeInfo::of::<T>(), ctx)?
            .map(downcast::<T>)
            .transpose()
    }
}

/// Best-effort value for an untyped slot without an envelope: primitives map
/// to their Rust type, containers stay trees.
fn natural_value(node: &EchoObject) -> Option<Box<dyn Reflect>> {
    let Some(primitive) = node.primitive() else {
        return Some(Box::new(node.clone()));
    };
    Some(match primitive {
        Primitive::Null => return None,
        Primitive::Byte(v) => Box::new(v),
        Primitive::SByte(v) => Box::new(v),
        Primitive::Short(v) => Box::new(v),
        Primitive::UShort(v) => Box::new(v),
        Primitive::Int(v) => Box::new(v),
        Primitive::UInt(v) => Box::new(v),
        Primitive::Long(v) => Box::new(v),
        Primitive::ULong(v) => Box::new(v),
        Primitive::Float(v) => Box::new(v),
        Primitive::Double(v) => Box::new(v),
        Primitive::Decimal(v) => Box::new(v),
        Primitive::String(v) => Box::new(v),
        Primitive::ByteArray(v) => Box::new(v),
        Primitive::Bool(v) => Box::new(v),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serializer() -> Serializer {
        Serializer::with_types(TypeRegistry::with_builtins())
    }

    #[test]
    fn null_round_trips_as_none() {
        let serializer = serializer();
        let mut ctx = SerializationContext::default();
        let node = serializer
            .serialize(TypeInfo::of::<i32>(), None, &mut ctx)
            .unwrap();
        assert!(node.is_null());
        let back = serializer
            .deserialize(Some(&node), TypeInfo::of::<i32>(), &mut ctx)
            .unwrap();
        assert!(back.is_none());
        assert!(serializer
            .deserialize(None, TypeInfo::of::<i32>(), &mut ctx)
            .unwrap()
            .is_none());
    }

    #[test]
    fn trees_pass_through_as_copies() {
        let serializer = serializer();
        let mut ctx = SerializationContext::default();
        let tree = EchoObject::from_entries([("a", EchoObject::from(1i32))]).unwrap();
        let parent = EchoObject::new_compound();
        parent.add("tree", tree.clone()).unwrap();

        let out = serializer.serialize_dyn(&tree, &mut ctx).unwrap();
        assert_eq!(out, tree);
        assert!(!out.ptr_eq(&tree));
        assert!(!out.has_parent());
        assert!(!out.contains(TYPE_KEY));

        let back = serializer
            .deserialize_value::<EchoObject>(&tree, &mut ctx)
            .unwrap()
            .unwrap();
        assert!(back.ptr_eq(&tree));
    }

    #[test]
    fn dynamic_slots_read_natural_values() {
        let serializer = serializer();
        let mut ctx = SerializationContext::default();
        let value = serializer
            .deserialize(Some(&EchoObject::from(2.5f64)), TypeInfo::dynamic(), &mut ctx)
            .unwrap()
            .unwrap();
        assert_eq!(downcast::<f64>(value).unwrap(), 2.5);

        let list = EchoObject::from_items([EchoObject::from(1i32)]).unwrap();
        let value = serializer
            .deserialize(Some(&list), TypeInfo::dynamic(), &mut ctx)
            .unwrap()
            .unwrap();
        assert_eq!(downcast::<EchoObject>(value).unwrap(), list);
    }

    #[test]
    fn compact_envelope_needs_exactly_two_keys() {
        let serializer = serializer();
        let mut ctx = SerializationContext::default();
        let node = EchoObject::from_entries([
            (COMPACT_TYPE_KEY, EchoObject::from("i")),
            (COMPACT_VALUE_KEY, EchoObject::from(3i32)),
            ("extra", EchoObject::from(true)),
        ])
        .unwrap();
        let value = serializer
            .deserialize(Some(&node), TypeInfo::dynamic(), &mut ctx)
            .unwrap()
            .unwrap();
        assert_eq!(downcast::<EchoObject>(value).unwrap(), node);
    }
}
