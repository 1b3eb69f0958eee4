use std::any::Any;

use echo_core::{EchoObject, TagType};

use super::Format;
use crate::{
    Reflect, SerializationContext, SerializeError, Serializer, TypeInfo, TypeKind, TypeRegistry,
};

/// A fieldless enum stored by variant name.
pub trait EchoEnum: Any + Sized {
    fn variant_name(&self) -> &'static str;
    fn from_variant_name(name: &str) -> Option<Self>;
}

/// Monomorphized accessors for one registered enum.
#[derive(Clone, Copy)]
pub struct EnumCodec {
    to_name: fn(&dyn Any) -> Option<&'static str>,
    from_name: fn(&str) -> Option<Box<dyn Reflect>>,
}

fn to_name<T: EchoEnum>(value: &dyn Any) -> Option<&'static str> {
    value.downcast_ref::<T>().map(EchoEnum::variant_name)
}

fn from_name<T: EchoEnum>(name: &str) -> Option<Box<dyn Reflect>> {
    T::from_variant_name(name).map(|value| Box::new(value) as Box<dyn Reflect>)
}

impl EnumCodec {
    pub fn of<T: EchoEnum>() -> Self {
        Self {
            to_name: to_name::<T>,
            from_name: from_name::<T>,
        }
    }
}

fn codec(ty: TypeInfo, types: &TypeRegistry) -> Option<EnumCodec> {
    match types.entry(ty)?.kind {
        TypeKind::Enum { codec, .. } => Some(codec),
        _ => None,
    }
}

/// Enums registered with [`TypeRegistry::register_enum`].
pub struct EnumFormat;

impl Format for EnumFormat {
    fn name(&self) -> &str {
        "enum"
    }

    fn can_handle(&self, ty: TypeInfo, types: &TypeRegistry) -> bool {
        codec(ty, types).is_some()
    }

    fn serialize(
        &self,
        serializer: &Serializer,
        ty: TypeInfo,
        value: &dyn Reflect,
        _ctx: &mut SerializationContext,
    ) -> Result<EchoObject, SerializeError> {
        let codec = codec(ty, serializer.types()).ok_or_else(|| SerializeError::unsupported(ty.name()))?;
        (codec.to_name)(value.as_any())
            .map(EchoObject::from)
            .ok_or_else(|| SerializeError::mismatch(ty.name(), value.type_info().name()))
    }

    fn deserialize(
        &self,
        serializer: &Serializer,
        node: &EchoObject,
        ty: TypeInfo,
        _ctx: &mut SerializationContext,
    ) -> Result<Option<Box<dyn Reflect>>, SerializeError> {
        let codec = codec(ty, serializer.types()).ok_or_else(|| SerializeError::unsupported(ty.name()))?;
        if node.tag_type() != TagType::String {
            return Err(SerializeError::Decode(format!(
                "enum {ty} must be stored as a string, found {}",
                node.tag_type()
            )));
        }
        let name = node.get_value(String::new());
        (codec.from_name)(&name)
            .map(Some)
            .ok_or_else(|| SerializeError::Decode(format!("`{name}` is not a variant of {ty}")))
    }
}
