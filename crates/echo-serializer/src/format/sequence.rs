use std::any::Any;

use echo_core::EchoObject;

use super::Format;
use crate::{
    downcast, Reflect, SerializationContext, SerializeError, Serializer, TypeInfo, TypeKind,
    TypeRegistry,
};

type Encode = fn(&Serializer, &dyn Any, &mut SerializationContext) -> Result<EchoObject, SerializeError>;
type Decode =
    fn(&Serializer, &EchoObject, &mut SerializationContext) -> Result<Box<dyn Reflect>, SerializeError>;

/// Monomorphized accessors for `Vec<T>`.
#[derive(Clone, Copy)]
pub struct SequenceCodec {
    encode: Encode,
    decode: Decode,
}

fn encode<T: Any>(
    serializer: &Serializer,
    value: &dyn Any,
    ctx: &mut SerializationContext,
) -> Result<EchoObject, SerializeError> {
    let items = value
        .downcast_ref::<Vec<T>>()
        .ok_or_else(|| SerializeError::mismatch(std::any::type_name::<Vec<T>>(), "another type"))?;
    let list = EchoObject::new_list();
    for item in items {
        list.list_add(serializer.serialize(TypeInfo::of::<T>(), Some(item as &dyn Reflect), ctx)?)?;
    }
    Ok(list)
}

fn decode<T: Any>(
    serializer: &Serializer,
    node: &EchoObject,
    ctx: &mut SerializationContext,
) -> Result<Box<dyn Reflect>, SerializeError> {
    let items = node.list_items()?;
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let value = serializer
            .deserialize(Some(item), TypeInfo::of::<T>(), ctx)?
            .ok_or_else(|| SerializeError::Decode(format!("null element at index {index}")))?;
        out.push(downcast::<T>(value)?);
    }
    Ok(Box::new(out))
}

impl SequenceCodec {
    pub fn of<T: Any>() -> Self {
        Self {
            encode: encode::<T>,
            decode: decode::<T>,
        }
    }
}

fn codec(ty: TypeInfo, types: &TypeRegistry) -> Option<SequenceCodec> {
    match types.entry(ty)?.kind {
        TypeKind::Sequence { codec, .. } => Some(codec),
        _ => None,
    }
}

/// `Vec<T>` for registered element types, stored as a list.
pub struct SequenceFormat;

impl Format for SequenceFormat {
    fn name(&self) -> &str {
        "sequence"
    }

    fn can_handle(&self, ty: TypeInfo, types: &TypeRegistry) -> bool {
        codec(ty, types).is_some()
    }

    fn serialize(
        &self,
        serializer: &Serializer,
        ty: TypeInfo,
        value: &dyn Reflect,
        ctx: &mut SerializationContext,
    ) -> Result<EchoObject, SerializeError> {
        let codec = codec(ty, serializer.types()).ok_or_else(|| SerializeError::unsupported(ty.name()))?;
        (codec.encode)(serializer, value.as_any(), ctx)
    }

    fn deserialize(
        &self,
        serializer: &Serializer,
        node: &EchoObject,
        ty: TypeInfo,
        ctx: &mut SerializationContext,
    ) -> Result<Option<Box<dyn Reflect>>, SerializeError> {
        let codec = codec(ty, serializer.types()).ok_or_else(|| SerializeError::unsupported(ty.name()))?;
        (codec.decode)(serializer, node, ctx).map(Some)
    }
}
