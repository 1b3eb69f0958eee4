use std::any::Any;

use echo_core::{EchoObject, TagType};
use tracing::trace;

use super::Format;
use crate::{
    Reflect, SerializationContext, SerializeError, Serializer, TypeDescriptor, TypeInfo,
    TypeRegistry,
};

/// Writes every field of `owner` into a new compound.
pub(crate) fn write_fields(
    serializer: &Serializer,
    descriptor: &TypeDescriptor,
    owner: &dyn Any,
    ctx: &mut SerializationContext,
) -> Result<EchoObject, SerializeError> {
    let out = EchoObject::new_compound();
    for field in &descriptor.fields {
        if !field.should_write(owner) {
            trace!(field = field.name, "field skipped by guard");
            continue;
        }
        let value = serializer.serialize(field.declared, (field.get)(owner), ctx)?;
        out.set(field.name, value)?;
    }
    Ok(out)
}

/// Reads fields from `node` into an existing value. Missing fields, and
/// fields stored as null, keep their current value.
pub(crate) fn populate(
    serializer: &Serializer,
    descriptor: &TypeDescriptor,
    owner: &mut dyn Any,
    node: &EchoObject,
    ctx: &mut SerializationContext,
) -> Result<(), SerializeError> {
    if node.tag_type() != TagType::Compound {
        return Err(SerializeError::Decode(format!(
            "structs are stored as compounds, found {}",
            node.tag_type()
        )));
    }
    for field in &descriptor.fields {
        let stored = std::iter::once(field.name)
            .chain(field.aliases.iter().copied())
            .find_map(|name| node.get(name));
        let Some(stored) = stored else {
            continue;
        };
        let Some(value) = serializer.deserialize(Some(&stored), field.declared, ctx)? else {
            continue;
        };
        let found = (*value).type_info();
        if !(field.set)(owner, value) {
            return Err(SerializeError::mismatch(field.declared.name(), found.name()));
        }
    }
    Ok(())
}

/// The catch-all: structs described with a [`TypeDescriptor`]. Types without
/// a descriptor fail with [`SerializeError::UnsupportedType`].
pub struct ObjectFormat;

impl Format for ObjectFormat {
    fn name(&self) -> &str {
        "object"
    }

    fn can_handle(&self, _ty: TypeInfo, _types: &TypeRegistry) -> bool {
        true
    }

    fn serialize(
        &self,
        serializer: &Serializer,
        ty: TypeInfo,
        value: &dyn Reflect,
        ctx: &mut SerializationContext,
    ) -> Result<EchoObject, SerializeError> {
        let descriptor = serializer
            .types()
            .descriptor(ty)
            .ok_or_else(|| SerializeError::unsupported(ty.name()))?;
        write_fields(serializer, &descriptor, value.as_any(), ctx)
    }

    fn deserialize(
        &self,
        serializer: &Serializer,
        node: &EchoObject,
        ty: TypeInfo,
        ctx: &mut SerializationContext,
    ) -> Result<Option<Box<dyn Reflect>>, SerializeError> {
        let descriptor = serializer
            .types()
            .descriptor(ty)
            .ok_or_else(|| SerializeError::unsupported(ty.name()))?;
        let mut value = (descriptor.create)();
        populate(serializer, &descriptor, (*value).as_any_mut(), node, ctx)?;
        Ok(Some(value))
    }
}
