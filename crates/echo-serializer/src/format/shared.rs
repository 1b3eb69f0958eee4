use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use echo_core::EchoObject;

use super::{object, Format};
use crate::{
    downcast, Reflect, SerializationContext, SerializeError, Serializer, TypeInfo, TypeKind,
    TypeRegistry, ID_KEY, REF_KEY, VALUE_KEY,
};

/// A handle that may be referenced from several places, or from itself.
pub type Shared<T> = Rc<RefCell<T>>;

type Encode = fn(&Serializer, &dyn Any, &mut SerializationContext) -> Result<EchoObject, SerializeError>;
type Decode = fn(
    &Serializer,
    &EchoObject,
    &mut SerializationContext,
) -> Result<Option<Box<dyn Reflect>>, SerializeError>;

/// Monomorphized accessors for `Shared<T>` or `Option<Shared<T>>`.
#[derive(Clone, Copy)]
pub struct SharedCodec {
    encode: Encode,
    decode: Decode,
}

fn reference(id: u32) -> Result<EchoObject, SerializeError> {
    Ok(EchoObject::from_entries([(REF_KEY, EchoObject::from(id))])?)
}

fn address<T>(handle: &Shared<T>) -> usize {
    Rc::as_ptr(handle) as *const () as usize
}

fn encode_handle<T: Any>(
    serializer: &Serializer,
    handle: &Shared<T>,
    ctx: &mut SerializationContext,
) -> Result<EchoObject, SerializeError> {
    let key = address(handle);
    if let Some(id) = ctx.id_of(key) {
        return reference(id);
    }
    let id = ctx.register(key, handle.clone() as Rc<dyn Any>);
    let inner = handle
        .try_borrow()
        .map_err(|_| SerializeError::Decode(format!("shared {} is mutably borrowed", std::any::type_name::<T>())))?;
    let body = serializer.serialize(TypeInfo::of::<T>(), Some(&*inner as &dyn Reflect), ctx)?;
    drop(inner);

    let out = EchoObject::new_compound();
    out.add(ID_KEY, id.into())?;
    if body.is_compound() {
        for (key, child) in body.tags()? {
            body.remove(&key)?;
            out.set(&key, child)?;
        }
    } else {
        out.add(VALUE_KEY, body)?;
    }
    Ok(out)
}

fn encode<T: Any>(
    serializer: &Serializer,
    value: &dyn Any,
    ctx: &mut SerializationContext,
) -> Result<EchoObject, SerializeError> {
    if let Some(handle) = value.downcast_ref::<Shared<T>>() {
        return encode_handle(serializer, handle, ctx);
    }
    match value.downcast_ref::<Option<Shared<T>>>() {
        Some(Some(handle)) => encode_handle(serializer, handle, ctx),
        Some(None) => Ok(EchoObject::null()),
        None => Err(SerializeError::mismatch(
            std::any::type_name::<Shared<T>>(),
            "another type",
        )),
    }
}

fn stored_id(node: &EchoObject, key: &str) -> Option<u32> {
    node.get(key).and_then(|id| id.try_value::<u32>())
}

fn decode_handle<T: Any>(
    serializer: &Serializer,
    node: &EchoObject,
    ctx: &mut SerializationContext,
) -> Result<Shared<T>, SerializeError> {
    if let Some(id) = stored_id(node, REF_KEY) {
        let object = ctx
            .object_for(id)
            .ok_or_else(|| SerializeError::Decode(format!("reference to unknown object {id}")))?;
        return object
            .downcast::<RefCell<T>>()
            .map_err(|_| SerializeError::mismatch(std::any::type_name::<T>(), "another shared type"));
    }
    let ty = TypeInfo::of::<T>();
    let Some(descriptor) = serializer.types().descriptor(ty) else {
        // not a described struct: the payload sits under `$value`
        let payload = node.get(VALUE_KEY).unwrap_or_else(|| node.clone());
        let value = serializer
            .deserialize(Some(&payload), ty, ctx)?
            .ok_or_else(|| SerializeError::Decode(format!("null shared {ty}")))?;
        let handle = Rc::new(RefCell::new(downcast::<T>(value)?));
        if let Some(id) = stored_id(node, ID_KEY) {
            ctx.register_with_id(id, address(&handle), handle.clone());
        }
        return Ok(handle);
    };
    let handle = Rc::new(RefCell::new(downcast::<T>((descriptor.create)())?));
    // registered before the fields so that cycles resolve to this handle
    if let Some(id) = stored_id(node, ID_KEY) {
        ctx.register_with_id(id, address(&handle), handle.clone());
    }
    {
        let mut inner = handle.borrow_mut();
        object::populate(serializer, &descriptor, &mut *inner, node, ctx)?;
    }
    Ok(handle)
}

fn decode<T: Any>(
    serializer: &Serializer,
    node: &EchoObject,
    ctx: &mut SerializationContext,
) -> Result<Option<Box<dyn Reflect>>, SerializeError> {
    let handle = decode_handle::<T>(serializer, node, ctx)?;
    Ok(Some(Box::new(handle)))
}

fn decode_optional<T: Any>(
    serializer: &Serializer,
    node: &EchoObject,
    ctx: &mut SerializationContext,
) -> Result<Option<Box<dyn Reflect>>, SerializeError> {
    if node.is_null() {
        return Ok(Some(Box::new(None::<Shared<T>>)));
    }
    let handle = decode_handle::<T>(serializer, node, ctx)?;
    Ok(Some(Box::new(Some(handle))))
}

impl SharedCodec {
    pub fn of<T: Any>() -> Self {
        Self {
            encode: encode::<T>,
            decode: decode::<T>,
        }
    }

    pub fn optional_of<T: Any>() -> Self {
        Self {
            encode: encode::<T>,
            decode: decode_optional::<T>,
        }
    }
}

fn codec(ty: TypeInfo, types: &TypeRegistry) -> Option<SharedCodec> {
    match types.entry(ty)?.kind {
        TypeKind::Shared { codec, .. } => Some(codec),
        _ => None,
    }
}

/// Shared handles. The first occurrence of an object is written in full with
/// an `$id`; later occurrences are written as `{ "$ref": id }`.
pub struct SharedFormat;

impl Format for SharedFormat {
    fn name(&self) -> &str {
        "shared"
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
        (codec.decode)(serializer, node, ctx)
    }
}
