use std::any::Any;
use std::sync::OnceLock;

use bigdecimal::BigDecimal;
use echo_core::{EchoObject, FromEcho};
use uuid::Uuid;

use super::Format;
use crate::{Reflect, SerializationContext, SerializeError, Serializer, TypeInfo, TypeRegistry};

/// Built-in scalar type with its compact code.
pub(crate) struct PrimitiveEntry {
    pub(crate) info: TypeInfo,
    pub(crate) code: &'static str,
    encode: fn(&dyn Any) -> Option<EchoObject>,
    decode: fn(&EchoObject) -> Option<Box<dyn Reflect>>,
}

fn encode<T: Any + Clone + Into<EchoObject>>(value: &dyn Any) -> Option<EchoObject> {
    value.downcast_ref::<T>().cloned().map(Into::into)
}

fn decode<T: Any + FromEcho>(node: &EchoObject) -> Option<Box<dyn Reflect>> {
    node.try_value::<T>()
        .map(|value| Box::new(value) as Box<dyn Reflect>)
}

fn encode_char(value: &dyn Any) -> Option<EchoObject> {
    value
        .downcast_ref::<char>()
        .map(|c| EchoObject::from(c.to_string()))
}

fn encode_uuid(value: &dyn Any) -> Option<EchoObject> {
    value
        .downcast_ref::<Uuid>()
        .map(|id| EchoObject::from(id.hyphenated().to_string()))
}

fn decode_uuid(node: &EchoObject) -> Option<Box<dyn Reflect>> {
    let text = node.try_value::<String>()?;
    Uuid::parse_str(&text)
        .ok()
        .map(|id| Box::new(id) as Box<dyn Reflect>)
}

fn entry<T: Any + Clone + Into<EchoObject> + FromEcho>(code: &'static str) -> PrimitiveEntry {
    PrimitiveEntry {
        info: TypeInfo::of::<T>(),
        code,
        encode: encode::<T>,
        decode: decode::<T>,
    }
}

pub(crate) fn primitive_table() -> &'static [PrimitiveEntry] {
    static TABLE: OnceLock<Vec<PrimitiveEntry>> = OnceLock::new();
    TABLE.get_or_init(|| {
        vec![
            entry::<u8>("b"),
            entry::<i8>("sb"),
            entry::<i16>("s"),
            entry::<u16>("us"),
            entry::<i32>("i"),
            entry::<u32>("ui"),
            entry::<i64>("l"),
            entry::<u64>("ul"),
            entry::<f32>("f"),
            entry::<f64>("d"),
            entry::<BigDecimal>("m"),
            entry::<String>("st"),
            entry::<bool>("bl"),
            entry::<Vec<u8>>("ba"),
            PrimitiveEntry {
                info: TypeInfo::of::<char>(),
                code: "c",
                encode: encode_char,
                decode: decode::<char>,
            },
            PrimitiveEntry {
                info: TypeInfo::of::<Uuid>(),
                code: "g",
                encode: encode_uuid,
                decode: decode_uuid,
            },
        ]
    })
}

fn lookup(ty: TypeInfo) -> Option<&'static PrimitiveEntry> {
    primitive_table().iter().find(|entry| entry.info == ty)
}

/// Numbers, strings, booleans, chars, byte arrays and decimals, stored as the
/// matching primitive node. UUIDs are stored as their hyphenated string.
pub struct PrimitiveFormat;

impl Format for PrimitiveFormat {
    fn name(&self) -> &str {
        "primitive"
    }

    fn can_handle(&self, ty: TypeInfo, _types: &TypeRegistry) -> bool {
        lookup(ty).is_some()
    }

    fn serialize(
        &self,
        _serializer: &Serializer,
        ty: TypeInfo,
        value: &dyn Reflect,
        _ctx: &mut SerializationContext,
    ) -> Result<EchoObject, SerializeError> {
        let entry = lookup(ty).ok_or_else(|| SerializeError::unsupported(ty.name()))?;
        (entry.encode)(value.as_any())
            .ok_or_else(|| SerializeError::mismatch(ty.name(), value.type_info().name()))
    }

    fn deserialize(
        &self,
        _serializer: &Serializer,
        node: &EchoObject,
        ty: TypeInfo,
        _ctx: &mut SerializationContext,
    ) -> Result<Option<Box<dyn Reflect>>, SerializeError> {
        let entry = lookup(ty).ok_or_else(|| SerializeError::unsupported(ty.name()))?;
        (entry.decode)(node)
            .map(Some)
            .ok_or_else(|| SerializeError::Decode(format!("cannot read {} as {}", node.tag_type(), ty)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use echo_core::TagType;

    #[test]
    fn codes_are_unique() {
        let mut codes: Vec<_> = primitive_table().iter().map(|entry| entry.code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), primitive_table().len());
    }

    #[test]
    fn encodes_to_matching_tags() {
        let cases: Vec<(Box<dyn Reflect>, TagType)> = vec![
            (Box::new(1u8), TagType::Byte),
            (Box::new(-1i8), TagType::SByte),
            (Box::new(2u64), TagType::ULong),
            (Box::new(1.5f32), TagType::Float),
            (Box::new('x'), TagType::String),
            (Box::new(vec![1u8, 2]), TagType::ByteArray),
            (Box::new(true), TagType::Bool),
            (Box::new(Uuid::nil()), TagType::String),
        ];
        for (value, tag) in cases {
            let ty = (*value).type_info();
            let entry = lookup(ty).unwrap();
            let node = (entry.encode)((*value).as_any()).unwrap();
            assert_eq!(node.tag_type(), tag, "{ty}");
        }
    }

    #[test]
    fn uuids_read_back_from_strings() {
        let entry = lookup(TypeInfo::of::<Uuid>()).unwrap();
        let id = Uuid::new_v4();
        let node = (entry.encode)(&id).unwrap();
        let back = (entry.decode)(&node).unwrap();
        assert_eq!((*back).as_any().downcast_ref::<Uuid>(), Some(&id));
        assert!((entry.decode)(&EchoObject::from("not-a-uuid")).is_none());
    }
}
