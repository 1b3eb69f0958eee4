//! JSON text encoding.
//!
//! Null, bool, `Int`, finite `Double`, string, list and compound map to their
//! JSON counterparts. Every other kind is written as a single-key wrapper
//! object:
//!
//! | kind       | wrapper                         |
//! |------------|---------------------------------|
//! | `Byte`     | `{"$u8": 1}`                    |
//! | `SByte`    | `{"$i8": -1}`                   |
//! | `Short`    | `{"$i16": -1}`                  |
//! | `UShort`   | `{"$u16": 1}`                   |
//! | `UInt`     | `{"$u32": 1}`                   |
//! | `Long`     | `{"$i64": -1}`                  |
//! | `ULong`    | `{"$u64": 1}`                   |
//! | `Float`    | `{"$f32": 1.5}` or `{"$f32": "NaN"}` |
//! | `Double`   | `{"$f64": "Infinity"}` (non-finite only) |
//! | `Decimal`  | `{"$m": "1.25"}`                |
//! | `ByteArray`| `{"$bytes": "AQI="}`            |
//!
//! Compound keys that start with `$` are escaped by doubling the `$`, so a
//! wrapper can never be confused with a compound. Plain JSON numbers read back
//! as `Int` when they fit, then `Long`, then `ULong`, then `Double`.

use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use echo_core::{BigDecimal, EchoObject, Primitive, TagType};
use serde_json::{Map, Number, Value};

use crate::{CodecError, EchoCodec, EncodingFormat};

const U8: &str = "$u8";
const I8: &str = "$i8";
const I16: &str = "$i16";
const U16: &str = "$u16";
const U32: &str = "$u32";
const I64: &str = "$i64";
const U64: &str = "$u64";
const F32: &str = "$f32";
const F64: &str = "$f64";
const DECIMAL: &str = "$m";
const BYTES: &str = "$bytes";

const WRAPPERS: [&str; 11] = [U8, I8, I16, U16, U32, I64, U64, F32, F64, DECIMAL, BYTES];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextStyle {
    #[default]
    Compact,
    Pretty,
}

fn wrap(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

fn escape_key(key: &str) -> String {
    if key.starts_with('$') {
        format!("${key}")
    } else {
        key.to_string()
    }
}

fn unescape_key(key: &str) -> &str {
    match key.strip_prefix('$') {
        Some(rest) if rest.starts_with('$') => rest,
        _ => key,
    }
}

fn non_finite_name(value: f64) -> &'static str {
    if value.is_nan() {
        "NaN"
    } else if value > 0.0 {
        "Infinity"
    } else {
        "-Infinity"
    }
}

fn parse_non_finite(name: &str) -> Option<f64> {
    match name {
        "NaN" => Some(f64::NAN),
        "Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

fn float_value(value: f64) -> Value {
    match Number::from_f64(value) {
        Some(number) => Value::Number(number),
        None => Value::String(non_finite_name(value).to_string()),
    }
}

/// Converts a tree to a JSON value.
pub fn to_json(node: &EchoObject) -> Result<Value, CodecError> {
    Ok(match node.tag_type() {
        TagType::List => Value::Array(
            node.list_items()?
                .iter()
                .map(to_json)
                .collect::<Result<_, _>>()?,
        ),
        TagType::Compound => {
            let mut map = Map::new();
            for (key, child) in node.tags()? {
                map.insert(escape_key(&key), to_json(&child)?);
            }
            Value::Object(map)
        }
        _ => match node.primitive() {
            Some(primitive) => primitive_to_json(primitive),
            None => Value::Null,
        },
    })
}

fn primitive_to_json(value: Primitive) -> Value {
    match value {
        Primitive::Null => Value::Null,
        Primitive::Bool(v) => Value::Bool(v),
        Primitive::Int(v) => Value::from(v),
        Primitive::Double(v) if v.is_finite() => Value::from(v),
        Primitive::Double(v) => wrap(F64, float_value(v)),
        Primitive::String(v) => Value::String(v),
        Primitive::Byte(v) => wrap(U8, Value::from(v)),
        Primitive::SByte(v) => wrap(I8, Value::from(v)),
        Primitive::Short(v) => wrap(I16, Value::from(v)),
        Primitive::UShort(v) => wrap(U16, Value::from(v)),
        Primitive::UInt(v) => wrap(U32, Value::from(v)),
        Primitive::Long(v) => wrap(I64, Value::from(v)),
        Primitive::ULong(v) => wrap(U64, Value::from(v)),
        Primitive::Float(v) => wrap(F32, float_value(f64::from(v))),
        Primitive::Decimal(v) => wrap(DECIMAL, Value::String(v.to_string())),
        Primitive::ByteArray(v) => wrap(BYTES, Value::String(STANDARD.encode(v))),
    }
}

/// Converts a JSON value to a tree.
pub fn from_json(value: &Value) -> Result<EchoObject, CodecError> {
    Ok(match value {
        Value::Null => EchoObject::null(),
        Value::Bool(v) => (*v).into(),
        Value::Number(number) => number_to_node(number),
        Value::String(v) => v.as_str().into(),
        Value::Array(items) => {
            EchoObject::from_items(items.iter().map(from_json).collect::<Result<Vec<_>, _>>()?)?
        }
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some((key, inner)) = map.iter().next() {
                    if WRAPPERS.contains(&key.as_str()) {
                        return unwrap(key, inner);
                    }
                }
            }
            let compound = EchoObject::new_compound();
            for (key, child) in map {
                compound.add(unescape_key(key), from_json(child)?)?;
            }
            compound
        }
    })
}

fn number_to_node(number: &Number) -> EchoObject {
    if let Some(v) = number.as_i64() {
        return match i32::try_from(v) {
            Ok(small) => small.into(),
            Err(_) => v.into(),
        };
    }
    if let Some(v) = number.as_u64() {
        return v.into();
    }
    number.as_f64().unwrap_or(f64::NAN).into()
}

fn unwrap(key: &str, value: &Value) -> Result<EchoObject, CodecError> {
    let invalid = || CodecError::InvalidWrapper {
        key: key.to_string(),
    };
    let signed = || value.as_i64().ok_or_else(invalid);
    let unsigned = || value.as_u64().ok_or_else(invalid);
    let float = || match value {
        Value::Number(number) => number.as_f64().ok_or_else(invalid),
        Value::String(name) => parse_non_finite(name).ok_or_else(invalid),
        _ => Err(invalid()),
    };
    Ok(match key {
        U8 => u8::try_from(unsigned()?).map_err(|_| invalid())?.into(),
        I8 => i8::try_from(signed()?).map_err(|_| invalid())?.into(),
        I16 => i16::try_from(signed()?).map_err(|_| invalid())?.into(),
        U16 => u16::try_from(unsigned()?).map_err(|_| invalid())?.into(),
        U32 => u32::try_from(unsigned()?).map_err(|_| invalid())?.into(),
        I64 => signed()?.into(),
        U64 => unsigned()?.into(),
        F32 => (float()? as f32).into(),
        F64 => float()?.into(),
        DECIMAL => {
            let text = value.as_str().ok_or_else(invalid)?;
            BigDecimal::from_str(text)
                .map_err(|_| CodecError::InvalidDecimal(text.to_string()))?
                .into()
        }
        BYTES => {
            let text = value.as_str().ok_or_else(invalid)?;
            STANDARD.decode(text)?.into()
        }
        _ => return Err(invalid()),
    })
}

/// JSON text, compact or indented.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec {
    style: TextStyle,
}

impl TextCodec {
    pub fn new(style: TextStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> TextStyle {
        self.style
    }

    pub fn encode_to_string(&self, node: &EchoObject) -> Result<String, CodecError> {
        let value = to_json(node)?;
        Ok(match self.style {
            TextStyle::Compact => serde_json::to_string(&value)?,
            TextStyle::Pretty => serde_json::to_string_pretty(&value)?,
        })
    }

    pub fn decode_str(&self, text: &str) -> Result<EchoObject, CodecError> {
        let value: Value = serde_json::from_str(text)?;
        from_json(&value)
    }
}

impl EchoCodec for TextCodec {
    fn id(&self) -> &'static str {
        match self.style {
            TextStyle::Compact => "json",
            TextStyle::Pretty => "json-pretty",
        }
    }

    fn format(&self) -> EncodingFormat {
        EncodingFormat::Text
    }

    fn encode(&self, node: &EchoObject) -> Result<Vec<u8>, CodecError> {
        self.encode_to_string(node).map(String::into_bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<EchoObject, CodecError> {
        let value: Value = serde_json::from_slice(bytes)?;
        from_json(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_kinds_are_plain_json() {
        let node = EchoObject::from_entries([
            ("a", EchoObject::from(1i32)),
            ("b", EchoObject::from(1.5f64)),
            ("c", EchoObject::from("x")),
            ("d", EchoObject::from(true)),
            ("e", EchoObject::null()),
        ])
        .unwrap();
        assert_eq!(
            to_json(&node).unwrap(),
            json!({"a": 1, "b": 1.5, "c": "x", "d": true, "e": null})
        );
    }

    #[test]
    fn other_kinds_use_wrappers() {
        let cases = [
            (EchoObject::from(1u8), json!({"$u8": 1})),
            (EchoObject::from(-2i64), json!({"$i64": -2})),
            (EchoObject::from(vec![1u8, 2]), json!({"$bytes": "AQI="})),
            (EchoObject::from(f64::INFINITY), json!({"$f64": "Infinity"})),
            (EchoObject::from(f32::NAN), json!({"$f32": "NaN"})),
        ];
        for (node, expected) in cases {
            assert_eq!(to_json(&node).unwrap(), expected);
        }
    }

    #[test]
    fn dollar_keys_are_escaped() {
        let node = EchoObject::from_entries([
            ("$type", EchoObject::from("game.Player")),
            ("$u8", EchoObject::from(1i32)),
        ])
        .unwrap();
        let value = to_json(&node).unwrap();
        assert_eq!(value, json!({"$$type": "game.Player", "$$u8": 1}));
        let back = from_json(&value).unwrap();
        assert_eq!(back, node);

        let single = EchoObject::from_entries([("$u8", EchoObject::from(1i32))]).unwrap();
        assert_eq!(from_json(&to_json(&single).unwrap()).unwrap(), single);
    }

    #[test]
    fn plain_numbers_pick_the_narrowest_default_kind() {
        let cases = [
            (json!(5), TagType::Int),
            (json!(5_000_000_000i64), TagType::Long),
            (json!(u64::MAX), TagType::ULong),
            (json!(0.25), TagType::Double),
        ];
        for (value, tag) in cases {
            assert_eq!(from_json(&value).unwrap().tag_type(), tag, "{value}");
        }
    }

    #[test]
    fn malformed_wrappers_fail() {
        for value in [json!({"$u8": 300}), json!({"$m": 1}), json!({"$f32": "big"}), json!({"$bytes": "*"})] {
            assert!(from_json(&value).is_err(), "{value}");
        }
    }
}
