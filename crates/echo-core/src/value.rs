//! Typed reads with conversion between primitive kinds.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use indexmap::IndexMap;

use crate::node::Payload;
use crate::EchoObject;

/// Conversion out of a node. Returns `None` when the node's kind cannot be
/// converted or the value does not fit.
pub trait FromEcho: Sized {
    fn from_echo(node: &EchoObject) -> Option<Self>;
}

impl EchoObject {
    /// Reads the value as `T`, falling back to `default` on any mismatch.
    pub fn get_value<T: FromEcho>(&self, default: T) -> T {
        T::from_echo(self).unwrap_or(default)
    }

    pub fn try_value<T: FromEcho>(&self) -> Option<T> {
        T::from_echo(self)
    }
}

enum Number {
    Integer(i128),
    Float(f64),
    Decimal(BigDecimal),
}

fn number(payload: &Payload) -> Option<Number> {
    Some(match payload {
        Payload::Byte(v) => Number::Integer((*v).into()),
        Payload::SByte(v) => Number::Integer((*v).into()),
        Payload::Short(v) => Number::Integer((*v).into()),
        Payload::UShort(v) => Number::Integer((*v).into()),
        Payload::Int(v) => Number::Integer((*v).into()),
        Payload::UInt(v) => Number::Integer((*v).into()),
        Payload::Long(v) => Number::Integer((*v).into()),
        Payload::ULong(v) => Number::Integer((*v).into()),
        Payload::Float(v) => Number::Float((*v).into()),
        Payload::Double(v) => Number::Float(*v),
        Payload::Decimal(v) => Number::Decimal(v.clone()),
        Payload::Bool(v) => Number::Integer(i128::from(*v)),
        Payload::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i128>() {
                Number::Integer(i)
            } else if let Ok(d) = BigDecimal::from_str(s) {
                Number::Decimal(d)
            } else {
                Number::Float(s.parse::<f64>().ok()?)
            }
        }
        _ => return None,
    })
}

/// Sign, significant digits without trailing zeros, and power of ten of a
/// decimal. Never scales the value, so huge exponents stay cheap.
fn decimal_parts(d: &BigDecimal) -> (bool, String, i64) {
    let (int, scale) = d.as_bigint_and_exponent();
    let text = int.to_string();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.as_str()),
    };
    let significant = digits.trim_end_matches('0');
    let zeros = (digits.len() - significant.len()) as i64;
    (negative, significant.to_string(), zeros.saturating_sub(scale))
}

fn decimal_to_integer(d: &BigDecimal) -> Option<i128> {
    let (negative, digits, exponent) = decimal_parts(d);
    if digits.is_empty() {
        return Some(0);
    }
    // i128 holds at most 39 digits
    if exponent < 0 || digits.len() as i64 + exponent > 39 {
        return None;
    }
    let mut value: i128 = digits.parse().ok()?;
    for _ in 0..exponent {
        value = value.checked_mul(10)?;
    }
    Some(if negative { -value } else { value })
}

fn decimal_to_float(d: &BigDecimal) -> Option<f64> {
    let (negative, digits, exponent) = decimal_parts(d);
    if digits.is_empty() {
        return Some(0.0);
    }
    let sign = if negative { "-" } else { "" };
    format!("{sign}{digits}e{exponent}").parse().ok()
}

fn as_integer(number: Number) -> Option<i128> {
    match number {
        Number::Integer(i) => Some(i),
        Number::Float(f) => {
            if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e38 {
                Some(f as i128)
            } else {
                None
            }
        }
        Number::Decimal(d) => decimal_to_integer(&d),
    }
}

fn as_float(number: Number) -> Option<f64> {
    match number {
        Number::Integer(i) => Some(i as f64),
        Number::Float(f) => Some(f),
        Number::Decimal(d) => decimal_to_float(&d),
    }
}

macro_rules! integer_from_echo {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromEcho for $ty {
                fn from_echo(node: &EchoObject) -> Option<Self> {
                    let value = number(&node.inner.borrow().payload).and_then(as_integer)?;
                    <$ty>::try_from(value).ok()
                }
            }
        )*
    };
}

integer_from_echo!(u8, i8, i16, u16, i32, u32, i64, u64, usize, i128);

impl FromEcho for f64 {
    fn from_echo(node: &EchoObject) -> Option<Self> {
        number(&node.inner.borrow().payload).and_then(as_float)
    }
}

impl FromEcho for f32 {
    fn from_echo(node: &EchoObject) -> Option<Self> {
        f64::from_echo(node).map(|f| f as f32)
    }
}

impl FromEcho for BigDecimal {
    fn from_echo(node: &EchoObject) -> Option<Self> {
        match number(&node.inner.borrow().payload)? {
            Number::Integer(i) => BigDecimal::from_str(&i.to_string()).ok(),
            Number::Float(f) if f.is_finite() => BigDecimal::from_str(&f.to_string()).ok(),
            Number::Float(_) => None,
            Number::Decimal(d) => Some(d),
        }
    }
}

impl FromEcho for bool {
    fn from_echo(node: &EchoObject) -> Option<Self> {
        match &node.inner.borrow().payload {
            Payload::Bool(b) => Some(*b),
            Payload::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            other => number(other).and_then(as_integer).map(|i| i != 0),
        }
    }
}

impl FromEcho for String {
    fn from_echo(node: &EchoObject) -> Option<Self> {
        Some(match &node.inner.borrow().payload {
            Payload::String(s) => s.clone(),
            Payload::Byte(v) => v.to_string(),
            Payload::SByte(v) => v.to_string(),
            Payload::Short(v) => v.to_string(),
            Payload::UShort(v) => v.to_string(),
            Payload::Int(v) => v.to_string(),
            Payload::UInt(v) => v.to_string(),
            Payload::Long(v) => v.to_string(),
            Payload::ULong(v) => v.to_string(),
            Payload::Float(v) => v.to_string(),
            Payload::Double(v) => v.to_string(),
            Payload::Decimal(v) => v.to_string(),
            Payload::Bool(v) => v.to_string(),
            _ => return None,
        })
    }
}

impl FromEcho for char {
    fn from_echo(node: &EchoObject) -> Option<Self> {
        let s = String::from_echo(node)?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }
}

impl FromEcho for Vec<u8> {
    fn from_echo(node: &EchoObject) -> Option<Self> {
        match &node.inner.borrow().payload {
            Payload::ByteArray(bytes) => Some(bytes.clone()),
            _ => None,
        }
    }
}

impl FromEcho for EchoObject {
    fn from_echo(node: &EchoObject) -> Option<Self> {
        Some(node.clone())
    }
}

impl FromEcho for Vec<EchoObject> {
    fn from_echo(node: &EchoObject) -> Option<Self> {
        node.list_items().ok()
    }
}

impl FromEcho for IndexMap<String, EchoObject> {
    fn from_echo(node: &EchoObject) -> Option<Self> {
        node.tags().ok().map(|tags| tags.into_iter().collect())
    }
}

impl<T: FromEcho> FromEcho for Option<T> {
    fn from_echo(node: &EchoObject) -> Option<Self> {
        if node.is_null() {
            return Some(None);
        }
        T::from_echo(node).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_kinds_convert_when_in_range() {
        let node = EchoObject::from(300i32);
        assert_eq!(node.get_value(0i64), 300);
        assert_eq!(node.get_value(7u8), 7);
        assert_eq!(node.get_value(0.0f64), 300.0);
        assert_eq!(EchoObject::from(2.0f64).try_value::<u16>(), Some(2));
        assert_eq!(EchoObject::from(2.5f64).try_value::<u16>(), None);
    }

    #[test]
    fn strings_parse_into_numbers_and_bools() {
        assert_eq!(EchoObject::from(" 42 ").try_value::<i32>(), Some(42));
        assert_eq!(EchoObject::from("1.5").try_value::<f64>(), Some(1.5));
        assert_eq!(EchoObject::from("True").try_value::<bool>(), Some(true));
        assert_eq!(EchoObject::from("x").get_value(9i32), 9);
    }

    #[test]
    fn decimals_round_trip_through_text() {
        let decimal = BigDecimal::from_str("12.50").unwrap();
        let node = EchoObject::from(decimal.clone());
        assert_eq!(node.try_value::<BigDecimal>(), Some(decimal));
        assert_eq!(node.try_value::<i32>(), None);
        assert_eq!(EchoObject::from(BigDecimal::from_str("12").unwrap()).try_value::<i32>(), Some(12));
        assert_eq!(EchoObject::from(7i32).try_value::<BigDecimal>(), BigDecimal::from_str("7").ok());
    }

    #[test]
    fn huge_decimal_exponents_fall_back_to_defaults() {
        let huge = EchoObject::from(BigDecimal::from_str("1e200000000").unwrap());
        assert_eq!(huge.get_value(-1i32), -1);
        assert_eq!(huge.try_value::<u64>(), None);
        assert_eq!(huge.try_value::<f64>(), Some(f64::INFINITY));
        let tiny = EchoObject::from(BigDecimal::from_str("-1e-200000000").unwrap());
        assert_eq!(tiny.get_value(5i64), 5);
        assert_eq!(tiny.try_value::<f64>(), Some(-0.0));
        assert_eq!(EchoObject::from("1e200000000").get_value(3i32), 3);
        let exact = EchoObject::from(BigDecimal::from_str("-1.2e3").unwrap());
        assert_eq!(exact.try_value::<i32>(), Some(-1200));
        assert_eq!(exact.try_value::<f64>(), Some(-1200.0));
    }

    #[test]
    fn everything_primitive_formats_as_string() {
        assert_eq!(EchoObject::from(true).get_value(String::new()), "true");
        assert_eq!(EchoObject::from(5u64).get_value(String::new()), "5");
        assert_eq!(EchoObject::new_list().try_value::<String>(), None);
    }

    #[test]
    fn optional_reads_treat_null_as_none() {
        assert_eq!(EchoObject::null().try_value::<Option<i32>>(), Some(None));
        assert_eq!(EchoObject::from(3i32).try_value::<Option<i32>>(), Some(Some(3)));
        assert_eq!(EchoObject::from(vec![1u8, 2]).try_value::<Vec<u8>>(), Some(vec![1, 2]));
    }
}
