//! Value conversion: raw environment text to a field's native type.
//!
//! The converter knows nothing about the configuration's shape. It is driven
//! by a [`TypeDesc`], the explicit description of a field's type, and produces
//! a dynamically-typed [`Value`] that the owning record folds back into the
//! real field through [`EnvValue`].
//!
//! Parsing follows the conventions of INI-style config files rather than
//! Rust's `FromStr`: booleans accept `yes`/`no`/`on`/`off` style tokens,
//! integers accept unsigned `0x` hexadecimal, numeric text may be padded with
//! whitespace, and sequences are comma-separated.

use std::any::Any;
use std::collections::HashMap;
use std::num::IntErrorKind;

use crate::error::{BoxError, ConversionError};

const TRUE_TOKENS: &[&str] = &["1", "t", "true", "y", "yes", "on"];
const FALSE_TOKENS: &[&str] = &["0", "f", "false", "n", "no", "off"];

/// Describes the native type of a field so the converter can target it.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDesc {
    String,
    Bool,
    Int(IntType),
    Float32,
    Float64,
    /// A single owned indirection (`Option<T>`, `Box<T>`).
    Pointer(Box<TypeDesc>),
    /// A comma-separated list (`Vec<T>`).
    Sequence(Box<TypeDesc>),
    /// A user type that parses itself from text. Takes precedence over
    /// every built-in rule.
    Text(TextType),
    Unsupported(&'static str),
}

/// A fixed-width integer type and its inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntType {
    pub name: &'static str,
    pub min: i128,
    pub max: i128,
}

/// Entry point for a [`FromText`] type.
#[derive(Debug, Clone, Copy)]
pub struct TextType {
    pub name: &'static str,
    parse: fn(&str) -> Result<Value, ConversionError>,
}

impl TextType {
    pub fn of<T: FromText>() -> Self {
        TextType {
            name: std::any::type_name::<T>(),
            parse: parse_text::<T>,
        }
    }
}

impl PartialEq for TextType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// A converted value, before it is written into a field.
#[derive(Debug)]
pub enum Value {
    String(String),
    Bool(bool),
    /// Any integer, already checked against the target width.
    Int(i128),
    Float(f64),
    Pointer(Box<Value>),
    Sequence(Vec<Value>),
    Text(Box<dyn Any + Send>),
}

impl Value {
    /// Recover a [`FromText`] value produced by [`TextType`].
    pub fn into_text<T: 'static>(self) -> Option<T> {
        match self {
            Value::Text(boxed) => boxed.downcast::<T>().ok().map(|b| *b),
            _ => None,
        }
    }
}

/// A type that knows how to parse itself from environment text.
///
/// Implement this for newtypes and enums, then expose the type to records
/// with [`impl_from_text!`](crate::impl_from_text). The parser is called
/// exactly once with the untouched raw text; its error is reported as the
/// cause of a [`ConversionError::Parse`].
pub trait FromText: Sized + Send + 'static {
    fn from_text(text: &str) -> Result<Self, BoxError>;
}

fn parse_text<T: FromText>(raw: &str) -> Result<Value, ConversionError> {
    T::from_text(raw)
        .map(|v| Value::Text(Box::new(v)))
        .map_err(|source| ConversionError::Parse {
            type_name: std::any::type_name::<T>(),
            raw: raw.to_string(),
            source,
        })
}

/// Convert `raw` into a value of the type described by `ty`.
///
/// First match wins: self-parsing types, pointers, strings, booleans,
/// integers, floats, sequences. Everything else is
/// [`ConversionError::Unsupported`].
pub fn convert(ty: &TypeDesc, raw: &str) -> Result<Value, ConversionError> {
    match ty {
        TypeDesc::Text(text) => (text.parse)(raw),
        TypeDesc::Pointer(inner) => Ok(Value::Pointer(Box::new(convert(inner, raw)?))),
        TypeDesc::String => Ok(Value::String(raw.to_string())),
        TypeDesc::Bool => parse_bool(raw).map(Value::Bool),
        TypeDesc::Int(int) => parse_int(int, raw).map(Value::Int),
        TypeDesc::Float32 => {
            let f = raw
                .trim()
                .parse::<f32>()
                .map_err(|e| ConversionError::parse("f32", raw, e))?;
            check_float_range("f32", raw, f.is_finite()).map(|()| Value::Float(f64::from(f)))
        }
        TypeDesc::Float64 => {
            let f = raw
                .trim()
                .parse::<f64>()
                .map_err(|e| ConversionError::parse("f64", raw, e))?;
            check_float_range("f64", raw, f.is_finite()).map(|()| Value::Float(f))
        }
        TypeDesc::Sequence(elem) => raw
            .split(',')
            .map(|part| convert(elem, part))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Sequence),
        TypeDesc::Unsupported(type_name) => Err(ConversionError::Unsupported { type_name }),
    }
}

/// Finite literals that parse to infinity are out of range. Spelled-out
/// `inf`, `infinity` and `nan` are accepted as written.
fn check_float_range(
    type_name: &'static str,
    raw: &str,
    finite: bool,
) -> Result<(), ConversionError> {
    if finite {
        return Ok(());
    }
    let text = raw.trim();
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    if ["inf", "infinity", "nan"].iter().any(|t| unsigned.eq_ignore_ascii_case(t)) {
        Ok(())
    } else {
        Err(ConversionError::Overflow {
            type_name,
            raw: raw.to_string(),
        })
    }
}

fn parse_bool(raw: &str) -> Result<bool, ConversionError> {
    let token: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    if TRUE_TOKENS.contains(&token.as_str()) {
        Ok(true)
    } else if FALSE_TOKENS.contains(&token.as_str()) {
        Ok(false)
    } else {
        Err(ConversionError::parse(
            "bool",
            raw,
            format!("{token:?} is not a boolean"),
        ))
    }
}

fn parse_int(int: &IntType, raw: &str) -> Result<i128, ConversionError> {
    let overflow = || ConversionError::Overflow {
        type_name: int.name,
        raw: raw.to_string(),
    };

    let text = raw.trim();
    // Hex is only recognized on unsigned text; "-0x5" is malformed.
    let (negative, digits, radix) = match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(hex) => (false, hex, 16),
        None => match text.strip_prefix('-') {
            Some(rest) => (true, rest, 10),
            None => (false, text.strip_prefix('+').unwrap_or(text), 10),
        },
    };
    // from_str_radix would accept a second sign here.
    if digits.starts_with(['+', '-']) {
        return Err(ConversionError::parse(int.name, raw, "invalid digit found in string"));
    }

    let magnitude = match u128::from_str_radix(digits, radix) {
        Ok(m) => m,
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => return Err(overflow()),
        Err(e) => return Err(ConversionError::parse(int.name, raw, e)),
    };
    let value = i128::try_from(magnitude)
        .ok()
        .map(|m| if negative { -m } else { m });
    match value {
        Some(v) if (int.min..=int.max).contains(&v) => Ok(v),
        _ => Err(overflow()),
    }
}

/// A field type the overlay can write.
///
/// Implemented for strings, booleans, fixed-width integers, floats,
/// `Option<T>`, `Box<T>` and `Vec<T>`. Arrays and maps implement it only to
/// report themselves as unsupported.
pub trait EnvValue: Sized {
    fn type_desc() -> TypeDesc;

    /// Narrow a converted value back to `Self`. `None` on a shape mismatch.
    fn from_value(value: Value) -> Option<Self>;

    /// Fold an environment-derived value into the current one.
    fn overlay(&mut self, incoming: Self) {
        *self = incoming;
    }
}

/// Convert `raw` straight into `T`.
pub fn parse_env<T: EnvValue>(raw: &str) -> Result<T, ConversionError> {
    let value = convert(&T::type_desc(), raw)?;
    T::from_value(value).ok_or(ConversionError::Unsupported {
        type_name: std::any::type_name::<T>(),
    })
}

#[doc(hidden)]
pub fn overlay_value<T: EnvValue>(slot: &mut T, value: Value) -> Result<(), ConversionError> {
    let incoming = T::from_value(value).ok_or(ConversionError::Unsupported {
        type_name: std::any::type_name::<T>(),
    })?;
    slot.overlay(incoming);
    Ok(())
}

#[doc(hidden)]
pub fn type_desc_of<R, T: EnvValue, F: Fn(&R) -> &T>(_field: F) -> TypeDesc {
    T::type_desc()
}

impl EnvValue for String {
    fn type_desc() -> TypeDesc {
        TypeDesc::String
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl EnvValue for bool {
    fn type_desc() -> TypeDesc {
        TypeDesc::Bool
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }
}

macro_rules! int_value {
    ($($ty:ty),* $(,)?) => {$(
        impl EnvValue for $ty {
            fn type_desc() -> TypeDesc {
                TypeDesc::Int(IntType {
                    name: stringify!($ty),
                    min: <$ty>::MIN as i128,
                    max: <$ty>::MAX as i128,
                })
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::Int(i) => <$ty>::try_from(i).ok(),
                    _ => None,
                }
            }
        }
    )*};
}

int_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl EnvValue for f32 {
    fn type_desc() -> TypeDesc {
        TypeDesc::Float32
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(f as f32),
            _ => None,
        }
    }
}

impl EnvValue for f64 {
    fn type_desc() -> TypeDesc {
        TypeDesc::Float64
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(f),
            _ => None,
        }
    }
}

impl<T: EnvValue> EnvValue for Option<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Pointer(Box::new(T::type_desc()))
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Pointer(inner) => T::from_value(*inner).map(Some),
            _ => None,
        }
    }
}

impl<T: EnvValue> EnvValue for Box<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Pointer(Box::new(T::type_desc()))
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Pointer(inner) => T::from_value(*inner).map(Box::new),
            _ => None,
        }
    }
}

impl<T: EnvValue> EnvValue for Vec<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Sequence(Box::new(T::type_desc()))
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Sequence(items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }

    fn overlay(&mut self, incoming: Self) {
        self.extend(incoming);
    }
}

impl<T, const N: usize> EnvValue for [T; N] {
    fn type_desc() -> TypeDesc {
        TypeDesc::Unsupported(std::any::type_name::<Self>())
    }

    fn from_value(_value: Value) -> Option<Self> {
        None
    }
}

impl<K, V, S> EnvValue for HashMap<K, V, S> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Unsupported(std::any::type_name::<Self>())
    }

    fn from_value(_value: Value) -> Option<Self> {
        None
    }
}
