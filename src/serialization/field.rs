//! Field value conversions
//!
//! `Field` maps a Rust value onto the document model (`serde_json::Value`)
//! and back. `from_value` returns `None` on a type mismatch; the `Reader`
//! turns that into the field's default.

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Number, Value};

use crate::packer::{Color, FloatRange, IntRange, Packable, Vec2, Vec2Int, Vec3};

/// How packed value types are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackStyle {
    /// Compact single-line token (`"1.5"`, `"3x4"`)
    #[default]
    Token,
    /// Structured JSON object (`{"min":1,"max":5}`)
    Structured,
}

/// A value that can live in a named field
pub trait Field: Sized {
    fn to_value(&self, style: PackStyle) -> Value;

    fn from_value(value: &Value) -> Option<Self>;
}

impl Field for bool {
    fn to_value(&self, _style: PackStyle) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

macro_rules! signed_field {
    ($($ty:ty),*) => {
        $(
            impl Field for $ty {
                fn to_value(&self, _style: PackStyle) -> Value {
                    Value::Number(Number::from(*self as i64))
                }

                fn from_value(value: &Value) -> Option<Self> {
                    value.as_i64().and_then(|n| <$ty>::try_from(n).ok())
                }
            }
        )*
    };
}

macro_rules! unsigned_field {
    ($($ty:ty),*) => {
        $(
            impl Field for $ty {
                fn to_value(&self, _style: PackStyle) -> Value {
                    Value::Number(Number::from(*self as u64))
                }

                fn from_value(value: &Value) -> Option<Self> {
                    value.as_u64().and_then(|n| <$ty>::try_from(n).ok())
                }
            }
        )*
    };
}

signed_field!(i8, i16, i32, i64, isize);
unsigned_field!(u8, u16, u32, u64, usize);

impl Field for f64 {
    fn to_value(&self, _style: PackStyle) -> Value {
        // Non-finite floats have no JSON form
        Number::from_f64(*self).map_or(Value::Null, Value::Number)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl Field for f32 {
    fn to_value(&self, style: PackStyle) -> Value {
        (*self as f64).to_value(style)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64().map(|n| n as f32)
    }
}

impl Field for String {
    fn to_value(&self, _style: PackStyle) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl<T: Field> Field for Option<T> {
    fn to_value(&self, style: PackStyle) -> Value {
        match self {
            Some(inner) => inner.to_value(style),
            None => Value::Null,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: Field> Field for Vec<T> {
    fn to_value(&self, style: PackStyle) -> Value {
        Value::Array(self.iter().map(|item| item.to_value(style)).collect())
    }

    /// Elements that do not convert are dropped
    fn from_value(value: &Value) -> Option<Self> {
        let items = value.as_array()?;
        Some(items.iter().filter_map(T::from_value).collect())
    }
}

impl<T: Field> Field for BTreeMap<String, T> {
    fn to_value(&self, style: PackStyle) -> Value {
        let map: Map<String, Value> = self
            .iter()
            .map(|(key, item)| (key.clone(), item.to_value(style)))
            .collect();
        Value::Object(map)
    }

    fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        Some(
            map.iter()
                .filter_map(|(key, item)| T::from_value(item).map(|v| (key.clone(), v)))
                .collect(),
        )
    }
}

impl<T: Field> Field for HashMap<String, T> {
    fn to_value(&self, style: PackStyle) -> Value {
        // Sorted keys keep the written text stable between saves
        let sorted: BTreeMap<&String, &T> = self.iter().collect();
        let map: Map<String, Value> = sorted
            .into_iter()
            .map(|(key, item)| (key.clone(), item.to_value(style)))
            .collect();
        Value::Object(map)
    }

    fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        Some(
            map.iter()
                .filter_map(|(key, item)| T::from_value(item).map(|v| (key.clone(), v)))
                .collect(),
        )
    }
}

/// Routes a packer type through its token or JSON-token form
macro_rules! packed_field {
    ($($ty:ty),*) => {
        $(
            impl Field for $ty {
                fn to_value(&self, style: PackStyle) -> Value {
                    match style {
                        PackStyle::Token => Value::String(self.pack()),
                        PackStyle::Structured => self.pack_json(),
                    }
                }

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::String(token) => Some(<$ty>::unpack(token)),
                        Value::Object(_) => Some(<$ty>::unpack_json(value)),
                        _ => None,
                    }
                }
            }
        )*
    };
}

packed_field!(IntRange, FloatRange, Vec2Int, Vec2, Vec3, Color);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_bounds_checked() {
        assert_eq!(u8::from_value(&json!(300)), None);
        assert_eq!(i32::from_value(&json!(-5)), Some(-5));
        assert_eq!(u32::from_value(&json!(-5)), None);
    }

    #[test]
    fn test_option_null() {
        assert_eq!(Option::<String>::from_value(&Value::Null), Some(None));
        assert_eq!(Some(4u8).to_value(PackStyle::Token), json!(4));
    }

    #[test]
    fn test_vec_drops_mismatched_elements() {
        let value = json!([1, "two", 3]);
        assert_eq!(Vec::<i32>::from_value(&value), Some(vec![1, 3]));
    }

    #[test]
    fn test_packed_styles() {
        let range = IntRange::new(1, 5);
        assert_eq!(range.to_value(PackStyle::Token), json!("1.5"));
        assert_eq!(range.to_value(PackStyle::Structured), json!({ "min": 1, "max": 5 }));
        // Either form reads back
        assert_eq!(IntRange::from_value(&json!("1.5")), Some(range));
        assert_eq!(IntRange::from_value(&json!({ "min": 1, "max": 5 })), Some(range));
        assert_eq!(IntRange::from_value(&json!(15)), None);
    }

    #[test]
    fn test_hash_map_written_sorted() {
        let mut map = HashMap::new();
        map.insert("b".to_string(), 2);
        map.insert("a".to_string(), 1);
        let text = serde_json::to_string(&map.to_value(PackStyle::Token)).unwrap();
        assert_eq!(text, r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn test_nan_writes_null() {
        assert_eq!(f64::NAN.to_value(PackStyle::Token), Value::Null);
    }
}
