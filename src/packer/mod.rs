//! Value packers
//!
//! A packer turns a small value type (range, vector, colour) into a compact
//! single-line token and back. Each type registers its packer by
//! implementing `Packable`; the serialization layer picks it up through the
//! `Field` impls generated by `packed_field!`.
//!
//! Every packer also has a JSON-token form (`{"min":..,"max":..}` and so on)
//! for serializers that prefer structured output.
//!
//! - `range`: `IntRange`, `FloatRange`
//! - `vector`: `Vec2Int`, `Vec2`, `Vec3`
//! - `color`: `Color`

pub mod color;
pub mod range;
pub mod vector;

pub use color::Color;
pub use range::{FloatRange, IntRange};
pub use vector::{Vec2, Vec2Int, Vec3};

use serde_json::Value;

/// Bidirectional text codec for a value type
///
/// `pack` must be deterministic and never emit a newline. `unpack` must
/// accept everything `pack` produces; on malformed input it returns a
/// default value instead of failing.
pub trait Packable: Sized {
    /// Separator between the token's components
    const SEPARATOR: char;

    fn pack(&self) -> String;

    fn unpack(token: &str) -> Self;

    fn pack_json(&self) -> Value;

    fn unpack_json(value: &Value) -> Self;
}

/// Splits `token` on `sep` and parses exactly `N` components
pub(crate) fn parse_parts<T: std::str::FromStr, const N: usize>(
    token: &str,
    sep: char,
) -> Option<[T; N]> {
    let values: Vec<T> = token
        .trim()
        .split(sep)
        .map(|part| part.trim().parse().ok())
        .collect::<Option<Vec<T>>>()?;
    values.try_into().ok()
}

/// Reads a numeric member of a JSON-token object
pub(crate) fn json_f64(value: &Value, name: &str) -> Option<f64> {
    value.get(name).and_then(Value::as_f64)
}

pub(crate) fn json_i64(value: &Value, name: &str) -> Option<i64> {
    value.get(name).and_then(Value::as_i64)
}

/// `None` when absent or outside the `i32` range
pub(crate) fn json_i32(value: &Value, name: &str) -> Option<i32> {
    json_i64(value, name).and_then(|n| i32::try_from(n).ok())
}
