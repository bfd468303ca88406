//! Vector packers
//!
//! Grid coordinates pack as `"3x-4"`, float vectors as `;`-separated
//! components. A token with the wrong number of parts unpacks as the
//! default vector.

use serde_json::{Value, json};

use super::{Packable, json_f64, json_i32, parse_parts};

/// 2D integer grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Vec2Int {
    pub x: i32,
    pub y: i32,
}

impl Vec2Int {
    pub fn new(x: i32, y: i32) -> Self {
        Vec2Int { x, y }
    }
}

impl Packable for Vec2Int {
    const SEPARATOR: char = 'x';

    fn pack(&self) -> String {
        format!("{}{}{}", self.x, Self::SEPARATOR, self.y)
    }

    fn unpack(token: &str) -> Self {
        parse_parts::<i32, 2>(token, Self::SEPARATOR)
            .map(|[x, y]| Vec2Int { x, y })
            .unwrap_or_default()
    }

    fn pack_json(&self) -> Value {
        json!({ "x": self.x, "y": self.y })
    }

    fn unpack_json(value: &Value) -> Self {
        match (json_i32(value, "x"), json_i32(value, "y")) {
            (Some(x), Some(y)) => Vec2Int::new(x, y),
            _ => Vec2Int::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }
}

impl Packable for Vec2 {
    const SEPARATOR: char = ';';

    fn pack(&self) -> String {
        format!("{}{}{}", self.x, Self::SEPARATOR, self.y)
    }

    fn unpack(token: &str) -> Self {
        parse_parts::<f32, 2>(token, Self::SEPARATOR)
            .map(|[x, y]| Vec2 { x, y })
            .unwrap_or_default()
    }

    fn pack_json(&self) -> Value {
        json!({ "x": self.x, "y": self.y })
    }

    fn unpack_json(value: &Value) -> Self {
        match (json_f64(value, "x"), json_f64(value, "y")) {
            (Some(x), Some(y)) => Vec2::new(x as f32, y as f32),
            _ => Vec2::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Vec3 { x, y, z }
    }
}

impl Packable for Vec3 {
    const SEPARATOR: char = ';';

    fn pack(&self) -> String {
        let sep = Self::SEPARATOR;
        format!("{}{sep}{}{sep}{}", self.x, self.y, self.z)
    }

    fn unpack(token: &str) -> Self {
        parse_parts::<f32, 3>(token, Self::SEPARATOR)
            .map(|[x, y, z]| Vec3 { x, y, z })
            .unwrap_or_default()
    }

    fn pack_json(&self) -> Value {
        json!({ "x": self.x, "y": self.y, "z": self.z })
    }

    fn unpack_json(value: &Value) -> Self {
        match (
            json_f64(value, "x"),
            json_f64(value, "y"),
            json_f64(value, "z"),
        ) {
            (Some(x), Some(y), Some(z)) => Vec3::new(x as f32, y as f32, z as f32),
            _ => Vec3::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_coordinate_token() {
        let cell = Vec2Int::new(3, -4);
        assert_eq!(cell.pack(), "3x-4");
        assert_eq!(Vec2Int::unpack("3x-4"), cell);
    }

    #[test]
    fn test_shape_mismatch_is_default() {
        assert_eq!(Vec2Int::unpack("3x4x5"), Vec2Int::default());
        assert_eq!(Vec2::unpack("1.5"), Vec2::default());
        assert_eq!(Vec3::unpack("1;2"), Vec3::default());
    }

    #[test]
    fn test_vec3_token() {
        let v = Vec3::new(1.5, -2.0, 0.25);
        assert_eq!(v.pack(), "1.5;-2;0.25");
        assert_eq!(Vec3::unpack(&v.pack()), v);
    }

    #[test]
    fn test_vec2_json_token() {
        let v = Vec2::new(0.5, 4.0);
        assert_eq!(Vec2::unpack_json(&v.pack_json()), v);
        assert_eq!(Vec2::unpack_json(&serde_json::json!("0.5;4")), Vec2::default());
    }

    #[test]
    fn test_grid_coordinate_json_overflow_is_default() {
        let cell = Vec2Int::new(3, -4);
        assert_eq!(Vec2Int::unpack_json(&cell.pack_json()), cell);
        let huge = serde_json::json!({ "x": -4_294_967_296_i64, "y": 1 });
        assert_eq!(Vec2Int::unpack_json(&huge), Vec2Int::default());
    }
}
