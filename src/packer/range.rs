//! Numeric range packers
//!
//! Ranges pack as `"min.max"` (integers) and `"minxmax"` (floats). A token
//! that fails to parse is logged and unpacks as the zero-length range.

use serde_json::{Value, json};

use super::{Packable, json_f64, json_i32, parse_parts};

/// Inclusive integer range (spawn counts, level bands, reward amounts)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IntRange {
    pub min: i32,
    pub max: i32,
}

impl IntRange {
    pub const ZERO: IntRange = IntRange { min: 0, max: 0 };

    pub fn new(min: i32, max: i32) -> Self {
        IntRange { min, max }
    }

    pub fn contains(&self, value: i32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Number of integers covered (0 when `max < min`)
    pub fn len(&self) -> u32 {
        if self.max < self.min {
            0
        } else {
            (self.max as i64 - self.min as i64 + 1) as u32
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Packable for IntRange {
    const SEPARATOR: char = '.';

    fn pack(&self) -> String {
        format!("{}{}{}", self.min, Self::SEPARATOR, self.max)
    }

    fn unpack(token: &str) -> Self {
        match parse_parts::<i32, 2>(token, Self::SEPARATOR) {
            Some([min, max]) => IntRange { min, max },
            None => {
                log::warn!("Malformed int range token '{}', using zero range", token);
                IntRange::ZERO
            }
        }
    }

    fn pack_json(&self) -> Value {
        json!({ "min": self.min, "max": self.max })
    }

    fn unpack_json(value: &Value) -> Self {
        match (json_i32(value, "min"), json_i32(value, "max")) {
            (Some(min), Some(max)) => IntRange { min, max },
            _ => {
                log::warn!("Malformed int range object {}, using zero range", value);
                IntRange::ZERO
            }
        }
    }
}

/// Float range (timers, speed variance, drop chances)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FloatRange {
    pub min: f32,
    pub max: f32,
}

impl FloatRange {
    pub const ZERO: FloatRange = FloatRange { min: 0.0, max: 0.0 };

    pub fn new(min: f32, max: f32) -> Self {
        FloatRange { min, max }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Linear interpolation between `min` and `max`
    pub fn lerp(&self, t: f32) -> f32 {
        self.min + (self.max - self.min) * t
    }
}

impl Packable for FloatRange {
    const SEPARATOR: char = 'x';

    fn pack(&self) -> String {
        format!("{}{}{}", self.min, Self::SEPARATOR, self.max)
    }

    fn unpack(token: &str) -> Self {
        match parse_parts::<f32, 2>(token, Self::SEPARATOR) {
            Some([min, max]) => FloatRange { min, max },
            None => {
                log::warn!("Malformed float range token '{}', using zero range", token);
                FloatRange::ZERO
            }
        }
    }

    fn pack_json(&self) -> Value {
        json!({ "min": self.min, "max": self.max })
    }

    fn unpack_json(value: &Value) -> Self {
        match (json_f64(value, "min"), json_f64(value, "max")) {
            (Some(min), Some(max)) => FloatRange {
                min: min as f32,
                max: max as f32,
            },
            _ => {
                log::warn!("Malformed float range object {}, using zero range", value);
                FloatRange::ZERO
            }
        }
    }
}
