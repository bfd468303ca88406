//! Colour packer
//!
//! Channels are quantized from 0..1 floats to bytes before encoding, so a
//! packed colour reproduces the same displayed colour at byte precision,
//! not the original float bits.

use serde_json::{Value, json};

use super::{Packable, json_i64, parse_parts};

/// RGBA colour with float channels in 0..1
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color { r, g, b, a }
    }

    pub fn from_bytes([r, g, b, a]: [u8; 4]) -> Self {
        Color {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    /// Quantized channels
    pub fn to_bytes(&self) -> [u8; 4] {
        [
            quantize(self.r),
            quantize(self.g),
            quantize(self.b),
            quantize(self.a),
        ]
    }
}

fn quantize(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl Packable for Color {
    const SEPARATOR: char = '.';

    fn pack(&self) -> String {
        let [r, g, b, a] = self.to_bytes();
        let sep = Self::SEPARATOR;
        format!("{r}{sep}{g}{sep}{b}{sep}{a}")
    }

    fn unpack(token: &str) -> Self {
        parse_parts::<u8, 4>(token, Self::SEPARATOR)
            .map(Color::from_bytes)
            .unwrap_or_default()
    }

    fn pack_json(&self) -> Value {
        let [r, g, b, a] = self.to_bytes();
        json!({ "r": r, "g": g, "b": b, "a": a })
    }

    fn unpack_json(value: &Value) -> Self {
        let channel = |name| json_i64(value, name).map(|c| c.clamp(0, 255) as u8);
        match (channel("r"), channel("g"), channel("b"), channel("a")) {
            (Some(r), Some(g), Some(b), Some(a)) => Color::from_bytes([r, g, b, a]),
            _ => Color::default(),
        }
    }
}
