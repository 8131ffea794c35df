//! Packed ARGB color decoding
//!
//! BBS stores colors as a single signed 32-bit integer: alpha in the high
//! byte, RGB in the low 24 bits. Themes carry that integer opaquely, so this
//! module only ever decodes it for display.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Display form of a packed ARGB color
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedColor {
    /// Lowercase `#rrggbb`
    pub hex: String,
    /// Alpha as a fraction in `0.0..=1.0`
    pub alpha: f32,
}

impl fmt::Display for DecodedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {:.2}", self.hex, self.alpha)
    }
}

/// Split a packed ARGB integer into hex RGB and alpha fraction
pub fn decode(argb: i32) -> DecodedColor {
    let bits = argb as u32;
    DecodedColor {
        hex: format!("#{:06x}", bits & 0x00FF_FFFF),
        alpha: ((bits >> 24) & 0xFF) as f32 / 255.0,
    }
}

/// Narrow a 64-bit integer to a packed color
///
/// Accepts both the signed and unsigned 32-bit ranges; unsigned values are
/// reinterpreted bit-for-bit so `0xFF000000` and `-16777216` are the same color.
pub fn narrow(value: i64) -> Option<i32> {
    i32::try_from(value)
        .ok()
        .or_else(|| u32::try_from(value).ok().map(|v| v as i32))
}

/// Read a packed color out of a JSON number
pub fn color_from_json(value: &Value) -> Option<i32> {
    value
        .as_i64()
        .or_else(|| value.as_u64().and_then(|v| i64::try_from(v).ok()))
        .and_then(narrow)
}
