use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// An 8-bit sRGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Rounds a real-valued point in RGB space to the nearest representable color.
    pub fn from_point(point: [f64; 3]) -> Self {
        let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        Self::new(channel(point[0]), channel(point[1]), channel(point[2]))
    }

    pub fn to_point(self) -> [f64; 3] {
        [self.r as f64, self.g as f64, self.b as f64]
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Parses six hex digits with an optional single leading `#`.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn is_valid_hex(s: &str) -> bool {
        Self::parse_hex(s).is_some()
    }

    /// Squared Euclidean distance; exact in integers so ties compare equal.
    pub fn distance_squared(self, other: RgbColor) -> u32 {
        let d = |a: u8, b: u8| {
            let diff = a as i32 - b as i32;
            (diff * diff) as u32
        };
        d(self.r, other.r) + d(self.g, other.g) + d(self.b, other.b)
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for RgbColor {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
            .ok_or_else(|| AppError::invalid("hex", format!("{s:?} is not a #rrggbb color")))
    }
}

impl From<image::Rgb<u8>> for RgbColor {
    fn from(px: image::Rgb<u8>) -> Self {
        Self::new(px[0], px[1], px[2])
    }
}

impl From<RgbColor> for image::Rgb<u8> {
    fn from(color: RgbColor) -> Self {
        image::Rgb([color.r, color.g, color.b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let color = RgbColor::new(200, 10, 5);
        assert_eq!(color.to_hex(), "#c80a05");
        assert_eq!(RgbColor::parse_hex("#c80a05"), Some(color));
    }

    #[test]
    fn hex_accepts_missing_hash_and_uppercase() {
        assert_eq!(RgbColor::parse_hex("FFAABB"), Some(RgbColor::new(255, 170, 187)));
    }

    #[test]
    fn hex_rejects_malformed_strings() {
        for s in ["", "#fff", "#ggaabb", "##ffaabb", "#ffaabbcc", "ff aab", "+fffff"] {
            assert!(!RgbColor::is_valid_hex(s), "{s} should be invalid");
        }
    }

    #[test]
    fn from_point_rounds_and_clamps() {
        assert_eq!(
            RgbColor::from_point([12.5, 254.6, -3.0]),
            RgbColor::new(13, 255, 0)
        );
    }

    #[test]
    fn distance_is_symmetric() {
        let a = RgbColor::new(0, 0, 0);
        let b = RgbColor::new(3, 4, 0);
        assert_eq!(a.distance_squared(b), 25);
        assert_eq!(b.distance_squared(a), 25);
    }

    #[test]
    fn from_str_reports_invalid_parameter() {
        let err = "nope".parse::<RgbColor>().unwrap_err();
        assert!(matches!(err, AppError::InvalidParameter("hex", _)));
    }
}
