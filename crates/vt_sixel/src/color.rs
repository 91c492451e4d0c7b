//! Color model shared by the palette, the image builder and the finished
//! raster.
//!
//! [`RGBColor`] is the 24-bit working type, [`RGBAColor`] the packed 32-bit
//! pixel written into rasters, and [`Color`] the tagged cell-level color the
//! rest of a terminal backend deals in.

use std::fmt;
use std::ops::{Add, Mul};
use std::str::FromStr;

use crate::{Result, SixelError};

/// A 24-bit RGB color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RGBColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl RGBColor {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// The channels packed as `0x00RRGGBB`.
    pub const fn value(self) -> u32 {
        (self.red as u32) << 16 | (self.green as u32) << 8 | self.blue as u32
    }

    /// Channel-wise complement.
    pub const fn inverse(self) -> Self {
        Self::new(255 - self.red, 255 - self.green, 255 - self.blue)
    }
}

impl From<u32> for RGBColor {
    fn from(rgb: u32) -> Self {
        Self::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }
}

/// Component-wise addition, saturating at 255.
impl Add for RGBColor {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.red.saturating_add(rhs.red),
            self.green.saturating_add(rhs.green),
            self.blue.saturating_add(rhs.blue),
        )
    }
}

/// Scalar multiplication, clamped to the channel range.
impl Mul<f32> for RGBColor {
    type Output = Self;

    fn mul(self, scale: f32) -> Self {
        let channel = |c: u8| (f32::from(c) * scale).clamp(0.0, 255.0) as u8;
        Self::new(channel(self.red), channel(self.green), channel(self.blue))
    }
}

impl FromStr for RGBColor {
    type Err = SixelError;

    /// Parses `#RRGGBB` or `RRGGBB`.
    fn from_str(spec: &str) -> Result<Self> {
        let hex = spec.strip_prefix('#').unwrap_or(spec);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(SixelError::InvalidColor { spec: spec.into() });
        }
        let value = u32::from_str_radix(hex, 16).map_err(|_| SixelError::InvalidColor {
            spec: spec.into(),
        })?;
        Ok(Self::from(value))
    }
}

impl fmt::Display for RGBColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06X}", self.value())
    }
}

/// Linear blend of two colors: `a * t + b * (1 - t)`.
pub fn mix(a: RGBColor, b: RGBColor, t: f32) -> RGBColor {
    a * t + b * (1.0 - t)
}

/// Perceptual distance between two colors.
///
/// Weighted Euclidean metric with a red-mean term. The channel differences
/// are taken as absolute values so the metric is symmetric.
pub fn distance(a: RGBColor, b: RGBColor) -> f64 {
    let rmean = (u32::from(a.red) + u32::from(b.red)) / 2;
    let r = u32::from(a.red.abs_diff(b.red));
    let g = u32::from(a.green.abs_diff(b.green));
    let bl = u32::from(a.blue.abs_diff(b.blue));
    f64::from((((512 + rmean) * r * r) >> 8) + 4 * g * g + (((767 - rmean) * bl * bl) >> 8)).sqrt()
}

/// A foreground/background combination, e.g. of a text cell under a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RGBColorPair {
    pub foreground: RGBColor,
    pub background: RGBColor,
}

impl RGBColorPair {
    pub const fn new(foreground: RGBColor, background: RGBColor) -> Self {
        Self { foreground, background }
    }

    /// Whether the two colors are within `threshold` of each other.
    pub fn is_too_similar(self, threshold: f64) -> bool {
        distance(self.foreground, self.background) <= threshold
    }

    /// Returns the pair unchanged when its colors are distinguishable,
    /// otherwise a readable replacement derived from the foreground.
    pub fn distinct(self, threshold: f64) -> Self {
        if self.is_too_similar(threshold) {
            Self::new(self.foreground.inverse(), self.foreground)
        } else {
            self
        }
    }
}

/// A 32-bit RGBA color, packed R (high byte) G B A (low byte).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RGBAColor(pub u32);

impl RGBAColor {
    /// Canonical opaque white.
    pub const WHITE: Self = Self(0xFFFF_FFFF);

    pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self(
            (red as u32) << 24 | (green as u32) << 16 | (blue as u32) << 8 | alpha as u32,
        )
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn blue(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn alpha(self) -> u8 {
        self.0 as u8
    }

    /// Drops the alpha channel.
    pub const fn rgb(self) -> RGBColor {
        RGBColor::new(self.red(), self.green(), self.blue())
    }

    /// The channels in memory order, R first.
    pub const fn to_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_be_bytes(bytes))
    }
}

impl From<RGBColor> for RGBAColor {
    fn from(color: RGBColor) -> Self {
        Self::new(color.red, color.green, color.blue, 0xFF)
    }
}

impl fmt::Display for RGBAColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

/// A cell-level color as the wider terminal backend deals in them.
///
/// Equality is structural. The discriminants cover everything a VT color
/// attribute can hold; `Bright` carries the aixterm range 0..=7 and `Indexed`
/// a slot of the 256-color table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Color {
    #[default]
    Undefined,
    Default,
    Bright(u8),
    Indexed(u8),
    Rgb(RGBColor),
}

impl Color {
    pub const fn is_undefined(self) -> bool {
        matches!(self, Self::Undefined)
    }

    pub const fn is_default(self) -> bool {
        matches!(self, Self::Default)
    }

    pub const fn is_bright(self) -> bool {
        matches!(self, Self::Bright(_))
    }

    pub const fn is_indexed(self) -> bool {
        matches!(self, Self::Indexed(_))
    }

    pub const fn is_rgb(self) -> bool {
        matches!(self, Self::Rgb(_))
    }

    /// The palette slot of an indexed or bright color.
    pub const fn index(self) -> Option<u8> {
        match self {
            Self::Bright(index) | Self::Indexed(index) => Some(index),
            _ => None,
        }
    }

    /// The direct color of an RGB variant.
    pub const fn rgb(self) -> Option<RGBColor> {
        match self {
            Self::Rgb(color) => Some(color),
            _ => None,
        }
    }
}

impl From<RGBColor> for Color {
    fn from(color: RGBColor) -> Self {
        Self::Rgb(color)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Default => write!(f, "default"),
            Self::Bright(index) => write!(f, "bright({index})"),
            Self::Indexed(index) => write!(f, "indexed({index})"),
            Self::Rgb(color) => write!(f, "{color}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        assert_eq!("#102030".parse::<RGBColor>(), Ok(RGBColor::new(0x10, 0x20, 0x30)));
        assert_eq!("ffFF42".parse::<RGBColor>(), Ok(RGBColor::new(0xFF, 0xFF, 0x42)));

        for bad in ["", "#", "#12345", "#1234567", "12345g", "#xyzxyz", "#1020301"] {
            assert_eq!(
                bad.parse::<RGBColor>(),
                Err(SixelError::InvalidColor { spec: bad.into() }),
                "{bad:?} must be rejected"
            );
        }
    }

    #[test]
    fn value_roundtrip() {
        let color = RGBColor::new(0xAB, 0xCD, 0xEF);
        assert_eq!(RGBColor::from(color.value()), color);
        assert_eq!(color.to_string(), "#ABCDEF");
    }

    #[test]
    fn saturating_arithmetic() {
        let a = RGBColor::new(200, 10, 128);
        let b = RGBColor::new(100, 20, 128);
        assert_eq!(a + b, RGBColor::new(255, 30, 255));
        assert_eq!(a * 2.0, RGBColor::new(255, 20, 255));
        assert_eq!(a * 0.5, RGBColor::new(100, 5, 64));
    }

    #[test]
    fn mix_endpoints() {
        let a = RGBColor::new(10, 20, 30);
        let b = RGBColor::new(200, 100, 50);
        assert_eq!(mix(a, b, 1.0), a);
        assert_eq!(mix(a, b, 0.0), b);
    }

    #[test]
    fn distance_is_a_metric() {
        let a = RGBColor::new(0x12, 0x34, 0x56);
        let b = RGBColor::new(0x65, 0x43, 0x21);
        assert_eq!(distance(a, a), 0.0);
        assert_eq!(distance(a, b), distance(b, a));
        assert!(distance(a, b) > 0.0);
    }

    #[test]
    fn pair_distinct() {
        let readable = RGBColorPair::new(RGBColor::new(255, 255, 255), RGBColor::new(0, 0, 0));
        assert_eq!(readable.distinct(0.25), readable);

        let gray = RGBColor::new(120, 120, 120);
        let murky = RGBColorPair::new(gray, gray);
        assert!(murky.is_too_similar(0.25));
        assert_eq!(murky.distinct(0.25), RGBColorPair::new(gray.inverse(), gray));
    }

    #[test]
    fn rgba_packing() {
        let color = RGBAColor::new(0x10, 0x20, 0x30, 0xFF);
        assert_eq!(color.0, 0x102030FF);
        assert_eq!(color.to_bytes(), [0x10, 0x20, 0x30, 0xFF]);
        assert_eq!(RGBAColor::from_bytes(color.to_bytes()), color);
        assert_eq!(color.rgb(), RGBColor::new(0x10, 0x20, 0x30));
        assert_eq!(RGBAColor::from(color.rgb()), color);
        assert_eq!(RGBAColor::WHITE.alpha(), 0xFF);
    }

    #[test]
    fn tagged_color_predicates() {
        assert!(Color::default().is_undefined());
        assert!(Color::Default.is_default());
        assert!(Color::Bright(3).is_bright());
        assert_eq!(Color::Bright(3).index(), Some(3));
        assert_eq!(Color::Indexed(17).index(), Some(17));
        assert_eq!(Color::Default.index(), None);

        let rgb = RGBColor::new(1, 2, 3);
        assert_eq!(Color::from(rgb).rgb(), Some(rgb));
        assert_ne!(Color::Indexed(3), Color::Bright(3));
        assert_eq!(Color::Rgb(rgb).to_string(), "#010203");
    }
}
