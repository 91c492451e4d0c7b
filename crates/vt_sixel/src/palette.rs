//! Mutable table of indexed Sixel colors, plus the two color systems a
//! color-introducer directive can use to fill it.

use std::cell::RefCell;
use std::rc::Rc;

use crate::color::RGBColor;
use crate::{SIXEL_DEFAULT_COLOR_COUNT, SIXEL_PALETTE_MAX};

/// Handle under which the decoder facade and the image builder share one
/// palette. Sharing is single-threaded; a decode never crosses threads.
pub type SharedPalette = Rc<RefCell<SixelColorPalette>>;

/// The VT340 boot palette in the percent units the hardware documented.
///
/// No official DEC documentation of these colors survives; every Sixel
/// implementation assumes this table.
const VT340_COLORS: [(u16, u16, u16); SIXEL_DEFAULT_COLOR_COUNT] = [
    (0, 0, 0),
    (20, 20, 80),
    (80, 13, 13),
    (20, 80, 20),
    (80, 20, 80),
    (20, 80, 80),
    (80, 80, 20),
    (53, 53, 53),
    (26, 26, 26),
    (33, 33, 60),
    (60, 26, 26),
    (33, 60, 33),
    (60, 33, 60),
    (33, 60, 60),
    (60, 60, 33),
    (80, 80, 80),
];

/// An ordered mapping from palette index to [`RGBColor`].
///
/// The table starts at a declared size and may grow up to a hard maximum as
/// color definitions arrive. Unset slots read as black. Out-of-range indices
/// clamp instead of failing; a terminal never rejects a color directive.
#[derive(Debug, Clone)]
pub struct SixelColorPalette {
    palette: Vec<RGBColor>,
    max_size: usize,
}

impl SixelColorPalette {
    /// A palette with `size` initial slots, growable up to `max_size`.
    pub fn new(size: usize, max_size: usize) -> Self {
        let mut palette = Self {
            palette: vec![RGBColor::default(); size.min(max_size)],
            max_size,
        };
        palette.reset();
        palette
    }

    /// A freshly seeded 16/256 palette behind a [`SharedPalette`] handle.
    pub fn shared_default() -> SharedPalette {
        Rc::new(RefCell::new(Self::new(
            SIXEL_DEFAULT_COLOR_COUNT,
            SIXEL_PALETTE_MAX,
        )))
    }

    /// Re-seeds the leading slots with the VT340 default colors. Slots past
    /// the defaults keep their current values.
    pub fn reset(&mut self) {
        for (slot, &(r, g, b)) in self.palette.iter_mut().zip(VT340_COLORS.iter()) {
            *slot = rgb_from_percent(r, g, b);
        }
    }

    /// The color at `index`; out-of-range indices clamp to the last slot.
    pub fn at(&self, index: usize) -> RGBColor {
        self.palette
            .get(index.min(self.size().saturating_sub(1)))
            .copied()
            .unwrap_or_default()
    }

    /// Stores `color` at `index`, growing the table when needed. Indices at
    /// or past the maximum clamp to the highest valid slot.
    pub fn set_color(&mut self, index: usize, color: RGBColor) {
        let index = index.min(self.max_size.saturating_sub(1));
        if index >= self.palette.len() {
            self.palette.resize(index + 1, RGBColor::default());
        }
        self.palette[index] = color;
    }

    /// Current number of slots. Never exceeds [`max_size`](Self::max_size).
    pub fn size(&self) -> usize {
        self.palette.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for SixelColorPalette {
    fn default() -> Self {
        Self::new(SIXEL_DEFAULT_COLOR_COUNT, SIXEL_PALETTE_MAX)
    }
}

/// Converts Sixel percent channels (0..=100) into an [`RGBColor`].
///
/// Scaling truncates, matching the `v * 255 / 100` the protocol documents.
pub fn rgb_from_percent(red: u16, green: u16, blue: u16) -> RGBColor {
    let channel = |v: u16| (u32::from(v.min(100)) * 255 / 100) as u8;
    RGBColor::new(channel(red), channel(green), channel(blue))
}

/// Converts a Sixel HLS triple (hue 0..=360, lightness and saturation in
/// percent) into an [`RGBColor`].
///
/// The Sixel hue circle starts at blue; the +240 degree rotation maps it onto
/// the standard HLS circle before conversion.
pub fn rgb_from_hls(hue: u16, lightness: u16, saturation: u16) -> RGBColor {
    if saturation == 0 {
        return rgb_from_percent(lightness, lightness, lightness);
    }

    let hue = f64::from((hue.min(360) + 240) % 360) / 360.0;
    let lum = f64::from(lightness.min(100)) / 100.0;
    let sat = f64::from(saturation.min(100)) / 100.0;

    let q = if lum < 0.5 {
        lum * (1.0 + sat)
    } else {
        lum + sat - lum * sat
    };
    let p = 2.0 * lum - q;

    let channel = |v: f64| (v * 255.0 + 0.5).floor().clamp(0.0, 255.0) as u8;
    RGBColor::new(
        channel(hue_to_rgb(p, q, hue + 1.0 / 3.0)),
        channel(hue_to_rgb(p, q, hue)),
        channel(hue_to_rgb(p, q, hue - 1.0 / 3.0)),
    )
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}
