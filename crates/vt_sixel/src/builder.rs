//! Image builder: owns the destination raster while a Sixel stream paints
//! into it.
//!
//! The builder allocates its pixel buffer once, at the maximum size the
//! owner allows, and tracks the declared raster size separately. Plotting
//! therefore never reallocates mid-stream; [`image`](SixelImageBuilder::image)
//! crops the declared rectangle out at the end.

use log::trace;

use crate::color::{RGBAColor, RGBColor};
use crate::palette::{rgb_from_hls, rgb_from_percent, SharedPalette};
use crate::parser::SixelResponder;

/// Horizontal extent in pixels. A distinct type from [`Height`] so the axes
/// cannot be swapped silently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Width(pub u32);

/// Vertical extent in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Height(pub u32);

/// Raster dimensions in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ImageSize {
    pub width: Width,
    pub height: Height,
}

impl ImageSize {
    pub const fn new(width: Width, height: Height) -> Self {
        Self { width, height }
    }

    pub const fn area(self) -> usize {
        self.width.0 as usize * self.height.0 as usize
    }
}

/// Position of the sixel cursor: `line` is the topmost pixel row of the
/// current band, `column` the pixel column.
///
/// Negative values are legal intermediate states; plotting clamps to the
/// raster rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellLocation {
    pub line: i32,
    pub column: i32,
}

impl CellLocation {
    pub const fn new(line: i32, column: i32) -> Self {
        Self { line, column }
    }
}

/// A completed raster, ready for the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SixelImage {
    /// RGBA bytes, 4 per pixel, row-major.
    pub pixels: Vec<u8>,
    pub size: ImageSize,
    /// Declared pixel aspect ratio, rounded up to a whole number.
    pub aspect_ratio: u32,
}

/// Builds one Sixel raster: owns the pixel buffer, the cursor, the selected
/// color and the declared geometry.
///
/// Until a raster preamble declares explicit dimensions the image auto-sizes:
/// every in-bounds plot grows the declared rectangle. Once dimensions are
/// declared, plots outside of them are dropped (the cursor advances anyway).
#[derive(Debug)]
pub struct SixelImageBuilder {
    max_size: ImageSize,
    size: ImageSize,
    explicit_size: bool,
    /// RGBA bytes with a row stride of `max_size.width`.
    buffer: Vec<u8>,
    default_color: RGBAColor,
    palette: SharedPalette,
    cursor: CellLocation,
    current_color: usize,
    aspect_ratio: u32,
    /// Columns and lines actually plotted; a raster preamble never shrinks
    /// the declared size below this.
    plotted_columns: u32,
    plotted_lines: u32,
}

impl SixelImageBuilder {
    /// A builder for rasters of at most `max_size` pixels, with every pixel
    /// starting out as `default_color`. `pan`/`pad` seed the aspect ratio;
    /// pass 1/1 unless the DCS parameters said otherwise.
    pub fn new(
        max_size: ImageSize,
        pan: u32,
        pad: u32,
        default_color: RGBAColor,
        palette: SharedPalette,
    ) -> Self {
        // Image sizes are strictly positive.
        let max_size = ImageSize::new(
            Width(max_size.width.0.max(1)),
            Height(max_size.height.0.max(1)),
        );
        let mut buffer = vec![0u8; max_size.area() * 4];
        fill_pixels(&mut buffer, default_color);

        Self {
            max_size,
            size: ImageSize::new(Width(1), Height(1)),
            explicit_size: false,
            buffer,
            default_color,
            palette,
            cursor: CellLocation::default(),
            current_color: 0,
            aspect_ratio: aspect_ratio(pan, pad),
            plotted_columns: 0,
            plotted_lines: 0,
        }
    }

    /// Prepares the builder for the next image. The buffer is cleared to the
    /// default color; the shared palette is left alone.
    pub fn reset(&mut self) {
        fill_pixels(&mut self.buffer, self.default_color);
        self.size = ImageSize::new(Width(1), Height(1));
        self.explicit_size = false;
        self.cursor = CellLocation::default();
        self.current_color = 0;
        self.aspect_ratio = 1;
        self.plotted_columns = 0;
        self.plotted_lines = 0;
    }

    /// The declared raster size.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// The size ceiling this builder was constructed with.
    pub fn max_size(&self) -> ImageSize {
        self.max_size
    }

    pub fn aspect_ratio(&self) -> u32 {
        self.aspect_ratio
    }

    pub fn sixel_cursor(&self) -> CellLocation {
        self.cursor
    }

    /// The pixel at `coord`; anything outside the buffer reads as the
    /// default color.
    pub fn at(&self, coord: CellLocation) -> RGBAColor {
        match self.index_of(coord) {
            Some(base) => RGBAColor::from_bytes([
                self.buffer[base],
                self.buffer[base + 1],
                self.buffer[base + 2],
                self.buffer[base + 3],
            ]),
            None => self.default_color,
        }
    }

    /// Stores `color` at palette slot `index`.
    pub fn set_color(&mut self, index: usize, color: RGBColor) {
        self.palette.borrow_mut().set_color(index, color);
    }

    /// Crops the declared rectangle out of the buffer as the completed image.
    #[must_use = "this returns the completed raster"]
    pub fn image(&self) -> SixelImage {
        let width = self.size.width.0.max(1);
        let height = self.size.height.0.max(1);
        let stride = self.max_size.width.0 as usize * 4;
        let row = width as usize * 4;

        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for line in 0..height as usize {
            let base = line * stride;
            pixels.extend_from_slice(&self.buffer[base..base + row]);
        }

        SixelImage {
            pixels,
            size: ImageSize::new(Width(width), Height(height)),
            aspect_ratio: self.aspect_ratio,
        }
    }

    fn index_of(&self, coord: CellLocation) -> Option<usize> {
        if coord.line < 0 || coord.column < 0 {
            return None;
        }
        let (column, line) = (coord.column as u32, coord.line as u32);
        if column >= self.max_size.width.0 || line >= self.max_size.height.0 {
            return None;
        }
        Some((line as usize * self.max_size.width.0 as usize + column as usize) * 4)
    }

    /// Plots one pixel, growing the declared size in auto-size mode and
    /// dropping anything outside the declared rectangle otherwise.
    fn write(&mut self, coord: CellLocation, color: RGBColor) {
        let Some(base) = self.index_of(coord) else {
            return;
        };
        let (column, line) = (coord.column as u32, coord.line as u32);

        if self.explicit_size {
            if column >= self.size.width.0 || line >= self.size.height.0 {
                return;
            }
        } else {
            if column >= self.size.width.0 {
                self.size.width = Width(column + 1);
            }
            if line >= self.size.height.0 {
                self.size.height = Height(line + 1);
            }
        }

        self.plotted_columns = self.plotted_columns.max(column + 1);
        self.plotted_lines = self.plotted_lines.max(line + 1);

        self.buffer[base..base + 4].copy_from_slice(&RGBAColor::from(color).to_bytes());
    }
}

impl SixelResponder for SixelImageBuilder {
    fn set_raster(&mut self, pan: u16, pad: u16, width: u16, height: u16) {
        self.aspect_ratio = aspect_ratio(u32::from(pan), u32::from(pad));

        if width > 0 {
            let width = u32::from(width)
                .min(self.max_size.width.0)
                .max(self.plotted_columns)
                .max(1);
            self.size.width = Width(width);
            self.explicit_size = true;
        }
        if height > 0 {
            let height = u32::from(height)
                .min(self.max_size.height.0)
                .max(self.plotted_lines)
                .max(1);
            self.size.height = Height(height);
            self.explicit_size = true;
        }

        trace!(
            "sixel raster: aspect {}, declared {}x{}",
            self.aspect_ratio,
            self.size.width.0,
            self.size.height.0
        );
    }

    fn use_color(&mut self, index: u16) {
        let last = self.palette.borrow().size().saturating_sub(1);
        self.current_color = (index as usize).min(last);
    }

    fn define_hls_color(&mut self, index: u16, hue: u16, lightness: u16, saturation: u16) {
        self.set_color(index as usize, rgb_from_hls(hue, lightness, saturation));
    }

    fn define_rgb_color(&mut self, index: u16, red: u16, green: u16, blue: u16) {
        self.set_color(index as usize, rgb_from_percent(red, green, blue));
    }

    fn render(&mut self, sixel: u8) {
        let color = self.palette.borrow().at(self.current_color);
        for bit in 0..6 {
            if sixel & (1 << bit) != 0 {
                let coord =
                    CellLocation::new(self.cursor.line.saturating_add(bit), self.cursor.column);
                self.write(coord, color);
            }
        }
        self.cursor.column = self.cursor.column.saturating_add(1);
    }

    fn render_repeated(&mut self, count: u16, sixel: u8) {
        for _ in 0..count.max(1) {
            self.render(sixel);
        }
    }

    fn rewind(&mut self) {
        self.cursor.column = 0;
    }

    fn newline(&mut self) {
        self.cursor.column = 0;
        self.cursor.line = self.cursor.line.saturating_add(6);
    }

    /// Settles auto-sized geometry: a stream that only moved the cursor
    /// still declares the bands it covered.
    fn finalize(&mut self) {
        if !self.explicit_size {
            let line = self.cursor.line.max(0) as u32;
            if line > self.size.height.0 {
                self.size.height = Height(line.min(self.max_size.height.0));
            }
        }
    }
}

/// Declared pixel aspect ratio: `pan / pad` rounded up, at least 1. An
/// undefined ratio (`pad` of 0) is square.
fn aspect_ratio(pan: u32, pad: u32) -> u32 {
    if pad == 0 {
        1
    } else {
        pan.div_ceil(pad).max(1)
    }
}

fn fill_pixels(buffer: &mut [u8], color: RGBAColor) {
    for pixel in buffer.chunks_exact_mut(4) {
        pixel.copy_from_slice(&color.to_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::SixelColorPalette;

    fn builder(width: u32, height: u32) -> SixelImageBuilder {
        SixelImageBuilder::new(
            ImageSize::new(Width(width), Height(height)),
            1,
            1,
            RGBAColor::new(0, 0, 0, 0xFF),
            SixelColorPalette::shared_default(),
        )
    }

    #[test]
    fn aspect_ratio_rounds_up() {
        assert_eq!(aspect_ratio(1, 1), 1);
        assert_eq!(aspect_ratio(12, 34), 1);
        assert_eq!(aspect_ratio(15, 2), 8);
        assert_eq!(aspect_ratio(0, 1), 1);
        assert_eq!(aspect_ratio(5, 0), 1);
    }

    #[test]
    fn render_grows_autosized_raster() {
        let mut ib = builder(10, 20);
        ib.set_color(0, RGBColor::new(0xFF, 0xFF, 0x42));

        ib.render(0b111111);
        assert_eq!(ib.size(), ImageSize::new(Width(1), Height(6)));
        assert_eq!(ib.sixel_cursor(), CellLocation::new(0, 1));

        // An empty sixel advances the cursor without touching geometry.
        ib.render(0);
        assert_eq!(ib.size(), ImageSize::new(Width(1), Height(6)));
        assert_eq!(ib.sixel_cursor(), CellLocation::new(0, 2));
    }

    #[test]
    fn explicit_raster_drops_outside_plots() {
        let mut ib = builder(10, 20);
        ib.set_raster(1, 1, 2, 6);
        ib.set_color(0, RGBColor::new(0xFF, 0, 0));

        for _ in 0..5 {
            ib.render(0b000001);
        }

        // Only the two declared columns were written; the cursor kept going.
        assert_eq!(ib.sixel_cursor(), CellLocation::new(0, 5));
        assert_eq!(ib.at(CellLocation::new(0, 1)).rgb(), RGBColor::new(0xFF, 0, 0));
        assert_eq!(ib.at(CellLocation::new(0, 2)), RGBAColor::new(0, 0, 0, 0xFF));
        assert_eq!(ib.size(), ImageSize::new(Width(2), Height(6)));
    }

    #[test]
    fn raster_never_shrinks_below_plotted_pixels() {
        let mut ib = builder(40, 20);
        ib.set_raster(1, 1, 40, 12);
        for _ in 0..8 {
            ib.render(0b000001);
        }

        ib.set_raster(1, 1, 3, 2);
        assert_eq!(ib.size(), ImageSize::new(Width(8), Height(2)));

        let image = ib.image();
        assert_eq!(image.size.width, Width(8));
    }

    #[test]
    fn raster_clamps_to_max_size() {
        let mut ib = builder(10, 20);
        ib.set_raster(1, 1, 60000, 60000);
        assert_eq!(ib.size(), ImageSize::new(Width(10), Height(20)));
    }

    #[test]
    fn image_crops_declared_rectangle() {
        let mut ib = builder(8, 8);
        ib.set_raster(1, 1, 2, 3);
        ib.set_color(0, RGBColor::new(10, 20, 30));
        ib.render(0b000011);

        let image = ib.image();
        assert_eq!(image.size, ImageSize::new(Width(2), Height(3)));
        assert_eq!(image.pixels.len(), 2 * 3 * 4);
        // Column 0 of the first two rows carries the pin color.
        assert_eq!(&image.pixels[0..4], &[10, 20, 30, 0xFF]);
        assert_eq!(&image.pixels[8..12], &[10, 20, 30, 0xFF]);
        // Column 1 stays at the default.
        assert_eq!(&image.pixels[4..8], &[0, 0, 0, 0xFF]);
    }

    #[test]
    fn reset_clears_raster_state() {
        let mut ib = builder(8, 8);
        ib.set_raster(3, 1, 4, 4);
        ib.set_color(0, RGBColor::new(9, 9, 9));
        ib.render(0b000001);

        ib.reset();
        assert_eq!(ib.size(), ImageSize::new(Width(1), Height(1)));
        assert_eq!(ib.sixel_cursor(), CellLocation::default());
        assert_eq!(ib.aspect_ratio(), 1);
        assert_eq!(ib.at(CellLocation::new(0, 0)), RGBAColor::new(0, 0, 0, 0xFF));
    }

    #[test]
    fn out_of_buffer_reads_are_default() {
        let ib = builder(4, 4);
        assert_eq!(ib.at(CellLocation::new(-1, 0)), RGBAColor::new(0, 0, 0, 0xFF));
        assert_eq!(ib.at(CellLocation::new(0, 99)), RGBAColor::new(0, 0, 0, 0xFF));
    }
}
