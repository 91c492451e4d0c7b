//! # vt_sixel
//!
//! A Sixel graphics decoder for virtual-terminal backends.
//!
//! Sixel is DEC's inline bitmap encoding: every printable byte of the payload
//! carries a column of six vertically stacked pixels, and a handful of
//! punctuation commands select colors, repeat columns and move the raster
//! cursor. This crate decodes the *payload* of such a sequence into an RGBA
//! raster. Locating the DCS envelope (`ESC P ... q` through `ST`) is the job of
//! the surrounding control-sequence dispatcher, which feeds payload fragments
//! into a [`SixelDecoder`] as they arrive from the pty.
//!
//! ## Quick start
//!
//! ```
//! use vt_sixel::{Height, ImageSize, RGBAColor, SixelDecoder, Width};
//!
//! let max = ImageSize::new(Width(80), Height(24));
//! let mut decoder = SixelDecoder::new(max, RGBAColor::WHITE);
//!
//! // Define color register 0 as red, then paint three full columns with it.
//! decoder.parse_fragment(b"#0;2;100;0;0#0~~~");
//!
//! let image = decoder.finish();
//! assert_eq!(image.size, ImageSize::new(Width(3), Height(6)));
//! assert_eq!(&image.pixels[0..4], &[0xFF, 0x00, 0x00, 0xFF]);
//! ```
//!
//! Decoding is best-effort and infallible: malformed input is absorbed by
//! skipping unknown bytes and clamping numeric parameters, the same way
//! hardware terminals behave. The only fallible operation in the crate is
//! parsing a color from its hex spelling.

use thiserror::Error;

pub mod builder;
pub mod color;
pub mod decoder;
pub mod palette;
pub mod parser;

pub use builder::{CellLocation, Height, ImageSize, SixelImage, SixelImageBuilder, Width};
pub use color::{Color, RGBAColor, RGBColor, RGBColorPair};
pub use decoder::SixelDecoder;
pub use palette::{SharedPalette, SixelColorPalette};
pub use parser::{SixelParser, SixelResponder};

/// Errors surfaced by this crate.
///
/// Payload ingestion never fails; the decoder absorbs malformed input. The
/// one user-visible failure path is hex color parsing at configuration time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SixelError {
    /// A color spelling is not of the form `#RRGGBB` or `RRGGBB`.
    #[error("invalid color specification {spec:?}")]
    InvalidColor {
        /// The offending input.
        spec: String,
    },
}

/// Result type for the fallible operations of this crate.
pub type Result<T> = core::result::Result<T, SixelError>;

/// Number of palette slots seeded with the VT340 colors before any color
/// directive arrives.
pub const SIXEL_DEFAULT_COLOR_COUNT: usize = 16;

/// Hard ceiling for color palette slots.
pub const SIXEL_PALETTE_MAX: usize = 256;
