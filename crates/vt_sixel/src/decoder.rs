//! Streaming facade over the parser and the image builder.
//!
//! The control-sequence dispatcher owns one [`SixelDecoder`] per graphic,
//! feeds it payload fragments as they arrive, and collects the finished
//! raster with [`finish`](SixelDecoder::finish). Between images of the same
//! stream, [`reset`](SixelDecoder::reset) reuses the allocation and keeps the
//! color registers, which is what hardware terminals do.

use log::trace;

use crate::builder::{ImageSize, SixelImage, SixelImageBuilder};
use crate::color::RGBAColor;
use crate::palette::{SharedPalette, SixelColorPalette};
use crate::parser::SixelParser;

/// Decodes a Sixel payload delivered in arbitrary fragments.
#[derive(Debug)]
pub struct SixelDecoder {
    parser: SixelParser,
    builder: SixelImageBuilder,
}

impl SixelDecoder {
    /// A decoder with a fresh 16/256 color palette.
    pub fn new(max_size: ImageSize, default_color: RGBAColor) -> Self {
        Self::with_palette(max_size, default_color, SixelColorPalette::shared_default())
    }

    /// A decoder sharing a palette the caller retains, so colors defined by
    /// one image remain available to the next.
    pub fn with_palette(
        max_size: ImageSize,
        default_color: RGBAColor,
        palette: SharedPalette,
    ) -> Self {
        trace!(
            "start sixel decode, raster limit {}x{}",
            max_size.width.0,
            max_size.height.0
        );
        Self {
            parser: SixelParser::new(),
            builder: SixelImageBuilder::new(max_size, 1, 1, default_color, palette),
        }
    }

    /// Feeds one payload fragment. Never fails; malformed bytes are absorbed.
    pub fn parse_fragment(&mut self, data: &[u8]) {
        self.parser.parse_fragment(data, &mut self.builder);
    }

    /// Flushes pending parser state, settles deferred raster geometry and
    /// hands the completed raster to the caller.
    #[must_use = "this returns the decoded raster"]
    pub fn finish(&mut self) -> SixelImage {
        self.parser.done(&mut self.builder);
        let image = self.builder.image();
        trace!(
            "finished sixel decode: {}x{}, aspect {}",
            image.size.width.0,
            image.size.height.0,
            image.aspect_ratio
        );
        image
    }

    /// Prepares for the next image of the stream. Palette contents survive;
    /// everything else starts over.
    pub fn reset(&mut self) {
        self.parser = SixelParser::new();
        self.builder.reset();
    }

    /// The builder behind the facade, for callers that inspect the raster
    /// while it is still being painted.
    pub fn builder(&self) -> &SixelImageBuilder {
        &self.builder
    }
}
