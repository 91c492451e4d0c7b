#![no_main]

use libfuzzer_sys::fuzz_target;
use vt_sixel::{Height, ImageSize, RGBAColor, SixelDecoder, Width};

fuzz_target!(|data: &[u8]| {
    // The decoder must never panic, whatever the payload.
    let max = ImageSize::new(Width(256), Height(256));
    let mut decoder = SixelDecoder::new(max, RGBAColor::WHITE);
    decoder.parse_fragment(data);
    let _ = decoder.finish();
});
