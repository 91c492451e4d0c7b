#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vt_sixel::{Height, ImageSize, RGBAColor, SixelDecoder, Width};

#[derive(Arbitrary, Debug)]
struct Stream<'a> {
    fragments: Vec<&'a [u8]>,
}

// Fragment boundaries must be invisible: feeding the payload in arbitrary
// pieces has to produce the same raster as feeding it whole.
fuzz_target!(|stream: Stream<'_>| {
    let max = ImageSize::new(Width(128), Height(128));

    let mut decoder = SixelDecoder::new(max, RGBAColor::WHITE);
    for fragment in &stream.fragments {
        decoder.parse_fragment(fragment);
    }
    let split = decoder.finish();

    let joined = stream.fragments.concat();
    let mut decoder = SixelDecoder::new(max, RGBAColor::WHITE);
    decoder.parse_fragment(&joined);
    let whole = decoder.finish();

    assert_eq!(split, whole);
});
