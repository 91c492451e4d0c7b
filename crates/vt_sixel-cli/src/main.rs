//! vt-sixel - decode SIXEL graphics to PNG.
//!
//! A command-line companion to the `vt_sixel` library. It plays the role of
//! the control-sequence dispatcher: it locates the payload inside a DCS
//! envelope when one is present, then hands the bytes to the decoder.

use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use vt_sixel::{Height, ImageSize, RGBAColor, SixelDecoder, Width};

#[derive(Parser)]
#[command(name = "vt-sixel")]
#[command(version)]
#[command(about = "Decode SIXEL graphics to PNG", long_about = None)]
struct Cli {
    /// Input SIXEL file, defaults to stdin
    input: Option<PathBuf>,

    /// Output PNG file (required when reading from stdin)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Largest raster accepted from the stream, per axis
    #[arg(long, default_value = "2048")]
    max_dimension: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (data, from_stdin) = match &cli.input {
        Some(path) if path.to_string_lossy() != "-" => {
            let data = fs::read(path)
                .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
            (data, false)
        }
        _ => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            (buf, true)
        }
    };

    eprintln!("Decoding ({} bytes)", data.len());

    let max = ImageSize::new(Width(cli.max_dimension), Height(cli.max_dimension));
    let mut decoder = SixelDecoder::new(max, RGBAColor::new(0, 0, 0, 0xFF));
    decoder.parse_fragment(sixel_payload(&data));
    let decoded = decoder.finish();

    let output_path = match cli.output {
        Some(path) => path,
        None => {
            if from_stdin {
                return Err("Output file (-o) is required when reading from stdin".into());
            }
            let mut p = cli.input.unwrap();
            p.set_extension("png");
            p
        }
    };

    let (width, height) = (decoded.size.width.0, decoded.size.height.0);
    let img = image::RgbaImage::from_raw(width, height, decoded.pixels)
        .ok_or("Failed to create image from decoded data")?;
    img.save(&output_path)?;

    eprintln!(
        "Decoded: {}x{} pixels -> '{}'",
        width,
        height,
        output_path.display()
    );

    Ok(())
}

/// Strips a DCS envelope (`ESC P ... q` through `ST`) when one is present.
/// Raw payloads pass through unchanged; the library only consumes payload.
fn sixel_payload(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|&b| b == 0x1B || b == 0x90)
        .and_then(|dcs| {
            data[dcs..]
                .iter()
                .position(|&b| b == b'q')
                .map(|q| dcs + q + 1)
        })
        .unwrap_or(0);

    let end = data[start..]
        .iter()
        .position(|&b| b == 0x1B || b == 0x9C)
        .map(|st| start + st)
        .unwrap_or(data.len());

    &data[start..end]
}

#[cfg(test)]
mod tests {
    use super::sixel_payload;

    #[test]
    fn strips_seven_bit_envelope() {
        assert_eq!(sixel_payload(b"\x1bPq#0~~\x1b\\"), b"#0~~");
        assert_eq!(sixel_payload(b"\x1bP0;1;0q#0~~\x1b\\"), b"#0~~");
    }

    #[test]
    fn strips_eight_bit_envelope() {
        assert_eq!(sixel_payload(b"\x90q#0~~\x9c"), b"#0~~");
    }

    #[test]
    fn raw_payload_passes_through() {
        assert_eq!(sixel_payload(b"#0~~-#1@@"), b"#0~~-#1@@");
    }
}
