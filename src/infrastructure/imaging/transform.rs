use std::io::Cursor;

use derive_more::Display;
use image::{DynamicImage, ImageFormat, ImageReader};

#[derive(Debug, Display)]
pub enum TransformError {
    #[display("Failed to decode image: {_0}")]
    Decode(String),

    #[display("Failed to encode image: {_0}")]
    Encode(String),
}

/// Mirrors an encoded raster left to right and re-encodes it as PNG.
///
/// Alpha is preserved; the output has the same dimensions as the input.
pub fn flip_horizontal(bytes: &[u8]) -> Result<Vec<u8>, TransformError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| TransformError::Decode(e.to_string()))?;

    encode_png(&decoded.fliph())
}

/// Best-effort width and height of an encoded image without a full decode.
pub fn probe_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .map_err(|e| tracing::debug!("Could not read image dimensions: {}", e))
        .ok()
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, TransformError> {
    let mut out = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|e| TransformError::Encode(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    fn asymmetric_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 3 % 256) as u8, 40, if x == 0 { 0 } else { 255 }])
        });
        encode_png(&DynamicImage::ImageRgba8(img)).unwrap()
    }

    #[test]
    fn flip_mirrors_columns_and_keeps_dimensions() {
        let input = asymmetric_png(10, 4);
        let output = flip_horizontal(&input).unwrap();

        let before = image::load_from_memory(&input).unwrap();
        let after = image::load_from_memory(&output).unwrap();
        assert_eq!(before.dimensions(), after.dimensions());

        for y in 0..4 {
            for x in 0..10 {
                assert_eq!(before.get_pixel(x, y), after.get_pixel(9 - x, y));
            }
        }
    }

    #[test]
    fn output_is_png() {
        let output = flip_horizontal(&asymmetric_png(3, 3)).unwrap();
        assert_eq!(image::guess_format(&output).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = flip_horizontal(b"definitely not an image").unwrap_err();
        assert!(matches!(err, TransformError::Decode(_)));
    }

    #[test]
    fn probe_reads_dimensions_or_gives_up() {
        assert_eq!(probe_dimensions(&asymmetric_png(100, 50)), Some((100, 50)));
        assert_eq!(probe_dimensions(b"nope"), None);
    }
}
