//! Image decoding into the internal RGBA representation.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces an
//! RGBA pixel buffer at the image's native resolution. Also provides
//! the PNG payload encoding used when handing the current image to a
//! remote editor.

use image::{ImageEncoder, RgbaImage};

use crate::types::PipelineError;

/// Decode raw image bytes into an RGBA buffer.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgba8())
}

/// Encode an RGBA buffer as PNG bytes.
///
/// # Errors
///
/// Returns [`PipelineError::ImageDecode`] if the encoder rejects the
/// buffer (the `image` crate reports encode and decode failures through
/// the same error type).
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, PipelineError> {
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(buf)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_returns_error() {
        let result = decode_rgba(&[]);
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn corrupt_bytes_returns_image_decode_error() {
        let result = decode_rgba(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn png_round_trip_preserves_pixels_and_alpha() {
        let img = RgbaImage::from_fn(5, 3, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            let v = (x * 40 + y * 7) as u8;
            image::Rgba([v, 255 - v, 128, if x == 0 { 0 } else { 200 }])
        });
        let png = encode_png(&img).unwrap();
        let decoded = decode_rgba(&png).unwrap();
        assert_eq!(decoded, img);
    }

    #[test]
    fn output_dimensions_match_input() {
        let img = RgbaImage::from_pixel(17, 31, image::Rgba([128, 64, 32, 255]));
        let decoded = decode_rgba(&encode_png(&img).unwrap()).unwrap();
        assert_eq!(decoded.width(), 17);
        assert_eq!(decoded.height(), 31);
    }
}
