//! Flattening transparent images onto an opaque background.
//!
//! Remote background removal returns a cut-out with an alpha mask;
//! every later step assumes opaque input, so the result is composited
//! onto a solid color first.

use image::Rgb;

use crate::types::{PipelineError, RgbaImage};

/// Background used when flattening remote edit results.
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Blend one channel: `bg · (1 - a) + fg · a` with `a` in `[0, 255]`.
///
/// Integer arithmetic with rounding keeps the endpoints exact:
/// `a = 0` returns `bg` and `a = 255` returns `fg`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn blend_channel(fg: u8, bg: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    let v = (fg as u32 * a + bg as u32 * (255 - a) + 127) / 255;
    v as u8
}

/// Composite `image` over `background`, producing a fully opaque image.
#[must_use = "returns the flattened image"]
pub fn composite_on_opaque_background(image: &RgbaImage, background: Rgb<u8>) -> RgbaImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        pixel.0 = [
            blend_channel(r, background.0[0], a),
            blend_channel(g, background.0[1], a),
            blend_channel(b, background.0[2], a),
            255,
        ];
    }
    out
}

/// Decode `bytes` and flatten them onto `background`.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] or [`PipelineError::ImageDecode`]
/// if the bytes cannot be decoded.
pub fn flatten_bytes(bytes: &[u8], background: Rgb<u8>) -> Result<RgbaImage, PipelineError> {
    let image = crate::decode::decode_rgba(bytes)?;
    Ok(composite_on_opaque_background(&image, background))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn transparent_pixel_becomes_background() {
        let img = RgbaImage::from_pixel(2, 2, image::Rgba([10, 200, 30, 0]));
        let bg = Rgb([12, 34, 56]);
        for p in composite_on_opaque_background(&img, bg).pixels() {
            assert_eq!(p.0, [12, 34, 56, 255]);
        }
    }

    #[test]
    fn opaque_pixel_keeps_source_color() {
        let img = RgbaImage::from_pixel(2, 2, image::Rgba([10, 200, 30, 255]));
        for p in composite_on_opaque_background(&img, WHITE).pixels() {
            assert_eq!(p.0, [10, 200, 30, 255]);
        }
    }

    #[test]
    fn half_alpha_blends_midway() {
        let img = RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 128]));
        let out = composite_on_opaque_background(&img, WHITE);
        // 255 * 127 / 255 = 127
        assert_eq!(out.get_pixel(0, 0).0, [127, 127, 127, 255]);
    }

    #[test]
    fn endpoints_exact_for_every_value() {
        for v in 0..=255u8 {
            assert_eq!(blend_channel(v, 255 - v, 255), v);
            assert_eq!(blend_channel(v, 255 - v, 0), 255 - v);
        }
    }

    #[test]
    fn output_is_always_opaque() {
        let img = RgbaImage::from_fn(16, 1, |x, _| {
            #[allow(clippy::cast_possible_truncation)]
            let a = (x * 17) as u8;
            image::Rgba([255, 0, 0, a])
        });
        assert!(
            composite_on_opaque_background(&img, WHITE)
                .pixels()
                .all(|p| p.0[3] == 255)
        );
    }

    #[test]
    fn flatten_bytes_decodes_then_composites() {
        let img = RgbaImage::from_pixel(3, 3, image::Rgba([50, 60, 70, 0]));
        let png = crate::decode::encode_png(&img).unwrap();
        let flat = flatten_bytes(&png, WHITE).unwrap();
        assert_eq!(flat.get_pixel(1, 1).0, [255, 255, 255, 255]);
        assert!(matches!(
            flatten_bytes(&[9, 9], WHITE),
            Err(PipelineError::ImageDecode(_))
        ));
    }
}
