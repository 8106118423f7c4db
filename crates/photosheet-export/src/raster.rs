//! Raster encoders for the two export profiles.
//!
//! Pure functions: pixels in, encoded bytes out. JPEG has no alpha
//! channel, so passport output is flattened onto white first.

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};
use photosheet_pipeline::decode::encode_png;
use photosheet_pipeline::{EditSession, WHITE, composite_on_opaque_background};

use crate::ExportError;
use crate::profile::ExportProfile;

/// Encoded image ready to hand to a download, print, or file writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Profile the bytes were encoded with.
    pub profile: ExportProfile,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Encoded file contents.
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    /// MIME type of [`Self::bytes`].
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        self.profile.mime_type()
    }
}

/// Encode `image` as lossless RGBA PNG, using the same encoder as the
/// remote-edit payload.
///
/// # Errors
///
/// Returns [`ExportError::Pipeline`] if the encoder fails.
pub fn to_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    Ok(encode_png(image)?)
}

/// Encode `image` as baseline JPEG at `quality` (1–100).
///
/// Transparent pixels are composited onto white.
///
/// # Errors
///
/// Returns [`ExportError::Encode`] if the encoder fails.
pub fn to_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, ExportError> {
    let opaque = composite_on_opaque_background(image, WHITE);
    let rgb = RgbImage::from_fn(opaque.width(), opaque.height(), |x, y| {
        let [r, g, b, _] = opaque.get_pixel(x, y).0;
        image::Rgb([r, g, b])
    });

    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).write_image(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(buf)
}

/// Encode `image` with `profile`.
///
/// # Errors
///
/// Returns [`ExportError::EmptyImage`] for a zero-sized image,
/// [`ExportError::Encode`] if the JPEG encoder fails, and
/// [`ExportError::Pipeline`] if the PNG encoder fails.
pub fn encode(image: &RgbaImage, profile: ExportProfile) -> Result<EncodedImage, ExportError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ExportError::EmptyImage);
    }
    let bytes = match profile {
        ExportProfile::Normal => to_png(image)?,
        ExportProfile::Passport => to_jpeg(image, ExportProfile::PASSPORT_JPEG_QUALITY)?,
    };
    Ok(EncodedImage {
        profile,
        width: image.width(),
        height: image.height(),
        bytes,
    })
}

/// Export whatever the session currently produces: the passport sheet
/// as JPEG in passport mode, otherwise the baked photo as PNG.
///
/// # Errors
///
/// Returns [`ExportError::Pipeline`] if the session is busy, has no
/// image, or the sheet layout fails; otherwise encoder errors.
pub fn export_session(
    session: &EditSession,
    include_vignette: bool,
) -> Result<EncodedImage, ExportError> {
    let profile = ExportProfile::for_passport_mode(session.is_passport_mode());
    let pixels = session.export_image(include_vignette)?;
    encode(&pixels, profile)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::cast_possible_truncation)]
mod tests {
    use super::*;

    fn sample(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            image::Rgba([(x * 9) as u8, (y * 7) as u8, 60, if x == 0 { 0 } else { 255 }])
        })
    }

    #[test]
    fn png_is_lossless() {
        let img = sample(17, 11);
        let bytes = to_png(&img).unwrap();
        let back = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(back, img);
    }

    #[test]
    fn png_export_matches_edit_payload_encoding() {
        let img = sample(9, 6);
        assert_eq!(to_png(&img).unwrap(), encode_png(&img).unwrap());
    }

    #[test]
    fn jpeg_has_magic_and_dimensions() {
        let img = sample(32, 24);
        let bytes = to_jpeg(&img, 95).unwrap();
        assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);
        let back = image::load_from_memory(&bytes).unwrap();
        assert_eq!((back.width(), back.height()), (32, 24));
    }

    #[test]
    fn jpeg_flattens_transparency_onto_white() {
        let img = RgbaImage::from_pixel(16, 16, image::Rgba([0, 0, 0, 0]));
        let back = image::load_from_memory(&to_jpeg(&img, 95).unwrap())
            .unwrap()
            .to_rgb8();
        for p in back.pixels() {
            assert!(p.0.iter().all(|&c| c >= 250), "{p:?}");
        }
    }

    #[test]
    fn encode_reports_profile_and_size() {
        let encoded = encode(&sample(5, 4), ExportProfile::Normal).unwrap();
        assert_eq!(encoded.mime_type(), "image/png");
        assert_eq!((encoded.width, encoded.height), (5, 4));
        assert!(matches!(
            encode(&RgbaImage::new(0, 3), ExportProfile::Passport),
            Err(ExportError::EmptyImage)
        ));
    }

    #[test]
    fn session_export_follows_mode() {
        let mut session = EditSession::new();
        assert!(matches!(
            export_session(&session, false),
            Err(ExportError::Pipeline(photosheet_pipeline::PipelineError::NoImage))
        ));

        session.load_image(sample(30, 40)).unwrap();
        let normal = export_session(&session, false).unwrap();
        assert_eq!(normal.profile, ExportProfile::Normal);
        assert_eq!((normal.width, normal.height), (30, 40));

        session.set_passport_mode(true);
        let sheet = export_session(&session, false).unwrap();
        assert_eq!(sheet.profile, ExportProfile::Passport);
        assert_eq!((sheet.width, sheet.height), (1200, 1800));
    }
}
