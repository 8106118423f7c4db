//! Gaussian blur for the bake and preview paths.
//!
//! Wraps [`imageproc::filter::gaussian_blur_f32`], which only accepts
//! single-channel images, by splitting the color channels, blurring
//! each, and reassembling. Alpha is carried through untouched so a
//! cut-out subject keeps its exact mask.

use image::GrayImage;

use crate::types::RgbaImage;

/// Blur the RGB channels of `image` with standard deviation `sigma`
/// pixels, leaving alpha unchanged.
///
/// Non-positive sigma values return the image unchanged, since
/// `imageproc`'s underlying function panics on `sigma <= 0.0`. Sigma is
/// capped at the longest image side: past that the kernel is flat across
/// the image, and `imageproc` sizes its kernel from sigma.
#[must_use = "returns the blurred RGBA image"]
pub fn gaussian_blur_rgb(image: &RgbaImage, sigma: f32) -> RgbaImage {
    if sigma <= 0.0 || !sigma.is_finite() {
        return image.clone();
    }

    let (w, h) = (image.width(), image.height());
    if w == 0 || h == 0 {
        return image.clone();
    }
    #[allow(clippy::cast_precision_loss)]
    let sigma = sigma.min(w.max(h) as f32);

    let channels: [GrayImage; 3] = std::array::from_fn(|c| {
        GrayImage::from_fn(w, h, |x, y| image::Luma([image.get_pixel(x, y).0[c]]))
    });

    let blurred: [GrayImage; 3] =
        std::array::from_fn(|c| imageproc::filter::gaussian_blur_f32(&channels[c], sigma));

    RgbaImage::from_fn(w, h, |x, y| {
        image::Rgba([
            blurred[0].get_pixel(x, y).0[0],
            blurred[1].get_pixel(x, y).0[0],
            blurred[2].get_pixel(x, y).0[0],
            image.get_pixel(x, y).0[3],
        ])
    })
}
