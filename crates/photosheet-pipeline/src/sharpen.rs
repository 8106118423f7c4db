//! 3×3 sharpening convolution.
//!
//! The kernel has center `1 + 4s`, the four orthogonal neighbors `-s`,
//! and zero corners, where `s = sharpness / 100`. Its weights sum to 1,
//! so flat regions are unchanged and `s = 0` is the identity kernel.
//! Edges are handled by repeating the border pixel. Alpha is preserved.

use crate::color::from_unit;
use crate::types::RgbaImage;

/// Sharpening kernel for `sharpness` percent (`[0, 100]`).
#[must_use]
pub fn sharpen_kernel(sharpness: f32) -> [[f32; 3]; 3] {
    let s = sharpness / 100.0;
    [[0.0, -s, 0.0], [-s, 4.0f32.mul_add(s, 1.0), -s], [0.0, -s, 0.0]]
}

/// Convolve the RGB channels of `image` with a 3×3 kernel.
#[must_use = "returns the convolved image"]
pub fn convolve3x3(image: &RgbaImage, kernel: &[[f32; 3]; 3]) -> RgbaImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return image.clone();
    }
    let max_x = i64::from(w) - 1;
    let max_y = i64::from(h) - 1;

    RgbaImage::from_fn(w, h, |x, y| {
        let mut acc = [0.0f32; 3];
        for (ky, row) in kernel.iter().enumerate() {
            for (kx, &weight) in row.iter().enumerate() {
                if weight == 0.0 {
                    continue;
                }
                #[allow(clippy::cast_possible_wrap)]
                let sx = (i64::from(x) + kx as i64 - 1).clamp(0, max_x);
                #[allow(clippy::cast_possible_wrap)]
                let sy = (i64::from(y) + ky as i64 - 1).clamp(0, max_y);
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let p = image.get_pixel(sx as u32, sy as u32).0;
                for c in 0..3 {
                    acc[c] = weight.mul_add(f32::from(p[c]), acc[c]);
                }
            }
        }
        let alpha = image.get_pixel(x, y).0[3];
        image::Rgba([
            from_unit(acc[0] / 255.0),
            from_unit(acc[1] / 255.0),
            from_unit(acc[2] / 255.0),
            alpha,
        ])
    })
}

/// Sharpen `image` by `sharpness` percent. Zero returns a copy.
#[must_use = "returns the sharpened image"]
pub fn sharpen(image: &RgbaImage, sharpness: f32) -> RgbaImage {
    if sharpness <= 0.0 {
        return image.clone();
    }
    convolve3x3(image, &sharpen_kernel(sharpness))
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn zero_sharpness_kernel_is_identity() {
        assert_eq!(
            sharpen_kernel(0.0),
            [[0.0, -0.0, 0.0], [-0.0, 1.0, -0.0], [0.0, -0.0, 0.0]]
        );
        let k = sharpen_kernel(0.0);
        assert_eq!(k[1][1], 1.0);
        assert!(k.iter().flatten().enumerate().all(|(i, &v)| i == 4 || v == 0.0));
    }

    #[test]
    fn full_sharpness_kernel() {
        let k = sharpen_kernel(100.0);
        assert_eq!(k[1][1], 5.0);
        assert_eq!(k[0][1], -1.0);
        assert_eq!(k[1][0], -1.0);
        assert_eq!(k[0][0], 0.0);
        assert!((k.iter().flatten().sum::<f32>() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn identity_kernel_convolution_is_exact() {
        let img = RgbaImage::from_fn(6, 4, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            let v = (x * 37 + y * 11) as u8;
            image::Rgba([v, v / 2, 255 - v, 77])
        });
        assert_eq!(convolve3x3(&img, &sharpen_kernel(0.0)), img);
    }

    #[test]
    fn flat_region_unchanged() {
        let img = RgbaImage::from_pixel(5, 5, image::Rgba([90, 120, 30, 255]));
        assert_eq!(sharpen(&img, 80.0), img);
    }

    #[test]
    fn sharpening_increases_edge_contrast() {
        let img = RgbaImage::from_fn(8, 3, |x, _| {
            if x < 4 {
                image::Rgba([100, 100, 100, 255])
            } else {
                image::Rgba([150, 150, 150, 255])
            }
        });
        let out = sharpen(&img, 50.0);
        assert!(out.get_pixel(3, 1).0[0] < 100);
        assert!(out.get_pixel(4, 1).0[0] > 150);
    }

    #[test]
    fn alpha_preserved() {
        let img = RgbaImage::from_fn(4, 4, |x, _| image::Rgba([10 * x as u8, 0, 0, 40]));
        for p in sharpen(&img, 100.0).pixels() {
            assert_eq!(p.0[3], 40);
        }
    }
}
