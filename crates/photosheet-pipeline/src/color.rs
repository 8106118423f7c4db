//! Affine color transforms shared by the preview and bake paths.
//!
//! Each per-pixel filter step is an affine map on normalized RGB
//! (`[0, 1]` per channel), expressed as a [`ColorMatrix`]. The bake path
//! applies the steps one by one, clamping after each; the preview path
//! multiplies them into a single matrix and applies it once.

use crate::filters::FilterModel;

/// Rec. 709 luma weights.
pub const LUMA_WEIGHTS: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Classic sepia tone matrix.
pub const SEPIA: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// Luma of a normalized RGB triple.
#[must_use]
pub fn luma(rgb: [f32; 3]) -> f32 {
    LUMA_WEIGHTS[0].mul_add(rgb[0], LUMA_WEIGHTS[1].mul_add(rgb[1], LUMA_WEIGHTS[2] * rgb[2]))
}

/// A 3×4 affine transform on normalized RGB: `out = M · rgb + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix {
    m: [[f32; 3]; 3],
    offset: [f32; 3],
}

impl ColorMatrix {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        offset: [0.0; 3],
    };

    /// Uniform scale of every channel (`amount = 1.0` is identity).
    #[must_use]
    pub const fn brightness(amount: f32) -> Self {
        Self {
            m: [[amount, 0.0, 0.0], [0.0, amount, 0.0], [0.0, 0.0, amount]],
            offset: [0.0; 3],
        }
    }

    /// Scale around mid-gray: `c' = (c - 0.5) · amount + 0.5`.
    #[must_use]
    pub fn contrast(amount: f32) -> Self {
        let o = 0.5f32.mul_add(-amount, 0.5);
        Self {
            m: [[amount, 0.0, 0.0], [0.0, amount, 0.0], [0.0, 0.0, amount]],
            offset: [o; 3],
        }
    }

    /// Interpolate each channel toward (or away from) its luma:
    /// `c' = L + (c - L) · amount`.
    #[must_use]
    pub fn saturation(amount: f32) -> Self {
        let mut m = [[0.0; 3]; 3];
        for (row, out) in m.iter_mut().enumerate() {
            for (col, w) in LUMA_WEIGHTS.iter().enumerate() {
                let diag = if row == col { amount } else { 0.0 };
                out[col] = w.mul_add(1.0 - amount, diag);
            }
        }
        Self {
            m,
            offset: [0.0; 3],
        }
    }

    /// Blend between identity and the sepia matrix by `amount ∈ [0, 1]`.
    #[must_use]
    pub fn sepia(amount: f32) -> Self {
        Self::IDENTITY.lerp(
            &Self {
                m: SEPIA,
                offset: [0.0; 3],
            },
            amount,
        )
    }

    /// Blend between identity and full luma by `amount ∈ [0, 1]`.
    #[must_use]
    pub fn grayscale(amount: f32) -> Self {
        Self::IDENTITY.lerp(
            &Self {
                m: [LUMA_WEIGHTS; 3],
                offset: [0.0; 3],
            },
            amount,
        )
    }

    /// The five color steps of `filters`, in bake order.
    #[must_use]
    pub fn steps(filters: &FilterModel) -> [Self; 5] {
        [
            Self::brightness(filters.brightness() / 100.0),
            Self::contrast(filters.contrast() / 100.0),
            Self::saturation(filters.saturation() / 100.0),
            Self::sepia(filters.sepia() / 100.0),
            Self::grayscale(filters.grayscale() / 100.0),
        ]
    }

    /// The five color steps of `filters` folded into one matrix.
    #[must_use]
    pub fn composed(filters: &FilterModel) -> Self {
        Self::steps(filters)
            .iter()
            .fold(Self::IDENTITY, |acc, step| step.after(&acc))
    }

    /// `self ∘ first`: the transform that applies `first`, then `self`.
    #[must_use]
    pub fn after(&self, first: &Self) -> Self {
        let mut m = [[0.0; 3]; 3];
        let mut offset = [0.0; 3];
        for r in 0..3 {
            for c in 0..3 {
                m[r][c] = (0..3).map(|k| self.m[r][k] * first.m[k][c]).sum();
            }
            offset[r] = (0..3).map(|k| self.m[r][k] * first.offset[k]).sum::<f32>() + self.offset[r];
        }
        Self { m, offset }
    }

    /// Componentwise linear interpolation toward `other`.
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        let mut out = *self;
        for r in 0..3 {
            for c in 0..3 {
                out.m[r][c] = (other.m[r][c] - self.m[r][c]).mul_add(t, self.m[r][c]);
            }
            out.offset[r] = (other.offset[r] - self.offset[r]).mul_add(t, self.offset[r]);
        }
        out
    }

    /// Whether this is exactly the identity transform.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Apply to a normalized RGB triple without clamping.
    #[must_use]
    pub fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        std::array::from_fn(|r| {
            self.m[r][0].mul_add(
                rgb[0],
                self.m[r][1].mul_add(rgb[1], self.m[r][2].mul_add(rgb[2], self.offset[r])),
            )
        })
    }

    /// Apply and clamp each channel into `[0, 1]`.
    #[must_use]
    pub fn apply_clamped(&self, rgb: [f32; 3]) -> [f32; 3] {
        self.apply(rgb).map(|c| c.clamp(0.0, 1.0))
    }
}

/// Convert an 8-bit channel to `[0, 1]`.
#[must_use]
pub fn to_unit(v: u8) -> f32 {
    f32::from(v) / 255.0
}

/// Convert a `[0, 1]` channel back to 8 bits with rounding.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn from_unit(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Hermite smoothstep between `edge0` and `edge1`.
#[must_use]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * 2.0f32.mul_add(-t, 3.0)
}
