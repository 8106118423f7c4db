//! Rectangles in continuous and pixel space.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle with fractional coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Width divided by height.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// Whether both extents are finite and strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Whether `other` lies fully inside `self`, allowing `eps` slack.
    #[must_use]
    pub fn contains_rect(&self, other: &Self, eps: f64) -> bool {
        other.x >= self.x - eps
            && other.y >= self.y - eps
            && other.right() <= self.right() + eps
            && other.bottom() <= self.bottom() + eps
    }

    /// Snap to whole pixels by rounding each edge independently.
    ///
    /// Rounding edges (rather than origin and size) keeps adjacent
    /// rectangles adjacent after snapping.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn snap(&self) -> PixelRect {
        let left = self.x.round().max(0.0);
        let top = self.y.round().max(0.0);
        let right = self.right().round().max(left);
        let bottom = self.bottom().round().max(top);
        PixelRect {
            x: left as u32,
            y: top as u32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        }
    }
}

/// Axis-aligned rectangle on the pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelRect {
    /// Create a new pixel rectangle.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// One past the rightmost column.
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    /// One past the bottom row.
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Whether the rectangle covers no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether pixel `(px, py)` lies inside.
    #[must_use]
    pub const fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Whether `other` lies fully inside `self`.
    #[must_use]
    pub const fn contains_rect(&self, other: &Self) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Whether the two rectangles share at least one pixel.
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_rounds_edges() {
        let r = Rect::new(20.0, 68.571, 360.0, 462.857);
        assert_eq!(r.snap(), PixelRect::new(20, 69, 360, 462));
    }

    #[test]
    fn adjacent_rects_stay_adjacent_after_snap() {
        let a = Rect::new(0.0, 0.0, 133.4, 10.0).snap();
        let b = Rect::new(133.4, 0.0, 133.4, 10.0).snap();
        assert_eq!(a.right(), b.x);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn containment_and_intersection() {
        let outer = PixelRect::new(0, 0, 10, 10);
        let inner = PixelRect::new(2, 2, 3, 3);
        assert!(outer.contains_rect(&inner));
        assert!(outer.intersects(&inner));
        assert!(!inner.contains_rect(&outer));
        assert!(!PixelRect::new(10, 0, 5, 5).intersects(&outer));
        assert!(outer.contains(9, 9));
        assert!(!outer.contains(10, 9));
    }

    #[test]
    fn positivity() {
        assert!(Rect::new(0.0, 0.0, 1.0, 1.0).is_positive());
        assert!(!Rect::new(0.0, 0.0, 0.0, 1.0).is_positive());
        assert!(!Rect::new(0.0, 0.0, f64::NAN, 1.0).is_positive());
    }
}
