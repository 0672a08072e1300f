use glam::DVec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::segments_intersect;

/// Axis-aligned rectangle covering `[min, max)`
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Inclusive lower corner
    pub min: DVec2,
    /// Exclusive upper corner
    pub max: DVec2,
}

impl Rect {
    /// Create a rectangle from its two corners
    #[inline]
    pub const fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// Create a rectangle from its lower corner and its size
    #[inline]
    pub fn from_origin_size(origin: DVec2, size: DVec2) -> Self {
        Self::new(origin, origin + size)
    }

    #[inline]
    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    #[inline]
    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// Whether the rectangle covers no area
    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.max.x > self.min.x && self.max.y > self.min.y)
    }

    /// Whether both corners are finite
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Half-open containment test
    #[inline]
    pub fn contains(&self, point: DVec2) -> bool {
        point.x >= self.min.x && point.x < self.max.x && point.y >= self.min.y && point.y < self.max.y
    }

    /// Whether `other` lies completely inside this rectangle, borders included
    #[inline]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.min.x >= self.min.x && other.min.y >= self.min.y && other.max.x <= self.max.x && other.max.y <= self.max.y
    }

    /// Smallest rectangle covering both
    #[inline]
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Whether the two rectangles overlap with a non-empty area
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// Intersection of both rectangles, possibly empty
    pub fn intersection(&self, other: &Rect) -> Rect {
        Rect::new(self.min.max(other.min), self.max.min(other.max))
    }

    /// Grow the rectangle on every side by `fraction` of its size
    ///
    /// A fraction of `(0.3, 0.3)` adds 30% of the width to both the left and
    /// the right side, and 30% of the height to the top and the bottom.
    pub fn expand(&self, fraction: DVec2) -> Rect {
        let offset = self.size() * fraction;
        Rect::new(self.min - offset, self.max + offset)
    }

    /// Grow the rectangle on every side by an absolute margin
    pub fn inflate(&self, margin: DVec2) -> Rect {
        Rect::new(self.min - margin, self.max + margin)
    }

    /// The four corners in counter-clockwise order, starting at `min`
    pub fn corners(&self) -> [DVec2; 4] {
        [
            self.min,
            DVec2::new(self.max.x, self.min.y),
            self.max,
            DVec2::new(self.min.x, self.max.y),
        ]
    }

    /// Whether the closed segment `a`-`b` touches this rectangle
    pub fn intersects_segment(&self, a: DVec2, b: DVec2) -> bool {
        if self.contains(a) || self.contains(b) {
            return true;
        }
        let corners = self.corners();
        (0..4).any(|i| segments_intersect(a, b, corners[i], corners[(i + 1) % 4]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Rect {
        Rect::new(DVec2::ZERO, DVec2::ONE)
    }

    #[test]
    fn test_half_open_contains() {
        let rect = unit();
        assert!(rect.contains(DVec2::new(0.0, 0.0)));
        assert!(rect.contains(DVec2::new(0.999, 0.5)));
        assert!(!rect.contains(DVec2::new(1.0, 0.5)));
        assert!(!rect.contains(DVec2::new(0.5, 1.0)));
    }

    #[test]
    fn test_expand() {
        let rect = Rect::new(DVec2::new(0.0, 0.0), DVec2::new(100.0, 50.0));
        let expanded = rect.expand(DVec2::new(0.3, 0.3));
        assert_eq!(expanded.min, DVec2::new(-30.0, -15.0));
        assert_eq!(expanded.max, DVec2::new(130.0, 65.0));
    }

    #[test]
    fn test_intersects() {
        let rect = unit();
        assert!(rect.intersects(&Rect::new(DVec2::splat(0.5), DVec2::splat(2.0))));
        // Sharing only a border is not an overlap
        assert!(!rect.intersects(&Rect::new(DVec2::new(1.0, 0.0), DVec2::new(2.0, 1.0))));
        assert!(rect.intersection(&Rect::new(DVec2::splat(2.0), DVec2::splat(3.0))).is_empty());
    }

    #[test]
    fn test_contains_rect_and_union() {
        let rect = unit();
        assert!(rect.contains_rect(&rect));
        assert!(rect.contains_rect(&Rect::new(DVec2::splat(0.25), DVec2::splat(0.75))));
        assert!(!rect.contains_rect(&Rect::new(DVec2::splat(0.5), DVec2::splat(1.5))));

        let joined = rect.union(&Rect::new(DVec2::new(2.0, -1.0), DVec2::new(3.0, 0.5)));
        assert_eq!(joined, Rect::new(DVec2::new(0.0, -1.0), DVec2::new(3.0, 1.0)));
    }

    #[test]
    fn test_intersects_segment() {
        let rect = unit();
        // Passes straight through without an endpoint inside
        assert!(rect.intersects_segment(DVec2::new(-1.0, 0.5), DVec2::new(2.0, 0.5)));
        assert!(!rect.intersects_segment(DVec2::new(-1.0, 2.0), DVec2::new(2.0, 2.0)));
    }

    #[test]
    fn test_empty_and_finite() {
        assert!(Rect::new(DVec2::ONE, DVec2::ONE).is_empty());
        assert!(!unit().is_empty());
        assert!(!Rect::new(DVec2::ZERO, DVec2::new(f64::NAN, 1.0)).is_finite());
    }
}
