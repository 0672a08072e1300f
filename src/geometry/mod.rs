//! Planar geometry primitives
//!
//! Everything in the map is expressed in `f64` world coordinates using
//! [`glam::DVec2`] points.

mod polygon;
mod rect;
mod triangle;

pub use polygon::Polygon;
pub use rect::Rect;
pub use triangle::{Segment, Triangle};

use glam::DVec2;

/// Sign of a value as -1, 0 or 1 (zero maps to 0, unlike `f64::signum`)
#[inline]
pub(crate) fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Closest point to `point` on the segment `a`-`b`
pub fn closest_point_on_segment(a: DVec2, b: DVec2, point: DVec2) -> DVec2 {
    let ab = b - a;
    let length_squared = ab.length_squared();
    if length_squared == 0.0 {
        return a;
    }
    let t = ((point - a).dot(ab) / length_squared).clamp(0.0, 1.0);
    a + ab * t
}

/// Distance from `point` to the segment `a`-`b`
#[inline]
pub fn distance_to_segment(a: DVec2, b: DVec2, point: DVec2) -> f64 {
    closest_point_on_segment(a, b, point).distance(point)
}

/// Whether the closed segments `p1`-`p2` and `q1`-`q2` share at least one point
pub fn segments_intersect(p1: DVec2, p2: DVec2, q1: DVec2, q2: DVec2) -> bool {
    let d1 = sign((q2 - q1).perp_dot(p1 - q1));
    let d2 = sign((q2 - q1).perp_dot(p2 - q1));
    let d3 = sign((p2 - p1).perp_dot(q1 - p1));
    let d4 = sign((p2 - p1).perp_dot(q2 - p1));

    if d1 * d2 < 0 && d3 * d4 < 0 {
        return true;
    }

    fn on_segment(a: DVec2, b: DVec2, p: DVec2) -> bool {
        p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
    }

    (d1 == 0 && on_segment(q1, q2, p1))
        || (d2 == 0 && on_segment(q1, q2, p2))
        || (d3 == 0 && on_segment(p1, p2, q1))
        || (d4 == 0 && on_segment(p1, p2, q2))
}
