use glam::DVec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{segments_intersect, sign, Rect};

/// Simple polygon given by its ordered vertices
///
/// Polygons produced with centroid or incenter triangle centers may be
/// non-convex, so containment uses a crossing-number test rather than a
/// convexity assumption.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<DVec2>,
}

impl Polygon {
    pub fn new(vertices: Vec<DVec2>) -> Self {
        Self { vertices }
    }

    #[inline]
    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Consecutive vertex pairs, wrapping around from the last to the first vertex
    pub fn edges(&self) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Average of the vertices
    pub fn centroid(&self) -> DVec2 {
        if self.vertices.is_empty() {
            return DVec2::ZERO;
        }
        self.vertices.iter().copied().sum::<DVec2>() / self.vertices.len() as f64
    }

    /// Shoelace area, positive for counter-clockwise winding
    pub fn signed_area(&self) -> f64 {
        self.edges().map(|(a, b)| a.perp_dot(b)).sum::<f64>() * 0.5
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Whether the polygon encloses no area
    ///
    /// True for fewer than three distinct vertices, and for vertices that
    /// all lie on one line.
    pub fn is_degenerate(&self) -> bool {
        let mut distinct = self.vertices.clone();
        distinct.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        distinct.dedup();
        if distinct.len() < 3 {
            return true;
        }
        let scale = self.bounds().size().length_squared();
        !(self.area() > scale * 1e-12)
    }

    /// Whether every turn along the boundary has the same direction
    pub fn is_convex(&self) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        let mut direction = 0i8;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            let c = self.vertices[(i + 2) % n];
            let turn = sign((b - a).perp_dot(c - b));
            if turn == 0 {
                continue;
            }
            if direction == 0 {
                direction = turn;
            } else if turn != direction {
                return false;
            }
        }
        direction != 0
    }

    /// Crossing-number point containment
    pub fn contains(&self, point: DVec2) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > point.y) != (b.y > point.y) {
                let x = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if point.x < x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Axis-aligned bounds
    ///
    /// `max` is the largest vertex coordinate, so vertices on the maximum
    /// border are not contained by the half-open result.
    pub fn bounds(&self) -> Rect {
        let mut min = DVec2::splat(f64::INFINITY);
        let mut max = DVec2::splat(f64::NEG_INFINITY);
        for &v in &self.vertices {
            min = min.min(v);
            max = max.max(v);
        }
        Rect::new(min, max)
    }

    /// Whether the polygon and the rectangle overlap
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        if self.vertices.is_empty() {
            return false;
        }
        if !self.bounds().inflate(DVec2::splat(f64::EPSILON)).intersects(rect) {
            return false;
        }
        if self.vertices.iter().any(|&v| rect.contains(v)) {
            return true;
        }
        let corners = rect.corners();
        if corners.iter().any(|&c| self.contains(c)) || self.contains(rect.center()) {
            return true;
        }
        self.edges().any(|(a, b)| {
            (0..4).any(|i| segments_intersect(a, b, corners[i], corners[(i + 1) % 4]))
        })
    }

    /// Clip against a rectangle (Sutherland–Hodgman)
    ///
    /// Exact for convex polygons; non-convex input may produce degenerate
    /// connecting edges but keeps the correct area.
    pub fn clip_to_rect(&self, rect: &Rect) -> Polygon {
        let mut output = self.vertices.clone();

        // Each clip plane is (axis, bound, keep values >= bound)
        let planes = [
            (0usize, rect.min.x, true),
            (0usize, rect.max.x, false),
            (1usize, rect.min.y, true),
            (1usize, rect.max.y, false),
        ];

        for (axis, bound, keep_greater) in planes {
            if output.is_empty() {
                break;
            }
            let inside = |p: DVec2| {
                let value = if axis == 0 { p.x } else { p.y };
                if keep_greater {
                    value >= bound
                } else {
                    value <= bound
                }
            };
            let intersect = |p: DVec2, q: DVec2| {
                let (pv, qv) = if axis == 0 { (p.x, q.x) } else { (p.y, q.y) };
                let t = (bound - pv) / (qv - pv);
                p + (q - p) * t
            };

            let input = std::mem::take(&mut output);
            let n = input.len();
            for i in 0..n {
                let current = input[i];
                let previous = input[(i + n - 1) % n];
                match (inside(previous), inside(current)) {
                    (true, true) => output.push(current),
                    (true, false) => output.push(intersect(previous, current)),
                    (false, true) => {
                        output.push(intersect(previous, current));
                        output.push(current);
                    }
                    (false, false) => {}
                }
            }
        }

        Polygon::new(output)
    }
}
