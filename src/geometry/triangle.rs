use std::cmp::Ordering;

use glam::DVec2;

use super::{closest_point_on_segment, sign, Polygon};

/// Undirected segment between two triangulation vertices
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub a: DVec2,
    pub b: DVec2,
}

impl Segment {
    #[inline]
    pub const fn new(a: DVec2, b: DVec2) -> Self {
        Self { a, b }
    }
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        (self.a == other.a && self.b == other.b) || (self.a == other.b && self.b == other.a)
    }
}

/// Triangle over three points
///
/// Derived centers are always computed from the vertices in lexicographic
/// order, so two triangles over the same three points produce bit-identical
/// centers regardless of their winding or vertex order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: DVec2,
    pub b: DVec2,
    pub c: DVec2,
}

fn lexicographic(p: &DVec2, q: &DVec2) -> Ordering {
    p.x.total_cmp(&q.x).then_with(|| p.y.total_cmp(&q.y))
}

impl Triangle {
    #[inline]
    pub const fn new(a: DVec2, b: DVec2, c: DVec2) -> Self {
        Self { a, b, c }
    }

    /// Vertices sorted lexicographically by `(x, y)`
    pub fn canonical_vertices(&self) -> [DVec2; 3] {
        let mut vertices = [self.a, self.b, self.c];
        vertices.sort_by(lexicographic);
        vertices
    }

    /// Center of the circle through all three vertices
    ///
    /// Non-finite for degenerate (colinear) triangles.
    pub fn circumcenter(&self) -> DVec2 {
        let [a, b, c] = self.canonical_vertices();
        let ab = b - a;
        let ac = c - a;
        let d = 2.0 * ab.perp_dot(ac);
        let ab2 = ab.length_squared();
        let ac2 = ac.length_squared();
        let x = (ac.y * ab2 - ab.y * ac2) / d;
        let y = (ab.x * ac2 - ac.x * ab2) / d;
        a + DVec2::new(x, y)
    }

    /// Average of the three vertices
    pub fn centroid(&self) -> DVec2 {
        let [a, b, c] = self.canonical_vertices();
        (a + b + c) / 3.0
    }

    /// Center of the inscribed circle
    pub fn incenter(&self) -> DVec2 {
        let [a, b, c] = self.canonical_vertices();
        let da = b.distance(c);
        let db = c.distance(a);
        let dc = a.distance(b);
        (a * da + b * db + c * dc) / (da + db + dc)
    }

    /// Whether the vertices are in counter-clockwise order
    #[inline]
    pub fn is_ccw(&self) -> bool {
        (self.a - self.c).perp_dot(self.b - self.c) > 0.0
    }

    /// Strict containment test
    ///
    /// Points exactly on an edge or a vertex are not contained, which is what
    /// routes on-edge insertions to the edge split case during triangulation.
    pub fn contains_point(&self, point: DVec2) -> bool {
        let pab = sign((point - self.a).perp_dot(self.b - self.a));
        let pbc = sign((point - self.b).perp_dot(self.c - self.b));
        if pab != pbc {
            return false;
        }
        let pca = sign((point - self.c).perp_dot(self.a - self.c));
        pab == pca
    }

    /// Whether `point` lies strictly inside the circumcircle
    ///
    /// Determinant test, sign corrected for the winding of the triangle.
    pub fn in_circumcircle(&self, point: DVec2) -> bool {
        let a = self.a - point;
        let b = self.b - point;
        let c = self.c - point;
        let det = a.length_squared() * b.perp_dot(c) - b.length_squared() * a.perp_dot(c)
            + c.length_squared() * a.perp_dot(b);
        if self.is_ccw() {
            det > 0.0
        } else {
            det < 0.0
        }
    }

    #[inline]
    pub fn has_vertex(&self, vertex: DVec2) -> bool {
        self.a == vertex || self.b == vertex || self.c == vertex
    }

    /// Whether both endpoints of `segment` are vertices of this triangle
    #[inline]
    pub fn shares_segment(&self, segment: &Segment) -> bool {
        self.has_vertex(segment.a) && self.has_vertex(segment.b)
    }

    /// The vertex that is not an endpoint of `segment`
    pub fn opposite_vertex(&self, segment: &Segment) -> Option<DVec2> {
        [self.a, self.b, self.c]
            .into_iter()
            .find(|&v| v != segment.a && v != segment.b)
    }

    /// The edge nearest to `point`, with its distance
    pub fn nearest_segment(&self, point: DVec2) -> (Segment, f64) {
        let ab = Segment::new(self.a, self.b);
        let bc = Segment::new(self.b, self.c);
        let ca = Segment::new(self.c, self.a);

        let distance = |s: &Segment| (closest_point_on_segment(s.a, s.b, point) - point).length_squared();
        let (dab, dbc, dca) = (distance(&ab), distance(&bc), distance(&ca));

        if dab < dbc && dab < dca {
            (ab, dab.sqrt())
        } else if dbc < dca {
            (bc, dbc.sqrt())
        } else {
            (ca, dca.sqrt())
        }
    }

    pub fn to_polygon(&self) -> Polygon {
        Polygon::new(vec![self.a, self.b, self.c])
    }
}
