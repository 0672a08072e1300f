//! Incremental Delaunay triangulation
//!
//! Points are inserted one at a time into a large enclosing super triangle.
//! Every insertion splits the containing triangle (or, for a point exactly on
//! an edge, the two triangles sharing that edge) and restores the Delaunay
//! condition with edge flips. Triangles touching the super triangle are
//! dropped at the end.

use std::cmp::Ordering;

use glam::DVec2;
use tracing::trace;

use crate::error::{CellMapError, Result};
use crate::geometry::{Segment, Triangle};

/// Scale of the super triangle relative to the largest coordinate magnitude
const SUPER_TRIANGLE_SCALE: f64 = 16.0;

/// Triangulate a point set
///
/// # Arguments
///
/// * `points` - At least three distinct, finite, non-colinear points
///
/// # Returns
///
/// The Delaunay triangles, built from the exact input coordinates
///
/// # Errors
///
/// Returns `InvalidInput` if there are fewer than three points, if a point is
/// not finite, if a point occurs twice, or if all points are colinear. None of
/// these sets can be triangulated cleanly by incremental insertion.
///
/// # Example
///
/// ```
/// use voronoi_cellmap::generation::triangulate;
/// use glam::DVec2;
///
/// let points = [
///     DVec2::new(0.0, 0.0),
///     DVec2::new(1.0, 0.0),
///     DVec2::new(0.0, 1.0),
///     DVec2::new(1.0, 1.1),
/// ];
/// let triangles = triangulate(&points).unwrap();
/// assert_eq!(triangles.len(), 2);
/// ```
pub fn triangulate(points: &[DVec2]) -> Result<Vec<Triangle>> {
    validate(points)?;

    let max_coordinate = points
        .iter()
        .fold(0.0f64, |max, p| max.max(p.x.abs()).max(p.y.abs()))
        * SUPER_TRIANGLE_SCALE;
    let super_triangle = Triangle::new(
        DVec2::new(0.0, 3.0 * max_coordinate),
        DVec2::new(3.0 * max_coordinate, 0.0),
        DVec2::new(-3.0 * max_coordinate, -3.0 * max_coordinate),
    );

    let mut triangles = vec![super_triangle];
    let mut pending = Vec::new();

    for &point in points {
        match triangles.iter().position(|t| t.contains_point(point)) {
            Some(index) => {
                let Triangle { a, b, c } = triangles.swap_remove(index);
                let first = Triangle::new(a, b, point);
                let second = Triangle::new(b, c, point);
                let third = Triangle::new(c, a, point);
                triangles.extend([first, second, third]);

                // Pushed in reverse so the first edge is legalized first
                pending.push((third, Segment::new(c, a)));
                pending.push((second, Segment::new(b, c)));
                pending.push((first, Segment::new(a, b)));
            }
            None => {
                // The point lies on an edge; split the two triangles sharing
                // the nearest edge into four.
                let edge = nearest_segment(&triangles, point);
                let first_index = triangles
                    .iter()
                    .position(|t| t.shares_segment(&edge))
                    .unwrap_or_else(|| panic!("no triangle shares the nearest edge {:?}", edge));
                let first = triangles.swap_remove(first_index);
                let second_index = triangles
                    .iter()
                    .position(|t| t.shares_segment(&edge))
                    .unwrap_or_else(|| panic!("edge {:?} has no second triangle", edge));
                let second = triangles.swap_remove(second_index);

                let first_opposite = opposite(&first, &edge);
                let second_opposite = opposite(&second, &edge);

                let t1 = Triangle::new(edge.a, first_opposite, point);
                let t2 = Triangle::new(edge.b, first_opposite, point);
                let t3 = Triangle::new(edge.a, second_opposite, point);
                let t4 = Triangle::new(edge.b, second_opposite, point);
                triangles.extend([t1, t2, t3, t4]);

                pending.push((t4, Segment::new(edge.b, second_opposite)));
                pending.push((t3, Segment::new(edge.a, second_opposite)));
                pending.push((t2, Segment::new(edge.b, first_opposite)));
                pending.push((t1, Segment::new(edge.a, first_opposite)));
            }
        }
        legalize(&mut triangles, &mut pending, point);
    }

    triangles.retain(|t| {
        !t.has_vertex(super_triangle.a) && !t.has_vertex(super_triangle.b) && !t.has_vertex(super_triangle.c)
    });

    trace!(points = points.len(), triangles = triangles.len(), "triangulated point set");
    Ok(triangles)
}

fn validate(points: &[DVec2]) -> Result<()> {
    if points.len() < 3 {
        return Err(CellMapError::InvalidInput(format!(
            "less than three points in point set (got {})",
            points.len()
        )));
    }
    if let Some(p) = points.iter().find(|p| !p.is_finite()) {
        return Err(CellMapError::InvalidInput(format!("non-finite point {}", p)));
    }

    let mut sorted = points.to_vec();
    sorted.sort_by(|p, q| p.x.total_cmp(&q.x).then_with(|| p.y.total_cmp(&q.y)));
    if let Some(pair) = sorted.windows(2).find(|w| w[0] == w[1]) {
        return Err(CellMapError::InvalidInput(format!("duplicate point {}", pair[0])));
    }

    let origin = points[0];
    let direction = points[1] - origin;
    if points[2..].iter().all(|&p| direction.perp_dot(p - origin) == 0.0) {
        return Err(CellMapError::InvalidInput("all points are colinear".into()));
    }
    Ok(())
}

/// Restore the Delaunay condition around `point` by flipping illegal edges
///
/// Each pending entry pairs a triangle containing `point` with its edge
/// opposite to `point`. Work is processed depth-first, newest first.
fn legalize(triangles: &mut Vec<Triangle>, pending: &mut Vec<(Triangle, Segment)>, point: DVec2) {
    while let Some((triangle, edge)) = pending.pop() {
        let Some(neighbour_index) = triangles
            .iter()
            .position(|t| *t != triangle && t.shares_segment(&edge))
        else {
            continue;
        };
        let neighbour = triangles[neighbour_index];
        if !neighbour.in_circumcircle(point) {
            continue;
        }

        let far = opposite(&neighbour, &edge);
        triangles.swap_remove(neighbour_index);
        remove_triangle(triangles, &triangle);

        let first = Triangle::new(far, edge.a, point);
        let second = Triangle::new(far, edge.b, point);
        triangles.push(first);
        triangles.push(second);

        pending.push((second, Segment::new(far, edge.b)));
        pending.push((first, Segment::new(far, edge.a)));
    }
}

fn opposite(triangle: &Triangle, edge: &Segment) -> DVec2 {
    triangle
        .opposite_vertex(edge)
        .unwrap_or_else(|| panic!("triangle {:?} is degenerate on edge {:?}", triangle, edge))
}

fn remove_triangle(triangles: &mut Vec<Triangle>, triangle: &Triangle) {
    let index = triangles
        .iter()
        .position(|t| t == triangle)
        .unwrap_or_else(|| panic!("triangle {:?} missing from triangulation", triangle));
    triangles.swap_remove(index);
}

/// The edge nearest to `point` over all triangles; the first wins ties
fn nearest_segment(triangles: &[Triangle], point: DVec2) -> Segment {
    triangles
        .iter()
        .map(|t| t.nearest_segment(point))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        .map(|(segment, _)| segment)
        .unwrap_or_else(|| panic!("triangulation is empty"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circumcircle_is_empty(triangles: &[Triangle], points: &[DVec2]) -> bool {
        triangles.iter().all(|t| {
            let center = t.circumcenter();
            let radius = center.distance(t.a);
            points
                .iter()
                .filter(|&&p| !t.has_vertex(p))
                .all(|p| center.distance(*p) >= radius * (1.0 - 1e-9) - 1e-9)
        })
    }

    #[test]
    fn test_too_few_points() {
        for n in 0..3 {
            let points: Vec<DVec2> = (0..n).map(|i| DVec2::new(i as f64, 1.0)).collect();
            assert!(matches!(triangulate(&points), Err(CellMapError::InvalidInput(_))));
        }
    }

    #[test]
    fn test_single_triangle() {
        let points = [DVec2::new(0.0, 0.0), DVec2::new(2.0, 0.0), DVec2::new(1.0, 3.0)];
        let triangles = triangulate(&points).unwrap();
        assert_eq!(triangles.len(), 1);
        for p in points {
            assert!(triangles[0].has_vertex(p));
        }
    }

    #[test]
    fn test_point_on_internal_edge() {
        // (1, 1) lies exactly on the diagonal of the square
        let points = [
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(0.0, 2.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(1.0, 1.0),
        ];
        let triangles = triangulate(&points).unwrap();
        assert_eq!(triangles.len(), 4);
        assert!(triangles.iter().all(|t| t.has_vertex(DVec2::new(1.0, 1.0))));
    }

    #[test]
    fn test_duplicate_points_rejected() {
        let points = [
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(1.0, 0.0),
        ];
        assert!(matches!(triangulate(&points), Err(CellMapError::InvalidInput(_))));
    }

    #[test]
    fn test_colinear_points_rejected() {
        let points: Vec<DVec2> = (0..6).map(|i| DVec2::new(i as f64, 2.0 * i as f64)).collect();
        assert!(matches!(triangulate(&points), Err(CellMapError::InvalidInput(_))));
    }

    #[test]
    fn test_delaunay_property_and_euler_count() {
        // Hand picked, general position; the hull is the first five points
        let points = [
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, -1.0),
            DVec2::new(12.0, 8.0),
            DVec2::new(5.0, 12.0),
            DVec2::new(-2.0, 7.0),
            DVec2::new(4.0, 3.0),
            DVec2::new(7.5, 5.5),
            DVec2::new(2.5, 7.2),
            DVec2::new(6.1, 9.3),
        ];
        let triangles = triangulate(&points).unwrap();

        let n = points.len();
        let k = 5;
        assert_eq!(triangles.len(), 2 * n - 2 - k);
        assert!(circumcircle_is_empty(&triangles, &points));
    }

    #[test]
    fn test_negative_coordinates() {
        let points = [
            DVec2::new(-100.0, -100.0),
            DVec2::new(-90.0, -101.0),
            DVec2::new(-95.0, -92.0),
            DVec2::new(-97.0, -97.0),
        ];
        let triangles = triangulate(&points).unwrap();
        assert_eq!(triangles.len(), 3);
        assert!(circumcircle_is_empty(&triangles, &points));
    }
}
