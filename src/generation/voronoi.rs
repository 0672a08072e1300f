//! Cell polygon construction from a Delaunay triangulation
//!
//! Two strategies turn a triangulated point set into `(center, polygon)` pairs:
//! every triangle becomes a cell ([`DelaunayPolygonGenerator`]), or every
//! triangulation vertex becomes a cell bounded by the centers of its incident
//! triangles ([`VoronoiPolygonGenerator`]).

use std::collections::HashMap;

use glam::DVec2;

use crate::error::Result;
use crate::generation::delaunay::triangulate;
use crate::geometry::{Polygon, Rect, Triangle};

/// Type alias for vertex-triangle adjacency map, keyed by exact vertex bits
type VertexTriangleMap = HashMap<(u64, u64), Vec<usize>>;

/// A generated cell before it is assembled into the map
#[derive(Debug, Clone, PartialEq)]
pub struct CellPolygon {
    /// Representative point of the cell; its identity in the map
    pub center: DVec2,
    /// Boundary of the cell
    pub polygon: Polygon,
    /// Area whose points decide the shape of the cell
    ///
    /// The bounds of the circumcircles of every triangle the cell was built
    /// from. Adding points outside of it never changes the cell.
    pub support: Rect,
}

impl CellPolygon {
    /// Cell centered on the vertex average of `polygon`, supported by its bounds
    pub fn from_polygon(polygon: Polygon) -> Self {
        Self {
            center: polygon.centroid(),
            support: polygon.bounds(),
            polygon,
        }
    }
}

/// Converts a point set into cell polygons
pub trait CellPolygonGenerator {
    /// Triangulate `points` and build one polygon per resulting cell
    ///
    /// # Errors
    ///
    /// Propagates triangulation errors (fewer than three points, duplicates,
    /// colinear input).
    fn generate(&self, points: &[DVec2]) -> Result<Vec<CellPolygon>>;
}

/// Which point of a triangle becomes a Voronoi cell vertex
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TriangleCenter {
    /// True Voronoi diagram: cells are convex and contain their site
    #[default]
    Circumcenter,
    /// Smoother cells, not necessarily convex
    Centroid,
    /// Always inside the triangle, not necessarily convex cells
    Incenter,
    /// Linear blend between two other providers
    Lerp {
        from: Box<TriangleCenter>,
        to: Box<TriangleCenter>,
        t: f64,
    },
}

impl TriangleCenter {
    /// Blend of `from` (at `t = 0`) and `to` (at `t = 1`)
    pub fn lerp(from: TriangleCenter, to: TriangleCenter, t: f64) -> Self {
        TriangleCenter::Lerp {
            from: Box::new(from),
            to: Box::new(to),
            t,
        }
    }

    /// Compute this center for `triangle`
    pub fn center(&self, triangle: &Triangle) -> DVec2 {
        match self {
            TriangleCenter::Circumcenter => triangle.circumcenter(),
            TriangleCenter::Centroid => triangle.centroid(),
            TriangleCenter::Incenter => triangle.incenter(),
            TriangleCenter::Lerp { from, to, t } => from.center(triangle).lerp(to.center(triangle), *t),
        }
    }
}

/// One cell per triangle, centered on the triangle centroid
#[derive(Debug, Clone, Copy, Default)]
pub struct DelaunayPolygonGenerator;

impl CellPolygonGenerator for DelaunayPolygonGenerator {
    fn generate(&self, points: &[DVec2]) -> Result<Vec<CellPolygon>> {
        let triangles = triangulate(points)?;
        Ok(triangles
            .iter()
            .map(|t| CellPolygon {
                center: t.centroid(),
                polygon: t.to_polygon(),
                support: circumcircle_bounds(t),
            })
            .collect())
    }
}

/// One cell per triangulation vertex
///
/// The cell of a vertex connects the centers of all triangles around it,
/// ordered by angle. Vertices with two or fewer incident triangles sit on the
/// boundary of the triangulation and produce no cell, and neither do cells
/// whose centers collapse into a point or a line.
///
/// # Example
///
/// ```
/// use voronoi_cellmap::generation::{CellPolygonGenerator, TriangleCenter, VoronoiPolygonGenerator};
/// use glam::DVec2;
///
/// let mut points = Vec::new();
/// for x in 0..5 {
///     for y in 0..5 {
///         let jitter = ((x * 7 + y * 13) % 5) as f64 * 0.05;
///         points.push(DVec2::new(x as f64 + jitter, y as f64 - jitter));
///     }
/// }
///
/// let generator = VoronoiPolygonGenerator::new(TriangleCenter::Circumcenter);
/// let cells = generator.generate(&points).unwrap();
/// assert!(!cells.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct VoronoiPolygonGenerator {
    center: TriangleCenter,
}

impl VoronoiPolygonGenerator {
    pub fn new(center: TriangleCenter) -> Self {
        Self { center }
    }

    pub fn triangle_center(&self) -> &TriangleCenter {
        &self.center
    }

    /// Like [`CellPolygonGenerator::generate`], also returning the site
    /// (triangulation vertex) each cell was built around
    pub fn generate_with_sites(&self, points: &[DVec2]) -> Result<Vec<(DVec2, CellPolygon)>> {
        let triangles = triangulate(points)?;
        let centers: Vec<DVec2> = triangles.iter().map(|t| self.center.center(t)).collect();
        let vertex_triangle_map = build_vertex_triangle_map(&triangles);

        let mut cells = Vec::new();
        for &site in points {
            let Some(adjacent) = vertex_triangle_map.get(&vertex_key(site)) else {
                continue;
            };
            if adjacent.len() <= 2 {
                continue;
            }

            let vertices = order_cell_vertices(adjacent.iter().map(|&i| centers[i]).collect(), site);
            let polygon = Polygon::new(vertices);
            if polygon.is_degenerate() {
                continue;
            }
            let support = adjacent
                .iter()
                .map(|&i| circumcircle_bounds(&triangles[i]))
                .reduce(|a, b| a.union(&b))
                .unwrap_or_else(|| polygon.bounds());
            cells.push((
                site,
                CellPolygon {
                    center: polygon.centroid(),
                    polygon,
                    support,
                },
            ));
        }
        Ok(cells)
    }
}

impl CellPolygonGenerator for VoronoiPolygonGenerator {
    fn generate(&self, points: &[DVec2]) -> Result<Vec<CellPolygon>> {
        Ok(self
            .generate_with_sites(points)?
            .into_iter()
            .map(|(_, cell)| cell)
            .collect())
    }
}

/// Bounds of the circle through the three vertices
fn circumcircle_bounds(triangle: &Triangle) -> Rect {
    let center = triangle.circumcenter();
    let radius = DVec2::splat(center.distance(triangle.a));
    Rect::new(center - radius, center + radius)
}

#[inline]
fn vertex_key(vertex: DVec2) -> (u64, u64) {
    (vertex.x.to_bits(), vertex.y.to_bits())
}

/// Build map from vertex to all triangles that include it
fn build_vertex_triangle_map(triangles: &[Triangle]) -> VertexTriangleMap {
    let mut map: VertexTriangleMap = HashMap::new();

    for (tri_idx, triangle) in triangles.iter().enumerate() {
        for vertex in [triangle.a, triangle.b, triangle.c] {
            map.entry(vertex_key(vertex)).or_default().push(tri_idx);
        }
    }

    map
}

/// Order cell vertices counter-clockwise around the site
///
/// Consecutive vertices that coincide (cocircular triangles share their
/// circumcenter) are collapsed into one.
fn order_cell_vertices(centers: Vec<DVec2>, site: DVec2) -> Vec<DVec2> {
    let mut with_angles: Vec<(DVec2, f64)> = centers
        .into_iter()
        .map(|c| {
            let to_center = c - site;
            (c, to_center.y.atan2(to_center.x))
        })
        .collect();

    with_angles.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut vertices: Vec<DVec2> = with_angles.into_iter().map(|(v, _)| v).collect();
    vertices.dedup();
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    /// Jittered 12x12 grid over [0, 12)², deterministic
    fn jittered_grid() -> Vec<DVec2> {
        let mut points = Vec::new();
        for x in 0..12 {
            for y in 0..12 {
                let jx = ((x * 37 + y * 11) % 17) as f64 / 17.0 * 0.6 + 0.2;
                let jy = ((x * 5 + y * 29) % 13) as f64 / 13.0 * 0.6 + 0.2;
                points.push(DVec2::new(x as f64 + jx, y as f64 + jy));
            }
        }
        points
    }

    #[test]
    fn test_circumcenter_cells_are_convex_and_contain_site() {
        let generator = VoronoiPolygonGenerator::new(TriangleCenter::Circumcenter);
        let cells = generator.generate_with_sites(&jittered_grid()).unwrap();
        let interior = Rect::new(DVec2::splat(2.0), DVec2::splat(10.0));

        let mut checked = 0;
        for (site, cell) in &cells {
            if !interior.contains(*site) {
                continue;
            }
            assert!(cell.polygon.is_convex(), "cell around {} is not convex", site);
            assert!(cell.polygon.contains(*site), "cell does not contain {}", site);
            checked += 1;
        }
        assert_eq!(checked, 64);
    }

    #[test]
    fn test_interior_tiling() {
        let generator = VoronoiPolygonGenerator::new(TriangleCenter::Circumcenter);
        let cells = generator.generate(&jittered_grid()).unwrap();
        let bound = Rect::new(DVec2::splat(4.0), DVec2::splat(8.0));

        let covered: f64 = cells.iter().map(|c| c.polygon.clip_to_rect(&bound).area()).sum();
        assert!((covered - bound.area()).abs() < 1e-6, "covered {} of {}", covered, bound.area());
    }

    #[test]
    fn test_cocircular_grid_has_no_flat_cells() {
        // Each square of a regular grid splits into two triangles with the
        // same circumcenter; sites on the border see only two distinct ones
        let points: Vec<DVec2> = (0..8)
            .flat_map(|x| (0..8).map(move |y| DVec2::new(x as f64, y as f64)))
            .collect();
        let cells = VoronoiPolygonGenerator::default().generate_with_sites(&points).unwrap();

        let mut interior = 0;
        for (site, cell) in &cells {
            assert!(!cell.polygon.is_degenerate(), "cell around {} is flat", site);
            assert!(cell.support.contains_rect(&cell.polygon.bounds()));
            if site.min_element() > 0.0 && site.max_element() < 7.0 {
                assert!((cell.polygon.area() - 1.0).abs() < 1e-9);
                interior += 1;
            }
        }
        assert_eq!(interior, 36);
    }

    #[test]
    fn test_support_covers_triangles() {
        let points = jittered_grid();
        for cell in DelaunayPolygonGenerator.generate(&points).unwrap() {
            for &v in cell.polygon.vertices() {
                assert!(cell.support.inflate(DVec2::splat(1e-9)).contains(v));
            }
        }
    }

    #[test]
    fn test_boundary_vertices_skipped() {
        // Four points: every vertex touches at most two triangles
        let points = [
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(1.0, 1.2),
        ];
        let cells = VoronoiPolygonGenerator::default().generate(&points).unwrap();
        assert!(cells.is_empty());
    }

    #[test]
    fn test_center_is_polygon_centroid() {
        let generator = VoronoiPolygonGenerator::new(TriangleCenter::Centroid);
        for cell in generator.generate(&jittered_grid()).unwrap() {
            assert_eq!(cell.center, cell.polygon.centroid());
        }
    }

    #[test]
    fn test_delaunay_generator() {
        let points = jittered_grid();
        let cells = DelaunayPolygonGenerator.generate(&points).unwrap();
        let triangles = triangulate(&points).unwrap();
        assert_eq!(cells.len(), triangles.len());
        for cell in &cells {
            assert_eq!(cell.polygon.len(), 3);
            assert!(cell.polygon.contains(cell.center));
        }
    }

    #[test]
    fn test_lerp_center() {
        let t = Triangle::new(DVec2::new(0.0, 0.0), DVec2::new(4.0, 0.0), DVec2::new(0.0, 3.0));
        let circumcenter = TriangleCenter::Circumcenter.center(&t);
        let centroid = TriangleCenter::Centroid.center(&t);

        let start = TriangleCenter::lerp(TriangleCenter::Circumcenter, TriangleCenter::Centroid, 0.0);
        let end = TriangleCenter::lerp(TriangleCenter::Circumcenter, TriangleCenter::Centroid, 1.0);
        let half = TriangleCenter::lerp(TriangleCenter::Circumcenter, TriangleCenter::Centroid, 0.5);

        assert!((start.center(&t) - circumcenter).length() < 1e-12);
        assert!((end.center(&t) - centroid).length() < 1e-12);
        assert!((half.center(&t) - (circumcenter + centroid) * 0.5).length() < 1e-12);
    }

    #[test]
    fn test_too_few_points_propagates() {
        let generator = VoronoiPolygonGenerator::default();
        assert!(generator.generate(&[DVec2::ZERO, DVec2::ONE]).is_err());
    }
}
