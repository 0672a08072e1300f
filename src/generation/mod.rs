//! Geometry generation pipeline
//!
//! Seed points per section, Delaunay triangulation of those points, and
//! conversion of the triangulation into cell polygons.

mod delaunay;
mod points;
mod section;
mod voronoi;

pub use delaunay::triangulate;
pub use points::{
    BlueNoisePointsGenerator, GridPointsGenerator, PointsGenerator, WhiteNoisePointsGenerator,
    ZoomPointsGenerator,
};
pub use section::{section_seed, SectionPolygonGenerator, SectionPos, MAX_SECTION_MARGIN, SECTION_MARGIN};
pub use voronoi::{
    CellPolygon, CellPolygonGenerator, DelaunayPolygonGenerator, TriangleCenter, VoronoiPolygonGenerator,
};
