//! Cells, edges and corners
//!
//! Entities reference each other through typed ids that are resolved through
//! the [`MapGraph`](super::MapGraph) arena. Adjacency is stored in ordered
//! sets so iteration order never depends on hashing.

use std::collections::BTreeSet;
use std::fmt;

use glam::DVec2;

use crate::data::{DataHolder, DataMap};
use crate::generation::SectionPos;
use crate::geometry::Polygon;

use super::chunk::ChunkPos;

/// Resolution of identity keys, in steps per world unit
pub const KEY_RESOLUTION: f64 = 1024.0;

/// Quantized point used as identity of cells and corners
pub type PointKey = (i64, i64);

/// Unordered pair of corner keys used as identity of edges
pub type EdgeKey = (PointKey, PointKey);

/// Quantize a position into its identity key
#[inline]
pub fn point_key(point: DVec2) -> PointKey {
    (
        (point.x * KEY_RESOLUTION).round() as i64,
        (point.y * KEY_RESOLUTION).round() as i64,
    )
}

/// Identity key of the edge between two positions, independent of their order
#[inline]
pub fn edge_key(a: DVec2, b: DVec2) -> EdgeKey {
    let (ka, kb) = (point_key(a), point_key(b));
    if ka <= kb {
        (ka, kb)
    } else {
        (kb, ka)
    }
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

entity_id!(
    /// Id of a [`Cell`], unique for the lifetime of a map
    CellId
);
entity_id!(
    /// Id of an [`Edge`], unique for the lifetime of a map
    EdgeId
);
entity_id!(
    /// Id of a [`Corner`], unique for the lifetime of a map
    CornerId
);

/// A polygonal region of the map
///
/// Each cell is generated by exactly one section and lives for as long as at
/// least one view references that section.
#[derive(Debug)]
pub struct Cell {
    /// Stable identifier, never reused while the map exists
    pub(crate) id: CellId,

    /// Representative point of the cell; also its identity
    pub(crate) center: DVec2,

    /// Boundary of the cell, not necessarily convex
    pub(crate) polygon: Polygon,

    /// Section that generated this cell
    pub(crate) section: SectionPos,

    /// Cells sharing at least one corner with this cell
    pub(crate) neighbors: BTreeSet<CellId>,

    pub(crate) edges: BTreeSet<EdgeId>,

    pub(crate) corners: BTreeSet<CornerId>,

    /// Chunks whose area the polygon overlaps
    pub(crate) chunks: BTreeSet<ChunkPos>,

    /// Number of live views holding this cell
    pub(crate) refs: u32,

    pub(crate) data: DataMap,
}

impl Cell {
    pub(crate) fn new(id: CellId, center: DVec2, polygon: Polygon, section: SectionPos) -> Self {
        Self {
            id,
            center,
            polygon,
            section,
            neighbors: BTreeSet::new(),
            edges: BTreeSet::new(),
            corners: BTreeSet::new(),
            chunks: BTreeSet::new(),
            refs: 0,
            data: DataMap::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> CellId {
        self.id
    }

    #[inline]
    pub fn center(&self) -> DVec2 {
        self.center
    }

    #[inline]
    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    #[inline]
    pub fn section(&self) -> SectionPos {
        self.section
    }

    #[inline]
    pub fn neighbors(&self) -> &BTreeSet<CellId> {
        &self.neighbors
    }

    #[inline]
    pub fn edges(&self) -> &BTreeSet<EdgeId> {
        &self.edges
    }

    #[inline]
    pub fn corners(&self) -> &BTreeSet<CornerId> {
        &self.corners
    }

    #[inline]
    pub fn chunks(&self) -> &BTreeSet<ChunkPos> {
        &self.chunks
    }

    /// Get the number of neighboring cells
    #[inline]
    pub fn neighbor_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Check if this cell is a neighbor of another cell
    #[inline]
    pub fn is_neighbor_of(&self, other: CellId) -> bool {
        self.neighbors.contains(&other)
    }

    /// Number of live views holding this cell
    #[inline]
    pub fn ref_count(&self) -> u32 {
        self.refs
    }

    /// Whether the polygon contains `point`
    #[inline]
    pub fn contains_point(&self, point: DVec2) -> bool {
        self.polygon.contains(point)
    }
}

impl DataHolder for Cell {
    fn data(&self) -> &DataMap {
        &self.data
    }

    fn data_mut(&mut self) -> &mut DataMap {
        &mut self.data
    }
}

/// A boundary segment shared by one or two cells
#[derive(Debug)]
pub struct Edge {
    pub(crate) id: EdgeId,
    pub(crate) line: (DVec2, DVec2),
    pub(crate) corners: [CornerId; 2],
    pub(crate) cells: BTreeSet<CellId>,
    pub(crate) data: DataMap,
}

impl Edge {
    pub(crate) fn new(id: EdgeId, line: (DVec2, DVec2), corners: [CornerId; 2]) -> Self {
        Self {
            id,
            line,
            corners,
            cells: BTreeSet::new(),
            data: DataMap::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> EdgeId {
        self.id
    }

    /// End points, in the order of the polygon that created the edge
    #[inline]
    pub fn line(&self) -> (DVec2, DVec2) {
        self.line
    }

    #[inline]
    pub fn corners(&self) -> [CornerId; 2] {
        self.corners
    }

    /// The one or two cells on either side
    #[inline]
    pub fn cells(&self) -> &BTreeSet<CellId> {
        &self.cells
    }

    #[inline]
    pub fn midpoint(&self) -> DVec2 {
        (self.line.0 + self.line.1) * 0.5
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.line.0.distance(self.line.1)
    }
}

impl DataHolder for Edge {
    fn data(&self) -> &DataMap {
        &self.data
    }

    fn data_mut(&mut self) -> &mut DataMap {
        &mut self.data
    }
}

/// A polygon vertex, shared by the cells and edges meeting there
#[derive(Debug)]
pub struct Corner {
    pub(crate) id: CornerId,
    pub(crate) point: DVec2,
    pub(crate) cells: BTreeSet<CellId>,
    /// Corners connected to this one by an edge
    pub(crate) neighbors: BTreeSet<CornerId>,
    pub(crate) edges: BTreeSet<EdgeId>,
    pub(crate) data: DataMap,
}

impl Corner {
    pub(crate) fn new(id: CornerId, point: DVec2) -> Self {
        Self {
            id,
            point,
            cells: BTreeSet::new(),
            neighbors: BTreeSet::new(),
            edges: BTreeSet::new(),
            data: DataMap::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> CornerId {
        self.id
    }

    #[inline]
    pub fn point(&self) -> DVec2 {
        self.point
    }

    #[inline]
    pub fn cells(&self) -> &BTreeSet<CellId> {
        &self.cells
    }

    #[inline]
    pub fn neighbors(&self) -> &BTreeSet<CornerId> {
        &self.neighbors
    }

    #[inline]
    pub fn edges(&self) -> &BTreeSet<EdgeId> {
        &self.edges
    }
}

impl DataHolder for Corner {
    fn data(&self) -> &DataMap {
        &self.data
    }

    fn data_mut(&mut self) -> &mut DataMap {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataKey;

    #[test]
    fn test_point_key_quantization() {
        assert_eq!(point_key(DVec2::new(1.0, -2.0)), (1024, -2048));
        // Closer than half a step collapses onto the same key
        assert_eq!(
            point_key(DVec2::new(3.0, 3.0)),
            point_key(DVec2::new(3.0 + 0.4 / KEY_RESOLUTION, 3.0))
        );
        assert_ne!(point_key(DVec2::new(3.0, 3.0)), point_key(DVec2::new(3.0 + 1.0 / KEY_RESOLUTION, 3.0)));
    }

    #[test]
    fn test_edge_key_unordered() {
        let a = DVec2::new(10.5, 3.25);
        let b = DVec2::new(-4.0, 8.0);
        assert_eq!(edge_key(a, b), edge_key(b, a));
        assert_ne!(edge_key(a, b), edge_key(a, DVec2::ZERO));
    }

    #[test]
    fn test_id_display_and_order() {
        assert_eq!(CellId(4).to_string(), "CellId#4");
        assert!(CornerId(1) < CornerId(2));
    }

    #[test]
    fn test_cell_data_holder() {
        const HEIGHT: DataKey<f64> = DataKey::new("height");
        let polygon = Polygon::new(vec![DVec2::ZERO, DVec2::X, DVec2::Y]);
        let mut cell = Cell::new(CellId(0), polygon.centroid(), polygon, SectionPos::new(0, 0));

        assert!(cell.contains_point(DVec2::new(0.2, 0.2)));
        assert_eq!(cell.set(HEIGHT, -3.5), None);
        assert_eq!(cell.get(HEIGHT), Some(&-3.5));
        assert!(cell.require(HEIGHT).is_ok());
        assert_eq!(cell.remove(HEIGHT), Some(-3.5));
        assert!(!cell.contains(HEIGHT));
    }

    #[test]
    fn test_edge_geometry() {
        let edge = Edge::new(EdgeId(0), (DVec2::ZERO, DVec2::new(3.0, 4.0)), [CornerId(1), CornerId(2)]);
        assert_eq!(edge.midpoint(), DVec2::new(1.5, 2.0));
        assert!((edge.length() - 5.0).abs() < 1e-12);
    }
}
