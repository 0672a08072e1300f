//! Entity arena and graph assembly
//!
//! The [`MapGraph`] owns every loaded cell, edge and corner. Polygons are
//! merged into the graph by identity key, so geometry shared between cells
//! (and between sections) maps onto the same edge and corner entities.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use glam::{DVec2, IVec2};
use tracing::warn;

use crate::data::DataMap;
use crate::generation::{CellPolygon, SectionPos};
use crate::geometry::Rect;

use super::chunk::ChunkPos;
use super::entity::{edge_key, point_key, Cell, CellId, Corner, CornerId, Edge, EdgeId, EdgeKey, PointKey};

/// Arena of all loaded entities plus the chunk index
///
/// Processors receive mutable access to the graph to write attributes; the
/// structure itself (entities and links) only changes through section
/// assembly and eviction inside the crate.
#[derive(Debug)]
pub struct MapGraph {
    seed: u64,
    chunk_size: IVec2,
    next_id: u64,
    cells: BTreeMap<CellId, Cell>,
    edges: BTreeMap<EdgeId, Edge>,
    corners: BTreeMap<CornerId, Corner>,
    cell_keys: HashMap<PointKey, CellId>,
    edge_keys: HashMap<EdgeKey, EdgeId>,
    corner_keys: HashMap<PointKey, CornerId>,
    /// Cells overlapping each chunk, in registration order
    chunks: HashMap<ChunkPos, Vec<CellId>>,
    chunk_data: HashMap<ChunkPos, DataMap>,
}

impl MapGraph {
    pub(crate) fn new(seed: u64, chunk_size: IVec2) -> Self {
        Self {
            seed,
            chunk_size,
            next_id: 0,
            cells: BTreeMap::new(),
            edges: BTreeMap::new(),
            corners: BTreeMap::new(),
            cell_keys: HashMap::new(),
            edge_keys: HashMap::new(),
            corner_keys: HashMap::new(),
            chunks: HashMap::new(),
            chunk_data: HashMap::new(),
        }
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn chunk_size(&self) -> IVec2 {
        self.chunk_size
    }

    #[inline]
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(&id)
    }

    #[inline]
    pub fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.get_mut(&id)
    }

    #[inline]
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    #[inline]
    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(&id)
    }

    #[inline]
    pub fn corner(&self, id: CornerId) -> Option<&Corner> {
        self.corners.get(&id)
    }

    #[inline]
    pub fn corner_mut(&mut self, id: CornerId) -> Option<&mut Corner> {
        self.corners.get_mut(&id)
    }

    /// All loaded cells, ordered by id
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn corners(&self) -> impl Iterator<Item = &Corner> {
        self.corners.values()
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn corner_count(&self) -> usize {
        self.corners.len()
    }

    /// Cell whose center quantizes to the same key as `center`
    pub fn cell_by_center(&self, center: DVec2) -> Option<CellId> {
        self.cell_keys.get(&point_key(center)).copied()
    }

    /// Corner at `point`, matched by identity key
    pub fn corner_at(&self, point: DVec2) -> Option<CornerId> {
        self.corner_keys.get(&point_key(point)).copied()
    }

    /// Edge between two points, in either order
    pub fn edge_between(&self, a: DVec2, b: DVec2) -> Option<EdgeId> {
        self.edge_keys.get(&edge_key(a, b)).copied()
    }

    /// Chunk containing a world position
    #[inline]
    pub fn chunk_at(&self, position: DVec2) -> ChunkPos {
        ChunkPos::containing(position, self.chunk_size)
    }

    #[inline]
    pub fn chunk_rect(&self, pos: ChunkPos) -> Rect {
        pos.rect(self.chunk_size)
    }

    /// Cells registered in a chunk, in registration order
    pub fn chunk_cells(&self, pos: ChunkPos) -> &[CellId] {
        self.chunks.get(&pos).map(Vec::as_slice).unwrap_or(&[])
    }

    #[inline]
    pub fn is_chunk_loaded(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos)
    }

    pub fn chunk_data(&self, pos: ChunkPos) -> Option<&DataMap> {
        self.chunk_data.get(&pos)
    }

    /// Attribute map of a loaded chunk, created on first access
    ///
    /// Returns `None` if no cell overlaps the chunk.
    pub fn chunk_data_mut(&mut self, pos: ChunkPos) -> Option<&mut DataMap> {
        if !self.chunks.contains_key(&pos) {
            return None;
        }
        Some(self.chunk_data.entry(pos).or_default())
    }

    /// First cell of the chunk whose polygon contains `point`
    pub fn find_containing_cell(&self, point: DVec2) -> Option<CellId> {
        self.chunk_cells(self.chunk_at(point))
            .iter()
            .copied()
            .find(|id| self.cells.get(id).is_some_and(|c| c.contains_point(point)))
    }

    /// Cell of the point's chunk with the nearest center
    pub fn nearest_chunk_cell(&self, point: DVec2) -> Option<CellId> {
        self.chunk_cells(self.chunk_at(point))
            .iter()
            .filter_map(|id| self.cells.get(id))
            .min_by(|a, b| {
                a.center
                    .distance_squared(point)
                    .total_cmp(&b.center.distance_squared(point))
            })
            .map(|c| c.id)
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Merge the polygons of one section into the graph
    ///
    /// Returns the ids of the created cells, in polygon order. A polygon whose
    /// center is already loaded is skipped, and so is a polygon with fewer
    /// than three distinct corners or no area, since its edges would overlap
    /// the edges of its neighbors.
    pub(crate) fn assemble(&mut self, section: SectionPos, polygons: Vec<CellPolygon>) -> Vec<CellId> {
        let mut created = Vec::with_capacity(polygons.len());

        for CellPolygon { center, polygon, .. } in polygons {
            let key = point_key(center);
            if let Some(existing) = self.cell_keys.get(&key) {
                warn!(cell = %existing, x = center.x, y = center.y, "cell center already loaded, skipping polygon");
                continue;
            }
            let corner_keys: BTreeSet<PointKey> = polygon.vertices().iter().map(|&v| point_key(v)).collect();
            if corner_keys.len() < 3 || polygon.is_degenerate() {
                warn!(x = center.x, y = center.y, corners = corner_keys.len(), "flat cell polygon, skipping");
                continue;
            }

            let id = CellId(self.allocate());
            let corner_ids: Vec<CornerId> = polygon.vertices().iter().map(|&v| self.corner_or_insert(v)).collect();
            let vertices = polygon.vertices().to_vec();
            let bounds = polygon.bounds();

            self.cells.insert(id, Cell::new(id, center, polygon, section));
            self.cell_keys.insert(key, id);

            for &corner in &corner_ids {
                self.link_cell_corner(id, corner);
            }

            let n = vertices.len();
            for i in 0..n {
                let j = (i + 1) % n;
                if corner_ids[i] == corner_ids[j] {
                    continue;
                }
                let edge = self.edge_or_insert(vertices[i], vertices[j], corner_ids[i], corner_ids[j]);
                self.edges
                    .get_mut(&edge)
                    .unwrap_or_else(|| panic!("edge {} missing right after insertion", edge))
                    .cells
                    .insert(id);
                self.cell_entry(id).edges.insert(edge);
            }

            self.register_chunks(id, &bounds);
            created.push(id);
        }

        created
    }

    fn cell_entry(&mut self, id: CellId) -> &mut Cell {
        self.cells
            .get_mut(&id)
            .unwrap_or_else(|| panic!("{} is linked but not loaded", id))
    }

    fn corner_entry(&mut self, id: CornerId) -> &mut Corner {
        self.corners
            .get_mut(&id)
            .unwrap_or_else(|| panic!("{} is linked but not loaded", id))
    }

    fn corner_or_insert(&mut self, point: DVec2) -> CornerId {
        let key = point_key(point);
        if let Some(&id) = self.corner_keys.get(&key) {
            return id;
        }
        let id = CornerId(self.allocate());
        self.corners.insert(id, Corner::new(id, point));
        self.corner_keys.insert(key, id);
        id
    }

    fn edge_or_insert(&mut self, a: DVec2, b: DVec2, corner_a: CornerId, corner_b: CornerId) -> EdgeId {
        let key = edge_key(a, b);
        if let Some(&id) = self.edge_keys.get(&key) {
            return id;
        }
        let id = EdgeId(self.allocate());
        self.edges.insert(id, Edge::new(id, (a, b), [corner_a, corner_b]));
        self.edge_keys.insert(key, id);

        let first = self.corner_entry(corner_a);
        first.edges.insert(id);
        first.neighbors.insert(corner_b);
        let second = self.corner_entry(corner_b);
        second.edges.insert(id);
        second.neighbors.insert(corner_a);
        id
    }

    /// Link a cell with a corner, and with every other cell of that corner
    fn link_cell_corner(&mut self, cell: CellId, corner: CornerId) {
        let entry = self.corner_entry(corner);
        let others: Vec<CellId> = entry.cells.iter().copied().filter(|&c| c != cell).collect();
        entry.cells.insert(cell);

        let this = self.cell_entry(cell);
        this.corners.insert(corner);
        this.neighbors.extend(others.iter().copied());
        for other in others {
            self.cell_entry(other).neighbors.insert(cell);
        }
    }

    fn register_chunks(&mut self, id: CellId, bounds: &Rect) {
        let chunk_size = self.chunk_size;
        let overlapping: Vec<ChunkPos> = {
            let cell = &self.cells[&id];
            ChunkPos::covering(bounds, chunk_size)
                .filter(|pos| cell.polygon.intersects_rect(&pos.rect(chunk_size)))
                .collect()
        };

        for &pos in &overlapping {
            self.chunks.entry(pos).or_default().push(id);
        }
        self.cell_entry(id).chunks.extend(overlapping);
    }

    pub(crate) fn pin(&mut self, id: CellId) {
        self.cell_entry(id).refs += 1;
    }

    /// Drop one reference; evicts the cell when none remain
    ///
    /// Returns whether the cell was evicted.
    pub(crate) fn unpin(&mut self, id: CellId) -> bool {
        let cell = self.cell_entry(id);
        assert!(cell.refs > 0, "{} released more often than pinned", id);
        cell.refs -= 1;
        if cell.refs == 0 {
            self.evict(id);
            true
        } else {
            false
        }
    }

    /// Remove a cell, and every edge and corner no other cell references
    pub(crate) fn evict(&mut self, id: CellId) {
        let cell = self
            .cells
            .remove(&id)
            .unwrap_or_else(|| panic!("{} evicted twice", id));
        self.cell_keys.remove(&point_key(cell.center));

        for neighbor in &cell.neighbors {
            if let Some(other) = self.cells.get_mut(neighbor) {
                other.neighbors.remove(&id);
            }
        }

        for pos in &cell.chunks {
            if let Some(list) = self.chunks.get_mut(pos) {
                list.retain(|&c| c != id);
                if list.is_empty() {
                    self.chunks.remove(pos);
                    self.chunk_data.remove(pos);
                }
            }
        }

        for &edge_id in &cell.edges {
            let orphaned = match self.edges.get_mut(&edge_id) {
                Some(edge) => {
                    edge.cells.remove(&id);
                    edge.cells.is_empty()
                }
                None => false,
            };
            if orphaned {
                self.remove_edge(edge_id);
            }
        }

        for &corner_id in &cell.corners {
            let orphaned = match self.corners.get_mut(&corner_id) {
                Some(corner) => {
                    corner.cells.remove(&id);
                    corner.cells.is_empty()
                }
                None => false,
            };
            if orphaned {
                if let Some(corner) = self.corners.remove(&corner_id) {
                    self.corner_keys.remove(&point_key(corner.point));
                    debug_assert!(corner.edges.is_empty(), "{} orphaned with live edges", corner_id);
                }
            }
        }
    }

    fn remove_edge(&mut self, id: EdgeId) {
        let Some(edge) = self.edges.remove(&id) else {
            return;
        };
        self.edge_keys.remove(&edge_key(edge.line.0, edge.line.1));

        let [a, b] = edge.corners;
        if let Some(corner) = self.corners.get_mut(&a) {
            corner.edges.remove(&id);
            corner.neighbors.remove(&b);
        }
        if let Some(corner) = self.corners.get_mut(&b) {
            corner.edges.remove(&id);
            corner.neighbors.remove(&a);
        }
    }
}
