//! Per-tile distances to nearby cell edges
//!
//! Lets consumers blend between cells (beaches, riverbanks, borders) without
//! testing geometry per tile.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use glam::{DVec2, IVec2};

use crate::error::{CellMapError, Result};
use crate::geometry::{distance_to_segment, Rect};
use crate::map::{CellMapView, ChunkPos, EdgeId, MapGraph};

use super::{keys, CellMapProcessor};

/// Marks a tile that is not near the edge
const NO_DISTANCE: u8 = u8::MAX;

/// Distances from the tiles of one chunk to the edges near them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeDistanceChunkData {
    size: IVec2,
    distances: BTreeMap<EdgeId, Vec<u8>>,
}

impl EdgeDistanceChunkData {
    pub fn new(size: IVec2) -> Self {
        Self {
            size,
            distances: BTreeMap::new(),
        }
    }

    /// Rounded distance from the center of a local tile to `edge`
    ///
    /// Returns `None` if the tile is farther away than the processor looked,
    /// or lies outside the chunk.
    pub fn distance_to_edge(&self, edge: EdgeId, x: i32, y: i32) -> Option<u8> {
        let index = self.index(x, y)?;
        let d = *self.distances.get(&edge)?.get(index)?;
        (d != NO_DISTANCE).then_some(d)
    }

    /// Closest recorded edge of a local tile, lowest id on ties
    pub fn nearest_edge(&self, x: i32, y: i32) -> Option<(EdgeId, u8)> {
        let index = self.index(x, y)?;
        self.distances
            .iter()
            .filter_map(|(&edge, tiles)| tiles.get(index).filter(|&&d| d != NO_DISTANCE).map(|&d| (edge, d)))
            .min_by_key(|&(_, d)| d)
    }

    /// Edges with at least one recorded tile
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.distances.keys().copied()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.size.x || y >= self.size.y {
            return None;
        }
        Some((y * self.size.x + x) as usize)
    }

    /// Keep the smaller of the stored and the new distance
    fn record(&mut self, edge: EdgeId, x: i32, y: i32, distance: u8) {
        let Some(index) = self.index(x, y) else {
            return;
        };
        let len = (self.size.x * self.size.y) as usize;
        let tiles = self.distances.entry(edge).or_insert_with(|| vec![NO_DISTANCE; len]);
        if distance < tiles[index] {
            tiles[index] = distance;
        }
    }
}

/// Records, for every tile of the view, the distance to each edge within
/// `side_distance` tiles
///
/// The data is stored on the chunks under
/// [`keys::EDGE_DISTANCE`](super::keys::EDGE_DISTANCE) and dropped with them.
#[derive(Debug, Clone)]
pub struct EdgeDistanceProcessor {
    side_distance: u8,
}

impl EdgeDistanceProcessor {
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `side_distance` is 0 or 255.
    pub fn new(side_distance: u8) -> Result<Self> {
        if side_distance == 0 || side_distance == NO_DISTANCE {
            return Err(CellMapError::InvalidConfig(format!(
                "edge side distance must lie in 1..=254 (got {})",
                side_distance
            )));
        }
        Ok(Self { side_distance })
    }

    #[inline]
    pub fn side_distance(&self) -> u8 {
        self.side_distance
    }
}

impl Default for EdgeDistanceProcessor {
    fn default() -> Self {
        Self { side_distance: 10 }
    }
}

impl CellMapProcessor for EdgeDistanceProcessor {
    fn name(&self) -> &str {
        "edge_distance"
    }

    fn process(&self, view: &CellMapView, graph: &mut MapGraph) {
        let chunk_size = graph.chunk_size();
        let side = self.side_distance as f64;
        let area = view.rect();

        // Edges near the view, including those of cells just outside it
        let search = area.inflate(DVec2::splat(side));
        let mut edges = BTreeSet::new();
        for pos in ChunkPos::covering(&search, chunk_size) {
            for &cell in graph.chunk_cells(pos) {
                if let Some(cell) = graph.cell(cell) {
                    edges.extend(cell.edges().iter().copied());
                }
            }
        }

        let mut chunks: HashMap<ChunkPos, EdgeDistanceChunkData> = HashMap::new();
        for id in edges {
            let Some(edge) = graph.edge(id) else {
                continue;
            };
            let (a, b) = edge.line();
            let reach = Rect::new(a.min(b), a.max(b)).inflate(DVec2::splat(side)).intersection(&area);
            if reach.is_empty() {
                continue;
            }

            let min = reach.min.floor().as_ivec2();
            let max = reach.max.ceil().as_ivec2();
            for ty in min.y..max.y {
                for tx in min.x..max.x {
                    let center = DVec2::new(tx as f64 + 0.5, ty as f64 + 0.5);
                    if !area.contains(center) {
                        continue;
                    }
                    let distance = distance_to_segment(a, b, center);
                    if distance > side {
                        continue;
                    }

                    let pos = ChunkPos::containing(center, chunk_size);
                    if !graph.is_chunk_loaded(pos) {
                        continue;
                    }
                    let data = chunks.entry(pos).or_insert_with(|| {
                        graph
                            .chunk_data(pos)
                            .and_then(|d| d.get(keys::EDGE_DISTANCE))
                            .cloned()
                            .unwrap_or_else(|| EdgeDistanceChunkData::new(chunk_size))
                    });
                    let local = IVec2::new(tx - pos.x * chunk_size.x, ty - pos.y * chunk_size.y);
                    data.record(id, local.x, local.y, distance.round() as u8);
                }
            }
        }

        for (pos, data) in chunks {
            if let Some(map) = graph.chunk_data_mut(pos) {
                map.set(keys::EDGE_DISTANCE, data);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{CellPolygon, SectionPos};
    use crate::geometry::Polygon;

    /// Two 4x4 squares side by side, on 4x4 chunks
    fn pair() -> (MapGraph, CellMapView) {
        let mut graph = MapGraph::new(0, IVec2::new(4, 4));
        let polygons = [0.0, 4.0]
            .into_iter()
            .map(|x| {
                let polygon = Polygon::new(vec![
                    DVec2::new(x, 0.0),
                    DVec2::new(x + 4.0, 0.0),
                    DVec2::new(x + 4.0, 4.0),
                    DVec2::new(x, 4.0),
                ]);
                CellPolygon::from_polygon(polygon)
            })
            .collect();
        let ids = graph.assemble(SectionPos::new(0, 0), polygons);
        let view = CellMapView::collect(&graph, Rect::new(DVec2::ZERO, DVec2::new(8.0, 4.0)), Vec::new(), ids);
        (graph, view)
    }

    fn chunk_data(graph: &MapGraph, x: i32, y: i32) -> &EdgeDistanceChunkData {
        graph
            .chunk_data(ChunkPos::new(x, y))
            .and_then(|d| d.get(keys::EDGE_DISTANCE))
            .unwrap()
    }

    #[test]
    fn test_distances_to_shared_edge() {
        let (mut graph, view) = pair();
        EdgeDistanceProcessor::new(2).unwrap().process(&view, &mut graph);
        let shared = graph
            .edge_between(DVec2::new(4.0, 0.0), DVec2::new(4.0, 4.0))
            .unwrap();

        let left = chunk_data(&graph, 0, 0);
        // Tile centers at x = 3.5, 2.5 and 1.5
        assert_eq!(left.distance_to_edge(shared, 3, 1), Some(1));
        assert_eq!(left.distance_to_edge(shared, 2, 2), Some(2));
        assert_eq!(left.distance_to_edge(shared, 1, 1), None);
        assert_eq!(left.distance_to_edge(shared, 7, 1), None);

        let right = chunk_data(&graph, 1, 0);
        assert_eq!(right.distance_to_edge(shared, 0, 1), Some(1));
        assert_eq!(right.distance_to_edge(shared, 1, 3), Some(2));
    }

    #[test]
    fn test_nearest_edge() {
        let (mut graph, view) = pair();
        EdgeDistanceProcessor::default().process(&view, &mut graph);
        let left_side = graph
            .edge_between(DVec2::new(0.0, 0.0), DVec2::new(0.0, 4.0))
            .unwrap();

        let data = chunk_data(&graph, 0, 0);
        // Tile (0, 2) is half a unit from the left side, farther from the others
        assert_eq!(data.nearest_edge(0, 2), Some((left_side, 1)));
        assert!(data.edges().count() >= 4);
    }

    #[test]
    fn test_reruns_keep_minimum() {
        let (mut graph, view) = pair();
        let processor = EdgeDistanceProcessor::new(3).unwrap();
        processor.process(&view, &mut graph);
        let first = chunk_data(&graph, 1, 0).clone();
        processor.process(&view, &mut graph);
        assert_eq!(chunk_data(&graph, 1, 0), &first);
    }

    #[test]
    fn test_invalid_side_distance() {
        assert!(EdgeDistanceProcessor::new(0).is_err());
        assert!(EdgeDistanceProcessor::new(255).is_err());
        assert_eq!(EdgeDistanceProcessor::default().side_distance(), 10);
    }
}
