//! Rivers
//!
//! Rivers start at coastal corners and climb inland along corner links. Each
//! coastal corner rolls its own seeded die, so whether a river starts there
//! (and where it goes) only depends on the corner position and the map seed.

use std::cmp::Reverse;
use std::ops::RangeInclusive;

use glam::DVec2;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::data::DataHolder;
use crate::error::{CellMapError, Result};
use crate::map::{point_key, CellMapView, CornerId, EdgeId, MapGraph, PointKey};

use super::{keys, CellMapProcessor};

/// Corners and edges of one river, from the coast inland
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiverPath {
    pub corners: Vec<CornerId>,
    pub edges: Vec<EdgeId>,
}

impl RiverPath {
    /// Number of edges
    #[inline]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Splitmix64 finalizer
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

fn position_hash(key: PointKey) -> u64 {
    mix64((key.0 as u64) ^ (key.1 as u64).rotate_left(32))
}

fn corner_distance(graph: &MapGraph, id: CornerId) -> i32 {
    graph
        .corner(id)
        .and_then(|c| c.get(keys::DISTANCE_TO_OCEAN))
        .copied()
        .unwrap_or(0)
}

fn shared_edge(graph: &MapGraph, a: CornerId, b: CornerId) -> Option<EdgeId> {
    let (a, b) = (graph.corner(a)?, graph.corner(b)?);
    a.edges().intersection(b.edges()).next().copied()
}

/// A corner on the walk, with the neighbors still to try
struct Step {
    corner: CornerId,
    candidates: Vec<CornerId>,
    next: usize,
    /// Whether any neighbor was stepped onto
    extended: bool,
}

/// Generates rivers from coastal corners inland
///
/// Needs `distance_to_ocean` on corners, so it must run after
/// [`DistanceToOceanProcessor`](super::DistanceToOceanProcessor).
///
/// A river never visits a corner twice, never steps onto the coast or into
/// the ocean, and never steps to a corner closer to the coast. Attempts
/// shorter than the minimum length are discarded entirely.
#[derive(Debug, Clone)]
pub struct RiverProcessor {
    chance: f64,
    length: RangeInclusive<usize>,
    area_offset: DVec2,
}

impl RiverProcessor {
    pub fn new() -> Self {
        Self {
            chance: 0.19,
            length: 3..=15,
            area_offset: DVec2::splat(0.3),
        }
    }

    /// Chance per coastal corner that a river starts there
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` unless `chance` lies in `[0, 1]`.
    pub fn with_chance(mut self, chance: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&chance) {
            return Err(CellMapError::InvalidConfig(format!(
                "river chance must lie in [0, 1] (got {})",
                chance
            )));
        }
        self.chance = chance;
        Ok(self)
    }

    /// River length in edges; the start is the minimum length kept
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an empty range or a zero minimum.
    pub fn with_length(mut self, length: RangeInclusive<usize>) -> Result<Self> {
        if length.is_empty() || *length.start() == 0 {
            return Err(CellMapError::InvalidConfig(format!(
                "river length range {:?} must be non-empty and start above zero",
                length
            )));
        }
        self.length = length;
        Ok(self)
    }

    pub fn with_area_offset(mut self, area_offset: DVec2) -> Self {
        self.area_offset = area_offset;
        self
    }

    #[inline]
    pub fn chance(&self) -> f64 {
        self.chance
    }

    #[inline]
    pub fn length(&self) -> &RangeInclusive<usize> {
        &self.length
    }

    /// Random source of the river starting at `corner`
    ///
    /// Seeded from the hashed position key of the corner rather than its id.
    /// Ids depend on the order sections were loaded in, the position does
    /// not, so the same coast corner rolls the same river on every load.
    pub fn corner_rng(&self, graph: &MapGraph, corner: CornerId) -> Option<ChaCha8Rng> {
        let point = graph.corner(corner)?.point();
        Some(ChaCha8Rng::seed_from_u64(position_hash(point_key(point)) ^ graph.seed()))
    }

    /// Walk one river from `start`, without recording it
    ///
    /// Depth-first search over corner links. At every corner the neighbors
    /// are shuffled, then tried highest distance to the ocean first. The
    /// search stops as soon as the path has `expected_length` edges;
    /// otherwise the dead end reaching farthest inland wins, the first one
    /// found on ties.
    ///
    /// # Returns
    ///
    /// The path, or `None` if no dead end reaches the minimum length.
    pub fn trace_river<R: Rng + ?Sized>(
        &self,
        graph: &MapGraph,
        start: CornerId,
        rng: &mut R,
        expected_length: usize,
    ) -> Option<RiverPath> {
        graph.corner(start)?;
        let min_length = *self.length.start();

        let mut path = vec![self.step(graph, start, rng)];
        let mut edges: Vec<EdgeId> = Vec::new();
        let mut best: Option<(i32, RiverPath)> = None;

        if expected_length == 0 {
            return Some(RiverPath {
                corners: vec![start],
                edges,
            });
        }

        while let Some(top) = path.last_mut() {
            if top.next < top.candidates.len() {
                let from = top.corner;
                let to = top.candidates[top.next];
                top.next += 1;

                if path.iter().any(|s| s.corner == to) {
                    continue;
                }
                let distance = corner_distance(graph, to);
                if distance <= 0 || corner_distance(graph, from) > distance {
                    continue;
                }
                let Some(edge) = shared_edge(graph, from, to) else {
                    continue;
                };

                if let Some(top) = path.last_mut() {
                    top.extended = true;
                }
                edges.push(edge);
                path.push(self.step(graph, to, rng));

                if edges.len() == expected_length {
                    return Some(RiverPath {
                        corners: path.iter().map(|s| s.corner).collect(),
                        edges,
                    });
                }
                continue;
            }

            if !top.extended && edges.len() >= min_length {
                let reach = corner_distance(graph, top.corner);
                if best.as_ref().map_or(true, |(r, _)| reach > *r) {
                    best = Some((
                        reach,
                        RiverPath {
                            corners: path.iter().map(|s| s.corner).collect(),
                            edges: edges.clone(),
                        },
                    ));
                }
            }
            path.pop();
            if !path.is_empty() {
                edges.pop();
            }
        }

        best.map(|(_, river)| river)
    }

    fn step<R: Rng + ?Sized>(&self, graph: &MapGraph, corner: CornerId, rng: &mut R) -> Step {
        let mut candidates: Vec<(PointKey, CornerId)> = graph
            .corner(corner)
            .map(|c| {
                c.neighbors()
                    .iter()
                    .filter_map(|&n| graph.corner(n).map(|nc| (point_key(nc.point()), n)))
                    .collect()
            })
            .unwrap_or_default();
        candidates.sort_by_key(|(key, _)| *key);

        let mut candidates: Vec<CornerId> = candidates.into_iter().map(|(_, id)| id).collect();
        candidates.shuffle(rng);
        candidates.sort_by_key(|&id| Reverse(corner_distance(graph, id)));

        Step {
            corner,
            candidates,
            next: 0,
            extended: false,
        }
    }

    fn record(graph: &mut MapGraph, river: &RiverPath) {
        for (i, &id) in river.corners.iter().enumerate() {
            if let Some(corner) = graph.corner_mut(id) {
                corner.set(keys::IS_RIVER, true);
                corner.set(keys::DISTANCE_TO_RIVER_START, i as i32);
            }
        }
        for (i, &id) in river.edges.iter().enumerate() {
            if let Some(edge) = graph.edge_mut(id) {
                edge.set(keys::IS_RIVER, true);
                edge.set(keys::DISTANCE_TO_RIVER_START, i as i32);
            }
        }
    }
}

impl Default for RiverProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl CellMapProcessor for RiverProcessor {
    fn name(&self) -> &str {
        "river"
    }

    fn area_offset(&self) -> DVec2 {
        self.area_offset
    }

    fn process(&self, view: &CellMapView, graph: &mut MapGraph) {
        let sources: Vec<CornerId> = view
            .corner_ids()
            .iter()
            .copied()
            .filter(|&id| graph.corner(id).and_then(|c| c.get(keys::DISTANCE_TO_OCEAN)) == Some(&0))
            .collect();

        let mut rivers = 0;
        for source in sources {
            let Some(mut rng) = self.corner_rng(graph, source) else {
                continue;
            };
            if rng.gen::<f64>() > self.chance {
                continue;
            }
            let expected = rng.gen_range(self.length.clone());
            if let Some(river) = self.trace_river(graph, source, &mut rng, expected) {
                Self::record(graph, &river);
                rivers += 1;
            }
        }
        trace!(rivers, "traced rivers");
    }
}
