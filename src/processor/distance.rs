//! Distance to the coast
//!
//! Every cell and corner gets a signed distance to the coastline, positive on
//! land and negative in the ocean. The search is a depth-bounded walk over
//! neighbor links: each entity pulls the value closest to zero from the
//! neighbors not already on the current path, and steps one further away
//! from the coast. When the depth bound cuts every path, the entity gets the
//! bound itself as a fallback, which later walks may lower.
//!
//! This approximates a multi-source shortest path. Which of several equally
//! short paths is found first depends on neighbor order, and a walk that is
//! cut short can store a value larger than the true distance; both are
//! tolerated as long as no stored magnitude exceeds the bound.

use glam::DVec2;

use crate::data::DataHolder;
use crate::error::{CellMapError, Result};
use crate::map::{CellId, CellMapView, CornerId, MapGraph};

use super::ocean_land::ocean_flag;
use super::{keys, CellMapProcessor};

/// Default search depth for cells
pub const DEFAULT_MAX_CELL_DISTANCE: i32 = 5;

/// Extra search depth corners get over cells
const CORNER_EXTRA_DEPTH: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Land,
    Ocean,
}

impl Side {
    fn sign(self) -> i32 {
        match self {
            Side::Land => 1,
            Side::Ocean => -1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    /// On the coastline, with a fixed distance
    Coast(i32),
    Inland(Side),
}

/// An entity the distance walk can visit
trait Relaxed: Copy + Eq {
    /// Whether stored coastline values end the walk right away
    const TRUSTS_STORED: bool;

    fn stored(self, graph: &MapGraph) -> Option<i32>;
    fn store(self, graph: &mut MapGraph, value: i32);
    /// `None` if the entity cannot be classified
    fn kind(self, graph: &MapGraph) -> Option<Kind>;
    fn neighbors(self, graph: &MapGraph) -> Vec<Self>;
}

impl Relaxed for CellId {
    const TRUSTS_STORED: bool = false;

    fn stored(self, graph: &MapGraph) -> Option<i32> {
        graph.cell(self).and_then(|c| c.get(keys::DISTANCE_TO_OCEAN)).copied()
    }

    fn store(self, graph: &mut MapGraph, value: i32) {
        if let Some(cell) = graph.cell_mut(self) {
            cell.set(keys::DISTANCE_TO_OCEAN, value);
        }
    }

    fn kind(self, graph: &MapGraph) -> Option<Kind> {
        let cell = graph.cell(self)?;
        let ocean = *cell.get(keys::IS_OCEAN)?;
        let across_coast = cell
            .neighbors()
            .iter()
            .any(|&n| ocean_flag(graph, n) == Some(!ocean));

        Some(match (ocean, across_coast) {
            (true, true) => Kind::Coast(0),
            (false, true) => Kind::Coast(1),
            (true, false) => Kind::Inland(Side::Ocean),
            (false, false) => Kind::Inland(Side::Land),
        })
    }

    fn neighbors(self, graph: &MapGraph) -> Vec<Self> {
        graph
            .cell(self)
            .map(|c| c.neighbors().iter().copied().collect())
            .unwrap_or_default()
    }
}

impl Relaxed for CornerId {
    const TRUSTS_STORED: bool = true;

    fn stored(self, graph: &MapGraph) -> Option<i32> {
        graph.corner(self).and_then(|c| c.get(keys::DISTANCE_TO_OCEAN)).copied()
    }

    fn store(self, graph: &mut MapGraph, value: i32) {
        if let Some(corner) = graph.corner_mut(self) {
            corner.set(keys::DISTANCE_TO_OCEAN, value);
        }
    }

    fn kind(self, graph: &MapGraph) -> Option<Kind> {
        let corner = graph.corner(self)?;
        let (mut ocean, mut land) = (false, false);
        for &cell in corner.cells() {
            match ocean_flag(graph, cell) {
                Some(true) => ocean = true,
                Some(false) => land = true,
                None => {}
            }
        }

        match (ocean, land) {
            (true, true) => Some(Kind::Coast(0)),
            (true, false) => Some(Kind::Inland(Side::Ocean)),
            (false, true) => Some(Kind::Inland(Side::Land)),
            (false, false) => None,
        }
    }

    fn neighbors(self, graph: &MapGraph) -> Vec<Self> {
        graph
            .corner(self)
            .map(|c| c.neighbors().iter().copied().collect())
            .unwrap_or_default()
    }
}

/// One entity on the walk's current path
struct Frame<N> {
    node: N,
    side: Side,
    stored: Option<i32>,
    neighbors: Vec<N>,
    next: usize,
    /// Neighbor result closest to zero so far
    best: Option<i32>,
}

enum Entered<N> {
    Resolved(Option<i32>),
    Pushed(Frame<N>),
}

/// Resolve the distance of `start`, storing every value found on the way
///
/// Returns the computed distance, a stored value that was kept, or `None`
/// when the depth bound cut every path.
fn relax<N: Relaxed>(graph: &mut MapGraph, start: N, allowed: i32) -> Option<i32> {
    let mut path: Vec<Frame<N>> = Vec::new();
    let mut returned = match enter(graph, start, &path, allowed) {
        Entered::Resolved(value) => return value,
        Entered::Pushed(frame) => {
            path.push(frame);
            None
        }
    };

    loop {
        let Some(top) = path.last_mut() else {
            return returned;
        };
        if let Some(value) = returned.take() {
            if top.best.map_or(true, |best| value.abs() < best.abs()) {
                top.best = Some(value);
            }
        }

        if top.next < top.neighbors.len() {
            let neighbor = top.neighbors[top.next];
            top.next += 1;
            match enter(graph, neighbor, &path, allowed) {
                Entered::Resolved(value) => returned = value,
                Entered::Pushed(frame) => path.push(frame),
            }
            continue;
        }

        let Some(frame) = path.pop() else {
            return returned;
        };
        let distance = frame
            .best
            .map(|best| (best.clamp(-allowed, allowed) + frame.side.sign()).clamp(-allowed, allowed));
        returned = settle(graph, frame.node, frame.stored, distance, frame.side, allowed);
        if path.is_empty() {
            return returned;
        }
    }
}

/// Start visiting `node`, resolving it immediately when no walk is needed
fn enter<N: Relaxed>(graph: &mut MapGraph, node: N, path: &[Frame<N>], allowed: i32) -> Entered<N> {
    let stored = node.stored(graph);
    if N::TRUSTS_STORED && matches!(stored, Some(-1..=1)) {
        return Entered::Resolved(stored);
    }
    if path.len() as i32 >= allowed {
        return Entered::Resolved(None);
    }

    match node.kind(graph) {
        None => Entered::Resolved(None),
        Some(Kind::Coast(distance)) => Entered::Resolved(settle(
            graph,
            node,
            stored,
            Some(distance),
            Side::Land,
            allowed,
        )),
        Some(Kind::Inland(side)) => {
            let neighbors = node
                .neighbors(graph)
                .into_iter()
                .filter(|n| *n != node && !path.iter().any(|f| f.node == *n))
                .collect();
            Entered::Pushed(Frame {
                node,
                side,
                stored,
                neighbors,
                next: 0,
                best: None,
            })
        }
    }
}

/// Store the outcome of a visit and return what the parent sees
fn settle<N: Relaxed>(
    graph: &mut MapGraph,
    node: N,
    stored: Option<i32>,
    distance: Option<i32>,
    side: Side,
    allowed: i32,
) -> Option<i32> {
    if let Some(stored) = stored {
        if distance.map_or(true, |d| stored.abs() <= d.abs()) {
            return Some(stored);
        }
    }

    match distance {
        Some(d) => node.store(graph, d),
        None => {
            if stored.is_none() {
                node.store(graph, side.sign() * allowed);
            }
        }
    }
    distance
}

/// Computes the signed distance to the coastline of cells and corners
///
/// Needs `is_ocean` on cells, so it must run after
/// [`OceanLandProcessor`](super::OceanLandProcessor).
///
/// - Ocean cells next to land get 0, land cells next to the ocean get 1.
/// - Corners shared by ocean and land cells get 0.
/// - No stored magnitude exceeds the search depth.
#[derive(Debug, Clone)]
pub struct DistanceToOceanProcessor {
    max_cell_distance: i32,
    max_corner_distance: i32,
    area_offset: DVec2,
}

impl DistanceToOceanProcessor {
    /// # Arguments
    ///
    /// * `max_cell_distance` - Search depth for cells; corners search three
    ///   steps further
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the depth is below 1.
    pub fn new(max_cell_distance: i32) -> Result<Self> {
        if max_cell_distance < 1 {
            return Err(CellMapError::InvalidConfig(format!(
                "max cell distance must be at least 1 (got {})",
                max_cell_distance
            )));
        }
        Ok(Self {
            max_cell_distance,
            max_corner_distance: max_cell_distance + CORNER_EXTRA_DEPTH,
            area_offset: DVec2::splat(0.3),
        })
    }

    /// Override the corner search depth
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the depth is below 1.
    pub fn with_corner_distance(mut self, max_corner_distance: i32) -> Result<Self> {
        if max_corner_distance < 1 {
            return Err(CellMapError::InvalidConfig(format!(
                "max corner distance must be at least 1 (got {})",
                max_corner_distance
            )));
        }
        self.max_corner_distance = max_corner_distance;
        Ok(self)
    }

    pub fn with_area_offset(mut self, area_offset: DVec2) -> Self {
        self.area_offset = area_offset;
        self
    }

    #[inline]
    pub fn max_cell_distance(&self) -> i32 {
        self.max_cell_distance
    }

    #[inline]
    pub fn max_corner_distance(&self) -> i32 {
        self.max_corner_distance
    }
}

impl Default for DistanceToOceanProcessor {
    fn default() -> Self {
        Self {
            max_cell_distance: DEFAULT_MAX_CELL_DISTANCE,
            max_corner_distance: DEFAULT_MAX_CELL_DISTANCE + CORNER_EXTRA_DEPTH,
            area_offset: DVec2::splat(0.3),
        }
    }
}

impl CellMapProcessor for DistanceToOceanProcessor {
    fn name(&self) -> &str {
        "distance_to_ocean"
    }

    fn area_offset(&self) -> DVec2 {
        self.area_offset
    }

    fn process(&self, view: &CellMapView, graph: &mut MapGraph) {
        for &cell in view.cell_ids() {
            relax(graph, cell, self.max_cell_distance);
        }
        for &corner in view.corner_ids() {
            relax(graph, corner, self.max_corner_distance);
        }
    }
}
