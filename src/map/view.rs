//! Bounded windows into the map

use std::collections::BTreeSet;

use crate::generation::SectionPos;
use crate::geometry::Rect;

use super::entity::{Cell, CellId, Corner, CornerId, Edge, EdgeId};
use super::graph::MapGraph;

/// The entities of a rectangle, plus the sections the view keeps loaded
///
/// A view returned by [`CellMap::get_sub_view`](super::CellMap::get_sub_view)
/// keeps its sections alive until it is passed back to
/// [`CellMap::release`](super::CellMap::release). Entity ids resolve through
/// the map; two views over overlapping rectangles resolve to the same
/// entities.
///
/// Exposed entities:
/// - cells whose polygon overlaps the rectangle
/// - edges whose segment touches the rectangle
/// - corners inside the rectangle
#[must_use = "a view keeps its sections loaded until it is released"]
#[derive(Debug)]
pub struct CellMapView {
    rect: Rect,
    sections: Vec<SectionPos>,
    cells: Vec<CellId>,
    edges: Vec<EdgeId>,
    corners: Vec<CornerId>,
}

impl CellMapView {
    /// Collect the entities of `rect` from the given candidate cells
    ///
    /// Cells keep candidate order; edges and corners are ordered by id.
    pub(crate) fn collect(
        graph: &MapGraph,
        rect: Rect,
        sections: Vec<SectionPos>,
        candidates: impl IntoIterator<Item = CellId>,
    ) -> Self {
        let mut cells = Vec::new();
        let mut edges = BTreeSet::new();
        let mut corners = BTreeSet::new();

        for id in candidates {
            let Some(cell) = graph.cell(id) else {
                continue;
            };
            if !cell.polygon().intersects_rect(&rect) {
                continue;
            }
            cells.push(id);

            edges.extend(cell.edges().iter().copied().filter(|&e| {
                graph
                    .edge(e)
                    .is_some_and(|edge| rect.intersects_segment(edge.line().0, edge.line().1))
            }));
            corners.extend(
                cell.corners()
                    .iter()
                    .copied()
                    .filter(|&c| graph.corner(c).is_some_and(|corner| rect.contains(corner.point()))),
            );
        }

        Self {
            rect,
            sections,
            cells,
            edges: edges.into_iter().collect(),
            corners: corners.into_iter().collect(),
        }
    }

    #[inline]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Sections held loaded by this view
    #[inline]
    pub fn sections(&self) -> &[SectionPos] {
        &self.sections
    }

    #[inline]
    pub fn cell_ids(&self) -> &[CellId] {
        &self.cells
    }

    #[inline]
    pub fn edge_ids(&self) -> &[EdgeId] {
        &self.edges
    }

    #[inline]
    pub fn corner_ids(&self) -> &[CornerId] {
        &self.corners
    }

    /// Resolve the cells of this view
    pub fn cells<'a>(&'a self, graph: &'a MapGraph) -> impl Iterator<Item = &'a Cell> + 'a {
        self.cells.iter().filter_map(move |&id| graph.cell(id))
    }

    pub fn edges<'a>(&'a self, graph: &'a MapGraph) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter_map(move |&id| graph.edge(id))
    }

    pub fn corners<'a>(&'a self, graph: &'a MapGraph) -> impl Iterator<Item = &'a Corner> + 'a {
        self.corners.iter().filter_map(move |&id| graph.corner(id))
    }

    pub(crate) fn into_sections(self) -> Vec<SectionPos> {
        self.sections
    }
}
