use glam::DVec2;

use crate::data::DataHolder;
use crate::map::{CellId, CellMapView, MapGraph};
use crate::terrain::NoiseFn;

use super::{keys, CellMapProcessor};

/// Classifies cells as ocean or land
///
/// A cell is ocean when the height function is negative at its center.
pub struct OceanLandProcessor<N> {
    height: N,
    area_offset: DVec2,
}

impl<N: NoiseFn> OceanLandProcessor<N> {
    pub fn new(height: N) -> Self {
        Self {
            height,
            area_offset: DVec2::splat(0.3),
        }
    }

    pub fn with_area_offset(mut self, area_offset: DVec2) -> Self {
        self.area_offset = area_offset;
        self
    }
}

impl<N: NoiseFn> CellMapProcessor for OceanLandProcessor<N> {
    fn name(&self) -> &str {
        "ocean_land"
    }

    fn area_offset(&self) -> DVec2 {
        self.area_offset
    }

    fn process(&self, view: &CellMapView, graph: &mut MapGraph) {
        for &id in view.cell_ids() {
            let Some(cell) = graph.cell_mut(id) else {
                continue;
            };
            let center = cell.center();
            cell.set(keys::IS_OCEAN, self.height.get(center.x, center.y) < 0.0);
        }
    }
}

/// Whether a cell was classified as ocean; `None` if it was never classified
pub(crate) fn ocean_flag(graph: &MapGraph, id: CellId) -> Option<bool> {
    graph.cell(id).and_then(|c| c.get(keys::IS_OCEAN)).copied()
}
