use glam::DVec2;

use crate::data::DataHolder;
use crate::error::{CellMapError, Result};
use crate::map::{CellMapView, MapGraph};
use crate::terrain::{ConstantNoise, NoiseFn};

use super::{keys, CellMapProcessor};

/// Assigns cells a moisture value in `[0, 1]`
///
/// Ocean cells are saturated. Land cells gain moisture from neighboring
/// ocean cells and from river edges on their border, each capped at a
/// neighbor count. The sum is shifted by the `base` noise, scaled by the
/// `modifier` noise, clamped to `[0, maximum]` and normalized.
///
/// Reads `is_ocean` and `is_river`, so it must run after
/// [`OceanLandProcessor`](super::OceanLandProcessor) and
/// [`RiverProcessor`](super::RiverProcessor).
pub struct MoistureProcessor<B = ConstantNoise, M = ConstantNoise> {
    base: B,
    modifier: M,
    maximum: f64,
    ocean_factor: f64,
    ocean_max_neighbors: usize,
    river_factor: f64,
    river_max_edges: usize,
}

impl MoistureProcessor {
    pub fn new() -> Self {
        Self::with_noise(ConstantNoise(0.0), ConstantNoise(1.0))
    }
}

impl Default for MoistureProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: NoiseFn, M: NoiseFn> MoistureProcessor<B, M> {
    /// # Arguments
    ///
    /// * `base` - Added to the neighbor contributions
    /// * `modifier` - Multiplies the sum
    pub fn with_noise(base: B, modifier: M) -> Self {
        Self {
            base,
            modifier,
            maximum: 2.0,
            ocean_factor: 0.3,
            ocean_max_neighbors: 1,
            river_factor: 0.2,
            river_max_edges: 2,
        }
    }

    /// Moisture that normalizes to 1
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` unless `maximum` is positive and finite.
    pub fn with_maximum(mut self, maximum: f64) -> Result<Self> {
        if !(maximum.is_finite() && maximum > 0.0) {
            return Err(CellMapError::InvalidConfig(format!(
                "moisture maximum must be positive (got {})",
                maximum
            )));
        }
        self.maximum = maximum;
        Ok(self)
    }

    /// Contribution per ocean neighbor, counting at most `max_neighbors`
    pub fn with_ocean(mut self, factor: f64, max_neighbors: usize) -> Self {
        self.ocean_factor = factor;
        self.ocean_max_neighbors = max_neighbors;
        self
    }

    /// Contribution per river edge, counting at most `max_edges`
    pub fn with_river(mut self, factor: f64, max_edges: usize) -> Self {
        self.river_factor = factor;
        self.river_max_edges = max_edges;
        self
    }

    #[inline]
    pub fn maximum(&self) -> f64 {
        self.maximum
    }
}

impl<B: NoiseFn, M: NoiseFn> CellMapProcessor for MoistureProcessor<B, M> {
    fn name(&self) -> &str {
        "moisture"
    }

    fn process(&self, view: &CellMapView, graph: &mut MapGraph) {
        for &id in view.cell_ids() {
            let Some(cell) = graph.cell(id) else {
                continue;
            };

            let moisture = if cell.get(keys::IS_OCEAN) == Some(&true) {
                self.maximum
            } else {
                let oceans = cell
                    .neighbors()
                    .iter()
                    .filter(|&&n| graph.cell(n).and_then(|c| c.get(keys::IS_OCEAN)) == Some(&true))
                    .count();
                let rivers = cell
                    .edges()
                    .iter()
                    .filter(|&&e| graph.edge(e).and_then(|e| e.get(keys::IS_RIVER)) == Some(&true))
                    .count();
                oceans.min(self.ocean_max_neighbors) as f64 * self.ocean_factor
                    + rivers.min(self.river_max_edges) as f64 * self.river_factor
            };

            let center = cell.center();
            let base = self.base.get(center.x, center.y);
            let modifier = self.modifier.get(center.x, center.y);
            let value = ((base + moisture) * modifier).clamp(0.0, self.maximum) / self.maximum;

            if let Some(cell) = graph.cell_mut(id) {
                cell.set(keys::MOISTURE, value);
            }
        }
    }

    fn area_offset(&self) -> DVec2 {
        DVec2::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{CellPolygon, SectionPos};
    use crate::geometry::{Polygon, Rect};
    use glam::IVec2;

    /// Row of unit squares, the first one ocean
    fn strip(count: usize) -> (MapGraph, CellMapView) {
        let mut graph = MapGraph::new(0, IVec2::new(4, 4));
        let polygons = (0..count)
            .map(|i| {
                let x = i as f64;
                let polygon = Polygon::new(vec![
                    DVec2::new(x, 0.0),
                    DVec2::new(x + 1.0, 0.0),
                    DVec2::new(x + 1.0, 1.0),
                    DVec2::new(x, 1.0),
                ]);
                CellPolygon::from_polygon(polygon)
            })
            .collect();
        let ids = graph.assemble(SectionPos::new(0, 0), polygons);
        for (i, &id) in ids.iter().enumerate() {
            graph.cell_mut(id).unwrap().set(keys::IS_OCEAN, i == 0);
        }
        let rect = Rect::new(DVec2::ZERO, DVec2::new(count as f64, 1.0));
        let view = CellMapView::collect(&graph, rect, Vec::new(), ids);
        (graph, view)
    }

    fn moisture(graph: &MapGraph, view: &CellMapView) -> Vec<f64> {
        view.cells(graph).map(|c| *c.get(keys::MOISTURE).unwrap()).collect()
    }

    #[test]
    fn test_ocean_and_coast() {
        let (mut graph, view) = strip(3);
        MoistureProcessor::new().process(&view, &mut graph);

        let values = moisture(&graph, &view);
        assert_eq!(values[0], 1.0);
        assert!((values[1] - 0.15).abs() < 1e-12);
        assert_eq!(values[2], 0.0);
    }

    #[test]
    fn test_river_edges_capped() {
        let (mut graph, view) = strip(3);
        let inland = view.cell_ids()[2];
        let edges: Vec<_> = graph.cell(inland).unwrap().edges().iter().copied().collect();
        assert_eq!(edges.len(), 4);
        for e in edges {
            graph.edge_mut(e).unwrap().set(keys::IS_RIVER, true);
        }

        MoistureProcessor::new().process(&view, &mut graph);
        // Four river edges count as two
        let value = *graph.cell(inland).unwrap().get(keys::MOISTURE).unwrap();
        assert!((value - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_noise_shifts_and_scales() {
        let (mut graph, view) = strip(3);
        MoistureProcessor::with_noise(ConstantNoise(0.5), |_x: f64, _y: f64| 3.0).process(&view, &mut graph);

        let values = moisture(&graph, &view);
        // Clamped at the maximum
        assert_eq!(values[0], 1.0);
        assert_eq!(values[1], 1.0);
        assert!((values[2] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_maximum() {
        assert!(MoistureProcessor::new().with_maximum(0.0).is_err());
        assert!(MoistureProcessor::new().with_maximum(f64::NAN).is_err());
        assert_eq!(MoistureProcessor::new().with_maximum(4.0).unwrap().maximum(), 4.0);
    }
}
