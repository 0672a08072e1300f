//! Processor pipeline
//!
//! Processors annotate freshly generated sections with attributes. They run
//! in the order they were added to the map, exactly once per section, and
//! later processors may read what earlier ones wrote: the distance to the
//! ocean needs `is_ocean`, rivers need the distance to the ocean, and
//! moisture counts river edges.
//!
//! A processor may request a halo through [`CellMapProcessor::area_offset`].
//! The pipeline then hands it a view grown by that fraction on every side,
//! with the surrounding sections loaded, so values near a section border are
//! computed with their real neighbors.

mod distance;
mod edge_distance;
mod moisture;
mod ocean_land;
mod river;

pub use distance::{DistanceToOceanProcessor, DEFAULT_MAX_CELL_DISTANCE};
pub use edge_distance::{EdgeDistanceChunkData, EdgeDistanceProcessor};
pub use moisture::MoistureProcessor;
pub use ocean_land::OceanLandProcessor;
pub use river::{RiverPath, RiverProcessor};

use glam::DVec2;

use crate::map::{CellMapView, MapGraph};

/// One stage of the pipeline
pub trait CellMapProcessor {
    /// Name used in log output
    fn name(&self) -> &str;

    /// Halo as a fraction of the processed area, added on every side
    fn area_offset(&self) -> DVec2 {
        DVec2::ZERO
    }

    /// Annotate the entities of `view`
    ///
    /// Entities outside the view may be read and written as well, as long as
    /// they are loaded.
    fn process(&self, view: &CellMapView, graph: &mut MapGraph);
}

/// Attribute keys written by the built-in processors
pub mod keys {
    use crate::data::DataKey;

    use super::EdgeDistanceChunkData;

    /// Cells: whether the cell is below sea level
    pub const IS_OCEAN: DataKey<bool> = DataKey::new("is_ocean");

    /// Corners and edges: part of a river
    pub const IS_RIVER: DataKey<bool> = DataKey::new("is_river");

    /// Corners and edges: position along the river, 0 at its source
    pub const DISTANCE_TO_RIVER_START: DataKey<i32> = DataKey::new("distance_to_river_start");

    /// Cells and corners: signed distance to the coast
    ///
    /// Positive on land, negative in the ocean. Coastal corners are 0; for
    /// cells, ocean cells next to land are 0 and land cells next to the ocean
    /// are 1.
    pub const DISTANCE_TO_OCEAN: DataKey<i32> = DataKey::new("distance_to_ocean");

    /// Cells: moisture in `[0, 1]`
    pub const MOISTURE: DataKey<f64> = DataKey::new("moisture");

    /// Chunks: per-tile distances to nearby edges
    pub const EDGE_DISTANCE: DataKey<EdgeDistanceChunkData> = DataKey::new("edge_distance");
}
