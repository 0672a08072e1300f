//! The cell map
//!
//! A [`CellMap`] covers the whole plane but only keeps the sections that live
//! views reference. Querying a rectangle generates the missing sections,
//! merges them into the shared [`MapGraph`], runs the processor pipeline on
//! sections that have not been processed yet, and returns a [`CellMapView`].
//! Releasing the last view over a section evicts its cells right away.

mod chunk;
mod entity;
mod graph;
mod view;

pub use chunk::{CellMapChunk, ChunkPos};
pub use entity::{edge_key, point_key, Cell, CellId, Corner, CornerId, Edge, EdgeId, EdgeKey, PointKey, KEY_RESOLUTION};
pub use graph::MapGraph;
pub use view::CellMapView;

use std::collections::HashMap;

use glam::DVec2;
use tracing::{debug, trace, warn};

use crate::config::CellMapConfig;
use crate::data::DataMap;
use crate::error::{CellMapError, Result};
use crate::generation::{
    BlueNoisePointsGenerator, CellPolygonGenerator, PointsGenerator, SectionPolygonGenerator, SectionPos,
    VoronoiPolygonGenerator, MAX_SECTION_MARGIN,
};
use crate::geometry::Rect;
use crate::processor::CellMapProcessor;

#[cfg(feature = "spatial-index")]
use crate::spatial::SpatialIndex;

/// Sections addressable on each side of the origin
const MAX_SECTIONS: i32 = 1 << 24;

/// Relative area of a view that may stay uncovered by loaded cells
const COVERAGE_TOLERANCE: f64 = 1e-6;

/// Point amount range of the default points generator
pub const DEFAULT_POINTS: std::ops::RangeInclusive<usize> = 200..=250;

/// Lifecycle of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionState {
    /// Not loaded
    Unmaterialized,
    /// Geometry assembled, pipeline not applied yet
    Materializing,
    /// Geometry assembled and pipeline applied
    Cached,
}

struct SectionRecord {
    state: SectionState,
    /// Live views holding this section
    refs: u32,
    cells: Vec<CellId>,
    #[cfg(feature = "spatial-index")]
    index: Option<SpatialIndex>,
}

/// Lazily generated Voronoi cell map
///
/// # Example
///
/// ```
/// use voronoi_cellmap::*;
/// use glam::DVec2;
///
/// let config = CellMapConfigBuilder::new()
///     .seed(42)
///     .section_size(16, 16)
///     .unwrap()
///     .build()
///     .unwrap();
///
/// let mut map = CellMapBuilder::new(config)
///     .processor(OceanLandProcessor::new(|x: f64, _y: f64| x - 100.0))
///     .build()
///     .unwrap();
///
/// let view = map.get_sub_view(Rect::new(DVec2::ZERO, DVec2::splat(200.0))).unwrap();
/// assert!(!view.cell_ids().is_empty());
///
/// let cell = map.cell_at(DVec2::new(20.0, 20.0)).unwrap();
/// assert_eq!(cell.get(keys::IS_OCEAN), Some(&true));
///
/// map.release(view);
/// assert_eq!(map.graph().cell_count(), 0);
/// ```
pub struct CellMap {
    config: CellMapConfig,
    graph: MapGraph,
    generator: SectionPolygonGenerator,
    processors: Vec<Box<dyn CellMapProcessor>>,
    sections: HashMap<SectionPos, SectionRecord>,
}

impl CellMap {
    /// Map with the default generators and no processors
    ///
    /// # Errors
    ///
    /// See [`CellMapBuilder::build`].
    pub fn new(config: CellMapConfig) -> Result<Self> {
        CellMapBuilder::new(config).build()
    }

    #[inline]
    pub fn config(&self) -> &CellMapConfig {
        &self.config
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.config.seed
    }

    /// Read access to every loaded entity
    #[inline]
    pub fn graph(&self) -> &MapGraph {
        &self.graph
    }

    #[inline]
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.graph.cell(id)
    }

    #[inline]
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.graph.edge(id)
    }

    #[inline]
    pub fn corner(&self, id: CornerId) -> Option<&Corner> {
        self.graph.corner(id)
    }

    /// Names of the processors, in pipeline order
    pub fn processor_names(&self) -> Vec<&str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    pub fn section_state(&self, section: SectionPos) -> SectionState {
        self.sections
            .get(&section)
            .map_or(SectionState::Unmaterialized, |r| r.state)
    }

    /// Number of loaded sections
    pub fn loaded_sections(&self) -> usize {
        self.sections.len()
    }

    /// World-space rectangle of a section
    pub fn section_rect(&self, section: SectionPos) -> Rect {
        self.generator.section_rect(section)
    }

    /// Rectangle that queries are clamped to
    pub fn bounds(&self) -> Rect {
        let extent = self.generator.extent() * MAX_SECTIONS as f64;
        Rect::new(-extent, extent)
    }

    /// Sections within `margin` section sizes of `rect`
    fn covering_sections(&self, rect: &Rect, margin: f64) -> Vec<SectionPos> {
        let extent = self.generator.extent();
        let grown = rect.inflate(extent * margin);
        let min = (grown.min / extent).floor();
        let max = (grown.max / extent).ceil() - DVec2::ONE;

        let mut sections = Vec::new();
        for y in min.y as i32..=max.y as i32 {
            for x in min.x as i32..=max.x as i32 {
                sections.push(SectionPos::new(x, y));
            }
        }
        sections
    }

    /// Largest halo any processor asks for
    fn max_halo(&self) -> DVec2 {
        self.processors
            .iter()
            .fold(DVec2::ZERO, |halo, p| halo.max(p.area_offset()))
    }

    /// Get a view of every entity overlapping `rect`
    ///
    /// Generates the sections the rectangle needs, runs the processor
    /// pipeline for the ones not processed yet, and keeps them loaded until
    /// the view is released. Querying an already processed area again does
    /// not re-run the pipeline.
    ///
    /// # Arguments
    ///
    /// * `rect` - World-space rectangle; clamped to [`bounds`](Self::bounds)
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty or non-finite rectangle, and
    /// `GenerationFailed` if a section cannot be generated.
    pub fn get_sub_view(&mut self, rect: Rect) -> Result<CellMapView> {
        if !rect.is_finite() || rect.is_empty() {
            return Err(CellMapError::InvalidInput(format!(
                "cannot view an empty or non-finite rectangle {:?}",
                rect
            )));
        }
        let rect = rect.intersection(&self.bounds());
        if rect.is_empty() {
            return Err(CellMapError::InvalidInput("rectangle lies outside the map bounds".into()));
        }

        let sections = self.load_covering(&rect)?;
        let view = self.pin_view(rect, sections);

        let pending: Vec<SectionPos> = view
            .sections()
            .iter()
            .copied()
            .filter(|&s| self.section_state(s) != SectionState::Cached)
            .collect();
        for section in pending {
            if let Err(e) = self.process_section(section) {
                self.release(view);
                return Err(e);
            }
        }

        Ok(view)
    }

    /// Release a view, evicting every section no other view holds
    pub fn release(&mut self, view: CellMapView) {
        for section in view.into_sections() {
            let Some(record) = self.sections.get_mut(&section) else {
                panic!("view holds section ({}, {}) which is not loaded", section.x, section.y);
            };
            record.refs -= 1;
            let cells = record.cells.clone();
            let remaining = record.refs;

            for id in cells {
                self.graph.unpin(id);
            }
            if remaining == 0 {
                self.sections.remove(&section);
                debug!(section_x = section.x, section_y = section.y, "evicted section");
            }
        }
    }

    /// Generate and assemble every section of `sections` that is not loaded
    fn assemble_sections(&mut self, sections: &[SectionPos]) -> Result<()> {
        for &section in sections {
            if self.sections.contains_key(&section) {
                continue;
            }
            let polygons = match self.generator.generate(section) {
                Ok(polygons) => polygons,
                Err(e) => {
                    self.drop_unreferenced();
                    return Err(e);
                }
            };
            let cells = self.graph.assemble(section, polygons);

            #[cfg(feature = "spatial-index")]
            let index = {
                let centers: Vec<(CellId, DVec2)> = cells
                    .iter()
                    .filter_map(|&id| self.graph.cell(id).map(|c| (id, c.center())))
                    .collect();
                SpatialIndex::new(&centers)
            };

            debug!(
                section_x = section.x,
                section_y = section.y,
                cells = cells.len(),
                "assembled section"
            );
            self.sections.insert(
                section,
                SectionRecord {
                    state: SectionState::Materializing,
                    refs: 0,
                    cells,
                    #[cfg(feature = "spatial-index")]
                    index,
                },
            );
        }
        Ok(())
    }

    /// Assemble every section owning a cell that overlaps `rect`
    ///
    /// Starts with the sections within the generator margin and adds rings
    /// of sections until the loaded cells cover `rect`.
    fn load_covering(&mut self, rect: &Rect) -> Result<Vec<SectionPos>> {
        let mut margin = self.generator.margin();
        loop {
            let sections = self.covering_sections(rect, margin);
            self.assemble_sections(&sections)?;
            if margin >= MAX_SECTION_MARGIN || self.is_covered(rect, &sections) {
                return Ok(sections);
            }
            margin = (margin + 1.0).min(MAX_SECTION_MARGIN);
            trace!(margin, "view not covered, loading more sections");
        }
    }

    /// Whether the cells of `sections` cover `rect` without gaps
    fn is_covered(&self, rect: &Rect, sections: &[SectionPos]) -> bool {
        let covered: f64 = sections
            .iter()
            .filter_map(|s| self.sections.get(s))
            .flat_map(|r| r.cells.iter())
            .filter_map(|&id| self.graph.cell(id))
            .filter(|c| c.polygon().bounds().intersects(rect))
            .map(|c| c.polygon().clip_to_rect(rect).area())
            .sum();
        covered >= rect.area() * (1.0 - COVERAGE_TOLERANCE)
    }

    /// Evict sections that were assembled but never pinned
    fn drop_unreferenced(&mut self) {
        let orphaned: Vec<SectionPos> = self
            .sections
            .iter()
            .filter(|(_, r)| r.refs == 0)
            .map(|(&s, _)| s)
            .collect();
        for section in orphaned {
            if let Some(record) = self.sections.remove(&section) {
                for id in record.cells {
                    self.graph.evict(id);
                }
            }
        }
    }

    /// Pin `sections` and collect the entities of `rect` from them
    fn pin_view(&mut self, rect: Rect, sections: Vec<SectionPos>) -> CellMapView {
        let mut candidates = Vec::new();
        for section in &sections {
            let Some(record) = self.sections.get_mut(section) else {
                panic!("pinning section ({}, {}) which is not loaded", section.x, section.y);
            };
            record.refs += 1;
            for &id in &record.cells {
                self.graph.pin(id);
            }
            candidates.extend(record.cells.iter().copied());
        }
        CellMapView::collect(&self.graph, rect, sections, candidates)
    }

    /// View over loaded sections that pins nothing
    fn transient_view(&self, rect: Rect) -> CellMapView {
        let candidates: Vec<CellId> = self
            .covering_sections(&rect, MAX_SECTION_MARGIN)
            .iter()
            .filter_map(|s| self.sections.get(s))
            .flat_map(|r| r.cells.iter().copied())
            .collect();
        CellMapView::collect(&self.graph, rect, Vec::new(), candidates)
    }

    /// Run the pipeline for one section
    fn process_section(&mut self, section: SectionPos) -> Result<()> {
        let section_rect = self.generator.section_rect(section);
        let context_rect = section_rect.expand(self.max_halo());
        let context_sections = self.load_covering(&context_rect)?;
        let context = self.pin_view(context_rect, context_sections);

        for i in 0..self.processors.len() {
            let rect = section_rect.expand(self.processors[i].area_offset());
            let view = self.transient_view(rect);
            trace!(
                processor = self.processors[i].name(),
                section_x = section.x,
                section_y = section.y,
                cells = view.cell_ids().len(),
                "running processor"
            );
            self.processors[i].process(&view, &mut self.graph);
        }

        if let Some(record) = self.sections.get_mut(&section) {
            record.state = SectionState::Cached;
        }
        self.release(context);
        debug!(section_x = section.x, section_y = section.y, "processed section");
        Ok(())
    }

    /// Find the cell at a world position
    ///
    /// Scans the polygons of the point's chunk in registration order and
    /// returns the first one containing the point; a point exactly on a
    /// shared border therefore resolves to whichever cell registered first.
    /// Points inside no polygon fall back to the cell with the nearest
    /// center.
    ///
    /// Returns `None` if nothing is loaded around the position.
    pub fn cell_at(&self, position: DVec2) -> Option<&Cell> {
        if let Some(id) = self.graph.find_containing_cell(position) {
            return self.graph.cell(id);
        }
        let id = self.nearest_cell(position)?;
        warn!(
            x = position.x,
            y = position.y,
            cell = %id,
            "no polygon contains position, using nearest center"
        );
        self.graph.cell(id)
    }

    #[cfg(feature = "spatial-index")]
    fn nearest_cell(&self, position: DVec2) -> Option<CellId> {
        self.generator
            .section_at(position)
            .with_neighbors()
            .filter_map(|s| self.sections.get(&s))
            .filter_map(|r| r.index.as_ref())
            .map(|index| index.find_nearest(position))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    #[cfg(not(feature = "spatial-index"))]
    fn nearest_cell(&self, position: DVec2) -> Option<CellId> {
        self.graph.nearest_chunk_cell(position)
    }

    /// Snapshot of a loaded chunk, with a per-tile lookup table
    ///
    /// Returns `None` if no loaded cell overlaps the chunk.
    pub fn chunk(&self, x: i32, y: i32) -> Option<CellMapChunk> {
        let pos = ChunkPos::new(x, y);
        if !self.graph.is_chunk_loaded(pos) {
            return None;
        }

        let size = self.config.chunk_size;
        let origin = self.graph.chunk_rect(pos).min;
        let mut tiles = Vec::with_capacity(size.x as usize * size.y as usize);
        for ty in 0..size.y {
            for tx in 0..size.x {
                let center = origin + DVec2::new(tx as f64 + 0.5, ty as f64 + 0.5);
                tiles.push(self.cell_at(center).map(Cell::id));
            }
        }
        Some(CellMapChunk::new(pos, size, self.graph.chunk_cells(pos).to_vec(), tiles))
    }

    /// Attributes processors stored on a chunk
    pub fn chunk_data(&self, x: i32, y: i32) -> Option<&DataMap> {
        self.graph.chunk_data(ChunkPos::new(x, y))
    }
}

/// Builder for [`CellMap`]
///
/// # Example
///
/// ```
/// use voronoi_cellmap::*;
/// use glam::DVec2;
///
/// let points = ZoomPointsGenerator::new(
///     BlueNoisePointsGenerator::new(200..=250).unwrap(),
///     DVec2::new(1.1, 1.1),
/// )
/// .unwrap();
///
/// let map = CellMapBuilder::new(CellMapConfig::default())
///     .points_generator(points)
///     .polygon_generator(VoronoiPolygonGenerator::new(TriangleCenter::Centroid))
///     .processor(OceanLandProcessor::new(ConstantNoise(1.0)))
///     .processor(DistanceToOceanProcessor::default())
///     .build()
///     .unwrap();
/// assert_eq!(map.processor_names(), vec!["ocean_land", "distance_to_ocean"]);
/// ```
pub struct CellMapBuilder {
    config: CellMapConfig,
    points: Option<Box<dyn PointsGenerator>>,
    polygons: Option<Box<dyn CellPolygonGenerator>>,
    processors: Vec<Box<dyn CellMapProcessor>>,
}

impl CellMapBuilder {
    pub fn new(config: CellMapConfig) -> Self {
        Self {
            config,
            points: None,
            polygons: None,
            processors: Vec::new(),
        }
    }

    /// Seed points per section; blue noise with 200 to 250 points if unset
    pub fn points_generator(mut self, generator: impl PointsGenerator + 'static) -> Self {
        self.points = Some(Box::new(generator));
        self
    }

    /// Cell polygons per section; circumcenter Voronoi cells if unset
    pub fn polygon_generator(mut self, generator: impl CellPolygonGenerator + 'static) -> Self {
        self.polygons = Some(Box::new(generator));
        self
    }

    /// Append a processor to the pipeline
    pub fn processor(mut self, processor: impl CellMapProcessor + 'static) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Build the map
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the config breaks its invariants (see
    /// [`CellMapConfig::validate`]), or if a processor requests a negative
    /// or non-finite halo.
    pub fn build(self) -> Result<CellMap> {
        self.config.validate()?;
        for processor in &self.processors {
            let halo = processor.area_offset();
            if !halo.is_finite() || halo.min_element() < 0.0 {
                return Err(CellMapError::InvalidConfig(format!(
                    "processor {} requests invalid halo {}",
                    processor.name(),
                    halo
                )));
            }
        }

        let points: Box<dyn PointsGenerator> = match self.points {
            Some(points) => points,
            None => Box::new(BlueNoisePointsGenerator::new(DEFAULT_POINTS)?),
        };
        let polygons = self
            .polygons
            .unwrap_or_else(|| Box::new(VoronoiPolygonGenerator::default()));

        let config = self.config;
        Ok(CellMap {
            config,
            graph: MapGraph::new(config.seed, config.chunk_size),
            generator: SectionPolygonGenerator::new(config.seed, config.section_extent(), points, polygons),
            processors: self.processors,
            sections: HashMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CellMapConfigBuilder;
    use crate::data::DataHolder;
    use crate::generation::WhiteNoisePointsGenerator;
    use crate::processor::keys;
    use std::cell::Cell as StdCell;
    use std::rc::Rc;

    fn small_config(seed: u64) -> CellMapConfig {
        CellMapConfigBuilder::new()
            .seed(seed)
            .chunk_size(16, 16)
            .unwrap()
            .section_size(8, 8)
            .unwrap()
            .build()
            .unwrap()
    }

    fn small_map(seed: u64) -> CellMap {
        CellMapBuilder::new(small_config(seed))
            .points_generator(BlueNoisePointsGenerator::new(60..=80).unwrap())
            .build()
            .unwrap()
    }

    /// Counts its invocations and tags every cell it sees
    struct Counting {
        runs: Rc<StdCell<usize>>,
    }

    impl CellMapProcessor for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn process(&self, view: &CellMapView, graph: &mut MapGraph) {
            self.runs.set(self.runs.get() + 1);
            for &id in view.cell_ids() {
                if let Some(cell) = graph.cell_mut(id) {
                    cell.set(keys::MOISTURE, 0.5);
                }
            }
        }
    }

    #[test]
    fn test_invalid_rects_rejected() {
        let mut map = small_map(1);
        let empty = Rect::new(DVec2::splat(5.0), DVec2::splat(5.0));
        assert!(matches!(map.get_sub_view(empty), Err(CellMapError::InvalidInput(_))));
        let nan = Rect::new(DVec2::ZERO, DVec2::new(f64::NAN, 1.0));
        assert!(matches!(map.get_sub_view(nan), Err(CellMapError::InvalidInput(_))));
        assert_eq!(map.loaded_sections(), 0);
    }

    #[test]
    fn test_covering_sections_include_margin() {
        let map = small_map(1);
        // Section extent is 128; 60 points per section give a margin of
        // about 33 units into neighbors
        let margin = map.generator.margin();
        let inner = map.covering_sections(&Rect::new(DVec2::splat(40.0), DVec2::splat(80.0)), margin);
        assert_eq!(inner, vec![SectionPos::new(0, 0)]);

        let border = map.covering_sections(&Rect::new(DVec2::splat(10.0), DVec2::splat(20.0)), margin);
        assert_eq!(border.len(), 4);
        assert!(border.contains(&SectionPos::new(-1, -1)));
    }

    #[test]
    fn test_view_lifecycle() {
        let mut map = small_map(5);
        let view = map.get_sub_view(Rect::new(DVec2::splat(40.0), DVec2::splat(80.0))).unwrap();
        assert_eq!(map.section_state(SectionPos::new(0, 0)), SectionState::Cached);
        assert_eq!(view.sections(), &[SectionPos::new(0, 0)]);
        assert!(!view.cell_ids().is_empty());
        for cell in view.cells(map.graph()) {
            assert!(cell.polygon().intersects_rect(&view.rect()));
            assert_eq!(cell.ref_count(), 1);
        }

        map.release(view);
        assert_eq!(map.section_state(SectionPos::new(0, 0)), SectionState::Unmaterialized);
        assert_eq!(map.loaded_sections(), 0);
        assert_eq!(map.graph().cell_count(), 0);
        assert_eq!(map.graph().edge_count(), 0);
        assert_eq!(map.graph().corner_count(), 0);
    }

    #[test]
    fn test_pipeline_runs_once_per_section() {
        let runs = Rc::new(StdCell::new(0));
        let mut map = CellMapBuilder::new(small_config(3))
            .points_generator(BlueNoisePointsGenerator::new(60..=80).unwrap())
            .processor(Counting { runs: runs.clone() })
            .build()
            .unwrap();

        let rect = Rect::new(DVec2::splat(40.0), DVec2::splat(80.0));
        let first = map.get_sub_view(rect).unwrap();
        assert_eq!(runs.get(), 1);
        let second = map.get_sub_view(rect).unwrap();
        assert_eq!(runs.get(), 1, "cached section must not be processed again");

        for &id in second.cell_ids() {
            assert_eq!(map.cell(id).unwrap().get(keys::MOISTURE), Some(&0.5));
            assert_eq!(map.cell(id).unwrap().ref_count(), 2);
        }
        map.release(first);
        map.release(second);

        let third = map.get_sub_view(rect).unwrap();
        assert_eq!(runs.get(), 2, "evicted section is processed again");
        map.release(third);
    }

    #[test]
    fn test_cell_at_and_chunk() {
        let mut map = small_map(11);
        let view = map.get_sub_view(Rect::new(DVec2::splat(0.0), DVec2::splat(128.0))).unwrap();

        let position = DVec2::new(50.5, 70.25);
        let cell = map.cell_at(position).unwrap();
        assert!(cell.contains_point(position));

        let chunk = map.chunk(3, 4).unwrap();
        assert_eq!(chunk.pos(), ChunkPos::new(3, 4));
        assert!(!chunk.cells().is_empty());
        // Tile (2, 6) of chunk (3, 4) has its center at (50.5, 70.5)
        let tile = chunk.cell_at_local(2, 6).unwrap();
        assert_eq!(Some(tile), map.cell_at(DVec2::new(50.5, 70.5)).map(Cell::id));
        assert!(chunk.cells().contains(&tile));

        assert!(map.chunk(500, 500).is_none());
        map.release(view);
        assert!(map.chunk(3, 4).is_none());
        assert!(map.cell_at(position).is_none());
    }

    #[test]
    fn test_invalid_halo_rejected() {
        struct Negative;
        impl CellMapProcessor for Negative {
            fn name(&self) -> &str {
                "negative"
            }
            fn area_offset(&self) -> DVec2 {
                DVec2::new(-0.1, 0.0)
            }
            fn process(&self, _view: &CellMapView, _graph: &mut MapGraph) {}
        }

        let result = CellMapBuilder::new(small_config(0)).processor(Negative).build();
        assert!(matches!(result, Err(CellMapError::InvalidConfig(_))));
    }

    #[test]
    fn test_hand_built_config_validated() {
        let config = CellMapConfig {
            chunk_size: glam::IVec2::new(0, 16),
            ..CellMapConfig::default()
        };
        assert!(matches!(CellMap::new(config), Err(CellMapError::InvalidConfig(_))));
    }

    #[test]
    fn test_large_chunk_snapshot_size() {
        // 50000 x 50000 tiles overflow an i32 product
        let config = CellMapConfig {
            seed: 1,
            chunk_size: glam::IVec2::new(50_000, 50_000),
            section_size: glam::IVec2::new(1, 1),
        };
        assert!(config.validate().is_ok());
        let map = CellMap::new(config).unwrap();
        assert_eq!(map.config().section_extent(), DVec2::splat(50_000.0));
        assert!(map.chunk(0, 0).is_none());
    }

    #[test]
    fn test_sparse_points_fill_the_view() {
        for n in 3..=5 {
            let mut map = CellMapBuilder::new(small_config(n as u64))
                .points_generator(WhiteNoisePointsGenerator::new(n..=n).unwrap())
                .build()
                .unwrap();
            let rect = Rect::new(DVec2::ZERO, DVec2::splat(300.0));
            let view = map.get_sub_view(rect).unwrap();

            let covered: f64 = view
                .cells(map.graph())
                .map(|c| c.polygon().clip_to_rect(&rect).area())
                .sum();
            assert!(
                (covered - rect.area()).abs() < rect.area() * 1e-6,
                "{} points per section cover {} of {}",
                n,
                covered,
                rect.area()
            );
            map.release(view);
            assert_eq!(map.loaded_sections(), 0);
        }
    }

    #[test]
    fn test_generation_failure_leaves_nothing_loaded() {
        let mut map = CellMapBuilder::new(small_config(0))
            .points_generator(WhiteNoisePointsGenerator::new(0..=0).unwrap())
            .build()
            .unwrap();
        let result = map.get_sub_view(Rect::new(DVec2::splat(40.0), DVec2::splat(80.0)));
        assert!(matches!(result, Err(CellMapError::GenerationFailed { .. })));
        assert_eq!(map.loaded_sections(), 0);
        assert_eq!(map.graph().cell_count(), 0);
    }
}
