//! Lazily generated Voronoi cell maps
//!
//! A standalone library for unbounded planar maps made of Voronoi cells,
//! generated section by section on demand, indexed by chunk and annotated by
//! an ordered pipeline of processors (ocean and land, distance to the coast,
//! rivers, moisture).
//!
//! # Quick Start
//!
//! ```rust
//! use voronoi_cellmap::*;
//! use glam::DVec2;
//!
//! let config = CellMapConfigBuilder::new()
//!     .seed(1452454844896546548)
//!     .section_size(16, 16).unwrap()
//!     .build().unwrap();
//!
//! let mut map = CellMapBuilder::new(config)
//!     .points_generator(ZoomPointsGenerator::new(
//!         BlueNoisePointsGenerator::new(200..=250).unwrap(),
//!         DVec2::new(1.1, 1.1),
//!     ).unwrap())
//!     .processor(OceanLandProcessor::new(PerlinNoise::new(42)))
//!     .processor(DistanceToOceanProcessor::default())
//!     .build().unwrap();
//!
//! let view = map.get_sub_view(Rect::new(DVec2::ZERO, DVec2::splat(300.0))).unwrap();
//! for cell in view.cells(map.graph()) {
//!     assert!(cell.contains(keys::DISTANCE_TO_OCEAN));
//! }
//! map.release(view);
//! ```
//!
//! # Features
//!
//! - `spatial-index` (default): nearest-center fallback for point lookups using a KD-tree
//! - `serde`: serialization support for configuration and coordinates

// Modules
pub mod error;
pub mod config;
pub mod geometry;
pub mod generation;
pub mod data;
pub mod map;
pub mod processor;
pub mod terrain;

#[cfg(feature = "spatial-index")]
pub mod spatial;

// Re-export core types for convenience
pub use error::{CellMapError, Result};
pub use config::{CellMapConfig, CellMapConfigBuilder, DEFAULT_CHUNK_SIZE, DEFAULT_SECTION_SIZE};
pub use geometry::{Polygon, Rect, Segment, Triangle};
pub use generation::{
    triangulate, BlueNoisePointsGenerator, CellPolygon, CellPolygonGenerator, DelaunayPolygonGenerator,
    GridPointsGenerator, PointsGenerator, SectionPolygonGenerator, SectionPos, TriangleCenter,
    VoronoiPolygonGenerator, WhiteNoisePointsGenerator, ZoomPointsGenerator,
};
pub use data::{DataHolder, DataKey, DataMap};
pub use map::{
    point_key, Cell, CellId, CellMap, CellMapBuilder, CellMapChunk, CellMapView, ChunkPos, Corner, CornerId, Edge,
    EdgeId, MapGraph, PointKey, SectionState,
};
pub use processor::{
    keys, CellMapProcessor, DistanceToOceanProcessor, EdgeDistanceChunkData, EdgeDistanceProcessor,
    MoistureProcessor, OceanLandProcessor, RiverPath, RiverProcessor,
};
pub use terrain::{ConstantNoise, NoiseFn, PerlinConfig, PerlinNoise};

#[cfg(feature = "spatial-index")]
pub use spatial::SpatialIndex;

// Re-export glam::DVec2 for convenience
pub use glam::DVec2;
