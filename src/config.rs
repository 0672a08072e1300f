//! Cell map configuration and builder
//!
//! This module provides the configuration that must be fixed before the first
//! query against a [`CellMap`](crate::CellMap): the seed and the two tiling sizes.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use glam::{DVec2, IVec2};

use crate::error::{CellMapError, Result};

/// Default chunk size in world units
pub const DEFAULT_CHUNK_SIZE: IVec2 = IVec2::new(16, 16);

/// Default section size in chunks
pub const DEFAULT_SECTION_SIZE: IVec2 = IVec2::new(512, 512);

/// Configuration for deterministic cell map generation
///
/// The same configuration (together with the same points and polygon
/// generators) always produces the same geometry, no matter in which order
/// regions of the map are queried.
///
/// # Example
///
/// ```rust
/// use voronoi_cellmap::*;
///
/// let config = CellMapConfigBuilder::new()
///     .seed(42)
///     .chunk_size(16, 16)
///     .unwrap()
///     .section_size(32, 32)
///     .unwrap()
///     .build()
///     .unwrap();
///
/// assert_eq!(config.section_extent(), glam::DVec2::new(512.0, 512.0));
///
/// // Config is serializable (with "serde" feature)
/// # #[cfg(feature = "serde")]
/// # {
/// let json = serde_json::to_string(&config).unwrap();
/// let restored: CellMapConfig = serde_json::from_str(&json).unwrap();
/// assert_eq!(config, restored);
/// # }
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMapConfig {
    /// Seed for point generation and every seeded processor
    pub seed: u64,

    /// Size of a chunk in world units
    ///
    /// Chunks are the spatial index used for point to cell lookups.
    pub chunk_size: IVec2,

    /// Size of a section in chunks
    ///
    /// Sections are the unit at which points and polygons are generated.
    pub section_size: IVec2,
}

impl CellMapConfig {
    /// Extent of a section in world units
    #[inline]
    pub fn section_extent(&self) -> DVec2 {
        self.chunk_size.as_dvec2() * self.section_size.as_dvec2()
    }

    /// Extent of a chunk in world units
    #[inline]
    pub fn chunk_extent(&self) -> DVec2 {
        self.chunk_size.as_dvec2()
    }

    /// Check the invariants the builder enforces
    ///
    /// The fields are public, so a config may be assembled by hand.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a chunk or section dimension is not
    /// positive, or if a section would exceed the `i32` coordinate range
    pub fn validate(&self) -> Result<()> {
        let (chunk, section) = (self.chunk_size, self.section_size);
        if chunk.min_element() <= 0 {
            return Err(CellMapError::InvalidConfig(format!(
                "chunk size must be positive (got {}x{})",
                chunk.x, chunk.y
            )));
        }
        if section.min_element() <= 0 {
            return Err(CellMapError::InvalidConfig(format!(
                "section size must be positive (got {}x{})",
                section.x, section.y
            )));
        }

        let extent_x = i64::from(chunk.x) * i64::from(section.x);
        let extent_y = i64::from(chunk.y) * i64::from(section.y);
        if extent_x > i64::from(i32::MAX) || extent_y > i64::from(i32::MAX) {
            return Err(CellMapError::InvalidConfig(format!(
                "section extent too large ({}x{} units)",
                extent_x, extent_y
            )));
        }
        Ok(())
    }
}

impl Default for CellMapConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
            section_size: DEFAULT_SECTION_SIZE,
        }
    }
}

/// Builder for creating [`CellMapConfig`] with validation
#[derive(Debug, Clone)]
pub struct CellMapConfigBuilder {
    seed: Option<u64>,
    chunk_size: IVec2,
    section_size: IVec2,
}

impl CellMapConfigBuilder {
    /// Create a new builder with default values
    ///
    /// Defaults:
    /// - seed: Random (generated from thread_rng)
    /// - chunk_size: 16×16 units
    /// - section_size: 512×512 chunks
    pub fn new() -> Self {
        Self {
            seed: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            section_size: DEFAULT_SECTION_SIZE,
        }
    }

    /// Set the map seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the chunk size in world units
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if either dimension is not positive
    pub fn chunk_size(mut self, x: i32, y: i32) -> Result<Self> {
        if x <= 0 || y <= 0 {
            return Err(CellMapError::InvalidConfig(format!(
                "chunk size must be positive (got {}x{})",
                x, y
            )));
        }
        self.chunk_size = IVec2::new(x, y);
        Ok(self)
    }

    /// Set the section size in chunks
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if either dimension is not positive
    pub fn section_size(mut self, x: i32, y: i32) -> Result<Self> {
        if x <= 0 || y <= 0 {
            return Err(CellMapError::InvalidConfig(format!(
                "section size must be positive (got {}x{})",
                x, y
            )));
        }
        self.section_size = IVec2::new(x, y);
        Ok(self)
    }

    /// Build the configuration
    ///
    /// If no seed was provided, generates a random seed using thread_rng.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a section would exceed the `i32` coordinate range
    pub fn build(self) -> Result<CellMapConfig> {
        let config = CellMapConfig {
            seed: self.seed.unwrap_or_else(rand::random),
            chunk_size: self.chunk_size,
            section_size: self.section_size,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for CellMapConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
