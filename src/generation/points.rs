//! Seed point generators
//!
//! Every generator fills the unit square `[0, 1)²`; section tiling scales the
//! points into world space afterwards.

use std::ops::RangeInclusive;

use glam::{DVec2, UVec2};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use crate::error::{CellMapError, Result};

/// Produces seed points in the unit square from a seeded random source
pub trait PointsGenerator {
    fn generate(&self, rng: &mut dyn RngCore) -> Vec<DVec2>;

    /// Fewest points a call to [`generate`](Self::generate) returns
    ///
    /// Sections use it to guess how far apart points are; the default makes
    /// no promise.
    fn min_points(&self) -> usize {
        0
    }
}

impl<G: PointsGenerator + ?Sized> PointsGenerator for Box<G> {
    fn generate(&self, rng: &mut dyn RngCore) -> Vec<DVec2> {
        (**self).generate(rng)
    }

    fn min_points(&self) -> usize {
        (**self).min_points()
    }
}

fn validate_amount(amount: &RangeInclusive<usize>) -> Result<()> {
    if amount.is_empty() {
        return Err(CellMapError::InvalidConfig(format!(
            "empty point amount range {}..={}",
            amount.start(),
            amount.end()
        )));
    }
    Ok(())
}

/// Grid side length large enough to hold `max` points with some slack
fn default_cells(amount: &RangeInclusive<usize>, extra: u32) -> UVec2 {
    UVec2::splat((*amount.end() as f64).sqrt().ceil() as u32 + extra)
}

/// Indices of the grid slots to fill: all of them if `amount` covers the grid,
/// otherwise a random subset
fn pick_slots(slot_count: usize, amount: usize, rng: &mut dyn RngCore) -> Vec<usize> {
    let mut slots: Vec<usize> = (0..slot_count).collect();
    if amount < slot_count {
        slots.shuffle(rng);
        slots.truncate(amount);
    }
    slots
}

/// Uniformly distributed points
#[derive(Debug, Clone)]
pub struct WhiteNoisePointsGenerator {
    amount: RangeInclusive<usize>,
}

impl WhiteNoisePointsGenerator {
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an empty amount range.
    pub fn new(amount: RangeInclusive<usize>) -> Result<Self> {
        validate_amount(&amount)?;
        Ok(Self { amount })
    }
}

impl PointsGenerator for WhiteNoisePointsGenerator {
    fn generate(&self, rng: &mut dyn RngCore) -> Vec<DVec2> {
        let amount = rng.gen_range(self.amount.clone());
        (0..amount).map(|_| DVec2::new(rng.gen(), rng.gen())).collect()
    }

    fn min_points(&self) -> usize {
        *self.amount.start()
    }
}

/// Points at the centers of a regular grid
///
/// When fewer points are drawn than the grid has slots, a random subset of
/// slots is used.
#[derive(Debug, Clone)]
pub struct GridPointsGenerator {
    amount: RangeInclusive<usize>,
    grid: UVec2,
}

impl GridPointsGenerator {
    /// Grid with `ceil(sqrt(max)) + 4` slots per side
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an empty amount range.
    pub fn new(amount: RangeInclusive<usize>) -> Result<Self> {
        validate_amount(&amount)?;
        let grid = default_cells(&amount, 4);
        Ok(Self { amount, grid })
    }

    /// # Errors
    ///
    /// Returns `InvalidConfig` if either dimension is zero.
    pub fn with_grid(mut self, columns: u32, rows: u32) -> Result<Self> {
        if columns == 0 || rows == 0 {
            return Err(CellMapError::InvalidConfig(format!(
                "grid size must be positive, got {}x{}",
                columns, rows
            )));
        }
        self.grid = UVec2::new(columns, rows);
        Ok(self)
    }

    pub fn grid(&self) -> UVec2 {
        self.grid
    }
}

impl PointsGenerator for GridPointsGenerator {
    fn generate(&self, rng: &mut dyn RngCore) -> Vec<DVec2> {
        let amount = rng.gen_range(self.amount.clone());
        let spacing = DVec2::ONE / self.grid.as_dvec2();
        let columns = self.grid.x as usize;

        pick_slots((self.grid.x * self.grid.y) as usize, amount, rng)
            .into_iter()
            .map(|slot| {
                let cell = DVec2::new((slot % columns) as f64, (slot / columns) as f64);
                cell * spacing + spacing * 0.5
            })
            .collect()
    }

    fn min_points(&self) -> usize {
        (*self.amount.start()).min((self.grid.x * self.grid.y) as usize)
    }
}

/// Jittered grid: one random point inside each (or a random subset of) grid
/// slot, with a gap between slots
///
/// The gap keeps points from clustering across slot borders, which gives the
/// blue-noise look.
#[derive(Debug, Clone)]
pub struct BlueNoisePointsGenerator {
    amount: RangeInclusive<usize>,
    cells: UVec2,
    coverage: DVec2,
}

impl BlueNoisePointsGenerator {
    /// Grid with `ceil(sqrt(max)) + 1` slots per side, each covering 80%
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an empty amount range.
    pub fn new(amount: RangeInclusive<usize>) -> Result<Self> {
        validate_amount(&amount)?;
        let cells = default_cells(&amount, 1);
        Ok(Self {
            amount,
            cells,
            coverage: DVec2::splat(0.8),
        })
    }

    /// # Errors
    ///
    /// Returns `InvalidConfig` if either dimension is zero.
    pub fn with_cells(mut self, x: u32, y: u32) -> Result<Self> {
        if x == 0 || y == 0 {
            return Err(CellMapError::InvalidConfig(format!(
                "cell count must be positive, got {}x{}",
                x, y
            )));
        }
        self.cells = UVec2::new(x, y);
        Ok(self)
    }

    /// Fraction of each slot the points may occupy, in `(0, 1]`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a fraction is outside `(0, 1]`.
    pub fn with_coverage(mut self, x: f64, y: f64) -> Result<Self> {
        let valid = |v: f64| v > 0.0 && v <= 1.0;
        if !valid(x) || !valid(y) {
            return Err(CellMapError::InvalidConfig(format!(
                "cell coverage must be in (0, 1], got ({}, {})",
                x, y
            )));
        }
        self.coverage = DVec2::new(x, y);
        Ok(self)
    }

    pub fn cells(&self) -> UVec2 {
        self.cells
    }
}

impl PointsGenerator for BlueNoisePointsGenerator {
    fn generate(&self, rng: &mut dyn RngCore) -> Vec<DVec2> {
        let amount = rng.gen_range(self.amount.clone());
        let cells = self.cells.as_dvec2();
        let gap = (DVec2::ONE - self.coverage) / cells;
        let cell_size = self.coverage / cells;
        let columns = self.cells.x as usize;

        let slots = pick_slots((self.cells.x * self.cells.y) as usize, amount, rng);
        let mut points = Vec::with_capacity(slots.len());
        for slot in slots {
            let cell = DVec2::new((slot % columns) as f64, (slot / columns) as f64);
            let jitter = DVec2::new(rng.gen(), rng.gen());
            points.push(cell * (cell_size + gap) + gap * 0.5 + jitter * cell_size);
        }
        points
    }

    fn min_points(&self) -> usize {
        (*self.amount.start()).min((self.cells.x * self.cells.y) as usize)
    }
}

/// Scales the points of another generator and drops those that leave the
/// unit square
///
/// A zoom of `(1.1, 1.1)` keeps roughly `1 / 1.21` of the backing points and
/// spreads them slightly further apart.
#[derive(Debug, Clone)]
pub struct ZoomPointsGenerator<G> {
    backing: G,
    zoom: DVec2,
}

impl<G: PointsGenerator> ZoomPointsGenerator<G> {
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a zoom component is not positive and finite.
    pub fn new(backing: G, zoom: DVec2) -> Result<Self> {
        if !(zoom.is_finite() && zoom.x > 0.0 && zoom.y > 0.0) {
            return Err(CellMapError::InvalidConfig(format!(
                "zoom factor must be positive, got {}",
                zoom
            )));
        }
        Ok(Self { backing, zoom })
    }
}

impl<G: PointsGenerator> PointsGenerator for ZoomPointsGenerator<G> {
    fn generate(&self, rng: &mut dyn RngCore) -> Vec<DVec2> {
        self.backing
            .generate(rng)
            .into_iter()
            .map(|p| p * self.zoom)
            .filter(|p| p.x >= 0.0 && p.x < 1.0 && p.y >= 0.0 && p.y < 1.0)
            .collect()
    }

    /// Expected share of the backing minimum that stays inside the square
    fn min_points(&self) -> usize {
        let kept = 1.0 / (self.zoom.x * self.zoom.y).max(1.0);
        (self.backing.min_points() as f64 * kept) as usize
    }
}
