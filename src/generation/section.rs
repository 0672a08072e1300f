//! Section tiling
//!
//! The plane is divided into fixed-size sections. Each section draws its seed
//! points from a random source that only depends on the section coordinate
//! and the map seed, so a section always produces the same cells no matter
//! which query caused it to be generated.

use glam::{DVec2, IVec2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace, warn};

use crate::error::{CellMapError, Result};
use crate::geometry::Rect;

use super::points::PointsGenerator;
use super::voronoi::{CellPolygon, CellPolygonGenerator};

/// Smallest fraction of the section size on every side whose neighbor points
/// take part in the triangulation of a section
pub const SECTION_MARGIN: f64 = 0.25;

/// Largest neighbor margin
///
/// With at least one point per section, no empty circle is wider than
/// `2·√2` sections, which bounds every cell touching a section well within
/// this margin.
pub const MAX_SECTION_MARGIN: f64 = 4.5;

/// Point spacings the initial margin reaches into neighbor sections
const MARGIN_SPACINGS: f64 = 2.0;

/// Relative area a section may miss before its margin counts as too narrow
const COVERAGE_TOLERANCE: f64 = 1e-6;

/// Section coordinate
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionPos {
    pub x: i32,
    pub y: i32,
}

impl SectionPos {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The section plus its eight neighbors, row by row
    pub fn with_neighbors(self) -> impl Iterator<Item = SectionPos> {
        self.within(1)
    }

    /// Every section at most `rings` sections away on both axes, row by row
    pub fn within(self, rings: i32) -> impl Iterator<Item = SectionPos> {
        (-rings..=rings).flat_map(move |dy| (-rings..=rings).map(move |dx| SectionPos::new(self.x + dx, self.y + dy)))
    }
}

impl From<IVec2> for SectionPos {
    fn from(v: IVec2) -> Self {
        Self::new(v.x, v.y)
    }
}

/// Seed of the random source of one section
pub fn section_seed(seed: u64, section: SectionPos) -> u64 {
    (section.x as i64)
        .wrapping_mul(341_873_128_712)
        .wrapping_add((section.y as i64).wrapping_mul(132_897_987_541)) as u64
        ^ seed
}

/// Generates the cell polygons owned by a section
pub struct SectionPolygonGenerator {
    seed: u64,
    extent: DVec2,
    margin: f64,
    points: Box<dyn PointsGenerator>,
    polygons: Box<dyn CellPolygonGenerator>,
}

impl SectionPolygonGenerator {
    /// # Arguments
    ///
    /// * `seed` - Map seed
    /// * `extent` - Size of a section in world units
    /// * `points` - Seed points per section, in the unit square
    /// * `polygons` - Turns the collected points into cells
    pub fn new(
        seed: u64,
        extent: DVec2,
        points: Box<dyn PointsGenerator>,
        polygons: Box<dyn CellPolygonGenerator>,
    ) -> Self {
        let margin = match points.min_points() {
            0 => SECTION_MARGIN,
            n => (MARGIN_SPACINGS / (n as f64).sqrt()).clamp(SECTION_MARGIN, MAX_SECTION_MARGIN),
        };
        Self {
            seed,
            extent,
            margin,
            points,
            polygons,
        }
    }

    #[inline]
    pub fn extent(&self) -> DVec2 {
        self.extent
    }

    /// Initial neighbor margin, as a fraction of the section size
    ///
    /// Two expected point spacings, at least [`SECTION_MARGIN`]; just
    /// [`SECTION_MARGIN`] when the points generator gives no minimum.
    #[inline]
    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// World-space rectangle covered by a section
    pub fn section_rect(&self, section: SectionPos) -> Rect {
        let origin = DVec2::new(section.x as f64, section.y as f64) * self.extent;
        Rect::from_origin_size(origin, self.extent)
    }

    /// Section containing a world position
    pub fn section_at(&self, position: DVec2) -> SectionPos {
        let s = (position / self.extent).floor();
        SectionPos::new(s.x as i32, s.y as i32)
    }

    /// World-space seed points of one section
    pub fn section_points(&self, section: SectionPos) -> Vec<DVec2> {
        let mut rng = ChaCha8Rng::seed_from_u64(section_seed(self.seed, section));
        let origin = DVec2::new(section.x as f64, section.y as f64);
        self.points
            .generate(&mut rng)
            .into_iter()
            .map(|p| (origin + p) * self.extent)
            .collect()
    }

    /// Points of `section` plus the neighbor points inside `context`
    fn context_points(&self, section: SectionPos, margin: f64, context: &Rect) -> Vec<DVec2> {
        let mut points = Vec::new();
        for neighbor in section.within(margin.ceil() as i32) {
            let generated = self.section_points(neighbor);
            if neighbor == section {
                points.extend(generated);
            } else {
                points.extend(generated.into_iter().filter(|p| context.contains(*p)));
            }
        }
        points
    }

    /// Generate the polygons whose center lies inside `section`
    ///
    /// The triangulation also includes the neighbor points within the
    /// margin. A cell is kept only if its support lies inside the margin, so
    /// it equals the cell of the unbounded point set and whatever the
    /// neighbor sections compute. While the kept cells do not cover the
    /// whole section the margin doubles, up to [`MAX_SECTION_MARGIN`].
    ///
    /// # Errors
    ///
    /// Returns `GenerationFailed` if the collected points cannot be
    /// triangulated even with the widest margin.
    pub fn generate(&self, section: SectionPos) -> Result<Vec<CellPolygon>> {
        let rect = self.section_rect(section);
        let mut margin = self.margin;

        loop {
            let context = rect.expand(DVec2::splat(margin));
            let points = self.context_points(section, margin, &context);
            let widest = margin >= MAX_SECTION_MARGIN;

            let polygons = match self.polygons.generate(&points) {
                Ok(polygons) => polygons,
                Err(e) if widest => {
                    return Err(CellMapError::GenerationFailed {
                        section: (section.x, section.y),
                        reason: e.to_string(),
                    })
                }
                Err(e) => {
                    trace!(section_x = section.x, section_y = section.y, margin, error = %e, "widening margin");
                    margin = (margin * 2.0).min(MAX_SECTION_MARGIN);
                    continue;
                }
            };

            let settled: Vec<CellPolygon> = polygons
                .into_iter()
                .filter(|p| context.contains_rect(&p.support))
                .collect();
            let covered: f64 = settled.iter().map(|p| p.polygon.clip_to_rect(&rect).area()).sum();
            let complete = covered >= rect.area() * (1.0 - COVERAGE_TOLERANCE);

            if !complete && !widest {
                trace!(section_x = section.x, section_y = section.y, margin, covered, "widening margin");
                margin = (margin * 2.0).min(MAX_SECTION_MARGIN);
                continue;
            }
            if !complete {
                warn!(
                    section_x = section.x,
                    section_y = section.y,
                    covered,
                    area = rect.area(),
                    "section cells leave gaps"
                );
            }

            let owned: Vec<CellPolygon> = settled.into_iter().filter(|p| rect.contains(p.center)).collect();
            debug!(
                section_x = section.x,
                section_y = section.y,
                points = points.len(),
                margin,
                cells = owned.len(),
                "generated section polygons"
            );
            return Ok(owned);
        }
    }
}
