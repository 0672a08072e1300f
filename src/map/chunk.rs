//! Chunk coordinates and chunk snapshots

use glam::{DVec2, IVec2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

use super::entity::CellId;

/// Chunk coordinate
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
    pub x: i32,
    pub y: i32,
}

impl ChunkPos {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk containing a world position
    pub fn containing(position: DVec2, chunk_size: IVec2) -> Self {
        let c = (position / chunk_size.as_dvec2()).floor();
        Self::new(c.x as i32, c.y as i32)
    }

    /// World-space rectangle covered by this chunk
    pub fn rect(self, chunk_size: IVec2) -> Rect {
        let size = chunk_size.as_dvec2();
        Rect::from_origin_size(DVec2::new(self.x as f64, self.y as f64) * size, size)
    }

    /// All chunks overlapping `rect`, row by row
    pub fn covering(rect: &Rect, chunk_size: IVec2) -> impl Iterator<Item = ChunkPos> {
        let size = chunk_size.as_dvec2();
        let min = (rect.min / size).floor();
        // Half-open: a rect ending exactly on a chunk border does not reach it
        let max = (rect.max / size).ceil() - DVec2::ONE;
        let (x0, y0, x1, y1) = (min.x as i32, min.y as i32, max.x as i32, max.y as i32);
        (y0..=y1).flat_map(move |y| (x0..=x1).map(move |x| ChunkPos::new(x, y)))
    }
}

/// Snapshot of one chunk: the cells overlapping it and a per-tile lookup table
///
/// Tiles are `1 × 1` world units. The table is sampled at tile centers, so it
/// answers lookups without testing polygons again.
#[derive(Debug, Clone, PartialEq)]
pub struct CellMapChunk {
    pos: ChunkPos,
    size: IVec2,
    cells: Vec<CellId>,
    tiles: Vec<Option<CellId>>,
}

impl CellMapChunk {
    pub(crate) fn new(pos: ChunkPos, size: IVec2, cells: Vec<CellId>, tiles: Vec<Option<CellId>>) -> Self {
        debug_assert_eq!(tiles.len(), (size.x * size.y) as usize);
        Self {
            pos,
            size,
            cells,
            tiles,
        }
    }

    #[inline]
    pub fn pos(&self) -> ChunkPos {
        self.pos
    }

    #[inline]
    pub fn size(&self) -> IVec2 {
        self.size
    }

    /// Cells overlapping the chunk, in registration order
    #[inline]
    pub fn cells(&self) -> &[CellId] {
        &self.cells
    }

    /// Cell covering a tile, in chunk-local tile coordinates
    ///
    /// Returns `None` for coordinates outside the chunk.
    pub fn cell_at_local(&self, x: i32, y: i32) -> Option<CellId> {
        if x < 0 || y < 0 || x >= self.size.x || y >= self.size.y {
            return None;
        }
        self.tiles[(y * self.size.x + x) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_containing() {
        let size = IVec2::new(16, 16);
        assert_eq!(ChunkPos::containing(DVec2::new(0.0, 15.99), size), ChunkPos::new(0, 0));
        assert_eq!(ChunkPos::containing(DVec2::new(16.0, 0.0), size), ChunkPos::new(1, 0));
        assert_eq!(ChunkPos::containing(DVec2::new(-0.5, -16.0), size), ChunkPos::new(-1, -1));
        assert_eq!(ChunkPos::containing(DVec2::new(-16.5, 0.0), size), ChunkPos::new(-2, 0));
    }

    #[test]
    fn test_rect() {
        let rect = ChunkPos::new(-1, 2).rect(IVec2::new(16, 8));
        assert_eq!(rect.min, DVec2::new(-16.0, 16.0));
        assert_eq!(rect.max, DVec2::new(0.0, 24.0));
    }

    #[test]
    fn test_covering() {
        let size = IVec2::new(16, 16);
        let rect = Rect::new(DVec2::new(0.0, 0.0), DVec2::new(32.0, 16.0));
        let chunks: Vec<ChunkPos> = ChunkPos::covering(&rect, size).collect();
        assert_eq!(chunks, vec![ChunkPos::new(0, 0), ChunkPos::new(1, 0)]);

        let rect = Rect::new(DVec2::new(-1.0, 5.0), DVec2::new(1.0, 6.0));
        let chunks: Vec<ChunkPos> = ChunkPos::covering(&rect, size).collect();
        assert_eq!(chunks, vec![ChunkPos::new(-1, 0), ChunkPos::new(0, 0)]);
    }

    #[test]
    fn test_cell_at_local() {
        let size = IVec2::new(2, 2);
        let tiles = vec![Some(CellId(1)), Some(CellId(2)), None, Some(CellId(1))];
        let chunk = CellMapChunk::new(ChunkPos::new(0, 0), size, vec![CellId(1), CellId(2)], tiles);

        assert_eq!(chunk.cell_at_local(1, 0), Some(CellId(2)));
        assert_eq!(chunk.cell_at_local(0, 1), None);
        assert_eq!(chunk.cell_at_local(1, 1), Some(CellId(1)));
        assert_eq!(chunk.cell_at_local(2, 0), None);
        assert_eq!(chunk.cell_at_local(-1, 0), None);
    }
}
