//! Spatial indexing for nearest-cell lookups
//!
//! This module is only available with the `spatial-index` feature. Point
//! lookups scan the polygons of a chunk first; the index answers the
//! remaining queries (points in slivers between polygons, or outside every
//! polygon of the chunk) with the nearest cell center.

use glam::DVec2;
use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;

use crate::map::CellId;

/// KD-tree over the centers of one section's cells
///
/// # Performance
///
/// - Construction: O(n log n), built once when a section is assembled
/// - Query: O(log n)
pub struct SpatialIndex {
    tree: ImmutableKdTree<f64, usize, 2, 32>,
    ids: Vec<CellId>,
}

impl SpatialIndex {
    /// Build spatial index from cell centers
    ///
    /// Returns `None` for an empty set of centers.
    ///
    /// # Example
    ///
    /// ```
    /// use voronoi_cellmap::map::CellId;
    /// use voronoi_cellmap::spatial::SpatialIndex;
    /// use glam::DVec2;
    ///
    /// let centers = [
    ///     (CellId(3), DVec2::new(0.0, 0.0)),
    ///     (CellId(7), DVec2::new(10.0, 0.0)),
    /// ];
    /// let index = SpatialIndex::new(&centers).unwrap();
    /// assert_eq!(index.find_nearest(DVec2::new(8.0, 1.0)).0, CellId(7));
    /// ```
    pub fn new(centers: &[(CellId, DVec2)]) -> Option<Self> {
        if centers.is_empty() {
            return None;
        }

        let points: Vec<[f64; 2]> = centers.iter().map(|(_, c)| [c.x, c.y]).collect();
        Some(Self {
            tree: ImmutableKdTree::new_from_slice(&points),
            ids: centers.iter().map(|(id, _)| *id).collect(),
        })
    }

    /// Nearest cell to `position`, with the squared distance to its center
    pub fn find_nearest(&self, position: DVec2) -> (CellId, f64) {
        let result = self.tree.nearest_one::<SquaredEuclidean>(&[position.x, position.y]);
        (self.ids[result.item], result.distance)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spatial_index_basic() {
        let centers = vec![
            (CellId(10), DVec2::new(1.0, 0.0)),
            (CellId(11), DVec2::new(0.0, 1.0)),
            (CellId(12), DVec2::new(-1.0, 0.0)),
            (CellId(13), DVec2::new(0.0, -1.0)),
        ];

        let index = SpatialIndex::new(&centers).unwrap();
        assert_eq!(index.len(), 4);

        assert_eq!(index.find_nearest(DVec2::new(0.9, 0.1)).0, CellId(10));
        assert_eq!(index.find_nearest(DVec2::new(0.0, 0.95)).0, CellId(11));
        assert_eq!(index.find_nearest(DVec2::new(-0.8, 0.0)).0, CellId(12));
        assert_eq!(index.find_nearest(DVec2::new(0.1, -3.0)).0, CellId(13));
    }

    #[test]
    fn test_spatial_index_exact_match() {
        let centers = vec![(CellId(1), DVec2::new(10.0, 0.0)), (CellId(2), DVec2::new(0.0, 10.0))];
        let index = SpatialIndex::new(&centers).unwrap();

        let (id, distance) = index.find_nearest(centers[0].1);
        assert_eq!(id, CellId(1));
        assert_eq!(distance, 0.0);

        let (id, distance) = index.find_nearest(DVec2::new(0.0, 7.0));
        assert_eq!(id, CellId(2));
        assert!((distance - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_index() {
        assert!(SpatialIndex::new(&[]).is_none());
    }
}
