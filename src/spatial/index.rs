use crate::core::geo::Point;

use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// A projected point that can be indexed via an R-tree
#[derive(Debug, Clone)]
pub struct SpatialItem<T> {
    pub id: String,
    pub point: Point,
    pub data: T,
}

impl<T> SpatialItem<T> {
    pub fn new(id: String, point: Point, data: T) -> Self {
        Self { id, point, data }
    }
}

impl<T> PartialEq for SpatialItem<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

// --- rstar integration -------------------------------------------------------------------------

impl<T> RTreeObject for SpatialItem<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.point.x, self.point.y])
    }
}

impl<T> PointDistance for SpatialItem<T> {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point.x - point[0];
        let dy = self.point.y - point[1];
        dx * dx + dy * dy
    }
}

/// R-tree over pixel-space points, rebuilt per zoom level
pub struct SpatialIndex<T> {
    rtree: RTree<SpatialItem<T>>,
}

impl<T> SpatialIndex<T> {
    pub fn new() -> Self {
        Self {
            rtree: RTree::new(),
        }
    }

    /// Builds a balanced tree in one pass
    pub fn bulk_load(items: Vec<SpatialItem<T>>) -> Self {
        Self {
            rtree: RTree::bulk_load(items),
        }
    }

    pub fn insert(&mut self, item: SpatialItem<T>) {
        self.rtree.insert(item);
    }

    /// Items within `radius` pixels of `center` (inclusive)
    pub fn query_radius(&self, center: &Point, radius: f64) -> Vec<&SpatialItem<T>> {
        // rstar takes the squared radius
        self.rtree
            .locate_within_distance([center.x, center.y], radius * radius)
            .collect()
    }

    /// Number of items within `radius` pixels of `center`
    pub fn count_within(&self, center: &Point, radius: f64) -> usize {
        self.rtree
            .locate_within_distance([center.x, center.y], radius * radius)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn clear(&mut self) {
        self.rtree = RTree::new();
    }
}

impl<T> Default for SpatialIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_radius_uses_pixel_distance() {
        let index = SpatialIndex::bulk_load(vec![
            SpatialItem::new("a".into(), Point::new(0.0, 0.0), 0),
            SpatialItem::new("b".into(), Point::new(30.0, 40.0), 1),
            SpatialItem::new("c".into(), Point::new(100.0, 0.0), 2),
        ]);

        let mut hits: Vec<usize> = index
            .query_radius(&Point::new(0.0, 0.0), 50.0)
            .into_iter()
            .map(|item| item.data)
            .collect();
        hits.sort_unstable();
        assert_eq!(hits, vec![0, 1]);
        assert_eq!(index.count_within(&Point::new(0.0, 0.0), 49.9), 1);
    }

    #[test]
    fn test_insert_and_clear() {
        let mut index = SpatialIndex::new();
        assert!(index.is_empty());
        index.insert(SpatialItem::new("a".into(), Point::new(1.0, 1.0), ()));
        assert_eq!(index.len(), 1);
        index.clear();
        assert!(index.is_empty());
    }
}
