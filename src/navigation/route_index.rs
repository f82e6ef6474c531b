//! Spatial index over the planar positions of the global route

use crate::common::types::Point2D;
use crate::common::Waypoint;
use crate::error::{Result, WaypointError};
use rstar::primitives::GeomWithData;
use rstar::RTree;

type IndexedPoint = GeomWithData<Point2D, usize>;

/// R-Tree over route waypoints for O(log n) nearest-waypoint queries
///
/// Built once from the full route and never mutated afterwards.
pub struct RouteIndex {
    tree: RTree<IndexedPoint>,
    points: Vec<Point2D>,
}

impl RouteIndex {
    /// Build the index from the x/y coordinates of every waypoint
    pub fn build(waypoints: &[Waypoint]) -> Result<Self> {
        if waypoints.is_empty() {
            return Err(WaypointError::EmptyRoute);
        }

        let points: Vec<Point2D> = waypoints
            .iter()
            .map(|wp| [wp.pose.position.x, wp.pose.position.y])
            .collect();
        let entries = points
            .iter()
            .enumerate()
            .map(|(idx, point)| GeomWithData::new(*point, idx))
            .collect();

        Ok(RouteIndex {
            tree: RTree::bulk_load(entries),
            points,
        })
    }

    /// Index of the waypoint closest to `query`
    pub fn nearest(&self, query: Point2D) -> usize {
        // The tree is never empty, see `build`.
        self.tree
            .nearest_neighbor(&query)
            .map_or(0, |entry| entry.data)
    }

    /// Planar position of waypoint `idx`
    pub fn point(&self, idx: usize) -> Point2D {
        self.points[idx]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
