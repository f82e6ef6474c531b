//! Locate the first route waypoint the vehicle has not yet passed

use super::route_index::RouteIndex;
use crate::common::Pose;
use nalgebra::Vector2;

/// Resolves the vehicle position to the waypoint immediately ahead of it
pub struct PositionResolver<'a> {
    index: &'a RouteIndex,
}

impl<'a> PositionResolver<'a> {
    pub fn new(index: &'a RouteIndex) -> Self {
        PositionResolver { index }
    }

    /// Index of the closest waypoint that is not behind the vehicle.
    ///
    /// The nearest waypoint `c` is kept unless the vehicle lies past the
    /// plane through `c` perpendicular to the segment `c-1 -> c`, in which
    /// case `c + 1` is returned. Index arithmetic wraps around the route.
    pub fn resolve(&self, pose: &Pose) -> usize {
        let len = self.index.len();
        let position = pose.xy();
        let closest = self.index.nearest([position.x, position.y]);
        let prev = (closest + len - 1) % len;

        let closest_vec = Vector2::from(self.index.point(closest));
        let prev_vec = Vector2::from(self.index.point(prev));

        let val = (closest_vec - prev_vec).dot(&(position - closest_vec));
        if val > 0.0 {
            (closest + 1) % len
        } else {
            closest
        }
    }
}
