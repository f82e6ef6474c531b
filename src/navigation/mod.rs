//! Navigation module: the global route and lookahead window extraction
pub mod distance;
pub mod resolver;
pub mod route_index;
pub mod window;

use self::resolver::PositionResolver;
use self::route_index::RouteIndex;
use crate::common::{Header, Lane, Pose, Waypoint};
use crate::error::Result;
use log::info;

/// The static global route together with its spatial index
pub struct Route {
    header: Header,
    waypoints: Vec<Waypoint>,
    index: RouteIndex,
}

impl Route {
    /// Take ownership of the base lane and build its spatial index
    pub fn new(lane: Lane) -> Result<Self> {
        let index = RouteIndex::build(&lane.waypoints)?;
        info!(
            "Built route index over {} waypoints (frame '{}')",
            lane.waypoints.len(),
            lane.header.frame_id
        );

        Ok(Route {
            header: lane.header,
            waypoints: lane.waypoints,
            index,
        })
    }

    /// Index of the first waypoint ahead of `pose`
    pub fn closest_waypoint_idx(&self, pose: &Pose) -> usize {
        PositionResolver::new(&self.index).resolve(pose)
    }

    /// Up to `size` waypoints starting at `start`
    pub fn window(&self, start: usize, size: usize) -> &[Waypoint] {
        window::extract(&self.waypoints, start, size)
    }

    /// Arc length along the route between two waypoint indices
    pub fn distance(&self, from: usize, to: usize) -> f64 {
        distance::distance(&self.waypoints, from, to)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WaypointError;
    use approx::assert_relative_eq;

    #[test]
    fn route_rejects_empty_lane() {
        assert!(matches!(
            Route::new(Lane::new("world", Vec::new())),
            Err(WaypointError::EmptyRoute)
        ));
    }

    #[test]
    fn route_resolves_and_slices() {
        let wps = (0..200)
            .map(|i| Waypoint::new(Pose::from_position(i as f64, 0.0, 0.0), 10.0))
            .collect();
        let route = Route::new(Lane::new("world", wps)).unwrap();

        let closest = route.closest_waypoint_idx(&Pose::from_position(50.0, 0.0, 0.0));
        assert_eq!(closest, 50);
        assert_eq!(route.window(closest, 100).len(), 100);
        assert_relative_eq!(route.distance(50, 70), 20.0);
        assert_eq!(route.header().frame_id, "world");
    }
}
