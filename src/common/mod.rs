//! Common message types shared by the navigation and control stacks

use nalgebra::{Point3, UnitQuaternion, Vector2};

/// Common type aliases used across the codebase
pub mod types {
    /// A 2D point used for planar queries
    pub type Point2D = [f64; 2];
}

/// Position and orientation of the vehicle or of a route point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Point3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl Pose {
    /// Create a pose with the given position and identity orientation
    pub fn from_position(x: f64, y: f64, z: f64) -> Self {
        Pose {
            position: Point3::new(x, y, z),
            orientation: UnitQuaternion::identity(),
        }
    }

    /// Create a planar pose heading along `yaw`
    pub fn from_xy_yaw(x: f64, y: f64, yaw: f64) -> Self {
        Pose {
            position: Point3::new(x, y, 0.0),
            orientation: UnitQuaternion::from_euler_angles(0.0, 0.0, yaw),
        }
    }

    /// Heading around the z axis
    pub fn yaw(&self) -> f64 {
        self.orientation.euler_angles().2
    }

    /// Projection onto the ground plane
    pub fn xy(&self) -> Vector2<f64> {
        Vector2::new(self.position.x, self.position.y)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Pose::from_position(0.0, 0.0, 0.0)
    }
}

/// A single point of the global route with its target speed
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Waypoint {
    pub pose: Pose,
    pub linear_velocity: f64,
}

impl Waypoint {
    pub fn new(pose: Pose, linear_velocity: f64) -> Self {
        Waypoint {
            pose,
            linear_velocity,
        }
    }

    /// Target speed at this point
    pub fn velocity(&self) -> f64 {
        self.linear_velocity
    }

    pub fn set_velocity(&mut self, velocity: f64) {
        self.linear_velocity = velocity;
    }
}

/// Metadata attached to every lane
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Header {
    pub seq: u64,
    pub frame_id: String,
}

/// An ordered sequence of waypoints, used both for the global route and
/// for the lookahead window sent to the controller
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Lane {
    pub header: Header,
    pub waypoints: Vec<Waypoint>,
}

impl Lane {
    pub fn new(frame_id: &str, waypoints: Vec<Waypoint>) -> Self {
        Lane {
            header: Header {
                seq: 0,
                frame_id: frame_id.to_string(),
            },
            waypoints,
        }
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

/// Route index of the stop line the vehicle must halt at, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopLine {
    #[default]
    Inactive,
    At(usize),
}

impl StopLine {
    /// Decode the raw index published upstream, where any negative value
    /// means there is no red light ahead
    pub fn from_raw(raw: i32) -> Self {
        usize::try_from(raw).map_or(StopLine::Inactive, StopLine::At)
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            StopLine::Inactive => None,
            StopLine::At(idx) => Some(*idx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn negative_raw_stop_line_is_inactive() {
        assert_eq!(StopLine::from_raw(-1), StopLine::Inactive);
        assert_eq!(StopLine::from_raw(-42), StopLine::Inactive);
        assert_eq!(StopLine::from_raw(0), StopLine::At(0));
        assert_eq!(StopLine::from_raw(292).index(), Some(292));
    }

    #[test]
    fn pose_yaw_round_trips_through_quaternion() {
        let pose = Pose::from_xy_yaw(1.0, 2.0, 0.75);
        assert_relative_eq!(pose.yaw(), 0.75, epsilon = 1e-12);
        assert_relative_eq!(pose.xy().x, 1.0);
    }

    #[test]
    fn waypoint_velocity_accessors() {
        let mut wp = Waypoint::new(Pose::default(), 11.1);
        wp.set_velocity(4.0);
        assert_relative_eq!(wp.velocity(), 4.0);
    }
}
