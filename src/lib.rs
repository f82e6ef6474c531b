//! Lookahead waypoint generation for an autonomous vehicle.
//!
//! On every control tick the [`WaypointUpdater`] finds the first route
//! waypoint ahead of the vehicle, slices a fixed-size window of the global
//! route from there, and reshapes its speeds into a stopping ramp when a red
//! light's stop line is within reach.
pub mod common;
pub mod control;
pub mod error;
pub mod lifecycle;
pub mod navigation;
pub mod params;
pub mod perception;
pub mod updater;

pub use crate::common::{Header, Lane, Pose, StopLine, Waypoint};
pub use crate::error::{Result, WaypointError};
pub use crate::params::UpdaterParams;
pub use crate::perception::Observations;
pub use crate::updater::publisher::{ChannelPublisher, LanePublisher};
pub use crate::updater::{ShutdownHandle, WaypointUpdater};
