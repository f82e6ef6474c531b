//! Perception module: latest observations delivered by upstream producers
//!
//! Every input is a single slot overwritten by its producer. The control
//! loop reads whatever value is present at tick time; nothing is queued.

use crate::common::{Lane, Pose, StopLine};
use crate::navigation::Route;
use log::{info, trace, warn};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

/// Snapshot of the inputs needed for one control tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInputs {
    pub pose: Pose,
    pub current_velocity: f64,
    pub stop_line: StopLine,
}

#[derive(Debug, Default)]
struct Latest {
    pose: Option<Pose>,
    current_velocity: f64,
    stop_line: StopLine,
    obstacle: Option<i32>,
}

/// Shared store of the most recent pose, speed, stop line and route
#[derive(Default)]
pub struct Observations {
    latest: Mutex<Latest>,
    route: OnceLock<Arc<Route>>,
}

impl Observations {
    pub fn new() -> Self {
        Observations::default()
    }

    fn lock(&self) -> MutexGuard<'_, Latest> {
        // Slots hold plain values, a panicked writer cannot leave them torn.
        self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Latest vehicle pose
    pub fn pose_callback(&self, pose: Pose) {
        self.lock().pose = Some(pose);
    }

    /// Latest measured forward speed
    pub fn velocity_callback(&self, linear_velocity: f64) {
        self.lock().current_velocity = linear_velocity;
    }

    /// Latest stop-line waypoint, negative when no red light is ahead
    pub fn traffic_callback(&self, stopline_wp_idx: i32) {
        let stop_line = StopLine::from_raw(stopline_wp_idx);
        let mut latest = self.lock();
        if latest.stop_line != stop_line {
            trace!("Stop line changed: {:?} -> {:?}", latest.stop_line, stop_line);
        }
        latest.stop_line = stop_line;
    }

    /// Obstacle waypoint index. Recorded but not yet used for planning.
    pub fn obstacle_callback(&self, obstacle_wp_idx: i32) {
        trace!("Obstacle waypoint {} received", obstacle_wp_idx);
        self.lock().obstacle = Some(obstacle_wp_idx);
    }

    /// Accept the global route. Only the first non-empty route is kept;
    /// returns whether this lane was accepted.
    pub fn waypoints_callback(&self, lane: Lane) -> bool {
        if self.route.get().is_some() {
            trace!("Global route already set, ignoring update");
            return false;
        }

        let route = match Route::new(lane) {
            Ok(route) => Arc::new(route),
            Err(e) => {
                warn!("Rejected global route: {}", e);
                return false;
            }
        };

        let accepted = self.route.set(route).is_ok();
        if accepted {
            info!("Global route received, no longer listening for route updates");
        }
        accepted
    }

    /// The global route, once received
    pub fn route(&self) -> Option<Arc<Route>> {
        self.route.get().cloned()
    }

    /// Last obstacle waypoint reported upstream
    pub fn obstacle(&self) -> Option<i32> {
        self.lock().obstacle
    }

    /// Inputs for a control tick, or `None` until a pose has been received
    pub fn snapshot(&self) -> Option<TickInputs> {
        let latest = self.lock();
        latest.pose.map(|pose| TickInputs {
            pose,
            current_velocity: latest.current_velocity,
            stop_line: latest.stop_line,
        })
    }
}
