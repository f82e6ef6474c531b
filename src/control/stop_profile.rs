//! Speed profile shaping for an upcoming stop line

use crate::common::{StopLine, Waypoint};
use crate::navigation::distance::distance;
use crate::params::UpdaterParams;
use log::{debug, info};

/// Rewrites the lookahead window into a deceleration ramp when a stop line
/// is within the horizon.
///
/// Once a ramp has been emitted the generator stays in the braking state
/// until the stop line disappears or leaves the lookahead window, even if
/// the time-to-stop estimate would no longer start braking on its own.
#[derive(Debug, Clone)]
pub struct StopProfileGenerator {
    lookahead_wps: usize,
    max_decel: f64,
    min_stop_time: f64,
    stop_backoff: usize,
    stop_velocity_threshold: f64,
    min_velocity: f64,
    is_braking: bool,
}

impl StopProfileGenerator {
    pub fn new(params: &UpdaterParams) -> Self {
        StopProfileGenerator {
            lookahead_wps: params.lookahead_wps,
            max_decel: params.max_decel,
            min_stop_time: params.min_stop_time,
            stop_backoff: params.stop_backoff,
            stop_velocity_threshold: params.stop_velocity_threshold,
            min_velocity: params.min_velocity,
            is_braking: false,
        }
    }

    /// Whether the last emitted window was a deceleration ramp
    pub fn is_braking(&self) -> bool {
        self.is_braking
    }

    /// Forget any braking in progress
    pub fn reset(&mut self) {
        self.is_braking = false;
    }

    /// Produce the speed profile for `window`, which starts at route index
    /// `closest_idx`.
    ///
    /// `route` is the full global route, used to measure the distance from the
    /// vehicle to the stop line. `current_velocity` is the latest measured
    /// forward speed.
    pub fn apply(
        &mut self,
        window: &[Waypoint],
        route: &[Waypoint],
        closest_idx: usize,
        stop_line: StopLine,
        current_velocity: f64,
    ) -> Vec<Waypoint> {
        let farthest_idx = closest_idx.saturating_add(self.lookahead_wps);

        let stopline_idx = match stop_line.index() {
            Some(idx) if idx < farthest_idx => idx,
            _ => {
                if self.is_braking {
                    info!("Stop line cleared, resuming route speeds");
                }
                self.is_braking = false;
                return window.to_vec();
            }
        };

        // Division below, keep the speed away from zero.
        let velocity = current_velocity.max(self.min_velocity);
        let time_to_stop = distance(route, closest_idx, stopline_idx) / velocity;

        if time_to_stop < self.min_stop_time && !self.is_braking {
            debug!(
                "Stop line at waypoint {} is {:.2}s away, too close to brake smoothly",
                stopline_idx, time_to_stop
            );
            return window.to_vec();
        }

        if !self.is_braking {
            info!(
                "Braking for stop line at waypoint {} ({:.2}s away)",
                stopline_idx, time_to_stop
            );
        }
        self.is_braking = true;
        self.decelerate(window, closest_idx, stopline_idx)
    }

    fn decelerate(
        &self,
        window: &[Waypoint],
        closest_idx: usize,
        stopline_idx: usize,
    ) -> Vec<Waypoint> {
        // Stop a few waypoints short so the front of the car is at the line.
        let stop_idx =
            stopline_idx.saturating_sub(closest_idx.saturating_add(self.stop_backoff));

        window
            .iter()
            .enumerate()
            .map(|(i, wp)| {
                let dist = distance(window, i, stop_idx);
                let mut vel = self.max_decel * dist;
                if vel < self.stop_velocity_threshold {
                    vel = 0.0;
                }
                Waypoint::new(wp.pose, vel.min(wp.velocity()))
            })
            .collect()
    }
}
