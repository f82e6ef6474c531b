//! Tuning parameters for lookahead generation and stop-line deceleration

use crate::error::{Result, WaypointError};
use std::collections::HashMap;
use std::time::Duration;

/// Upper bound for waypoint counts taken from configuration
pub const MAX_WAYPOINT_COUNT: usize = 100_000;
/// Upper bound for the control loop frequency
pub const MAX_RATE_HZ: f64 = 1000.0;

fn finite(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(WaypointError::InvalidParameter(format!(
            "{} must be a finite number, got {}",
            name, value
        )))
    }
}

fn waypoint_count(name: &str, value: f64, min: f64) -> Result<usize> {
    let value = finite(name, value)?;
    if value < min || value > MAX_WAYPOINT_COUNT as f64 {
        return Err(WaypointError::InvalidParameter(format!(
            "{} must be between {} and {}",
            name, min, MAX_WAYPOINT_COUNT
        )));
    }
    Ok(value as usize)
}

/// Parameters of the waypoint updater
#[derive(Debug, Clone, PartialEq)]
pub struct UpdaterParams {
    /// Number of waypoints published ahead of the vehicle
    pub lookahead_wps: usize,
    /// Slope of the speed-vs-remaining-distance ramp
    pub max_decel: f64,
    /// Below this time to the stop line, braking is not started
    pub min_stop_time: f64,
    /// Waypoints kept between the stopping point and the stop line so the
    /// front of the car, not its center, halts at the line
    pub stop_backoff: usize,
    /// Ramp speeds under this value are commanded as a full stop
    pub stop_velocity_threshold: f64,
    /// Lower bound on the measured speed used for time-to-stop
    pub min_velocity: f64,
    /// Control loop frequency
    pub rate_hz: f64,
}

impl Default for UpdaterParams {
    fn default() -> Self {
        UpdaterParams {
            lookahead_wps: 100,
            max_decel: 0.28,
            min_stop_time: 3.0,
            stop_backoff: 4,
            stop_velocity_threshold: 1.0,
            min_velocity: 0.1,
            rate_hz: 15.0,
        }
    }
}

impl UpdaterParams {
    /// Override parameters from a name/value map, rejecting out-of-range values
    pub fn configure(&mut self, params: &HashMap<String, f64>) -> Result<()> {
        if let Some(&lookahead) = params.get("lookahead_wps") {
            self.lookahead_wps = waypoint_count("lookahead_wps", lookahead, 1.0)?;
        }

        if let Some(&max_decel) = params.get("max_decel") {
            let max_decel = finite("max_decel", max_decel)?;
            if max_decel <= 0.0 {
                return Err(WaypointError::InvalidParameter(
                    "Max deceleration must be positive".to_string(),
                ));
            }
            self.max_decel = max_decel;
        }

        if let Some(&min_stop_time) = params.get("min_stop_time") {
            let min_stop_time = finite("min_stop_time", min_stop_time)?;
            if min_stop_time < 0.0 {
                return Err(WaypointError::InvalidParameter(
                    "Minimum stop time must be non-negative".to_string(),
                ));
            }
            self.min_stop_time = min_stop_time;
        }

        if let Some(&backoff) = params.get("stop_backoff") {
            self.stop_backoff = waypoint_count("stop_backoff", backoff, 0.0)?;
        }

        if let Some(&threshold) = params.get("stop_velocity_threshold") {
            let threshold = finite("stop_velocity_threshold", threshold)?;
            if threshold < 0.0 {
                return Err(WaypointError::InvalidParameter(
                    "Stop velocity threshold must be non-negative".to_string(),
                ));
            }
            self.stop_velocity_threshold = threshold;
        }

        if let Some(&min_velocity) = params.get("min_velocity") {
            let min_velocity = finite("min_velocity", min_velocity)?;
            if min_velocity <= 0.0 {
                return Err(WaypointError::InvalidParameter(
                    "Minimum velocity must be positive".to_string(),
                ));
            }
            self.min_velocity = min_velocity;
        }

        if let Some(&rate) = params.get("rate_hz") {
            let rate = finite("rate_hz", rate)?;
            if rate <= 0.0 || rate > MAX_RATE_HZ {
                return Err(WaypointError::InvalidParameter(format!(
                    "Loop rate must be in (0, {}] Hz",
                    MAX_RATE_HZ
                )));
            }
            self.rate_hz = rate;
        }

        Ok(())
    }

    /// Duration of one control tick
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.rate_hz)
    }
}
