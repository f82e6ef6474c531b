//! Arc length along a waypoint sequence

use crate::common::Waypoint;

/// Cumulative 3D distance walking the waypoints from `from` to `to`, both inclusive.
///
/// Returns 0 when `to <= from`. An end index past the sequence is clamped to
/// the last waypoint, so a short window near the end of the route measures up
/// to its final point.
pub fn distance(waypoints: &[Waypoint], from: usize, to: usize) -> f64 {
    let Some(last) = waypoints.len().checked_sub(1) else {
        return 0.0;
    };
    let to = to.min(last);
    if to <= from {
        return 0.0;
    }

    waypoints[from..=to]
        .windows(2)
        .map(|pair| (pair[1].pose.position - pair[0].pose.position).norm())
        .sum()
}
