//! Fixed-size lookahead slice of the global route

use crate::common::Waypoint;

/// Waypoints `start..start + size`, clipped at the end of the route.
///
/// The route is a finite path here: a window near the end is shorter than
/// `size` rather than continuing from the first waypoint.
pub fn extract(route: &[Waypoint], start: usize, size: usize) -> &[Waypoint] {
    let start = start.min(route.len());
    let end = start.saturating_add(size).min(route.len());
    &route[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Pose;

    fn route(n: usize) -> Vec<Waypoint> {
        (0..n)
            .map(|i| Waypoint::new(Pose::from_position(i as f64, 0.0, 0.0), i as f64))
            .collect()
    }

    #[test]
    fn full_window_inside_route() {
        let wps = route(200);
        let window = extract(&wps, 50, 100);
        assert_eq!(window.len(), 100);
        assert_eq!(window[0], wps[50]);
        assert_eq!(window[99], wps[149]);
    }

    #[test]
    fn window_is_clipped_at_route_end() {
        let wps = route(200);
        let window = extract(&wps, 150, 100);
        assert_eq!(window.len(), 50);
        assert_eq!(window.last(), wps.last());
    }

    #[test]
    fn window_exactly_reaching_route_end() {
        let wps = route(200);
        assert_eq!(extract(&wps, 100, 100).len(), 100);
        assert_eq!(extract(&wps, 199, 100).len(), 1);
    }

    #[test]
    fn start_beyond_route_is_empty() {
        let wps = route(10);
        assert!(extract(&wps, 10, 5).is_empty());
        assert!(extract(&wps, 25, 5).is_empty());
    }
}
