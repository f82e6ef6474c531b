//! Fixed-rate waypoint updater node
pub mod publisher;

use self::publisher::LanePublisher;
use crate::common::{Header, Lane};
use crate::control::StopProfileGenerator;
use crate::error::{Result, WaypointError};
use crate::lifecycle::{LifecycleNode, LifecycleNodeBase, State};
use crate::params::UpdaterParams;
use crate::perception::Observations;
use log::{info, trace, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::MissedTickBehavior;

/// Stops a running updater loop at its next iteration
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    running: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Publishes the lookahead lane ahead of the vehicle on every tick
pub struct WaypointUpdater {
    base: LifecycleNodeBase,
    params: UpdaterParams,
    observations: Arc<Observations>,
    stop_profile: StopProfileGenerator,
    running: Arc<AtomicBool>,
    seq: u64,
}

impl WaypointUpdater {
    /// Create an updater with default parameters reading from `observations`
    pub fn new(observations: Arc<Observations>) -> Self {
        Self::with_params(UpdaterParams::default(), observations)
    }

    pub fn with_params(params: UpdaterParams, observations: Arc<Observations>) -> Self {
        WaypointUpdater {
            base: LifecycleNodeBase::new("waypoint_updater"),
            stop_profile: StopProfileGenerator::new(&params),
            params,
            observations,
            running: Arc::new(AtomicBool::new(false)),
            seq: 0,
        }
    }

    /// Override parameters by name. Resets any braking in progress.
    pub fn configure(&mut self, params: &HashMap<String, f64>) -> Result<()> {
        self.params.configure(params)?;
        self.stop_profile = StopProfileGenerator::new(&self.params);
        Ok(())
    }

    pub fn params(&self) -> &UpdaterParams {
        &self.params
    }

    pub fn state(&self) -> State {
        self.base.state()
    }

    pub fn is_braking(&self) -> bool {
        self.stop_profile.is_braking()
    }

    /// Handle used to stop `run` from another task
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            running: Arc::clone(&self.running),
        }
    }

    /// Index of the first route waypoint ahead of the latest pose
    pub fn closest_waypoint_idx(&self) -> Result<usize> {
        let route = self
            .observations
            .route()
            .ok_or(WaypointError::NotReady("global route"))?;
        let inputs = self
            .observations
            .snapshot()
            .ok_or(WaypointError::NotReady("vehicle pose"))?;
        Ok(route.closest_waypoint_idx(&inputs.pose))
    }

    /// Build the lane for the current tick.
    ///
    /// Returns `None` until both a pose and the global route have arrived.
    pub fn generate_lane(&mut self) -> Option<Lane> {
        let route = self.observations.route()?;
        let inputs = self.observations.snapshot()?;

        let closest_idx = route.closest_waypoint_idx(&inputs.pose);
        let window = route.window(closest_idx, self.params.lookahead_wps);
        let waypoints = self.stop_profile.apply(
            window,
            route.waypoints(),
            closest_idx,
            inputs.stop_line,
            inputs.current_velocity,
        );

        self.seq += 1;
        trace!(
            "Lane {}: {} waypoints from index {}",
            self.seq,
            waypoints.len(),
            closest_idx
        );

        Some(Lane {
            header: Header {
                seq: self.seq,
                frame_id: route.header().frame_id.clone(),
            },
            waypoints,
        })
    }

    /// Run the control loop at the configured rate until shut down.
    ///
    /// Returns the number of lanes the publisher accepted; lanes rejected by
    /// a closed transport are logged and not counted.
    pub async fn run<P: LanePublisher>(&mut self, publisher: &P) -> u64 {
        if self.state() != State::Active {
            warn!("{} is not active, not starting loop", self.base.name);
            return 0;
        }

        let mut interval = tokio::time::interval(self.params.period());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "{} running at {} Hz with {} lookahead waypoints",
            self.base.name, self.params.rate_hz, self.params.lookahead_wps
        );

        let mut published = 0;
        while self.running.load(Ordering::Acquire) {
            interval.tick().await;

            if let Some(lane) = self.generate_lane() {
                match publisher.publish(&lane) {
                    Ok(()) => published += 1,
                    Err(e) => warn!("Failed to publish final waypoints: {}", e),
                }
            }
        }

        info!("{} loop stopped after {} lanes", self.base.name, published);
        published
    }
}

impl LifecycleNode for WaypointUpdater {
    fn on_configure(&mut self) -> Result<()> {
        self.base.transition(&[State::Unconfigured, State::Inactive], State::Inactive)?;
        info!("Configured waypoint updater");
        self.stop_profile = StopProfileGenerator::new(&self.params);
        Ok(())
    }

    fn on_activate(&mut self) -> Result<()> {
        self.base.transition(&[State::Inactive], State::Active)?;
        info!("Activated waypoint updater");
        self.running.store(true, Ordering::Release);
        Ok(())
    }

    fn on_deactivate(&mut self) -> Result<()> {
        self.running.store(false, Ordering::Release);
        self.base.transition(&[State::Active, State::Inactive], State::Inactive)?;
        info!("Deactivated waypoint updater");
        Ok(())
    }

    fn on_cleanup(&mut self) -> Result<()> {
        self.base.transition(&[State::Inactive], State::Unconfigured)?;
        info!("Cleaned up waypoint updater");
        self.stop_profile.reset();
        self.seq = 0;
        Ok(())
    }

    fn on_shutdown(&mut self) -> Result<()> {
        self.running.store(false, Ordering::Release);
        self.base.transition(
            &[State::Unconfigured, State::Inactive, State::Active],
            State::Finalized,
        )?;
        info!("Waypoint updater finalized");
        Ok(())
    }
}

impl Drop for WaypointUpdater {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Pose, Waypoint};
    use crate::updater::publisher::ChannelPublisher;
    use std::sync::Mutex;

    fn route_lane(n: usize) -> Lane {
        Lane::new(
            "world",
            (0..n)
                .map(|i| Waypoint::new(Pose::from_position(i as f64, 0.0, 0.0), 10.0))
                .collect(),
        )
    }

    /// Collects lanes and stops the loop after `limit` of them
    struct Collector {
        lanes: Mutex<Vec<Lane>>,
        limit: usize,
        shutdown: ShutdownHandle,
    }

    impl LanePublisher for Collector {
        fn publish(&self, lane: &Lane) -> Result<()> {
            let mut lanes = self.lanes.lock().unwrap();
            lanes.push(lane.clone());
            if lanes.len() >= self.limit {
                self.shutdown.shutdown();
            }
            Ok(())
        }
    }

    #[test]
    fn no_lane_until_pose_and_route() {
        let obs = Arc::new(Observations::new());
        let mut updater = WaypointUpdater::new(Arc::clone(&obs));
        assert!(updater.generate_lane().is_none());
        assert!(matches!(
            updater.closest_waypoint_idx(),
            Err(WaypointError::NotReady("global route"))
        ));

        obs.waypoints_callback(route_lane(200));
        assert!(updater.generate_lane().is_none());

        obs.pose_callback(Pose::from_position(50.0, 0.0, 0.0));
        let lane = updater.generate_lane().unwrap();
        assert_eq!(lane.len(), 100);
        assert_eq!(lane.header.frame_id, "world");
        assert_eq!(lane.header.seq, 1);
        assert_eq!(updater.closest_waypoint_idx().unwrap(), 50);
    }

    #[test]
    fn braking_state_follows_stop_line() {
        let obs = Arc::new(Observations::new());
        let mut updater = WaypointUpdater::new(Arc::clone(&obs));
        obs.waypoints_callback(route_lane(200));
        obs.pose_callback(Pose::from_position(50.0, 0.0, 0.0));
        obs.velocity_callback(3.0);
        obs.traffic_callback(70);

        let lane = updater.generate_lane().unwrap();
        assert!(updater.is_braking());
        assert_eq!(lane.waypoints[16].velocity(), 0.0);

        obs.traffic_callback(-1);
        let lane = updater.generate_lane().unwrap();
        assert!(!updater.is_braking());
        assert!(lane.waypoints.iter().all(|wp| wp.velocity() == 10.0));
    }

    #[test]
    fn activation_requires_configuration() {
        let mut updater = WaypointUpdater::new(Arc::new(Observations::new()));
        assert!(updater.on_activate().is_err());
        updater.on_configure().unwrap();
        updater.on_activate().unwrap();
        assert_eq!(updater.state(), State::Active);
        assert!(updater.shutdown_handle().is_running());
        updater.on_deactivate().unwrap();
        assert!(!updater.shutdown_handle().is_running());
    }

    #[test]
    fn shutdown_finalizes_and_blocks_reconfiguration() {
        let mut updater = WaypointUpdater::new(Arc::new(Observations::new()));
        updater.on_configure().unwrap();
        updater.on_activate().unwrap();
        updater.on_shutdown().unwrap();
        assert_eq!(updater.state(), State::Finalized);
        assert!(!updater.shutdown_handle().is_running());
        assert!(matches!(
            updater.on_configure(),
            Err(WaypointError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn configure_rejects_invalid_values() {
        let mut updater = WaypointUpdater::new(Arc::new(Observations::new()));
        let params = HashMap::from([("max_decel".to_string(), -1.0)]);
        assert!(updater.configure(&params).is_err());

        let params = HashMap::from([("lookahead_wps".to_string(), 20.0)]);
        updater.configure(&params).unwrap();
        assert_eq!(updater.params().lookahead_wps, 20);
    }

    #[tokio::test]
    async fn inactive_updater_does_not_loop() {
        let mut updater = WaypointUpdater::new(Arc::new(Observations::new()));
        let collector = Collector {
            lanes: Mutex::new(Vec::new()),
            limit: 1,
            shutdown: updater.shutdown_handle(),
        };
        assert_eq!(updater.run(&collector).await, 0);
    }

    #[tokio::test]
    async fn closed_transport_is_not_counted_as_published() {
        let obs = Arc::new(Observations::new());
        obs.waypoints_callback(route_lane(200));
        obs.pose_callback(Pose::from_position(10.0, 0.0, 0.0));

        let params = UpdaterParams {
            rate_hz: 200.0,
            ..UpdaterParams::default()
        };
        let mut updater = WaypointUpdater::with_params(params, Arc::clone(&obs));
        updater.on_configure().unwrap();
        updater.on_activate().unwrap();

        let (publisher, rx) = ChannelPublisher::channel();
        drop(rx);
        let shutdown = updater.shutdown_handle();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            shutdown.shutdown();
        });

        assert_eq!(updater.run(&publisher).await, 0);
    }

    #[tokio::test]
    async fn slow_consumer_receives_latest_lane() {
        let obs = Arc::new(Observations::new());
        obs.waypoints_callback(route_lane(200));
        obs.pose_callback(Pose::from_position(10.0, 0.0, 0.0));

        let params = UpdaterParams {
            rate_hz: 200.0,
            ..UpdaterParams::default()
        };
        let mut updater = WaypointUpdater::with_params(params, Arc::clone(&obs));
        updater.on_configure().unwrap();
        updater.on_activate().unwrap();

        let (publisher, mut rx) = ChannelPublisher::channel();
        let shutdown = updater.shutdown_handle();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            shutdown.shutdown();
        });

        let published = updater.run(&publisher).await;
        assert!(published > 1);
        let latest = rx.borrow_and_update().clone().unwrap();
        assert_eq!(latest.header.seq, published);
    }

    #[tokio::test]
    async fn loop_publishes_until_shutdown() {
        let obs = Arc::new(Observations::new());
        obs.waypoints_callback(route_lane(200));
        obs.pose_callback(Pose::from_position(120.0, 0.0, 0.0));

        let params = UpdaterParams {
            rate_hz: 200.0,
            ..UpdaterParams::default()
        };
        let mut updater = WaypointUpdater::with_params(params, Arc::clone(&obs));
        updater.on_configure().unwrap();
        updater.on_activate().unwrap();

        let collector = Collector {
            lanes: Mutex::new(Vec::new()),
            limit: 5,
            shutdown: updater.shutdown_handle(),
        };
        let published = updater.run(&collector).await;

        let lanes = collector.lanes.lock().unwrap();
        assert_eq!(published, 5);
        assert_eq!(lanes.len(), 5);
        assert_eq!(
            lanes.iter().map(|l| l.header.seq).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
        // Near the end of the route the window is clipped.
        assert!(lanes.iter().all(|l| l.len() == 80));
    }
}
