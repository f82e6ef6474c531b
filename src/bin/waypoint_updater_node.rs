use anyhow::{Context, Result};
use log::info;
use std::f64::consts::{FRAC_PI_2, TAU};
use std::sync::Arc;
use std::time::{Duration, Instant};
use waypoint_core::lifecycle::LifecycleNode;
use waypoint_core::navigation::Route;
use waypoint_core::{
    ChannelPublisher, Lane, Observations, Pose, ShutdownHandle, Waypoint, WaypointUpdater,
};

const ROUTE_RADIUS: f64 = 100.0;
const ROUTE_WAYPOINTS: usize = 600;
const CRUISE_SPEED: f64 = 11.1;
const MAX_ACCEL: f64 = 1.5;
const TRAFFIC_LIGHTS: [usize; 2] = [150, 450];
const RED_DURATION: Duration = Duration::from_secs(6);
const LIGHT_CYCLE: Duration = Duration::from_secs(16);

fn loop_route() -> Lane {
    let waypoints = (0..ROUTE_WAYPOINTS)
        .map(|i| {
            let theta = i as f64 / ROUTE_WAYPOINTS as f64 * TAU;
            let pose = Pose::from_xy_yaw(
                ROUTE_RADIUS * theta.cos(),
                ROUTE_RADIUS * theta.sin(),
                theta + FRAC_PI_2,
            );
            Waypoint::new(pose, CRUISE_SPEED)
        })
        .collect();
    Lane::new("world", waypoints)
}

/// Point-mass vehicle driving the loop route at the commanded speed
struct SimulatedVehicle {
    arc_length: f64,
    speed: f64,
}

impl SimulatedVehicle {
    fn step(&mut self, target_speed: f64, dt: f64) -> Pose {
        let dv = (target_speed - self.speed).clamp(-MAX_ACCEL * dt, MAX_ACCEL * dt);
        self.speed = (self.speed + dv).max(0.0);
        self.arc_length += self.speed * dt;

        let theta = self.arc_length / ROUTE_RADIUS;
        Pose::from_xy_yaw(
            ROUTE_RADIUS * theta.cos(),
            ROUTE_RADIUS * theta.sin(),
            theta + FRAC_PI_2,
        )
    }
}

/// Cycle the traffic lights and report the stop line of the next red one
async fn traffic_light_producer(
    observations: Arc<Observations>,
    route: Arc<Route>,
    shutdown: ShutdownHandle,
) {
    let start = Instant::now();
    let mut interval = tokio::time::interval(Duration::from_millis(100));

    while shutdown.is_running() {
        interval.tick().await;
        let Some(inputs) = observations.snapshot() else {
            continue;
        };

        let closest = route.closest_waypoint_idx(&inputs.pose);
        let next_light = TRAFFIC_LIGHTS
            .iter()
            .copied()
            .find(|&idx| idx >= closest)
            .unwrap_or(TRAFFIC_LIGHTS[0]);

        let phase = start.elapsed().as_secs_f64() % LIGHT_CYCLE.as_secs_f64();
        let is_red = phase < RED_DURATION.as_secs_f64();
        let stopline_wp_idx = if is_red { next_light as i32 } else { -1 };
        observations.traffic_callback(stopline_wp_idx);
        observations.obstacle_callback(-1);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let max_lanes: Option<u64> = std::env::args()
        .nth(1)
        .map(|arg| arg.parse())
        .transpose()
        .context("lane count must be a positive integer")?;

    info!("Initializing Waypoint Updater Node...");

    let observations = Arc::new(Observations::new());
    let mut vehicle = SimulatedVehicle {
        arc_length: 0.0,
        speed: 0.0,
    };
    observations.pose_callback(vehicle.step(0.0, 0.0));
    observations.velocity_callback(vehicle.speed);
    observations.waypoints_callback(loop_route());
    // A second delivery is ignored, the route is static for the run.
    observations.waypoints_callback(loop_route());
    let route = observations
        .route()
        .context("simulated route was rejected")?;

    let mut updater = WaypointUpdater::new(Arc::clone(&observations));
    updater.on_configure()?;
    updater.on_activate()?;
    let shutdown = updater.shutdown_handle();

    let ctrl_c_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            ctrl_c_shutdown.shutdown();
        }
    });

    tokio::spawn(traffic_light_producer(
        Arc::clone(&observations),
        route,
        shutdown.clone(),
    ));

    let (publisher, mut final_waypoints) = ChannelPublisher::channel();
    let vehicle_obs = Arc::clone(&observations);
    let vehicle_shutdown = shutdown.clone();
    let controller = tokio::spawn(async move {
        let mut received = 0u64;
        let mut last_lane = Instant::now();
        while final_waypoints.changed().await.is_ok() {
            let Some(lane) = final_waypoints.borrow_and_update().clone() else {
                continue;
            };
            received += 1;
            let dt = last_lane.elapsed().as_secs_f64();
            last_lane = Instant::now();
            let target = lane.waypoints.first().map_or(0.0, Waypoint::velocity);
            let pose = vehicle.step(target, dt);
            vehicle_obs.pose_callback(pose);
            vehicle_obs.velocity_callback(vehicle.speed);

            if received % 15 == 0 {
                info!(
                    "Lane {}: {} waypoints, target {:.2} m/s, speed {:.2} m/s",
                    lane.header.seq,
                    lane.len(),
                    target,
                    vehicle.speed
                );
            }
            if max_lanes.is_some_and(|max| received >= max) {
                vehicle_shutdown.shutdown();
            }
        }
        received
    });

    info!("Waypoint Updater Node initialized. Publishing final waypoints...");
    let published = updater.run(&publisher).await;
    updater.on_deactivate()?;
    updater.on_cleanup()?;
    updater.on_shutdown()?;
    drop(publisher);

    let received = controller.await.context("controller task panicked")?;
    info!(
        "Published {} lanes, controller consumed {}",
        published, received
    );
    Ok(())
}
