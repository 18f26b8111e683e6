//! # Closed Loop Test
//!
//! This binary allows the planner to be run without requiring the simulator. A vehicle drives a
//! synthetic circular three lane track, consuming a fixed number of trajectory points per cycle,
//! while constant speed traffic occupies the lanes. The planner's invariants are checked on every
//! cycle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use comms_if::sim::Telemetry;
use log::{debug, info};
use std::path::PathBuf;
use structopt::StructOpt;

use plan_lib::{
    behav_ctrl::PlanningContext,
    plan_mgr::{Params, PlanMgr},
    road::{lane_centre_d, lane_of, RoadwayModel, NUM_LANES},
    MPH_PER_MPS,
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "loop_test", about = "Run the planner against a simulated vehicle")]
struct Opts {
    /// Number of planning cycles to run
    #[structopt(short, long, default_value = "3000")]
    cycles: u64,

    /// Number of trajectory points the vehicle drives each cycle
    #[structopt(long, default_value = "5")]
    consume: usize,

    /// Radius of the track centreline in meters
    #[structopt(long, default_value = "1000")]
    radius: f64,

    /// Number of other vehicles on the track
    #[structopt(long, default_value = "8")]
    traffic: usize,

    /// Planning manager parameter file, defaults are used if not given
    #[structopt(long, parse(from_os_str))]
    params: Option<PathBuf>,
}

/// A constant speed vehicle holding its lane.
struct TrafficCar {
    id: usize,
    s: f64,
    lane: usize,

    /// Units: meters/second
    speed: f64,
}

/// The simulated ego vehicle, which drives along the points it is given.
struct EgoVehicle {
    pos: (f64, f64),
    yaw: f64,

    /// Units: meters/second
    speed: f64,

    /// Points sent by the planner not yet driven
    path: Vec<(f64, f64)>,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Use the software root if there is one, otherwise keep the session out of the way
    let session = match host::get_sw_root() {
        Ok(_) => Session::new("loop_test", "sessions"),
        Err(_) => Session::in_dir("loop_test", std::env::temp_dir().join("hwy_plan_sessions")),
    }
    .wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Info, &session).wrap_err("Failed to initialise logging")?;

    info!("Closed Loop Test\n");
    info!("Session directory: {:?}", session.session_root);
    info!("Options: {:?}\n", opts);

    // ---- BUILD WORLD ----

    let road = RoadwayModel::circle((0.0, opts.radius + lane_centre_d(1)), opts.radius, 3600)
        .wrap_err("Failed to build the track")?;
    let track_length = road.track_length();

    let mut traffic: Vec<TrafficCar> = (0..opts.traffic)
        .map(|i| TrafficCar {
            id: i,
            s: 60.0 + track_length * (i as f64) / (opts.traffic.max(1) as f64),
            lane: i % NUM_LANES,
            speed: 14.0 + 1.5 * (i % 4) as f64,
        })
        .collect();

    let mut ego = EgoVehicle {
        pos: road.locate(0.0, lane_centre_d(1)),
        yaw: 0.0,
        speed: 0.0,
        path: Vec::new(),
    };

    let params: Params = match opts.params {
        Some(ref path) => util::params::load_path(path)
            .wrap_err_with(|| format!("Failed to load parameters from {:?}", path))?,
        None => Params::default(),
    };

    let mut plan_mgr = PlanMgr::new(road, params);
    let dt = plan_mgr.params().traj.point_dt_s;
    let horizon = plan_mgr.params().traj.horizon_length;
    let speed_limit = plan_mgr.params().behav.speed_limit_mph;

    // ---- MAIN LOOP ----

    let mut num_lane_changes = 0u64;
    let mut num_too_close = 0u64;
    let mut min_gap_m = std::f64::INFINITY;

    for cycle in 0..opts.cycles {
        let telem = build_telemetry(&ego, &traffic, plan_mgr.road());
        let prev_ctx: PlanningContext = *plan_mgr.context();

        let (traj, report) = plan_mgr
            .proc(&telem)
            .wrap_err_with(|| format!("Planning cycle {} failed", cycle))?;

        // ---- CHECK INVARIANTS ----

        if traj.len() != horizon {
            return Err(eyre!(
                "Cycle {}: trajectory has {} points, expected {}",
                cycle,
                traj.len(),
                horizon
            ));
        }
        if traj.points[..ego.path.len()] != ego.path[..] {
            return Err(eyre!("Cycle {}: prior trajectory not preserved", cycle));
        }
        if report.lane >= NUM_LANES || (report.lane as i64 - prev_ctx.lane as i64).abs() > 1 {
            return Err(eyre!(
                "Cycle {}: invalid lane transition {} -> {}",
                cycle,
                prev_ctx.lane,
                report.lane
            ));
        }
        if !(0.0..=speed_limit).contains(&report.reference_speed) {
            return Err(eyre!(
                "Cycle {}: reference speed {} out of bounds",
                cycle,
                report.reference_speed
            ));
        }

        if report.lane_changed {
            num_lane_changes += 1;
            debug!(
                "Cycle {}: lane {} -> {} at {:.2} mph",
                cycle, prev_ctx.lane, report.lane, report.reference_speed
            );
        }
        if report.too_close {
            num_too_close += 1;
        }

        // ---- ADVANCE THE WORLD ----

        drive(&mut ego, traj.points, opts.consume, dt);

        let (ego_s, ego_d) = plan_mgr.road().to_frenet(ego.pos.0, ego.pos.1);
        for car in traffic.iter_mut() {
            car.s = plan_mgr
                .road()
                .wrap_s(car.s + car.speed * dt * opts.consume as f64);

            // Track how close we get to anything in our lane
            if lane_of(ego_d) == Some(car.lane) {
                let mut gap = (car.s - ego_s).abs();
                gap = gap.min(track_length - gap);
                min_gap_m = min_gap_m.min(gap);
            }
        }

        if cycle % 500 == 0 {
            info!(
                "Cycle {}: s = {:.1} m, lane {}, {:.2} mph",
                cycle, ego_s, report.lane, report.reference_speed
            );
        }
    }

    info!("Completed {} cycles", opts.cycles);
    info!("    Lane changes: {}", num_lane_changes);
    info!("    Cycles too close: {}", num_too_close);
    info!("    Smallest same lane gap: {:.2} m", min_gap_m);
    info!("    Final context: {:?}", plan_mgr.context());

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build the telemetry frame the simulator would send for the current world state.
fn build_telemetry(ego: &EgoVehicle, traffic: &[TrafficCar], road: &RoadwayModel) -> Telemetry {
    let (s, d) = road.to_frenet(ego.pos.0, ego.pos.1);
    let (end_path_s, end_path_d) = match ego.path.last() {
        Some(p) => road.to_frenet(p.0, p.1),
        None => (0.0, 0.0),
    };

    let sensor_fusion = traffic
        .iter()
        .map(|car| {
            let d = lane_centre_d(car.lane);
            let (x, y) = road.locate(car.s, d);
            let (x_ahead, y_ahead) = road.locate(car.s + 1.0, d);
            let heading = (y_ahead - y).atan2(x_ahead - x);

            [
                car.id as f64,
                x,
                y,
                car.speed * heading.cos(),
                car.speed * heading.sin(),
                car.s,
                d,
            ]
        })
        .collect();

    Telemetry {
        x: ego.pos.0,
        y: ego.pos.1,
        s,
        d,
        yaw: ego.yaw.to_degrees(),
        speed: ego.speed * MPH_PER_MPS,
        previous_path_x: ego.path.iter().map(|p| p.0).collect(),
        previous_path_y: ego.path.iter().map(|p| p.1).collect(),
        end_path_s,
        end_path_d,
        sensor_fusion,
    }
}

/// Drive the first `consume` points of the trajectory, keeping the rest as the vehicle's path.
fn drive(ego: &mut EgoVehicle, mut points: Vec<(f64, f64)>, consume: usize, dt: f64) {
    let consume = consume.min(points.len());
    let remaining = points.split_off(consume);

    for p in points {
        let (dx, dy) = (p.0 - ego.pos.0, p.1 - ego.pos.1);
        let dist = dx.hypot(dy);

        if dist > 1e-9 {
            ego.yaw = dy.atan2(dx);
        }
        ego.speed = dist / dt;
        ego.pos = p;
    }

    ego.path = remaining;
}
