//! Main planner executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Wait for a message from the simulator bridge
//!         - For telemetry, run one planning cycle on the cycle worker and send the trajectory
//!         - For manual driving, acknowledge with no trajectory
//!         - For anything which fails, reply with an empty frame and wait for the next one
//!
//! # Modules
//!
//! All cyclic modules (e.g. `plan_mgr`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use std::path::PathBuf;
use structopt::StructOpt;

// Internal
use comms_if::{
    net::{zmq, NetParams},
    sim::{SimMessage, SimResponse},
};
use plan_lib::{
    cycle_worker::CycleWorker,
    params::PlanExecParams,
    plan_mgr::PlanMgr,
    plan_server::PlanServer,
    road::RoadwayModel,
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "plan_exec", about = "Highway motion planner")]
struct Opts {
    /// Roadway map file, overrides the one in plan_exec.toml
    #[structopt(long, parse(from_os_str))]
    map: Option<PathBuf>,

    /// Length of one lap of the track in meters, overrides the one in plan_exec.toml
    #[structopt(long)]
    track_length: Option<f64>,

    /// Endpoint to bind the planning server to, overrides the one in net.toml
    #[structopt(long)]
    endpoint: Option<String>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("plan_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Highway Planner Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opts);

    // ---- LOAD PARAMETERS ----

    let exec_params: PlanExecParams =
        util::params::load("plan_exec.toml").wrap_err("Could not load exec params")?;
    let mut net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;

    if let Some(endpoint) = opts.endpoint {
        net_params.plan_endpoint = endpoint;
    }

    info!("Exec parameters loaded");

    // ---- LOAD ROADWAY ----

    let map_path = match opts.map {
        Some(p) => p,
        None => PathBuf::from(&exec_params.map_file),
    };
    let map_path = match map_path.is_relative() {
        true => host::get_sw_root()
            .wrap_err("Failed to get the software root")?
            .join(map_path),
        false => map_path,
    };
    let track_length = opts.track_length.unwrap_or(exec_params.track_length_m);

    let road = RoadwayModel::from_file(&map_path, track_length)
        .wrap_err_with(|| format!("Failed to load the roadway map from {:?}", map_path))?;

    // ---- INITIALISE MODULES ----

    let mut plan_mgr = PlanMgr::new(road, Default::default());
    plan_mgr
        .init("plan_mgr.toml", &session)
        .wrap_err("Failed to initialise PlanMgr")?;

    let worker = CycleWorker::new(plan_mgr).wrap_err("Failed to start the cycle worker")?;

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    let zmq_ctx = zmq::Context::new();

    let server =
        PlanServer::new(&zmq_ctx, &net_params).wrap_err("Failed to start the planning server")?;

    info!("Listening on {}\n", net_params.plan_endpoint);

    // ---- MAIN LOOP ----

    let mut was_connected = false;

    loop {
        if server.is_connected() != was_connected {
            was_connected = server.is_connected();
            match was_connected {
                true => info!("Client connected"),
                false => info!("Client disconnected"),
            }
        }

        let msg = match server.get_message() {
            Ok(Some(m)) => m,
            Ok(None) => continue,
            Err(e) => {
                warn!("Could not get a message from the client: {}", e);
                continue;
            }
        };

        let response = match msg {
            Ok(SimMessage::Telemetry(telem)) => match worker.run_cycle(telem)? {
                Ok((traj, report)) => {
                    debug!("Cycle report: {:?}", report);
                    Some(SimResponse::Control(traj.to_control_msg()))
                }
                Err(e) => {
                    warn!("Planning cycle skipped: {}", e);
                    None
                }
            },
            Ok(SimMessage::Manual) => Some(SimResponse::Manual),
            // Already logged by the server
            Err(_) => None,
        };

        let send_result = match response {
            Some(r) => server.send_response(&r),
            None => server.send_no_response(),
        };
        if let Err(e) = send_result {
            warn!("Could not send the response: {}", e);
        }
    }
}
