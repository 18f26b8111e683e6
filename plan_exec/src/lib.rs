//! # Planner library.
//!
//! This library allows other crates in the workspace, and the planner's own binaries and benches,
//! to access items defined inside the planner crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Behaviour control - picks the target lane and reference speed
pub mod behav_ctrl;

/// Cycle worker - runs planning cycles one at a time on a dedicated thread
pub mod cycle_worker;

/// Ego vehicle state derived from telemetry
pub mod ego;

/// Lane occupancy checks
pub mod occupancy;

/// Executable parameters
pub mod params;

/// Planning manager - runs one full planning cycle per telemetry frame
pub mod plan_mgr;

/// Planning server - receives telemetry from and sends trajectories to the simulator bridge
pub mod plan_server;

/// Roadway geometry
pub mod road;

/// Trajectory generation
pub mod traj_gen;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Conversion factor from meters/second to miles/hour, as used by the simulator.
pub const MPH_PER_MPS: f64 = 2.24;
