//! # Planning manager module
//!
//! Runs one planning cycle per telemetry frame: the behaviour controller picks the lane and
//! reference speed, then the trajectory synthesiser builds the points to send back. The
//! [`PlanningContext`](crate::behav_ctrl::PlanningContext) is only updated once the whole cycle
//! has succeeded.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::sim::TelemetryError;
use serde::{Deserialize, Serialize};
use util::{archive::ArchiveError, params::LoadError};

pub use state::*;

use crate::{behav_ctrl, occupancy::OccupancyParams, traj_gen};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the planning manager, one section per submodule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub behav: behav_ctrl::Params,

    pub occupancy: OccupancyParams,

    pub traj: traj_gen::Params,
}

/// Status of one planning cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CycleReport {
    /// A vehicle ahead in the ego lane forced braking
    pub too_close: bool,

    pub lane_changed: bool,

    /// Target lane after this cycle
    pub lane: usize,

    /// Reference speed after this cycle.
    ///
    /// Units: miles/hour
    pub reference_speed: f64,

    pub num_reused_points: usize,

    pub num_new_points: usize,
}

/// Archived planning state, one row per successful cycle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ContextRecord {
    pub cycle: u64,
    pub lane: usize,
    pub reference_speed: f64,
    pub too_close: bool,
    pub lane_changed: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which abort a planning cycle. The planning context is unchanged when one is returned.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("Invalid telemetry: {0}")]
    InvalidTelemetry(TelemetryError),

    #[error("Degenerate trajectory geometry: {0}")]
    DegenerateGeometry(traj_gen::SplineError),
}

/// Errors which can occur while initialising the planning manager.
#[derive(Debug, thiserror::Error)]
pub enum PlanMgrInitError {
    #[error("Could not load the planning manager parameters: {0}")]
    ParamLoadError(LoadError),

    #[error("Could not create the planning manager archive: {0}")]
    ArchiveError(ArchiveError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl From<traj_gen::TrajGenError> for CycleError {
    fn from(e: traj_gen::TrajGenError) -> Self {
        match e {
            traj_gen::TrajGenError::DegenerateGeometry(e) => CycleError::DegenerateGeometry(e),
        }
    }
}
