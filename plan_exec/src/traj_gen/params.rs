//! Parameters structure for TrajGen

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default number of points in every emitted trajectory.
pub const DEFAULT_HORIZON_LENGTH: usize = 50;

/// Default time between consecutive trajectory points.
///
/// Units: seconds
pub const DEFAULT_POINT_DT_S: f64 = 0.02;

/// Default forward distance over which the point spacing is computed.
///
/// Units: meters
pub const DEFAULT_LOOKAHEAD_M: f64 = 30.0;

/// Default road distance to the first forward anchor when staying in lane.
///
/// Units: meters
pub const DEFAULT_NEAR_ANCHOR_M: f64 = 30.0;

/// Default road distance to the first forward anchor while changing lane.
///
/// Units: meters
pub const DEFAULT_NEAR_ANCHOR_LANE_CHANGE_M: f64 = 45.0;

/// Default road distances to the remaining forward anchors.
///
/// Units: meters
pub const DEFAULT_FAR_ANCHORS_M: [f64; 2] = [60.0, 90.0];

/// Default distance behind the ego vehicle of the synthesised seed point.
///
/// Units: meters
pub const DEFAULT_SEED_BACK_DISTANCE_M: f64 = 1.0;

/// Default lowest speed used to space new points.
///
/// Units: miles/hour
pub const DEFAULT_MIN_FILL_SPEED_MPH: f64 = 0.1;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the trajectory synthesiser.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub horizon_length: usize,

    /// Units: seconds
    pub point_dt_s: f64,

    /// Units: meters
    pub lookahead_m: f64,

    /// Units: meters
    pub near_anchor_m: f64,

    /// Units: meters
    pub near_anchor_lane_change_m: f64,

    /// Units: meters
    pub far_anchors_m: [f64; 2],

    /// Units: meters
    pub seed_back_distance_m: f64,

    /// Reference speeds below this are raised to it when spacing points, so a stationary vehicle
    /// still gets a finite trajectory.
    ///
    /// Units: miles/hour
    pub min_fill_speed_mph: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            horizon_length: DEFAULT_HORIZON_LENGTH,
            point_dt_s: DEFAULT_POINT_DT_S,
            lookahead_m: DEFAULT_LOOKAHEAD_M,
            near_anchor_m: DEFAULT_NEAR_ANCHOR_M,
            near_anchor_lane_change_m: DEFAULT_NEAR_ANCHOR_LANE_CHANGE_M,
            far_anchors_m: DEFAULT_FAR_ANCHORS_M,
            seed_back_distance_m: DEFAULT_SEED_BACK_DISTANCE_M,
            min_fill_speed_mph: DEFAULT_MIN_FILL_SPEED_MPH,
        }
    }
}
