//! Parameters structure for BehavCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default maximum reference speed.
///
/// Units: miles/hour
pub const DEFAULT_SPEED_LIMIT_MPH: f64 = 49.5;

/// Default reference speed increase per cycle when the lane ahead is clear.
///
/// Units: miles/hour
pub const DEFAULT_ACCEL_STEP_MPH: f64 = 0.224;

/// Default distance ahead within which a vehicle in the ego lane is too close.
///
/// Units: meters
pub const DEFAULT_FOLLOW_GAP_M: f64 = 30.0;

/// Default divisor of the proportional braking law.
pub const DEFAULT_BRAKE_DIVISOR: f64 = 30.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the behaviour controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Upper bound of the reference speed.
    ///
    /// Units: miles/hour
    pub speed_limit_mph: f64,

    /// Units: miles/hour
    pub accel_step_mph: f64,

    /// Units: meters
    pub follow_gap_m: f64,

    /// Braking removes `1/brake_divisor` of the difference between the reference speed and the
    /// speed of the vehicle ahead each cycle.
    pub brake_divisor: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            speed_limit_mph: DEFAULT_SPEED_LIMIT_MPH,
            accel_step_mph: DEFAULT_ACCEL_STEP_MPH,
            follow_gap_m: DEFAULT_FOLLOW_GAP_M,
            brake_divisor: DEFAULT_BRAKE_DIVISOR,
        }
    }
}
