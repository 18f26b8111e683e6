//! # Behaviour control module
//!
//! A discrete proportional control loop over the persistent [`PlanningContext`]. Each cycle the
//! reference speed is nudged up towards the speed limit, or braked towards the speed of the
//! nearest vehicle ahead when it gets too close. When braking, a lane change is attempted using
//! the tie-break order in [`lane_change_candidates`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, trace};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

pub use params::*;

use crate::{
    ego::EgoState,
    occupancy::{OccupancyParams, SensedObject},
    road::NUM_LANES,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Lane the vehicle starts in.
pub const INITIAL_LANE: usize = 1;

/// Lanes to try moving into when blocked, in order of preference, indexed by the current lane.
///
/// Outer lanes move to the centre, the centre lane tries right (higher index) first then left.
const LANE_CHANGE_RULES: [&[usize]; NUM_LANES] = [&[1], &[2, 0], &[1]];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Planning state which persists between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanningContext {
    /// Target lane, always less than [`NUM_LANES`]
    pub lane: usize,

    /// Target cruising speed, always within `[0, speed_limit]`.
    ///
    /// Units: miles/hour
    pub reference_speed: f64,
}

/// Everything the controller needs for one cycle.
#[derive(Debug, Clone, Copy)]
pub struct BehavInput<'a> {
    pub ego: &'a EgoState,

    /// Number of points of the previous trajectory not yet driven
    pub num_prior_points: usize,

    /// Road distance at the end of the previous trajectory
    pub prior_end_s: f64,

    /// Time until the vehicle reaches the end of the previous trajectory.
    ///
    /// Units: seconds
    pub latency_s: f64,

    pub objects: &'a [SensedObject],
}

/// Result of one controller step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BehavOutput {
    pub lane: usize,

    /// Units: miles/hour
    pub reference_speed: f64,

    /// A vehicle ahead in the ego lane is within the follow gap
    pub too_close: bool,

    /// The lane changed this cycle
    pub lane_changed: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for PlanningContext {
    fn default() -> Self {
        Self {
            lane: INITIAL_LANE,
            reference_speed: 0.0,
        }
    }
}

impl PlanningContext {
    /// Build a context, forcing the lane and speed back within their bounds.
    pub fn clamped(lane: usize, reference_speed: f64, speed_limit_mph: f64) -> Self {
        let reference_speed = match reference_speed.is_finite() {
            true => util::maths::clamp(reference_speed, 0.0, speed_limit_mph),
            false => 0.0,
        };

        Self {
            lane: lane.min(NUM_LANES - 1),
            reference_speed,
        }
    }
}

impl BehavOutput {
    /// The context to carry into the next cycle.
    pub fn context(&self) -> PlanningContext {
        PlanningContext {
            lane: self.lane,
            reference_speed: self.reference_speed,
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Lanes to try moving into from `lane`, in order of preference.
pub fn lane_change_candidates(lane: usize) -> &'static [usize] {
    LANE_CHANGE_RULES.get(lane).copied().unwrap_or(&[])
}

/// Perform one step of the controller.
///
/// The context is not modified, the caller commits the returned context once the rest of the
/// cycle has succeeded.
pub fn step(
    ctx: &PlanningContext,
    params: &Params,
    occ_params: &OccupancyParams,
    input: &BehavInput,
) -> BehavOutput {
    let mut lane = ctx.lane;
    let mut reference_speed = ctx.reference_speed;
    let mut lane_changed = false;

    // Plan from the end of the previous trajectory, since that part is already committed
    let plan_s = match input.num_prior_points {
        0 => input.ego.s,
        _ => input.prior_end_s,
    };

    // Nearest vehicle ahead in our lane once it has moved on by the time we reach plan_s
    let nearest = input
        .objects
        .iter()
        .filter(|o| o.lane() == Some(lane))
        .filter_map(|o| {
            let gap = o.s + input.latency_s * o.speed() - plan_s;
            if gap > 0.0 && gap < params.follow_gap_m {
                Some((gap, o))
            } else {
                None
            }
        })
        .min_by_key(|(gap, _)| OrderedFloat(*gap));

    let too_close = nearest.is_some();

    if let Some((gap, obj)) = nearest {
        // Raw sensed speed, the same as the simulator's braking law
        let obj_speed = obj.speed();
        reference_speed -= (reference_speed - obj_speed) / params.brake_divisor;

        trace!(
            "Vehicle {} too close ({:.2} m ahead at {:.2} m/s), reference speed {:.3} mph",
            obj.id,
            gap,
            obj_speed,
            reference_speed
        );

        // Lane checks use where the vehicle actually is now, not the end of the plan
        if let Some(&new_lane) = lane_change_candidates(lane).iter().find(|&&cand| {
            occ_params.is_lane_free(cand, input.ego.s, input.ego.speed, input.objects)
        }) {
            debug!("Changing lane {} -> {}", lane, new_lane);
            lane = new_lane;
            lane_changed = true;
        }
    } else if reference_speed < params.speed_limit_mph {
        reference_speed += params.accel_step_mph;
    }

    let ctx = PlanningContext::clamped(lane, reference_speed, params.speed_limit_mph);

    BehavOutput {
        lane: ctx.lane,
        reference_speed: ctx.reference_speed,
        too_close,
        lane_changed,
    }
}
