//! # Trajectory generation module
//!
//! Builds the dense, fixed cadence point sequence the vehicle drives. A spline is fitted through
//! a handful of anchor points in the vehicle's local frame, then sampled at a spacing which gives
//! the reference speed. Points of the previous trajectory which the vehicle has not yet reached
//! are kept at the front of the new one.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod spline;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::sim::ControlMsg;
use log::trace;
use nalgebra::{Rotation2, Vector2};

pub use params::*;
pub use spline::*;

use crate::{
    ego::{EgoState, PriorTrajectoryRemainder},
    road::{lane_centre_d, lane_of, RoadwayModel},
    MPH_PER_MPS,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A trajectory emitted by one cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    /// Planar points, one per `point_dt_s`
    pub points: Vec<(f64, f64)>,

    /// Number of leading points copied from the previous trajectory
    pub num_reused: usize,
}

/// The local frame the spline is fitted in, origin at the reference point with x along the
/// reference heading.
#[derive(Debug, Clone, Copy)]
struct LocalFrame {
    origin: Vector2<f64>,
    rotation: Rotation2<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TrajGenError {
    #[error("Anchor points do not give a valid spline: {0}")]
    DegenerateGeometry(SplineError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Trajectory {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of points appended by this cycle.
    pub fn num_new(&self) -> usize {
        self.points.len() - self.num_reused
    }

    pub fn to_control_msg(&self) -> ControlMsg {
        ControlMsg::from_points(self.points.iter().copied())
    }
}

impl LocalFrame {
    fn new(origin: (f64, f64), heading: f64) -> Self {
        Self {
            origin: Vector2::new(origin.0, origin.1),
            rotation: Rotation2::new(-heading),
        }
    }

    fn to_local(&self, p: (f64, f64)) -> (f64, f64) {
        let l = self.rotation * (Vector2::new(p.0, p.1) - self.origin);
        (l.x, l.y)
    }

    fn to_global(&self, p: (f64, f64)) -> (f64, f64) {
        let g = self.rotation.inverse() * Vector2::new(p.0, p.1) + self.origin;
        (g.x, g.y)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Synthesise the trajectory for this cycle.
///
/// `lane` and `reference_speed` (miles/hour) are the behaviour controller's targets.
pub fn synthesise(
    road: &RoadwayModel,
    params: &Params,
    ego: &EgoState,
    prior: &PriorTrajectoryRemainder,
    lane: usize,
    reference_speed: f64,
) -> Result<Trajectory, TrajGenError> {
    let horizon = params.horizon_length;

    // Nothing to add, the vehicle already has a full horizon to drive
    if prior.len() >= horizon {
        return Ok(Trajectory {
            points: prior.points[..horizon].to_vec(),
            num_reused: horizon,
        });
    }

    let (frame, xs, ys) = local_anchors(road, params, ego, prior, lane);

    let spline = CubicSpline::new(&xs, &ys).map_err(TrajGenError::DegenerateGeometry)?;

    // Space the new points so that covering the lookahead takes the time it would at the
    // reference speed
    let fill_speed_mph = reference_speed.max(params.min_fill_speed_mph);
    let target_y = spline.eval(params.lookahead_m);
    let target_dist = params.lookahead_m.hypot(target_y);
    let num_intervals = target_dist / (params.point_dt_s * fill_speed_mph / MPH_PER_MPS);
    let x_step = params.lookahead_m / num_intervals;

    let mut points = Vec::with_capacity(horizon);
    points.extend_from_slice(&prior.points);

    let mut x_local = 0.0;
    for _ in prior.len()..horizon {
        x_local += x_step;
        points.push(frame.to_global((x_local, spline.eval(x_local))));
    }

    trace!(
        "TrajGen: {} reused points, {} new points spaced {:.4} m in local x, seam heading {:.4} rad",
        prior.len(),
        horizon - prior.len(),
        x_step,
        spline.eval_deriv(0.0).atan()
    );

    Ok(Trajectory {
        points,
        num_reused: prior.len(),
    })
}

/// Build the spline anchors in the local frame of the reference pose.
///
/// Two seed anchors carry the recent heading, then three forward anchors sit on the target
/// lane centre.
fn local_anchors(
    road: &RoadwayModel,
    params: &Params,
    ego: &EgoState,
    prior: &PriorTrajectoryRemainder,
    lane: usize,
) -> (LocalFrame, Vec<f64>, Vec<f64>) {
    // Seed the anchors with the recent heading, from the end of the previous trajectory if
    // there is one
    let (frame, mut anchors) = match prior.len() {
        0 | 1 => {
            let back = (
                ego.x - params.seed_back_distance_m * ego.yaw.cos(),
                ego.y - params.seed_back_distance_m * ego.yaw.sin(),
            );
            (
                LocalFrame::new((ego.x, ego.y), ego.yaw),
                vec![back, (ego.x, ego.y)],
            )
        }
        n => {
            let prev = prior.points[n - 2];
            let last = prior.points[n - 1];
            let heading = (last.1 - prev.1).atan2(last.0 - prev.0);
            (LocalFrame::new(last, heading), vec![prev, last])
        }
    };

    // Forward anchors on the target lane centre, stretched out while changing lane
    let plan_s = match prior.is_empty() {
        true => ego.s,
        false => prior.end_s,
    };
    let near_anchor = match lane_of(ego.d) == Some(lane) {
        true => params.near_anchor_m,
        false => params.near_anchor_lane_change_m,
    };
    let target_d = lane_centre_d(lane);

    anchors.push(road.locate(plan_s + near_anchor, target_d));
    for far in params.far_anchors_m.iter() {
        anchors.push(road.locate(plan_s + far, target_d));
    }

    let (xs, ys): (Vec<f64>, Vec<f64>) = anchors.iter().map(|&a| frame.to_local(a)).unzip();
    trace!("TrajGen local anchors: x = {:?}, y = {:?}", xs, ys);

    (frame, xs, ys)
}
