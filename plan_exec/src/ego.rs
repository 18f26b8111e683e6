//! # Ego vehicle state
//!
//! Per-cycle view of the ego vehicle and its surroundings, built from a telemetry frame.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::sim::Telemetry;
use serde::Serialize;

use crate::{occupancy::SensedObject, MPH_PER_MPS};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Ego vehicle pose and speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EgoState {
    /// Units: meters
    pub x: f64,

    /// Units: meters
    pub y: f64,

    /// Units: meters
    pub s: f64,

    /// Units: meters
    pub d: f64,

    /// Heading.
    ///
    /// Units: radians
    pub yaw: f64,

    /// Units: meters/second
    pub speed: f64,
}

/// The part of the previously emitted trajectory the vehicle has not yet driven.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriorTrajectoryRemainder {
    /// Planar points, in the order they will be visited
    pub points: Vec<(f64, f64)>,

    /// Road distance of the last point
    pub end_s: f64,

    /// Lateral offset of the last point
    pub end_d: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl EgoState {
    /// Build from a telemetry frame, converting yaw to radians and speed to meters/second.
    pub fn from_telemetry(telem: &Telemetry) -> Self {
        Self {
            x: telem.x,
            y: telem.y,
            s: telem.s,
            d: telem.d,
            yaw: telem.yaw.to_radians(),
            speed: telem.speed / MPH_PER_MPS,
        }
    }
}

impl PriorTrajectoryRemainder {
    /// Build from a telemetry frame. Path lengths must already have been validated.
    pub fn from_telemetry(telem: &Telemetry) -> Self {
        Self {
            points: telem
                .previous_path_x
                .iter()
                .copied()
                .zip(telem.previous_path_y.iter().copied())
                .collect(),
            end_s: telem.end_path_s,
            end_d: telem.end_path_d,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Extract the sensed objects from a telemetry frame.
pub fn objects_from_telemetry(telem: &Telemetry) -> Vec<SensedObject> {
    telem
        .sensor_fusion
        .iter()
        .map(SensedObject::from_row)
        .collect()
}
