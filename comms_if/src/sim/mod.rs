//! # Simulator Wire Format
//!
//! Messages exchanged with the driving simulator are JSON event arrays in the socket.io style
//! used by the simulator, `42["<event>", <payload>]`. The `42` prefix is optional on inbound
//! frames and always present on outbound frames.
//!
//! Inbound events are `telemetry` (the vehicle's state, see [`Telemetry`]) and `manual` (the
//! vehicle is under manual control, no trajectory wanted). Outbound events are `control`
//! (see [`ControlMsg`]) and `manual`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use serde_json::{self, Value};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// socket.io prefix marking a websocket message event
pub const EVENT_PREFIX: &str = "42";

/// Number of fields in one row of sensor fusion data: `[id, x, y, vx, vy, s, d]`
pub const SENSOR_FUSION_ROW_LEN: usize = 7;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A telemetry frame sent by the simulator once per cycle.
///
/// Units are those of the simulator: metres for positions, miles/hour for `speed`, degrees for
/// `yaw` and metres/second for sensed vehicle velocities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// Ego planar x position
    pub x: f64,

    /// Ego planar y position
    pub y: f64,

    /// Ego distance along the road centreline
    pub s: f64,

    /// Ego lateral offset from the road centreline
    pub d: f64,

    /// Ego heading in degrees
    pub yaw: f64,

    /// Ego speed in miles/hour
    pub speed: f64,

    /// X coordinates of the previously sent trajectory not yet consumed by the vehicle
    pub previous_path_x: Vec<f64>,

    /// Y coordinates of the previously sent trajectory not yet consumed by the vehicle
    pub previous_path_y: Vec<f64>,

    /// Road distance of the last point of the previous path
    pub end_path_s: f64,

    /// Lateral offset of the last point of the previous path
    pub end_path_d: f64,

    /// Sensed vehicles, one `[id, x, y, vx, vy, s, d]` row each
    pub sensor_fusion: Vec<[f64; SENSOR_FUSION_ROW_LEN]>,
}

/// Trajectory sent back to the simulator, absolute planar coordinates visited every cycle step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlMsg {
    pub next_x: Vec<f64>,
    pub next_y: Vec<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A parsed inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum SimMessage {
    /// A telemetry frame, a trajectory is expected in response
    Telemetry(Telemetry),

    /// Manual driving, an empty acknowledgement is expected in response
    Manual,
}

/// An outbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum SimResponse {
    Control(ControlMsg),
    Manual,
}

/// Errors raised while parsing an inbound frame.
#[derive(Debug, Error)]
pub enum SimParseError {
    #[error("Frame contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("Frame is not an event array of the form [\"<event>\", <payload>]")]
    NotAnEvent,

    #[error("Unknown event type \"{0}\"")]
    UnknownEvent(String),

    #[error("Telemetry payload has missing or mistyped fields: {0}")]
    TelemetryDeserialise(serde_json::Error),

    #[error("Telemetry payload is invalid: {0}")]
    InvalidTelemetry(TelemetryError),
}

/// Semantic errors in a telemetry frame which deserialised correctly.
#[derive(Debug, Error, PartialEq)]
pub enum TelemetryError {
    #[error(
        "previous_path_x and previous_path_y have different lengths ({x_len} and {y_len})"
    )]
    PreviousPathLengthMismatch { x_len: usize, y_len: usize },

    #[error("Field {0} is not a finite number")]
    NonFinite(&'static str),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimMessage {
    /// Parse an inbound frame.
    ///
    /// Frames without any JSON array, and telemetry events with a `null` payload, are treated as
    /// manual driving.
    pub fn from_wire(frame: &str) -> Result<Self, SimParseError> {
        let frame = frame.trim();
        let body = frame.strip_prefix(EVENT_PREFIX).unwrap_or(frame);

        if !body.contains('[') {
            return Ok(SimMessage::Manual);
        }

        let val: Value = serde_json::from_str(body).map_err(SimParseError::InvalidJson)?;

        let event = match val.as_array() {
            Some(a) if !a.is_empty() => a,
            _ => return Err(SimParseError::NotAnEvent),
        };

        let event_type = event[0].as_str().ok_or(SimParseError::NotAnEvent)?;
        let payload = event.get(1).unwrap_or(&Value::Null);

        match event_type {
            "telemetry" => {
                if payload.is_null() {
                    return Ok(SimMessage::Manual);
                }

                let telem: Telemetry = serde_json::from_value(payload.clone())
                    .map_err(SimParseError::TelemetryDeserialise)?;
                telem.validate().map_err(SimParseError::InvalidTelemetry)?;

                Ok(SimMessage::Telemetry(telem))
            }
            "manual" => Ok(SimMessage::Manual),
            t => Err(SimParseError::UnknownEvent(t.to_string())),
        }
    }
}

impl SimResponse {
    /// Serialise the response into an outbound frame.
    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        let event = match self {
            SimResponse::Control(c) => {
                serde_json::json!(["control", serde_json::to_value(c)?])
            }
            SimResponse::Manual => serde_json::json!(["manual", {}]),
        };

        Ok(format!("{}{}", EVENT_PREFIX, serde_json::to_string(&event)?))
    }
}

impl Telemetry {
    /// Check the frame is internally consistent.
    pub fn validate(&self) -> Result<(), TelemetryError> {
        if self.previous_path_x.len() != self.previous_path_y.len() {
            return Err(TelemetryError::PreviousPathLengthMismatch {
                x_len: self.previous_path_x.len(),
                y_len: self.previous_path_y.len(),
            });
        }

        let scalars = [
            ("x", self.x),
            ("y", self.y),
            ("s", self.s),
            ("d", self.d),
            ("yaw", self.yaw),
            ("speed", self.speed),
            ("end_path_s", self.end_path_s),
            ("end_path_d", self.end_path_d),
        ];
        for (name, val) in scalars.iter() {
            if !val.is_finite() {
                return Err(TelemetryError::NonFinite(name));
            }
        }

        if !self.previous_path_x.iter().all(|v| v.is_finite()) {
            return Err(TelemetryError::NonFinite("previous_path_x"));
        }
        if !self.previous_path_y.iter().all(|v| v.is_finite()) {
            return Err(TelemetryError::NonFinite("previous_path_y"));
        }
        if !self
            .sensor_fusion
            .iter()
            .all(|row| row.iter().all(|v| v.is_finite()))
        {
            return Err(TelemetryError::NonFinite("sensor_fusion"));
        }

        Ok(())
    }
}

impl ControlMsg {
    /// Build a message from a sequence of planar points.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let (next_x, next_y) = points.into_iter().unzip();
        Self { next_x, next_y }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const TELEM_FRAME: &str = r#"42["telemetry",{"x":909.48,"y":1128.67,"s":124.83,"d":6.16,
        "yaw":0.0,"speed":0.0,"previous_path_x":[909.5,909.6],"previous_path_y":[1128.7,1128.7],
        "end_path_s":125.0,"end_path_d":6.0,
        "sensor_fusion":[[0,1000.0,1128.0,10.0,0.0,200.0,6.0],[1,900.0,1124.0,20.0,0.0,110.0,2.0]]}]"#;

    #[test]
    fn test_parse_telemetry() {
        let msg = SimMessage::from_wire(TELEM_FRAME).unwrap();

        let telem = match msg {
            SimMessage::Telemetry(t) => t,
            m => panic!("Expected telemetry, got {:?}", m),
        };

        assert_eq!(telem.x, 909.48);
        assert_eq!(telem.previous_path_x.len(), 2);
        assert_eq!(telem.sensor_fusion.len(), 2);
        assert_eq!(telem.sensor_fusion[1][6], 2.0);
    }

    #[test]
    fn test_parse_without_prefix() {
        let frame = TELEM_FRAME.strip_prefix("42").unwrap();
        assert!(matches!(
            SimMessage::from_wire(frame),
            Ok(SimMessage::Telemetry(_))
        ));
    }

    #[test]
    fn test_parse_manual() {
        assert_eq!(
            SimMessage::from_wire(r#"42["manual",{}]"#).unwrap(),
            SimMessage::Manual
        );
        assert_eq!(
            SimMessage::from_wire(r#"42["telemetry",null]"#).unwrap(),
            SimMessage::Manual
        );
        assert_eq!(SimMessage::from_wire("42").unwrap(), SimMessage::Manual);
    }

    #[test]
    fn test_parse_missing_field() {
        // No speed field
        let frame = r#"["telemetry",{"x":0.0,"y":0.0,"s":0.0,"d":6.0,"yaw":0.0,
            "previous_path_x":[],"previous_path_y":[],"end_path_s":0.0,"end_path_d":0.0,
            "sensor_fusion":[]}]"#;
        assert!(matches!(
            SimMessage::from_wire(frame),
            Err(SimParseError::TelemetryDeserialise(_))
        ));
    }

    #[test]
    fn test_parse_short_sensor_fusion_row() {
        let frame = r#"["telemetry",{"x":0.0,"y":0.0,"s":0.0,"d":6.0,"yaw":0.0,"speed":0.0,
            "previous_path_x":[],"previous_path_y":[],"end_path_s":0.0,"end_path_d":0.0,
            "sensor_fusion":[[0,1.0,2.0,3.0,4.0,5.0]]}]"#;
        assert!(matches!(
            SimMessage::from_wire(frame),
            Err(SimParseError::TelemetryDeserialise(_))
        ));
    }

    #[test]
    fn test_parse_mismatched_previous_path() {
        let frame = r#"["telemetry",{"x":0.0,"y":0.0,"s":0.0,"d":6.0,"yaw":0.0,"speed":0.0,
            "previous_path_x":[1.0,2.0],"previous_path_y":[1.0],"end_path_s":0.0,
            "end_path_d":0.0,"sensor_fusion":[]}]"#;
        match SimMessage::from_wire(frame) {
            Err(SimParseError::InvalidTelemetry(e)) => assert_eq!(
                e,
                TelemetryError::PreviousPathLengthMismatch { x_len: 2, y_len: 1 }
            ),
            r => panic!("Expected InvalidTelemetry, got {:?}", r),
        }
    }

    #[test]
    fn test_parse_bad_frames() {
        assert!(matches!(
            SimMessage::from_wire("42[not json"),
            Err(SimParseError::InvalidJson(_))
        ));
        assert!(matches!(
            SimMessage::from_wire("42[]"),
            Err(SimParseError::NotAnEvent)
        ));
        assert!(matches!(
            SimMessage::from_wire("42[12, {}]"),
            Err(SimParseError::NotAnEvent)
        ));
        assert!(matches!(
            SimMessage::from_wire(r#"42["reset", {}]"#),
            Err(SimParseError::UnknownEvent(e)) if e == "reset"
        ));
    }

    #[test]
    fn test_validate_non_finite() {
        let telem = Telemetry {
            speed: std::f64::NAN,
            ..Default::default()
        };
        assert_eq!(telem.validate(), Err(TelemetryError::NonFinite("speed")));

        let telem = Telemetry {
            sensor_fusion: vec![[0.0, 1.0, 2.0, std::f64::INFINITY, 0.0, 0.0, 0.0]],
            ..Default::default()
        };
        assert_eq!(
            telem.validate(),
            Err(TelemetryError::NonFinite("sensor_fusion"))
        );
    }

    #[test]
    fn test_response_to_wire() {
        let ctrl = ControlMsg::from_points(vec![(1.0, 2.0), (3.0, 4.0)]);
        assert_eq!(
            SimResponse::Control(ctrl).to_wire().unwrap(),
            r#"42["control",{"next_x":[1.0,3.0],"next_y":[2.0,4.0]}]"#
        );
        assert_eq!(SimResponse::Manual.to_wire().unwrap(), r#"42["manual",{}]"#);
    }
}
