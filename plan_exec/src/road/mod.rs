//! # Roadway model
//!
//! The roadway is a closed loop described by an ordered set of centreline waypoints. Each waypoint
//! carries its distance along the loop, `s`, and the unit normal pointing to the right of the
//! direction of travel, along which the lateral offset `d` is measured.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod map_file;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use util::maths::rem_euclid;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Width of a single lane.
///
/// Units: meters
pub const LANE_WIDTH_M: f64 = 4.0;

/// Number of lanes on the roadway, lane 0 is next to the centreline.
pub const NUM_LANES: usize = 3;

/// Length of one lap of the default track.
///
/// Units: meters
pub const DEFAULT_TRACK_LENGTH_M: f64 = 6945.554;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A sampled centreline point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Distance along the centreline from the start of the loop.
    ///
    /// Units: meters
    pub s: f64,

    /// Units: meters
    pub x: f64,

    /// Units: meters
    pub y: f64,

    /// X component of the lateral unit normal
    pub normal_x: f64,

    /// Y component of the lateral unit normal
    pub normal_y: f64,
}

/// The immutable roadway geometry, shared by all cycles.
#[derive(Debug, Clone)]
pub struct RoadwayModel {
    waypoints: Vec<Waypoint>,
    track_length: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised while building the roadway model.
#[derive(Debug, thiserror::Error)]
pub enum MalformedMapError {
    #[error("At least 2 waypoints are required, found {0}")]
    TooFewWaypoints(usize),

    #[error("Waypoint {index} has s = {s} which does not increase on the previous s = {prev_s}")]
    NonIncreasingS { index: usize, s: f64, prev_s: f64 },

    #[error("Track length {track_length} must exceed the last waypoint's s ({last_s})")]
    InvalidTrackLength { track_length: f64, last_s: f64 },

    #[error("Waypoint {0} contains a non-finite value")]
    NonFinite(usize),

    #[error("Cannot read the map file: {0}")]
    FileReadError(std::io::Error),

    #[error("Line {line} of the map file is invalid: {reason}")]
    InvalidLine { line: usize, reason: String },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RoadwayModel {
    /// Build a new roadway from an ordered set of waypoints.
    pub fn new(waypoints: Vec<Waypoint>, track_length: f64) -> Result<Self, MalformedMapError> {
        if waypoints.len() < 2 {
            return Err(MalformedMapError::TooFewWaypoints(waypoints.len()));
        }

        for (i, wp) in waypoints.iter().enumerate() {
            if ![wp.s, wp.x, wp.y, wp.normal_x, wp.normal_y]
                .iter()
                .all(|v| v.is_finite())
            {
                return Err(MalformedMapError::NonFinite(i));
            }

            if i > 0 && wp.s <= waypoints[i - 1].s {
                return Err(MalformedMapError::NonIncreasingS {
                    index: i,
                    s: wp.s,
                    prev_s: waypoints[i - 1].s,
                });
            }
        }

        let last_s = waypoints[waypoints.len() - 1].s;
        if !track_length.is_finite() || track_length <= last_s {
            return Err(MalformedMapError::InvalidTrackLength {
                track_length,
                last_s,
            });
        }

        Ok(Self {
            waypoints,
            track_length,
        })
    }

    /// Build a circular track which is driven anticlockwise, starting from the point directly
    /// below `centre`.
    ///
    /// Normals point away from the centre, so lanes lie outside the centreline circle.
    pub fn circle(
        centre: (f64, f64),
        radius: f64,
        num_waypoints: usize,
    ) -> Result<Self, MalformedMapError> {
        let track_length = 2.0 * std::f64::consts::PI * radius;

        let waypoints = (0..num_waypoints)
            .map(|i| {
                let theta = 2.0 * std::f64::consts::PI * (i as f64) / (num_waypoints as f64);
                Waypoint {
                    s: radius * theta,
                    x: centre.0 + radius * theta.sin(),
                    y: centre.1 - radius * theta.cos(),
                    normal_x: theta.sin(),
                    normal_y: -theta.cos(),
                }
            })
            .collect();

        Self::new(waypoints, track_length)
    }

    /// Length of one lap.
    ///
    /// Units: meters
    pub fn track_length(&self) -> f64 {
        self.track_length
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Convert a road-relative position into planar coordinates.
    pub fn locate(&self, s: f64, d: f64) -> (f64, f64) {
        let s = self.wrap_s(s);

        let (i, j) = self.bounding_indices(s);
        let wp_i = &self.waypoints[i];
        let wp_j = &self.waypoints[j];

        // Distance covered since wp_i, which on the wrap segment may cross the end of the lap
        let seg_len = self.segment_length(i);
        let mut ds = s - wp_i.s;
        if ds < 0.0 {
            ds += self.track_length;
        }
        let frac = ds / seg_len;

        let p_i = Vector2::new(wp_i.x, wp_i.y);
        let p_j = Vector2::new(wp_j.x, wp_j.y);
        let centre = p_i + (p_j - p_i) * frac;

        let n_i = Vector2::new(wp_i.normal_x, wp_i.normal_y);
        let n_j = Vector2::new(wp_j.normal_x, wp_j.normal_y);
        let mut normal = n_i + (n_j - n_i) * frac;
        let norm = normal.norm();
        if norm > std::f64::EPSILON {
            normal /= norm;
        }

        let pos = centre + normal * d;

        (pos.x, pos.y)
    }

    /// Convert a planar position into road-relative coordinates, by projecting onto the closest
    /// centreline segment.
    pub fn to_frenet(&self, x: f64, y: f64) -> (f64, f64) {
        let p = Vector2::new(x, y);

        let mut best_dist_sq = std::f64::INFINITY;
        let mut best = (0.0, 0.0);

        for i in 0..self.waypoints.len() {
            let j = (i + 1) % self.waypoints.len();
            let wp_i = &self.waypoints[i];
            let wp_j = &self.waypoints[j];

            let p_i = Vector2::new(wp_i.x, wp_i.y);
            let seg = Vector2::new(wp_j.x, wp_j.y) - p_i;
            let seg_norm_sq = seg.norm_squared();
            if seg_norm_sq <= std::f64::EPSILON {
                continue;
            }

            let t = util::maths::clamp((p - p_i).dot(&seg) / seg_norm_sq, 0.0, 1.0);
            let foot = p_i + seg * t;
            let dist_sq = (p - foot).norm_squared();

            if dist_sq < best_dist_sq {
                best_dist_sq = dist_sq;

                let n_i = Vector2::new(wp_i.normal_x, wp_i.normal_y);
                let n_j = Vector2::new(wp_j.normal_x, wp_j.normal_y);
                let normal = n_i + (n_j - n_i) * t;

                let s = self.wrap_s(wp_i.s + t * self.segment_length(i));
                let d = (p - foot).dot(&normal) / normal.norm().max(std::f64::EPSILON);

                best = (s, d);
            }
        }

        best
    }

    /// Wrap `s` into `[0, track_length)`.
    pub fn wrap_s(&self, s: f64) -> f64 {
        let s = rem_euclid(s, self.track_length);

        // rem_euclid may round up to the track length for tiny negative inputs
        if s >= self.track_length {
            0.0
        } else {
            s
        }
    }

    /// Indices of the waypoints bounding a wrapped `s`.
    fn bounding_indices(&self, s: f64) -> (usize, usize) {
        let n = self.waypoints.len();

        // Number of waypoints with s <= the target, 0 means s is before the first waypoint and
        // so lies on the wrap segment
        let num_before = self.waypoints.partition_point(|wp| wp.s <= s);
        let i = match num_before {
            0 => n - 1,
            k => k - 1,
        };

        (i, (i + 1) % n)
    }

    /// Length of the segment starting at waypoint `i`.
    fn segment_length(&self, i: usize) -> f64 {
        let n = self.waypoints.len();

        if i + 1 < n {
            self.waypoints[i + 1].s - self.waypoints[i].s
        } else {
            self.track_length - self.waypoints[n - 1].s + self.waypoints[0].s
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Lane index of a lateral offset, `None` if the offset is off the roadway.
pub fn lane_of(d: f64) -> Option<usize> {
    if !d.is_finite() || d < 0.0 {
        return None;
    }

    let lane = (d / LANE_WIDTH_M).floor() as usize;

    if lane < NUM_LANES {
        Some(lane)
    } else {
        None
    }
}

/// Lateral offset of the centre of a lane.
pub fn lane_centre_d(lane: usize) -> f64 {
    LANE_WIDTH_M / 2.0 + LANE_WIDTH_M * (lane as f64)
}

#[cfg(test)]
mod test {
    use super::*;

    fn straight_wp(s: f64) -> Waypoint {
        Waypoint {
            s,
            x: s,
            y: 0.0,
            normal_x: 0.0,
            normal_y: -1.0,
        }
    }

    fn assert_close(a: (f64, f64), b: (f64, f64), tol: f64) {
        assert!(
            (a.0 - b.0).abs() < tol && (a.1 - b.1).abs() < tol,
            "{:?} != {:?}",
            a,
            b
        );
    }

    #[test]
    fn test_construction_errors() {
        assert!(matches!(
            RoadwayModel::new(vec![straight_wp(0.0)], 100.0),
            Err(MalformedMapError::TooFewWaypoints(1))
        ));
        assert!(matches!(
            RoadwayModel::new(vec![straight_wp(10.0), straight_wp(10.0)], 100.0),
            Err(MalformedMapError::NonIncreasingS { index: 1, .. })
        ));
        assert!(matches!(
            RoadwayModel::new(vec![straight_wp(0.0), straight_wp(10.0)], 10.0),
            Err(MalformedMapError::InvalidTrackLength { .. })
        ));
        assert!(matches!(
            RoadwayModel::new(vec![straight_wp(0.0), straight_wp(std::f64::NAN)], 100.0),
            Err(MalformedMapError::NonFinite(1))
        ));
    }

    #[test]
    fn test_locate_interpolates() {
        let road = RoadwayModel::new(
            vec![straight_wp(0.0), straight_wp(10.0), straight_wp(20.0)],
            30.0,
        )
        .unwrap();

        assert_close(road.locate(0.0, 0.0), (0.0, 0.0), 1e-9);
        assert_close(road.locate(15.0, 0.0), (15.0, 0.0), 1e-9);
        assert_close(road.locate(15.0, 6.0), (15.0, -6.0), 1e-9);

        // Past the end of the lap wraps back round
        assert_close(road.locate(45.0, 2.0), (15.0, -2.0), 1e-9);
        assert_close(road.locate(-15.0, 2.0), (15.0, -2.0), 1e-9);
    }

    #[test]
    fn test_locate_continuous_across_wrap() {
        let road = RoadwayModel::circle((0.0, 1000.0), 1000.0, 2000).unwrap();
        let eps = 1e-6;

        for &d in [0.0, 2.0, 6.0, 10.0].iter() {
            let before = road.locate(road.track_length() - eps, d);
            let after = road.locate(rem_euclid(-eps, road.track_length()), d);
            let at_zero = road.locate(0.0, d);

            assert_close(before, after, 1e-6);
            assert_close(before, at_zero, 1e-3);
        }
    }

    #[test]
    fn test_locate_wrap_segment() {
        // First waypoint not at zero so small s lies on the wrap segment
        let road = RoadwayModel::new(
            vec![straight_wp(5.0), straight_wp(15.0), straight_wp(25.0)],
            35.0,
        )
        .unwrap();

        // Wrap segment runs from x=25 (s=25) to x=5 (s=5+35), i.e. 15 m long going backwards in x
        assert_close(road.locate(25.0, 0.0), (25.0, 0.0), 1e-9);
        assert_close(road.locate(0.0, 0.0), (25.0 - 20.0 * (10.0 / 15.0), 0.0), 1e-9);
        assert_close(road.locate(34.999_999, 0.0), road.locate(0.0, 0.0), 1e-5);
    }

    #[test]
    fn test_circle_geometry() {
        let road = RoadwayModel::circle((0.0, 106.0), 100.0, 3600).unwrap();

        // Start of the lap is the bottom of the circle, lane 1 centre is 6 m outside
        assert_close(road.locate(0.0, 0.0), (0.0, 6.0), 1e-6);
        assert_close(road.locate(0.0, 6.0), (0.0, 0.0), 1e-6);

        // A quarter of the way round is the right hand side
        let quarter = road.track_length() / 4.0;
        assert_close(road.locate(quarter, 0.0), (100.0, 106.0), 1e-6);
    }

    #[test]
    fn test_to_frenet_inverts_locate() {
        let road = RoadwayModel::circle((0.0, 1000.0), 1000.0, 2000).unwrap();

        for &(s, d) in [(10.0, 6.0), (1234.5, 2.0), (6000.0, 10.0)].iter() {
            let (x, y) = road.locate(s, d);
            let (s2, d2) = road.to_frenet(x, y);

            // Interpolated normals are not exactly perpendicular to each chord, so s may shift by
            // a few centimetres
            assert!((s - s2).abs() < 0.05, "s {} != {}", s, s2);
            assert!((d - d2).abs() < 1e-3, "d {} != {}", d, d2);
        }
    }

    #[test]
    fn test_lanes() {
        assert_eq!(lane_of(0.0), Some(0));
        assert_eq!(lane_of(3.99), Some(0));
        assert_eq!(lane_of(6.0), Some(1));
        assert_eq!(lane_of(10.0), Some(2));
        assert_eq!(lane_of(12.0), None);
        assert_eq!(lane_of(-0.5), None);

        assert_eq!(lane_centre_d(0), 2.0);
        assert_eq!(lane_centre_d(1), 6.0);
        assert_eq!(lane_centre_d(2), 10.0);
    }
}
