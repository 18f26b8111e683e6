//! # Lane occupancy
//!
//! Snapshot check of whether a lane is safe to move into, given the other vehicles currently
//! sensed around the ego vehicle. No forward simulation is performed, the check is repeated every
//! cycle so a lane which is vetoed now may be approved on the next cycle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::road::lane_of;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Default clearance required ahead of the ego vehicle.
///
/// Units: meters
pub const DEFAULT_AHEAD_GAP_M: f64 = 20.0;

/// Default clearance required directly behind the ego vehicle, regardless of speed.
///
/// Units: meters
pub const DEFAULT_BEHIND_GAP_M: f64 = 10.0;

/// Default distance behind the ego vehicle within which faster vehicles block the lane.
///
/// Units: meters
pub const DEFAULT_APPROACH_GAP_M: f64 = 20.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A neighbouring vehicle reported by sensor fusion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensedObject {
    pub id: f64,

    /// Units: meters
    pub x: f64,

    /// Units: meters
    pub y: f64,

    /// Units: meters/second
    pub vx: f64,

    /// Units: meters/second
    pub vy: f64,

    /// Units: meters
    pub s: f64,

    /// Units: meters
    pub d: f64,
}

/// Clearances used by the occupancy check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OccupancyParams {
    /// Vehicles in `[ego_s, ego_s + ahead_gap_m]` block the lane.
    pub ahead_gap_m: f64,

    /// Vehicles in `(ego_s - behind_gap_m, ego_s)` block the lane.
    pub behind_gap_m: f64,

    /// Vehicles in `(ego_s - approach_gap_m, ego_s - behind_gap_m)` block the lane if they are
    /// faster than the ego vehicle.
    pub approach_gap_m: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SensedObject {
    /// Build from a sensor fusion row, `[id, x, y, vx, vy, s, d]`.
    pub fn from_row(row: &[f64; 7]) -> Self {
        Self {
            id: row[0],
            x: row[1],
            y: row[2],
            vx: row[3],
            vy: row[4],
            s: row[5],
            d: row[6],
        }
    }

    /// Planar speed.
    ///
    /// Units: meters/second
    pub fn speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }

    /// Lane the object is in, `None` if off the roadway.
    pub fn lane(&self) -> Option<usize> {
        lane_of(self.d)
    }
}

impl Default for OccupancyParams {
    fn default() -> Self {
        Self {
            ahead_gap_m: DEFAULT_AHEAD_GAP_M,
            behind_gap_m: DEFAULT_BEHIND_GAP_M,
            approach_gap_m: DEFAULT_APPROACH_GAP_M,
        }
    }
}

impl OccupancyParams {
    /// Determine whether `lane` is free for the ego vehicle to move into.
    ///
    /// `ego_speed` is in meters/second, the same units as the objects' velocities.
    pub fn is_lane_free(
        &self,
        lane: usize,
        ego_s: f64,
        ego_speed: f64,
        objects: &[SensedObject],
    ) -> bool {
        objects
            .iter()
            .filter(|o| o.lane() == Some(lane))
            .all(|o| !self.blocks(o, ego_s, ego_speed))
    }

    /// True if the given object makes its lane unsafe.
    fn blocks(&self, object: &SensedObject, ego_s: f64, ego_speed: f64) -> bool {
        let s = object.s;

        let ahead = ego_s <= s && s <= ego_s + self.ahead_gap_m;
        let just_behind = ego_s - self.behind_gap_m < s && s < ego_s;
        let approaching = ego_s - self.approach_gap_m < s
            && s < ego_s - self.behind_gap_m
            && object.speed() > ego_speed;

        ahead || just_behind || approaching
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Determine whether `lane` is free using the default clearances.
pub fn is_lane_free(lane: usize, ego_s: f64, ego_speed: f64, objects: &[SensedObject]) -> bool {
    OccupancyParams::default().is_lane_free(lane, ego_s, ego_speed, objects)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::road::lane_centre_d;

    fn obj(s: f64, lane: usize, speed: f64) -> SensedObject {
        SensedObject {
            id: 0.0,
            x: 0.0,
            y: 0.0,
            vx: speed,
            vy: 0.0,
            s,
            d: lane_centre_d(lane),
        }
    }

    #[test]
    fn test_from_row() {
        let o = SensedObject::from_row(&[3.0, 1.0, 2.0, 3.0, 4.0, 150.0, 9.5]);
        assert_eq!(o.id, 3.0);
        assert_eq!(o.speed(), 5.0);
        assert_eq!(o.lane(), Some(2));
    }

    #[test]
    fn test_ahead_blocks_only_its_lane() {
        let ego_s = 100.0;

        for lane in 0..3 {
            for &s in [100.0, 110.0, 120.0].iter() {
                let objects = [obj(s, lane, 0.0)];
                assert!(!is_lane_free(lane, ego_s, 20.0, &objects));

                // Same configuration shifted to the other lanes
                for other in (0..3).filter(|&l| l != lane) {
                    assert!(is_lane_free(other, ego_s, 20.0, &objects));
                }
            }
        }
    }

    #[test]
    fn test_just_behind_blocks_regardless_of_speed() {
        for &speed in [0.0, 10.0, 50.0].iter() {
            assert!(!is_lane_free(2, 100.0, 20.0, &[obj(95.0, 2, speed)]));
        }
    }

    #[test]
    fn test_approaching_from_behind() {
        // Faster car 15 m behind blocks, slower one doesn't
        assert!(!is_lane_free(0, 100.0, 20.0, &[obj(85.0, 0, 25.0)]));
        assert!(is_lane_free(0, 100.0, 20.0, &[obj(85.0, 0, 15.0)]));

        // Boundaries of the open interval are free
        assert!(is_lane_free(0, 100.0, 20.0, &[obj(80.0, 0, 25.0)]));
        assert!(is_lane_free(0, 100.0, 20.0, &[obj(90.0, 0, 25.0)]));
    }

    #[test]
    fn test_clear_outside_gaps() {
        let objects = [obj(121.0, 1, 0.0), obj(79.0, 1, 100.0)];
        assert!(is_lane_free(1, 100.0, 20.0, &objects));
        assert!(is_lane_free(1, 100.0, 20.0, &[]));
    }

    #[test]
    fn test_custom_gaps() {
        let params = OccupancyParams {
            ahead_gap_m: 40.0,
            ..Default::default()
        };
        let objects = [obj(130.0, 1, 0.0)];
        assert!(!params.is_lane_free(1, 100.0, 20.0, &objects));
        assert!(is_lane_free(1, 100.0, 20.0, &objects));
    }
}
