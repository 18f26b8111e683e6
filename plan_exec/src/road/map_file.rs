//! Roadway geometry file loading
//!
//! The map file holds one waypoint per line as five whitespace separated numbers, `x y s dx dy`,
//! where `(dx, dy)` is the lateral unit normal.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;
use std::path::Path;

use super::{MalformedMapError, RoadwayModel, Waypoint};

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RoadwayModel {
    /// Load the roadway from a map file.
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        track_length: f64,
    ) -> Result<Self, MalformedMapError> {
        let map_str =
            std::fs::read_to_string(path.as_ref()).map_err(MalformedMapError::FileReadError)?;

        let road = Self::from_map_str(&map_str, track_length)?;

        info!(
            "Loaded {} waypoints from {:?} (track length {} m)",
            road.waypoints().len(),
            path.as_ref(),
            road.track_length()
        );

        Ok(road)
    }

    /// Parse the roadway from the contents of a map file. Blank lines are ignored.
    pub fn from_map_str(map_str: &str, track_length: f64) -> Result<Self, MalformedMapError> {
        let mut waypoints = Vec::new();

        for (line_idx, line) in map_str.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let fields = line
                .split_whitespace()
                .map(|f| f.parse::<f64>())
                .collect::<Result<Vec<f64>, _>>()
                .map_err(|e| MalformedMapError::InvalidLine {
                    line: line_idx + 1,
                    reason: e.to_string(),
                })?;

            if fields.len() != 5 {
                return Err(MalformedMapError::InvalidLine {
                    line: line_idx + 1,
                    reason: format!("expected 5 fields, found {}", fields.len()),
                });
            }

            waypoints.push(Waypoint {
                x: fields[0],
                y: fields[1],
                s: fields[2],
                normal_x: fields[3],
                normal_y: fields[4],
            });
        }

        Self::new(waypoints, track_length)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const MAP: &str = "784.6001 1135.571 0 -0.02359831 -0.9997216
815.2679 1134.93 30.6744785308838 -0.01099479 -0.9999396

844.6398 1134.911 60.0463714599609 -0.002048373 -0.9999979
";

    #[test]
    fn test_from_map_str() {
        let road = RoadwayModel::from_map_str(MAP, 6945.554).unwrap();

        assert_eq!(road.waypoints().len(), 3);
        assert_eq!(road.waypoints()[1].s, 30.6744785308838);
        assert_eq!(road.waypoints()[2].normal_y, -0.9999979);
        assert_eq!(road.track_length(), 6945.554);
    }

    #[test]
    fn test_from_map_str_errors() {
        assert!(matches!(
            RoadwayModel::from_map_str("1 2 3 4", 100.0),
            Err(MalformedMapError::InvalidLine { line: 1, .. })
        ));
        assert!(matches!(
            RoadwayModel::from_map_str("1 2 0 0 1\n1 2 x 0 1", 100.0),
            Err(MalformedMapError::InvalidLine { line: 2, .. })
        ));
        assert!(matches!(
            RoadwayModel::from_map_str("1 2 0 0 1\n", 100.0),
            Err(MalformedMapError::TooFewWaypoints(1))
        ));
        assert!(matches!(
            RoadwayModel::from_map_str("", 100.0),
            Err(MalformedMapError::TooFewWaypoints(0))
        ));
    }

    #[test]
    fn test_from_missing_file() {
        assert!(matches!(
            RoadwayModel::from_file("/definitely/not/a/map.csv", 100.0),
            Err(MalformedMapError::FileReadError(_))
        ));
    }
}
