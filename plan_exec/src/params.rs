//! # Planner Executable Parameters
//!
//! This module provide parameters for the planner executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::road::DEFAULT_TRACK_LENGTH_M;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanExecParams {
    /// Path to the roadway map file, relative paths are relative to the software root
    pub map_file: String,

    /// Length of one lap of the track
    ///
    /// Units: meters
    #[serde(default = "default_track_length_m")]
    pub track_length_m: f64,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_track_length_m() -> f64 {
    DEFAULT_TRACK_LENGTH_M
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_track_length() {
        let p: PlanExecParams = util::params::from_str(r#"map_file = "data/highway_map.csv""#).unwrap();
        assert_eq!(p.map_file, "data/highway_map.csv");
        assert_eq!(p.track_length_m, DEFAULT_TRACK_LENGTH_M);
    }

    #[test]
    fn test_shipped_param_files() {
        let params_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("params");

        let exec: PlanExecParams =
            util::params::load_path(params_dir.join("plan_exec.toml")).unwrap();
        assert_eq!(exec.track_length_m, DEFAULT_TRACK_LENGTH_M);

        // Server binds, clients connect on the same port
        let net: comms_if::net::NetParams =
            util::params::load_path(params_dir.join("net.toml")).unwrap();
        assert_eq!(net.plan_endpoint, "tcp://*:4567");
        assert_eq!(net.plan_client_endpoint, "tcp://localhost:4567");
        assert_eq!(net.recv_timeout_ms, 200);

        let mgr: crate::plan_mgr::Params =
            util::params::load_path(params_dir.join("plan_mgr.toml")).unwrap();
        assert_eq!(mgr, crate::plan_mgr::Params::default());
    }
}
