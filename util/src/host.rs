//! Host platform utility functions

use std::path::PathBuf;

/// Environment variable pointing at the root of the software tree (the directory holding
/// `params/` and `sessions/`).
pub const SW_ROOT_ENV_VAR: &str = "HWY_PLAN_SW_ROOT";

/// Get the software root directory from the environment.
pub fn get_sw_root() -> Result<PathBuf, std::env::VarError> {
    std::env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
