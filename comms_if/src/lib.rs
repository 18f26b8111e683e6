//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the planner.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Network module
pub mod net;

/// Simulator telemetry and control message definitions
pub mod sim;
