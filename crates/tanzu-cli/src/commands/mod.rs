//! Command implementations.

pub mod plugin;
pub mod telemetry;
