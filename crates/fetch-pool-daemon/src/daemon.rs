pub mod config;
pub mod input;
pub mod reporting;
pub mod telemetry;
