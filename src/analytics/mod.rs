//! Offline analysis of the telemetry streams written by the game.
//!
//! [`loader`] turns the CSV files back into typed rows; [`aggregate`] groups
//! them by floor and session and builds the [`AnalyticsReport`] the dashboard
//! renders.

pub mod aggregate;
pub mod loader;

pub use aggregate::{AnalyticsReport, SessionFilter};
pub use loader::TelemetryData;
