//! Append-only gameplay telemetry.
//!
//! The battle and progression code emit [`TelemetryEvent`]s into a
//! [`TelemetrySink`] passed in by the caller. The CSV sink persists them as
//! five streams (skills, upgrades, damage, health, items) that the dashboard
//! reads back.

pub mod events;
pub mod session;
pub mod sink;

pub use events::{Category, TelemetryEvent, TelemetryRecord};
pub use session::SessionClock;
pub use sink::{CsvTelemetrySink, FailingSink, MemorySink, TelemetrySink};
