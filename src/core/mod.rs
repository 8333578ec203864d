//! Shared game tuning.

pub mod constants;
