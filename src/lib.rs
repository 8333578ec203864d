//! Spire - a turn-based terminal dungeon crawl with gameplay telemetry.
//!
//! This crate exposes the game logic for the `spire` binary, the
//! `spire-dashboard` analytics viewer and the integration tests.

pub mod analytics;
pub mod build_info;
pub mod combat;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod progression;
pub mod shop;
pub mod telemetry;
