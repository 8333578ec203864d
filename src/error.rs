//! Error types shared across the game and the dashboard.

use std::path::PathBuf;
use thiserror::Error;

/// A telemetry row could not be persisted. The run cannot continue without it:
/// the analytics side assumes every emitted event is on disk.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to write telemetry to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum BattleError {
    /// An action was submitted after the battle already ended.
    #[error("the battle is already over")]
    Finished,
    /// An earlier telemetry failure stopped the battle mid-turn.
    #[error("the battle was aborted after a telemetry failure")]
    Aborted,
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShopError {
    #[error("not enough coins to buy {item} (costs {cost}, have {coins})")]
    NotEnoughCoins { item: String, cost: u32, coins: u32 },
    #[error("no shop item at slot {0}")]
    UnknownItem(usize),
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("cannot {action} while {phase}")]
    WrongPhase {
        action: &'static str,
        phase: &'static str,
    },
    #[error(transparent)]
    Battle(#[from] BattleError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Shop(#[from] ShopError),
}

impl RunError {
    /// True when the error means telemetry could not be written.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RunError::Telemetry(_)
                | RunError::Battle(BattleError::Telemetry(_))
                | RunError::Battle(BattleError::Aborted)
        )
    }
}

/// Problems loading persisted telemetry. Each stream fails on its own so one
/// bad file does not take down the other charts.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("data directory {} not found", .0.display())]
    MissingDataDir(PathBuf),
    #[error("telemetry file {} not found", .0.display())]
    MissingStream(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: unexpected header {found:?}", .path.display())]
    BadHeader { path: PathBuf, found: String },
    #[error("{}:{line}: {reason}", .path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}
