//! Runtime configuration for the game and the dashboard, filled from the command line.

use std::path::PathBuf;

use clap::Parser;

use crate::core::constants::{DEFAULT_DATA_DIR, DEFAULT_EXPORT_DIR, LOG_FILE_NAME};

#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Where telemetry streams and the log file live.
    pub data_dir: PathBuf,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
    /// Every n-th floor is a boss floor. `None` disables bosses.
    pub boss_every: Option<u32>,
    pub log_level: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            seed: None,
            boss_every: None,
            log_level: "info".to_string(),
        }
    }
}

impl GameConfig {
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE_NAME)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub data_dir: PathBuf,
    /// Start filtered to this session instead of all sessions.
    pub session: Option<String>,
    pub export_dir: PathBuf,
    pub output: DashboardOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardOutput {
    Interactive,
    Text,
    Json,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            session: None,
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
            output: DashboardOutput::Interactive,
        }
    }
}

/// Spire - a turn-based dungeon crawl in the terminal
#[derive(Parser, Debug)]
#[command(name = "spire")]
#[command(about = "Climb the spire, one battle at a time", long_about = None)]
pub struct GameArgs {
    /// Directory for telemetry CSV files and the log
    #[arg(long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Seed for the dice (reproducible runs)
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Make every N-th floor a boss floor
    #[arg(long = "boss-every", value_parser = clap::value_parser!(u32).range(1..))]
    pub boss_every: Option<u32>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides it
    #[arg(long = "log-level", default_value = "info")]
    pub log_level: String,

    /// Print version information and exit
    #[arg(short = 'v', long = "version")]
    pub version: bool,
}

impl From<GameArgs> for GameConfig {
    fn from(args: GameArgs) -> Self {
        let defaults = GameConfig::default();
        Self {
            data_dir: args.data_dir.unwrap_or(defaults.data_dir),
            seed: args.seed,
            boss_every: args.boss_every,
            log_level: args.log_level,
        }
    }
}

/// Spire telemetry dashboard
#[derive(Parser, Debug)]
#[command(name = "spire-dashboard")]
#[command(about = "Charts the telemetry recorded by spire", long_about = None)]
pub struct DashboardArgs {
    /// Directory holding the telemetry CSV files
    #[arg(long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Only show this session
    #[arg(long = "session")]
    pub session: Option<String>,

    /// Print the text report and exit
    #[arg(long = "print", conflicts_with = "json")]
    pub print: bool,

    /// Print the report as JSON and exit
    #[arg(long = "json")]
    pub json: bool,

    /// Where exported reports are written
    #[arg(long = "export-dir")]
    pub export_dir: Option<PathBuf>,
}

impl From<DashboardArgs> for DashboardConfig {
    fn from(args: DashboardArgs) -> Self {
        let defaults = DashboardConfig::default();
        let output = if args.json {
            DashboardOutput::Json
        } else if args.print {
            DashboardOutput::Text
        } else {
            DashboardOutput::Interactive
        };
        Self {
            data_dir: args.data_dir.unwrap_or(defaults.data_dir),
            session: args.session,
            export_dir: args.export_dir.unwrap_or(defaults.export_dir),
            output,
        }
    }
}
