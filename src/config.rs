//! Operator settings.
//!
//! Every setting can be read from a `HEATMAP_*` environment variable through [`Envconfig`]; a
//! front-end is free to override individual fields afterwards (the bundled demo does so from
//! its command line).

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use envconfig::Envconfig;

use crate::clock::Clock;
use crate::datalog::DEFAULT_LOG_PATH;
use crate::ingest::{GridIngestor, TargetGeometry};

/// Baud rate the device firmware is expected to use.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// How matrix values are mapped onto the heatmap scale.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LevelMode {
    /// Fixed scale; values outside are clamped.
    Static {
        /// Value drawn coldest.
        min: f64,
        /// Value drawn hottest.
        max: f64,
    },
    /// Scale spans each matrix's own minimum and maximum.
    Dynamic,
}

impl Default for LevelMode {
    fn default() -> Self {
        LevelMode::Static {
            min: 0.0,
            max: 100.0,
        }
    }
}

impl fmt::Display for LevelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelMode::Static { min, max } => write!(f, "{}..{}", min, max),
            LevelMode::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// Error parsing a [`LevelMode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelModeError(String);

impl fmt::Display for ParseLevelModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid heatmap levels {:?}, expected \"dynamic\" or \"MIN..MAX\"",
            self.0
        )
    }
}

impl std::error::Error for ParseLevelModeError {}

impl FromStr for LevelMode {
    type Err = ParseLevelModeError;

    /// Accepts `dynamic`, `static` (the default scale) or `MIN..MAX`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseLevelModeError(s.to_owned());
        match s.trim() {
            "dynamic" => Ok(LevelMode::Dynamic),
            "static" => Ok(LevelMode::default()),
            range => {
                let (min, max) = range.split_once("..").ok_or_else(err)?;
                let min: f64 = min.trim().parse().map_err(|_| err())?;
                let max: f64 = max.trim().parse().map_err(|_| err())?;
                if min < max {
                    Ok(LevelMode::Static { min, max })
                } else {
                    Err(err())
                }
            }
        }
    }
}

/// Everything the operator configures.
#[derive(Debug, Clone, PartialEq, Envconfig)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Settings {
    /// Serial port to connect to.
    #[envconfig(from = "HEATMAP_PORT", default = "")]
    pub port_name: String,
    /// Baud rate; must match the firmware as it is never renegotiated.
    #[envconfig(from = "HEATMAP_BAUD_RATE", default = "9600")]
    pub baud_rate: u32,
    /// Values per row (x).
    #[envconfig(from = "HEATMAP_WIDTH", default = "0")]
    pub width: i32,
    /// Rows per matrix (y).
    #[envconfig(from = "HEATMAP_HEIGHT", default = "0")]
    pub height: i32,
    /// Wait after each completed matrix in milliseconds; negative leaves it unset.
    #[envconfig(from = "HEATMAP_COOLDOWN_MS", default = "-1")]
    pub cooldown_ms: i64,
    /// File every ingested row is appended to.
    #[envconfig(from = "HEATMAP_LOG_PATH", default = "data.txt")]
    pub log_path: PathBuf,
    /// Heatmap scale.
    #[envconfig(from = "HEATMAP_LEVELS", default = "static")]
    pub levels: LevelMode,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            width: 0,
            height: 0,
            cooldown_ms: -1,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            levels: LevelMode::default(),
        }
    }
}

impl Settings {
    /// Target matrix shape.
    pub fn geometry(&self) -> TargetGeometry {
        TargetGeometry::new(self.width, self.height)
    }

    /// Cooldown, or `None` when unset.
    pub fn cooldown(&self) -> Option<Duration> {
        u64::try_from(self.cooldown_ms).ok().map(Duration::from_millis)
    }

    /// Pushes geometry and cooldown into `ingestor`.
    pub fn apply_to<C: Clock>(&self, ingestor: &mut GridIngestor<C>) {
        ingestor.set_geometry(self.geometry());
        ingestor.set_cooldown(self.cooldown());
    }
}
