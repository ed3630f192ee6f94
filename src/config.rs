use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_DAY_COLUMN_WIDTH: f64 = 120.0;
pub const DEFAULT_GUTTER_PX: f64 = 5.0;
/// Stays are drawn starting this far into their first day's column.
pub const DEFAULT_START_OFFSET: f64 = 0.55;

/// When a resize gesture writes to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeCommit {
    /// Every accepted tick is written immediately, in order.
    PerTick,
    /// Ticks only move a local preview; one write happens at pointer-up.
    #[default]
    OnRelease,
}

impl FromStr for ResizeCommit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per_tick" | "per-tick" => Ok(ResizeCommit::PerTick),
            "on_release" | "on-release" => Ok(ResizeCommit::OnRelease),
            other => Err(ConfigError::Invalid {
                key: "CAMPGRID_RESIZE_COMMIT",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { key, value } => write!(f, "invalid value for {key}: {value:?}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub day_column_width: f64,
    pub gutter_px: f64,
    pub start_offset: f64,
    pub resize_commit: ResizeCommit,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            day_column_width: DEFAULT_DAY_COLUMN_WIDTH,
            gutter_px: DEFAULT_GUTTER_PX,
            start_offset: DEFAULT_START_OFFSET,
            resize_commit: ResizeCommit::default(),
        }
    }
}

impl SchedulerConfig {
    /// Read `CAMPGRID_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary source.
    /// Unparseable numbers fall back to their default with a warning; a
    /// column width that is not positive is an error since every pixel
    /// conversion divides by it.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let day_column_width = parse_or(&lookup, "CAMPGRID_DAY_COLUMN_WIDTH", defaults.day_column_width);
        if !(day_column_width > 0.0 && day_column_width.is_finite()) {
            return Err(ConfigError::Invalid {
                key: "CAMPGRID_DAY_COLUMN_WIDTH",
                value: day_column_width.to_string(),
            });
        }
        let gutter_px = parse_or(&lookup, "CAMPGRID_GUTTER_PX", defaults.gutter_px);
        let start_offset = parse_or(&lookup, "CAMPGRID_START_OFFSET", defaults.start_offset);
        let resize_commit = match lookup("CAMPGRID_RESIZE_COMMIT") {
            Some(v) => v.parse()?,
            None => defaults.resize_commit,
        };

        Ok(Self {
            day_column_width,
            gutter_px,
            start_offset,
            resize_commit,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("ignoring {key}={raw:?}, using {default}");
            default
        }),
        None => default,
    }
}
