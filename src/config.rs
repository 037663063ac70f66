//! [`Config`]-related definitions.

use std::{path::PathBuf, time};

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use serde::Deserialize;
use smart_default::SmartDefault;

use crate::scrapers::SearchParams;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Scrape parameters used when a request omits them, and by `/download`.
    pub scrape: Scrape,

    /// Scraper backend configuration.
    pub scraper: Scraper,

    /// Snapshot storage configuration.
    pub snapshot: Snapshot,

    /// Spreadsheet export configuration.
    pub export: Export,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(5000)]
    pub port: u16,
}

/// Default scrape parameters.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Scrape {
    /// Location to search in.
    #[default("San Diego, CA".to_owned())]
    pub location: String,

    /// Listing status to search for.
    #[default("sold".to_owned())]
    pub listing_type: String,

    /// Lookback window in days.
    #[default(30)]
    pub past_days: u32,
}

impl From<Scrape> for SearchParams {
    fn from(value: Scrape) -> Self {
        let Scrape {
            location,
            listing_type,
            past_days,
        } = value;
        Self {
            location,
            listing_type,
            past_days,
        }
    }
}

/// Scraper backend.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScraperKind {
    /// Live listings from realtor.com.
    #[default]
    Realtor,

    /// Records loaded from a local JSON file.
    Fixture,
}

/// Scraper configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Scraper {
    /// Backend to scrape with.
    pub kind: ScraperKind,

    /// JSON file read by the fixture backend.
    #[default(PathBuf::from("data/fixture.json"))]
    pub fixture_path: PathBuf,

    /// HTTP request timeout of the live backend.
    #[default(time::Duration::from_secs(30))]
    #[serde(with = "humantime_serde")]
    pub timeout: time::Duration,
}

/// Snapshot backend.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    /// JSON files on disk.
    #[default]
    File,

    /// Process memory only.
    Memory,
}

/// Snapshot storage configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Snapshot {
    /// Storage backend.
    pub kind: SnapshotKind,

    /// Directory holding snapshot files.
    #[default(PathBuf::from("data"))]
    pub dir: PathBuf,
}

/// Spreadsheet export configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Export {
    /// Where the last exported workbook is saved.
    #[default(PathBuf::from("data/results.xlsx"))]
    pub path: PathBuf,
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}
