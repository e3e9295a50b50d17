/// Pipeline configuration loader - parses pipeline.toml
///
/// Keeps monitored coordinates, artifact paths and labeling parameters out
/// of the code, so locations can be added or the search radius tuned
/// without recompiling. The loaded `PipelineConfig` is passed explicitly to
/// every stage and lives for exactly one pipeline run.

use chrono::NaiveDate;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::model::Coordinate;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "pipeline.toml";

/// Environment variable overriding `DEFAULT_CONFIG_PATH`.
pub const CONFIG_PATH_ENV: &str = "FLOMON_CONFIG";

/// Root configuration for one pipeline run.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub labeling: LabelingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Monitored locations; each gets terrain and an hourly series.
    #[serde(rename = "location", default = "default_locations")]
    pub locations: Vec<LocationConfig>,

    /// High-altitude coordinate whose temperature series is shared by all
    /// locations as a glacial-melt proxy. Not itself a monitored location.
    #[serde(default = "default_proxy")]
    pub high_altitude_proxy: LocationConfig,
}

/// A named coordinate from the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationConfig {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl LocationConfig {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

/// Locations of the durable artifacts each stage reads and writes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub terrain: PathBuf,
    pub weather_hydro: PathBuf,
    pub ground_truth: PathBuf,
    pub training_table: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            terrain: PathBuf::from("data/raw_api/static_terrain_data.csv"),
            weather_hydro: PathBuf::from("data/raw_api/historical_weather_hydro_data.csv"),
            ground_truth: PathBuf::from("data/ground_truth/historical_floods.csv"),
            training_table: PathBuf::from("data/processed/final_training_dataset.csv"),
        }
    }
}

/// Data-source access and synchronization parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// First day of the historical record fetched on a full sync.
    pub epoch_start: NaiveDate,
    /// Pause between consecutive data-source calls.
    pub request_delay_ms: u64,
    /// Per-call timeout for the HTTP client.
    pub request_timeout_secs: u64,
    pub archive_url: String,
    pub elevation_url: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            epoch_start: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or_default(),
            request_delay_ms: 1000,
            request_timeout_secs: 30,
            archive_url: "https://archive-api.open-meteo.com/v1/archive".to_string(),
            elevation_url: "https://api.open-meteo.com/v1/elevation".to_string(),
        }
    }
}

/// Feature-engineering and labeling parameters for the fusion stage.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LabelingConfig {
    /// Great-circle radius around each flood event, in kilometers.
    pub search_radius_km: f64,
    /// Days before the event date whose hours are labeled positive.
    pub time_window_days: i64,
    /// Sample count of the short rainfall rolling mean.
    pub short_window_hours: usize,
    /// Sample count of the long rainfall rolling mean.
    pub long_window_hours: usize,
}

impl Default for LabelingConfig {
    fn default() -> Self {
        Self {
            search_radius_km: 150.0,
            time_window_days: 14,
            short_window_hours: 24,
            long_window_hours: 72,
        }
    }
}

/// Log output settings, consumed by `logging::init`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level filter; `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Plain-text log file appended to in addition to the console.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some(PathBuf::from("logs/app.log")),
        }
    }
}

fn location(name: &str, lat: f64, lon: f64) -> LocationConfig {
    LocationConfig { name: name.to_string(), lat, lon }
}

/// Major cities and flood-prone areas in Pakistan.
fn default_locations() -> Vec<LocationConfig> {
    vec![
        location("Karachi", 24.86, 67.01),
        location("Lahore", 31.52, 74.35),
        location("Islamabad", 33.68, 73.04),
        location("Quetta", 30.17, 66.99),
        location("Peshawar", 34.01, 71.52),
        location("Hyderabad", 25.39, 68.35),
        location("Multan", 30.15, 71.48),
    ]
}

fn default_proxy() -> LocationConfig {
    location("Gilgit", 35.92, 74.30)
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            sync: SyncConfig::default(),
            labeling: LabelingConfig::default(),
            logging: LoggingConfig::default(),
            locations: default_locations(),
            high_altitude_proxy: default_proxy(),
        }
    }
}

impl PipelineConfig {
    /// Parses a configuration from TOML text. `origin` is only used in
    /// error messages.
    pub fn from_toml_str(contents: &str, origin: &Path) -> Result<Self, PipelineError> {
        let config: PipelineConfig = toml::from_str(contents).map_err(|e| PipelineError::Config {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate(origin)?;
        Ok(config)
    }

    /// Coordinates of all monitored locations, in configuration order.
    pub fn coordinates(&self) -> Vec<Coordinate> {
        self.locations.iter().map(LocationConfig::coordinate).collect()
    }

    fn validate(&self, origin: &Path) -> Result<(), PipelineError> {
        let invalid = |message: String| PipelineError::Config {
            path: origin.to_path_buf(),
            message,
        };

        if self.locations.is_empty() {
            return Err(invalid("at least one [[location]] is required".into()));
        }
        for loc in self.locations.iter().chain(std::iter::once(&self.high_altitude_proxy)) {
            if !(-90.0..=90.0).contains(&loc.lat) || !(-180.0..=180.0).contains(&loc.lon) {
                return Err(invalid(format!("{} has out-of-range coordinates", loc.name)));
            }
        }
        if self.labeling.search_radius_km <= 0.0 {
            return Err(invalid("labeling.search_radius_km must be positive".into()));
        }
        if self.labeling.time_window_days < 0 {
            return Err(invalid("labeling.time_window_days must not be negative".into()));
        }
        if self.labeling.short_window_hours == 0 || self.labeling.long_window_hours == 0 {
            return Err(invalid("rolling windows must be at least one hour".into()));
        }
        Ok(())
    }
}

/// Path of the configuration file: `FLOMON_CONFIG` if set, otherwise
/// `pipeline.toml` in the working directory.
pub fn config_path() -> PathBuf {
    env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Loads and validates the pipeline configuration at `path`.
pub fn load_config(path: &Path) -> Result<PipelineConfig, PipelineError> {
    let contents = fs::read_to_string(path).map_err(|e| PipelineError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    PipelineConfig::from_toml_str(&contents, path)
}
