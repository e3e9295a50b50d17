//! Shared helpers for integration tests: an in-memory weather source and
//! per-test scratch directories.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use flomon_dataset::config::{LocationConfig, PipelineConfig};
use flomon_dataset::error::FetchError;
use flomon_dataset::ingest::{HourlyValue, HourlyVariable, WeatherSource};
use flomon_dataset::model::Coordinate;

/// Deterministic source: every hour of the requested date range is returned.
///
/// Precipitation is `hour_of_day / 10`, temperature is `-5.0`, elevation is
/// `lat * 10`. Coordinates listed in `failing` return an HTTP 500.
///
/// Precipitation is null for hours in `null_hours` and for every hour from
/// `null_from` on, the way the archive reports hours it has not filled yet.
#[derive(Default)]
pub struct MockSource {
    pub failing: RefCell<HashSet<Coordinate>>,
    pub fail_temperature: Cell<bool>,
    pub null_from: Cell<Option<DateTime<Utc>>>,
    pub null_hours: RefCell<HashSet<DateTime<Utc>>>,
    pub hourly_calls: Cell<usize>,
    pub elevation_calls: Cell<usize>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_at(&self, coord: Coordinate) {
        self.failing.borrow_mut().insert(coord);
    }

    /// Archive lag: precipitation is null from `t` onward.
    pub fn lagging_from(&self, t: DateTime<Utc>) {
        self.null_from.set(Some(t));
    }

    /// A hole: precipitation is null at `t` only.
    pub fn null_at(&self, t: DateTime<Utc>) {
        self.null_hours.borrow_mut().insert(t);
    }

    fn precipitation_is_null(&self, t: DateTime<Utc>) -> bool {
        self.null_from.get().is_some_and(|from| t >= from) || self.null_hours.borrow().contains(&t)
    }
}

impl WeatherSource for MockSource {
    fn fetch_hourly(
        &self,
        coord: Coordinate,
        variable: HourlyVariable,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HourlyValue>, FetchError> {
        self.hourly_calls.set(self.hourly_calls.get() + 1);
        if self.failing.borrow().contains(&coord) {
            return Err(FetchError::Http(500));
        }
        if variable == HourlyVariable::Temperature && self.fail_temperature.get() {
            return Err(FetchError::Transport("operation timed out".into()));
        }

        let first = start.and_time(NaiveTime::MIN).and_utc();
        let last = end.and_hms_opt(23, 0, 0).map(|t| t.and_utc()).unwrap_or(first);
        let mut values = Vec::new();
        let mut t = first;
        while t <= last {
            let value = match variable {
                HourlyVariable::Precipitation if self.precipitation_is_null(t) => None,
                HourlyVariable::Precipitation => Some(f64::from(t.hour()) / 10.0),
                HourlyVariable::Temperature => Some(-5.0),
            };
            values.push(HourlyValue { timestamp: t, value });
            t += Duration::hours(1);
        }
        Ok(values)
    }

    fn fetch_elevations(&self, points: &[Coordinate]) -> Result<Vec<f64>, FetchError> {
        self.elevation_calls.set(self.elevation_calls.get() + 1);
        if points.iter().any(|p| self.failing.borrow().contains(p)) {
            return Err(FetchError::Http(500));
        }
        Ok(points.iter().map(|p| p.lat * 10.0).collect())
    }
}

/// Fresh, empty scratch directory unique to this test binary and `name`.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("flomon_it_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("scratch dir");
    dir
}

pub fn location(name: &str, lat: f64, lon: f64) -> LocationConfig {
    LocationConfig { name: name.into(), lat, lon }
}

/// Config with every artifact under `dir`, no request delay, and the given
/// locations.
pub fn test_config(dir: &Path, epoch: NaiveDate, locations: Vec<LocationConfig>) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.paths.terrain = dir.join("static_terrain_data.csv");
    config.paths.weather_hydro = dir.join("weather_hydro_data.csv");
    config.paths.ground_truth = dir.join("historical_flood_events.csv");
    config.paths.training_table = dir.join("final_training_data.csv");
    config.sync.epoch_start = epoch;
    config.sync.request_delay_ms = 0;
    config.locations = locations;
    config
}
