/// Incremental hydro-weather synchronizer.
///
/// Maintains the hydro-weather store: one row per monitored location per
/// hour from the configured epoch through "now". Each run:
///
/// 1. **Reads the store** and derives the per-location cursor (last stored
///    hour). A missing store means a full sync; an unreadable or empty store
///    is discarded with a warning and also means a full sync.
/// 2. **Plans fetch windows** starting one hour after each cursor (or at the
///    epoch). If every window starts today or later the store is up to date
///    and the run returns without touching the network.
/// 3. **Fetches** the shared high-altitude temperature proxy, then
///    precipitation for each location, one call at a time with a delay
///    between calls. Failed locations are logged and skipped.
/// 4. **Writes**: a full sync replaces the file, an incremental sync appends.
///
/// Hours without precipitation inside a series are stored with a null value
/// so the series stays contiguous. Null hours after the last known value are
/// archive latency: they are not stored, and the next run asks for them
/// again. A location whose whole window is still null is current, not failed.
///
/// Fetch windows never overlap stored hours, so re-running is safe.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::thread;

use crate::config::{LocationConfig, PipelineConfig};
use crate::error::{FetchError, PipelineError};
use crate::ingest::{HourlyValue, HourlyVariable, WeatherSource};
use crate::logging;
use crate::model::{Coordinate, HourlyObservation};
use crate::store;

// ---------------------------------------------------------------------------
// Synchronization state
// ---------------------------------------------------------------------------

/// Last stored hour per location, derived from the store on every run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncState {
    last_stored: HashMap<Coordinate, DateTime<Utc>>,
}

impl SyncState {
    pub fn from_observations(rows: &[HourlyObservation]) -> Self {
        let mut last_stored: HashMap<Coordinate, DateTime<Utc>> = HashMap::new();
        for row in rows {
            last_stored
                .entry(row.coordinate())
                .and_modify(|t| *t = (*t).max(row.timestamp))
                .or_insert(row.timestamp);
        }
        Self { last_stored }
    }

    /// Last stored hour for `coord`, if the location has any rows.
    pub fn last_stored(&self, coord: &Coordinate) -> Option<DateTime<Utc>> {
        self.last_stored.get(coord).copied()
    }

    /// Latest hour in the whole store.
    pub fn latest(&self) -> Option<DateTime<Utc>> {
        self.last_stored.values().max().copied()
    }

    /// First hour to fetch for `coord`: one hour after its last stored hour,
    /// or the epoch when the location has never been stored.
    pub fn fetch_start(&self, coord: &Coordinate, epoch_start: NaiveDate) -> DateTime<Utc> {
        match self.last_stored(coord) {
            Some(last) => last + Duration::hours(1),
            None => epoch_start.and_time(NaiveTime::MIN).and_utc(),
        }
    }
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// No usable store: everything since the epoch, file replaced.
    Full,
    /// Only hours after each location's cursor, appended.
    Incremental,
}

/// One location's fetch window, `[start, now]`.
#[derive(Debug, Clone)]
pub struct FetchPlan {
    pub location: LocationConfig,
    pub start: DateTime<Utc>,
}

/// Fetch windows for every location that is behind `now`.
///
/// Without a state every location starts at the epoch. With a state,
/// locations whose next hour falls today or later are already current and
/// get no window.
pub fn plan_fetches(
    config: &PipelineConfig,
    state: Option<&SyncState>,
    now: DateTime<Utc>,
) -> Vec<FetchPlan> {
    let today = now.date_naive();
    let empty = SyncState::default();
    let state_ref = state.unwrap_or(&empty);

    config
        .locations
        .iter()
        .map(|location| FetchPlan {
            location: location.clone(),
            start: state_ref.fetch_start(&location.coordinate(), config.sync.epoch_start),
        })
        .filter(|plan| state.is_none() || plan.start.date_naive() < today)
        .collect()
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Tally of a sync that touched the network.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub mode: SyncMode,
    pub locations_attempted: usize,
    pub locations_fetched: usize,
    /// Locations the source answered for without any new precipitation yet.
    pub locations_current: usize,
    /// Names of locations skipped after a fetch failure.
    pub skipped: Vec<String>,
    pub rows_written: usize,
    /// Whether the high-altitude proxy series could be fetched.
    pub proxy_available: bool,
}

impl SyncReport {
    /// True when some, but not all, locations were skipped.
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Store already current; no network access happened.
    UpToDate,
    Synced(SyncReport),
}

// ---------------------------------------------------------------------------
// Store inspection
// ---------------------------------------------------------------------------

/// Reads the existing store into a `SyncState`.
///
/// Returns `None` when there is no store, or when the store could not be
/// used (unreadable, corrupt or empty), in which case it is deleted so the
/// full sync can recreate it.
fn load_existing_state(config: &PipelineConfig) -> Result<Option<SyncState>, PipelineError> {
    let path = &config.paths.weather_hydro;
    if !path.exists() {
        tracing::info!(stage = "sync", "No local data file found. Performing full download.");
        return Ok(None);
    }

    tracing::info!(stage = "sync", "Local data file found: '{}'", path.display());
    match store::read_observations(path) {
        Ok(rows) if !rows.is_empty() => Ok(Some(SyncState::from_observations(&rows))),
        Ok(_) => {
            tracing::warn!(
                stage = "sync",
                "Existing data file is empty. Performing a full download."
            );
            fs::remove_file(path)?;
            Ok(None)
        }
        Err(e) => {
            tracing::warn!(
                stage = "sync",
                "Could not read existing file. Performing a full download. Error: {}",
                e
            );
            fs::remove_file(path)?;
            Ok(None)
        }
    }
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// Keeps samples in `[start, now]`, one per hour (first wins), ordered by
/// time. Null values are kept.
fn window_samples(
    values: Vec<HourlyValue>,
    start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> BTreeMap<DateTime<Utc>, Option<f64>> {
    let mut samples = BTreeMap::new();
    for sample in values {
        if sample.timestamp < start || sample.timestamp > now {
            continue;
        }
        samples.entry(sample.timestamp).or_insert(sample.value);
    }
    samples
}

/// Drops the null hours after the last hour with a value. Returns an empty
/// map when no hour has a value.
fn trim_trailing_nulls(
    mut samples: BTreeMap<DateTime<Utc>, Option<f64>>,
) -> BTreeMap<DateTime<Utc>, Option<f64>> {
    match samples.iter().rev().find(|(_, v)| v.is_some()).map(|(t, _)| *t) {
        Some(last) => {
            samples.retain(|t, _| *t <= last);
            samples
        }
        None => BTreeMap::new(),
    }
}

fn fetch_proxy(
    config: &PipelineConfig,
    source: &dyn WeatherSource,
    start: NaiveDate,
    now: DateTime<Utc>,
) -> Option<HashMap<DateTime<Utc>, f64>> {
    let proxy = &config.high_altitude_proxy;
    tracing::info!(
        location = %proxy.name,
        "Fetching high-altitude temperature proxy from {}",
        proxy.coordinate()
    );

    let end = now.date_naive();
    match source.fetch_hourly(proxy.coordinate(), HourlyVariable::Temperature, start, end) {
        Ok(values) => {
            let start_time = start.and_time(NaiveTime::MIN).and_utc();
            Some(
                window_samples(values, start_time, now)
                    .into_iter()
                    .filter_map(|(t, v)| v.map(|v| (t, v)))
                    .collect(),
            )
        }
        Err(e) => {
            logging::log_fetch_failure(&proxy.name, "Proxy fetch", &e);
            None
        }
    }
}

/// What the source had for one location's window.
#[derive(Debug)]
enum LocationFetch {
    /// Hours through the last one with precipitation.
    Rows(Vec<HourlyObservation>),
    /// Every hour in the window is still null.
    NothingNew,
}

fn fetch_location(
    source: &dyn WeatherSource,
    plan: &FetchPlan,
    now: DateTime<Utc>,
    proxy: Option<&HashMap<DateTime<Utc>, f64>>,
) -> Result<LocationFetch, FetchError> {
    let coord = plan.location.coordinate();
    let values = source.fetch_hourly(
        coord,
        HourlyVariable::Precipitation,
        plan.start.date_naive(),
        now.date_naive(),
    )?;

    let samples = window_samples(values, plan.start, now);
    if samples.is_empty() {
        return Err(FetchError::EmptyPayload(format!(
            "no hours in [{}, {}]",
            plan.start, now
        )));
    }

    let samples = trim_trailing_nulls(samples);
    if samples.is_empty() {
        return Ok(LocationFetch::NothingNew);
    }

    let rows = samples
        .into_iter()
        .map(|(timestamp, rainfall)| HourlyObservation {
            lat: coord.lat,
            lon: coord.lon,
            timestamp,
            rainfall_mm_per_hr: rainfall,
            // Not available from the archive source; reconciled during fusion.
            river_discharge_m3s: None,
            high_alt_temp_proxy: proxy.and_then(|p| p.get(&timestamp).copied()),
        })
        .collect();
    Ok(LocationFetch::Rows(rows))
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Brings the hydro-weather store up to `now`.
///
/// # Errors
/// `NoDataFetched` when every planned location failed with a fetch error;
/// the store is left untouched in that case. I/O and CSV errors while
/// writing.
pub fn synchronize(
    config: &PipelineConfig,
    source: &dyn WeatherSource,
    now: DateTime<Utc>,
) -> Result<SyncOutcome, PipelineError> {
    tracing::info!(stage = "sync", "Starting hydro-weather synchronization");

    let state = load_existing_state(config)?;
    let mode = match state {
        Some(_) => SyncMode::Incremental,
        None => SyncMode::Full,
    };

    let plans = plan_fetches(config, state.as_ref(), now);
    if plans.is_empty() {
        tracing::info!(
            stage = "sync",
            latest = ?state.as_ref().and_then(SyncState::latest),
            "Hydro-weather data is already up-to-date. No download needed."
        );
        return Ok(SyncOutcome::UpToDate);
    }

    let earliest = plans.iter().map(|p| p.start).min().unwrap_or(now);
    tracing::info!(
        stage = "sync",
        mode = ?mode,
        locations = plans.len(),
        "Fetching from {} to {}",
        earliest.format("%Y-%m-%d %H:%M"),
        now.format("%Y-%m-%d %H:%M")
    );

    let delay = std::time::Duration::from_millis(config.sync.request_delay_ms);
    let proxy = fetch_proxy(config, source, earliest.date_naive(), now);

    let mut new_rows = Vec::new();
    let mut skipped = Vec::new();
    let mut fetched = 0;
    let mut current = 0;

    for (i, plan) in plans.iter().enumerate() {
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        tracing::info!(
            location = %plan.location.name,
            "Fetching data for location {}/{} {}",
            i + 1,
            plans.len(),
            plan.location.coordinate()
        );

        match fetch_location(source, plan, now, proxy.as_ref()) {
            Ok(LocationFetch::Rows(rows)) => {
                tracing::debug!(location = %plan.location.name, rows = rows.len(), "Fetched");
                fetched += 1;
                new_rows.extend(rows);
            }
            Ok(LocationFetch::NothingNew) => {
                tracing::info!(
                    location = %plan.location.name,
                    "No precipitation after {} available yet",
                    plan.start.format("%Y-%m-%d %H:%M")
                );
                current += 1;
            }
            Err(e) => {
                logging::log_fetch_failure(&plan.location.name, "Precipitation fetch", &e);
                skipped.push(plan.location.name.clone());
            }
        }
    }

    logging::log_stage_summary(
        "Hydro-weather sync",
        plans.len(),
        fetched + current,
        skipped.len(),
    );

    if fetched == 0 && current == 0 {
        tracing::error!(
            stage = "sync",
            "No new data was fetched. The pipeline cannot continue."
        );
        return Err(PipelineError::NoDataFetched { attempted: plans.len() });
    }

    let path = &config.paths.weather_hydro;
    match mode {
        _ if new_rows.is_empty() => {
            tracing::info!(stage = "sync", "No new hours available yet. Store left unchanged.");
        }
        SyncMode::Full => {
            store::write_observations(path, &new_rows)?;
            tracing::info!(
                stage = "sync",
                rows = new_rows.len(),
                "Created new data file at '{}'",
                path.display()
            );
        }
        SyncMode::Incremental => {
            store::append_observations(path, &new_rows)?;
            tracing::info!(
                stage = "sync",
                rows = new_rows.len(),
                "Appended new data to '{}'",
                path.display()
            );
        }
    }

    Ok(SyncOutcome::Synced(SyncReport {
        mode,
        locations_attempted: plans.len(),
        locations_fetched: fetched,
        locations_current: current,
        skipped,
        rows_written: new_rows.len(),
        proxy_available: proxy.is_some(),
    }))
}
