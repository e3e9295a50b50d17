/// Open-Meteo archive and elevation API client.
///
/// Handles URL construction and JSON response parsing for:
///   https://archive-api.open-meteo.com/v1/archive   (hourly reanalysis)
///   https://api.open-meteo.com/v1/elevation          (90 m DEM lookups)
///
/// See `fixtures.rs` for annotated examples of both response shapes.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::{HourlyValue, HourlyVariable, WeatherSource};
use crate::config::SyncConfig;
use crate::error::FetchError;
use crate::model::Coordinate;

/// Every timestamp is requested in GMT so stored hours are UTC-normalized.
const TIMEZONE: &str = "GMT";

/// Format of `hourly.time[]` entries, e.g. `"2022-08-01T00:00"`.
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

// ---------------------------------------------------------------------------
// Serde structures for response deserialization
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ArchiveResponse {
    hourly: Option<HourlyBlock>,
}

#[derive(Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    #[serde(flatten)]
    series: HashMap<String, Vec<Option<f64>>>,
}

#[derive(Deserialize)]
struct ElevationResponse {
    elevation: Vec<f64>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    reason: String,
}

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

/// Builds an archive API URL for one coordinate, one hourly variable and an
/// inclusive date range.
pub fn build_archive_url(
    base_url: &str,
    coord: Coordinate,
    variable: HourlyVariable,
    start: NaiveDate,
    end: NaiveDate,
) -> String {
    format!(
        "{}?latitude={}&longitude={}&start_date={}&end_date={}&hourly={}&timezone={}",
        base_url,
        coord.lat,
        coord.lon,
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d"),
        variable.api_name(),
        urlencoding::encode(TIMEZONE)
    )
}

/// Builds an elevation API URL for a batch of points.
pub fn build_elevation_url(base_url: &str, points: &[Coordinate]) -> String {
    let lats: Vec<String> = points.iter().map(|p| p.lat.to_string()).collect();
    let lons: Vec<String> = points.iter().map(|p| p.lon.to_string()).collect();
    format!(
        "{}?latitude={}&longitude={}",
        base_url,
        lats.join(","),
        lons.join(",")
    )
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Parses an archive API response into hourly samples of `variable`.
///
/// # Errors
/// - `Parse` if the body is not valid JSON, a timestamp is malformed, the
///   variable is missing, or the value array length differs from `time`.
/// - `EmptyPayload` if the response has no `hourly` block or no hours.
pub fn parse_archive_response(
    json: &str,
    variable: HourlyVariable,
) -> Result<Vec<HourlyValue>, FetchError> {
    let response: ArchiveResponse =
        serde_json::from_str(json).map_err(|e| FetchError::Parse(e.to_string()))?;

    let hourly = response
        .hourly
        .ok_or_else(|| FetchError::EmptyPayload("response has no hourly block".into()))?;

    if hourly.time.is_empty() {
        return Err(FetchError::EmptyPayload("hourly.time is empty".into()));
    }

    let values = hourly.series.get(variable.api_name()).ok_or_else(|| {
        FetchError::Parse(format!("hourly.{} missing from response", variable.api_name()))
    })?;

    if values.len() != hourly.time.len() {
        return Err(FetchError::Parse(format!(
            "hourly.{} has {} values for {} timestamps",
            variable.api_name(),
            values.len(),
            hourly.time.len()
        )));
    }

    hourly
        .time
        .iter()
        .zip(values)
        .map(|(time, value)| {
            let timestamp = NaiveDateTime::parse_from_str(time, TIME_FORMAT)
                .map_err(|e| FetchError::Parse(format!("bad timestamp '{}': {}", time, e)))?
                .and_utc();
            Ok(HourlyValue { timestamp, value: *value })
        })
        .collect()
}

/// Parses an elevation API response, checking one value per requested point.
pub fn parse_elevation_response(json: &str, expected: usize) -> Result<Vec<f64>, FetchError> {
    let response: ElevationResponse =
        serde_json::from_str(json).map_err(|e| FetchError::Parse(e.to_string()))?;

    if response.elevation.is_empty() {
        return Err(FetchError::EmptyPayload("elevation array is empty".into()));
    }
    if response.elevation.len() != expected {
        return Err(FetchError::Parse(format!(
            "expected {} elevations, got {}",
            expected,
            response.elevation.len()
        )));
    }
    Ok(response.elevation)
}

/// Extracts the `reason` field Open-Meteo puts in error bodies, if any.
pub fn parse_error_reason(json: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorBody>(json).ok().map(|b| b.reason)
}

// ---------------------------------------------------------------------------
// Blocking client
// ---------------------------------------------------------------------------

/// `WeatherSource` backed by the public Open-Meteo APIs.
pub struct OpenMeteoClient {
    client: reqwest::blocking::Client,
    archive_url: String,
    elevation_url: String,
}

impl OpenMeteoClient {
    /// Builds a client with the configured per-call timeout and endpoints.
    pub fn new(config: &SyncConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            archive_url: config.archive_url.clone(),
            elevation_url: config.elevation_url.clone(),
        })
    }

    fn get_text(&self, url: &str) -> Result<String, FetchError> {
        tracing::debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()?;

        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            if let Some(reason) = parse_error_reason(&body) {
                tracing::debug!(status = status.as_u16(), %reason, "Open-Meteo rejected request");
            }
            return Err(FetchError::Http(status.as_u16()));
        }
        Ok(body)
    }
}

impl WeatherSource for OpenMeteoClient {
    fn fetch_hourly(
        &self,
        coord: Coordinate,
        variable: HourlyVariable,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HourlyValue>, FetchError> {
        let url = build_archive_url(&self.archive_url, coord, variable, start, end);
        let body = self.get_text(&url)?;
        parse_archive_response(&body, variable)
    }

    fn fetch_elevations(&self, points: &[Coordinate]) -> Result<Vec<f64>, FetchError> {
        let url = build_elevation_url(&self.elevation_url, points);
        let body = self.get_text(&url)?;
        parse_elevation_response(&body, points.len())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
