/// Test fixtures: representative JSON payloads from the Open-Meteo APIs.
///
/// Structurally complete but truncated to a handful of hours. Archive
/// response shape:
///   latitude / longitude   — grid cell actually used (snapped, not the request)
///   hourly_units.{var}     — unit strings
///   hourly.time[]          — "YYYY-MM-DDTHH:MM" in the requested timezone
///   hourly.{var}[]         — one number (or null) per entry of `time`
///
/// Elevation response shape:
///   elevation[]            — one value per requested point, in request order
///
/// Error responses carry `{"error": true, "reason": "..."}` with a 400 status.

/// Karachi precipitation, four hours; the last hour is still null (archive
/// latency).
#[cfg(test)]
pub(crate) fn fixture_precipitation_json() -> &'static str {
    r#"{
      "latitude": 24.849998,
      "longitude": 67.0,
      "generationtime_ms": 0.31,
      "utc_offset_seconds": 0,
      "timezone": "GMT",
      "timezone_abbreviation": "GMT",
      "elevation": 8.0,
      "hourly_units": { "time": "iso8601", "precipitation": "mm" },
      "hourly": {
        "time": ["2022-08-14T00:00", "2022-08-14T01:00", "2022-08-14T02:00", "2022-08-14T03:00"],
        "precipitation": [0.0, 2.4, 5.1, null]
      }
    }"#
}

/// Gilgit 2 m temperature, three hours.
#[cfg(test)]
pub(crate) fn fixture_temperature_json() -> &'static str {
    r#"{
      "latitude": 35.9,
      "longitude": 74.3,
      "timezone": "GMT",
      "hourly_units": { "time": "iso8601", "temperature_2m": "°C" },
      "hourly": {
        "time": ["2024-01-01T00:00", "2024-01-01T01:00", "2024-01-01T02:00"],
        "temperature_2m": [-2.5, -2.8, -3.1]
      }
    }"#
}

/// A valid response covering a range with no data.
#[cfg(test)]
pub(crate) fn fixture_empty_hourly_json() -> &'static str {
    r#"{
      "latitude": 24.849998,
      "longitude": 67.0,
      "hourly_units": { "time": "iso8601", "precipitation": "mm" },
      "hourly": { "time": [], "precipitation": [] }
    }"#
}

/// Error body returned with HTTP 400.
#[cfg(test)]
pub(crate) fn fixture_error_json() -> &'static str {
    r#"{ "error": true, "reason": "Parameter 'start_date' is out of allowed range" }"#
}

/// Elevation for a location and its north/east offsets.
#[cfg(test)]
pub(crate) fn fixture_elevation_json() -> &'static str {
    r#"{ "elevation": [8.0, 12.0, 9.0] }"#
}
