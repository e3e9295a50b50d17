/// Data-source access for the pipeline.
///
/// The rest of the crate only sees the `WeatherSource` capability: hourly
/// series for a coordinate and date range, and point elevations. The
/// production implementation talks to Open-Meteo; tests substitute an
/// in-memory source.
///
/// Submodules:
/// - `open_meteo` — archive + elevation API: URL construction, JSON parsing, client
/// - `fixtures` (test only) — representative API response payloads

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::FetchError;
use crate::model::Coordinate;

pub mod open_meteo;

#[cfg(test)]
pub(crate) mod fixtures;

/// Hourly variables the pipeline requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HourlyVariable {
    /// Precipitation, mm accumulated over the preceding hour.
    Precipitation,
    /// Air temperature 2 m above ground, °C.
    Temperature,
}

impl HourlyVariable {
    /// Variable name as used in the Open-Meteo `hourly=` parameter and
    /// response body.
    pub fn api_name(&self) -> &'static str {
        match self {
            HourlyVariable::Precipitation => "precipitation",
            HourlyVariable::Temperature => "temperature_2m",
        }
    }
}

/// One hourly sample as returned by a data source. `value` is `None` when
/// the source has no value for that hour yet.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyValue {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
}

/// Capability to fetch raw geophysical data, queried one coordinate at a
/// time. Every failure is per-call and recoverable.
pub trait WeatherSource {
    /// Hourly samples of `variable` at `coord` for every hour of the days
    /// `start..=end`, timestamps in UTC.
    fn fetch_hourly(
        &self,
        coord: Coordinate,
        variable: HourlyVariable,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HourlyValue>, FetchError>;

    /// Elevation in meters for each point, in input order.
    fn fetch_elevations(&self, points: &[Coordinate]) -> Result<Vec<f64>, FetchError>;
}
