/// Core data types for the flood-risk training dataset pipeline.
///
/// This module defines the shared domain model imported by all other modules:
/// coordinates, terrain, hourly observations, flood events and the fused /
/// training rows derived from them. It contains no I/O.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

// ---------------------------------------------------------------------------
// Canonical feature schema
// ---------------------------------------------------------------------------

/// Feature columns the downstream classifier expects, in order.
pub const FEATURE_LIST: [&str; 12] = [
    "lat",
    "lon",
    "rainfall_mm_per_hr",
    "rainfall_24hr_avg",
    "rainfall_72hr_avg",
    "month",
    "day_of_year",
    "hour",
    "elevation_m",
    "slope_degrees",
    "river_discharge_m3s",
    "high_alt_temp_proxy",
];

/// Label column appended after the features in the training table.
pub const TARGET_VARIABLE: &str = "flood_event";

/// Value substituted for any feature still missing at emit time.
pub const NEUTRAL_FILL_VALUE: f64 = 0.0;

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// A WGS84 coordinate in decimal degrees.
///
/// Identity is exact: two coordinates are equal only when both components
/// have identical bit patterns. Values read back from CSV round-trip exactly,
/// so a coordinate written by one stage matches the same coordinate read by
/// the next.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Latitude and longitude in radians.
    pub fn to_radians(&self) -> (f64, f64) {
        (self.lat.to_radians(), self.lon.to_radians())
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.lat.to_bits() == other.lat.to_bits() && self.lon.to_bits() == other.lon.to_bits()
    }
}

impl Eq for Coordinate {}

impl Hash for Coordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lat.to_bits().hash(state);
        self.lon.to_bits().hash(state);
    }
}

impl Ord for Coordinate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.lat
            .total_cmp(&other.lat)
            .then_with(|| self.lon.total_cmp(&other.lon))
    }
}

impl PartialOrd for Coordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

// ---------------------------------------------------------------------------
// Stored records
// ---------------------------------------------------------------------------

/// Static terrain attributes for one monitored location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainRecord {
    pub lat: f64,
    pub lon: f64,
    pub elevation_m: f64,
    pub slope_degrees: f64,
}

impl TerrainRecord {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

/// One hour of weather/hydrology at one location.
///
/// Unique by `(lat, lon, timestamp)`. `river_discharge_m3s` is always null
/// at fetch time and is reconciled during fusion. `rainfall_mm_per_hr` is
/// null for hours the archive returned without a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyObservation {
    pub lat: f64,
    pub lon: f64,
    pub timestamp: DateTime<Utc>,
    pub rainfall_mm_per_hr: Option<f64>,
    pub river_discharge_m3s: Option<f64>,
    pub high_alt_temp_proxy: Option<f64>,
}

impl HourlyObservation {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

/// A curated historical flood event (ground truth).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloodEvent {
    pub event_date: NaiveDate,
    pub lat: f64,
    pub lon: f64,
    /// 1 = localized, 2 = regional, 3 = catastrophic.
    pub severity: u8,
}

impl FloodEvent {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

// ---------------------------------------------------------------------------
// Derived records
// ---------------------------------------------------------------------------

/// An hourly observation joined with terrain and engineered features.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedRecord {
    pub lat: f64,
    pub lon: f64,
    pub timestamp: DateTime<Utc>,
    pub rainfall_mm_per_hr: f64,
    pub river_discharge_m3s: Option<f64>,
    pub high_alt_temp_proxy: Option<f64>,
    pub elevation_m: Option<f64>,
    pub slope_degrees: Option<f64>,
    pub rainfall_24hr_avg: f64,
    pub rainfall_72hr_avg: f64,
    pub month: u32,
    pub day_of_year: u32,
    pub hour: u32,
    pub flood_event: bool,
}

/// One row of the final training table: canonical features plus label,
/// with every feature filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    pub lat: f64,
    pub lon: f64,
    pub rainfall_mm_per_hr: f64,
    pub rainfall_24hr_avg: f64,
    pub rainfall_72hr_avg: f64,
    pub month: f64,
    pub day_of_year: f64,
    pub hour: f64,
    pub elevation_m: f64,
    pub slope_degrees: f64,
    pub river_discharge_m3s: f64,
    pub high_alt_temp_proxy: f64,
    pub flood_event: u8,
}

impl TrainingRow {
    /// Feature values in `FEATURE_LIST` order.
    pub fn features(&self) -> [f64; 12] {
        [
            self.lat,
            self.lon,
            self.rainfall_mm_per_hr,
            self.rainfall_24hr_avg,
            self.rainfall_72hr_avg,
            self.month,
            self.day_of_year,
            self.hour,
            self.elevation_m,
            self.slope_degrees,
            self.river_discharge_m3s,
            self.high_alt_temp_proxy,
        ]
    }
}
