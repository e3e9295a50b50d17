/// Static terrain cache.
///
/// Elevation and slope never change, so they are fetched once per monitored
/// location and the presence of the terrain store short-circuits the whole
/// stage on later runs.
///
/// `slope_degrees` is an angle: `atan` of the metric elevation gradient,
/// in degrees. Datasets that stored the raw north/east elevation difference
/// in meters as `slope` are not comparable with this column, and models
/// trained on them need the feature recomputed.

use std::thread;
use std::time::Duration;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::ingest::WeatherSource;
use crate::logging;
use crate::model::{Coordinate, TerrainRecord};
use crate::store;

/// Offset, in degrees, of the north/east samples used to estimate slope.
pub const SLOPE_OFFSET_DEG: f64 = 0.01;

/// Length of one degree of latitude on the mean-radius sphere, in meters.
const METERS_PER_DEGREE: f64 = 111_195.0;

/// Result of the terrain stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerrainOutcome {
    /// The terrain store already existed; nothing was fetched.
    AlreadyCached,
    /// The store was written with `collected` of `attempted` locations.
    Collected { collected: usize, attempted: usize },
    /// No location could be fetched; no store was written.
    NothingCollected { attempted: usize },
}

/// Slope in degrees from the elevation at a point and at points
/// `SLOPE_OFFSET_DEG` to its north and east.
pub fn slope_degrees(lat: f64, elevation: f64, north: f64, east: f64) -> f64 {
    let dy = SLOPE_OFFSET_DEG * METERS_PER_DEGREE;
    let dx = dy * lat.to_radians().cos();

    let grad_north = (north - elevation) / dy;
    let grad_east = if dx.abs() > f64::EPSILON { (east - elevation) / dx } else { 0.0 };

    grad_north.hypot(grad_east).atan().to_degrees()
}

fn fetch_terrain(
    source: &dyn WeatherSource,
    coord: Coordinate,
) -> Result<TerrainRecord, crate::error::FetchError> {
    let points = [
        coord,
        Coordinate::new(coord.lat + SLOPE_OFFSET_DEG, coord.lon),
        Coordinate::new(coord.lat, coord.lon + SLOPE_OFFSET_DEG),
    ];
    let elevations = source.fetch_elevations(&points)?;
    if elevations.len() != points.len() {
        return Err(crate::error::FetchError::Parse(format!(
            "expected {} elevations, got {}",
            points.len(),
            elevations.len()
        )));
    }

    Ok(TerrainRecord {
        lat: coord.lat,
        lon: coord.lon,
        elevation_m: elevations[0],
        slope_degrees: slope_degrees(coord.lat, elevations[0], elevations[1], elevations[2]),
    })
}

/// Collects terrain for every monitored location unless the terrain store
/// already exists.
///
/// Per-location failures are logged and skipped. When nothing could be
/// fetched no file is written, so a later run retries the whole stage.
pub fn collect_static_terrain(
    config: &PipelineConfig,
    source: &dyn WeatherSource,
) -> Result<TerrainOutcome, PipelineError> {
    let path = &config.paths.terrain;
    if path.exists() {
        tracing::info!(
            stage = "terrain",
            "Terrain data already exists at '{}'. Skipping.",
            path.display()
        );
        return Ok(TerrainOutcome::AlreadyCached);
    }

    tracing::info!(stage = "terrain", "Collecting static terrain data (one-time operation)");
    let delay = Duration::from_millis(config.sync.request_delay_ms);
    let mut records = Vec::new();

    for (i, location) in config.locations.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            thread::sleep(delay);
        }
        match fetch_terrain(source, location.coordinate()) {
            Ok(record) => {
                tracing::info!(
                    location = %location.name,
                    elevation_m = record.elevation_m,
                    slope_degrees = record.slope_degrees,
                    "Fetched terrain"
                );
                records.push(record);
            }
            Err(e) => logging::log_fetch_failure(&location.name, "Terrain fetch", &e),
        }
    }

    let attempted = config.locations.len();
    logging::log_stage_summary(
        "Terrain collection",
        attempted,
        records.len(),
        attempted - records.len(),
    );

    if records.is_empty() {
        return Ok(TerrainOutcome::NothingCollected { attempted });
    }

    store::write_terrain(path, &records)?;
    tracing::info!(stage = "terrain", "Terrain data saved to '{}'", path.display());

    Ok(TerrainOutcome::Collected { collected: records.len(), attempted })
}
