/// Spatiotemporal fusion: joins hydro-weather observations with terrain,
/// engineers features per location, and labels records near historical
/// flood events.
///
/// Steps, all in memory:
///   1. group observations into per-location series sorted by time
///   2. left-join terrain by exact coordinate
///   3. forward-fill river discharge within each series; hours the archive
///      left without precipitation count as dry
///   4. trailing rolling rainfall means and calendar features
///   5. radius query per event against a static location index
///   6. trailing-window labels, monotonic OR
///
/// A run that produces no positive labels is an error: the table would be
/// useless for supervised training.

use std::collections::HashMap;

use crate::analysis::features::{calendar_features, forward_fill, rolling_mean};
use crate::analysis::groupings::group_by_location;
use crate::analysis::labeling::{apply_window, label_window};
use crate::analysis::spatial::LocationIndex;
use crate::config::LabelingConfig;
use crate::error::PipelineError;
use crate::model::{
    Coordinate, FloodEvent, FusedRecord, HourlyObservation, NEUTRAL_FILL_VALUE, TerrainRecord,
};

/// Counts reported at the end of fusion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FusionSummary {
    pub records: usize,
    pub locations: usize,
    pub positives: usize,
    pub events_matched: usize,
    pub events_unmatched: usize,
    pub duplicates_dropped: usize,
}

/// Fused records in `(lat, lon, timestamp)` order.
#[derive(Debug, Clone)]
pub struct FusedTable {
    pub records: Vec<FusedRecord>,
    pub summary: FusionSummary,
}

fn fuse_series(
    series: &[HourlyObservation],
    terrain: Option<&TerrainRecord>,
    labeling: &LabelingConfig,
) -> Vec<FusedRecord> {
    let rainfall: Vec<f64> = series
        .iter()
        .map(|o| o.rainfall_mm_per_hr.unwrap_or(NEUTRAL_FILL_VALUE))
        .collect();
    let short = rolling_mean(&rainfall, labeling.short_window_hours);
    let long = rolling_mean(&rainfall, labeling.long_window_hours);

    let discharge: Vec<Option<f64>> = series.iter().map(|o| o.river_discharge_m3s).collect();
    let discharge = forward_fill(&discharge);

    series
        .iter()
        .enumerate()
        .map(|(i, obs)| {
            let cal = calendar_features(obs.timestamp);
            FusedRecord {
                lat: obs.lat,
                lon: obs.lon,
                timestamp: obs.timestamp,
                rainfall_mm_per_hr: rainfall[i],
                river_discharge_m3s: discharge[i],
                high_alt_temp_proxy: obs.high_alt_temp_proxy,
                elevation_m: terrain.map(|t| t.elevation_m),
                slope_degrees: terrain.map(|t| t.slope_degrees),
                rainfall_24hr_avg: short[i],
                rainfall_72hr_avg: long[i],
                month: cal.month,
                day_of_year: cal.day_of_year,
                hour: cal.hour,
                flood_event: false,
            }
        })
        .collect()
}

/// Builds the labeled, feature-engineered table.
pub fn fuse(
    observations: Vec<HourlyObservation>,
    terrain: &[TerrainRecord],
    events: &[FloodEvent],
    labeling: &LabelingConfig,
) -> Result<FusedTable, PipelineError> {
    let (grouped, duplicates_dropped) = group_by_location(observations);
    if duplicates_dropped > 0 {
        tracing::warn!(
            stage = "fusion",
            duplicates = duplicates_dropped,
            "Dropped duplicate (lat, lon, timestamp) rows from the hydro-weather store"
        );
    }

    let terrain_by_coord: HashMap<Coordinate, &TerrainRecord> =
        terrain.iter().map(|t| (t.coordinate(), t)).collect();

    let mut fused: Vec<(Coordinate, Vec<FusedRecord>)> = grouped
        .iter()
        .map(|(coord, series)| {
            let terrain = terrain_by_coord.get(coord).copied();
            if terrain.is_none() {
                tracing::warn!(
                    stage = "fusion",
                    location = %coord,
                    "No terrain record for location; elevation and slope left empty"
                );
            }
            (*coord, fuse_series(series, terrain, labeling))
        })
        .collect();

    let index = LocationIndex::build(fused.iter().map(|(coord, _)| *coord));
    let position: HashMap<Coordinate, usize> =
        fused.iter().enumerate().map(|(i, (c, _))| (*c, i)).collect();

    let mut summary = FusionSummary {
        locations: fused.len(),
        duplicates_dropped,
        ..FusionSummary::default()
    };

    for event in events {
        let nearby = index.within_km(event.coordinate(), labeling.search_radius_km);
        if nearby.is_empty() {
            summary.events_unmatched += 1;
            tracing::warn!(
                stage = "fusion",
                event_date = %event.event_date,
                location = %event.coordinate(),
                radius_km = labeling.search_radius_km,
                "Flood event has no monitored location in range"
            );
            continue;
        }
        summary.events_matched += 1;

        let (start, end) = label_window(event.event_date, labeling.time_window_days);
        for coord in nearby {
            if let Some(&i) = position.get(&coord) {
                let labeled = apply_window(&mut fused[i].1, start, end);
                summary.positives += labeled;
                tracing::debug!(
                    stage = "fusion",
                    event_date = %event.event_date,
                    location = %coord,
                    labeled,
                    "Applied flood window"
                );
            }
        }
    }

    let records: Vec<FusedRecord> = fused.into_iter().flat_map(|(_, r)| r).collect();
    summary.records = records.len();

    if summary.positives == 0 {
        return Err(PipelineError::NoPositiveLabels {
            events: events.len(),
            locations: summary.locations,
        });
    }

    tracing::info!(
        stage = "fusion",
        records = summary.records,
        locations = summary.locations,
        positives = summary.positives,
        events_matched = summary.events_matched,
        events_unmatched = summary.events_unmatched,
        "Fusion complete"
    );

    Ok(FusedTable { records, summary })
}
