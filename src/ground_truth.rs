/// Ground-truth flood events.
///
/// A manually compiled list of major historical floods in Pakistan, written
/// once to the ground-truth store. This is the "y" of the supervised
/// problem. The file is never regenerated automatically; delete it to pick
/// up changes to the list below.

use chrono::NaiveDate;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::model::FloodEvent;
use crate::store;

/// (event_date, lat, lon, severity). Severity: 1 = localized, 3 = catastrophic.
const CURATED_EVENTS: &[((i32, u32, u32), f64, f64, u8)] = &[
    ((2010, 7, 28), 34.01, 71.52, 3), // 2010 superfloods, onset in KPK
    ((2011, 8, 11), 25.39, 68.85, 2), // Sindh floods
    ((2014, 9, 7), 31.52, 74.35, 2),  // Kashmir and Punjab floods
    ((2017, 7, 30), 24.86, 67.01, 1), // Karachi urban flooding
    ((2020, 8, 25), 24.90, 67.05, 2), // Karachi urban flooding, more severe
    ((2022, 8, 15), 28.37, 68.45, 3), // 2022 floods, representative mid-point
    ((2023, 4, 29), 32.93, 72.36, 1), // Spring floods in KPK and Punjab
];

/// The curated event list.
pub fn curated_flood_events() -> Vec<FloodEvent> {
    CURATED_EVENTS
        .iter()
        .filter_map(|&((y, m, d), lat, lon, severity)| {
            NaiveDate::from_ymd_opt(y, m, d).map(|event_date| FloodEvent {
                event_date,
                lat,
                lon,
                severity,
            })
        })
        .collect()
}

/// Writes the curated list unless the ground-truth store exists.
///
/// Returns `true` when the file was created.
pub fn create_ground_truth_file(config: &PipelineConfig) -> Result<bool, PipelineError> {
    let path = &config.paths.ground_truth;
    if path.exists() {
        tracing::info!(
            stage = "ground_truth",
            "Ground truth file already exists at '{}'. Skipping creation (delete the file to regenerate it).",
            path.display()
        );
        return Ok(false);
    }

    let events = curated_flood_events();
    store::write_flood_events(path, &events)?;
    tracing::info!(
        stage = "ground_truth",
        events = events.len(),
        "Historical flood events saved to '{}'",
        path.display()
    );
    Ok(true)
}
