/// Feature table emitter.
///
/// Projects fused records onto the canonical feature schema, substitutes
/// `NEUTRAL_FILL_VALUE` for any feature still missing, and persists the
/// table. Also computes the class balance the training stage needs.

use std::path::Path;

use crate::error::PipelineError;
use crate::model::{FusedRecord, NEUTRAL_FILL_VALUE, TrainingRow};
use crate::store;

/// Class balance of an emitted table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSummary {
    pub rows: usize,
    pub positives: usize,
    pub negatives: usize,
    /// `negatives / positives`; `None` when there are no positives.
    pub scale_pos_weight: Option<f64>,
}

impl TableSummary {
    pub fn from_rows(rows: &[TrainingRow]) -> Self {
        let positives = rows.iter().filter(|r| r.flood_event == 1).count();
        let negatives = rows.len() - positives;
        let scale_pos_weight = if positives > 0 {
            Some(negatives as f64 / positives as f64)
        } else {
            None
        };
        Self {
            rows: rows.len(),
            positives,
            negatives,
            scale_pos_weight,
        }
    }
}

/// Projects one fused record. Nulls become the neutral fill value.
pub fn to_training_row(record: &FusedRecord) -> TrainingRow {
    let fill = |v: Option<f64>| v.unwrap_or(NEUTRAL_FILL_VALUE);
    TrainingRow {
        lat: record.lat,
        lon: record.lon,
        rainfall_mm_per_hr: record.rainfall_mm_per_hr,
        rainfall_24hr_avg: record.rainfall_24hr_avg,
        rainfall_72hr_avg: record.rainfall_72hr_avg,
        month: f64::from(record.month),
        day_of_year: f64::from(record.day_of_year),
        hour: f64::from(record.hour),
        elevation_m: fill(record.elevation_m),
        slope_degrees: fill(record.slope_degrees),
        river_discharge_m3s: fill(record.river_discharge_m3s),
        high_alt_temp_proxy: fill(record.high_alt_temp_proxy),
        flood_event: u8::from(record.flood_event),
    }
}

pub fn project(records: &[FusedRecord]) -> Vec<TrainingRow> {
    records.iter().map(to_training_row).collect()
}

/// Projects and writes the training table, returning its class balance.
pub fn emit_training_table(
    records: &[FusedRecord],
    path: &Path,
) -> Result<TableSummary, PipelineError> {
    let rows = project(records);
    store::write_training_table(path, &rows)?;

    let summary = TableSummary::from_rows(&rows);
    tracing::info!(
        stage = "emit",
        rows = summary.rows,
        positives = summary.positives,
        negatives = summary.negatives,
        "Final training dataset saved to '{}'",
        path.display()
    );
    if let Some(weight) = summary.scale_pos_weight {
        tracing::info!(stage = "emit", "Class imbalance: scale_pos_weight = {:.2}", weight);
    }
    Ok(summary)
}
