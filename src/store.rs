/// Durable tabular artifacts.
///
/// Every stage communicates through CSV files so the pipeline can resume from
/// any completed stage. Null values are written as empty fields.
///
/// | artifact            | columns                                                     |
/// |---------------------|-------------------------------------------------------------|
/// | terrain store       | lat, lon, elevation_m, slope_degrees                        |
/// | hydro-weather store | lat, lon, timestamp, rainfall_mm_per_hr, river_discharge_m3s, high_alt_temp_proxy |
/// | ground-truth store  | event_date, lat, lon, severity                              |
/// | training table      | FEATURE_LIST…, flood_event                                  |

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::model::{
    FEATURE_LIST, FloodEvent, HourlyObservation, TARGET_VARIABLE, TerrainRecord, TrainingRow,
};

// ---------------------------------------------------------------------------
// Generic helpers
// ---------------------------------------------------------------------------

fn ensure_parent_dir(path: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, PipelineError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), PipelineError> {
    ensure_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Fails with `MissingArtifact` unless `path` exists.
pub fn require_artifact(
    path: &Path,
    artifact: &'static str,
    hint: &'static str,
) -> Result<(), PipelineError> {
    if path.exists() {
        Ok(())
    } else {
        Err(PipelineError::MissingArtifact {
            artifact,
            path: path.to_path_buf(),
            hint,
        })
    }
}

// ---------------------------------------------------------------------------
// Terrain store
// ---------------------------------------------------------------------------

pub fn read_terrain(path: &Path) -> Result<Vec<TerrainRecord>, PipelineError> {
    read_csv(path)
}

pub fn write_terrain(path: &Path, records: &[TerrainRecord]) -> Result<(), PipelineError> {
    write_csv(path, records)
}

// ---------------------------------------------------------------------------
// Hydro-weather store
// ---------------------------------------------------------------------------

pub fn read_observations(path: &Path) -> Result<Vec<HourlyObservation>, PipelineError> {
    read_csv(path)
}

/// Creates (or replaces) the store with a header and `rows`.
pub fn write_observations(path: &Path, rows: &[HourlyObservation]) -> Result<(), PipelineError> {
    write_csv(path, rows)
}

/// Appends `rows` to an existing store without rewriting earlier rows.
pub fn append_observations(path: &Path, rows: &[HourlyObservation]) -> Result<(), PipelineError> {
    let file = OpenOptions::new().append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Ground-truth store
// ---------------------------------------------------------------------------

pub fn read_flood_events(path: &Path) -> Result<Vec<FloodEvent>, PipelineError> {
    read_csv(path)
}

pub fn write_flood_events(path: &Path, events: &[FloodEvent]) -> Result<(), PipelineError> {
    write_csv(path, events)
}

// ---------------------------------------------------------------------------
// Training table
// ---------------------------------------------------------------------------

/// Canonical training-table header: the features followed by the label.
pub fn training_table_header() -> Vec<&'static str> {
    FEATURE_LIST
        .iter()
        .copied()
        .chain(std::iter::once(TARGET_VARIABLE))
        .collect()
}

/// Writes the training table atomically: rows go to `<path>.tmp`, which is
/// renamed over `path` only once fully flushed.
pub fn write_training_table(path: &Path, rows: &[TrainingRow]) -> Result<(), PipelineError> {
    ensure_parent_dir(path)?;
    let tmp = temp_path(path);

    let result = (|| {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(File::create(&tmp)?);
        writer.write_record(training_table_header())?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok::<(), PipelineError>(())
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Reads a training table, rejecting files whose header is not canonical.
pub fn read_training_table(path: &Path) -> Result<Vec<TrainingRow>, PipelineError> {
    let mut reader = csv::Reader::from_path(path)?;
    let found: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let expected = training_table_header();

    if found != expected {
        return Err(PipelineError::SchemaMismatch {
            expected: expected.join(", "),
            found: found.join(", "),
        });
    }

    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
