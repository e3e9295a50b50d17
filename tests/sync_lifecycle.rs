/// Integration tests for the hydro-weather synchronizer lifecycle
///
/// These tests drive `sync::synchronize` against an in-memory source and a
/// scratch store:
/// 1. Full download into an empty store
/// 2. Idempotent re-runs (no network, no new rows)
/// 3. Incremental catch-up without gaps or duplicates
/// 4. Self-healing of a corrupt store
/// 5. Partial and total fetch failures
/// 6. Archive latency (trailing nulls) and holes (interior nulls)
///
/// Run with: cargo test --test sync_lifecycle

mod common;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use common::{MockSource, location, scratch_dir, test_config};
use flomon_dataset::error::PipelineError;
use flomon_dataset::model::{Coordinate, HourlyObservation};
use flomon_dataset::store;
use flomon_dataset::sync::{SyncMode, SyncOutcome, synchronize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2010, 1, 1).unwrap()
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2010, 1, day, hour, 0, 0).unwrap()
}

fn by_location(rows: &[HourlyObservation]) -> BTreeMap<Coordinate, Vec<DateTime<Utc>>> {
    let mut map: BTreeMap<Coordinate, Vec<DateTime<Utc>>> = BTreeMap::new();
    for row in rows {
        map.entry(row.coordinate()).or_default().push(row.timestamp);
    }
    map
}

fn assert_contiguous(rows: &[HourlyObservation], from: DateTime<Utc>, to: DateTime<Utc>) {
    for (coord, times) in by_location(rows) {
        assert_eq!(times.first(), Some(&from), "{} should start at the epoch", coord);
        assert_eq!(times.last(), Some(&to), "{} should end at now", coord);
        for pair in times.windows(2) {
            assert_eq!(
                pair[1] - pair[0],
                Duration::hours(1),
                "{} has a gap or duplicate at {}",
                coord,
                pair[0]
            );
        }
    }
}

// ---------------------------------------------------------------------------
// 1. Full download
// ---------------------------------------------------------------------------

#[test]
fn test_empty_store_triggers_full_download() {
    let dir = scratch_dir("sync_full");
    let config = test_config(
        &dir,
        epoch(),
        vec![location("Karachi", 24.86, 67.01), location("Lahore", 31.52, 74.35)],
    );
    let source = MockSource::new();

    let outcome = synchronize(&config, &source, at(3, 12)).unwrap();
    let SyncOutcome::Synced(report) = outcome else {
        panic!("expected a sync");
    };
    assert_eq!(report.mode, SyncMode::Full);
    assert_eq!(report.locations_fetched, 2);
    assert!(report.proxy_available);

    // Jan 1 00:00 through Jan 3 12:00 inclusive.
    let rows = store::read_observations(&config.paths.weather_hydro).unwrap();
    assert_eq!(rows.len(), 2 * 61);
    assert_eq!(report.rows_written, rows.len());
    assert_contiguous(&rows, at(1, 0), at(3, 12));
}

#[test]
fn test_rows_are_stored_under_configured_coordinates() {
    let dir = scratch_dir("sync_coords");
    let config = test_config(&dir, epoch(), vec![location("Quetta", 30.17, 66.99)]);

    synchronize(&config, &MockSource::new(), at(1, 5)).unwrap();

    let rows = store::read_observations(&config.paths.weather_hydro).unwrap();
    assert!(rows.iter().all(|r| r.coordinate() == Coordinate::new(30.17, 66.99)));
    assert!(rows.iter().all(|r| r.river_discharge_m3s.is_none()));
    assert!(rows.iter().all(|r| r.high_alt_temp_proxy == Some(-5.0)));
}

// ---------------------------------------------------------------------------
// 2. Idempotence
// ---------------------------------------------------------------------------

#[test]
fn test_second_run_same_day_is_a_no_op() {
    let dir = scratch_dir("sync_idempotent");
    let config = test_config(&dir, epoch(), vec![location("Karachi", 24.86, 67.01)]);
    let source = MockSource::new();

    synchronize(&config, &source, at(3, 12)).unwrap();
    let rows_before = store::read_observations(&config.paths.weather_hydro).unwrap();
    let calls_before = source.hourly_calls.get();

    let outcome = synchronize(&config, &source, at(3, 12)).unwrap();
    assert_eq!(outcome, SyncOutcome::UpToDate);
    assert_eq!(source.hourly_calls.get(), calls_before, "no network on an up-to-date store");

    let rows_after = store::read_observations(&config.paths.weather_hydro).unwrap();
    assert_eq!(rows_before, rows_after);
}

// ---------------------------------------------------------------------------
// 3. Incremental catch-up
// ---------------------------------------------------------------------------

#[test]
fn test_incremental_sync_appends_without_gaps() {
    let dir = scratch_dir("sync_incremental");
    let config = test_config(
        &dir,
        epoch(),
        vec![location("Karachi", 24.86, 67.01), location("Lahore", 31.52, 74.35)],
    );
    let source = MockSource::new();

    synchronize(&config, &source, at(3, 12)).unwrap();
    let outcome = synchronize(&config, &source, at(5, 6)).unwrap();

    let SyncOutcome::Synced(report) = outcome else {
        panic!("expected an incremental sync");
    };
    assert_eq!(report.mode, SyncMode::Incremental);
    // Jan 3 13:00 through Jan 5 06:00 for each location.
    assert_eq!(report.rows_written, 2 * 42);

    let rows = store::read_observations(&config.paths.weather_hydro).unwrap();
    assert_eq!(rows.len(), 2 * 103);
    assert_contiguous(&rows, at(1, 0), at(5, 6));
}

#[test]
fn test_new_location_is_backfilled_from_epoch() {
    let dir = scratch_dir("sync_new_location");
    let mut config = test_config(&dir, epoch(), vec![location("Karachi", 24.86, 67.01)]);
    let source = MockSource::new();

    synchronize(&config, &source, at(2, 23)).unwrap();
    config.locations.push(location("Multan", 30.15, 71.48));
    synchronize(&config, &source, at(4, 1)).unwrap();

    let rows = store::read_observations(&config.paths.weather_hydro).unwrap();
    let grouped = by_location(&rows);
    assert_eq!(grouped[&Coordinate::new(30.15, 71.48)].first(), Some(&at(1, 0)));
    assert_contiguous(&rows, at(1, 0), at(4, 1));
}

// ---------------------------------------------------------------------------
// 4. Corrupt store
// ---------------------------------------------------------------------------

#[test]
fn test_corrupt_store_is_replaced_by_full_download() {
    let dir = scratch_dir("sync_corrupt");
    let config = test_config(&dir, epoch(), vec![location("Karachi", 24.86, 67.01)]);
    std::fs::write(&config.paths.weather_hydro, "lat,lon\nnot-a-number,???\n").unwrap();

    let outcome = synchronize(&config, &MockSource::new(), at(1, 9)).unwrap();
    let SyncOutcome::Synced(report) = outcome else {
        panic!("expected a full sync");
    };
    assert_eq!(report.mode, SyncMode::Full);

    let rows = store::read_observations(&config.paths.weather_hydro).unwrap();
    assert_eq!(rows.len(), 10);
}

#[test]
fn test_header_only_store_is_treated_as_empty() {
    let dir = scratch_dir("sync_header_only");
    let config = test_config(&dir, epoch(), vec![location("Karachi", 24.86, 67.01)]);
    store::write_observations(&config.paths.weather_hydro, &[]).unwrap();

    let outcome = synchronize(&config, &MockSource::new(), at(1, 2)).unwrap();
    assert!(matches!(outcome, SyncOutcome::Synced(r) if r.mode == SyncMode::Full));
}

// ---------------------------------------------------------------------------
// 5. Failures
// ---------------------------------------------------------------------------

#[test]
fn test_failed_location_is_skipped() {
    let dir = scratch_dir("sync_partial");
    let config = test_config(
        &dir,
        epoch(),
        vec![location("Karachi", 24.86, 67.01), location("Lahore", 31.52, 74.35)],
    );
    let source = MockSource::new();
    source.fail_at(Coordinate::new(31.52, 74.35));

    let outcome = synchronize(&config, &source, at(1, 23)).unwrap();
    let SyncOutcome::Synced(report) = outcome else {
        panic!("expected a partial sync");
    };
    assert!(report.is_partial());
    assert_eq!(report.skipped, vec!["Lahore".to_string()]);

    let rows = store::read_observations(&config.paths.weather_hydro).unwrap();
    assert_eq!(rows.len(), 24);
    assert!(rows.iter().all(|r| r.lat == 24.86));
}

#[test]
fn test_skipped_location_catches_up_next_run() {
    let dir = scratch_dir("sync_catch_up");
    let config = test_config(
        &dir,
        epoch(),
        vec![location("Karachi", 24.86, 67.01), location("Lahore", 31.52, 74.35)],
    );
    let failing = MockSource::new();
    failing.fail_at(Coordinate::new(31.52, 74.35));
    synchronize(&config, &failing, at(2, 0)).unwrap();

    synchronize(&config, &MockSource::new(), at(3, 0)).unwrap();

    let rows = store::read_observations(&config.paths.weather_hydro).unwrap();
    assert_contiguous(&rows, at(1, 0), at(3, 0));
}

#[test]
fn test_all_locations_failing_is_fatal() {
    let dir = scratch_dir("sync_all_fail");
    let config = test_config(&dir, epoch(), vec![location("Karachi", 24.86, 67.01)]);
    let source = MockSource::new();
    source.fail_at(Coordinate::new(24.86, 67.01));

    let err = synchronize(&config, &source, at(1, 12)).unwrap_err();
    assert!(matches!(err, PipelineError::NoDataFetched { attempted: 1 }));
    assert_eq!(err.exit_code(), 3);
    assert!(!config.paths.weather_hydro.exists(), "store must not be created");
}

#[test]
fn test_proxy_failure_is_not_fatal() {
    let dir = scratch_dir("sync_proxy_fail");
    let config = test_config(&dir, epoch(), vec![location("Karachi", 24.86, 67.01)]);
    let source = MockSource::new();
    source.fail_temperature.set(true);

    let outcome = synchronize(&config, &source, at(1, 3)).unwrap();
    let SyncOutcome::Synced(report) = outcome else {
        panic!("expected a sync");
    };
    assert!(!report.proxy_available);

    let rows = store::read_observations(&config.paths.weather_hydro).unwrap();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r.high_alt_temp_proxy.is_none()));
}

// ---------------------------------------------------------------------------
// 6. Null precipitation
// ---------------------------------------------------------------------------

#[test]
fn test_rerun_with_lagging_archive_adds_nothing_and_succeeds() {
    let dir = scratch_dir("sync_lagging");
    let config = test_config(&dir, epoch(), vec![location("Karachi", 24.86, 67.01)]);
    let source = MockSource::new();
    source.lagging_from(at(5, 0));

    synchronize(&config, &source, at(10, 12)).unwrap();
    let rows_before = store::read_observations(&config.paths.weather_hydro).unwrap();
    assert_eq!(rows_before.len(), 4 * 24, "trailing null hours are not stored");
    assert_contiguous(&rows_before, at(1, 0), at(4, 23));

    let outcome = synchronize(&config, &source, at(10, 12)).unwrap();
    let SyncOutcome::Synced(report) = outcome else {
        panic!("expected the lagging location to be asked again");
    };
    assert_eq!(report.locations_fetched, 0);
    assert_eq!(report.locations_current, 1);
    assert_eq!(report.rows_written, 0);
    assert!(!report.is_partial());

    let rows_after = store::read_observations(&config.paths.weather_hydro).unwrap();
    assert_eq!(rows_before, rows_after);
}

#[test]
fn test_lagging_hours_are_filled_once_the_archive_catches_up() {
    let dir = scratch_dir("sync_lag_catch_up");
    let config = test_config(&dir, epoch(), vec![location("Karachi", 24.86, 67.01)]);
    let lagging = MockSource::new();
    lagging.lagging_from(at(5, 0));

    synchronize(&config, &lagging, at(10, 12)).unwrap();
    synchronize(&config, &MockSource::new(), at(10, 12)).unwrap();

    let rows = store::read_observations(&config.paths.weather_hydro).unwrap();
    assert_contiguous(&rows, at(1, 0), at(10, 12));
    assert!(rows.iter().all(|r| r.rainfall_mm_per_hr.is_some()));
}

#[test]
fn test_all_null_full_sync_is_not_a_failure() {
    let dir = scratch_dir("sync_all_null");
    let config = test_config(&dir, epoch(), vec![location("Karachi", 24.86, 67.01)]);
    let source = MockSource::new();
    source.lagging_from(at(1, 0));

    let outcome = synchronize(&config, &source, at(1, 6)).unwrap();
    let SyncOutcome::Synced(report) = outcome else {
        panic!("expected a sync");
    };
    assert_eq!(report.mode, SyncMode::Full);
    assert_eq!(report.locations_current, 1);
    assert!(!config.paths.weather_hydro.exists(), "no rows, no store");
}

#[test]
fn test_error_with_other_locations_current_is_not_fatal() {
    let dir = scratch_dir("sync_error_and_current");
    let config = test_config(
        &dir,
        epoch(),
        vec![location("Karachi", 24.86, 67.01), location("Lahore", 31.52, 74.35)],
    );
    let source = MockSource::new();
    source.lagging_from(at(1, 0));
    source.fail_at(Coordinate::new(31.52, 74.35));

    let outcome = synchronize(&config, &source, at(1, 6)).unwrap();
    let SyncOutcome::Synced(report) = outcome else {
        panic!("expected a partial sync");
    };
    assert_eq!(report.locations_current, 1);
    assert_eq!(report.skipped, vec!["Lahore".to_string()]);
}

#[test]
fn test_interior_null_hour_is_stored_without_a_gap() {
    let dir = scratch_dir("sync_hole");
    let config = test_config(&dir, epoch(), vec![location("Karachi", 24.86, 67.01)]);
    let source = MockSource::new();
    source.null_at(at(1, 5));

    synchronize(&config, &source, at(1, 10)).unwrap();

    let rows = store::read_observations(&config.paths.weather_hydro).unwrap();
    assert_eq!(rows.len(), 11);
    assert_contiguous(&rows, at(1, 0), at(1, 10));
    let hole: Vec<_> = rows.iter().filter(|r| r.rainfall_mm_per_hr.is_none()).collect();
    assert_eq!(hole.len(), 1);
    assert_eq!(hole[0].timestamp, at(1, 5));
    assert_eq!(hole[0].high_alt_temp_proxy, Some(-5.0));
}
