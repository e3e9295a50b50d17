/// Location grouping for the fusion stage.
///
/// `group_by_location` takes the flat list of `HourlyObservation`s read from
/// the hydro-weather store and organizes it into one time-ordered series per
/// coordinate. Every windowed operation downstream (forward-fill, rolling
/// means, label windows) runs on one series at a time, so no state leaks
/// between locations.

use std::collections::BTreeMap;

use crate::model::{Coordinate, HourlyObservation};

/// Per-location series, iterated in `(lat, lon)` order.
pub type LocationSeries = BTreeMap<Coordinate, Vec<HourlyObservation>>;

/// Groups observations by exact coordinate and sorts each series by time.
///
/// The store is append-only and keyed by `(lat, lon, timestamp)`, so a
/// repeated key means the file was edited by hand or two writers raced.
/// Only the first occurrence is kept; the second value returned is the
/// number of rows dropped.
pub fn group_by_location(observations: Vec<HourlyObservation>) -> (LocationSeries, usize) {
    let mut grouped: LocationSeries = BTreeMap::new();

    for obs in observations {
        grouped.entry(obs.coordinate()).or_default().push(obs);
    }

    let mut dropped = 0;
    for series in grouped.values_mut() {
        // Stable sort keeps file order among equal timestamps, so dedup
        // retains the first-written row.
        series.sort_by_key(|o| o.timestamp);
        let before = series.len();
        series.dedup_by_key(|o| o.timestamp);
        dropped += before - series.len();
    }

    (grouped, dropped)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
