/// Trailing-window flood labels.
///
/// A flood event on day D marks every hourly record at a nearby location
/// whose timestamp falls in `[D 00:00 - N days, D 00:00]`, both ends
/// inclusive. Labels are only ever set, never cleared, so the result does
/// not depend on the order events are applied.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::model::FusedRecord;

/// Inclusive label window for an event on `event_date`.
pub fn label_window(event_date: NaiveDate, days: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    let end = event_date.and_time(chrono::NaiveTime::MIN).and_utc();
    (end - Duration::days(days), end)
}

/// Sets `flood_event` on every record in `[start, end]`.
///
/// `records` must be one location's series sorted by timestamp. Returns the
/// number of records that flipped from negative to positive.
pub fn apply_window(
    records: &mut [FusedRecord],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> usize {
    let lo = records.partition_point(|r| r.timestamp < start);
    let hi = records.partition_point(|r| r.timestamp <= end);
    if lo >= hi {
        return 0;
    }

    let mut newly = 0;
    for record in &mut records[lo..hi] {
        if !record.flood_event {
            record.flood_event = true;
            newly += 1;
        }
    }
    newly
}
