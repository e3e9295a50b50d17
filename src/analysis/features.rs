/// Per-series feature engineering: forward-fill, trailing rolling means and
/// calendar components.
///
/// All windows are keyed by sample count, not wall-clock time: a gap in the
/// series does not stretch a 24-sample window to cover more hours.

use chrono::{DateTime, Datelike, Timelike, Utc};

/// Carries the last known value forward over missing entries.
///
/// Entries before the first known value stay `None`.
pub fn forward_fill(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut last = None;
    values
        .iter()
        .map(|v| {
            if v.is_some() {
                last = *v;
            }
            last
        })
        .collect()
}

/// Trailing mean over the last `window` samples with a minimum period of one:
/// output `i` averages samples `max(0, i + 1 - window)..=i`.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;

    for (i, &v) in values.iter().enumerate() {
        sum += v;
        if i >= window {
            sum -= values[i - window];
        }
        let count = (i + 1).min(window);
        out.push(sum / count as f64);
    }
    out
}

/// Calendar components of a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFeatures {
    /// 1–12
    pub month: u32,
    /// 1–366
    pub day_of_year: u32,
    /// 0–23
    pub hour: u32,
}

pub fn calendar_features(timestamp: DateTime<Utc>) -> CalendarFeatures {
    CalendarFeatures {
        month: timestamp.month(),
        day_of_year: timestamp.ordinal(),
        hour: timestamp.hour(),
    }
}
