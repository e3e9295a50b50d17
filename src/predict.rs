/// Prediction contract for models trained on the emitted table.
///
/// The classifier itself lives outside this crate. What is fixed here is
/// the interface: feature vectors in `FEATURE_LIST` order go in, flood
/// probabilities come out, and a probability at or above
/// `PREDICTION_THRESHOLD` is reported as flood risk.

use std::fmt;

use crate::error::PipelineError;
use crate::model::{FEATURE_LIST, TrainingRow};

pub const PREDICTION_THRESHOLD: f64 = 0.5;

/// A binary classifier over canonical feature vectors.
pub trait FloodClassifier {
    /// Probability of the positive class for each input row.
    fn predict_proba(&self, rows: &[[f64; 12]]) -> Vec<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloodRisk {
    FloodRisk,
    NoFloodRisk,
}

impl FloodRisk {
    pub fn from_probability(probability: f64) -> Self {
        if probability >= PREDICTION_THRESHOLD {
            FloodRisk::FloodRisk
        } else {
            FloodRisk::NoFloodRisk
        }
    }
}

impl fmt::Display for FloodRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FloodRisk::FloodRisk => write!(f, "Flood Risk"),
            FloodRisk::NoFloodRisk => write!(f, "No Flood Risk"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub probability: f64,
    pub risk: FloodRisk,
}

/// Fails unless `headers` is exactly `FEATURE_LIST`, in order.
pub fn validate_feature_header<S: AsRef<str>>(headers: &[S]) -> Result<(), PipelineError> {
    let matches = headers.len() == FEATURE_LIST.len()
        && headers
            .iter()
            .zip(FEATURE_LIST.iter())
            .all(|(h, f)| h.as_ref() == *f);

    if matches {
        Ok(())
    } else {
        Err(PipelineError::SchemaMismatch {
            expected: FEATURE_LIST.join(", "),
            found: headers
                .iter()
                .map(|h| h.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

/// Scores rows with `model`. Probabilities are clamped to `[0, 1]`; a
/// non-finite score is treated as zero.
pub fn predict_flood_risk(model: &dyn FloodClassifier, rows: &[TrainingRow]) -> Vec<Prediction> {
    let features: Vec<[f64; 12]> = rows.iter().map(TrainingRow::features).collect();
    model
        .predict_proba(&features)
        .into_iter()
        .map(|p| {
            let probability = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
            Prediction {
                probability,
                risk: FloodRisk::from_probability(probability),
            }
        })
        .collect()
}
