/// Structured logging for the dataset pipeline
///
/// Installs a `tracing` subscriber writing to the console and, optionally,
/// to a plain-text log file. Also classifies per-location fetch failures so
/// that a service problem is reported louder than a location that simply has
/// no data.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt};

use crate::config::LoggingConfig;
use crate::error::{FetchError, PipelineError};

// ---------------------------------------------------------------------------
// Subscriber setup
// ---------------------------------------------------------------------------

/// Installs the global subscriber for this process.
///
/// `RUST_LOG` overrides `config.level`. If a subscriber is already installed
/// (integration tests, embedding applications) the existing one is kept.
pub fn init(config: &LoggingConfig) -> Result<(), PipelineError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let console = tracing_fmt::layer().with_target(false);

    let file_layer = match &config.file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init();

    Ok(())
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// The archive rejected the range, usually because it lags real time.
    Expected,
    /// Service degradation, quota exhaustion or an API change.
    Unexpected,
    /// The source answered but had nothing for this coordinate/range.
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Classify a data-source failure.
pub fn classify_fetch_failure(err: &FetchError) -> FailureType {
    match err {
        FetchError::Http(400) => FailureType::Expected,
        FetchError::EmptyPayload(_) => FailureType::Unknown,
        FetchError::Http(_) | FetchError::Transport(_) | FetchError::Parse(_) => {
            FailureType::Unexpected
        }
    }
}

/// Log a per-location fetch failure at a level matching its classification.
pub fn log_fetch_failure(location: &str, operation: &str, err: &FetchError) {
    let failure_type = classify_fetch_failure(err);
    match failure_type {
        FailureType::Expected => {
            tracing::debug!(location, "{} failed [{}]: {}; skipping", operation, failure_type, err)
        }
        FailureType::Unexpected => {
            tracing::error!(location, "{} failed [{}]: {}; skipping", operation, failure_type, err)
        }
        FailureType::Unknown => {
            tracing::warn!(location, "{} failed [{}]: {}; skipping", operation, failure_type, err)
        }
    }
}

// ---------------------------------------------------------------------------
// Summary Logging
// ---------------------------------------------------------------------------

/// Log a per-stage success/failure tally.
pub fn log_stage_summary(stage: &str, total: usize, successful: usize, failed: usize) {
    let message = format!(
        "{} complete: {}/{} successful, {} failed",
        stage, successful, total, failed
    );

    if failed == 0 {
        tracing::info!(stage, "{}", message);
    } else if successful == 0 {
        tracing::error!(stage, "{}", message);
    } else {
        tracing::warn!(stage, "{}", message);
    }
}
