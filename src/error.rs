/// Error types for the dataset pipeline.
///
/// Two layers, matching how failures propagate:
/// - `FetchError` — a single data-source call failed. Always recoverable;
///   callers log it and skip the location.
/// - `PipelineError` — a stage could not produce its artifact. The fatal
///   variants carry a distinct process exit code.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of one call to the external data source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-2xx HTTP response.
    #[error("HTTP error: {0}")]
    Http(u16),

    /// Connection failure, DNS failure or timeout.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body could not be deserialized.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The response was well-formed but contained no usable records.
    #[error("No data returned: {0}")]
    EmptyPayload(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => FetchError::Http(status.as_u16()),
            None if err.is_decode() => FetchError::Parse(err.to_string()),
            None => FetchError::Transport(err.to_string()),
        }
    }
}

/// Failure of a pipeline stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error in '{}': {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An upstream artifact this stage depends on does not exist.
    #[error("Required {artifact} not found at '{}'.\n\n  {hint}", .path.display())]
    MissingArtifact {
        artifact: &'static str,
        path: PathBuf,
        hint: &'static str,
    },

    /// Synchronization reached no location successfully.
    #[error("No location returned data ({attempted} attempted). Nothing to merge; the pipeline cannot continue.")]
    NoDataFetched { attempted: usize },

    /// The spatial-temporal join produced no positive label.
    #[error("No flood events were matched to the time-series data ({events} events, {locations} locations). A binary classifier cannot be trained.")]
    NoPositiveLabels { events: usize, locations: usize },

    /// A feature table does not carry the canonical columns in order.
    #[error("Feature schema mismatch: expected [{expected}], found [{found}]")]
    SchemaMismatch { expected: String, found: String },
}

impl PipelineError {
    /// Process exit code for this failure.
    ///
    /// Fatal preconditions get their own codes so a wrapper script can tell
    /// "run the earlier stage" apart from "the data cannot be labeled".
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::MissingArtifact { .. } => 2,
            PipelineError::NoDataFetched { .. } => 3,
            PipelineError::NoPositiveLabels { .. } => 4,
            _ => 1,
        }
    }
}
