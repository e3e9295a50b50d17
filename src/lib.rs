/// flomon_dataset: flood-risk training dataset pipeline for Pakistan.
///
/// # Module structure
///
/// ```text
/// flomon_dataset
/// ├── model        — shared data types (Coordinate, HourlyObservation, FusedRecord, …)
/// ├── error        — PipelineError / FetchError and process exit codes
/// ├── config       — pipeline configuration loader (pipeline.toml)
/// ├── logging      — tracing subscriber setup and fetch-failure classification
/// ├── store        — CSV artifact stores (terrain, hydro-weather, ground truth, table)
/// ├── ingest
/// │   ├── open_meteo — Open-Meteo archive + elevation APIs: URLs, parsing, client
/// │   └── fixtures (test only) — representative API response payloads
/// ├── terrain      — one-time elevation and slope collection
/// ├── sync         — incremental hydro-weather synchronizer
/// ├── ground_truth — curated historical flood events
/// ├── analysis
/// │   ├── groupings — flat observations into per-location series
/// │   ├── features  — forward-fill, rolling means, calendar features
/// │   ├── spatial   — R-tree great-circle radius queries
/// │   ├── labeling  — trailing flood windows
/// │   └── fusion    — the fusion stage
/// ├── emitter      — canonical feature table + class balance
/// ├── predict      — classifier contract and risk threshold
/// └── pipeline     — stage orchestration
/// ```

/// Public modules
pub mod analysis;
pub mod config;
pub mod emitter;
pub mod error;
pub mod ground_truth;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod predict;
pub mod store;
pub mod sync;
pub mod terrain;
