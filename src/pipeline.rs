/// Stage orchestration.
///
/// The pipeline runs four stages in order, each reading the artifacts the
/// previous ones wrote:
///
/// ```text
/// terrain ──┐
/// sync ─────┼──> fuse ──> training table
/// ground ───┘
/// ```
///
/// Every stage can also be run on its own. The fuse stage refuses to start
/// unless all three input artifacts exist.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::analysis::fusion::{self, FusionSummary};
use crate::config::PipelineConfig;
use crate::emitter::{self, TableSummary};
use crate::error::PipelineError;
use crate::ground_truth;
use crate::ingest::WeatherSource;
use crate::store;
use crate::sync::{self, SyncOutcome};
use crate::terrain::{self, TerrainOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Terrain,
    Sync,
    GroundTruth,
    Fuse,
    All,
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "terrain" => Ok(Stage::Terrain),
            "sync" => Ok(Stage::Sync),
            "ground-truth" => Ok(Stage::GroundTruth),
            "fuse" => Ok(Stage::Fuse),
            "all" => Ok(Stage::All),
            other => Err(format!(
                "unknown stage '{}' (expected terrain, sync, ground-truth, fuse or all)",
                other
            )),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Terrain => "terrain",
            Stage::Sync => "sync",
            Stage::GroundTruth => "ground-truth",
            Stage::Fuse => "fuse",
            Stage::All => "all",
        };
        write!(f, "{}", name)
    }
}

/// What each stage did during a run. Stages that did not run stay `None`.
#[derive(Debug, Default)]
pub struct RunReport {
    pub terrain: Option<TerrainOutcome>,
    pub sync: Option<SyncOutcome>,
    pub ground_truth_created: Option<bool>,
    pub fusion: Option<FusionSummary>,
    pub table: Option<TableSummary>,
}

const TERRAIN_HINT: &str = "Run the terrain stage first: flomon_dataset --stage terrain";
const WEATHER_HINT: &str = "Run the sync stage first: flomon_dataset --stage sync";
const GROUND_TRUTH_HINT: &str =
    "Run the ground-truth stage first: flomon_dataset --stage ground-truth";

/// Reads the three input artifacts, fuses them and writes the training table.
pub fn fuse_and_emit(
    config: &PipelineConfig,
) -> Result<(FusionSummary, TableSummary), PipelineError> {
    let paths = &config.paths;
    store::require_artifact(&paths.terrain, "terrain data", TERRAIN_HINT)?;
    store::require_artifact(&paths.weather_hydro, "hydro-weather data", WEATHER_HINT)?;
    store::require_artifact(&paths.ground_truth, "ground truth data", GROUND_TRUTH_HINT)?;

    tracing::info!(stage = "fusion", "Loading all data sources");
    let terrain = store::read_terrain(&paths.terrain)?;
    let observations = store::read_observations(&paths.weather_hydro)?;
    let events = store::read_flood_events(&paths.ground_truth)?;
    tracing::info!(
        stage = "fusion",
        terrain = terrain.len(),
        observations = observations.len(),
        events = events.len(),
        "Data sources loaded"
    );

    let table = fusion::fuse(observations, &terrain, &events, &config.labeling)?;
    let summary = emitter::emit_training_table(&table.records, &paths.training_table)?;
    Ok((table.summary, summary))
}

/// Runs `stage` (or every stage, in order) against `source`.
pub fn run(
    config: &PipelineConfig,
    source: &dyn WeatherSource,
    stage: Stage,
    now: DateTime<Utc>,
) -> Result<RunReport, PipelineError> {
    let mut report = RunReport::default();

    if matches!(stage, Stage::Terrain | Stage::All) {
        report.terrain = Some(terrain::collect_static_terrain(config, source)?);
    }
    if matches!(stage, Stage::Sync | Stage::All) {
        report.sync = Some(sync::synchronize(config, source, now)?);
    }
    if matches!(stage, Stage::GroundTruth | Stage::All) {
        report.ground_truth_created = Some(ground_truth::create_ground_truth_file(config)?);
    }
    if matches!(stage, Stage::Fuse | Stage::All) {
        let (fusion, table) = fuse_and_emit(config)?;
        report.fusion = Some(fusion);
        report.table = Some(table);
    }

    Ok(report)
}
