/// Spatiotemporal fusion and labeling for the flood-risk dataset.
///
/// Submodules:
/// - `groupings` — organizes the flat hydro-weather store into per-location series.
/// - `features` — forward-fill, trailing rolling means, calendar components.
/// - `spatial` — static R-tree over monitored locations, great-circle radius queries.
/// - `labeling` — trailing flood windows applied to one series.
/// - `fusion` — the stage entry point tying the above together.

pub mod features;
pub mod fusion;
pub mod groupings;
pub mod labeling;
pub mod spatial;
