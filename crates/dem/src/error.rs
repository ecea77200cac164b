//! Error types.
//!
//! Only two kinds of failure ever leave the library: fatal configuration
//! problems found before the first step, and I/O on output or restart files.
//! Nothing raised inside a step crosses into the controller.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal configuration errors, detected once before the time loop starts.
///
/// Every message names the component that is misconfigured.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("simulation config: time step must be positive, got {0}")]
    NonPositiveTimeStep(f64),

    #[error("simulation config: maximum time must be positive, got {0}")]
    NonPositiveMaxTime(f64),

    #[error("simulation config: save cadence must be at least one step")]
    ZeroSaveCadence,

    #[error("simulation config: system dimension is not set")]
    DimensionUnset,

    #[error("species table: no species defined")]
    NoSpecies,

    #[error("{component}: unknown species {species}")]
    UnknownSpecies { component: String, species: usize },

    #[error("{component}: invalid radius {radius}")]
    InvalidRadius { component: String, radius: f64 },

    #[error("boundary registry: {requested} periodic image axes requested, only {available} available")]
    TooManyImageAxes { requested: usize, available: usize },

    #[error("boundary registry: only one angled periodic boundary is supported")]
    MultipleAngledBoundaries,

    #[error("{boundary} boundary: {reason}")]
    InvalidBoundary {
        boundary: &'static str,
        reason: String,
    },

    #[error("hierarchical grid: {0}")]
    InvalidGrid(String),
}

/// Errors surfaced by [`crate::simulation::Simulation::solve`] and the output sinks.
#[derive(Debug, Error)]
pub enum DemError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output write failed: {0}")]
    Write(#[from] std::io::Error),

    #[error("checkpoint encoding failed: {0}")]
    Checkpoint(#[from] serde_json::Error),

    #[error("checkpoint format version {found} is not supported (expected {expected})")]
    UnsupportedCheckpointVersion { found: u32, expected: u32 },
}
