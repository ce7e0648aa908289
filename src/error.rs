//! Error types for configuration, simulation, and persistence
//!
//! Configuration problems are fatal and surface before any worker starts.
//! Everything a worker can hit while stepping ends the whole run.

use thiserror::Error;

/// Invalid run configuration or initial state
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("there must be at least 1 worker to simulate")]
    NoWorkers,

    #[error("worker count must be positive, got {0}")]
    NegativeWorkers(i64),

    #[error("timestep must be finite and > 0, got {0}")]
    InvalidTimestep(f64),

    #[error("duration must be finite and >= 0, got {0}")]
    InvalidDuration(f64),

    #[error("softening must be finite and >= 0, got {0}")]
    InvalidSoftening(f64),

    #[error("gravitational constant must be finite, got {0}")]
    InvalidGravity(f64),

    #[error("body {body} has invalid mass {mass} (must be finite and > 0)")]
    InvalidMass { body: usize, mass: f64 },

    #[error("body {body} has a non-finite position or velocity")]
    NonFiniteBody { body: usize },

    #[error("field grid needs bounds > 0 and density >= 2, got bounds {bounds}, density {density}")]
    InvalidField { bounds: f64, density: usize },
}

/// Any failure of a simulation run, including loading and saving
#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("body {body} reached a non-finite state at step {step}")]
    NonFinite { body: usize, step: usize },

    #[error("failed to spawn worker {worker}")]
    Spawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("worker {0} panicked")]
    WorkerPanicked(usize),

    #[error("a shared lock was poisoned by a panicking worker")]
    LockPoisoned,

    #[error("snapshot channel closed before the run finished")]
    SnapshotChannelClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
