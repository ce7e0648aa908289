//! Configuration types for loading simulation scenarios from YAML or JSON.
//!
//! A scenario consists of:
//!
//! - [`EngineConfig`]     – which integrator advances the system (optional)
//! - [`ParametersConfig`] – workers, step size, duration, softening, G
//! - [`BodyConfig`]       – initial state for each body
//! - [`FieldConfig`]      – optional field baking grid
//! - [`SaveConfig`]       – optional output location
//! - [`ScenarioConfig`]   – top-level wrapper
//!
//! # YAML format
//!
//! ```yaml
//! engine:
//!   integrator: "leapfrog"  # or "verlet" (serial reference)
//!
//! parameters:
//!   workers: 2              # worker threads / partitions
//!   timestep: 0.01          # fixed step size
//!   duration: 0.1           # total simulated time
//!   softening: 1.0e-6       # softening length
//!   G: 1.0                  # gravitational constant, defaults to 1
//!
//! bodies:
//!   - position: [-1.0, 0.0]
//!     velocity: [0.0, 0.5]
//!     mass: 1.0
//!   - position: [1.0, 0.0]
//!     velocity: [0.0, -0.5]
//!     mass: 1.0
//!
//! field:
//!   bounds: 2.0
//!   density: 64
//!
//! save:
//!   path: "out/two_body.json"
//! ```
//!
//! JSON files use the same structure. The scenario builder maps this onto the
//! runtime types and performs validation.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::SimError;

/// Which integrator advances the system
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegratorConfig {
    #[default]
    #[serde(rename = "leapfrog")] // Distributed kick-drift-kick leapfrog across `workers` threads
    Leapfrog,

    #[serde(rename = "verlet")] // Single-threaded velocity-Verlet reference, same physics
    Verlet,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub integrator: IntegratorConfig,
}

fn default_gravity() -> f64 {
    1.0
}

/// Numerical and physical parameters of a run
#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Clone)]
pub struct ParametersConfig {
    pub workers: i64, // signed so a negative count is reported, not a parse error
    pub timestep: f64, // fixed step size
    pub duration: f64, // total simulated time
    #[serde(default)]
    pub softening: f64, // softening length, prevents singular forces at tiny separations
    #[serde(default = "default_gravity")]
    pub G: f64, // gravitational constant
}

/// Initial state of a single body
#[derive(Deserialize, Debug, Clone)]
pub struct BodyConfig {
    pub position: [f64; 2],
    pub velocity: [f64; 2],
    pub mass: f64,
}

/// Grid used when baking gravitational fields
#[derive(Deserialize, Debug, Clone)]
pub struct FieldConfig {
    pub bounds: f64, // grid spans [-bounds, bounds] on both axes
    pub density: usize, // samples per axis
}

/// Where to write the resulting timeline
#[derive(Deserialize, Debug, Clone)]
pub struct SaveConfig {
    pub path: PathBuf,
}

/// Top-level scenario configuration
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    pub parameters: ParametersConfig,
    pub bodies: Vec<BodyConfig>,
    #[serde(default)]
    pub field: Option<FieldConfig>,
    #[serde(default)]
    pub save: Option<SaveConfig>,
}

impl ScenarioConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self, SimError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load a scenario file; `.json` is read as JSON, anything else as YAML
    pub fn load(path: &Path) -> Result<Self, SimError> {
        let reader = BufReader::new(File::open(path)?);
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(serde_json::from_reader(reader)?)
        } else {
            Ok(serde_yaml::from_reader(reader)?)
        }
    }
}
