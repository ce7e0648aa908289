//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (file-facing) and produces a runtime `Scenario`
//! containing:
//! - the chosen integrator
//! - a validated `Simulation` (parameters + bodies at t = 0)
//! - the optional field grid and output path

use std::path::PathBuf;

use tracing::info;

use crate::configuration::config::{BodyConfig, IntegratorConfig, ScenarioConfig};
use crate::error::{ConfigurationError, SimError};
use crate::simulation::driver::Simulation;
use crate::simulation::field::FieldGrid;
use crate::simulation::params::Parameters;
use crate::simulation::states::{Body, NVec2};
use crate::simulation::timeline::Timeline;

pub struct Scenario {
    pub integrator: IntegratorConfig,
    pub simulation: Simulation,
    pub field: Option<FieldGrid>,
    pub save: Option<PathBuf>,
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self, SimError> {
        // Bodies: map `BodyConfig` -> runtime `Body` using nalgebra vectors
        let bodies: Vec<Body> = cfg
            .bodies
            .iter()
            .map(|bc: &BodyConfig| Body {
                x: NVec2::new(bc.position[0], bc.position[1]),
                v: NVec2::new(bc.velocity[0], bc.velocity[1]),
                m: bc.mass,
            })
            .collect();

        let p_cfg = cfg.parameters;
        let workers = usize::try_from(p_cfg.workers)
            .map_err(|_| ConfigurationError::NegativeWorkers(p_cfg.workers))?;
        let parameters = Parameters {
            workers,
            timestep: p_cfg.timestep,
            duration: p_cfg.duration,
            softening: p_cfg.softening,
            G: p_cfg.G,
        };

        let field = cfg
            .field
            .map(|f| FieldGrid::new(f.bounds, f.density))
            .transpose()?;

        Ok(Self {
            integrator: cfg.engine.integrator,
            simulation: Simulation::new(parameters, bodies)?,
            field,
            save: cfg.save.map(|s| s.path),
        })
    }

    /// Replace the configured worker count
    pub fn with_workers(self, workers: usize) -> Result<Self, SimError> {
        let mut parameters = self.simulation.parameters().clone();
        parameters.workers = workers;
        let bodies = self.simulation.bodies().to_vec();
        Ok(Self {
            simulation: Simulation::new(parameters, bodies)?,
            ..self
        })
    }

    /// Run with the configured integrator
    pub fn run(&self) -> Result<Timeline, SimError> {
        info!(
            integrator = ?self.integrator,
            bodies = self.simulation.bodies().len(),
            "running scenario"
        );
        match self.integrator {
            IntegratorConfig::Leapfrog => self.simulation.run(),
            IntegratorConfig::Verlet => self.simulation.run_serial(),
        }
    }
}
