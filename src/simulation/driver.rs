//! Simulation driver
//!
//! Runs a validated configuration to completion and collects the Timeline:
//! snapshot 0 is the initial state, snapshot `k` the state after step `k`.

use std::time::Instant;

use tracing::{debug, info, info_span};

use crate::error::SimError;
use crate::simulation::forces::{AccelSet, NewtonianGravity};
use crate::simulation::integrator::verlet_integrator;
use crate::simulation::leapfrog::StepEngine;
use crate::simulation::params::Parameters;
use crate::simulation::states::{Body, NVec2, System};
use crate::simulation::timeline::{Snapshot, Timeline};

/// Logs step progress, at info level roughly every tenth of the run
struct Progress {
    steps: usize,
    every: usize,
}

impl Progress {
    fn new(steps: usize) -> Self {
        Self {
            steps,
            every: (steps / 10).max(1),
        }
    }

    fn report(&self, step: usize) {
        debug!(step, steps = self.steps, "step recorded");
        if step % self.every == 0 || step == self.steps {
            info!("iteration {step}/{}", self.steps);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Simulation {
    params: Parameters,
    bodies: Vec<Body>,
}

impl Simulation {
    /// Fails with a configuration error before any work is done
    pub fn new(params: Parameters, bodies: Vec<Body>) -> Result<Self, SimError> {
        params.validate()?;
        for (i, body) in bodies.iter().enumerate() {
            body.validate(i)?;
        }
        Ok(Self { params, bodies })
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    fn masses(&self) -> Vec<f64> {
        self.bodies.iter().map(|b| b.m).collect()
    }

    /// Run the distributed leapfrog engine over the full duration
    pub fn run(&self) -> Result<Timeline, SimError> {
        let steps = self.params.steps();
        let span = info_span!(
            "simulate",
            bodies = self.bodies.len(),
            workers = self.params.workers,
            steps
        );
        let _enter = span.enter();
        info!("starting simulation on {} worker(s)", self.params.workers);
        let started = Instant::now();

        let mut engine = StepEngine::new(&self.params, &self.bodies)?;
        let mut timeline = Timeline::new(self.params.timestep, self.masses(), engine.snapshot()?);
        let progress = Progress::new(steps);

        engine.run(steps, |step, snapshot| {
            timeline.push(snapshot);
            progress.report(step);
        })?;

        info!(
            snapshots = timeline.len(),
            "finished simulation in {:.3} seconds",
            started.elapsed().as_secs_f64()
        );
        Ok(timeline)
    }

    /// Same run with the single-threaded velocity-Verlet reference integrator
    pub fn run_serial(&self) -> Result<Timeline, SimError> {
        let steps = self.params.steps();
        let span = info_span!("simulate_serial", bodies = self.bodies.len(), steps);
        let _enter = span.enter();
        let started = Instant::now();

        let mut sys = System {
            bodies: self.bodies.clone(),
            t: 0.0,
        };
        let forces = AccelSet::new().with(NewtonianGravity {
            G: self.params.G,
            eps2: self.params.eps2(),
        });

        let mut accel = vec![NVec2::zeros(); sys.bodies.len()];
        forces.accumulate_accels(sys.t, &sys, &mut accel);

        let snapshot = |sys: &System| Snapshot::new(sys.bodies.iter().map(Body::state).collect());
        let mut timeline = Timeline::new(self.params.timestep, self.masses(), snapshot(&sys));
        let progress = Progress::new(steps);

        for step in 1..=steps {
            verlet_integrator(&mut sys, &forces, &self.params, &mut accel);
            if let Some(body) = sys.bodies.iter().position(|b| !b.state().is_finite()) {
                return Err(SimError::NonFinite { body, step });
            }
            timeline.push(snapshot(&sys));
            progress.report(step);
        }

        info!(
            snapshots = timeline.len(),
            "finished serial simulation in {:.3} seconds",
            started.elapsed().as_secs_f64()
        );
        Ok(timeline)
    }
}
