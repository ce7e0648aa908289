//! Simulation output: one snapshot per completed step plus the initial state
//!
//! Snapshot `k` is the system at time `k * timestep`. Masses never change, so
//! they are stored once next to the snapshots. The only way to add snapshots
//! is from inside the crate while a run is in progress; a returned `Timeline`
//! is read-only.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::simulation::states::{BodyState, NVec2};

/// Full-system state at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub bodies: Vec<BodyState>,
}

impl Snapshot {
    pub fn new(bodies: Vec<BodyState>) -> Self {
        Self { bodies }
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = NVec2> + '_ {
        self.bodies.iter().map(|b| b.x)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    timestep: f64,
    masses: Vec<f64>,
    snapshots: Vec<Snapshot>,
}

impl Timeline {
    /// Timeline holding only the initial state
    pub(crate) fn new(timestep: f64, masses: Vec<f64>, initial: Snapshot) -> Self {
        Self {
            timestep,
            masses,
            snapshots: vec![initial],
        }
    }

    pub(crate) fn push(&mut self, snapshot: Snapshot) {
        debug_assert_eq!(snapshot.len(), self.masses.len());
        self.snapshots.push(snapshot);
    }

    pub fn timestep(&self) -> f64 {
        self.timestep
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn first(&self) -> Option<&Snapshot> {
        self.snapshots.first()
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// Simulated time of snapshot `k`
    pub fn time_of(&self, k: usize) -> f64 {
        k as f64 * self.timestep
    }

    /// Write the timeline as JSON, creating parent directories as needed
    pub fn save_json(&self, path: &Path) -> Result<(), SimError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self, SimError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
