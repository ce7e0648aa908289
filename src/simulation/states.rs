//! Core state types for the N-body simulation.
//!
//! - `Body` is one point mass as it enters the run (index = identity)
//! - `BodyState` is the mutable part of a body (position and velocity)
//! - `System` is a plain body list at time `t`, used by the serial integrator
//!
//! Everything is 2D, built on `NVec2`.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

pub type NVec2 = Vector2<f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub x: NVec2, // position
    pub v: NVec2, // velocity
    pub m: f64, // mass
}

impl Body {
    pub fn new(x: NVec2, v: NVec2, m: f64) -> Self {
        Self { x, v, m }
    }

    /// Position and velocity, without the mass
    pub fn state(&self) -> BodyState {
        BodyState { x: self.x, v: self.v }
    }

    /// Reject bodies the evaluator cannot handle (zero/negative mass, NaN or inf)
    pub fn validate(&self, index: usize) -> Result<(), ConfigurationError> {
        if !(self.m.is_finite() && self.m > 0.0) {
            return Err(ConfigurationError::InvalidMass { body: index, mass: self.m });
        }
        let finite = self.x.iter().chain(self.v.iter()).all(|c| c.is_finite());
        if !finite {
            return Err(ConfigurationError::NonFiniteBody { body: index });
        }
        Ok(())
    }
}

/// Position/velocity pair stored in partitions and snapshots
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    pub x: NVec2, // position
    pub v: NVec2, // velocity
}

impl BodyState {
    pub fn is_finite(&self) -> bool {
        self.x.iter().chain(self.v.iter()).all(|c| c.is_finite())
    }
}

#[derive(Debug, Clone)]
pub struct System {
    pub bodies: Vec<Body>, // 2d collection of bodies
    pub t: f64, // time
}
