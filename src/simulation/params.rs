//! Numerical and physical parameters for a run
//!
//! `Parameters` is the validated, immutable configuration handed to the
//! driver, the partitioner and the step engine:
//! - worker count,
//! - fixed step size and total simulated time,
//! - softening length and gravitational constant

use crate::error::ConfigurationError;

/// Tolerance used when turning `duration / timestep` into a step count
const STEP_COUNT_TOLERANCE: f64 = 1e-9;

#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub workers: usize, // number of partitions / worker threads
    pub timestep: f64, // fixed step size h
    pub duration: f64, // total simulated time
    pub softening: f64, // softening length epsilon
    pub G: f64, // gravitational constant
}

impl Parameters {
    /// Parameters in natural units (`G = 1`)
    pub fn new(workers: usize, timestep: f64, duration: f64, softening: f64) -> Self {
        Self {
            workers,
            timestep,
            duration,
            softening,
            G: 1.0,
        }
    }

    pub fn with_gravity(mut self, g: f64) -> Self {
        self.G = g;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.workers == 0 {
            return Err(ConfigurationError::NoWorkers);
        }
        if !(self.timestep.is_finite() && self.timestep > 0.0) {
            return Err(ConfigurationError::InvalidTimestep(self.timestep));
        }
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(ConfigurationError::InvalidDuration(self.duration));
        }
        if !(self.softening.is_finite() && self.softening >= 0.0) {
            return Err(ConfigurationError::InvalidSoftening(self.softening));
        }
        if !self.G.is_finite() {
            return Err(ConfigurationError::InvalidGravity(self.G));
        }
        Ok(())
    }

    /// Number of fixed steps covering `duration`, i.e. floor(duration / timestep).
    /// A ratio within 1e-9 (relative) of the next integer rounds up, so 0.3 / 0.1 is 3.
    pub fn steps(&self) -> usize {
        let ratio = self.duration / self.timestep;
        (ratio * (1.0 + STEP_COUNT_TOLERANCE)).floor() as usize
    }

    /// Softening length squared, the form the force laws use
    pub fn eps2(&self) -> f64 {
        self.softening * self.softening
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_count_floors_and_tolerates_rounding() {
        assert_eq!(Parameters::new(1, 0.01, 0.1, 0.0).steps(), 10);
        assert_eq!(Parameters::new(1, 0.1, 0.3, 0.0).steps(), 3);
        assert_eq!(Parameters::new(1, 0.4, 1.0, 0.0).steps(), 2);
        assert_eq!(Parameters::new(1, 0.5, 0.0, 0.0).steps(), 0);
    }

    #[test]
    fn validation_rejects_bad_values() {
        assert_eq!(
            Parameters::new(0, 0.1, 1.0, 0.0).validate(),
            Err(ConfigurationError::NoWorkers)
        );
        assert_eq!(
            Parameters::new(2, 0.0, 1.0, 0.0).validate(),
            Err(ConfigurationError::InvalidTimestep(0.0))
        );
        assert_eq!(
            Parameters::new(2, 0.1, -1.0, 0.0).validate(),
            Err(ConfigurationError::InvalidDuration(-1.0))
        );
        assert_eq!(
            Parameters::new(2, 0.1, 1.0, -0.5).validate(),
            Err(ConfigurationError::InvalidSoftening(-0.5))
        );
        assert!(Parameters::new(2, 0.1, 1.0, 0.0).with_gravity(f64::NAN).validate().is_err());
        assert!(Parameters::new(2, 0.1, 1.0, 1e-3).validate().is_ok());
    }
}
