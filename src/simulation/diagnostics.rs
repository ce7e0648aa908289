//! Conserved quantities of a snapshot
//!
//! Used to judge integrator quality: total energy should stay bounded under
//! leapfrog, momentum and center of mass velocity should stay constant.

use crate::simulation::states::NVec2;
use crate::simulation::timeline::Snapshot;

/// Kinetic, potential and total energy of one snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Energy {
    pub kinetic: f64,
    pub potential: f64,
}

impl Energy {
    pub fn total(&self) -> f64 {
        self.kinetic + self.potential
    }
}

/// KE = sum 1/2 m v^2
pub fn kinetic_energy(snapshot: &Snapshot, masses: &[f64]) -> f64 {
    snapshot
        .bodies
        .iter()
        .zip(masses)
        .map(|(b, m)| 0.5 * m * b.v.norm_squared())
        .sum()
}

/// Softened pair potential, each pair counted once:
/// PE = -sum_{i<j} G m_i m_j / sqrt(r^2 + eps^2)
#[allow(non_snake_case)]
pub fn potential_energy(snapshot: &Snapshot, masses: &[f64], G: f64, softening: f64) -> f64 {
    let eps2 = softening * softening;
    let bodies = &snapshot.bodies;
    let mut pe = 0.0;
    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let d2 = (bodies[j].x - bodies[i].x).norm_squared() + eps2;
            if d2 > 0.0 {
                pe -= G * masses[i] * masses[j] / d2.sqrt();
            }
        }
    }
    pe
}

#[allow(non_snake_case)]
pub fn energy(snapshot: &Snapshot, masses: &[f64], G: f64, softening: f64) -> Energy {
    Energy {
        kinetic: kinetic_energy(snapshot, masses),
        potential: potential_energy(snapshot, masses, G, softening),
    }
}

/// Total linear momentum
pub fn momentum(snapshot: &Snapshot, masses: &[f64]) -> NVec2 {
    snapshot
        .bodies
        .iter()
        .zip(masses)
        .fold(NVec2::zeros(), |p, (b, m)| p + *m * b.v)
}

/// Mass-weighted mean position; the origin for an empty snapshot
pub fn center_of_mass(snapshot: &Snapshot, masses: &[f64]) -> NVec2 {
    let total: f64 = masses.iter().sum();
    if total == 0.0 {
        return NVec2::zeros();
    }
    let weighted = snapshot
        .bodies
        .iter()
        .zip(masses)
        .fold(NVec2::zeros(), |acc, (b, m)| acc + *m * b.x);
    weighted / total
}
