//! Force / acceleration contributors for the n-body engine
//!
//! - [`PairwiseGravity`] evaluates one pair at a time into the force matrix,
//!   used by the distributed leapfrog engine
//! - [`AccelSet`] / [`NewtonianGravity`] sum accelerations directly, used by
//!   the serial reference integrator

use crate::simulation::force_matrix::MatrixShard;
use crate::simulation::states::{NVec2, System};

/// Softened Newtonian gravity between two bodies, written into the force matrix
#[allow(non_snake_case)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairwiseGravity {
    pub G: f64, // gravitational constant
    pub softening: f64, // softening length epsilon
}

impl PairwiseGravity {
    #[allow(non_snake_case)]
    pub fn new(G: f64, softening: f64) -> Self {
        Self { G, softening }
    }

    /// Accelerations of body 1 and body 2 caused by each other
    ///
    /// Body 1's acceleration comes from the softened inverse-square law; body 2's
    /// is its reaction scaled by `m1 / m2`, so `m1 * a1 == -m2 * a2` holds up to
    /// a single rounding.
    pub fn pair_accels(&self, x1: NVec2, m1: f64, x2: NVec2, m2: f64) -> (NVec2, NVec2) {
        // d points from body 1 to body 2
        let d = x2 - x1;

        // softened squared distance r2 = |d|^2 + eps^2
        let r2 = d.norm_squared() + self.softening * self.softening;
        if r2 == 0.0 {
            // coincident bodies without softening: no defined direction
            return (NVec2::zeros(), NVec2::zeros());
        }
        let inv_r3 = r2.powf(-1.5);

        // a1 = G * m2 * d / r^3, toward body 2
        let a1 = (self.G * m2 * inv_r3) * d;

        // Newton's third law: m1 a1 = -m2 a2
        let a2 = -a1 * (m1 / m2);

        (a1, a2)
    }

    /// Evaluate the pair `(i, j)` into `shard`
    ///
    /// Returns `false` without touching the shard for a self-pair, a pair whose
    /// lower index is not in the shard's rows, or a cell already written since
    /// the last reset. The caller's `&mut` borrow of the shard makes the
    /// check-then-write exclusive.
    pub fn evaluate(
        &self,
        shard: &mut MatrixShard,
        i: usize,
        j: usize,
        body_i: (NVec2, f64),
        body_j: (NVec2, f64),
    ) -> bool {
        if i == j {
            return false;
        }
        // always compute from the lower index's side
        let (lo, hi, body_lo, body_hi) = if i < j {
            (i, j, body_i, body_j)
        } else {
            (j, i, body_j, body_i)
        };

        let Some(cell) = shard.cell_mut(lo, hi) else {
            return false;
        };
        if cell.is_written() {
            return false;
        }

        let (a_lo, a_hi) = self.pair_accels(body_lo.0, body_lo.1, body_hi.0, body_hi.1);
        cell.write(a_lo, a_hi);
        true
    }
}

/// Collection of 2D acceleration terms
/// Each term implements [`Acceleration`] and their contributions are summed
/// into a single acceleration vector per body
pub struct AccelSet {
    terms: Vec<Box<dyn Acceleration + Send + Sync>>,
}

impl Default for AccelSet {
    fn default() -> Self {
        Self::new()
    }
}

impl AccelSet {
    /// Create an empty acceleration set
    pub fn new() -> Self {
        Self {
            terms: Vec::new()
        }
    }

    /// Add an acceleration term
    pub fn with<T>(mut self, term: T) -> Self
    where
        T: Acceleration + Send + Sync + 'static,
    {
        self.terms.push(Box::new(term));
        self
    }

    /// Compute total accelerations at time `t` for all bodies in `sys`
    /// - `out[i]` will be set to the sum of contributions from all terms
    pub fn accumulate_accels(&self, t: f64, sys: &System, out: &mut [NVec2]) {
        for a in out.iter_mut() {
            *a = NVec2::zeros();
        }
        for term in &self.terms {
            term.acceleration(t, sys, out);
        }
    }
}

/// Trait for 2D acceleration sources operating on [`System`]
/// Implementations add their contribution into `out[i]` for each body
pub trait Acceleration {
    fn acceleration(&self, t: f64, sys: &System, out: &mut [NVec2]);
}

/// Direct-sum Newtonian gravity with softening
#[allow(non_snake_case)]
pub struct NewtonianGravity {
    pub G: f64, // gravitational constant
    pub eps2: f64, // softening squared
}

impl Acceleration for NewtonianGravity {
    fn acceleration(&self, _t: f64, sys: &System, out: &mut [NVec2]) {
        let n = sys.bodies.len();

        // Loop over each unordered pair (i, j) with i < j
        for i in 0..n {
            let bi = &sys.bodies[i];

            for j in (i + 1)..n {
                let bj = &sys.bodies[j];

                // displacement from i to j; i is pulled along +r, j along -r
                let r = bj.x - bi.x;
                let d2 = r.norm_squared() + self.eps2;
                if d2 == 0.0 {
                    continue;
                }

                // coef = G / |r_soft|^3
                let inv_r = d2.sqrt().recip();
                let coef = self.G * inv_r * inv_r * inv_r;

                // a_i +=  G * m_j * r / |r_soft|^3
                // a_j += -G * m_i * r / |r_soft|^3
                out[i] += coef * bj.m * r;
                out[j] -= coef * bi.m * r;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::partition::partition;
    use crate::simulation::force_matrix::{ForceMatrix, ForceTable};

    #[test]
    fn second_evaluation_is_a_no_op() {
        let gravity = PairwiseGravity::new(1.0, 0.0);
        let layout = partition(3, 1).unwrap();
        let mut matrix = ForceMatrix::new(&layout);
        let a = (NVec2::new(0.0, 0.0), 1.0);
        let b = (NVec2::new(1.0, 0.0), 2.0);

        assert!(gravity.evaluate(matrix.shard_mut(0), 0, 2, a, b));
        assert!(!gravity.evaluate(matrix.shard_mut(0), 2, 0, b, a));
        assert!(!gravity.evaluate(matrix.shard_mut(0), 1, 1, a, a));
        assert_eq!(matrix.write_count(0, 2), 1);
        assert_eq!(matrix.get(0, 2), NVec2::new(2.0, 0.0));
        assert_eq!(matrix.get(2, 0), NVec2::new(-1.0, 0.0));
    }

    #[test]
    fn evaluation_outside_shard_rows_is_skipped() {
        let gravity = PairwiseGravity::new(1.0, 0.0);
        let layout = partition(4, 2).unwrap();
        let mut matrix = ForceMatrix::new(&layout);
        let a = (NVec2::new(0.0, 0.0), 1.0);
        let b = (NVec2::new(1.0, 0.0), 1.0);

        // pair (2, 3) belongs to partition 1
        assert!(!gravity.evaluate(matrix.shard_mut(0), 2, 3, a, b));
        assert!(gravity.evaluate(matrix.shard_mut(1), 3, 2, b, a));
        assert_eq!(matrix.write_count(2, 3), 1);
    }

    #[test]
    fn coincident_bodies_without_softening_feel_nothing() {
        let gravity = PairwiseGravity::new(1.0, 0.0);
        let x = NVec2::new(0.5, 0.5);
        let (a1, a2) = gravity.pair_accels(x, 1.0, x, 1.0);
        assert_eq!(a1, NVec2::zeros());
        assert_eq!(a2, NVec2::zeros());
    }
}
