//! Domain decomposition of the body list
//!
//! `partition(n, w)` splits `[0, n)` into `w` contiguous ranges. Every range
//! has `n / w` bodies except the last, which also takes the `n % w` remainder.
//! A `Partition` is the worker-owned copy of one range's states and masses.

use std::ops::Range;

use crate::error::ConfigurationError;
use crate::simulation::states::{Body, BodyState, NVec2};

/// Index ranges of all partitions for one run
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionLayout {
    n: usize, // total number of bodies
    base: usize, // size of every partition but the last
    ranges: Vec<Range<usize>>,
}

/// Split `n` bodies into `workers` contiguous ownership ranges
pub fn partition(n: usize, workers: usize) -> Result<PartitionLayout, ConfigurationError> {
    if workers == 0 {
        return Err(ConfigurationError::NoWorkers);
    }

    let base = n / workers;
    let ranges = (0..workers)
        .map(|k| {
            let start = k * base;
            // last job absorbs the remainder
            let end = if k == workers - 1 { n } else { start + base };
            start..end
        })
        .collect();

    Ok(PartitionLayout { n, base, ranges })
}

impl PartitionLayout {
    /// Number of partitions (= workers)
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Total number of bodies covered
    pub fn bodies(&self) -> usize {
        self.n
    }

    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    pub fn range(&self, k: usize) -> Range<usize> {
        self.ranges[k].clone()
    }

    /// Partition holding body `i`
    pub fn owner_of(&self, i: usize) -> usize {
        debug_assert!(i < self.n, "body {i} outside of 0..{}", self.n);
        let last = self.ranges.len() - 1;
        if self.base == 0 {
            // fewer bodies than workers: everything sits in the last partition
            return last;
        }
        (i / self.base).min(last)
    }

    /// Copy each range's states and masses out of the global body list
    pub fn build(&self, bodies: &[Body]) -> Vec<Partition> {
        debug_assert_eq!(bodies.len(), self.n);
        self.ranges
            .iter()
            .map(|range| Partition::new(range.clone(), &bodies[range.clone()]))
            .collect()
    }
}

/// A worker's exclusively owned slice of the body list
#[derive(Debug, Clone)]
pub struct Partition {
    range: Range<usize>,
    state: Vec<BodyState>,
    m: Vec<f64>,
}

impl Partition {
    fn new(range: Range<usize>, bodies: &[Body]) -> Self {
        Self {
            range,
            state: bodies.iter().map(Body::state).collect(),
            m: bodies.iter().map(|b| b.m).collect(),
        }
    }

    /// Global index range owned by this partition
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub fn states(&self) -> &[BodyState] {
        &self.state
    }

    pub fn masses(&self) -> &[f64] {
        &self.m
    }

    /// Position and mass of global body `i`, which must be owned here
    pub fn position_mass(&self, i: usize) -> (NVec2, f64) {
        let local = i - self.range.start;
        (self.state[local].x, self.m[local])
    }

    /// Owned states paired with their global index
    pub fn states_mut(&mut self) -> impl Iterator<Item = (usize, &mut BodyState)> {
        let start = self.range.start;
        self.state.iter_mut().enumerate().map(move |(local, s)| (start + local, s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_matches_ranges() {
        for n in 0..30 {
            for w in 1..8 {
                let layout = partition(n, w).unwrap();
                for (k, range) in layout.ranges().iter().enumerate() {
                    for i in range.clone() {
                        assert_eq!(layout.owner_of(i), k, "n={n} w={w} i={i}");
                    }
                }
            }
        }
    }

    #[test]
    fn build_copies_state_and_mass() {
        let bodies: Vec<Body> = (0..5)
            .map(|i| Body::new(NVec2::new(i as f64, 0.0), NVec2::new(0.0, -(i as f64)), 1.0 + i as f64))
            .collect();
        let layout = partition(5, 2).unwrap();
        let parts = layout.build(&bodies);

        assert_eq!(parts[0].range(), 0..2);
        assert_eq!(parts[1].range(), 2..5);
        assert_eq!(parts[1].masses(), &[3.0, 4.0, 5.0]);
        assert_eq!(parts[1].position_mass(4), (NVec2::new(4.0, 0.0), 5.0));
        assert_eq!(parts[0].states()[1], bodies[1].state());
    }
}
