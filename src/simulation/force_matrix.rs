//! Pairwise acceleration table
//!
//! Entry `(i, j)` is the acceleration body `i` feels from body `j` alone.
//! Both directions of an unordered pair `{i, j}` (i < j) live in one
//! [`PairCell`], and cells are stored row-major over the upper triangle:
//!
//! ```text
//! row 0: (0,1) (0,2) ... (0,n-1)
//! row 1:       (1,2) ... (1,n-1)
//! ...
//! ```
//!
//! Rows of one partition are contiguous, so the triangle is cut into one
//! [`MatrixShard`] per partition. A shard is written only by the worker that
//! owns its rows, which makes every cell single-writer.

use std::ops::Range;
use std::sync::RwLockReadGuard;

use crate::simulation::partition::PartitionLayout;
use crate::simulation::states::NVec2;

/// Both accelerations of one unordered pair, plus how often it was written
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PairCell {
    on_lo: NVec2, // acceleration of the lower index caused by the higher one
    on_hi: NVec2, // reaction on the higher index
    writes: u32,
}

impl PairCell {
    pub fn is_written(&self) -> bool {
        self.writes > 0
    }

    pub fn writes(&self) -> u32 {
        self.writes
    }

    pub fn write(&mut self, on_lo: NVec2, on_hi: NVec2) {
        self.on_lo = on_lo;
        self.on_hi = on_hi;
        self.writes += 1;
    }
}

/// Number of pair cells in the rows before row `i`
fn row_offset(n: usize, i: usize) -> usize {
    // sum of (n - 1 - r) for r in 0..i
    i * (2 * n).saturating_sub(i + 1) / 2
}

/// The rows `[start, end)` of the upper triangle
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixShard {
    n: usize,
    rows: Range<usize>,
    offset: usize,
    cells: Vec<PairCell>,
}

impl MatrixShard {
    pub fn new(n: usize, rows: Range<usize>) -> Self {
        let offset = row_offset(n, rows.start);
        let len = row_offset(n, rows.end) - offset;
        Self {
            n,
            rows,
            offset,
            cells: vec![PairCell::default(); len],
        }
    }

    pub fn rows(&self) -> Range<usize> {
        self.rows.clone()
    }

    /// Total number of bodies in the matrix this shard belongs to
    pub fn bodies(&self) -> usize {
        self.n
    }

    /// Zero every cell, including the write counters
    pub fn reset(&mut self) {
        self.cells.fill(PairCell::default());
    }

    fn index(&self, lo: usize, hi: usize) -> Option<usize> {
        if !self.rows.contains(&lo) || hi <= lo || hi >= self.n {
            return None;
        }
        Some(row_offset(self.n, lo) - self.offset + (hi - lo - 1))
    }

    /// Cell of the pair `lo < hi`, if this shard owns row `lo`
    pub fn cell(&self, lo: usize, hi: usize) -> Option<&PairCell> {
        self.index(lo, hi).map(|k| &self.cells[k])
    }

    pub fn cell_mut(&mut self, lo: usize, hi: usize) -> Option<&mut PairCell> {
        self.index(lo, hi).map(move |k| &mut self.cells[k])
    }
}

/// Read access to a full matrix spread over per-partition shards
pub trait ForceTable {
    fn layout(&self) -> &PartitionLayout;

    /// Shard of partition `k`
    fn shard(&self, k: usize) -> &MatrixShard;

    /// Acceleration of body `i` caused by body `j`
    fn get(&self, i: usize, j: usize) -> NVec2 {
        if i == j {
            return NVec2::zeros();
        }
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        let owner = self.layout().owner_of(lo);
        match self.shard(owner).cell(lo, hi) {
            Some(cell) if i < j => cell.on_lo,
            Some(cell) => cell.on_hi,
            None => NVec2::zeros(),
        }
    }

    /// Sum of the contributions of every other body on `i`, in index order
    fn total_accel(&self, i: usize) -> NVec2 {
        let n = self.layout().bodies();
        let mut a = NVec2::zeros();
        for j in 0..n {
            if j != i {
                a += self.get(i, j);
            }
        }
        a
    }

    /// How many times the pair `(i, j)` was written since the last reset
    fn write_count(&self, i: usize, j: usize) -> u32 {
        if i == j {
            return 0;
        }
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        let owner = self.layout().owner_of(lo);
        self.shard(owner).cell(lo, hi).map_or(0, PairCell::writes)
    }
}

/// Owned copy of the whole matrix
#[derive(Debug, Clone, PartialEq)]
pub struct ForceMatrix {
    layout: PartitionLayout,
    shards: Vec<MatrixShard>,
}

impl ForceMatrix {
    /// Empty matrix sharded along `layout`
    pub fn new(layout: &PartitionLayout) -> Self {
        let n = layout.bodies();
        let shards = layout
            .ranges()
            .iter()
            .map(|rows| MatrixShard::new(n, rows.clone()))
            .collect();
        Self {
            layout: layout.clone(),
            shards,
        }
    }

    pub fn from_shards(layout: &PartitionLayout, shards: Vec<MatrixShard>) -> Self {
        debug_assert_eq!(layout.len(), shards.len());
        Self {
            layout: layout.clone(),
            shards,
        }
    }

    pub fn into_shards(self) -> Vec<MatrixShard> {
        self.shards
    }

    pub fn shard_mut(&mut self, k: usize) -> &mut MatrixShard {
        &mut self.shards[k]
    }

    pub fn reset(&mut self) {
        for shard in &mut self.shards {
            shard.reset();
        }
    }
}

impl ForceTable for ForceMatrix {
    fn layout(&self) -> &PartitionLayout {
        &self.layout
    }

    fn shard(&self, k: usize) -> &MatrixShard {
        &self.shards[k]
    }
}

/// Read guards over every shard, held by a worker during a kick phase
pub(crate) struct ShardGuards<'a> {
    pub(crate) layout: &'a PartitionLayout,
    pub(crate) guards: Vec<RwLockReadGuard<'a, MatrixShard>>,
}

impl ForceTable for ShardGuards<'_> {
    fn layout(&self) -> &PartitionLayout {
        self.layout
    }

    fn shard(&self, k: usize) -> &MatrixShard {
        &self.guards[k]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::partition::partition;

    #[test]
    fn shards_tile_the_triangle() {
        for n in 0..20 {
            for w in 1..6 {
                let layout = partition(n, w).unwrap();
                let matrix = ForceMatrix::new(&layout);
                let total: usize = (0..w).map(|k| matrix.shard(k).cells.len()).sum();
                assert_eq!(total, n * n.saturating_sub(1) / 2, "n={n} w={w}");
            }
        }
    }

    #[test]
    fn cell_lookup_respects_ownership() {
        let layout = partition(6, 2).unwrap();
        let mut matrix = ForceMatrix::new(&layout);

        assert!(matrix.shard_mut(0).cell_mut(1, 4).is_some());
        assert!(matrix.shard_mut(0).cell_mut(3, 4).is_none());
        assert!(matrix.shard_mut(1).cell_mut(3, 4).is_some());
        assert!(matrix.shard_mut(1).cell_mut(4, 4).is_none());
        assert!(matrix.shard_mut(1).cell_mut(4, 6).is_none());
    }

    #[test]
    fn get_reads_both_directions() {
        let layout = partition(4, 2).unwrap();
        let mut matrix = ForceMatrix::new(&layout);
        matrix
            .shard_mut(0)
            .cell_mut(1, 3)
            .unwrap()
            .write(NVec2::new(1.0, 2.0), NVec2::new(-3.0, -4.0));

        assert_eq!(matrix.get(1, 3), NVec2::new(1.0, 2.0));
        assert_eq!(matrix.get(3, 1), NVec2::new(-3.0, -4.0));
        assert_eq!(matrix.get(2, 2), NVec2::zeros());
        assert_eq!(matrix.write_count(3, 1), 1);
        assert_eq!(matrix.total_accel(3), NVec2::new(-3.0, -4.0));

        matrix.reset();
        assert_eq!(matrix.write_count(1, 3), 0);
        assert_eq!(matrix.get(1, 3), NVec2::zeros());
    }
}
