//! Gravitational field baking for rendering
//!
//! Samples the field of every snapshot on a `density x density` grid spanning
//! `[-bounds, bounds]` on both axes and stores `ln |g|^2` per cell, together
//! with the global min/max needed to normalize a color map.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, SimError};
use crate::simulation::states::NVec2;
use crate::simulation::timeline::{Snapshot, Timeline};

/// Grid layout shared by all baked frames
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldGrid {
    pub bounds: f64,
    pub density: usize,
}

impl FieldGrid {
    pub fn new(bounds: f64, density: usize) -> Result<Self, ConfigurationError> {
        if !(bounds.is_finite() && bounds > 0.0) || density < 2 {
            return Err(ConfigurationError::InvalidField { bounds, density });
        }
        Ok(Self { bounds, density })
    }

    /// Coordinate of grid line `k` (evenly spaced, both ends included)
    pub fn coord(&self, k: usize) -> f64 {
        let step = 2.0 * self.bounds / (self.density - 1) as f64;
        -self.bounds + k as f64 * step
    }

    /// Sample point of row `r` (y) and column `c` (x)
    pub fn point(&self, r: usize, c: usize) -> NVec2 {
        NVec2::new(self.coord(c), self.coord(r))
    }
}

/// `ln |g|^2` sampled on a grid, row-major with rows along y
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFrame {
    pub values: Vec<f64>,
}

impl FieldFrame {
    pub fn at(&self, grid: &FieldGrid, r: usize, c: usize) -> f64 {
        self.values[r * grid.density + c]
    }

    fn min_max(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Sample the field of one snapshot
#[allow(non_snake_case)]
pub fn sample_field(grid: &FieldGrid, snapshot: &Snapshot, masses: &[f64], G: f64, softening: f64) -> FieldFrame {
    let eps2 = softening * softening;
    let mut values = Vec::with_capacity(grid.density * grid.density);

    for r in 0..grid.density {
        for c in 0..grid.density {
            let p = grid.point(r, c);
            let mut g = NVec2::zeros();
            for (x, m) in snapshot.positions().zip(masses) {
                let d = x - p;
                let d2 = d.norm_squared() + eps2;
                if d2 > 0.0 {
                    g += (G * m / (d2 * d2.sqrt())) * d;
                }
            }
            // clamp so a perfectly cancelled field stays finite
            values.push(g.norm_squared().max(f64::MIN_POSITIVE).ln());
        }
    }

    FieldFrame { values }
}

/// One frame per snapshot plus the global value range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakedFields {
    pub grid: FieldGrid,
    pub frames: Vec<FieldFrame>,
    pub min: f64,
    pub max: f64,
}

impl BakedFields {
    pub fn save_json(&self, path: &Path) -> Result<(), SimError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        serde_json::to_writer(BufWriter::new(File::create(path)?), self)?;
        Ok(())
    }
}

#[allow(non_snake_case)]
pub fn bake_fields(grid: &FieldGrid, timeline: &Timeline, G: f64, softening: f64) -> BakedFields {
    let frames: Vec<FieldFrame> = timeline
        .snapshots()
        .iter()
        .map(|s| sample_field(grid, s, timeline.masses(), G, softening))
        .collect();

    let (min, max) = frames
        .iter()
        .filter_map(FieldFrame::min_max)
        .fold(None, |acc: Option<(f64, f64)>, (lo, hi)| match acc {
            None => Some((lo, hi)),
            Some((a, b)) => Some((a.min(lo), b.max(hi))),
        })
        .unwrap_or((0.0, 0.0));

    BakedFields {
        grid: *grid,
        frames,
        min,
        max,
    }
}
