use std::time::Instant;

use crate::error::SimError;
use crate::simulation::driver::Simulation;
use crate::simulation::params::Parameters;
use crate::simulation::states::{Body, NVec2};

/// Helper to build a deterministic disc of `n` bodies
pub fn make_bodies(n: usize) -> Vec<Body> {
    (0..n)
        .map(|i| {
            let i_f = i as f64;
            // deterministic positions, no rand needed
            let x = NVec2::new((i_f * 0.37).sin() * 5.0, (i_f * 0.13).cos() * 5.0);
            // slow tangential spin so the disc doesn't just collapse
            let v = 0.05 * NVec2::new(-x.y, x.x);
            Body::new(x, v, 1.0)
        })
        .collect()
}

fn make_params(workers: usize, steps: usize) -> Parameters {
    let timestep = 0.001;
    Parameters::new(workers, timestep, timestep * steps as f64, 1e-2).with_gravity(0.1)
}

/// Time the distributed leapfrog over a grid of body and worker counts
/// Paste output directly into a spreadsheet to graph
pub fn bench_workers(ns: &[usize], workers: &[usize], steps: usize) -> Result<(), SimError> {
    println!("N,workers,serial_ms,leapfrog_ms,speedup");

    for &n in ns {
        let bodies = make_bodies(n);

        // serial reference, timed once per N
        let serial = Simulation::new(make_params(1, steps), bodies.clone())?;
        let t0 = Instant::now();
        serial.run_serial()?;
        let serial_ms = t0.elapsed().as_secs_f64() * 1000.0 / steps.max(1) as f64;

        for &w in workers {
            let sim = Simulation::new(make_params(w, steps), bodies.clone())?;

            let t1 = Instant::now();
            sim.run()?;
            let ms = t1.elapsed().as_secs_f64() * 1000.0 / steps.max(1) as f64;

            println!("{},{},{:.6},{:.6},{:.2}", n, w, serial_ms, ms, serial_ms / ms);
        }
    }
    Ok(())
}
