//! Serial fixed-step reference integrator
//!
//! Single-threaded velocity-Verlet over a whole [`System`], driven by an
//! [`AccelSet`]. It shares no code with the distributed engine and is used to
//! cross-check it.

use super::forces::AccelSet;
use super::params::Parameters;
use super::states::{NVec2, System};

/// Advance the system by one step using velocity-Verlet
///
/// `accel` holds a_n on entry and a_n+1 on return, so each step costs a
/// single force evaluation once the caller has seeded it.
pub fn verlet_integrator(sys: &mut System, forces: &AccelSet, params: &Parameters, accel: &mut [NVec2]) {
    if sys.bodies.is_empty() {
        return;
    }

    let dt = params.timestep;
    let half_dt = 0.5 * dt;

    // Kick: v_n+1/2 = v_n + (dt/2) a_n
    for (b, a) in sys.bodies.iter_mut().zip(accel.iter()) {
        b.v += half_dt * *a;
    }

    // Drift: x_n+1 = x_n + dt v_n+1/2
    for b in sys.bodies.iter_mut() {
        b.x += dt * b.v;
    }

    sys.t += dt;

    // a_n+1 from x_n+1
    forces.accumulate_accels(sys.t, &*sys, accel);

    // Second kick: v_n+1 = v_n+1/2 + (dt/2) a_n+1
    for (b, a) in sys.bodies.iter_mut().zip(accel.iter()) {
        b.v += half_dt * *a;
    }
}
