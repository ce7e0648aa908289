//! Distributed kick-drift-kick leapfrog
//!
//! [`StepEngine::run`] starts one scoped thread per partition and keeps them
//! for the whole run. After a warm-up force evaluation every step is:
//!
//! 1. half-kick + drift of the worker's own bodies, using the current matrix
//! 2. force recomputation into the worker's own matrix shard, reading every
//!    partition's post-drift positions
//! 3. half-kick with the new matrix, then publish the partition state
//!
//! Each phase ends at a shared barrier. Phases 1 and 3 write only the worker's
//! partition and read the shards; phase 2 writes only the worker's shard and
//! reads the partitions, so no lock is ever contended.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Barrier, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread;

use tracing::{debug_span, trace, warn};

use crate::error::SimError;
use crate::simulation::force_matrix::{ForceMatrix, ForceTable, MatrixShard, ShardGuards};
use crate::simulation::forces::PairwiseGravity;
use crate::simulation::params::Parameters;
use crate::simulation::partition::{partition, Partition, PartitionLayout};
use crate::simulation::states::{Body, BodyState};
use crate::simulation::timeline::Snapshot;

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, SimError> {
    lock.read().map_err(|_| SimError::LockPoisoned)
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, SimError> {
    lock.write().map_err(|_| SimError::LockPoisoned)
}

/// Partitions, matrix shards and physics of one run
pub struct StepEngine {
    params: Parameters,
    gravity: PairwiseGravity,
    layout: PartitionLayout,
    partitions: Vec<RwLock<Partition>>,
    shards: Vec<RwLock<MatrixShard>>,
}

impl StepEngine {
    /// Validate the inputs and split the bodies across `params.workers` partitions
    pub fn new(params: &Parameters, bodies: &[Body]) -> Result<Self, SimError> {
        params.validate()?;
        for (i, body) in bodies.iter().enumerate() {
            body.validate(i)?;
        }

        let layout = partition(bodies.len(), params.workers)?;
        let partitions = layout.build(bodies).into_iter().map(RwLock::new).collect();
        let shards = ForceMatrix::new(&layout)
            .into_shards()
            .into_iter()
            .map(RwLock::new)
            .collect();

        Ok(Self {
            params: params.clone(),
            gravity: PairwiseGravity::new(params.G, params.softening),
            layout,
            partitions,
            shards,
        })
    }

    pub fn layout(&self) -> &PartitionLayout {
        &self.layout
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// Current state of every body, in global index order
    pub fn snapshot(&self) -> Result<Snapshot, SimError> {
        let mut bodies = Vec::with_capacity(self.layout.bodies());
        for part in &self.partitions {
            bodies.extend_from_slice(read(part)?.states());
        }
        Ok(Snapshot::new(bodies))
    }

    /// Copy of the matrix from the most recent force phase
    pub fn force_matrix(&self) -> Result<ForceMatrix, SimError> {
        let shards = self
            .shards
            .iter()
            .map(|shard| read(shard).map(|guard| guard.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ForceMatrix::from_shards(&self.layout, shards))
    }

    fn read_shards(&self) -> Result<ShardGuards<'_>, SimError> {
        let guards = self.shards.iter().map(read).collect::<Result<Vec<_>, _>>()?;
        Ok(ShardGuards {
            layout: &self.layout,
            guards,
        })
    }

    /// Warm up the force matrix, then advance `steps` steps
    ///
    /// `record(step, snapshot)` is called on the calling thread once per step,
    /// in step order, with the state after that step's final half-kick. The
    /// first worker error stops every worker at the next barrier and is
    /// returned.
    pub fn run<F>(&mut self, steps: usize, mut record: F) -> Result<(), SimError>
    where
        F: FnMut(usize, Snapshot),
    {
        let workers = self.layout.len();
        let rendezvous = Rendezvous {
            barrier: Barrier::new(workers),
            abort: AtomicBool::new(false),
            failure: Mutex::new(None),
        };
        let engine: &StepEngine = self;

        thread::scope(|scope| -> Result<(), SimError> {
            let (chunk_tx, chunk_rx) = mpsc::channel();
            let mut handles = Vec::with_capacity(workers);
            let mut starts = Vec::with_capacity(workers);

            for id in 0..workers {
                let (start_tx, start_rx) = mpsc::channel();
                let worker = Worker {
                    id,
                    engine,
                    rendezvous: &rendezvous,
                    chunks: chunk_tx.clone(),
                };
                let spawned = thread::Builder::new()
                    .name(format!("gravsim-worker-{id}"))
                    .spawn_scoped(scope, move || worker.run(steps, start_rx));
                match spawned {
                    Ok(handle) => {
                        handles.push(handle);
                        starts.push(start_tx);
                    }
                    Err(source) => {
                        // closing the start channels sends the spawned workers home
                        drop(starts);
                        return Err(SimError::Spawn { worker: id, source });
                    }
                }
            }
            drop(chunk_tx);

            for start in starts {
                // a closed channel means the worker is gone; its join reports it
                start.send(()).ok();
            }

            engine.collect(steps, chunk_rx, &mut record);

            for (id, handle) in handles.into_iter().enumerate() {
                if handle.join().is_err() {
                    return Err(SimError::WorkerPanicked(id));
                }
            }
            Ok(())
        })?;

        match rendezvous.failure.into_inner() {
            Ok(None) => Ok(()),
            Ok(Some(err)) => Err(err),
            Err(_) => Err(SimError::LockPoisoned),
        }
    }

    /// Reassemble published partition states into ordered snapshots
    fn collect<F>(&self, steps: usize, chunks: Receiver<Chunk>, record: &mut F)
    where
        F: FnMut(usize, Snapshot),
    {
        let workers = self.layout.len();
        let mut pending: BTreeMap<usize, Vec<Option<Vec<BodyState>>>> = BTreeMap::new();
        let mut next = 1;

        // ends once every worker has dropped its sender
        for chunk in chunks {
            let slots = pending.entry(chunk.step).or_insert_with(|| vec![None; workers]);
            slots[chunk.partition] = Some(chunk.states);

            loop {
                let ready = pending
                    .get(&next)
                    .is_some_and(|slots| slots.iter().all(Option::is_some));
                if !ready {
                    break;
                }
                let Some(slots) = pending.remove(&next) else {
                    break;
                };
                let bodies: Vec<BodyState> = slots.into_iter().flatten().flatten().collect();
                record(next, Snapshot::new(bodies));
                next += 1;
            }
        }

        if next <= steps {
            trace!(recorded = next - 1, steps, "run stopped early");
        }
    }
}

/// One partition's state after a step
struct Chunk {
    step: usize,
    partition: usize,
    states: Vec<BodyState>,
}

/// Synchronization shared by all workers of one run
struct Rendezvous {
    barrier: Barrier,
    abort: AtomicBool,
    failure: Mutex<Option<SimError>>,
}

impl Rendezvous {
    fn fail(&self, err: SimError) {
        if let Ok(mut slot) = self.failure.lock() {
            // first error wins
            if slot.is_none() {
                *slot = Some(err);
            }
        }
        self.abort.store(true, Ordering::Release);
    }
}

struct Worker<'a> {
    id: usize,
    engine: &'a StepEngine,
    rendezvous: &'a Rendezvous,
    chunks: Sender<Chunk>,
}

impl Worker<'_> {
    fn run(self, steps: usize, start: Receiver<()>) {
        let span = debug_span!("worker", id = self.id);
        let _enter = span.enter();

        if start.recv().is_err() {
            return;
        }

        // a(x_0) before the first half-kick
        if !self.phase(|| self.compute_forces(0)) {
            return;
        }

        for step in 1..=steps {
            if !self.phase(|| self.kick_drift(step)) {
                return;
            }
            if !self.phase(|| self.compute_forces(step)) {
                return;
            }
            if !self.phase(|| self.kick_publish(step)) {
                return;
            }
        }
    }

    /// Run one phase, then wait for every worker; `false` means the run is aborted
    fn phase(&self, work: impl FnOnce() -> Result<(), SimError>) -> bool {
        let outcome = panic::catch_unwind(AssertUnwindSafe(work))
            .unwrap_or_else(|_| Err(SimError::WorkerPanicked(self.id)));
        if let Err(err) = outcome {
            warn!(worker = self.id, error = %err, "worker failed, aborting run");
            self.rendezvous.fail(err);
        }
        self.rendezvous.barrier.wait();
        !self.rendezvous.abort.load(Ordering::Acquire)
    }

    /// Phase 1: v += a h/2, x += v h
    fn kick_drift(&self, step: usize) -> Result<(), SimError> {
        let h = self.engine.params.timestep;
        let half_h = 0.5 * h;

        let table = self.engine.read_shards()?;
        let mut part = write(&self.engine.partitions[self.id])?;
        for (i, s) in part.states_mut() {
            s.v += half_h * table.total_accel(i);
            s.x += h * s.v;
            if !s.is_finite() {
                return Err(SimError::NonFinite { body: i, step });
            }
        }
        Ok(())
    }

    /// Phase 2: clear the own shard and evaluate every pair (i, j), i owned, j > i
    fn compute_forces(&self, step: usize) -> Result<(), SimError> {
        let layout = &self.engine.layout;
        let n = layout.bodies();

        let parts = self
            .engine
            .partitions
            .iter()
            .map(read)
            .collect::<Result<Vec<_>, _>>()?;
        let body = |i: usize| parts[layout.owner_of(i)].position_mass(i);

        let mut shard = write(&self.engine.shards[self.id])?;
        shard.reset();

        let mut evaluated = 0usize;
        for i in shard.rows() {
            let body_i = body(i);
            for j in (i + 1)..n {
                if self.engine.gravity.evaluate(&mut shard, i, j, body_i, body(j)) {
                    evaluated += 1;
                }
            }
        }
        trace!(step, pairs = evaluated, "forces computed");
        Ok(())
    }

    /// Phase 3: v += a h/2, then hand a copy of the partition to the driver
    fn kick_publish(&self, step: usize) -> Result<(), SimError> {
        let half_h = 0.5 * self.engine.params.timestep;

        let states = {
            let table = self.engine.read_shards()?;
            let mut part = write(&self.engine.partitions[self.id])?;
            for (i, s) in part.states_mut() {
                s.v += half_h * table.total_accel(i);
                if !s.is_finite() {
                    return Err(SimError::NonFinite { body: i, step });
                }
            }
            part.states().to_vec()
        };

        self.chunks
            .send(Chunk {
                step,
                partition: self.id,
                states,
            })
            .map_err(|_| SimError::SnapshotChannelClosed)
    }
}
