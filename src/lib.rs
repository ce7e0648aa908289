pub mod error;
pub mod simulation;
pub mod configuration;
pub mod benchmark;

pub use error::{ConfigurationError, SimError};

pub use simulation::states::{Body, BodyState, System, NVec2};
pub use simulation::params::Parameters;
pub use simulation::partition::{partition, Partition, PartitionLayout};
pub use simulation::force_matrix::{ForceMatrix, ForceTable, MatrixShard, PairCell};
pub use simulation::forces::{PairwiseGravity, Acceleration, AccelSet, NewtonianGravity};
pub use simulation::integrator::verlet_integrator;
pub use simulation::leapfrog::StepEngine;
pub use simulation::driver::Simulation;
pub use simulation::timeline::{Snapshot, Timeline};
pub use simulation::diagnostics::{energy, kinetic_energy, potential_energy, momentum, center_of_mass, Energy};
pub use simulation::field::{bake_fields, sample_field, BakedFields, FieldFrame, FieldGrid};
pub use simulation::scenario::Scenario;

pub use configuration::config::{IntegratorConfig, EngineConfig, ParametersConfig, BodyConfig, FieldConfig, SaveConfig, ScenarioConfig};

pub use benchmark::benchmark::{bench_workers, make_bodies};
