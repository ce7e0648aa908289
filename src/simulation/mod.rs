pub mod states;
pub mod params;
pub mod partition;
pub mod force_matrix;
pub mod forces;
pub mod leapfrog;
pub mod integrator;
pub mod timeline;
pub mod driver;
pub mod diagnostics;
pub mod field;
pub mod scenario;
