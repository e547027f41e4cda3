//! Panel-method solver core
//!
//! ## Architecture
//!
//! - `config`: immutable solver options (wake handling, tolerances, modes)
//! - `geometry`: panels, surfaces, lifting surfaces, wakes, mesh generators
//! - `body`: kinematic frame grouping surfaces, wakes, and boundary layers
//! - `boundary_layer`: blowing-velocity/friction capability + null implementation
//! - `linalg`: linear operator abstraction and the warm-started BiCGSTAB solver
//! - `solver`: influence system assembly, Kutta closure, surface quantities,
//!   wake lifecycle, loads, and step logging
//! - `io`: surface writer capability (JSON)
//! - `parallel`: portable data-parallel iteration (Rayon or sequential)

pub mod body;
pub mod boundary_layer;
pub mod config;
pub mod geometry;
pub mod io;
pub mod linalg;
pub mod parallel;
pub mod solver;

pub use body::{Body, BodyHandle};
pub use boundary_layer::{BoundaryLayer, NullBoundaryLayer};
pub use config::SolverOptions;
pub use geometry::{LiftingSurface, Surface, SurfaceId, Wake};
pub use solver::{Solver, SolverError};
