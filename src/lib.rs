//! # aeropanel: a source-doublet panel method
//!
//! Low-order unsteady panel method for three-dimensional incompressible
//! potential flow around arbitrary bodies, with lifting surfaces and free or
//! prescribed wakes.
//!
//! ## Features
//!
//! - Dirichlet source-doublet formulation with a dense influence system
//! - Kutta condition wiring lifting-surface trailing edges into the wake
//! - Unsteady Bernoulli pressures and wake convection
//! - Viscous coupling through a pluggable blowing-velocity boundary layer
//! - Parallel execution with Rayon
//!

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)] // Scientific code often has many parameters

pub mod core;

// Re-exports
pub use crate::core::body::{Body, BodyHandle};
pub use crate::core::boundary_layer::{BoundaryLayer, NullBoundaryLayer};
pub use crate::core::config::SolverOptions;
pub use crate::core::geometry::{LiftingSurface, Surface, SurfaceId, Wake};
pub use crate::core::io::{JsonSurfaceWriter, SurfaceWriter};
pub use crate::core::solver::{Solver, SolverError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
