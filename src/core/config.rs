//! Solver options
//!
//! All numeric tunables and mode switches live in a single immutable record
//! constructed before a solve and threaded through the algorithm. Options are
//! serde-serializable so a driver can load them from JSON next to its case
//! definition.

use serde::{Deserialize, Serialize};

/// Numeric tunables and mode switches for a [`Solver`](crate::Solver).
///
/// The record is read-only for the lifetime of the solver; changing behavior
/// between runs means constructing a new solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Convect wake nodes with the local stream velocity. When disabled, the
    /// wake is a rigid sheet re-positioned behind the trailing edge each step.
    pub convect_wake: bool,

    /// Length of the prescribed wake sheet when `convect_wake` is off,
    /// measured from the trailing edge along the apparent velocity direction.
    pub static_wake_length: f64,

    /// Emit new wake vorticity along the trailing-edge bisector rather than
    /// along the reversed apparent velocity.
    pub wake_emission_follow_bisector: bool,

    /// Fraction of the local convection distance by which freshly emitted
    /// wake nodes are displaced off the trailing edge. Typically at most 1.
    pub wake_emission_distance_factor: f64,

    /// Retain the d(phi)/dt term in the surface pressure evaluation.
    pub unsteady_bernoulli: bool,

    /// Evaluate surface velocities with N. Marcov's formula (full-field
    /// disturbance velocity plus half the tangential doublet gradient)
    /// instead of the plain surface gradient.
    pub marcov_surface_velocity: bool,

    /// Cap on the outer viscous coupling loop.
    pub max_boundary_layer_iterations: usize,

    /// Euclidean-norm tolerance on the doublet increment between successive
    /// boundary-layer iterations.
    pub boundary_layer_iteration_tolerance: f64,

    /// Iteration cap for the dense doublet solve.
    pub linear_solver_max_iterations: usize,

    /// Relative residual tolerance for the dense doublet solve.
    pub linear_solver_tolerance: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            convect_wake: true,
            static_wake_length: 100.0,
            wake_emission_follow_bisector: false,
            wake_emission_distance_factor: 0.25,
            unsteady_bernoulli: false,
            marcov_surface_velocity: false,
            max_boundary_layer_iterations: 10,
            boundary_layer_iteration_tolerance: 1e-6,
            linear_solver_max_iterations: 1000,
            linear_solver_tolerance: 1e-8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = SolverOptions::default();
        assert!(options.convect_wake);
        assert!(options.wake_emission_distance_factor <= 1.0);
        assert!(options.linear_solver_tolerance > 0.0);
    }

    #[test]
    fn test_partial_json() {
        let options: SolverOptions =
            serde_json::from_str(r#"{"convect_wake": false, "static_wake_length": 20.0}"#).unwrap();
        assert!(!options.convect_wake);
        assert_eq!(options.static_wake_length, 20.0);
        // Unspecified fields fall back to defaults.
        assert_eq!(
            options.linear_solver_max_iterations,
            SolverOptions::default().linear_solver_max_iterations
        );
    }
}
