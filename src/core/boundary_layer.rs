//! Boundary layer capability
//!
//! The solver couples to viscosity through a per-surface boundary layer that
//! supplies a blowing velocity (the wall-normal surrogate for displacement
//! thickness growth) and a friction force per panel. Implementations
//! recompute their state from the inviscid surface velocities each outer
//! iteration.

use glam::DVec3;
use ndarray::ArrayView2;

/// Per-surface boundary layer.
pub trait BoundaryLayer: Send + Sync {
    /// Recompute the boundary layer from the inviscid surface velocities,
    /// given as an (n_panels x 3) block.
    fn recalculate(&mut self, surface_velocities: ArrayView2<f64>);

    /// Blowing velocity for the given panel.
    fn blowing_velocity(&self, panel: usize) -> f64;

    /// Friction force acting on the given panel.
    fn friction(&self, panel: usize) -> DVec3;

    /// Whether this boundary layer participates in the viscous coupling
    /// iteration. The null implementation opts out; everything else is
    /// iterated until the doublet distribution settles.
    fn is_nontrivial(&self) -> bool {
        true
    }
}

/// Inviscid placeholder: zero blowing, zero friction, never iterated.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBoundaryLayer;

impl BoundaryLayer for NullBoundaryLayer {
    fn recalculate(&mut self, _surface_velocities: ArrayView2<f64>) {}

    fn blowing_velocity(&self, _panel: usize) -> f64 {
        0.0
    }

    fn friction(&self, _panel: usize) -> DVec3 {
        DVec3::ZERO
    }

    fn is_nontrivial(&self) -> bool {
        false
    }
}
