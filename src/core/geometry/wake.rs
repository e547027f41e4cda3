//! Wake sheets
//!
//! A wake is a growable surface of panels carrying frozen doublet strengths,
//! shed from a lifting surface's trailing edge. Nodes are stored layer by
//! layer, oldest first; the last layer coincides with the trailing edge at
//! emission time. Panels of the newest strip connect the two most recent node
//! layers, and their doublet coefficients are the ones the current solve
//! determines through the Kutta condition.

use glam::DVec3;

use crate::core::geometry::lifting::LiftingSurface;
use crate::core::geometry::surface::{Surface, SurfaceId};

/// A sheet of shed vorticity behind a lifting surface.
#[derive(Debug, Clone)]
pub struct Wake {
    /// The underlying panel surface; nodes and panels grow as layers are shed.
    pub surface: Surface,
    /// Doublet coefficient per wake panel, parallel to the panel index.
    pub doublet_coefficients: Vec<f64>,
    n_spanwise_nodes: usize,
    n_spanwise_panels: usize,
}

impl Wake {
    /// Create an empty wake for the given lifting surface.
    pub fn new(lifting_surface: &LiftingSurface) -> Self {
        Self {
            surface: Surface::new(Vec::new(), Vec::new()),
            doublet_coefficients: Vec::new(),
            n_spanwise_nodes: lifting_surface.n_spanwise_nodes(),
            n_spanwise_panels: lifting_surface.n_spanwise_panels(),
        }
    }

    /// Stable identity of the wake's surface.
    pub fn id(&self) -> SurfaceId {
        self.surface.id()
    }

    /// Number of wake panels. Always a multiple of the owning lifting
    /// surface's spanwise panel count.
    pub fn n_panels(&self) -> usize {
        self.surface.n_panels()
    }

    /// Number of wake nodes.
    pub fn n_nodes(&self) -> usize {
        self.surface.n_nodes()
    }

    /// Number of complete node layers.
    pub fn n_layers(&self) -> usize {
        self.surface.n_nodes() / self.n_spanwise_nodes
    }

    /// Append a fresh layer of nodes at the trailing edge. From the second
    /// layer on, this also creates the spanwise strip of panels connecting
    /// the previous layer to the new one, with zero doublet strength.
    pub fn add_layer(&mut self, lifting_surface: &LiftingSurface) {
        let n_sn = self.n_spanwise_nodes;
        let had_nodes = self.surface.n_nodes();

        let new_nodes: Vec<DVec3> = (0..n_sn)
            .map(|k| lifting_surface.trailing_edge_point(k))
            .collect();

        let mut new_panels = Vec::new();
        if had_nodes >= n_sn {
            let old_base = had_nodes - n_sn;
            let new_base = had_nodes;
            for j in 0..self.n_spanwise_panels {
                // Corner order puts the strip's normal on the upper-surface
                // side of the trailing edge.
                new_panels.push([old_base + j, old_base + j + 1, new_base + j + 1, new_base + j]);
                self.doublet_coefficients.push(0.0);
            }
        }

        self.surface.extend(new_nodes, new_panels);
    }

    /// Refresh wake state after node convection. Panel geometry is
    /// recomputed from the moved nodes; `dt` is available for strength decay
    /// or core-growth models.
    pub fn update_properties(&mut self, _dt: f64) {
        self.surface.compute_geometry();
    }

    /// Recompute panel geometry from the current node positions.
    pub fn compute_geometry(&mut self) {
        self.surface.compute_geometry();
    }

    /// Doublet potential influence of wake panel `j` on collocation point `i`
    /// of `observer`.
    pub fn doublet_influence(&self, observer: &Surface, i: usize, j: usize) -> f64 {
        self.surface.doublet_influence(observer, i, j)
    }

    /// Doublet potential influence of wake panel `j` at a field point.
    pub fn doublet_influence_at(&self, x: DVec3, j: usize) -> f64 {
        self.surface.doublet_influence_at(x, j)
    }

    /// Velocity induced at collocation point `i` of `observer` by a
    /// unit-circulation vortex ring on wake panel `j`.
    pub fn vortex_ring_unit_velocity_between(
        &self,
        observer: &Surface,
        i: usize,
        j: usize,
    ) -> DVec3 {
        self.surface.vortex_ring_unit_velocity_between(observer, i, j)
    }

    /// Velocity induced at a field point by a unit-circulation vortex ring on
    /// wake panel `j`.
    pub fn vortex_ring_unit_velocity(&self, x: DVec3, j: usize) -> DVec3 {
        self.surface.vortex_ring_unit_velocity(x, j)
    }
}
