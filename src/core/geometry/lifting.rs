//! Lifting surfaces
//!
//! A lifting surface is a panel surface with spanwise trailing-edge topology:
//! at each spanwise station exactly one upper and one lower panel meet the
//! trailing edge, and the wake attaches along the trailing-edge nodes.

use glam::DVec3;

use crate::core::geometry::surface::Surface;

/// Spanwise trailing-edge topology of a lifting surface.
///
/// All vectors are indexed by spanwise station; `nodes`, `upper_nodes`, and
/// `lower_nodes` have one more entry than the panel lists.
#[derive(Debug, Clone)]
pub struct TrailingEdge {
    /// Upper-surface panel adjacent to the trailing edge, per spanwise panel.
    pub upper_panels: Vec<usize>,
    /// Lower-surface panel adjacent to the trailing edge, per spanwise panel.
    pub lower_panels: Vec<usize>,
    /// Trailing-edge node index, per spanwise node.
    pub nodes: Vec<usize>,
    /// Upper-surface node just ahead of the trailing edge, per spanwise node.
    pub upper_nodes: Vec<usize>,
    /// Lower-surface node just ahead of the trailing edge, per spanwise node.
    pub lower_nodes: Vec<usize>,
}

/// A surface with spanwise trailing-edge topology.
#[derive(Debug, Clone)]
pub struct LiftingSurface {
    /// The underlying panel surface.
    pub surface: Surface,
    trailing_edge: TrailingEdge,
}

impl LiftingSurface {
    /// Wrap a surface with its trailing-edge topology.
    ///
    /// # Panics
    ///
    /// Panics if the upper/lower panel lists disagree in length or the node
    /// list is not one longer than the panel lists.
    pub fn new(surface: Surface, trailing_edge: TrailingEdge) -> Self {
        assert_eq!(
            trailing_edge.upper_panels.len(),
            trailing_edge.lower_panels.len(),
            "trailing edge upper/lower panel counts must agree"
        );
        assert_eq!(
            trailing_edge.nodes.len(),
            trailing_edge.upper_panels.len() + 1,
            "trailing edge node count must exceed panel count by one"
        );
        assert_eq!(trailing_edge.upper_nodes.len(), trailing_edge.nodes.len());
        assert_eq!(trailing_edge.lower_nodes.len(), trailing_edge.nodes.len());
        Self {
            surface,
            trailing_edge,
        }
    }

    /// Number of spanwise panels along the trailing edge.
    pub fn n_spanwise_panels(&self) -> usize {
        self.trailing_edge.upper_panels.len()
    }

    /// Number of spanwise nodes along the trailing edge.
    pub fn n_spanwise_nodes(&self) -> usize {
        self.trailing_edge.nodes.len()
    }

    /// Upper-surface panel adjacent to the trailing edge at spanwise station `k`.
    pub fn trailing_edge_upper_panel(&self, k: usize) -> usize {
        self.trailing_edge.upper_panels[k]
    }

    /// Lower-surface panel adjacent to the trailing edge at spanwise station `k`.
    pub fn trailing_edge_lower_panel(&self, k: usize) -> usize {
        self.trailing_edge.lower_panels[k]
    }

    /// Trailing-edge node index at spanwise node `k`.
    pub fn trailing_edge_node(&self, k: usize) -> usize {
        self.trailing_edge.nodes[k]
    }

    /// Trailing-edge node position at spanwise node `k`.
    pub fn trailing_edge_point(&self, k: usize) -> DVec3 {
        self.surface.nodes[self.trailing_edge.nodes[k]]
    }

    /// Unit bisector of the upper and lower surface departure directions at
    /// spanwise node `k`, pointing downstream off the trailing edge.
    pub fn trailing_edge_bisector(&self, k: usize) -> DVec3 {
        let te = self.surface.nodes[self.trailing_edge.nodes[k]];
        let upper = self.surface.nodes[self.trailing_edge.upper_nodes[k]];
        let lower = self.surface.nodes[self.trailing_edge.lower_nodes[k]];
        let from_upper = (te - upper).normalize_or_zero();
        let from_lower = (te - lower).normalize_or_zero();
        (from_upper + from_lower).normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use crate::core::geometry::generators::{naca4_symmetric, planar_wing};
    use approx::assert_relative_eq;

    #[test]
    fn test_trailing_edge_topology() {
        let section = naca4_symmetric(0.12, 8);
        let wing = planar_wing(&section, 4.0, 5);

        assert_eq!(wing.n_spanwise_panels(), 5);
        assert_eq!(wing.n_spanwise_nodes(), 6);
        for k in 0..wing.n_spanwise_panels() {
            let upper = wing.trailing_edge_upper_panel(k);
            let lower = wing.trailing_edge_lower_panel(k);
            assert_ne!(upper, lower);
            // Upper panels face up, lower panels face down.
            assert!(wing.surface.panel_normal(upper).z > 0.0);
            assert!(wing.surface.panel_normal(lower).z < 0.0);
        }
    }

    #[test]
    fn test_bisector_points_downstream() {
        let section = naca4_symmetric(0.12, 8);
        let wing = planar_wing(&section, 4.0, 5);
        for k in 0..wing.n_spanwise_nodes() {
            let bisector = wing.trailing_edge_bisector(k);
            assert_relative_eq!(bisector.length(), 1.0, epsilon = 1e-12);
            // For a symmetric section at zero incidence the bisector is the
            // chord direction.
            assert_relative_eq!(bisector.x, 1.0, epsilon = 1e-6);
        }
    }
}
