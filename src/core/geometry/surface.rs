//! Panel surfaces
//!
//! A [`Surface`] is an ordered collection of panels over a shared node
//! buffer, with a process-wide stable identity. It provides the elementary
//! influence evaluations between panels and at field points, and the
//! tangential gradient operator that turns a per-panel scalar distribution
//! into a surface velocity.

use glam::{DMat3, DVec3};
use ndarray::ArrayView1;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::core::geometry::panel::Panel;

static NEXT_SURFACE_ID: AtomicUsize = AtomicUsize::new(0);

/// Stable process-wide surface identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(usize);

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// An ordered collection of panels with stable identity.
#[derive(Debug, Clone)]
pub struct Surface {
    id: SurfaceId,
    /// Node positions.
    pub nodes: Vec<DVec3>,
    /// Panels indexing into `nodes`.
    pub panels: Vec<Panel>,
    /// Edge-sharing neighbor panels, per panel.
    neighbors: Vec<Vec<usize>>,
}

impl Surface {
    /// Build a surface from node positions and panel corner indices.
    /// Triangles repeat their last corner index.
    pub fn new(nodes: Vec<DVec3>, panel_vertices: Vec<[usize; 4]>) -> Self {
        let panels = panel_vertices
            .into_iter()
            .map(|v| Panel::new(v, &nodes))
            .collect();
        let mut surface = Self {
            id: SurfaceId(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed)),
            nodes,
            panels,
            neighbors: Vec::new(),
        };
        surface.compute_topology();
        surface
    }

    /// Stable identity of this surface.
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Number of panels.
    pub fn n_panels(&self) -> usize {
        self.panels.len()
    }

    /// Number of nodes.
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Unit normal of the given panel.
    pub fn panel_normal(&self, panel: usize) -> DVec3 {
        self.panels[panel].normal
    }

    /// Area of the given panel.
    pub fn panel_surface_area(&self, panel: usize) -> f64 {
        self.panels[panel].area
    }

    /// Collocation point of the given panel, optionally displaced off the
    /// surface along the normal.
    pub fn panel_collocation_point(&self, panel: usize, above_surface: bool) -> DVec3 {
        self.panels[panel].collocation_point(above_surface)
    }

    /// Edge-sharing neighbors of the given panel.
    pub fn panel_neighbors(&self, panel: usize) -> &[usize] {
        &self.neighbors[panel]
    }

    /// Recompute all panel geometry after the node buffer has moved.
    pub fn compute_geometry(&mut self) {
        let nodes = std::mem::take(&mut self.nodes);
        for panel in &mut self.panels {
            panel.compute_geometry(&nodes);
        }
        self.nodes = nodes;
    }

    /// Apply a rigid rotation about `pivot` followed by a translation.
    pub fn transform(&mut self, rotation: DMat3, pivot: DVec3, translation: DVec3) {
        for node in &mut self.nodes {
            *node = rotation * (*node - pivot) + pivot + translation;
        }
        self.compute_geometry();
    }

    /// Translate all nodes.
    pub fn translate(&mut self, offset: DVec3) {
        for node in &mut self.nodes {
            *node += offset;
        }
        self.compute_geometry();
    }

    /// Append nodes and panels (wake growth), refreshing derived data.
    pub(crate) fn extend(&mut self, nodes: Vec<DVec3>, panel_vertices: Vec<[usize; 4]>) {
        self.nodes.extend(nodes);
        for v in panel_vertices {
            self.panels.push(Panel::new(v, &self.nodes));
        }
        self.compute_topology();
    }

    /// Source and doublet potential influence of panel `j` of this surface on
    /// collocation point `i` of `observer`. The same-panel doublet term is the
    /// interior limit 1/2.
    pub fn source_and_doublet_influence(
        &self,
        observer: &Surface,
        i: usize,
        j: usize,
    ) -> (f64, f64) {
        let x = observer.panel_collocation_point(i, false);
        let source = self.panels[j].source_influence(x, &self.nodes);
        let doublet = if self.id == observer.id() && i == j {
            0.5
        } else {
            self.panels[j].doublet_influence(x, &self.nodes)
        };
        (source, doublet)
    }

    /// Source and doublet potential influence of panel `j` at a field point.
    pub fn source_and_doublet_influence_at(&self, x: DVec3, j: usize) -> (f64, f64) {
        (
            self.panels[j].source_influence(x, &self.nodes),
            self.panels[j].doublet_influence(x, &self.nodes),
        )
    }

    /// Doublet potential influence of panel `j` on collocation point `i` of
    /// `observer`.
    pub fn doublet_influence(&self, observer: &Surface, i: usize, j: usize) -> f64 {
        if self.id == observer.id() && i == j {
            return 0.5;
        }
        let x = observer.panel_collocation_point(i, false);
        self.panels[j].doublet_influence(x, &self.nodes)
    }

    /// Doublet potential influence of panel `j` at a field point.
    pub fn doublet_influence_at(&self, x: DVec3, j: usize) -> f64 {
        self.panels[j].doublet_influence(x, &self.nodes)
    }

    /// Velocity induced at a field point by a unit-strength source on panel `j`.
    pub fn source_unit_velocity(&self, x: DVec3, j: usize) -> DVec3 {
        self.panels[j].source_unit_velocity(x, &self.nodes)
    }

    /// Velocity induced at a field point by a unit-circulation vortex ring on
    /// panel `j`.
    pub fn vortex_ring_unit_velocity(&self, x: DVec3, j: usize) -> DVec3 {
        self.panels[j].vortex_ring_unit_velocity(x, &self.nodes)
    }

    /// Vortex ring velocity of panel `j` at collocation point `i` of `observer`.
    pub fn vortex_ring_unit_velocity_between(&self, observer: &Surface, i: usize, j: usize) -> DVec3 {
        self.panels[j]
            .vortex_ring_unit_velocity(observer.panel_collocation_point(i, false), &self.nodes)
    }

    /// Tangential gradient at `panel` of a per-panel scalar field.
    ///
    /// `coefficients[offset + m]` holds the scalar for panel `m` of this
    /// surface. The gradient is a least-squares fit over the edge-sharing
    /// neighbors, evaluated in the panel's tangent plane, so the result is
    /// orthogonal to the panel normal.
    pub fn scalar_field_gradient(
        &self,
        coefficients: ArrayView1<f64>,
        offset: usize,
        panel: usize,
    ) -> DVec3 {
        let p = &self.panels[panel];
        let (t1, t2) = tangent_basis(p.normal);

        let f0 = coefficients[offset + panel];
        let x0 = p.collocation_point;

        let mut s11 = 0.0;
        let mut s12 = 0.0;
        let mut s22 = 0.0;
        let mut b1 = 0.0;
        let mut b2 = 0.0;
        for &m in &self.neighbors[panel] {
            let dx = self.panels[m].collocation_point - x0;
            let a1 = dx.dot(t1);
            let a2 = dx.dot(t2);
            let df = coefficients[offset + m] - f0;
            s11 += a1 * a1;
            s12 += a1 * a2;
            s22 += a2 * a2;
            b1 += a1 * df;
            b2 += a2 * df;
        }

        let det = s11 * s22 - s12 * s12;
        if det.abs() < 1e-30 {
            return DVec3::ZERO;
        }
        let g1 = (s22 * b1 - s12 * b2) / det;
        let g2 = (s11 * b2 - s12 * b1) / det;
        g1 * t1 + g2 * t2
    }

    fn compute_topology(&mut self) {
        use std::collections::HashMap;

        let mut edge_to_panels: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for (p, panel) in self.panels.iter().enumerate() {
            let n = panel.n_corners();
            for k in 0..n {
                let a = panel.vertices[k];
                let b = panel.vertices[(k + 1) % n];
                if a == b {
                    continue;
                }
                let key = (a.min(b), a.max(b));
                edge_to_panels.entry(key).or_default().push(p);
            }
        }

        let mut neighbors = vec![Vec::new(); self.panels.len()];
        for panels in edge_to_panels.values() {
            for &a in panels {
                for &b in panels {
                    if a != b && !neighbors[a].contains(&b) {
                        neighbors[a].push(b);
                    }
                }
            }
        }
        self.neighbors = neighbors;
    }
}

/// Orthonormal tangent basis for a plane with the given unit normal.
fn tangent_basis(normal: DVec3) -> (DVec3, DVec3) {
    let seed = if normal.x.abs() < 0.9 { DVec3::X } else { DVec3::Y };
    let t1 = (seed - seed.dot(normal) * normal).normalize_or_zero();
    let t2 = normal.cross(t1);
    (t1, t2)
}
