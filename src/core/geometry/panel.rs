//! Quadrilateral panels and their elementary influence kernels
//!
//! Each panel carries a constant-strength source and doublet distribution.
//! The kernels below evaluate, for unit strength, the induced velocity
//! potential and velocity at an arbitrary point:
//!
//! - doublet potential: signed solid angle of the panel (Van Oosterom &
//!   Strackee's triangle formula), divided by 4 pi
//! - source influence: Hess & Smith edge decomposition of the integral of
//!   1/r over the panel
//! - source velocity: edge-log in-plane terms plus the solid-angle normal
//!   term
//! - doublet velocity: Biot-Savart over the panel's edge loop with unit
//!   circulation (doublet-panel / vortex-ring equivalence)
//!
//! Sign conventions: the doublet kernel is negative on the normal side, so
//! the self-induced value just inside a closed body is +1/2 and the
//! on-surface potential of the solved distribution is `-mu`. The source
//! influence is the negated potential kernel (it is positive everywhere), so
//! the assembled Dirichlet system reads `A mu = S sigma` with no further
//! sign bookkeeping; potential reconstruction flips it back.

use glam::DVec3;
use std::f64::consts::PI;

/// Edges shorter than this fraction of the panel scale are treated as
/// degenerate (collapsed quad corner).
const DEGENERATE_EDGE: f64 = 1e-12;

/// A quadrilateral panel. Triangles are represented by repeating the last
/// corner.
#[derive(Debug, Clone)]
pub struct Panel {
    /// Corner node indices into the owning surface's node buffer.
    pub vertices: [usize; 4],
    /// Unit normal, oriented by the corner ordering (right-hand rule).
    pub normal: DVec3,
    /// Panel area.
    pub area: f64,
    /// Collocation point (centroid of the distinct corners).
    pub collocation_point: DVec3,
}

impl Panel {
    /// Build a panel from corner indices, computing its geometry from the
    /// given node positions.
    pub fn new(vertices: [usize; 4], nodes: &[DVec3]) -> Self {
        let mut panel = Self {
            vertices,
            normal: DVec3::ZERO,
            area: 0.0,
            collocation_point: DVec3::ZERO,
        };
        panel.compute_geometry(nodes);
        panel
    }

    /// Number of distinct corners (3 for a collapsed quad).
    pub fn n_corners(&self) -> usize {
        if self.vertices[2] == self.vertices[3] {
            3
        } else {
            4
        }
    }

    /// Recompute normal, area, and collocation point from node positions.
    ///
    /// The normal is taken along the cross product of the diagonals, which is
    /// well defined for mildly warped quads and reduces to the usual triangle
    /// normal for collapsed corners.
    pub fn compute_geometry(&mut self, nodes: &[DVec3]) {
        let v = self.corner_points(nodes);
        let d1 = v[2] - v[0];
        let d2 = v[3] - v[1];
        let cross = d1.cross(d2);
        self.area = 0.5 * cross.length();
        self.normal = cross.normalize_or_zero();

        let n = self.n_corners();
        let mut centroid = DVec3::ZERO;
        for p in v.iter().take(n) {
            centroid += *p;
        }
        self.collocation_point = centroid / n as f64;
    }

    /// Collocation point, optionally displaced off the surface along the
    /// normal (used where a field evaluation must not sit exactly on the
    /// singular sheet).
    pub fn collocation_point(&self, above_surface: bool) -> DVec3 {
        if above_surface {
            self.collocation_point + 1e-2 * self.area.sqrt() * self.normal
        } else {
            self.collocation_point
        }
    }

    fn corner_points(&self, nodes: &[DVec3]) -> [DVec3; 4] {
        [
            nodes[self.vertices[0]],
            nodes[self.vertices[1]],
            nodes[self.vertices[2]],
            nodes[self.vertices[3]],
        ]
    }

    /// Signed solid angle subtended by the panel at `x`, by the Van Oosterom
    /// & Strackee formula over the panel's triangle fan. Negative on the
    /// normal side.
    pub fn solid_angle(&self, x: DVec3, nodes: &[DVec3]) -> f64 {
        let v = self.corner_points(nodes);
        let mut omega = triangle_solid_angle(x, v[0], v[1], v[2]);
        if self.n_corners() == 4 {
            omega += triangle_solid_angle(x, v[0], v[2], v[3]);
        }
        omega
    }

    /// Velocity potential at `x` induced by a unit-strength doublet
    /// distribution on this panel.
    pub fn doublet_influence(&self, x: DVec3, nodes: &[DVec3]) -> f64 {
        self.solid_angle(x, nodes) / (4.0 * PI)
    }

    /// Source influence coefficient of this panel at `x`: the negated
    /// velocity potential of a unit-strength source distribution,
    /// `(1 / 4 pi) * integral of dS / r`.
    pub fn source_influence(&self, x: DVec3, nodes: &[DVec3]) -> f64 {
        let v = self.corner_points(nodes);
        let z = self.normal.dot(x - self.collocation_point);

        let mut edge_sum = 0.0;
        for (a, b) in self.edges(&v) {
            let e = b - a;
            let d = e.length();
            if d < DEGENERATE_EDGE {
                continue;
            }
            let ra = x.distance(a);
            let rb = x.distance(b);
            let denom = ra + rb - d;
            if denom < DEGENERATE_EDGE {
                // Observer on the edge segment itself; the in-plane distance
                // vanishes there and the edge contributes nothing.
                continue;
            }
            // Signed in-plane distance from the observer to the edge,
            // positive inside the panel for the corner ordering.
            let zeta = e.cross(x - a).dot(self.normal) / d;
            edge_sum += zeta * ((ra + rb + d) / denom).ln();
        }

        (edge_sum - z.abs() * self.solid_angle(x, nodes).abs()) / (4.0 * PI)
    }

    /// Velocity at `x` induced by a unit-strength source distribution.
    pub fn source_unit_velocity(&self, x: DVec3, nodes: &[DVec3]) -> DVec3 {
        let v = self.corner_points(nodes);
        let z = self.normal.dot(x - self.collocation_point);

        let mut in_plane = DVec3::ZERO;
        for (a, b) in self.edges(&v) {
            let e = b - a;
            let d = e.length();
            if d < DEGENERATE_EDGE {
                continue;
            }
            let ra = x.distance(a);
            let rb = x.distance(b);
            let denom = ra + rb - d;
            if denom < DEGENERATE_EDGE {
                continue;
            }
            let log_term = ((ra + rb + d) / denom).ln();
            in_plane -= log_term * self.normal.cross(e / d);
        }

        let w = z.signum() * self.solid_angle(x, nodes).abs();
        (in_plane + w * self.normal) / (4.0 * PI)
    }

    /// Velocity at `x` induced by a vortex ring of unit circulation running
    /// along the panel's edges in corner order. Equivalent to the velocity of
    /// the unit doublet distribution.
    pub fn vortex_ring_unit_velocity(&self, x: DVec3, nodes: &[DVec3]) -> DVec3 {
        let v = self.corner_points(nodes);
        let mut velocity = DVec3::ZERO;
        for (a, b) in self.edges(&v) {
            let r1 = x - a;
            let r2 = x - b;
            let cross = r1.cross(r2);
            let cross_sq = cross.length_squared();
            let d_sq = (b - a).length_squared();
            if d_sq < DEGENERATE_EDGE || cross_sq < 1e-12 * d_sq * d_sq {
                // On or nearly on the filament; the regularized core carries
                // no induced velocity.
                continue;
            }
            let r1n = r1.length();
            let r2n = r2.length();
            velocity += cross * (r1n + r2n) * (1.0 - r1.dot(r2) / (r1n * r2n)) / cross_sq;
        }
        velocity / (4.0 * PI)
    }

    fn edges(&self, v: &[DVec3; 4]) -> impl Iterator<Item = (DVec3, DVec3)> {
        let v = *v;
        (0..4).map(move |k| (v[k], v[(k + 1) % 4]))
    }
}

/// Solid angle of the triangle (a, b, c) seen from `x`, signed by the
/// triangle orientation.
fn triangle_solid_angle(x: DVec3, a: DVec3, b: DVec3, c: DVec3) -> f64 {
    let r1 = a - x;
    let r2 = b - x;
    let r3 = c - x;
    let l1 = r1.length();
    let l2 = r2.length();
    let l3 = r3.length();
    let numerator = r1.dot(r2.cross(r3));
    let denominator = l1 * l2 * l3 + r1.dot(r2) * l3 + r2.dot(r3) * l1 + r3.dot(r1) * l2;
    2.0 * numerator.atan2(denominator)
}
