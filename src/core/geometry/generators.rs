//! Mesh generators for analytical test geometries
//!
//! Standard geometries used in validation: UV spheres for non-lifting flow
//! checks, and planar wings extruded from NACA 4-digit sections for lifting
//! cases. All generators produce outward-facing panel normals.

use glam::DVec3;
use std::f64::consts::PI;

use crate::core::geometry::lifting::{LiftingSurface, TrailingEdge};
use crate::core::geometry::surface::Surface;

/// Generate a spherical surface using latitude/longitude discretization:
/// quadrilateral bands with triangular polar caps.
///
/// # Arguments
/// * `radius` - Sphere radius
/// * `n_theta` - Number of divisions in the polar direction
/// * `n_phi` - Number of divisions in the azimuthal direction
pub fn uv_sphere(radius: f64, n_theta: usize, n_phi: usize) -> Surface {
    assert!(n_theta >= 3 && n_phi >= 3, "sphere resolution too coarse");

    let mut nodes = Vec::new();
    nodes.push(DVec3::new(0.0, 0.0, radius));
    for i in 1..n_theta {
        let theta = PI * i as f64 / n_theta as f64;
        for j in 0..n_phi {
            let phi = 2.0 * PI * j as f64 / n_phi as f64;
            nodes.push(DVec3::new(
                radius * theta.sin() * phi.cos(),
                radius * theta.sin() * phi.sin(),
                radius * theta.cos(),
            ));
        }
    }
    nodes.push(DVec3::new(0.0, 0.0, -radius));
    let south = nodes.len() - 1;

    let ring = |i: usize, j: usize| 1 + (i - 1) * n_phi + (j % n_phi);

    let mut panels = Vec::new();
    // North polar cap
    for j in 0..n_phi {
        panels.push([0, ring(1, j), ring(1, j + 1), ring(1, j + 1)]);
    }
    // Latitude bands
    for i in 1..n_theta - 1 {
        for j in 0..n_phi {
            panels.push([ring(i, j), ring(i + 1, j), ring(i + 1, j + 1), ring(i, j + 1)]);
        }
    }
    // South polar cap
    for j in 0..n_phi {
        panels.push([ring(n_theta - 1, j), south, ring(n_theta - 1, j + 1), ring(n_theta - 1, j + 1)]);
    }

    Surface::new(nodes, panels)
}

/// Half-thickness of a NACA 4-digit symmetric section with a closed trailing
/// edge, at chordwise position `x` in [0, 1].
fn naca4_half_thickness(thickness: f64, x: f64) -> f64 {
    5.0 * thickness
        * (0.2969 * x.sqrt() - 0.1260 * x - 0.3516 * x * x + 0.2843 * x.powi(3)
            - 0.1036 * x.powi(4))
}

/// Closed loop of section points for a NACA 4-digit symmetric profile with
/// unit chord and cosine chordwise clustering.
///
/// The loop starts at the trailing edge, runs forward along the lower
/// surface to the leading edge, and returns along the upper surface. The
/// trailing-edge point appears once; the loop has `2 * n_chordwise` points.
pub fn naca4_symmetric(thickness: f64, n_chordwise: usize) -> Vec<(f64, f64)> {
    assert!(n_chordwise >= 3, "section resolution too coarse");

    let station = |k: usize| 0.5 * (1.0 - (PI * k as f64 / n_chordwise as f64).cos());

    let mut points = Vec::with_capacity(2 * n_chordwise);
    points.push((1.0, 0.0));
    for i in 1..n_chordwise {
        let x = station(n_chordwise - i);
        points.push((x, -naca4_half_thickness(thickness, x)));
    }
    points.push((0.0, 0.0));
    for i in 1..n_chordwise {
        let x = station(i);
        points.push((x, naca4_half_thickness(thickness, x)));
    }
    points
}

/// Extrude a section loop into a planar wing spanning the y axis, centered on
/// the origin, and wrap it with trailing-edge topology.
///
/// `section` is a closed loop of `(x, z)` points starting at the trailing
/// edge and traversing the lower surface first, as produced by
/// [`naca4_symmetric`]. Wing tips are left open.
pub fn planar_wing(section: &[(f64, f64)], span: f64, n_spanwise: usize) -> LiftingSurface {
    let n_loop = section.len();
    assert!(n_loop >= 6, "section loop too short");
    assert!(n_spanwise >= 1);

    let mut nodes = Vec::with_capacity((n_spanwise + 1) * n_loop);
    for j in 0..=n_spanwise {
        let y = span * (j as f64 / n_spanwise as f64 - 0.5);
        for &(x, z) in section {
            nodes.push(DVec3::new(x, y, z));
        }
    }

    let node = |j: usize, i: usize| j * n_loop + (i % n_loop);

    let mut panels = Vec::with_capacity(n_spanwise * n_loop);
    for j in 0..n_spanwise {
        for i in 0..n_loop {
            panels.push([node(j, i), node(j, i + 1), node(j + 1, i + 1), node(j + 1, i)]);
        }
    }

    let surface = Surface::new(nodes, panels);

    let trailing_edge = TrailingEdge {
        upper_panels: (0..n_spanwise).map(|k| k * n_loop + (n_loop - 1)).collect(),
        lower_panels: (0..n_spanwise).map(|k| k * n_loop).collect(),
        nodes: (0..=n_spanwise).map(|k| k * n_loop).collect(),
        upper_nodes: (0..=n_spanwise).map(|k| k * n_loop + (n_loop - 1)).collect(),
        lower_nodes: (0..=n_spanwise).map(|k| k * n_loop + 1).collect(),
    };

    LiftingSurface::new(surface, trailing_edge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sphere_counts_and_orientation() {
        let n_theta = 8;
        let n_phi = 12;
        let sphere = uv_sphere(2.0, n_theta, n_phi);

        assert_eq!(sphere.n_nodes(), 2 + (n_theta - 1) * n_phi);
        assert_eq!(sphere.n_panels(), n_theta * n_phi);

        for i in 0..sphere.n_panels() {
            let c = sphere.panel_collocation_point(i, false);
            // Outward normals everywhere.
            assert!(sphere.panel_normal(i).dot(c) > 0.0);
        }
    }

    #[test]
    fn test_sphere_area_converges() {
        let sphere = uv_sphere(1.0, 16, 32);
        let total: f64 = (0..sphere.n_panels())
            .map(|i| sphere.panel_surface_area(i))
            .sum();
        assert_relative_eq!(total, 4.0 * PI, max_relative = 0.02);
    }

    #[test]
    fn test_naca_section_closed_and_symmetric() {
        let n = 10;
        let section = naca4_symmetric(0.12, n);
        assert_eq!(section.len(), 2 * n);
        assert_eq!(section[0], (1.0, 0.0));
        assert_eq!(section[n], (0.0, 0.0));
        // Lower and upper points mirror each other.
        for i in 1..n {
            let (xl, zl) = section[i];
            let (xu, zu) = section[2 * n - i];
            assert_relative_eq!(xl, xu, epsilon = 1e-12);
            assert_relative_eq!(zl, -zu, epsilon = 1e-12);
        }
        // Maximum thickness near 30% chord is close to nominal.
        let max_z = section.iter().map(|p| p.1).fold(0.0f64, f64::max);
        assert_relative_eq!(max_z, 0.06, max_relative = 0.02);
    }

    #[test]
    fn test_wing_normals_outward() {
        let section = naca4_symmetric(0.12, 10);
        let wing = planar_wing(&section, 4.0, 6);

        assert_eq!(wing.surface.n_panels(), 6 * 20);
        let mut saw_up = 0;
        let mut saw_down = 0;
        for i in 0..wing.surface.n_panels() {
            let n = wing.surface.panel_normal(i);
            let c = wing.surface.panel_collocation_point(i, false);
            // Normals point away from the chord plane on each side.
            if c.z > 1e-3 {
                assert!(n.z > 0.0);
                saw_up += 1;
            } else if c.z < -1e-3 {
                assert!(n.z < 0.0);
                saw_down += 1;
            }
        }
        assert!(saw_up > 0 && saw_down > 0);
    }
}
