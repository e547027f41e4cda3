//! Bodies
//!
//! A body groups a kinematic frame with the surfaces moving in it: plain
//! surfaces, and lifting surfaces bundled with their wakes and boundary
//! layers. The body exclusively owns its surfaces for its lifetime; the
//! solver takes ownership of bodies as they are registered.

use glam::{DMat3, DVec3};

use crate::core::boundary_layer::{BoundaryLayer, NullBoundaryLayer};
use crate::core::geometry::{LiftingSurface, Surface, Wake};

/// Opaque handle to a body registered with a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub(crate) usize);

/// A non-lifting surface with its boundary layer.
pub struct SurfaceData {
    /// The panel surface.
    pub surface: Surface,
    /// Viscous coupling for this surface.
    pub boundary_layer: Box<dyn BoundaryLayer>,
}

/// A lifting surface with its wake and boundary layer.
pub struct LiftingSurfaceData {
    /// The lifting surface.
    pub lifting_surface: LiftingSurface,
    /// The wake shed from its trailing edge.
    pub wake: Wake,
    /// Viscous coupling for this surface.
    pub boundary_layer: Box<dyn BoundaryLayer>,
}

/// A kinematic frame owning surfaces, wakes, and boundary layers.
pub struct Body {
    /// Body identifier, used for log folder naming.
    pub id: String,
    /// Reference point of the kinematic frame.
    pub position: DVec3,
    /// Linear velocity of the frame.
    pub velocity: DVec3,
    /// Rotational velocity of the frame, about `position`.
    pub rotational_velocity: DVec3,
    /// Non-lifting surfaces.
    pub non_lifting_surfaces: Vec<SurfaceData>,
    /// Lifting surface bundles.
    pub lifting_surfaces: Vec<LiftingSurfaceData>,
}

impl Body {
    /// Create an empty body at rest at the origin.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position: DVec3::ZERO,
            velocity: DVec3::ZERO,
            rotational_velocity: DVec3::ZERO,
            non_lifting_surfaces: Vec::new(),
            lifting_surfaces: Vec::new(),
        }
    }

    /// Add a non-lifting surface with an inviscid (null) boundary layer.
    pub fn add_non_lifting_surface(&mut self, surface: Surface) {
        self.add_non_lifting_surface_with_boundary_layer(surface, Box::new(NullBoundaryLayer));
    }

    /// Add a non-lifting surface with the given boundary layer.
    pub fn add_non_lifting_surface_with_boundary_layer(
        &mut self,
        surface: Surface,
        boundary_layer: Box<dyn BoundaryLayer>,
    ) {
        self.non_lifting_surfaces.push(SurfaceData {
            surface,
            boundary_layer,
        });
    }

    /// Add a lifting surface with an inviscid (null) boundary layer. A fresh
    /// empty wake is attached to its trailing edge.
    pub fn add_lifting_surface(&mut self, lifting_surface: LiftingSurface) {
        self.add_lifting_surface_with_boundary_layer(lifting_surface, Box::new(NullBoundaryLayer));
    }

    /// Add a lifting surface with the given boundary layer.
    pub fn add_lifting_surface_with_boundary_layer(
        &mut self,
        lifting_surface: LiftingSurface,
        boundary_layer: Box<dyn BoundaryLayer>,
    ) {
        let wake = Wake::new(&lifting_surface);
        self.lifting_surfaces.push(LiftingSurfaceData {
            lifting_surface,
            wake,
            boundary_layer,
        });
    }

    /// Kinematic velocity of the given panel's collocation point.
    pub fn panel_kinematic_velocity(&self, surface: &Surface, panel: usize) -> DVec3 {
        let x = surface.panel_collocation_point(panel, false);
        self.velocity + self.rotational_velocity.cross(x - self.position)
    }

    /// Kinematic velocity of the given node.
    pub fn node_kinematic_velocity(&self, surface: &Surface, node: usize) -> DVec3 {
        let x = surface.nodes[node];
        self.velocity + self.rotational_velocity.cross(x - self.position)
    }

    /// Move the body to a new reference position, translating its surfaces
    /// with it. Wakes stay where they were shed.
    pub fn set_position(&mut self, position: DVec3) {
        let offset = position - self.position;
        self.position = position;
        for data in &mut self.non_lifting_surfaces {
            data.surface.translate(offset);
        }
        for data in &mut self.lifting_surfaces {
            data.lifting_surface.surface.translate(offset);
        }
    }

    /// Rotate the body's surfaces about its reference position. Wakes stay
    /// where they were shed.
    pub fn rotate(&mut self, rotation: DMat3) {
        for data in &mut self.non_lifting_surfaces {
            data.surface.transform(rotation, self.position, DVec3::ZERO);
        }
        for data in &mut self.lifting_surfaces {
            data.lifting_surface
                .surface
                .transform(rotation, self.position, DVec3::ZERO);
        }
    }

    /// Total panel count over all non-wake surfaces of this body.
    pub fn n_panels(&self) -> usize {
        self.non_lifting_surfaces
            .iter()
            .map(|d| d.surface.n_panels())
            .sum::<usize>()
            + self
                .lifting_surfaces
                .iter()
                .map(|d| d.lifting_surface.surface.n_panels())
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::generators::uv_sphere;
    use approx::assert_relative_eq;

    #[test]
    fn test_kinematic_velocity() {
        let mut body = Body::new("rotor");
        body.add_non_lifting_surface(uv_sphere(1.0, 6, 8));
        body.velocity = DVec3::new(1.0, 0.0, 0.0);
        body.rotational_velocity = DVec3::new(0.0, 0.0, 2.0);

        let surface = &body.non_lifting_surfaces[0].surface;
        let x = surface.panel_collocation_point(10, false);
        let v = body.panel_kinematic_velocity(surface, 10);
        let expected = body.velocity + DVec3::new(0.0, 0.0, 2.0).cross(x);
        assert_relative_eq!(v.x, expected.x, epsilon = 1e-12);
        assert_relative_eq!(v.y, expected.y, epsilon = 1e-12);
    }

    #[test]
    fn test_set_position_translates_surfaces() {
        let mut body = Body::new("probe");
        body.add_non_lifting_surface(uv_sphere(1.0, 6, 8));
        let before = body.non_lifting_surfaces[0]
            .surface
            .panel_collocation_point(0, false);
        body.set_position(DVec3::new(5.0, 0.0, 0.0));
        let after = body.non_lifting_surfaces[0]
            .surface
            .panel_collocation_point(0, false);
        assert_relative_eq!(after.x - before.x, 5.0, epsilon = 1e-12);
    }
}
