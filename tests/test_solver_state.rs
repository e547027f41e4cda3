//! Solver state invariants
//!
//! Registration order and offsets, quiescent-flow nullity, post-processing
//! idempotence, steady pressure history-independence, unknown-surface
//! lookups, and the viscous coupling loop.

use aeropanel::core::geometry::generators::uv_sphere;
use aeropanel::{Body, BoundaryLayer, Solver, SolverOptions};
use glam::DVec3;
use ndarray::ArrayView2;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn temp_folder(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(name)
}

#[test]
fn test_offsets_follow_registration_order() {
    let mut first = Body::new("first");
    first.add_non_lifting_surface(uv_sphere(1.0, 6, 8));
    let n_first = first.n_panels();

    let mut second = Body::new("second");
    let mut sphere = uv_sphere(0.5, 6, 8);
    sphere.translate(DVec3::new(6.0, 0.0, 0.0));
    second.add_non_lifting_surface(sphere);

    let mut solver = Solver::new(SolverOptions::default(), temp_folder("aeropanel-offsets-test"));
    let h_first = solver.add_body(first);
    let h_second = solver.add_body(second);

    assert_eq!(
        solver.n_panels(),
        solver.body(h_first).n_panels() + solver.body(h_second).n_panels()
    );
    assert_eq!(solver.body(h_first).n_panels(), n_first);
    assert_eq!(
        solver.owning_body(&solver.body(h_first).non_lifting_surfaces[0].surface),
        Some(h_first)
    );

    solver.set_freestream_velocity(DVec3::new(1.0, 0.0, 0.0));
    solver.set_fluid_density(1.0);
    solver.solve(1.0, false).unwrap();

    // Both spheres see nearly undisturbed flow and nearly zero force; the
    // per-surface queries must address the right slices of the global state.
    let surface_second = &solver.body(h_second).non_lifting_surfaces[0].surface;
    for i in 0..surface_second.n_panels() {
        let v = solver.surface_velocity(surface_second, i);
        assert!(v.length() < 2.0);
    }
    assert!(solver.force(h_first).length() < 0.1);
    assert!(solver.force(h_second).length() < 0.1);
}

#[test]
fn test_quiescent_flow_is_null() {
    let mut body = Body::new("sphere");
    body.add_non_lifting_surface(uv_sphere(1.0, 8, 12));

    let mut solver = Solver::new(SolverOptions::default(), temp_folder("aeropanel-null-test"));
    let handle = solver.add_body(body);
    solver.set_fluid_density(1.0);
    solver.solve(1.0, false).unwrap();

    let surface = &solver.body(handle).non_lifting_surfaces[0].surface;
    for i in 0..surface.n_panels() {
        assert_eq!(solver.pressure_coefficient(surface, i), 0.0);
        assert_eq!(solver.surface_velocity(surface, i), DVec3::ZERO);
        assert_eq!(solver.surface_velocity_potential(surface, i), 0.0);
    }
    assert_eq!(solver.force(handle), DVec3::ZERO);
}

#[test]
fn test_force_is_idempotent() {
    let mut body = Body::new("sphere");
    body.add_non_lifting_surface(uv_sphere(1.0, 8, 12));

    let mut solver = Solver::new(SolverOptions::default(), temp_folder("aeropanel-idem-test"));
    let handle = solver.add_body(body);
    solver.set_freestream_velocity(DVec3::new(1.0, 0.0, 0.0));
    solver.set_fluid_density(1.2);
    solver.solve(1.0, false).unwrap();

    let first = solver.force(handle);
    let second = solver.force(handle);
    assert_eq!(first, second);
}

#[test]
fn test_steady_pressure_has_no_history_coupling() {
    let mut body = Body::new("sphere");
    body.add_non_lifting_surface(uv_sphere(1.0, 8, 12));

    let options = SolverOptions {
        unsteady_bernoulli: false,
        ..SolverOptions::default()
    };
    let mut solver = Solver::new(options, temp_folder("aeropanel-steady-test"));
    let handle = solver.add_body(body);
    solver.set_freestream_velocity(DVec3::new(1.0, 0.0, 0.0));
    solver.set_fluid_density(1.0);

    solver.solve(1.0, true).unwrap();
    let surface_id_panels = solver.body(handle).non_lifting_surfaces[0].surface.n_panels();
    let first: Vec<f64> = (0..surface_id_panels)
        .map(|i| {
            solver.pressure_coefficient(&solver.body(handle).non_lifting_surfaces[0].surface, i)
        })
        .collect();

    solver.solve(1.0, true).unwrap();
    for (i, &cp) in first.iter().enumerate() {
        let again = solver
            .pressure_coefficient(&solver.body(handle).non_lifting_surfaces[0].surface, i);
        assert!((again - cp).abs() < 1e-9, "Cp[{i}] drifted: {cp} -> {again}");
    }
}

#[test]
fn test_unknown_surface_yields_zero() {
    let mut body = Body::new("sphere");
    body.add_non_lifting_surface(uv_sphere(1.0, 6, 8));

    let mut solver = Solver::new(SolverOptions::default(), temp_folder("aeropanel-lookup-test"));
    solver.add_body(body);
    solver.set_freestream_velocity(DVec3::new(1.0, 0.0, 0.0));
    solver.solve(1.0, false).unwrap();

    let stranger = uv_sphere(1.0, 6, 8);
    assert_eq!(solver.pressure_coefficient(&stranger, 0), 0.0);
    assert_eq!(solver.surface_velocity(&stranger, 0), DVec3::ZERO);
    assert_eq!(solver.surface_velocity_potential(&stranger, 0), 0.0);
    assert!(solver.owning_body(&stranger).is_none());
}

/// Boundary layer stub that counts its recalculation calls; zero blowing
/// keeps the doublet fixed point trivially convergent.
struct CountingBoundaryLayer {
    calls: Arc<AtomicUsize>,
}

impl BoundaryLayer for CountingBoundaryLayer {
    fn recalculate(&mut self, surface_velocities: ArrayView2<f64>) {
        assert_eq!(surface_velocities.ncols(), 3);
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    fn blowing_velocity(&self, _panel: usize) -> f64 {
        0.0
    }

    fn friction(&self, _panel: usize) -> DVec3 {
        DVec3::ZERO
    }
}

#[test]
fn test_boundary_layer_coupling_iterates_to_convergence() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut body = Body::new("sphere");
    body.add_non_lifting_surface_with_boundary_layer(
        uv_sphere(1.0, 6, 8),
        Box::new(CountingBoundaryLayer {
            calls: Arc::clone(&calls),
        }),
    );

    let mut solver = Solver::new(SolverOptions::default(), temp_folder("aeropanel-bl-test"));
    solver.add_body(body);
    solver.set_freestream_velocity(DVec3::new(1.0, 0.0, 0.0));
    solver.set_fluid_density(1.0);
    solver.solve(1.0, false).unwrap();

    // One recalculation after the initial inviscid pass; the follow-up solve
    // leaves the doublets unchanged and the iteration converges.
    assert_eq!(calls.load(Ordering::Relaxed), 1);
}
