//! Lifting surface cases
//!
//! A symmetric NACA 0012 wing at zero incidence with a prescribed wake: the
//! trailing-edge doublet jump vanishes, lift is zero, and the pressure
//! distribution mirrors top to bottom. The Kutta closure law is checked
//! exactly, and an unsteady convecting-wake run is exercised end to end.

use aeropanel::core::geometry::generators::{naca4_symmetric, planar_wing};
use aeropanel::{Body, BodyHandle, JsonSurfaceWriter, Solver, SolverOptions};
use glam::{DMat3, DVec3};

fn static_wing_solver() -> (Solver, BodyHandle, usize) {
    let _ = env_logger::builder().is_test(true).try_init();

    let n_chordwise = 14;
    let section = naca4_symmetric(0.12, n_chordwise);
    let wing = planar_wing(&section, 4.0, 6);

    let mut body = Body::new("wing");
    body.add_lifting_surface(wing);

    let options = SolverOptions {
        convect_wake: false,
        ..SolverOptions::default()
    };
    let mut solver = Solver::new(options, std::env::temp_dir().join("aeropanel-wing-test"));
    let handle = solver.add_body(body);
    solver.set_freestream_velocity(DVec3::new(1.0, 0.0, 0.0));
    solver.set_fluid_density(1.0);
    solver.initialize_wakes(0.0);
    solver.solve(0.0, false).expect("wing solve should succeed");
    (solver, handle, 2 * n_chordwise)
}

#[test]
fn test_kutta_closure_is_exact() {
    let (solver, handle, _n_loop) = static_wing_solver();
    let body = solver.body(handle);
    let data = &body.lifting_surfaces[0];
    let lifting_surface = &data.lifting_surface;
    let surface = &lifting_surface.surface;

    let n_spanwise = lifting_surface.n_spanwise_panels();
    assert_eq!(data.wake.n_panels(), n_spanwise);

    let tail = data.wake.n_panels() - n_spanwise;
    for k in 0..n_spanwise {
        let top = solver.doublet_coefficient(surface, lifting_surface.trailing_edge_upper_panel(k));
        let bottom =
            solver.doublet_coefficient(surface, lifting_surface.trailing_edge_lower_panel(k));
        assert_eq!(data.wake.doublet_coefficients[tail + k], top - bottom);
    }
}

#[test]
fn test_symmetric_section_carries_no_lift() {
    let (solver, handle, _n_loop) = static_wing_solver();
    let force = solver.force(handle);

    // Zero incidence on a symmetric section: no lift, no side force. The
    // residual asymmetry is bounded by the linear solver tolerance.
    assert!(force.z.abs() < 5e-3, "lift = {}", force.z);
    assert!(force.y.abs() < 1e-4, "side force = {}", force.y);

    let moment = solver.moment(handle, DVec3::ZERO);
    assert!(moment.length() < 1e-2, "moment = {moment:?}");
}

#[test]
fn test_pressure_mirrors_top_to_bottom() {
    let (solver, handle, n_loop) = static_wing_solver();
    let surface = &solver.body(handle).lifting_surfaces[0].lifting_surface.surface;

    for j in 0..6 {
        for i in 1..n_loop / 2 {
            let lower = solver.pressure_coefficient(surface, j * n_loop + i);
            let upper = solver.pressure_coefficient(surface, j * n_loop + (n_loop - 1 - i));
            assert!(
                (lower - upper).abs() < 1e-4,
                "Cp asymmetry at (j={j}, i={i}): {lower} vs {upper}"
            );
        }
    }
}

#[test]
fn test_wake_doublets_vanish_at_zero_incidence() {
    let (solver, handle, _n_loop) = static_wing_solver();
    let wake = &solver.body(handle).lifting_surfaces[0].wake;
    for &mu in &wake.doublet_coefficients {
        assert!(mu.abs() < 1e-5, "wake doublet = {mu}");
    }
}

#[test]
fn test_lift_at_incidence() {
    let section = naca4_symmetric(0.12, 14);
    let wing = planar_wing(&section, 4.0, 6);

    let mut body = Body::new("wing-at-incidence");
    body.add_lifting_surface(wing);

    let options = SolverOptions {
        convect_wake: false,
        ..SolverOptions::default()
    };
    let mut solver = Solver::new(options, std::env::temp_dir().join("aeropanel-alpha-test"));
    let handle = solver.add_body(body);

    // Five degrees of incidence via an inclined freestream.
    let alpha = 5.0f64.to_radians();
    solver.set_freestream_velocity(DVec3::new(alpha.cos(), 0.0, alpha.sin()));
    solver.set_fluid_density(1.0);
    solver.initialize_wakes(0.0);
    solver.solve(0.0, false).unwrap();

    // Aspect ratio 4 lifting-line estimate: C_L ~ 2 pi alpha / (1 + 2/AR),
    // about 0.37, so roughly 0.73 of lift at q = 1/2 and S = 4. Accept a
    // broad band around it; the sign and order of magnitude are what a
    // mis-wired trailing edge would break.
    let force = solver.force(handle);
    assert!(
        force.z > 0.2 && force.z < 1.5,
        "lift out of range: {}",
        force.z
    );

    // Circulation is shed along the whole span.
    let wake = &solver.body(handle).lifting_surfaces[0].wake;
    let n_sp = solver.body(handle).lifting_surfaces[0]
        .lifting_surface
        .n_spanwise_panels();
    let tail = wake.n_panels() - n_sp;
    for k in 0..n_sp {
        assert!(
            wake.doublet_coefficients[tail + k].abs() > 1e-4,
            "no circulation shed at station {k}"
        );
    }
}

#[test]
fn test_step_logging_writes_files() {
    let (solver, _handle, _n_loop) = static_wing_solver();
    solver.log_step(0, &JsonSurfaceWriter);

    let folder = std::env::temp_dir().join("aeropanel-wing-test").join("wing");
    assert!(folder.join("lifting_surface_0").join("step_0.json").exists());
    assert!(folder.join("wake_0").join("step_0.json").exists());
}

#[test]
fn test_unsteady_pitching_run_stays_consistent() {
    let section = naca4_symmetric(0.12, 10);
    let wing = planar_wing(&section, 2.0, 4);

    let mut body = Body::new("pitching-wing");
    body.add_lifting_surface(wing);
    body.rotational_velocity = DVec3::new(0.0, 0.2, 0.0);

    let options = SolverOptions {
        convect_wake: true,
        unsteady_bernoulli: true,
        ..SolverOptions::default()
    };
    let mut solver = Solver::new(options, std::env::temp_dir().join("aeropanel-pitching-test"));
    let handle = solver.add_body(body);
    solver.set_freestream_velocity(DVec3::new(1.0, 0.0, 0.0));
    solver.set_fluid_density(1.0);

    let dt = 0.1;
    solver.initialize_wakes(dt);

    for step in 0..4 {
        solver.solve(dt, true).expect("unsteady solve should succeed");
        solver.update_wakes(dt);

        // Advance the pitch attitude for the next step.
        let pitch = DMat3::from_axis_angle(DVec3::Y, 0.02);
        solver.body_mut(handle).rotate(pitch);

        let body = solver.body(handle);
        let data = &body.lifting_surfaces[0];
        let lifting_surface = &data.lifting_surface;
        let n_spanwise = lifting_surface.n_spanwise_panels();

        // The wake gains one strip per step on top of the two initial layers.
        assert_eq!(data.wake.n_panels(), (step + 2) * n_spanwise);

        let force = solver.force(handle);
        assert!(force.is_finite(), "step {step}: force = {force:?}");

        for i in 0..lifting_surface.surface.n_panels() {
            let cp = solver.pressure_coefficient(&lifting_surface.surface, i);
            assert!(cp.is_finite(), "step {step}: Cp[{i}] = {cp}");
        }
    }
}
