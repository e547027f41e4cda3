//! The panel-method solver
//!
//! Owns the registered bodies and all per-panel coefficient state, and runs
//! the per-step pipeline: source distribution, dense influence system with
//! the Kutta condition folded into the trailing-edge columns, warm-started
//! BiCGSTAB doublet solve, surface velocities, viscous coupling iteration,
//! unsteady pressures, and the wake lifecycle.

mod assembly;

use glam::DVec3;
use ndarray::{s, Array1, Array2};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::body::{Body, BodyHandle, LiftingSurfaceData};
use crate::core::boundary_layer::BoundaryLayer;
use crate::core::config::SolverOptions;
use crate::core::geometry::{Surface, SurfaceId};
use crate::core::io::SurfaceWriter;
use crate::core::linalg::{bicgstab_with_guess, BiCgstabConfig};
use crate::core::parallel::{parallel_for_each_mut, parallel_map_indexed};

/// Errors surfaced by [`Solver::solve`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// The dense doublet solve diverged or exhausted its iteration budget.
    /// Solver state is not rolled back; the caller must discard the step.
    #[error("doublet distribution solve failed after {iterations} iterations (estimated error {residual:.3e})")]
    LinearSolveFailed {
        /// Iterations performed before giving up.
        iterations: usize,
        /// Estimated relative residual at termination.
        residual: f64,
    },
}

/// One registered non-wake surface: its owning body, position within that
/// body's lists, and global panel offset.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SurfaceEntry {
    pub body: usize,
    pub lifting: bool,
    pub index: usize,
    pub offset: usize,
    pub n_panels: usize,
}

/// Unsteady source-doublet panel method solver.
pub struct Solver {
    pub(crate) options: SolverOptions,
    log_folder: PathBuf,

    pub(crate) bodies: Vec<Body>,
    pub(crate) surface_entries: Vec<SurfaceEntry>,
    pub(crate) surface_offsets: HashMap<SurfaceId, usize>,
    surface_id_to_body: HashMap<SurfaceId, usize>,
    pub(crate) n_non_wake_panels: usize,

    pub(crate) freestream_velocity: DVec3,
    fluid_density: f64,

    pub(crate) doublet_coefficients: Array1<f64>,
    source_coefficients: Array1<f64>,
    surface_velocity_potentials: Array1<f64>,
    previous_surface_velocity_potentials: Array1<f64>,
    pressure_coefficients: Array1<f64>,
    surface_velocities: Array2<f64>,
}

impl Solver {
    /// Create a solver with the given options, logging into `log_folder`.
    /// Folder creation is best-effort; failures are reported and execution
    /// continues without logging.
    pub fn new(options: SolverOptions, log_folder: impl Into<PathBuf>) -> Self {
        let log_folder = log_folder.into();
        create_dir_best_effort(&log_folder);

        Self {
            options,
            log_folder,
            bodies: Vec::new(),
            surface_entries: Vec::new(),
            surface_offsets: HashMap::new(),
            surface_id_to_body: HashMap::new(),
            n_non_wake_panels: 0,
            freestream_velocity: DVec3::ZERO,
            fluid_density: 0.0,
            doublet_coefficients: Array1::zeros(0),
            source_coefficients: Array1::zeros(0),
            surface_velocity_potentials: Array1::zeros(0),
            previous_surface_velocity_potentials: Array1::zeros(0),
            pressure_coefficients: Array1::zeros(0),
            surface_velocities: Array2::zeros((0, 3)),
        }
    }

    /// Solver options in effect.
    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    /// Set the freestream velocity.
    pub fn set_freestream_velocity(&mut self, value: DVec3) {
        self.freestream_velocity = value;
    }

    /// Set the fluid density used for force and moment evaluation.
    pub fn set_fluid_density(&mut self, value: f64) {
        self.fluid_density = value;
    }

    /// Register a body. The solver takes ownership; the returned handle
    /// addresses the body in later queries. Surfaces are appended to the
    /// global ordering (non-lifting before lifting within the body) and all
    /// coefficient state is resized and zeroed.
    pub fn add_body(&mut self, body: Body) -> BodyHandle {
        let body_index = self.bodies.len();

        for (i, data) in body.non_lifting_surfaces.iter().enumerate() {
            let n = data.surface.n_panels();
            self.surface_entries.push(SurfaceEntry {
                body: body_index,
                lifting: false,
                index: i,
                offset: self.n_non_wake_panels,
                n_panels: n,
            });
            self.surface_offsets
                .insert(data.surface.id(), self.n_non_wake_panels);
            self.surface_id_to_body.insert(data.surface.id(), body_index);
            self.n_non_wake_panels += n;
        }
        for (i, data) in body.lifting_surfaces.iter().enumerate() {
            let n = data.lifting_surface.surface.n_panels();
            self.surface_entries.push(SurfaceEntry {
                body: body_index,
                lifting: true,
                index: i,
                offset: self.n_non_wake_panels,
                n_panels: n,
            });
            self.surface_offsets
                .insert(data.lifting_surface.surface.id(), self.n_non_wake_panels);
            self.surface_id_to_body
                .insert(data.lifting_surface.surface.id(), body_index);
            self.surface_id_to_body.insert(data.wake.id(), body_index);
            self.n_non_wake_panels += n;
        }

        let n = self.n_non_wake_panels;
        self.doublet_coefficients = Array1::zeros(n);
        self.source_coefficients = Array1::zeros(n);
        self.surface_velocity_potentials = Array1::zeros(n);
        self.previous_surface_velocity_potentials = Array1::zeros(n);
        self.pressure_coefficients = Array1::zeros(n);
        self.surface_velocities = Array2::zeros((n, 3));

        // Log folder skeleton for this body.
        let body_folder = self.log_folder.join(&body.id);
        create_dir_best_effort(&body_folder);
        for i in 0..body.non_lifting_surfaces.len() {
            create_dir_best_effort(&body_folder.join(format!("non_lifting_surface_{i}")));
        }
        for i in 0..body.lifting_surfaces.len() {
            create_dir_best_effort(&body_folder.join(format!("lifting_surface_{i}")));
            create_dir_best_effort(&body_folder.join(format!("wake_{i}")));
        }

        self.bodies.push(body);
        BodyHandle(body_index)
    }

    /// Access a registered body.
    pub fn body(&self, handle: BodyHandle) -> &Body {
        &self.bodies[handle.0]
    }

    /// Mutable access to a registered body, for advancing kinematics between
    /// steps.
    pub fn body_mut(&mut self, handle: BodyHandle) -> &mut Body {
        &mut self.bodies[handle.0]
    }

    /// Total number of non-wake panels registered.
    pub fn n_panels(&self) -> usize {
        self.n_non_wake_panels
    }

    /// Body owning the given surface (wake surfaces included), if it is
    /// registered with this solver.
    pub fn owning_body(&self, surface: &Surface) -> Option<BodyHandle> {
        self.surface_id_to_body.get(&surface.id()).map(|&i| BodyHandle(i))
    }

    // ------------------------------------------------------------------
    // Wake lifecycle
    // ------------------------------------------------------------------

    /// Establish the two-layer wake start condition: one emission step (or
    /// one static positioning) followed by an empty layer at the trailing
    /// edge. Must be called once before the first [`Solver::solve`].
    pub fn initialize_wakes(&mut self, dt: f64) {
        let options = self.options.clone();
        let freestream = self.freestream_velocity;

        for body in &mut self.bodies {
            let (position, velocity, rotation) =
                (body.position, body.velocity, body.rotational_velocity);
            for data in &mut body.lifting_surfaces {
                let LiftingSurfaceData {
                    lifting_surface,
                    wake,
                    ..
                } = data;

                wake.add_layer(lifting_surface);
                let n_sn = lifting_surface.n_spanwise_nodes();
                for k in 0..n_sn {
                    if options.convect_wake {
                        let te = lifting_surface.trailing_edge_point(k);
                        let apparent =
                            velocity + rotation.cross(te - position) - freestream;
                        wake.surface.nodes[k] += trailing_edge_vortex_displacement(
                            &options,
                            apparent,
                            lifting_surface.trailing_edge_bisector(k),
                            dt,
                        );
                    } else {
                        let apparent = velocity - freestream;
                        wake.surface.nodes[k] -=
                            options.static_wake_length * apparent.normalize_or_zero();
                    }
                }
                wake.add_layer(lifting_surface);
            }
        }
    }

    /// Convect the wakes and emit a fresh layer (or re-position the static
    /// wake sheets). Call after [`Solver::solve`] and the caller's own
    /// kinematics bookkeeping for the step.
    pub fn update_wakes(&mut self, dt: f64) {
        if self.options.convect_wake {
            log::info!("convecting wakes");

            // Sample the velocity field at every wake node before any node
            // moves.
            let mut wake_velocities: Vec<Vec<DVec3>> = Vec::new();
            for body in &self.bodies {
                for data in &body.lifting_surfaces {
                    let nodes = &data.wake.surface.nodes;
                    wake_velocities
                        .push(parallel_map_indexed(nodes.len(), |i| self.velocity(nodes[i])));
                }
            }

            let options = self.options.clone();
            let freestream = self.freestream_velocity;
            let mut idx = 0;

            for body in &mut self.bodies {
                let (position, velocity, rotation) =
                    (body.position, body.velocity, body.rotational_velocity);
                for data in &mut body.lifting_surfaces {
                    let LiftingSurfaceData {
                        lifting_surface,
                        wake,
                        ..
                    } = data;
                    let local_velocities = &wake_velocities[idx];
                    idx += 1;

                    let n_sn = lifting_surface.n_spanwise_nodes();
                    let n_nodes = wake.n_nodes();
                    if n_nodes < n_sn {
                        continue;
                    }

                    // The nodes still attached to the trailing edge leave it
                    // by the emission displacement, not by the sampled field.
                    for k in 0..n_sn {
                        let te = lifting_surface.trailing_edge_point(k);
                        let apparent =
                            velocity + rotation.cross(te - position) - freestream;
                        wake.surface.nodes[n_nodes - n_sn + k] +=
                            trailing_edge_vortex_displacement(
                                &options,
                                apparent,
                                lifting_surface.trailing_edge_bisector(k),
                                dt,
                            );
                    }

                    // All remaining nodes ride the sampled stream velocity.
                    let free = n_nodes - n_sn;
                    parallel_for_each_mut(&mut wake.surface.nodes[..free], |i, node| {
                        *node += local_velocities[i] * dt;
                    });

                    wake.update_properties(dt);
                    wake.add_layer(lifting_surface);
                }
            }
        } else {
            log::info!("re-positioning static wakes");

            let options = self.options.clone();
            let freestream = self.freestream_velocity;

            for body in &mut self.bodies {
                let apparent = body.velocity - freestream;
                let direction = apparent.normalize_or_zero();
                for data in &mut body.lifting_surfaces {
                    let LiftingSurfaceData {
                        lifting_surface,
                        wake,
                        ..
                    } = data;
                    let n_sn = lifting_surface.n_spanwise_nodes();
                    if wake.n_nodes() < 2 * n_sn {
                        continue;
                    }
                    for k in 0..n_sn {
                        let te = lifting_surface.trailing_edge_point(k);
                        wake.surface.nodes[n_sn + k] = te;
                        wake.surface.nodes[k] = te - options.static_wake_length * direction;
                    }
                    wake.compute_geometry();
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // The solve
    // ------------------------------------------------------------------

    /// Compute new source, doublet, and pressure distributions for one step.
    ///
    /// When `propagate` is set, the surface potentials are committed as the
    /// history for the next step's unsteady pressure term.
    pub fn solve(&mut self, dt: f64, propagate: bool) -> Result<(), SolverError> {
        let mut boundary_layer_iteration = 0usize;

        loop {
            // Inviscid right-hand side: the Neumann condition sees the shed
            // vorticity of all frozen wake panels.
            log::info!("computing source distribution with wake influence");
            self.source_coefficients = self.compute_source_coefficients(true);

            log::info!("computing influence coefficient matrices");
            let system = self.assemble_influence_system();

            log::info!("computing doublet distribution");
            let b = system.source.dot(&self.source_coefficients);
            let config = BiCgstabConfig {
                max_iterations: self.options.linear_solver_max_iterations,
                tolerance: self.options.linear_solver_tolerance,
            };
            let solution =
                bicgstab_with_guess(&system.doublet, &b, &self.doublet_coefficients, &config);

            if !solution.converged {
                log::error!(
                    "doublet distribution solve failed ({} iterations, estimated error {:.3e})",
                    solution.iterations,
                    solution.residual
                );
                return Err(SolverError::LinearSolveFailed {
                    iterations: solution.iterations,
                    residual: solution.residual,
                });
            }
            log::info!(
                "doublet distribution solved in {} iterations, estimated error {:.3e}",
                solution.iterations,
                solution.residual
            );

            // Convergence of the viscous coupling, measured on the doublet
            // increment. Skipped on the first pass, where the previous value
            // belongs to the previous call to solve().
            let mut converged = false;
            if boundary_layer_iteration > 0 {
                let increment = (&solution.x - &self.doublet_coefficients)
                    .mapv(|d| d * d)
                    .sum()
                    .sqrt();
                if increment < self.options.boundary_layer_iteration_tolerance {
                    converged = true;
                }
            }
            self.doublet_coefficients = solution.x;

            self.close_kutta_condition();

            log::info!("computing surface velocity distribution");
            let entries = self.surface_entries.clone();
            for entry in &entries {
                let values = parallel_map_indexed(entry.n_panels, |i| {
                    self.compute_surface_velocity(entry, i)
                });
                for (i, v) in values.into_iter().enumerate() {
                    self.surface_velocities[[entry.offset + i, 0]] = v.x;
                    self.surface_velocities[[entry.offset + i, 1]] = v.y;
                    self.surface_velocities[[entry.offset + i, 2]] = v.z;
                }
            }

            if converged {
                log::info!("boundary layer iteration converged");
                break;
            }
            if boundary_layer_iteration > self.options.max_boundary_layer_iterations {
                log::warn!("maximum number of boundary layer iterations reached, aborting iteration");
                break;
            }

            if !self.recalculate_boundary_layers() {
                break;
            }
            boundary_layer_iteration += 1;
        }

        if self.options.convect_wake {
            // Pressure evaluation follows the Giesing unsteady formulation:
            // the downstream wake is passive shedding already paid for in the
            // velocity field, so the sources for the Bernoulli equation are
            // recomputed without the old-wake influence even though the
            // doublet solve above included it.
            log::info!("recomputing source distribution without wake influence");
            self.source_coefficients = self.compute_source_coefficients(false);
        }

        log::info!("computing pressure distribution");
        let entries = self.surface_entries.clone();
        for entry in &entries {
            let body = &self.bodies[entry.body];
            let v_ref_squared = self.reference_velocity_squared(body);
            let values = parallel_map_indexed(entry.n_panels, |i| {
                let phi = self.compute_surface_velocity_potential(entry, i);
                let dphi_dt = self.surface_velocity_potential_time_derivative(
                    phi,
                    entry.offset + i,
                    dt,
                );
                let v = DVec3::new(
                    self.surface_velocities[[entry.offset + i, 0]],
                    self.surface_velocities[[entry.offset + i, 1]],
                    self.surface_velocities[[entry.offset + i, 2]],
                );
                (phi, pressure_coefficient(v, dphi_dt, v_ref_squared))
            });
            for (i, (phi, cp)) in values.into_iter().enumerate() {
                self.surface_velocity_potentials[entry.offset + i] = phi;
                self.pressure_coefficients[entry.offset + i] = cp;
            }
        }

        if propagate {
            self.propagate();
        }

        Ok(())
    }

    /// Commit the current surface potentials as the unsteady history.
    fn propagate(&mut self) {
        self.previous_surface_velocity_potentials = self.surface_velocity_potentials.clone();
    }

    /// Write the newest wake-strip doublet strengths from the trailing-edge
    /// jump of the freshly solved distribution.
    fn close_kutta_condition(&mut self) {
        let Self {
            bodies,
            doublet_coefficients,
            surface_offsets,
            ..
        } = self;

        for body in bodies.iter_mut() {
            for data in body.lifting_surfaces.iter_mut() {
                let lifting_surface = &data.lifting_surface;
                let n_sp = lifting_surface.n_spanwise_panels();
                if data.wake.n_panels() < n_sp {
                    continue;
                }
                let tail = data.wake.n_panels() - n_sp;
                let offset = surface_offsets[&lifting_surface.surface.id()];
                for k in 0..n_sp {
                    let top = doublet_coefficients
                        [offset + lifting_surface.trailing_edge_upper_panel(k)];
                    let bottom = doublet_coefficients
                        [offset + lifting_surface.trailing_edge_lower_panel(k)];
                    data.wake.doublet_coefficients[tail + k] = top - bottom;
                }
            }
        }
    }

    /// Recompute every non-trivial boundary layer from the current surface
    /// velocities. Returns whether any such boundary layer exists.
    fn recalculate_boundary_layers(&mut self) -> bool {
        let Self {
            bodies,
            surface_velocities,
            surface_offsets,
            ..
        } = self;

        let mut have_boundary_layer = false;
        for body in bodies.iter_mut() {
            for data in body.non_lifting_surfaces.iter_mut() {
                if data.boundary_layer.is_nontrivial() {
                    have_boundary_layer = true;
                    let offset = surface_offsets[&data.surface.id()];
                    let n = data.surface.n_panels();
                    data.boundary_layer
                        .recalculate(surface_velocities.slice(s![offset..offset + n, ..]));
                }
            }
            for data in body.lifting_surfaces.iter_mut() {
                if data.boundary_layer.is_nontrivial() {
                    have_boundary_layer = true;
                    let offset = surface_offsets[&data.lifting_surface.surface.id()];
                    let n = data.lifting_surface.surface.n_panels();
                    data.boundary_layer
                        .recalculate(surface_velocities.slice(s![offset..offset + n, ..]));
                }
            }
        }
        have_boundary_layer
    }

    // ------------------------------------------------------------------
    // Surface quantities
    // ------------------------------------------------------------------

    pub(crate) fn entry_surface(&self, entry: &SurfaceEntry) -> &Surface {
        let body = &self.bodies[entry.body];
        if entry.lifting {
            &body.lifting_surfaces[entry.index].lifting_surface.surface
        } else {
            &body.non_lifting_surfaces[entry.index].surface
        }
    }

    pub(crate) fn entry_boundary_layer(&self, entry: &SurfaceEntry) -> &dyn BoundaryLayer {
        let body = &self.bodies[entry.body];
        if entry.lifting {
            body.lifting_surfaces[entry.index].boundary_layer.as_ref()
        } else {
            body.non_lifting_surfaces[entry.index].boundary_layer.as_ref()
        }
    }

    /// Tangential surface velocity of one panel, from the freshly solved
    /// doublet distribution.
    fn compute_surface_velocity(&self, entry: &SurfaceEntry, panel: usize) -> DVec3 {
        let surface = self.entry_surface(entry);

        let mut tangential = if self.options.marcov_surface_velocity {
            // N. Marcov's formula: full-field disturbance velocity corrected
            // by half the tangential doublet gradient. Evaluated marginally
            // off the surface to stay clear of the singular sheet.
            let x = surface.panel_collocation_point(panel, true);
            self.compute_disturbance_velocity(x)
                - 0.5
                    * surface.scalar_field_gradient(
                        self.doublet_coefficients.view(),
                        entry.offset,
                        panel,
                    )
        } else {
            -surface.scalar_field_gradient(
                self.doublet_coefficients.view(),
                entry.offset,
                panel,
            )
        };

        let body = &self.bodies[entry.body];
        let apparent =
            body.panel_kinematic_velocity(surface, panel) - self.freestream_velocity;
        tangential -= apparent;

        // Remove any normal component; that is the implicit contribution of
        // the source term.
        let normal = surface.panel_normal(panel);
        tangential -= tangential.dot(normal) * normal;
        tangential
    }

    /// Velocity potential on the surface of one panel.
    fn compute_surface_velocity_potential(&self, entry: &SurfaceEntry, panel: usize) -> f64 {
        let surface = self.entry_surface(entry);
        if self.options.marcov_surface_velocity {
            // With Marcov surface velocities the potential is evaluated
            // directly from the field.
            return self.velocity_potential(surface.panel_collocation_point(panel, false));
        }

        let mut phi = -self.doublet_coefficients[entry.offset + panel];

        let body = &self.bodies[entry.body];
        let apparent =
            body.panel_kinematic_velocity(surface, panel) - self.freestream_velocity;
        phi -= apparent.dot(surface.panel_collocation_point(panel, false));
        phi
    }

    /// Body-frame time derivative of the surface potential, per
    /// J. P. Giesing, "Nonlinear Two-Dimensional Unsteady Potential Flow with
    /// Lift", Journal of Aircraft, 1968.
    fn surface_velocity_potential_time_derivative(
        &self,
        phi: f64,
        global_panel: usize,
        dt: f64,
    ) -> f64 {
        if self.options.unsteady_bernoulli && dt > 0.0 {
            (phi - self.previous_surface_velocity_potentials[global_panel]) / dt
        } else {
            0.0
        }
    }

    fn reference_velocity_squared(&self, body: &Body) -> f64 {
        (body.velocity - self.freestream_velocity).length_squared()
    }

    // ------------------------------------------------------------------
    // Field queries
    // ------------------------------------------------------------------

    /// Total velocity potential at a field point.
    pub fn velocity_potential(&self, x: DVec3) -> f64 {
        self.compute_disturbance_velocity_potential(x) + self.freestream_velocity.dot(x)
    }

    /// Total stream velocity at a field point.
    pub fn velocity(&self, x: DVec3) -> DVec3 {
        self.compute_disturbance_velocity(x) + self.freestream_velocity
    }

    fn compute_disturbance_velocity_potential(&self, x: DVec3) -> f64 {
        let mut phi = 0.0;

        for entry in &self.surface_entries {
            let surface = self.entry_surface(entry);
            for j in 0..entry.n_panels {
                let (source, doublet) = surface.source_and_doublet_influence_at(x, j);
                phi += doublet * self.doublet_coefficients[entry.offset + j];
                // The source influence coefficient is the negated potential
                // kernel; flip it back for the field reconstruction.
                phi -= source * self.source_coefficients[entry.offset + j];
            }
        }

        for body in &self.bodies {
            for data in &body.lifting_surfaces {
                for j in 0..data.wake.n_panels() {
                    phi += data.wake.doublet_influence_at(x, j) * data.wake.doublet_coefficients[j];
                }
            }
        }

        phi
    }

    fn compute_disturbance_velocity(&self, x: DVec3) -> DVec3 {
        let mut gradient = DVec3::ZERO;

        for entry in &self.surface_entries {
            let surface = self.entry_surface(entry);
            for j in 0..entry.n_panels {
                gradient += surface.vortex_ring_unit_velocity(x, j)
                    * self.doublet_coefficients[entry.offset + j];
                gradient += surface.source_unit_velocity(x, j)
                    * self.source_coefficients[entry.offset + j];
            }
        }

        for body in &self.bodies {
            for data in &body.lifting_surfaces {
                if data.wake.n_panels() >= data.lifting_surface.n_spanwise_panels() {
                    for j in 0..data.wake.n_panels() {
                        gradient += data.wake.vortex_ring_unit_velocity(x, j)
                            * data.wake.doublet_coefficients[j];
                    }
                }
            }
        }

        gradient
    }

    // ------------------------------------------------------------------
    // Per-panel queries
    // ------------------------------------------------------------------

    fn global_index(&self, surface: &Surface, panel: usize, caller: &str) -> Option<usize> {
        match self.surface_offsets.get(&surface.id()) {
            Some(offset) => Some(offset + panel),
            None => {
                log::error!("{caller}: panel {panel} not found on {}", surface.id());
                None
            }
        }
    }

    /// Surface velocity potential of the given panel. Unknown surfaces are
    /// reported and yield zero.
    pub fn surface_velocity_potential(&self, surface: &Surface, panel: usize) -> f64 {
        self.global_index(surface, panel, "surface_velocity_potential")
            .map(|i| self.surface_velocity_potentials[i])
            .unwrap_or(0.0)
    }

    /// Surface velocity of the given panel. Unknown surfaces are reported and
    /// yield zero.
    pub fn surface_velocity(&self, surface: &Surface, panel: usize) -> DVec3 {
        self.global_index(surface, panel, "surface_velocity")
            .map(|i| {
                DVec3::new(
                    self.surface_velocities[[i, 0]],
                    self.surface_velocities[[i, 1]],
                    self.surface_velocities[[i, 2]],
                )
            })
            .unwrap_or(DVec3::ZERO)
    }

    /// Pressure coefficient of the given panel. Unknown surfaces are reported
    /// and yield zero.
    pub fn pressure_coefficient(&self, surface: &Surface, panel: usize) -> f64 {
        self.global_index(surface, panel, "pressure_coefficient")
            .map(|i| self.pressure_coefficients[i])
            .unwrap_or(0.0)
    }

    /// Doublet coefficient of the given panel. Unknown surfaces are reported
    /// and yield zero.
    pub fn doublet_coefficient(&self, surface: &Surface, panel: usize) -> f64 {
        self.global_index(surface, panel, "doublet_coefficient")
            .map(|i| self.doublet_coefficients[i])
            .unwrap_or(0.0)
    }

    // ------------------------------------------------------------------
    // Loads
    // ------------------------------------------------------------------

    /// Aerodynamic force on a body: integrated pressure plus boundary-layer
    /// friction.
    pub fn force(&self, handle: BodyHandle) -> DVec3 {
        let body = &self.bodies[handle.0];
        let q = 0.5 * self.fluid_density * self.reference_velocity_squared(body);

        let mut force = DVec3::ZERO;
        for entry in &self.surface_entries {
            if entry.body != handle.0 {
                continue;
            }
            let surface = self.entry_surface(entry);
            let boundary_layer = self.entry_boundary_layer(entry);
            for i in 0..entry.n_panels {
                let normal = surface.panel_normal(i);
                let area = surface.panel_surface_area(i);
                force += q * area * self.pressure_coefficients[entry.offset + i] * normal;
                force += boundary_layer.friction(i);
            }
        }
        force
    }

    /// Aerodynamic moment on a body about the given point.
    pub fn moment(&self, handle: BodyHandle, x: DVec3) -> DVec3 {
        let body = &self.bodies[handle.0];
        let q = 0.5 * self.fluid_density * self.reference_velocity_squared(body);

        let mut moment = DVec3::ZERO;
        for entry in &self.surface_entries {
            if entry.body != handle.0 {
                continue;
            }
            let surface = self.entry_surface(entry);
            let boundary_layer = self.entry_boundary_layer(entry);
            for i in 0..entry.n_panels {
                let normal = surface.panel_normal(i);
                let area = surface.panel_surface_area(i);
                let mut panel_force =
                    q * area * self.pressure_coefficients[entry.offset + i] * normal;
                panel_force += boundary_layer.friction(i);
                let r = surface.panel_collocation_point(i, false) - x;
                moment += r.cross(panel_force);
            }
        }
        moment
    }

    // ------------------------------------------------------------------
    // Logging
    // ------------------------------------------------------------------

    /// Dump the per-surface doublet, source, and pressure distributions for
    /// this step through the given writer. Write failures are reported and
    /// skipped.
    pub fn log_step(&self, step_number: usize, writer: &dyn SurfaceWriter) {
        let mut offset = 0usize;
        let mut node_offset = 0usize;
        let mut panel_offset = 0usize;

        for body in &self.bodies {
            for (idx, data) in body.non_lifting_surfaces.iter().enumerate() {
                let n = data.surface.n_panels();
                let path = self
                    .log_folder
                    .join(&body.id)
                    .join(format!("non_lifting_surface_{idx}"))
                    .join(format!("step_{step_number}{}", writer.file_extension()));
                self.write_surface_views(
                    writer,
                    &data.surface,
                    &path,
                    offset,
                    n,
                    node_offset,
                    panel_offset,
                );
                offset += n;
                node_offset += data.surface.n_nodes();
                panel_offset += n;
            }

            for (idx, data) in body.lifting_surfaces.iter().enumerate() {
                let surface = &data.lifting_surface.surface;
                let n = surface.n_panels();
                let path = self
                    .log_folder
                    .join(&body.id)
                    .join(format!("lifting_surface_{idx}"))
                    .join(format!("step_{step_number}{}", writer.file_extension()));
                self.write_surface_views(
                    writer,
                    surface,
                    &path,
                    offset,
                    n,
                    node_offset,
                    panel_offset,
                );
                offset += n;
                node_offset += surface.n_nodes();
                panel_offset += n;

                // Wakes carry only their doublet distribution.
                let wake_path = self
                    .log_folder
                    .join(&body.id)
                    .join(format!("wake_{idx}"))
                    .join(format!("step_{step_number}{}", writer.file_extension()));
                let names = vec!["DoubletDistribution".to_string()];
                let views = vec![Array1::from(data.wake.doublet_coefficients.clone())];
                if let Err(e) =
                    writer.write(&data.wake.surface, &wake_path, 0, panel_offset, &names, &views)
                {
                    log::error!("could not write {}: {e}", wake_path.display());
                }
                node_offset += data.wake.n_nodes();
                panel_offset += data.wake.n_panels();
            }
        }
    }

    fn write_surface_views(
        &self,
        writer: &dyn SurfaceWriter,
        surface: &Surface,
        path: &Path,
        offset: usize,
        n: usize,
        node_offset: usize,
        panel_offset: usize,
    ) {
        let names = vec![
            "DoubletDistribution".to_string(),
            "SourceDistribution".to_string(),
            "PressureDistribution".to_string(),
        ];
        let views = vec![
            self.doublet_coefficients.slice(s![offset..offset + n]).to_owned(),
            self.source_coefficients.slice(s![offset..offset + n]).to_owned(),
            self.pressure_coefficients.slice(s![offset..offset + n]).to_owned(),
        ];
        if let Err(e) = writer.write(surface, path, node_offset, panel_offset, &names, &views) {
            log::error!("could not write {}: {e}", path.display());
        }
    }
}

/// Displacement by which a trailing-edge-coincident wake node leaves the
/// trailing edge in one emission step.
fn trailing_edge_vortex_displacement(
    options: &SolverOptions,
    apparent_velocity: DVec3,
    bisector: DVec3,
    dt: f64,
) -> DVec3 {
    let wake_velocity = if options.wake_emission_follow_bisector {
        apparent_velocity.length() * bisector
    } else {
        -apparent_velocity
    };
    options.wake_emission_distance_factor * wake_velocity * dt
}

/// Pressure coefficient from the unsteady Bernoulli equation in the body
/// frame.
fn pressure_coefficient(surface_velocity: DVec3, dphi_dt: f64, v_ref_squared: f64) -> f64 {
    if v_ref_squared <= f64::MIN_POSITIVE {
        // Quiescent flow carries no meaningful pressure normalization.
        return 0.0;
    }
    1.0 - (surface_velocity.length_squared() + 2.0 * dphi_dt) / v_ref_squared
}

fn create_dir_best_effort(path: &Path) {
    if let Err(e) = std::fs::create_dir_all(path) {
        log::error!("could not create log folder {}: {e}", path.display());
    }
}
