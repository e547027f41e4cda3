//! Influence system assembly
//!
//! Builds the dense Dirichlet system `A mu = S sigma`: `S` holds the source
//! potential influences, `A` the doublet influences plus, for every lifting
//! surface, the newest wake strip folded into the trailing-edge columns. The
//! strip's strength is tied to the trailing-edge doublet jump by the Kutta
//! condition, so its influence adds to the upper-panel column and subtracts
//! from the lower-panel column.
//!
//! Rows are independent and are assembled in parallel; the source
//! distribution is likewise computed panel-parallel per surface.

use ndarray::{Array1, Array2};

use crate::core::parallel::parallel_map_indexed;
use crate::core::solver::{Solver, SurfaceEntry};

/// The assembled dense influence system.
pub(crate) struct InfluenceSystem {
    /// Doublet (left-hand-side) influence matrix, Kutta columns included.
    pub doublet: Array2<f64>,
    /// Source influence matrix; the right-hand side is `source * sigma`.
    pub source: Array2<f64>,
}

impl Solver {
    /// Resolve a global panel index to its surface entry and local index.
    pub(crate) fn locate(&self, global_panel: usize) -> (&SurfaceEntry, usize) {
        let idx = self
            .surface_entries
            .partition_point(|e| e.offset <= global_panel)
            - 1;
        let entry = &self.surface_entries[idx];
        (entry, global_panel - entry.offset)
    }

    /// Compute the source distribution over all non-wake panels.
    ///
    /// With `include_wake_influence`, the apparent velocity is corrected by
    /// the induced velocity of every wake panel that already carries a
    /// doublet strength (all but the newest strip of each lifting surface);
    /// this is the right-hand side of the inviscid solve. Without it, the
    /// sources describe the kinematic condition alone, as the pressure
    /// evaluation requires.
    pub(crate) fn compute_source_coefficients(&self, include_wake_influence: bool) -> Array1<f64> {
        let mut coefficients = Array1::zeros(self.n_non_wake_panels);
        for entry in &self.surface_entries {
            let values = parallel_map_indexed(entry.n_panels, |i| {
                self.compute_source_coefficient(entry, i, include_wake_influence)
            });
            for (i, v) in values.into_iter().enumerate() {
                coefficients[entry.offset + i] = v;
            }
        }
        coefficients
    }

    fn compute_source_coefficient(
        &self,
        entry: &SurfaceEntry,
        panel: usize,
        include_wake_influence: bool,
    ) -> f64 {
        let surface = self.entry_surface(entry);
        let body = &self.bodies[entry.body];

        let mut velocity = body.panel_kinematic_velocity(surface, panel) - self.freestream_velocity;

        if self.options.convect_wake && include_wake_influence {
            for other in &self.bodies {
                for data in &other.lifting_surfaces {
                    let n_spanwise = data.lifting_surface.n_spanwise_panels();
                    let n_wake = data.wake.n_panels();
                    if n_wake < n_spanwise {
                        continue;
                    }
                    // Old wake panels only; the newest strip enters through
                    // the Kutta columns of the influence matrix instead.
                    for k in 0..n_wake - n_spanwise {
                        velocity -= data.wake.vortex_ring_unit_velocity_between(surface, panel, k)
                            * data.wake.doublet_coefficients[k];
                    }
                }
            }
        }

        let normal = surface.panel_normal(panel);
        velocity.dot(normal) - self.entry_boundary_layer(entry).blowing_velocity(panel)
    }

    /// Assemble the dense doublet and source influence matrices.
    pub(crate) fn assemble_influence_system(&self) -> InfluenceSystem {
        let n = self.n_non_wake_panels;
        let rows = parallel_map_indexed(n, |row| self.assemble_row(row));

        let mut doublet = Array2::zeros((n, n));
        let mut source = Array2::zeros((n, n));
        for (row, (doublet_row, source_row)) in rows.into_iter().enumerate() {
            for (col, value) in doublet_row.into_iter().enumerate() {
                doublet[[row, col]] = value;
            }
            for (col, value) in source_row.into_iter().enumerate() {
                source[[row, col]] = value;
            }
        }

        InfluenceSystem { doublet, source }
    }

    fn assemble_row(&self, row: usize) -> (Vec<f64>, Vec<f64>) {
        let n = self.n_non_wake_panels;
        let (observer_entry, i) = self.locate(row);
        let observer = self.entry_surface(observer_entry);

        let mut doublet_row = vec![0.0; n];
        let mut source_row = vec![0.0; n];

        for entry in &self.surface_entries {
            let surface = self.entry_surface(entry);
            for j in 0..entry.n_panels {
                let (source, doublet) = surface.source_and_doublet_influence(observer, i, j);
                source_row[entry.offset + j] = source;
                doublet_row[entry.offset + j] = doublet;
            }
        }

        // The newest wake strip of every lifting surface, folded into the
        // trailing-edge columns: mu_wake = mu_upper - mu_lower.
        for body in &self.bodies {
            for data in &body.lifting_surfaces {
                let lifting_surface = &data.lifting_surface;
                let n_spanwise = lifting_surface.n_spanwise_panels();
                if data.wake.n_panels() < n_spanwise {
                    continue;
                }
                let tail = data.wake.n_panels() - n_spanwise;
                let offset = self.surface_offsets[&lifting_surface.surface.id()];
                for k in 0..n_spanwise {
                    let influence = data.wake.doublet_influence(observer, i, tail + k);
                    doublet_row[offset + lifting_surface.trailing_edge_upper_panel(k)] += influence;
                    doublet_row[offset + lifting_surface.trailing_edge_lower_panel(k)] -= influence;
                }
            }
        }

        (doublet_row, source_row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::body::Body;
    use crate::core::config::SolverOptions;
    use crate::core::geometry::generators::uv_sphere;
    use approx::assert_relative_eq;
    use glam::DVec3;

    /// The doublet influence of a closed surface on an interior point sums to
    /// one in this convention.
    fn doublet_row_sum(surface: &crate::core::geometry::Surface, x: DVec3) -> f64 {
        (0..surface.n_panels())
            .map(|j| surface.doublet_influence_at(x, j))
            .sum()
    }

    fn sphere_solver() -> Solver {
        let mut body = Body::new("sphere");
        body.add_non_lifting_surface(uv_sphere(1.0, 6, 8));
        let mut solver = Solver::new(
            SolverOptions::default(),
            std::env::temp_dir().join("aeropanel-assembly-test"),
        );
        solver.add_body(body);
        solver
    }

    #[test]
    fn test_locate() {
        let solver = sphere_solver();
        let (entry, local) = solver.locate(0);
        assert_eq!(entry.offset, 0);
        assert_eq!(local, 0);
        let (entry, local) = solver.locate(solver.n_panels() - 1);
        assert_eq!(local, entry.n_panels - 1);
    }

    #[test]
    fn test_interior_doublet_row_sum() {
        // A constant doublet sheet over a closed surface produces unit
        // potential inside: the interior-point influences sum to one.
        let sphere = uv_sphere(1.0, 10, 16);
        let sum = doublet_row_sum(&sphere, DVec3::new(0.1, -0.2, 0.05));
        assert_relative_eq!(sum, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_diagonal_is_interior_limit() {
        let solver = sphere_solver();
        let system = solver.assemble_influence_system();
        for i in 0..solver.n_panels() {
            assert_relative_eq!(system.doublet[[i, i]], 0.5, epsilon = 1e-12);
            // Source self-influence is positive and dominant in its row.
            assert!(system.source[[i, i]] > 0.0);
        }
    }

    #[test]
    fn test_constant_doublet_annihilates_exterior() {
        // A = D has row sums near one on a closed surface (interior
        // collocation): A applied to the constant vector recovers it.
        let solver = sphere_solver();
        let system = solver.assemble_influence_system();
        let ones = Array1::from_elem(solver.n_panels(), 1.0);
        let row_sums = system.doublet.dot(&ones);
        for &s in row_sums.iter() {
            assert_relative_eq!(s, 1.0, epsilon = 1e-2);
        }
    }

    #[test]
    fn test_sources_without_flow_are_zero() {
        let solver = sphere_solver();
        let sigma = solver.compute_source_coefficients(true);
        assert_eq!(sigma.iter().filter(|v| v.abs() > 0.0).count(), 0);
    }
}
