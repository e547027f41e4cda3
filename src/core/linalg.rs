//! Dense linear algebra for the doublet solve
//!
//! The influence system is dense and non-symmetric, so the doublet
//! distribution is computed with BiCGSTAB (bi-conjugate gradient,
//! stabilized). Successive solves differ little between time steps and
//! boundary-layer iterations, so the solver accepts a warm-start guess.

use ndarray::{Array1, Array2};

/// A matrix-like object that can apply itself to a vector.
///
/// Abstracting the matrix-vector product keeps the Krylov loop independent of
/// the matrix storage.
pub trait LinearOperator: Send + Sync {
    /// Number of rows.
    fn num_rows(&self) -> usize;

    /// Number of columns.
    fn num_cols(&self) -> usize;

    /// Apply the operator: `y = A x`.
    fn apply(&self, x: &Array1<f64>) -> Array1<f64>;
}

impl LinearOperator for Array2<f64> {
    fn num_rows(&self) -> usize {
        self.nrows()
    }

    fn num_cols(&self) -> usize {
        self.ncols()
    }

    fn apply(&self, x: &Array1<f64>) -> Array1<f64> {
        self.dot(x)
    }
}

/// BiCGSTAB solver configuration
#[derive(Debug, Clone)]
pub struct BiCgstabConfig {
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Relative tolerance for convergence
    pub tolerance: f64,
}

impl Default for BiCgstabConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-8,
        }
    }
}

/// BiCGSTAB solver result
#[derive(Debug)]
pub struct BiCgstabSolution {
    /// Solution vector
    pub x: Array1<f64>,
    /// Number of iterations
    pub iterations: usize,
    /// Final relative residual
    pub residual: f64,
    /// Whether convergence was achieved
    pub converged: bool,
}

fn norm(v: &Array1<f64>) -> f64 {
    v.dot(v).sqrt()
}

/// Solve `A x = b` with BiCGSTAB, starting from the guess `x0`.
pub fn bicgstab_with_guess<A: LinearOperator>(
    operator: &A,
    b: &Array1<f64>,
    x0: &Array1<f64>,
    config: &BiCgstabConfig,
) -> BiCgstabSolution {
    let n = b.len();
    debug_assert_eq!(operator.num_rows(), n);
    debug_assert_eq!(operator.num_cols(), n);

    let b_norm = norm(b);
    if b_norm < 1e-15 {
        return BiCgstabSolution {
            x: Array1::zeros(n),
            iterations: 0,
            residual: 0.0,
            converged: true,
        };
    }

    let mut x = x0.clone();
    let mut r = b - &operator.apply(&x);
    let r0 = r.clone(); // Shadow residual

    if norm(&r) / b_norm < config.tolerance {
        let residual = norm(&r) / b_norm;
        return BiCgstabSolution {
            x,
            iterations: 0,
            residual,
            converged: true,
        };
    }

    let mut rho = 1.0;
    let mut alpha = 1.0;
    let mut omega = 1.0;

    let mut p = Array1::zeros(n);
    let mut v = Array1::zeros(n);

    for iter in 0..config.max_iterations {
        let rho_new = r0.dot(&r);

        // Breakdown of the recurrence.
        if rho_new.abs() < 1e-30 {
            return BiCgstabSolution {
                x,
                iterations: iter,
                residual: norm(&r) / b_norm,
                converged: false,
            };
        }

        let beta = (rho_new / rho) * (alpha / omega);
        rho = rho_new;

        // p = r + beta * (p - omega * v)
        p = &r + &(&p - &v.mapv(|vi| vi * omega)).mapv(|pi| pi * beta);

        v = operator.apply(&p);

        let r0v = r0.dot(&v);
        if r0v.abs() < 1e-30 {
            return BiCgstabSolution {
                x,
                iterations: iter,
                residual: norm(&r) / b_norm,
                converged: false,
            };
        }

        alpha = rho / r0v;

        // s = r - alpha * v
        let s = &r - &v.mapv(|vi| vi * alpha);

        let s_norm = norm(&s);
        if s_norm / b_norm < config.tolerance {
            x = &x + &p.mapv(|pi| pi * alpha);
            return BiCgstabSolution {
                x,
                iterations: iter + 1,
                residual: s_norm / b_norm,
                converged: true,
            };
        }

        let t = operator.apply(&s);

        let tt = t.dot(&t);
        if tt.abs() < 1e-30 {
            return BiCgstabSolution {
                x,
                iterations: iter,
                residual: norm(&r) / b_norm,
                converged: false,
            };
        }
        omega = t.dot(&s) / tt;

        // x = x + alpha * p + omega * s
        x = &x + &p.mapv(|pi| pi * alpha) + &s.mapv(|si| si * omega);

        // r = s - omega * t
        r = &s - &t.mapv(|ti| ti * omega);

        let rel_residual = norm(&r) / b_norm;
        if rel_residual < config.tolerance {
            return BiCgstabSolution {
                x,
                iterations: iter + 1,
                residual: rel_residual,
                converged: true,
            };
        }

        // Stagnation.
        if omega.abs() < 1e-30 {
            return BiCgstabSolution {
                x,
                iterations: iter + 1,
                residual: rel_residual,
                converged: false,
            };
        }
    }

    let rel_residual = norm(&r) / b_norm;
    BiCgstabSolution {
        x,
        iterations: config.max_iterations,
        residual: rel_residual,
        converged: false,
    }
}
