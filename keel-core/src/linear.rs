//! Dense two-phase simplex for the `Q == 0` case.
//!
//! The active-set KKT system is singular away from vertices when the
//! objective has no curvature, so pure LPs are solved by a tableau simplex
//! instead. The same phase-one machinery doubles as the feasibility
//! restoration used to start the active-set method.
//!
//! Free variables are split as `x = u - v` with `u, v >= 0`; inequality
//! rows get a slack; phase one adds one artificial per row and minimizes
//! their sum. Pivoting uses Bland's rule throughout (lowest-index entering
//! column, lowest-basis-index leaving row on ratio ties), which guarantees
//! termination and makes runs reproducible.

use std::time::{Duration, Instant};

use log::debug;
use nalgebra::{DMatrix, DVector};

use crate::convex::ConvexData;
use crate::options::SolverOptions;
use crate::result::{SolveResult, Status};

/// Solve an LP in canonical form. The quadratic block of `data` is
/// ignored.
pub fn solve(data: &ConvexData, options: &SolverOptions) -> SolveResult {
    let mut tableau = match Tableau::phase_one(data, options) {
        Ok(t) => t,
        Err(status) => {
            return match status {
                Status::Infeasible => SolveResult::infeasible(),
                _ => SolveResult::failed(),
            }
        }
    };

    match tableau.phase_two(data, options) {
        Ok(()) => {
            let x = tableau.extract(data);
            let value = data.objective_value(&x);
            SolveResult::optimal(value, x.iter().copied().collect())
        }
        Err(Status::Unbounded) => SolveResult::unbounded(),
        Err(_) => SolveResult::failed(),
    }
}

/// Phase one only: a point satisfying all constraints, for the active-set
/// method to start from.
pub(crate) fn feasible_point(
    data: &ConvexData,
    options: &SolverOptions,
) -> Result<DVector<f64>, Status> {
    let tableau = Tableau::phase_one(data, options)?;
    Ok(tableau.extract(data))
}

/// Dense simplex tableau with the cost row stored as the last row and the
/// right-hand side as the last column. Basis columns are kept as identity
/// columns by the pivot updates.
struct Tableau {
    a: DMatrix<f64>,
    basis: Vec<usize>,
    /// Number of structural rows (the cost row is not counted).
    m: usize,
    /// Column count excluding the right-hand side.
    ncols: usize,
    /// First artificial column.
    art_start: usize,
    deadline: Option<Instant>,
}

impl Tableau {
    /// Build the tableau and run phase one to a feasible basis.
    fn phase_one(data: &ConvexData, options: &SolverOptions) -> Result<Self, Status> {
        let n = data.num_variables();
        let me = data.num_equalities();
        let mi = data.num_inequalities();
        let m = me + mi;

        let art_start = 2 * n + mi;
        let ncols = art_start + m;
        let rhs = ncols;
        let mut a = DMatrix::zeros(m + 1, ncols + 1);

        for r in 0..me {
            for j in 0..n {
                let v = data.ae[(r, j)];
                a[(r, j)] = v;
                a[(r, n + j)] = -v;
            }
            a[(r, rhs)] = data.be[r];
        }
        for r in 0..mi {
            let row = me + r;
            for j in 0..n {
                let v = data.ai[(r, j)];
                a[(row, j)] = v;
                a[(row, n + j)] = -v;
            }
            a[(row, 2 * n + r)] = 1.0;
            a[(row, rhs)] = data.bi[r];
        }

        // Nonnegative right-hand sides so the artificial basis is feasible.
        for r in 0..m {
            if a[(r, rhs)] < 0.0 {
                for j in 0..=ncols {
                    a[(r, j)] = -a[(r, j)];
                }
            }
        }

        let mut basis = Vec::with_capacity(m);
        for r in 0..m {
            a[(r, art_start + r)] = 1.0;
            basis.push(art_start + r);
        }

        // Phase-one reduced costs: minimize the artificial sum with the
        // artificials basic, so the cost row is minus the column sums.
        for j in 0..=ncols {
            let mut sum = 0.0;
            for r in 0..m {
                sum += a[(r, j)];
            }
            a[(m, j)] = if j >= art_start && j < ncols {
                0.0
            } else {
                -sum
            };
        }

        let deadline = options
            .time_limit_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));
        let mut tableau = Self {
            a,
            basis,
            m,
            ncols,
            art_start,
            deadline,
        };

        tableau.pivot_to_optimality(art_start, options)?;

        let infeasibility = -tableau.a[(m, rhs)];
        if infeasibility > options.feas_tol {
            debug!("phase one ended with residual infeasibility {infeasibility:.3e}");
            return Err(Status::Infeasible);
        }

        tableau.evict_artificials(options);
        Ok(tableau)
    }

    /// Price the real objective onto the cost row and pivot to optimality.
    /// Artificial columns are banned from entering.
    fn phase_two(&mut self, data: &ConvexData, options: &SolverOptions) -> Result<(), Status> {
        let n = data.num_variables();
        let m = self.m;

        for j in 0..=self.ncols {
            self.a[(m, j)] = 0.0;
        }
        for j in 0..n {
            self.a[(m, j)] = data.c[j];
            self.a[(m, n + j)] = -data.c[j];
        }
        for r in 0..m {
            let cb = self.column_cost(data, self.basis[r]);
            if cb != 0.0 {
                for j in 0..=self.ncols {
                    self.a[(m, j)] -= cb * self.a[(r, j)];
                }
            }
        }

        self.pivot_to_optimality(self.art_start, options)
    }

    fn column_cost(&self, data: &ConvexData, col: usize) -> f64 {
        let n = data.num_variables();
        if col < n {
            data.c[col]
        } else if col < 2 * n {
            -data.c[col - n]
        } else {
            0.0
        }
    }

    /// Bland pivoting until no entering column remains. `allowed` caps the
    /// entering-column range, which is how artificials stay out in phase
    /// two.
    fn pivot_to_optimality(
        &mut self,
        allowed: usize,
        options: &SolverOptions,
    ) -> Result<(), Status> {
        let m = self.m;
        let rhs = self.ncols;

        for _ in 0..options.max_iter {
            if options.is_cancelled() {
                return Err(Status::Failed);
            }
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    return Err(Status::Failed);
                }
            }

            let Some(enter) = (0..allowed).find(|&j| self.a[(m, j)] < -options.tol) else {
                return Ok(());
            };

            let mut leave: Option<(usize, f64)> = None;
            for r in 0..m {
                let coeff = self.a[(r, enter)];
                if coeff <= options.tol {
                    continue;
                }
                let ratio = self.a[(r, rhs)] / coeff;
                let better = match leave {
                    None => true,
                    Some((best_r, best_ratio)) => {
                        ratio < best_ratio - options.tol
                            || (ratio <= best_ratio + options.tol
                                && self.basis[r] < self.basis[best_r])
                    }
                };
                if better {
                    leave = Some((r, ratio));
                }
            }

            let Some((leave, _)) = leave else {
                return Err(Status::Unbounded);
            };
            self.pivot(leave, enter);
        }

        debug!("simplex hit the pivot cap ({})", options.max_iter);
        Err(Status::Failed)
    }

    fn pivot(&mut self, row: usize, col: usize) {
        let pivot = self.a[(row, col)];
        for j in 0..=self.ncols {
            self.a[(row, j)] /= pivot;
        }
        for r in 0..=self.m {
            if r == row {
                continue;
            }
            let factor = self.a[(r, col)];
            if factor == 0.0 {
                continue;
            }
            for j in 0..=self.ncols {
                self.a[(r, j)] -= factor * self.a[(row, j)];
            }
        }
        self.basis[row] = col;
    }

    /// Pivot artificials out of the basis where a real column is
    /// available. A row with no real pivot is a redundant constraint; its
    /// artificial stays basic at zero in a numerically empty row.
    fn evict_artificials(&mut self, options: &SolverOptions) {
        for r in 0..self.m {
            if self.basis[r] < self.art_start {
                continue;
            }
            if let Some(col) =
                (0..self.art_start).find(|&j| self.a[(r, j)].abs() > options.tol)
            {
                self.pivot(r, col);
            }
        }
    }

    /// Read the primal point out of the basic values.
    fn extract(&self, data: &ConvexData) -> DVector<f64> {
        let n = data.num_variables();
        let rhs = self.ncols;
        let mut split = vec![0.0; 2 * n];
        for r in 0..self.m {
            if self.basis[r] < 2 * n {
                split[self.basis[r]] = self.a[(r, rhs)];
            }
        }
        DVector::from_iterator(n, (0..n).map(|j| split[j] - split[n + j]))
    }
}
