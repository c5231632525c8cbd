//! KKT system maintenance for the active-set method.
//!
//! Each iteration solves the saddle-point system
//!
//! ```text
//! [ Q   AE^T  AW^T ] [ p      ]   [ rhs_x ]
//! [ AE   0     0   ] [ lam_e  ] = [ rhs_e ]
//! [ AW   0     0   ] [ lam_w  ]   [ rhs_w ]
//! ```
//!
//! where `AW` stacks the active inequality rows. The two strategies differ
//! only in how the factorization tracks working-set changes: [`DirectKkt`]
//! refactorizes from scratch, [`IterativeKkt`] maintains the explicit
//! inverse through rank-one border updates and falls back to a full
//! refresh when an update pivot is too small.

use log::debug;
use nalgebra::{DMatrix, DVector};

use crate::convex::ConvexData;
use crate::linalg::{self, DenseLu};

/// Pivot magnitude below which an incremental inverse update is abandoned
/// in favor of a full refresh.
const PIVOT_TOL: f64 = 1e-11;

/// Strategy for keeping the KKT system consistent with the working set.
///
/// Mutators return `false` when the system is singular to working
/// precision; the solver then switches to its null-space handling.
pub(crate) trait KktSystem {
    /// Rebuild for the given active inequality rows.
    fn refresh(&mut self, data: &ConvexData, active: &[usize]) -> bool;

    /// The last entry of `active` was just appended.
    fn activated(&mut self, data: &ConvexData, active: &[usize]) -> bool;

    /// The entry previously at `removed_pos` of the working set was just
    /// removed; `active` no longer contains it.
    fn deactivated(&mut self, data: &ConvexData, active: &[usize], removed_pos: usize) -> bool;

    /// Solve against the current system.
    fn solve(&self, rhs: &DVector<f64>) -> Option<DVector<f64>>;
}

/// Assemble the dense KKT matrix for a working set.
fn assemble(data: &ConvexData, active: &[usize]) -> DMatrix<f64> {
    let n = data.num_variables();
    let me = data.num_equalities();
    let k = active.len();
    let dim = n + me + k;

    let mut kkt = DMatrix::zeros(dim, dim);
    kkt.view_mut((0, 0), (n, n)).copy_from(&data.q);
    if me > 0 {
        kkt.view_mut((n, 0), (me, n)).copy_from(&data.ae);
        kkt.view_mut((0, n), (n, me))
            .copy_from(&data.ae.transpose());
    }
    for (pos, &row) in active.iter().enumerate() {
        for col in 0..n {
            let v = data.ai[(row, col)];
            kkt[(n + me + pos, col)] = v;
            kkt[(col, n + me + pos)] = v;
        }
    }
    kkt
}

/// Refactorizing strategy: a fresh LU for every working-set change.
pub(crate) struct DirectKkt {
    lu: Option<DenseLu>,
}

impl DirectKkt {
    pub(crate) fn new() -> Self {
        Self { lu: None }
    }
}

impl KktSystem for DirectKkt {
    fn refresh(&mut self, data: &ConvexData, active: &[usize]) -> bool {
        match DenseLu::factor(assemble(data, active)) {
            Ok(lu) => {
                self.lu = Some(lu);
                true
            }
            Err(_) => {
                self.lu = None;
                false
            }
        }
    }

    fn activated(&mut self, data: &ConvexData, active: &[usize]) -> bool {
        self.refresh(data, active)
    }

    fn deactivated(&mut self, data: &ConvexData, active: &[usize], _removed_pos: usize) -> bool {
        self.refresh(data, active)
    }

    fn solve(&self, rhs: &DVector<f64>) -> Option<DVector<f64>> {
        self.lu.as_ref().and_then(|lu| lu.solve(rhs).ok())
    }
}

/// Incremental strategy: the explicit KKT inverse, patched after each
/// working-set change.
///
/// Activation borders the system with one row/column; for
/// `K' = [[K, u], [u^T, 0]]` the new inverse follows from the Schur
/// complement `s = -u^T K^{-1} u`. Deactivation is the reverse pivot on
/// the removed diagonal entry. Either pivot falling under [`PIVOT_TOL`]
/// triggers a full refresh.
pub(crate) struct IterativeKkt {
    inverse: Option<DMatrix<f64>>,
}

impl IterativeKkt {
    pub(crate) fn new() -> Self {
        Self { inverse: None }
    }
}

impl KktSystem for IterativeKkt {
    fn refresh(&mut self, data: &ConvexData, active: &[usize]) -> bool {
        match linalg::invert(assemble(data, active)) {
            Ok(inv) => {
                self.inverse = Some(inv);
                true
            }
            Err(_) => {
                self.inverse = None;
                false
            }
        }
    }

    fn activated(&mut self, data: &ConvexData, active: &[usize]) -> bool {
        let Some(inv) = self.inverse.take() else {
            return self.refresh(data, active);
        };

        let n = data.num_variables();
        let me = data.num_equalities();
        let dim = inv.nrows();
        debug_assert_eq!(dim, n + me + active.len() - 1);

        let row = active[active.len() - 1];
        let mut u = DVector::zeros(dim);
        for col in 0..n {
            u[col] = data.ai[(row, col)];
        }

        let w = &inv * &u;
        let s = -u.dot(&w);
        if s.abs() <= PIVOT_TOL {
            debug!("border pivot {s:.3e} too small, refreshing KKT inverse");
            return self.refresh(data, active);
        }

        let mut grown = DMatrix::zeros(dim + 1, dim + 1);
        grown
            .view_mut((0, 0), (dim, dim))
            .copy_from(&(&inv + &w * w.transpose() / s));
        let border = -&w / s;
        grown.view_mut((0, dim), (dim, 1)).copy_from(&border);
        grown
            .view_mut((dim, 0), (1, dim))
            .copy_from(&border.transpose());
        grown[(dim, dim)] = 1.0 / s;

        self.inverse = Some(grown);
        true
    }

    fn deactivated(&mut self, data: &ConvexData, active: &[usize], removed_pos: usize) -> bool {
        let Some(inv) = self.inverse.take() else {
            return self.refresh(data, active);
        };

        let n = data.num_variables();
        let me = data.num_equalities();
        let dim = inv.nrows();
        let j = n + me + removed_pos;

        let pivot = inv[(j, j)];
        if pivot.abs() <= PIVOT_TOL {
            debug!("removal pivot {pivot:.3e} too small, refreshing KKT inverse");
            return self.refresh(data, active);
        }

        let mut shrunk = DMatrix::zeros(dim - 1, dim - 1);
        for (r_new, r) in (0..dim).filter(|&r| r != j).enumerate() {
            for (c_new, c) in (0..dim).filter(|&c| c != j).enumerate() {
                shrunk[(r_new, c_new)] = inv[(r, c)] - inv[(r, j)] * inv[(j, c)] / pivot;
            }
        }

        self.inverse = Some(shrunk);
        true
    }

    fn solve(&self, rhs: &DVector<f64>) -> Option<DVector<f64>> {
        self.inverse.as_ref().map(|inv| inv * rhs)
    }
}
