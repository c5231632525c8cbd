//! Canonical-form snapshot of a model.

use nalgebra::{DMatrix, DVector};
use sprs::TriMat;

use crate::error::ModelError;
use crate::model::Model;

/// Immutable canonical form consumed by the solvers:
///
/// ```text
/// minimize    (1/2) x^T Q x + c^T x
/// subject to  AE x  = bE
///             AI x <= bI
/// ```
///
/// Row layout is deterministic given the model. Equality rows follow
/// expression declaration order. Inequality rows come in three groups:
/// expression upper bounds (`a'x <= u`), expression lower bounds negated
/// (`-a'x <= -l`), then variable bound rows, per variable lower (`-x_i <=
/// -l_i`) before upper (`x_i <= u_i`). Only finite bounds produce rows.
///
/// A quadratic coefficient `v` on `(i, j)` in the objective contributes
/// `v * x_i * x_j` to its value, so a diagonal entry lands in `Q` as `2v`
/// and an off-diagonal entry as `v` in both symmetric positions.
#[derive(Debug, Clone)]
pub struct ConvexData {
    /// Symmetric objective matrix (n x n), zero for pure LPs.
    pub q: DMatrix<f64>,

    /// Linear objective vector (n).
    pub c: DVector<f64>,

    /// Equality constraint matrix (me x n).
    pub ae: DMatrix<f64>,

    /// Equality right-hand side (me).
    pub be: DVector<f64>,

    /// Inequality constraint matrix (mi x n).
    pub ai: DMatrix<f64>,

    /// Inequality right-hand side (mi).
    pub bi: DVector<f64>,

    has_quadratic: bool,
}

impl ConvexData {
    /// Build canonical form from a validated model, folding the model's own
    /// variable bounds into the inequality block.
    pub fn build(model: &Model) -> Result<Self, ModelError> {
        let (lower, upper) = model.bound_vectors();
        Self::build_bounded(model, &lower, &upper)
    }

    /// Build canonical form with explicit variable bounds replacing the
    /// model's own. The branch-and-bound driver uses this to materialize
    /// node subproblems without touching the shared model.
    pub fn build_bounded(
        model: &Model,
        lower: &[f64],
        upper: &[f64],
    ) -> Result<Self, ModelError> {
        model.validate()?;
        let n = model.num_variables();

        let mut q = DMatrix::zeros(n, n);
        let mut c = DVector::zeros(n);
        let mut has_quadratic = false;
        if let Some(objective) = model.objective() {
            for (i, v) in objective.linear_terms() {
                c[i] = v;
            }
            for (i, j, v) in objective.quadratic_terms() {
                has_quadratic = true;
                if i == j {
                    q[(i, i)] = 2.0 * v;
                } else {
                    q[(i, j)] = v;
                    q[(j, i)] = v;
                }
            }
        }

        let mut ae = RowBuilder::new();
        let mut be = Vec::new();
        let mut ai = RowBuilder::new();
        let mut bi = Vec::new();

        let mut push_row = |mat: &mut RowBuilder, rhs: &mut Vec<f64>, terms: &[(usize, f64)], b: f64| {
            let row = rhs.len();
            for &(col, v) in terms {
                mat.push(row, col, v);
            }
            rhs.push(b);
        };

        for e in model.constraints() {
            if e.is_equality() {
                let terms: Vec<_> = e.linear_terms().collect();
                // is_equality guarantees both sides are present and equal.
                if let Some(level) = e.upper {
                    push_row(&mut ae, &mut be, &terms, level);
                }
            }
        }

        for e in model.constraints() {
            if e.is_equality() {
                continue;
            }
            if let Some(u) = e.upper {
                let terms: Vec<_> = e.linear_terms().collect();
                push_row(&mut ai, &mut bi, &terms, u);
            }
        }
        for e in model.constraints() {
            if e.is_equality() {
                continue;
            }
            if let Some(l) = e.lower {
                let terms: Vec<_> = e.linear_terms().map(|(i, v)| (i, -v)).collect();
                push_row(&mut ai, &mut bi, &terms, -l);
            }
        }
        for i in 0..n {
            if lower[i].is_finite() {
                push_row(&mut ai, &mut bi, &[(i, -1.0)], -lower[i]);
            }
            if upper[i].is_finite() {
                push_row(&mut ai, &mut bi, &[(i, 1.0)], upper[i]);
            }
        }

        Ok(Self {
            q,
            c,
            ae: ae.densify(be.len(), n),
            be: DVector::from_vec(be),
            ai: ai.densify(bi.len(), n),
            bi: DVector::from_vec(bi),
            has_quadratic,
        })
    }

    /// Number of variables.
    pub fn num_variables(&self) -> usize {
        self.c.len()
    }

    /// Number of equality rows.
    pub fn num_equalities(&self) -> usize {
        self.be.len()
    }

    /// Number of inequality rows.
    pub fn num_inequalities(&self) -> usize {
        self.bi.len()
    }

    /// True if the objective has no quadratic part.
    pub fn is_lp(&self) -> bool {
        !self.has_quadratic
    }

    /// Objective value `(1/2) x^T Q x + c^T x` at a point.
    pub fn objective_value(&self, x: &DVector<f64>) -> f64 {
        let quad = if self.has_quadratic {
            0.5 * (x.transpose() * &self.q * x)[(0, 0)]
        } else {
            0.0
        };
        quad + self.c.dot(x)
    }

    /// Inequality rows tight at `x` within `tol`, in row order. Callers
    /// hand these to a warm start so the next solve can seed its working
    /// set from them.
    pub fn active_rows(&self, x: &[f64], tol: f64) -> Vec<usize> {
        let x = DVector::from_column_slice(x);
        (0..self.num_inequalities())
            .filter(|&r| (self.bi[r] - self.ai.row(r).transpose().dot(&x)).abs() <= tol)
            .collect()
    }

    /// Largest violation of any constraint at a point (0 when feasible).
    pub fn max_violation(&self, x: &DVector<f64>) -> f64 {
        let mut worst = 0.0_f64;
        if self.num_equalities() > 0 {
            let r = &self.ae * x - &self.be;
            worst = worst.max(r.amax());
        }
        if self.num_inequalities() > 0 {
            let r = &self.ai * x - &self.bi;
            worst = worst.max(r.max().max(0.0));
        }
        worst
    }
}

/// Triplet accumulator for constraint rows. Assembly goes through a sparse
/// matrix so duplicate coefficients sum instead of overwriting.
struct RowBuilder {
    rows: Vec<usize>,
    cols: Vec<usize>,
    vals: Vec<f64>,
}

impl RowBuilder {
    fn new() -> Self {
        Self {
            rows: Vec::new(),
            cols: Vec::new(),
            vals: Vec::new(),
        }
    }

    fn push(&mut self, row: usize, col: usize, val: f64) {
        self.rows.push(row);
        self.cols.push(col);
        self.vals.push(val);
    }

    fn densify(self, nrows: usize, ncols: usize) -> DMatrix<f64> {
        let tri = TriMat::from_triplets((nrows, ncols), self.rows, self.cols, self.vals);
        let csc = tri.to_csc::<usize>();
        let mut dense = DMatrix::zeros(nrows, ncols);
        for (&val, (row, col)) in csc.iter() {
            dense[(row, col)] += val;
        }
        dense
    }
}
