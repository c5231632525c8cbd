//! Primal active-set method for convex QPs.
//!
//! The solver maintains a working set of inequality rows treated as
//! equalities, solves the KKT system for a step and multipliers, and moves
//! between the classic three outcomes per iteration: take the full Newton
//! step, cut the step at the nearest blocking row and activate it, or drop
//! the working-set row with the most negative multiplier. A feasible
//! starting point comes from the warm start when one is usable, otherwise
//! from a phase-one simplex run.
//!
//! All tie-breaks are by lowest row index, which makes runs on identical
//! data bitwise reproducible.

use std::time::{Duration, Instant};

use log::debug;
use nalgebra::{DMatrix, DVector};

use crate::convex::data::ConvexData;
use crate::convex::kkt::{DirectKkt, IterativeKkt, KktSystem};
use crate::linalg;
use crate::linear;
use crate::options::SolverOptions;
use crate::result::{SolveResult, Status};

/// Solve canonical-form data, dispatching on problem class: pure LPs go to
/// the two-phase simplex, quadratic objectives to the active-set method
/// with the incremental KKT strategy.
pub fn solve(data: &ConvexData, options: &SolverOptions) -> SolveResult {
    if data.is_lp() {
        linear::solve(data, options)
    } else {
        solve_iterative(data, options)
    }
}

/// Active-set solve with the refactorizing KKT strategy.
pub fn solve_direct(data: &ConvexData, options: &SolverOptions) -> SolveResult {
    solve_with(DirectKkt::new(), data, options)
}

/// Active-set solve with the incremental inverse-update KKT strategy.
pub fn solve_iterative(data: &ConvexData, options: &SolverOptions) -> SolveResult {
    solve_with(IterativeKkt::new(), data, options)
}

fn solve_with<K: KktSystem>(
    mut kkt: K,
    data: &ConvexData,
    options: &SolverOptions,
) -> SolveResult {
    let n = data.num_variables();
    let me = data.num_equalities();
    let mi = data.num_inequalities();

    if me == 0 && mi == 0 {
        return solve_unconstrained(data);
    }

    let deadline = options
        .time_limit_ms
        .map(|ms| Instant::now() + Duration::from_millis(ms));

    let mut x = match starting_point(data, options) {
        Ok(x) => x,
        Err(status) => {
            return match status {
                Status::Infeasible => SolveResult::infeasible(),
                _ => SolveResult::failed(),
            }
        }
    };

    let mut active = initial_working_set(data, &x, options);
    if !kkt.refresh(data, &active) {
        // Start from the bare equality system and rebuild the working set
        // one row at a time below.
        active.clear();
        kkt.refresh(data, &active);
    }

    for iter in 0..options.max_iter {
        if options.is_cancelled() {
            return SolveResult::failed();
        }
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return SolveResult::failed();
            }
        }

        let g = &data.q * &x + &data.c;

        let mut rhs = DVector::zeros(n + me + active.len());
        rhs.view_mut((0, 0), (n, 1)).copy_from(&(-&g));
        // Residual right-hand sides pull accumulated drift back onto the
        // active constraints instead of assuming exact feasibility.
        for r in 0..me {
            rhs[n + r] = data.be[r] - data.ae.row(r).transpose().dot(&x);
        }
        for (pos, &row) in active.iter().enumerate() {
            rhs[n + me + pos] = data.bi[row] - data.ai.row(row).transpose().dot(&x);
        }

        let Some(sol) = kkt.solve(&rhs) else {
            match null_space_step(data, &g, &x, &active, options) {
                NullSpaceStep::Unbounded => return SolveResult::unbounded(),
                NullSpaceStep::Stuck => return SolveResult::failed(),
                NullSpaceStep::Moved { x_new, activated } => {
                    x = x_new;
                    if let Some(row) = activated {
                        active.push(row);
                    }
                    if !kkt.refresh(data, &active) && activated.is_none() {
                        return SolveResult::failed();
                    }
                    continue;
                }
            }
        };

        let p = sol.rows(0, n).clone_owned();

        if p.amax() <= options.tol {
            // Stationary on the working set. Check multiplier signs.
            let lambda = sol.rows(n + me, active.len());
            let mut drop_pos: Option<usize> = None;
            let mut most_negative = -options.tol;
            for (pos, &l) in lambda.iter().enumerate() {
                if l < most_negative {
                    most_negative = l;
                    drop_pos = Some(pos);
                }
            }

            let Some(pos) = drop_pos else {
                if options.verbose {
                    debug!(
                        "active-set converged after {} iterations, {} active rows",
                        iter,
                        active.len()
                    );
                }
                let value = data.objective_value(&x);
                return SolveResult::optimal(value, x.iter().copied().collect());
            };

            let row = active.remove(pos);
            if options.verbose {
                debug!("iter {iter}: dropping row {row} (multiplier {most_negative:.3e})");
            }
            if !kkt.deactivated(data, &active, pos) && !kkt.refresh(data, &active) {
                return SolveResult::failed();
            }
            continue;
        }

        // Ratio test over inactive rows. Ascending scan with a strict
        // improvement test keeps the lowest blocking index on ties.
        let mut alpha = 1.0_f64;
        let mut blocking: Option<usize> = None;
        for row in 0..mi {
            if active.contains(&row) {
                continue;
            }
            let denom = data.ai.row(row).transpose().dot(&p);
            if denom <= options.tol {
                continue;
            }
            let slack = data.bi[row] - data.ai.row(row).transpose().dot(&x);
            let ratio = (slack / denom).max(0.0);
            if ratio < alpha - options.tol {
                alpha = ratio;
                blocking = Some(row);
            }
        }

        x += alpha * &p;

        if let Some(row) = blocking {
            active.push(row);
            if options.verbose {
                debug!("iter {iter}: step {alpha:.3e}, activating row {row}");
            }
            if !kkt.activated(data, &active) && !kkt.refresh(data, &active) {
                return SolveResult::failed();
            }
        }
    }

    debug!("active-set hit the iteration cap ({})", options.max_iter);
    SolveResult::failed()
}

/// Unconstrained convex QP: a single positive definite solve.
fn solve_unconstrained(data: &ConvexData) -> SolveResult {
    if data.is_lp() {
        return if data.c.iter().all(|&v| v == 0.0) {
            SolveResult::optimal(0.0, vec![0.0; data.num_variables()])
        } else {
            SolveResult::unbounded()
        };
    }
    match linalg::spd_solve(data.q.clone(), &(-&data.c)) {
        Ok(x) => {
            let value = data.objective_value(&x);
            SolveResult::optimal(value, x.iter().copied().collect())
        }
        // A semidefinite objective with no constraints has directions of
        // zero curvature; bail rather than guess.
        Err(_) => SolveResult::failed(),
    }
}

/// Feasible starting point: the warm start when it checks out, otherwise
/// a phase-one simplex run.
fn starting_point(data: &ConvexData, options: &SolverOptions) -> Result<DVector<f64>, Status> {
    if let Some(warm) = &options.warm_start {
        if warm.x.len() == data.num_variables() {
            let x = DVector::from_vec(warm.x.clone());
            if data.max_violation(&x) <= options.feas_tol {
                return Ok(x);
            }
            debug!("warm start violates constraints, falling back to phase one");
        }
    }
    linear::feasible_point(data, options)
}

/// Seed the working set with rows active at the starting point, keeping
/// only rows that grow the rank of the stacked active matrix and stopping
/// before the system over-determines the step.
fn initial_working_set(data: &ConvexData, x: &DVector<f64>, options: &SolverOptions) -> Vec<usize> {
    let n = data.num_variables();
    let me = data.num_equalities();
    let mi = data.num_inequalities();

    let mut stacked = DMatrix::zeros(me, n);
    if me > 0 {
        stacked.copy_from(&data.ae);
    }
    let mut current_rank = linalg::rank(&stacked, options.tol);

    let warm_rows = options
        .warm_start
        .as_ref()
        .map(|w| w.active.clone())
        .unwrap_or_default();

    let mut active = Vec::new();
    let mut consider = |row: usize, active: &mut Vec<usize>, stacked: &mut DMatrix<f64>| {
        if active.contains(&row) || me + active.len() >= n {
            return;
        }
        let slack = data.bi[row] - data.ai.row(row).transpose().dot(x);
        if slack.abs() > options.feas_tol {
            return;
        }
        let mut trial = stacked.clone().insert_row(stacked.nrows(), 0.0);
        trial
            .row_mut(stacked.nrows())
            .copy_from(&data.ai.row(row));
        let trial_rank = linalg::rank(&trial, options.tol);
        if trial_rank > current_rank {
            current_rank = trial_rank;
            *stacked = trial;
            active.push(row);
        }
    };

    for &row in warm_rows.iter().filter(|&&r| r < mi) {
        consider(row, &mut active, &mut stacked);
    }
    for row in 0..mi {
        consider(row, &mut active, &mut stacked);
    }
    active
}

enum NullSpaceStep {
    /// A feasible descent ray with zero curvature and no blocking row.
    Unbounded,
    /// No usable direction in the null space.
    Stuck,
    /// Stepped along a null-space direction, optionally hitting a row.
    Moved {
        x_new: DVector<f64>,
        activated: Option<usize>,
    },
}

/// Singular-KKT recovery: search the null space of the active rows for a
/// descent direction. Zero curvature along such a direction with no
/// blocking row means the problem is unbounded below.
fn null_space_step(
    data: &ConvexData,
    g: &DVector<f64>,
    x: &DVector<f64>,
    active: &[usize],
    options: &SolverOptions,
) -> NullSpaceStep {
    let n = data.num_variables();
    let me = data.num_equalities();
    let mut a_act = DMatrix::zeros(me + active.len(), n);
    if me > 0 {
        a_act.view_mut((0, 0), (me, n)).copy_from(&data.ae);
    }
    for (pos, &row) in active.iter().enumerate() {
        a_act.row_mut(me + pos).copy_from(&data.ai.row(row));
    }

    let basis = linalg::null_space(&a_act, options.tol);

    for col in basis.column_iter() {
        let z = col.clone_owned();
        let curvature = (z.transpose() * &data.q * &z)[(0, 0)];
        let gradient = g.dot(&z);
        if curvature.abs() > options.tol || gradient.abs() <= options.tol {
            continue;
        }
        let d = if gradient > 0.0 { -z } else { z };

        // Ratio test along the ray.
        let mut alpha = f64::INFINITY;
        let mut blocking: Option<usize> = None;
        for row in 0..data.num_inequalities() {
            if active.contains(&row) {
                continue;
            }
            let denom = data.ai.row(row).transpose().dot(&d);
            if denom <= options.tol {
                continue;
            }
            let slack = data.bi[row] - data.ai.row(row).transpose().dot(x);
            let ratio = (slack / denom).max(0.0);
            if ratio < alpha {
                alpha = ratio;
                blocking = Some(row);
            }
        }

        return match blocking {
            None => NullSpaceStep::Unbounded,
            Some(row) => NullSpaceStep::Moved {
                x_new: x + alpha * &d,
                activated: Some(row),
            },
        };
    }

    NullSpaceStep::Stuck
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Expression, Model, Variable};

    /// min (x1 - 1)^2 + (x2 - 2.5)^2 over a small polytope; the known
    /// minimizer is (1.4, 1.7).
    fn wikipedia_qp() -> ConvexData {
        let mut model = Model::new("qp");
        let x1 = model.add_variable(Variable::new("x1").with_lower(0.0));
        let x2 = model.add_variable(Variable::new("x2").with_lower(0.0));

        let mut obj = Expression::new("obj").as_objective();
        obj.set_quadratic(x1, x1, 1.0);
        obj.set_quadratic(x2, x2, 1.0);
        obj.set_linear(x1, -2.0);
        obj.set_linear(x2, -5.0);
        model.add_expression(obj);

        let mut c1 = Expression::new("c1").with_upper(2.0);
        c1.set_linear(x1, -1.0);
        c1.set_linear(x2, 2.0);
        model.add_expression(c1);

        let mut c2 = Expression::new("c2").with_upper(6.0);
        c2.set_linear(x1, 1.0);
        c2.set_linear(x2, 2.0);
        model.add_expression(c2);

        let mut c3 = Expression::new("c3").with_upper(2.0);
        c3.set_linear(x1, 1.0);
        c3.set_linear(x2, -2.0);
        model.add_expression(c3);

        ConvexData::build(&model).unwrap()
    }

    #[test]
    fn direct_finds_the_known_minimizer() {
        let data = wikipedia_qp();
        let result = solve_direct(&data, &SolverOptions::default());
        assert_eq!(result.status, Status::Optimal);
        assert!((result[0] - 1.4).abs() < 1e-6);
        assert!((result[1] - 1.7).abs() < 1e-6);
    }

    #[test]
    fn iterative_agrees_with_direct() {
        let data = wikipedia_qp();
        let options = SolverOptions::default();
        let d = solve_direct(&data, &options);
        let i = solve_iterative(&data, &options);
        assert_eq!(d.status, Status::Optimal);
        assert_eq!(i.status, Status::Optimal);
        assert!((d.value - i.value).abs() < 1e-8);
        assert!((d[0] - i[0]).abs() < 1e-7);
        assert!((d[1] - i[1]).abs() < 1e-7);
    }

    #[test]
    fn equality_constrained_qp() {
        // min x^2 + y^2 subject to x + y = 2 has minimizer (1, 1).
        let mut model = Model::new("eq");
        let x = model.add_variable(Variable::new("x"));
        let y = model.add_variable(Variable::new("y"));
        let mut obj = Expression::new("obj").as_objective();
        obj.set_quadratic(x, x, 1.0);
        obj.set_quadratic(y, y, 1.0);
        model.add_expression(obj);
        let mut eq = Expression::new("eq").level(2.0);
        eq.set_linear(x, 1.0);
        eq.set_linear(y, 1.0);
        model.add_expression(eq);

        let data = ConvexData::build(&model).unwrap();
        let result = solve_iterative(&data, &SolverOptions::default());
        assert_eq!(result.status, Status::Optimal);
        assert!((result[0] - 1.0).abs() < 1e-7);
        assert!((result[1] - 1.0).abs() < 1e-7);
        assert!((result.value - 2.0).abs() < 1e-7);
    }

    #[test]
    fn unconstrained_qp_uses_the_cholesky_shortcut() {
        let mut model = Model::new("free");
        let x = model.add_variable(Variable::new("x"));
        let mut obj = Expression::new("obj").as_objective();
        obj.set_quadratic(x, x, 1.0);
        obj.set_linear(x, -4.0);
        model.add_expression(obj);

        let data = ConvexData::build(&model).unwrap();
        let result = solve_direct(&data, &SolverOptions::default());
        assert_eq!(result.status, Status::Optimal);
        assert!((result[0] - 2.0).abs() < 1e-10);
        assert!((result.value - (-4.0)).abs() < 1e-10);
    }

    #[test]
    fn model_without_variables_solves_trivially() {
        let mut model = Model::new("empty");
        model.add_expression(Expression::new("obj").as_objective());
        let data = ConvexData::build(&model).unwrap();

        for result in [
            solve_direct(&data, &SolverOptions::default()),
            solve_iterative(&data, &SolverOptions::default()),
        ] {
            assert_eq!(result.status, Status::Optimal);
            assert_eq!(result.value, 0.0);
            assert!(result.x.is_empty());
        }
    }

    #[test]
    fn infeasible_bounds_are_detected() {
        // x >= 3 and x <= 1 at the canonical-form level.
        let mut model = Model::new("inf");
        model.add_variable(Variable::new("x"));
        let mut obj = Expression::new("obj").as_objective();
        obj.set_quadratic(0, 0, 1.0);
        model.add_expression(obj);
        let mut lo = Expression::new("lo").with_lower(3.0);
        lo.set_linear(0, 1.0);
        model.add_expression(lo);
        let mut hi = Expression::new("hi").with_upper(1.0);
        hi.set_linear(0, 1.0);
        model.add_expression(hi);

        let data = ConvexData::build(&model).unwrap();
        let result = solve_iterative(&data, &SolverOptions::default());
        assert_eq!(result.status, Status::Infeasible);
        assert!(result.x.is_empty());
    }

    #[test]
    fn warm_start_is_used_when_feasible() {
        let data = wikipedia_qp();
        let options = SolverOptions::default().with_warm_start(crate::options::WarmStart {
            x: vec![1.4, 1.7],
            active: vec![0],
        });
        let result = solve_iterative(&data, &options);
        assert_eq!(result.status, Status::Optimal);
        assert!((result[0] - 1.4).abs() < 1e-6);
    }

    #[test]
    fn repeated_solves_are_identical() {
        let data = wikipedia_qp();
        let options = SolverOptions::default();
        let a = solve_direct(&data, &options);
        let b = solve_direct(&data, &options);
        assert_eq!(a, b);
    }
}
