//! The branch-and-bound driver.

use std::time::{Duration, Instant};

use log::info;

use keel_core::convex::{self, ConvexData};
use keel_core::options::WarmStart;
use keel_core::{Model, SolveResult, Status};

use crate::branching;
use crate::error::MipError;
use crate::incumbent::Incumbent;
use crate::node::Node;
use crate::queue::NodeQueue;
use crate::settings::MipSettings;

/// Search statistics, for callers that want more than the result.
#[derive(Debug, Clone)]
pub struct MipStats {
    /// Nodes whose relaxation was solved.
    pub nodes_explored: u64,

    /// Nodes discarded by bound, infeasibility, or incumbent pruning.
    pub nodes_pruned: u64,

    /// Times the incumbent improved.
    pub incumbent_updates: u64,

    /// Best lower bound at termination.
    pub best_bound: f64,

    /// Wall-clock time in milliseconds.
    pub elapsed_ms: u64,
}

/// Solve a model with integer variables by branch and bound.
///
/// Models without integer variables fall through to a single continuous
/// solve. Search order is deterministic: best bound first, ties by node
/// creation order.
pub fn solve(model: &Model, settings: &MipSettings) -> Result<SolveResult, MipError> {
    solve_with_stats(model, settings).map(|(result, _)| result)
}

enum Stop {
    /// Queue emptied: the incumbent, if any, is proven optimal.
    Exhausted,
    /// Node/time limit or cancellation.
    Limit,
    /// A node solve failed numerically.
    Aborted,
    /// A relaxation was unbounded below.
    Unbounded,
}

/// [`solve`], also returning search statistics.
pub fn solve_with_stats(
    model: &Model,
    settings: &MipSettings,
) -> Result<(SolveResult, MipStats), MipError> {
    model.validate()?;
    let start = Instant::now();

    let integer_vars = model.integer_variables();
    if integer_vars.is_empty() {
        let data = ConvexData::build(model)?;
        let result = convex::solve(&data, &settings.node_options);
        let stats = MipStats {
            nodes_explored: 1,
            nodes_pruned: 0,
            incumbent_updates: 0,
            best_bound: result.value,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        return Ok((result, stats));
    }

    let relaxed = model.relax();
    let deadline = settings
        .time_limit_ms
        .map(|ms| start + Duration::from_millis(ms));

    let (lower, upper) = model.bound_vectors();
    let mut root = Node::root(lower, upper);
    // Caller-supplied start values seed the root relaxation when every
    // variable carries one.
    let start_values: Option<Vec<f64>> = model.variables().iter().map(|v| v.value).collect();
    root.warm = start_values.map(|x| WarmStart {
        x,
        active: Vec::new(),
    });
    let mut queue = NodeQueue::new();
    queue.push(root);

    let incumbent = Incumbent::new();
    let mut next_id = 1u64;
    let mut nodes_explored = 0u64;
    let mut nodes_pruned = 0u64;
    let mut incumbent_updates = 0u64;

    let stop = loop {
        if settings.is_cancelled() {
            break Stop::Limit;
        }
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                break Stop::Limit;
            }
        }
        if nodes_explored >= settings.node_limit {
            break Stop::Limit;
        }

        let cutoff = settings.cutoff(incumbent.value());
        let Some(node) = queue.pop() else {
            break Stop::Exhausted;
        };
        if node.bound >= cutoff {
            nodes_pruned += 1;
            continue;
        }

        nodes_explored += 1;
        if settings.verbose && nodes_explored % settings.log_freq == 0 {
            info!(
                "nodes {} ({} open) | bound {:.6e} | incumbent {:.6e}",
                nodes_explored,
                queue.len(),
                node.bound,
                incumbent.value(),
            );
        }

        let data = ConvexData::build_bounded(&relaxed, &node.lower, &node.upper)?;
        let mut options = settings.node_options.clone();
        options.int_tol = settings.int_tol;
        if let Some(warm) = &node.warm {
            options.warm_start = Some(warm.clone());
        }
        if let Some(flag) = &settings.cancel {
            options.cancel = Some(flag.clone());
        }

        let relax = convex::solve(&data, &options);
        match relax.status {
            Status::Infeasible => {
                nodes_pruned += 1;
                continue;
            }
            Status::Unbounded => break Stop::Unbounded,
            Status::Failed => break Stop::Aborted,
            Status::Optimal | Status::Feasible => {}
        }
        if relax.value >= cutoff {
            nodes_pruned += 1;
            continue;
        }

        if let Some(var) = branching::select(&relax.x, &integer_vars, settings.int_tol) {
            let warm = WarmStart {
                x: relax.x.clone(),
                active: data.active_rows(&relax.x, options.feas_tol),
            };
            let (down, up) = node.branch(var, relax.x[var], relax.value, warm, next_id);
            next_id += 2;
            queue.push(down);
            queue.push(up);
            continue;
        }

        // Integral relaxation: snap to exact integers and keep the point
        // only if rounding did not break feasibility.
        let rounded = branching::round_integers(&relax.x, &integer_vars);
        let round_tol = settings.int_tol.max(options.feas_tol) * 10.0;
        if !within_bounds(model, &rounded, round_tol) {
            nodes_pruned += 1;
            continue;
        }
        let value = model
            .objective()
            .map(|o| o.evaluate(&rounded))
            .unwrap_or(0.0);
        if incumbent.try_improve(value, rounded) {
            incumbent_updates += 1;
            let pruned = queue.prune_by_bound(settings.cutoff(value));
            nodes_pruned += pruned as u64;
            if settings.verbose {
                info!("new incumbent {:.6e}, pruned {} nodes", value, pruned);
            }
        }
    };

    let best_bound = queue.best_bound().min(incumbent.value());
    let result = match stop {
        Stop::Exhausted => match incumbent.snapshot() {
            Some((value, x)) => SolveResult::optimal(value, x),
            None => SolveResult::infeasible(),
        },
        Stop::Limit | Stop::Aborted => match incumbent.snapshot() {
            Some((value, x)) => SolveResult::feasible(value, x),
            None => SolveResult::failed(),
        },
        Stop::Unbounded => SolveResult::unbounded(),
    };

    let stats = MipStats {
        nodes_explored,
        nodes_pruned,
        incumbent_updates,
        best_bound,
        elapsed_ms: start.elapsed().as_millis() as u64,
    };
    Ok((result, stats))
}

/// Check a rounded candidate against the model's constraints and variable
/// bounds at a tolerance loose enough to absorb the rounding itself.
fn within_bounds(model: &Model, x: &[f64], tol: f64) -> bool {
    for e in model.constraints() {
        let v = e.evaluate(x);
        if e.lower.is_some_and(|l| v < l - tol) {
            return false;
        }
        if e.upper.is_some_and(|u| v > u + tol) {
            return false;
        }
    }
    model.variables().iter().enumerate().all(|(i, var)| {
        x[i] >= var.lower_or_neg_inf() - tol && x[i] <= var.upper_or_inf() + tol
    })
}
