//! Solver configuration.
//!
//! Options are an explicit immutable value threaded through every solver
//! call. There is no ambient/global configuration; concurrent solves with
//! different options are independent.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Optional warm-start data for repeated solves.
///
/// The branch-and-bound driver re-solves lightly perturbed sibling nodes;
/// handing the parent's solution (and optionally its working set) to the
/// iterative active-set variant lets it skip most of phase one. A warm
/// start that turns out infeasible for the current data is silently
/// ignored.
#[derive(Debug, Clone, Default)]
pub struct WarmStart {
    /// Initial primal point (length n).
    pub x: Vec<f64>,

    /// Inequality rows to seed the working set with.
    pub active: Vec<usize>,
}

/// Settings shared by the convex and linear solvers.
#[derive(Debug, Clone)]
pub struct SolverOptions {
    /// Numeric solution-accuracy tolerance. All comparisons against zero
    /// use this relative tolerance, never exact equality.
    pub tol: f64,

    /// Primal feasibility tolerance for constraint residuals.
    pub feas_tol: f64,

    /// Integrality tolerance: a value v is integral if |v - round(v)| is
    /// within this.
    pub int_tol: f64,

    /// Maximum iterations per solve (active-set iterations, or simplex
    /// pivots per phase). Exceeding the cap terminates with `Failed`.
    pub max_iter: usize,

    /// Wall-clock limit in milliseconds (None = unlimited). Polled at
    /// iteration boundaries.
    pub time_limit_ms: Option<u64>,

    /// Enable progress logging through the `log` crate.
    pub verbose: bool,

    /// Optional warm start.
    pub warm_start: Option<WarmStart>,

    /// Cooperative cancellation flag, polled at iteration boundaries.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            tol: 1e-8,
            feas_tol: 1e-7,
            int_tol: 1e-6,
            max_iter: 500,
            time_limit_ms: None,
            verbose: false,
            warm_start: None,
            cancel: None,
        }
    }
}

impl SolverOptions {
    /// Set the solution-accuracy tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the iteration cap.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the wall-clock limit in seconds.
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit_ms = Some((seconds * 1000.0) as u64);
        self
    }

    /// Attach a warm start.
    pub fn with_warm_start(mut self, warm: WarmStart) -> Self {
        self.warm_start = Some(warm);
        self
    }

    /// Attach a cancellation flag.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// True if the cancellation flag is set.
    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|f| f.load(std::sync::atomic::Ordering::Relaxed))
            .unwrap_or(false)
    }
}
