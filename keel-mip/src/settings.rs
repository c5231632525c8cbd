//! Integer-solver configuration.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use keel_core::SolverOptions;

/// Settings for the branch-and-bound search.
#[derive(Debug, Clone)]
pub struct MipSettings {
    /// Maximum nodes to explore before stopping with the incumbent.
    pub node_limit: u64,

    /// Wall-clock limit in milliseconds (None = unlimited), polled at
    /// node boundaries.
    pub time_limit_ms: Option<u64>,

    /// Relative optimality gap at which a node (or the whole search) is
    /// considered closed.
    pub gap_tol: f64,

    /// Absolute optimality gap, for incumbents near zero.
    pub gap_abs_tol: f64,

    /// Integrality tolerance: a relaxation value within this of an
    /// integer counts as integral.
    pub int_tol: f64,

    /// Enable progress logging through the `log` crate.
    pub verbose: bool,

    /// Log every this many explored nodes when verbose.
    pub log_freq: u64,

    /// Options handed to the per-node continuous solves.
    pub node_options: SolverOptions,

    /// Cooperative cancellation flag, polled at node boundaries and
    /// forwarded to node solves.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for MipSettings {
    fn default() -> Self {
        Self {
            node_limit: 100_000,
            time_limit_ms: None,
            gap_tol: 1e-6,
            gap_abs_tol: 1e-9,
            int_tol: 1e-6,
            verbose: false,
            log_freq: 100,
            node_options: SolverOptions::default(),
            cancel: None,
        }
    }
}

impl MipSettings {
    /// Set the node limit.
    pub fn with_node_limit(mut self, limit: u64) -> Self {
        self.node_limit = limit;
        self
    }

    /// Set the wall-clock limit in seconds.
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit_ms = Some((seconds * 1000.0) as u64);
        self
    }

    /// Set the relative gap tolerance.
    pub fn with_gap_tol(mut self, gap: f64) -> Self {
        self.gap_tol = gap;
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

    /// The incumbent-relative cutoff: nodes whose bound is at or above
    /// this cannot improve on `incumbent`.
    pub fn cutoff(&self, incumbent: f64) -> f64 {
        if incumbent.is_finite() {
            incumbent - self.gap_abs_tol.max(self.gap_tol * incumbent.abs())
        } else {
            f64::INFINITY
        }
    }
}
