//! The outcome contract shared by every solver.

use std::fmt;
use std::ops::Index;

/// Terminal status of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Optimal solution found within tolerance.
    Optimal,

    /// A usable integral solution was found but optimality is unproven
    /// (node/time limit or cancellation). Only the integer solver emits
    /// this.
    Feasible,

    /// The problem has no feasible point.
    Infeasible,

    /// A strictly improving direction exists with no blocking constraint.
    Unbounded,

    /// Numerical failure (singular KKT system beyond recovery, iteration
    /// cap) or resource exhaustion with nothing to return. Callers may
    /// retry with relaxed tolerances.
    Failed,
}

impl Status {
    /// True if the result carries a usable solution vector.
    pub fn is_feasible(self) -> bool {
        matches!(self, Status::Optimal | Status::Feasible)
    }

    /// True if optimality was proven.
    pub fn is_optimal(self) -> bool {
        matches!(self, Status::Optimal)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Optimal => write!(f, "Optimal"),
            Status::Feasible => write!(f, "Feasible"),
            Status::Infeasible => write!(f, "Infeasible"),
            Status::Unbounded => write!(f, "Unbounded"),
            Status::Failed => write!(f, "Failed"),
        }
    }
}

/// Immutable solve outcome: status, objective value, solution vector.
///
/// The solution vector is indexed in variable order. No solver produces a
/// partial solution under a non-feasible status; `x` is empty there.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult {
    /// Terminal status. Check before trusting `value` or the solution.
    pub status: Status,

    /// Objective value at the solution (meaningless unless feasible).
    pub value: f64,

    /// Solution vector in variable order (empty unless feasible).
    pub x: Vec<f64>,
}

impl SolveResult {
    /// An optimal result.
    pub fn optimal(value: f64, x: Vec<f64>) -> Self {
        Self {
            status: Status::Optimal,
            value,
            x,
        }
    }

    /// A feasible-but-unproven result (integer solver under a limit).
    pub fn feasible(value: f64, x: Vec<f64>) -> Self {
        Self {
            status: Status::Feasible,
            value,
            x,
        }
    }

    /// An infeasible result.
    pub fn infeasible() -> Self {
        Self {
            status: Status::Infeasible,
            value: f64::INFINITY,
            x: Vec::new(),
        }
    }

    /// An unbounded result.
    pub fn unbounded() -> Self {
        Self {
            status: Status::Unbounded,
            value: f64::NEG_INFINITY,
            x: Vec::new(),
        }
    }

    /// A failed result.
    pub fn failed() -> Self {
        Self {
            status: Status::Failed,
            value: f64::NAN,
            x: Vec::new(),
        }
    }
}

impl Index<usize> for SolveResult {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.x[index]
    }
}
