//! Branch-and-bound integer solver on top of `keel-core`.
//!
//! The driver relaxes integrality, solves the continuous relaxation of
//! each node with the convex solver, and branches on fractional integer
//! variables. Exploration is best-bound first; identical models and
//! settings explore the same tree in the same order.
//!
//! The outcome contract is shared with the continuous solvers through
//! [`keel_core::SolveResult`], with one addition: a run stopped by a
//! node/time limit or cancellation that is holding an integral incumbent
//! reports it under [`Status::Feasible`](keel_core::Status::Feasible).

#![warn(clippy::all)]

mod branching;
mod incumbent;
mod node;
mod queue;

pub mod error;
pub mod settings;
pub mod solve;

pub use error::MipError;
pub use settings::MipSettings;
pub use solve::{solve, solve_with_stats, MipStats};
