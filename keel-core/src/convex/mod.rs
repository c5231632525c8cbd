//! Convex solver: canonical form and the active-set method.
//!
//! [`ConvexData`] is the immutable canonical snapshot
//! `minimize (1/2) x^T Q x + c^T x  s.t.  AE x = bE, AI x <= bI`
//! that the solvers consume. [`solve`] dispatches on problem class:
//! pure LPs go to the simplex in [`crate::linear`], QPs to the active-set
//! method. [`solve_direct`] and [`solve_iterative`] pin the KKT strategy.

mod active_set;
mod data;
mod kkt;

pub use active_set::{solve, solve_direct, solve_iterative};
pub use data::ConvexData;
