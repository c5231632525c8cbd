//! Keel: a convex quadratic/linear programming core.
//!
//! This library provides the continuous half of a mathematical-programming
//! engine:
//!
//! - **Model layer**: decision variables with bounds and integrality flags,
//!   sparse linear/quadratic expressions acting as objective or constraints.
//! - **Canonical form**: a [`ConvexData`] snapshot in the shape
//!   `minimize (1/2) x^T Q x + c^T x  s.t.  AE x = bE, AI x <= bI`,
//!   with variable bounds folded into the inequality block.
//! - **Active-set solver**: a working-set method for convex QPs, in a
//!   *direct* variant (refactorizes the KKT system every iteration) and an
//!   *iterative* variant (updates a maintained KKT inverse incrementally).
//! - **Linear solver**: a dense two-phase simplex covering the `Q == 0`
//!   case, which also supplies phase-one feasible points to the active-set
//!   method.
//! - **MPS reader**: parses MPS model files into a [`Model`].
//!
//! Every solver call returns the same [`SolveResult`] contract: a
//! [`Status`], an objective value, and a solution vector indexable in
//! variable order. Callers must check the status before trusting the value
//! or the solution.
//!
//! # Example
//!
//! ```ignore
//! use keel_core::{convex, ConvexData, Expression, Model, Variable};
//!
//! let mut model = Model::new("example");
//! let x = model.add_variable(Variable::new("x").with_lower(0.0));
//! let y = model.add_variable(Variable::new("y").with_lower(0.0));
//!
//! let mut obj = Expression::new("obj").as_objective();
//! obj.set_quadratic(x, x, 1.0);
//! obj.set_linear(y, -3.0);
//! model.add_expression(obj);
//!
//! let mut budget = Expression::new("budget").with_upper(4.0);
//! budget.set_linear(x, 1.0);
//! budget.set_linear(y, 1.0);
//! model.add_expression(budget);
//!
//! let data = ConvexData::build(&model)?;
//! let result = convex::solve(&data, &model.options);
//! println!("{}: {}", result.status, result.value);
//! ```

#![warn(clippy::all)]

pub mod convex;
pub mod error;
pub mod linalg;
pub mod linear;
pub mod model;
pub mod mps;
pub mod options;
pub mod result;

pub use convex::ConvexData;
pub use error::ModelError;
pub use model::{Expression, Model, Variable};
pub use mps::MpsError;
pub use options::{SolverOptions, WarmStart};
pub use result::{SolveResult, Status};
