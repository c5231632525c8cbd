//! Model validation errors.
//!
//! Validation failures are surfaced to the caller before any solve starts.
//! Numerical trouble during a solve is never an `Err`; it is reported as
//! [`Status::Failed`](crate::Status::Failed) in the solve result.

use thiserror::Error;

/// Errors detected while validating a model.
#[derive(Error, Debug)]
pub enum ModelError {
    /// More than one expression is marked as the objective.
    #[error("model has more than one objective expression (`{first}` and `{second}`)")]
    DuplicateObjective {
        /// Name of the first objective encountered.
        first: String,
        /// Name of the second objective encountered.
        second: String,
    },

    /// An expression references a variable index outside the model.
    #[error("expression `{expression}` references variable {index} but the model has {count} variables")]
    DanglingVariable {
        /// Name of the offending expression.
        expression: String,
        /// The out-of-range variable index.
        index: usize,
        /// Number of variables in the model.
        count: usize,
    },

    /// A variable has a lower bound above its upper bound.
    #[error("variable `{name}` has lower bound {lower} > upper bound {upper}")]
    InvertedVariableBounds {
        /// Variable name.
        name: String,
        /// Declared lower bound.
        lower: f64,
        /// Declared upper bound.
        upper: f64,
    },

    /// A constraint expression has a lower bound above its upper bound.
    #[error("expression `{name}` has lower bound {lower} > upper bound {upper}")]
    InvertedExpressionBounds {
        /// Expression name.
        name: String,
        /// Declared lower bound.
        lower: f64,
        /// Declared upper bound.
        upper: f64,
    },

    /// Quadratic terms are only supported in the objective.
    #[error("constraint expression `{name}` has quadratic terms; only the objective may be quadratic")]
    QuadraticConstraint {
        /// Expression name.
        name: String,
    },

    /// A constraint expression has neither a lower nor an upper bound.
    #[error("expression `{name}` is neither objective nor bounded; it constrains nothing")]
    UnboundedExpression {
        /// Expression name.
        name: String,
    },
}
