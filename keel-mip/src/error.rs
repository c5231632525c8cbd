//! Integer-solver errors.

use thiserror::Error;

use keel_core::ModelError;

/// Errors surfaced before the tree search starts. As in the continuous
/// solvers, trouble during the search itself is reported through the
/// result status, not as an `Err`.
#[derive(Error, Debug)]
pub enum MipError {
    /// The model failed validation.
    #[error("invalid model: {0}")]
    InvalidModel(#[from] ModelError),
}
