//! Decision variables.

/// A decision variable: bounds, integrality, optional start value.
///
/// Variables are owned by the [`Model`](crate::Model) and referenced by
/// index everywhere else, which keeps canonical-form construction stable.
#[derive(Debug, Clone)]
pub struct Variable {
    /// Variable name (used in validation errors and the MPS reader).
    pub name: String,

    /// Lower bound (None = -inf).
    pub lower: Option<f64>,

    /// Upper bound (None = +inf).
    pub upper: Option<f64>,

    /// Integrality flag.
    pub integer: bool,

    /// Optional start value.
    pub value: Option<f64>,
}

impl Variable {
    /// Create an unbounded continuous variable.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lower: None,
            upper: None,
            integer: false,
            value: None,
        }
    }

    /// Create a binary variable (integer in [0, 1]).
    pub fn binary(name: impl Into<String>) -> Self {
        Self::new(name).with_lower(0.0).with_upper(1.0).as_integer()
    }

    /// Set the lower bound.
    pub fn with_lower(mut self, lower: f64) -> Self {
        self.lower = Some(lower);
        self
    }

    /// Set the upper bound.
    pub fn with_upper(mut self, upper: f64) -> Self {
        self.upper = Some(upper);
        self
    }

    /// Mark the variable integer.
    pub fn as_integer(mut self) -> Self {
        self.integer = true;
        self
    }

    /// Lower bound as an f64, with -inf for the unbounded side.
    pub fn lower_or_neg_inf(&self) -> f64 {
        self.lower.unwrap_or(f64::NEG_INFINITY)
    }

    /// Upper bound as an f64, with +inf for the unbounded side.
    pub fn upper_or_inf(&self) -> f64 {
        self.upper.unwrap_or(f64::INFINITY)
    }
}
