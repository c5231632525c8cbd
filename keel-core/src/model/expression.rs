//! Linear/quadratic expressions.

use std::collections::BTreeMap;

/// A sparse linear (optionally quadratic) expression.
///
/// An expression is either the objective or a constraint. As a constraint,
/// `lower == upper` encodes an equality, a single finite side encodes an
/// inequality, and two distinct finite sides encode a range (two
/// inequality rows in canonical form).
///
/// A quadratic coefficient on `(i, j)` contributes `v * x_i * x_j` to the
/// expression value; keys are normalized to the upper triangle (`i <= j`).
/// Coefficient maps are `BTreeMap`s so iteration order, and therefore
/// canonical-form assembly, is deterministic.
#[derive(Debug, Clone)]
pub struct Expression {
    /// Expression name.
    pub name: String,

    /// Lower bound on the expression value (None = -inf).
    pub lower: Option<f64>,

    /// Upper bound on the expression value (None = +inf).
    pub upper: Option<f64>,

    linear: BTreeMap<usize, f64>,
    quadratic: BTreeMap<(usize, usize), f64>,
    objective: bool,
}

impl Expression {
    /// Create an empty expression.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lower: None,
            upper: None,
            linear: BTreeMap::new(),
            quadratic: BTreeMap::new(),
            objective: false,
        }
    }

    /// Mark this expression as the objective.
    pub fn as_objective(mut self) -> Self {
        self.objective = true;
        self
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

    /// Fix the expression to a level (equality constraint).
    pub fn level(mut self, value: f64) -> Self {
        self.lower = Some(value);
        self.upper = Some(value);
        self
    }

    /// Set the linear coefficient of a variable.
    pub fn set_linear(&mut self, var: usize, coefficient: f64) {
        self.linear.insert(var, coefficient);
    }

    /// Add to the linear coefficient of a variable.
    pub fn add_linear(&mut self, var: usize, coefficient: f64) {
        *self.linear.entry(var).or_insert(0.0) += coefficient;
    }

    /// Set the quadratic coefficient of a variable pair.
    pub fn set_quadratic(&mut self, i: usize, j: usize, coefficient: f64) {
        let key = if i <= j { (i, j) } else { (j, i) };
        self.quadratic.insert(key, coefficient);
    }

    /// True if this expression is the objective.
    pub fn is_objective(&self) -> bool {
        self.objective
    }

    /// True if the declared bounds encode an equality.
    pub fn is_equality(&self) -> bool {
        match (self.lower, self.upper) {
            (Some(l), Some(u)) => l == u,
            _ => false,
        }
    }

    /// True if the expression carries quadratic terms.
    pub fn has_quadratic(&self) -> bool {
        !self.quadratic.is_empty()
    }

    /// Linear terms in ascending variable order.
    pub fn linear_terms(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.linear.iter().map(|(&i, &v)| (i, v))
    }

    /// Quadratic terms in ascending (i, j) order, upper triangle.
    pub fn quadratic_terms(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.quadratic.iter().map(|(&(i, j), &v)| (i, j, v))
    }

    /// Largest variable index referenced, if any.
    pub fn max_var_index(&self) -> Option<usize> {
        let lin = self.linear.keys().next_back().copied();
        let quad = self.quadratic.keys().next_back().map(|&(_, j)| j);
        match (lin, quad) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }

    /// Evaluate the expression at a point.
    pub fn evaluate(&self, x: &[f64]) -> f64 {
        let mut value = 0.0;
        for (&i, &v) in &self.linear {
            value += v * x[i];
        }
        for (&(i, j), &v) in &self.quadratic {
            value += v * x[i] * x[j];
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadratic_keys_normalize_to_upper_triangle() {
        let mut e = Expression::new("q");
        e.set_quadratic(2, 0, 3.0);
        let terms: Vec<_> = e.quadratic_terms().collect();
        assert_eq!(terms, vec![(0, 2, 3.0)]);
    }

    #[test]
    fn equality_detection() {
        assert!(Expression::new("e").level(2.0).is_equality());
        assert!(!Expression::new("i").with_upper(2.0).is_equality());
        assert!(!Expression::new("r").with_lower(1.0).with_upper(2.0).is_equality());
    }

    #[test]
    fn evaluation_covers_both_term_kinds() {
        let mut e = Expression::new("f");
        e.set_linear(0, 2.0);
        e.set_quadratic(0, 1, 1.0);
        // 2*3 + 3*4 = 18
        assert_eq!(e.evaluate(&[3.0, 4.0]), 18.0);
    }

    #[test]
    fn max_var_index_spans_linear_and_quadratic() {
        let mut e = Expression::new("f");
        e.set_linear(1, 1.0);
        e.set_quadratic(0, 4, 1.0);
        assert_eq!(e.max_var_index(), Some(4));
    }
}
