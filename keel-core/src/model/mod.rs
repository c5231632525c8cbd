//! Mutable problem description.
//!
//! A [`Model`] owns an ordered collection of variables and expressions plus
//! the solver configuration. Expressions reference variables by index only;
//! [`Model::validate`] checks every index before a solve starts. The
//! integer solver derives a companion model via [`Model::relax`].

mod expression;
mod variable;

pub use expression::Expression;
pub use variable::Variable;

use crate::error::ModelError;
use crate::options::SolverOptions;

/// A mutable optimization model.
#[derive(Debug, Clone)]
pub struct Model {
    /// Model name.
    pub name: String,

    /// Solver configuration carried with the model.
    pub options: SolverOptions,

    variables: Vec<Variable>,
    expressions: Vec<Expression>,
}

impl Model {
    /// Create an empty model with default options.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: SolverOptions::default(),
            variables: Vec::new(),
            expressions: Vec::new(),
        }
    }

    /// Add a variable, returning its index.
    pub fn add_variable(&mut self, variable: Variable) -> usize {
        self.variables.push(variable);
        self.variables.len() - 1
    }

    /// Add an expression, returning its index.
    pub fn add_expression(&mut self, expression: Expression) -> usize {
        self.expressions.push(expression);
        self.expressions.len() - 1
    }

    /// Number of variables.
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Access a variable by index.
    pub fn variable(&self, index: usize) -> &Variable {
        &self.variables[index]
    }

    /// Mutable access to a variable by index.
    pub fn variable_mut(&mut self, index: usize) -> &mut Variable {
        &mut self.variables[index]
    }

    /// All variables in declaration order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// All expressions in declaration order.
    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }

    /// Mutable access to an expression by index.
    pub fn expression_mut(&mut self, index: usize) -> &mut Expression {
        &mut self.expressions[index]
    }

    /// The objective expression, if one is declared.
    pub fn objective(&self) -> Option<&Expression> {
        self.expressions.iter().find(|e| e.is_objective())
    }

    /// Constraint expressions (everything but the objective).
    pub fn constraints(&self) -> impl Iterator<Item = &Expression> {
        self.expressions.iter().filter(|e| !e.is_objective())
    }

    /// Indices of integer-flagged variables.
    pub fn integer_variables(&self) -> Vec<usize> {
        self.variables
            .iter()
            .enumerate()
            .filter(|(_, v)| v.integer)
            .map(|(i, _)| i)
            .collect()
    }

    /// True if any variable carries an integrality flag.
    pub fn is_integer_model(&self) -> bool {
        self.variables.iter().any(|v| v.integer)
    }

    /// Variable bounds as dense vectors with infinities for open sides.
    pub fn bound_vectors(&self) -> (Vec<f64>, Vec<f64>) {
        let lower = self.variables.iter().map(|v| v.lower_or_neg_inf()).collect();
        let upper = self.variables.iter().map(|v| v.upper_or_inf()).collect();
        (lower, upper)
    }

    /// Integrality-relaxed companion model: same expressions and bounds,
    /// integrality flags stripped.
    pub fn relax(&self) -> Model {
        let mut relaxed = self.clone();
        for v in &mut relaxed.variables {
            v.integer = false;
        }
        relaxed
    }

    /// Validate the model. Called by the canonical-form builder and the
    /// integer solver before anything else happens.
    pub fn validate(&self) -> Result<(), ModelError> {
        let n = self.variables.len();

        let mut objective: Option<&Expression> = None;
        for e in &self.expressions {
            if e.is_objective() {
                if let Some(first) = objective {
                    return Err(ModelError::DuplicateObjective {
                        first: first.name.clone(),
                        second: e.name.clone(),
                    });
                }
                objective = Some(e);
            }
        }

        for e in &self.expressions {
            if let Some(index) = e.max_var_index() {
                if index >= n {
                    return Err(ModelError::DanglingVariable {
                        expression: e.name.clone(),
                        index,
                        count: n,
                    });
                }
            }
            if !e.is_objective() {
                if e.has_quadratic() {
                    return Err(ModelError::QuadraticConstraint {
                        name: e.name.clone(),
                    });
                }
                match (e.lower, e.upper) {
                    (None, None) => {
                        return Err(ModelError::UnboundedExpression {
                            name: e.name.clone(),
                        })
                    }
                    (Some(l), Some(u)) if l > u => {
                        return Err(ModelError::InvertedExpressionBounds {
                            name: e.name.clone(),
                            lower: l,
                            upper: u,
                        })
                    }
                    _ => {}
                }
            }
        }

        for v in &self.variables {
            if let (Some(l), Some(u)) = (v.lower, v.upper) {
                if l > u {
                    return Err(ModelError::InvertedVariableBounds {
                        name: v.name.clone(),
                        lower: l,
                        upper: u,
                    });
                }
            }
        }

        Ok(())
    }
}
