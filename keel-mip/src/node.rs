//! Search-tree nodes.
//!
//! A node is a full copy of the variable bound vectors plus bookkeeping.
//! Copying the bounds keeps nodes self-contained: the shared model is
//! never mutated during the search, so the driver could hand nodes to
//! worker threads without coordination.

use keel_core::WarmStart;

/// One subproblem in the branch-and-bound tree.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    /// Unique id in creation order; the deterministic tie-break for
    /// queue ordering.
    pub id: u64,

    /// Depth in the tree (root = 0).
    pub depth: u32,

    /// Parent relaxation value: a lower bound on every integral solution
    /// in this subtree.
    pub bound: f64,

    /// Per-variable lower bounds for this subproblem.
    pub lower: Vec<f64>,

    /// Per-variable upper bounds for this subproblem.
    pub upper: Vec<f64>,

    /// Parent relaxation point and active rows, used to warm-start the
    /// node solve.
    pub warm: Option<WarmStart>,
}

impl Node {
    /// The root node over the model's own bounds.
    pub fn root(lower: Vec<f64>, upper: Vec<f64>) -> Self {
        Self {
            id: 0,
            depth: 0,
            bound: f64::NEG_INFINITY,
            lower,
            upper,
            warm: None,
        }
    }

    /// Split on `var` at fractional `value`: the down child caps the
    /// variable at `floor(value)`, the up child raises it to
    /// `ceil(value)`. Ids are `down_id` and `down_id + 1`.
    ///
    /// The warm point's branched coordinate is clamped into each child's
    /// bounds; unclamped it would violate the new bound row by the full
    /// fractional part and the child solve would reject it.
    pub fn branch(
        &self,
        var: usize,
        value: f64,
        bound: f64,
        warm: WarmStart,
        down_id: u64,
    ) -> (Node, Node) {
        let mut down = Node {
            id: down_id,
            depth: self.depth + 1,
            bound,
            lower: self.lower.clone(),
            upper: self.upper.clone(),
            warm: Some(warm.clone()),
        };
        down.upper[var] = down.upper[var].min(value.floor());
        if let Some(w) = &mut down.warm {
            w.x[var] = w.x[var].min(down.upper[var]);
        }

        let mut up = Node {
            id: down_id + 1,
            depth: self.depth + 1,
            bound,
            lower: self.lower.clone(),
            upper: self.upper.clone(),
            warm: Some(warm),
        };
        up.lower[var] = up.lower[var].max(value.ceil());
        if let Some(w) = &mut up.warm {
            w.x[var] = w.x[var].max(up.lower[var]);
        }

        (down, up)
    }
}
