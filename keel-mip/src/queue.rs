//! Best-bound node queue.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::node::Node;

/// Heap entry. Ordered so the max-heap pops the node with the lowest
/// bound, and on equal bounds the lowest id. Both comparisons are
/// reversed because `BinaryHeap` is a max-heap.
struct QueuedNode(Node);

impl PartialEq for QueuedNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedNode {}

impl PartialOrd for QueuedNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .0
            .bound
            .partial_cmp(&self.0.bound)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.0.id.cmp(&self.0.id))
    }
}

/// Open-node queue with best-bound-first selection.
pub(crate) struct NodeQueue {
    heap: BinaryHeap<QueuedNode>,
}

impl NodeQueue {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    pub fn push(&mut self, node: Node) {
        self.heap.push(QueuedNode(node));
    }

    pub fn pop(&mut self) -> Option<Node> {
        self.heap.pop().map(|q| q.0)
    }

    /// Lowest bound among open nodes; +inf when the queue is empty.
    pub fn best_bound(&self) -> f64 {
        self.heap.peek().map(|q| q.0.bound).unwrap_or(f64::INFINITY)
    }

    /// Drop nodes whose bound is at or above the cutoff. Returns the
    /// number of nodes removed.
    pub fn prune_by_bound(&mut self, cutoff: f64) -> usize {
        let before = self.heap.len();
        let remaining: Vec<QueuedNode> =
            self.heap.drain().filter(|q| q.0.bound < cutoff).collect();
        self.heap = remaining.into_iter().collect();
        before - self.heap.len()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}
