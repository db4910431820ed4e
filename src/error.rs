use thiserror::Error;

use crate::{
    node::NodeId,
    op::{Arity, OpKind},
};

/// Errors reported by graph construction, traversal and evaluation.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("cycle detected in computation graph involving {node}")]
    CycleDetected { node: NodeId },

    #[error("{kind} expects {expected} input(s), got {actual}")]
    ArityMismatch {
        kind: OpKind,
        expected: Arity,
        actual: usize,
    },

    #[error("traversal order exceeded its capacity of {capacity} nodes")]
    CapacityExceeded { capacity: usize },

    #[error("{node} divides by zero")]
    NumericDegeneracy { node: NodeId },

    #[error("{node} does not belong to this graph")]
    UnknownNode { node: NodeId },

    #[error("{node} has been released")]
    Released { node: NodeId },

    #[error("cannot set the value of non-leaf {node}")]
    NotALeaf { node: NodeId },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = GraphError> = std::result::Result<T, E>;
