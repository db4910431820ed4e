use std::fmt::Display;

use crate::{
    error::{GraphError, Result},
    op::Op,
};

/// Stable handle of a node inside a [`crate::Graph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node{}", self.0)
    }
}

/// Transient per-pass state of a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mark {
    #[default]
    Unvisited,
    InProgress,
    Done,
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub value: f64,
    pub grad: f64,
    pub op: Op,
    pub mark: Mark,
}

impl Node {
    pub fn new(op: Op, value: f64) -> Self {
        Self {
            value,
            grad: 0.,
            op,
            mark: Mark::Unvisited,
        }
    }
}

/// An arena slot. `None` means the node has been released.
pub(crate) type Slot = Option<Node>;

pub(crate) fn node_ref(nodes: &[Slot], id: NodeId) -> Result<&Node> {
    nodes
        .get(id.index())
        .ok_or(GraphError::UnknownNode { node: id })?
        .as_ref()
        .ok_or(GraphError::Released { node: id })
}

pub(crate) fn node_mut(nodes: &mut [Slot], id: NodeId) -> Result<&mut Node> {
    nodes
        .get_mut(id.index())
        .ok_or(GraphError::UnknownNode { node: id })?
        .as_mut()
        .ok_or(GraphError::Released { node: id })
}
