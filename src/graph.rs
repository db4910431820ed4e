//! The node arena behind every computation graph. Nodes are appended and never
//! move, so a [`NodeId`] stays valid until its node is released.
//!
//! Nodes refer to their inputs by [`NodeId`], so a node can feed any number of
//! consumers without anyone owning it but the [`Graph`] itself.

use std::cell::RefCell;

use crate::{
    config::GraphConfig,
    error::{GraphError, Result},
    node::{node_mut, node_ref, Mark, Node, NodeId, Slot},
    op::{Op, OpKind},
    var::Var,
};

/// An arena of nodes. Interior mutability lets handles share `&Graph`, which
/// also makes a graph `!Sync`: give each thread its own.
#[derive(Default, Debug)]
pub struct Graph {
    pub(crate) nodes: RefCell<Vec<Slot>>,
    pub(crate) config: GraphConfig,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            nodes: RefCell::default(),
            config,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Number of live (not released) nodes.
    pub fn len(&self) -> usize {
        self.nodes.borrow().iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn create_leaf(&self, value: f64) -> NodeId {
        self.push(Node::new(Op::Leaf, value))
    }

    pub fn create_add(&self, a: NodeId, b: NodeId) -> Result<NodeId> {
        self.create(OpKind::Add, &[a, b])
    }

    pub fn create_multiply(&self, a: NodeId, b: NodeId) -> Result<NodeId> {
        self.create(OpKind::Multiply, &[a, b])
    }

    pub fn create_exponential(&self, x: NodeId) -> Result<NodeId> {
        self.create(OpKind::Exponential, &[x])
    }

    /// `inputs[0]` / sum of all `inputs`.
    pub fn create_normalize_component(&self, inputs: &[NodeId]) -> Result<NodeId> {
        self.create(OpKind::NormalizeComponent, inputs)
    }

    /// Creates a node of any kind. Nothing is added to the graph if the number
    /// of inputs does not fit `kind` or an input is not a live node of this
    /// graph. A leaf created this way starts at zero.
    pub fn create(&self, kind: OpKind, inputs: &[NodeId]) -> Result<NodeId> {
        let op = Op::new(kind, inputs)?;
        self.check_live(inputs)?;
        Ok(self.push(Node::new(op, 0.)))
    }

    /// Rewires the inputs of an existing operation node. The kind is kept and
    /// the arity is checked again. Nothing prevents the new inputs from
    /// forming a cycle; traversals report it.
    pub fn replace_inputs(&self, node: NodeId, inputs: &[NodeId]) -> Result<()> {
        let kind = self.kind(node)?;
        let op = Op::new(kind, inputs)?;
        self.check_live(inputs)?;
        node_mut(&mut self.nodes.borrow_mut(), node)?.op = op;
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if the arena already holds `u32::MAX + 1` nodes.
    pub(crate) fn push(&self, node: Node) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let id = next_id(nodes.len());
        nodes.push(Some(node));
        id
    }

    fn check_live(&self, ids: &[NodeId]) -> Result<()> {
        let nodes = self.nodes.borrow();
        for id in ids {
            node_ref(&nodes, *id)?;
        }
        Ok(())
    }

    pub fn value(&self, node: NodeId) -> Result<f64> {
        Ok(node_ref(&self.nodes.borrow(), node)?.value)
    }

    /// Sets the value of a leaf. Operation nodes get their values from
    /// evaluation only.
    pub fn set_value(&self, node: NodeId, value: f64) -> Result<()> {
        let mut nodes = self.nodes.borrow_mut();
        let node_data = node_mut(&mut nodes, node)?;
        if !matches!(node_data.op, Op::Leaf) {
            return Err(GraphError::NotALeaf { node });
        }
        node_data.value = value;
        Ok(())
    }

    pub fn grad(&self, node: NodeId) -> Result<f64> {
        Ok(node_ref(&self.nodes.borrow(), node)?.grad)
    }

    /// Overwrites the gradient, e.g. to seed an output before
    /// [`Graph::run_backward`].
    pub fn set_grad(&self, node: NodeId, grad: f64) -> Result<()> {
        node_mut(&mut self.nodes.borrow_mut(), node)?.grad = grad;
        Ok(())
    }

    pub fn kind(&self, node: NodeId) -> Result<OpKind> {
        Ok(node_ref(&self.nodes.borrow(), node)?.op.kind())
    }

    pub fn inputs(&self, node: NodeId) -> Result<Vec<NodeId>> {
        Ok(node_ref(&self.nodes.borrow(), node)?.op.inputs().to_vec())
    }

    pub fn mark(&self, node: NodeId) -> Result<Mark> {
        Ok(node_ref(&self.nodes.borrow(), node)?.mark)
    }

    /// Creates a leaf and returns a handle to it.
    pub fn leaf(&self, value: f64) -> Var<'_> {
        let id = self.create_leaf(value);
        Var::new(self, id)
    }

    /// Wraps an existing node into a handle.
    pub fn var(&self, node: NodeId) -> Result<Var<'_>> {
        node_ref(&self.nodes.borrow(), node)?;
        Ok(Var::new(self, node))
    }
}

fn next_id(len: usize) -> NodeId {
    match u32::try_from(len) {
        Ok(idx) => NodeId(idx),
        Err(_) => panic!("a graph holds at most {} nodes", u64::from(u32::MAX) + 1),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ids_follow_the_arena_length() {
        assert_eq!(next_id(0), NodeId(0));
        assert_eq!(next_id(u32::MAX as usize), NodeId(u32::MAX));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    #[should_panic(expected = "at most")]
    fn ids_do_not_wrap_around() {
        next_id(u32::MAX as usize + 1);
    }
}
