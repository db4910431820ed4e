//! Topological ordering with cycle detection.

use crate::{
    error::{GraphError, Result},
    graph::Graph,
    lifecycle::{closure, set_marks},
    node::{node_mut, node_ref, Mark, NodeId, Slot},
    op::OpKind,
};

impl Graph {
    /// Returns the nodes reachable from `root` so that every node comes after
    /// all of its inputs, `root` being the last one. Inputs are visited in
    /// their stored order, so the result only depends on the graph's shape.
    pub fn order(&self, root: NodeId) -> Result<Vec<NodeId>> {
        self.order_many(&[root])
    }

    /// Like [`Graph::order`], but a single order covering several outputs.
    /// Nodes shared between the outputs appear once.
    pub fn order_many(&self, roots: &[NodeId]) -> Result<Vec<NodeId>> {
        let mut nodes = self.nodes.borrow_mut();
        let reachable = closure(&nodes, roots, false)?;
        set_marks(&mut nodes, &reachable, Mark::Unvisited);

        let mut order = Vec::with_capacity(reachable.len());
        let res = roots
            .iter()
            .try_for_each(|root| visit(&mut nodes, *root, &mut order, self.config.max_order_len));

        set_marks(&mut nodes, &reachable, Mark::Unvisited);
        res?;
        log::debug!("ordered {} nodes from {} root(s)", order.len(), roots.len());
        Ok(order)
    }

    /// The leaves reachable from `root`, in topological order.
    pub fn leaves(&self, root: NodeId) -> Result<Vec<NodeId>> {
        let order = self.order(root)?;
        let nodes = self.nodes.borrow();
        let mut leaves = vec![];
        for id in order {
            if node_ref(&nodes, id)?.op.kind() == OpKind::Leaf {
                leaves.push(id);
            }
        }
        Ok(leaves)
    }
}

/// Depth first search with an explicit stack of `(node, next input)` frames.
fn visit(
    nodes: &mut [Slot],
    root: NodeId,
    order: &mut Vec<NodeId>,
    capacity: Option<usize>,
) -> Result<()> {
    if !enter(nodes, root)? {
        return Ok(());
    }
    let mut stack = vec![(root, 0)];
    while let Some(frame) = stack.last_mut() {
        let (id, next) = *frame;
        let input = node_ref(nodes, id)?.op.inputs().get(next).copied();
        if let Some(input) = input {
            frame.1 += 1;
            if enter(nodes, input)? {
                stack.push((input, 0));
            }
        } else {
            if let Some(capacity) = capacity {
                if order.len() >= capacity {
                    return Err(GraphError::CapacityExceeded { capacity });
                }
            }
            node_mut(nodes, id)?.mark = Mark::Done;
            order.push(id);
            stack.pop();
        }
    }
    Ok(())
}

/// Marks `id` as in progress if it was unvisited. Returns whether the caller
/// should descend into it.
fn enter(nodes: &mut [Slot], id: NodeId) -> Result<bool> {
    let node = node_mut(nodes, id)?;
    match node.mark {
        Mark::Done => Ok(false),
        Mark::InProgress => {
            log::warn!("cycle detected in computation graph involving {id}");
            Err(GraphError::CycleDetected { node: id })
        }
        Mark::Unvisited => {
            node.mark = Mark::InProgress;
            Ok(true)
        }
    }
}
