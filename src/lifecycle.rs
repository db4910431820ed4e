//! Passes that reset or release whole sub-graphs. Each node is handled once per
//! call no matter how many consumers share it.

use crate::{
    error::{GraphError, Result},
    graph::Graph,
    node::{node_ref, Mark, NodeId, Slot},
};

impl Graph {
    /// Sets the mark of every node reachable from `root` back to
    /// [`Mark::Unvisited`]. Calling it again changes nothing.
    pub fn reset_marks(&self, root: NodeId) -> Result<()> {
        let mut nodes = self.nodes.borrow_mut();
        let reachable = closure(&nodes, &[root], true)?;
        set_marks(&mut nodes, &reachable, Mark::Unvisited);
        Ok(())
    }

    /// Zeroes the gradient of every node reachable from `root`.
    /// [`Graph::run_backward`] only ever adds to gradients, so this has to run
    /// before every backward pass.
    pub fn zero_all_gradients(&self, root: NodeId) -> Result<()> {
        let mut nodes = self.nodes.borrow_mut();
        let reachable = closure(&nodes, &[root], true)?;
        for id in reachable {
            if let Some(node) = &mut nodes[id.index()] {
                node.grad = 0.;
            }
        }
        Ok(())
    }

    /// Zeroes the gradient of every live node of the graph.
    pub fn clear_grads(&self) {
        for node in self.nodes.borrow_mut().iter_mut().flatten() {
            node.grad = 0.;
        }
    }

    /// Releases every live node reachable from `root`, each exactly once, and
    /// returns how many were released. Inputs released by an earlier teardown
    /// are skipped. A node outside of this sub-graph that consumed one of the
    /// released nodes reports [`GraphError::Released`] when traversed.
    ///
    /// Dropping the [`Graph`] releases all of its nodes at once.
    pub fn teardown(&self, root: NodeId) -> Result<usize> {
        let mut nodes = self.nodes.borrow_mut();
        let reachable = closure(&nodes, &[root], true)?;
        for id in &reachable {
            nodes[id.index()] = None;
        }
        log::debug!("released {} nodes reachable from {root}", reachable.len());
        Ok(reachable.len())
    }
}

/// Collects the nodes reachable from `roots` with a worklist, each once.
/// Roots must be live. Released inputs are skipped if `skip_released`,
/// otherwise they are an error.
pub(crate) fn closure(
    nodes: &[Slot],
    roots: &[NodeId],
    skip_released: bool,
) -> Result<Vec<NodeId>> {
    for root in roots {
        node_ref(nodes, *root)?;
    }
    let mut seen = vec![false; nodes.len()];
    let mut reachable = vec![];
    let mut stack: Vec<NodeId> = roots.iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        let node = match node_ref(nodes, id) {
            Ok(node) => node,
            Err(GraphError::Released { .. }) if skip_released => continue,
            Err(e) => return Err(e),
        };
        if seen[id.index()] {
            continue;
        }
        seen[id.index()] = true;
        reachable.push(id);
        stack.extend(node.op.inputs().iter().rev());
    }
    Ok(reachable)
}

pub(crate) fn set_marks(nodes: &mut [Slot], ids: &[NodeId], mark: Mark) {
    for id in ids {
        if let Some(node) = &mut nodes[id.index()] {
            node.mark = mark;
        }
    }
}
