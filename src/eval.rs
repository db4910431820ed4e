//! Forward evaluation and backward propagation.

use crate::{
    config::{DegeneracyPolicy, EvalStrategy},
    error::Result,
    graph::Graph,
    node::{node_mut, node_ref, NodeId, Slot},
};

impl Graph {
    /// Computes the value of every node of `order`, once each. Leaf values must
    /// have been set beforehand.
    ///
    /// A released or unknown node anywhere in `order` is reported before any
    /// value changes. On [`crate::GraphError::NumericDegeneracy`] the nodes
    /// before the degenerate one keep their new values.
    pub fn evaluate_forward(&self, order: &[NodeId]) -> Result<()> {
        let mut nodes = self.nodes.borrow_mut();
        check_order(&nodes, order)?;
        for &id in order {
            let value = node_ref(&nodes, id)?
                .op
                .compute(id, &nodes, self.config.degeneracy)?;
            if let Some(value) = value {
                log::trace!("{id} = {value}");
                node_mut(&mut nodes, id)?.value = value;
            }
        }
        Ok(())
    }

    /// Evaluates `root` by recursing into every input on every use, so a node
    /// shared by several consumers is computed once per edge. Kept as a
    /// reference to check [`Graph::evaluate_forward`] against.
    pub fn evaluate_recursive(&self, root: NodeId) -> Result<f64> {
        // Rejects cycles before recursing into them.
        self.order(root)?;
        let mut nodes = self.nodes.borrow_mut();
        eval(&mut nodes, root, self.config.degeneracy)
    }

    /// Evaluates `root` with the configured [`EvalStrategy`] and returns its
    /// value.
    pub fn evaluate(&self, root: NodeId) -> Result<f64> {
        match self.config.strategy {
            EvalStrategy::Ordered => {
                let order = self.order(root)?;
                self.evaluate_forward(&order)?;
                self.value(root)
            }
            EvalStrategy::Recursive => self.evaluate_recursive(root),
        }
    }

    /// Propagates gradients through `order` from its end to its start, adding
    /// each node's contribution to the gradients of its inputs.
    ///
    /// Seed the output gradients first. Gradients are never reset here: call
    /// [`Graph::zero_all_gradients`] before each pass, or the contributions of
    /// the previous pass stay in. Like [`Graph::evaluate_forward`], a stale
    /// `order` fails before any gradient changes.
    pub fn run_backward(&self, order: &[NodeId]) -> Result<()> {
        let mut nodes = self.nodes.borrow_mut();
        check_order(&nodes, order)?;
        let mut contributions = vec![];
        for &id in order.iter().rev() {
            let node = node_ref(&nodes, id)?;
            node.op.backward(
                id,
                node.value,
                node.grad,
                &nodes,
                self.config.degeneracy,
                &mut contributions,
            )?;
            for (input, grad) in contributions.drain(..) {
                log::trace!("{id} -> {input}: {grad}");
                node_mut(&mut nodes, input)?.grad += grad;
            }
        }
        Ok(())
    }

    /// The entry point to backpropagation of a scalar objective: zeroes the
    /// gradients reachable from `root`, seeds `root` with 1 and runs the
    /// backward pass. Assumes `root` has been evaluated.
    pub fn backprop(&self, root: NodeId) -> Result<()> {
        let order = self.order(root)?;
        self.zero_all_gradients(root)?;
        self.set_grad(root, 1.)?;
        self.run_backward(&order)
    }
}

/// Every node of `order` and every input of those nodes must be live.
fn check_order(nodes: &[Slot], order: &[NodeId]) -> Result<()> {
    for &id in order {
        for &input in node_ref(nodes, id)?.op.inputs() {
            node_ref(nodes, input)?;
        }
    }
    Ok(())
}

fn eval(nodes: &mut [Slot], id: NodeId, policy: DegeneracyPolicy) -> Result<f64> {
    let inputs = node_ref(nodes, id)?.op.inputs().to_vec();
    for input in inputs {
        eval(nodes, input, policy)?;
    }
    let node = node_ref(nodes, id)?;
    match node.op.compute(id, nodes, policy)? {
        Some(value) => {
            node_mut(nodes, id)?.value = value;
            Ok(value)
        }
        None => Ok(node.value),
    }
}
