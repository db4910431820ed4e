//! Graphviz export of a computation graph.

use std::io::Write;

use crate::{
    error::Result,
    graph::Graph,
    lifecycle::{closure, set_marks},
    node::{node_mut, node_ref, Mark, NodeId, Slot},
};

impl Graph {
    /// Starts a Graphviz dot export of the graph reachable from `root`.
    pub fn dot_builder(&self, root: NodeId) -> DotBuilder<'_> {
        DotBuilder {
            graph: self,
            root,
            show_values: true,
            highlights: None,
            name: "ComputationGraph".to_string(),
        }
    }
}

/// Options of a dot export. Node statements are named after the arena index of
/// the node, so exporting an unchanged graph twice gives the same text.
pub struct DotBuilder<'a> {
    graph: &'a Graph,
    root: NodeId,
    show_values: bool,
    highlights: Option<NodeId>,
    name: String,
}

impl<'a> DotBuilder<'a> {
    /// Print value and gradient in each label.
    pub fn show_values(mut self, v: bool) -> Self {
        self.show_values = v;
        self
    }

    /// Fill the given node with a highlight color.
    pub fn highlights(mut self, node: NodeId) -> Self {
        self.highlights = Some(node);
        self
    }

    /// Name of the `digraph`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Write graphviz dot file to the given writer.
    pub fn dot(self, writer: &mut impl Write) -> Result<()> {
        let mut nodes = self.graph.nodes.borrow_mut();
        let reachable = closure(&nodes, &[self.root], false)?;
        set_marks(&mut nodes, &reachable, Mark::Unvisited);
        let res = self.write_statements(&mut nodes, writer);
        set_marks(&mut nodes, &reachable, Mark::Unvisited);
        res
    }

    pub fn to_dot_string(self) -> Result<String> {
        let mut buf: Vec<u8> = vec![];
        self.dot(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn write_statements(&self, nodes: &mut [Slot], writer: &mut impl Write) -> Result<()> {
        writeln!(writer, "digraph {} {{", self.name)?;
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = node_mut(nodes, id)?;
            if node.mark == Mark::Done {
                continue;
            }
            node.mark = Mark::Done;

            let symbol = node.op.kind().symbol();
            let label = if self.show_values {
                format!(
                    "{symbol}\\nvalue: {:.2}\\ngrad: {:.2}",
                    node.value, node.grad
                )
            } else {
                symbol.to_string()
            };
            let style = if self.highlights == Some(id) {
                ", style=filled, fillcolor=\"#ffff7f\""
            } else {
                ""
            };
            writeln!(writer, "    {id} [label=\"{label}\"{style}];")?;

            let inputs = node.op.inputs().to_vec();
            for input in inputs {
                writeln!(writer, "    {input} -> {id};")?;
                if node_ref(nodes, input)?.mark == Mark::Unvisited {
                    stack.push(input);
                }
            }
        }
        writeln!(writer, "}}")?;
        Ok(())
    }
}
