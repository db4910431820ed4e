use crate::{
    dot::DotBuilder,
    error::Result,
    graph::Graph,
    node::{Node, NodeId},
    op::{Op, OpKind},
};

/// A handle to a node that remembers its graph, so that expressions can be
/// written with operators.
///
/// ```
/// use tapegrad::Graph;
///
/// let graph = Graph::new();
/// let a = graph.leaf(2.);
/// let b = graph.leaf(3.);
/// let c = graph.leaf(4.);
/// let f = (a + b) * c;
/// assert_eq!(f.eval().unwrap(), 20.);
/// f.backprop().unwrap();
/// assert_eq!(c.grad().unwrap(), 5.);
/// ```
#[derive(Copy, Clone, Debug)]
pub struct Var<'a> {
    graph: &'a Graph,
    id: NodeId,
}

impl<'a> Var<'a> {
    pub(crate) fn new(graph: &'a Graph, id: NodeId) -> Self {
        Self { graph, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn graph(&self) -> &'a Graph {
        self.graph
    }

    pub fn value(&self) -> Result<f64> {
        self.graph.value(self.id)
    }

    pub fn grad(&self) -> Result<f64> {
        self.graph.grad(self.id)
    }

    /// Set a value to a leaf node.
    pub fn set(&self, value: f64) -> Result<()> {
        self.graph.set_value(self.id, value)
    }

    pub fn set_grad(&self, grad: f64) -> Result<()> {
        self.graph.set_grad(self.id, grad)
    }

    pub fn exp(self) -> Self {
        self.unchecked(Op::Exp([self.id]))
    }

    /// `self` divided by the sum of `self` and `others`.
    pub fn normalize(self, others: &[Var<'a>]) -> Result<Self> {
        let inputs: Vec<_> = std::iter::once(self.id)
            .chain(others.iter().map(|other| other.id))
            .collect();
        let id = self.graph.create(OpKind::NormalizeComponent, &inputs)?;
        Ok(Self::new(self.graph, id))
    }

    pub fn eval(&self) -> Result<f64> {
        self.graph.evaluate(self.id)
    }

    pub fn backprop(&self) -> Result<()> {
        self.graph.backprop(self.id)
    }

    pub fn order(&self) -> Result<Vec<NodeId>> {
        self.graph.order(self.id)
    }

    pub fn dot_builder(&self) -> DotBuilder<'a> {
        self.graph.dot_builder(self.id)
    }

    /// Appends an operation whose arity is fixed by its type. Inputs that were
    /// released in the meantime surface when the result is traversed.
    fn unchecked(&self, op: Op) -> Self {
        Self::new(self.graph, self.graph.push(Node::new(op, 0.)))
    }
}

impl<'a> std::ops::Add for Var<'a> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        assert!(
            std::ptr::eq(self.graph, rhs.graph),
            "operands belong to different graphs"
        );
        self.unchecked(Op::Add([self.id, rhs.id]))
    }
}

impl<'a> std::ops::Mul for Var<'a> {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        assert!(
            std::ptr::eq(self.graph, rhs.graph),
            "operands belong to different graphs"
        );
        self.unchecked(Op::Mul([self.id, rhs.id]))
    }
}
