//! Forward and backward rules of the primitive operations.

use std::fmt::Display;

use crate::{
    config::DegeneracyPolicy,
    error::{GraphError, Result},
    node::{node_ref, NodeId, Slot},
};

/// The kinds of nodes a graph can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
    Leaf,
    Add,
    Multiply,
    Exponential,
    NormalizeComponent,
}

impl OpKind {
    pub fn arity(self) -> Arity {
        use OpKind::*;
        match self {
            Leaf => Arity::Exactly(0),
            Add | Multiply => Arity::Exactly(2),
            Exponential => Arity::Exactly(1),
            NormalizeComponent => Arity::AtLeast(1),
        }
    }

    /// Symbol used in graph exports.
    pub fn symbol(self) -> &'static str {
        use OpKind::*;
        match self {
            Leaf => "var",
            Add => "+",
            Multiply => "*",
            Exponential => "exp",
            NormalizeComponent => "softmax",
        }
    }
}

impl Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OpKind::Leaf => "Leaf",
            OpKind::Add => "Add",
            OpKind::Multiply => "Multiply",
            OpKind::Exponential => "Exponential",
            OpKind::NormalizeComponent => "NormalizeComponent",
        };
        f.write_str(name)
    }
}

/// Number of inputs an operation accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "exactly {n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// An operation together with its ordered inputs.
#[derive(Clone, Debug)]
pub(crate) enum Op {
    Leaf,
    Add([NodeId; 2]),
    Mul([NodeId; 2]),
    Exp([NodeId; 1]),
    /// `inputs[0]` is the numerator, all of them form the denominator.
    Normalize(Vec<NodeId>),
}

impl Op {
    /// Builds an operation, rejecting input lists of the wrong length.
    pub fn new(kind: OpKind, inputs: &[NodeId]) -> Result<Self> {
        let expected = kind.arity();
        if !expected.accepts(inputs.len()) {
            return Err(GraphError::ArityMismatch {
                kind,
                expected,
                actual: inputs.len(),
            });
        }
        Ok(match kind {
            OpKind::Leaf => Op::Leaf,
            OpKind::Add => Op::Add([inputs[0], inputs[1]]),
            OpKind::Multiply => Op::Mul([inputs[0], inputs[1]]),
            OpKind::Exponential => Op::Exp([inputs[0]]),
            OpKind::NormalizeComponent => Op::Normalize(inputs.to_vec()),
        })
    }

    pub fn kind(&self) -> OpKind {
        match self {
            Op::Leaf => OpKind::Leaf,
            Op::Add(_) => OpKind::Add,
            Op::Mul(_) => OpKind::Multiply,
            Op::Exp(_) => OpKind::Exponential,
            Op::Normalize(_) => OpKind::NormalizeComponent,
        }
    }

    pub fn inputs(&self) -> &[NodeId] {
        match self {
            Op::Leaf => &[],
            Op::Add(inputs) | Op::Mul(inputs) => inputs.as_slice(),
            Op::Exp(inputs) => inputs.as_slice(),
            Op::Normalize(inputs) => inputs.as_slice(),
        }
    }

    /// Computes the value of node `this` from the current values of its inputs.
    /// Returns `None` for leaves, whose value belongs to the caller.
    pub fn compute(
        &self,
        this: NodeId,
        nodes: &[Slot],
        policy: DegeneracyPolicy,
    ) -> Result<Option<f64>> {
        let value = match self {
            Op::Leaf => return Ok(None),
            Op::Add([lhs, rhs]) => value_of(nodes, *lhs)? + value_of(nodes, *rhs)?,
            Op::Mul([lhs, rhs]) => value_of(nodes, *lhs)? * value_of(nodes, *rhs)?,
            Op::Exp([term]) => value_of(nodes, *term)?.exp(),
            Op::Normalize(inputs) => {
                let mut sum = 0.;
                for input in inputs {
                    sum += value_of(nodes, *input)?;
                }
                let numerator = value_of(nodes, inputs[0])?;
                if sum == 0. {
                    degenerate(this, policy)?
                } else {
                    numerator / sum
                }
            }
        };
        Ok(Some(value))
    }

    /// Pushes the gradient contribution of node `this` into each of its inputs
    /// onto `out`. `value` and `grad` are the node's own value and gradient.
    pub fn backward(
        &self,
        this: NodeId,
        value: f64,
        grad: f64,
        nodes: &[Slot],
        policy: DegeneracyPolicy,
        out: &mut Vec<(NodeId, f64)>,
    ) -> Result<()> {
        match self {
            Op::Leaf => {}
            Op::Add([lhs, rhs]) => {
                out.push((*lhs, grad));
                out.push((*rhs, grad));
            }
            Op::Mul([lhs, rhs]) => {
                out.push((*lhs, grad * value_of(nodes, *rhs)?));
                out.push((*rhs, grad * value_of(nodes, *lhs)?));
            }
            Op::Exp([term]) => out.push((*term, grad * value)),
            Op::Normalize(inputs) => {
                out.push((inputs[0], grad * value * (1. - value)));
                // value / numerator, taken as 1 / sum so a zero numerator is fine.
                let mut sum = 0.;
                for input in inputs {
                    sum += value_of(nodes, *input)?;
                }
                for input in &inputs[1..] {
                    let contribution = if sum == 0. {
                        degenerate(this, policy).map(|_| 0.)?
                    } else {
                        -grad * value_of(nodes, *input)? / sum
                    };
                    out.push((*input, contribution));
                }
            }
        }
        Ok(())
    }
}

fn value_of(nodes: &[Slot], id: NodeId) -> Result<f64> {
    Ok(node_ref(nodes, id)?.value)
}

fn degenerate(node: NodeId, policy: DegeneracyPolicy) -> Result<f64> {
    match policy {
        DegeneracyPolicy::Fail => Err(GraphError::NumericDegeneracy { node }),
        DegeneracyPolicy::Sentinel(sentinel) => {
            log::warn!("{node} divides by zero, substituting {sentinel}");
            Ok(sentinel)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::node::Node;
    use approx::assert_abs_diff_eq;

    fn leaves(values: &[f64]) -> Vec<Slot> {
        values
            .iter()
            .map(|&v| Some(Node::new(Op::Leaf, v)))
            .collect()
    }

    fn ids(n: u32) -> Vec<NodeId> {
        (0..n).map(NodeId).collect()
    }

    #[test]
    fn arity_is_checked() {
        assert!(Op::new(OpKind::Add, &ids(2)).is_ok());
        assert!(matches!(
            Op::new(OpKind::Add, &ids(1)),
            Err(GraphError::ArityMismatch {
                kind: OpKind::Add,
                expected: Arity::Exactly(2),
                actual: 1,
            })
        ));
        assert!(Op::new(OpKind::Exponential, &ids(2)).is_err());
        assert!(Op::new(OpKind::Leaf, &ids(1)).is_err());
        assert!(Op::new(OpKind::NormalizeComponent, &[]).is_err());
        assert!(Op::new(OpKind::NormalizeComponent, &ids(1)).is_ok());
    }

    #[test]
    fn normalize_single_ratio_rule() {
        let nodes = leaves(&[1., 3.]);
        let op = Op::new(OpKind::NormalizeComponent, &ids(2)).unwrap();
        let this = NodeId(2);
        let value = op
            .compute(this, &nodes, DegeneracyPolicy::Fail)
            .unwrap()
            .unwrap();
        assert_abs_diff_eq!(value, 0.25);

        let mut out = vec![];
        op.backward(this, value, 1., &nodes, DegeneracyPolicy::Fail, &mut out)
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].0, NodeId(0));
        assert_abs_diff_eq!(out[0].1, 0.1875);
        assert_eq!(out[1].0, NodeId(1));
        assert_abs_diff_eq!(out[1].1, -0.75);
    }

    #[test]
    fn normalize_zero_denominator() {
        let nodes = leaves(&[0., 0.]);
        let op = Op::new(OpKind::NormalizeComponent, &ids(2)).unwrap();
        assert!(matches!(
            op.compute(NodeId(2), &nodes, DegeneracyPolicy::Fail),
            Err(GraphError::NumericDegeneracy { node: NodeId(2) })
        ));
        let value = op
            .compute(NodeId(2), &nodes, DegeneracyPolicy::Sentinel(-1.))
            .unwrap();
        assert_eq!(value, Some(-1.));
    }

    #[test]
    fn normalize_zero_numerator() {
        let nodes = leaves(&[0., 4.]);
        let op = Op::new(OpKind::NormalizeComponent, &ids(2)).unwrap();
        let value = op
            .compute(NodeId(2), &nodes, DegeneracyPolicy::Fail)
            .unwrap()
            .unwrap();
        assert_eq!(value, 0.);
        let mut out = vec![];
        op.backward(NodeId(2), value, 2., &nodes, DegeneracyPolicy::Fail, &mut out)
            .unwrap();
        assert_abs_diff_eq!(out[0].1, 0.);
        assert_abs_diff_eq!(out[1].1, -2.);
    }

    #[test]
    fn exp_backward_uses_own_value() {
        let nodes = leaves(&[2.]);
        let op = Op::Exp([NodeId(0)]);
        let value = op
            .compute(NodeId(1), &nodes, DegeneracyPolicy::Fail)
            .unwrap()
            .unwrap();
        assert_abs_diff_eq!(value, 2f64.exp());
        let mut out = vec![];
        op.backward(NodeId(1), value, 0.5, &nodes, DegeneracyPolicy::Fail, &mut out)
            .unwrap();
        assert_abs_diff_eq!(out[0].1, 0.5 * 2f64.exp());
    }
}
