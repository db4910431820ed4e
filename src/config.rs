/// What a normalize node does when it would divide by zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DegeneracyPolicy {
    /// Abort the pass with [`crate::GraphError::NumericDegeneracy`].
    #[default]
    Fail,
    /// Use the given value for the node and contribute no gradient to the
    /// other inputs, whose terms divide by the same zero sum.
    Sentinel(f64),
}

/// How [`crate::Graph::evaluate`] walks the graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EvalStrategy {
    /// Compute each node once, following the topological order.
    #[default]
    Ordered,
    /// Recompute every input on every use. Exponential on deep diamonds;
    /// only useful as a reference.
    Recursive,
}

/// Settings of a [`crate::Graph`].
///
/// ```
/// use tapegrad::{DegeneracyPolicy, Graph, GraphConfig};
///
/// let graph = Graph::with_config(
///     GraphConfig::new()
///         .max_order_len(100)
///         .degeneracy(DegeneracyPolicy::Sentinel(0.)),
/// );
/// assert_eq!(graph.config().max_order_len, Some(100));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphConfig {
    /// Upper bound of a traversal order. `None` grows as needed.
    pub max_order_len: Option<usize>,
    pub degeneracy: DegeneracyPolicy,
    pub strategy: EvalStrategy,
}

impl GraphConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_order_len(mut self, len: usize) -> Self {
        self.max_order_len = Some(len);
        self
    }

    pub fn degeneracy(mut self, policy: DegeneracyPolicy) -> Self {
        self.degeneracy = policy;
        self
    }

    pub fn strategy(mut self, strategy: EvalStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}
