//! Reverse-mode automatic differentiation over a directed acyclic graph of
//! scalar operations.
//!
//! Build a [`Graph`] from leaves and operations, get a topological
//! [`Graph::order`], fill in values with [`Graph::evaluate_forward`], seed the
//! output gradients and propagate them with [`Graph::run_backward`].

mod config;
mod dot;
pub mod error;
mod eval;
mod graph;
mod lifecycle;
mod node;
mod op;
mod traversal;
mod var;

pub use config::{DegeneracyPolicy, EvalStrategy, GraphConfig};
pub use dot::DotBuilder;
pub use error::{GraphError, Result};
pub use graph::Graph;
pub use node::{Mark, NodeId};
pub use op::{Arity, OpKind};
pub use var::Var;
