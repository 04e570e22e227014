//! Domain models for the heuristic engine
//!
//! Contains the grounded problem representation and the propagation graph,
//! without any I/O concerns.

mod bitset;
mod cost;
mod graph;
mod id;
mod model;
mod network;

pub use bitset::{BitSet, BitSetError, Ones};
pub use cost::Cost;
pub use graph::{
    GraphError, NodeContent, NodeKind, Propagation, PropagationGraph, PropagationNode,
};
pub use id::{FactId, IdError, MethodId, TaskId};
pub use model::{AbstractTask, Method, ModelError, Operator, Problem, TaskKind};
pub use network::{SearchNode, TaskNetwork};
