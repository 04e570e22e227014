//! HTN heuristics - cost estimates for hierarchical task network planning
//!
//! Given a grounded HTN problem, the heuristics here estimate how much it
//! costs to fully decompose and execute a task network from a state. Two
//! estimators are provided: a delete-relaxation fixpoint over facts, operators
//! and methods, and an hmax propagation over an AND/OR graph. Both share the
//! [`heuristics::Heuristic`] lifecycle of one `initialize` per problem
//! followed by many cheap `evaluate` calls.

pub mod domain;
pub mod heuristics;
pub mod storage;
pub mod cli;

pub use domain::{BitSet, Cost, Problem, SearchNode, TaskId, TaskNetwork};
pub use heuristics::{
    DeleteRelaxationHeuristic, Heuristic, HeuristicError, HeuristicInfo, HeuristicKind,
    HmaxHeuristic,
};
