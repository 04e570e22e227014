//! # Heuristics
//!
//! Cost estimates for search nodes of a grounded HTN problem.
//!
//! Every heuristic goes through the same lifecycle:
//!
//! 1. [`Heuristic::initialize`] once per problem. This is where the expensive
//!    fixpoint runs.
//! 2. [`Heuristic::evaluate`] once per expanded search node. It only reads the
//!    tables built during initialization, so it takes `&self` and an
//!    initialized heuristic can be shared across threads.
//!
//! ## Available Heuristics
//!
//! | Kind | Type | Combination |
//! |------|------|-------------|
//! | `delrelax` | [`DeleteRelaxationHeuristic`] | max (ordering relaxed) or sum over the network |
//! | `hmax` | [`HmaxHeuristic`] | sum of per-task hmax values over the network |
//!
//! Unreachable tasks evaluate to [`Cost::INFINITE`]; that is a normal
//! outcome, not an error.

mod del_relax;
mod hmax;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::domain::{Cost, GraphError, ModelError, Problem, SearchNode};
use crate::storage::HeuristicsConfig;

pub use del_relax::{
    DeleteRelaxationHeuristic, RelaxedCosts, RelaxedOperator, TaskCombination,
    UnreachablePolicy, UNREACHABLE_SENTINEL,
};
pub use hmax::HmaxHeuristic;

#[derive(Debug, Error, PartialEq)]
pub enum HeuristicError {
    #[error("Heuristic '{0}' was evaluated before initialize")]
    NotInitialized(String),

    #[error("Heuristic '{0}' is already initialized")]
    AlreadyInitialized(String),

    #[error("Invalid problem model: {0}")]
    Model(#[from] ModelError),

    #[error("Failed to build propagation graph: {0}")]
    Graph(#[from] GraphError),

    #[error("Unknown heuristic: {0}")]
    UnknownKind(String),
}

/// The capability set the search uses to score nodes
pub trait Heuristic: fmt::Display + Send + Sync {
    /// Short identifier, e.g. `del_relax`
    fn name(&self) -> &str;

    /// Precomputes everything needed for evaluation and returns the estimate
    /// of `initial_node`
    fn initialize(
        &mut self,
        problem: &Problem,
        initial_node: &SearchNode,
    ) -> Result<Cost, HeuristicError>;

    /// Estimates the remaining cost of `node`
    fn evaluate(&self, parent: Option<&SearchNode>, node: &SearchNode)
        -> Result<Cost, HeuristicError>;

    /// Diagnostic summary for reporting
    fn info(&self) -> HeuristicInfo;
}

/// Diagnostic summary of a heuristic, for observability only
#[derive(Debug, Clone, Default, Serialize)]
pub struct HeuristicInfo {
    pub name: String,
    pub display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering_relaxation: Option<bool>,
    pub relaxed_operators: usize,
    pub task_costs: usize,
    pub fact_costs: usize,
    pub graph_nodes: usize,
    pub graph_edges: usize,
    pub iterations: usize,
    #[serde(serialize_with = "serialize_secs")]
    pub preprocessing_time: Duration,
    pub initial_value: Option<Cost>,
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

impl fmt::Display for HeuristicInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Heuristic info:")?;
        writeln!(f, "\tName: {}", self.name)?;
        writeln!(f, "\tHeuristic: {}", self.display)?;
        if let Some(ordering) = self.ordering_relaxation {
            writeln!(f, "\tUse ordering relaxation: {}", ordering)?;
            writeln!(f, "\tRelaxed operators: {}", self.relaxed_operators)?;
            writeln!(f, "\tTask costs computed: {}", self.task_costs)?;
            writeln!(f, "\tFact costs computed: {}", self.fact_costs)?;
        } else {
            writeln!(f, "\tGraph size: {} nodes, {} edges", self.graph_nodes, self.graph_edges)?;
        }
        writeln!(f, "\tIterations: {}", self.iterations)?;
        writeln!(
            f,
            "\tPreprocessing time: {:.2} s",
            self.preprocessing_time.as_secs_f64()
        )?;
        if let Some(value) = self.initial_value {
            writeln!(f, "\tInitial value: {}", value)?;
        }
        Ok(())
    }
}

/// Registry of the heuristics this crate provides
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, serde::Deserialize, clap::ValueEnum,
)]
pub enum HeuristicKind {
    #[default]
    #[value(name = "delrelax", alias = "del_relax")]
    #[serde(rename = "delrelax", alias = "del_relax")]
    DelRelax,
    #[value(name = "hmax")]
    #[serde(rename = "hmax")]
    Hmax,
}

impl HeuristicKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeuristicKind::DelRelax => "delrelax",
            HeuristicKind::Hmax => "hmax",
        }
    }

    /// Creates an uninitialized heuristic of this kind
    pub fn build(&self, config: &HeuristicsConfig) -> Box<dyn Heuristic> {
        match self {
            HeuristicKind::DelRelax => Box::new(DeleteRelaxationHeuristic::with_policy(
                config.del_relax.ordering_relaxation,
                config.del_relax.unreachable_policy(),
            )),
            HeuristicKind::Hmax => Box::new(HmaxHeuristic::new()),
        }
    }
}

impl fmt::Display for HeuristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeuristicKind {
    type Err = HeuristicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "delrelax" | "del_relax" => Ok(HeuristicKind::DelRelax),
            "hmax" | "hmax_htn" => Ok(HeuristicKind::Hmax),
            _ => Err(HeuristicError::UnknownKind(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_kinds() {
        assert_eq!("DELRELAX".parse::<HeuristicKind>().unwrap(), HeuristicKind::DelRelax);
        assert_eq!("del_relax".parse::<HeuristicKind>().unwrap(), HeuristicKind::DelRelax);
        assert_eq!("HMAX".parse::<HeuristicKind>().unwrap(), HeuristicKind::Hmax);
        assert_eq!(
            "blind".parse::<HeuristicKind>(),
            Err(HeuristicError::UnknownKind("blind".to_string()))
        );
    }

    #[test]
    fn build_from_config() {
        let mut config = HeuristicsConfig::default();
        config.del_relax.ordering_relaxation = false;

        let del_relax = HeuristicKind::DelRelax.build(&config);
        assert_eq!(del_relax.name(), "del_relax");
        assert_eq!(del_relax.to_string(), "DelRelax()");

        let hmax = HeuristicKind::Hmax.build(&config);
        assert_eq!(hmax.name(), "hmax_htn");
        assert_eq!(hmax.to_string(), "HmaxHTN()");
    }

    #[test]
    fn info_display() {
        let info = HeuristicInfo {
            name: "del_relax".into(),
            display: "DelRelax(ord_relax)".into(),
            ordering_relaxation: Some(true),
            relaxed_operators: 2,
            task_costs: 3,
            fact_costs: 3,
            iterations: 4,
            initial_value: Cost::new(3.0),
            ..Default::default()
        };

        let text = info.to_string();
        assert!(text.starts_with("Heuristic info:\n"));
        assert!(text.contains("\tUse ordering relaxation: true\n"));
        assert!(text.contains("\tRelaxed operators: 2\n"));
        assert!(text.contains("\tIterations: 4\n"));
        assert!(text.contains("\tPreprocessing time: 0.00 s\n"));
        assert!(text.contains("\tInitial value: 3\n"));
    }

    #[test]
    fn info_serializes_duration_as_seconds() {
        let info = HeuristicInfo {
            preprocessing_time: Duration::from_millis(1500),
            ..Default::default()
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["preprocessing_time"], 1.5);
        assert!(json.get("ordering_relaxation").is_none());
        assert!(json["initial_value"].is_null());
    }
}
