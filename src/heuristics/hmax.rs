//! Hmax heuristic over an HTN AND/OR graph
//!
//! The classical h_max heuristic, lifted to HTN problems by propagating costs
//! through a [`PropagationGraph`]: facts and abstract tasks are OR nodes,
//! operators and methods are AND nodes. A node's value is the cost of its
//! single most expensive requirement. The estimate of a task network is the
//! sum of its tasks' values, which is informative but not admissible in
//! general.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use crate::domain::{
    Cost, FactId, NodeContent, Problem, PropagationGraph, SearchNode, TaskId, TaskNetwork,
};

use super::{Heuristic, HeuristicError, HeuristicInfo};

#[derive(Debug)]
pub struct HmaxHeuristic {
    name: String,
    graph: Option<PropagationGraph>,
    fact_values: Vec<Cost>,
    task_values: HashMap<TaskId, Cost>,
    iterations: usize,
    preprocessing_time: Duration,
    initial_value: Option<Cost>,
}

impl Default for HmaxHeuristic {
    fn default() -> Self {
        Self::new()
    }
}

impl HmaxHeuristic {
    pub fn new() -> Self {
        Self {
            name: "hmax_htn".to_string(),
            graph: None,
            fact_values: Vec::new(),
            task_values: HashMap::new(),
            iterations: 0,
            preprocessing_time: Duration::ZERO,
            initial_value: None,
        }
    }

    /// Sum of the hmax values of every task in the network
    ///
    /// Tasks without a value are unreachable.
    pub fn estimate(&self, task_network: &TaskNetwork) -> Result<Cost, HeuristicError> {
        if self.graph.is_none() {
            return Err(HeuristicError::NotInitialized(self.name.clone()));
        }

        Ok(task_network
            .iter()
            .map(|task| self.task_value(task).unwrap_or(Cost::INFINITE))
            .sum())
    }

    /// Hmax value of a fact, `None` before initialization
    pub fn fact_value(&self, fact: FactId) -> Option<Cost> {
        self.fact_values.get(fact).copied()
    }

    /// Hmax value of an operator or abstract task
    pub fn task_value(&self, task: TaskId) -> Option<Cost> {
        self.task_values.get(&task).copied()
    }

    pub fn graph(&self) -> Option<&PropagationGraph> {
        self.graph.as_ref()
    }
}

impl Heuristic for HmaxHeuristic {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(
        &mut self,
        problem: &Problem,
        initial_node: &SearchNode,
    ) -> Result<Cost, HeuristicError> {
        if self.graph.is_some() {
            return Err(HeuristicError::AlreadyInitialized(self.name.clone()));
        }
        problem.check_node(initial_node)?;

        let start = Instant::now();

        let graph = PropagationGraph::from_problem(problem, &initial_node.state)?;
        let propagation = graph.propagate();

        // Store values for operators, abstract tasks, and facts
        let mut fact_values = vec![Cost::INFINITE; problem.fact_count()];
        let mut task_values = HashMap::with_capacity(problem.task_count());
        for (idx, node) in graph.nodes() {
            let value = propagation.value(idx);
            match node.content {
                NodeContent::Fact(fact) => fact_values[fact] = value,
                NodeContent::Operator(task) | NodeContent::AbstractTask(task) => {
                    task_values.insert(task, value);
                }
                NodeContent::Init | NodeContent::Method(_) => {}
            }
        }

        self.fact_values = fact_values;
        self.task_values = task_values;
        self.iterations = propagation.iterations();
        self.graph = Some(graph);
        self.preprocessing_time = start.elapsed();

        let initial_h = self.estimate(&initial_node.task_network)?;
        self.initial_value = Some(initial_h);

        tracing::info!(
            heuristic = %self,
            iterations = self.iterations,
            graph_nodes = self.graph.as_ref().map_or(0, PropagationGraph::len),
            elapsed_ms = self.preprocessing_time.as_millis() as u64,
            initial_h = %initial_h,
            "hmax propagation converged"
        );

        Ok(initial_h)
    }

    fn evaluate(
        &self,
        _parent: Option<&SearchNode>,
        node: &SearchNode,
    ) -> Result<Cost, HeuristicError> {
        self.estimate(&node.task_network)
    }

    fn info(&self) -> HeuristicInfo {
        HeuristicInfo {
            name: self.name.clone(),
            display: self.to_string(),
            task_costs: self.task_values.len(),
            fact_costs: self.fact_values.len(),
            graph_nodes: self.graph.as_ref().map_or(0, PropagationGraph::len),
            graph_edges: self.graph.as_ref().map_or(0, PropagationGraph::edge_count),
            iterations: self.iterations,
            preprocessing_time: self.preprocessing_time,
            initial_value: self.initial_value,
            ..Default::default()
        }
    }
}

impl fmt::Display for HmaxHeuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HmaxHTN()")
    }
}
