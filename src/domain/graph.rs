//! AND/OR propagation graph
//!
//! Each node is an INIT, AND or OR node with a weight. Edges run from a
//! predecessor to the node whose value depends on it. The topology is built
//! once per problem; [`PropagationGraph::propagate`] computes fresh values
//! into a separate vector, so the graph itself stays read-only.
//! Uses petgraph as the node arena, which lets cycles exist without any
//! owning references between nodes.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;
use thiserror::Error;

use super::bitset::BitSet;
use super::cost::Cost;
use super::id::{FactId, MethodId, TaskId};
use super::model::Problem;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NodeNotFound(usize),

    #[error("No node stands for {0:?}")]
    ContentNotFound(NodeContent),

    #[error("Graph already contains a node for {0:?}")]
    DuplicateContent(NodeContent),
}

/// How a node combines its predecessors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Holds without preconditions; value fixed at 0
    Init,
    /// All predecessors are required: weight + max
    And,
    /// Any predecessor suffices: min
    Or,
}

/// What part of the planning problem a node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeContent {
    Init,
    Fact(FactId),
    Operator(TaskId),
    AbstractTask(TaskId),
    Method(MethodId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropagationNode {
    pub kind: NodeKind,
    pub content: NodeContent,
    pub weight: Cost,
}

/// Values computed by one propagation run
#[derive(Debug, Clone)]
pub struct Propagation {
    values: Vec<Cost>,
    iterations: usize,
}

impl Propagation {
    /// Returns the value of a node, infinite for unknown indices
    pub fn value(&self, node: NodeIndex) -> Cost {
        self.values
            .get(node.index())
            .copied()
            .unwrap_or(Cost::INFINITE)
    }

    /// Returns all values, indexed by node index
    pub fn values(&self) -> &[Cost] {
        &self.values
    }

    /// Returns the number of full scans, including the final one that
    /// changed nothing
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

/// AND/OR graph over facts, operators, abstract tasks and methods
#[derive(Debug)]
pub struct PropagationGraph {
    /// The underlying directed graph, edges run predecessor -> node
    graph: DiGraph<PropagationNode, ()>,

    /// Map from content to node index
    node_map: HashMap<NodeContent, NodeIndex>,

    init: NodeIndex,
}

impl Default for PropagationGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl PropagationGraph {
    /// Creates a graph holding only the INIT node
    pub fn new() -> Self {
        let mut graph = DiGraph::new();
        let init = graph.add_node(PropagationNode {
            kind: NodeKind::Init,
            content: NodeContent::Init,
            weight: Cost::ZERO,
        });

        let mut node_map = HashMap::new();
        node_map.insert(NodeContent::Init, init);

        Self {
            graph,
            node_map,
            init,
        }
    }

    /// Builds the graph for a problem
    ///
    /// - every fact is an OR node; facts in `initial_state` hang off INIT
    /// - every operator is an AND node weighted by its cost, depending on its
    ///   precondition facts, and feeds each fact it adds
    /// - every abstract task is an OR node over its methods
    /// - every method is a zero-weight AND node over its subtasks
    pub fn from_problem(problem: &Problem, initial_state: &BitSet) -> Result<Self, GraphError> {
        let mut graph = Self::new();

        // First pass: add all nodes
        let mut facts = Vec::with_capacity(problem.fact_count());
        for fact in 0..problem.fact_count() {
            facts.push(graph.add_node(NodeKind::Or, NodeContent::Fact(fact), Cost::ZERO)?);
        }
        for op in problem.operators() {
            graph.add_node(NodeKind::And, NodeContent::Operator(op.id), op.cost)?;
        }
        for task in problem.abstract_tasks() {
            graph.add_node(NodeKind::Or, NodeContent::AbstractTask(task.id), Cost::ZERO)?;
        }
        for method in 0..problem.methods().len() {
            graph.add_node(NodeKind::And, NodeContent::Method(method), Cost::ZERO)?;
        }

        // Second pass: add all edges
        let init = graph.init;
        for fact in initial_state.ones() {
            let node = *facts
                .get(fact)
                .ok_or(GraphError::ContentNotFound(NodeContent::Fact(fact)))?;
            graph.add_predecessor(node, init)?;
        }

        for op in problem.operators() {
            let op_node = graph.require(NodeContent::Operator(op.id))?;
            for fact in op.preconditions.ones() {
                graph.add_predecessor(op_node, facts[fact])?;
            }
            for fact in op.add_effects.ones() {
                graph.add_predecessor(facts[fact], op_node)?;
            }
        }

        for (id, method) in problem.methods().iter().enumerate() {
            let method_node = graph.require(NodeContent::Method(id))?;
            let task_node = graph.require(NodeContent::AbstractTask(method.compound_task))?;
            graph.add_predecessor(task_node, method_node)?;

            for sub in &method.subtasks {
                let sub_node = graph
                    .node_for(NodeContent::Operator(*sub))
                    .or_else(|| graph.node_for(NodeContent::AbstractTask(*sub)))
                    .ok_or(GraphError::ContentNotFound(NodeContent::AbstractTask(*sub)))?;
                graph.add_predecessor(method_node, sub_node)?;
            }
        }

        tracing::debug!(
            nodes = graph.len(),
            edges = graph.edge_count(),
            "built propagation graph"
        );

        Ok(graph)
    }

    /// Adds a node; each content tag may appear only once
    pub fn add_node(
        &mut self,
        kind: NodeKind,
        content: NodeContent,
        weight: Cost,
    ) -> Result<NodeIndex, GraphError> {
        if self.node_map.contains_key(&content) {
            return Err(GraphError::DuplicateContent(content));
        }

        let idx = self.graph.add_node(PropagationNode {
            kind,
            content,
            weight,
        });
        self.node_map.insert(content, idx);
        Ok(idx)
    }

    /// Records that `node`'s value depends on `predecessor`
    ///
    /// The edge direction is: predecessor -> node
    pub fn add_predecessor(
        &mut self,
        node: NodeIndex,
        predecessor: NodeIndex,
    ) -> Result<(), GraphError> {
        for idx in [node, predecessor] {
            if self.graph.node_weight(idx).is_none() {
                return Err(GraphError::NodeNotFound(idx.index()));
            }
        }

        if self.graph.find_edge(predecessor, node).is_none() {
            self.graph.add_edge(predecessor, node, ());
        }
        Ok(())
    }

    fn require(&self, content: NodeContent) -> Result<NodeIndex, GraphError> {
        self.node_for(content)
            .ok_or(GraphError::ContentNotFound(content))
    }

    /// Returns the INIT node
    pub fn init(&self) -> NodeIndex {
        self.init
    }

    /// Returns the node standing for `content`
    pub fn node_for(&self, content: NodeContent) -> Option<NodeIndex> {
        self.node_map.get(&content).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&PropagationNode> {
        self.graph.node_weight(idx)
    }

    /// Returns the nodes `idx` depends on
    pub fn predecessors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(idx, Direction::Incoming)
    }

    /// Returns all nodes with their indices
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &PropagationNode)> + '_ {
        self.graph
            .node_indices()
            .map(move |idx| (idx, &self.graph[idx]))
    }

    /// Returns the number of nodes, including INIT
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns true if the graph holds nothing but INIT
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() <= 1
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Propagates values to a fixpoint
    ///
    /// INIT nodes start at 0, all others at infinity. Every scan recomputes
    /// each node in place from its predecessors' current values:
    /// - OR: min over predecessors, unchanged without predecessors
    /// - AND: weight + max over predecessors, weight alone without any
    ///
    /// A value is only stored when it improves, so values never increase and
    /// the loop stops after the first scan that changes nothing.
    pub fn propagate(&self) -> Propagation {
        let mut values: Vec<Cost> = self
            .graph
            .node_indices()
            .map(|idx| match self.graph[idx].kind {
                NodeKind::Init => Cost::ZERO,
                NodeKind::And | NodeKind::Or => Cost::INFINITE,
            })
            .collect();

        let mut iterations = 0;
        let mut changed = true;

        while changed {
            changed = false;
            iterations += 1;

            for idx in self.graph.node_indices() {
                let node = &self.graph[idx];
                let old = values[idx.index()];

                let new = match node.kind {
                    NodeKind::Init => old,
                    NodeKind::Or => {
                        Cost::min_of(self.predecessors(idx).map(|p| values[p.index()]))
                            .unwrap_or(old)
                    }
                    NodeKind::And => {
                        node.weight + Cost::max_of(self.predecessors(idx).map(|p| values[p.index()]))
                    }
                };

                if new < old {
                    values[idx.index()] = new;
                    changed = true;
                }
            }
        }

        tracing::debug!(iterations, nodes = values.len(), "propagation converged");

        Propagation { values, iterations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{AbstractTask, Method, Operator};
    use crate::domain::network::TaskNetwork;

    fn cost(value: f64) -> Cost {
        Cost::new(value).unwrap()
    }

    fn chain_problem() -> Problem {
        let set = |indices: &[usize]| BitSet::from_indices(3, indices.iter().copied()).unwrap();
        Problem::new(
            vec!["A".into(), "B".into(), "C".into()],
            vec![
                Operator {
                    id: TaskId::new(0),
                    name: "op1".into(),
                    preconditions: set(&[0]),
                    add_effects: set(&[1]),
                    del_effects: set(&[]),
                    cost: cost(1.0),
                },
                Operator {
                    id: TaskId::new(1),
                    name: "op2".into(),
                    preconditions: set(&[1]),
                    add_effects: set(&[2]),
                    del_effects: set(&[]),
                    cost: cost(2.0),
                },
            ],
            vec![AbstractTask {
                id: TaskId::new(2),
                name: "T".into(),
            }],
            vec![Method {
                name: "m1".into(),
                compound_task: TaskId::new(2),
                subtasks: vec![TaskId::new(0), TaskId::new(1)],
            }],
            set(&[0]),
            TaskNetwork::new(vec![TaskId::new(2)]),
        )
        .unwrap()
    }

    #[test]
    fn new_graph_has_init_only() {
        let graph = PropagationGraph::new();
        assert_eq!(graph.len(), 1);
        assert!(graph.is_empty());
        assert_eq!(graph.node(graph.init()).unwrap().kind, NodeKind::Init);
        assert_eq!(graph.node_for(NodeContent::Init), Some(graph.init()));
    }

    #[test]
    fn duplicate_content_rejected() {
        let mut graph = PropagationGraph::new();
        graph
            .add_node(NodeKind::Or, NodeContent::Fact(0), Cost::ZERO)
            .unwrap();

        let result = graph.add_node(NodeKind::Or, NodeContent::Fact(0), Cost::ZERO);
        assert_eq!(result, Err(GraphError::DuplicateContent(NodeContent::Fact(0))));
    }

    #[test]
    fn unknown_node_rejected() {
        let mut graph = PropagationGraph::new();
        let result = graph.add_predecessor(NodeIndex::new(7), graph.init());
        assert_eq!(result, Err(GraphError::NodeNotFound(7)));
    }

    #[test]
    fn or_takes_min_and_and_takes_max_plus_weight() {
        let mut graph = PropagationGraph::new();
        let init = graph.init();
        let cheap = graph
            .add_node(NodeKind::And, NodeContent::Operator(TaskId::new(0)), cost(2.0))
            .unwrap();
        let dear = graph
            .add_node(NodeKind::And, NodeContent::Operator(TaskId::new(1)), cost(5.0))
            .unwrap();
        let either = graph
            .add_node(NodeKind::Or, NodeContent::Fact(0), Cost::ZERO)
            .unwrap();
        let both = graph
            .add_node(NodeKind::And, NodeContent::Method(0), cost(1.0))
            .unwrap();

        graph.add_predecessor(cheap, init).unwrap();
        graph.add_predecessor(dear, init).unwrap();
        graph.add_predecessor(either, cheap).unwrap();
        graph.add_predecessor(either, dear).unwrap();
        graph.add_predecessor(both, cheap).unwrap();
        graph.add_predecessor(both, dear).unwrap();

        let result = graph.propagate();
        assert_eq!(result.value(init), Cost::ZERO);
        assert_eq!(result.value(either), cost(2.0));
        assert_eq!(result.value(both), cost(6.0));
    }

    #[test]
    fn isolated_nodes() {
        let mut graph = PropagationGraph::new();
        let or = graph
            .add_node(NodeKind::Or, NodeContent::Fact(0), Cost::ZERO)
            .unwrap();
        let and = graph
            .add_node(NodeKind::And, NodeContent::Operator(TaskId::new(0)), cost(3.0))
            .unwrap();

        let result = graph.propagate();
        assert!(result.value(or).is_infinite());
        assert_eq!(result.value(and), cost(3.0));
    }

    #[test]
    fn cycles_converge() {
        let mut graph = PropagationGraph::new();
        let init = graph.init();
        let a = graph
            .add_node(NodeKind::Or, NodeContent::Fact(0), Cost::ZERO)
            .unwrap();
        let b = graph
            .add_node(NodeKind::Or, NodeContent::Fact(1), Cost::ZERO)
            .unwrap();
        let op = graph
            .add_node(NodeKind::And, NodeContent::Operator(TaskId::new(0)), cost(1.0))
            .unwrap();

        // a <- op <- b <- a, with a also reachable from init
        graph.add_predecessor(a, init).unwrap();
        graph.add_predecessor(op, b).unwrap();
        graph.add_predecessor(a, op).unwrap();
        graph.add_predecessor(b, a).unwrap();

        let result = graph.propagate();
        assert_eq!(result.value(a), Cost::ZERO);
        assert_eq!(result.value(b), Cost::ZERO);
        assert_eq!(result.value(op), cost(1.0));
    }

    #[test]
    fn unsupported_cycle_stays_infinite() {
        let mut graph = PropagationGraph::new();
        let a = graph
            .add_node(NodeKind::Or, NodeContent::Fact(0), Cost::ZERO)
            .unwrap();
        let op = graph
            .add_node(NodeKind::And, NodeContent::Operator(TaskId::new(0)), cost(1.0))
            .unwrap();
        graph.add_predecessor(op, a).unwrap();
        graph.add_predecessor(a, op).unwrap();

        let result = graph.propagate();
        assert!(result.value(a).is_infinite());
        assert!(result.value(op).is_infinite());
    }

    #[test]
    fn from_problem_structure() {
        let problem = chain_problem();
        let graph = PropagationGraph::from_problem(&problem, problem.initial_state()).unwrap();

        // init + 3 facts + 2 operators + 1 abstract task + 1 method
        assert_eq!(graph.len(), 8);
        // init->A, A->op1, op1->B, B->op2, op2->C, m1->T, op1->m1, op2->m1
        assert_eq!(graph.edge_count(), 8);

        let op2 = graph.node_for(NodeContent::Operator(TaskId::new(1))).unwrap();
        let b = graph.node_for(NodeContent::Fact(1)).unwrap();
        assert_eq!(graph.predecessors(op2).collect::<Vec<_>>(), vec![b]);
        assert_eq!(graph.node(op2).unwrap().weight, cost(2.0));
    }

    #[test]
    fn from_problem_values() {
        let problem = chain_problem();
        let graph = PropagationGraph::from_problem(&problem, problem.initial_state()).unwrap();
        let result = graph.propagate();

        let value = |content| result.value(graph.node_for(content).unwrap());
        assert_eq!(value(NodeContent::Fact(0)), Cost::ZERO);
        assert_eq!(value(NodeContent::Fact(1)), cost(1.0));
        assert_eq!(value(NodeContent::Fact(2)), cost(3.0));
        assert_eq!(value(NodeContent::Operator(TaskId::new(1))), cost(3.0));
        assert_eq!(value(NodeContent::AbstractTask(TaskId::new(2))), cost(3.0));
    }

    #[test]
    fn propagation_is_repeatable() {
        let problem = chain_problem();
        let graph = PropagationGraph::from_problem(&problem, problem.initial_state()).unwrap();

        let first = graph.propagate();
        let second = graph.propagate();
        assert_eq!(first.values(), second.values());
        assert_eq!(first.iterations(), second.iterations());
    }
}
