//! Delete-relaxation heuristic for HTN planning
//!
//! Based on Höller et al. (2018), "Delete- and ordering-relaxation
//! heuristics for HTN planning". Delete effects are dropped from every
//! operator, then fact and task costs are lowered pass by pass until nothing
//! changes:
//!
//! 1. an operator whose preconditions all have a finite cost costs its own
//!    cost plus its most expensive precondition
//! 2. a method costs the max (ordering relaxed) or the sum (ordered) of its
//!    subtasks, and its abstract task takes the cheapest method
//! 3. every fact added by a reachable operator costs at most that operator
//!
//! The tables converge once, in `initialize`. Evaluating a node afterwards
//! only combines table entries.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::{Duration, Instant};

use crate::domain::{BitSet, Cost, FactId, Method, Operator, Problem, SearchNode, TaskId, TaskNetwork};

use super::{Heuristic, HeuristicError, HeuristicInfo};

/// Stand-in total reported for unreachable networks under
/// [`UnreachablePolicy::Sentinel`]
pub const UNREACHABLE_SENTINEL: f64 = 999_999.0;

/// What an ordered (summed) estimate reports when a task is unreachable
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum UnreachablePolicy {
    /// Report [`Cost::INFINITE`]
    #[default]
    Infinite,
    /// Report this finite value instead
    Sentinel(Cost),
}

/// How the costs of several tasks are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskCombination {
    /// Tasks may be achieved in any order; the most expensive one dominates
    Max,
    /// Tasks are achieved one after the other; costs add up
    Sum,
}

impl TaskCombination {
    pub fn for_ordering_relaxation(ordering_relaxation: bool) -> Self {
        if ordering_relaxation {
            TaskCombination::Max
        } else {
            TaskCombination::Sum
        }
    }

    /// Combines costs; an empty input costs nothing
    pub fn combine(self, costs: impl IntoIterator<Item = Cost>) -> Cost {
        match self {
            TaskCombination::Max => Cost::max_of(costs),
            TaskCombination::Sum => costs.into_iter().sum(),
        }
    }
}

/// An operator with its delete effects dropped
#[derive(Debug, Clone, PartialEq)]
pub struct RelaxedOperator {
    pub id: TaskId,
    pub name: String,
    pub preconditions: BitSet,
    pub add_effects: BitSet,
    pub cost: Cost,
}

impl RelaxedOperator {
    pub fn from_operator(op: &Operator) -> Self {
        Self {
            id: op.id,
            name: op.name.clone(),
            preconditions: op.preconditions.clone(),
            add_effects: op.add_effects.clone(),
            cost: op.cost,
        }
    }

    /// Relaxed operators never delete anything
    pub fn del_effects(&self) -> BitSet {
        BitSet::new(self.add_effects.len())
    }
}

/// Fact and task cost tables of one fixpoint run
#[derive(Debug, Clone)]
pub struct RelaxedCosts {
    fact_costs: Vec<Cost>,
    task_costs: HashMap<TaskId, Cost>,
    iterations: usize,
}

impl RelaxedCosts {
    /// Seeds the tables: facts of `initial_state` cost 0, every other fact
    /// and every task is unreachable
    pub fn seed(problem: &Problem, initial_state: &BitSet) -> Self {
        let fact_costs = (0..problem.fact_count())
            .map(|fact| {
                if initial_state.contains(fact) {
                    Cost::ZERO
                } else {
                    Cost::INFINITE
                }
            })
            .collect();

        let task_costs = problem
            .task_ids()
            .map(|task| (task, Cost::INFINITE))
            .collect();

        Self {
            fact_costs,
            task_costs,
            iterations: 0,
        }
    }

    /// Runs one full pass over operators, methods and facts
    ///
    /// Returns true if any cost was lowered.
    pub fn relax_once(
        &mut self,
        operators: &BTreeMap<TaskId, RelaxedOperator>,
        methods: &[Method],
        combination: TaskCombination,
    ) -> bool {
        let mut changed = false;
        self.iterations += 1;

        // Operator updates
        for (id, op) in operators {
            let mut precondition_cost = Cost::ZERO;
            let mut applicable = true;

            for fact in op.preconditions.ones() {
                let fact_cost = self.fact_cost(fact);
                if fact_cost.is_infinite() {
                    applicable = false;
                    break;
                }
                precondition_cost = precondition_cost.max(fact_cost);
            }

            if applicable {
                let new_cost = precondition_cost + op.cost;
                if new_cost < self.task_cost(*id) {
                    self.task_costs.insert(*id, new_cost);
                    changed = true;
                }
            }
        }

        // Abstract task decomposition updates
        for method in methods {
            let method_cost =
                combination.combine(method.subtasks.iter().map(|sub| self.task_cost(*sub)));

            if method_cost < self.task_cost(method.compound_task) {
                self.task_costs.insert(method.compound_task, method_cost);
                changed = true;
            }
        }

        // Fact updates
        for (id, op) in operators {
            let op_cost = self.task_cost(*id);
            if op_cost.is_infinite() {
                continue;
            }
            for fact in op.add_effects.ones() {
                if let Some(fact_cost) = self.fact_costs.get_mut(fact) {
                    if op_cost < *fact_cost {
                        *fact_cost = op_cost;
                        changed = true;
                    }
                }
            }
        }

        changed
    }

    /// Runs passes until one changes nothing, returning the total pass count
    pub fn run_to_fixpoint(
        &mut self,
        operators: &BTreeMap<TaskId, RelaxedOperator>,
        methods: &[Method],
        combination: TaskCombination,
    ) -> usize {
        while self.relax_once(operators, methods, combination) {}
        self.iterations
    }

    /// Cost to first make `fact` true; unknown facts are unreachable
    pub fn fact_cost(&self, fact: FactId) -> Cost {
        self.fact_costs.get(fact).copied().unwrap_or(Cost::INFINITE)
    }

    /// Cost of a task; tasks missing from the table are unreachable
    pub fn task_cost(&self, task: TaskId) -> Cost {
        self.task_costs.get(&task).copied().unwrap_or(Cost::INFINITE)
    }

    pub fn fact_costs(&self) -> &[Cost] {
        &self.fact_costs
    }

    pub fn task_costs(&self) -> &HashMap<TaskId, Cost> {
        &self.task_costs
    }

    /// Number of passes run so far
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

/// Delete- and optionally ordering-relaxed cost estimate
#[derive(Debug)]
pub struct DeleteRelaxationHeuristic {
    name: String,
    ordering_relaxation: bool,
    unreachable: UnreachablePolicy,
    relaxed_operators: BTreeMap<TaskId, RelaxedOperator>,
    costs: Option<RelaxedCosts>,
    preprocessing_time: Duration,
    initial_value: Option<Cost>,
}

impl Default for DeleteRelaxationHeuristic {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DeleteRelaxationHeuristic {
    pub fn new(ordering_relaxation: bool) -> Self {
        Self::with_policy(ordering_relaxation, UnreachablePolicy::default())
    }

    pub fn with_policy(ordering_relaxation: bool, unreachable: UnreachablePolicy) -> Self {
        Self {
            name: "del_relax".to_string(),
            ordering_relaxation,
            unreachable,
            relaxed_operators: BTreeMap::new(),
            costs: None,
            preprocessing_time: Duration::ZERO,
            initial_value: None,
        }
    }

    pub fn ordering_relaxation(&self) -> bool {
        self.ordering_relaxation
    }

    pub fn combination(&self) -> TaskCombination {
        TaskCombination::for_ordering_relaxation(self.ordering_relaxation)
    }

    /// Combined cost of `task_network` from the converged tables
    ///
    /// The state does not influence the estimate; the tables were computed
    /// from the initial state.
    pub fn estimate(
        &self,
        _state: &BitSet,
        task_network: &TaskNetwork,
    ) -> Result<Cost, HeuristicError> {
        let costs = self
            .costs
            .as_ref()
            .ok_or_else(|| HeuristicError::NotInitialized(self.name.clone()))?;

        if task_network.is_empty() {
            return Ok(Cost::ZERO);
        }

        let combination = self.combination();
        let total = combination.combine(task_network.iter().map(|task| costs.task_cost(task)));

        match (combination, self.unreachable) {
            (TaskCombination::Sum, UnreachablePolicy::Sentinel(sentinel)) if total.is_infinite() => {
                Ok(sentinel)
            }
            _ => Ok(total),
        }
    }

    /// Converged fact cost, `None` before initialization
    pub fn fact_cost(&self, fact: FactId) -> Option<Cost> {
        self.costs.as_ref().map(|costs| costs.fact_cost(fact))
    }

    /// Converged task cost, `None` before initialization
    pub fn task_cost(&self, task: TaskId) -> Option<Cost> {
        self.costs.as_ref().map(|costs| costs.task_cost(task))
    }

    pub fn costs(&self) -> Option<&RelaxedCosts> {
        self.costs.as_ref()
    }

    pub fn relaxed_operator(&self, task: TaskId) -> Option<&RelaxedOperator> {
        self.relaxed_operators.get(&task)
    }
}

impl Heuristic for DeleteRelaxationHeuristic {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(
        &mut self,
        problem: &Problem,
        initial_node: &SearchNode,
    ) -> Result<Cost, HeuristicError> {
        if self.costs.is_some() {
            return Err(HeuristicError::AlreadyInitialized(self.name.clone()));
        }
        problem.check_node(initial_node)?;

        let start = Instant::now();

        self.relaxed_operators = problem
            .operators()
            .iter()
            .map(|op| (op.id, RelaxedOperator::from_operator(op)))
            .collect();

        let mut costs = RelaxedCosts::seed(problem, &initial_node.state);
        let iterations =
            costs.run_to_fixpoint(&self.relaxed_operators, problem.methods(), self.combination());
        self.costs = Some(costs);
        self.preprocessing_time = start.elapsed();

        let initial_h = self.estimate(&initial_node.state, &initial_node.task_network)?;
        self.initial_value = Some(initial_h);

        tracing::info!(
            heuristic = %self,
            iterations,
            relaxed_operators = self.relaxed_operators.len(),
            elapsed_ms = self.preprocessing_time.as_millis() as u64,
            initial_h = %initial_h,
            "delete relaxation converged"
        );

        Ok(initial_h)
    }

    fn evaluate(
        &self,
        _parent: Option<&SearchNode>,
        node: &SearchNode,
    ) -> Result<Cost, HeuristicError> {
        self.estimate(&node.state, &node.task_network)
    }

    fn info(&self) -> HeuristicInfo {
        HeuristicInfo {
            name: self.name.clone(),
            display: self.to_string(),
            ordering_relaxation: Some(self.ordering_relaxation),
            relaxed_operators: self.relaxed_operators.len(),
            task_costs: self.costs.as_ref().map_or(0, |c| c.task_costs().len()),
            fact_costs: self.costs.as_ref().map_or(0, |c| c.fact_costs().len()),
            iterations: self.costs.as_ref().map_or(0, RelaxedCosts::iterations),
            preprocessing_time: self.preprocessing_time,
            initial_value: self.initial_value,
            ..Default::default()
        }
    }
}

impl fmt::Display for DeleteRelaxationHeuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ordering_relaxation {
            write!(f, "DelRelax(ord_relax)")
        } else {
            write!(f, "DelRelax()")
        }
    }
}
