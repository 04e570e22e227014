//! Grounded HTN problem model
//!
//! The grounder produces facts, operators, abstract tasks and decomposition
//! methods. A [`Problem`] can only be built through [`Problem::new`], which
//! checks that every reference inside the model resolves, so the heuristics
//! can trust it.

use std::collections::HashMap;

use thiserror::Error;

use super::bitset::BitSet;
use super::cost::Cost;
use super::id::{FactId, MethodId, TaskId};
use super::network::{SearchNode, TaskNetwork};

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Task id {0} is defined more than once")]
    DuplicateTask(TaskId),

    #[error("Fact index {index} out of range for {facts} facts (in {context})")]
    FactOutOfRange {
        index: FactId,
        facts: usize,
        context: String,
    },

    #[error("Fact set of {context} has width {found}, expected {expected}")]
    WidthMismatch {
        context: String,
        expected: usize,
        found: usize,
    },

    #[error("Operator {task} has invalid cost {cost}")]
    InvalidCost { task: TaskId, cost: f64 },

    #[error("Method '{method}' decomposes {task}, which is not an abstract task")]
    UnknownCompoundTask { method: String, task: TaskId },

    #[error("Method '{method}' references unknown subtask {task}")]
    UnknownSubtask { method: String, task: TaskId },

    #[error("State has width {found}, but the problem has {expected} facts")]
    StateWidth { expected: usize, found: usize },
}

/// A grounded primitive task
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub id: TaskId,
    pub name: String,
    pub preconditions: BitSet,
    pub add_effects: BitSet,
    pub del_effects: BitSet,
    pub cost: Cost,
}

/// A grounded compound task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbstractTask {
    pub id: TaskId,
    pub name: String,
}

/// One way of decomposing an abstract task into subtasks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub compound_task: TaskId,
    pub subtasks: Vec<TaskId>,
}

/// Whether a task id names an operator or an abstract task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Primitive(usize),
    Compound(usize),
}

/// A validated grounded problem
#[derive(Debug, Clone)]
pub struct Problem {
    facts: Vec<String>,
    operators: Vec<Operator>,
    abstract_tasks: Vec<AbstractTask>,
    methods: Vec<Method>,
    initial_state: BitSet,
    initial_task_network: TaskNetwork,
    task_index: HashMap<TaskId, TaskKind>,
}

impl Problem {
    /// Builds a problem, checking every cross reference
    ///
    /// Task ids in the initial task network are not required to exist; an
    /// unknown task simply has no relaxed plan.
    pub fn new(
        facts: Vec<String>,
        operators: Vec<Operator>,
        abstract_tasks: Vec<AbstractTask>,
        methods: Vec<Method>,
        initial_state: BitSet,
        initial_task_network: TaskNetwork,
    ) -> Result<Self, ModelError> {
        let fact_count = facts.len();
        let mut task_index = HashMap::new();

        for (i, op) in operators.iter().enumerate() {
            if task_index.insert(op.id, TaskKind::Primitive(i)).is_some() {
                return Err(ModelError::DuplicateTask(op.id));
            }
            if op.cost.is_infinite() {
                return Err(ModelError::InvalidCost {
                    task: op.id,
                    cost: op.cost.value(),
                });
            }
            for (label, set) in [
                ("preconditions", &op.preconditions),
                ("add effects", &op.add_effects),
                ("delete effects", &op.del_effects),
            ] {
                if set.len() != fact_count {
                    return Err(ModelError::WidthMismatch {
                        context: format!("{} of operator '{}'", label, op.name),
                        expected: fact_count,
                        found: set.len(),
                    });
                }
            }
        }

        for (i, task) in abstract_tasks.iter().enumerate() {
            if task_index.insert(task.id, TaskKind::Compound(i)).is_some() {
                return Err(ModelError::DuplicateTask(task.id));
            }
        }

        for method in &methods {
            if !matches!(
                task_index.get(&method.compound_task),
                Some(TaskKind::Compound(_))
            ) {
                return Err(ModelError::UnknownCompoundTask {
                    method: method.name.clone(),
                    task: method.compound_task,
                });
            }
            if let Some(missing) = method
                .subtasks
                .iter()
                .find(|sub| !task_index.contains_key(sub))
            {
                return Err(ModelError::UnknownSubtask {
                    method: method.name.clone(),
                    task: *missing,
                });
            }
        }

        if initial_state.len() != fact_count {
            return Err(ModelError::StateWidth {
                expected: fact_count,
                found: initial_state.len(),
            });
        }

        Ok(Self {
            facts,
            operators,
            abstract_tasks,
            methods,
            initial_state,
            initial_task_network,
            task_index,
        })
    }

    /// Returns the number of facts `F`
    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    /// Returns the name of a fact
    pub fn fact_name(&self, fact: FactId) -> Option<&str> {
        self.facts.get(fact).map(String::as_str)
    }

    pub fn facts(&self) -> &[String] {
        &self.facts
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    pub fn abstract_tasks(&self) -> &[AbstractTask] {
        &self.abstract_tasks
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn method(&self, id: MethodId) -> Option<&Method> {
        self.methods.get(id)
    }

    pub fn initial_state(&self) -> &BitSet {
        &self.initial_state
    }

    pub fn initial_task_network(&self) -> &TaskNetwork {
        &self.initial_task_network
    }

    /// Returns the search node the search starts from
    pub fn initial_node(&self) -> SearchNode {
        SearchNode::new(
            self.initial_state.clone(),
            self.initial_task_network.clone(),
        )
    }

    /// Looks up whether a task is primitive or compound
    pub fn task_kind(&self, task: TaskId) -> Option<TaskKind> {
        self.task_index.get(&task).copied()
    }

    pub fn operator(&self, task: TaskId) -> Option<&Operator> {
        match self.task_kind(task)? {
            TaskKind::Primitive(i) => self.operators.get(i),
            TaskKind::Compound(_) => None,
        }
    }

    pub fn abstract_task(&self, task: TaskId) -> Option<&AbstractTask> {
        match self.task_kind(task)? {
            TaskKind::Compound(i) => self.abstract_tasks.get(i),
            TaskKind::Primitive(_) => None,
        }
    }

    /// Returns the display name of an operator or abstract task
    pub fn task_name(&self, task: TaskId) -> Option<&str> {
        match self.task_kind(task)? {
            TaskKind::Primitive(i) => self.operators.get(i).map(|op| op.name.as_str()),
            TaskKind::Compound(i) => self.abstract_tasks.get(i).map(|t| t.name.as_str()),
        }
    }

    /// Returns every task id, operators first
    pub fn task_ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.operators
            .iter()
            .map(|op| op.id)
            .chain(self.abstract_tasks.iter().map(|t| t.id))
    }

    /// Returns the number of operators plus abstract tasks
    pub fn task_count(&self) -> usize {
        self.operators.len() + self.abstract_tasks.len()
    }

    /// Checks that a search node fits this problem
    pub fn check_node(&self, node: &SearchNode) -> Result<(), ModelError> {
        if node.state.len() != self.fact_count() {
            return Err(ModelError::StateWidth {
                expected: self.fact_count(),
                found: node.state.len(),
            });
        }
        Ok(())
    }
}
