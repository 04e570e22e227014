//! JSON storage for grounded problems
//!
//! The grounder writes one JSON document per problem. Facts are referenced
//! by their index in `facts`, tasks by their global id:
//!
//! ```json
//! {
//!   "facts": ["A", "B"],
//!   "operators": [{"id": 0, "name": "op1", "preconditions": [0], "add_effects": [1], "cost": 1.0}],
//!   "abstract_tasks": [{"id": 1, "name": "T"}],
//!   "methods": [{"name": "m1", "compound_task": 1, "subtasks": [0]}],
//!   "initial_state": [0],
//!   "initial_task_network": [1]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AbstractTask, BitSet, BitSetError, Cost, FactId, Method, ModelError, Operator, Problem,
    TaskId, TaskNetwork,
};

fn default_cost() -> f64 {
    1.0
}

/// Operator as written by the grounder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorRecord {
    pub id: TaskId,
    pub name: String,
    #[serde(default)]
    pub preconditions: Vec<FactId>,
    #[serde(default)]
    pub add_effects: Vec<FactId>,
    #[serde(default)]
    pub del_effects: Vec<FactId>,
    #[serde(default = "default_cost")]
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbstractTaskRecord {
    pub id: TaskId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRecord {
    pub name: String,
    pub compound_task: TaskId,
    #[serde(default)]
    pub subtasks: Vec<TaskId>,
}

/// On-disk form of a grounded problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemFile {
    pub facts: Vec<String>,
    #[serde(default)]
    pub operators: Vec<OperatorRecord>,
    #[serde(default)]
    pub abstract_tasks: Vec<AbstractTaskRecord>,
    #[serde(default)]
    pub methods: Vec<MethodRecord>,
    #[serde(default)]
    pub initial_state: Vec<FactId>,
    #[serde(default)]
    pub initial_task_network: Vec<TaskId>,
}

impl ProblemFile {
    /// Validates the records and builds the problem
    pub fn into_problem(self) -> Result<Problem, ModelError> {
        let fact_count = self.facts.len();
        let fact_set = |indices: &[FactId], context: String| {
            BitSet::from_indices(fact_count, indices.iter().copied()).map_err(
                |BitSetError::IndexOutOfRange { index, len }| ModelError::FactOutOfRange {
                    index,
                    facts: len,
                    context,
                },
            )
        };

        let mut operators = Vec::with_capacity(self.operators.len());
        for record in self.operators {
            let cost = Cost::new(record.cost).ok_or(ModelError::InvalidCost {
                task: record.id,
                cost: record.cost,
            })?;

            operators.push(Operator {
                id: record.id,
                preconditions: fact_set(
                    &record.preconditions,
                    format!("preconditions of '{}'", record.name),
                )?,
                add_effects: fact_set(
                    &record.add_effects,
                    format!("add effects of '{}'", record.name),
                )?,
                del_effects: fact_set(
                    &record.del_effects,
                    format!("delete effects of '{}'", record.name),
                )?,
                name: record.name,
                cost,
            });
        }

        let abstract_tasks = self
            .abstract_tasks
            .into_iter()
            .map(|record| AbstractTask {
                id: record.id,
                name: record.name,
            })
            .collect();

        let methods = self
            .methods
            .into_iter()
            .map(|record| Method {
                name: record.name,
                compound_task: record.compound_task,
                subtasks: record.subtasks,
            })
            .collect();

        let initial_state = fact_set(&self.initial_state, "initial state".to_string())?;

        Problem::new(
            self.facts,
            operators,
            abstract_tasks,
            methods,
            initial_state,
            TaskNetwork::new(self.initial_task_network),
        )
    }
}

/// Reads grounded problems from JSON files
pub struct ProblemStore {
    path: PathBuf,
}

impl ProblemStore {
    /// Creates a store for the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the problem file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the raw records
    pub fn read(&self) -> Result<ProblemFile> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read problem file: {}", self.path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse problem file: {}", self.path.display()))
    }

    /// Reads and validates the problem
    pub fn load(&self) -> Result<Problem> {
        let file = self.read()?;
        let problem = file
            .into_problem()
            .with_context(|| format!("Invalid problem model in {}", self.path.display()))?;

        tracing::debug!(
            path = %self.path.display(),
            facts = problem.fact_count(),
            operators = problem.operators().len(),
            abstract_tasks = problem.abstract_tasks().len(),
            methods = problem.methods().len(),
            "loaded problem"
        );

        Ok(problem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CHAIN: &str = r#"{
        "facts": ["A", "B", "C"],
        "operators": [
            {"id": 0, "name": "op1", "preconditions": [0], "add_effects": [1], "cost": 1.0},
            {"id": 1, "name": "op2", "preconditions": [1], "add_effects": [2], "del_effects": [1], "cost": 2}
        ],
        "abstract_tasks": [{"id": 2, "name": "T"}],
        "methods": [{"name": "m1", "compound_task": 2, "subtasks": [0, 1]}],
        "initial_state": [0],
        "initial_task_network": [2]
    }"#;

    fn parse(json: &str) -> ProblemFile {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn converts_chain_problem() {
        let problem = parse(CHAIN).into_problem().unwrap();

        assert_eq!(problem.fact_count(), 3);
        assert_eq!(problem.operators().len(), 2);
        assert_eq!(problem.methods().len(), 1);
        assert!(problem.initial_state().contains(0));
        assert_eq!(problem.initial_task_network().as_slice(), &[TaskId::new(2)]);

        let op2 = problem.operator(TaskId::new(1)).unwrap();
        assert!(op2.preconditions.contains(1));
        assert!(op2.del_effects.contains(1));
        assert_eq!(op2.cost, Cost::new(2.0).unwrap());
    }

    #[test]
    fn optional_sections_default() {
        let file = parse(r#"{"facts": ["A"], "operators": [{"id": 3, "name": "noop"}]}"#);
        assert_eq!(file.operators[0].cost, 1.0);

        let problem = file.into_problem().unwrap();
        assert!(problem.abstract_tasks().is_empty());
        assert!(problem.initial_state().is_empty());
        assert!(problem.initial_task_network().is_empty());
    }

    #[test]
    fn fact_out_of_range() {
        let file = parse(
            r#"{"facts": ["A"], "operators": [{"id": 0, "name": "bad", "add_effects": [4]}]}"#,
        );
        assert_eq!(
            file.into_problem().unwrap_err(),
            ModelError::FactOutOfRange {
                index: 4,
                facts: 1,
                context: "add effects of 'bad'".to_string()
            }
        );
    }

    #[test]
    fn invalid_cost() {
        let file = parse(r#"{"facts": [], "operators": [{"id": 0, "name": "neg", "cost": -2}]}"#);
        assert!(matches!(
            file.into_problem(),
            Err(ModelError::InvalidCost { cost, .. }) if cost == -2.0
        ));
    }

    #[test]
    fn unknown_subtask() {
        let file = parse(
            r#"{"facts": [], "abstract_tasks": [{"id": 0, "name": "T"}],
                "methods": [{"name": "m", "compound_task": 0, "subtasks": [5]}]}"#,
        );
        assert!(matches!(
            file.into_problem(),
            Err(ModelError::UnknownSubtask { .. })
        ));
    }

    #[test]
    fn store_loads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("problem.json");
        fs::write(&path, CHAIN).unwrap();

        let store = ProblemStore::new(&path);
        assert_eq!(store.path(), path.as_path());

        let problem = store.load().unwrap();
        assert_eq!(problem.task_count(), 3);
    }

    #[test]
    fn store_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = ProblemStore::new(dir.path().join("missing.json"));

        let err = store.load().unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read problem file"));
    }

    #[test]
    fn store_reports_invalid_model() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"facts": ["A"], "initial_state": [3]}"#).unwrap();

        let err = ProblemStore::new(&path).load().unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("Invalid problem model"));
        assert!(message.contains("initial state"));
    }
}
