//! Heuristic commands (estimate, evaluate, costs)

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::output::Output;
use crate::domain::{BitSet, Cost, FactId, Problem, SearchNode, TaskId, TaskNetwork};
use crate::heuristics::{DeleteRelaxationHeuristic, Heuristic, HeuristicKind, HmaxHeuristic};
use crate::storage::{HeuristicsConfig, ProblemStore};

fn load(output: &Output, path: &Path) -> Result<Problem> {
    let problem = ProblemStore::new(path).load()?;
    output.verbose_ctx(
        "load",
        &format!(
            "{}: {} facts, {} tasks, {} methods",
            path.display(),
            problem.fact_count(),
            problem.task_count(),
            problem.methods().len()
        ),
    );
    Ok(problem)
}

fn initialize(
    output: &Output,
    problem: &Problem,
    kind: HeuristicKind,
    settings: &HeuristicsConfig,
) -> Result<(Box<dyn Heuristic>, Cost)> {
    let mut heuristic = kind.build(settings);
    output.verbose_ctx("init", &format!("Initializing {}", heuristic));

    let initial = heuristic
        .initialize(problem, &problem.initial_node())
        .with_context(|| format!("Failed to initialize heuristic '{}'", kind))?;
    Ok((heuristic, initial))
}

/// Initializes a heuristic and prints the estimate of the initial node
pub fn estimate(
    output: &Output,
    path: &Path,
    kind: HeuristicKind,
    settings: &HeuristicsConfig,
) -> Result<()> {
    let problem = load(output, path)?;
    let (heuristic, initial) = initialize(output, &problem, kind, settings)?;
    let info = heuristic.info();

    if output.is_json() {
        output.data(&serde_json::json!({
            "heuristic": kind,
            "value": initial,
            "info": info,
        }));
    } else {
        println!("Initial estimate: {}", initial);
        output.blank();
        print!("{}", info);
    }

    Ok(())
}

/// Evaluates one search node
pub fn evaluate(
    output: &Output,
    path: &Path,
    kind: HeuristicKind,
    settings: &HeuristicsConfig,
    network: Vec<TaskId>,
    state: Option<Vec<FactId>>,
) -> Result<()> {
    let problem = load(output, path)?;

    let state = match state {
        Some(facts) => BitSet::from_indices(problem.fact_count(), facts)
            .context("Invalid --state")?,
        None => problem.initial_state().clone(),
    };
    let node = SearchNode::new(state, TaskNetwork::new(network));

    let (heuristic, _) = initialize(output, &problem, kind, settings)?;
    let value = heuristic
        .evaluate(None, &node)
        .with_context(|| format!("Failed to evaluate node with '{}'", kind))?;

    if output.is_json() {
        let facts: Vec<FactId> = node.state.ones().collect();
        output.data(&serde_json::json!({
            "heuristic": kind,
            "state": facts,
            "task_network": node.task_network,
            "value": value,
        }));
    } else {
        let tasks: Vec<String> = node
            .task_network
            .iter()
            .map(|task| problem.task_name(task).unwrap_or("?").to_string())
            .collect();
        println!("Task network: [{}]", tasks.join(", "));
        println!("h = {}", value);
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct FactRow<'a> {
    fact: FactId,
    name: &'a str,
    cost: Cost,
}

#[derive(Debug, Serialize)]
struct TaskRow<'a> {
    task: TaskId,
    name: &'a str,
    cost: Cost,
}

/// Prints the converged cost tables
pub fn costs(
    output: &Output,
    path: &Path,
    kind: HeuristicKind,
    settings: &HeuristicsConfig,
) -> Result<()> {
    let problem = load(output, path)?;
    let initial = problem.initial_node();

    let (fact_cost, task_cost): (Vec<Cost>, Vec<Cost>) = match kind {
        HeuristicKind::DelRelax => {
            let mut heuristic = DeleteRelaxationHeuristic::with_policy(
                settings.del_relax.ordering_relaxation,
                settings.del_relax.unreachable_policy(),
            );
            heuristic.initialize(&problem, &initial)?;
            (
                (0..problem.fact_count())
                    .map(|fact| heuristic.fact_cost(fact).unwrap_or(Cost::INFINITE))
                    .collect(),
                problem
                    .task_ids()
                    .map(|task| heuristic.task_cost(task).unwrap_or(Cost::INFINITE))
                    .collect(),
            )
        }
        HeuristicKind::Hmax => {
            let mut heuristic = HmaxHeuristic::new();
            heuristic.initialize(&problem, &initial)?;
            (
                (0..problem.fact_count())
                    .map(|fact| heuristic.fact_value(fact).unwrap_or(Cost::INFINITE))
                    .collect(),
                problem
                    .task_ids()
                    .map(|task| heuristic.task_value(task).unwrap_or(Cost::INFINITE))
                    .collect(),
            )
        }
    };

    let facts: Vec<FactRow> = problem
        .facts()
        .iter()
        .enumerate()
        .zip(fact_cost)
        .map(|((fact, name), cost)| FactRow {
            fact,
            name: name.as_str(),
            cost,
        })
        .collect();

    let tasks: Vec<TaskRow> = problem
        .task_ids()
        .zip(task_cost)
        .map(|(task, cost)| TaskRow {
            task,
            name: problem.task_name(task).unwrap_or("?"),
            cost,
        })
        .collect();

    if output.is_json() {
        output.data(&serde_json::json!({
            "heuristic": kind,
            "facts": facts,
            "tasks": tasks,
        }));
    } else {
        println!("Fact costs ({}):", facts.len());
        println!("{:<8} {:<30} COST", "FACT", "NAME");
        println!("{}", "-".repeat(50));
        for row in &facts {
            println!("{:<8} {:<30} {}", row.fact, row.name, row.cost);
        }

        output.blank();
        println!("Task costs ({}):", tasks.len());
        println!("{:<8} {:<30} COST", "TASK", "NAME");
        println!("{}", "-".repeat(50));
        for row in &tasks {
            println!("{:<8} {:<30} {}", row.task.to_string(), row.name, row.cost);
        }
    }

    Ok(())
}
