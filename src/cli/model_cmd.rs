//! Model inspection command

use std::path::Path;

use anyhow::Result;

use super::output::Output;
use crate::domain::TaskKind;
use crate::storage::ProblemStore;

/// Validates a problem file and prints its size
pub fn show(output: &Output, path: &Path) -> Result<()> {
    let problem = ProblemStore::new(path).load()?;

    let initial_facts = problem.initial_state().count_ones();
    let network = problem.initial_task_network();
    let unknown = network
        .iter()
        .filter(|task| problem.task_kind(*task).is_none())
        .count();
    let primitive = network
        .iter()
        .filter(|task| matches!(problem.task_kind(*task), Some(TaskKind::Primitive(_))))
        .count();

    if output.is_json() {
        output.data(&serde_json::json!({
            "facts": problem.fact_count(),
            "operators": problem.operators().len(),
            "abstract_tasks": problem.abstract_tasks().len(),
            "methods": problem.methods().len(),
            "initial_state_facts": initial_facts,
            "initial_task_network": network,
        }));
    } else {
        println!("Problem: {}", path.display());
        output.row(&["Facts:", &problem.fact_count().to_string()]);
        output.row(&["Operators:", &problem.operators().len().to_string()]);
        output.row(&["Abstract tasks:", &problem.abstract_tasks().len().to_string()]);
        output.row(&["Methods:", &problem.methods().len().to_string()]);
        output.row(&["Initial facts:", &initial_facts.to_string()]);
        output.row(&[
            "Initial network:",
            &format!(
                "{} tasks ({} primitive, {} compound)",
                network.len(),
                primitive,
                network.len() - primitive - unknown
            ),
        ]);
        if unknown > 0 {
            output.row(&["Unknown tasks:", &unknown.to_string()]);
        }
    }

    Ok(())
}
