//! Task networks and search nodes
//!
//! A search node pairs a state with the task network still to be decomposed.
//! Nodes belong to the search layer; heuristics only read them.

use serde::{Deserialize, Serialize};

use super::bitset::BitSet;
use super::id::TaskId;

/// Ordered sequence of tasks still to be achieved
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskNetwork(Vec<TaskId>);

impl TaskNetwork {
    pub fn new(tasks: Vec<TaskId>) -> Self {
        Self(tasks)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[TaskId] {
        &self.0
    }
}

impl FromIterator<TaskId> for TaskNetwork {
    fn from_iter<I: IntoIterator<Item = TaskId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A plan state handed to the heuristics by the search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchNode {
    pub state: BitSet,
    pub task_network: TaskNetwork,
}

impl SearchNode {
    pub fn new(state: BitSet, task_network: TaskNetwork) -> Self {
        Self {
            state,
            task_network,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_from_iterator() {
        let network: TaskNetwork = [1, 2, 3].into_iter().map(TaskId::new).collect();
        assert_eq!(network.len(), 3);
        assert!(!network.is_empty());
        assert_eq!(
            network.iter().collect::<Vec<_>>(),
            vec![TaskId::new(1), TaskId::new(2), TaskId::new(3)]
        );
    }

    #[test]
    fn empty_network() {
        let network = TaskNetwork::default();
        assert!(network.is_empty());
        assert_eq!(network.iter().count(), 0);
    }

    #[test]
    fn network_serializes_as_list() {
        let network = TaskNetwork::new(vec![TaskId::new(4), TaskId::new(0)]);
        assert_eq!(serde_json::to_string(&network).unwrap(), "[4,0]");
    }
}
