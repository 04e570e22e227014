//! Identifiers for grounded facts and tasks
//!
//! Facts are dense indices `0..F`. Operators and abstract tasks share one
//! global task id space: every id names exactly one primitive or compound
//! task. Task ids display as `t{n}`, but the bare number is accepted when
//! parsing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Index of a ground fact
pub type FactId = usize;

/// Index of a decomposition method within its problem
pub type MethodId = usize;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid task ID format: expected 't{{number}}' or '{{number}}', got '{0}'")]
    InvalidTaskId(String),
}

/// Global id of an operator or abstract task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u32);

impl TaskId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the numeric value of the id
    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for TaskId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s.strip_prefix('t').unwrap_or(s);

        digits
            .parse::<u32>()
            .map(Self)
            .map_err(|_| IdError::InvalidTaskId(s.to_string()))
    }
}
