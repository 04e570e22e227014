//! # Storage Layer
//!
//! Loading of grounded problems and configuration.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Grounded problem | JSON | any path given on the command line |
//! | Heuristic settings | TOML | `htnh.toml` in the working directory or a parent |
//! | User preferences | TOML | `~/.config/htnh/config.toml` |
//!
//! Nothing computed by the heuristics is ever written back; every run
//! rebuilds its tables from the problem file.
//!
//! ## Key Types
//!
//! - [`ProblemStore`] - Read a grounded problem from JSON
//! - [`Config`] - Project and global configuration

mod config;
mod problem_file;

pub use config::{
    Config, ConfigError, DelRelaxConfig, GlobalConfig, HeuristicsConfig, OutputFormat,
    UnreachableMode, PROJECT_CONFIG_FILE,
};
pub use problem_file::{
    AbstractTaskRecord, MethodRecord, OperatorRecord, ProblemFile, ProblemStore,
};
