//! # Command-Line Interface
//!
//! The `htnh` driver: loads a grounded problem, runs a heuristic on it and
//! prints the result.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `estimate` | Initialize and print the initial estimate with diagnostics |
//! | `evaluate` | Score one search node given by `--network` and `--state` |
//! | `costs` | Print the converged fact and task cost tables |
//! | `model` | Validate a problem file and print its size |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON, unreachable costs as `null`
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for progress messages and debug logs:
//! ```bash
//! htnh --verbose estimate problem.json
//! ```
//!
//! Without it, log output is controlled by `RUST_LOG` and defaults to `warn`.
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod heuristic_cmd;
mod model_cmd;
mod output;

pub use app::{run, Cli, Commands, HeuristicArgs};
pub use output::{Output, OutputFormat};
