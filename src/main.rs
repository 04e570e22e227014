//! htnh - heuristic estimates for grounded HTN problems

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = htn_heuristics::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
