//! Main binary entry point for the `chainlint` static analysis tool.
//!
//! This binary simply delegates to the shared `cli::run_with_args()` function
//! so the CLI behaves identically when driven from tests.

use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match chainlint::cli::run_with_args(args) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(err) => {
            eprintln!("chainlint error: {err}");
            ExitCode::from(2)
        }
    }
}
