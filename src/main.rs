//! # snaptidy CLI
//!
//! Command-line interface for the snaptidy engine.
//!
//! ## Usage
//! ```bash
//! snaptidy dedup --path ~/Photos --logging
//! snaptidy organize --path ~/Photos --date-format yearmonth --output-format json
//! ```

mod cli;

use console::style;
use std::process::ExitCode;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
