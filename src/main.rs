//! # media-sieve CLI
//!
//! ## Usage
//! ```bash
//! media-sieve dedupe ~/Photos ~/Photos-clean --threshold 5
//! media-sieve upload --dir ~/Photos --bucket-dir /srv/bucket --dedupe
//! media-sieve favicon logo.png --output site/favicon.ico
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
