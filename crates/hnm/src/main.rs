//! hnm CLI - list symbols from ELF32 object files

mod cli;

use std::io::{self, Write};

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use cli::{Cli, EXIT_FAILURE, EXIT_SUCCESS};

fn main() {
    let cli = Cli::parse();

    let level = cli.log_level();
    let mut filter = EnvFilter::from_default_env();
    for directive in [format!("hnm={level}"), format!("hnm_elf={level}")] {
        match directive.parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("invalid log directive {directive}: {e}"),
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let paths = cli.inputs();
    let options = cli.options();
    let tool = cli::tool_name();

    let mut stdout = io::stdout().lock();
    // Not locked: worker threads log to stderr while files are decoded.
    let mut stderr = io::stderr();
    let exit_code = match hnm::run(&tool, &paths, &options, &mut stdout, &mut stderr) {
        Ok(0) => EXIT_SUCCESS,
        Ok(_) => EXIT_FAILURE,
        Err(e) => {
            error!(error = %e, "failed to write output");
            EXIT_FAILURE
        }
    };

    if let Err(e) = stdout.flush() {
        error!(error = %e, "failed to flush stdout");
        std::process::exit(EXIT_FAILURE);
    }
    std::process::exit(exit_code);
}
