//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::Parser;

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "hnm")]
#[command(about = "List symbols from ELF32 object files")]
#[command(version)]
pub struct Cli {
    /// Object files to list (default: a.out)
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Prefix each line with the name of the input file
    #[arg(short = 'A', long)]
    pub print_file_name: bool,

    /// Number of files decoded in parallel (0 = auto)
    #[arg(short = 'j', long, default_value = "1")]
    pub jobs: usize,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress log output (only show errors)
    #[arg(short, long, conflicts_with = "verbose")]
    pub silent: bool,
}

impl Cli {
    /// Input paths, falling back to `a.out`.
    pub fn inputs(&self) -> Vec<PathBuf> {
        if self.files.is_empty() {
            vec![PathBuf::from(hnm::DEFAULT_INPUT)]
        } else {
            self.files.clone()
        }
    }

    pub const fn options(&self) -> hnm::Options {
        hnm::Options {
            print_file_name: self.print_file_name,
            jobs: self.jobs,
        }
    }

    /// Default log filter for this invocation.
    pub const fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.silent {
            "error"
        } else {
            "warn"
        }
    }
}

/// Name used to prefix diagnostics: the program as invoked.
pub fn tool_name() -> String {
    std::env::args_os()
        .next()
        .map_or_else(|| "hnm".to_string(), |arg0| arg0.to_string_lossy().into_owned())
}
