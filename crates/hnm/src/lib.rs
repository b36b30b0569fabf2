//! hnm - list the symbols of ELF32 object files.
//!
//! Each input path is handled on its own: a failure is reported as one
//! diagnostic line and the next path is still processed. Listings and
//! diagnostics always come out in command-line order, even when files are
//! decoded in parallel.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//!
//! let paths = [PathBuf::from("main.o")];
//! let _failures = hnm::run(
//!     "hnm",
//!     &paths,
//!     &hnm::Options::default(),
//!     &mut std::io::stdout().lock(),
//!     &mut std::io::stderr().lock(),
//! )?;
//! # Ok::<(), std::io::Error>(())
//! ```

mod error;

pub use error::{Error, Result};

use std::error::Error as _;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use hnm_elf::{SymbolTable, SymbolTableFormatter};
use rayon::prelude::*;
use tracing::{debug, debug_span, warn};

/// Input used when no path is given.
pub const DEFAULT_INPUT: &str = "a.out";

/// Listing options.
#[derive(Clone, Debug)]
pub struct Options {
    /// Prefix every line with the input path.
    pub print_file_name: bool,
    /// Files decoded concurrently (0 = one per CPU).
    pub jobs: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            print_file_name: false,
            jobs: 1,
        }
    }
}

impl Options {
    fn job_count(&self) -> usize {
        if self.jobs == 0 {
            num_cpus::get()
        } else {
            self.jobs
        }
    }
}

/// Render the listing of one file into a buffer.
///
/// Nothing is rendered unless the whole symbol table loaded, so a failing
/// file contributes no output lines.
///
/// # Errors
///
/// Returns [`Error::Elf`] with the path attached if the file cannot be read.
pub fn list_file(path: &Path, options: &Options) -> Result<Vec<u8>> {
    let table = SymbolTable::open(path).map_err(|source| Error::Elf {
        path: path.to_path_buf(),
        source,
    })?;

    let mut formatter = SymbolTableFormatter::new(Vec::new());
    if options.print_file_name {
        formatter = formatter.with_prefix(path.as_os_str().as_encoded_bytes());
    }
    let lines = formatter.write_table(&table)?;
    debug!(path = %path.display(), lines, "listed symbols");

    Ok(formatter.into_inner())
}

/// List every path, writing listings to `out` and diagnostics to `err`.
///
/// Diagnostics have the form `<tool>: <path>: <message>`. Returns the number
/// of paths that failed.
///
/// # Errors
///
/// Only failures to write to `out` or `err` are returned; per-file errors are
/// reported and counted.
pub fn run<W: Write, E: Write>(
    tool: &str,
    paths: &[PathBuf],
    options: &Options,
    out: &mut W,
    err: &mut E,
) -> io::Result<usize> {
    let jobs = options.job_count().min(paths.len()).max(1);
    let _span = debug_span!("run", files = paths.len(), jobs).entered();

    if jobs == 1 {
        let mut failures = 0;
        for path in paths {
            failures += usize::from(!emit(tool, list_file(path, options), out, err)?);
        }
        return Ok(failures);
    }

    let results = match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
        Ok(pool) => pool.install(|| {
            paths
                .par_iter()
                .map(|path| list_file(path, options))
                .collect::<Vec<_>>()
        }),
        Err(e) => {
            warn!(error = %e, "failed to start worker pool, listing sequentially");
            paths.iter().map(|path| list_file(path, options)).collect()
        }
    };

    let mut failures = 0;
    for result in results {
        failures += usize::from(!emit(tool, result, out, err)?);
    }
    Ok(failures)
}

/// Write one file's listing or diagnostic. Returns whether it succeeded.
fn emit<W: Write, E: Write>(
    tool: &str,
    result: Result<Vec<u8>>,
    out: &mut W,
    err: &mut E,
) -> io::Result<bool> {
    match result {
        Ok(listing) => {
            out.write_all(&listing)?;
            Ok(true)
        }
        Err(e) => {
            if let Some(cause) = e.elf().and_then(|elf| elf.source()) {
                debug!(cause = %cause, "{e}");
            }
            writeln!(err, "{tool}: {e}")?;
            Ok(false)
        }
    }
}
