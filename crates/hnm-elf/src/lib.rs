//! ELF32 symbol table reader for an `nm`-style listing.
//!
//! The pipeline runs strictly in order for one file: open the source, validate
//! the identification bytes, load the section header table, locate the symbol
//! table and its string table, then classify and format every symbol.
//!
//! ```no_run
//! use hnm_elf::{SymbolTable, SymbolTableFormatter};
//!
//! let table = SymbolTable::open("a.out")?;
//! let mut out = std::io::stdout().lock();
//! SymbolTableFormatter::new(&mut out).write_table(&table)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod classify;
mod constants;
mod format;
mod header;
mod reader;
mod section;
mod symtab;
pub mod test_support;

pub use classify::*;
pub use constants::*;
pub use format::*;
pub use header::*;
pub use reader::*;
pub use section::*;
pub use symtab::*;

use std::fmt;
use std::io;

use thiserror::Error;

/// ELF parsing errors.
#[derive(Error, Debug)]
pub enum ElfError {
    #[error("failed to open file")]
    OpenFailure(#[source] io::Error),
    #[error("unsupported ELF file format: {0}")]
    UnsupportedFormat(FormatIssue),
    #[error("unsupported ELF file endianness (EI_DATA = {0:#04x})")]
    UnsupportedEndianness(u8),
    #[error("file truncated: {what} needs {len} bytes at offset {offset:#x}, file is {available} bytes")]
    TruncatedFile {
        what: &'static str,
        offset: u64,
        len: u64,
        available: u64,
    },
    #[error("memory allocation error for {what} ({len} bytes)")]
    AllocationError { what: &'static str, len: u64 },
    #[error("no symbols")]
    NoSymbols,
    #[error("symbol table links to section {link}, but the file has {count} sections")]
    MalformedSectionLink { link: u32, count: usize },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Why a file was rejected as [`ElfError::UnsupportedFormat`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatIssue {
    /// The first four bytes are not `\x7fELF`.
    BadMagic,
    /// `EI_CLASS` is neither 32- nor 64-bit.
    UnknownClass(u8),
    /// 64-bit objects are recognized but not listed.
    Elf64,
    /// `e_shentsize` cannot hold an ELF32 section header.
    SectionEntrySize(u16),
}

impl fmt::Display for FormatIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadMagic => f.write_str("not an ELF file"),
            Self::UnknownClass(class) => write!(f, "unknown class {class}"),
            Self::Elf64 => f.write_str("64-bit symbol tables are not supported"),
            Self::SectionEntrySize(size) => {
                write!(f, "section header entry size {size} is too small")
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ElfError>;
