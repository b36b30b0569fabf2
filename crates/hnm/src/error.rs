use std::path::PathBuf;

use thiserror::Error;

/// Listing errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{}: {source}", path.display())]
    Elf {
        path: PathBuf,
        #[source]
        source: hnm_elf::ElfError,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The underlying ELF error, if this failure came from reading a file.
    #[must_use]
    pub const fn elf(&self) -> Option<&hnm_elf::ElfError> {
        match self {
            Self::Elf { source, .. } => Some(source),
            Self::Io(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
