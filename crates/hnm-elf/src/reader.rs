//! Bounded reads from a seekable source.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::{ElfError, Result};

/// Byte order of every multi-byte field after `e_ident`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Read a u16 at `offset`. The caller guarantees the bytes are in range.
    #[inline]
    #[must_use]
    pub const fn read_u16(self, data: &[u8], offset: usize) -> u16 {
        let bytes = [data[offset], data[offset + 1]];
        match self {
            Self::Little => u16::from_le_bytes(bytes),
            Self::Big => u16::from_be_bytes(bytes),
        }
    }

    /// Read a u32 at `offset`. The caller guarantees the bytes are in range.
    #[inline]
    #[must_use]
    pub const fn read_u32(self, data: &[u8], offset: usize) -> u32 {
        let bytes = [
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ];
        match self {
            Self::Little => u32::from_le_bytes(bytes),
            Self::Big => u32::from_be_bytes(bytes),
        }
    }
}

/// Seekable byte source with length-checked reads.
///
/// The source length is taken once at construction; every read is checked
/// against it before a buffer is allocated, so a bogus size in a header can
/// neither over-allocate nor read past the end.
#[derive(Debug)]
pub struct RawFileReader<R> {
    inner: R,
    len: u64,
}

impl RawFileReader<File> {
    /// Open a file for reading.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::OpenFailure`] if the path cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref()).map_err(ElfError::OpenFailure)?;
        Self::new(file)
    }
}

impl<R: Read + Seek> RawFileReader<R> {
    /// Wrap a source, measuring its length.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::Io`] if the source cannot be seeked.
    pub fn new(mut inner: R) -> Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        Ok(Self { inner, len })
    }

    /// Total length of the source in bytes.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// `what` names the structure being read for error reporting.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::TruncatedFile`] if the range extends past the end
    /// of the source, [`ElfError::AllocationError`] if the buffer cannot be
    /// reserved, and [`ElfError::Io`] for any other read failure.
    pub fn read_at(&mut self, offset: u64, len: u64, what: &'static str) -> Result<Vec<u8>> {
        let available = self.len;
        let truncated = || ElfError::TruncatedFile {
            what,
            offset,
            len,
            available,
        };

        match offset.checked_add(len) {
            Some(end) if end <= available => {}
            _ => return Err(truncated()),
        }

        let size = usize::try_from(len).map_err(|_| ElfError::AllocationError { what, len })?;
        let mut buf = Vec::new();
        buf.try_reserve_exact(size)
            .map_err(|_| ElfError::AllocationError { what, len })?;
        buf.resize(size, 0);

        self.inner.seek(SeekFrom::Start(offset))?;
        self.inner.read_exact(&mut buf).map_err(|e| {
            // The source shrank after it was measured.
            if e.kind() == io::ErrorKind::UnexpectedEof {
                truncated()
            } else {
                ElfError::Io(e)
            }
        })?;

        Ok(buf)
    }
}
