//! Section header table and symbol table lookup.

use std::io::{Read, Seek};
use std::ops::Index;

use tracing::debug;

use crate::constants::*;
use crate::header::{ElfHeader, SectionHeader};
use crate::reader::RawFileReader;
use crate::{ElfError, FormatIssue, Result};

/// All section headers of a file, in file order.
///
/// A section's index is its position in the table.
#[derive(Clone, Debug, Default)]
pub struct SectionHeaderTable {
    sections: Vec<SectionHeader>,
}

/// Indices of the symbol table and the string table holding its names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymbolTableLocation {
    pub symtab: usize,
    pub strtab: usize,
}

impl SectionHeaderTable {
    /// Read the section header table described by `header`.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::UnsupportedFormat`] if `e_shentsize` is smaller
    /// than an ELF32 section header, [`ElfError::TruncatedFile`] if the file
    /// is shorter than the declared table, and [`ElfError::AllocationError`]
    /// if the table buffer cannot be obtained.
    pub fn read<R: Read + Seek>(reader: &mut RawFileReader<R>, header: &ElfHeader) -> Result<Self> {
        let count = usize::from(header.shnum);
        if count == 0 {
            return Ok(Self::default());
        }

        let stride = usize::from(header.shentsize);
        if stride < ELF32_SECTION_HEADER_SIZE {
            return Err(ElfError::UnsupportedFormat(FormatIssue::SectionEntrySize(
                header.shentsize,
            )));
        }

        let table_size = u64::from(header.shentsize) * u64::from(header.shnum);
        let data = reader.read_at(u64::from(header.shoff), table_size, "section headers")?;

        let endian = header.ident.endian;
        let sections = (0..count)
            .map(|i| SectionHeader::parse(&data, i * stride, endian))
            .collect();

        Ok(Self { sections })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Section header at `index`, if the file has one.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&SectionHeader> {
        self.sections.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SectionHeader> {
        self.sections.iter()
    }

    /// Find the symbol table and its linked string table.
    ///
    /// The first `SHT_SYMTAB` section in table order is used; later ones are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::NoSymbols`] if there is no symbol table and
    /// [`ElfError::MalformedSectionLink`] if its `sh_link` is out of range.
    pub fn locate_symbol_table(&self) -> Result<SymbolTableLocation> {
        let symtab = self
            .sections
            .iter()
            .position(|s| s.sh_type == SHT_SYMTAB)
            .ok_or(ElfError::NoSymbols)?;

        let link = self.sections[symtab].link;
        let strtab = usize::try_from(link)
            .ok()
            .filter(|&idx| idx < self.sections.len())
            .ok_or(ElfError::MalformedSectionLink {
                link,
                count: self.sections.len(),
            })?;

        debug!(symtab, strtab, "located symbol table");
        Ok(SymbolTableLocation { symtab, strtab })
    }
}

impl Index<usize> for SectionHeaderTable {
    type Output = SectionHeader;

    fn index(&self, index: usize) -> &SectionHeader {
        &self.sections[index]
    }
}

impl From<Vec<SectionHeader>> for SectionHeaderTable {
    fn from(sections: Vec<SectionHeader>) -> Self {
        Self { sections }
    }
}
