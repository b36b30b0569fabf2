//! Symbol table and string table loading.

use std::io::{Read, Seek};
use std::path::Path;

use tracing::{debug, debug_span};

use crate::classify::{SymbolRecord, classify};
use crate::constants::ELF32_SYMBOL_SIZE;
use crate::header::{ElfHeader, SectionHeader, SymbolEntry};
use crate::reader::{Endian, RawFileReader};
use crate::section::SectionHeaderTable;
use crate::Result;

/// Nul-terminated names referenced by `st_name`.
#[derive(Clone, Debug, Default)]
pub struct StringTable {
    data: Vec<u8>,
}

impl StringTable {
    #[must_use]
    pub const fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Name starting at `offset`, without its terminator.
    ///
    /// A name missing its terminator runs to the end of the table; an offset
    /// past the end yields an empty name.
    #[must_use]
    pub fn get(&self, offset: u32) -> &[u8] {
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        let Some(tail) = self.data.get(start..) else {
            return &[];
        };
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        &tail[..end]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Everything needed to list the symbols of one file.
///
/// Owns the section header table, the decoded symbol entries, and the string
/// table; dropping it releases all of them.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    sections: SectionHeaderTable,
    symbols: Vec<SymbolEntry>,
    strings: StringTable,
}

impl SymbolTable {
    /// Open `path` and load its symbol table.
    ///
    /// # Errors
    ///
    /// Returns any [`ElfError`](crate::ElfError) raised while opening,
    /// validating, or reading the file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let _span = debug_span!("load", path = %path.display()).entered();
        let mut reader = RawFileReader::open(path)?;
        Self::load(&mut reader)
    }

    /// Load the symbol table from an already opened source.
    ///
    /// # Errors
    ///
    /// Returns the first error hit by header validation, section table
    /// loading, symbol table lookup, or table reads.
    pub fn load<R: Read + Seek>(reader: &mut RawFileReader<R>) -> Result<Self> {
        let header = ElfHeader::read(reader)?;
        let sections = SectionHeaderTable::read(reader, &header)?;
        let location = sections.locate_symbol_table()?;

        let endian = header.ident.endian;
        let symbols = read_symbols(reader, &sections[location.symtab], endian)?;
        let strings = read_strings(reader, &sections[location.strtab])?;

        debug!(
            sections = sections.len(),
            symbols = symbols.len(),
            strtab_bytes = strings.len(),
            "loaded symbol table"
        );

        Ok(Self {
            sections,
            symbols,
            strings,
        })
    }

    /// Assemble a table from already decoded parts.
    #[must_use]
    pub const fn from_parts(
        sections: SectionHeaderTable,
        symbols: Vec<SymbolEntry>,
        strings: StringTable,
    ) -> Self {
        Self {
            sections,
            symbols,
            strings,
        }
    }

    #[must_use]
    pub const fn sections(&self) -> &SectionHeaderTable {
        &self.sections
    }

    /// Every entry, in table order, including the ones a listing skips.
    #[must_use]
    pub fn symbols(&self) -> &[SymbolEntry] {
        &self.symbols
    }

    #[must_use]
    pub const fn strings(&self) -> &StringTable {
        &self.strings
    }

    /// Classified records for every listed symbol, in table order.
    pub fn records(&self) -> impl Iterator<Item = SymbolRecord<'_>> {
        self.symbols
            .iter()
            .filter(|sym| sym.is_listed())
            .map(|sym| {
                let kind = classify(sym, &self.sections);
                SymbolRecord::new(sym, kind, self.strings.get(sym.name))
            })
    }
}

/// Read and decode the symbol entries of `symtab`.
///
/// Bytes past the last whole 16-byte entry are ignored.
fn read_symbols<R: Read + Seek>(
    reader: &mut RawFileReader<R>,
    symtab: &SectionHeader,
    endian: Endian,
) -> Result<Vec<SymbolEntry>> {
    let data = reader.read_at(u64::from(symtab.offset), u64::from(symtab.size), "symbol table")?;

    let count = data.len() / ELF32_SYMBOL_SIZE;
    let trailing = data.len() % ELF32_SYMBOL_SIZE;
    if trailing != 0 {
        debug!(
            size = data.len(),
            trailing,
            "ignoring partial entry at end of symbol table"
        );
    }

    Ok((0..count)
        .map(|i| SymbolEntry::parse(&data, i * ELF32_SYMBOL_SIZE, endian))
        .collect())
}

fn read_strings<R: Read + Seek>(
    reader: &mut RawFileReader<R>,
    strtab: &SectionHeader,
) -> Result<StringTable> {
    let data = reader.read_at(u64::from(strtab.offset), u64::from(strtab.size), "string table")?;
    Ok(StringTable::new(data))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::ElfError;
    use crate::constants::*;
    use crate::test_support::ObjectBuilder;

    fn load(bytes: Vec<u8>) -> Result<SymbolTable> {
        let mut reader = RawFileReader::new(Cursor::new(bytes))?;
        SymbolTable::load(&mut reader)
    }

    #[test]
    fn test_string_table_lookup() {
        let strings = StringTable::new(b"\0main\0_start\0tail".to_vec());
        assert_eq!(strings.get(0), b"");
        assert_eq!(strings.get(1), b"main");
        assert_eq!(strings.get(3), b"in");
        assert_eq!(strings.get(6), b"_start");
        assert_eq!(strings.get(13), b"tail");
        assert_eq!(strings.get(100), b"");
    }

    #[test]
    fn test_load_symbols_both_byte_orders() {
        for endian in [Endian::Little, Endian::Big] {
            let mut builder = ObjectBuilder::new(endian);
            let text = builder.text_section(16);
            builder.symbol("main", 0x1234, st_info(STB_GLOBAL, STT_FUNC), text);
            builder.symbol("puts", 0, st_info(STB_GLOBAL, STT_NOTYPE), SHN_UNDEF);

            let table = load(builder.build()).unwrap();
            // Null entry plus the two added.
            assert_eq!(table.symbols().len(), 3);
            let main = table.symbols()[1];
            assert_eq!(main.value, 0x1234);
            assert_eq!(main.shndx, text);
            assert_eq!(table.strings().get(main.name), b"main");
        }
    }

    #[test]
    fn test_partial_trailing_entry_is_dropped() {
        let mut builder = ObjectBuilder::new(Endian::Little);
        let text = builder.text_section(16);
        builder.symbol("main", 0x10, st_info(STB_GLOBAL, STT_FUNC), text);
        builder.symtab_trailing_bytes(7);

        let table = load(builder.build()).unwrap();
        assert_eq!(table.symbols().len(), 2);
        let names: Vec<&[u8]> = table.records().map(|r| r.name).collect();
        assert_eq!(names, [b"main".as_slice()]);
    }

    #[test]
    fn test_no_symbol_table() {
        let mut builder = ObjectBuilder::new(Endian::Little);
        builder.text_section(16);
        builder.without_symbol_table();
        assert!(matches!(load(builder.build()), Err(ElfError::NoSymbols)));
    }

    #[test]
    fn test_symtab_link_out_of_range() {
        let mut builder = ObjectBuilder::new(Endian::Little);
        builder.text_section(16);
        builder.symtab_link(99);
        assert!(matches!(
            load(builder.build()),
            Err(ElfError::MalformedSectionLink { link: 99, .. })
        ));
    }

    #[test]
    fn test_symtab_past_end_of_file() {
        let mut builder = ObjectBuilder::new(Endian::Big);
        let text = builder.text_section(16);
        builder.symbol("main", 0, st_info(STB_GLOBAL, STT_FUNC), text);
        builder.symtab_size(0x10_0000);
        assert!(matches!(
            load(builder.build()),
            Err(ElfError::TruncatedFile {
                what: "symbol table",
                len: 0x10_0000,
                ..
            })
        ));
    }

    #[test]
    fn test_open_reports_missing_file() {
        assert!(matches!(
            SymbolTable::open("/nonexistent/hnm/missing.o"),
            Err(ElfError::OpenFailure(_))
        ));
    }
}
