//! `nm`-style line output.

use std::io::{self, Write};

use crate::classify::SymbolRecord;
use crate::symtab::SymbolTable;

/// Writes one line per listed symbol, in symbol table order.
///
/// Lines are `%08x T name`, with nine spaces in place of the address for
/// `U` and `w` symbols. Names are written byte-for-byte.
pub struct SymbolTableFormatter<W> {
    out: W,
    prefix: Option<Vec<u8>>,
}

impl<W: Write> SymbolTableFormatter<W> {
    pub const fn new(out: W) -> Self {
        Self { out, prefix: None }
    }

    /// Start every line with `<prefix>: ` (the file name, as `nm -A` does).
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Write a single record.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn write_record(&mut self, record: &SymbolRecord<'_>) -> io::Result<()> {
        if let Some(prefix) = &self.prefix {
            self.out.write_all(prefix)?;
            self.out.write_all(b": ")?;
        }
        match record.address {
            Some(address) => write!(self.out, "{address:08x} {} ", record.kind)?,
            None => write!(self.out, "         {} ", record.kind)?,
        }
        self.out.write_all(record.name)?;
        self.out.write_all(b"\n")
    }

    /// Write every listed symbol of `table` and return the line count.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn write_table(&mut self, table: &SymbolTable) -> io::Result<usize> {
        let mut lines = 0;
        for record in table.records() {
            self.write_record(&record)?;
            lines += 1;
        }
        Ok(lines)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::constants::*;
    use crate::reader::{Endian, RawFileReader};
    use crate::test_support::ObjectBuilder;

    fn render(bytes: Vec<u8>) -> String {
        let mut reader = RawFileReader::new(Cursor::new(bytes)).unwrap();
        let table = SymbolTable::load(&mut reader).unwrap();
        let mut formatter = SymbolTableFormatter::new(Vec::new());
        formatter.write_table(&table).unwrap();
        String::from_utf8(formatter.into_inner()).unwrap()
    }

    #[test]
    fn test_global_text_symbol() {
        let mut builder = ObjectBuilder::new(Endian::Little);
        let text = builder.text_section(32);
        builder.symbol("main", 0xdead_beef, st_info(STB_GLOBAL, STT_FUNC), text);
        assert_eq!(render(builder.build()), "deadbeef T main\n");
    }

    #[test]
    fn test_mixed_listing_keeps_table_order() {
        let mut builder = ObjectBuilder::new(Endian::Big);
        let text = builder.text_section(32);
        let data = builder.data_section(8);
        let bss = builder.bss_section(8);
        let rodata = builder.rodata_section(8);
        builder.symbol("hello.c", 0, st_info(STB_LOCAL, STT_FILE), SHN_ABS);
        builder.symbol("zeta", 0x20, st_info(STB_GLOBAL, STT_FUNC), text);
        builder.symbol("counter", 0, st_info(STB_LOCAL, STT_OBJECT), bss);
        builder.symbol("table", 4, st_info(STB_GLOBAL, STT_OBJECT), data);
        builder.symbol("banner", 0, st_info(STB_GLOBAL, STT_OBJECT), rodata);
        builder.symbol("printf", 0, st_info(STB_GLOBAL, STT_NOTYPE), SHN_UNDEF);
        builder.symbol("__gmon_start__", 0, st_info(STB_WEAK, STT_NOTYPE), SHN_UNDEF);
        builder.symbol("buf", 16, st_info(STB_GLOBAL, STT_OBJECT), SHN_COMMON);
        builder.symbol("alpha", 0, st_info(STB_LOCAL, STT_FUNC), text);
        builder.section_symbol(text);

        let expected = "\
00000020 T zeta
00000000 b counter
00000004 D table
00000000 R banner
         U printf
         w __gmon_start__
00000010 C buf
00000000 t alpha
";
        assert_eq!(render(builder.build()), expected);
    }

    #[test]
    fn test_local_undefined_prints_address() {
        let mut builder = ObjectBuilder::new(Endian::Little);
        builder.text_section(4);
        builder.symbol("stale", 0x1234, st_info(STB_LOCAL, STT_NOTYPE), SHN_UNDEF);
        builder.symbol("puts", 0x99, st_info(STB_GLOBAL, STT_NOTYPE), SHN_UNDEF);
        assert_eq!(render(builder.build()), "00001234 u stale\n         U puts\n");
    }

    #[test]
    fn test_prefix() {
        let mut builder = ObjectBuilder::new(Endian::Little);
        let text = builder.text_section(4);
        builder.symbol("f", 1, st_info(STB_GLOBAL, STT_FUNC), text);
        builder.symbol("g", 0, st_info(STB_GLOBAL, STT_FUNC), SHN_UNDEF);

        let mut reader = RawFileReader::new(Cursor::new(builder.build())).unwrap();
        let table = SymbolTable::load(&mut reader).unwrap();
        let mut formatter = SymbolTableFormatter::new(Vec::new()).with_prefix("obj.o");
        assert_eq!(formatter.write_table(&table).unwrap(), 2);
        assert_eq!(
            String::from_utf8(formatter.into_inner()).unwrap(),
            "obj.o: 00000001 T f\nobj.o:          U g\n"
        );
    }

    #[test]
    fn test_non_utf8_name_written_verbatim() {
        let table = SymbolTable::from_parts(
            crate::section::SectionHeaderTable::default(),
            vec![crate::header::SymbolEntry {
                name: 1,
                value: 0,
                size: 0,
                info: st_info(STB_GLOBAL, STT_NOTYPE),
                other: 0,
                shndx: SHN_UNDEF,
            }],
            crate::symtab::StringTable::new(b"\0caf\xe9\0".to_vec()),
        );
        let mut formatter = SymbolTableFormatter::new(Vec::new());
        formatter.write_table(&table).unwrap();
        assert_eq!(formatter.into_inner(), b"         U caf\xe9\n");
    }

    #[test]
    fn test_output_is_repeatable() {
        let mut builder = ObjectBuilder::new(Endian::Little);
        let text = builder.text_section(16);
        let data = builder.data_section(16);
        builder.symbol("a", 1, st_info(STB_GLOBAL, STT_FUNC), text);
        builder.symbol("b", 2, st_info(STB_WEAK, STT_OBJECT), data);
        builder.symbol("c", 3, st_info(STB_LOCAL, STT_NOTYPE), SHN_ABS);
        let bytes = builder.build();
        assert_eq!(render(bytes.clone()), render(bytes));
    }
}
