//! ELF header structures.

use std::io::{Read, Seek};

use crate::constants::*;
use crate::reader::{Endian, RawFileReader};
use crate::{ElfError, FormatIssue, Result};

/// File class from `EI_CLASS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElfClass {
    Elf32,
    Elf64,
}

/// Validated identification bytes (`e_ident`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElfIdent {
    pub class: ElfClass,
    pub endian: Endian,
    pub version: u8,
    pub abi: u8,
}

impl ElfIdent {
    /// Validate the identification bytes.
    ///
    /// Only single bytes are inspected here; nothing byte-order dependent is
    /// decoded until this has succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::TruncatedFile`] if fewer than 16 bytes are given,
    /// [`ElfError::UnsupportedFormat`] for a bad magic or class, and
    /// [`ElfError::UnsupportedEndianness`] for an unknown byte order.
    pub fn parse(ident: &[u8]) -> Result<Self> {
        if ident.len() < EI_NIDENT {
            return Err(ElfError::TruncatedFile {
                what: "ELF identification",
                offset: 0,
                len: EI_NIDENT as u64,
                available: ident.len() as u64,
            });
        }

        if ident[..4] != ELF_MAGIC {
            return Err(ElfError::UnsupportedFormat(FormatIssue::BadMagic));
        }

        let class = match ident[EI_CLASS] {
            ELF_CLASS_32 => ElfClass::Elf32,
            ELF_CLASS_64 => ElfClass::Elf64,
            other => return Err(ElfError::UnsupportedFormat(FormatIssue::UnknownClass(other))),
        };

        let endian = match ident[EI_DATA] {
            ELF_DATA_LSB => Endian::Little,
            ELF_DATA_MSB => Endian::Big,
            other => return Err(ElfError::UnsupportedEndianness(other)),
        };

        Ok(Self {
            class,
            endian,
            version: ident[EI_VERSION],
            abi: ident[EI_OSABI],
        })
    }
}

/// ELF32 file header.
#[derive(Clone, Debug)]
pub struct ElfHeader {
    pub ident: ElfIdent,
    pub e_type: u16,
    pub machine: u16,
    pub version: u32,
    pub entry: u32,
    pub phoff: u32,
    pub shoff: u32,
    pub flags: u32,
    pub ehsize: u16,
    pub phentsize: u16,
    pub phnum: u16,
    pub shentsize: u16,
    pub shnum: u16,
    pub shstrndx: u16,
}

impl ElfHeader {
    /// Read and validate the file header.
    ///
    /// The identification bytes are read and validated on their own first;
    /// the rest of the header is only read once the byte order is known.
    ///
    /// # Errors
    ///
    /// Propagates [`ElfIdent::parse`] failures, rejects 64-bit files with
    /// [`ElfError::UnsupportedFormat`], and returns [`ElfError::TruncatedFile`]
    /// if the file is shorter than the header.
    pub fn read<R: Read + Seek>(reader: &mut RawFileReader<R>) -> Result<Self> {
        let ident_bytes = reader.read_at(0, EI_NIDENT as u64, "ELF identification")?;
        let ident = ElfIdent::parse(&ident_bytes)?;

        if ident.class == ElfClass::Elf64 {
            return Err(ElfError::UnsupportedFormat(FormatIssue::Elf64));
        }

        let data = reader.read_at(0, ELF32_HEADER_SIZE as u64, "ELF header")?;
        Ok(Self::parse_fields(ident, &data))
    }

    /// Decode the fields following `e_ident` from a full 52-byte header.
    fn parse_fields(ident: ElfIdent, data: &[u8]) -> Self {
        let e = ident.endian;
        Self {
            e_type: e.read_u16(data, 16),
            machine: e.read_u16(data, 18),
            version: e.read_u32(data, 20),
            entry: e.read_u32(data, 24),
            phoff: e.read_u32(data, 28),
            shoff: e.read_u32(data, 32),
            flags: e.read_u32(data, 36),
            ehsize: e.read_u16(data, 40),
            phentsize: e.read_u16(data, 42),
            phnum: e.read_u16(data, 44),
            shentsize: e.read_u16(data, 46),
            shnum: e.read_u16(data, 48),
            shstrndx: e.read_u16(data, 50),
            ident,
        }
    }
}

/// Section header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionHeader {
    pub name: u32,
    pub sh_type: u32,
    pub flags: u32,
    pub addr: u32,
    pub offset: u32,
    pub size: u32,
    pub link: u32,
    pub info: u32,
    pub addralign: u32,
    pub entsize: u32,
}

impl SectionHeader {
    /// Decode a 40-byte ELF32 section header at `offset`.
    pub(crate) const fn parse(data: &[u8], offset: usize, e: Endian) -> Self {
        Self {
            name: e.read_u32(data, offset),
            sh_type: e.read_u32(data, offset + 4),
            flags: e.read_u32(data, offset + 8),
            addr: e.read_u32(data, offset + 12),
            offset: e.read_u32(data, offset + 16),
            size: e.read_u32(data, offset + 20),
            link: e.read_u32(data, offset + 24),
            info: e.read_u32(data, offset + 28),
            addralign: e.read_u32(data, offset + 32),
            entsize: e.read_u32(data, offset + 36),
        }
    }
}

/// ELF32 symbol table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymbolEntry {
    /// Offset of the name in the linked string table (0 = no name).
    pub name: u32,
    /// Symbol value (address for defined symbols).
    pub value: u32,
    pub size: u32,
    /// Binding in the upper nibble, type in the lower.
    pub info: u8,
    pub other: u8,
    /// Section index, or one of the `SHN_*` pseudo-indices.
    pub shndx: u16,
}

impl SymbolEntry {
    /// Decode a 16-byte ELF32 symbol at `offset`.
    pub(crate) const fn parse(data: &[u8], offset: usize, e: Endian) -> Self {
        Self {
            name: e.read_u32(data, offset),
            value: e.read_u32(data, offset + 4),
            size: e.read_u32(data, offset + 8),
            info: data[offset + 12],
            other: data[offset + 13],
            shndx: e.read_u16(data, offset + 14),
        }
    }

    /// Symbol binding (`STB_LOCAL`, `STB_GLOBAL`, etc.).
    #[must_use]
    pub const fn binding(&self) -> u8 {
        self.info >> 4
    }

    /// Symbol type (`STT_FUNC`, `STT_OBJECT`, etc.).
    #[must_use]
    pub const fn sym_type(&self) -> u8 {
        self.info & 0xf
    }

    /// Whether the symbol appears in a listing at all.
    ///
    /// Unnamed symbols and `STT_FILE` markers are skipped.
    #[must_use]
    pub const fn is_listed(&self) -> bool {
        self.name != 0 && self.sym_type() != STT_FILE
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::test_support::ObjectBuilder;

    fn ident(class: u8, data: u8) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[..4].copy_from_slice(&ELF_MAGIC);
        bytes[EI_CLASS] = class;
        bytes[EI_DATA] = data;
        bytes[EI_VERSION] = ELF_VERSION_CURRENT;
        bytes
    }

    #[test]
    fn test_ident_32_little() {
        let parsed = ElfIdent::parse(&ident(ELF_CLASS_32, ELF_DATA_LSB)).unwrap();
        assert_eq!(parsed.class, ElfClass::Elf32);
        assert_eq!(parsed.endian, Endian::Little);
    }

    #[test]
    fn test_ident_64_big() {
        let parsed = ElfIdent::parse(&ident(ELF_CLASS_64, ELF_DATA_MSB)).unwrap();
        assert_eq!(parsed.class, ElfClass::Elf64);
        assert_eq!(parsed.endian, Endian::Big);
    }

    #[test]
    fn test_ident_unknown_class() {
        let err = ElfIdent::parse(&ident(3, ELF_DATA_LSB)).unwrap_err();
        assert!(matches!(
            err,
            ElfError::UnsupportedFormat(FormatIssue::UnknownClass(3))
        ));
    }

    #[test]
    fn test_ident_unknown_endianness() {
        let err = ElfIdent::parse(&ident(ELF_CLASS_32, 3)).unwrap_err();
        assert!(matches!(err, ElfError::UnsupportedEndianness(3)));
    }

    #[test]
    fn test_ident_bad_magic() {
        let mut bytes = ident(ELF_CLASS_32, ELF_DATA_LSB);
        bytes[1] = b'X';
        let err = ElfIdent::parse(&bytes).unwrap_err();
        assert!(matches!(
            err,
            ElfError::UnsupportedFormat(FormatIssue::BadMagic)
        ));
    }

    #[test]
    fn test_endianness_checked_before_rest_of_header() {
        // Only the identification bytes exist; a valid file would need 52.
        let mut reader = RawFileReader::new(Cursor::new(ident(ELF_CLASS_32, 3).to_vec())).unwrap();
        let err = ElfHeader::read(&mut reader).unwrap_err();
        assert!(matches!(err, ElfError::UnsupportedEndianness(3)));
    }

    #[test]
    fn test_tiny_file_is_truncated() {
        let mut reader = RawFileReader::new(Cursor::new(b"\x7fELF".to_vec())).unwrap();
        let err = ElfHeader::read(&mut reader).unwrap_err();
        assert!(matches!(
            err,
            ElfError::TruncatedFile {
                what: "ELF identification",
                available: 4,
                ..
            }
        ));
    }

    #[test]
    fn test_elf64_detected_and_rejected() {
        let mut reader =
            RawFileReader::new(Cursor::new(ident(ELF_CLASS_64, ELF_DATA_LSB).to_vec())).unwrap();
        let err = ElfHeader::read(&mut reader).unwrap_err();
        assert!(matches!(err, ElfError::UnsupportedFormat(FormatIssue::Elf64)));
    }

    #[test]
    fn test_header_fields_both_byte_orders() {
        for endian in [Endian::Little, Endian::Big] {
            let mut builder = ObjectBuilder::new(endian);
            builder.text_section(8);
            let bytes = builder.build();

            let mut reader = RawFileReader::new(Cursor::new(bytes)).unwrap();
            let header = ElfHeader::read(&mut reader).unwrap();
            assert_eq!(header.ident.endian, endian);
            assert_eq!(header.e_type, ET_REL);
            assert_eq!(header.ehsize as usize, ELF32_HEADER_SIZE);
            assert_eq!(header.shentsize as usize, ELF32_SECTION_HEADER_SIZE);
            // null, .text, .symtab, .strtab, .shstrtab
            assert_eq!(header.shnum, 5);
        }
    }

    #[test]
    fn test_symbol_entry_accessors() {
        let sym = SymbolEntry {
            name: 1,
            value: 0,
            size: 0,
            info: st_info(STB_WEAK, STT_OBJECT),
            other: 0,
            shndx: 1,
        };
        assert_eq!(sym.binding(), STB_WEAK);
        assert_eq!(sym.sym_type(), STT_OBJECT);
        assert!(sym.is_listed());

        let file = SymbolEntry {
            info: st_info(STB_LOCAL, STT_FILE),
            ..sym
        };
        assert!(!file.is_listed());

        let unnamed = SymbolEntry { name: 0, ..sym };
        assert!(!unnamed.is_listed());
    }
}
