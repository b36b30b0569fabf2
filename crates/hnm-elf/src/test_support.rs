//! Synthetic ELF32 relocatable objects for tests.
//!
//! Produces minimal but well-formed objects in either byte order, plus a few
//! knobs for breaking them in specific ways. Layout is the ELF header, section
//! contents, `.symtab`, `.strtab`, `.shstrtab`, then the section header table.

use rustc_hash::FxHashMap;

use crate::constants::*;
use crate::header::{SectionHeader, SymbolEntry};
use crate::reader::Endian;

const EM_386: u16 = 3;

/// Deduplicating string table; offset 0 is the empty name.
struct Strings {
    data: Vec<u8>,
    offsets: FxHashMap<String, u32>,
}

impl Strings {
    fn new() -> Self {
        Self {
            data: vec![0],
            offsets: FxHashMap::default(),
        }
    }

    fn add(&mut self, s: &str) -> u32 {
        if let Some(&offset) = self.offsets.get(s) {
            return offset;
        }
        let offset = to_u32(self.data.len());
        self.offsets.insert(s.to_string(), offset);
        self.data.extend_from_slice(s.as_bytes());
        self.data.push(0);
        offset
    }
}

struct UserSection {
    name: String,
    sh_type: u32,
    flags: u32,
    size: u32,
}

/// Builder for a relocatable ELF32 object.
pub struct ObjectBuilder {
    endian: Endian,
    sections: Vec<UserSection>,
    symbols: Vec<SymbolEntry>,
    strings: Strings,
    with_symtab: bool,
    symtab_link: Option<u32>,
    symtab_size: Option<u32>,
    symtab_trailing: usize,
}

impl ObjectBuilder {
    #[must_use]
    pub fn new(endian: Endian) -> Self {
        Self {
            endian,
            sections: Vec::new(),
            symbols: Vec::new(),
            strings: Strings::new(),
            with_symtab: true,
            symtab_link: None,
            symtab_size: None,
            symtab_trailing: 0,
        }
    }

    /// Add a section and return its index.
    pub fn section(&mut self, name: &str, sh_type: u32, flags: u32, size: u32) -> u16 {
        self.sections.push(UserSection {
            name: name.to_string(),
            sh_type,
            flags,
            size,
        });
        u16::try_from(self.sections.len()).expect("too many sections")
    }

    pub fn text_section(&mut self, size: u32) -> u16 {
        self.section(".text", SHT_PROGBITS, SHF_ALLOC | SHF_EXECINSTR, size)
    }

    pub fn data_section(&mut self, size: u32) -> u16 {
        self.section(".data", SHT_PROGBITS, SHF_ALLOC | SHF_WRITE, size)
    }

    pub fn rodata_section(&mut self, size: u32) -> u16 {
        self.section(".rodata", SHT_PROGBITS, SHF_ALLOC, size)
    }

    pub fn bss_section(&mut self, size: u32) -> u16 {
        self.section(".bss", SHT_NOBITS, SHF_ALLOC | SHF_WRITE, size)
    }

    /// Append a named symbol. `info` is usually built with [`st_info`].
    pub fn symbol(&mut self, name: &str, value: u32, info: u8, shndx: u16) -> &mut Self {
        let name = self.strings.add(name);
        self.symbols.push(SymbolEntry {
            name,
            value,
            size: 0,
            info,
            other: 0,
            shndx,
        });
        self
    }

    /// Append an unnamed `STT_SECTION` symbol, as assemblers emit.
    pub fn section_symbol(&mut self, shndx: u16) -> &mut Self {
        self.symbols.push(SymbolEntry {
            name: 0,
            value: 0,
            size: 0,
            info: st_info(STB_LOCAL, STT_SECTION),
            other: 0,
            shndx,
        });
        self
    }

    /// Omit `.symtab` entirely.
    pub fn without_symbol_table(&mut self) -> &mut Self {
        self.with_symtab = false;
        self
    }

    /// Override `.symtab`'s `sh_link`.
    pub fn symtab_link(&mut self, link: u32) -> &mut Self {
        self.symtab_link = Some(link);
        self
    }

    /// Override `.symtab`'s `sh_size` without changing the bytes written.
    pub fn symtab_size(&mut self, size: u32) -> &mut Self {
        self.symtab_size = Some(size);
        self
    }

    /// Append `count` bytes after the last symbol, counted in `sh_size`.
    pub fn symtab_trailing_bytes(&mut self, count: usize) -> &mut Self {
        self.symtab_trailing = count;
        self
    }

    /// Serialize the object.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0u8; ELF32_HEADER_SIZE];
        let mut shstrtab = Strings::new();
        let mut headers = vec![section_header(0, SHT_NULL, 0, 0, 0)];

        for user in &self.sections {
            align(&mut out);
            let offset = out.len();
            if user.sh_type != SHT_NOBITS {
                out.resize(offset + user.size as usize, 0);
            }
            headers.push(section_header(
                shstrtab.add(&user.name),
                user.sh_type,
                user.flags,
                to_u32(offset),
                user.size,
            ));
        }

        if self.with_symtab {
            align(&mut out);
            let offset = out.len();
            out.extend_from_slice(&[0u8; ELF32_SYMBOL_SIZE]);
            for sym in &self.symbols {
                self.put_symbol(&mut out, sym);
            }
            out.resize(out.len() + self.symtab_trailing, 0);

            let size = self.symtab_size.unwrap_or_else(|| to_u32(out.len() - offset));
            // .strtab follows directly.
            let link = self
                .symtab_link
                .unwrap_or_else(|| to_u32(headers.len() + 1));
            let mut header =
                section_header(shstrtab.add(".symtab"), SHT_SYMTAB, 0, to_u32(offset), size);
            header.link = link;
            header.info = 1;
            header.entsize = to_u32(ELF32_SYMBOL_SIZE);
            headers.push(header);
        }

        let offset = out.len();
        out.extend_from_slice(&self.strings.data);
        headers.push(section_header(
            shstrtab.add(".strtab"),
            SHT_STRTAB,
            0,
            to_u32(offset),
            to_u32(self.strings.data.len()),
        ));

        let name = shstrtab.add(".shstrtab");
        let offset = out.len();
        out.extend_from_slice(&shstrtab.data);
        headers.push(section_header(
            name,
            SHT_STRTAB,
            0,
            to_u32(offset),
            to_u32(shstrtab.data.len()),
        ));

        align(&mut out);
        let shoff = to_u32(out.len());
        for header in &headers {
            self.put_section_header(&mut out, header);
        }

        let shnum = u16::try_from(headers.len()).expect("too many sections");
        let header = self.elf_header(shoff, shnum);
        out[..ELF32_HEADER_SIZE].copy_from_slice(&header);
        out
    }

    fn elf_header(&self, shoff: u32, shnum: u16) -> Vec<u8> {
        let mut out = Vec::with_capacity(ELF32_HEADER_SIZE);
        out.extend_from_slice(&ELF_MAGIC);
        out.push(ELF_CLASS_32);
        out.push(match self.endian {
            Endian::Little => ELF_DATA_LSB,
            Endian::Big => ELF_DATA_MSB,
        });
        out.push(ELF_VERSION_CURRENT);
        out.resize(EI_NIDENT, 0);

        self.put_u16(&mut out, ET_REL);
        self.put_u16(&mut out, EM_386);
        self.put_u32(&mut out, u32::from(ELF_VERSION_CURRENT));
        self.put_u32(&mut out, 0); // e_entry
        self.put_u32(&mut out, 0); // e_phoff
        self.put_u32(&mut out, shoff);
        self.put_u32(&mut out, 0); // e_flags
        self.put_u16(&mut out, to_u16(ELF32_HEADER_SIZE));
        self.put_u16(&mut out, 0); // e_phentsize
        self.put_u16(&mut out, 0); // e_phnum
        self.put_u16(&mut out, to_u16(ELF32_SECTION_HEADER_SIZE));
        self.put_u16(&mut out, shnum);
        self.put_u16(&mut out, shnum - 1); // .shstrtab is last
        out
    }

    fn put_section_header(&self, out: &mut Vec<u8>, h: &SectionHeader) {
        for field in [
            h.name,
            h.sh_type,
            h.flags,
            h.addr,
            h.offset,
            h.size,
            h.link,
            h.info,
            h.addralign,
            h.entsize,
        ] {
            self.put_u32(out, field);
        }
    }

    fn put_symbol(&self, out: &mut Vec<u8>, sym: &SymbolEntry) {
        self.put_u32(out, sym.name);
        self.put_u32(out, sym.value);
        self.put_u32(out, sym.size);
        out.push(sym.info);
        out.push(sym.other);
        self.put_u16(out, sym.shndx);
    }

    fn put_u16(&self, out: &mut Vec<u8>, value: u16) {
        match self.endian {
            Endian::Little => out.extend_from_slice(&value.to_le_bytes()),
            Endian::Big => out.extend_from_slice(&value.to_be_bytes()),
        }
    }

    fn put_u32(&self, out: &mut Vec<u8>, value: u32) {
        match self.endian {
            Endian::Little => out.extend_from_slice(&value.to_le_bytes()),
            Endian::Big => out.extend_from_slice(&value.to_be_bytes()),
        }
    }
}

const fn section_header(
    name: u32,
    sh_type: u32,
    flags: u32,
    offset: u32,
    size: u32,
) -> SectionHeader {
    SectionHeader {
        name,
        sh_type,
        flags,
        addr: 0,
        offset,
        size,
        link: 0,
        info: 0,
        addralign: if sh_type == SHT_NULL { 0 } else { 4 },
        entsize: 0,
    }
}

fn align(out: &mut Vec<u8>) {
    out.resize(out.len().next_multiple_of(4), 0);
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).expect("synthetic object larger than 4 GiB")
}

fn to_u16(n: usize) -> u16 {
    u16::try_from(n).expect("record size fits in a u16")
}
