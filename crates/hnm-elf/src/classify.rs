//! `nm` symbol type letters.

use crate::constants::*;
use crate::header::{SectionHeader, SymbolEntry};
use crate::section::SectionHeaderTable;

/// Letter for a symbol the rules do not otherwise categorize.
pub const UNCLASSIFIED: char = '?';

/// Derive the `nm` type letter for `symbol`.
///
/// Weak bindings and the special section indices are decided first; symbols
/// in a real section are then sub-classified by that section's type and
/// exact flags. Local symbols always get the lowercase form.
#[must_use]
pub fn classify(symbol: &SymbolEntry, sections: &SectionHeaderTable) -> char {
    let binding = symbol.binding();

    let letter = if binding == STB_WEAK {
        if symbol.shndx == SHN_UNDEF {
            'w'
        } else if symbol.sym_type() == STT_OBJECT {
            'V'
        } else {
            'W'
        }
    } else {
        match symbol.shndx {
            SHN_UNDEF => 'U',
            SHN_ABS => 'A',
            SHN_COMMON => 'C',
            idx if idx < SHN_LORESERVE => sections
                .get(usize::from(idx))
                .map_or(UNCLASSIFIED, |section| classify_in_section(binding, section)),
            _ => UNCLASSIFIED,
        }
    };

    if binding == STB_LOCAL {
        letter.to_ascii_lowercase()
    } else {
        letter
    }
}

fn classify_in_section(binding: u8, section: &SectionHeader) -> char {
    if binding == STB_GNU_UNIQUE {
        return 'u';
    }

    match (section.sh_type, section.flags) {
        (SHT_NOBITS, flags) if flags == SHF_ALLOC | SHF_WRITE => 'B',
        (SHT_PROGBITS, flags) if flags == SHF_ALLOC | SHF_EXECINSTR => 'T',
        (SHT_PROGBITS, SHF_ALLOC) => 'R',
        (SHT_PROGBITS, flags) if flags == SHF_ALLOC | SHF_WRITE => 'D',
        (SHT_PROGBITS, _) => UNCLASSIFIED,
        (SHT_DYNAMIC, _) => 'D',
        _ => 't',
    }
}

/// One line of a listing: address, type letter, and name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymbolRecord<'a> {
    /// `None` for `U` and `w` symbols, which print without an address.
    pub address: Option<u32>,
    pub kind: char,
    /// Raw name bytes from the string table.
    pub name: &'a [u8],
}

impl<'a> SymbolRecord<'a> {
    #[must_use]
    pub const fn new(symbol: &SymbolEntry, kind: char, name: &'a [u8]) -> Self {
        let address = match kind {
            'U' | 'w' => None,
            _ => Some(symbol.value),
        };
        Self {
            address,
            kind,
            name,
        }
    }
}
