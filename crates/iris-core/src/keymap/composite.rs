//! Dead-key composite character tables (ISO-8859-1).
//!
//! Each table is terminated by a sentinel entry whose `base` is 0; the
//! sentinel's `composite` is the accent on its own, emitted when the key
//! pressed after the dead key has no accented form.

/// A base character and its accented result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeEntry {
    pub base: u8,
    pub composite: u8,
}

const fn entry(base: u8, composite: u8) -> CompositeEntry {
    CompositeEntry { base, composite }
}

const CIRCUMFLEX: &[CompositeEntry] = &[
    entry(b'a', 0xE2),
    entry(b'e', 0xEA),
    entry(b'i', 0xEE),
    entry(b'o', 0xF4),
    entry(b'u', 0xFB),
    entry(b'A', 0xC2),
    entry(b'E', 0xCA),
    entry(b'I', 0xCE),
    entry(b'O', 0xD4),
    entry(b'U', 0xDB),
    entry(0, b'^'),
];

const TREMA: &[CompositeEntry] = &[
    entry(b'a', 0xE4),
    entry(b'e', 0xEB),
    entry(b'i', 0xEF),
    entry(b'o', 0xF6),
    entry(b'u', 0xFC),
    entry(b'y', 0xFF),
    entry(b'A', 0xC4),
    entry(b'E', 0xCB),
    entry(b'I', 0xCF),
    entry(b'O', 0xD6),
    entry(b'U', 0xDC),
    entry(0, 0xA8),
];

/// A named composite table selected by a dead key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeTable {
    Circumflex,
    Trema,
}

impl CompositeTable {
    /// The table's entries, sentinel included.
    pub fn entries(self) -> &'static [CompositeEntry] {
        match self {
            CompositeTable::Circumflex => CIRCUMFLEX,
            CompositeTable::Trema => TREMA,
        }
    }

    /// Looks up the accented form of `base`, scanning up to the sentinel.
    pub fn compose(self, base: u8) -> Option<u8> {
        self.entries()
            .iter()
            .take_while(|e| e.base != 0)
            .find(|e| e.base == base)
            .map(|e| e.composite)
    }

    /// The accent on its own, if the sentinel carries one.
    pub fn standalone(self) -> Option<u8> {
        self.entries()
            .iter()
            .find(|e| e.base == 0)
            .map(|e| e.composite)
            .filter(|&c| c != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circumflex_composes_vowels() {
        assert_eq!(CompositeTable::Circumflex.compose(b'e'), Some(0xEA));
        assert_eq!(CompositeTable::Circumflex.compose(b'O'), Some(0xD4));
    }

    #[test]
    fn test_trema_composes_y() {
        assert_eq!(CompositeTable::Trema.compose(b'y'), Some(0xFF));
        assert_eq!(CompositeTable::Circumflex.compose(b'y'), None);
    }

    #[test]
    fn test_consonant_has_no_composite() {
        assert_eq!(CompositeTable::Trema.compose(b'x'), None);
    }

    #[test]
    fn test_nul_is_never_composed() {
        // The sentinel must not match a NUL base character.
        assert_eq!(CompositeTable::Circumflex.compose(0), None);
    }

    #[test]
    fn test_standalone_accents() {
        assert_eq!(CompositeTable::Circumflex.standalone(), Some(b'^'));
        assert_eq!(CompositeTable::Trema.standalone(), Some(0xA8));
    }

    #[test]
    fn test_every_table_ends_with_sentinel() {
        for table in [CompositeTable::Circumflex, CompositeTable::Trema] {
            let last = table.entries().last().copied();
            assert_eq!(last.map(|e| e.base), Some(0), "{table:?} must end with a sentinel");
        }
    }
}
