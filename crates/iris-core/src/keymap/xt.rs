//! XT scancode table for the French (AZERTY) keyboard built into the Iris.
//!
//! Reference: IBM PC/XT scan code set 1.  A make code has the high bit clear;
//! the matching break (release) code is the same value with `0x80` set.
//! Extended keys arrive with an `0xE0` (or `0xE1`) escape in front, which
//! selects a different 128-entry block of the table.
//!
//! # What each entry means (for beginners)
//!
//! The Eurobraille peer receives *characters*, not key positions, so the
//! driver has to do what a PC keyboard driver would normally do.  Every
//! scancode maps to one [`XtKey`]:
//!
//! - **Modifier** – shift, control, alt, windows: only changes the held state.
//! - **Lock** – caps lock: latches shift lock until a shift key is pressed.
//! - **Character** – up to three characters: plain, with shift, with alt-gr.
//! - **Function** – a non-printable key (arrows, F1…F12, Enter, …) sent by code.
//! - **Complex** – acts as a modifier while held, and as a function key if
//!   it is released without any other key having been pressed (windows, insert).
//! - **Composite** – a dead key (`^`, `¨`) that accents the *next* character.
//!
//! Character values are Windows-1252.  Function codes follow the Windows
//! virtual-key numbering (`0x1B` escape, `0x70` F1, `0x25` left arrow, …);
//! the extra byte is `0x01` for keys reached through the `0xE0` escape.

use super::composite::CompositeTable;
use super::modifiers::Modifier;

/// Release (break) bit of a scancode.
pub const XT_RELEASE: u8 = 0x80;

/// Number of scancodes in each escape block.
const KEYS_PER_SET: usize = 0x80;

/// Which escape prefix selected the scancode block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum XtKeySet {
    Base = 0,
    E0 = 1,
    E1 = 2,
}

impl XtKeySet {
    /// Maps the escape byte of an XT packet to its block; unknown escapes yield `None`.
    pub fn from_escape(escape: u8) -> Option<Self> {
        match escape {
            0x00 => Some(XtKeySet::Base),
            0xE0 => Some(XtKeySet::E0),
            0xE1 => Some(XtKeySet::E1),
            _ => None,
        }
    }
}

/// Semantics of one scancode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XtKey {
    /// Unmapped key; pressing or releasing it does nothing.
    Ignore,
    /// Sets `set` while held; pressing it also clears `clear`.
    Modifier { set: Modifier, clear: Option<Modifier> },
    /// Latches the modifier on press.
    Lock(Modifier),
    /// Printable key; a zero variant falls back to `plain`.
    Character { plain: u8, shifted: u8, alt_gr: u8 },
    /// Non-printable key sent by code.
    Function { code: u8, extra: u8 },
    /// Modifier while held, function key when released on its own.
    Complex { code: u8, extra: u8, modifier: Modifier },
    /// Dead key selecting a composite table for the next character.
    Composite { plain: CompositeTable, shifted: Option<CompositeTable> },
}

/// Looks up the entry for `code` (release bit ignored) in block `set`.
///
/// # Examples
///
/// ```rust
/// use iris_core::keymap::xt::{lookup, XtKey, XtKeySet};
///
/// assert_eq!(
///     lookup(XtKeySet::Base, 0x10),
///     XtKey::Character { plain: b'a', shifted: b'A', alt_gr: 0 }
/// );
/// ```
pub fn lookup(set: XtKeySet, code: u8) -> XtKey {
    XT_KEY_TABLE
        .get(xt_key(set, code & !XT_RELEASE))
        .copied()
        .unwrap_or(XtKey::Ignore)
}

const fn xt_key(set: XtKeySet, code: u8) -> usize {
    ((set as usize) * KEYS_PER_SET) | (code as usize)
}

// ── Entry constructors ────────────────────────────────────────────────────────

const fn character(plain: u8, shifted: u8, alt_gr: u8) -> XtKey {
    XtKey::Character {
        plain,
        shifted,
        alt_gr,
    }
}

const fn letter(lower: u8) -> XtKey {
    character(lower, lower.to_ascii_uppercase(), 0)
}

const fn function(code: u8) -> XtKey {
    XtKey::Function { code, extra: 0x00 }
}

const fn extended(code: u8) -> XtKey {
    XtKey::Function { code, extra: 0x01 }
}

const fn modifier(set: Modifier) -> XtKey {
    XtKey::Modifier { set, clear: None }
}

const fn shift(set: Modifier) -> XtKey {
    XtKey::Modifier {
        set,
        clear: Some(Modifier::ShiftLock),
    }
}

/// Complete scancode table indexed by `(set << 7) | code`.
const XT_KEY_TABLE: [XtKey; 3 * KEYS_PER_SET] = {
    use XtKeySet::{Base, E0, E1};
    let mut t = [XtKey::Ignore; 3 * KEYS_PER_SET];

    // ── Row 1: escape and function keys ─────────────────────────────────────
    t[xt_key(Base, 0x01)] = function(0x1B); // escape
    t[xt_key(Base, 0x3B)] = function(0x70); // F1
    t[xt_key(Base, 0x3C)] = function(0x71);
    t[xt_key(Base, 0x3D)] = function(0x72);
    t[xt_key(Base, 0x3E)] = function(0x73);
    t[xt_key(Base, 0x3F)] = function(0x74);
    t[xt_key(Base, 0x40)] = function(0x75);
    t[xt_key(Base, 0x41)] = function(0x76);
    t[xt_key(Base, 0x42)] = function(0x77);
    t[xt_key(Base, 0x43)] = function(0x78);
    t[xt_key(Base, 0x44)] = function(0x79); // F10
    t[xt_key(Base, 0x57)] = function(0x7A); // F11
    t[xt_key(Base, 0x58)] = function(0x7B); // F12

    // ── Row 2: ² & é " ' ( - è _ ç à ) = ────────────────────────────────────
    t[xt_key(Base, 0x29)] = character(0xB2, 0x00, 0x00); // ²
    t[xt_key(Base, 0x02)] = character(b'&', b'1', 0x00);
    t[xt_key(Base, 0x03)] = character(0xE9, b'2', b'~'); // é
    t[xt_key(Base, 0x04)] = character(b'"', b'3', b'#');
    t[xt_key(Base, 0x05)] = character(b'\'', b'4', b'{');
    t[xt_key(Base, 0x06)] = character(b'(', b'5', b'[');
    t[xt_key(Base, 0x07)] = character(b'-', b'6', b'|');
    t[xt_key(Base, 0x08)] = character(0xE8, b'7', b'`'); // è
    t[xt_key(Base, 0x09)] = character(b'_', b'8', b'\\');
    t[xt_key(Base, 0x0A)] = character(0xE7, b'9', b'^'); // ç
    t[xt_key(Base, 0x0B)] = character(0xE0, b'0', b'@'); // à
    t[xt_key(Base, 0x0C)] = character(b')', 0xB0, b']'); // °
    t[xt_key(Base, 0x0D)] = character(b'=', b'+', b'}');
    t[xt_key(Base, 0x0E)] = function(0x08); // backspace

    // ── Row 3: a z e r t y u i o p ^ $ ─────────────────────────────────────
    t[xt_key(Base, 0x0F)] = function(0x09); // tab
    t[xt_key(Base, 0x10)] = letter(b'a');
    t[xt_key(Base, 0x11)] = letter(b'z');
    t[xt_key(Base, 0x12)] = character(b'e', b'E', 0x80); // €
    t[xt_key(Base, 0x13)] = letter(b'r');
    t[xt_key(Base, 0x14)] = letter(b't');
    t[xt_key(Base, 0x15)] = letter(b'y');
    t[xt_key(Base, 0x16)] = letter(b'u');
    t[xt_key(Base, 0x17)] = letter(b'i');
    t[xt_key(Base, 0x18)] = letter(b'o');
    t[xt_key(Base, 0x19)] = letter(b'p');
    t[xt_key(Base, 0x1A)] = XtKey::Composite {
        plain: CompositeTable::Circumflex,
        shifted: Some(CompositeTable::Trema),
    };
    t[xt_key(Base, 0x1B)] = character(b'$', 0xA3, 0xA4); // £ ¤
    t[xt_key(Base, 0x1C)] = function(0x0D); // enter

    // ── Row 4: q s d f g h j k l m ù * ─────────────────────────────────────
    t[xt_key(Base, 0x3A)] = XtKey::Lock(Modifier::ShiftLock);
    t[xt_key(Base, 0x1E)] = letter(b'q');
    t[xt_key(Base, 0x1F)] = letter(b's');
    t[xt_key(Base, 0x20)] = letter(b'd');
    t[xt_key(Base, 0x21)] = letter(b'f');
    t[xt_key(Base, 0x22)] = letter(b'g');
    t[xt_key(Base, 0x23)] = letter(b'h');
    t[xt_key(Base, 0x24)] = letter(b'j');
    t[xt_key(Base, 0x25)] = letter(b'k');
    t[xt_key(Base, 0x26)] = letter(b'l');
    t[xt_key(Base, 0x27)] = letter(b'm');
    t[xt_key(Base, 0x28)] = character(0xF9, b'%', 0x00); // ù
    t[xt_key(Base, 0x2B)] = character(b'*', 0xB5, 0x00); // µ

    // ── Row 5: < w x c v b n , ; : ! ───────────────────────────────────────
    t[xt_key(Base, 0x2A)] = shift(Modifier::ShiftLeft);
    t[xt_key(Base, 0x56)] = character(b'<', b'>', 0x00);
    t[xt_key(Base, 0x2C)] = letter(b'w');
    t[xt_key(Base, 0x2D)] = letter(b'x');
    t[xt_key(Base, 0x2E)] = letter(b'c');
    t[xt_key(Base, 0x2F)] = letter(b'v');
    t[xt_key(Base, 0x30)] = letter(b'b');
    t[xt_key(Base, 0x31)] = letter(b'n');
    t[xt_key(Base, 0x32)] = character(b',', b'?', 0x00);
    t[xt_key(Base, 0x33)] = character(b';', b'.', 0x00);
    t[xt_key(Base, 0x34)] = character(b':', b'/', 0x00);
    t[xt_key(Base, 0x35)] = character(b'!', 0xA7, 0x00); // §
    t[xt_key(Base, 0x36)] = shift(Modifier::ShiftRight);

    // ── Row 6: control, windows, alt, space, alt-gr ────────────────────────
    t[xt_key(Base, 0x1D)] = modifier(Modifier::ControlLeft);
    t[xt_key(E0, 0x5B)] = XtKey::Complex {
        code: 0x5B,
        extra: 0x01,
        modifier: Modifier::WindowsLeft,
    };
    t[xt_key(Base, 0x38)] = modifier(Modifier::AltLeft);
    t[xt_key(Base, 0x39)] = character(b' ', 0x00, 0x00);
    t[xt_key(E0, 0x38)] = modifier(Modifier::AltRight);
    t[xt_key(E0, 0x5C)] = modifier(Modifier::WindowsRight);
    t[xt_key(E0, 0x5D)] = extended(0x5D); // application menu
    t[xt_key(E0, 0x1D)] = modifier(Modifier::ControlRight);

    // ── Editing and navigation cluster ─────────────────────────────────────
    t[xt_key(E0, 0x37)] = extended(0x2C); // print screen
    t[xt_key(E1, 0x1D)] = function(0x13); // pause
    t[xt_key(E0, 0x52)] = XtKey::Complex {
        code: 0x2D,
        extra: 0x01,
        modifier: Modifier::Insert,
    };
    t[xt_key(E0, 0x53)] = extended(0x2E); // delete
    t[xt_key(E0, 0x47)] = extended(0x24); // home
    t[xt_key(E0, 0x4F)] = extended(0x23); // end
    t[xt_key(E0, 0x49)] = extended(0x21); // page up
    t[xt_key(E0, 0x51)] = extended(0x22); // page down
    t[xt_key(E0, 0x48)] = extended(0x26); // up
    t[xt_key(E0, 0x4B)] = extended(0x25); // left
    t[xt_key(E0, 0x50)] = extended(0x28); // down
    t[xt_key(E0, 0x4D)] = extended(0x27); // right

    // ── Keypad ─────────────────────────────────────────────────────────────
    t[xt_key(E0, 0x35)] = character(b'/', 0x00, 0x00);
    t[xt_key(Base, 0x37)] = character(b'*', 0x00, 0x00);
    t[xt_key(Base, 0x4A)] = character(b'-', 0x00, 0x00);
    t[xt_key(Base, 0x4E)] = character(b'+', 0x00, 0x00);
    t[xt_key(E0, 0x1C)] = extended(0x0D); // keypad enter
    t[xt_key(Base, 0x47)] = character(b'7', 0x00, 0x00);
    t[xt_key(Base, 0x48)] = character(b'8', 0x00, 0x00);
    t[xt_key(Base, 0x49)] = character(b'9', 0x00, 0x00);
    t[xt_key(Base, 0x4B)] = character(b'4', 0x00, 0x00);
    t[xt_key(Base, 0x4C)] = character(b'5', 0x00, 0x00);
    t[xt_key(Base, 0x4D)] = character(b'6', 0x00, 0x00);
    t[xt_key(Base, 0x4F)] = character(b'1', 0x00, 0x00);
    t[xt_key(Base, 0x50)] = character(b'2', 0x00, 0x00);
    t[xt_key(Base, 0x51)] = character(b'3', 0x00, 0x00);
    t[xt_key(Base, 0x52)] = character(b'0', 0x00, 0x00);
    t[xt_key(Base, 0x53)] = character(b'.', 0x00, 0x00);

    t
};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_bytes_select_sets() {
        assert_eq!(XtKeySet::from_escape(0x00), Some(XtKeySet::Base));
        assert_eq!(XtKeySet::from_escape(0xE0), Some(XtKeySet::E0));
        assert_eq!(XtKeySet::from_escape(0xE1), Some(XtKeySet::E1));
        assert_eq!(XtKeySet::from_escape(0x42), None);
    }

    #[test]
    fn test_release_bit_is_ignored_by_lookup() {
        assert_eq!(lookup(XtKeySet::Base, 0x90), lookup(XtKeySet::Base, 0x10));
    }

    #[test]
    fn test_azerty_top_row_letters() {
        let expected = [b'a', b'z', b'e', b'r', b't', b'y', b'u', b'i', b'o', b'p'];
        for (offset, &lower) in expected.iter().enumerate() {
            match lookup(XtKeySet::Base, 0x10 + offset as u8) {
                XtKey::Character { plain, shifted, .. } => {
                    assert_eq!(plain, lower);
                    assert_eq!(shifted, lower.to_ascii_uppercase());
                }
                other => panic!("scancode 0x{:02X} mapped to {other:?}", 0x10 + offset),
            }
        }
    }

    #[test]
    fn test_digit_row_needs_shift_for_digits() {
        assert_eq!(lookup(XtKeySet::Base, 0x02), character(b'&', b'1', 0));
        assert_eq!(lookup(XtKeySet::Base, 0x0B), character(0xE0, b'0', b'@'));
    }

    #[test]
    fn test_shift_keys_clear_shift_lock() {
        for code in [0x2A, 0x36] {
            match lookup(XtKeySet::Base, code) {
                XtKey::Modifier { clear, .. } => assert_eq!(clear, Some(Modifier::ShiftLock)),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_extended_keys_differ_from_keypad() {
        assert_eq!(lookup(XtKeySet::E0, 0x48), extended(0x26));
        assert_eq!(lookup(XtKeySet::Base, 0x48), character(b'8', 0, 0));
    }

    #[test]
    fn test_only_windows_and_insert_are_complex() {
        let complex: Vec<(XtKeySet, u8)> = [XtKeySet::Base, XtKeySet::E0, XtKeySet::E1]
            .into_iter()
            .flat_map(|set| (0u8..0x80).map(move |code| (set, code)))
            .filter(|&(set, code)| matches!(lookup(set, code), XtKey::Complex { .. }))
            .collect();
        assert_eq!(complex, vec![(XtKeySet::E0, 0x52), (XtKeySet::E0, 0x5B)]);
    }

    #[test]
    fn test_unmapped_codes_are_ignored() {
        assert_eq!(lookup(XtKeySet::Base, 0x00), XtKey::Ignore);
        assert_eq!(lookup(XtKeySet::Base, 0x45), XtKey::Ignore); // num lock
        assert_eq!(lookup(XtKeySet::E1, 0x45), XtKey::Ignore);
    }

    #[test]
    fn test_dead_key_selects_circumflex_then_trema() {
        assert_eq!(
            lookup(XtKeySet::Base, 0x1A),
            XtKey::Composite {
                plain: CompositeTable::Circumflex,
                shifted: Some(CompositeTable::Trema),
            }
        );
    }
}
