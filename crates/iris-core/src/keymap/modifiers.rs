//! Keyboard modifier tracking for the XT translator.
//!
//! The translator keeps one bit per physical modifier so that left and right
//! keys can be released independently.  When a keyboard packet is sent to a
//! Eurobraille peer the bits are folded into the peer's one-byte layout:
//!
//! | Bit  | Meaning     | Set by                        |
//! |------|-------------|-------------------------------|
//! | 0x01 | shift       | left or right shift           |
//! | 0x02 | control     | left or right control         |
//! | 0x04 | alt         | left alt                      |
//! | 0x08 | shift lock  | caps lock                     |
//! | 0x10 | windows     | left or right windows key     |
//! | 0x20 | alt-gr      | right alt                     |
//! | 0x40 | (unused)    |                               |
//! | 0x80 | insert      | insert held as a modifier     |

/// One physical modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Modifier {
    ShiftLeft = 0,
    ShiftRight = 1,
    ShiftLock = 2,
    ControlLeft = 3,
    ControlRight = 4,
    AltLeft = 5,
    AltRight = 6,
    WindowsLeft = 7,
    WindowsRight = 8,
    Insert = 9,
    Fn = 10,
}

impl Modifier {
    /// Bit of this modifier inside [`Modifiers`].
    pub const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// Eurobraille keyboard packet modifier bits.
pub mod eurobraille_modifier {
    pub const SHIFT: u8 = 0x01;
    pub const CONTROL: u8 = 0x02;
    pub const ALT: u8 = 0x04;
    pub const SHIFT_LOCK: u8 = 0x08;
    pub const WINDOWS: u8 = 0x10;
    pub const ALT_GR: u8 = 0x20;
    pub const INSERT: u8 = 0x80;
}

/// Set of currently held modifiers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Modifiers(pub u16);

impl Modifiers {
    pub fn set(&mut self, modifier: Modifier) {
        self.0 |= modifier.bit();
    }

    pub fn clear(&mut self, modifier: Modifier) {
        self.0 &= !modifier.bit();
    }

    pub fn contains(&self, modifier: Modifier) -> bool {
        self.0 & modifier.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if either shift key is held.
    pub fn shift(&self) -> bool {
        self.contains(Modifier::ShiftLeft) || self.contains(Modifier::ShiftRight)
    }

    /// Returns `true` if shifted characters should be produced (shift or shift lock).
    pub fn shifted(&self) -> bool {
        self.shift() || self.contains(Modifier::ShiftLock)
    }

    pub fn control(&self) -> bool {
        self.contains(Modifier::ControlLeft) || self.contains(Modifier::ControlRight)
    }

    pub fn windows(&self) -> bool {
        self.contains(Modifier::WindowsLeft) || self.contains(Modifier::WindowsRight)
    }

    /// Right alt acts as alt-gr on the AZERTY layout.
    pub fn alt_gr(&self) -> bool {
        self.contains(Modifier::AltRight)
    }

    /// Folds the held modifiers into the Eurobraille keyboard modifier byte.
    pub fn to_eurobraille(self) -> u8 {
        use eurobraille_modifier::*;

        let bits = [
            (self.shift(), SHIFT),
            (self.control(), CONTROL),
            (self.contains(Modifier::AltLeft), ALT),
            (self.contains(Modifier::ShiftLock), SHIFT_LOCK),
            (self.windows(), WINDOWS),
            (self.alt_gr(), ALT_GR),
            (self.contains(Modifier::Insert), INSERT),
        ];
        bits.iter()
            .filter(|(held, _)| *held)
            .fold(0u8, |byte, (_, bit)| byte | bit)
    }
}
