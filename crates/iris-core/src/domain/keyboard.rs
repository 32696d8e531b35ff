//! XT scancode translation for a Eurobraille peer.
//!
//! A Eurobraille peer expects finished keyboard events (a character or a
//! function code plus a modifier byte) rather than raw scancodes, so the
//! bridge performs the keyboard driver's job itself: it tracks held
//! modifiers, remembers a pending dead key, and picks the right character
//! variant for each key press.
//!
//! # Packet layout
//!
//! ```text
//! 'K' 'Z' <function extra> <function code> <modifiers> <character>
//! ```
//! Exactly one of `<function code>` and `<character>` is non-zero.

use tracing::{debug, trace};

use crate::keymap::composite::CompositeTable;
use crate::keymap::modifiers::{Modifier, Modifiers};
use crate::keymap::xt::{self, XtKey, XtKeySet, XT_RELEASE};

/// One Eurobraille keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardPacket {
    pub function: u8,
    pub function_extra: u8,
    pub modifiers: u8,
    pub character: u8,
}

impl KeyboardPacket {
    /// Serialises the event as a `KZ` payload.
    pub fn to_bytes(self) -> [u8; 6] {
        [
            b'K',
            b'Z',
            self.function_extra,
            self.function,
            self.modifiers,
            self.character,
        ]
    }
}

/// Stateful scancode translator.
///
/// One instance belongs to each driver; it is reset whenever forwarding to a
/// Eurobraille peer begins so that no modifier leaks from a previous session.
#[derive(Debug, Default)]
pub struct XtTranslator {
    modifiers: Modifiers,
    composite: Option<CompositeTable>,
    last_key: Option<(XtKeySet, u8)>,
}

impl XtTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets all held modifiers, the pending dead key, and the last key.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Currently held modifiers.
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Dead key waiting for the next character, if any.
    pub fn pending_composite(&self) -> Option<CompositeTable> {
        self.composite
    }

    /// Translates one XT key event into zero or more keyboard packets.
    ///
    /// `scancode` carries the release bit (`0x80`).  Unknown escape bytes
    /// and unmapped scancodes produce no packets.
    pub fn translate(&mut self, escape: u8, scancode: u8) -> Vec<KeyboardPacket> {
        let Some(set) = XtKeySet::from_escape(escape) else {
            debug!("unknown XT escape: {escape:02X}");
            return Vec::new();
        };

        let code = scancode & !XT_RELEASE;
        let key = xt::lookup(set, code);
        let mut packets = Vec::new();

        if scancode & XT_RELEASE != 0 {
            self.release(key, (set, code), &mut packets);
        } else {
            self.last_key = Some((set, code));
            self.press(key, &mut packets);
        }

        trace!(
            "XT {escape:02X} {scancode:02X} -> {} packet(s), modifiers {:04X}",
            packets.len(),
            self.modifiers.0
        );
        packets
    }

    fn release(&mut self, key: XtKey, which: (XtKeySet, u8), packets: &mut Vec<KeyboardPacket>) {
        match key {
            XtKey::Modifier { set, .. } => self.modifiers.clear(set),

            XtKey::Complex {
                code,
                extra,
                modifier,
            } => {
                self.modifiers.clear(modifier);
                // A complex key released without any other key in between
                // acts as a function key.
                if self.last_key == Some(which) {
                    self.emit_function(code, extra, packets);
                }
            }

            _ => {}
        }
    }

    fn press(&mut self, key: XtKey, packets: &mut Vec<KeyboardPacket>) {
        match key {
            XtKey::Ignore => {}

            XtKey::Modifier { set, clear } => {
                self.modifiers.set(set);
                if let Some(clear) = clear {
                    self.modifiers.clear(clear);
                }
            }

            XtKey::Lock(modifier) => self.modifiers.set(modifier),

            XtKey::Character {
                plain,
                shifted,
                alt_gr,
            } => {
                let character = if self.modifiers.alt_gr() && alt_gr != 0 {
                    alt_gr
                } else if self.modifiers.shifted() && shifted != 0 {
                    shifted
                } else {
                    plain
                };
                self.emit_character(character, packets);
            }

            XtKey::Function { code, extra } => self.emit_function(code, extra, packets),

            XtKey::Complex { modifier, .. } => {
                self.modifiers.set(modifier);
                self.composite = None;
            }

            XtKey::Composite { plain, shifted } => {
                self.composite = match shifted {
                    Some(table) if self.modifiers.shifted() => Some(table),
                    _ => Some(plain),
                };
            }
        }
    }

    fn emit_function(&mut self, code: u8, extra: u8, packets: &mut Vec<KeyboardPacket>) {
        self.composite = None;
        packets.push(KeyboardPacket {
            function: code,
            function_extra: extra,
            modifiers: self.modifiers.to_eurobraille(),
            character: 0,
        });
    }

    fn emit_character(&mut self, character: u8, packets: &mut Vec<KeyboardPacket>) {
        let modifiers = self.modifiers.to_eurobraille();
        let packet = |character| KeyboardPacket {
            function: 0,
            function_extra: 0,
            modifiers,
            character,
        };

        match self.composite.take() {
            None => packets.push(packet(character)),

            Some(table) => match table.compose(character) {
                Some(composite) => packets.push(packet(composite)),
                None => {
                    // The accent is shown on its own before the unaccented key.
                    if let Some(accent) = table.standalone() {
                        packets.push(packet(accent));
                    }
                    packets.push(packet(character));
                }
            },
        }
    }
}
