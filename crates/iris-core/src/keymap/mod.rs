//! Key tables for the keyboard built into the Iris.
//!
//! The canonical representation of a key is its XT scancode together with the
//! escape block it was reached through.  Modifier state and dead keys are
//! tracked by [`crate::domain::keyboard::XtTranslator`]; this module only holds
//! immutable data.

pub mod composite;
pub mod modifiers;
pub mod xt;

pub use composite::{CompositeEntry, CompositeTable};
pub use modifiers::{Modifier, Modifiers};
pub use xt::{XtKey, XtKeySet, XT_RELEASE};

/// Unified lookup entry point.
pub struct KeyMapper;

impl KeyMapper {
    /// Resolves an XT packet's escape byte and scancode to a table entry.
    ///
    /// Returns [`XtKey::Ignore`] for unknown escape bytes.
    pub fn xt_key(escape: u8, code: u8) -> XtKey {
        match XtKeySet::from_escape(escape) {
            Some(set) => xt::lookup(set, code),
            None => XtKey::Ignore,
        }
    }
}
