//! Keysym to keycode lookup for synthetic typing

use std::collections::HashMap;

/// X11 keysyms used outside the printable Latin-1 range
pub mod keysym {
    pub const RETURN: u32 = 0xff0d;
    pub const SHIFT_L: u32 = 0xffe1;
    pub const CONTROL_L: u32 = 0xffe3;
}

/// A physical key, plus whether Shift must be held to produce the keysym
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStroke {
    pub keycode: u8,
    pub shift: bool,
}

/// Reverse index of the server's keyboard mapping
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    keys: HashMap<u32, KeyStroke>,
}

impl KeyMap {
    /// Build from a `GetKeyboardMapping` reply.
    ///
    /// `keysyms` holds `keysyms_per_keycode` entries for each keycode starting
    /// at `min_keycode`. Only the unshifted and shifted columns are used, and
    /// the lowest keycode wins when several produce the same keysym.
    pub fn from_mapping(min_keycode: u8, keysyms_per_keycode: u8, keysyms: &[u32]) -> Self {
        let mut keys = HashMap::new();
        let per_keycode = usize::from(keysyms_per_keycode);
        if per_keycode == 0 {
            return Self { keys };
        }

        for column in 0..per_keycode.min(2) {
            for (offset, row) in keysyms.chunks(per_keycode).enumerate() {
                let Some(&sym) = row.get(column) else { continue };
                let Ok(keycode) = u8::try_from(usize::from(min_keycode) + offset) else {
                    break;
                };
                if sym == 0 {
                    continue;
                }
                keys.entry(sym).or_insert(KeyStroke {
                    keycode,
                    shift: column == 1,
                });
            }
        }

        Self { keys }
    }

    pub fn lookup(&self, sym: u32) -> Option<KeyStroke> {
        self.keys.get(&sym).copied()
    }

    /// Key for a character; only printable ASCII is supported
    pub fn lookup_char(&self, c: char) -> Option<KeyStroke> {
        char_keysym(c).and_then(|sym| self.lookup(sym))
    }
}

/// Keysym of a printable ASCII character (identical to its code point)
pub fn char_keysym(c: char) -> Option<u32> {
    (' '..='~').contains(&c).then_some(c as u32)
}
