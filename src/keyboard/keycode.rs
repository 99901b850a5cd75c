//! USB HID keycodes and their display names
//!
//! See USB HID Usage Tables, Section 10 (Keyboard/Keypad Page 0x07).

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// An opaque HID usage code as handed to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HidKeycode(pub u8);

impl HidKeycode {
    pub const A: Self = Self(0x04);
    pub const B: Self = Self(0x05);
    pub const C: Self = Self(0x06);
    pub const D: Self = Self(0x07);
    pub const E: Self = Self(0x08);
    pub const F: Self = Self(0x09);
    pub const G: Self = Self(0x0A);
    pub const H: Self = Self(0x0B);
    pub const I: Self = Self(0x0C);
    pub const J: Self = Self(0x0D);
    pub const K: Self = Self(0x0E);
    pub const L: Self = Self(0x0F);
    pub const M: Self = Self(0x10);
    pub const N: Self = Self(0x11);
    pub const O: Self = Self(0x12);
    pub const P: Self = Self(0x13);
    pub const Q: Self = Self(0x14);
    pub const R: Self = Self(0x15);
    pub const S: Self = Self(0x16);
    pub const T: Self = Self(0x17);
    pub const U: Self = Self(0x18);
    pub const V: Self = Self(0x19);
    pub const W: Self = Self(0x1A);
    pub const X: Self = Self(0x1B);
    pub const Y: Self = Self(0x1C);
    pub const Z: Self = Self(0x1D);

    pub const ONE: Self = Self(0x1E);
    pub const TWO: Self = Self(0x1F);
    pub const THREE: Self = Self(0x20);
    pub const FOUR: Self = Self(0x21);
    pub const FIVE: Self = Self(0x22);
    pub const SIX: Self = Self(0x23);
    pub const SEVEN: Self = Self(0x24);
    pub const EIGHT: Self = Self(0x25);
    pub const NINE: Self = Self(0x26);
    pub const ZERO: Self = Self(0x27);

    pub const ENTER: Self = Self(0x28);
    pub const ESCAPE: Self = Self(0x29);
    pub const BACKSPACE: Self = Self(0x2A);
    pub const TAB: Self = Self(0x2B);
    pub const SPACE: Self = Self(0x2C);
    pub const MINUS: Self = Self(0x2D);
    pub const EQUALS: Self = Self(0x2E);
    pub const LEFT_BRACKET: Self = Self(0x2F);
    pub const RIGHT_BRACKET: Self = Self(0x30);
    pub const BACKSLASH: Self = Self(0x31);
    pub const SEMICOLON: Self = Self(0x33);
    pub const QUOTE: Self = Self(0x34);
    pub const GRAVE_ACCENT: Self = Self(0x35);
    pub const COMMA: Self = Self(0x36);
    pub const PERIOD: Self = Self(0x37);
    pub const FORWARD_SLASH: Self = Self(0x38);
    pub const CAPS_LOCK: Self = Self(0x39);

    pub const F1: Self = Self(0x3A);
    pub const F2: Self = Self(0x3B);
    pub const F3: Self = Self(0x3C);
    pub const F4: Self = Self(0x3D);
    pub const F5: Self = Self(0x3E);
    pub const F6: Self = Self(0x3F);
    pub const F7: Self = Self(0x40);
    pub const F8: Self = Self(0x41);
    pub const F9: Self = Self(0x42);
    pub const F10: Self = Self(0x43);
    pub const F11: Self = Self(0x44);
    pub const F12: Self = Self(0x45);

    pub const PRINT_SCREEN: Self = Self(0x46);
    pub const SCROLL_LOCK: Self = Self(0x47);
    pub const PAUSE: Self = Self(0x48);
    pub const INSERT: Self = Self(0x49);
    pub const HOME: Self = Self(0x4A);
    pub const PAGE_UP: Self = Self(0x4B);
    pub const DELETE: Self = Self(0x4C);
    pub const END: Self = Self(0x4D);
    pub const PAGE_DOWN: Self = Self(0x4E);
    pub const RIGHT_ARROW: Self = Self(0x4F);
    pub const LEFT_ARROW: Self = Self(0x50);
    pub const DOWN_ARROW: Self = Self(0x51);
    pub const UP_ARROW: Self = Self(0x52);

    pub const LEFT_CONTROL: Self = Self(0xE0);
    pub const LEFT_SHIFT: Self = Self(0xE1);
    pub const LEFT_ALT: Self = Self(0xE2);
    pub const LEFT_GUI: Self = Self(0xE3);
    pub const RIGHT_CONTROL: Self = Self(0xE4);
    pub const RIGHT_SHIFT: Self = Self(0xE5);
    pub const RIGHT_ALT: Self = Self(0xE6);
    pub const RIGHT_GUI: Self = Self(0xE7);

    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Check if this keycode is a modifier (LEFT_CONTROL..RIGHT_GUI).
    pub fn is_modifier(self) -> bool {
        (0xE0..=0xE7).contains(&self.0)
    }

    /// Display name, falling back to `KEYCODE_<n>` for codes without one.
    pub fn name(self) -> Cow<'static, str> {
        match KEYCODE_NAMES.get(&self) {
            Some(name) => Cow::Borrowed(*name),
            None => Cow::Owned(format!("KEYCODE_{}", self.0)),
        }
    }

    /// Look up a keycode by its display name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim().to_ascii_uppercase();
        KEYCODE_BY_NAME.get(wanted.as_str()).copied()
    }
}

impl fmt::Display for HidKeycode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

const NAMED_KEYCODES: &[(HidKeycode, &str)] = &[
    (HidKeycode::A, "A"),
    (HidKeycode::B, "B"),
    (HidKeycode::C, "C"),
    (HidKeycode::D, "D"),
    (HidKeycode::E, "E"),
    (HidKeycode::F, "F"),
    (HidKeycode::G, "G"),
    (HidKeycode::H, "H"),
    (HidKeycode::I, "I"),
    (HidKeycode::J, "J"),
    (HidKeycode::K, "K"),
    (HidKeycode::L, "L"),
    (HidKeycode::M, "M"),
    (HidKeycode::N, "N"),
    (HidKeycode::O, "O"),
    (HidKeycode::P, "P"),
    (HidKeycode::Q, "Q"),
    (HidKeycode::R, "R"),
    (HidKeycode::S, "S"),
    (HidKeycode::T, "T"),
    (HidKeycode::U, "U"),
    (HidKeycode::V, "V"),
    (HidKeycode::W, "W"),
    (HidKeycode::X, "X"),
    (HidKeycode::Y, "Y"),
    (HidKeycode::Z, "Z"),
    (HidKeycode::ONE, "ONE"),
    (HidKeycode::TWO, "TWO"),
    (HidKeycode::THREE, "THREE"),
    (HidKeycode::FOUR, "FOUR"),
    (HidKeycode::FIVE, "FIVE"),
    (HidKeycode::SIX, "SIX"),
    (HidKeycode::SEVEN, "SEVEN"),
    (HidKeycode::EIGHT, "EIGHT"),
    (HidKeycode::NINE, "NINE"),
    (HidKeycode::ZERO, "ZERO"),
    (HidKeycode::ENTER, "ENTER"),
    (HidKeycode::ESCAPE, "ESCAPE"),
    (HidKeycode::BACKSPACE, "BACKSPACE"),
    (HidKeycode::TAB, "TAB"),
    (HidKeycode::SPACE, "SPACE"),
    (HidKeycode::MINUS, "MINUS"),
    (HidKeycode::EQUALS, "EQUALS"),
    (HidKeycode::LEFT_BRACKET, "LEFT_BRACKET"),
    (HidKeycode::RIGHT_BRACKET, "RIGHT_BRACKET"),
    (HidKeycode::BACKSLASH, "BACKSLASH"),
    (HidKeycode::SEMICOLON, "SEMICOLON"),
    (HidKeycode::QUOTE, "QUOTE"),
    (HidKeycode::GRAVE_ACCENT, "GRAVE_ACCENT"),
    (HidKeycode::COMMA, "COMMA"),
    (HidKeycode::PERIOD, "PERIOD"),
    (HidKeycode::FORWARD_SLASH, "FORWARD_SLASH"),
    (HidKeycode::CAPS_LOCK, "CAPS_LOCK"),
    (HidKeycode::F1, "F1"),
    (HidKeycode::F2, "F2"),
    (HidKeycode::F3, "F3"),
    (HidKeycode::F4, "F4"),
    (HidKeycode::F5, "F5"),
    (HidKeycode::F6, "F6"),
    (HidKeycode::F7, "F7"),
    (HidKeycode::F8, "F8"),
    (HidKeycode::F9, "F9"),
    (HidKeycode::F10, "F10"),
    (HidKeycode::F11, "F11"),
    (HidKeycode::F12, "F12"),
    (HidKeycode::PRINT_SCREEN, "PRINT_SCREEN"),
    (HidKeycode::SCROLL_LOCK, "SCROLL_LOCK"),
    (HidKeycode::PAUSE, "PAUSE"),
    (HidKeycode::INSERT, "INSERT"),
    (HidKeycode::HOME, "HOME"),
    (HidKeycode::PAGE_UP, "PAGE_UP"),
    (HidKeycode::DELETE, "DELETE"),
    (HidKeycode::END, "END"),
    (HidKeycode::PAGE_DOWN, "PAGE_DOWN"),
    (HidKeycode::RIGHT_ARROW, "RIGHT_ARROW"),
    (HidKeycode::LEFT_ARROW, "LEFT_ARROW"),
    (HidKeycode::DOWN_ARROW, "DOWN_ARROW"),
    (HidKeycode::UP_ARROW, "UP_ARROW"),
    (HidKeycode::LEFT_CONTROL, "LEFT_CONTROL"),
    (HidKeycode::LEFT_SHIFT, "LEFT_SHIFT"),
    (HidKeycode::LEFT_ALT, "LEFT_ALT"),
    (HidKeycode::LEFT_GUI, "LEFT_GUI"),
    (HidKeycode::RIGHT_CONTROL, "RIGHT_CONTROL"),
    (HidKeycode::RIGHT_SHIFT, "RIGHT_SHIFT"),
    (HidKeycode::RIGHT_ALT, "RIGHT_ALT"),
    (HidKeycode::RIGHT_GUI, "RIGHT_GUI"),
];

/// Keycode to display name, built once.
pub static KEYCODE_NAMES: LazyLock<HashMap<HidKeycode, &'static str>> =
    LazyLock::new(|| NAMED_KEYCODES.iter().copied().collect());

static KEYCODE_BY_NAME: LazyLock<HashMap<&'static str, HidKeycode>> = LazyLock::new(|| {
    let mut map: HashMap<&'static str, HidKeycode> =
        NAMED_KEYCODES.iter().map(|&(code, name)| (name, code)).collect();

    // Short aliases commonly used in keymaps
    map.insert("SHIFT", HidKeycode::LEFT_SHIFT);
    map.insert("ALT", HidKeycode::LEFT_ALT);
    map.insert("CONTROL", HidKeycode::LEFT_CONTROL);
    map.insert("GUI", HidKeycode::LEFT_GUI);
    map.insert("RETURN", HidKeycode::ENTER);
    map.insert("SPACEBAR", HidKeycode::SPACE);

    map
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names() {
        assert_eq!(HidKeycode::LEFT_SHIFT.name(), "LEFT_SHIFT");
        assert_eq!(HidKeycode::ONE.to_string(), "ONE");
    }

    #[test]
    fn unknown_code_gets_generic_name() {
        assert_eq!(HidKeycode(0x90).name(), "KEYCODE_144");
    }

    #[test]
    fn lookup_by_name_and_alias() {
        assert_eq!(HidKeycode::from_name("left_arrow"), Some(HidKeycode::LEFT_ARROW));
        assert_eq!(HidKeycode::from_name("SHIFT"), Some(HidKeycode::LEFT_SHIFT));
        assert_eq!(HidKeycode::from_name("NOPE"), None);
    }

    #[test]
    fn modifier_range() {
        assert!(HidKeycode::LEFT_ALT.is_modifier());
        assert!(HidKeycode::RIGHT_GUI.is_modifier());
        assert!(!HidKeycode::CAPS_LOCK.is_modifier());
    }
}
