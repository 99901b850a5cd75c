//! Static configuration data for the 40-key membrane keyboard
//!
//! Everything in here is read-only once the engine is built: the legacy key
//! names in electrical order, the mode tables that give each position its
//! plain HID keycode, the CAPS SHIFT / SYMBOL SHIFT combination tables, the
//! special-key HID substitutes and the modifier swap rules.
//!
//! The matrix is 8 rows by 5 columns. Rows 3, 4, 6 and 7 are wired
//! right-to-left, which is why e.g. row 3 reads `0 9 8 7 6`.

use super::{HidKeycode, MatrixPosition};
use serde::{Deserialize, Serialize};
use std::borrow::{Borrow, Cow};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Number of rows (input lines) in the reference wiring.
pub const ROW_COUNT: usize = 8;
/// Number of columns (output lines) in the reference wiring.
pub const COL_COUNT: usize = 5;
/// Total number of matrix positions.
pub const KEY_COUNT: usize = ROW_COUNT * COL_COUNT;

/// CAPS SHIFT position in the reference wiring (row 5, col 0).
pub const CAPS_SHIFT_IDX: MatrixPosition = MatrixPosition(25);
/// SYMBOL SHIFT position in the reference wiring (row 7, col 1).
pub const SYMBOL_SHIFT_IDX: MatrixPosition = MatrixPosition(36);

/// Legacy key legends in electrical order.
pub const SPECTRUM_KEY_NAMES: [&str; KEY_COUNT] = [
    "1", "2", "3", "4", "5",
    "Q", "W", "E", "R", "T",
    "A", "S", "D", "F", "G",
    "0", "9", "8", "7", "6",
    "P", "O", "I", "U", "Y",
    "CAPS SHIFT", "Z", "X", "C", "V",
    "ENTER", "L", "K", "J", "H",
    "SPACE", "SYMBOL SHIFT", "M", "N", "B",
];

/// PC mode: CAPS SHIFT sends Shift, SYMBOL SHIFT sends Alt.
pub const PC_MODE: [HidKeycode; KEY_COUNT] = [
    HidKeycode::ONE, HidKeycode::TWO, HidKeycode::THREE, HidKeycode::FOUR, HidKeycode::FIVE,
    HidKeycode::Q, HidKeycode::W, HidKeycode::E, HidKeycode::R, HidKeycode::T,
    HidKeycode::A, HidKeycode::S, HidKeycode::D, HidKeycode::F, HidKeycode::G,
    HidKeycode::ZERO, HidKeycode::NINE, HidKeycode::EIGHT, HidKeycode::SEVEN, HidKeycode::SIX,
    HidKeycode::P, HidKeycode::O, HidKeycode::I, HidKeycode::U, HidKeycode::Y,
    HidKeycode::LEFT_SHIFT, HidKeycode::Z, HidKeycode::X, HidKeycode::C, HidKeycode::V,
    HidKeycode::ENTER, HidKeycode::L, HidKeycode::K, HidKeycode::J, HidKeycode::H,
    HidKeycode::SPACE, HidKeycode::LEFT_ALT, HidKeycode::M, HidKeycode::N, HidKeycode::B,
];

/// CAPS SHIFT + key: (other position, logical key).
const CAPS_SHIFT_COMBOS: &[(usize, &str)] = &[
    (0, "EDIT"),
    (1, "CAPS LOCK"),
    (2, "TRUE VIDEO"),
    (3, "INV VIDEO"),
    (4, "CURSOR LEFT"),
    (19, "CURSOR DOWN"),
    (18, "CURSOR UP"),
    (17, "CURSOR RIGHT"),
    (16, "GRAPHICS"),
    (15, "DELETE"),
    (35, "BREAK"),
    (36, "EXTENDED MODE"),
];

/// SYMBOL SHIFT + key: (other position, logical key).
///
/// Only the punctuation legends. The BASIC keyword tokens (STOP, NOT, <=, ...)
/// have no PC counterpart and fall back to the generic description.
const SYMBOL_SHIFT_COMBOS: &[(usize, &str)] = &[
    (0, "!"),
    (1, "@"),
    (2, "#"),
    (3, "$"),
    (4, "%"),
    (19, "&"),
    (18, "'"),
    (17, "("),
    (16, ")"),
    (15, "_"),
    (8, "<"),
    (9, ">"),
    (21, ";"),
    (20, "\""),
    (34, "^"),
    (33, "-"),
    (32, "+"),
    (31, "="),
    (26, ":"),
    (27, "£"),
    (28, "?"),
    (29, "/"),
    (39, "*"),
    (38, ","),
    (37, "."),
];

/// Logical keys with a direct HID substitute. `None` means "emit the
/// modifier plus the base key instead".
const SPECIAL_KEYS: &[(&str, Option<HidKeycode>)] = &[
    ("CURSOR LEFT", Some(HidKeycode::LEFT_ARROW)),
    ("CURSOR DOWN", Some(HidKeycode::DOWN_ARROW)),
    ("CURSOR UP", Some(HidKeycode::UP_ARROW)),
    ("CURSOR RIGHT", Some(HidKeycode::RIGHT_ARROW)),
    ("DELETE", Some(HidKeycode::BACKSPACE)),
    ("CAPS LOCK", Some(HidKeycode::CAPS_LOCK)),
    ("BREAK", Some(HidKeycode::ESCAPE)),
    ("EDIT", None),
    ("TRUE VIDEO", None),
    ("INV VIDEO", None),
    ("GRAPHICS", None),
    ("EXTENDED MODE", None),
    ("'", Some(HidKeycode::QUOTE)),
    (";", Some(HidKeycode::SEMICOLON)),
    ("-", Some(HidKeycode::MINUS)),
    ("=", Some(HidKeycode::EQUALS)),
    ("/", Some(HidKeycode::FORWARD_SLASH)),
    (",", Some(HidKeycode::COMMA)),
    (".", Some(HidKeycode::PERIOD)),
];

/// SYMBOL SHIFT + digit where the PC symbol is Shift + the same digit on a US
/// layout: transmit Shift instead of Alt.
const SWAP_MODIFIERS: &[(usize, usize)] = &[(36, 0), (36, 1), (36, 2), (36, 3), (36, 4)];

/// Symbolic identity of a legacy key, distinct from any HID keycode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogicalKeyName(Cow<'static, str>);

impl LogicalKeyName {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for LogicalKeyName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalKeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for LogicalKeyName {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for LogicalKeyName {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl From<Cow<'static, str>> for LogicalKeyName {
    fn from(name: Cow<'static, str>) -> Self {
        Self(name)
    }
}

/// Mapping from (modifier, other) to a logical key, modifier first.
#[derive(Debug, Clone, Default)]
pub struct ComboTable {
    entries: HashMap<(MatrixPosition, MatrixPosition), LogicalKeyName>,
}

impl ComboTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        modifier: MatrixPosition,
        other: MatrixPosition,
        name: impl Into<LogicalKeyName>,
    ) -> Option<LogicalKeyName> {
        self.entries.insert((modifier, other), name.into())
    }

    pub fn get(&self, modifier: MatrixPosition, other: MatrixPosition) -> Option<&LogicalKeyName> {
        self.entries.get(&(modifier, other))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn from_entries(modifier: MatrixPosition, entries: &[(usize, &'static str)]) -> Self {
        let mut table = Self::new();
        for &(other, name) in entries {
            table.insert(modifier, MatrixPosition(other), name);
        }
        table
    }
}

/// Logical key to its direct HID substitute.
#[derive(Debug, Clone, Default)]
pub struct SpecialHidMap {
    entries: HashMap<LogicalKeyName, Option<HidKeycode>>,
}

impl SpecialHidMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<LogicalKeyName>, keycode: Option<HidKeycode>) {
        self.entries.insert(name.into(), keycode);
    }

    /// The substitute keycode, or `None` when the key has no entry or its
    /// entry is explicitly empty.
    pub fn keycode(&self, name: &str) -> Option<HidKeycode> {
        self.entries.get(name).copied().flatten()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// (modifier, other) pairs for which the other modifier's keycode is sent.
#[derive(Debug, Clone, Default)]
pub struct SwapTable {
    pairs: HashSet<(MatrixPosition, MatrixPosition)>,
}

impl SwapTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, modifier: MatrixPosition, other: MatrixPosition, swap: bool) {
        if swap {
            self.pairs.insert((modifier, other));
        } else {
            self.pairs.remove(&(modifier, other));
            self.pairs.remove(&(other, modifier));
        }
    }

    /// Pairs are unordered; either orientation matches.
    pub fn contains(&self, a: MatrixPosition, b: MatrixPosition) -> bool {
        self.pairs.contains(&(a, b)) || self.pairs.contains(&(b, a))
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Which position-to-keycode table the engine transmits with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyMode {
    /// Standard PC keyboard layout
    #[default]
    Pc,
    /// Reserved for a native legacy layout
    Native,
}

impl KeyMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pc => "PC",
            Self::Native => "Native",
        }
    }
}

/// Matrix position to plain HID keycode for one mode.
#[derive(Debug, Clone)]
pub struct ModeTable {
    mode: KeyMode,
    keys: Vec<HidKeycode>,
}

impl ModeTable {
    pub fn new(mode: KeyMode, keys: Vec<HidKeycode>) -> Self {
        Self { mode, keys }
    }

    pub fn mode(&self) -> KeyMode {
        self.mode
    }

    pub fn keycode(&self, pos: MatrixPosition) -> Option<HidKeycode> {
        self.keys.get(pos.index()).copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// All immutable lookup data for one keyboard.
#[derive(Debug, Clone)]
pub struct Layout {
    pub row_count: usize,
    pub col_count: usize,
    pub caps_shift: MatrixPosition,
    pub symbol_shift: MatrixPosition,
    pub key_names: Vec<&'static str>,
    pub caps_combos: ComboTable,
    pub symbol_combos: ComboTable,
    pub special: SpecialHidMap,
    pub swaps: SwapTable,
    pub pc_mode: Vec<HidKeycode>,
    pub native_mode: Vec<HidKeycode>,
}

impl Layout {
    /// The reference 8×5 membrane layout.
    pub fn spectrum() -> Self {
        let mut special = SpecialHidMap::new();
        for &(name, keycode) in SPECIAL_KEYS {
            special.insert(name, keycode);
        }

        let mut swaps = SwapTable::new();
        for &(modifier, other) in SWAP_MODIFIERS {
            swaps.set(MatrixPosition(modifier), MatrixPosition(other), true);
        }

        Self {
            row_count: ROW_COUNT,
            col_count: COL_COUNT,
            caps_shift: CAPS_SHIFT_IDX,
            symbol_shift: SYMBOL_SHIFT_IDX,
            key_names: SPECTRUM_KEY_NAMES.to_vec(),
            caps_combos: ComboTable::from_entries(CAPS_SHIFT_IDX, CAPS_SHIFT_COMBOS),
            symbol_combos: ComboTable::from_entries(SYMBOL_SHIFT_IDX, SYMBOL_SHIFT_COMBOS),
            special,
            swaps,
            pc_mode: PC_MODE.to_vec(),
            // No native layout yet; start from the PC map.
            native_mode: PC_MODE.to_vec(),
        }
    }

    pub fn key_count(&self) -> usize {
        self.row_count * self.col_count
    }

    /// Plain legacy name of a position, `KEY_<index>` when unmapped.
    pub fn key_name(&self, pos: MatrixPosition) -> Cow<'static, str> {
        match self.key_names.get(pos.index()) {
            Some(name) => Cow::Borrowed(*name),
            None => Cow::Owned(format!("KEY_{}", pos.index())),
        }
    }

    pub fn is_modifier(&self, pos: MatrixPosition) -> bool {
        pos == self.caps_shift || pos == self.symbol_shift
    }

    /// The shift key that is not `pos`, if `pos` is one of the two.
    pub fn other_modifier(&self, pos: MatrixPosition) -> Option<MatrixPosition> {
        if pos == self.caps_shift {
            Some(self.symbol_shift)
        } else if pos == self.symbol_shift {
            Some(self.caps_shift)
        } else {
            None
        }
    }

    pub fn mode_table(&self, mode: KeyMode) -> ModeTable {
        let keys = match mode {
            KeyMode::Pc => self.pc_mode.clone(),
            KeyMode::Native => self.native_mode.clone(),
        };
        ModeTable::new(mode, keys)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::spectrum()
    }
}
