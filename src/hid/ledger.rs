//! Record of what was actually transmitted for each matrix position
//!
//! The keycode chosen at press time may be swapped or replaced by a special
//! substitute, so a release must undo exactly what the ledger says was sent
//! rather than whatever the mode table would suggest now.

use crate::keyboard::{HidKeycode, MatrixPosition};
use std::collections::BTreeMap;

/// What a position's press put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentKey {
    /// A plain or swapped keycode, optionally preceded by a substituted
    /// modifier that must be released along with it
    Key {
        keycode: HidKeycode,
        modifier: Option<HidKeycode>,
    },
    /// A special keycode standing in for the whole combination
    Special(HidKeycode),
    /// Swallowed by a special combination; nothing is outstanding
    Absorbed,
}

impl SentKey {
    pub fn plain(keycode: HidKeycode) -> Self {
        Self::Key {
            keycode,
            modifier: None,
        }
    }

    /// Keycodes to release, in release order.
    pub fn release_order(&self) -> Vec<HidKeycode> {
        match *self {
            Self::Key { keycode, modifier } => {
                let mut keys = vec![keycode];
                keys.extend(modifier);
                keys
            }
            Self::Special(keycode) => vec![keycode],
            Self::Absorbed => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SentLedger {
    entries: BTreeMap<MatrixPosition, SentKey>,
}

impl SentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, pos: MatrixPosition, sent: SentKey) {
        self.entries.insert(pos, sent);
    }

    pub fn take(&mut self, pos: MatrixPosition) -> Option<SentKey> {
        self.entries.remove(&pos)
    }

    pub fn get(&self, pos: MatrixPosition) -> Option<&SentKey> {
        self.entries.get(&pos)
    }

    pub fn contains(&self, pos: MatrixPosition) -> bool {
        self.entries.contains_key(&pos)
    }

    /// Take the special entry for `keycode`, leaving its slot absorbed.
    pub fn take_special(&mut self, keycode: HidKeycode) -> Option<MatrixPosition> {
        let pos = self
            .entries
            .iter()
            .find(|(_, sent)| **sent == SentKey::Special(keycode))
            .map(|(pos, _)| *pos)?;
        self.entries.insert(pos, SentKey::Absorbed);
        Some(pos)
    }

    /// Remove every entry, returning the ones that still hold keycodes.
    pub fn clear(&mut self) -> Vec<(MatrixPosition, SentKey)> {
        std::mem::take(&mut self.entries)
            .into_iter()
            .filter(|(_, sent)| *sent != SentKey::Absorbed)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MatrixPosition, &SentKey)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_take() {
        let mut ledger = SentLedger::new();
        ledger.record(MatrixPosition(3), SentKey::plain(HidKeycode::FOUR));
        assert_eq!(
            ledger.take(MatrixPosition(3)),
            Some(SentKey::plain(HidKeycode::FOUR))
        );
        assert_eq!(ledger.take(MatrixPosition(3)), None);
    }

    #[test]
    fn release_order_puts_modifier_last() {
        let sent = SentKey::Key {
            keycode: HidKeycode::ONE,
            modifier: Some(HidKeycode::LEFT_SHIFT),
        };
        assert_eq!(
            sent.release_order(),
            vec![HidKeycode::ONE, HidKeycode::LEFT_SHIFT]
        );
        assert!(SentKey::Absorbed.release_order().is_empty());
    }

    #[test]
    fn take_special_leaves_slot_absorbed() {
        let mut ledger = SentLedger::new();
        ledger.record(MatrixPosition(17), SentKey::Special(HidKeycode::RIGHT_ARROW));
        assert_eq!(
            ledger.take_special(HidKeycode::RIGHT_ARROW),
            Some(MatrixPosition(17))
        );
        assert_eq!(ledger.get(MatrixPosition(17)), Some(&SentKey::Absorbed));
        assert_eq!(ledger.take_special(HidKeycode::RIGHT_ARROW), None);
    }

    #[test]
    fn clear_returns_outstanding_only() {
        let mut ledger = SentLedger::new();
        ledger.record(MatrixPosition(1), SentKey::Absorbed);
        ledger.record(MatrixPosition(2), SentKey::plain(HidKeycode::TWO));
        let leftover = ledger.clear();
        assert_eq!(leftover, vec![(MatrixPosition(2), SentKey::plain(HidKeycode::TWO))]);
        assert!(ledger.is_empty());
    }
}
