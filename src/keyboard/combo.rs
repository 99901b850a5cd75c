//! Resolution of held matrix positions into legacy logical keys
//!
//! The two shift keys are structurally special: a combination is always
//! "one shift key plus one other key". CAPS SHIFT wins over SYMBOL SHIFT when
//! both are down, and with more than one partner only the lowest-numbered
//! partner is considered.

use super::layout::{ComboTable, Layout, LogicalKeyName};
use super::{DownSet, HidKeycode, MatrixPosition};
use std::sync::Arc;

/// Separator between names in synthesized descriptions.
pub const NAME_SEPARATOR: &str = " + ";

/// Maps a set of down positions to a logical key identity.
#[derive(Debug, Clone)]
pub struct ComboResolver {
    layout: Arc<Layout>,
}

impl ComboResolver {
    pub fn new(layout: Arc<Layout>) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn layout_arc(&self) -> Arc<Layout> {
        Arc::clone(&self.layout)
    }

    /// Resolve a down-set to its logical key.
    pub fn resolve(&self, down: &DownSet) -> Option<LogicalKeyName> {
        let mut iter = down.iter();
        let first = *iter.next()?;
        if iter.next().is_none() {
            return Some(self.layout.key_name(first).into());
        }

        let layout = &*self.layout;
        if down.contains(&layout.caps_shift) {
            return Some(self.resolve_shifted(down, layout.caps_shift, &layout.caps_combos));
        }
        if down.contains(&layout.symbol_shift) {
            return Some(self.resolve_shifted(down, layout.symbol_shift, &layout.symbol_combos));
        }

        let names: Vec<_> = down.iter().map(|&pos| layout.key_name(pos)).collect();
        Some(LogicalKeyName::from(names.join(NAME_SEPARATOR)))
    }

    /// The direct HID substitute for a down-set, if it resolves to a special key.
    pub fn special_keycode(&self, down: &DownSet) -> Option<HidKeycode> {
        let name = self.resolve(down)?;
        self.layout.special.keycode(name.as_str())
    }

    fn resolve_shifted(
        &self,
        down: &DownSet,
        modifier: MatrixPosition,
        table: &ComboTable,
    ) -> LogicalKeyName {
        // Callers guarantee at least two positions, so a partner exists.
        let other = match down.iter().copied().find(|&pos| pos != modifier) {
            Some(other) => other,
            None => return self.layout.key_name(modifier).into(),
        };

        match table.get(modifier, other) {
            Some(name) => name.clone(),
            None => LogicalKeyName::from(format!(
                "{}{}{}",
                self.layout.key_name(modifier),
                NAME_SEPARATOR,
                self.layout.key_name(other)
            )),
        }
    }
}
