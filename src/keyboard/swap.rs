//! Modifier swap rules
//!
//! Some legacy combinations only come out right on a PC host when the *other*
//! shift key's keycode is transmitted as well, e.g. SYMBOL SHIFT + 1 is `!`,
//! so the emitter additionally presses Shift alongside the held Alt. This is
//! only consulted when translating a combination into keycodes, never when
//! naming it.

use super::layout::{Layout, SwapTable};
use super::MatrixPosition;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ModifierSwapPolicy {
    layout: Arc<Layout>,
}

impl ModifierSwapPolicy {
    pub fn new(layout: Arc<Layout>) -> Self {
        Self { layout }
    }

    fn table(&self) -> &SwapTable {
        &self.layout.swaps
    }

    /// Whether `(modifier_pos, other_pos)` requires the other modifier's keycode.
    pub fn swap_needed(&self, modifier_pos: MatrixPosition, other_pos: MatrixPosition) -> bool {
        self.layout.is_modifier(modifier_pos) && self.table().contains(modifier_pos, other_pos)
    }

    /// The modifier whose keycode replaces `modifier_pos`'s when swapping.
    pub fn substitute_for(&self, modifier_pos: MatrixPosition) -> Option<MatrixPosition> {
        self.layout.other_modifier(modifier_pos)
    }
}
