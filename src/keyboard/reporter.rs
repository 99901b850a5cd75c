//! Human-readable descriptions of key transitions
//!
//! Purely observational: nothing in here touches HID state. A shift key held
//! on its own is never described; it is held back in case a partner arrives
//! so the pair is reported as one combined description.

use super::combo::{ComboResolver, NAME_SEPARATOR};
use super::layout::{LogicalKeyName, ModeTable};
use super::{DownSet, HidKeycode, MatrixPosition};
use log::debug;
use std::fmt;
use std::time::{Duration, Instant};

/// Reporting state of one shift key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierReportState {
    /// Not held, or held past the hold timeout without a partner
    Idle,
    /// Held alone, waiting for a partner key
    PendingReport { since: Instant },
    /// Described as part of a combination
    Reported,
}

/// One described transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    /// Resolved logical key
    pub name: LogicalKeyName,
    /// Down positions, ascending
    pub positions: Vec<MatrixPosition>,
    /// Plain mode keycodes of those positions
    pub keycodes: Vec<HidKeycode>,
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.keycodes.is_empty() {
            return write!(f, "Key pressed: {} (UNKNOWN)", self.name);
        }
        let names: Vec<_> = self.keycodes.iter().map(|k| k.name()).collect();
        write!(f, "Key pressed: {} ({})", self.name, names.join(NAME_SEPARATOR))
    }
}

pub struct ChangeReporter {
    resolver: ComboResolver,
    mode: ModeTable,
    hold_timeout: Duration,
    last_reported: Option<DownSet>,
    previous: DownSet,
    modifiers: [(MatrixPosition, ModifierReportState); 2],
}

impl ChangeReporter {
    pub fn new(resolver: ComboResolver, mode: ModeTable, hold_timeout: Duration) -> Self {
        let layout = resolver.layout();
        let modifiers = [
            (layout.caps_shift, ModifierReportState::Idle),
            (layout.symbol_shift, ModifierReportState::Idle),
        ];
        Self {
            resolver,
            mode,
            hold_timeout,
            last_reported: None,
            previous: DownSet::new(),
            modifiers,
        }
    }

    /// Observe this cycle's down-set and describe it if it is new.
    pub fn observe(&mut self, down: &DownSet) -> Option<Description> {
        self.observe_at(down, Instant::now())
    }

    pub fn observe_at(&mut self, down: &DownSet, now: Instant) -> Option<Description> {
        let arrived: DownSet = down.difference(&self.previous).copied().collect();
        self.previous = down.clone();
        self.advance_modifiers(down, &arrived, now);

        if down.is_empty() {
            self.last_reported = None;
            return None;
        }

        // A combination that is no longer fully held may be described again.
        if self
            .last_reported
            .as_ref()
            .is_some_and(|last| !last.is_subset(down))
        {
            self.last_reported = None;
        }

        if self.last_reported.as_ref() == Some(down) {
            return None;
        }

        if down.len() == 1 {
            let only = *down.iter().next()?;
            if self.is_modifier(only) || arrived.is_empty() {
                return None;
            }
        }

        let name = self.resolver.resolve(down)?;
        let positions: Vec<_> = down.iter().copied().collect();
        let keycodes = positions
            .iter()
            .filter_map(|&pos| self.mode.keycode(pos))
            .collect();

        for (pos, state) in self.modifiers.iter_mut() {
            if down.contains(pos) {
                *state = ModifierReportState::Reported;
            }
        }
        self.last_reported = Some(down.clone());

        Some(Description {
            name,
            positions,
            keycodes,
        })
    }

    /// Current reporting state of a shift key.
    pub fn modifier_state(&self, pos: MatrixPosition) -> Option<ModifierReportState> {
        self.modifiers
            .iter()
            .find(|(p, _)| *p == pos)
            .map(|(_, state)| *state)
    }

    fn is_modifier(&self, pos: MatrixPosition) -> bool {
        self.modifiers.iter().any(|(p, _)| *p == pos)
    }

    fn advance_modifiers(&mut self, down: &DownSet, arrived: &DownSet, now: Instant) {
        let layout = self.resolver.layout();
        for (pos, state) in self.modifiers.iter_mut() {
            let held = down.contains(pos);
            *state = match *state {
                ModifierReportState::Idle if arrived.contains(pos) => {
                    ModifierReportState::PendingReport { since: now }
                }
                ModifierReportState::PendingReport { .. } if !held => {
                    debug!("{} released without a partner", layout.key_name(*pos));
                    ModifierReportState::Idle
                }
                ModifierReportState::PendingReport { since }
                    if down.len() == 1 && now.duration_since(since) >= self.hold_timeout =>
                {
                    debug!("{} held alone, not reported", layout.key_name(*pos));
                    ModifierReportState::Idle
                }
                ModifierReportState::Reported if !held => ModifierReportState::Idle,
                other => other,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::down_set;
    use crate::keyboard::layout::{KeyMode, Layout, CAPS_SHIFT_IDX};
    use std::sync::Arc;

    fn reporter() -> ChangeReporter {
        let layout = Arc::new(Layout::spectrum());
        let mode = layout.mode_table(KeyMode::Pc);
        ChangeReporter::new(ComboResolver::new(layout), mode, Duration::from_millis(500))
    }

    #[test]
    fn single_key_is_described_once() {
        let mut reporter = reporter();
        let desc = reporter.observe(&down_set([5])).unwrap();
        assert_eq!(desc.to_string(), "Key pressed: Q (Q)");
        assert!(reporter.observe(&down_set([5])).is_none());
    }

    #[test]
    fn lone_modifier_is_held_back_then_combined() {
        let mut reporter = reporter();
        assert!(reporter.observe(&down_set([25])).is_none());
        assert!(matches!(
            reporter.modifier_state(CAPS_SHIFT_IDX),
            Some(ModifierReportState::PendingReport { .. })
        ));

        let desc = reporter.observe(&down_set([25, 17])).unwrap();
        assert_eq!(
            desc.to_string(),
            "Key pressed: CURSOR RIGHT (EIGHT + LEFT_SHIFT)"
        );
        assert_eq!(
            reporter.modifier_state(CAPS_SHIFT_IDX),
            Some(ModifierReportState::Reported)
        );
    }

    #[test]
    fn lone_modifier_engagement_is_never_described() {
        let mut reporter = reporter();
        assert!(reporter.observe(&down_set([36])).is_none());
        assert!(reporter.observe(&down_set([36])).is_none());
        assert!(reporter.observe(&down_set([])).is_none());
        assert_eq!(
            reporter.modifier_state(crate::keyboard::layout::SYMBOL_SHIFT_IDX),
            Some(ModifierReportState::Idle)
        );
    }

    #[test]
    fn hold_timeout_returns_to_idle() {
        let mut reporter = reporter();
        let start = Instant::now();
        reporter.observe_at(&down_set([25]), start);
        reporter.observe_at(&down_set([25]), start + Duration::from_millis(600));
        assert_eq!(
            reporter.modifier_state(CAPS_SHIFT_IDX),
            Some(ModifierReportState::Idle)
        );
        // A late partner still produces the combined description.
        let desc = reporter
            .observe_at(&down_set([25, 5]), start + Duration::from_millis(700))
            .unwrap();
        assert_eq!(desc.name.as_str(), "CAPS SHIFT + Q");
    }

    #[test]
    fn same_combo_repeated_while_shift_held() {
        let mut reporter = reporter();
        reporter.observe(&down_set([25]));
        assert!(reporter.observe(&down_set([25, 1])).is_some());
        assert!(reporter.observe(&down_set([25])).is_none());
        assert!(reporter.observe(&down_set([25, 1])).is_some());
    }

    #[test]
    fn remaining_key_after_release_is_not_described() {
        let mut reporter = reporter();
        reporter.observe(&down_set([5]));
        assert!(reporter.observe(&down_set([5, 6])).is_some());
        assert!(reporter.observe(&down_set([5])).is_none());
    }

    #[test]
    fn unnamed_multi_key_lists_keycodes() {
        let mut reporter = reporter();
        let desc = reporter.observe(&down_set([5, 6])).unwrap();
        assert_eq!(desc.to_string(), "Key pressed: Q + W (Q + W)");
    }
}
