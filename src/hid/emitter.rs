//! Translation of matrix transitions into HID press/release calls
//!
//! Every keycode handed to the sink is recorded in the [`SentLedger`] under
//! the position that caused it, and releases are driven from the ledger. A
//! release therefore always targets what was transmitted, even when the
//! modifier state has changed since the press.
//!
//! The host sees a set of keys, not a count, so two positions can hold the
//! same keycode at once. The sink is only told about a keycode when its hold
//! count goes from zero to one and back.

use super::ledger::{SentKey, SentLedger};
use super::HidSink;
use crate::keyboard::{
    ComboResolver, CycleTransitions, DownSet, HidKeycode, MatrixPosition, ModeTable,
    ModifierSwapPolicy,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counters kept by the emitter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitterStats {
    /// Keycodes pressed at the sink
    pub presses: u64,
    /// Keycodes released at the sink
    pub releases: u64,
    /// Presses of a keycode another position already held
    pub shared_presses: u64,
    /// Special keycodes pressed in place of a combination
    pub special_presses: u64,
    /// Releases with no ledger entry, recomputed from the layout
    pub fallback_releases: u64,
    /// Keycodes still recorded when every position was up
    pub drained: u64,
    /// Calls the sink reported as failed
    pub sink_errors: u64,
}

pub struct HidEventEmitter<S> {
    resolver: ComboResolver,
    swaps: ModifierSwapPolicy,
    mode: ModeTable,
    ledger: SentLedger,
    /// Ledger entries holding each keycode
    held: BTreeMap<HidKeycode, u32>,
    sink: S,
    stats: EmitterStats,
}

impl<S: HidSink> HidEventEmitter<S> {
    pub fn new(resolver: ComboResolver, mode: ModeTable, sink: S) -> Self {
        let swaps = ModifierSwapPolicy::new(resolver.layout_arc());
        Self {
            resolver,
            swaps,
            mode,
            ledger: SentLedger::new(),
            held: BTreeMap::new(),
            sink,
            stats: EmitterStats::default(),
        }
    }

    pub fn ledger(&self) -> &SentLedger {
        &self.ledger
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn stats(&self) -> EmitterStats {
        self.stats
    }

    /// Keycodes the host currently sees pressed.
    pub fn held_keycodes(&self) -> impl Iterator<Item = HidKeycode> + '_ {
        self.held.keys().copied()
    }

    pub fn is_held(&self, keycode: HidKeycode) -> bool {
        self.held.contains_key(&keycode)
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Apply one cycle's transitions. Releases are handled before presses.
    pub fn apply(&mut self, transitions: &CycleTransitions) {
        let mut down = transitions.previous.clone();
        for pos in transitions.releases() {
            self.on_release(pos, &down);
            down.remove(&pos);
        }

        if transitions.current.is_empty() && !self.ledger.is_empty() {
            self.drain();
        }

        for pos in transitions.presses() {
            self.on_press(pos, &transitions.current);
        }
    }

    /// Release everything still recorded. Used on shutdown.
    pub fn release_all(&mut self) {
        for (pos, sent) in self.ledger.clear() {
            debug!("releasing {} held by position {}", describe(&sent), pos);
            for keycode in sent.release_order() {
                self.release(keycode);
            }
        }
    }

    fn on_press(&mut self, pos: MatrixPosition, down: &DownSet) {
        // Already swallowed by a special combination earlier this cycle.
        if self.ledger.contains(pos) {
            return;
        }

        if let Some(special) = self.resolver.special_keycode(down) {
            self.press_special(pos, special, down);
            return;
        }

        let layout = self.resolver.layout();
        let Some(plain) = self.mode.keycode(pos) else {
            debug!("position {} has no keycode in {} mode", pos, self.mode.mode().name());
            return;
        };

        let mut keycode = plain;
        let mut companion = None;

        if layout.is_modifier(pos) {
            let swapped = down
                .iter()
                .any(|&other| other != pos && self.swaps.swap_needed(pos, other));
            if swapped {
                if let Some(sub) = self.substitute_keycode(pos) {
                    keycode = sub;
                }
            }
        } else {
            for modifier in [layout.caps_shift, layout.symbol_shift] {
                if down.contains(&modifier) {
                    if self.swaps.swap_needed(modifier, pos) {
                        companion = self.substitute_keycode(modifier);
                    }
                    break;
                }
            }
        }

        if let Some(modifier) = companion {
            self.press(modifier);
        }
        self.press(keycode);
        self.ledger.record(
            pos,
            SentKey::Key {
                keycode,
                modifier: companion,
            },
        );
    }

    fn press_special(&mut self, pos: MatrixPosition, special: HidKeycode, down: &DownSet) {
        // The combination that produced it is still held; don't press it twice.
        if self.ledger.iter().any(|(_, sent)| *sent == SentKey::Special(special)) {
            self.ledger.record(pos, SentKey::Absorbed);
            return;
        }

        for &other in down.iter().filter(|&&other| other != pos) {
            if let Some(sent) = self.ledger.take(other) {
                for keycode in sent.release_order() {
                    self.release(keycode);
                }
            }
            self.ledger.record(other, SentKey::Absorbed);
        }

        self.press(special);
        self.stats.special_presses += 1;
        self.ledger.record(pos, SentKey::Special(special));
    }

    fn on_release(&mut self, pos: MatrixPosition, previous: &DownSet) {
        let mut released_any = false;

        if let Some(special) = self.resolver.special_keycode(previous) {
            let mut remaining = previous.clone();
            remaining.remove(&pos);
            // Still held if the rest of the combination resolves the same way.
            if self.resolver.special_keycode(&remaining) != Some(special)
                && self.ledger.take_special(special).is_some()
            {
                self.release(special);
                released_any = true;
            }
        }

        match self.ledger.take(pos) {
            Some(sent) => {
                for keycode in sent.release_order() {
                    self.release(keycode);
                }
            }
            None if !released_any => self.fallback_release(pos, previous),
            None => {}
        }
    }

    /// Release with no ledger entry: recompute the keycode the press would
    /// have produced against the previous down-set.
    fn fallback_release(&mut self, pos: MatrixPosition, previous: &DownSet) {
        let Some(mut keycode) = self.mode.keycode(pos) else {
            return;
        };
        if self.resolver.layout().is_modifier(pos) {
            let swapped = previous
                .iter()
                .any(|&other| other != pos && self.swaps.swap_needed(pos, other));
            if swapped {
                if let Some(sub) = self.substitute_keycode(pos) {
                    keycode = sub;
                }
            }
        }
        if self.is_held(keycode) {
            warn!(
                "no ledger entry for position {}, {} is held elsewhere so not releasing",
                pos, keycode
            );
            return;
        }
        warn!(
            "no ledger entry for position {}, releasing {}",
            pos, keycode
        );
        self.stats.fallback_releases += 1;
        self.send_release(keycode);
    }

    fn drain(&mut self) {
        for (pos, sent) in self.ledger.clear() {
            warn!(
                "position {} still held {} with every key up, releasing",
                pos,
                describe(&sent)
            );
            for keycode in sent.release_order() {
                self.stats.drained += 1;
                self.release(keycode);
            }
        }
    }

    fn substitute_keycode(&self, modifier: MatrixPosition) -> Option<HidKeycode> {
        self.swaps
            .substitute_for(modifier)
            .and_then(|other| self.mode.keycode(other))
    }

    fn press(&mut self, keycode: HidKeycode) {
        let count = self.held.entry(keycode).or_insert(0);
        *count += 1;
        if *count > 1 {
            debug!("{} already held, {} holders", keycode, count);
            self.stats.shared_presses += 1;
            return;
        }

        debug!("press {}", keycode);
        self.stats.presses += 1;
        if let Err(e) = self.sink.press(keycode) {
            self.stats.sink_errors += 1;
            warn!("press {} failed: {}", keycode, e);
        }
    }

    fn release(&mut self, keycode: HidKeycode) {
        if let Some(count) = self.held.get_mut(&keycode) {
            *count -= 1;
            if *count > 0 {
                debug!("{} still held by {} other(s)", keycode, count);
                return;
            }
            self.held.remove(&keycode);
        }
        self.send_release(keycode);
    }

    fn send_release(&mut self, keycode: HidKeycode) {
        debug!("release {}", keycode);
        self.stats.releases += 1;
        if let Err(e) = self.sink.release(keycode) {
            self.stats.sink_errors += 1;
            warn!("release {} failed: {}", keycode, e);
        }
    }
}

fn describe(sent: &SentKey) -> String {
    let names: Vec<_> = sent.release_order().iter().map(|k| k.name()).collect();
    names.join(" + ")
}
