//! In-process HID sinks

use super::{HidSink, SinkError};
use crate::keyboard::HidKeycode;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

/// One call made on a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HidAction {
    Press(HidKeycode),
    Release(HidKeycode),
}

impl HidAction {
    pub fn keycode(&self) -> HidKeycode {
        match *self {
            Self::Press(k) | Self::Release(k) => k,
        }
    }
}

impl fmt::Display for HidAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Press(k) => write!(f, "press {}", k),
            Self::Release(k) => write!(f, "release {}", k),
        }
    }
}

/// Sink that keeps every successful call in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    actions: Vec<HidAction>,
    failures_pending: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> &[HidAction] {
        &self.actions
    }

    pub fn count_presses(&self, keycode: HidKeycode) -> usize {
        self.actions
            .iter()
            .filter(|a| **a == HidAction::Press(keycode))
            .count()
    }

    pub fn count_releases(&self, keycode: HidKeycode) -> usize {
        self.actions
            .iter()
            .filter(|a| **a == HidAction::Release(keycode))
            .count()
    }

    /// Make the next `count` calls fail without being recorded.
    pub fn fail_next(&mut self, count: usize) {
        self.failures_pending = count;
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    fn record(&mut self, action: HidAction) -> Result<(), SinkError> {
        if self.failures_pending > 0 {
            self.failures_pending -= 1;
            return Err(SinkError::Io(io::Error::new(
                io::ErrorKind::Other,
                format!("injected failure on {}", action),
            )));
        }
        self.actions.push(action);
        Ok(())
    }
}

impl HidSink for RecordingSink {
    fn press(&mut self, keycode: HidKeycode) -> Result<(), SinkError> {
        self.record(HidAction::Press(keycode))
    }

    fn release(&mut self, keycode: HidKeycode) -> Result<(), SinkError> {
        self.record(HidAction::Release(keycode))
    }
}

/// Sink that only logs. Used when no HID transport is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl HidSink for LogSink {
    fn press(&mut self, keycode: HidKeycode) -> Result<(), SinkError> {
        info!("HID press {} (0x{:02X})", keycode, keycode.as_u8());
        Ok(())
    }

    fn release(&mut self, keycode: HidKeycode) -> Result<(), SinkError> {
        info!("HID release {} (0x{:02X})", keycode, keycode.as_u8());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let mut sink = RecordingSink::new();
        sink.press(HidKeycode::A).unwrap();
        sink.release(HidKeycode::A).unwrap();
        assert_eq!(
            sink.actions(),
            &[HidAction::Press(HidKeycode::A), HidAction::Release(HidKeycode::A)]
        );
        assert_eq!(sink.count_presses(HidKeycode::A), 1);
        assert_eq!(sink.count_releases(HidKeycode::A), 1);
    }

    #[test]
    fn injected_failures_are_not_recorded() {
        let mut sink = RecordingSink::new();
        sink.fail_next(1);
        assert!(sink.press(HidKeycode::B).is_err());
        assert!(sink.press(HidKeycode::B).is_ok());
        assert_eq!(sink.actions().len(), 1);
    }

    #[test]
    fn action_display() {
        assert_eq!(HidAction::Press(HidKeycode::ENTER).to_string(), "press ENTER");
        assert_eq!(HidAction::Release(HidKeycode::Z).keycode(), HidKeycode::Z);
    }
}
