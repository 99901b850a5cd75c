//! Outbound HID keyboard events
//!
//! The transport is a best-effort sink taking opaque HID usage codes. The
//! emitter decides what to press and release and keeps a ledger of what was
//! actually sent so that every press gets exactly one matching release.

pub mod emitter;
pub mod ledger;
pub mod sink;
#[cfg(target_os = "linux")]
pub mod uinput;

pub use emitter::{EmitterStats, HidEventEmitter};
pub use ledger::{SentKey, SentLedger};
pub use sink::{HidAction, LogSink, RecordingSink};

use crate::keyboard::HidKeycode;
use std::io;
use thiserror::Error;

/// Error type for HID transports
#[derive(Debug, Error)]
pub enum SinkError {
    /// The transport failed to deliver the event
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// The transport has no equivalent for this keycode
    #[error("keycode {0} cannot be sent by this transport")]
    Unmapped(HidKeycode),
}

/// A HID keyboard transport.
pub trait HidSink {
    fn press(&mut self, keycode: HidKeycode) -> Result<(), SinkError>;

    fn release(&mut self, keycode: HidKeycode) -> Result<(), SinkError>;
}

impl<S: HidSink + ?Sized> HidSink for Box<S> {
    fn press(&mut self, keycode: HidKeycode) -> Result<(), SinkError> {
        (**self).press(keycode)
    }

    fn release(&mut self, keycode: HidKeycode) -> Result<(), SinkError> {
        (**self).release(keycode)
    }
}
