//! Spectrum HID - 40-key membrane keyboard to USB HID input resolution
//!
//! Scans an 8×5 key matrix, debounces it, resolves CAPS SHIFT / SYMBOL SHIFT
//! combinations into legacy logical keys and emits matching HID press and
//! release events, with every release driven from a ledger of what was sent.

pub mod config;
pub mod engine;
pub mod hid;
pub mod keyboard;
pub mod matrix;
pub mod report;

pub use config::Config;
pub use engine::{Engine, EngineOptions, EngineStats};
