//! Configuration management for Spectrum HID
//!
//! Provides persistent configuration loaded from a platform-specific config
//! file. Every field has a default matching the reference wiring, so a
//! missing file or a missing section is never an error.
//!
//! ## Config File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/spectrum-hid/config.toml` |
//! | macOS | `~/Library/Application Support/spectrum-hid/config.toml` |
//! | Windows | `%APPDATA%\spectrum-hid\config.toml` |
//!
//! ## Example
//!
//! ```no_run
//! use spectrum_hid::Config;
//!
//! let mut config = Config::load().unwrap_or_default();
//! config.debounce.window = 6;
//! config.save().expect("Failed to save config");
//! ```

use crate::keyboard::{HidKeycode, KeyMode, Layout, MatrixPosition};
use crate::matrix::{DiodeOrientation, ScanTiming};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Error type for configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine config directory
    #[error("Could not determine config directory")]
    NoConfigDir,
    /// IO error reading or writing config file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Failed to parse config file
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Failed to serialize config
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// A value that parses but cannot be used
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Returns the path to the config file.
///
/// Creates the config directory if it doesn't exist.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    let app_dir = config_dir.join("spectrum-hid");

    if !app_dir.exists() {
        fs::create_dir_all(&app_dir)?;
    }

    Ok(app_dir.join("config.toml"))
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Matrix wiring and sampling
    #[serde(default)]
    pub matrix: MatrixConfig,
    /// Debounce window
    #[serde(default)]
    pub debounce: DebounceConfig,
    /// Main loop settings
    #[serde(default)]
    pub engine: EngineConfig,
    /// Diagnostic reporting
    #[serde(default)]
    pub report: ReportConfig,
    /// HID transport selection
    #[serde(default)]
    pub output: OutputConfig,
    /// Overrides applied on top of the built-in tables
    #[serde(default)]
    pub mapping: MappingConfig,
}

/// Matrix wiring and sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    /// Row line count
    pub rows: usize,
    /// Column line count
    pub cols: usize,
    /// `ColToRow` drives columns and reads rows, `RowToCol` the reverse
    pub diode_orientation: DiodeOrientation,
    /// Settle time after switching a driven line, in microseconds
    pub settle_us: u32,
    /// Readings per row per column
    pub samples: u8,
    /// Readings that must agree for a closed position
    pub majority: u8,
    /// Gap between readings, in microseconds
    pub sample_interval_us: u32,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        let timing = ScanTiming::default();
        Self {
            rows: crate::keyboard::layout::ROW_COUNT,
            cols: crate::keyboard::layout::COL_COUNT,
            diode_orientation: timing.orientation,
            settle_us: timing.settle_us,
            samples: timing.samples,
            majority: timing.majority,
            sample_interval_us: timing.sample_interval_us,
        }
    }
}

impl MatrixConfig {
    pub fn key_count(&self) -> usize {
        self.rows * self.cols
    }

    pub fn timing(&self) -> ScanTiming {
        ScanTiming {
            orientation: self.diode_orientation,
            settle_us: self.settle_us,
            samples: self.samples,
            majority: self.majority,
            sample_interval_us: self.sample_interval_us,
        }
    }
}

/// Debounce configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Number of scan frames OR-ed together
    pub window: usize,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            window: crate::matrix::debounce::DEFAULT_WINDOW,
        }
    }
}

/// Main loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Mode table used for transmitted keycodes
    pub mode: KeyMode,
    /// Idle time at the end of each cycle, in milliseconds
    pub cycle_delay_ms: u64,
    /// Replay script driving a scripted matrix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay_script: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: KeyMode::Pc,
            cycle_delay_ms: 1,
            replay_script: None,
        }
    }
}

/// Diagnostic reporting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Log one line per described transition
    pub enabled: bool,
    /// How long a lone shift key waits for a partner, in milliseconds
    pub modifier_hold_ms: u64,
    /// Write a JSON session report here on exit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_path: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            modifier_hold_ms: 500,
            export_path: None,
        }
    }
}

/// HID transport options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SinkKind {
    /// Log each press and release
    #[default]
    Log,
    /// Linux uinput virtual keyboard
    Uinput,
}

/// HID transport configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub sink: SinkKind,
}

/// Integrator overrides for the lookup tables
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MappingConfig {
    /// Drop the built-in swap pairs before adding `swap`
    pub clear_swaps: bool,
    /// Extra (modifier, other) swap pairs
    pub swap: Vec<(usize, usize)>,
    /// Logical key name to keycode name. An empty keycode name removes the
    /// direct substitute.
    pub special: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default config file.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.matrix;
        if m.rows == 0 || m.cols == 0 {
            return Err(ConfigError::Invalid(format!(
                "matrix must have rows and columns, got {}x{}",
                m.rows, m.cols
            )));
        }
        if m.samples == 0 || m.majority == 0 || m.majority > m.samples {
            return Err(ConfigError::Invalid(format!(
                "majority {} must be between 1 and samples ({})",
                m.majority, m.samples
            )));
        }
        if self.debounce.window == 0 {
            return Err(ConfigError::Invalid("debounce window must be at least 1".into()));
        }
        self.layout().map(|_| ())
    }

    /// Built-in tables with the `[mapping]` overrides applied.
    pub fn layout(&self) -> Result<Layout, ConfigError> {
        let mut layout = Layout::spectrum();
        layout.row_count = self.matrix.rows;
        layout.col_count = self.matrix.cols;

        for (name, keycode_name) in &self.mapping.special {
            let keycode = if keycode_name.trim().is_empty() {
                None
            } else {
                let keycode = HidKeycode::from_name(keycode_name).ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "unknown keycode '{}' for '{}'",
                        keycode_name, name
                    ))
                })?;
                Some(keycode)
            };
            layout.special.insert(name.clone(), keycode);
        }

        if self.mapping.clear_swaps {
            layout.swaps.clear();
        }
        let key_count = layout.key_count();
        for &(modifier, other) in &self.mapping.swap {
            let (modifier, other) = (MatrixPosition(modifier), MatrixPosition(other));
            if !layout.is_modifier(modifier) {
                return Err(ConfigError::Invalid(format!(
                    "swap pair ({}, {}) must start with a shift position",
                    modifier, other
                )));
            }
            if other.index() >= key_count {
                return Err(ConfigError::Invalid(format!(
                    "swap position {} outside matrix of {} keys",
                    other, key_count
                )));
            }
            layout.swaps.set(modifier, other, true);
        }

        Ok(layout)
    }

    pub fn cycle_delay(&self) -> Duration {
        Duration::from_millis(self.engine.cycle_delay_ms)
    }

    pub fn modifier_hold(&self) -> Duration {
        Duration::from_millis(self.report.modifier_hold_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::layout::{CAPS_SHIFT_IDX, SYMBOL_SHIFT_IDX};
    use std::env;

    fn temp_config_path(tag: &str) -> PathBuf {
        env::temp_dir().join(format!("spectrum-hid-test-{}-{}.toml", tag, std::process::id()))
    }

    #[test]
    fn config_default_values() {
        let config = Config::default();
        assert_eq!(config.matrix.rows, 8);
        assert_eq!(config.matrix.cols, 5);
        assert_eq!(config.matrix.settle_us, 1200);
        assert_eq!(config.matrix.samples, 5);
        assert_eq!(config.matrix.majority, 3);
        assert_eq!(config.matrix.diode_orientation, DiodeOrientation::ColToRow);
        assert_eq!(config.debounce.window, 4);
        assert_eq!(config.engine.mode, KeyMode::Pc);
        assert_eq!(config.output.sink, SinkKind::Log);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_durations() {
        let config = Config::default();
        assert_eq!(config.cycle_delay(), Duration::from_millis(1));
        assert_eq!(config.modifier_hold(), Duration::from_millis(500));
    }

    #[test]
    fn config_save_and_load_roundtrip() {
        let path = temp_config_path("roundtrip");

        let mut config = Config::default();
        config.debounce.window = 7;
        config.engine.mode = KeyMode::Native;
        config.report.export_path = Some(PathBuf::from("/tmp/session.json"));

        config.save_to(&path).expect("Failed to save config");
        let loaded = Config::load_from(&path).expect("Failed to load config");

        assert_eq!(loaded.debounce.window, 7);
        assert_eq!(loaded.engine.mode, KeyMode::Native);
        assert_eq!(
            loaded.report.export_path,
            Some(PathBuf::from("/tmp/session.json"))
        );

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn config_load_missing_file_fails() {
        let path = PathBuf::from("/nonexistent/path/config.toml");
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Io(_))));
    }

    #[test]
    fn config_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[debounce]\nwindow = 2\n").expect("Failed to deserialize");
        assert_eq!(config.debounce.window, 2);
        assert_eq!(config.matrix.rows, 8);
        assert_eq!(config.report.modifier_hold_ms, 500);
    }

    #[test]
    fn config_deserializes_from_toml() {
        let toml_str = r#"
[matrix]
rows = 8
cols = 5
diode_orientation = "RowToCol"
settle_us = 800
samples = 7
majority = 4
sample_interval_us = 50

[engine]
mode = "Native"
cycle_delay_ms = 2

[output]
sink = "Uinput"

[mapping]
clear_swaps = true
swap = [[25, 1]]

[mapping.special]
"DELETE" = "DELETE"
"BREAK" = ""
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to deserialize");
        assert_eq!(config.matrix.settle_us, 800);
        assert_eq!(config.matrix.timing().majority, 4);
        assert_eq!(config.matrix.timing().orientation, DiodeOrientation::RowToCol);
        assert_eq!(config.engine.cycle_delay_ms, 2);
        assert_eq!(config.output.sink, SinkKind::Uinput);

        let layout = config.layout().expect("Failed to build layout");
        assert_eq!(layout.special.keycode("DELETE"), Some(HidKeycode::DELETE));
        assert_eq!(layout.special.keycode("BREAK"), None);
        assert!(layout.swaps.contains(CAPS_SHIFT_IDX, MatrixPosition(1)));
        assert!(!layout.swaps.contains(SYMBOL_SHIFT_IDX, MatrixPosition(0)));
    }

    #[test]
    fn config_rejects_bad_majority() {
        let mut config = Config::default();
        config.matrix.majority = 6;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn config_rejects_unknown_keycode() {
        let mut config = Config::default();
        config
            .mapping
            .special
            .insert("EDIT".into(), "NOT_A_KEY".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_rejects_swap_without_shift() {
        let mut config = Config::default();
        config.mapping.swap.push((3, 4));
        assert!(config.layout().is_err());
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::NoConfigDir;
        assert_eq!(err.to_string(), "Could not determine config directory");

        let io_err = ConfigError::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        assert!(io_err.to_string().contains("IO error"));
    }

    #[test]
    fn config_serializes_sections() {
        let toml_str = toml::to_string_pretty(&Config::default()).expect("Failed to serialize");
        assert!(toml_str.contains("[matrix]"));
        assert!(toml_str.contains("[debounce]"));
        assert!(toml_str.contains("mode = \"Pc\""));
        assert!(!toml_str.contains("export_path"));
    }
}
