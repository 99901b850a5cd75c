//! Session report and export functionality

use crate::engine::EngineStats;
use crate::keyboard::{KeyMode, Layout, MatrixState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

/// Positions held longer than this many cycles are listed as long holds.
pub const LONG_HOLD_CYCLES: u64 = 5_000;

/// Complete session report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Report metadata
    pub metadata: ReportMetadata,
    /// Summary statistics
    pub summary: SessionSummary,
    /// Per-position press counts, most pressed first
    pub positions: Vec<PositionEntry>,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Report generation timestamp
    pub generated_at: String,
    /// Application version
    pub version: String,
    /// Session duration in seconds
    pub duration_secs: f64,
    /// Mode table in use
    pub mode: String,
}

/// Session summary statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub cycles: u64,
    pub transitions: u64,
    pub descriptions: u64,
    pub max_rollover: usize,
    pub hid_presses: u64,
    pub hid_releases: u64,
    pub shared_presses: u64,
    pub special_presses: u64,
    pub fallback_releases: u64,
    pub drained_keycodes: u64,
    pub sink_errors: u64,
    /// Positions down for longer than [`LONG_HOLD_CYCLES`] at report time
    pub long_holds: Vec<String>,
}

/// Single position entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionEntry {
    pub position: usize,
    pub name: String,
    pub presses: u64,
}

impl SessionReport {
    /// Create a new session report
    pub fn new(
        start_time: Instant,
        stats: EngineStats,
        state: &MatrixState,
        layout: &Layout,
        mode: KeyMode,
    ) -> Self {
        let duration_secs = start_time.elapsed().as_secs_f64();
        let now: DateTime<Utc> = Utc::now();

        let mut positions: Vec<PositionEntry> = (0..layout.key_count())
            .map(crate::keyboard::MatrixPosition)
            .filter_map(|pos| {
                let presses = state.position_stats(pos)?.press_count;
                (presses > 0).then(|| PositionEntry {
                    position: pos.index(),
                    name: layout.key_name(pos).into_owned(),
                    presses,
                })
            })
            .collect();
        positions.sort_by(|a, b| b.presses.cmp(&a.presses).then(a.position.cmp(&b.position)));

        let long_holds = state
            .find_stuck_positions(LONG_HOLD_CYCLES)
            .into_iter()
            .map(|pos| layout.key_name(pos).into_owned())
            .collect();

        Self {
            metadata: ReportMetadata {
                generated_at: now.to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                duration_secs,
                mode: mode.name().to_string(),
            },
            summary: SessionSummary {
                cycles: stats.cycles,
                transitions: stats.transitions,
                descriptions: stats.descriptions,
                max_rollover: stats.max_rollover,
                hid_presses: stats.hid.presses,
                hid_releases: stats.hid.releases,
                shared_presses: stats.hid.shared_presses,
                special_presses: stats.hid.special_presses,
                fallback_releases: stats.hid.fallback_releases,
                drained_keycodes: stats.hid.drained,
                sink_errors: stats.hid.sink_errors,
                long_holds,
            },
            positions,
        }
    }

    /// Export report to JSON file
    pub fn export_json(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Export report to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
