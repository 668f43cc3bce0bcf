//! Per-run diagnostic records.
//!
//! Every step of a smoothing run is recorded with a timestamp, severity,
//! and the segment it concerns, so a run can be audited after the fact.
//! The log exports as human-readable text or JSON. Alongside it lives the
//! optional diagnostic table (wavelength, raw counts, smoothed counts per
//! segment) intended for visual inspection by an external plotting layer.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Severity of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
}

/// A single timestamped event of a smoothing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Sequential event number (1-based).
    pub sequence: usize,
    pub timestamp: DateTime<Local>,
    pub severity: Severity,
    /// Segment index (0-based) the event concerns, if any.
    pub segment: Option<usize>,
    pub message: String,
}

impl LogEntry {
    pub fn to_text(&self) -> String {
        let seg = match self.segment {
            Some(i) => format!("CCD {}", i + 1),
            None => "run".to_string(),
        };
        format!(
            "[{:03}] {} {} | {} | {}",
            self.sequence,
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            match self.severity {
                Severity::Info => "INFO",
                Severity::Warning => "WARN",
            },
            seg,
            self.message
        )
    }
}

/// Append-only diagnostic log for one smoothing run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingLog {
    entries: Vec<LogEntry>,
}

impl ProcessingLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, severity: Severity, segment: Option<usize>, message: String) {
        self.entries.push(LogEntry {
            sequence: self.entries.len() + 1,
            timestamp: Local::now(),
            severity,
            segment,
            message,
        });
    }

    pub fn info(&mut self, segment: Option<usize>, message: impl Into<String>) {
        self.push(Severity::Info, segment, message.into());
    }

    pub fn warning(&mut self, segment: Option<usize>, message: impl Into<String>) {
        self.push(Severity::Warning, segment, message.into());
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn warnings(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries
            .iter()
            .filter(|e| e.severity == Severity::Warning)
    }

    pub fn to_text(&self) -> String {
        self.entries
            .iter()
            .map(LogEntry::to_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries)
    }
}

/// One row of the diagnostic table: a channel before and after smoothing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DiagnosticRow {
    /// Segment index (0-based).
    pub segment: usize,
    /// Channel center wavelength (Å).
    pub wavelength: f64,
    /// Raw background counts.
    pub counts: f64,
    /// Smoothed background counts.
    pub smoothed: f64,
}

/// Per-channel before/after table, produced only when diagnostics are
/// enabled. Format and presentation belong to the external layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticTable {
    pub rows: Vec<DiagnosticRow>,
}

impl DiagnosticTable {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.rows)
    }
}

/// Plot color for a segment's diagnostic rows. Derived from the segment
/// index instead of a shared running counter so segment processing stays
/// order-independent.
pub fn segment_color(segment: usize) -> &'static str {
    const COLORS: [&str; 9] = [
        "red", "blue", "green", "orange", "purple", "cyan", "magenta", "yellow", "red",
    ];
    COLORS[segment % COLORS.len()]
}
