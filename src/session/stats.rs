//! Cumulative session statistics.
//!
//! Lightweight atomic counters updated from the capture loop and the
//! reporter thread, persisted as JSON so `ir-pulse status` can show totals
//! across sessions.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters for the current process, plus totals loaded from disk.
#[derive(Debug)]
pub struct SessionStats {
    /// Frames run through the extractor
    frames_processed: AtomicU64,
    /// Full windows handed to the fluctuation analyzer
    windows_analyzed: AtomicU64,
    /// Typing events fired by the detector
    events_detected: AtomicU64,
    /// Visualization snapshots published by the reporter
    reports_published: AtomicU64,
    /// Successful calibration runs applied
    calibrations_applied: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting totals
    persist_path: Option<PathBuf>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            frames_processed: AtomicU64::new(0),
            windows_analyzed: AtomicU64::new(0),
            events_detected: AtomicU64::new(0),
            reports_published: AtomicU64::new(0),
            calibrations_applied: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a stats tracker seeded from previously persisted totals.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut stats = Self::new();
        stats.persist_path = Some(path);

        if let Err(e) = stats.load() {
            eprintln!("Note: could not load previous session stats: {e}");
        }

        stats
    }

    pub fn record_frame(&self) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_window_analyzed(&self) {
        self.windows_analyzed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event(&self) {
        self.events_detected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_report_published(&self) {
        self.reports_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_calibration_applied(&self) {
        self.calibrations_applied.fetch_add(1, Ordering::Relaxed);
    }

    /// Current snapshot of the counters.
    pub fn totals(&self) -> StatsTotals {
        StatsTotals {
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            windows_analyzed: self.windows_analyzed.load(Ordering::Relaxed),
            events_detected: self.events_detected.load(Ordering::Relaxed),
            reports_published: self.reports_published.load(Ordering::Relaxed),
            calibrations_applied: self.calibrations_applied.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Display summary for the end of a session.
    pub fn summary(&self) -> String {
        let totals = self.totals();
        format!(
            "Session Statistics:\n\
             - Frames processed: {}\n\
             - Windows analyzed: {}\n\
             - Events detected: {}\n\
             - Reports published: {}\n\
             - Calibrations applied: {}\n\
             - Session duration: {} seconds",
            totals.frames_processed,
            totals.windows_analyzed,
            totals.events_detected,
            totals.reports_published,
            totals.calibrations_applied,
            totals.session_duration_secs
        )
    }

    /// Save totals to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let totals = self.totals();
            let persisted = PersistedStats {
                frames_processed: totals.frames_processed,
                windows_analyzed: totals.windows_analyzed,
                events_detected: totals.events_detected,
                reports_published: totals.reports_published,
                calibrations_applied: totals.calibrations_applied,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.frames_processed
                    .store(persisted.frames_processed, Ordering::Relaxed);
                self.windows_analyzed
                    .store(persisted.windows_analyzed, Ordering::Relaxed);
                self.events_detected
                    .store(persisted.events_detected, Ordering::Relaxed);
                self.reports_published
                    .store(persisted.reports_published, Ordering::Relaxed);
                self.calibrations_applied
                    .store(persisted.calibrations_applied, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsTotals {
    pub frames_processed: u64,
    pub windows_analyzed: u64,
    pub events_detected: u64,
    pub reports_published: u64,
    pub calibrations_applied: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Persistence format.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    frames_processed: u64,
    windows_analyzed: u64,
    events_detected: u64,
    reports_published: u64,
    calibrations_applied: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared stats handle.
pub type SharedSessionStats = Arc<SessionStats>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = SessionStats::new();
        stats.record_frame();
        stats.record_frame();
        stats.record_window_analyzed();
        stats.record_event();

        let totals = stats.totals();
        assert_eq!(totals.frames_processed, 2);
        assert_eq!(totals.windows_analyzed, 1);
        assert_eq!(totals.events_detected, 1);
        assert_eq!(totals.reports_published, 0);
    }

    #[test]
    fn test_summary_format() {
        let stats = SessionStats::new();
        stats.record_frame();
        let summary = stats.summary();
        assert!(summary.contains("Frames processed: 1"));
        assert!(summary.contains("Events detected: 0"));
    }
}
