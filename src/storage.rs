//! JSON persistence for session streams, calibration artifacts and report
//! snapshots.
//!
//! Field order and naming in these files is the contract other tooling
//! reads; structs here change shape only deliberately.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::calibrator::CalibrationProfile;
use crate::session::logs::{SessionLogs, SkewnessSample};
use crate::session::reporter::ReportSink;
use crate::session::SessionSink;

/// Writes session output under a data directory:
///
/// - `sessions/signal_<stamp>.json`, `skewness_<stamp>.json`,
///   `events_<stamp>.json`, `session_<stamp>.json` (manifest)
/// - `calibration_<stamp>.json`
pub struct SessionWriter {
    data_dir: PathBuf,
}

/// Per-session manifest tying the stream files together.
#[derive(Debug, Serialize, Deserialize)]
struct SessionManifest {
    session_id: String,
    device: String,
    started: DateTime<Utc>,
    ended: DateTime<Utc>,
    frames: usize,
    events: usize,
}

impl SessionWriter {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Persist a calibration artifact. Returns the written path.
    pub fn write_calibration(&self, profile: &CalibrationProfile) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.data_dir)?;
        let path = self.data_dir.join(format!(
            "calibration_{}.json",
            Utc::now().format("%Y%m%d_%H%M%S")
        ));
        write_json(&path, profile)?;
        info!(path = %path.display(), "calibration artifact written");
        Ok(path)
    }

    fn sessions_dir(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }
}

impl SessionSink for SessionWriter {
    fn persist(&self, logs: &SessionLogs) -> io::Result<()> {
        let dir = self.sessions_dir();
        std::fs::create_dir_all(&dir)?;

        let stamp = logs.started.format("%Y%m%d_%H%M%S").to_string();
        write_json(&dir.join(format!("signal_{stamp}.json")), &logs.signal_log)?;
        write_json(
            &dir.join(format!("skewness_{stamp}.json")),
            &logs.skewness_log,
        )?;
        write_json(&dir.join(format!("events_{stamp}.json")), &logs.event_log)?;

        let manifest = SessionManifest {
            session_id: logs.session_id.clone(),
            device: logs.device.clone(),
            started: logs.started,
            ended: logs.ended,
            frames: logs.signal_log.len(),
            events: logs.event_log.len(),
        };
        write_json(&dir.join(format!("session_{stamp}.json")), &manifest)?;

        info!(
            dir = %dir.display(),
            frames = manifest.frames,
            events = manifest.events,
            "session streams persisted"
        );
        Ok(())
    }
}

/// One persisted visualization snapshot.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportSnapshot {
    pub generated_at: DateTime<Utc>,
    pub threshold: f64,
    pub samples: Vec<SkewnessSample>,
}

/// Report sink writing one JSON snapshot file per publication.
pub struct JsonReportSink {
    dir: PathBuf,
}

impl JsonReportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ReportSink for JsonReportSink {
    fn publish(&self, samples: &[SkewnessSample], threshold: f64) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let snapshot = ReportSnapshot {
            generated_at: Utc::now(),
            threshold,
            samples: samples.to_vec(),
        };
        let path = self.dir.join(format!(
            "report_{}.json",
            snapshot.generated_at.format("%Y%m%d_%H%M%S")
        ));
        write_json(&path, &snapshot)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    std::fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::detector::{EventLabel, TypingEvent};
    use crate::session::logs::SignalRecord;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ir-pulse-test-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn sample_logs() -> SessionLogs {
        SessionLogs {
            session_id: "test-session".into(),
            device: "bench".into(),
            started: Utc::now(),
            ended: Utc::now(),
            signal_log: vec![SignalRecord {
                timestamp: Utc::now(),
                signal_strength: 42.0,
                contour_count: 2,
            }],
            skewness_log: vec![SkewnessSample {
                timestamp: Utc::now(),
                skewness: 1.5,
                variance: 3.0,
            }],
            event_log: vec![TypingEvent {
                timestamp: Utc::now(),
                label: EventLabel::QuickTap,
            }],
        }
    }

    #[test]
    fn test_session_streams_written_separately() {
        let dir = temp_dir("streams");
        let writer = SessionWriter::new(&dir);
        writer.persist(&sample_logs()).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.join("sessions"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 4);
        for prefix in ["signal_", "skewness_", "events_", "session_"] {
            assert!(
                names.iter().any(|n| n.starts_with(prefix)),
                "missing {prefix} file in {names:?}"
            );
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_signal_rows_round_trip() {
        let dir = temp_dir("rows");
        let writer = SessionWriter::new(&dir);
        let logs = sample_logs();
        writer.persist(&logs).unwrap();

        let signal_path = std::fs::read_dir(dir.join("sessions"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .find(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().starts_with("signal_"))
                    .unwrap_or(false)
            })
            .unwrap();

        let rows: Vec<SignalRecord> =
            serde_json::from_str(&std::fs::read_to_string(signal_path).unwrap()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].signal_strength, 42.0);
        assert_eq!(rows[0].contour_count, 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_calibration_artifact_round_trip() {
        let dir = temp_dir("calib");
        let writer = SessionWriter::new(&dir);
        let path = writer
            .write_calibration(&CalibrationProfile {
                baseline_skewness: 0.0,
                active_skewness: 0.03,
                derived_threshold: 0.015,
            })
            .unwrap();

        let profile: CalibrationProfile =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(profile.derived_threshold, 0.015);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
