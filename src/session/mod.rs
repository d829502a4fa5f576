//! Recording sessions.
//!
//! [`RecordingSession`] is the context object that owns all per-session
//! state: the per-frame pipeline (extract → window → analyze → detect), the
//! three record streams, and the shared recording flag. Nothing here is
//! process-global; callers hold the session and hand it a frame source and
//! a persistence sink.

pub mod logs;
pub mod reporter;
pub mod stats;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::camera::{CameraError, Frame, FrameSource};
use crate::config::Config;
use crate::core::analyzer::compute_fluctuation;
use crate::core::calibrator::{
    CalibrationError, CalibrationProfile, CalibrationStep, Calibrator,
};
use crate::core::detector::{EventDetector, ThresholdCell, TypingEvent};
use crate::core::extractor::FrameFeatureExtractor;
use crate::core::window::SlidingWindowBuffer;

pub use logs::{SampleLog, SessionLogs, SignalRecord, SkewnessSample};
pub use reporter::{
    publish_if_ready, spawn_reporter, ReportSink, DEFAULT_REPORT_INTERVAL_SECS,
    DEFAULT_REPORT_MIN_SAMPLES,
};
pub use stats::{SessionStats, SharedSessionStats, StatsTotals};

/// Persistence collaborator for session record streams.
pub trait SessionSink {
    fn persist(&self, logs: &SessionLogs) -> std::io::Result<()>;
}

/// Why a recording session ended abnormally.
#[derive(Debug)]
pub enum SessionError {
    /// The frame source failed while recording was still active. The
    /// accumulated logs were flushed before this was surfaced.
    Capture(CameraError),
    /// The persistence sink rejected the final flush.
    Persist(std::io::Error),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Capture(e) => write!(f, "capture failed: {e}"),
            SessionError::Persist(e) => write!(f, "could not persist session logs: {e}"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Errors from a calibration run driven by live frames.
#[derive(Debug)]
pub enum CalibrationRunError {
    Calibration(CalibrationError),
    Capture(CameraError),
}

impl From<CalibrationError> for CalibrationRunError {
    fn from(e: CalibrationError) -> Self {
        CalibrationRunError::Calibration(e)
    }
}

impl std::fmt::Display for CalibrationRunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalibrationRunError::Calibration(e) => write!(f, "{e}"),
            CalibrationRunError::Capture(e) => write!(f, "capture failed during calibration: {e}"),
        }
    }
}

impl std::error::Error for CalibrationRunError {}

/// End-of-session summary.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub session_id: String,
    pub started: DateTime<Utc>,
    pub ended: DateTime<Utc>,
    pub frames: usize,
    pub events: usize,
}

/// One recording session's state and per-frame pipeline.
pub struct RecordingSession {
    session_id: String,
    device: String,
    started: DateTime<Utc>,
    extractor: FrameFeatureExtractor,
    window: SlidingWindowBuffer,
    detector: EventDetector,
    threshold: Arc<ThresholdCell>,
    signal_log: Vec<SignalRecord>,
    event_log: Vec<TypingEvent>,
    skewness_log: Arc<SampleLog>,
    stats: SharedSessionStats,
    running: Arc<AtomicBool>,
}

impl RecordingSession {
    pub fn new(config: &Config) -> Self {
        Self::with_stats(config, Arc::new(SessionStats::new()))
    }

    /// Create a session sharing an externally owned stats tracker.
    pub fn with_stats(config: &Config, stats: SharedSessionStats) -> Self {
        let threshold = Arc::new(ThresholdCell::new(config.detection_threshold));
        let device = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown".to_string());

        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            device,
            started: Utc::now(),
            extractor: FrameFeatureExtractor::new(config.binarize_cutoff, config.blob_noise_floor),
            window: SlidingWindowBuffer::new(config.window_capacity),
            detector: EventDetector::new(threshold.clone()),
            threshold,
            signal_log: Vec::new(),
            event_log: Vec::new(),
            skewness_log: Arc::new(SampleLog::new()),
            stats,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The shared recording flag. Clearing it stops the capture loop at the
    /// next frame boundary.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// The shared skewness log the reporter reads from.
    pub fn skewness_log(&self) -> Arc<SampleLog> {
        self.skewness_log.clone()
    }

    /// The shared threshold handle.
    pub fn threshold_cell(&self) -> Arc<ThresholdCell> {
        self.threshold.clone()
    }

    pub fn stats(&self) -> SharedSessionStats {
        self.stats.clone()
    }

    /// Apply a successful calibration to the live detector.
    pub fn apply_calibration(&self, profile: &CalibrationProfile) {
        self.detector.apply_profile(profile);
        self.stats.record_calibration_applied();
    }

    /// Run one frame through the pipeline.
    ///
    /// Returns the typing event the frame produced, if any. Warm-up windows
    /// and zero-variance windows are quietly treated as no-event.
    pub fn process_frame(&mut self, frame: &Frame) -> Option<TypingEvent> {
        let features = self.extractor.extract(frame);
        self.stats.record_frame();

        self.signal_log.push(SignalRecord {
            timestamp: features.timestamp,
            signal_strength: features.signal_strength,
            contour_count: features.contour_count,
        });

        self.window.push(features);
        if !self.window.is_full() {
            return None;
        }
        self.stats.record_window_analyzed();

        let fluctuation = compute_fluctuation(&self.window)?;
        self.skewness_log.append(SkewnessSample {
            timestamp: frame.timestamp,
            skewness: fluctuation.skewness,
            variance: fluctuation.variance,
        });

        let event = self.detector.detect(fluctuation.skewness, &self.window)?;
        self.stats.record_event();
        self.event_log.push(event.clone());
        Some(event)
    }

    /// Drive the capture loop until the recording flag clears or the source
    /// fails.
    ///
    /// On either exit path the accumulated record streams are flushed to the
    /// sink first; a capture failure is surfaced only after the flush so no
    /// in-memory data is lost with it.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        sink: &dyn SessionSink,
    ) -> Result<SessionSummary, SessionError> {
        info!(session_id = %self.session_id, "recording started");

        let capture_error = loop {
            if !self.running.load(Ordering::SeqCst) {
                break None;
            }
            match source.next_frame() {
                Ok(frame) => {
                    self.process_frame(&frame);
                }
                Err(e) => break Some(e),
            }
        };

        // A source error observed after the flag was cleared is just the
        // producer shutting down with us.
        let fatal = capture_error
            .filter(|_| self.running.load(Ordering::SeqCst));
        self.running.store(false, Ordering::SeqCst);

        let ended = Utc::now();
        let logs = self.drain_logs(ended);
        let summary = SessionSummary {
            session_id: logs.session_id.clone(),
            started: logs.started,
            ended,
            frames: logs.signal_log.len(),
            events: logs.event_log.len(),
        };
        let persisted = sink.persist(&logs);

        if let Some(e) = fatal {
            if let Err(pe) = persisted {
                warn!("flush after capture failure also failed: {pe}");
            }
            return Err(SessionError::Capture(e));
        }
        persisted.map_err(SessionError::Persist)?;

        info!(
            session_id = %summary.session_id,
            frames = summary.frames,
            events = summary.events,
            "recording stopped"
        );
        Ok(summary)
    }

    fn drain_logs(&mut self, ended: DateTime<Utc>) -> SessionLogs {
        SessionLogs {
            session_id: self.session_id.clone(),
            device: self.device.clone(),
            started: self.started,
            ended,
            signal_log: std::mem::take(&mut self.signal_log),
            skewness_log: self.skewness_log.snapshot(),
            event_log: std::mem::take(&mut self.event_log),
        }
    }
}

/// Drive a full calibration run from live frames.
///
/// Phase deadlines are evaluated against frame timestamps, so a scripted
/// source calibrates deterministically. On success the caller decides where
/// the profile goes (live detector, config, artifact file); nothing is
/// applied here, keeping the all-or-nothing contract in one place.
pub fn run_calibration(
    source: &mut dyn FrameSource,
    extractor: &FrameFeatureExtractor,
    calibrator: &mut Calibrator,
) -> Result<CalibrationProfile, CalibrationRunError> {
    let first = source.next_frame().map_err(CalibrationRunError::Capture)?;
    calibrator.begin(first.timestamp)?;
    let mut features = extractor.extract(&first);

    loop {
        match calibrator.feed(features.timestamp, features.signal_strength)? {
            CalibrationStep::Completed(profile) => return Ok(profile),
            CalibrationStep::Collecting(_) | CalibrationStep::PhaseAdvanced(_) => {}
        }

        let frame = source.next_frame().map_err(CalibrationRunError::Capture)?;
        features = extractor.extract(&frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn synthetic_frame(bright_pixels: u32) -> Frame {
        // A 600x4 strip: one row-run of N bright pixels = signal strength N.
        let mut pixels = GrayImage::new(600, 4);
        for x in 0..bright_pixels {
            pixels.put_pixel(x, 1, Luma([255]));
        }
        Frame::from_luma(Utc::now(), pixels)
    }

    fn test_config() -> Config {
        Config {
            window_capacity: 10,
            ..Config::default()
        }
    }

    #[test]
    fn test_flat_stream_never_fires() {
        let mut session = RecordingSession::new(&test_config());
        for _ in 0..30 {
            assert!(session.process_frame(&synthetic_frame(10)).is_none());
        }
        assert!(session.skewness_log().is_empty());
    }

    #[test]
    fn test_spike_entering_diffs_fires_once() {
        let mut session = RecordingSession::new(&test_config());

        // Flat warm-up fills the window without determinations.
        for _ in 0..10 {
            assert!(session.process_frame(&synthetic_frame(10)).is_none());
        }

        let mut events = Vec::new();
        for (i, &signal) in [10, 10, 10, 10, 10, 500, 10, 10, 10, 10].iter().enumerate() {
            if session.process_frame(&synthetic_frame(signal)).is_some() {
                events.push(i);
            }
        }

        // Exactly one firing, on the frame that pushed the spike into the
        // diff sequence; the flat sub-windows around it stay quiet.
        assert_eq!(events, vec![5]);
    }
}
