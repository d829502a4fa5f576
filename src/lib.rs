//! IR Pulse - real-time IR signal fluctuation analyzer.
//!
//! Watches a stream of camera frames for the flicker of IR markers and
//! turns it into a binary "typing event happened" decision plus a coarse
//! event-shape label. The detection threshold is self-calibrated from two
//! labeled observation phases (idle baseline, active typing).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          IR Pulse                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌───────────┐   ┌─────────┐   ┌──────────┐  │
//! │  │  Frame   │──▶│ Extractor │──▶│ Window  │──▶│ Detector │  │
//! │  │  Source  │   │ (blobs)   │   │ (W=30)  │   │ (skew)   │  │
//! │  └──────────┘   └───────────┘   └─────────┘   └──────────┘  │
//! │        │               │              │             ▲        │
//! │        ▼               ▼              ▼             │        │
//! │  ┌──────────┐   ┌───────────┐   ┌──────────┐  ┌──────────┐  │
//! │  │ Reporter │   │  Session  │   │ Skewness │  │Calibrator│  │
//! │  │ (10s)    │◀──│   Logs    │◀──│   Log    │  │ (2-phase)│  │
//! │  └──────────┘   └───────────┘   └──────────┘  └──────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use ir_pulse::camera::SyntheticCamera;
//! use ir_pulse::config::Config;
//! use ir_pulse::session::RecordingSession;
//! use ir_pulse::storage::SessionWriter;
//!
//! let config = Config::default();
//! let mut session = RecordingSession::new(&config);
//! let writer = SessionWriter::new(&config.data_path);
//!
//! let mut camera = SyntheticCamera::new(640, 480).with_frame_limit(300);
//! let summary = session.run(&mut camera, &writer).expect("session failed");
//! println!("{} events in {} frames", summary.events, summary.frames);
//! ```

pub mod camera;
pub mod config;
pub mod core;
pub mod session;
pub mod storage;

// Re-export key types at crate root for convenience
pub use crate::camera::{CameraError, Frame, FrameSource, SyntheticCamera};
pub use crate::config::{Config, ConfigError};
pub use crate::core::{
    compute_fluctuation, CalibrationError, CalibrationProfile, Calibrator, ClassificationPolicy,
    EventDetector, EventLabel, FrameFeatureExtractor, FrameFeatures, SlidingWindowBuffer,
    ThresholdCell, TypingEvent,
};
pub use crate::session::{
    run_calibration, RecordingSession, SampleLog, SessionError, SessionLogs, SessionSink,
    SessionStats, SessionSummary,
};
pub use crate::storage::{JsonReportSink, SessionWriter};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
