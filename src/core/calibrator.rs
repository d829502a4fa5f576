//! Two-phase threshold calibration.
//!
//! The operator first keeps still (baseline phase), then types actively
//! (active phase). Each phase accumulates raw signal-strength samples for a
//! fixed wall-clock duration; the derived threshold is the midpoint of the
//! two phases' absolute diff skewness. The machine is fed `(now, sample)`
//! pairs, so tests drive it with synthetic timestamps.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::stats::{first_differences, fisher_pearson_skewness};

/// Default baseline (subject idle) phase duration, in seconds.
pub const DEFAULT_BASELINE_SECS: u64 = 5;

/// Default active (subject typing) phase duration, in seconds.
pub const DEFAULT_ACTIVE_SECS: u64 = 10;

/// Result of a successful calibration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationProfile {
    pub baseline_skewness: f64,
    pub active_skewness: f64,
    pub derived_threshold: f64,
}

/// Calibration state. Strictly sequential, non-reentrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationPhase {
    Idle,
    BaselineCapture,
    ActiveCapture,
    Done,
}

/// What a single `feed` call did.
#[derive(Debug, Clone)]
pub enum CalibrationStep {
    /// The sample was recorded in the current phase.
    Collecting(CalibrationPhase),
    /// A phase deadline passed; the sample opened the next phase.
    PhaseAdvanced(CalibrationPhase),
    /// The active deadline passed; the run is complete.
    Completed(CalibrationProfile),
}

/// Calibration failures. All-or-nothing: no partial profile is ever
/// produced, and the caller's existing threshold stays untouched.
#[derive(Debug)]
pub enum CalibrationError {
    /// `begin` was called while a run was already in progress.
    AlreadyRunning,
    /// `feed` was called outside a run.
    NotRunning,
    /// A phase ended with fewer than 2 samples; its diff sequence would be
    /// empty.
    InsufficientData {
        phase: &'static str,
        samples: usize,
    },
}

impl std::fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalibrationError::AlreadyRunning => {
                write!(f, "calibration is already running")
            }
            CalibrationError::NotRunning => write!(f, "calibration has not been started"),
            CalibrationError::InsufficientData { phase, samples } => write!(
                f,
                "insufficient data: {phase} phase collected {samples} sample(s), need at least 2"
            ),
        }
    }
}

impl std::error::Error for CalibrationError {}

/// The two-phase calibration state machine.
#[derive(Debug)]
pub struct Calibrator {
    phase: CalibrationPhase,
    baseline_duration: Duration,
    active_duration: Duration,
    phase_started: Option<DateTime<Utc>>,
    baseline: Vec<f64>,
    active: Vec<f64>,
}

impl Calibrator {
    pub fn new(baseline_duration: Duration, active_duration: Duration) -> Self {
        Self {
            phase: CalibrationPhase::Idle,
            baseline_duration,
            active_duration,
            phase_started: None,
            baseline: Vec::new(),
            active: Vec::new(),
        }
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self.phase,
            CalibrationPhase::BaselineCapture | CalibrationPhase::ActiveCapture
        )
    }

    /// Start a run: Idle (or Done) → BaselineCapture.
    ///
    /// Rejected while a run is in progress; the running calibration is
    /// unaffected.
    pub fn begin(&mut self, now: DateTime<Utc>) -> Result<(), CalibrationError> {
        if self.is_running() {
            return Err(CalibrationError::AlreadyRunning);
        }

        self.baseline.clear();
        self.active.clear();
        self.phase = CalibrationPhase::BaselineCapture;
        self.phase_started = Some(now);
        info!(
            duration_secs = self.baseline_duration.as_secs(),
            "baseline capture started"
        );
        Ok(())
    }

    /// Feed one per-frame signal-strength sample into the running phase.
    ///
    /// Phase deadlines are evaluated against `now`: a sample at or past the
    /// baseline deadline opens the active phase and is recorded there; a
    /// sample at or past the active deadline only closes the run.
    pub fn feed(
        &mut self,
        now: DateTime<Utc>,
        signal_strength: f64,
    ) -> Result<CalibrationStep, CalibrationError> {
        match self.phase {
            CalibrationPhase::Idle | CalibrationPhase::Done => Err(CalibrationError::NotRunning),
            CalibrationPhase::BaselineCapture => {
                if self.phase_elapsed(now, self.baseline_duration) {
                    self.close_baseline(now, signal_strength)
                } else {
                    self.baseline.push(signal_strength);
                    Ok(CalibrationStep::Collecting(CalibrationPhase::BaselineCapture))
                }
            }
            CalibrationPhase::ActiveCapture => {
                if self.phase_elapsed(now, self.active_duration) {
                    self.finish()
                } else {
                    self.active.push(signal_strength);
                    Ok(CalibrationStep::Collecting(CalibrationPhase::ActiveCapture))
                }
            }
        }
    }

    fn phase_elapsed(&self, now: DateTime<Utc>, duration: Duration) -> bool {
        match self.phase_started {
            Some(started) => match (now - started).to_std() {
                Ok(elapsed) => elapsed >= duration,
                Err(_) => false,
            },
            None => false,
        }
    }

    fn close_baseline(
        &mut self,
        now: DateTime<Utc>,
        signal_strength: f64,
    ) -> Result<CalibrationStep, CalibrationError> {
        if self.baseline.len() < 2 {
            let samples = self.baseline.len();
            self.abort();
            warn!(samples, "baseline phase under-sampled, calibration aborted");
            return Err(CalibrationError::InsufficientData {
                phase: "baseline",
                samples,
            });
        }

        self.phase = CalibrationPhase::ActiveCapture;
        self.phase_started = Some(now);
        self.active.push(signal_strength);
        info!(
            baseline_samples = self.baseline.len(),
            duration_secs = self.active_duration.as_secs(),
            "active capture started"
        );
        Ok(CalibrationStep::PhaseAdvanced(CalibrationPhase::ActiveCapture))
    }

    fn finish(&mut self) -> Result<CalibrationStep, CalibrationError> {
        if self.active.len() < 2 {
            let samples = self.active.len();
            self.abort();
            warn!(samples, "active phase under-sampled, calibration aborted");
            return Err(CalibrationError::InsufficientData {
                phase: "active",
                samples,
            });
        }

        // Per-phase diff skewness. An all-flat phase has undefined skewness
        // and contributes 0.0 to the midpoint, which is exactly what an
        // idle baseline should do.
        let baseline_skewness =
            fisher_pearson_skewness(&first_differences(&self.baseline)).unwrap_or(0.0);
        let active_skewness =
            fisher_pearson_skewness(&first_differences(&self.active)).unwrap_or(0.0);

        let profile = CalibrationProfile {
            baseline_skewness,
            active_skewness,
            derived_threshold: (baseline_skewness.abs() + active_skewness.abs()) / 2.0,
        };

        self.phase = CalibrationPhase::Done;
        self.phase_started = None;
        info!(
            baseline_skewness,
            active_skewness,
            derived_threshold = profile.derived_threshold,
            "calibration complete"
        );
        Ok(CalibrationStep::Completed(profile))
    }

    fn abort(&mut self) {
        self.phase = CalibrationPhase::Idle;
        self.phase_started = None;
        self.baseline.clear();
        self.active.clear();
    }
}

impl Default for Calibrator {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(DEFAULT_BASELINE_SECS),
            Duration::from_secs(DEFAULT_ACTIVE_SECS),
        )
    }
}
