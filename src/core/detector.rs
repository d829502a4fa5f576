//! Event detection and coarse shape classification.
//!
//! Detection is a single threshold on the skewness magnitude. When it
//! trips, the full window (not just the spiking frame pair) is summarized
//! into shape metrics and run through an ordered rule table.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::calibrator::CalibrationProfile;
use crate::core::window::SlidingWindowBuffer;

/// Default skewness magnitude above which an event fires.
pub const DEFAULT_DETECTION_THRESHOLD: f64 = 0.8;

/// Coarse shape of a detected event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLabel {
    QuickTap,
    SlowPress,
    MultiActive,
    Unknown,
}

/// A detected typing event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingEvent {
    /// Timestamp of the frame whose arrival tripped the detector
    pub timestamp: DateTime<Utc>,
    pub label: EventLabel,
}

/// Window summary the classification rules are evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct ShapeMetrics {
    /// Peak-to-valley spread of signal strength over the window
    pub range: f64,
    /// First index of the peak, normalized by window length
    pub rise_time: f64,
    /// Mean contour count over the window
    pub mean_contour_count: f64,
}

impl ShapeMetrics {
    /// Summarize a window. An empty window (unreachable behind the
    /// full-window gate) yields a neutral mid-window rise time.
    pub fn from_window(window: &SlidingWindowBuffer) -> Self {
        let signals = window.signal_strengths();
        if signals.is_empty() {
            return Self {
                range: 0.0,
                rise_time: 0.5,
                mean_contour_count: 0.0,
            };
        }

        let peak = signals.iter().cloned().fold(f64::MIN, f64::max);
        let valley = signals.iter().cloned().fold(f64::MAX, f64::min);
        let peak_index = signals
            .iter()
            .position(|&s| s == peak)
            .unwrap_or(0);

        let contour_sum: usize = window.iter().map(|f| f.contour_count).sum();

        Self {
            range: peak - valley,
            rise_time: peak_index as f64 / signals.len() as f64,
            mean_contour_count: contour_sum as f64 / signals.len() as f64,
        }
    }
}

/// One classification rule: a predicate over the window shape and the label
/// it produces.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub label: EventLabel,
    pub applies: fn(&ShapeMetrics) -> bool,
}

/// Ordered rule table; the first matching rule wins.
///
/// The default cutoffs are hand-picked field values, not fitted to any
/// labeled dataset. Swap the table if you have better ones.
#[derive(Debug, Clone)]
pub struct ClassificationPolicy {
    rules: Vec<ClassificationRule>,
}

impl ClassificationPolicy {
    pub fn new(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    /// Evaluate the rules in order; unmatched shapes are `Unknown`.
    pub fn classify(&self, metrics: &ShapeMetrics) -> EventLabel {
        self.rules
            .iter()
            .find(|rule| (rule.applies)(metrics))
            .map(|rule| rule.label)
            .unwrap_or(EventLabel::Unknown)
    }
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self::new(vec![
            ClassificationRule {
                label: EventLabel::QuickTap,
                applies: |m| m.range > 1000.0 && m.rise_time < 0.3,
            },
            ClassificationRule {
                label: EventLabel::SlowPress,
                applies: |m| m.range > 500.0 && m.rise_time > 0.5,
            },
            ClassificationRule {
                label: EventLabel::MultiActive,
                applies: |m| m.mean_contour_count > 10.0,
            },
        ])
    }
}

/// Shared, atomically replaceable detection threshold.
///
/// Calibration swaps the value in one store; readers on other threads (the
/// reporter) never observe a torn or intermediate threshold.
#[derive(Debug)]
pub struct ThresholdCell(AtomicU64);

impl ThresholdCell {
    pub fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Thresholds skewness magnitude and labels fired events.
pub struct EventDetector {
    threshold: Arc<ThresholdCell>,
    policy: ClassificationPolicy,
}

impl EventDetector {
    pub fn new(threshold: Arc<ThresholdCell>) -> Self {
        Self {
            threshold,
            policy: ClassificationPolicy::default(),
        }
    }

    pub fn with_policy(threshold: Arc<ThresholdCell>, policy: ClassificationPolicy) -> Self {
        Self { threshold, policy }
    }

    /// Current detection threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold.load()
    }

    /// Replace the threshold with a successfully calibrated one.
    pub fn apply_profile(&self, profile: &CalibrationProfile) {
        self.threshold.store(profile.derived_threshold);
        debug!(
            threshold = profile.derived_threshold,
            "detection threshold recalibrated"
        );
    }

    /// Decide whether a determined skewness value is an event, and if so,
    /// classify it from the current full window.
    pub fn detect(&self, skewness: f64, window: &SlidingWindowBuffer) -> Option<TypingEvent> {
        if skewness.abs() <= self.threshold.load() {
            return None;
        }

        let metrics = ShapeMetrics::from_window(window);
        let label = self.policy.classify(&metrics);
        let timestamp = window.newest().map(|f| f.timestamp).unwrap_or_else(Utc::now);

        debug!(
            skewness,
            range = metrics.range,
            rise_time = metrics.rise_time,
            ?label,
            "typing event fired"
        );

        Some(TypingEvent { timestamp, label })
    }
}
