//! Session record streams.
//!
//! Three logically separate ordered streams accumulate over a recording
//! session: per-frame signal rows, per-window skewness samples and detected
//! events. The skewness stream is shared with the reporter thread, so it
//! lives behind a brief mutex with an explicit snapshot discipline; the
//! other two stay loop-local.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::detector::TypingEvent;

/// One persisted per-frame row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRecord {
    pub timestamp: DateTime<Utc>,
    pub signal_strength: f64,
    pub contour_count: usize,
}

/// One per-window fluctuation measurement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkewnessSample {
    pub timestamp: DateTime<Utc>,
    pub skewness: f64,
    pub variance: f64,
}

/// Append-only skewness log shared between the capture loop (producer) and
/// the reporter thread (consumer).
///
/// Appends and snapshots each hold the lock only long enough to push or
/// clone; neither task ever hands the other a live mutable container.
#[derive(Debug, Default)]
pub struct SampleLog {
    samples: Mutex<Vec<SkewnessSample>>,
}

impl SampleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, sample: SkewnessSample) {
        self.guard().push(sample);
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consistent ordered copy of the log at this instant.
    pub fn snapshot(&self) -> Vec<SkewnessSample> {
        self.guard().clone()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<SkewnessSample>> {
        // A panicked appender cannot leave a half-written Vec; recover the
        // data instead of poisoning the whole session.
        self.samples.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Everything a finished (or aborted) session hands to persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLogs {
    pub session_id: String,
    pub device: String,
    pub started: DateTime<Utc>,
    pub ended: DateTime<Utc>,
    pub signal_log: Vec<SignalRecord>,
    pub skewness_log: Vec<SkewnessSample>,
    pub event_log: Vec<TypingEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(skewness: f64) -> SkewnessSample {
        SkewnessSample {
            timestamp: Utc::now(),
            skewness,
            variance: 1.0,
        }
    }

    #[test]
    fn test_sample_log_append_and_snapshot() {
        let log = SampleLog::new();
        log.append(sample(0.1));
        log.append(sample(0.2));

        let snapshot = log.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].skewness, 0.1);
        assert_eq!(snapshot[1].skewness, 0.2);

        // The snapshot is detached from the live log.
        log.append(sample(0.3));
        assert_eq!(snapshot.len(), 2);
        assert_eq!(log.len(), 3);
    }
}
