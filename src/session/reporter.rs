//! Periodic visualization snapshots.
//!
//! An independently scheduled thread that wakes at a fixed interval, takes a
//! consistent snapshot of the shared skewness log and hands it, together
//! with the current detection threshold, to a [`ReportSink`]. Publication is
//! gated on a minimum sample count so early snapshots are not noise.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::core::detector::ThresholdCell;
use crate::session::logs::{SampleLog, SkewnessSample};
use crate::session::stats::SharedSessionStats;

/// Default seconds between visualization snapshots.
pub const DEFAULT_REPORT_INTERVAL_SECS: u64 = 10;

/// Default minimum number of skewness samples before anything is published.
pub const DEFAULT_REPORT_MIN_SAMPLES: usize = 30;

/// Consumer of visualization snapshots. The core is opaque beyond "here is
/// the sample sequence so far and the current threshold".
pub trait ReportSink {
    fn publish(&self, samples: &[SkewnessSample], threshold: f64) -> std::io::Result<()>;
}

/// Publish one snapshot if the sample gate is met. Returns whether a
/// snapshot went out.
pub fn publish_if_ready(
    log: &SampleLog,
    threshold: &ThresholdCell,
    min_samples: usize,
    sink: &dyn ReportSink,
) -> bool {
    if log.len() <= min_samples {
        return false;
    }

    let samples = log.snapshot();
    let threshold = threshold.load();
    match sink.publish(&samples, threshold) {
        Ok(()) => {
            debug!(samples = samples.len(), threshold, "report published");
            true
        }
        Err(e) => {
            warn!("report publish failed: {e}");
            false
        }
    }
}

/// Spawn the reporter thread.
///
/// The thread publishes every `interval` while the shared recording flag is
/// set, and exits on the first wake that observes it cleared.
pub fn spawn_reporter(
    log: Arc<SampleLog>,
    threshold: Arc<ThresholdCell>,
    running: Arc<AtomicBool>,
    stats: SharedSessionStats,
    interval: Duration,
    min_samples: usize,
    sink: Box<dyn ReportSink + Send>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut last_publish = Instant::now();
        while running.load(Ordering::SeqCst) {
            // Short sleep slices keep shutdown latency bounded without
            // publishing more often than the configured interval.
            thread::sleep(Duration::from_millis(100).min(interval));

            if last_publish.elapsed() < interval {
                continue;
            }
            last_publish = Instant::now();

            if publish_if_ready(&log, &threshold, min_samples, sink.as_ref()) {
                stats.record_report_published();
            }
        }
        debug!("reporter stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    struct MemorySink {
        published: Mutex<Vec<(usize, f64)>>,
    }

    impl MemorySink {
        fn new() -> Self {
            Self {
                published: Mutex::new(Vec::new()),
            }
        }
    }

    impl ReportSink for MemorySink {
        fn publish(&self, samples: &[SkewnessSample], threshold: f64) -> std::io::Result<()> {
            self.published
                .lock()
                .unwrap()
                .push((samples.len(), threshold));
            Ok(())
        }
    }

    fn fill(log: &SampleLog, count: usize) {
        for i in 0..count {
            log.append(SkewnessSample {
                timestamp: Utc::now(),
                skewness: i as f64 * 0.01,
                variance: 1.0,
            });
        }
    }

    #[test]
    fn test_publish_gated_on_min_samples() {
        let log = SampleLog::new();
        let threshold = ThresholdCell::new(0.8);
        let sink = MemorySink::new();

        fill(&log, 30);
        assert!(!publish_if_ready(&log, &threshold, 30, &sink));

        fill(&log, 1);
        assert!(publish_if_ready(&log, &threshold, 30, &sink));

        let published = sink.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0], (31, 0.8));
    }

    #[test]
    fn test_publish_carries_current_threshold() {
        let log = SampleLog::new();
        let threshold = ThresholdCell::new(0.8);
        let sink = MemorySink::new();
        fill(&log, 5);

        threshold.store(1.25);
        assert!(publish_if_ready(&log, &threshold, 0, &sink));
        assert_eq!(sink.published.lock().unwrap()[0].1, 1.25);
    }
}
