//! Fluctuation analysis over the windowed signal.
//!
//! Works on the first differences of the window's signal-strength sequence:
//! a typing event shows up as an asymmetric burst of frame-to-frame change,
//! which the skewness of the diff distribution picks out.

use crate::core::stats::{first_differences, fisher_pearson_skewness, population_variance};
use crate::core::window::SlidingWindowBuffer;

/// A determined skewness/variance pair for one full window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fluctuation {
    pub skewness: f64,
    pub variance: f64,
}

/// Analyze the window's differenced signal.
///
/// Returns `None` while the window is still warming up (not yet full) and
/// when the diff sequence has zero variance, where skewness is undefined.
/// Both cases mean "not yet determined": callers must treat them as
/// no-event, never as a computed zero. NaN never escapes this function.
pub fn compute_fluctuation(window: &SlidingWindowBuffer) -> Option<Fluctuation> {
    if !window.is_full() {
        return None;
    }

    let diffs = first_differences(&window.signal_strengths());
    let skewness = fisher_pearson_skewness(&diffs)?;

    Some(Fluctuation {
        skewness,
        variance: population_variance(&diffs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::extractor::FrameFeatures;
    use chrono::Utc;

    fn window_from(signals: &[f64], capacity: usize) -> SlidingWindowBuffer {
        let mut window = SlidingWindowBuffer::new(capacity);
        for &s in signals {
            window.push(FrameFeatures {
                timestamp: Utc::now(),
                signal_strength: s,
                contour_count: 0,
                centroids: vec![],
            });
        }
        window
    }

    #[test]
    fn test_warm_up_is_not_determined() {
        let window = window_from(&[1.0, 2.0, 3.0], 5);
        assert!(compute_fluctuation(&window).is_none());
    }

    #[test]
    fn test_constant_signal_is_not_determined() {
        // All diffs zero: skewness undefined, never a numeric zero that a
        // caller might mistake for a quiet determination.
        let window = window_from(&[7.0, 7.0, 7.0, 7.0, 7.0], 5);
        assert!(compute_fluctuation(&window).is_none());
    }

    #[test]
    fn test_asymmetric_burst_skews_positive() {
        let window = window_from(&[10.0, 10.0, 10.0, 10.0, 300.0], 5);
        let fluctuation = compute_fluctuation(&window).unwrap();
        assert!(fluctuation.skewness > 1.0);
        assert!(fluctuation.variance > 0.0);
    }

    #[test]
    fn test_symmetric_spike_is_determined_zero() {
        // A spike fully inside the window produces a +d/-d diff pair:
        // determined, but with zero skewness.
        let window = window_from(&[10.0, 10.0, 300.0, 10.0, 10.0], 5);
        let fluctuation = compute_fluctuation(&window).unwrap();
        assert!(fluctuation.skewness.abs() < 1e-12);
    }
}
