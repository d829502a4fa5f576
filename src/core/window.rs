//! Sliding window over the most recent per-frame feature records.
//!
//! A fixed-capacity FIFO: pushing at capacity evicts the oldest record.
//! The window is the sole mutable shared state of the capture loop and is
//! owned exclusively by the per-frame processing step.

use std::collections::VecDeque;

use crate::core::extractor::FrameFeatures;

/// Default number of frames the analyzer looks back over.
pub const DEFAULT_WINDOW_CAPACITY: usize = 30;

/// Fixed-capacity, oldest-evicted buffer of [`FrameFeatures`].
#[derive(Debug, Clone)]
pub struct SlidingWindowBuffer {
    capacity: usize,
    frames: VecDeque<FrameFeatures>,
}

impl SlidingWindowBuffer {
    /// Create a buffer holding at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "window capacity must be positive");
        Self {
            capacity,
            frames: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a record, evicting the oldest one if the buffer is full.
    pub fn push(&mut self, record: FrameFeatures) {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(record);
    }

    /// Whether the buffer has reached capacity.
    pub fn is_full(&self) -> bool {
        self.frames.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Ordered (oldest-first) copy of the buffered records.
    pub fn snapshot(&self) -> Vec<FrameFeatures> {
        self.frames.iter().cloned().collect()
    }

    /// Ordered copy of the buffered signal strengths.
    pub fn signal_strengths(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.signal_strength).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameFeatures> {
        self.frames.iter()
    }

    /// The most recently pushed record, if any.
    pub fn newest(&self) -> Option<&FrameFeatures> {
        self.frames.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(signal: f64) -> FrameFeatures {
        FrameFeatures {
            timestamp: Utc::now(),
            signal_strength: signal,
            contour_count: 1,
            centroids: vec![],
        }
    }

    #[test]
    fn test_len_never_exceeds_capacity() {
        let mut window = SlidingWindowBuffer::new(4);
        for i in 0..20 {
            window.push(record(i as f64));
            assert!(window.len() <= 4);
        }
    }

    #[test]
    fn test_keeps_last_w_in_push_order() {
        let mut window = SlidingWindowBuffer::new(5);
        for i in 0..12 {
            window.push(record(i as f64));
        }
        assert!(window.is_full());
        assert_eq!(
            window.signal_strengths(),
            vec![7.0, 8.0, 9.0, 10.0, 11.0]
        );
    }

    #[test]
    fn test_not_full_until_capacity() {
        let mut window = SlidingWindowBuffer::new(3);
        window.push(record(1.0));
        window.push(record(2.0));
        assert!(!window.is_full());
        window.push(record(3.0));
        assert!(window.is_full());
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut window = SlidingWindowBuffer::new(2);
        window.push(record(1.0));
        let snapshot = window.snapshot();
        window.push(record(2.0));
        window.push(record(3.0));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].signal_strength, 1.0);
    }
}
