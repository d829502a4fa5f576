//! Synthetic stand-in camera.
//!
//! Exists so the crate (and binary) run on machines without an IR camera
//! attached: it emits dark idle frames with periodic bright bursts that look
//! like an IR marker lighting up. Output is fully deterministic per frame
//! index, which also makes it useful in tests and demos.

use std::time::Duration;

use chrono::Utc;
use image::{GrayImage, Luma};

use crate::camera::{CameraError, Frame, FrameSource};

/// Frames between the start of one burst and the next.
const BURST_PERIOD: u64 = 90;

/// Consecutive bright frames per burst.
const BURST_LEN: u64 = 6;

/// Radius of the synthetic marker blob, in pixels.
const BLOB_RADIUS: i64 = 6;

/// A deterministic frame generator pacing itself like a real camera.
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    frame_interval: Duration,
    frame_limit: Option<u64>,
    frames_emitted: u64,
}

impl SyntheticCamera {
    /// Create a camera producing `width`x`height` frames at roughly 30 fps.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_interval: Duration::from_millis(33),
            frame_limit: None,
            frames_emitted: 0,
        }
    }

    /// Disconnect after emitting `limit` frames.
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    /// Override the inter-frame pacing delay (zero for tests).
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    fn compose(&self, index: u64) -> GrayImage {
        let mut pixels = GrayImage::new(self.width, self.height);

        if index % BURST_PERIOD < BURST_LEN {
            // Marker position drifts a little from burst to burst.
            let burst = index / BURST_PERIOD;
            let cx = (self.width as i64 / 2 + (burst as i64 % 5) - 2).max(BLOB_RADIUS);
            let cy = (self.height as i64 / 2).max(BLOB_RADIUS);

            for y in (cy - BLOB_RADIUS)..=(cy + BLOB_RADIUS) {
                for x in (cx - BLOB_RADIUS)..=(cx + BLOB_RADIUS) {
                    if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
                        continue;
                    }
                    let dx = x - cx;
                    let dy = y - cy;
                    if dx * dx + dy * dy <= BLOB_RADIUS * BLOB_RADIUS {
                        pixels.put_pixel(x as u32, y as u32, Luma([255]));
                    }
                }
            }
        }

        pixels
    }
}

impl FrameSource for SyntheticCamera {
    fn next_frame(&mut self) -> Result<Frame, CameraError> {
        if let Some(limit) = self.frame_limit {
            if self.frames_emitted >= limit {
                return Err(CameraError::Disconnected);
            }
        }

        if !self.frame_interval.is_zero() {
            std::thread::sleep(self.frame_interval);
        }

        let frame = Frame::from_luma(Utc::now(), self.compose(self.frames_emitted));
        self.frames_emitted += 1;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bright_count(frame: &Frame) -> usize {
        frame.pixels.pixels().filter(|p| p.0[0] > 0).count()
    }

    #[test]
    fn test_bursts_alternate_with_dark_frames() {
        let mut camera = SyntheticCamera::new(64, 64)
            .with_frame_interval(Duration::ZERO)
            .with_frame_limit(BURST_PERIOD);

        let mut bright_frames = 0;
        while let Ok(frame) = camera.next_frame() {
            if bright_count(&frame) > 0 {
                bright_frames += 1;
            }
        }
        assert_eq!(bright_frames, BURST_LEN as usize);
    }

    #[test]
    fn test_frame_limit_disconnects() {
        let mut camera = SyntheticCamera::new(8, 8)
            .with_frame_interval(Duration::ZERO)
            .with_frame_limit(2);

        assert!(camera.next_frame().is_ok());
        assert!(camera.next_frame().is_ok());
        assert!(matches!(
            camera.next_frame(),
            Err(CameraError::Disconnected)
        ));
    }
}
