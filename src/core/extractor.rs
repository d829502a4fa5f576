//! Per-frame feature extraction.
//!
//! One frame in, one compact record out: binarize against a brightness
//! cutoff, count the bright pixels, group them into connected blobs and keep
//! the centers of the blobs large enough to be actual markers rather than
//! sensor noise.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::camera::Frame;

/// Brightness cutoff above which a pixel counts as lit.
pub const DEFAULT_BINARIZE_CUTOFF: u8 = 180;

/// Blobs at or below this pixel area are treated as noise when computing
/// centroids. They still count toward `contour_count`.
pub const DEFAULT_NOISE_FLOOR: usize = 5;

/// Compact per-frame feature record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameFeatures {
    /// Capture timestamp of the source frame
    pub timestamp: DateTime<Utc>,
    /// Number of bright pixels after binarization
    pub signal_strength: f64,
    /// Number of connected bright regions, noise blobs included
    pub contour_count: usize,
    /// Centers of the blobs that survived the noise floor
    pub centroids: Vec<(u32, u32)>,
}

/// Stateless frame-to-features converter.
#[derive(Debug, Clone)]
pub struct FrameFeatureExtractor {
    binarize_cutoff: u8,
    noise_floor: usize,
}

impl FrameFeatureExtractor {
    pub fn new(binarize_cutoff: u8, noise_floor: usize) -> Self {
        Self {
            binarize_cutoff,
            noise_floor,
        }
    }

    /// Extract features from one frame. Deterministic, no hidden state.
    pub fn extract(&self, frame: &Frame) -> FrameFeatures {
        let width = frame.width() as usize;
        let height = frame.height() as usize;

        let mask: Vec<bool> = frame
            .pixels
            .as_raw()
            .iter()
            .map(|&p| p > self.binarize_cutoff)
            .collect();

        let signal_strength = mask.iter().filter(|&&lit| lit).count() as f64;

        let blobs = label_blobs(&mask, width, height);
        let contour_count = blobs.len();

        let mut centroids = Vec::new();
        for blob in &blobs {
            // Degenerate zero-area blobs are skipped with the noise, never
            // surfaced as an error.
            if blob.area == 0 || blob.area <= self.noise_floor {
                continue;
            }
            centroids.push((
                (blob.sum_x / blob.area as u64) as u32,
                (blob.sum_y / blob.area as u64) as u32,
            ));
        }

        FrameFeatures {
            timestamp: frame.timestamp,
            signal_strength,
            contour_count,
            centroids,
        }
    }
}

impl Default for FrameFeatureExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_BINARIZE_CUTOFF, DEFAULT_NOISE_FLOOR)
    }
}

/// A connected bright region accumulated during labeling.
struct Blob {
    area: usize,
    sum_x: u64,
    sum_y: u64,
}

/// Flood-fill labeling of maximal 4-connected bright regions.
fn label_blobs(mask: &[bool], width: usize, height: usize) -> Vec<Blob> {
    let mut visited = vec![false; mask.len()];
    let mut blobs = Vec::new();
    let mut queue: Vec<usize> = Vec::new();

    for start in 0..mask.len() {
        if !mask[start] || visited[start] {
            continue;
        }

        let mut blob = Blob {
            area: 0,
            sum_x: 0,
            sum_y: 0,
        };

        visited[start] = true;
        queue.push(start);

        while let Some(index) = queue.pop() {
            let x = index % width;
            let y = index / width;
            blob.area += 1;
            blob.sum_x += x as u64;
            blob.sum_y += y as u64;

            for (dx, dy) in &[(0i64, 1i64), (0, -1), (1, 0), (-1, 0)] {
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                    continue;
                }
                let neighbor = ny as usize * width + nx as usize;
                if mask[neighbor] && !visited[neighbor] {
                    visited[neighbor] = true;
                    queue.push(neighbor);
                }
            }
        }

        blobs.push(blob);
    }

    blobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn frame_with_pixels(width: u32, height: u32, lit: &[(u32, u32)]) -> Frame {
        let mut pixels = GrayImage::new(width, height);
        for &(x, y) in lit {
            pixels.put_pixel(x, y, Luma([255]));
        }
        Frame::from_luma(Utc::now(), pixels)
    }

    #[test]
    fn test_signal_strength_counts_bright_pixels() {
        let frame = frame_with_pixels(16, 16, &[(0, 0), (5, 5), (10, 10)]);
        let features = FrameFeatureExtractor::default().extract(&frame);
        assert_eq!(features.signal_strength, 3.0);
    }

    #[test]
    fn test_dim_pixels_ignored() {
        let mut pixels = GrayImage::new(8, 8);
        pixels.put_pixel(2, 2, Luma([180])); // exactly at the cutoff: not lit
        pixels.put_pixel(3, 3, Luma([181]));
        let frame = Frame::from_luma(Utc::now(), pixels);

        let features = FrameFeatureExtractor::default().extract(&frame);
        assert_eq!(features.signal_strength, 1.0);
    }

    #[test]
    fn test_contour_count_includes_noise_blobs() {
        // One 9-pixel square and one isolated pixel: both are contours, only
        // the square survives the noise floor.
        let mut lit = Vec::new();
        for y in 4..7 {
            for x in 4..7 {
                lit.push((x, y));
            }
        }
        lit.push((12, 12));
        let frame = frame_with_pixels(16, 16, &lit);

        let features = FrameFeatureExtractor::default().extract(&frame);
        assert_eq!(features.contour_count, 2);
        assert_eq!(features.centroids, vec![(5, 5)]);
    }

    #[test]
    fn test_diagonal_pixels_are_separate_blobs() {
        let frame = frame_with_pixels(8, 8, &[(1, 1), (2, 2)]);
        let features = FrameFeatureExtractor::default().extract(&frame);
        assert_eq!(features.contour_count, 2);
    }

    #[test]
    fn test_empty_frame() {
        let frame = frame_with_pixels(8, 8, &[]);
        let features = FrameFeatureExtractor::default().extract(&frame);
        assert_eq!(features.signal_strength, 0.0);
        assert_eq!(features.contour_count, 0);
        assert!(features.centroids.is_empty());
    }
}
