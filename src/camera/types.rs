//! Frame types crossing the camera boundary.
//!
//! The analyzer only ever sees grayscale intensities; color conversion
//! happens here, at the edge, so every downstream component works on one
//! pixel format.

use chrono::{DateTime, Utc};
use image::{DynamicImage, GrayImage};

/// A single captured frame: grayscale pixel grid plus capture timestamp.
#[derive(Debug, Clone)]
pub struct Frame {
    /// When the camera captured this frame
    pub timestamp: DateTime<Utc>,
    /// Grayscale pixel intensities, row-major
    pub pixels: GrayImage,
}

impl Frame {
    /// Create a frame from an already-grayscale buffer.
    pub fn from_luma(timestamp: DateTime<Utc>, pixels: GrayImage) -> Self {
        Self { timestamp, pixels }
    }

    /// Create a frame from any color depth the `image` crate can represent.
    pub fn from_dynamic(timestamp: DateTime<Utc>, image: &DynamicImage) -> Self {
        Self {
            timestamp,
            pixels: image.to_luma8(),
        }
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_color_frames_convert_to_grayscale() {
        let mut rgb = RgbImage::new(4, 4);
        rgb.put_pixel(1, 1, Rgb([255, 255, 255]));

        let frame = Frame::from_dynamic(Utc::now(), &DynamicImage::ImageRgb8(rgb));
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.pixels.get_pixel(1, 1).0[0], 255);
        assert_eq!(frame.pixels.get_pixel(0, 0).0[0], 0);
    }
}
