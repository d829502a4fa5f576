//! Frame acquisition boundary.
//!
//! Real camera hardware lives behind the [`FrameSource`] trait; the crate
//! itself ships a channel-backed source for external producer threads and a
//! deterministic synthetic camera so the binary runs without hardware.

pub mod synthetic;
pub mod types;

use crossbeam_channel::{bounded, Receiver, Sender};

pub use synthetic::SyntheticCamera;
pub use types::Frame;

/// Errors surfaced by a frame source.
#[derive(Debug)]
pub enum CameraError {
    /// The producer side went away; no further frames will arrive.
    Disconnected,
    /// The device reported an unrecoverable capture failure.
    Capture(String),
}

impl std::fmt::Display for CameraError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraError::Disconnected => write!(f, "frame source disconnected"),
            CameraError::Capture(e) => write!(f, "capture failure: {e}"),
        }
    }
}

impl std::error::Error for CameraError {}

/// A blocking source of frames.
///
/// `next_frame` blocks until a frame is available and is the capture loop's
/// only suspension point. Any error is fatal for the session; transient
/// device hiccups are the implementation's problem to hide.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Frame, CameraError>;
}

/// Create a bounded frame channel pair.
///
/// A capture thread pushes through the [`FrameSender`]; the session loop
/// consumes through the [`ChannelSource`]. Dropping the sender ends the
/// session with [`CameraError::Disconnected`].
pub fn frame_channel(capacity: usize) -> (FrameSender, ChannelSource) {
    let (tx, rx) = bounded(capacity);
    (FrameSender { tx }, ChannelSource { rx })
}

/// Producer half of a frame channel.
#[derive(Clone)]
pub struct FrameSender {
    tx: Sender<Frame>,
}

impl FrameSender {
    /// Send a frame, blocking if the consumer is behind.
    ///
    /// Returns false once the consumer side is gone.
    pub fn send(&self, frame: Frame) -> bool {
        self.tx.send(frame).is_ok()
    }
}

/// Consumer half of a frame channel, usable as a [`FrameSource`].
pub struct ChannelSource {
    rx: Receiver<Frame>,
}

impl FrameSource for ChannelSource {
    fn next_frame(&mut self) -> Result<Frame, CameraError> {
        self.rx.recv().map_err(|_| CameraError::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use image::GrayImage;

    #[test]
    fn test_channel_source_delivers_in_order() {
        let (tx, mut source) = frame_channel(8);
        for _ in 0..3 {
            assert!(tx.send(Frame::from_luma(Utc::now(), GrayImage::new(2, 2))));
        }
        drop(tx);

        assert!(source.next_frame().is_ok());
        assert!(source.next_frame().is_ok());
        assert!(source.next_frame().is_ok());
        assert!(matches!(
            source.next_frame(),
            Err(CameraError::Disconnected)
        ));
    }
}
