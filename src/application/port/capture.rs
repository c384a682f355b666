// SPDX-License-Identifier: MPL-2.0
//! Capture device port definitions.
//!
//! [`CaptureSource`] yields RGBA frames from a camera (or a synthetic
//! source), [`MicrophoneSource`] yields PCM samples. Both are created, used
//! and dropped on the capture worker thread. Device handles such as audio
//! streams are not `Send` on every platform, so the traits do not require it.
//!
//! # Lifecycle
//!
//! 1. `open()` acquires the device and reports its format
//! 2. `next_frame()` / `drain_samples()` are called repeatedly
//! 3. `release()` gives the device back; dropping the source must do the same

use crate::domain::frame::{AudioFormat, RawFrame};
use crate::error::PermissionError;

/// Port for video frame sources.
pub trait CaptureSource {
    /// Acquires the device. Returns the frame size it will deliver.
    ///
    /// # Errors
    ///
    /// Returns a [`PermissionError`] when the device is missing, busy or
    /// access is refused.
    fn open(&mut self) -> Result<(u32, u32), PermissionError>;

    /// Blocks until the next frame is available.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError::DeviceFailed`] when the device stops
    /// delivering frames.
    fn next_frame(&mut self) -> Result<RawFrame, PermissionError>;

    /// Releases the device. Calling it twice is a no-op.
    fn release(&mut self);

    /// True for sources that do not use real hardware.
    fn is_simulated(&self) -> bool {
        false
    }
}

/// Port for audio input.
pub trait MicrophoneSource {
    /// Starts capturing.
    ///
    /// # Errors
    ///
    /// Returns a [`PermissionError`] when the input device is unavailable.
    fn open(&mut self) -> Result<AudioFormat, PermissionError>;

    /// Takes every sample captured since the previous call, interleaved.
    fn drain_samples(&mut self) -> Vec<i16>;

    fn release(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn CaptureSource, _: &dyn MicrophoneSource) {}

    struct CountingSource {
        opened: bool,
        frames: u32,
    }

    impl CaptureSource for CountingSource {
        fn open(&mut self) -> Result<(u32, u32), PermissionError> {
            self.opened = true;
            Ok((2, 2))
        }

        fn next_frame(&mut self) -> Result<RawFrame, PermissionError> {
            if !self.opened {
                return Err(PermissionError::DeviceFailed("not open".into()));
            }
            self.frames += 1;
            Ok(RawFrame::filled(2, 2, [0, 0, 0, 255]))
        }

        fn release(&mut self) {
            self.opened = false;
        }
    }

    #[test]
    fn source_lifecycle() {
        let mut source = CountingSource {
            opened: false,
            frames: 0,
        };
        assert!(source.next_frame().is_err());
        assert_eq!(source.open(), Ok((2, 2)));
        assert!(source.next_frame().is_ok());
        source.release();
        source.release();
        assert!(source.next_frame().is_err());
        assert_eq!(source.frames, 1);
        assert!(!source.is_simulated());
    }
}
