// SPDX-License-Identifier: MPL-2.0
//! Capture adapters and the worker thread that drives them.
//!
//! Real devices are only compiled in with the `capture` feature. Without it,
//! or when the camera cannot be opened, [`acquire_sources`] hands out a
//! [`SimulatedCamera`] and reports the fallback instead of failing.

#[cfg(feature = "capture")]
mod camera;
#[cfg(feature = "capture")]
mod microphone;
mod simulated;
mod worker;

#[cfg(feature = "capture")]
pub use camera::NokhwaCamera;
#[cfg(feature = "capture")]
pub use microphone::CpalMicrophone;
pub use simulated::SimulatedCamera;
pub use worker::{capture_session, run_worker, CaptureCommand, CaptureHandle, CaptureMessage};

use crate::application::port::{CaptureSource, MicrophoneSource};
use crate::config::{SessionConfig, CAPTURE_HEIGHT, CAPTURE_WIDTH, RECORDING_JPEG_QUALITY};
use crate::domain::frame::AudioFormat;
use crate::error::PermissionError;
use std::time::Duration;

/// Device settings for one capture session.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOptions {
    pub camera_index: u32,
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    /// Skip the hardware and use the simulated camera.
    pub test_mode: bool,
    pub recording_quality: u8,
}

impl CaptureOptions {
    #[must_use]
    pub fn from_session(config: &SessionConfig) -> Self {
        Self {
            camera_index: config.camera_index,
            width: CAPTURE_WIDTH,
            height: CAPTURE_HEIGHT,
            frame_rate: config.frame_rate,
            test_mode: config.test_mode,
            recording_quality: RECORDING_JPEG_QUALITY,
        }
    }

    #[must_use]
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self::from_session(&SessionConfig::default())
    }
}

/// Opened sources, ready for the worker loop.
pub struct AcquiredSources {
    pub camera: Box<dyn CaptureSource>,
    pub frame_size: (u32, u32),
    pub microphone: Option<(Box<dyn MicrophoneSource>, AudioFormat)>,
    /// Why the real camera was not used, when it was tried and failed.
    pub fallback: Option<PermissionError>,
}

impl AcquiredSources {
    #[must_use]
    pub fn is_simulated(&self) -> bool {
        self.camera.is_simulated()
    }

    /// Releases every device. Safe to call more than once.
    pub fn release(&mut self) {
        self.camera.release();
        if let Some((microphone, _)) = self.microphone.as_mut() {
            microphone.release();
        }
    }
}

impl std::fmt::Debug for AcquiredSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcquiredSources")
            .field("frame_size", &self.frame_size)
            .field("simulated", &self.is_simulated())
            .field("has_audio", &self.microphone.is_some())
            .field("fallback", &self.fallback)
            .finish()
    }
}

/// Opens the camera and microphone, or the simulated camera.
///
/// Must run on the thread that will use the sources.
#[must_use]
pub fn acquire_sources(options: &CaptureOptions) -> AcquiredSources {
    if options.test_mode {
        return simulated(options, None);
    }
    acquire_with(options, hardware_camera(options), hardware_microphone())
}

/// Opens the given sources, falling back to the simulated camera when the
/// camera is unavailable. A microphone failure only drops the audio track.
#[must_use]
pub fn acquire_with(
    options: &CaptureOptions,
    camera: Result<Box<dyn CaptureSource>, PermissionError>,
    microphone: Option<Box<dyn MicrophoneSource>>,
) -> AcquiredSources {
    let opened = camera.and_then(|mut camera| camera.open().map(|size| (camera, size)));

    match opened {
        Ok((camera, frame_size)) => {
            let microphone = microphone.and_then(|mut microphone| match microphone.open() {
                Ok(format) => Some((microphone, format)),
                Err(e) => {
                    eprintln!("Microphone unavailable, recording without audio: {e}");
                    None
                }
            });
            AcquiredSources {
                camera,
                frame_size,
                microphone,
                fallback: None,
            }
        }
        Err(reason) => simulated(options, Some(reason)),
    }
}

fn simulated(options: &CaptureOptions, fallback: Option<PermissionError>) -> AcquiredSources {
    let mut camera = SimulatedCamera::new(options.width, options.height, options.frame_period());
    let frame_size = camera
        .open()
        .unwrap_or((options.width.max(1), options.height.max(1)));
    AcquiredSources {
        camera: Box::new(camera),
        frame_size,
        microphone: None,
        fallback,
    }
}

#[cfg(feature = "capture")]
fn hardware_camera(options: &CaptureOptions) -> Result<Box<dyn CaptureSource>, PermissionError> {
    Ok(Box::new(NokhwaCamera::new(
        options.camera_index,
        options.width,
        options.height,
        options.frame_rate,
    )))
}

#[cfg(not(feature = "capture"))]
fn hardware_camera(_options: &CaptureOptions) -> Result<Box<dyn CaptureSource>, PermissionError> {
    Err(PermissionError::Unsupported)
}

#[cfg(feature = "capture")]
fn hardware_microphone() -> Option<Box<dyn MicrophoneSource>> {
    Some(Box::new(CpalMicrophone::new()))
}

#[cfg(not(feature = "capture"))]
fn hardware_microphone() -> Option<Box<dyn MicrophoneSource>> {
    None
}

/// Maps a device backend message to a permission category.
#[must_use]
pub fn classify_device_error(message: &str) -> PermissionError {
    let lower = message.to_lowercase();
    if ["permission", "denied", "not authorized", "unauthorized"]
        .iter()
        .any(|needle| lower.contains(needle))
    {
        return PermissionError::Denied(message.to_string());
    }
    if ["not found", "no device", "no such", "out of range", "no camera"]
        .iter()
        .any(|needle| lower.contains(needle))
    {
        return PermissionError::NoDevice;
    }
    PermissionError::DeviceFailed(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::RawFrame;

    struct DeniedCamera;

    impl CaptureSource for DeniedCamera {
        fn open(&mut self) -> Result<(u32, u32), PermissionError> {
            Err(PermissionError::Denied("user refused".into()))
        }

        fn next_frame(&mut self) -> Result<RawFrame, PermissionError> {
            Err(PermissionError::DeviceFailed("closed".into()))
        }

        fn release(&mut self) {}
    }

    struct FixedCamera;

    impl CaptureSource for FixedCamera {
        fn open(&mut self) -> Result<(u32, u32), PermissionError> {
            Ok((320, 240))
        }

        fn next_frame(&mut self) -> Result<RawFrame, PermissionError> {
            Ok(RawFrame::filled(320, 240, [0, 0, 0, 255]))
        }

        fn release(&mut self) {}
    }

    struct BrokenMicrophone;

    impl MicrophoneSource for BrokenMicrophone {
        fn open(&mut self) -> Result<AudioFormat, PermissionError> {
            Err(PermissionError::NoDevice)
        }

        fn drain_samples(&mut self) -> Vec<i16> {
            Vec::new()
        }

        fn release(&mut self) {}
    }

    fn options() -> CaptureOptions {
        CaptureOptions {
            width: 64,
            height: 48,
            ..CaptureOptions::default()
        }
    }

    #[test]
    fn test_mode_uses_simulated_camera_without_fallback() {
        let sources = acquire_sources(&CaptureOptions {
            test_mode: true,
            ..options()
        });
        assert!(sources.is_simulated());
        assert!(sources.fallback.is_none());
        assert_eq!(sources.frame_size, (64, 48));
    }

    #[test]
    fn denied_camera_falls_back_to_simulation() {
        let sources = acquire_with(&options(), Ok(Box::new(DeniedCamera)), None);
        assert!(sources.is_simulated());
        assert_eq!(
            sources.fallback,
            Some(PermissionError::Denied("user refused".into()))
        );
    }

    #[test]
    fn unsupported_capture_falls_back_to_simulation() {
        let sources = acquire_with(&options(), Err(PermissionError::Unsupported), None);
        assert!(sources.is_simulated());
        assert_eq!(sources.fallback, Some(PermissionError::Unsupported));
    }

    #[test]
    fn working_camera_keeps_its_size_and_drops_broken_microphone() {
        let sources = acquire_with(
            &options(),
            Ok(Box::new(FixedCamera)),
            Some(Box::new(BrokenMicrophone)),
        );
        assert!(!sources.is_simulated());
        assert_eq!(sources.frame_size, (320, 240));
        assert!(sources.microphone.is_none());
        assert!(sources.fallback.is_none());
    }

    #[test]
    fn device_messages_are_classified() {
        assert!(matches!(
            classify_device_error("Permission denied by OS"),
            PermissionError::Denied(_)
        ));
        assert_eq!(
            classify_device_error("Camera index 3 not found"),
            PermissionError::NoDevice
        );
        assert!(matches!(
            classify_device_error("stream stalled"),
            PermissionError::DeviceFailed(_)
        ));
    }

    #[test]
    fn frame_period_follows_rate() {
        let opts = CaptureOptions {
            frame_rate: 20,
            ..options()
        };
        assert_eq!(opts.frame_period(), Duration::from_millis(50));
    }
}
