// SPDX-License-Identifier: MPL-2.0
//! Webcam input through `nokhwa`.

use super::classify_device_error;
use crate::application::port::CaptureSource;
use crate::domain::frame::RawFrame;
use crate::error::PermissionError;
use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::Camera;

/// A physical camera. The device is opened lazily in [`CaptureSource::open`]
/// and closed on release or drop.
pub struct NokhwaCamera {
    index: u32,
    width: u32,
    height: u32,
    frame_rate: u32,
    camera: Option<Camera>,
}

impl NokhwaCamera {
    #[must_use]
    pub fn new(index: u32, width: u32, height: u32, frame_rate: u32) -> Self {
        Self {
            index,
            width,
            height,
            frame_rate,
            camera: None,
        }
    }
}

impl std::fmt::Debug for NokhwaCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NokhwaCamera")
            .field("index", &self.index)
            .field("open", &self.camera.is_some())
            .finish_non_exhaustive()
    }
}

impl CaptureSource for NokhwaCamera {
    fn open(&mut self) -> Result<(u32, u32), PermissionError> {
        if let Some(camera) = &self.camera {
            let resolution = camera.resolution();
            return Ok((resolution.width(), resolution.height()));
        }

        #[cfg(target_os = "macos")]
        nokhwa::nokhwa_initialize(|_granted| {});

        let requested = RequestedFormat::new::<RgbAFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(self.width, self.height),
                FrameFormat::MJPEG,
                self.frame_rate,
            ),
        ));

        let mut camera = Camera::new(CameraIndex::Index(self.index), requested)
            .map_err(|e| classify_device_error(&e.to_string()))?;
        camera
            .open_stream()
            .map_err(|e| classify_device_error(&e.to_string()))?;

        let resolution = camera.resolution();
        self.camera = Some(camera);
        Ok((resolution.width(), resolution.height()))
    }

    fn next_frame(&mut self) -> Result<RawFrame, PermissionError> {
        let camera = self
            .camera
            .as_mut()
            .ok_or_else(|| PermissionError::DeviceFailed("camera is not open".to_string()))?;

        let buffer = camera
            .frame()
            .map_err(|e| PermissionError::DeviceFailed(e.to_string()))?;
        let image = buffer
            .decode_image::<RgbAFormat>()
            .map_err(|e| PermissionError::DeviceFailed(e.to_string()))?;

        let (width, height) = (image.width(), image.height());
        RawFrame::from_rgba(width, height, image.into_raw()).ok_or_else(|| {
            PermissionError::DeviceFailed("camera delivered a truncated frame".to_string())
        })
    }

    fn release(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_stream() {
                eprintln!("Failed to stop camera stream: {e}");
            }
        }
    }
}

impl Drop for NokhwaCamera {
    fn drop(&mut self) {
        self.release();
    }
}
