// SPDX-License-Identifier: MPL-2.0
//! Synthetic camera used in test mode and when no real camera is usable.

use crate::application::port::CaptureSource;
use crate::domain::frame::RawFrame;
use crate::error::PermissionError;
use std::time::{Duration, Instant};

const BACKGROUND: [u8; 3] = [32, 36, 44];
const MARKER: [u8; 3] = [240, 180, 40];

/// Draws a dark frame with a marker circling the centre, paced to the
/// configured frame period.
#[derive(Debug)]
pub struct SimulatedCamera {
    width: u32,
    height: u32,
    frame_period: Duration,
    frame_index: u64,
    next_deadline: Option<Instant>,
    open: bool,
}

impl SimulatedCamera {
    #[must_use]
    pub fn new(width: u32, height: u32, frame_period: Duration) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            frame_period,
            frame_index: 0,
            next_deadline: None,
            open: false,
        }
    }

    #[must_use]
    pub fn frames_produced(&self) -> u64 {
        self.frame_index
    }

    fn render(&self) -> RawFrame {
        let (w, h) = (self.width as usize, self.height as usize);
        let mut pixels = vec![0u8; w * h * 4];

        #[allow(clippy::cast_precision_loss)]
        let angle = self.frame_index as f32 * 0.12;
        #[allow(clippy::cast_precision_loss)]
        let (cx, cy) = (
            w as f32 / 2.0 + angle.cos() * w as f32 * 0.3,
            h as f32 / 2.0 + angle.sin() * h as f32 * 0.3,
        );
        #[allow(clippy::cast_precision_loss)]
        let radius_sq = (w.min(h) as f32 * 0.06).powi(2);

        for (i, px) in pixels.chunks_exact_mut(4).enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let (x, y) = ((i % w) as f32, (i / w) as f32);
            let inside = (x - cx).powi(2) + (y - cy).powi(2) <= radius_sq;
            let rgb = if inside { MARKER } else { BACKGROUND };
            px[..3].copy_from_slice(&rgb);
            px[3] = 255;
        }

        RawFrame::from_rgba(self.width, self.height, pixels)
            .unwrap_or_else(|| RawFrame::filled(self.width, self.height, [0, 0, 0, 255]))
    }
}

impl CaptureSource for SimulatedCamera {
    fn open(&mut self) -> Result<(u32, u32), PermissionError> {
        self.open = true;
        self.next_deadline = None;
        Ok((self.width, self.height))
    }

    fn next_frame(&mut self) -> Result<RawFrame, PermissionError> {
        if !self.open {
            return Err(PermissionError::DeviceFailed(
                "simulated camera is not open".to_string(),
            ));
        }

        let now = Instant::now();
        let deadline = self.next_deadline.unwrap_or(now);
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
        self.next_deadline = Some(deadline.max(now) + self.frame_period);

        let frame = self.render();
        self.frame_index += 1;
        Ok(frame)
    }

    fn release(&mut self) {
        self.open = false;
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_match_requested_size() {
        let mut camera = SimulatedCamera::new(32, 24, Duration::ZERO);
        assert_eq!(camera.open(), Ok((32, 24)));
        let frame = camera.next_frame().expect("frame");
        assert_eq!((frame.width(), frame.height()), (32, 24));
        assert_eq!(frame.rgba_bytes().len(), 32 * 24 * 4);
        assert!(camera.is_simulated());
    }

    #[test]
    fn marker_moves_between_frames() {
        let mut camera = SimulatedCamera::new(64, 48, Duration::ZERO);
        camera.open().expect("open");
        let first = camera.next_frame().expect("frame");
        for _ in 0..5 {
            camera.next_frame().expect("frame");
        }
        let later = camera.next_frame().expect("frame");
        assert_ne!(first, later);
        assert_eq!(camera.frames_produced(), 7);
    }

    #[test]
    fn released_camera_stops_producing() {
        let mut camera = SimulatedCamera::new(8, 8, Duration::ZERO);
        camera.open().expect("open");
        camera.release();
        assert!(camera.next_frame().is_err());
    }

    #[test]
    fn frames_are_paced() {
        let period = Duration::from_millis(20);
        let mut camera = SimulatedCamera::new(4, 4, period);
        camera.open().expect("open");
        let start = Instant::now();
        for _ in 0..3 {
            camera.next_frame().expect("frame");
        }
        // First frame is immediate, the next two wait one period each.
        assert!(start.elapsed() >= period * 2);
    }
}
