// SPDX-License-Identifier: MPL-2.0
//! Raw video frames and audio formats exchanged between capture, encoding
//! and display.

use std::sync::Arc;

/// An RGBA frame, 4 bytes per pixel.
///
/// Pixel data is shared, so cloning a frame for the preview and the encoder
/// does not copy it.
#[derive(Debug, Clone)]
pub struct RawFrame {
    width: u32,
    height: u32,
    rgba_bytes: Arc<Vec<u8>>,
}

impl RawFrame {
    /// Returns `None` when the buffer length doesn't match `width * height * 4`.
    #[must_use]
    pub fn from_rgba(width: u32, height: u32, rgba_bytes: Vec<u8>) -> Option<Self> {
        let expected_len = (width as usize) * (height as usize) * 4;
        if width == 0 || height == 0 || rgba_bytes.len() != expected_len {
            return None;
        }
        Some(Self {
            width,
            height,
            rgba_bytes: Arc::new(rgba_bytes),
        })
    }

    /// Solid frame of one colour.
    #[must_use]
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = (width.max(1) as usize) * (height.max(1) as usize);
        Self {
            width: width.max(1),
            height: height.max(1),
            rgba_bytes: Arc::new(rgba.repeat(pixels)),
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn rgba_bytes(&self) -> &[u8] {
        &self.rgba_bytes
    }

    #[must_use]
    pub fn rgba_bytes_arc(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.rgba_bytes)
    }
}

impl PartialEq for RawFrame {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.rgba_bytes == other.rgba_bytes
    }
}

impl Eq for RawFrame {}

/// Interleaved signed 16-bit PCM layout of a microphone stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioFormat {
    pub const BITS_PER_SAMPLE: u16 = 16;

    #[must_use]
    pub fn block_align(self) -> u16 {
        self.channels * (Self::BITS_PER_SAMPLE / 8)
    }

    #[must_use]
    pub fn bytes_per_second(self) -> u32 {
        self.sample_rate * u32::from(self.block_align())
    }
}
