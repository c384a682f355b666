// SPDX-License-Identifier: MPL-2.0
//! JPEG encoding of captured frames, for calibration uploads and MJPEG
//! recording.

use crate::domain::frame::RawFrame;
use crate::error::{Error, Result};
use image_rs::codecs::jpeg::JpegEncoder;
use image_rs::{ImageBuffer, Rgba};

/// Encodes an RGBA frame as baseline JPEG. Alpha is dropped.
///
/// # Errors
///
/// Returns [`Error::Io`] if the encoder rejects the frame.
pub fn encode_jpeg(frame: &RawFrame, quality: u8) -> Result<Vec<u8>> {
    let img: ImageBuffer<Rgba<u8>, _> =
        ImageBuffer::from_raw(frame.width(), frame.height(), frame.rgba_bytes().to_vec())
            .ok_or_else(|| Error::Io("Failed to create image buffer from frame data".to_string()))?;
    let rgb = image_rs::DynamicImage::ImageRgba8(img).to_rgb8();

    let mut out = Vec::with_capacity(rgb.len() / 8);
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
        .encode_image(&rgb)
        .map_err(|e| Error::Io(format!("Failed to encode frame: {e}")))?;
    Ok(out)
}
