// SPDX-License-Identifier: MPL-2.0
//! Playback of uploaded test videos.
//!
//! FFmpeg decodes on a blocking thread; frames reach the UI through an
//! Iced subscription.

mod decoder;
pub mod subscription;

pub use decoder::{AsyncDecoder, DecodedFrame, DecoderCommand, DecoderEvent};
pub use subscription::{video_playback, DecoderCommandSender, PlaybackMessage, VideoPlaybackId};

use crate::error::{Error, Result};
use std::sync::Once;

static FFMPEG_INIT: Once = Once::new();

/// Initializes FFmpeg once per process, with logging reduced to errors.
///
/// # Errors
///
/// Returns [`Error::Io`] if FFmpeg fails to initialize.
pub fn init_ffmpeg() -> Result<()> {
    let mut init_result: Result<()> = Ok(());

    FFMPEG_INIT.call_once(|| {
        if let Err(e) = ffmpeg_next::init() {
            init_result = Err(Error::Io(format!("FFmpeg initialization failed: {e}")));
            return;
        }

        // SAFETY: av_log_set_level is thread-safe and only affects logging
        unsafe {
            ffmpeg_next::ffi::av_log_set_level(ffmpeg_next::ffi::AV_LOG_ERROR);
        }
    });

    init_result
}
