// SPDX-License-Identifier: MPL-2.0
//! Async video frame decoder using FFmpeg.
//!
//! The decoder runs on a blocking thread (FFmpeg types are not `Send`) and
//! talks to the subscription over Tokio channels.

use crate::error::{Error, Result, VideoError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Represents a decoded video frame ready for display.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// RGBA pixel data (width × height × 4 bytes).
    pub rgba_data: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
    /// Presentation timestamp in seconds.
    pub pts_secs: f64,
}

impl DecodedFrame {
    pub fn size_bytes(&self) -> usize {
        self.rgba_data.len()
    }
}

/// Commands sent to the decoder task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderCommand {
    /// Start or resume. After the end of the stream, restarts from zero.
    Play,
    Pause,
    Stop,
}

/// Events sent from the decoder to the UI.
#[derive(Debug, Clone)]
pub enum DecoderEvent {
    /// The file opened. Duration is zero when the container doesn't say.
    Opened { width: u32, height: u32, duration_secs: f64 },
    FrameReady(DecodedFrame),
    EndOfStream,
    Error(String),
}

/// Async video decoder that runs in a blocking Tokio task.
pub struct AsyncDecoder {
    command_tx: mpsc::UnboundedSender<DecoderCommand>,
    /// Bounded so a paused UI applies backpressure to decoding.
    event_rx: mpsc::Receiver<DecoderEvent>,
}

impl AsyncDecoder {
    /// Spawns the decoder thread for `video_path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file does not exist.
    pub fn new<P: AsRef<Path>>(video_path: P) -> Result<Self> {
        let path = video_path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(Error::Io(format!("Video file not found: {:?}", path)));
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(2);

        tokio::task::spawn_blocking(move || {
            if let Err(e) = Self::decoder_loop_blocking(path, command_rx, &event_tx) {
                let _ = event_tx.blocking_send(DecoderEvent::Error(e.to_string()));
                eprintln!("Decoder task failed: {}", e);
            }
        });

        Ok(Self {
            command_tx,
            event_rx,
        })
    }

    /// # Errors
    ///
    /// Returns [`Error::Io`] once the decoder thread has exited.
    pub fn send_command(&self, command: DecoderCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| Error::Io("Decoder task is not running".into()))
    }

    /// Returns `None` once the decoder thread has exited.
    pub async fn recv_event(&mut self) -> Option<DecoderEvent> {
        self.event_rx.recv().await
    }

    #[allow(clippy::too_many_lines, clippy::cast_precision_loss)]
    fn decoder_loop_blocking(
        video_path: PathBuf,
        mut command_rx: mpsc::UnboundedReceiver<DecoderCommand>,
        event_tx: &mpsc::Sender<DecoderEvent>,
    ) -> Result<()> {
        super::init_ffmpeg()?;

        let mut ictx = ffmpeg_next::format::input(&video_path)
            .map_err(|e| VideoError::from_message(&format!("Failed to open video: {}", e)))?;

        let input = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or(VideoError::NoVideoStream)?;
        let video_stream_index = input.index();

        let context_decoder =
            ffmpeg_next::codec::context::Context::from_parameters(input.parameters())
                .map_err(|e| VideoError::DecodingFailed(e.to_string()))?;
        let mut decoder = context_decoder
            .decoder()
            .video()
            .map_err(|e| VideoError::DecodingFailed(e.to_string()))?;

        let width = decoder.width();
        let height = decoder.height();

        let mut scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGBA,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| VideoError::Other(format!("Failed to create scaler: {}", e)))?;

        let time_base = input.time_base();
        let time_base_f64 = f64::from(time_base.numerator()) / f64::from(time_base.denominator());
        let duration_secs = if ictx.duration() > 0 {
            ictx.duration() as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE)
        } else {
            0.0
        };

        if event_tx
            .blocking_send(DecoderEvent::Opened {
                width,
                height,
                duration_secs,
            })
            .is_err()
        {
            return Ok(());
        }

        let mut is_playing = false;
        let mut at_end = false;
        // First frame is shown while paused so the player isn't blank.
        let mut decode_single_frame = true;
        let mut playback_start_time: Option<Instant> = None;
        let mut first_pts: Option<f64> = None;
        let mut current_pts_secs: f64 = 0.0;

        loop {
            match command_rx.try_recv() {
                Ok(DecoderCommand::Play) => {
                    let restart = at_end;
                    let resume_at = if restart { 0.0 } else { current_pts_secs };
                    if restart || (!is_playing && resume_at > 0.0) {
                        // Seek uses AV_TIME_BASE (microseconds).
                        #[allow(clippy::cast_possible_truncation)]
                        let timestamp = (resume_at * 1_000_000.0) as i64;
                        if let Err(e) = ictx.seek(timestamp, ..timestamp) {
                            let _ = event_tx
                                .blocking_send(DecoderEvent::Error(format!("Seek failed: {}", e)));
                        } else {
                            decoder.flush();
                        }
                    }
                    at_end = false;
                    is_playing = true;
                    playback_start_time = Some(Instant::now());
                    first_pts = None;
                }
                Ok(DecoderCommand::Pause) => {
                    is_playing = false;
                    playback_start_time = None;
                    first_pts = None;
                }
                Ok(DecoderCommand::Stop) | Err(mpsc::error::TryRecvError::Disconnected) => break,
                Err(mpsc::error::TryRecvError::Empty) => {}
            }

            if !is_playing && !decode_single_frame {
                std::thread::sleep(Duration::from_millis(10));
                continue;
            }

            let mut frame_decoded = false;
            for (stream, packet) in ictx.packets() {
                if stream.index() != video_stream_index {
                    continue;
                }
                if decoder.send_packet(&packet).is_err() {
                    continue;
                }

                let mut decoded_frame = ffmpeg_next::frame::Video::empty();
                if decoder.receive_frame(&mut decoded_frame).is_err() {
                    continue;
                }

                let mut rgb_frame = ffmpeg_next::frame::Video::empty();
                if let Err(e) = scaler.run(&decoded_frame, &mut rgb_frame) {
                    let _ = event_tx
                        .blocking_send(DecoderEvent::Error(format!("Scaling failed: {}", e)));
                    continue;
                }

                let pts_secs = decoded_frame
                    .timestamp()
                    .map_or(0.0, |pts| pts as f64 * time_base_f64);

                // Frame pacing relative to the first frame after (re)start.
                if let Some(start_time) = playback_start_time {
                    let first = *first_pts.get_or_insert(pts_secs);
                    let frame_delay = (pts_secs - first).max(0.0);
                    let target_time = start_time + Duration::from_secs_f64(frame_delay);
                    let now = Instant::now();
                    if target_time > now {
                        std::thread::sleep(target_time - now);
                    }
                }

                current_pts_secs = pts_secs;
                let decoded = DecodedFrame {
                    rgba_data: Arc::new(Self::extract_rgba_data(&rgb_frame)),
                    width,
                    height,
                    pts_secs,
                };
                if event_tx
                    .blocking_send(DecoderEvent::FrameReady(decoded))
                    .is_err()
                {
                    return Ok(());
                }

                frame_decoded = true;
                decode_single_frame = false;
                break;
            }

            if !frame_decoded {
                let _ = event_tx.blocking_send(DecoderEvent::EndOfStream);
                is_playing = false;
                at_end = true;
                playback_start_time = None;
                first_pts = None;
                decode_single_frame = false;
            }
        }

        Ok(())
    }

    /// Copies the RGBA plane row by row, dropping stride padding.
    fn extract_rgba_data(frame: &ffmpeg_next::frame::Video) -> Vec<u8> {
        let width = frame.width() as usize;
        let height = frame.height() as usize;
        let data = frame.data(0);
        let stride = frame.stride(0);

        let mut rgba_bytes = Vec::with_capacity(width * height * 4);
        for y in 0..height {
            let row_start = y * stride;
            let row_end = row_start + width * 4;
            rgba_bytes.extend_from_slice(&data[row_start..row_end]);
        }
        rgba_bytes
    }
}
