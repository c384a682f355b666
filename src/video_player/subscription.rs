// SPDX-License-Identifier: MPL-2.0
//! Iced subscription for video playback events.
//!
//! Connects the blocking decoder to the UI event loop. The subscription id
//! is tied to a playback session, so replacing the session tears the old
//! decoder down.

use super::{AsyncDecoder, DecoderCommand, DecoderEvent};
use iced::futures::SinkExt;
use iced::stream;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Subscription ID for video playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VideoPlaybackId(u64);

/// Subscription data: hashed by the id only, so the identity is unchanged.
struct VideoPlaybackData(VideoPlaybackId, PathBuf);

impl std::hash::Hash for VideoPlaybackData {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// Cloneable handle for sending play/pause to the decoder.
#[derive(Clone)]
pub struct DecoderCommandSender {
    video_tx: mpsc::UnboundedSender<DecoderCommand>,
}

impl DecoderCommandSender {
    /// # Errors
    ///
    /// Returns an error message once the decoder has stopped.
    pub fn send(&self, command: DecoderCommand) -> Result<(), String> {
        self.video_tx
            .send(command)
            .map_err(|_| "Video decoder not running".to_string())
    }
}

impl std::fmt::Debug for DecoderCommandSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderCommandSender").finish_non_exhaustive()
    }
}

/// Messages emitted by the video playback subscription.
#[derive(Debug, Clone)]
pub enum PlaybackMessage {
    /// Subscription started, provides command sender for play/pause.
    Started(DecoderCommandSender),
    Opened {
        width: u32,
        height: u32,
        duration_secs: f64,
    },
    FrameReady {
        rgba_data: Arc<Vec<u8>>,
        width: u32,
        height: u32,
        pts_secs: f64,
    },
    EndOfStream,
    Error(String),
}

enum State {
    Idle,
    Decoding {
        decoder: AsyncDecoder,
        external_cmd_rx: mpsc::UnboundedReceiver<DecoderCommand>,
    },
}

/// Creates a playback subscription for the file at `video_path`.
pub fn video_playback(video_path: PathBuf, session_id: u64) -> iced::Subscription<PlaybackMessage> {
    iced::Subscription::run_with(
        VideoPlaybackData(VideoPlaybackId(session_id), video_path),
        |VideoPlaybackData(_, video_path)| {
            let video_path = video_path.clone();
            stream::channel(100, move |mut output: iced::futures::channel::mpsc::Sender<PlaybackMessage>| async move {
                let mut state = State::Idle;

                loop {
                    match &mut state {
                        State::Idle => {
                            let (external_cmd_tx, external_cmd_rx) = mpsc::unbounded_channel();

                            let decoder = match AsyncDecoder::new(&video_path) {
                                Ok(decoder) => decoder,
                                Err(e) => {
                                    let _ = output.send(PlaybackMessage::Error(e.to_string())).await;
                                    break;
                                }
                            };

                            let sender = DecoderCommandSender {
                                video_tx: external_cmd_tx,
                            };
                            let _ = output.send(PlaybackMessage::Started(sender)).await;

                            state = State::Decoding {
                                decoder,
                                external_cmd_rx,
                            };
                        }

                        State::Decoding {
                            decoder,
                            external_cmd_rx,
                        } => {
                            tokio::select! {
                                cmd = external_cmd_rx.recv() => {
                                    if let Some(command) = cmd {
                                        if let Err(e) = decoder.send_command(command) {
                                            let _ = output.send(PlaybackMessage::Error(e.to_string())).await;
                                        }
                                    }
                                }

                                event = decoder.recv_event() => {
                                    let Some(event) = event else {
                                        // Decoder thread exited.
                                        break;
                                    };
                                    let message = match event {
                                        DecoderEvent::Opened { width, height, duration_secs } => {
                                            PlaybackMessage::Opened { width, height, duration_secs }
                                        }
                                        DecoderEvent::FrameReady(frame) => PlaybackMessage::FrameReady {
                                            rgba_data: frame.rgba_data,
                                            width: frame.width,
                                            height: frame.height,
                                            pts_secs: frame.pts_secs,
                                        },
                                        DecoderEvent::EndOfStream => PlaybackMessage::EndOfStream,
                                        DecoderEvent::Error(msg) => PlaybackMessage::Error(msg),
                                    };
                                    let _ = output.send(message).await;
                                }
                            }
                        }
                    }
                }

                // Keep subscription alive but idle
                std::future::pending::<()>().await;
            })
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playback_message_can_be_debugged() {
        let msg = PlaybackMessage::Error("test error".to_string());
        assert!(format!("{:?}", msg).contains("test error"));
    }

    #[test]
    fn subscription_id_follows_session() {
        assert_eq!(VideoPlaybackId(42), VideoPlaybackId(42));
        assert_ne!(VideoPlaybackId(42), VideoPlaybackId(43));
    }

    #[test]
    fn sender_fails_after_receiver_drops() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sender = DecoderCommandSender { video_tx: tx };
        assert!(sender.send(DecoderCommand::Play).is_ok());
        drop(rx);
        assert!(sender.send(DecoderCommand::Pause).is_err());
    }
}
