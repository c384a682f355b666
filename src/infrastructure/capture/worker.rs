// SPDX-License-Identifier: MPL-2.0
//! Capture worker thread and its Iced subscription.
//!
//! The worker owns the devices for the lifetime of one subscription. It
//! sends every frame as a preview, and while recording also encodes it to
//! JPEG and muxes it into an AVI together with the microphone samples.
//! Dropping the subscription closes the event channel, which makes the
//! worker release the devices and exit.

use super::{acquire_sources, AcquiredSources, CaptureOptions};
use crate::domain::frame::{AudioFormat, RawFrame};
use crate::domain::media::{ContentType, RecordedMedia};
use crate::error::PermissionError;
use crate::media::avi::{self, AviWriter};
use crate::media::jpeg::encode_jpeg;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use iced::futures::SinkExt;
use iced::stream;
use std::time::{Instant, SystemTime};
use tokio::sync::mpsc;

/// Subscription ID for a capture session and its restart generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CaptureSessionId(u64, u32);

/// Subscription data: hashed by the id only, so the identity is unchanged.
struct CaptureSessionData(CaptureSessionId, CaptureOptions);

impl std::hash::Hash for CaptureSessionData {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureCommand {
    StartRecording,
    StopRecording,
}

/// Cloneable handle for sending commands to the worker.
#[derive(Clone)]
pub struct CaptureHandle {
    commands: Sender<CaptureCommand>,
}

impl CaptureHandle {
    #[must_use]
    pub fn new(commands: Sender<CaptureCommand>) -> Self {
        Self { commands }
    }

    /// Returns false once the worker has exited.
    pub fn send(&self, command: CaptureCommand) -> bool {
        self.commands.send(command).is_ok()
    }
}

impl std::fmt::Debug for CaptureHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureHandle").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum CaptureMessage {
    /// Subscription started, provides the command handle.
    Started(CaptureHandle),
    /// Sources are open.
    Ready {
        width: u32,
        height: u32,
        simulated: bool,
        has_audio: bool,
        /// Set when the real camera failed and the simulation took over.
        fallback: Option<PermissionError>,
    },
    Preview(RawFrame),
    RecordingStarted,
    RecordingFinished(RecordedMedia),
    /// The device stopped delivering; the worker has exited.
    Failed(PermissionError),
}

/// Creates the capture subscription for one session.
///
/// A new `generation` replaces the worker of the previous one.
pub fn capture_session(
    options: CaptureOptions,
    session_id: u64,
    generation: u32,
) -> iced::Subscription<CaptureMessage> {
    iced::Subscription::run_with(
        CaptureSessionData(CaptureSessionId(session_id, generation), options),
        |CaptureSessionData(_, options)| {
            let options = options.clone();
            stream::channel(100, move |mut output: iced::futures::channel::mpsc::Sender<CaptureMessage>| async move {
                let (command_tx, command_rx) = crossbeam_channel::unbounded();
                let (event_tx, mut event_rx) = mpsc::channel(4);

                let _ = output
                    .send(CaptureMessage::Started(CaptureHandle::new(command_tx)))
                    .await;

                let spawned = std::thread::Builder::new()
                    .name("capture-worker".to_string())
                    .spawn(move || {
                        let sources = acquire_sources(&options);
                        run_worker(sources, &options, &command_rx, &event_tx);
                    });

                if let Err(e) = spawned {
                    let _ = output
                        .send(CaptureMessage::Failed(PermissionError::DeviceFailed(
                            e.to_string(),
                        )))
                        .await;
                } else {
                    while let Some(message) = event_rx.recv().await {
                        if output.send(message).await.is_err() {
                            break;
                        }
                    }
                }

                // Keep subscription alive but idle
                std::future::pending::<()>().await;
            })
        },
    )
}

/// Runs the capture loop until the event channel closes, the command
/// channel disconnects or the camera fails. Devices are released on exit.
pub fn run_worker(
    mut sources: AcquiredSources,
    options: &CaptureOptions,
    commands: &Receiver<CaptureCommand>,
    events: &mpsc::Sender<CaptureMessage>,
) {
    let (width, height) = sources.frame_size;
    let ready = CaptureMessage::Ready {
        width,
        height,
        simulated: sources.is_simulated(),
        has_audio: sources.microphone.is_some(),
        fallback: sources.fallback.clone(),
    };
    if events.blocking_send(ready).is_ok() {
        capture_loop(&mut sources, options, commands, events);
    }
    sources.release();
}

fn capture_loop(
    sources: &mut AcquiredSources,
    options: &CaptureOptions,
    commands: &Receiver<CaptureCommand>,
    events: &mpsc::Sender<CaptureMessage>,
) {
    let (width, height) = sources.frame_size;
    let audio_format = sources.microphone.as_ref().map(|(_, format)| *format);
    let mut recording: Option<RecordingSink> = None;

    loop {
        loop {
            match commands.try_recv() {
                Ok(CaptureCommand::StartRecording) => {
                    // A repeated start replaces the open recording. Audio
                    // captured before the start belongs to nobody.
                    if let Some((microphone, _)) = sources.microphone.as_mut() {
                        microphone.drain_samples();
                    }
                    recording = Some(RecordingSink::new(
                        width,
                        height,
                        options.frame_rate,
                        audio_format,
                    ));
                    if events.blocking_send(CaptureMessage::RecordingStarted).is_err() {
                        return;
                    }
                }
                Ok(CaptureCommand::StopRecording) => {
                    if let Some(sink) = recording.take() {
                        let media = sink.finish();
                        if events
                            .blocking_send(CaptureMessage::RecordingFinished(media))
                            .is_err()
                        {
                            return;
                        }
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return,
            }
        }

        let frame = match sources.camera.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                let _ = events.blocking_send(CaptureMessage::Failed(e));
                return;
            }
        };

        let samples = sources
            .microphone
            .as_mut()
            .map(|(microphone, _)| microphone.drain_samples());

        if let Some(sink) = recording.as_mut() {
            sink.push_frame(&frame, options.recording_quality);
            if let Some(samples) = samples {
                sink.push_audio(&samples);
            }
        }

        match events.try_send(CaptureMessage::Preview(frame)) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => {}
            Err(mpsc::error::TrySendError::Closed(_)) => return,
        }
    }
}

/// Accumulates one recording.
struct RecordingSink {
    writer: AviWriter,
    started: Instant,
    started_at: SystemTime,
}

impl RecordingSink {
    fn new(width: u32, height: u32, fps: u32, audio: Option<AudioFormat>) -> Self {
        Self {
            writer: AviWriter::new(width, height, fps, audio),
            started: Instant::now(),
            started_at: SystemTime::now(),
        }
    }

    fn push_frame(&mut self, frame: &RawFrame, quality: u8) {
        match encode_jpeg(frame, quality) {
            Ok(jpeg) => self.writer.push_frame(&jpeg),
            Err(e) => eprintln!("Dropping recorded frame: {e}"),
        }
    }

    fn push_audio(&mut self, samples: &[i16]) {
        if !samples.is_empty() {
            self.writer.push_audio(samples);
        }
    }

    fn finish(self) -> RecordedMedia {
        let duration = self.started.elapsed();
        let bytes = if self.writer.frame_count() == 0 {
            Vec::new()
        } else {
            self.writer.finish()
        };
        RecordedMedia::new(
            bytes,
            ContentType::new(avi::CONTENT_TYPE),
            duration,
            self.started_at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::capture::SimulatedCamera;
    use crate::application::port::CaptureSource;
    use std::time::Duration;

    fn simulated_sources(width: u32, height: u32) -> AcquiredSources {
        let mut camera = SimulatedCamera::new(width, height, Duration::from_millis(5));
        let frame_size = camera.open().expect("open");
        AcquiredSources {
            camera: Box::new(camera),
            frame_size,
            microphone: None,
            fallback: None,
        }
    }

    fn options() -> CaptureOptions {
        CaptureOptions {
            width: 32,
            height: 24,
            frame_rate: 30,
            test_mode: true,
            ..CaptureOptions::default()
        }
    }

    #[test]
    fn worker_reports_ready_then_previews() {
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let (event_tx, mut event_rx) = mpsc::channel(4);
        let opts = options();

        let worker = std::thread::spawn(move || {
            run_worker(simulated_sources(32, 24), &opts, &command_rx, &event_tx);
        });

        match event_rx.blocking_recv() {
            Some(CaptureMessage::Ready {
                width,
                height,
                simulated,
                has_audio,
                fallback,
            }) => {
                assert_eq!((width, height), (32, 24));
                assert!(simulated);
                assert!(!has_audio);
                assert!(fallback.is_none());
            }
            other => panic!("expected Ready, got {other:?}"),
        }
        assert!(matches!(
            event_rx.blocking_recv(),
            Some(CaptureMessage::Preview(_))
        ));

        drop(command_tx);
        drop(event_rx);
        worker.join().expect("worker exits once channels close");
    }

    #[test]
    fn recording_produces_avi_media() {
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let (event_tx, mut event_rx) = mpsc::channel(4);
        let opts = options();

        let worker = std::thread::spawn(move || {
            run_worker(simulated_sources(32, 24), &opts, &command_rx, &event_tx);
        });

        command_tx.send(CaptureCommand::StartRecording).expect("send");
        let mut previews_while_recording = 0;
        let media = loop {
            match event_rx.blocking_recv() {
                Some(CaptureMessage::RecordingStarted) => {}
                Some(CaptureMessage::Preview(_)) => {
                    previews_while_recording += 1;
                    if previews_while_recording == 5 {
                        command_tx.send(CaptureCommand::StopRecording).expect("send");
                    }
                }
                Some(CaptureMessage::RecordingFinished(media)) => break media,
                Some(CaptureMessage::Ready { .. }) => {}
                other => panic!("unexpected event {other:?}"),
            }
        };

        assert!(!media.is_empty());
        assert_eq!(media.content_type().as_str(), avi::CONTENT_TYPE);
        assert_eq!(&media.data()[..4], b"RIFF");
        assert!(media.duration() > Duration::ZERO);

        drop(event_rx);
        drop(command_tx);
        worker.join().expect("worker exits");
    }

    #[test]
    fn repeated_start_restarts_the_recording() {
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let (event_tx, mut event_rx) = mpsc::channel(4);
        let opts = options();

        command_tx.send(CaptureCommand::StartRecording).expect("send");
        command_tx.send(CaptureCommand::StartRecording).expect("send");
        let worker = std::thread::spawn(move || {
            run_worker(simulated_sources(8, 8), &opts, &command_rx, &event_tx);
        });

        let mut acknowledged = 0;
        while acknowledged < 2 {
            match event_rx.blocking_recv() {
                Some(CaptureMessage::RecordingStarted) => acknowledged += 1,
                Some(CaptureMessage::Ready { .. } | CaptureMessage::Preview(_)) => {}
                other => panic!("unexpected event {other:?}"),
            }
        }

        command_tx.send(CaptureCommand::StopRecording).expect("send");
        let finished = loop {
            match event_rx.blocking_recv() {
                Some(CaptureMessage::RecordingFinished(media)) => break media,
                Some(CaptureMessage::Preview(_)) => {}
                other => panic!("unexpected event {other:?}"),
            }
        };
        assert!(finished.duration() > Duration::ZERO);

        drop(event_rx);
        drop(command_tx);
        worker.join().expect("worker exits");
    }

    #[test]
    fn stop_without_start_is_ignored() {
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let (event_tx, mut event_rx) = mpsc::channel(4);
        let opts = options();

        command_tx.send(CaptureCommand::StopRecording).expect("send");
        let worker = std::thread::spawn(move || {
            run_worker(simulated_sources(8, 8), &opts, &command_rx, &event_tx);
        });

        for _ in 0..4 {
            let event = event_rx.blocking_recv();
            assert!(
                !matches!(event, Some(CaptureMessage::RecordingFinished(_))),
                "no media without a recording"
            );
        }

        drop(event_rx);
        drop(command_tx);
        worker.join().expect("worker exits");
    }
}
