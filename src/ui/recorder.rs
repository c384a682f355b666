// SPDX-License-Identifier: MPL-2.0
//! Recording step.
//!
//! The widget only decides; the capture worker does the recording. Start and
//! stop requests leave as [`Event::Command`] for the modal to forward, and
//! the worker's answers come back as [`Message::CaptureStarted`] and
//! [`Message::CaptureFinished`].

use crate::config::SessionConfig;
use crate::domain::media::RecordedMedia;
use crate::error::Error;
use crate::i18n::fluent::I18n;
use crate::infrastructure::capture::CaptureCommand;
use crate::media::{Recorder, RecorderState, StopDecision};
use crate::ui::design_tokens::{palette, sizing, spacing, typography};
use crate::ui::styles::button as button_styles;
use iced::widget::{button, image, Column, Container, Row, Text};
use iced::{alignment, Element, Length, Subscription};
use std::time::{Duration, Instant};

const TICK_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct State {
    recorder: Recorder,
    elapsed: Duration,
    /// Shown after a stop request that came too early.
    too_short_remaining: Option<Duration>,
    capture_ready: bool,
}

#[derive(Debug, Clone)]
pub enum Message {
    StartPressed,
    StopPressed,
    Tick(Instant),
    CaptureStarted,
    CaptureFinished(RecordedMedia),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    None,
    Command(CaptureCommand),
    Started,
    /// The stop request came before the minimum duration and was ignored.
    TooShort { remaining: Duration },
    Finished(RecordedMedia),
    Failed(Error),
}

pub struct ViewContext<'a> {
    pub i18n: &'a I18n,
    pub preview: Option<&'a image::Handle>,
    pub has_audio: bool,
}

impl State {
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            recorder: Recorder::new(config.min_recording_duration, config.start_grace),
            elapsed: Duration::ZERO,
            too_short_remaining: None,
            capture_ready: false,
        }
    }

    pub fn set_capture_ready(&mut self, ready: bool) {
        self.capture_ready = ready;
    }

    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.recorder.is_busy()
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Drops an in-progress recording, e.g. when the capture worker died.
    pub fn abort(&mut self) {
        self.recorder.abort();
        self.elapsed = Duration::ZERO;
        self.too_short_remaining = None;
    }

    pub fn handle_message(&mut self, message: Message, now: Instant) -> Event {
        match message {
            Message::StartPressed => {
                if !self.capture_ready || !self.recorder.request_start(now) {
                    return Event::None;
                }
                self.elapsed = Duration::ZERO;
                self.too_short_remaining = None;
                Event::Command(CaptureCommand::StartRecording)
            }
            Message::StopPressed => match self.recorder.request_stop(now) {
                StopDecision::TooShort { remaining } => {
                    self.too_short_remaining = Some(remaining);
                    Event::TooShort { remaining }
                }
                StopDecision::Accepted { elapsed } => {
                    self.elapsed = elapsed;
                    self.too_short_remaining = None;
                    Event::Command(CaptureCommand::StopRecording)
                }
                StopDecision::NotRecording => Event::None,
            },
            Message::Tick(now) => {
                if let Err(e) = self.recorder.check_grace(now) {
                    return Event::Failed(e.into());
                }
                self.elapsed = self.recorder.elapsed(now);
                if self.recorder.can_stop(now) {
                    self.too_short_remaining = None;
                }
                Event::None
            }
            Message::CaptureStarted => {
                self.recorder.mark_active(now);
                if self.recorder.is_recording() {
                    Event::Started
                } else {
                    Event::None
                }
            }
            Message::CaptureFinished(media) => match self.recorder.finish(media) {
                Some(Ok(media)) => Event::Finished(media),
                Some(Err(e)) => {
                    self.elapsed = Duration::ZERO;
                    Event::Failed(e.into())
                }
                None => Event::None,
            },
        }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        if self.recorder.is_busy() {
            iced::time::every(TICK_INTERVAL).map(Message::Tick)
        } else {
            Subscription::none()
        }
    }

    pub fn view<'a>(&'a self, ctx: ViewContext<'a>) -> Element<'a, Message> {
        let i18n = ctx.i18n;

        let preview: Element<'a, Message> = match ctx.preview {
            Some(handle) => image(handle.clone())
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => Text::new(i18n.tr("recorder-waiting-camera")).into(),
        };
        let preview = Container::new(preview)
            .width(Length::Fixed(sizing::PREVIEW_WIDTH))
            .height(Length::Fixed(sizing::PREVIEW_HEIGHT))
            .align_x(alignment::Horizontal::Center)
            .align_y(alignment::Vertical::Center)
            .style(crate::ui::styles::container::media_frame);

        let min_secs = self.recorder.min_duration().as_secs().to_string();
        let elapsed = format_elapsed(self.elapsed);

        let status: Element<'a, Message> = match self.recorder.state() {
            RecorderState::Idle | RecorderState::Finished => Text::new(
                i18n.tr_with_args("recorder-hint", &[("seconds", min_secs.as_str())]),
            )
            .size(typography::BODY_SM)
            .into(),
            RecorderState::Starting { .. } => Text::new(i18n.tr("recorder-starting")).into(),
            RecorderState::Recording { .. } => Row::new()
                .spacing(spacing::XS)
                .align_y(alignment::Vertical::Center)
                .push(Text::new("●").color(palette::ERROR_500))
                .push(Text::new(i18n.tr_with_args(
                    "recorder-recording",
                    &[("elapsed", elapsed.as_str())],
                )))
                .into(),
            RecorderState::Stopping { .. } => Text::new(i18n.tr("recorder-finishing")).into(),
        };

        let action: Element<'a, Message> = if self.recorder.is_recording() {
            button(Text::new(i18n.tr("recorder-stop")))
                .on_press(Message::StopPressed)
                .style(button_styles::danger)
                .into()
        } else {
            let enabled = self.capture_ready && !self.recorder.is_busy();
            button(Text::new(i18n.tr("recorder-start")))
                .on_press_maybe(enabled.then_some(Message::StartPressed))
                .style(button_styles::primary)
                .into()
        };

        let mut content = Column::new()
            .spacing(spacing::MD)
            .align_x(alignment::Horizontal::Center)
            .width(Length::Fill)
            .push(preview)
            .push(status)
            .push(action);

        if let Some(remaining) = self.too_short_remaining {
            let secs = remaining.as_secs_f32().ceil().to_string();
            content = content.push(
                Text::new(i18n.tr_with_args("recorder-too-short", &[("seconds", secs.as_str())]))
                    .size(typography::BODY_SM)
                    .color(palette::WARNING_500),
            );
        }
        if !ctx.has_audio {
            content = content.push(
                Text::new(i18n.tr("recorder-no-audio"))
                    .size(typography::CAPTION)
                    .color(palette::GRAY_400),
            );
        }

        content.into()
    }
}

/// Formats elapsed recording time as `m:ss`.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::media::ContentType;
    use crate::error::ValidationError;
    use std::time::SystemTime;

    fn state() -> State {
        let mut state = State::new(&SessionConfig::default());
        state.set_capture_ready(true);
        state
    }

    fn media(duration: Duration) -> RecordedMedia {
        RecordedMedia::new(
            vec![1u8; 4096],
            ContentType::new("video/x-msvideo"),
            duration,
            SystemTime::now(),
        )
    }

    fn recording(t0: Instant) -> State {
        let mut state = state();
        assert_eq!(
            state.handle_message(Message::StartPressed, t0),
            Event::Command(CaptureCommand::StartRecording)
        );
        assert_eq!(state.handle_message(Message::CaptureStarted, t0), Event::Started);
        state
    }

    #[test]
    fn start_requires_ready_capture() {
        let mut state = State::new(&SessionConfig::default());
        assert_eq!(
            state.handle_message(Message::StartPressed, Instant::now()),
            Event::None
        );
    }

    #[test]
    fn early_stop_is_a_no_op() {
        let t0 = Instant::now();
        let mut state = recording(t0);
        let event = state.handle_message(Message::StopPressed, t0 + Duration::from_secs(1));
        assert_eq!(
            event,
            Event::TooShort {
                remaining: Duration::from_secs(2)
            }
        );
        assert!(state.is_recording());
    }

    #[test]
    fn full_recording_emits_media_once() {
        let t0 = Instant::now();
        let mut state = recording(t0);
        let stop_at = t0 + Duration::from_secs(4);
        assert_eq!(
            state.handle_message(Message::StopPressed, stop_at),
            Event::Command(CaptureCommand::StopRecording)
        );

        let finished = state.handle_message(
            Message::CaptureFinished(media(Duration::from_secs(4))),
            stop_at,
        );
        assert!(matches!(finished, Event::Finished(ref m) if !m.is_empty()));

        let again = state.handle_message(
            Message::CaptureFinished(media(Duration::from_secs(4))),
            stop_at,
        );
        assert_eq!(again, Event::None);
    }

    #[test]
    fn worker_that_never_starts_fails_after_grace() {
        let t0 = Instant::now();
        let mut state = state();
        state.handle_message(Message::StartPressed, t0);
        assert_eq!(
            state.handle_message(Message::Tick(t0 + Duration::from_millis(500)), t0),
            Event::None
        );
        let event = state.handle_message(Message::Tick(t0 + Duration::from_secs(2)), t0);
        assert_eq!(
            event,
            Event::Failed(Error::Validation(ValidationError::RecorderDidNotStart))
        );
        assert!(!state.is_busy());
    }

    #[test]
    fn short_media_is_rejected() {
        let t0 = Instant::now();
        let mut state = recording(t0);
        state.handle_message(Message::StopPressed, t0 + Duration::from_secs(3));
        let event = state.handle_message(
            Message::CaptureFinished(media(Duration::from_millis(1200))),
            t0 + Duration::from_secs(3),
        );
        assert!(matches!(
            event,
            Event::Failed(Error::Validation(ValidationError::RecordingTooShort { .. }))
        ));
    }

    #[test]
    fn elapsed_formats_as_minutes_and_seconds() {
        assert_eq!(format_elapsed(Duration::from_secs(5)), "0:05");
        assert_eq!(format_elapsed(Duration::from_secs(125)), "2:05");
    }
}
