// SPDX-License-Identifier: MPL-2.0
//! Four-corner calibration step.
//!
//! Once the user starts, two timers run side by side: the status poll and
//! the frame tick. The frame tick either submits the latest camera frame or,
//! when the capture is simulated, advances the [`CalibrationRun`] simulator.
//! Both timers are derived from [`CalibrationRun::is_active`], so the first
//! observed completion tears them down together.

use crate::application::calibration::{self, CalibrationRun, FrameOutcome};
use crate::application::port::{ApiError, GazeBackend};
use crate::config::{SessionConfig, CALIBRATION_JPEG_QUALITY};
use crate::domain::calibration::{CalibrationPhase, CalibrationStatus, FrameFeedback};
use crate::domain::frame::RawFrame;
use crate::error::Error;
use crate::i18n::fluent::I18n;
use crate::media::jpeg::encode_jpeg;
use crate::ui::design_tokens::{gaze, palette, sizing, spacing, typography};
use crate::ui::styles::button as button_styles;
use iced::widget::{button, container, image, progress_bar, Column, Container, Row, Stack, Text};
use iced::{alignment, Border, Element, Length, Subscription, Task, Theme};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Stage {
    Idle,
    Starting,
    Running(CalibrationRun),
    Done(String),
}

#[derive(Debug, Clone)]
pub struct State {
    stage: Stage,
    status_interval: Duration,
    frame_interval: Duration,
    simulated_frames_per_corner: u32,
    force_simulation: bool,
    capture_ready: bool,
    capture_simulated: bool,
    status_in_flight: bool,
}

#[derive(Debug, Clone)]
pub enum Message {
    Start,
    Started(Result<String, Error>),
    StatusTick,
    StatusPolled(String, Result<CalibrationStatus, ApiError>),
    FrameTick,
    FrameSubmitted(String, Result<FrameFeedback, ApiError>),
}

/// Events propagated to the session modal.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    None,
    Started { session_id: String, simulated: bool },
    PhaseChanged(CalibrationPhase),
    /// Fired once per session.
    Completed(String),
    /// A frame submission or status poll failed; the run continues.
    Swallowed(ApiError),
    Failed(Error),
}

pub struct ViewContext<'a> {
    pub i18n: &'a I18n,
    pub preview: Option<&'a image::Handle>,
}

impl State {
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            stage: Stage::Idle,
            status_interval: config.status_poll_interval,
            frame_interval: config.frame_interval,
            simulated_frames_per_corner: config.simulated_frames_per_corner,
            force_simulation: config.test_mode,
            capture_ready: false,
            capture_simulated: false,
            status_in_flight: false,
        }
    }

    /// Called by the modal when the capture worker reports its sources.
    pub fn set_capture(&mut self, ready: bool, simulated: bool) {
        self.capture_ready = ready;
        self.capture_simulated = simulated;
    }

    #[must_use]
    pub fn run(&self) -> Option<&CalibrationRun> {
        match &self.stage {
            Stage::Running(run) => Some(run),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.run().is_some_and(CalibrationRun::is_active)
    }

    #[must_use]
    pub fn can_start(&self) -> bool {
        matches!(self.stage, Stage::Idle) && self.capture_ready
    }

    #[must_use]
    pub fn phase(&self) -> CalibrationPhase {
        match &self.stage {
            Stage::Running(run) => run.phase(),
            Stage::Done(_) => CalibrationPhase::Completed,
            Stage::Idle | Stage::Starting => CalibrationPhase::Ready,
        }
    }

    fn simulated(&self) -> bool {
        self.force_simulation || self.capture_simulated
    }

    pub fn handle_message<B: GazeBackend>(
        &mut self,
        message: Message,
        backend: &B,
        latest_frame: Option<&RawFrame>,
    ) -> (Event, Task<Message>) {
        match message {
            Message::Start => {
                if !self.can_start() {
                    return (Event::None, Task::none());
                }
                self.stage = Stage::Starting;
                let backend = backend.clone();
                (
                    Event::None,
                    Task::perform(
                        async move { calibration::start_session(&backend).await },
                        Message::Started,
                    ),
                )
            }
            Message::Started(result) => {
                if !matches!(self.stage, Stage::Starting) {
                    return (Event::None, Task::none());
                }
                match result {
                    Ok(session_id) => {
                        let simulated = self.simulated();
                        let run = CalibrationRun::new(
                            session_id.clone(),
                            simulated.then_some(self.simulated_frames_per_corner),
                        );
                        self.stage = Stage::Running(run);
                        self.status_in_flight = false;
                        (
                            Event::Started {
                                session_id,
                                simulated,
                            },
                            Task::none(),
                        )
                    }
                    Err(err) => {
                        self.stage = Stage::Idle;
                        (Event::Failed(err), Task::none())
                    }
                }
            }
            Message::StatusTick => {
                let Stage::Running(run) = &self.stage else {
                    return (Event::None, Task::none());
                };
                if !run.is_active() || self.status_in_flight {
                    return (Event::None, Task::none());
                }
                self.status_in_flight = true;
                let task = Task::perform(
                    calibration::poll_status(backend.clone(), run.session_id().to_string()),
                    |(session_id, result)| Message::StatusPolled(session_id, result),
                );
                (Event::None, task)
            }
            Message::StatusPolled(session_id, result) => {
                let Stage::Running(run) = &mut self.stage else {
                    return (Event::None, Task::none());
                };
                if session_id != run.session_id() {
                    return (Event::None, Task::none());
                }
                self.status_in_flight = false;
                let before = run.phase();
                match result {
                    Ok(status) => {
                        if let Some(completed) = run.apply_status(&session_id, &status) {
                            self.stage = Stage::Done(completed.clone());
                            return (Event::Completed(completed), Task::none());
                        }
                        (phase_event(before, run.phase()), Task::none())
                    }
                    Err(err) => (Event::Swallowed(err), Task::none()),
                }
            }
            Message::FrameTick => self.on_frame_tick(backend, latest_frame),
            Message::FrameSubmitted(session_id, result) => {
                let Stage::Running(run) = &mut self.stage else {
                    return (Event::None, Task::none());
                };
                let before = run.phase();
                match run.apply_frame_result(&session_id, result) {
                    FrameOutcome::Completed(id) => {
                        self.stage = Stage::Done(id.clone());
                        (Event::Completed(id), Task::none())
                    }
                    FrameOutcome::Swallowed(err) => (Event::Swallowed(err), Task::none()),
                    FrameOutcome::Accepted => (phase_event(before, run.phase()), Task::none()),
                    FrameOutcome::Ignored => (Event::None, Task::none()),
                }
            }
        }
    }

    fn on_frame_tick<B: GazeBackend>(
        &mut self,
        backend: &B,
        latest_frame: Option<&RawFrame>,
    ) -> (Event, Task<Message>) {
        let Stage::Running(run) = &mut self.stage else {
            return (Event::None, Task::none());
        };

        if run.is_simulated() {
            let before = run.phase();
            if let Some(completed) = run.simulate_tick() {
                self.stage = Stage::Done(completed.clone());
                return (Event::Completed(completed), Task::none());
            }
            return (phase_event(before, run.phase()), Task::none());
        }

        let Some(frame) = latest_frame else {
            return (Event::None, Task::none());
        };
        if !run.begin_frame_submission() {
            return (Event::None, Task::none());
        }

        let session_id = run.session_id().to_string();
        match encode_jpeg(frame, CALIBRATION_JPEG_QUALITY) {
            Ok(jpeg) => (
                Event::None,
                Task::perform(
                    calibration::submit_frame(backend.clone(), session_id, jpeg),
                    |(session_id, result)| Message::FrameSubmitted(session_id, result),
                ),
            ),
            Err(e) => {
                let failure = ApiError::Transport(format!("frame encoding failed: {e}"));
                match run.apply_frame_result(&session_id, Err(failure)) {
                    FrameOutcome::Swallowed(err) => (Event::Swallowed(err), Task::none()),
                    _ => (Event::None, Task::none()),
                }
            }
        }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        if !self.is_active() {
            return Subscription::none();
        }
        Subscription::batch([
            iced::time::every(self.status_interval).map(|_| Message::StatusTick),
            iced::time::every(self.frame_interval).map(|_| Message::FrameTick),
        ])
    }

    pub fn view<'a>(&'a self, ctx: ViewContext<'a>) -> Element<'a, Message> {
        let i18n = ctx.i18n;
        let phase = self.phase();

        let mut content = Column::new()
            .spacing(spacing::MD)
            .align_x(alignment::Horizontal::Center)
            .width(Length::Fill);

        content = content.push(
            Text::new(i18n.tr(phase.instruction_key()))
                .size(typography::TITLE_MD)
                .align_x(alignment::Horizontal::Center),
        );

        content = content.push(target_area(phase, ctx.preview));

        match &self.stage {
            Stage::Idle => {
                let label = if self.capture_ready {
                    i18n.tr("calibration-start")
                } else {
                    i18n.tr("calibration-waiting-camera")
                };
                let start = button(Text::new(label))
                    .on_press_maybe(self.can_start().then_some(Message::Start))
                    .style(button_styles::primary);
                content = content.push(start);
            }
            Stage::Starting => {
                content = content.push(Text::new(i18n.tr("calibration-connecting")));
            }
            Stage::Running(run) => {
                content = content.push(
                    progress_bar(0.0..=1.0, run.progress())
                        .girth(sizing::PROGRESS_BAR_HEIGHT),
                );
                content = content.push(corner_counts(run));
                if let Some(instructions) = run.instructions() {
                    content = content.push(Text::new(instructions).size(typography::BODY_SM));
                }
                if run.is_simulated() {
                    content = content.push(
                        Text::new(i18n.tr("calibration-simulated")).size(typography::CAPTION),
                    );
                } else if let Some(face) = run.face_detected() {
                    let key = if face {
                        "calibration-face-detected"
                    } else {
                        "calibration-face-missing"
                    };
                    content = content.push(Text::new(i18n.tr(key)).size(typography::CAPTION));
                }
            }
            Stage::Done(_) => {
                content = content.push(
                    progress_bar(0.0..=1.0, 1.0).girth(sizing::PROGRESS_BAR_HEIGHT),
                );
            }
        }

        content.into()
    }
}

fn phase_event(before: CalibrationPhase, after: CalibrationPhase) -> Event {
    if before == after {
        Event::None
    } else {
        Event::PhaseChanged(after)
    }
}

/// Camera preview with the target dot pinned to the active corner.
fn target_area<'a>(phase: CalibrationPhase, preview: Option<&'a image::Handle>) -> Element<'a, Message> {
    let (align_x, align_y) = match phase {
        CalibrationPhase::TopLeft => (alignment::Horizontal::Left, alignment::Vertical::Top),
        CalibrationPhase::TopRight => (alignment::Horizontal::Right, alignment::Vertical::Top),
        CalibrationPhase::BottomLeft => (alignment::Horizontal::Left, alignment::Vertical::Bottom),
        CalibrationPhase::BottomRight => {
            (alignment::Horizontal::Right, alignment::Vertical::Bottom)
        }
        CalibrationPhase::Ready | CalibrationPhase::Completed => {
            (alignment::Horizontal::Center, alignment::Vertical::Center)
        }
    };

    let dot_color = if phase.is_completed() {
        gaze::INSIDE
    } else {
        palette::ERROR_500
    };
    let dot = Container::new(Text::new(""))
        .width(Length::Fixed(sizing::CALIBRATION_TARGET))
        .height(Length::Fixed(sizing::CALIBRATION_TARGET))
        .style(move |_theme: &Theme| container::Style {
            background: Some(dot_color.into()),
            border: Border {
                radius: (sizing::CALIBRATION_TARGET / 2.0).into(),
                color: palette::WHITE,
                width: 2.0,
            },
            ..Default::default()
        });

    let overlay = Container::new(dot)
        .width(Length::Fill)
        .height(Length::Fill)
        .padding(spacing::SM)
        .align_x(align_x)
        .align_y(align_y);

    let background: Element<'a, Message> = match preview {
        Some(handle) => image(handle.clone())
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
        None => Container::new(Text::new("")).into(),
    };

    Container::new(Stack::new().push(background).push(overlay))
        .width(Length::Fixed(sizing::PREVIEW_WIDTH))
        .height(Length::Fixed(sizing::PREVIEW_HEIGHT))
        .style(crate::ui::styles::container::media_frame)
        .into()
}

fn corner_counts(run: &CalibrationRun) -> Element<'_, Message> {
    let labels = ["↖", "↗", "↙", "↘"];
    let mut row = Row::new().spacing(spacing::LG);
    for (label, count) in labels.iter().zip(run.collected_points()) {
        row = row.push(Text::new(format!("{label} {count}")).size(typography::BODY_SM));
    }
    row.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockBackend;

    fn config() -> SessionConfig {
        SessionConfig {
            simulated_frames_per_corner: 2,
            ..SessionConfig::default()
        }
    }

    fn running(simulated: bool) -> (State, MockBackend) {
        let backend = MockBackend::new();
        let mut state = State::new(&config());
        state.set_capture(true, simulated);
        let _ = state.handle_message(Message::Start, &backend, None);
        let (event, _) =
            state.handle_message(Message::Started(Ok("abc123".into())), &backend, None);
        assert_eq!(
            event,
            Event::Started {
                session_id: "abc123".into(),
                simulated
            }
        );
        (state, backend)
    }

    fn completed_status() -> CalibrationStatus {
        CalibrationStatus {
            session_id: "abc123".into(),
            current_phase: CalibrationPhase::Completed,
            progress: 1.0,
            status: "completed".into(),
            ..CalibrationStatus::default()
        }
    }

    #[test]
    fn start_waits_for_capture() {
        let backend = MockBackend::new();
        let mut state = State::new(&config());
        assert!(!state.can_start());
        let (event, _) = state.handle_message(Message::Start, &backend, None);
        assert_eq!(event, Event::None);
        assert_eq!(state.phase(), CalibrationPhase::Ready);
    }

    #[test]
    fn simulated_run_completes_exactly_once() {
        let (mut state, backend) = running(true);
        let mut completions = Vec::new();
        for _ in 0..20 {
            let (event, _) = state.handle_message(Message::FrameTick, &backend, None);
            if let Event::Completed(id) = event {
                completions.push(id);
            }
        }
        assert_eq!(completions, vec!["abc123".to_string()]);
        assert!(!state.is_active());
    }

    #[test]
    fn late_status_after_completion_is_ignored() {
        let (mut state, backend) = running(true);
        for _ in 0..8 {
            let _ = state.handle_message(Message::FrameTick, &backend, None);
        }
        let (event, _) = state.handle_message(
            Message::StatusPolled("abc123".into(), Ok(completed_status())),
            &backend,
            None,
        );
        assert_eq!(event, Event::None);
    }

    #[test]
    fn status_poll_can_complete_the_session() {
        let (mut state, backend) = running(false);
        let (event, _) = state.handle_message(
            Message::StatusPolled("abc123".into(), Ok(completed_status())),
            &backend,
            None,
        );
        assert_eq!(event, Event::Completed("abc123".into()));
        assert_eq!(state.phase(), CalibrationPhase::Completed);
    }

    #[test]
    fn frame_failures_are_swallowed() {
        let (mut state, backend) = running(false);
        let frame = RawFrame::filled(16, 16, [10, 20, 30, 255]);
        let _ = state.handle_message(Message::FrameTick, &backend, Some(&frame));
        let (event, _) = state.handle_message(
            Message::FrameSubmitted("abc123".into(), Err(ApiError::Transport("down".into()))),
            &backend,
            None,
        );
        assert!(matches!(event, Event::Swallowed(_)));
        assert!(state.is_active());
    }

    #[test]
    fn stale_session_answers_are_ignored() {
        let (mut state, backend) = running(false);
        let (event, _) = state.handle_message(
            Message::StatusPolled("old-session".into(), Ok(completed_status())),
            &backend,
            None,
        );
        assert_eq!(event, Event::None);
        assert!(state.is_active());
    }

    #[test]
    fn failed_start_returns_to_idle() {
        let backend = MockBackend::new();
        let mut state = State::new(&config());
        state.set_capture(true, false);
        let _ = state.handle_message(Message::Start, &backend, None);
        let (event, _) = state.handle_message(
            Message::Started(Err(Error::Network("refused".into()))),
            &backend,
            None,
        );
        assert!(matches!(event, Event::Failed(Error::Network(_))));
        assert!(state.can_start());
    }

    #[test]
    fn test_mode_forces_simulation() {
        let backend = MockBackend::new();
        let mut state = State::new(&SessionConfig {
            test_mode: true,
            ..config()
        });
        state.set_capture(true, false);
        let _ = state.handle_message(Message::Start, &backend, None);
        let (event, _) =
            state.handle_message(Message::Started(Ok("s".into())), &backend, None);
        assert_eq!(
            event,
            Event::Started {
                session_id: "s".into(),
                simulated: true
            }
        );
    }
}
