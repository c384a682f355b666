// SPDX-License-Identifier: MPL-2.0
//! Session orchestrator.
//!
//! Owns the [`SessionState`] and exactly one mounted step widget. Widgets
//! report [`Event`](crate::ui::calibration::Event)s; this module turns them
//! into state transitions, mounts the next widget and shows failures in a
//! single dismissible banner without leaving the current step.
//!
//! The capture worker belongs to the modal rather than to a widget, so the
//! camera stays open from calibration through recording.

use crate::application::analysis::AnalysisInput;
use crate::application::port::GazeBackend;
use crate::config::SessionConfig;
use crate::diagnostics::{
    AppStateEvent, DiagnosticsHandle, ErrorEvent, UserAction, WarningEvent, WarningType,
};
use crate::domain::frame::RawFrame;
use crate::domain::session::{SessionState, SessionStep, SessionVariant};
use crate::error::{Error, PermissionError, ValidationError};
use crate::i18n::fluent::I18n;
use crate::infrastructure::capture::{
    capture_session, CaptureCommand, CaptureHandle, CaptureMessage, CaptureOptions,
};
use crate::ui::components::error_display::{ErrorDisplay, ErrorSeverity};
use crate::ui::design_tokens::{palette, sizing, spacing, typography};
use crate::ui::styles::{button as button_styles, container as container_styles};
use crate::ui::{analysis, calibration, player, recorder, result, uploader};
use iced::widget::{button, image, Column, Container, Row, Space, Text};
use iced::{alignment, Element, Length, Subscription, Task};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Collaborators handed to every session.
#[derive(Debug, Clone)]
pub struct SessionServices {
    pub config: SessionConfig,
    pub diagnostics: DiagnosticsHandle,
    /// Where downloaded test videos are cached.
    pub cache_dir: PathBuf,
    /// Client for object store downloads.
    pub http_client: reqwest::Client,
    /// Where the last test video was saved, if anywhere.
    pub download_dir: Option<PathBuf>,
}

/// What the capture worker reported once its sources were open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CaptureInfo {
    simulated: bool,
    has_audio: bool,
}

enum Mounted {
    Calibration(calibration::State),
    Recorder(recorder::State),
    Uploader(uploader::State),
    Analysis(analysis::State),
    Result(result::State),
    Player(player::State),
}

pub struct State<B: GazeBackend> {
    session: SessionState,
    mounted: Option<Mounted>,
    backend: B,
    services: SessionServices,
    /// Keys the capture subscription; one per opened modal.
    capture_id: u64,
    /// Bumped when the worker dies so the subscription starts a new one.
    capture_generation: u32,
    /// Set after a device failure; later workers use the simulated camera.
    capture_degraded: bool,
    capture: Option<CaptureHandle>,
    capture_info: Option<CaptureInfo>,
    latest_frame: Option<RawFrame>,
    preview: Option<image::Handle>,
    error_hint: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Message {
    Calibration(calibration::Message),
    Recorder(recorder::Message),
    Uploader(uploader::Message),
    Analysis(analysis::Message),
    Result(result::Message),
    Player(player::Message),
    Capture(CaptureMessage),
    Back,
    Close,
    DismissError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    None,
    Closed,
    /// A copy of the test video was written to this path.
    VideoSaved(PathBuf),
}

impl<B: GazeBackend> State<B> {
    /// Opens a session on the first step of `variant`.
    pub fn open(
        variant: SessionVariant,
        backend: B,
        services: SessionServices,
        capture_id: u64,
    ) -> (Self, Task<Message>) {
        services.diagnostics.log_action(UserAction::StartSession {
            variant: variant_name(variant).to_string(),
        });
        let mut state = Self {
            session: SessionState::new(variant),
            mounted: None,
            backend,
            services,
            capture_id,
            capture_generation: 0,
            capture_degraded: false,
            capture: None,
            capture_info: None,
            latest_frame: None,
            preview: None,
            error_hint: None,
        };
        let task = state.mount();
        (state, task)
    }

    #[must_use]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    #[must_use]
    pub fn step(&self) -> SessionStep {
        self.session.step
    }

    /// Whether the camera is needed by the current step.
    #[must_use]
    pub fn needs_capture(&self) -> bool {
        matches!(
            self.session.step,
            SessionStep::Calibration | SessionStep::Record
        )
    }

    /// Step a back button would return to.
    #[must_use]
    pub fn previous_step(&self) -> Option<SessionStep> {
        let steps = self.session.variant().steps();
        let position = self.session.variant().position(self.session.step)?;
        position.checked_sub(1).map(|i| steps[i])
    }

    pub fn handle_message(&mut self, message: Message, i18n: &I18n) -> (Event, Task<Message>) {
        match message {
            Message::Capture(message) => {
                self.on_capture(message, i18n);
                (Event::None, Task::none())
            }
            Message::Calibration(message) => (Event::None, self.on_calibration(message, i18n)),
            Message::Recorder(message) => (Event::None, self.on_recorder(message, i18n)),
            Message::Uploader(message) => (Event::None, self.on_uploader(message, i18n)),
            Message::Analysis(message) => (Event::None, self.on_analysis(message, i18n)),
            Message::Result(message) => (Event::None, self.on_result(message, i18n)),
            Message::Player(message) => self.on_player(message, i18n),
            Message::Back => {
                let Some(target) = self.previous_step() else {
                    return (Event::None, Task::none());
                };
                (Event::None, self.go_back(target, i18n))
            }
            Message::DismissError => {
                self.services.diagnostics.log_action(UserAction::DismissError);
                self.clear_error();
                (Event::None, Task::none())
            }
            Message::Close => {
                self.services.diagnostics.log_action(UserAction::CloseSession);
                self.mounted = None;
                self.session.reset();
                (Event::Closed, Task::none())
            }
        }
    }

    // ------------------------------------------------------------------
    // Capture worker
    // ------------------------------------------------------------------

    fn on_capture(&mut self, message: CaptureMessage, i18n: &I18n) {
        match message {
            CaptureMessage::Started(handle) => self.capture = Some(handle),
            CaptureMessage::Ready {
                simulated,
                has_audio,
                fallback,
                ..
            } => {
                if let Some(reason) = fallback {
                    self.services.diagnostics.log_state(AppStateEvent::CaptureFallback);
                    self.services.diagnostics.log_warning(WarningEvent::new(
                        WarningType::CaptureFallback,
                        reason.to_string(),
                    ));
                }
                self.capture_info = Some(CaptureInfo {
                    simulated,
                    has_audio,
                });
                self.sync_capture();
            }
            CaptureMessage::Preview(frame) => {
                self.preview = Some(image::Handle::from_rgba(
                    frame.width(),
                    frame.height(),
                    frame.rgba_bytes().to_vec(),
                ));
                self.latest_frame = Some(frame);
            }
            CaptureMessage::RecordingStarted => {
                let _ = self.on_recorder(recorder::Message::CaptureStarted, i18n);
            }
            CaptureMessage::RecordingFinished(media) => {
                let _ = self.on_recorder(recorder::Message::CaptureFinished(media), i18n);
            }
            CaptureMessage::Failed(reason) => {
                self.services.diagnostics.log_state(AppStateEvent::CaptureFallback);
                self.capture_generation = self.capture_generation.wrapping_add(1);
                self.capture_degraded = true;
                self.capture = None;
                self.capture_info = None;
                self.latest_frame = None;
                self.preview = None;
                if let Some(Mounted::Recorder(recorder)) = &mut self.mounted {
                    recorder.abort();
                }
                self.session.set_recording(false);
                self.sync_capture();
                self.show_error(&Error::Permission(reason), i18n);
            }
        }
    }

    /// Pushes the capture readiness into the mounted widget.
    fn sync_capture(&mut self) {
        let info = self.capture_info;
        match &mut self.mounted {
            Some(Mounted::Calibration(calibration)) => calibration.set_capture(
                info.is_some(),
                info.is_some_and(|info| info.simulated),
            ),
            Some(Mounted::Recorder(recorder)) => recorder.set_capture_ready(info.is_some()),
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Step widgets
    // ------------------------------------------------------------------

    fn on_calibration(&mut self, message: calibration::Message, i18n: &I18n) -> Task<Message> {
        let Some(Mounted::Calibration(widget)) = &mut self.mounted else {
            return Task::none();
        };
        if matches!(message, calibration::Message::Start) {
            self.services.diagnostics.log_action(UserAction::StartCalibration);
        }
        let (event, task) =
            widget.handle_message(message, &self.backend, self.latest_frame.as_ref());
        let task = task.map(Message::Calibration);

        match event {
            calibration::Event::None => task,
            calibration::Event::Started {
                session_id,
                simulated,
            } => {
                if let Err(e) = self.session.start_calibration(&session_id) {
                    self.show_error(&e.into(), i18n);
                    return task;
                }
                self.services
                    .diagnostics
                    .log_state(AppStateEvent::CalibrationStarted { simulated });
                task
            }
            calibration::Event::PhaseChanged(phase) => {
                self.session.update_calibration_phase(phase);
                task
            }
            calibration::Event::Completed(session_id) => {
                match self.session.complete_calibration(&session_id) {
                    Ok(()) => {
                        self.services
                            .diagnostics
                            .log_state(AppStateEvent::CalibrationCompleted);
                        Task::batch([task, self.mount()])
                    }
                    Err(e) => {
                        self.show_error(&e.into(), i18n);
                        task
                    }
                }
            }
            calibration::Event::Swallowed(err) => {
                self.services.diagnostics.log_warning(WarningEvent::new(
                    WarningType::FrameSubmission,
                    err.to_string(),
                ));
                task
            }
            calibration::Event::Failed(err) => {
                self.show_error(&err, i18n);
                task
            }
        }
    }

    fn on_recorder(&mut self, message: recorder::Message, i18n: &I18n) -> Task<Message> {
        let Some(Mounted::Recorder(widget)) = &mut self.mounted else {
            return Task::none();
        };
        match message {
            recorder::Message::StartPressed => {
                self.services.diagnostics.log_action(UserAction::StartRecording);
            }
            recorder::Message::StopPressed => {
                self.services.diagnostics.log_action(UserAction::StopRecording);
            }
            _ => {}
        }

        match widget.handle_message(message, Instant::now()) {
            recorder::Event::None | recorder::Event::TooShort { .. } => {}
            recorder::Event::Command(command) => {
                let delivered = self
                    .capture
                    .as_ref()
                    .is_some_and(|capture| capture.send(command));
                if !delivered {
                    widget.abort();
                    self.session.set_recording(false);
                    self.show_error(
                        &PermissionError::DeviceFailed("capture worker stopped".into()).into(),
                        i18n,
                    );
                }
            }
            recorder::Event::Started => {
                self.clear_error();
                self.session.set_recording(true);
            }
            recorder::Event::Finished(media) => {
                let duration_ms = u64::try_from(media.duration().as_millis()).unwrap_or(u64::MAX);
                let size_bytes = media.size();
                match self.session.finish_recording(media) {
                    Ok(()) => {
                        self.services
                            .diagnostics
                            .log_state(AppStateEvent::RecordingFinished {
                                duration_ms,
                                size_bytes,
                            });
                        return self.mount();
                    }
                    Err(e) => self.show_error(&e.into(), i18n),
                }
            }
            recorder::Event::Failed(err) => {
                // A start the worker acknowledges late must not leave a
                // recording open there; its media is ignored by the recorder.
                if let Some(capture) = &self.capture {
                    let _ = capture.send(CaptureCommand::StopRecording);
                }
                self.session.set_recording(false);
                self.show_error(&err, i18n);
            }
        }
        Task::none()
    }

    fn on_uploader(&mut self, message: uploader::Message, i18n: &I18n) -> Task<Message> {
        let Some(Mounted::Uploader(widget)) = &mut self.mounted else {
            return Task::none();
        };
        let retry = matches!(message, uploader::Message::Start) && self.session.error.is_some();
        if retry {
            self.services.diagnostics.log_action(UserAction::Retry);
        }
        let (event, task) = widget.handle_message(message, &self.backend);
        let task = task.map(Message::Uploader);

        match event {
            uploader::Event::None => task,
            uploader::Event::Started => {
                self.clear_error();
                self.session.set_uploading(true);
                task
            }
            uploader::Event::Progress(progress) => {
                self.session.set_upload_progress(progress);
                task
            }
            uploader::Event::Completed {
                media_id,
                test_id,
                notice_error,
            } => {
                if let Some(err) = notice_error {
                    self.services.diagnostics.log_warning(WarningEvent::new(
                        WarningType::CompletionNotice,
                        err.to_string(),
                    ));
                }
                let size_bytes = self
                    .session
                    .recorded_media
                    .as_ref()
                    .map_or(0, |media| media.size());
                match self.session.finish_upload(&media_id, &test_id) {
                    Ok(()) => {
                        self.services
                            .diagnostics
                            .log_state(AppStateEvent::UploadCompleted { size_bytes });
                        Task::batch([task, self.mount()])
                    }
                    Err(e) => {
                        self.show_error(&e.into(), i18n);
                        task
                    }
                }
            }
            uploader::Event::Failed(err) => {
                self.session.set_uploading(false);
                self.show_error(&err, i18n);
                task
            }
        }
    }

    fn on_analysis(&mut self, message: analysis::Message, i18n: &I18n) -> Task<Message> {
        let Some(Mounted::Analysis(widget)) = &mut self.mounted else {
            return Task::none();
        };
        if matches!(message, analysis::Message::Start) && self.session.error.is_some() {
            self.services.diagnostics.log_action(UserAction::Retry);
        }
        let (event, task) = widget.handle_message(message, &self.backend);
        let task = task.map(Message::Analysis);

        match event {
            analysis::Event::None => task,
            analysis::Event::Started(task_id) => {
                self.clear_error();
                if let Err(e) = self.session.start_analysis(&task_id) {
                    self.show_error(&e.into(), i18n);
                } else {
                    self.services.diagnostics.log_state(AppStateEvent::AnalysisStarted);
                }
                task
            }
            analysis::Event::Completed(result) => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let score = result.gaze_score.clamp(0.0, 100.0).round() as u32;
                match self.session.finish_analysis(result) {
                    Ok(()) => {
                        self.services
                            .diagnostics
                            .log_state(AppStateEvent::AnalysisCompleted { score });
                        Task::batch([task, self.mount()])
                    }
                    Err(e) => {
                        self.show_error(&e.into(), i18n);
                        task
                    }
                }
            }
            analysis::Event::Failed(err) => {
                self.session.abort_analysis();
                self.show_error(&err, i18n);
                task
            }
        }
    }

    fn on_result(&mut self, message: result::Message, i18n: &I18n) -> Task<Message> {
        let Some(Mounted::Result(widget)) = &mut self.mounted else {
            return Task::none();
        };
        match widget.handle_message(message) {
            result::Event::Retake => self.go_back(SessionStep::Record, i18n),
        }
    }

    fn on_player(&mut self, message: player::Message, i18n: &I18n) -> (Event, Task<Message>) {
        let Some(Mounted::Player(widget)) = &mut self.mounted else {
            return (Event::None, Task::none());
        };
        match message {
            player::Message::TogglePlay => {
                self.services.diagnostics.log_action(UserAction::TogglePlayback);
            }
            player::Message::SaveCopy => {
                self.services.diagnostics.log_action(UserAction::DownloadVideo);
            }
            player::Message::Retry => {
                self.services.diagnostics.log_action(UserAction::Retry);
            }
            _ => {}
        }
        let (event, task) = widget.handle_message(message, &self.backend);
        let task = task.map(Message::Player);

        match event {
            player::Event::None => {}
            player::Event::Saved(path) => {
                self.services.download_dir = path.parent().map(Path::to_path_buf);
                return (Event::VideoSaved(path), task);
            }
            player::Event::Ready { size_bytes } => {
                self.clear_error();
                self.services
                    .diagnostics
                    .log_state(AppStateEvent::VideoDownloaded { size_bytes });
            }
            player::Event::Failed(err) => self.show_error(&err, i18n),
        }
        (Event::None, task)
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    fn go_back(&mut self, target: SessionStep, i18n: &I18n) -> Task<Message> {
        match self.session.go_back(target) {
            Ok(()) => {
                self.services.diagnostics.log_action(UserAction::GoBack {
                    step: target.to_string(),
                });
                self.clear_error();
                self.mount()
            }
            Err(e) => {
                self.show_error(&e.into(), i18n);
                Task::none()
            }
        }
    }

    /// Replaces the mounted widget with the one for the current step.
    ///
    /// Dropping the previous widget aborts its in-flight tasks and tears
    /// down its subscriptions.
    fn mount(&mut self) -> Task<Message> {
        let step = self.session.step;
        self.services.diagnostics.log_state(AppStateEvent::StepEntered {
            step: step.to_string(),
        });
        let config = &self.services.config;

        let (mounted, task) = match step {
            SessionStep::Calibration => (
                Some(Mounted::Calibration(calibration::State::new(config))),
                Task::none(),
            ),
            SessionStep::Record => (
                Some(Mounted::Recorder(recorder::State::new(config))),
                Task::none(),
            ),
            SessionStep::Upload => match &self.session.recorded_media {
                Some(media) => (
                    Some(Mounted::Uploader(uploader::State::new(
                        media.clone(),
                        config.min_file_size_bytes,
                    ))),
                    Task::done(Message::Uploader(uploader::Message::Start)),
                ),
                None => (None, Task::none()),
            },
            SessionStep::Analyze => match self.analysis_input() {
                Some(input) => (
                    Some(Mounted::Analysis(analysis::State::new(input, config))),
                    Task::done(Message::Analysis(analysis::Message::Start)),
                ),
                None => (None, Task::none()),
            },
            SessionStep::Result => (
                self.session
                    .gaze_result
                    .clone()
                    .map(|result| Mounted::Result(result::State::new(result))),
                Task::none(),
            ),
            SessionStep::Play => match &self.session.test_id {
                Some(test_id) => (
                    Some(Mounted::Player(player::State::new(
                        test_id.clone(),
                        self.services.cache_dir.clone(),
                        self.services.http_client.clone(),
                    )
                    .with_save_directory(self.services.download_dir.clone()))),
                    Task::done(Message::Player(player::Message::Load)),
                ),
                None => (None, Task::none()),
            },
        };

        self.mounted = mounted;
        if !self.needs_capture() {
            // The capture subscription ends with the step; its worker exits.
            self.capture = None;
            self.capture_info = None;
            self.latest_frame = None;
            self.preview = None;
        }
        self.sync_capture();
        task
    }

    fn analysis_input(&self) -> Option<AnalysisInput> {
        Some(AnalysisInput {
            media_id: self.session.media_id.clone()?,
            test_id: self.session.test_id.clone()?,
            calibration_session_id: self.session.calibration_session_id.clone()?,
        })
    }

    fn show_error(&mut self, err: &Error, i18n: &I18n) {
        self.services.diagnostics.log_error(
            ErrorEvent::new(err.into(), err.to_string()).with_key(err.i18n_key()),
        );
        if !err.is_user_facing() {
            return;
        }
        self.session.set_error(i18n.tr(err.i18n_key()));
        self.error_hint = err.hint_key().map(|key| i18n.tr(key));
    }

    fn clear_error(&mut self) {
        self.session.clear_error();
        self.error_hint = None;
    }

    // ------------------------------------------------------------------
    // Subscriptions and view
    // ------------------------------------------------------------------

    pub fn subscription(&self) -> Subscription<Message> {
        let capture = if self.needs_capture() {
            let mut options = CaptureOptions::from_session(&self.services.config);
            if self.capture_degraded {
                options.test_mode = true;
            }
            capture_session(options, self.capture_id, self.capture_generation)
                .map(Message::Capture)
        } else {
            Subscription::none()
        };

        let widget = match &self.mounted {
            Some(Mounted::Calibration(state)) => state.subscription().map(Message::Calibration),
            Some(Mounted::Recorder(state)) => state.subscription().map(Message::Recorder),
            Some(Mounted::Analysis(state)) => state.subscription().map(Message::Analysis),
            Some(Mounted::Player(state)) => state.subscription().map(Message::Player),
            Some(Mounted::Uploader(_) | Mounted::Result(_)) | None => Subscription::none(),
        };

        Subscription::batch([capture, widget])
    }

    pub fn view<'a>(&'a self, i18n: &'a I18n) -> Element<'a, Message> {
        let title_key = match self.session.variant() {
            SessionVariant::GazeTest => "session-title-gaze",
            SessionVariant::VideoOnly => "session-title-video",
        };
        let header = Row::new()
            .align_y(alignment::Vertical::Center)
            .push(Text::new(i18n.tr(title_key)).size(typography::TITLE_LG))
            .push(Space::new().width(Length::Fill))
            .push(
                button(Text::new("✕").size(typography::BODY))
                    .on_press(Message::Close)
                    .style(button_styles::text_only),
            );

        let mut content = Column::new()
            .spacing(spacing::MD)
            .push(header)
            .push(self.step_indicator(i18n));

        if let Some(message) = &self.session.error {
            let mut banner = ErrorDisplay::new(ErrorSeverity::Error)
                .message(message.clone())
                .on_dismiss(Message::DismissError);
            if let Some(hint) = &self.error_hint {
                banner = banner.hint(hint.clone());
            }
            content = content.push(banner.view());
        }

        content = content.push(self.widget_view(i18n));

        if let Some(target) = self.previous_step() {
            let label = i18n.tr_with_args(
                "session-back",
                &[("step", i18n.tr(target.i18n_key()).as_str())],
            );
            let busy = self.session.is_recording || self.session.is_uploading;
            content = content.push(
                button(Text::new(label).size(typography::BODY_SM))
                    .on_press_maybe((!busy).then_some(Message::Back))
                    .style(button_styles::secondary),
            );
        }

        let card = Container::new(content)
            .width(Length::Fixed(sizing::MODAL_WIDTH))
            .padding(spacing::LG)
            .style(container_styles::panel);

        Container::new(card)
            .width(Length::Fill)
            .height(Length::Fill)
            .align_x(alignment::Horizontal::Center)
            .align_y(alignment::Vertical::Center)
            .style(container_styles::backdrop)
            .into()
    }

    fn step_indicator<'a>(&'a self, i18n: &'a I18n) -> Element<'a, Message> {
        let current = self.session.step;
        let current_pos = self.session.variant().position(current).unwrap_or_default();

        self.session
            .variant()
            .steps()
            .iter()
            .enumerate()
            .fold(Row::new().spacing(spacing::SM), |row, (i, step)| {
                let color = if *step == current {
                    palette::PRIMARY_500
                } else if i < current_pos {
                    palette::SUCCESS_500
                } else {
                    palette::GRAY_400
                };
                row.push(
                    Text::new(format!("{}. {}", i + 1, i18n.tr(step.i18n_key())))
                        .size(typography::BODY_SM)
                        .color(color),
                )
            })
            .into()
    }

    fn widget_view<'a>(&'a self, i18n: &'a I18n) -> Element<'a, Message> {
        let has_audio = self.capture_info.is_none_or(|info| info.has_audio);
        match &self.mounted {
            Some(Mounted::Calibration(state)) => state
                .view(calibration::ViewContext {
                    i18n,
                    preview: self.preview.as_ref(),
                })
                .map(Message::Calibration),
            Some(Mounted::Recorder(state)) => state
                .view(recorder::ViewContext {
                    i18n,
                    preview: self.preview.as_ref(),
                    has_audio,
                })
                .map(Message::Recorder),
            Some(Mounted::Uploader(state)) => state.view(i18n).map(Message::Uploader),
            Some(Mounted::Analysis(state)) => state.view(i18n).map(Message::Analysis),
            Some(Mounted::Result(state)) => state.view(i18n).map(Message::Result),
            Some(Mounted::Player(state)) => state.view(i18n).map(Message::Player),
            None => Text::new(i18n.tr(ValidationError::MissingSessionId.i18n_key()))
                .color(palette::GRAY_400)
                .into(),
        }
    }
}

fn variant_name(variant: SessionVariant) -> &'static str {
    match variant {
        SessionVariant::GazeTest => "gaze_test",
        SessionVariant::VideoOnly => "video_only",
    }
}
