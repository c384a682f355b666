// SPDX-License-Identifier: MPL-2.0
//! Message handlers for the application root.
//!
//! Each handler receives an [`UpdateContext`] borrowing the parts of `App`
//! it may touch, so handlers stay free functions that are easy to test.

use super::{paths, persisted_state::AppState, Message, Screen};
use crate::config::SessionConfig;
use crate::diagnostics::{
    AppStateEvent, DiagnosticsCollector, ErrorEvent, ErrorType, ExportError, UserAction,
    WarningEvent, WarningType,
};
use crate::domain::session::{SessionStep, SessionVariant};
use crate::error::Error;
use crate::i18n::fluent::I18n;
use crate::infrastructure::http::HttpBackend;
use crate::ui::components::error_display::ErrorSeverity;
use crate::ui::home::{self, Notice};
use crate::ui::{player, session_modal};
use iced::{window, Task};
use std::path::{Path, PathBuf};

/// Mutable view over the application state used by the handlers.
pub struct UpdateContext<'a> {
    pub i18n: &'a I18n,
    pub screen: &'a mut Screen,
    pub session_config: &'a SessionConfig,
    pub backend: Option<&'a HttpBackend>,
    pub home: &'a mut home::State,
    pub session: &'a mut Option<session_modal::State<HttpBackend>>,
    pub playback: &'a mut Option<player::State>,
    pub notice: &'a mut Option<Notice>,
    pub app_state: &'a mut AppState,
    pub diagnostics: &'a mut DiagnosticsCollector,
    pub capture_seq: &'a mut u64,
}

pub fn handle_home_message(ctx: &mut UpdateContext<'_>, message: home::Message) -> Task<Message> {
    match ctx.home.update(message) {
        home::Event::None => Task::none(),
        home::Event::StartSession(variant) => open_session(ctx, variant),
        home::Event::PlayTest(test_id) => open_playback(ctx, test_id),
        home::Event::ExportDiagnostics => {
            export_diagnostics(ctx);
            Task::none()
        }
        home::Event::DismissNotice => {
            *ctx.notice = None;
            Task::none()
        }
    }
}

/// Opens the session modal unless one is already open.
pub fn open_session(ctx: &mut UpdateContext<'_>, variant: SessionVariant) -> Task<Message> {
    if ctx.session.is_some() {
        return Task::none();
    }
    let Some(backend) = ctx.backend else {
        set_notice(ctx, ErrorSeverity::Error, "home-backend-unavailable");
        return Task::none();
    };

    *ctx.notice = None;
    *ctx.capture_seq = ctx.capture_seq.wrapping_add(1);
    let services = session_modal::SessionServices {
        config: ctx.session_config.clone(),
        diagnostics: ctx.diagnostics.handle(),
        cache_dir: video_cache_dir(),
        http_client: backend.client().clone(),
        download_dir: ctx.app_state.last_download_directory.clone(),
    };
    let (state, task) =
        session_modal::State::open(variant, backend.clone(), services, *ctx.capture_seq);
    *ctx.session = Some(state);
    task.map(Message::Session)
}

pub fn handle_session_message(
    ctx: &mut UpdateContext<'_>,
    message: session_modal::Message,
) -> Task<Message> {
    let Some(session) = ctx.session.as_mut() else {
        return Task::none();
    };
    let (event, task) = session.handle_message(message, ctx.i18n);
    let task = task.map(Message::Session);

    match event {
        session_modal::Event::None => task,
        session_modal::Event::Closed => {
            // Dropping the state ends the capture worker and aborts transfers.
            *ctx.session = None;
            Task::none()
        }
        session_modal::Event::VideoSaved(path) => {
            remember_download(ctx, &path);
            task
        }
    }
}

/// Switches to the standalone player for a stored test.
pub fn open_playback(ctx: &mut UpdateContext<'_>, test_id: String) -> Task<Message> {
    let Some(backend) = ctx.backend else {
        set_notice(ctx, ErrorSeverity::Error, "home-backend-unavailable");
        return Task::none();
    };

    ctx.diagnostics.log_state(AppStateEvent::StepEntered {
        step: SessionStep::Play.to_string(),
    });
    let state = player::State::new(test_id, video_cache_dir(), backend.client().clone())
        .with_save_directory(ctx.app_state.last_download_directory.clone());
    *ctx.playback = Some(state);
    *ctx.screen = Screen::Playback;
    *ctx.notice = None;
    Task::done(Message::Playback(player::Message::Load))
}

pub fn handle_playback_message(
    ctx: &mut UpdateContext<'_>,
    message: player::Message,
) -> Task<Message> {
    let (Some(player), Some(backend)) = (ctx.playback.as_mut(), ctx.backend) else {
        return Task::none();
    };

    match &message {
        player::Message::TogglePlay => ctx.diagnostics.log_action(UserAction::TogglePlayback),
        player::Message::SaveCopy => ctx.diagnostics.log_action(UserAction::DownloadVideo),
        player::Message::Retry => ctx.diagnostics.log_action(UserAction::Retry),
        _ => {}
    }

    let (event, task) = player.handle_message(message, backend);
    let task = task.map(Message::Playback);

    match event {
        player::Event::None => {}
        player::Event::Ready { size_bytes } => {
            *ctx.notice = None;
            ctx.diagnostics
                .log_state(AppStateEvent::VideoDownloaded { size_bytes });
        }
        player::Event::Saved(path) => remember_download(ctx, &path),
        player::Event::Failed(err) => report_error(ctx, &err),
    }
    task
}

pub fn handle_back_to_home(ctx: &mut UpdateContext<'_>) -> Task<Message> {
    *ctx.playback = None;
    *ctx.screen = Screen::Home;
    *ctx.notice = None;
    Task::none()
}

/// Stops capture and playback, flushes persisted state, then closes.
pub fn handle_close_request(ctx: &mut UpdateContext<'_>, id: window::Id) -> Task<Message> {
    *ctx.session = None;
    *ctx.playback = None;
    if let Some(key) = ctx.app_state.save() {
        ctx.diagnostics.handle().log_warning(WarningEvent::new(
            WarningType::ConfigurationIssue,
            format!("state not saved on exit: {key}"),
        ));
    }
    window::close(id)
}

fn export_diagnostics(ctx: &mut UpdateContext<'_>) {
    ctx.diagnostics.process_pending();
    ctx.diagnostics.log_action(UserAction::ExportDiagnostics);

    match ctx.diagnostics.export_with_dialog() {
        Ok(path) => {
            let path = path.display().to_string();
            *ctx.notice = Some(Notice {
                severity: ErrorSeverity::Info,
                message: ctx
                    .i18n
                    .tr_with_args("home-diagnostics-exported", &[("path", path.as_str())]),
            });
        }
        Err(ExportError::Cancelled) => {}
        Err(err) => {
            ctx.diagnostics.handle().log_warning(WarningEvent::new(
                WarningType::Other,
                format!("diagnostics export failed: {err}"),
            ));
            set_notice(ctx, ErrorSeverity::Error, "home-diagnostics-export-failed");
        }
    }
}

fn remember_download(ctx: &mut UpdateContext<'_>, path: &Path) {
    ctx.app_state.set_last_download_directory_from_file(path);
    if let Some(key) = ctx.app_state.save() {
        set_notice(ctx, ErrorSeverity::Warning, &key);
    }
}

fn report_error(ctx: &mut UpdateContext<'_>, err: &Error) {
    ctx.diagnostics.handle().log_error(
        ErrorEvent::new(ErrorType::from(err), err.to_string()).with_key(err.i18n_key()),
    );
    if !err.is_user_facing() {
        return;
    }
    let mut message = ctx.i18n.tr(err.i18n_key());
    if let Some(hint) = err.hint_key() {
        message = format!("{message} {}", ctx.i18n.tr(hint));
    }
    *ctx.notice = Some(Notice {
        severity: ErrorSeverity::Error,
        message,
    });
}

fn set_notice(ctx: &mut UpdateContext<'_>, severity: ErrorSeverity, key: &str) {
    *ctx.notice = Some(Notice {
        severity,
        message: ctx.i18n.tr(key),
    });
}

fn video_cache_dir() -> PathBuf {
    paths::get_video_cache_dir().unwrap_or_else(|| std::env::temp_dir().join("iced_gaze"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::diagnostics::{BufferCapacity, DiagnosticEventKind};

    struct Fixture {
        i18n: I18n,
        screen: Screen,
        session_config: SessionConfig,
        backend: Option<HttpBackend>,
        home: home::State,
        session: Option<session_modal::State<HttpBackend>>,
        playback: Option<player::State>,
        notice: Option<Notice>,
        app_state: AppState,
        diagnostics: DiagnosticsCollector,
        capture_seq: u64,
    }

    impl Fixture {
        fn new(with_backend: bool) -> Self {
            let session_config = SessionConfig::default();
            let backend = with_backend
                .then(|| HttpBackend::new(&session_config, Some("token")).expect("client"));
            Self {
                i18n: I18n::new(Some("en-US".into()), &Config::default()),
                screen: Screen::Home,
                session_config,
                backend,
                home: home::State::default(),
                session: None,
                playback: None,
                notice: None,
                app_state: AppState::default(),
                diagnostics: DiagnosticsCollector::new(BufferCapacity::new(100)),
                capture_seq: 0,
            }
        }

        fn ctx(&mut self) -> UpdateContext<'_> {
            UpdateContext {
                i18n: &self.i18n,
                screen: &mut self.screen,
                session_config: &self.session_config,
                backend: self.backend.as_ref(),
                home: &mut self.home,
                session: &mut self.session,
                playback: &mut self.playback,
                notice: &mut self.notice,
                app_state: &mut self.app_state,
                diagnostics: &mut self.diagnostics,
                capture_seq: &mut self.capture_seq,
            }
        }
    }

    #[test]
    fn session_needs_a_backend() {
        let mut fixture = Fixture::new(false);
        let _ = open_session(&mut fixture.ctx(), SessionVariant::GazeTest);
        assert!(fixture.session.is_none());
        assert_eq!(
            fixture.notice.as_ref().map(|n| n.severity),
            Some(ErrorSeverity::Error)
        );
    }

    #[test]
    fn each_session_gets_a_fresh_capture_id() {
        let mut fixture = Fixture::new(true);
        let _ = open_session(&mut fixture.ctx(), SessionVariant::GazeTest);
        assert_eq!(fixture.capture_seq, 1);
        assert_eq!(
            fixture.session.as_ref().map(session_modal::State::step),
            Some(SessionStep::Calibration)
        );

        let _ = handle_session_message(&mut fixture.ctx(), session_modal::Message::Close);
        assert!(fixture.session.is_none());

        let _ = open_session(&mut fixture.ctx(), SessionVariant::VideoOnly);
        assert_eq!(fixture.capture_seq, 2);
        assert_eq!(
            fixture.session.as_ref().map(session_modal::State::step),
            Some(SessionStep::Record)
        );
    }

    #[test]
    fn second_start_keeps_the_open_session() {
        let mut fixture = Fixture::new(true);
        let _ = open_session(&mut fixture.ctx(), SessionVariant::GazeTest);
        let _ = open_session(&mut fixture.ctx(), SessionVariant::VideoOnly);
        assert_eq!(fixture.capture_seq, 1);
        assert_eq!(
            fixture.session.as_ref().map(|s| s.session().variant()),
            Some(SessionVariant::GazeTest)
        );
    }

    #[test]
    fn playback_screen_round_trip() {
        let mut fixture = Fixture::new(true);
        let _ = open_playback(&mut fixture.ctx(), "test-9".into());
        assert_eq!(fixture.screen, Screen::Playback);
        assert_eq!(
            fixture.playback.as_ref().map(player::State::test_id),
            Some("test-9")
        );

        let _ = handle_back_to_home(&mut fixture.ctx());
        assert_eq!(fixture.screen, Screen::Home);
        assert!(fixture.playback.is_none());
    }

    #[test]
    fn playback_failure_becomes_a_notice() {
        let mut fixture = Fixture::new(true);
        let _ = open_playback(&mut fixture.ctx(), "test-9".into());
        let _ = handle_playback_message(
            &mut fixture.ctx(),
            player::Message::InfoLoaded(Err(crate::application::port::ApiError::Status {
                code: 404,
                body: String::new(),
            })),
        );
        assert!(fixture.notice.is_some());

        fixture.diagnostics.process_pending();
        assert!(fixture
            .diagnostics
            .iter()
            .any(|event| matches!(event.kind, DiagnosticEventKind::Error { .. })));
    }

    #[test]
    fn notice_can_be_dismissed() {
        let mut fixture = Fixture::new(false);
        fixture.notice = Some(Notice {
            severity: ErrorSeverity::Warning,
            message: "careful".into(),
        });
        let _ = handle_home_message(&mut fixture.ctx(), home::Message::DismissNotice);
        assert!(fixture.notice.is_none());
    }
}
