// SPDX-License-Identifier: MPL-2.0
//! Application root state and orchestration between the home screen, the
//! session modal and the standalone player.
//!
//! The `App` struct wires together configuration, localization, the backend
//! client and the diagnostics collector, then hands each session its own
//! collaborators. Policy decisions that touch persisted state (token storage,
//! last download directory) stay here so they are easy to audit.

mod message;
pub mod paths;
pub mod persisted_state;
mod screen;
mod subscription;
mod update;
mod view;

pub use message::{Flags, Message};
pub use screen::Screen;

use crate::config::{self, SessionConfig};
use crate::diagnostics::{BufferCapacity, DiagnosticsCollector, ErrorEvent, ErrorType};
use crate::error::Error;
use crate::i18n::fluent::I18n;
use crate::infrastructure::http::HttpBackend;
use crate::ui::components::error_display::ErrorSeverity;
use crate::ui::home::{self, Notice};
use crate::ui::theming::ThemeMode;
use crate::ui::{player, session_modal};
use iced::{window, Element, Subscription, Task, Theme};
use std::fmt;

/// Root Iced application state.
pub struct App {
    pub i18n: I18n,
    screen: Screen,
    theme_mode: ThemeMode,
    session_config: SessionConfig,
    /// `None` when the HTTP client could not be built.
    backend: Option<HttpBackend>,
    home: home::State,
    session: Option<session_modal::State<HttpBackend>>,
    playback: Option<player::State>,
    notice: Option<Notice>,
    /// Persisted application state (token, last download directory).
    app_state: persisted_state::AppState,
    diagnostics: DiagnosticsCollector,
    /// Bumped for every opened session; keys its capture subscription.
    capture_seq: u64,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("screen", &self.screen)
            .field("session_step", &self.session.as_ref().map(|s| s.step()))
            .field("backend_ready", &self.backend.is_some())
            .finish()
    }
}

pub const WINDOW_DEFAULT_HEIGHT: u32 = 820;
pub const WINDOW_DEFAULT_WIDTH: u32 = 1024;
pub const MIN_WINDOW_HEIGHT: u32 = 720;
pub const MIN_WINDOW_WIDTH: u32 = 800;

/// Diagnostics kept in memory for export.
const DIAGNOSTICS_CAPACITY: usize = 2_000;

/// Builds the window settings.
#[allow(clippy::cast_precision_loss)]
pub fn window_settings() -> window::Settings {
    window::Settings {
        size: iced::Size::new(WINDOW_DEFAULT_WIDTH as f32, WINDOW_DEFAULT_HEIGHT as f32),
        min_size: Some(iced::Size::new(
            MIN_WINDOW_WIDTH as f32,
            MIN_WINDOW_HEIGHT as f32,
        )),
        exit_on_close_request: false,
        ..window::Settings::default()
    }
}

/// Entry point used by `main.rs` to launch the Iced application loop.
pub fn run(flags: Flags) -> iced::Result {
    use std::cell::RefCell;

    // iced 0.14 requires a Fn boot closure; the flags are consumed once.
    let boot_state = RefCell::new(Some(flags));
    let boot = move || {
        let flags = boot_state.borrow_mut().take().unwrap_or_default();
        App::new(flags)
    };

    iced::application(boot, App::update, App::view)
        .title(App::title)
        .theme(App::theme)
        .window(window_settings())
        .subscription(App::subscription)
        .run()
}

impl App {
    /// Loads configuration and persisted state, builds the backend client
    /// and optionally opens the standalone player.
    fn new(flags: Flags) -> (Self, Task<Message>) {
        let (config, config_warning) = config::load();
        let i18n = I18n::new(flags.lang.clone(), &config);

        let mut session_config = SessionConfig::from_config(&config);
        if let Some(url) = flags.api_url {
            session_config = session_config.with_api_base_url(url);
        }
        if flags.test_mode {
            session_config = session_config.with_test_mode(true);
        }

        let diagnostics = DiagnosticsCollector::new(
            BufferCapacity::new(DIAGNOSTICS_CAPACITY),
        );

        let (mut app_state, state_warning) = persisted_state::AppState::load();
        let mut warning = config_warning.or(state_warning);
        if flags.token.is_some() {
            app_state.set_auth_token(flags.token);
            if let Some(key) = app_state.save() {
                warning.get_or_insert(key);
            }
        }

        let backend = match HttpBackend::new(&session_config, app_state.auth_token()) {
            Ok(backend) => Some(backend),
            Err(err) => {
                let err = Error::from(err);
                diagnostics.handle().log_error(
                    ErrorEvent::new(ErrorType::from(&err), err.to_string())
                        .with_key(err.i18n_key()),
                );
                None
            }
        };

        let notice = warning.map(|key| Notice {
            severity: ErrorSeverity::Warning,
            message: i18n.tr(&key),
        });

        let mut app = App {
            i18n,
            screen: Screen::Home,
            theme_mode: config.general.theme_mode,
            session_config,
            backend,
            home: home::State::default(),
            session: None,
            playback: None,
            notice,
            app_state,
            diagnostics,
            capture_seq: 0,
        };

        let task = match flags.play {
            Some(test_id) if !test_id.trim().is_empty() => {
                update::open_playback(&mut app.context(), test_id.trim().to_string())
            }
            _ => Task::none(),
        };

        (app, task)
    }

    fn title(&self) -> String {
        let app_name = self.i18n.tr("window-title");
        if let Some(session) = &self.session {
            let step = self.i18n.tr(session.step().i18n_key());
            return format!("{step} - {app_name}");
        }
        match (&self.screen, &self.playback) {
            (Screen::Playback, Some(player)) => format!("{} - {app_name}", player.test_id()),
            _ => app_name,
        }
    }

    fn theme(&self) -> Theme {
        self.theme_mode.iced_theme()
    }

    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            subscription::create_event_subscription(),
            subscription::create_diagnostics_subscription(
                self.session.is_some() || self.playback.is_some(),
            ),
            subscription::create_session_subscription(self.session.as_ref()),
            subscription::create_playback_subscription(self.screen, self.playback.as_ref()),
        ])
    }

    fn context(&mut self) -> update::UpdateContext<'_> {
        update::UpdateContext {
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

    fn update(&mut self, message: Message) -> Task<Message> {
        let mut ctx = self.context();

        match message {
            Message::Home(home_message) => update::handle_home_message(&mut ctx, home_message),
            Message::Session(session_message) => {
                update::handle_session_message(&mut ctx, session_message)
            }
            Message::Playback(player_message) => {
                update::handle_playback_message(&mut ctx, player_message)
            }
            Message::BackToHome => update::handle_back_to_home(&mut ctx),
            Message::DiagnosticsTick => {
                ctx.diagnostics.process_pending();
                Task::none()
            }
            Message::WindowCloseRequested(id) => update::handle_close_request(&mut ctx, id),
        }
    }

    fn view(&self) -> Element<'_, Message> {
        view::view(view::ViewContext {
            i18n: &self.i18n,
            screen: self.screen,
            home: &self.home,
            session: self.session.as_ref(),
            playback: self.playback.as_ref(),
            notice: self.notice.as_ref(),
            backend_ready: self.backend.is_some(),
        })
    }
}
