// SPDX-License-Identifier: MPL-2.0
//! Top-level messages and runtime flags for the application.

use crate::ui::{home, player, session_modal};

/// Top-level messages consumed by `App::update`. The variants forward
/// lower-level component messages while keeping a single update entrypoint.
#[derive(Debug, Clone)]
pub enum Message {
    Home(home::Message),
    Session(session_modal::Message),
    Playback(player::Message),
    /// Leave the standalone player.
    BackToHome,
    /// Periodic tick draining the diagnostics channel.
    DiagnosticsTick,
    /// Window close was requested (user clicked X or pressed Alt+F4).
    WindowCloseRequested(iced::window::Id),
}

/// Runtime flags passed in from the CLI to tweak startup behavior.
#[derive(Debug, Default)]
pub struct Flags {
    /// Optional locale override in BCP-47 form (e.g. `fr`, `en-US`).
    pub lang: Option<String>,
    /// Backend base URL, overriding `settings.toml`.
    pub api_url: Option<String>,
    /// Access token to store; replaces the persisted one.
    pub token: Option<String>,
    /// Force the simulated camera and the simulated calibration.
    pub test_mode: bool,
    /// Optional data directory override (for state files).
    /// Takes precedence over `ICED_GAZE_DATA_DIR` environment variable.
    pub data_dir: Option<String>,
    /// Optional config directory override (for settings.toml).
    /// Takes precedence over `ICED_GAZE_CONFIG_DIR` environment variable.
    pub config_dir: Option<String>,
    /// Test id to open in the standalone player at startup.
    pub play: Option<String>,
}
