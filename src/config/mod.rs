// SPDX-License-Identifier: MPL-2.0
//! This module handles the application's configuration, including loading and saving
//! user preferences to a `settings.toml` file.
//!
//! # Configuration Sections
//!
//! - `[general]` - Language and theme mode
//! - `[backend]` - API base URL and request timeout
//! - `[calibration]` - Status poll and frame capture cadence
//! - `[recording]` - Duration bounds, frame rate, camera, test mode
//! - `[upload]` - Minimum payload size
//! - `[analysis]` - Result polling cadence and budget
//!
//! # Path Resolution
//!
//! 1. Use `load_from_path()`/`save_to_path()` with explicit path
//! 2. Set `ICED_GAZE_CONFIG_DIR` environment variable
//! 3. Falls back to platform-specific config directory
//!
//! Widgets never read this file directly: the app derives a [`SessionConfig`]
//! once and hands it to each session.
//!
//! # Examples
//!
//! ```no_run
//! use iced_gaze::config::{self, SessionConfig};
//!
//! let (mut config, _warning) = config::load();
//! config.backend.api_base_url = Some("https://gaze.example.com/api/v1".to_string());
//! config::save(&config).expect("Failed to save config");
//!
//! let session = SessionConfig::from_config(&config);
//! assert!(session.api_base_url.starts_with("https://"));
//! ```

pub mod defaults;

pub use defaults::*;

use crate::app::paths;
use crate::error::{Error, Result};
use crate::ui::theming::ThemeMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "settings.toml";

// =============================================================================
// Section Structs
// =============================================================================

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// UI language code (e.g., "en-US", "fr").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Application theme mode (light, dark, or system).
    #[serde(
        default = "default_theme_mode",
        deserialize_with = "deserialize_theme_mode"
    )]
    pub theme_mode: ThemeMode,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            language: None,
            theme_mode: default_theme_mode(),
        }
    }
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendConfig {
    /// Base URL every API path is appended to.
    #[serde(
        default = "default_api_base_url",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_base_url: Option<String>,

    /// Timeout for JSON API requests (seconds).
    #[serde(
        default = "default_request_timeout_secs",
        skip_serializing_if = "Option::is_none"
    )]
    pub request_timeout_secs: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Calibration loop settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalibrationConfig {
    #[serde(
        default = "default_status_poll_interval_ms",
        skip_serializing_if = "Option::is_none"
    )]
    pub status_poll_interval_ms: Option<u64>,

    #[serde(
        default = "default_frame_interval_ms",
        skip_serializing_if = "Option::is_none"
    )]
    pub frame_interval_ms: Option<u64>,

    /// Synthetic frames per corner in test mode.
    #[serde(
        default = "default_simulated_frames_per_corner",
        skip_serializing_if = "Option::is_none"
    )]
    pub simulated_frames_per_corner: Option<u32>,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            status_poll_interval_ms: default_status_poll_interval_ms(),
            frame_interval_ms: default_frame_interval_ms(),
            simulated_frames_per_corner: default_simulated_frames_per_corner(),
        }
    }
}

/// Recording settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordingConfig {
    #[serde(
        default = "default_min_duration_secs",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_duration_secs: Option<u64>,

    #[serde(
        default = "default_start_grace_ms",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_grace_ms: Option<u64>,

    #[serde(default = "default_frame_rate", skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_index: Option<u32>,

    /// Always use the simulated camera, even when capture is available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_mode: Option<bool>,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: default_min_duration_secs(),
            start_grace_ms: default_start_grace_ms(),
            frame_rate: default_frame_rate(),
            camera_index: Some(DEFAULT_CAMERA_INDEX),
            test_mode: Some(false),
        }
    }
}

/// Upload settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadConfig {
    #[serde(
        default = "default_min_file_size_bytes",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_file_size_bytes: Option<u64>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            min_file_size_bytes: default_min_file_size_bytes(),
        }
    }
}

/// Analysis polling settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    #[serde(
        default = "default_analysis_poll_interval_ms",
        skip_serializing_if = "Option::is_none"
    )]
    pub poll_interval_ms: Option<u64>,

    #[serde(
        default = "default_max_poll_attempts",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_poll_attempts: Option<u32>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_analysis_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
        }
    }
}

// =============================================================================
// Main Config Struct (Sectioned)
// =============================================================================

/// Application configuration with logical sections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub calibration: CalibrationConfig,

    #[serde(default)]
    pub recording: RecordingConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,
}

// =============================================================================
// Session Config
// =============================================================================

/// Resolved, validated settings handed to a test session.
///
/// Every missing or out-of-range value is replaced by its default so widgets
/// can use the fields directly.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub status_poll_interval: Duration,
    pub frame_interval: Duration,
    pub simulated_frames_per_corner: u32,
    pub min_recording_duration: Duration,
    pub start_grace: Duration,
    pub frame_rate: u32,
    pub camera_index: u32,
    pub test_mode: bool,
    pub min_file_size_bytes: u64,
    pub analysis_poll_interval: Duration,
    pub max_poll_attempts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SessionConfig {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let interval = |value: Option<u64>, default: u64| {
            Duration::from_millis(
                value
                    .unwrap_or(default)
                    .clamp(MIN_CALIBRATION_INTERVAL_MS, MAX_CALIBRATION_INTERVAL_MS),
            )
        };

        let api_base_url = config
            .backend
            .api_base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Self {
            api_base_url,
            request_timeout: Duration::from_secs(
                config
                    .backend
                    .request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
                    .clamp(MIN_REQUEST_TIMEOUT_SECS, MAX_REQUEST_TIMEOUT_SECS),
            ),
            status_poll_interval: interval(
                config.calibration.status_poll_interval_ms,
                DEFAULT_STATUS_POLL_INTERVAL_MS,
            ),
            frame_interval: interval(
                config.calibration.frame_interval_ms,
                DEFAULT_FRAME_INTERVAL_MS,
            ),
            simulated_frames_per_corner: config
                .calibration
                .simulated_frames_per_corner
                .filter(|frames| *frames > 0)
                .unwrap_or(DEFAULT_SIMULATED_FRAMES_PER_CORNER),
            min_recording_duration: Duration::from_secs(
                config
                    .recording
                    .min_duration_secs
                    .unwrap_or(DEFAULT_MIN_RECORDING_DURATION_SECS),
            ),
            start_grace: Duration::from_millis(
                config
                    .recording
                    .start_grace_ms
                    .filter(|ms| *ms > 0)
                    .unwrap_or(DEFAULT_START_GRACE_MS),
            ),
            frame_rate: config
                .recording
                .frame_rate
                .unwrap_or(DEFAULT_FRAME_RATE)
                .clamp(MIN_FRAME_RATE, MAX_FRAME_RATE),
            camera_index: config
                .recording
                .camera_index
                .unwrap_or(DEFAULT_CAMERA_INDEX),
            test_mode: config.recording.test_mode.unwrap_or(false),
            min_file_size_bytes: config
                .upload
                .min_file_size_bytes
                .unwrap_or(DEFAULT_MIN_FILE_SIZE_BYTES),
            analysis_poll_interval: Duration::from_millis(
                config
                    .analysis
                    .poll_interval_ms
                    .filter(|ms| *ms > 0)
                    .unwrap_or(DEFAULT_ANALYSIS_POLL_INTERVAL_MS),
            ),
            max_poll_attempts: config
                .analysis
                .max_poll_attempts
                .unwrap_or(DEFAULT_MAX_POLL_ATTEMPTS)
                .clamp(MIN_MAX_POLL_ATTEMPTS, MAX_MAX_POLL_ATTEMPTS),
        }
    }

    /// Overrides the API base URL (`--api-url`).
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        let trimmed = url.trim().trim_end_matches('/');
        if !trimmed.is_empty() {
            self.api_base_url = trimmed.to_string();
        }
        self
    }

    /// Forces the simulated camera (`--test-mode`).
    #[must_use]
    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = self.test_mode || test_mode;
        self
    }

    /// Frame period derived from the configured frame rate.
    #[must_use]
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }
}

// =============================================================================
// Default Value Functions
// =============================================================================

fn default_theme_mode() -> ThemeMode {
    ThemeMode::System
}

fn default_api_base_url() -> Option<String> {
    Some(DEFAULT_API_BASE_URL.to_string())
}

fn default_request_timeout_secs() -> Option<u64> {
    Some(DEFAULT_REQUEST_TIMEOUT_SECS)
}

fn default_status_poll_interval_ms() -> Option<u64> {
    Some(DEFAULT_STATUS_POLL_INTERVAL_MS)
}

fn default_frame_interval_ms() -> Option<u64> {
    Some(DEFAULT_FRAME_INTERVAL_MS)
}

fn default_simulated_frames_per_corner() -> Option<u32> {
    Some(DEFAULT_SIMULATED_FRAMES_PER_CORNER)
}

fn default_min_duration_secs() -> Option<u64> {
    Some(DEFAULT_MIN_RECORDING_DURATION_SECS)
}

fn default_start_grace_ms() -> Option<u64> {
    Some(DEFAULT_START_GRACE_MS)
}

fn default_frame_rate() -> Option<u32> {
    Some(DEFAULT_FRAME_RATE)
}

fn default_min_file_size_bytes() -> Option<u64> {
    Some(DEFAULT_MIN_FILE_SIZE_BYTES)
}

fn default_analysis_poll_interval_ms() -> Option<u64> {
    Some(DEFAULT_ANALYSIS_POLL_INTERVAL_MS)
}

fn default_max_poll_attempts() -> Option<u32> {
    Some(DEFAULT_MAX_POLL_ATTEMPTS)
}

fn deserialize_theme_mode<'de, D>(deserializer: D) -> std::result::Result<ThemeMode, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let raw = String::deserialize(deserializer)?;
    match raw.to_lowercase().as_str() {
        "light" => Ok(ThemeMode::Light),
        "dark" => Ok(ThemeMode::Dark),
        "system" => Ok(ThemeMode::System),
        other => Err(D::Error::custom(format!("invalid theme_mode: {}", other))),
    }
}

// =============================================================================
// Load / Save
// =============================================================================

fn get_config_path_with_override(base_dir: Option<PathBuf>) -> Option<PathBuf> {
    paths::get_app_config_dir_with_override(base_dir).map(|mut path| {
        path.push(CONFIG_FILE);
        path
    })
}

/// Loads the configuration from the default path.
///
/// Returns a tuple of (config, optional_warning). If loading fails, returns
/// default config with the i18n key of a warning explaining what went wrong.
pub fn load() -> (Config, Option<String>) {
    load_with_override(None)
}

/// Loads the configuration from a custom directory.
pub fn load_with_override(base_dir: Option<PathBuf>) -> (Config, Option<String>) {
    if let Some(path) = get_config_path_with_override(base_dir) {
        if path.exists() {
            return match load_from_path(&path) {
                Ok(config) => (config, None),
                Err(_) => (
                    Config::default(),
                    Some("notification-config-load-error".to_string()),
                ),
            };
        }
    }
    (Config::default(), None)
}

/// Loads configuration from a specific path.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Saves the configuration to the default path.
pub fn save(config: &Config) -> Result<()> {
    save_with_override(config, None)
}

/// Saves the configuration to a custom directory.
pub fn save_with_override(config: &Config, base_dir: Option<PathBuf>) -> Result<()> {
    if let Some(path) = get_config_path_with_override(base_dir) {
        return save_to_path(config, &path);
    }
    Ok(())
}

/// Saves configuration to a specific path.
pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config).map_err(Error::from)?;
    fs::write(path, content)?;
    Ok(())
}
