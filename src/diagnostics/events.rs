// SPDX-License-Identifier: MPL-2.0
//! Diagnostic event types for test session tracking.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::sanitizer::{ErrorType, WarningType};

/// User-initiated actions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UserAction {
    /// Open the session modal.
    StartSession {
        /// `gaze_test` or `video_only`.
        variant: String,
    },
    CloseSession,
    StartCalibration,
    StartRecording,
    StopRecording,
    GoBack {
        /// Step returned to.
        step: String,
    },
    Retry,
    DismissError,
    TogglePlayback,
    DownloadVideo,
    ExportDiagnostics,
}

/// Session state changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AppStateEvent {
    StepEntered {
        step: String,
    },
    CalibrationStarted {
        /// Whether frames are simulated.
        simulated: bool,
    },
    CalibrationCompleted,
    /// The capture sources fell back to the simulated camera.
    CaptureFallback,
    RecordingFinished {
        duration_ms: u64,
        size_bytes: u64,
    },
    UploadCompleted {
        size_bytes: u64,
    },
    AnalysisStarted,
    AnalysisCompleted {
        /// Score rounded to an integer.
        score: u32,
    },
    VideoDownloaded {
        size_bytes: u64,
    },
}

/// Non-critical issue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WarningEvent {
    pub warning_type: WarningType,
    pub message: String,
}

impl WarningEvent {
    #[must_use]
    pub fn new(warning_type: WarningType, message: impl Into<String>) -> Self {
        Self {
            warning_type,
            message: message.into(),
        }
    }
}

/// Error surfaced to the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorEvent {
    pub error_type: ErrorType,
    /// i18n key of the banner message, when one was shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_key: Option<String>,
    pub message: String,
}

impl ErrorEvent {
    #[must_use]
    pub fn new(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self {
            error_type,
            message_key: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.message_key = Some(key.into());
        self
    }
}

/// A diagnostic event with timestamp.
#[derive(Debug, Clone)]
pub struct DiagnosticEvent {
    /// Monotonic timestamp.
    pub timestamp: Instant,
    pub kind: DiagnosticEventKind,
}

impl DiagnosticEvent {
    #[must_use]
    pub fn new(kind: DiagnosticEventKind) -> Self {
        Self {
            timestamp: Instant::now(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiagnosticEventKind {
    UserAction {
        action: UserAction,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    AppState {
        state: AppStateEvent,
    },
    Warning {
        event: WarningEvent,
    },
    Error {
        event: ErrorEvent,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_action_serializes_with_tag() {
        let kind = DiagnosticEventKind::UserAction {
            action: UserAction::GoBack {
                step: "record".into(),
            },
            details: None,
        };
        let json = serde_json::to_string(&kind).expect("serialization should succeed");
        assert!(json.contains("\"type\":\"user_action\""));
        assert!(json.contains("\"action\":\"go_back\""));
        assert!(json.contains("\"step\":\"record\""));
        assert!(!json.contains("details"));
    }

    #[test]
    fn warning_round_trips_through_json() {
        let kind = DiagnosticEventKind::Warning {
            event: WarningEvent::new(WarningType::FrameSubmission, "timeout"),
        };
        let json = serde_json::to_string(&kind).expect("serialization should succeed");
        let back: DiagnosticEventKind =
            serde_json::from_str(&json).expect("deserialization should succeed");
        assert_eq!(back, kind);
    }

    #[test]
    fn error_event_carries_message_key() {
        let event = ErrorEvent::new(ErrorType::Network, "refused").with_key("error-network");
        assert_eq!(event.message_key.as_deref(), Some("error-network"));
    }
}
