// SPDX-License-Identifier: MPL-2.0
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Io(String),
    Config(String),
    /// Camera or microphone denied, missing, or busy.
    Permission(PermissionError),
    /// Backend unreachable or answered with a failure status.
    Network(String),
    /// Input that blocks progression (empty recording, missing ids...).
    Validation(ValidationError),
    /// No bearer token in the persisted state.
    Auth,
    /// Best-effort server bookkeeping that failed. Never shown to the user.
    Bookkeeping(String),
    Video(VideoError),
    /// The backend reported the analysis job as failed.
    AnalysisFailed(String),
    /// No analysis result after the configured number of polls.
    AnalysisTimeout { attempts: u32 },
}

/// Capture device failures. Most of them route to test mode instead of
/// being surfaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// Capture support is not compiled in or the platform has no backend.
    Unsupported,
    /// No camera (or microphone) attached.
    NoDevice,
    /// The OS refused access.
    Denied(String),
    /// The device opened but stopped delivering frames.
    DeviceFailed(String),
}

impl PermissionError {
    pub fn i18n_key(&self) -> &'static str {
        match self {
            PermissionError::Unsupported => "error-capture-unsupported",
            PermissionError::NoDevice => "error-capture-no-device",
            PermissionError::Denied(_) => "error-capture-denied",
            PermissionError::DeviceFailed(_) => "error-capture-device-failed",
        }
    }
}

impl fmt::Display for PermissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionError::Unsupported => write!(f, "Capture is not supported on this build"),
            PermissionError::NoDevice => write!(f, "No capture device found"),
            PermissionError::Denied(msg) => write!(f, "Access to the device was denied: {}", msg),
            PermissionError::DeviceFailed(msg) => write!(f, "Capture device failed: {}", msg),
        }
    }
}

/// Errors that block the session from moving forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The recorder produced no bytes.
    EmptyRecording,
    /// The recording is shorter than the configured minimum.
    RecordingTooShort { actual_ms: u64, min_ms: u64 },
    /// The recorder never reached the recording state.
    RecorderDidNotStart,
    /// Payload is below the minimum upload size.
    FileTooSmall { size: u64, min: u64 },
    /// A step was reached without the id it depends on.
    MissingSessionId,
    /// The backend answered without a required field.
    MissingField(String),
    /// An operation was requested on the wrong session step.
    WrongStep(String),
}

impl ValidationError {
    pub fn i18n_key(&self) -> &'static str {
        match self {
            ValidationError::EmptyRecording => "error-recording-empty",
            ValidationError::RecordingTooShort { .. } => "error-recording-too-short",
            ValidationError::RecorderDidNotStart => "error-recording-not-started",
            ValidationError::FileTooSmall { .. } => "error-upload-too-small",
            ValidationError::MissingSessionId => "error-missing-session-id",
            ValidationError::MissingField(_) => "error-missing-field",
            ValidationError::WrongStep(_) => "error-wrong-step",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyRecording => write!(f, "Recording is empty"),
            ValidationError::RecordingTooShort { actual_ms, min_ms } => write!(
                f,
                "Recording too short: {} ms (minimum {} ms)",
                actual_ms, min_ms
            ),
            ValidationError::RecorderDidNotStart => write!(f, "Recorder did not start"),
            ValidationError::FileTooSmall { size, min } => {
                write!(f, "File too small: {} bytes (minimum {} bytes)", size, min)
            }
            ValidationError::MissingSessionId => write!(f, "Missing calibration session id"),
            ValidationError::MissingField(name) => write!(f, "Missing field in response: {}", name),
            ValidationError::WrongStep(msg) => write!(f, "Invalid session step: {}", msg),
        }
    }
}

/// Playback failures for the downloaded test video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoError {
    /// Container opened but has no video stream.
    NoVideoStream,
    /// Decoding failed during playback.
    DecodingFailed(String),
    /// Generic error with raw message.
    Other(String),
}

impl VideoError {
    pub fn i18n_key(&self) -> &'static str {
        match self {
            VideoError::NoVideoStream => "error-video-no-stream",
            VideoError::DecodingFailed(_) => "error-video-decoding-failed",
            VideoError::Other(_) => "error-video-general",
        }
    }

    /// Categorizes a raw FFmpeg message.
    pub fn from_message(msg: &str) -> Self {
        let msg_lower = msg.to_lowercase();

        if msg_lower.contains("no video stream") || msg_lower.contains("invalid data found") {
            return VideoError::NoVideoStream;
        }

        if msg_lower.contains("packet")
            || msg_lower.contains("scaling")
            || msg_lower.contains("decode")
            || msg_lower.contains("codec")
        {
            return VideoError::DecodingFailed(msg.to_string());
        }

        VideoError::Other(msg.to_string())
    }
}

impl fmt::Display for VideoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoError::NoVideoStream => write!(f, "No video stream found"),
            VideoError::DecodingFailed(msg) => write!(f, "Decoding failed: {}", msg),
            VideoError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl Error {
    /// Returns the i18n message key shown in the error banner.
    pub fn i18n_key(&self) -> &'static str {
        match self {
            Error::Io(_) => "error-io",
            Error::Config(_) => "error-config",
            Error::Permission(e) => e.i18n_key(),
            Error::Network(_) => "error-network",
            Error::Validation(e) => e.i18n_key(),
            Error::Auth => "error-auth-missing-token",
            Error::Bookkeeping(_) => "error-bookkeeping",
            Error::Video(e) => e.i18n_key(),
            Error::AnalysisFailed(_) => "error-analysis-failed",
            Error::AnalysisTimeout { .. } => "error-analysis-timeout",
        }
    }

    /// Returns the key of the remediation hint shown under the message, if any.
    pub fn hint_key(&self) -> Option<&'static str> {
        match self {
            Error::Network(_) => Some("error-hint-network"),
            Error::Permission(_) => Some("error-hint-permission"),
            Error::Auth => Some("error-hint-auth"),
            Error::AnalysisTimeout { .. } => Some("error-hint-network"),
            _ => None,
        }
    }

    /// Whether the error should reach the banner at all.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Error::Bookkeeping(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O Error: {}", e),
            Error::Config(e) => write!(f, "Config Error: {}", e),
            Error::Permission(e) => write!(f, "Permission Error: {}", e),
            Error::Network(e) => write!(f, "Network Error: {}", e),
            Error::Validation(e) => write!(f, "Validation Error: {}", e),
            Error::Auth => write!(f, "Authentication Error: no access token stored"),
            Error::Bookkeeping(e) => write!(f, "Bookkeeping Error: {}", e),
            Error::Video(e) => write!(f, "Video Error: {}", e),
            Error::AnalysisFailed(e) => write!(f, "Analysis Error: {}", e),
            Error::AnalysisTimeout { attempts } => {
                write!(f, "Analysis Error: no result after {} polls", attempts)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<PermissionError> for Error {
    fn from(err: PermissionError) -> Self {
        Error::Permission(err)
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation(err)
    }
}

impl From<VideoError> for Error {
    fn from(err: VideoError) -> Self {
        Error::Video(err)
    }
}

impl From<crate::domain::session::TransitionError> for Error {
    fn from(err: crate::domain::session::TransitionError) -> Self {
        Error::Validation(ValidationError::WrongStep(err.to_string()))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_io_error() {
        let err = Error::Io("disk failure".to_string());
        assert_eq!(format!("{}", err), "I/O Error: disk failure");
    }

    #[test]
    fn from_io_error_produces_io_variant() {
        let io_error = std::io::Error::other("boom");
        let err: Error = io_error.into();
        match err {
            Error::Io(message) => assert!(message.contains("boom")),
            _ => panic!("expected Io variant"),
        }
    }

    #[test]
    fn config_error_formats_properly() {
        let err = Error::Config("bad field".into());
        assert_eq!(format!("{}", err), "Config Error: bad field");
    }

    #[test]
    fn network_errors_carry_a_remediation_hint() {
        let err = Error::Network("connection refused".into());
        assert_eq!(err.i18n_key(), "error-network");
        assert_eq!(err.hint_key(), Some("error-hint-network"));
    }

    #[test]
    fn bookkeeping_errors_are_not_user_facing() {
        assert!(!Error::Bookkeeping("complete failed".into()).is_user_facing());
        assert!(Error::Auth.is_user_facing());
    }

    #[test]
    fn validation_error_keys_are_specific() {
        let too_short: Error = ValidationError::RecordingTooShort {
            actual_ms: 1200,
            min_ms: 3000,
        }
        .into();
        assert_eq!(too_short.i18n_key(), "error-recording-too-short");
        assert!(format!("{}", too_short).contains("1200"));

        let empty: Error = ValidationError::EmptyRecording.into();
        assert_eq!(empty.i18n_key(), "error-recording-empty");
    }

    #[test]
    fn permission_error_keys() {
        assert_eq!(
            PermissionError::Unsupported.i18n_key(),
            "error-capture-unsupported"
        );
        assert_eq!(
            PermissionError::Denied("no".into()).i18n_key(),
            "error-capture-denied"
        );
    }

    #[test]
    fn video_error_from_message_no_stream() {
        let err = VideoError::from_message("No video stream found in file");
        assert!(matches!(err, VideoError::NoVideoStream));
    }

    #[test]
    fn video_error_from_message_decoding() {
        let err = VideoError::from_message("Packet send failed: error");
        assert!(matches!(err, VideoError::DecodingFailed(_)));
    }
}
