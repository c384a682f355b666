// SPDX-License-Identifier: MPL-2.0
//! Gaze backend port definition.
//!
//! [`GazeBackend`] covers every HTTP call a test session makes: calibration,
//! the three upload phases, analysis and playback lookup. Methods return
//! futures so callers can hand them to `Task::perform`; the trait itself
//! knows nothing about Iced or `reqwest`.

use crate::domain::calibration::{CalibrationStatus, FrameFeedback};
use crate::domain::gaze::AnalysisPoll;
use crate::error::{Error, ValidationError};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

// =============================================================================
// ApiError
// =============================================================================

/// Errors produced by a backend adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No bearer token available for an authenticated call.
    MissingToken,
    /// Connection refused, DNS failure, timeout...
    Transport(String),
    /// Non-success HTTP status.
    Status { code: u16, body: String },
    /// The body could not be parsed.
    Decode(String),
    /// A required response field was absent or empty.
    MissingField(&'static str),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::MissingToken => write!(f, "no access token"),
            ApiError::Transport(msg) => write!(f, "request failed: {msg}"),
            ApiError::Status { code, body } if body.is_empty() => {
                write!(f, "server answered {code}")
            }
            ApiError::Status { code, body } => write!(f, "server answered {code}: {body}"),
            ApiError::Decode(msg) => write!(f, "invalid response: {msg}"),
            ApiError::MissingField(name) => write!(f, "response lacks {name}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::MissingToken => Error::Auth,
            ApiError::Status { code: 401, .. } => Error::Auth,
            ApiError::MissingField(name) => {
                Error::Validation(ValidationError::MissingField(name.to_string()))
            }
            other => Error::Network(other.to_string()),
        }
    }
}

// =============================================================================
// Request / response values
// =============================================================================

/// File metadata sent when asking for an upload target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub file_name: String,
    /// Extension-like type, e.g. `avi`.
    pub file_type: String,
    pub file_size: u64,
    /// Normalized MIME type; the signature is computed for it.
    pub content_type: String,
}

/// Pre-signed write target and the identifiers of the stored video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub upload_url: String,
    pub media_id: String,
    pub test_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub media_id: String,
    pub test_id: String,
    pub calibration_session_id: String,
}

/// Signed playback location of an uploaded test video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackInfo {
    pub url: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub file_size: Option<u64>,
}

// =============================================================================
// GazeBackend
// =============================================================================

/// Remote gaze-test backend.
///
/// Implementations must be cheap to clone (share a connection pool) so a
/// copy can move into every spawned future.
pub trait GazeBackend: Clone + Send + Sync + 'static {
    /// Whether a bearer token is available for authenticated calls.
    fn has_credentials(&self) -> bool;

    /// Opens a calibration session and returns its id.
    fn start_calibration(&self) -> impl Future<Output = Result<String, ApiError>> + Send;

    /// Submits one JPEG frame to a calibration session.
    fn submit_frame(
        &self,
        session_id: &str,
        jpeg: Vec<u8>,
    ) -> impl Future<Output = Result<FrameFeedback, ApiError>> + Send;

    fn calibration_status(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<CalibrationStatus, ApiError>> + Send;

    /// Asks for a pre-signed object store URL.
    fn request_upload_target(
        &self,
        request: UploadRequest,
    ) -> impl Future<Output = Result<UploadTarget, ApiError>> + Send;

    /// Transfers the payload straight to the object store.
    fn put_object(
        &self,
        upload_url: &str,
        data: Arc<[u8]>,
        content_type: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Tells the backend the object is stored.
    fn complete_upload(
        &self,
        media_id: &str,
        file_size: u64,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Queues an analysis job and returns its task id.
    fn start_analysis(
        &self,
        request: AnalysisRequest,
    ) -> impl Future<Output = Result<String, ApiError>> + Send;

    fn analysis_status(
        &self,
        task_id: &str,
    ) -> impl Future<Output = Result<AnalysisPoll, ApiError>> + Send;

    fn playback_info(
        &self,
        test_id: &str,
    ) -> impl Future<Output = Result<PlaybackInfo, ApiError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_token_maps_to_auth_error() {
        assert_eq!(Error::from(ApiError::MissingToken), Error::Auth);
        assert_eq!(
            Error::from(ApiError::Status {
                code: 401,
                body: String::new()
            }),
            Error::Auth
        );
    }

    #[test]
    fn missing_field_maps_to_validation_error() {
        assert_eq!(
            Error::from(ApiError::MissingField("media_id")),
            Error::Validation(ValidationError::MissingField("media_id".into()))
        );
    }

    #[test]
    fn other_failures_map_to_network_error() {
        let err = Error::from(ApiError::Status {
            code: 503,
            body: "busy".into(),
        });
        assert_eq!(err, Error::Network("server answered 503: busy".into()));
    }
}
