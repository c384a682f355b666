// SPDX-License-Identifier: MPL-2.0
//! Recording upload protocol.
//!
//! 1. validate the payload size and credentials
//! 2. ask the backend for a pre-signed target
//! 3. `PUT` the bytes to the object store with the normalized content type
//! 4. notify the backend, best effort
//!
//! Each step is awaited before the next one starts. Progress is reported at
//! fixed milestones, not per byte.

use crate::application::port::{ApiError, GazeBackend, UploadRequest};
use crate::domain::media::RecordedMedia;
use crate::error::{Error, ValidationError};

/// Fixed progress points of the upload protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMilestone {
    Validated,
    TargetIssued,
    Stored,
    Finished,
}

impl UploadMilestone {
    #[must_use]
    pub fn fraction(self) -> f32 {
        match self {
            UploadMilestone::Validated => 0.05,
            UploadMilestone::TargetIssued => 0.2,
            UploadMilestone::Stored => 0.9,
            UploadMilestone::Finished => 1.0,
        }
    }
}

/// One-shot latch guarding against a second upload from the same widget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadGuard {
    started: bool,
}

impl UploadGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` exactly once.
    pub fn try_begin(&mut self) -> bool {
        !std::mem::replace(&mut self.started, true)
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Re-arms the guard after a failed attempt so the user can retry.
    pub fn release(&mut self) {
        self.started = false;
    }
}

/// Identifiers of the stored video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub media_id: String,
    pub test_id: String,
    /// Result of the completion notice. A failure here does not fail the
    /// upload; callers only log it.
    pub completion_notice: Result<(), ApiError>,
}

/// Runs the upload protocol for `media`.
///
/// # Errors
///
/// - [`ValidationError::FileTooSmall`] when the payload is under `min_size`
/// - [`Error::Auth`] without credentials
/// - network errors from the target request or the transfer
/// - [`ValidationError::MissingField`] when the target lacks an id or URL
pub async fn upload_recording<B: GazeBackend>(
    backend: &B,
    media: &RecordedMedia,
    min_size: u64,
    mut on_progress: impl FnMut(UploadMilestone) + Send,
) -> Result<UploadOutcome, Error> {
    let size = media.size();
    if media.is_empty() || size < min_size {
        return Err(ValidationError::FileTooSmall {
            size,
            min: min_size,
        }
        .into());
    }
    if !backend.has_credentials() {
        return Err(Error::Auth);
    }
    on_progress(UploadMilestone::Validated);

    let content_type = media.content_type().normalized();
    let request = UploadRequest {
        file_name: media.file_name(),
        file_type: media.content_type().extension().to_string(),
        file_size: size,
        content_type: content_type.clone(),
    };
    let target = backend.request_upload_target(request).await?;
    for (name, value) in [
        ("upload_url", &target.upload_url),
        ("media_id", &target.media_id),
        ("test_id", &target.test_id),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingField(name.to_string()).into());
        }
    }
    on_progress(UploadMilestone::TargetIssued);

    backend
        .put_object(&target.upload_url, media.data().clone(), &content_type)
        .await?;
    on_progress(UploadMilestone::Stored);

    let completion_notice = backend.complete_upload(&target.media_id, size).await;
    on_progress(UploadMilestone::Finished);

    Ok(UploadOutcome {
        media_id: target.media_id,
        test_id: target.test_id,
        completion_notice,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::port::UploadTarget;
    use crate::domain::media::ContentType;
    use crate::test_utils::MockBackend;
    use std::time::{Duration, SystemTime};

    fn media(size: usize) -> RecordedMedia {
        RecordedMedia::new(
            vec![7u8; size],
            ContentType::new("video/webm;codecs=vp9"),
            Duration::from_secs(5),
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000),
        )
    }

    #[test]
    fn guard_opens_once() {
        let mut guard = UploadGuard::new();
        assert!(guard.try_begin());
        assert!(!guard.try_begin());
        guard.release();
        assert!(guard.try_begin());
    }

    #[test]
    fn milestones_increase() {
        let fractions: Vec<f32> = [
            UploadMilestone::Validated,
            UploadMilestone::TargetIssued,
            UploadMilestone::Stored,
            UploadMilestone::Finished,
        ]
        .iter()
        .map(|m| m.fraction())
        .collect();
        assert!(fractions.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn steps_run_in_order() {
        let backend = MockBackend::new();
        let mut milestones = Vec::new();
        let outcome = upload_recording(&backend, &media(4096), 1024, |m| milestones.push(m))
            .await
            .unwrap();

        assert_eq!(outcome.media_id, "media-1");
        assert_eq!(outcome.test_id, "test-1");
        assert_eq!(
            backend.calls(),
            vec![
                "request_upload_target".to_string(),
                "put_object:https://store.test/bucket/obj?sig=1".to_string(),
                "complete_upload:media-1:4096".to_string(),
            ]
        );
        assert_eq!(
            milestones,
            vec![
                UploadMilestone::Validated,
                UploadMilestone::TargetIssued,
                UploadMilestone::Stored,
                UploadMilestone::Finished,
            ]
        );
    }

    #[tokio::test]
    async fn request_carries_file_metadata() {
        let backend = MockBackend::new();
        upload_recording(&backend, &media(2048), 1024, |_| {})
            .await
            .unwrap();
        let state = backend.state();
        let request = &state.upload_requests[0];
        assert_eq!(request.file_size, 2048);
        assert_eq!(request.content_type, "video/webm");
        assert_eq!(request.file_type, "webm");
        assert!(request.file_name.starts_with("gaze_test_"));
        assert_eq!(state.put_content_types, vec!["video/webm".to_string()]);
    }

    #[tokio::test]
    async fn small_payload_is_rejected_before_any_call() {
        let backend = MockBackend::new();
        let err = upload_recording(&backend, &media(100), 1024, |_| {})
            .await
            .unwrap_err();
        assert_eq!(
            err,
            Error::Validation(ValidationError::FileTooSmall {
                size: 100,
                min: 1024
            })
        );
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_token_is_an_auth_error() {
        let backend = MockBackend::new();
        backend.state().has_token = false;
        let err = upload_recording(&backend, &media(2048), 1024, |_| {})
            .await
            .unwrap_err();
        assert_eq!(err, Error::Auth);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_target_field_blocks_transfer() {
        let backend = MockBackend::new();
        backend.state().upload_target = Ok(UploadTarget {
            upload_url: "https://store.test/x".into(),
            media_id: String::new(),
            test_id: "t".into(),
        });
        let err = upload_recording(&backend, &media(2048), 1024, |_| {})
            .await
            .unwrap_err();
        assert_eq!(
            err,
            Error::Validation(ValidationError::MissingField("media_id".into()))
        );
        assert_eq!(backend.calls(), vec!["request_upload_target".to_string()]);
    }

    #[tokio::test]
    async fn failed_transfer_skips_completion_notice() {
        let backend = MockBackend::new();
        backend.state().fail_put = true;
        let err = upload_recording(&backend, &media(2048), 1024, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Network(_)));
        assert!(!backend
            .calls()
            .iter()
            .any(|call| call.starts_with("complete_upload")));
    }

    #[tokio::test]
    async fn failed_completion_notice_still_succeeds() {
        let backend = MockBackend::new();
        backend.state().fail_complete = true;
        let outcome = upload_recording(&backend, &media(2048), 1024, |_| {})
            .await
            .unwrap();
        assert!(outcome.completion_notice.is_err());
        assert_eq!(outcome.test_id, "test-1");
    }
}
