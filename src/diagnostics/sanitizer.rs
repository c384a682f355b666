// SPDX-License-Identifier: MPL-2.0
//! Message sanitization and warning/error categories.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningType {
    /// A calibration frame could not be submitted.
    FrameSubmission,
    /// The upload completion notice failed.
    CompletionNotice,
    /// Camera or microphone unavailable; simulated capture used instead.
    CaptureFallback,
    ConfigurationIssue,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    Permission,
    Network,
    Validation,
    Auth,
    Io,
    Decode,
    Other,
}

impl From<&crate::error::Error> for ErrorType {
    fn from(err: &crate::error::Error) -> Self {
        use crate::error::Error;
        match err {
            Error::Permission(_) => ErrorType::Permission,
            Error::Network(_)
            | Error::Bookkeeping(_)
            | Error::AnalysisFailed(_)
            | Error::AnalysisTimeout { .. } => ErrorType::Network,
            Error::Validation(_) => ErrorType::Validation,
            Error::Auth => ErrorType::Auth,
            Error::Io(_) | Error::Config(_) => ErrorType::Io,
            Error::Video(_) => ErrorType::Decode,
        }
    }
}

// Pre-signed URLs carry their signature in the query string.
static URL_QUERY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(https?://[^\s"'?#]+)\?[^\s"')\]]*"#).expect("url regex should compile")
});

static BEARER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)bearer\s+[A-Za-z0-9._~+/=-]+").expect("bearer regex should compile")
});

static PATH_PATTERNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"("#,
        r#"/home/[^\s"'()\[\]]+"#,
        r#"|/Users/[^\s"'()\[\]]+"#,
        r#"|/tmp/[^\s"'()\[\]]+"#,
        r#"|~/[^\s"'()\[\]]+"#,
        r#"|[A-Za-z]:\\[^\s"'()\[\]]+"#,
        r#")"#,
    ))
    .expect("path regex should compile")
});

/// Removes signed query strings, bearer tokens and local file paths.
///
/// # Examples
///
/// ```
/// use iced_gaze::diagnostics::sanitize_message;
///
/// let msg = "PUT https://bucket.s3.amazonaws.com/v.avi?X-Amz-Signature=abc failed";
/// assert_eq!(
///     sanitize_message(msg),
///     "PUT https://bucket.s3.amazonaws.com/v.avi?<redacted> failed"
/// );
/// ```
#[must_use]
pub fn sanitize_message(message: &str) -> String {
    let message = URL_QUERY.replace_all(message, "$1?<redacted>");
    let message = BEARER_TOKEN.replace_all(&message, "Bearer <redacted>");
    PATH_PATTERNS.replace_all(&message, "<path>").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_signed_query_strings() {
        let msg = "error sending request for url (https://store.example/obj?sig=1&exp=2)";
        assert_eq!(
            sanitize_message(msg),
            "error sending request for url (https://store.example/obj?<redacted>)"
        );
    }

    #[test]
    fn keeps_urls_without_query() {
        let msg = "GET http://localhost:8000/api/v1/test/gaze/analyze/t1 returned 500";
        assert_eq!(sanitize_message(msg), msg);
    }

    #[test]
    fn redacts_bearer_tokens() {
        assert_eq!(
            sanitize_message("header Bearer eyJhbGciOi.abc-def was rejected"),
            "header Bearer <redacted> was rejected"
        );
    }

    #[test]
    fn replaces_home_paths() {
        assert_eq!(
            sanitize_message("cannot write /home/alex/videos/test.mp4"),
            "cannot write <path>"
        );
    }

    #[test]
    fn error_type_follows_error_category() {
        use crate::error::{Error, ValidationError};
        assert_eq!(ErrorType::from(&Error::Auth), ErrorType::Auth);
        assert_eq!(
            ErrorType::from(&Error::Validation(ValidationError::EmptyRecording)),
            ErrorType::Validation
        );
    }
}
