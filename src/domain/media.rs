// SPDX-License-Identifier: MPL-2.0
//! Recorded media payload handed from the recorder to the uploader.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// MIME type of a recorded payload, possibly carrying codec parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentType(String);

impl ContentType {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The full MIME type as produced by the recorder.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Type and subtype only, lower-cased, without parameters.
    ///
    /// Pre-signed upload URLs are computed for this value, so the transfer
    /// must use it verbatim: `video/webm;codecs=vp9` becomes `video/webm`.
    #[must_use]
    pub fn normalized(&self) -> String {
        self.0
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }

    /// File extension matching the normalized type.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self.normalized().as_str() {
            "video/webm" => "webm",
            "video/mp4" => "mp4",
            "video/quicktime" => "mov",
            "video/x-matroska" => "mkv",
            "video/avi" | "video/x-msvideo" | "video/msvideo" => "avi",
            _ => "bin",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque recorded video.
///
/// Cloning shares the payload; the bytes are never mutated after recording.
#[derive(Clone, PartialEq)]
pub struct RecordedMedia {
    data: Arc<[u8]>,
    content_type: ContentType,
    duration: Duration,
    created_at: SystemTime,
}

impl RecordedMedia {
    #[must_use]
    pub fn new(
        data: impl Into<Arc<[u8]>>,
        content_type: ContentType,
        duration: Duration,
        created_at: SystemTime,
    ) -> Self {
        Self {
            data: data.into(),
            content_type,
            duration,
            created_at,
        }
    }

    #[must_use]
    pub fn data(&self) -> &Arc<[u8]> {
        &self.data
    }

    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    #[must_use]
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Upload file name, e.g. `gaze_test_1718000000000.avi`.
    #[must_use]
    pub fn file_name(&self) -> String {
        let millis = self
            .created_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        format!("gaze_test_{}.{}", millis, self.content_type.extension())
    }
}

impl fmt::Debug for RecordedMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordedMedia")
            .field("size", &self.data.len())
            .field("content_type", &self.content_type)
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}
