// SPDX-License-Identifier: MPL-2.0
//! Streams a signed playback URL into a local file.

use futures_util::StreamExt;
use reqwest::Client;
use std::fmt;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadError {
    Http(String),
    Io(String),
    /// The server sent fewer bytes than announced.
    Truncated { expected: u64, received: u64 },
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadError::Http(msg) => write!(f, "download failed: {msg}"),
            DownloadError::Io(msg) => write!(f, "cannot write video: {msg}"),
            DownloadError::Truncated { expected, received } => {
                write!(f, "download truncated: {received} of {expected} bytes")
            }
        }
    }
}

impl std::error::Error for DownloadError {}

impl From<DownloadError> for crate::error::Error {
    fn from(err: DownloadError) -> Self {
        match err {
            DownloadError::Io(msg) => crate::error::Error::Io(msg),
            other => crate::error::Error::Network(other.to_string()),
        }
    }
}

/// Downloads `url` into `destination`, reporting progress from 0.0 to 1.0
/// when the size is known. Returns the number of bytes written.
///
/// Data lands in a `.part` file that is renamed once complete, so an
/// interrupted download never leaves a truncated video behind.
///
/// # Errors
///
/// Returns a [`DownloadError`] on HTTP failures, write failures, or when
/// fewer bytes than announced arrive.
#[allow(clippy::cast_precision_loss)]
pub async fn download_to_file(
    client: &Client,
    url: &str,
    destination: &Path,
    mut progress_callback: impl FnMut(f32) + Send,
) -> Result<u64, DownloadError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| DownloadError::Http(e.without_url().to_string()))?;

    if !response.status().is_success() {
        return Err(DownloadError::Http(format!(
            "HTTP status: {}",
            response.status()
        )));
    }

    let total_size = response.content_length().unwrap_or(0);

    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DownloadError::Io(e.to_string()))?;
    }
    let part_path = destination.with_extension("part");
    let mut file =
        std::fs::File::create(&part_path).map_err(|e| DownloadError::Io(e.to_string()))?;

    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                let _ = std::fs::remove_file(&part_path);
                return Err(DownloadError::Http(e.without_url().to_string()));
            }
        };
        if let Err(e) = file.write_all(&chunk) {
            let _ = std::fs::remove_file(&part_path);
            return Err(DownloadError::Io(e.to_string()));
        }

        downloaded += chunk.len() as u64;

        if total_size > 0 {
            progress_callback((downloaded as f32 / total_size as f32).min(1.0));
        }
    }
    drop(file);

    if total_size > 0 && downloaded < total_size {
        let _ = std::fs::remove_file(&part_path);
        return Err(DownloadError::Truncated {
            expected: total_size,
            received: downloaded,
        });
    }

    std::fs::rename(&part_path, destination).map_err(|e| {
        let _ = std::fs::remove_file(&part_path);
        DownloadError::Io(e.to_string())
    })?;
    progress_callback(1.0);
    Ok(downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_io_variant() {
        let err: crate::error::Error = DownloadError::Io("disk full".into()).into();
        assert_eq!(err, crate::error::Error::Io("disk full".into()));
    }

    #[test]
    fn truncation_is_a_network_error() {
        let err: crate::error::Error = DownloadError::Truncated {
            expected: 10,
            received: 4,
        }
        .into();
        assert!(matches!(err, crate::error::Error::Network(_)));
    }

    #[tokio::test]
    async fn unreachable_host_reports_http_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let client = Client::new();
        let result = download_to_file(
            &client,
            "http://127.0.0.1:9/video.webm",
            &dir.path().join("video.webm"),
            |_| {},
        )
        .await;
        assert!(matches!(result, Err(DownloadError::Http(_))));
        assert!(!dir.path().join("video.webm").exists());
    }
}
