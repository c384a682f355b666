// SPDX-License-Identifier: MPL-2.0
//! `reqwest` adapter for the [`GazeBackend`] port.
//!
//! All backend paths are relative to the configured API base URL. The
//! bearer token is attached to every backend call when present; the
//! object store `PUT` goes to the pre-signed URL without it.

mod download;
mod dto;

pub use download::{download_to_file, DownloadError};

use crate::application::port::{
    AnalysisRequest, ApiError, GazeBackend, PlaybackInfo, UploadRequest, UploadTarget,
};
use crate::config::SessionConfig;
use crate::domain::calibration::{CalibrationStatus, FrameFeedback};
use crate::domain::gaze::AnalysisPoll;
use base64::Engine as _;
use dto::{
    AnalysisStatusResponse, AnalyzeRequest, AnalyzeResponse, CalibrationStatusResponse,
    FrameFeedbackResponse, PlaybackResponse, StartCalibrationResponse, UploadUrlRequest,
    UploadUrlResponse,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::{multipart, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Longest error body kept in [`ApiError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 300;

fn user_agent() -> String {
    format!("IcedGaze/{}", env!("CARGO_PKG_VERSION"))
}

/// Backend client. Cloning shares the connection pool.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Arc<str>,
    token: Option<Arc<str>>,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the TLS backend cannot be set up.
    pub fn new(config: &SessionConfig, token: Option<&str>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(user_agent())
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: Arc::from(config.api_base_url.trim_end_matches('/')),
            token: token
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(Arc::from),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Shared client, for transfers outside the backend API.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn with_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn require_token(&self) -> Result<(), ApiError> {
        if self.token.is_some() {
            Ok(())
        } else {
            Err(ApiError::MissingToken)
        }
    }
}

fn transport(err: reqwest::Error) -> ApiError {
    // Drop the URL: pre-signed URLs carry credentials.
    ApiError::Transport(err.without_url().to_string())
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        code: status.as_u16(),
        body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    })
}

async fn read_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
    let response = request.send().await.map_err(transport)?;
    let response = check_status(response).await?;
    let bytes = response.bytes().await.map_err(transport)?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

/// `data:image/jpeg;base64,...`
fn jpeg_data_url(jpeg: &[u8]) -> String {
    format!(
        "data:image/jpeg;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(jpeg)
    )
}

impl GazeBackend for HttpBackend {
    fn has_credentials(&self) -> bool {
        self.token.is_some()
    }

    async fn start_calibration(&self) -> Result<String, ApiError> {
        let request = self.with_auth(self.client.post(self.url("/test/gaze/calibration/start")));
        read_json::<StartCalibrationResponse>(request)
            .await?
            .into_session_id()
    }

    async fn submit_frame(&self, session_id: &str, jpeg: Vec<u8>) -> Result<FrameFeedback, ApiError> {
        let form = multipart::Form::new().text("frame_data", jpeg_data_url(&jpeg));
        let request = self.with_auth(
            self.client
                .post(self.url(&format!("/test/gaze/calibration/frame/{session_id}")))
                .multipart(form),
        );
        Ok(read_json::<FrameFeedbackResponse>(request).await?.into())
    }

    async fn calibration_status(&self, session_id: &str) -> Result<CalibrationStatus, ApiError> {
        let request = self.with_auth(
            self.client
                .get(self.url(&format!("/test/gaze/calibration/status/{session_id}"))),
        );
        Ok(read_json::<CalibrationStatusResponse>(request)
            .await?
            .into_status(session_id))
    }

    async fn request_upload_target(&self, request: UploadRequest) -> Result<UploadTarget, ApiError> {
        self.require_token()?;
        let builder = self.with_auth(
            self.client
                .post(self.url("/video/test/upload-url"))
                .json(&UploadUrlRequest::from(&request)),
        );
        read_json::<UploadUrlResponse>(builder).await?.into_target()
    }

    async fn put_object(
        &self,
        upload_url: &str,
        data: Arc<[u8]>,
        content_type: &str,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .put(upload_url)
            .header(CONTENT_TYPE, content_type)
            .body(data.to_vec())
            .send()
            .await
            .map_err(transport)?;
        check_status(response).await.map(drop)
    }

    async fn complete_upload(&self, media_id: &str, file_size: u64) -> Result<(), ApiError> {
        self.require_token()?;
        let request = self.with_auth(
            self.client
                .patch(self.url(&format!("/video/test/complete/{media_id}")))
                .query(&[("file_size", file_size)]),
        );
        let response = request.send().await.map_err(transport)?;
        check_status(response).await.map(drop)
    }

    async fn start_analysis(&self, request: AnalysisRequest) -> Result<String, ApiError> {
        self.require_token()?;
        let builder = self.with_auth(self.client.post(self.url("/test/gaze/analyze")).json(
            &AnalyzeRequest {
                media_id: &request.media_id,
                test_id: &request.test_id,
                calibration_session_id: &request.calibration_session_id,
            },
        ));
        read_json::<AnalyzeResponse>(builder).await?.into_task_id()
    }

    async fn analysis_status(&self, task_id: &str) -> Result<AnalysisPoll, ApiError> {
        self.require_token()?;
        let request = self
            .with_auth(self.client.get(self.url(&format!("/test/gaze/analyze/{task_id}"))));
        read_json::<AnalysisStatusResponse>(request).await?.into_poll()
    }

    async fn playback_info(&self, test_id: &str) -> Result<PlaybackInfo, ApiError> {
        self.require_token()?;
        let request =
            self.with_auth(self.client.get(self.url(&format!("/video/test/play/{test_id}"))));
        read_json::<PlaybackResponse>(request).await?.into_info()
    }
}
