// SPDX-License-Identifier: MPL-2.0
//! Scripted [`GazeBackend`] shared by the integration tests.

use iced_gaze::application::port::{
    AnalysisRequest, ApiError, GazeBackend, PlaybackInfo, UploadRequest, UploadTarget,
};
use iced_gaze::domain::calibration::{CalibrationStatus, FrameFeedback};
use iced_gaze::domain::gaze::AnalysisPoll;
use std::sync::{Arc, Mutex};

/// Every request the backend saw, in order.
#[derive(Debug, Default)]
pub struct Log {
    pub calls: Vec<&'static str>,
    pub upload_requests: Vec<UploadRequest>,
    pub put_urls: Vec<String>,
    pub put_content_types: Vec<String>,
    pub put_sizes: Vec<usize>,
    pub completed_media: Vec<(String, u64)>,
}

#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    pub session_id: String,
    pub target: UploadTarget,
    log: Arc<Mutex<Log>>,
}

impl ScriptedBackend {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            target: UploadTarget {
                upload_url: "https://store.example/put?sig=1".into(),
                media_id: "media-42".into(),
                test_id: "test-42".into(),
            },
            log: Arc::new(Mutex::new(Log::default())),
        }
    }

    pub fn log(&self) -> std::sync::MutexGuard<'_, Log> {
        self.log.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn record(&self, call: &'static str) {
        self.log().calls.push(call);
    }
}

impl GazeBackend for ScriptedBackend {
    fn has_credentials(&self) -> bool {
        true
    }

    async fn start_calibration(&self) -> Result<String, ApiError> {
        self.record("start_calibration");
        Ok(self.session_id.clone())
    }

    async fn submit_frame(&self, _session_id: &str, _jpeg: Vec<u8>) -> Result<FrameFeedback, ApiError> {
        self.record("submit_frame");
        Err(ApiError::Transport("no camera in tests".into()))
    }

    async fn calibration_status(&self, session_id: &str) -> Result<CalibrationStatus, ApiError> {
        self.record("calibration_status");
        Ok(CalibrationStatus {
            session_id: session_id.to_string(),
            status: "in_progress".into(),
            ..CalibrationStatus::default()
        })
    }

    async fn request_upload_target(&self, request: UploadRequest) -> Result<UploadTarget, ApiError> {
        self.record("request_upload_target");
        self.log().upload_requests.push(request);
        Ok(self.target.clone())
    }

    async fn put_object(
        &self,
        upload_url: &str,
        data: Arc<[u8]>,
        content_type: &str,
    ) -> Result<(), ApiError> {
        self.record("put_object");
        let mut log = self.log();
        log.put_urls.push(upload_url.to_string());
        log.put_content_types.push(content_type.to_string());
        log.put_sizes.push(data.len());
        Ok(())
    }

    async fn complete_upload(&self, media_id: &str, file_size: u64) -> Result<(), ApiError> {
        self.record("complete_upload");
        self.log()
            .completed_media
            .push((media_id.to_string(), file_size));
        Ok(())
    }

    async fn start_analysis(&self, _request: AnalysisRequest) -> Result<String, ApiError> {
        self.record("start_analysis");
        Ok("task-1".into())
    }

    async fn analysis_status(&self, _task_id: &str) -> Result<AnalysisPoll, ApiError> {
        self.record("analysis_status");
        Ok(AnalysisPoll::Pending { progress: None })
    }

    async fn playback_info(&self, _test_id: &str) -> Result<PlaybackInfo, ApiError> {
        self.record("playback_info");
        Err(ApiError::Status {
            code: 404,
            body: String::new(),
        })
    }
}
