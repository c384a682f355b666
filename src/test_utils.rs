// SPDX-License-Identifier: MPL-2.0
//! In-memory [`GazeBackend`] for unit tests.
//!
//! Every call is appended to a log so tests can assert ordering; answers
//! are configured through [`MockBackend::state`].

use crate::application::port::{
    AnalysisRequest, ApiError, GazeBackend, PlaybackInfo, UploadRequest, UploadTarget,
};
use crate::domain::calibration::{CalibrationStatus, FrameFeedback};
use crate::domain::gaze::AnalysisPoll;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug)]
pub struct MockState {
    pub has_token: bool,
    pub calibration_session_id: String,
    pub fail_calibration_start: bool,
    pub fail_frames: bool,
    pub frame_feedback: FrameFeedback,
    pub status: CalibrationStatus,
    pub upload_target: Result<UploadTarget, ApiError>,
    pub fail_put: bool,
    pub fail_complete: bool,
    pub analysis_task_id: String,
    /// Answers handed out one per poll; the last one repeats.
    pub analysis_polls: VecDeque<AnalysisPoll>,
    pub playback: Result<PlaybackInfo, ApiError>,
    pub calls: Vec<String>,
    pub upload_requests: Vec<UploadRequest>,
    pub put_content_types: Vec<String>,
    pub put_sizes: Vec<usize>,
    pub analysis_requests: Vec<AnalysisRequest>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            has_token: true,
            calibration_session_id: "abc123".into(),
            fail_calibration_start: false,
            fail_frames: false,
            frame_feedback: FrameFeedback {
                status: "in_progress".into(),
                face_detected: true,
                ..FrameFeedback::default()
            },
            status: CalibrationStatus::default(),
            upload_target: Ok(UploadTarget {
                upload_url: "https://store.test/bucket/obj?sig=1".into(),
                media_id: "media-1".into(),
                test_id: "test-1".into(),
            }),
            fail_put: false,
            fail_complete: false,
            analysis_task_id: "task-1".into(),
            analysis_polls: VecDeque::new(),
            playback: Err(ApiError::Status {
                code: 404,
                body: String::new(),
            }),
            calls: Vec::new(),
            upload_requests: Vec::new(),
            put_content_types: Vec::new(),
            put_sizes: Vec::new(),
            analysis_requests: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    fn log(&self, call: String) {
        self.state().calls.push(call);
    }
}

impl GazeBackend for MockBackend {
    fn has_credentials(&self) -> bool {
        self.state().has_token
    }

    async fn start_calibration(&self) -> Result<String, ApiError> {
        self.log("start_calibration".into());
        let state = self.state();
        if state.fail_calibration_start {
            return Err(ApiError::Transport("connection refused".into()));
        }
        Ok(state.calibration_session_id.clone())
    }

    async fn submit_frame(&self, session_id: &str, _jpeg: Vec<u8>) -> Result<FrameFeedback, ApiError> {
        self.log(format!("submit_frame:{session_id}"));
        let state = self.state();
        if state.fail_frames {
            return Err(ApiError::Status {
                code: 500,
                body: "frame rejected".into(),
            });
        }
        Ok(state.frame_feedback.clone())
    }

    async fn calibration_status(&self, session_id: &str) -> Result<CalibrationStatus, ApiError> {
        self.log(format!("calibration_status:{session_id}"));
        let mut status = self.state().status.clone();
        status.session_id = session_id.to_string();
        Ok(status)
    }

    async fn request_upload_target(&self, request: UploadRequest) -> Result<UploadTarget, ApiError> {
        self.log("request_upload_target".into());
        let mut state = self.state();
        state.upload_requests.push(request);
        state.upload_target.clone()
    }

    async fn put_object(
        &self,
        upload_url: &str,
        data: Arc<[u8]>,
        content_type: &str,
    ) -> Result<(), ApiError> {
        self.log(format!("put_object:{upload_url}"));
        let mut state = self.state();
        if state.fail_put {
            return Err(ApiError::Status {
                code: 403,
                body: "SignatureDoesNotMatch".into(),
            });
        }
        state.put_content_types.push(content_type.to_string());
        state.put_sizes.push(data.len());
        Ok(())
    }

    async fn complete_upload(&self, media_id: &str, file_size: u64) -> Result<(), ApiError> {
        self.log(format!("complete_upload:{media_id}:{file_size}"));
        if self.state().fail_complete {
            return Err(ApiError::Status {
                code: 405,
                body: String::new(),
            });
        }
        Ok(())
    }

    async fn start_analysis(&self, request: AnalysisRequest) -> Result<String, ApiError> {
        self.log("start_analysis".into());
        let mut state = self.state();
        state.analysis_requests.push(request);
        Ok(state.analysis_task_id.clone())
    }

    async fn analysis_status(&self, task_id: &str) -> Result<AnalysisPoll, ApiError> {
        self.log(format!("analysis_status:{task_id}"));
        let mut state = self.state();
        let answer = if state.analysis_polls.len() > 1 {
            state.analysis_polls.pop_front()
        } else {
            state.analysis_polls.front().cloned()
        };
        Ok(answer.unwrap_or(AnalysisPoll::Pending { progress: None }))
    }

    async fn playback_info(&self, test_id: &str) -> Result<PlaybackInfo, ApiError> {
        self.log(format!("playback_info:{test_id}"));
        self.state().playback.clone()
    }
}
