// SPDX-License-Identifier: MPL-2.0
//! Server-side gaze analysis: queue the job, then poll until it settles.

use crate::application::port::{AnalysisRequest, GazeBackend};
use crate::domain::gaze::{AnalysisPoll, GazeAnalysisResult};
use crate::error::{Error, ValidationError};
use std::time::Duration;

/// Ids an analysis job is started from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisInput {
    pub media_id: String,
    pub test_id: String,
    pub calibration_session_id: String,
}

impl AnalysisInput {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.calibration_session_id.trim().is_empty() {
            return Err(ValidationError::MissingSessionId);
        }
        for (name, value) in [("media_id", &self.media_id), ("test_id", &self.test_id)] {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(name.to_string()));
            }
        }
        Ok(())
    }
}

/// Queues the analysis job and returns its task id.
///
/// # Errors
///
/// Validation errors for blank ids, [`Error::Auth`] without credentials,
/// network errors, or a missing `task_id` in the answer.
pub async fn start<B: GazeBackend>(backend: &B, input: &AnalysisInput) -> Result<String, Error> {
    input.validate()?;
    if !backend.has_credentials() {
        return Err(Error::Auth);
    }
    let task_id = backend
        .start_analysis(AnalysisRequest {
            media_id: input.media_id.clone(),
            test_id: input.test_id.clone(),
            calibration_session_id: input.calibration_session_id.clone(),
        })
        .await?;
    if task_id.trim().is_empty() {
        return Err(ValidationError::MissingField("task_id".to_string()).into());
    }
    Ok(task_id)
}

/// Polls `task_id` every `interval` until the job completes or fails.
///
/// The first poll happens after one interval. `on_progress` receives the
/// server-side progress of every pending answer.
///
/// # Errors
///
/// [`Error::AnalysisFailed`] when the job failed, [`Error::AnalysisTimeout`]
/// after `max_attempts` pending answers, or the network error of a poll.
pub async fn wait_for_result<B: GazeBackend>(
    backend: &B,
    task_id: &str,
    interval: Duration,
    max_attempts: u32,
    mut on_progress: impl FnMut(Option<f32>) + Send,
) -> Result<GazeAnalysisResult, Error> {
    let max_attempts = max_attempts.max(1);
    for _ in 0..max_attempts {
        tokio::time::sleep(interval).await;
        match backend.analysis_status(task_id).await? {
            AnalysisPoll::Completed(result) => return Ok(*result),
            AnalysisPoll::Failed(reason) => return Err(Error::AnalysisFailed(reason)),
            AnalysisPoll::Pending { progress } => on_progress(progress),
        }
    }
    Err(Error::AnalysisTimeout {
        attempts: max_attempts,
    })
}
