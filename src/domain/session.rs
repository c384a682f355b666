// SPDX-License-Identifier: MPL-2.0
//! Test session state machine.
//!
//! A session walks a fixed sequence of steps chosen by its [`SessionVariant`].
//! Forward moves happen only through the completion operations, each of which
//! checks the current step first and leaves the state untouched on mismatch.
//! [`SessionState::go_back`] is the only backward move; it wipes everything
//! owned by the target step and the steps after it.

use super::calibration::CalibrationPhase;
use super::gaze::GazeAnalysisResult;
use super::media::RecordedMedia;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStep {
    Calibration,
    Record,
    Upload,
    Analyze,
    Result,
    Play,
}

impl SessionStep {
    #[must_use]
    pub fn i18n_key(self) -> &'static str {
        match self {
            SessionStep::Calibration => "step-calibration",
            SessionStep::Record => "step-record",
            SessionStep::Upload => "step-upload",
            SessionStep::Analyze => "step-analyze",
            SessionStep::Result => "step-result",
            SessionStep::Play => "step-play",
        }
    }
}

impl fmt::Display for SessionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStep::Calibration => "calibration",
            SessionStep::Record => "record",
            SessionStep::Upload => "upload",
            SessionStep::Analyze => "analyze",
            SessionStep::Result => "result",
            SessionStep::Play => "play",
        };
        f.write_str(name)
    }
}

/// Which sequence of steps a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionVariant {
    /// Calibrate, record, upload, analyze, show the result.
    #[default]
    GazeTest,
    /// Record, upload, play the stored video back.
    VideoOnly,
}

impl SessionVariant {
    #[must_use]
    pub fn steps(self) -> &'static [SessionStep] {
        match self {
            SessionVariant::GazeTest => &[
                SessionStep::Calibration,
                SessionStep::Record,
                SessionStep::Upload,
                SessionStep::Analyze,
                SessionStep::Result,
            ],
            SessionVariant::VideoOnly => {
                &[SessionStep::Record, SessionStep::Upload, SessionStep::Play]
            }
        }
    }

    #[must_use]
    pub fn first_step(self) -> SessionStep {
        self.steps()[0]
    }

    #[must_use]
    pub fn position(self, step: SessionStep) -> Option<usize> {
        self.steps().iter().position(|s| *s == step)
    }

    #[must_use]
    pub fn next(self, step: SessionStep) -> Option<SessionStep> {
        self.position(step)
            .and_then(|index| self.steps().get(index + 1).copied())
    }
}

/// Rejected state change. The state is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    WrongStep {
        expected: SessionStep,
        actual: SessionStep,
    },
    StepNotInVariant {
        step: SessionStep,
        variant: SessionVariant,
    },
    NotEarlier {
        target: SessionStep,
        current: SessionStep,
    },
    /// A completion arrived without the data it must carry.
    MissingData(&'static str),
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionError::WrongStep { expected, actual } => {
                write!(f, "expected step {}, session is at {}", expected, actual)
            }
            TransitionError::StepNotInVariant { step, variant } => {
                write!(f, "step {} is not part of {:?}", step, variant)
            }
            TransitionError::NotEarlier { target, current } => {
                write!(f, "cannot go back to {} from {}", target, current)
            }
            TransitionError::MissingData(what) => write!(f, "missing {}", what),
        }
    }
}

impl std::error::Error for TransitionError {}

/// The single mutable session value owned by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    variant: SessionVariant,
    pub step: SessionStep,
    pub is_recording: bool,
    pub is_uploading: bool,
    pub upload_progress: f32,
    /// Localized banner text; `None` when no banner is shown.
    pub error: Option<String>,
    pub recorded_media: Option<RecordedMedia>,
    pub test_id: Option<String>,
    pub media_id: Option<String>,
    pub calibration_session_id: Option<String>,
    pub is_calibrating: bool,
    pub calibration_phase: CalibrationPhase,
    pub is_analyzing: bool,
    pub analysis_task_id: Option<String>,
    pub gaze_result: Option<GazeAnalysisResult>,
}

impl SessionState {
    #[must_use]
    pub fn new(variant: SessionVariant) -> Self {
        Self {
            variant,
            step: variant.first_step(),
            is_recording: false,
            is_uploading: false,
            upload_progress: 0.0,
            error: None,
            recorded_media: None,
            test_id: None,
            media_id: None,
            calibration_session_id: None,
            is_calibrating: false,
            calibration_phase: CalibrationPhase::Ready,
            is_analyzing: false,
            analysis_task_id: None,
            gaze_result: None,
        }
    }

    #[must_use]
    pub fn variant(&self) -> SessionVariant {
        self.variant
    }

    /// Back to the initial value for the same variant.
    pub fn reset(&mut self) {
        *self = Self::new(self.variant);
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn expect_step(&self, expected: SessionStep) -> Result<(), TransitionError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(TransitionError::WrongStep {
                expected,
                actual: self.step,
            })
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.variant.next(self.step) {
            self.step = next;
        }
    }

    /// Records that the backend opened a calibration session.
    pub fn start_calibration(&mut self, session_id: &str) -> Result<(), TransitionError> {
        self.expect_step(SessionStep::Calibration)?;
        if session_id.is_empty() {
            return Err(TransitionError::MissingData("calibration session id"));
        }
        self.calibration_session_id = Some(session_id.to_string());
        self.is_calibrating = true;
        self.calibration_phase = CalibrationPhase::Ready;
        Ok(())
    }

    /// Mirrors the phase the calibration widget currently shows.
    pub fn update_calibration_phase(&mut self, phase: CalibrationPhase) {
        if self.step == SessionStep::Calibration {
            self.calibration_phase = phase;
        }
    }

    pub fn complete_calibration(&mut self, session_id: &str) -> Result<(), TransitionError> {
        self.expect_step(SessionStep::Calibration)?;
        if session_id.is_empty() {
            return Err(TransitionError::MissingData("calibration session id"));
        }
        self.calibration_session_id = Some(session_id.to_string());
        self.calibration_phase = CalibrationPhase::Completed;
        self.is_calibrating = false;
        self.advance();
        Ok(())
    }

    pub fn set_recording(&mut self, recording: bool) {
        self.is_recording = recording && self.step == SessionStep::Record;
    }

    pub fn finish_recording(&mut self, media: RecordedMedia) -> Result<(), TransitionError> {
        self.expect_step(SessionStep::Record)?;
        if media.is_empty() {
            return Err(TransitionError::MissingData("recorded media"));
        }
        self.recorded_media = Some(media);
        self.is_recording = false;
        self.advance();
        Ok(())
    }

    pub fn set_uploading(&mut self, uploading: bool) {
        self.is_uploading = uploading && self.step == SessionStep::Upload;
    }

    /// Progress is clamped to 0.0..=1.0 and only tracked during upload.
    pub fn set_upload_progress(&mut self, progress: f32) {
        if self.step == SessionStep::Upload {
            self.upload_progress = progress.clamp(0.0, 1.0);
        }
    }

    pub fn finish_upload(&mut self, media_id: &str, test_id: &str) -> Result<(), TransitionError> {
        self.expect_step(SessionStep::Upload)?;
        if media_id.is_empty() {
            return Err(TransitionError::MissingData("media id"));
        }
        if test_id.is_empty() {
            return Err(TransitionError::MissingData("test id"));
        }
        self.media_id = Some(media_id.to_string());
        self.test_id = Some(test_id.to_string());
        self.upload_progress = 1.0;
        self.is_uploading = false;
        self.advance();
        Ok(())
    }

    /// Records the analysis task id. The step does not change until the
    /// result arrives.
    pub fn start_analysis(&mut self, task_id: &str) -> Result<(), TransitionError> {
        self.expect_step(SessionStep::Analyze)?;
        if task_id.is_empty() {
            return Err(TransitionError::MissingData("analysis task id"));
        }
        self.analysis_task_id = Some(task_id.to_string());
        self.is_analyzing = true;
        Ok(())
    }

    pub fn finish_analysis(&mut self, result: GazeAnalysisResult) -> Result<(), TransitionError> {
        self.expect_step(SessionStep::Analyze)?;
        self.gaze_result = Some(result);
        self.is_analyzing = false;
        self.advance();
        Ok(())
    }

    /// Stops a failed analysis without leaving the step, so it can be retried.
    pub fn abort_analysis(&mut self) {
        if self.step == SessionStep::Analyze {
            self.is_analyzing = false;
            self.analysis_task_id = None;
        }
    }

    /// Returns to an earlier step, clearing what it and later steps produced.
    pub fn go_back(&mut self, target: SessionStep) -> Result<(), TransitionError> {
        let variant = self.variant;
        let Some(target_pos) = variant.position(target) else {
            return Err(TransitionError::StepNotInVariant {
                step: target,
                variant,
            });
        };
        let current_pos = variant.position(self.step).unwrap_or_default();
        if target_pos >= current_pos {
            return Err(TransitionError::NotEarlier {
                target,
                current: self.step,
            });
        }

        for step in &variant.steps()[target_pos..] {
            self.clear_step_data(*step);
        }
        self.step = target;
        self.error = None;
        Ok(())
    }

    fn clear_step_data(&mut self, step: SessionStep) {
        match step {
            SessionStep::Calibration => {
                self.calibration_session_id = None;
                self.calibration_phase = CalibrationPhase::Ready;
                self.is_calibrating = false;
            }
            SessionStep::Record => {
                self.recorded_media = None;
                self.is_recording = false;
            }
            SessionStep::Upload => {
                self.test_id = None;
                self.media_id = None;
                self.upload_progress = 0.0;
                self.is_uploading = false;
            }
            SessionStep::Analyze => {
                self.analysis_task_id = None;
                self.is_analyzing = false;
            }
            SessionStep::Result => {
                self.gaze_result = None;
            }
            SessionStep::Play => {}
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(SessionVariant::default())
    }
}
