// SPDX-License-Identifier: MPL-2.0
//! Calibration handshake bookkeeping.
//!
//! While a calibration session is active two loops feed [`CalibrationRun`]:
//! the status poll and either the frame submission loop or, without a
//! camera, the [`CalibrationSimulator`]. Whichever observes completion first
//! sets the shared [`CompletionLatch`]; every later observation is a no-op,
//! so the completion event is produced exactly once per session.
//!
//! The run is a plain state value. The UI owns it, turns ticks into
//! backend calls and hands the answers back here.

use crate::application::port::{ApiError, GazeBackend};
use crate::domain::calibration::{
    CalibrationPhase, CalibrationStatus, FrameFeedback, CORNER_COUNT,
};
use crate::error::{Error, ValidationError};
use std::sync::{Arc, OnceLock};

// =============================================================================
// CompletionLatch
// =============================================================================

/// Single-assignment completion flag shared by both calibration loops.
#[derive(Debug, Clone, Default)]
pub struct CompletionLatch {
    session_id: Arc<OnceLock<String>>,
}

impl CompletionLatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the latch. Returns `true` only for the call that set it.
    pub fn complete(&self, session_id: &str) -> bool {
        self.session_id.set(session_id.to_string()).is_ok()
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.session_id.get().is_some()
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.get().map(String::as_str)
    }
}

// =============================================================================
// CalibrationSimulator
// =============================================================================

/// Synthetic progress used when no camera is available.
///
/// Each tick stands for one accepted frame at the current corner; after
/// `frames_per_corner` ticks it moves on, after the fourth corner it
/// reports [`CalibrationPhase::Completed`].
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationSimulator {
    frames_per_corner: u32,
    phase: CalibrationPhase,
    collected: [u32; CORNER_COUNT],
}

impl CalibrationSimulator {
    #[must_use]
    pub fn new(frames_per_corner: u32) -> Self {
        Self {
            frames_per_corner: frames_per_corner.max(1),
            phase: CalibrationPhase::TopLeft,
            collected: [0; CORNER_COUNT],
        }
    }

    /// Advances by one synthetic frame and returns the phase afterwards.
    pub fn tick(&mut self) -> CalibrationPhase {
        let Some(index) = self.phase.corner_index() else {
            return self.phase;
        };
        self.collected[index] += 1;
        if self.collected[index] >= self.frames_per_corner {
            self.phase = self.phase.next();
        }
        self.phase
    }

    #[must_use]
    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    #[must_use]
    pub fn collected_points(&self) -> [u32; CORNER_COUNT] {
        self.collected
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f32 {
        let total = self.frames_per_corner * CORNER_COUNT as u32;
        let done: u32 = self.collected.iter().sum();
        (done as f32 / total as f32).min(1.0)
    }
}

// =============================================================================
// CalibrationRun
// =============================================================================

/// What happened to one frame submission answer.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Answer for another session, or the run is already complete.
    Ignored,
    Accepted,
    /// The submission failed. The run keeps going.
    Swallowed(ApiError),
    /// This answer completed the session.
    Completed(String),
}

/// Live state of one calibration session.
#[derive(Debug, Clone)]
pub struct CalibrationRun {
    session_id: String,
    phase: CalibrationPhase,
    collected_points: [u32; CORNER_COUNT],
    progress: f32,
    instructions: Option<String>,
    face_detected: Option<bool>,
    last_message: Option<String>,
    simulator: Option<CalibrationSimulator>,
    latch: CompletionLatch,
    frame_in_flight: bool,
    swallowed_failures: u32,
}

impl CalibrationRun {
    /// Starts tracking `session_id`. With `simulated_frames_per_corner` set,
    /// the simulator replaces frame submission.
    #[must_use]
    pub fn new(session_id: impl Into<String>, simulated_frames_per_corner: Option<u32>) -> Self {
        let simulator = simulated_frames_per_corner.map(CalibrationSimulator::new);
        Self {
            session_id: session_id.into(),
            phase: if simulator.is_some() {
                CalibrationPhase::TopLeft
            } else {
                CalibrationPhase::Ready
            },
            collected_points: [0; CORNER_COUNT],
            progress: 0.0,
            instructions: None,
            face_detected: None,
            last_message: None,
            simulator,
            latch: CompletionLatch::new(),
            frame_in_flight: false,
            swallowed_failures: 0,
        }
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    #[must_use]
    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    #[must_use]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    #[must_use]
    pub fn collected_points(&self) -> [u32; CORNER_COUNT] {
        self.collected_points
    }

    #[must_use]
    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    #[must_use]
    pub fn face_detected(&self) -> Option<bool> {
        self.face_detected
    }

    #[must_use]
    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    #[must_use]
    pub fn is_simulated(&self) -> bool {
        self.simulator.is_some()
    }

    /// Both loops stop once this turns false.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.latch.is_completed()
    }

    #[must_use]
    pub fn latch(&self) -> &CompletionLatch {
        &self.latch
    }

    #[must_use]
    pub fn swallowed_failures(&self) -> u32 {
        self.swallowed_failures
    }

    /// Claims the frame loop slot. Returns false while a submission is
    /// pending, in simulated mode or after completion.
    pub fn begin_frame_submission(&mut self) -> bool {
        if !self.is_active() || self.simulator.is_some() || self.frame_in_flight {
            return false;
        }
        self.frame_in_flight = true;
        true
    }

    /// Applies a status poll answer. Returns the session id when this
    /// answer completed the session.
    pub fn apply_status(&mut self, session_id: &str, status: &CalibrationStatus) -> Option<String> {
        if session_id != self.session_id || !self.is_active() {
            return None;
        }
        if self.simulator.is_none() {
            self.phase = status.current_phase;
            self.collected_points = status.collected_points;
            self.progress = status.progress.clamp(0.0, 1.0);
        }
        if status.instructions.is_some() {
            self.instructions.clone_from(&status.instructions);
        }
        if status.is_completed() {
            return self.complete();
        }
        None
    }

    /// Applies a frame submission answer. Failures are counted, never
    /// propagated.
    pub fn apply_frame_result(
        &mut self,
        session_id: &str,
        result: Result<FrameFeedback, ApiError>,
    ) -> FrameOutcome {
        if session_id != self.session_id {
            return FrameOutcome::Ignored;
        }
        self.frame_in_flight = false;
        if !self.is_active() {
            return FrameOutcome::Ignored;
        }

        match result {
            Ok(feedback) => {
                self.face_detected = Some(feedback.face_detected);
                self.last_message = feedback.message.clone();
                if let Some(phase) = feedback.current_phase {
                    self.phase = phase;
                }
                if let Some(progress) = feedback.progress {
                    self.progress = progress.clamp(0.0, 1.0);
                }
                if feedback.is_completed() {
                    return self
                        .complete()
                        .map_or(FrameOutcome::Ignored, FrameOutcome::Completed);
                }
                FrameOutcome::Accepted
            }
            Err(err) => {
                self.swallowed_failures += 1;
                FrameOutcome::Swallowed(err)
            }
        }
    }

    /// Advances the simulator by one frame. Returns the session id when the
    /// last corner finished.
    pub fn simulate_tick(&mut self) -> Option<String> {
        if !self.is_active() {
            return None;
        }
        let simulator = self.simulator.as_mut()?;
        let phase = simulator.tick();
        self.phase = phase;
        self.collected_points = simulator.collected_points();
        self.progress = simulator.progress();
        if phase.is_completed() {
            return self.complete();
        }
        None
    }

    fn complete(&mut self) -> Option<String> {
        self.phase = CalibrationPhase::Completed;
        self.progress = 1.0;
        self.frame_in_flight = false;
        self.latch
            .complete(&self.session_id)
            .then(|| self.session_id.clone())
    }
}

// =============================================================================
// Backend calls
// =============================================================================

/// Opens a calibration session and validates the returned id.
///
/// # Errors
///
/// Network failures, or [`ValidationError::MissingSessionId`] when the
/// backend answers with a blank id.
pub async fn start_session<B: GazeBackend>(backend: &B) -> Result<String, Error> {
    let session_id = backend.start_calibration().await?;
    let session_id = session_id.trim().to_string();
    if session_id.is_empty() {
        return Err(ValidationError::MissingSessionId.into());
    }
    Ok(session_id)
}

/// Submits one frame and tags the answer with its session.
pub async fn submit_frame<B: GazeBackend>(
    backend: B,
    session_id: String,
    jpeg: Vec<u8>,
) -> (String, Result<FrameFeedback, ApiError>) {
    let result = backend.submit_frame(&session_id, jpeg).await;
    (session_id, result)
}

/// Polls the session status and tags the answer with its session.
pub async fn poll_status<B: GazeBackend>(
    backend: B,
    session_id: String,
) -> (String, Result<CalibrationStatus, ApiError>) {
    let result = backend.calibration_status(&session_id).await;
    (session_id, result)
}
