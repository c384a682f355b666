// SPDX-License-Identifier: MPL-2.0
//! Recording lifecycle, independent of the capture device.
//!
//! The clock is passed in so every rule can be tested without waiting:
//!
//! - a start request must reach the recording state within the grace window
//! - a stop request before the minimum duration is a no-op
//! - the finished payload must be non-empty and long enough, and is handed
//!   out once per recording session

use crate::domain::media::RecordedMedia;
use crate::error::ValidationError;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    /// Start requested, device not yet producing.
    Starting { requested_at: Instant },
    Recording { started_at: Instant },
    /// Stop accepted, waiting for the encoded payload.
    Stopping { elapsed: Duration },
    /// The payload of this session was handed out.
    Finished,
}

/// Answer to a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopDecision {
    /// Below the minimum duration; recording continues.
    TooShort { remaining: Duration },
    /// Stop accepted; the payload will follow.
    Accepted { elapsed: Duration },
    /// Nothing is being recorded.
    NotRecording,
}

#[derive(Debug, Clone)]
pub struct Recorder {
    state: RecorderState,
    min_duration: Duration,
    start_grace: Duration,
}

impl Recorder {
    #[must_use]
    pub fn new(min_duration: Duration, start_grace: Duration) -> Self {
        Self {
            state: RecorderState::Idle,
            min_duration,
            start_grace,
        }
    }

    #[must_use]
    pub fn state(&self) -> RecorderState {
        self.state
    }

    #[must_use]
    pub fn min_duration(&self) -> Duration {
        self.min_duration
    }

    #[must_use]
    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Recording { .. })
    }

    /// True between a start request and the payload hand-off.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(
            self.state,
            RecorderState::Starting { .. }
                | RecorderState::Recording { .. }
                | RecorderState::Stopping { .. }
        )
    }

    /// Opens a new recording session. Returns false if one is in progress.
    pub fn request_start(&mut self, now: Instant) -> bool {
        if self.is_busy() {
            return false;
        }
        self.state = RecorderState::Starting { requested_at: now };
        true
    }

    /// The device confirmed it is recording.
    pub fn mark_active(&mut self, now: Instant) {
        if let RecorderState::Starting { .. } = self.state {
            self.state = RecorderState::Recording { started_at: now };
        }
    }

    /// Fails a start that did not become active within the grace window.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::RecorderDidNotStart`] and resets to idle.
    pub fn check_grace(&mut self, now: Instant) -> Result<(), ValidationError> {
        if let RecorderState::Starting { requested_at } = self.state {
            if now.saturating_duration_since(requested_at) > self.start_grace {
                self.state = RecorderState::Idle;
                return Err(ValidationError::RecorderDidNotStart);
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.state {
            RecorderState::Recording { started_at } => now.saturating_duration_since(started_at),
            RecorderState::Stopping { elapsed } => elapsed,
            _ => Duration::ZERO,
        }
    }

    /// Whether a stop request would currently be accepted.
    #[must_use]
    pub fn can_stop(&self, now: Instant) -> bool {
        self.is_recording() && self.elapsed(now) >= self.min_duration
    }

    pub fn request_stop(&mut self, now: Instant) -> StopDecision {
        let RecorderState::Recording { started_at } = self.state else {
            return StopDecision::NotRecording;
        };
        let elapsed = now.saturating_duration_since(started_at);
        if elapsed < self.min_duration {
            return StopDecision::TooShort {
                remaining: self.min_duration - elapsed,
            };
        }
        self.state = RecorderState::Stopping { elapsed };
        StopDecision::Accepted { elapsed }
    }

    /// Validates the encoded payload of an accepted stop.
    ///
    /// Returns `None` when no payload is expected (duplicate delivery, or no
    /// stop was accepted). A rejected payload is dropped and the recorder
    /// goes back to idle.
    pub fn finish(&mut self, media: RecordedMedia) -> Option<Result<RecordedMedia, ValidationError>> {
        let RecorderState::Stopping { .. } = self.state else {
            return None;
        };
        if media.is_empty() {
            self.state = RecorderState::Idle;
            return Some(Err(ValidationError::EmptyRecording));
        }
        if media.duration() < self.min_duration {
            self.state = RecorderState::Idle;
            return Some(Err(ValidationError::RecordingTooShort {
                actual_ms: duration_ms(media.duration()),
                min_ms: duration_ms(self.min_duration),
            }));
        }
        self.state = RecorderState::Finished;
        Some(Ok(media))
    }

    /// Drops the current session, e.g. after a device error.
    pub fn abort(&mut self) {
        self.state = RecorderState::Idle;
    }
}

#[allow(clippy::cast_possible_truncation)]
fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::media::ContentType;
    use std::time::SystemTime;

    const MIN: Duration = Duration::from_secs(3);
    const GRACE: Duration = Duration::from_millis(1500);

    fn media(bytes: usize, duration: Duration) -> RecordedMedia {
        RecordedMedia::new(
            vec![1u8; bytes],
            ContentType::new("video/x-msvideo"),
            duration,
            SystemTime::now(),
        )
    }

    fn recording(t0: Instant) -> Recorder {
        let mut recorder = Recorder::new(MIN, GRACE);
        assert!(recorder.request_start(t0));
        recorder.mark_active(t0);
        recorder
    }

    #[test]
    fn early_stop_is_a_no_op() {
        let t0 = Instant::now();
        let mut recorder = recording(t0);
        let decision = recorder.request_stop(t0 + Duration::from_secs(1));
        assert_eq!(
            decision,
            StopDecision::TooShort {
                remaining: Duration::from_secs(2)
            }
        );
        assert!(recorder.is_recording());
    }

    #[test]
    fn valid_recording_is_emitted_exactly_once() {
        let t0 = Instant::now();
        let mut recorder = recording(t0);
        assert!(matches!(
            recorder.request_stop(t0 + Duration::from_secs(4)),
            StopDecision::Accepted { .. }
        ));

        let payload = media(4096, Duration::from_secs(4));
        let first = recorder.finish(payload.clone());
        assert_eq!(first, Some(Ok(payload.clone())));
        assert_eq!(recorder.finish(payload), None);
        assert_eq!(recorder.state(), RecorderState::Finished);
    }

    #[test]
    fn empty_payload_is_rejected() {
        let t0 = Instant::now();
        let mut recorder = recording(t0);
        recorder.request_stop(t0 + MIN);
        assert_eq!(
            recorder.finish(media(0, MIN)),
            Some(Err(ValidationError::EmptyRecording))
        );
        assert_eq!(recorder.state(), RecorderState::Idle);
    }

    #[test]
    fn short_payload_is_rejected() {
        let t0 = Instant::now();
        let mut recorder = recording(t0);
        recorder.request_stop(t0 + MIN);
        assert_eq!(
            recorder.finish(media(2048, Duration::from_millis(2500))),
            Some(Err(ValidationError::RecordingTooShort {
                actual_ms: 2500,
                min_ms: 3000
            }))
        );
    }

    #[test]
    fn start_must_become_active_within_grace() {
        let t0 = Instant::now();
        let mut recorder = Recorder::new(MIN, GRACE);
        recorder.request_start(t0);
        assert!(recorder.check_grace(t0 + Duration::from_secs(1)).is_ok());
        assert_eq!(
            recorder.check_grace(t0 + Duration::from_secs(2)),
            Err(ValidationError::RecorderDidNotStart)
        );
        assert_eq!(recorder.state(), RecorderState::Idle);
    }

    #[test]
    fn active_recorder_ignores_grace_check() {
        let t0 = Instant::now();
        let mut recorder = recording(t0);
        assert!(recorder.check_grace(t0 + Duration::from_secs(10)).is_ok());
        assert!(recorder.is_recording());
    }

    #[test]
    fn second_start_while_busy_is_refused() {
        let t0 = Instant::now();
        let mut recorder = recording(t0);
        assert!(!recorder.request_start(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn new_session_after_finish() {
        let t0 = Instant::now();
        let mut recorder = recording(t0);
        recorder.request_stop(t0 + MIN);
        recorder.finish(media(2048, MIN));
        assert!(recorder.request_start(t0 + Duration::from_secs(10)));
    }

    #[test]
    fn payload_without_stop_is_ignored() {
        let t0 = Instant::now();
        let mut recorder = recording(t0);
        assert_eq!(recorder.finish(media(2048, MIN)), None);
        assert!(recorder.is_recording());
    }

    #[test]
    fn stop_when_idle_reports_not_recording() {
        let mut recorder = Recorder::new(MIN, GRACE);
        assert_eq!(recorder.request_stop(Instant::now()), StopDecision::NotRecording);
    }
}
