// SPDX-License-Identifier: MPL-2.0
//! Four-corner calibration handshake types.

use std::fmt;
use std::str::FromStr;

/// Number of corners a calibration session walks through.
pub const CORNER_COUNT: usize = 4;

/// Calibration phase, in the order the backend walks through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CalibrationPhase {
    #[default]
    Ready,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Completed,
}

impl CalibrationPhase {
    pub const CORNERS: [CalibrationPhase; CORNER_COUNT] = [
        CalibrationPhase::TopLeft,
        CalibrationPhase::TopRight,
        CalibrationPhase::BottomLeft,
        CalibrationPhase::BottomRight,
    ];

    /// The following phase. `Completed` is terminal.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            CalibrationPhase::Ready => CalibrationPhase::TopLeft,
            CalibrationPhase::TopLeft => CalibrationPhase::TopRight,
            CalibrationPhase::TopRight => CalibrationPhase::BottomLeft,
            CalibrationPhase::BottomLeft => CalibrationPhase::BottomRight,
            CalibrationPhase::BottomRight | CalibrationPhase::Completed => {
                CalibrationPhase::Completed
            }
        }
    }

    /// Position among the four corners, `None` for `Ready` and `Completed`.
    #[must_use]
    pub fn corner_index(self) -> Option<usize> {
        match self {
            CalibrationPhase::TopLeft => Some(0),
            CalibrationPhase::TopRight => Some(1),
            CalibrationPhase::BottomLeft => Some(2),
            CalibrationPhase::BottomRight => Some(3),
            CalibrationPhase::Ready | CalibrationPhase::Completed => None,
        }
    }

    #[must_use]
    pub fn is_completed(self) -> bool {
        self == CalibrationPhase::Completed
    }

    /// Name used by the backend.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CalibrationPhase::Ready => "ready",
            CalibrationPhase::TopLeft => "top_left",
            CalibrationPhase::TopRight => "top_right",
            CalibrationPhase::BottomLeft => "bottom_left",
            CalibrationPhase::BottomRight => "bottom_right",
            CalibrationPhase::Completed => "completed",
        }
    }

    /// Localization key of the on-screen instruction for this phase.
    #[must_use]
    pub fn instruction_key(self) -> &'static str {
        match self {
            CalibrationPhase::Ready => "calibration-instruction-ready",
            CalibrationPhase::TopLeft => "calibration-instruction-top-left",
            CalibrationPhase::TopRight => "calibration-instruction-top-right",
            CalibrationPhase::BottomLeft => "calibration-instruction-bottom-left",
            CalibrationPhase::BottomRight => "calibration-instruction-bottom-right",
            CalibrationPhase::Completed => "calibration-instruction-completed",
        }
    }
}

impl fmt::Display for CalibrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPhase(pub String);

impl fmt::Display for UnknownPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown calibration phase: {}", self.0)
    }
}

impl FromStr for CalibrationPhase {
    type Err = UnknownPhase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ready" => Ok(CalibrationPhase::Ready),
            "top_left" => Ok(CalibrationPhase::TopLeft),
            "top_right" => Ok(CalibrationPhase::TopRight),
            "bottom_left" => Ok(CalibrationPhase::BottomLeft),
            "bottom_right" => Ok(CalibrationPhase::BottomRight),
            "completed" | "complete" => Ok(CalibrationPhase::Completed),
            other => Err(UnknownPhase(other.to_string())),
        }
    }
}

/// Aggregate session progress as reported by the status endpoint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CalibrationStatus {
    pub session_id: String,
    pub current_phase: CalibrationPhase,
    /// Points collected so far for each corner, in [`CalibrationPhase::CORNERS`] order.
    pub collected_points: [u32; CORNER_COUNT],
    /// Overall progress, 0.0 to 1.0.
    pub progress: f32,
    pub instructions: Option<String>,
    /// Raw session status (`in_progress`, `completed`, ...).
    pub status: String,
}

impl CalibrationStatus {
    /// Either the phase or the status field may announce completion.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.current_phase.is_completed() || self.status.eq_ignore_ascii_case("completed")
    }
}

/// Per-frame answer from the frame submission endpoint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameFeedback {
    pub status: String,
    pub current_phase: Option<CalibrationPhase>,
    pub face_detected: bool,
    pub message: Option<String>,
    pub progress: Option<f32>,
}

impl FrameFeedback {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.current_phase.is_some_and(CalibrationPhase::is_completed)
            || self.status.eq_ignore_ascii_case("completed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_in_corner_order() {
        let mut phase = CalibrationPhase::Ready;
        let mut visited = Vec::new();
        while !phase.is_completed() {
            phase = phase.next();
            visited.push(phase);
        }
        assert_eq!(
            visited,
            vec![
                CalibrationPhase::TopLeft,
                CalibrationPhase::TopRight,
                CalibrationPhase::BottomLeft,
                CalibrationPhase::BottomRight,
                CalibrationPhase::Completed,
            ]
        );
        assert_eq!(CalibrationPhase::Completed.next(), CalibrationPhase::Completed);
    }

    #[test]
    fn wire_names_round_trip() {
        for phase in [
            CalibrationPhase::Ready,
            CalibrationPhase::TopLeft,
            CalibrationPhase::TopRight,
            CalibrationPhase::BottomLeft,
            CalibrationPhase::BottomRight,
            CalibrationPhase::Completed,
        ] {
            assert_eq!(phase.as_str().parse::<CalibrationPhase>(), Ok(phase));
        }
        assert!("middle".parse::<CalibrationPhase>().is_err());
    }

    #[test]
    fn corner_index_matches_corners_table() {
        for (index, corner) in CalibrationPhase::CORNERS.iter().enumerate() {
            assert_eq!(corner.corner_index(), Some(index));
        }
        assert_eq!(CalibrationPhase::Ready.corner_index(), None);
    }

    #[test]
    fn status_completion_accepts_either_field() {
        let mut status = CalibrationStatus {
            status: "completed".into(),
            ..Default::default()
        };
        assert!(status.is_completed());

        status.status = "in_progress".into();
        assert!(!status.is_completed());
        status.current_phase = CalibrationPhase::Completed;
        assert!(status.is_completed());
    }
}
