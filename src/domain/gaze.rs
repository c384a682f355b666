// SPDX-License-Identifier: MPL-2.0
//! Gaze analysis results and score tiers.

use std::time::Duration;

/// Estimated screen-relative gaze location.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GazePoint {
    pub x: f32,
    pub y: f32,
}

impl GazePoint {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Rectangle derived from calibration. Points inside it count as in range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllowedRange {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl AllowedRange {
    /// Builds a range, swapping bounds that arrive inverted.
    #[must_use]
    pub fn new(min_x: f32, max_x: f32, min_y: f32, max_y: f32) -> Self {
        Self {
            min_x: min_x.min(max_x),
            max_x: min_x.max(max_x),
            min_y: min_y.min(max_y),
            max_y: min_y.max(max_y),
        }
    }

    /// Inclusive on all edges.
    #[must_use]
    pub fn contains(&self, point: GazePoint) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// Completed analysis as returned by the backend.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GazeAnalysisResult {
    /// Score from 0 to 100.
    pub gaze_score: f32,
    pub total_frames: u32,
    pub analyzed_frames: u32,
    pub in_range_frames: u32,
    /// Server-computed ratio, 0.0 to 1.0.
    pub in_range_ratio: f32,
    pub jitter_score: f32,
    pub stability_rating: String,
    pub feedback: String,
    pub gaze_points: Vec<GazePoint>,
    pub allowed_range: Option<AllowedRange>,
    pub analysis_duration: Duration,
}

impl GazeAnalysisResult {
    #[must_use]
    pub fn tier(&self) -> ScoreTier {
        ScoreTier::from_score(self.gaze_score)
    }
}

/// Presentation tier of a gaze score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreTier {
    Excellent,
    Good,
    Fair,
    NeedsWork,
}

impl ScoreTier {
    #[must_use]
    pub fn from_score(score: f32) -> Self {
        if score >= 90.0 {
            ScoreTier::Excellent
        } else if score >= 75.0 {
            ScoreTier::Good
        } else if score >= 60.0 {
            ScoreTier::Fair
        } else {
            ScoreTier::NeedsWork
        }
    }

    #[must_use]
    pub fn emoji(self) -> &'static str {
        match self {
            ScoreTier::Excellent => "🌟",
            ScoreTier::Good => "👍",
            ScoreTier::Fair => "🙂",
            ScoreTier::NeedsWork => "⚠️",
        }
    }

    #[must_use]
    pub fn i18n_key(self) -> &'static str {
        match self {
            ScoreTier::Excellent => "result-tier-excellent",
            ScoreTier::Good => "result-tier-good",
            ScoreTier::Fair => "result-tier-fair",
            ScoreTier::NeedsWork => "result-tier-needs-work",
        }
    }

    #[must_use]
    pub fn is_lowest(self) -> bool {
        self == ScoreTier::NeedsWork
    }
}

/// One answer of the analysis status endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisPoll {
    /// Still queued or running. Progress is 0.0 to 1.0 when reported.
    Pending { progress: Option<f32> },
    Completed(Box<GazeAnalysisResult>),
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_thresholds() {
        assert_eq!(ScoreTier::from_score(100.0), ScoreTier::Excellent);
        assert_eq!(ScoreTier::from_score(92.0), ScoreTier::Excellent);
        assert_eq!(ScoreTier::from_score(90.0), ScoreTier::Excellent);
        assert_eq!(ScoreTier::from_score(89.9), ScoreTier::Good);
        assert_eq!(ScoreTier::from_score(75.0), ScoreTier::Good);
        assert_eq!(ScoreTier::from_score(60.0), ScoreTier::Fair);
        assert_eq!(ScoreTier::from_score(59.9), ScoreTier::NeedsWork);
        assert_eq!(ScoreTier::from_score(40.0), ScoreTier::NeedsWork);
    }

    #[test]
    fn score_92_renders_star_and_40_the_lowest_tier() {
        let high = GazeAnalysisResult {
            gaze_score: 92.0,
            ..Default::default()
        };
        assert_eq!(high.tier().emoji(), "🌟");

        let low = GazeAnalysisResult {
            gaze_score: 40.0,
            ..Default::default()
        };
        assert!(low.tier().is_lowest());
    }

    #[test]
    fn allowed_range_contains_is_inclusive() {
        let range = AllowedRange::new(0.2, 0.8, 0.1, 0.9);
        assert!(range.contains(GazePoint::new(0.2, 0.1)));
        assert!(range.contains(GazePoint::new(0.8, 0.9)));
        assert!(!range.contains(GazePoint::new(0.81, 0.5)));
    }

    #[test]
    fn inverted_bounds_are_swapped() {
        let range = AllowedRange::new(0.8, 0.2, 0.9, 0.1);
        assert_eq!(range.min_x, 0.2);
        assert_eq!(range.max_y, 0.9);
        assert!((range.width() - 0.6).abs() < 1e-6);
    }
}
