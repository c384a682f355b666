// SPDX-License-Identifier: MPL-2.0
//! Wire shapes of the backend API and their conversion to domain types.
//!
//! The backend is lenient about optional fields, so every optional field
//! defaults. Number encodings are fixed per endpoint: calibration progress
//! is a percentage (`0..=100`), analysis progress and the in-range ratio
//! are fractions (`0.0..=1.0`).

use crate::application::port::{ApiError, PlaybackInfo, UploadRequest, UploadTarget};
use crate::domain::calibration::{CalibrationPhase, CalibrationStatus, FrameFeedback, CORNER_COUNT};
use crate::domain::gaze::{AllowedRange, AnalysisPoll, GazeAnalysisResult, GazePoint};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Clamps a `0.0..=1.0` value; non-finite input reads as zero.
fn fraction(raw: f32) -> f32 {
    if raw.is_finite() {
        raw.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Converts a `0..=100` percentage to a fraction.
fn percent(raw: f32) -> f32 {
    fraction(raw / 100.0)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// =============================================================================
// Calibration
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct StartCalibrationResponse {
    #[serde(default)]
    pub session_id: Option<String>,
}

impl StartCalibrationResponse {
    pub fn into_session_id(self) -> Result<String, ApiError> {
        non_blank(self.session_id).ok_or(ApiError::MissingField("session_id"))
    }
}

#[derive(Debug, Deserialize)]
pub struct FrameFeedbackResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub current_phase: Option<String>,
    #[serde(default)]
    pub face_detected: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub progress: Option<f32>,
}

impl From<FrameFeedbackResponse> for FrameFeedback {
    fn from(dto: FrameFeedbackResponse) -> Self {
        Self {
            status: dto.status,
            current_phase: dto.current_phase.and_then(|p| p.parse().ok()),
            face_detected: dto.face_detected,
            message: non_blank(dto.message),
            progress: dto.progress.map(percent),
        }
    }
}

/// Per-corner counts arrive either keyed by phase name or as an array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CollectedPoints {
    ByCorner(HashMap<String, u32>),
    Ordered(Vec<u32>),
}

impl CollectedPoints {
    fn into_array(self) -> [u32; CORNER_COUNT] {
        let mut points = [0; CORNER_COUNT];
        match self {
            CollectedPoints::ByCorner(map) => {
                for (name, count) in map {
                    if let Some(index) = name
                        .parse::<CalibrationPhase>()
                        .ok()
                        .and_then(CalibrationPhase::corner_index)
                    {
                        points[index] = count;
                    }
                }
            }
            CollectedPoints::Ordered(list) => {
                for (slot, count) in points.iter_mut().zip(list) {
                    *slot = count;
                }
            }
        }
        points
    }
}

#[derive(Debug, Deserialize)]
pub struct CalibrationStatusResponse {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub current_phase: Option<String>,
    #[serde(default)]
    pub collected_points: Option<CollectedPoints>,
    #[serde(default)]
    pub progress: Option<f32>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub status: String,
}

impl CalibrationStatusResponse {
    /// `requested_id` fills in a missing `session_id`.
    pub fn into_status(self, requested_id: &str) -> CalibrationStatus {
        CalibrationStatus {
            session_id: non_blank(self.session_id).unwrap_or_else(|| requested_id.to_string()),
            current_phase: self
                .current_phase
                .and_then(|p| p.parse().ok())
                .unwrap_or_default(),
            collected_points: self
                .collected_points
                .map(CollectedPoints::into_array)
                .unwrap_or_default(),
            progress: self.progress.map(percent).unwrap_or_default(),
            instructions: non_blank(self.instructions),
            status: self.status,
        }
    }
}

// =============================================================================
// Upload
// =============================================================================

#[derive(Debug, Serialize)]
pub struct UploadUrlRequest<'a> {
    pub file_name: &'a str,
    pub file_type: &'a str,
    pub file_size: u64,
    pub content_type: &'a str,
}

impl<'a> From<&'a UploadRequest> for UploadUrlRequest<'a> {
    fn from(request: &'a UploadRequest) -> Self {
        Self {
            file_name: &request.file_name,
            file_type: &request.file_type,
            file_size: request.file_size,
            content_type: &request.content_type,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UploadUrlResponse {
    #[serde(default)]
    pub upload_url: Option<String>,
    #[serde(default)]
    pub media_id: Option<String>,
    #[serde(default)]
    pub test_id: Option<String>,
}

impl UploadUrlResponse {
    pub fn into_target(self) -> Result<UploadTarget, ApiError> {
        Ok(UploadTarget {
            upload_url: non_blank(self.upload_url).ok_or(ApiError::MissingField("upload_url"))?,
            media_id: non_blank(self.media_id).ok_or(ApiError::MissingField("media_id"))?,
            test_id: non_blank(self.test_id).ok_or(ApiError::MissingField("test_id"))?,
        })
    }
}

// =============================================================================
// Analysis
// =============================================================================

#[derive(Debug, Serialize)]
pub struct AnalyzeRequest<'a> {
    pub media_id: &'a str,
    pub test_id: &'a str,
    pub calibration_session_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub task_id: Option<String>,
}

impl AnalyzeResponse {
    pub fn into_task_id(self) -> Result<String, ApiError> {
        non_blank(self.task_id).ok_or(ApiError::MissingField("task_id"))
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PointDto {
    Pair([f32; 2]),
    Object { x: f32, y: f32 },
}

impl From<PointDto> for GazePoint {
    fn from(dto: PointDto) -> Self {
        match dto {
            PointDto::Pair([x, y]) | PointDto::Object { x, y } => GazePoint::new(x, y),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AllowedRangeDto {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GazeResultDto {
    pub gaze_score: f32,
    pub total_frames: u32,
    pub analyzed_frames: u32,
    pub in_range_frames: u32,
    pub in_range_ratio: f32,
    pub jitter_score: f32,
    pub stability_rating: String,
    pub feedback: String,
    pub gaze_points: Vec<PointDto>,
    pub allowed_range: Option<AllowedRangeDto>,
    /// Seconds.
    pub analysis_duration: f64,
}

impl From<GazeResultDto> for GazeAnalysisResult {
    fn from(dto: GazeResultDto) -> Self {
        let analysis_duration = if dto.analysis_duration.is_finite() && dto.analysis_duration > 0.0
        {
            Duration::from_secs_f64(dto.analysis_duration)
        } else {
            Duration::ZERO
        };
        Self {
            gaze_score: dto.gaze_score,
            total_frames: dto.total_frames,
            analyzed_frames: dto.analyzed_frames,
            in_range_frames: dto.in_range_frames,
            in_range_ratio: fraction(dto.in_range_ratio),
            jitter_score: dto.jitter_score,
            stability_rating: dto.stability_rating,
            feedback: dto.feedback,
            gaze_points: dto.gaze_points.into_iter().map(GazePoint::from).collect(),
            allowed_range: dto
                .allowed_range
                .map(|r| AllowedRange::new(r.min_x, r.max_x, r.min_y, r.max_y)),
            analysis_duration,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalysisStatusResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub progress: Option<f32>,
    #[serde(default)]
    pub result: Option<GazeResultDto>,
    #[serde(default)]
    pub error: Option<String>,
}

impl AnalysisStatusResponse {
    pub fn into_poll(self) -> Result<AnalysisPoll, ApiError> {
        match self.status.to_ascii_lowercase().as_str() {
            "completed" | "complete" | "success" => {
                let result = self.result.ok_or(ApiError::MissingField("result"))?;
                Ok(AnalysisPoll::Completed(Box::new(result.into())))
            }
            "failed" | "error" => Ok(AnalysisPoll::Failed(
                non_blank(self.error).unwrap_or_else(|| "analysis failed".to_string()),
            )),
            _ => Ok(AnalysisPoll::Pending {
                progress: self.progress.map(fraction),
            }),
        }
    }
}

// =============================================================================
// Playback
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct PlaybackResponse {
    #[serde(default, alias = "playback_url", alias = "video_url")]
    pub url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

impl PlaybackResponse {
    pub fn into_info(self) -> Result<PlaybackInfo, ApiError> {
        Ok(PlaybackInfo {
            url: non_blank(self.url).ok_or(ApiError::MissingField("url"))?,
            file_name: non_blank(self.file_name),
            content_type: non_blank(self.content_type),
            file_size: self.file_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_accepts_named_corner_counts() {
        let dto: CalibrationStatusResponse = serde_json::from_str(
            r#"{
                "current_phase": "top_right",
                "collected_points": {"top_left": 30, "top_right": 12},
                "progress": 35,
                "status": "in_progress"
            }"#,
        )
        .unwrap();
        let status = dto.into_status("abc123");
        assert_eq!(status.session_id, "abc123");
        assert_eq!(status.current_phase, CalibrationPhase::TopRight);
        assert_eq!(status.collected_points, [30, 12, 0, 0]);
        assert!((status.progress - 0.35).abs() < 1e-6);
    }

    #[test]
    fn calibration_progress_is_a_percentage() {
        let dto: CalibrationStatusResponse =
            serde_json::from_str(r#"{"progress": 1, "status": "in_progress"}"#).unwrap();
        assert!((dto.into_status("s").progress - 0.01).abs() < 1e-6);

        let dto: FrameFeedbackResponse =
            serde_json::from_str(r#"{"status": "ok", "progress": 250}"#).unwrap();
        assert_eq!(FrameFeedback::from(dto).progress, Some(1.0));
    }

    #[test]
    fn analysis_progress_is_a_fraction() {
        let dto: AnalysisStatusResponse =
            serde_json::from_str(r#"{"status": "processing", "progress": 1.0}"#).unwrap();
        assert_eq!(
            dto.into_poll(),
            Ok(AnalysisPoll::Pending {
                progress: Some(1.0)
            })
        );

        let dto: AnalysisStatusResponse =
            serde_json::from_str(r#"{"status": "processing", "progress": 40}"#).unwrap();
        assert_eq!(
            dto.into_poll(),
            Ok(AnalysisPoll::Pending {
                progress: Some(1.0)
            })
        );
    }

    #[test]
    fn status_accepts_ordered_corner_counts() {
        let dto: CalibrationStatusResponse =
            serde_json::from_str(r#"{"collected_points": [30, 30, 30, 30], "status": "completed"}"#)
                .unwrap();
        let status = dto.into_status("s");
        assert_eq!(status.collected_points, [30; 4]);
        assert!(status.is_completed());
    }

    #[test]
    fn frame_feedback_ignores_unknown_phase() {
        let dto: FrameFeedbackResponse = serde_json::from_str(
            r#"{"status": "ok", "current_phase": "somewhere", "face_detected": true}"#,
        )
        .unwrap();
        let feedback = FrameFeedback::from(dto);
        assert_eq!(feedback.current_phase, None);
        assert!(feedback.face_detected);
    }

    #[test]
    fn upload_target_requires_every_field() {
        let dto: UploadUrlResponse =
            serde_json::from_str(r#"{"upload_url": "https://s3/x", "media_id": "m"}"#).unwrap();
        assert_eq!(dto.into_target(), Err(ApiError::MissingField("test_id")));
    }

    #[test]
    fn completed_analysis_converts_points() {
        let dto: AnalysisStatusResponse = serde_json::from_str(
            r#"{
                "status": "completed",
                "result": {
                    "gaze_score": 92,
                    "gaze_points": [[0.1, 0.2], {"x": 0.5, "y": 0.6}],
                    "allowed_range": {"min_x": 0.8, "max_x": 0.2, "min_y": 0.1, "max_y": 0.9},
                    "analysis_duration": 1.5
                }
            }"#,
        )
        .unwrap();
        let AnalysisPoll::Completed(result) = dto.into_poll().unwrap() else {
            panic!("expected completed poll");
        };
        assert_eq!(result.gaze_points.len(), 2);
        assert_eq!(result.gaze_points[1], GazePoint::new(0.5, 0.6));
        let range = result.allowed_range.unwrap();
        assert!(range.min_x < range.max_x);
        assert_eq!(result.analysis_duration, Duration::from_millis(1500));
    }

    #[test]
    fn completed_analysis_without_result_is_an_error() {
        let dto: AnalysisStatusResponse = serde_json::from_str(r#"{"status": "completed"}"#).unwrap();
        assert_eq!(dto.into_poll(), Err(ApiError::MissingField("result")));
    }

    #[test]
    fn unknown_status_is_pending() {
        let dto: AnalysisStatusResponse =
            serde_json::from_str(r#"{"status": "processing", "progress": 0.4}"#).unwrap();
        assert_eq!(
            dto.into_poll(),
            Ok(AnalysisPoll::Pending {
                progress: Some(0.4)
            })
        );
    }

    #[test]
    fn playback_accepts_url_aliases() {
        let dto: PlaybackResponse =
            serde_json::from_str(r#"{"playback_url": "https://cdn/v.webm", "file_size": 10}"#)
                .unwrap();
        let info = dto.into_info().unwrap();
        assert_eq!(info.url, "https://cdn/v.webm");
        assert_eq!(info.file_size, Some(10));
    }
}
