// SPDX-License-Identifier: MPL-2.0
//! End-to-end flows through the public API with a scripted backend.

mod common;

use common::ScriptedBackend;
use iced_gaze::application::calibration::{self, CalibrationRun, FrameOutcome};
use iced_gaze::application::port::ApiError;
use iced_gaze::application::upload::{upload_recording, UploadMilestone};
use iced_gaze::domain::calibration::CalibrationPhase;
use iced_gaze::domain::gaze::{GazeAnalysisResult, ScoreTier};
use iced_gaze::domain::media::{ContentType, RecordedMedia};
use iced_gaze::domain::session::{SessionState, SessionStep, SessionVariant};
use iced_gaze::ui::design_tokens::gaze;
use iced_gaze::ui::result;
use iced_gaze::ui::styles::container::tier_color;
use std::time::{Duration, SystemTime};

const FRAMES_PER_CORNER: u32 = 30;

#[tokio::test]
async fn simulated_calibration_completes_exactly_once() {
    let backend = ScriptedBackend::new("abc123");
    let session_id = calibration::start_session(&backend)
        .await
        .expect("session should open");
    assert_eq!(session_id, "abc123");

    let mut run = CalibrationRun::new(session_id, Some(FRAMES_PER_CORNER));
    assert!(run.is_simulated());
    // The frame loop stays idle in simulated mode.
    assert!(!run.begin_frame_submission());

    let mut completions = Vec::new();
    for _ in 0..(FRAMES_PER_CORNER * 4 + 10) {
        if let Some(id) = run.simulate_tick() {
            completions.push(id);
        }
    }

    assert_eq!(completions, vec!["abc123".to_string()]);
    assert_eq!(run.phase(), CalibrationPhase::Completed);
    assert_eq!(run.collected_points(), [FRAMES_PER_CORNER; 4]);
    assert!(!run.is_active());
}

#[tokio::test]
async fn failed_frames_do_not_stop_a_live_calibration() {
    let backend = ScriptedBackend::new("abc123");
    let mut run = CalibrationRun::new("abc123", None);

    for _ in 0..3 {
        assert!(run.begin_frame_submission());
        let (session, result) =
            calibration::submit_frame(backend.clone(), "abc123".into(), vec![0xFF, 0xD8]).await;
        assert!(matches!(
            run.apply_frame_result(&session, result),
            FrameOutcome::Swallowed(ApiError::Transport(_))
        ));
    }
    assert_eq!(run.swallowed_failures(), 3);
    assert!(run.is_active());

    let (session, status) = calibration::poll_status(backend.clone(), "abc123".into()).await;
    let status = status.expect("status should answer");
    assert_eq!(run.apply_status(&session, &status), None);
    assert!(run.is_active());
}

#[tokio::test]
async fn webm_upload_uses_the_normalized_content_type() {
    let backend = ScriptedBackend::new("abc123");
    let media = RecordedMedia::new(
        vec![0u8; 2 * 1024 * 1024],
        ContentType::new("video/webm;codecs=vp9"),
        Duration::from_secs(8),
        SystemTime::now(),
    );

    let mut milestones = Vec::new();
    let outcome = upload_recording(&backend, &media, 1024, |m| milestones.push(m))
        .await
        .expect("upload should succeed");

    assert_eq!(outcome.media_id, "media-42");
    assert_eq!(outcome.test_id, "test-42");
    assert_eq!(outcome.completion_notice, Ok(()));
    assert_eq!(
        milestones,
        vec![
            UploadMilestone::Validated,
            UploadMilestone::TargetIssued,
            UploadMilestone::Stored,
            UploadMilestone::Finished,
        ]
    );

    let log = backend.log();
    assert_eq!(
        log.calls,
        vec!["request_upload_target", "put_object", "complete_upload"]
    );
    assert_eq!(log.upload_requests[0].content_type, "video/webm");
    assert_eq!(log.upload_requests[0].file_size, 2 * 1024 * 1024);
    assert_eq!(log.put_urls, vec!["https://store.example/put?sig=1".to_string()]);
    assert_eq!(log.put_content_types, vec!["video/webm".to_string()]);
    assert_eq!(log.put_sizes, vec![2 * 1024 * 1024]);
    assert_eq!(log.completed_media, vec![("media-42".to_string(), 2 * 1024 * 1024)]);
}

#[test]
fn score_tiers_drive_the_result_styling() {
    let top = result::State::new(GazeAnalysisResult {
        gaze_score: 92.0,
        ..GazeAnalysisResult::default()
    });
    assert_eq!(top.result().tier(), ScoreTier::Excellent);
    assert_eq!(top.result().tier().emoji(), "🌟");
    assert_eq!(tier_color(ScoreTier::Excellent), gaze::TIER_EXCELLENT);

    let low = result::State::new(GazeAnalysisResult {
        gaze_score: 40.0,
        ..GazeAnalysisResult::default()
    });
    assert_eq!(low.result().tier(), ScoreTier::NeedsWork);
    assert_eq!(tier_color(ScoreTier::NeedsWork), gaze::TIER_NEEDS_WORK);
}

#[test]
fn going_back_to_recording_clears_later_steps() {
    let mut session = SessionState::new(SessionVariant::GazeTest);
    session.start_calibration("abc123").expect("calibration step");
    session.complete_calibration("abc123").expect("calibration done");
    session
        .finish_recording(RecordedMedia::new(
            vec![1u8; 4096],
            ContentType::new("video/x-msvideo"),
            Duration::from_secs(6),
            SystemTime::now(),
        ))
        .expect("recording done");
    session.finish_upload("media-42", "test-42").expect("upload done");
    session.start_analysis("task-1").expect("analysis queued");
    session
        .finish_analysis(GazeAnalysisResult {
            gaze_score: 70.0,
            ..GazeAnalysisResult::default()
        })
        .expect("analysis done");
    assert_eq!(session.step, SessionStep::Result);

    session.go_back(SessionStep::Record).expect("record is earlier");

    assert_eq!(session.step, SessionStep::Record);
    assert!(session.recorded_media.is_none());
    assert!(session.media_id.is_none());
    assert!(session.test_id.is_none());
    assert!(session.analysis_task_id.is_none());
    assert!(session.gaze_result.is_none());
    assert_eq!(session.calibration_session_id.as_deref(), Some("abc123"));
}
