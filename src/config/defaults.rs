// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! # Categories
//!
//! - **Backend**: API base URL and request timeout
//! - **Calibration**: Status poll and frame capture cadence
//! - **Recording**: Duration bounds and capture settings
//! - **Upload**: Minimum payload size
//! - **Analysis**: Result polling cadence and budget

// ==========================================================================
// Backend Defaults
// ==========================================================================

/// Default base URL of the gaze backend API.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Default per-request timeout (in seconds). Does not apply to the object
/// store transfer, which can legitimately take longer.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const MIN_REQUEST_TIMEOUT_SECS: u64 = 1;
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

// ==========================================================================
// Calibration Defaults
// ==========================================================================

/// Default interval between calibration status polls (in milliseconds).
pub const DEFAULT_STATUS_POLL_INTERVAL_MS: u64 = 1000;

/// Default interval between captured calibration frames (in milliseconds).
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 200;

/// Synthetic frames submitted per corner when calibrating in test mode.
pub const DEFAULT_SIMULATED_FRAMES_PER_CORNER: u32 = 30;

/// Lower bound for both calibration intervals.
pub const MIN_CALIBRATION_INTERVAL_MS: u64 = 50;

/// Upper bound for both calibration intervals.
pub const MAX_CALIBRATION_INTERVAL_MS: u64 = 10_000;

// ==========================================================================
// Recording Defaults
// ==========================================================================

/// Minimum recording duration (in seconds). Stopping earlier is ignored.
pub const DEFAULT_MIN_RECORDING_DURATION_SECS: u64 = 3;

/// How long the recorder may take to become active after a start request
/// (in milliseconds).
pub const DEFAULT_START_GRACE_MS: u64 = 1500;

/// Capture frame rate for recordings.
pub const DEFAULT_FRAME_RATE: u32 = 15;

pub const MIN_FRAME_RATE: u32 = 1;
pub const MAX_FRAME_RATE: u32 = 60;

/// Index of the camera opened when capture is compiled in.
pub const DEFAULT_CAMERA_INDEX: u32 = 0;

/// Width of recorded and previewed frames.
pub const CAPTURE_WIDTH: u32 = 640;

/// Height of recorded and previewed frames.
pub const CAPTURE_HEIGHT: u32 = 480;

/// JPEG quality for recorded frames (1-100).
pub const RECORDING_JPEG_QUALITY: u8 = 80;

/// JPEG quality for calibration frames sent to the backend (1-100).
pub const CALIBRATION_JPEG_QUALITY: u8 = 70;

// ==========================================================================
// Upload Defaults
// ==========================================================================

/// Payloads below this size are rejected before contacting the backend.
pub const DEFAULT_MIN_FILE_SIZE_BYTES: u64 = 1024;

// ==========================================================================
// Analysis Defaults
// ==========================================================================

/// Default interval between analysis result polls (in milliseconds).
pub const DEFAULT_ANALYSIS_POLL_INTERVAL_MS: u64 = 2000;

/// Default number of result polls before giving up.
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 90;

pub const MIN_MAX_POLL_ATTEMPTS: u32 = 1;
pub const MAX_MAX_POLL_ATTEMPTS: u32 = 1000;

// ==========================================================================
// Compile-time Validation
// ==========================================================================

const _: () = {
    // Backend
    assert!(MIN_REQUEST_TIMEOUT_SECS > 0);
    assert!(DEFAULT_REQUEST_TIMEOUT_SECS >= MIN_REQUEST_TIMEOUT_SECS);
    assert!(DEFAULT_REQUEST_TIMEOUT_SECS <= MAX_REQUEST_TIMEOUT_SECS);

    // Calibration cadence
    assert!(MIN_CALIBRATION_INTERVAL_MS > 0);
    assert!(DEFAULT_STATUS_POLL_INTERVAL_MS >= MIN_CALIBRATION_INTERVAL_MS);
    assert!(DEFAULT_STATUS_POLL_INTERVAL_MS <= MAX_CALIBRATION_INTERVAL_MS);
    assert!(DEFAULT_FRAME_INTERVAL_MS >= MIN_CALIBRATION_INTERVAL_MS);
    assert!(DEFAULT_FRAME_INTERVAL_MS <= MAX_CALIBRATION_INTERVAL_MS);
    // Frames must be sent faster than the status is polled
    assert!(DEFAULT_FRAME_INTERVAL_MS < DEFAULT_STATUS_POLL_INTERVAL_MS);
    assert!(DEFAULT_SIMULATED_FRAMES_PER_CORNER > 0);

    // Recording
    assert!(DEFAULT_MIN_RECORDING_DURATION_SECS > 0);
    assert!(DEFAULT_START_GRACE_MS > 0);
    assert!(DEFAULT_FRAME_RATE >= MIN_FRAME_RATE);
    assert!(DEFAULT_FRAME_RATE <= MAX_FRAME_RATE);
    assert!(CAPTURE_WIDTH > 0 && CAPTURE_HEIGHT > 0);
    assert!(RECORDING_JPEG_QUALITY > 0 && RECORDING_JPEG_QUALITY <= 100);
    assert!(CALIBRATION_JPEG_QUALITY > 0 && CALIBRATION_JPEG_QUALITY <= 100);

    // Analysis
    assert!(DEFAULT_ANALYSIS_POLL_INTERVAL_MS > 0);
    assert!(DEFAULT_MAX_POLL_ATTEMPTS >= MIN_MAX_POLL_ATTEMPTS);
    assert!(DEFAULT_MAX_POLL_ATTEMPTS <= MAX_MAX_POLL_ATTEMPTS);
};
