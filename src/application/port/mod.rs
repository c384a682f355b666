// SPDX-License-Identifier: MPL-2.0
//! Port definitions (traits) for dependency inversion.
//!
//! Infrastructure adapters implement these traits; application services and
//! the UI only see domain types through them.
//!
//! # Available Ports
//!
//! - [`backend`]: The remote gaze-test API (calibration, upload, analysis,
//!   playback lookup)
//! - [`capture`]: Camera and microphone input
//!
//! # Design Notes
//!
//! - No Iced handles, `reqwest` or device types cross a port
//! - Device ports are blocking and live on the capture worker thread
//! - Backend methods return `Send` futures that callers wrap in Iced `Task`s

pub mod backend;
pub mod capture;

pub use backend::{
    AnalysisRequest, ApiError, GazeBackend, PlaybackInfo, UploadRequest, UploadTarget,
};
pub use capture::{CaptureSource, MicrophoneSource};
