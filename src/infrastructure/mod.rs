// SPDX-License-Identifier: MPL-2.0
//! Infrastructure layer adapters.
//!
//! Concrete implementations of the port traits defined in
//! `application::port`.
//!
//! # Available Adapters
//!
//! - [`http`]: The gaze-test REST API over `reqwest` (implements [`GazeBackend`])
//! - [`capture`]: Camera, microphone and the simulated camera, plus the
//!   capture worker (implement [`CaptureSource`] / [`MicrophoneSource`])
//!
//! [`GazeBackend`]: crate::application::port::GazeBackend
//! [`CaptureSource`]: crate::application::port::CaptureSource
//! [`MicrophoneSource`]: crate::application::port::MicrophoneSource

pub mod capture;
pub mod http;

pub use http::HttpBackend;
