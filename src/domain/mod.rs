// SPDX-License-Identifier: MPL-2.0
//! Domain layer - Core test-session logic with ZERO external dependencies.
//!
//! Pure value types and state machines. Nothing here touches the network,
//! devices or Iced, so every rule can be tested without a runtime.
//!
//! # Modules
//!
//! - [`calibration`]: Corner phases and backend progress
//!   ([`CalibrationPhase`](calibration::CalibrationPhase))
//! - [`frame`]: Raw frames and PCM layout ([`RawFrame`](frame::RawFrame))
//! - [`gaze`]: Analysis results and score tiers
//!   ([`ScoreTier`](gaze::ScoreTier))
//! - [`media`]: Recorded payloads ([`RecordedMedia`](media::RecordedMedia))
//! - [`session`]: The step state machine ([`SessionState`](session::SessionState))
//! - [`trajectory`]: Gaze plot geometry ([`PlotModel`](trajectory::PlotModel))

pub mod calibration;
pub mod frame;
pub mod gaze;
pub mod media;
pub mod session;
pub mod trajectory;
