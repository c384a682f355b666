// SPDX-License-Identifier: MPL-2.0
//! Recording pipeline: frame encoding, container muxing and the recording
//! lifecycle.

pub mod avi;
pub mod jpeg;
pub mod recorder;

pub use recorder::{Recorder, RecorderState, StopDecision};
