// SPDX-License-Identifier: MPL-2.0
//! `iced_gaze` is a desktop client for webcam-based gaze tracking tests,
//! built with the Iced GUI framework.
//!
//! A session calibrates the gaze model against the user's face, records a
//! short clip, uploads it, waits for the server-side analysis and shows the
//! score with a trajectory plot. A video-only session plays the stored clip
//! back instead of analyzing it.

#![doc(html_root_url = "https://docs.rs/iced_gaze/0.1.0")]

pub mod app;
pub mod application;
pub mod config;
pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod i18n;
pub mod infrastructure;
pub mod media;
pub mod ui;
pub mod video_player;

#[cfg(test)]
mod test_utils;
