// SPDX-License-Identifier: MPL-2.0
//! User interface components and state management.
//!
//! Every widget follows the Elm-style "state down, messages up" pattern: it
//! owns a `State`, consumes its own `Message` and reports an `Event` to its
//! parent, which decides what the event means for the session.
//!
//! # Screens
//!
//! - [`home`] - Landing screen with the session start buttons
//! - [`session_modal`] - Overlay that walks a session through its steps
//!
//! # Session widgets
//!
//! - [`calibration`] - Four-corner calibration with status polling
//! - [`recorder`] - Camera preview and the test recording
//! - [`uploader`] - Upload to storage with progress
//! - [`analysis`] - Analysis job submission and polling
//! - [`result`] - Score, metrics and the gaze trajectory plot
//! - [`player`] - Download and playback of a stored test video
//!
//! # Shared Infrastructure
//!
//! - [`progress_task`] - Background work reporting progress as messages
//! - [`components`] - Reusable UI components (error banner)
//! - [`widgets`] - Custom Iced widgets (progress ring, trajectory plot)
//! - [`styles`] - Centralized styling (buttons, containers)
//! - [`design_tokens`] - Design system constants (colors, spacing, sizing)
//! - [`theming`] - Light/Dark/System theme mode management

pub mod analysis;
pub mod calibration;
pub mod components;
pub mod design_tokens;
pub mod home;
pub mod player;
pub mod progress_task;
pub mod recorder;
pub mod result;
pub mod session_modal;
pub mod styles;
pub mod theming;
pub mod uploader;
pub mod widgets;
