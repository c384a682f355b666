// SPDX-License-Identifier: MPL-2.0
//! Reusable UI components shared across the session widgets.
//!
//! # Components
//!
//! - [`error_display`] - Dismissible banner with severity colour, message,
//!   remediation hint and an optional action

pub mod error_display;
