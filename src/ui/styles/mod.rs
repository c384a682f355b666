// SPDX-License-Identifier: MPL-2.0
//! Shared styles for the session modal and its widgets.

pub mod button;
pub mod container;
