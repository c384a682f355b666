// SPDX-License-Identifier: MPL-2.0
//! Screen enumeration for application navigation.

/// Screens the user can navigate between. The session modal is an overlay on
/// [`Screen::Home`], not a screen of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Home,
    /// Standalone player for a stored test, opened by id.
    Playback,
}
