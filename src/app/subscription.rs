// SPDX-License-Identifier: MPL-2.0
//! Event subscriptions for the application.
//!
//! Native events only matter for the close request; everything else comes
//! from the session modal, the standalone player and the diagnostics tick.

use super::{Message, Screen};
use crate::infrastructure::http::HttpBackend;
use crate::ui::{player, session_modal};
use iced::{event, time, Subscription};
use std::time::Duration;

/// How often queued diagnostics are moved into the ring buffer.
const DIAGNOSTICS_TICK: Duration = Duration::from_secs(1);

/// Routes window close requests so capture and state are cleaned up first.
pub fn create_event_subscription() -> Subscription<Message> {
    event::listen_with(|event, _status, window_id| {
        if let event::Event::Window(iced::window::Event::CloseRequested) = event {
            Some(Message::WindowCloseRequested(window_id))
        } else {
            None
        }
    })
}

/// Drains the diagnostics channel while something is producing events.
pub fn create_diagnostics_subscription(active: bool) -> Subscription<Message> {
    if active {
        time::every(DIAGNOSTICS_TICK).map(|_| Message::DiagnosticsTick)
    } else {
        Subscription::none()
    }
}

pub fn create_session_subscription(
    session: Option<&session_modal::State<HttpBackend>>,
) -> Subscription<Message> {
    session.map_or_else(Subscription::none, |session| {
        session.subscription().map(Message::Session)
    })
}

pub fn create_playback_subscription(
    screen: Screen,
    playback: Option<&player::State>,
) -> Subscription<Message> {
    match (screen, playback) {
        (Screen::Playback, Some(player)) => player.subscription().map(Message::Playback),
        _ => Subscription::none(),
    }
}
