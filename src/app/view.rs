// SPDX-License-Identifier: MPL-2.0
//! View rendering for the application.
//!
//! The home screen stays underneath the session modal, which is stacked on
//! top while a session is open.

use super::{Message, Screen};
use crate::i18n::fluent::I18n;
use crate::infrastructure::http::HttpBackend;
use crate::ui::components::error_display::ErrorDisplay;
use crate::ui::design_tokens::{sizing, spacing, typography};
use crate::ui::home::{self, Notice};
use crate::ui::styles::{button as button_styles, container as container_styles};
use crate::ui::{player, session_modal};
use iced::widget::{button, Column, Container, Stack, Text};
use iced::{alignment, Element, Length};

/// Context required to render the application view.
pub struct ViewContext<'a> {
    pub i18n: &'a I18n,
    pub screen: Screen,
    pub home: &'a home::State,
    pub session: Option<&'a session_modal::State<HttpBackend>>,
    pub playback: Option<&'a player::State>,
    pub notice: Option<&'a Notice>,
    pub backend_ready: bool,
}

/// Renders the current application view based on the active screen.
pub fn view(ctx: ViewContext<'_>) -> Element<'_, Message> {
    let current_view: Element<'_, Message> = match (ctx.screen, ctx.playback) {
        (Screen::Playback, Some(player)) => view_playback(player, ctx.i18n, ctx.notice),
        _ => view_home(&ctx),
    };

    let base = Container::new(current_view)
        .width(Length::Fill)
        .height(Length::Fill);

    match ctx.session {
        Some(session) => Stack::new()
            .push(base)
            .push(session.view(ctx.i18n).map(Message::Session))
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
        None => base.into(),
    }
}

fn view_home<'a>(ctx: &ViewContext<'a>) -> Element<'a, Message> {
    ctx.home
        .view(home::ViewContext {
            i18n: ctx.i18n,
            notice: ctx.notice,
            backend_ready: ctx.backend_ready,
        })
        .map(Message::Home)
}

fn view_playback<'a>(
    player: &'a player::State,
    i18n: &'a I18n,
    notice: Option<&'a Notice>,
) -> Element<'a, Message> {
    let back = button(Text::new(format!("← {}", i18n.tr("playback-back"))).size(typography::BODY))
        .on_press(Message::BackToHome)
        .style(button_styles::text_only);

    let mut content = Column::new()
        .spacing(spacing::MD)
        .width(Length::Fixed(sizing::MODAL_WIDTH))
        .push(back);

    if let Some(notice) = notice {
        content = content.push(
            ErrorDisplay::new(notice.severity)
                .message(notice.message.clone())
                .view(),
        );
    }

    let card = Container::new(content.push(player.view(i18n).map(Message::Playback)))
        .padding(spacing::LG)
        .style(container_styles::panel);

    Container::new(card)
        .width(Length::Fill)
        .height(Length::Fill)
        .align_x(alignment::Horizontal::Center)
        .align_y(alignment::Vertical::Center)
        .into()
}
