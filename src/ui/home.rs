// SPDX-License-Identifier: MPL-2.0
//! Landing screen: start a session, replay a stored test, export diagnostics.

use crate::domain::session::SessionVariant;
use crate::i18n::fluent::I18n;
use crate::ui::components::error_display::{ErrorDisplay, ErrorSeverity};
use crate::ui::design_tokens::{palette, sizing, spacing, typography};
use crate::ui::styles::{button as button_styles, container as container_styles};
use iced::widget::{button, text_input, Column, Container, Row, Text};
use iced::{alignment, Element, Length};

/// Startup or background message shown above the start buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: ErrorSeverity,
    /// Already localized.
    pub message: String,
}

#[derive(Debug, Default)]
pub struct State {
    test_id: String,
}

pub struct ViewContext<'a> {
    pub i18n: &'a I18n,
    pub notice: Option<&'a Notice>,
    /// False when no backend client could be built; sessions cannot start.
    pub backend_ready: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Start(SessionVariant),
    TestIdChanged(String),
    PlayTest,
    ExportDiagnostics,
    DismissNotice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    None,
    StartSession(SessionVariant),
    PlayTest(String),
    ExportDiagnostics,
    DismissNotice,
}

impl State {
    #[must_use]
    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    pub fn update(&mut self, message: Message) -> Event {
        match message {
            Message::Start(variant) => Event::StartSession(variant),
            Message::TestIdChanged(value) => {
                self.test_id = value;
                Event::None
            }
            Message::PlayTest => {
                let test_id = self.test_id.trim();
                if test_id.is_empty() {
                    Event::None
                } else {
                    Event::PlayTest(test_id.to_string())
                }
            }
            Message::ExportDiagnostics => Event::ExportDiagnostics,
            Message::DismissNotice => Event::DismissNotice,
        }
    }

    pub fn view<'a>(&'a self, ctx: ViewContext<'a>) -> Element<'a, Message> {
        let i18n = ctx.i18n;
        let ready = ctx.backend_ready;

        let mut content = Column::new()
            .spacing(spacing::LG)
            .align_x(alignment::Horizontal::Center)
            .width(Length::Fixed(sizing::MODAL_WIDTH))
            .push(Text::new(i18n.tr("home-title")).size(typography::TITLE_LG))
            .push(
                Text::new(i18n.tr("home-subtitle"))
                    .size(typography::BODY)
                    .color(palette::GRAY_400),
            );

        if let Some(notice) = ctx.notice {
            content = content.push(
                ErrorDisplay::new(notice.severity)
                    .message(notice.message.clone())
                    .on_dismiss(Message::DismissNotice)
                    .view(),
            );
        }

        let starts = Row::new()
            .spacing(spacing::MD)
            .push(start_card(
                i18n,
                "home-gaze-title",
                "home-gaze-description",
                SessionVariant::GazeTest,
                ready,
            ))
            .push(start_card(
                i18n,
                "home-video-title",
                "home-video-description",
                SessionVariant::VideoOnly,
                ready,
            ));

        let can_play = ready && !self.test_id.trim().is_empty();
        let replay = Row::new()
            .spacing(spacing::SM)
            .align_y(alignment::Vertical::Center)
            .push(
                text_input(&i18n.tr("home-test-id-placeholder"), &self.test_id)
                    .on_input(Message::TestIdChanged)
                    .on_submit_maybe(can_play.then_some(Message::PlayTest))
                    .width(Length::Fill),
            )
            .push(
                button(Text::new(i18n.tr("home-play-test")))
                    .on_press_maybe(can_play.then_some(Message::PlayTest))
                    .style(button_styles::secondary),
            );

        content = content.push(starts).push(replay);

        if !ready {
            content = content.push(
                Text::new(i18n.tr("home-backend-unavailable"))
                    .size(typography::BODY_SM)
                    .color(palette::ERROR_500),
            );
        }

        content = content.push(
            button(Text::new(i18n.tr("home-export-diagnostics")).size(typography::BODY_SM))
                .on_press(Message::ExportDiagnostics)
                .style(button_styles::text_only),
        );

        Container::new(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .align_x(alignment::Horizontal::Center)
            .align_y(alignment::Vertical::Center)
            .padding(spacing::XL)
            .into()
    }
}

fn start_card<'a>(
    i18n: &I18n,
    title_key: &str,
    description_key: &str,
    variant: SessionVariant,
    ready: bool,
) -> Element<'a, Message> {
    let body = Column::new()
        .spacing(spacing::SM)
        .push(Text::new(i18n.tr(title_key)).size(typography::TITLE_MD))
        .push(
            Text::new(i18n.tr(description_key))
                .size(typography::BODY_SM)
                .color(palette::GRAY_400),
        )
        .push(
            button(Text::new(i18n.tr("home-start")))
                .on_press_maybe(ready.then_some(Message::Start(variant)))
                .style(button_styles::primary),
        );

    Container::new(body)
        .width(Length::FillPortion(1))
        .padding(spacing::MD)
        .style(container_styles::panel)
        .into()
}
