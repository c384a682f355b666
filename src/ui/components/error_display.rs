// SPDX-License-Identifier: MPL-2.0
//! Banner for errors, warnings and notices.
//!
//! The session modal shows at most one of these above the mounted widget.
//! It never changes the step; dismissing it only clears the message.
//!
//! # Usage
//!
//! ```ignore
//! use crate::ui::components::error_display::{ErrorDisplay, ErrorSeverity};
//!
//! ErrorDisplay::new(ErrorSeverity::Error)
//!     .message(i18n.tr("error-network"))
//!     .hint(i18n.tr("error-hint-network"))
//!     .action(i18n.tr("session-retry"), Message::Retry)
//!     .on_dismiss(Message::DismissError)
//!     .view()
//! ```

use crate::ui::design_tokens::{palette, spacing, typography};
use crate::ui::styles::{button as button_styles, container as container_styles};
use iced::widget::{button, Column, Container, Row, Text};
use iced::{alignment, Color, Element, Length};

/// Severity level determines the colour and the leading glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorSeverity {
    /// Blocks the step until retried (red)
    #[default]
    Error,
    /// Degraded but usable, e.g. the simulated camera took over (orange)
    Warning,
    /// Informational (blue)
    Info,
}

impl ErrorSeverity {
    pub fn color(&self) -> Color {
        match self {
            ErrorSeverity::Error => palette::ERROR_500,
            ErrorSeverity::Warning => palette::WARNING_500,
            ErrorSeverity::Info => palette::INFO_500,
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            ErrorSeverity::Error => "⛔",
            ErrorSeverity::Warning => "⚠",
            ErrorSeverity::Info => "ℹ",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ErrorDisplay<Message> {
    severity: ErrorSeverity,
    message: Option<String>,
    hint: Option<String>,
    action_label: Option<String>,
    action_message: Option<Message>,
    dismiss_message: Option<Message>,
}

impl<Message> Default for ErrorDisplay<Message> {
    fn default() -> Self {
        Self {
            severity: ErrorSeverity::default(),
            message: None,
            hint: None,
            action_label: None,
            action_message: None,
            dismiss_message: None,
        }
    }
}

impl<Message: Clone + 'static> ErrorDisplay<Message> {
    pub fn new(severity: ErrorSeverity) -> Self {
        Self {
            severity,
            ..Self::default()
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Remediation text shown under the message.
    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn action(mut self, label: impl Into<String>, message: Message) -> Self {
        self.action_label = Some(label.into());
        self.action_message = Some(message);
        self
    }

    /// Adds the close cross.
    pub fn on_dismiss(mut self, message: Message) -> Self {
        self.dismiss_message = Some(message);
        self
    }

    pub fn view(self) -> Element<'static, Message> {
        let mut texts = Column::new().spacing(spacing::XXS).width(Length::Fill);
        if let Some(message) = self.message {
            texts = texts.push(Text::new(message).size(typography::BODY));
        }
        if let Some(hint) = self.hint {
            texts = texts.push(Text::new(hint).size(typography::BODY_SM));
        }

        let mut row = Row::new()
            .spacing(spacing::SM)
            .align_y(alignment::Vertical::Center)
            .push(Text::new(self.severity.glyph()).size(typography::TITLE_MD))
            .push(texts);

        if let (Some(label), Some(msg)) = (self.action_label, self.action_message) {
            row = row.push(
                button(Text::new(label).size(typography::BODY_SM))
                    .on_press(msg)
                    .style(button_styles::secondary),
            );
        }

        if let Some(dismiss) = self.dismiss_message {
            row = row.push(
                button(Text::new("✕").size(typography::BODY))
                    .on_press(dismiss)
                    .style(button_styles::text_only),
            );
        }

        Container::new(row)
            .width(Length::Fill)
            .padding(spacing::SM)
            .style(container_styles::banner(self.severity.color()))
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    enum TestMessage {
        Retry,
        Dismiss,
    }

    #[test]
    fn severities_have_distinct_colours() {
        assert_ne!(ErrorSeverity::Error.color(), ErrorSeverity::Warning.color());
        assert_ne!(ErrorSeverity::Warning.color(), ErrorSeverity::Info.color());
    }

    #[test]
    fn builder_keeps_every_part() {
        let banner = ErrorDisplay::new(ErrorSeverity::Warning)
            .message("Camera unavailable")
            .hint("Test mode is active")
            .action("Retry", TestMessage::Retry)
            .on_dismiss(TestMessage::Dismiss);

        assert_eq!(banner.severity, ErrorSeverity::Warning);
        assert_eq!(banner.message.as_deref(), Some("Camera unavailable"));
        assert_eq!(banner.hint.as_deref(), Some("Test mode is active"));
        assert_eq!(banner.action_label.as_deref(), Some("Retry"));
        assert!(matches!(banner.dismiss_message, Some(TestMessage::Dismiss)));

        let _element: Element<'static, TestMessage> = banner.view();
    }
}
