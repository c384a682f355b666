// SPDX-License-Identifier: MPL-2.0
//! Container styles.

use crate::domain::gaze::ScoreTier;
use crate::ui::design_tokens::{gaze, opacity, palette, radius, shadow};
use iced::widget::container;
use iced::{Background, Border, Color, Theme};

/// Generic panel surface used for the modal body and the home card.
///
/// The color is derived from the active Iced `Theme` background, with a slight
/// opacity, so panels stay readable in both light and dark modes without
/// hard-coding colors.
pub fn panel(theme: &Theme) -> container::Style {
    let palette = theme.extended_palette();
    let base = palette.background.base.color;

    container::Style {
        background: Some(Background::Color(Color::from_rgba(
            base.r,
            base.g,
            base.b,
            opacity::SURFACE,
        ))),
        border: Border {
            radius: radius::LG.into(),
            ..Default::default()
        },
        shadow: shadow::LG,
        ..Default::default()
    }
}

/// Dimmed layer behind the session modal.
pub fn backdrop(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(Color {
            a: opacity::OVERLAY_MEDIUM,
            ..palette::BLACK
        })),
        ..Default::default()
    }
}

/// Coloured strip with white text for banners and notices.
pub fn banner(accent: Color) -> impl Fn(&Theme) -> container::Style {
    move |_theme: &Theme| container::Style {
        background: Some(Background::Color(accent)),
        text_color: Some(palette::WHITE),
        border: Border {
            radius: radius::MD.into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[must_use]
pub fn tier_color(tier: ScoreTier) -> Color {
    match tier {
        ScoreTier::Excellent => gaze::TIER_EXCELLENT,
        ScoreTier::Good => gaze::TIER_GOOD,
        ScoreTier::Fair => gaze::TIER_FAIR,
        ScoreTier::NeedsWork => gaze::TIER_NEEDS_WORK,
    }
}

/// Pill behind the score tier label.
pub fn tier_badge(tier: ScoreTier) -> impl Fn(&Theme) -> container::Style {
    let accent = tier_color(tier);
    move |_theme: &Theme| container::Style {
        background: Some(Background::Color(Color {
            a: opacity::OVERLAY_SUBTLE,
            ..accent
        })),
        text_color: Some(accent),
        border: Border {
            color: accent,
            width: 1.0,
            radius: radius::FULL.into(),
        },
        ..Default::default()
    }
}

/// Black box the camera preview and the video are letterboxed in.
pub fn media_frame(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(palette::BLACK)),
        border: Border {
            radius: radius::MD.into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_tier_has_its_own_colour() {
        let colours = [
            tier_color(ScoreTier::Excellent),
            tier_color(ScoreTier::Good),
            tier_color(ScoreTier::Fair),
            tier_color(ScoreTier::NeedsWork),
        ];
        for (i, a) in colours.iter().enumerate() {
            for b in &colours[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn banner_uses_accent_background() {
        let style = banner(palette::ERROR_500)(&Theme::Dark);
        assert_eq!(
            style.background,
            Some(Background::Color(palette::ERROR_500))
        );
    }
}
