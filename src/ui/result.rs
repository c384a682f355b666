// SPDX-License-Identifier: MPL-2.0
//! Result panel: score, tier, metrics, feedback and the trajectory plot.

use crate::domain::gaze::GazeAnalysisResult;
use crate::domain::trajectory::{PlotModel, PlotSize};
use crate::i18n::fluent::I18n;
use crate::ui::design_tokens::{palette, spacing, typography};
use crate::ui::styles::{button as button_styles, container as container_styles};
use crate::ui::widgets::TrajectoryPlot;
use iced::widget::canvas::Cache;
use iced::widget::{button, Column, Container, Row, Space, Text};
use iced::{alignment, Element, Length};

pub struct State {
    result: GazeAnalysisResult,
    plot: PlotModel,
    cache: Cache,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Retake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Retake,
}

impl State {
    #[must_use]
    pub fn new(result: GazeAnalysisResult) -> Self {
        let plot = PlotModel::build(&result, PlotSize::default());
        Self {
            result,
            plot,
            cache: Cache::default(),
        }
    }

    #[must_use]
    pub fn result(&self) -> &GazeAnalysisResult {
        &self.result
    }

    #[must_use]
    pub fn plot(&self) -> &PlotModel {
        &self.plot
    }

    pub fn handle_message(&mut self, message: Message) -> Event {
        match message {
            Message::Retake => Event::Retake,
        }
    }

    pub fn view<'a>(&'a self, i18n: &'a I18n) -> Element<'a, Message> {
        let result = &self.result;
        let tier = result.tier();

        let score = Row::new()
            .spacing(spacing::SM)
            .align_y(alignment::Vertical::Center)
            .push(Text::new(tier.emoji()).size(typography::DISPLAY))
            .push(Text::new(format!("{:.0}", result.gaze_score)).size(typography::DISPLAY))
            .push(
                Text::new("/ 100")
                    .size(typography::BODY)
                    .color(palette::GRAY_400),
            );

        let badge = Container::new(Text::new(i18n.tr(tier.i18n_key())).size(typography::BODY_SM))
            .padding([spacing::XXS, spacing::SM])
            .style(container_styles::tier_badge(tier));

        let analyzed = result.analyzed_frames.to_string();
        let total = result.total_frames.to_string();
        let in_range = format_percent(self.plot.in_range_ratio);
        let jitter = format!("{:.2}", result.jitter_score);
        let duration = format!("{:.1}", result.analysis_duration.as_secs_f32());

        let metrics = Column::new()
            .spacing(spacing::XS)
            .push(metric_row(
                i18n.tr("result-metric-frames"),
                i18n.tr_with_args(
                    "result-frames-value",
                    &[("analyzed", analyzed.as_str()), ("total", total.as_str())],
                ),
            ))
            .push(metric_row(i18n.tr("result-metric-in-range"), in_range))
            .push(metric_row(i18n.tr("result-metric-jitter"), jitter))
            .push(metric_row(
                i18n.tr("result-metric-stability"),
                if result.stability_rating.is_empty() {
                    "-".to_string()
                } else {
                    result.stability_rating.clone()
                },
            ))
            .push(metric_row(
                i18n.tr("result-metric-duration"),
                i18n.tr_with_args("result-seconds", &[("seconds", duration.as_str())]),
            ));

        let plot: Element<'a, Message> = if self.plot.is_empty() {
            Text::new(i18n.tr("result-no-points"))
                .color(palette::GRAY_400)
                .into()
        } else {
            TrajectoryPlot::new(&self.plot, &self.cache).into_element()
        };

        let mut content = Column::new()
            .spacing(spacing::MD)
            .align_x(alignment::Horizontal::Center)
            .width(Length::Fill)
            .push(score)
            .push(badge)
            .push(Container::new(metrics).width(Length::Fixed(320.0)));

        if !result.feedback.trim().is_empty() {
            content = content.push(
                Text::new(result.feedback.as_str())
                    .size(typography::BODY_SM)
                    .align_x(alignment::Horizontal::Center),
            );
        }

        content
            .push(plot)
            .push(
                button(Text::new(i18n.tr("result-retake")))
                    .on_press(Message::Retake)
                    .style(button_styles::secondary),
            )
            .into()
    }
}

fn metric_row<'a>(label: String, value: String) -> Element<'a, Message> {
    Row::new()
        .push(Text::new(label).color(palette::GRAY_400))
        .push(Space::new().width(Length::Fill))
        .push(Text::new(value))
        .into()
}

/// Ratio in `[0, 1]` as a whole percentage.
#[must_use]
pub fn format_percent(ratio: f32) -> String {
    format!("{:.0}%", (ratio.clamp(0.0, 1.0) * 100.0).round())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gaze::ScoreTier;

    #[test]
    fn high_score_lands_in_top_tier() {
        let state = State::new(GazeAnalysisResult {
            gaze_score: 92.0,
            ..GazeAnalysisResult::default()
        });
        assert_eq!(state.result().tier(), ScoreTier::Excellent);
        assert_eq!(state.result().tier().emoji(), "🌟");
    }

    #[test]
    fn empty_result_builds_empty_plot() {
        let state = State::new(GazeAnalysisResult::default());
        assert!(state.plot().is_empty());
    }

    #[test]
    fn retake_is_forwarded() {
        let mut state = State::new(GazeAnalysisResult::default());
        assert_eq!(state.handle_message(Message::Retake), Event::Retake);
    }

    #[test]
    fn percent_is_clamped_and_rounded() {
        assert_eq!(format_percent(0.456), "46%");
        assert_eq!(format_percent(1.7), "100%");
        assert_eq!(format_percent(-0.2), "0%");
    }
}
