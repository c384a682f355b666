// SPDX-License-Identifier: MPL-2.0
//! Gaze trajectory canvas.
//!
//! Paints a precomputed [`PlotModel`]: the allowed range, a faint line in
//! temporal order, one dot per gaze point and the start/end markers. The
//! geometry is cached by the owner and cleared when a new result arrives.

use crate::domain::trajectory::{PlotModel, PlottedPoint};
use crate::ui::design_tokens::{gaze, opacity, radius, sizing};
use iced::widget::canvas::{self, Cache, Canvas, Frame, Geometry, Path, Stroke};
use iced::{mouse, Color, Length, Point, Rectangle, Renderer, Size, Theme};

pub struct TrajectoryPlot<'a> {
    model: &'a PlotModel,
    cache: &'a Cache,
}

impl<'a> TrajectoryPlot<'a> {
    #[must_use]
    pub fn new(model: &'a PlotModel, cache: &'a Cache) -> Self {
        Self { model, cache }
    }

    pub fn into_element<Message: 'a>(self) -> iced::Element<'a, Message> {
        let size = self.model.size;
        Canvas::new(self)
            .width(Length::Fixed(size.width))
            .height(Length::Fixed(size.height))
            .into()
    }
}

/// Colour of a plotted point, faded by its age.
#[must_use]
pub fn point_color(point: &PlottedPoint) -> Color {
    let base = if point.inside {
        gaze::INSIDE
    } else {
        gaze::OUTSIDE
    };
    Color {
        a: point.opacity(),
        ..base
    }
}

impl<Message> canvas::Program<Message> for TrajectoryPlot<'_> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let model = self.model;
        let surface = theme.extended_palette().background.weak.color;

        let geometry = self
            .cache
            .draw(renderer, bounds.size(), |frame: &mut Frame| {
                // The model was laid out for its own size; stretch to the bounds.
                let sx = frame.width() / model.size.width.max(1.0);
                let sy = frame.height() / model.size.height.max(1.0);
                let at = |x: f32, y: f32| Point::new(x * sx, y * sy);

                frame.fill(
                    &Path::rounded_rectangle(Point::ORIGIN, frame.size(), radius::MD.into()),
                    surface,
                );

                if let Some(rect) = model.allowed_rect {
                    let area = Path::rectangle(
                        at(rect.x, rect.y),
                        Size::new(rect.width * sx, rect.height * sy),
                    );
                    frame.fill(
                        &area,
                        Color {
                            a: opacity::RANGE_FILL,
                            ..gaze::ALLOWED_RANGE
                        },
                    );
                    frame.stroke(
                        &area,
                        Stroke::default()
                            .with_width(1.5)
                            .with_color(gaze::ALLOWED_RANGE),
                    );
                }

                if model.points.len() > 1 {
                    let line = Path::new(|builder| {
                        let mut points = model.points.iter();
                        if let Some(first) = points.next() {
                            builder.move_to(at(first.x, first.y));
                        }
                        for point in points {
                            builder.line_to(at(point.x, point.y));
                        }
                    });
                    frame.stroke(
                        &line,
                        Stroke::default().with_width(1.0).with_color(Color {
                            a: opacity::OVERLAY_MEDIUM,
                            ..gaze::TRAJECTORY_LINE
                        }),
                    );
                }

                for point in &model.points {
                    frame.fill(
                        &Path::circle(at(point.x, point.y), sizing::GAZE_POINT_RADIUS),
                        point_color(point),
                    );
                }

                for (marker, color) in [
                    (model.start, gaze::START_MARKER),
                    (model.end, gaze::END_MARKER),
                ] {
                    if let Some(point) = marker {
                        let circle = Path::circle(at(point.x, point.y), sizing::GAZE_MARKER_RADIUS);
                        frame.fill(&circle, color);
                        frame.stroke(
                            &circle,
                            Stroke::default().with_width(1.5).with_color(Color::WHITE),
                        );
                    }
                }
            });

        vec![geometry]
    }
}
