// SPDX-License-Identifier: MPL-2.0
//! Progress ring drawn on a Canvas.
//!
//! With a known fraction the arc grows clockwise from the top. Without one
//! a half arc spins, driven by the rotation the caller advances on a timer.

use crate::ui::design_tokens::sizing;
use iced::widget::canvas::{self, Cache, Canvas, Frame, Geometry, Path, Stroke};
use iced::{mouse, Color, Length, Point, Rectangle, Renderer, Theme};
use std::f32::consts::{PI, TAU};

const STROKE_WIDTH: f32 = 3.0;
const SEGMENTS: u16 = 48;

pub struct ProgressRing {
    cache: Cache,
    progress: Option<f32>,
    rotation: f32,
    color: Color,
    size: f32,
}

impl ProgressRing {
    /// Ring filled up to `progress` (0.0 to 1.0).
    #[must_use]
    pub fn determinate(color: Color, progress: f32) -> Self {
        Self {
            cache: Cache::default(),
            progress: Some(progress.clamp(0.0, 1.0)),
            rotation: 0.0,
            color,
            size: sizing::ICON_XL,
        }
    }

    /// Spinning half ring at `rotation` radians.
    #[must_use]
    pub fn spinning(color: Color, rotation: f32) -> Self {
        Self {
            cache: Cache::default(),
            progress: None,
            rotation,
            color,
            size: sizing::ICON_XL,
        }
    }

    #[must_use]
    pub fn size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    /// Start and end angle of the visible arc, measured from the top.
    fn arc(&self) -> (f32, f32) {
        let top = -PI / 2.0;
        match self.progress {
            Some(fraction) => (top, top + TAU * fraction),
            None => {
                let start = top + self.rotation;
                (start, start + PI)
            }
        }
    }

    pub fn into_element<Message: 'static>(self) -> iced::Element<'static, Message> {
        let size = self.size;
        Canvas::new(self)
            .width(Length::Fixed(size))
            .height(Length::Fixed(size))
            .into()
    }
}

impl<Message> canvas::Program<Message> for ProgressRing {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let geometry = self
            .cache
            .draw(renderer, bounds.size(), |frame: &mut Frame| {
                let center = frame.center();
                let radius = frame.width().min(frame.height()) / 2.0 - STROKE_WIDTH - 1.0;

                frame.stroke(
                    &Path::circle(center, radius),
                    Stroke::default()
                        .with_width(STROKE_WIDTH)
                        .with_color(Color {
                            a: 0.25,
                            ..self.color
                        }),
                );

                let (start, end) = self.arc();
                if end - start <= f32::EPSILON {
                    return;
                }

                let mut arc = canvas::path::Builder::new();
                arc.move_to(Point::new(
                    center.x + radius * start.cos(),
                    center.y + radius * start.sin(),
                ));
                for i in 1..=SEGMENTS {
                    let t = f32::from(i) / f32::from(SEGMENTS);
                    let angle = start + (end - start) * t;
                    arc.line_to(Point::new(
                        center.x + radius * angle.cos(),
                        center.y + radius * angle.sin(),
                    ));
                }

                frame.stroke(
                    &arc.build(),
                    Stroke::default()
                        .with_width(STROKE_WIDTH)
                        .with_color(self.color)
                        .with_line_cap(canvas::LineCap::Round),
                );
            });

        vec![geometry]
    }
}
