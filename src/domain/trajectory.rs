// SPDX-License-Identifier: MPL-2.0
//! Canvas geometry for the gaze trajectory plot.
//!
//! Gaze points and the allowed range share one bounding box, padded on every
//! side and scaled into the canvas minus a fixed margin. Nothing here knows
//! about the renderer; the UI paints what [`PlotModel`] computed.

use super::gaze::{AllowedRange, GazeAnalysisResult, GazePoint};

/// Default canvas width in logical pixels.
pub const PLOT_WIDTH: f32 = 480.0;

/// Default canvas height in logical pixels.
pub const PLOT_HEIGHT: f32 = 320.0;

/// Blank border between the canvas edge and the plotted area.
pub const PLOT_MARGIN: f32 = 20.0;

/// Padding added around the data bounds, as a fraction of their span.
pub const BOUNDS_PADDING_RATIO: f32 = 0.05;

/// Span used when every coordinate on an axis is identical.
const DEGENERATE_SPAN: f32 = 1.0;

/// Opacity of the oldest point. The newest point is fully opaque.
pub const MIN_POINT_OPACITY: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotSize {
    pub width: f32,
    pub height: f32,
}

impl Default for PlotSize {
    fn default() -> Self {
        Self {
            width: PLOT_WIDTH,
            height: PLOT_HEIGHT,
        }
    }
}

/// Canvas-space point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlottedPoint {
    pub x: f32,
    pub y: f32,
    /// Whether the source point lies in the allowed range.
    pub inside: bool,
    /// Temporal position, 0.0 for the first point and 1.0 for the last.
    pub order: f32,
}

impl PlottedPoint {
    /// Older points fade out.
    #[must_use]
    pub fn opacity(&self) -> f32 {
        MIN_POINT_OPACITY + (1.0 - MIN_POINT_OPACITY) * self.order
    }
}

/// Canvas-space rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    min_x: f32,
    min_y: f32,
    span_x: f32,
    span_y: f32,
}

impl Bounds {
    fn of(points: &[GazePoint], range: Option<&AllowedRange>) -> Option<Self> {
        let corners = range.into_iter().flat_map(|r| {
            [
                GazePoint::new(r.min_x, r.min_y),
                GazePoint::new(r.max_x, r.max_y),
            ]
        });

        let mut iter = points
            .iter()
            .copied()
            .chain(corners)
            .filter(|p| p.x.is_finite() && p.y.is_finite());
        let first = iter.next()?;
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }

        let (min_x, span_x) = pad(min_x, max_x);
        let (min_y, span_y) = pad(min_y, max_y);
        Some(Self {
            min_x,
            min_y,
            span_x,
            span_y,
        })
    }
}

fn pad(min: f32, max: f32) -> (f32, f32) {
    let span = max - min;
    if span <= f32::EPSILON {
        let half = DEGENERATE_SPAN / 2.0;
        return (min - half, DEGENERATE_SPAN);
    }
    let padding = span * BOUNDS_PADDING_RATIO;
    (min - padding, span + 2.0 * padding)
}

/// Everything the trajectory canvas draws.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotModel {
    pub size: PlotSize,
    pub points: Vec<PlottedPoint>,
    pub allowed_rect: Option<PlotRect>,
    pub start: Option<PlottedPoint>,
    pub end: Option<PlottedPoint>,
    /// Share of points inside the allowed range, 0.0 to 1.0.
    pub in_range_ratio: f32,
    pub inside_count: usize,
}

impl PlotModel {
    /// Projects a result into canvas coordinates.
    ///
    /// Without an allowed range every point counts as inside, so the ratio
    /// is 1.0. With nothing to plot the ratio is the one the backend
    /// computed.
    #[must_use]
    pub fn build(result: &GazeAnalysisResult, size: PlotSize) -> Self {
        let range = result.allowed_range.as_ref();
        let Some(bounds) = Bounds::of(&result.gaze_points, range) else {
            return Self {
                size,
                points: Vec::new(),
                allowed_rect: None,
                start: None,
                end: None,
                in_range_ratio: result.in_range_ratio.clamp(0.0, 1.0),
                inside_count: 0,
            };
        };

        let inner_w = (size.width - 2.0 * PLOT_MARGIN).max(1.0);
        let inner_h = (size.height - 2.0 * PLOT_MARGIN).max(1.0);
        let project = |x: f32, y: f32| {
            (
                PLOT_MARGIN + (x - bounds.min_x) / bounds.span_x * inner_w,
                PLOT_MARGIN + (y - bounds.min_y) / bounds.span_y * inner_h,
            )
        };

        let valid: Vec<GazePoint> = result
            .gaze_points
            .iter()
            .copied()
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .collect();
        let last_index = valid.len().saturating_sub(1);

        let points: Vec<PlottedPoint> = valid
            .iter()
            .enumerate()
            .map(|(index, point)| {
                let (x, y) = project(point.x, point.y);
                PlottedPoint {
                    x,
                    y,
                    inside: range.is_none_or(|r| r.contains(*point)),
                    order: if last_index == 0 {
                        1.0
                    } else {
                        index as f32 / last_index as f32
                    },
                }
            })
            .collect();

        let allowed_rect = range.map(|r| {
            let (x0, y0) = project(r.min_x, r.min_y);
            let (x1, y1) = project(r.max_x, r.max_y);
            PlotRect {
                x: x0,
                y: y0,
                width: x1 - x0,
                height: y1 - y0,
            }
        });

        let inside_count = points.iter().filter(|p| p.inside).count();
        // Without plotted points only the backend's figure is left.
        let in_range_ratio = if points.is_empty() {
            result.in_range_ratio.clamp(0.0, 1.0)
        } else {
            inside_count as f32 / points.len() as f32
        };

        Self {
            size,
            start: points.first().copied(),
            end: points.last().copied(),
            points,
            allowed_rect,
            in_range_ratio,
            inside_count,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(points: Vec<GazePoint>, range: Option<AllowedRange>) -> GazeAnalysisResult {
        GazeAnalysisResult {
            gaze_points: points,
            allowed_range: range,
            in_range_ratio: 0.42,
            ..Default::default()
        }
    }

    fn within_canvas(p: &PlottedPoint, size: PlotSize) -> bool {
        p.x >= PLOT_MARGIN - 0.01
            && p.x <= size.width - PLOT_MARGIN + 0.01
            && p.y >= PLOT_MARGIN - 0.01
            && p.y <= size.height - PLOT_MARGIN + 0.01
    }

    #[test]
    fn empty_result_yields_empty_plot() {
        let model = PlotModel::build(&result_with(vec![], None), PlotSize::default());
        assert!(model.is_empty());
        assert!(model.start.is_none());
        assert_eq!(model.in_range_ratio, 0.42);
    }

    #[test]
    fn single_point_is_centered_and_finite() {
        let model = PlotModel::build(
            &result_with(vec![GazePoint::new(0.5, 0.5)], None),
            PlotSize::default(),
        );
        let p = model.points[0];
        assert!(p.x.is_finite() && p.y.is_finite());
        assert!((p.x - PLOT_WIDTH / 2.0).abs() < 0.01);
        assert!((p.y - PLOT_HEIGHT / 2.0).abs() < 0.01);
        assert_eq!(p.order, 1.0);
        assert_eq!(model.start, model.end);
    }

    #[test]
    fn points_classified_against_allowed_range() {
        let range = AllowedRange::new(0.25, 0.75, 0.25, 0.75);
        let model = PlotModel::build(
            &result_with(
                vec![
                    GazePoint::new(0.5, 0.5),
                    GazePoint::new(0.9, 0.5),
                    GazePoint::new(0.3, 0.7),
                    GazePoint::new(0.0, 0.0),
                ],
                Some(range),
            ),
            PlotSize::default(),
        );

        let inside: Vec<bool> = model.points.iter().map(|p| p.inside).collect();
        assert_eq!(inside, vec![true, false, true, false]);
        assert_eq!(model.inside_count, 2);
        assert!((model.in_range_ratio - 0.5).abs() < 1e-6);
    }

    #[test]
    fn everything_fits_inside_the_margin() {
        let size = PlotSize::default();
        let range = AllowedRange::new(-100.0, 100.0, -50.0, 50.0);
        let model = PlotModel::build(
            &result_with(
                vec![GazePoint::new(-300.0, 20.0), GazePoint::new(250.0, -80.0)],
                Some(range),
            ),
            size,
        );
        assert!(model.points.iter().all(|p| within_canvas(p, size)));

        let rect = model.allowed_rect.expect("range is plotted");
        assert!(rect.width > 0.0 && rect.height > 0.0);
        assert!(rect.x > PLOT_MARGIN && rect.x + rect.width < size.width - PLOT_MARGIN);
    }

    #[test]
    fn order_and_opacity_grow_over_time() {
        let points = (0..5).map(|i| GazePoint::new(i as f32, 0.0)).collect();
        let model = PlotModel::build(&result_with(points, None), PlotSize::default());

        let orders: Vec<f32> = model.points.iter().map(|p| p.order).collect();
        assert_eq!(orders, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!((model.points[0].opacity() - MIN_POINT_OPACITY).abs() < 1e-6);
        assert!((model.points[4].opacity() - 1.0).abs() < 1e-6);
        assert_eq!(model.start.map(|p| p.order), Some(0.0));
        assert_eq!(model.end.map(|p| p.order), Some(1.0));
    }

    #[test]
    fn zero_span_axis_does_not_divide_by_zero() {
        let points = vec![GazePoint::new(0.4, 0.1), GazePoint::new(0.4, 0.9)];
        let model = PlotModel::build(&result_with(points, None), PlotSize::default());
        assert!(model.points.iter().all(|p| p.x.is_finite()));
        assert!((model.points[0].x - model.points[1].x).abs() < 1e-6);
    }

    #[test]
    fn non_finite_points_are_skipped() {
        let points = vec![
            GazePoint::new(f32::NAN, 0.1),
            GazePoint::new(0.2, 0.3),
            GazePoint::new(0.4, f32::INFINITY),
        ];
        let model = PlotModel::build(&result_with(points, None), PlotSize::default());
        assert_eq!(model.points.len(), 1);
    }

    #[test]
    fn missing_range_marks_all_points_inside() {
        let points = vec![GazePoint::new(0.0, 0.0), GazePoint::new(1.0, 1.0)];
        let model = PlotModel::build(&result_with(points, None), PlotSize::default());
        assert!(model.points.iter().all(|p| p.inside));
        assert!(model.allowed_rect.is_none());
        assert_eq!(model.in_range_ratio, 1.0);
    }
}
