//! The drawing surface engines paint onto.
//!
//! Coordinates are canvas-style: origin at the top-left corner, `y` grows
//! downwards, units are pixels. Backends convert to their own space.

use nannou::prelude::{Point2, pt2};

use crate::visual::color::{Rgba, sample_stops};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Blend {
    #[default]
    Normal,
    Additive,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub color: Rgba,
    pub width: f32,
    // 0 disables the halo
    pub glow: f32,
}

impl Stroke {
    pub fn new(color: Rgba, width: f32) -> Self {
        Self {
            color,
            width,
            glow: 0.0,
        }
    }

    pub fn glow(mut self, glow: f32) -> Self {
        self.glow = glow.max(0.0);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Fill {
    Solid(Rgba),
    /// Radial gradient centred on `center`; stop offsets run from
    /// `inner` (0) to `outer` (1).
    Radial {
        center: Point2,
        inner: f32,
        outer: f32,
        stops: Vec<(f32, Rgba)>,
    },
    Vertical {
        top: f32,
        bottom: f32,
        from: Rgba,
        to: Rgba,
    },
}

impl Fill {
    pub fn radial(center: Point2, outer: f32, stops: Vec<(f32, Rgba)>) -> Self {
        Fill::Radial {
            center,
            inner: 0.0,
            outer,
            stops,
        }
    }

    pub fn color_at(&self, p: Point2) -> Rgba {
        match self {
            Fill::Solid(c) => *c,
            Fill::Radial {
                center,
                inner,
                outer,
                stops,
            } => {
                let span = (outer - inner).max(f32::EPSILON);
                let t = (p.distance(*center) - inner) / span;
                sample_stops(stops, t)
            }
            Fill::Vertical {
                top,
                bottom,
                from,
                to,
            } => {
                let span = bottom - top;
                let t = if span.abs() < f32::EPSILON {
                    0.0
                } else {
                    (p.y - top) / span
                };
                from.lerp(*to, t)
            }
        }
    }
}

pub trait Canvas {
    fn clear(&mut self, color: Rgba);

    /// Blends a translucent layer over the whole surface so older frames
    /// fade out instead of accumulating.
    fn fade(&mut self, color: Rgba);

    fn set_blend(&mut self, blend: Blend);

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, fill: &Fill);

    fn fill_circle(&mut self, center: Point2, radius: f32, fill: &Fill);

    fn stroke_circle(&mut self, center: Point2, radius: f32, stroke: Stroke);

    /// `rotation` is in radians, clockwise on screen.
    fn stroke_ellipse(&mut self, center: Point2, rx: f32, ry: f32, rotation: f32, stroke: Stroke);

    fn stroke_path(&mut self, points: &[Point2], closed: bool, stroke: Stroke);

    fn fill_path(&mut self, points: &[Point2], fill: &Fill);
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    Clear(Rgba),
    Fade(Rgba),
    Blend(Blend),
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        fill: Fill,
    },
    Circle {
        center: Point2,
        radius: f32,
        filled: bool,
        color: Rgba,
    },
    Ellipse {
        center: Point2,
        rx: f32,
        ry: f32,
        rotation: f32,
        stroke: Stroke,
    },
    Path {
        points: Vec<Point2>,
        closed: bool,
        filled: bool,
    },
}

impl DrawCall {
    fn extent_points(&self) -> Vec<Point2> {
        match self {
            DrawCall::Clear(_) | DrawCall::Fade(_) | DrawCall::Blend(_) => Vec::new(),
            DrawCall::Rect { x, y, w, h, .. } => vec![pt2(*x, *y), pt2(x + w, y + h)],
            DrawCall::Circle { center, radius, .. } => {
                vec![*center - pt2(*radius, *radius), *center + pt2(*radius, *radius)]
            }
            DrawCall::Ellipse { center, rx, ry, .. } => {
                let r = rx.abs().max(ry.abs());
                vec![*center - pt2(r, r), *center + pt2(r, r)]
            }
            DrawCall::Path { points, .. } => points.clone(),
        }
    }
}

/// Canvas that keeps a list of what was drawn. Used by the headless runner
/// and by tests to inspect engine output without a window.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    calls: Vec<DrawCall>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn reset(&mut self) {
        self.calls.clear();
    }

    pub fn first(&self) -> Option<&DrawCall> {
        self.calls.first()
    }

    pub fn max_extent(&self) -> f32 {
        self.calls
            .iter()
            .flat_map(|c| c.extent_points())
            .map(|p| p.x.abs().max(p.y.abs()))
            .fold(0.0, f32::max)
    }

    pub fn all_finite(&self) -> bool {
        self.calls
            .iter()
            .flat_map(|c| c.extent_points())
            .all(|p| p.x.is_finite() && p.y.is_finite())
    }

    pub fn count_where(&self, pred: impl Fn(&DrawCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

impl Canvas for RecordingCanvas {
    fn clear(&mut self, color: Rgba) {
        self.calls.push(DrawCall::Clear(color));
    }

    fn fade(&mut self, color: Rgba) {
        self.calls.push(DrawCall::Fade(color));
    }

    fn set_blend(&mut self, blend: Blend) {
        self.calls.push(DrawCall::Blend(blend));
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, fill: &Fill) {
        self.calls.push(DrawCall::Rect {
            x,
            y,
            w,
            h,
            fill: fill.clone(),
        });
    }

    fn fill_circle(&mut self, center: Point2, radius: f32, fill: &Fill) {
        self.calls.push(DrawCall::Circle {
            center,
            radius,
            filled: true,
            color: fill.color_at(center),
        });
    }

    fn stroke_circle(&mut self, center: Point2, radius: f32, stroke: Stroke) {
        self.calls.push(DrawCall::Circle {
            center,
            radius,
            filled: false,
            color: stroke.color,
        });
    }

    fn stroke_ellipse(&mut self, center: Point2, rx: f32, ry: f32, rotation: f32, stroke: Stroke) {
        self.calls.push(DrawCall::Ellipse {
            center,
            rx,
            ry,
            rotation,
            stroke,
        });
    }

    fn stroke_path(&mut self, points: &[Point2], closed: bool, _stroke: Stroke) {
        self.calls.push(DrawCall::Path {
            points: points.to_vec(),
            closed,
            filled: false,
        });
    }

    fn fill_path(&mut self, points: &[Point2], _fill: &Fill) {
        self.calls.push(DrawCall::Path {
            points: points.to_vec(),
            closed: true,
            filled: true,
        });
    }
}
