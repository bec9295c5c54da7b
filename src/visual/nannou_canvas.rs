use nannou::prelude::*;

use crate::visual::canvas::{Blend, Canvas, Fill, Stroke};
use crate::visual::color::{Rgba, sample_stops};

/// Layers used to approximate a radial gradient with stacked discs.
const GRADIENT_LAYERS: usize = 18;

/// [`Canvas`] backed by a nannou `Draw`, mapping top-left pixel coordinates
/// onto the window's centred, y-up space.
pub struct DrawCanvas {
    base: Draw,
    draw: Draw,
    win: Rect,
}

impl DrawCanvas {
    pub fn new(draw: &Draw, win: Rect) -> Self {
        Self {
            base: draw.clone(),
            draw: draw.clone(),
            win,
        }
    }

    fn to_world(&self, p: Point2) -> Point2 {
        pt2(self.win.left() + p.x, self.win.top() - p.y)
    }

    fn glow_stroke(&self, stroke: &Stroke) -> Option<(f32, Srgba)> {
        (stroke.glow > 0.0).then(|| {
            let halo = stroke.color.with_alpha(stroke.color.a * 0.25);
            (stroke.width + stroke.glow * 0.5, color(halo))
        })
    }

    fn radial_discs(&self, center: Point2, outer: f32, stops: &[(f32, Rgba)]) {
        let c = self.to_world(center);
        for layer in 0..GRADIENT_LAYERS {
            let t = 1.0 - layer as f32 / GRADIENT_LAYERS as f32;
            let tint = sample_stops(stops, t);
            if tint.a <= 0.0 {
                continue;
            }
            let layer_tint = tint.with_alpha(tint.a * 2.0 / GRADIENT_LAYERS as f32);
            self.draw
                .ellipse()
                .xy(c)
                .radius(outer * t)
                .color(color(layer_tint));
        }
    }
}

fn color(c: Rgba) -> Srgba {
    srgba(c.r, c.g, c.b, c.a)
}

impl Canvas for DrawCanvas {
    fn clear(&mut self, c: Rgba) {
        self.base.background().color(color(c));
    }

    fn fade(&mut self, c: Rgba) {
        self.draw.rect().xy(self.win.xy()).wh(self.win.wh()).color(color(c));
    }

    fn set_blend(&mut self, blend: Blend) {
        self.draw = match blend {
            Blend::Normal => self.base.clone(),
            Blend::Additive => self.base.color_blend(BLEND_ADD),
        };
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, fill: &Fill) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        match fill {
            Fill::Solid(c) => {
                let centre = self.to_world(pt2(x + w * 0.5, y + h * 0.5));
                self.draw.rect().xy(centre).w_h(w, h).color(color(*c));
            }
            Fill::Radial { center, outer, stops, .. } => {
                self.radial_discs(*center, *outer, stops);
            }
            Fill::Vertical { .. } => {
                let corners = [pt2(x, y), pt2(x + w, y), pt2(x + w, y + h), pt2(x, y + h)];
                let pts: Vec<(Point2, Srgba)> = corners
                    .iter()
                    .map(|&p| (self.to_world(p), color(fill.color_at(p))))
                    .collect();
                self.draw.polygon().points_colored(pts);
            }
        }
    }

    fn fill_circle(&mut self, center: Point2, radius: f32, fill: &Fill) {
        if radius <= 0.0 {
            return;
        }
        match fill {
            Fill::Radial { stops, .. } => self.radial_discs(center, radius, stops),
            other => {
                let c = other.color_at(center);
                self.draw
                    .ellipse()
                    .xy(self.to_world(center))
                    .radius(radius)
                    .color(color(c));
            }
        }
    }

    fn stroke_circle(&mut self, center: Point2, radius: f32, stroke: Stroke) {
        self.stroke_ellipse(center, radius, radius, 0.0, stroke);
    }

    fn stroke_ellipse(&mut self, center: Point2, rx: f32, ry: f32, rotation: f32, stroke: Stroke) {
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let c = self.to_world(center);
        if let Some((weight, halo)) = self.glow_stroke(&stroke) {
            self.draw
                .ellipse()
                .xy(c)
                .w_h(rx * 2.0, ry * 2.0)
                .rotate(-rotation)
                .no_fill()
                .stroke_weight(weight)
                .stroke(halo);
        }
        self.draw
            .ellipse()
            .xy(c)
            .w_h(rx * 2.0, ry * 2.0)
            .rotate(-rotation)
            .no_fill()
            .stroke_weight(stroke.width)
            .stroke(color(stroke.color));
    }

    fn stroke_path(&mut self, points: &[Point2], closed: bool, stroke: Stroke) {
        if points.len() < 2 {
            return;
        }
        let mut pts: Vec<Point2> = points.iter().map(|&p| self.to_world(p)).collect();
        if closed {
            pts.push(pts[0]);
        }
        if let Some((weight, halo)) = self.glow_stroke(&stroke) {
            self.draw
                .polyline()
                .weight(weight)
                .points(pts.iter().copied())
                .color(halo);
        }
        self.draw
            .polyline()
            .weight(stroke.width)
            .points(pts)
            .color(color(stroke.color));
    }

    fn fill_path(&mut self, points: &[Point2], fill: &Fill) {
        if points.len() < 3 {
            return;
        }
        let pts: Vec<(Point2, Srgba)> = points
            .iter()
            .map(|&p| (self.to_world(p), color(fill.color_at(p))))
            .collect();
        self.draw.polygon().points_colored(pts);
    }
}
