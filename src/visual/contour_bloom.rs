//! Concentric warped contours that bloom with the bass, plus shockwave rings
//! and spark sprays fired on beats.

use std::f32::consts::TAU;

use nannou::prelude::{Point2, pt2};
use rand::Rng;
use rand::rngs::StdRng;

use crate::analysis::{BandLayout, BeatConfig, FeatureExtractor};
use crate::settings::{Theme, VisualizerSettings};
use crate::visual::canvas::{Blend, Canvas, Fill, Stroke};
use crate::visual::color::Rgba;
use crate::visual::{EngineStats, FrameInput, RenderEngine, Size};

const RINGS: usize = 3;
pub const SPARK_CAP: usize = 500;
pub const BURST_CAP: usize = 15;
/// Samples per quadratic segment when smoothing a contour.
const CURVE_STEPS: usize = 3;

#[derive(Clone, Copy, Debug)]
struct Spark {
    /// Offset from the canvas centre.
    offset: Point2,
    velocity: Point2,
    life: f32,
    size: f32,
    white: bool,
}

#[derive(Clone, Copy, Debug)]
struct ShockRing {
    radius: f32,
    life: f32,
}

/// Per-point random terms, refreshed every frame.
#[derive(Clone, Copy, Debug, Default)]
struct Jitter {
    radial: f32,
    shimmer: Point2,
}

// every time coefficient is a whole number of thousandths, so the
// animation repeats exactly after this many seconds
const CLOCK_PERIOD: f32 = 1000.0 * TAU;

fn resolution(size: Size) -> usize {
    24.max((size.width / 12.0) as usize)
}

/// Closed curve through the midpoints of consecutive points, using each
/// point as the control of a quadratic segment.
fn smooth_closed(points: &[Point2]) -> Vec<Point2> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    let mid = |i: usize| (points[i % n] + points[(i + 1) % n]) * 0.5;
    let mut out = Vec::with_capacity(n * CURVE_STEPS);
    for i in 0..n {
        let start = mid(i + n - 1);
        let control = points[i];
        let end = mid(i);
        for s in 0..CURVE_STEPS {
            let t = s as f32 / CURVE_STEPS as f32;
            let u = 1.0 - t;
            out.push(start * (u * u) + control * (2.0 * u * t) + end * (t * t));
        }
    }
    out
}

pub struct ContourBloom {
    features: FeatureExtractor,
    rng: StdRng,
    phases: [f32; RINGS],
    jitter: Vec<Jitter>,
    sparks: Vec<Spark>,
    bursts: Vec<ShockRing>,
    time: f32,
    bass: f32,
    mid: f32,
    high: f32,
    amplitude: f32,
}

impl ContourBloom {
    /// Ring phases are drawn once here and never reseeded.
    pub fn new(mut rng: StdRng) -> Self {
        let phases = std::array::from_fn(|i| i as f32 * 0.8 + rng.gen_range(0.0..2.0));
        Self {
            features: FeatureExtractor::new(BandLayout::new(0..8, 8..120, 120..256), 0.22)
                .with_beat(BeatConfig {
                    threshold: 0.08,
                    gain: 6.0,
                    decay: 0.90,
                }),
            rng,
            phases,
            jitter: Vec::new(),
            sparks: Vec::with_capacity(SPARK_CAP),
            bursts: Vec::with_capacity(BURST_CAP),
            time: 0.0,
            bass: 0.0,
            mid: 0.0,
            high: 0.0,
            amplitude: 0.0,
        }
    }

    pub fn phases(&self) -> [f32; RINGS] {
        self.phases
    }

    fn advance_population(&mut self, speed: f32) {
        for s in &mut self.sparks {
            s.offset += s.velocity;
            s.velocity *= 0.97;
            s.life -= 0.02;
        }
        self.sparks.retain(|s| s.life > 0.0);

        for b in &mut self.bursts {
            b.radius += 6.0 * speed;
            b.life -= 0.025;
        }
        self.bursts.retain(|b| b.life > 0.0);
    }

    fn fire(&mut self, speed: f32) {
        if self.bursts.len() < BURST_CAP {
            self.bursts.push(ShockRing {
                radius: 0.0,
                life: 1.0,
            });
        }

        let wanted = self.rng.gen_range(30..60);
        let count = wanted.min(SPARK_CAP - self.sparks.len());
        for i in 0..count {
            let angle = i as f32 / wanted as f32 * TAU;
            let v = self.rng.gen_range(2.0..6.0) * speed;
            self.sparks.push(Spark {
                offset: pt2(0.0, 0.0),
                velocity: pt2(angle.cos() * v, angle.sin() * v),
                life: 1.0,
                size: self.rng.gen_range(2.0..5.0),
                white: self.rng.gen_range(0.0..1.0) < 0.3,
            });
        }
    }

    fn refresh_jitter(&mut self, size: Size) {
        let n = RINGS * resolution(size);
        self.jitter.resize(n, Jitter::default());
        for j in &mut self.jitter {
            j.radial = self.rng.gen_range(0.0..0.5);
            j.shimmer = pt2(self.rng.gen_range(-0.5..0.5), self.rng.gen_range(-0.5..0.5));
        }
    }

    fn warp(&self, angle: f32, ring: usize, jitter: f32) -> f32 {
        let (mid, t) = (self.mid, self.time);
        let phase = self.phases[ring] + t * (0.45 + ring as f32 * 0.04);
        let w1 = (angle * (1.0 + mid * 4.0) + phase).sin() * (4.0 + mid * 24.0);
        let w2 = (angle * (2.0 + mid * 3.0) - phase * 0.6).sin() * (2.0 + mid * 12.0);
        let j = ((t * 24.0 + angle * 30.0 + ring as f32).sin() * 0.5 + jitter) * self.high * 4.0;
        w1 + w2 + j
    }

    fn contour(&self, ring: usize, size: Size) -> (f32, Vec<Point2>) {
        let center = size.center();
        let min = size.min_side();
        let res = resolution(size);
        let norm = ring as f32 / (RINGS - 1) as f32;

        let base = min * 0.06 + norm * min * 0.18;
        let boost = 1.0 + self.bass * (0.75 + norm * 1.6);
        let radius = base * boost + self.amplitude * 20.0 * norm;
        let twist = self.time * (0.2 + norm * 0.6) + self.mid * 2.0;

        let points = (0..res)
            .map(|i| {
                let angle = i as f32 / res as f32 * TAU + twist * (0.05 + norm * 0.2);
                let jitter = self.jitter.get(ring * res + i).map_or(0.0, |j| j.radial);
                let rr = radius + self.warp(angle, ring, jitter) * (1.0 + norm * 0.8);
                pt2(center.x + angle.cos() * rr, center.y + angle.sin() * rr)
            })
            .collect();
        (radius, points)
    }

    fn paint_contours(&self, canvas: &mut dyn Canvas, size: Size, settings: &VisualizerSettings) {
        let center = size.center();
        let res = resolution(size);
        for ring in (0..RINGS).rev() {
            let norm = ring as f32 / (RINGS - 1) as f32;
            let color: Rgba = if ring % 2 == 0 {
                settings.primary_color.into()
            } else {
                settings.secondary_color.into()
            };
            let (radius, points) = self.contour(ring, size);

            let outline = smooth_closed(&points);
            canvas.fill_path(
                &outline,
                &Fill::Radial {
                    center,
                    inner: radius * 0.2,
                    outer: radius * 1.4,
                    stops: vec![
                        (0.0, color.with_alpha(0.22 * (1.0 - norm * 0.4))),
                        (0.5, color.with_alpha(0.12 * (1.0 - norm * 0.2))),
                        (1.0, color.with_alpha(0.02)),
                    ],
                },
            );
            canvas.stroke_path(
                &outline,
                true,
                Stroke::new(color.with_alpha(0.75 - norm * 0.4), 0.8 + norm * 1.2)
                    .glow(4.0 + self.high * 20.0),
            );

            if self.high > 0.02 {
                let spread = self.high * 4.0;
                let shifted: Vec<Point2> = points
                    .iter()
                    .enumerate()
                    .map(|(i, &p)| {
                        let j = self.jitter.get(ring * res + i).map_or(pt2(0.0, 0.0), |j| j.shimmer);
                        p + j * spread
                    })
                    .collect();
                let alpha = 0.45 * self.high * (self.high * 1.2).min(0.45);
                canvas.stroke_path(
                    &smooth_closed(&shifted),
                    true,
                    Stroke::new(color.with_alpha(alpha), 0.6 + self.high * 1.8),
                );
            }
        }
    }

    fn paint_population(&self, canvas: &mut dyn Canvas, size: Size, settings: &VisualizerSettings) {
        let center = size.center();
        let primary = Rgba::from(settings.primary_color);
        let secondary = Rgba::from(settings.secondary_color);
        for b in &self.bursts {
            canvas.stroke_circle(
                center,
                b.radius,
                Stroke::new(primary.with_alpha(b.life * 0.6), 2.0 + 4.0 * b.life).glow(12.0 * b.life),
            );
        }
        for s in &self.sparks {
            let color = if s.white { Rgba::WHITE } else { secondary };
            let p = center + s.offset;
            canvas.fill_rect(p.x, p.y, s.size, s.size, &Fill::Solid(color.with_alpha(s.life)));
        }
    }
}

impl RenderEngine for ContourBloom {
    fn theme(&self) -> Theme {
        Theme::PixelShockwave
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let settings = input.settings;
        self.time = (self.time + settings.speed / 60.0).rem_euclid(CLOCK_PERIOD);

        let f = self
            .features
            .extract(input.frequency(), settings.sensitivity * settings.intensity);
        self.bass = f.smoothed.bass;
        self.mid = f.smoothed.mid;
        self.high = f.smoothed.high;
        self.amplitude = f.smoothed.average;

        self.advance_population(settings.speed);
        if f.triggered {
            self.fire(settings.speed);
        }
        self.refresh_jitter(input.size);
    }

    fn paint(&self, canvas: &mut dyn Canvas, size: Size, settings: &VisualizerSettings) {
        canvas.clear(settings.background_color.into());
        if size.is_empty() {
            return;
        }

        canvas.set_blend(Blend::Additive);
        self.paint_contours(canvas, size, settings);
        self.paint_population(canvas, size, settings);

        let center = size.center();
        let secondary = Rgba::from(settings.secondary_color);
        let reach = size.max_side() * 0.2 * (0.6 + self.bass);
        canvas.fill_rect(
            0.0,
            0.0,
            size.width,
            size.height,
            &Fill::radial(
                center,
                reach,
                vec![
                    (0.0, secondary.with_alpha(0.08 + self.bass * 0.45)),
                    (0.6, secondary.with_alpha(0.02 + self.bass * 0.08)),
                    (1.0, secondary.with_alpha(0.0)),
                ],
            ),
        );
        canvas.set_blend(Blend::Normal);
    }

    fn reset_dynamics(&mut self) {
        self.features.reset();
        self.bass = 0.0;
        self.mid = 0.0;
        self.high = 0.0;
        self.amplitude = 0.0;
    }

    fn stats(&self) -> EngineStats {
        EngineStats {
            population: self.sparks.len(),
            bursts: self.bursts.len(),
        }
    }
}
