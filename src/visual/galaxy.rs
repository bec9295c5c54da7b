//! A flattened four-armed spiral of stars around a pulsing black hole.

use std::f32::consts::{PI, TAU};

use nannou::prelude::{Point2, pt2};
use rand::Rng;
use rand::rngs::StdRng;

use crate::analysis::{BandLayout, BeatConfig, FeatureExtractor};
use crate::settings::{Theme, VisualizerSettings};
use crate::visual::canvas::{Canvas, Fill, Stroke};
use crate::visual::color::Rgba;
use crate::visual::{EngineStats, FrameInput, RenderEngine, Size};

pub const STAR_COUNT: usize = 300;
const ARMS: usize = 4;
const ARM_POINTS: usize = 100;
const PALETTE_SLOTS: u8 = 5;
/// Common period of every time-driven term below.
const TIME_PERIOD: f32 = 4.0 * PI;

#[derive(Clone, Copy, Debug)]
struct Star {
    angle: f32,
    /// Distance from the centre as a fraction of half the longer side.
    reach: f32,
    speed: f32,
    size: f32,
    brightness: f32,
    /// Index into primary, secondary, white, yellow, pink.
    slot: u8,
}

impl Star {
    fn seeded(rng: &mut StdRng) -> Self {
        Self {
            angle: rng.gen_range(0.0..TAU),
            reach: rng.gen_range(0.0..1.0),
            speed: rng.gen_range(0.001..0.004),
            size: rng.gen_range(1.0..4.0),
            brightness: rng.gen_range(0.3..1.0),
            slot: rng.gen_range(0..PALETTE_SLOTS),
        }
    }

    fn radius(&self, size: Size) -> f32 {
        20.0 + self.reach * size.max_side() * 0.5
    }
}

fn palette(slot: u8, settings: &VisualizerSettings) -> Rgba {
    match slot {
        0 => settings.primary_color.into(),
        1 => settings.secondary_color.into(),
        2 => Rgba::WHITE,
        3 => Rgba::YELLOW,
        _ => Rgba::PINK,
    }
}

pub struct GalaxySpiral {
    features: FeatureExtractor,
    stars: Vec<Star>,
    time: f32,
    bass: f32,
    mid: f32,
    high: f32,
    beat: f32,
}

impl GalaxySpiral {
    /// Seeds the star field once; later frames only rotate it.
    pub fn new(mut rng: StdRng) -> Self {
        let stars = (0..STAR_COUNT).map(|_| Star::seeded(&mut rng)).collect();
        Self {
            features: FeatureExtractor::new(BandLayout::default(), 0.20).with_beat(BeatConfig {
                threshold: 0.08,
                gain: 6.0,
                decay: 0.92,
            }),
            stars,
            time: 0.0,
            bass: 0.0,
            mid: 0.0,
            high: 0.0,
            beat: 0.0,
        }
    }

    pub fn hole_size(&self, settings: &VisualizerSettings) -> f32 {
        40.0 + (30.0 * self.bass + 20.0 * self.beat) * settings.intensity
    }

    fn arm(&self, arm: usize, center: Point2, size: Size, settings: &VisualizerSettings) -> Vec<Point2> {
        let arm_angle = arm as f32 / ARMS as f32 * TAU + self.time;
        let scale = size.min_side() * 0.45 * (1.0 + self.bass * 0.3 * settings.intensity);
        (0..ARM_POINTS)
            .map(|i| {
                let t = i as f32 / ARM_POINTS as f32;
                let a = arm_angle + t * PI * 3.0;
                let r = t * scale;
                // flattened for perspective
                pt2(center.x + a.cos() * r, center.y + a.sin() * r * 0.6)
            })
            .collect()
    }
}

impl RenderEngine for GalaxySpiral {
    fn theme(&self) -> Theme {
        Theme::GalaxySpiral
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let settings = input.settings;
        let f = self.features.extract(input.frequency(), settings.sensitivity);
        self.bass = f.smoothed.bass;
        self.mid = f.smoothed.mid;
        self.high = f.smoothed.high;
        self.beat = f.beat;

        self.time = (self.time + 0.01 * settings.speed * (1.0 + 2.0 * self.beat))
            .rem_euclid(TIME_PERIOD);
        let spin = (1.0 + 3.0 * self.bass + 2.0 * self.beat) * settings.speed;
        for star in &mut self.stars {
            star.angle = (star.angle + star.speed * spin).rem_euclid(TAU);
        }
    }

    fn paint(&self, canvas: &mut dyn Canvas, size: Size, settings: &VisualizerSettings) {
        let trail = (0.1 / settings.intensity.max(1e-3)).min(1.0);
        canvas.fade(Rgba::from_u8(5, 5, 15, trail));
        if size.is_empty() {
            return;
        }
        let center = size.center();
        let primary = Rgba::from(settings.primary_color);
        let secondary = Rgba::from(settings.secondary_color);

        let arm_stroke = Stroke::new(secondary.with_alpha(0.25), 20.0 + self.mid * 30.0).glow(30.0);
        for arm in 0..ARMS {
            canvas.stroke_path(&self.arm(arm, center, size, settings), false, arm_stroke);
        }

        for star in &self.stars {
            let r = star.radius(size);
            let a = star.angle + r * 0.02;
            let p = pt2(
                center.x + a.cos() * r * (1.0 + self.mid * 0.2),
                center.y + a.sin() * r * 0.6,
            );
            let pulse = 1.0 + (self.time * 5.0 + star.angle).sin() * 0.3 * self.high;
            let radius = star.size * pulse * (1.0 + self.bass * 2.0 * settings.intensity);
            let alpha = star.brightness * (0.5 + self.bass * 0.5);
            let color = palette(star.slot, settings).with_alpha(alpha);
            canvas.fill_circle(p, radius, &Fill::Solid(color));
        }

        let hole = self.hole_size(settings);
        canvas.fill_circle(
            center,
            hole * 2.0,
            &Fill::radial(
                center,
                hole * 2.0,
                vec![
                    (0.0, Rgba::BLACK),
                    (0.3, primary.with_alpha(0.25)),
                    (0.6, secondary.with_alpha(0.125)),
                    (1.0, Rgba::TRANSPARENT),
                ],
            ),
        );

        canvas.stroke_ellipse(
            center,
            hole * 1.5,
            hole * 0.5,
            self.time * 0.5,
            Stroke::new(primary, 3.0 + 10.0 * self.bass + 6.0 * self.beat).glow(30.0 + 40.0 * self.bass),
        );
    }

    fn reset_dynamics(&mut self) {
        self.features.reset();
        self.bass = 0.0;
        self.mid = 0.0;
        self.high = 0.0;
        self.beat = 0.0;
    }

    fn stats(&self) -> EngineStats {
        EngineStats {
            population: self.stars.len(),
            bursts: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visual::DrawCall;
    use crate::visual::test_support::{assert_idle_bounded, loud, run};
    use rand::SeedableRng;

    fn seeded(seed: u64) -> GalaxySpiral {
        GalaxySpiral::new(StdRng::seed_from_u64(seed))
    }

    fn accretion_rx(canvas: &crate::visual::RecordingCanvas) -> f32 {
        canvas
            .calls()
            .iter()
            .find_map(|c| match c {
                DrawCall::Ellipse { rx, .. } => Some(*rx),
                _ => None,
            })
            .unwrap_or_default()
    }

    #[test]
    fn seeds_three_hundred_stars_in_range() {
        let engine = seeded(7);
        assert_eq!(engine.stats().population, STAR_COUNT);
        for star in &engine.stars {
            assert!((0.001..0.004).contains(&star.speed));
            assert!((1.0..4.0).contains(&star.size));
            assert!((0.3..1.0).contains(&star.brightness));
            assert!(star.slot < PALETTE_SLOTS);
        }
    }

    #[test]
    fn same_seed_paints_the_same_frame() {
        let settings = VisualizerSettings::default();
        let a = run(&mut seeded(3), &settings, Some(&loud()), 10);
        let b = run(&mut seeded(3), &settings, Some(&loud()), 10);
        assert_eq!(a.calls(), b.calls());
    }

    #[test]
    fn onset_swells_the_black_hole() {
        let settings = VisualizerSettings::default();
        let quiet = run(&mut seeded(1), &settings, None, 1);
        assert_eq!(accretion_rx(&quiet), 60.0);

        let mut engine = seeded(1);
        let loud_frame = run(&mut engine, &settings, Some(&loud()), 1);
        assert!(engine.beat > 0.99);
        assert!(accretion_rx(&loud_frame) > 60.0);
    }

    #[test]
    fn paint_starts_with_a_trail_fade() {
        let settings = VisualizerSettings {
            intensity: 0.05,
            ..VisualizerSettings::default()
        };
        let canvas = run(&mut seeded(2), &settings, None, 1);
        assert_eq!(canvas.first(), Some(&DrawCall::Fade(Rgba::from_u8(5, 5, 15, 1.0))));
        // arms, stars, hole, disk
        assert_eq!(canvas.calls().len(), 1 + ARMS + STAR_COUNT + 2);
    }

    #[test]
    fn idle_is_bounded() {
        assert_idle_bounded(&mut seeded(11));
    }
}
