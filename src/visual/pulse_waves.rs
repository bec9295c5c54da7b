//! Two interleaved families of rings breathing out from the centre.

use std::f32::consts::{PI, TAU};

use crate::analysis::{BandLayout, FeatureExtractor};
use crate::settings::{Theme, VisualizerSettings};
use crate::visual::canvas::{Canvas, Fill, Stroke};
use crate::visual::color::Rgba;
use crate::visual::{FrameInput, RenderEngine, Size};

const RINGS_PER_WAVE: usize = 8;
const WAVES: usize = 2;
const PHASE_STEP: f32 = 0.016;

pub struct DualPulseWaves {
    features: FeatureExtractor,
    /// Wrapped to one period of the ring oscillation (`6 * time` mod TAU).
    time: f32,
    bass: f32,
    mid: f32,
    high: f32,
}

impl DualPulseWaves {
    pub fn new() -> Self {
        Self {
            features: FeatureExtractor::new(BandLayout::new(0..10, 50..150, 150..256), 0.18),
            time: 0.0,
            bass: 0.0,
            mid: 0.0,
            high: 0.0,
        }
    }
}

impl Default for DualPulseWaves {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderEngine for DualPulseWaves {
    fn theme(&self) -> Theme {
        Theme::DualPulseWaves
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        self.time = (self.time + PHASE_STEP * input.settings.speed).rem_euclid(TAU / 6.0);
        let f = self
            .features
            .extract(input.frequency(), input.settings.sensitivity);
        self.bass = f.smoothed.bass;
        self.mid = f.smoothed.mid;
        self.high = f.raw.high;
    }

    fn paint(&self, canvas: &mut dyn Canvas, size: Size, settings: &VisualizerSettings) {
        let primary = Rgba::from(settings.primary_color);
        let secondary = Rgba::from(settings.secondary_color);
        canvas.clear(settings.background_color.into());
        if size.is_empty() {
            return;
        }

        let center = size.center();
        let reach = size.max_side();
        let (sb, sm) = (self.bass, self.mid);

        for wave in 0..WAVES {
            let phase = (self.time * 6.0 + wave as f32 * PI) % TAU;
            for w in 0..RINGS_PER_WAVE {
                let wf = w as f32;
                let base = 40.0 + wf * 35.0 + sb * 80.0;
                let radius = base + (phase + wf * 0.4).sin() * 40.0 * (0.5 + sm);
                if radius <= 0.0 || radius >= reach {
                    continue;
                }
                let color = if w % 2 == 0 { primary } else { secondary };
                let alpha = (0.7 - wf * 0.08) * (0.6 + self.high * 0.4);
                canvas.stroke_circle(
                    center,
                    radius,
                    Stroke::new(color.with_alpha(alpha), 3.0 + sb * 6.0).glow(15.0 + sm * 40.0),
                );
            }
        }

        let glow_radius = 50.0 + sb * 80.0 * settings.intensity;
        canvas.fill_circle(
            center,
            glow_radius,
            &Fill::radial(
                center,
                glow_radius,
                vec![
                    (0.0, primary.with_alpha(0.8)),
                    (0.4, primary.with_alpha(0.27)),
                    (1.0, primary.with_alpha(0.0)),
                ],
            ),
        );

        let disc = 15.0 + sb * 40.0 * settings.intensity;
        canvas.fill_circle(center, disc, &Fill::Solid(secondary));
    }

    fn reset_dynamics(&mut self) {
        self.features.reset();
        self.bass = 0.0;
        self.mid = 0.0;
        self.high = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visual::DrawCall;
    use crate::visual::test_support::{assert_idle_bounded, loud, run};

    fn rings(canvas: &crate::visual::RecordingCanvas) -> usize {
        canvas.count_where(|c| matches!(c, DrawCall::Circle { filled: false, .. }))
    }

    #[test]
    fn silence_draws_sixteen_rings_and_core() {
        let mut engine = DualPulseWaves::new();
        let canvas = run(&mut engine, &VisualizerSettings::default(), None, 1);
        assert_eq!(rings(&canvas), WAVES * RINGS_PER_WAVE);
        assert_eq!(
            canvas.count_where(|c| matches!(c, DrawCall::Circle { filled: true, .. })),
            2
        );
    }

    #[test]
    fn bass_expands_the_centre_disc() {
        let settings = VisualizerSettings::default();
        let mut engine = DualPulseWaves::new();
        let canvas = run(&mut engine, &settings, Some(&loud()), 40);
        let Some(DrawCall::Circle { radius, .. }) = canvas.calls().last() else {
            panic!("expected the centre disc last");
        };
        assert!(*radius > 50.0, "disc radius {radius}");
        assert!(engine.bass > 0.99);
    }

    #[test]
    fn rings_beyond_the_canvas_are_skipped() {
        let settings = VisualizerSettings {
            sensitivity: 3.0,
            ..VisualizerSettings::default()
        };
        let mut engine = DualPulseWaves::new();
        run(&mut engine, &settings, Some(&loud()), 60);
        let mut canvas = crate::visual::RecordingCanvas::new();
        engine.paint(&mut canvas, Size::new(200.0, 150.0), &settings);
        assert!(rings(&canvas) < WAVES * RINGS_PER_WAVE);
    }

    #[test]
    fn idle_is_bounded() {
        assert_idle_bounded(&mut DualPulseWaves::new());
    }
}
