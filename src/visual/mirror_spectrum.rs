//! Spectrum bars mirrored about the horizontal centre line, boosted by bass
//! and beat.

use nannou::prelude::pt2;

use crate::analysis::{BandLayout, BeatConfig, FeatureExtractor};
use crate::settings::{Theme, VisualizerSettings};
use crate::visual::canvas::{Canvas, Fill};
use crate::visual::color::Rgba;
use crate::visual::{FrameInput, RenderEngine, Size};

pub const BAR_COUNT: usize = 64;
const VALUE_SMOOTHING: f32 = 0.26;
const HEIGHT_EASE: f32 = 0.2;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpectrumBar {
    pub smoothed: f32,
    pub target: f32,
    /// Height as a fraction of the maximum bar height.
    pub current: f32,
}

pub struct PulseMirrorSpectrum {
    features: FeatureExtractor,
    bars: [SpectrumBar; BAR_COUNT],
    bass: f32,
    beat: f32,
}

impl PulseMirrorSpectrum {
    pub fn new() -> Self {
        Self {
            features: FeatureExtractor::new(BandLayout::new(0..8, 8..100, 100..256), 0.16)
                .with_beat(BeatConfig {
                    threshold: 0.10,
                    gain: 7.0,
                    decay: 0.88,
                }),
            bars: [SpectrumBar::default(); BAR_COUNT],
            bass: 0.0,
            beat: 0.0,
        }
    }

    pub fn bars(&self) -> &[SpectrumBar] {
        &self.bars
    }
}

impl Default for PulseMirrorSpectrum {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderEngine for PulseMirrorSpectrum {
    fn theme(&self) -> Theme {
        Theme::PulseMirrorSpectrum
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let settings = input.settings;
        let bins = input.frequency();
        let f = self.features.extract(bins, settings.sensitivity);
        self.bass = f.smoothed.bass;
        self.beat = f.beat;

        let boost = 1.2 + 1.8 * self.bass + 1.5 * self.beat;
        let len = bins.map_or(0, <[u8]>::len);
        for (i, bar) in self.bars.iter_mut().enumerate() {
            let idx = i * len / BAR_COUNT;
            let raw = bins
                .and_then(|b| b.get(idx))
                .map_or(0.0, |&v| v as f32 / 255.0 * settings.sensitivity);
            bar.smoothed += (raw - bar.smoothed) * VALUE_SMOOTHING;
            bar.target = bar.smoothed * settings.intensity * boost;
            bar.current += (bar.target - bar.current) * HEIGHT_EASE;
        }
    }

    fn paint(&self, canvas: &mut dyn Canvas, size: Size, settings: &VisualizerSettings) {
        canvas.clear(settings.background_color.into());
        if size.is_empty() {
            return;
        }
        let (w, h) = (size.width, size.height);
        let center = size.center();
        let primary = Rgba::from(settings.primary_color);
        let secondary = Rgba::from(settings.secondary_color);

        let spacing = w / BAR_COUNT as f32;
        let max_height = h * 0.7;
        for (i, bar) in self.bars.iter().enumerate() {
            let x = i as f32 * spacing;
            let bar_height = bar.current * max_height;
            let base = if i % 2 == 0 { primary } else { secondary };
            let fill = Fill::Solid(base.with_alpha(0.5 + bar.current * 0.5));
            canvas.fill_rect(x, center.y - bar_height, spacing * 0.85, bar_height, &fill);
            canvas.fill_rect(x, center.y, spacing * 0.85, bar_height, &fill);
        }

        let line = 6.0 + self.bass * 20.0;
        canvas.fill_rect(0.0, center.y - line * 0.5, w, line, &Fill::Solid(primary));

        let glow = 80.0 + self.bass * 120.0 * settings.intensity;
        canvas.fill_circle(
            center,
            glow,
            &Fill::radial(
                pt2(center.x, center.y),
                glow,
                vec![
                    (0.0, secondary.with_alpha(0.8)),
                    (0.3, secondary.with_alpha(0.27)),
                    (1.0, Rgba::TRANSPARENT),
                ],
            ),
        );
    }

    fn reset_dynamics(&mut self) {
        self.features.reset();
        self.bass = 0.0;
        self.beat = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visual::DrawCall;
    use crate::visual::test_support::{SIZE, assert_idle_bounded, loud, run};

    #[test]
    fn bars_smooth_then_ease() {
        let settings = VisualizerSettings::default();
        let mut engine = PulseMirrorSpectrum::new();
        run(&mut engine, &settings, Some(&loud()), 1);
        let bar = engine.bars()[10];
        assert!((bar.smoothed - 0.26).abs() < 1e-6);
        // bass 0.16 smoothed, beat 1.0 on the first loud frame
        let boost = 1.2 + 1.8 * 0.16 + 1.5;
        assert!((bar.target - 0.26 * boost).abs() < 1e-5);
        assert!((bar.current - 0.2 * 0.26 * boost).abs() < 1e-5);
    }

    #[test]
    fn bars_are_mirrored_about_the_centre() {
        let settings = VisualizerSettings::default();
        let mut engine = PulseMirrorSpectrum::new();
        let canvas = run(&mut engine, &settings, Some(&loud()), 20);
        let rects: Vec<_> = canvas
            .calls()
            .iter()
            .filter_map(|c| match c {
                DrawCall::Rect { y, h, .. } => Some((*y, *h)),
                _ => None,
            })
            .collect();
        // two halves per bar plus the centre line
        assert_eq!(rects.len(), BAR_COUNT * 2 + 1);
        let cy = SIZE.height * 0.5;
        let (up_y, up_h) = rects[0];
        let (down_y, down_h) = rects[1];
        assert!((up_y + up_h - cy).abs() < 1e-3);
        assert_eq!(down_y, cy);
        assert_eq!(up_h, down_h);
        assert!(up_h > 0.0);
    }

    #[test]
    fn silence_leaves_flat_bars_and_base_glow() {
        let settings = VisualizerSettings::default();
        let mut engine = PulseMirrorSpectrum::new();
        let canvas = run(&mut engine, &settings, None, 3);
        assert!(engine.bars().iter().all(|b| b.current == 0.0));
        let Some(DrawCall::Circle { radius, .. }) = canvas.calls().last() else {
            panic!("expected the centre glow last");
        };
        assert_eq!(*radius, 80.0);
    }

    #[test]
    fn idle_is_bounded() {
        assert_idle_bounded(&mut PulseMirrorSpectrum::new());
    }
}
