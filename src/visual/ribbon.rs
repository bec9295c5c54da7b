//! The waveform drawn as a ribbon receding over a grid floor, older frames
//! further back.

use std::collections::VecDeque;
use std::f32::consts::PI;

use nannou::prelude::{Point2, pt2};

use crate::analysis::{BandLayout, FeatureExtractor};
use crate::settings::{Theme, VisualizerSettings};
use crate::visual::canvas::{Canvas, Fill, Stroke};
use crate::visual::color::Rgba;
use crate::visual::{EngineStats, FrameInput, RenderEngine, Size};

pub const HISTORY_DEPTH: usize = 30;
pub const WAVE_POINTS: usize = 128;

#[derive(Clone, Debug)]
pub struct WaveSample {
    /// Waveform values roughly in `[-1, 1]`.
    pub points: Vec<f32>,
    /// Set when the samples are the idle sine rather than audio.
    pub synthetic: bool,
}

pub struct WaveformRibbon {
    features: FeatureExtractor,
    /// Newest first.
    history: VecDeque<WaveSample>,
    time: f32,
    bass: f32,
}

impl WaveformRibbon {
    pub fn new() -> Self {
        Self {
            features: FeatureExtractor::new(BandLayout::default(), 0.24),
            history: VecDeque::with_capacity(HISTORY_DEPTH + 1),
            time: 0.0,
            bass: 0.0,
        }
    }

    pub fn history(&self) -> &VecDeque<WaveSample> {
        &self.history
    }

    /// Takes the oldest buffer back once the history is full instead of
    /// allocating a new one each frame.
    fn next_buffer(&mut self) -> Vec<f32> {
        if self.history.len() >= HISTORY_DEPTH {
            if let Some(mut old) = self.history.pop_back() {
                old.points.clear();
                return old.points;
            }
        }
        Vec::with_capacity(WAVE_POINTS)
    }

    fn ribbon(wave: &[f32], width: f32, y_offset: f32, amplitude: f32) -> Vec<Point2> {
        let n = wave.len().max(1) as f32;
        wave.iter()
            .enumerate()
            .map(|(i, v)| pt2(i as f32 / n * width, y_offset + v * amplitude))
            .collect()
    }
}

impl Default for WaveformRibbon {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderEngine for WaveformRibbon {
    fn theme(&self) -> Theme {
        Theme::WaveformRibbon
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let settings = input.settings;
        // sin(2t) repeats every PI
        self.time = (self.time + 0.03 * settings.speed).rem_euclid(PI);
        self.bass = self
            .features
            .extract(input.frequency(), settings.sensitivity)
            .smoothed
            .bass;

        let mut points = self.next_buffer();
        let synthetic = match input.time_domain().filter(|d| !d.is_empty()) {
            Some(data) => {
                points.extend((0..WAVE_POINTS).map(|i| {
                    let idx = i * data.len() / WAVE_POINTS;
                    (data[idx] as f32 - 128.0) / 128.0
                }));
                false
            }
            None => {
                let t = self.time;
                points.extend((0..WAVE_POINTS).map(|i| (i as f32 * 0.1 + t * 2.0).sin() * 0.3));
                true
            }
        };
        self.history.push_front(WaveSample { points, synthetic });
        self.history.truncate(HISTORY_DEPTH);
    }

    fn paint(&self, canvas: &mut dyn Canvas, size: Size, settings: &VisualizerSettings) {
        canvas.clear(settings.background_color.into());
        if size.is_empty() {
            return;
        }
        let (w, h) = (size.width, size.height);
        let primary = Rgba::from(settings.primary_color);
        let secondary = Rgba::from(settings.secondary_color);

        let floor = h * 0.7;
        let grid = Stroke::new(secondary.with_alpha(0.19), 1.0);
        for i in 0..20 {
            let y = floor + i as f32 * 20.0;
            canvas.stroke_path(&[pt2(0.0, y), pt2(w, y)], false, grid);
        }
        let mut x = 0.0;
        while x < w {
            canvas.stroke_path(&[pt2(x, floor), pt2(x, floor + 400.0)], false, grid);
            x += 40.0;
        }

        let len = self.history.len() as f32;
        for (i, entry) in self.history.iter().enumerate() {
            let depth = i as f32 / len;
            let y_offset = h * 0.4 + depth * h * 0.3;
            let scale = 1.0 - depth * 0.5;
            let alpha = (1.0 - depth) * 0.8;
            let amplitude = h * 0.2 * scale * settings.intensity;
            let line = Self::ribbon(&entry.points, w, y_offset, amplitude);

            let color = primary.lerp(secondary, depth).with_alpha(alpha);
            let width = (4.0 - depth * 3.0) * (1.0 + self.bass * 2.0);
            let glow = 20.0 - depth * 15.0 + self.bass * 20.0;
            canvas.stroke_path(&line, false, Stroke::new(color, width).glow(glow));

            let mut under = line;
            under.push(pt2(w, y_offset + h));
            under.push(pt2(0.0, y_offset + h));
            canvas.fill_path(
                &under,
                &Fill::Vertical {
                    top: y_offset,
                    bottom: y_offset + 100.0,
                    from: primary.with_alpha(0.125 * alpha * 0.3),
                    to: Rgba::TRANSPARENT,
                },
            );
        }

        if let Some(newest) = self.history.front() {
            let amplitude = h * 0.25 * settings.intensity;
            let line = Self::ribbon(&newest.points, w, h * 0.4, amplitude);
            canvas.stroke_path(
                &line,
                false,
                Stroke::new(Rgba::WHITE, 4.0 + self.bass * 6.0).glow(30.0 + self.bass * 30.0),
            );
        }
    }

    fn reset_dynamics(&mut self) {
        self.features.reset();
        self.bass = 0.0;
    }

    fn stats(&self) -> EngineStats {
        EngineStats {
            population: self.history.len(),
            bursts: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visual::DrawCall;
    use crate::visual::test_support::{SIZE, Signal, assert_idle_bounded, loud, run};

    #[test]
    fn history_is_capped_newest_first() {
        let settings = VisualizerSettings::default();
        let mut engine = WaveformRibbon::new();
        run(&mut engine, &settings, Some(&loud()), 45);
        assert_eq!(engine.history().len(), HISTORY_DEPTH);
        assert!(engine.history().iter().all(|s| s.points.len() == WAVE_POINTS));

        run(&mut engine, &settings, None, 1);
        assert_eq!(engine.history().len(), HISTORY_DEPTH);
        assert!(engine.history()[0].synthetic);
        assert!(!engine.history()[1].synthetic);
    }

    #[test]
    fn audio_samples_are_centred_on_128() {
        let settings = VisualizerSettings::default();
        let ramp = Signal {
            frequency: vec![0; 1024],
            time_domain: (0..1024).map(|i| (i / 8) as u8).collect(),
        };
        let mut engine = WaveformRibbon::new();
        run(&mut engine, &settings, Some(&ramp), 1);
        let newest = &engine.history()[0].points;
        assert_eq!(newest[0], -1.0);
        assert_eq!(newest[64], -0.5);
        assert!(!engine.history()[0].synthetic);
    }

    #[test]
    fn newest_ribbon_is_redrawn_on_top() {
        let settings = VisualizerSettings::default();
        let mut engine = WaveformRibbon::new();
        let canvas = run(&mut engine, &settings, None, 3);
        let Some(DrawCall::Path { points, filled: false, .. }) = canvas.calls().last() else {
            panic!("expected the white ribbon last");
        };
        assert_eq!(points.len(), WAVE_POINTS);
        assert!(points.iter().all(|p| (p.y - SIZE.height * 0.4).abs() <= SIZE.height * 0.25 * 0.3 + 1e-3));
        let fills = canvas.count_where(|c| matches!(c, DrawCall::Path { filled: true, .. }));
        assert_eq!(fills, 3);
    }

    #[test]
    fn idle_is_bounded() {
        assert_idle_bounded(&mut WaveformRibbon::new());
    }
}
