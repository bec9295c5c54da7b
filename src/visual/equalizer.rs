//! Segmented LED-style bars over a faint grid, with a reflection under the
//! floor line.

use crate::analysis::{BandLayout, FeatureExtractor};
use crate::settings::{Theme, VisualizerSettings};
use crate::visual::canvas::{Canvas, Fill};
use crate::visual::color::Rgba;
use crate::visual::{FrameInput, RenderEngine, Size};

const BARS: usize = 32;
const BAR_GAP: f32 = 4.0;
const SEGMENT: f32 = 8.0;
const GRID_STEP: f32 = 20.0;
const EASE: f32 = 0.3;

pub struct RetroEqualizer {
    features: FeatureExtractor,
    /// Bar heights as a fraction of the maximum bar height.
    heights: [f32; BARS],
    bass: f32,
}

impl RetroEqualizer {
    pub fn new() -> Self {
        Self {
            features: FeatureExtractor::new(BandLayout::default(), 0.30),
            heights: [0.0; BARS],
            bass: 0.0,
        }
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }
}

impl Default for RetroEqualizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderEngine for RetroEqualizer {
    fn theme(&self) -> Theme {
        Theme::RetroEqualizer
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let settings = input.settings;
        let bins = input.frequency();
        self.bass = self.features.extract(bins, settings.sensitivity).smoothed.bass;

        let len = bins.map_or(0, <[u8]>::len);
        for (i, h) in self.heights.iter_mut().enumerate() {
            // Only the lower half of the spectrum carries visible energy.
            let idx = (i as f32 / BARS as f32 * len as f32 * 0.5) as usize;
            let value = bins
                .and_then(|b| b.get(idx))
                .map_or(0.0, |&v| v as f32 / 255.0 * settings.sensitivity);
            let target = value * settings.intensity;
            *h += (target - *h) * EASE * settings.speed;
        }
    }

    fn paint(&self, canvas: &mut dyn Canvas, size: Size, settings: &VisualizerSettings) {
        canvas.clear(settings.background_color.into());
        if size.is_empty() {
            return;
        }
        let (w, h) = (size.width, size.height);
        let primary = Rgba::from(settings.primary_color);

        let grid = Fill::Solid(Rgba::new(1.0, 0.0, 1.0, 0.1));
        let mut gx = 0.0;
        while gx < w {
            canvas.fill_rect(gx, 0.0, 1.0, h, &grid);
            gx += GRID_STEP;
        }
        let mut gy = 0.0;
        while gy < h {
            canvas.fill_rect(0.0, gy, w, 1.0, &grid);
            gy += GRID_STEP;
        }

        let floor = h * 0.9;
        let max_height = h * 0.85;
        let bar_width = (w / BARS as f32 - BAR_GAP).max(1.0);

        // segments above the top edge are never drawn
        let visible = (floor / SEGMENT).ceil() as usize;

        for (i, &level) in self.heights.iter().enumerate() {
            let x = i as f32 * (bar_width + BAR_GAP) + BAR_GAP * 0.5;
            let bar_height = (level.max(0.0) * max_height).max(4.0);
            let segments = (bar_height / SEGMENT).ceil() as usize;

            for s in 0..segments.min(visible) {
                let seg_y = floor - (s + 1) as f32 * SEGMENT;
                let color = match s as f32 / segments as f32 {
                    r if r > 0.8 => Rgba::RED,
                    r if r > 0.6 => Rgba::YELLOW,
                    _ => primary,
                };
                canvas.fill_rect(x, seg_y, bar_width, SEGMENT - 2.0, &Fill::Solid(color));
            }

            let shown = bar_height.min(floor);
            let top = floor - shown;
            canvas.fill_rect(x, top - 4.0, bar_width, 3.0, &Fill::Solid(Rgba::WHITE));

            let reflection = shown * 0.3;
            canvas.fill_rect(
                x,
                floor,
                bar_width,
                reflection,
                &Fill::Vertical {
                    top: floor,
                    bottom: floor + reflection,
                    from: primary.with_alpha(0.25 * 0.2),
                    to: primary.with_alpha(0.0),
                },
            );
        }

        // floor line brightens with the bass
        let floor_alpha = 0.5 + 0.5 * self.bass.min(1.0);
        canvas.fill_rect(0.0, floor, w, 1.0, &Fill::Solid(primary.with_alpha(floor_alpha)));
    }

    fn reset_dynamics(&mut self) {
        self.features.reset();
        self.bass = 0.0;
    }
}
