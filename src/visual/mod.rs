//! Per-theme render engines and the surface they draw on.

pub mod canvas;
pub mod color;
pub mod contour_bloom;
pub mod equalizer;
pub mod galaxy;
pub mod mirror_spectrum;
pub mod nannou_canvas;
pub mod pulse_waves;
pub mod ribbon;

use nannou::prelude::{Point2, pt2};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::analysis::FrequencyFrame;
use crate::settings::{Theme, VisualizerSettings};

pub use canvas::{Blend, Canvas, DrawCall, Fill, RecordingCanvas, Stroke};
pub use color::Rgba;
pub use contour_bloom::ContourBloom;
pub use equalizer::RetroEqualizer;
pub use galaxy::GalaxySpiral;
pub use mirror_spectrum::PulseMirrorSpectrum;
pub use nannou_canvas::DrawCanvas;
pub use pulse_waves::DualPulseWaves;
pub use ribbon::WaveformRibbon;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point2 {
        pt2(self.width * 0.5, self.height * 0.5)
    }

    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }

    pub fn max_side(&self) -> f32 {
        self.width.max(self.height)
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FrameInput<'a> {
    pub size: Size,
    // None when no audio source is connected
    pub frame: Option<FrequencyFrame<'a>>,
    pub settings: &'a VisualizerSettings,
}

impl<'a> FrameInput<'a> {
    pub fn frequency(&self) -> Option<&'a [u8]> {
        self.frame.map(|f| f.frequency)
    }

    pub fn time_domain(&self) -> Option<&'a [u8]> {
        self.frame.map(|f| f.time_domain)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    // stars, sparks or history entries
    pub population: usize,
    pub bursts: usize,
}

/// One theme's animation. `update` integrates state by one frame, `paint`
/// draws the current state over the full canvas.
pub trait RenderEngine {
    fn theme(&self) -> Theme;

    fn update(&mut self, input: &FrameInput<'_>);

    fn paint(&self, canvas: &mut dyn Canvas, size: Size, settings: &VisualizerSettings);

    /// Drops smoothing and beat state, keeping any seeded population.
    fn reset_dynamics(&mut self);

    fn stats(&self) -> EngineStats {
        EngineStats::default()
    }
}

pub fn create_engine(theme: Theme, seed: Option<u64>) -> Box<dyn RenderEngine> {
    let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    match theme {
        Theme::DualPulseWaves => Box::new(DualPulseWaves::new()),
        Theme::RetroEqualizer => Box::new(RetroEqualizer::new()),
        Theme::PixelShockwave => Box::new(ContourBloom::new(rng)),
        Theme::GalaxySpiral => Box::new(GalaxySpiral::new(rng)),
        Theme::WaveformRibbon => Box::new(WaveformRibbon::new()),
        Theme::PulseMirrorSpectrum => Box::new(PulseMirrorSpectrum::new()),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::settings::VisualizerSettings;

    pub const SIZE: Size = Size::new(800.0, 600.0);

    pub struct Signal {
        pub frequency: Vec<u8>,
        pub time_domain: Vec<u8>,
    }

    impl Signal {
        pub fn frame(&self) -> FrequencyFrame<'_> {
            FrequencyFrame {
                frequency: &self.frequency,
                time_domain: &self.time_domain,
            }
        }
    }

    //full-scale bins, square-ish waveform
    pub fn loud() -> Signal {
        Signal {
            frequency: vec![255; 1024],
            time_domain: (0..1024).map(|i| if i % 2 == 0 { 255 } else { 0 }).collect(),
        }
    }

    /// Runs `frames` updates with `signal` (or no source) and returns a
    /// recording of the final paint.
    pub fn run(
        engine: &mut dyn RenderEngine,
        settings: &VisualizerSettings,
        signal: Option<&Signal>,
        frames: usize,
    ) -> RecordingCanvas {
        for _ in 0..frames {
            let input = FrameInput {
                size: SIZE,
                frame: signal.map(Signal::frame),
                settings,
            };
            engine.update(&input);
        }
        let mut canvas = RecordingCanvas::new();
        engine.paint(&mut canvas, SIZE, settings);
        canvas
    }

    pub fn assert_idle_bounded(engine: &mut dyn RenderEngine) {
        let settings = VisualizerSettings::default();
        run(engine, &settings, Some(&loud()), 60);
        let canvas = run(engine, &settings, None, 150);
        assert!(canvas.all_finite());
        assert!(
            canvas.max_extent() < SIZE.max_side() * 3.0,
            "extent {} diverged",
            canvas.max_extent()
        );
        assert!(
            matches!(canvas.first(), Some(DrawCall::Clear(_) | DrawCall::Fade(_))),
            "paint must begin with a clear or fade"
        );
    }
}
