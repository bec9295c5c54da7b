//! Owns the active render engine and drives it frame by frame.

pub mod scheduler;

pub use scheduler::{CancelToken, FixedFrames, FrameClock, FrameScheduler, FrameTick, run_loop};

use tracing::{debug, info};

use crate::analysis::FrequencyFrame;
use crate::settings::{Theme, VisualizerSettings};
use crate::visual::{Canvas, EngineStats, FrameInput, RenderEngine, Size, create_engine};

/// Holds the engine for the selected theme plus its scheduler
/// registration. Switching theme replaces the engine wholesale so no state
/// leaks between themes.
pub struct CanvasHost {
    engine: Option<Box<dyn RenderEngine>>,
    scheduler: FrameScheduler,
    token: Option<CancelToken>,
    size: Size,
    seed: Option<u64>,
}

impl CanvasHost {
    pub fn new() -> Self {
        Self {
            engine: None,
            scheduler: FrameScheduler::new(),
            token: None,
            size: Size::default(),
            seed: None,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::new()
        }
    }

    pub fn mount(&mut self, theme: Theme) {
        if let Some(old) = self.engine.as_ref() {
            info!(from = %old.theme(), to = %theme, "switching visualizer");
        } else {
            info!(%theme, "mounting visualizer");
        }
        self.engine = Some(create_engine(theme, self.seed));
        self.token = Some(self.scheduler.register());
    }

    pub fn unmount(&mut self) {
        if self.engine.take().is_some() {
            debug!("visualizer unmounted");
        }
        self.scheduler.cancel();
        self.token = None;
    }

    pub fn is_mounted(&self) -> bool {
        self.engine.is_some() && self.scheduler.is_live()
    }

    pub fn token(&self) -> Option<CancelToken> {
        self.token.clone()
    }

    pub fn theme(&self) -> Option<Theme> {
        self.engine.as_ref().map(|e| e.theme())
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Advances the engine by one frame. Does nothing once unmounted or
    /// when the registration was cancelled.
    pub fn frame(
        &mut self,
        size: Size,
        frame: Option<FrequencyFrame<'_>>,
        settings: &VisualizerSettings,
    ) {
        if !self.is_mounted() {
            return;
        }
        if self.theme() != Some(settings.theme) {
            self.mount(settings.theme);
        }
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        if size != self.size {
            debug!(width = size.width, height = size.height, "canvas resized");
            engine.reset_dynamics();
            self.size = size;
        }
        engine.update(&FrameInput {
            size,
            frame,
            settings,
        });
    }

    pub fn paint(&self, canvas: &mut dyn Canvas, settings: &VisualizerSettings) {
        if let Some(engine) = self.engine.as_ref() {
            engine.paint(canvas, self.size, settings);
        }
    }

    pub fn engine_stats(&self) -> EngineStats {
        self.engine.as_ref().map(|e| e.stats()).unwrap_or_default()
    }
}

impl Default for CanvasHost {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visual::RecordingCanvas;
    use crate::visual::test_support::{SIZE, loud};

    fn settings(theme: Theme) -> VisualizerSettings {
        VisualizerSettings {
            theme,
            ..VisualizerSettings::default()
        }
    }

    #[test]
    fn theme_switch_starts_from_fresh_populations() {
        let signal = loud();
        let mut host = CanvasHost::with_seed(9);
        let bloom = settings(Theme::PixelShockwave);
        host.mount(bloom.theme);
        for i in 0..20 {
            host.frame(SIZE, (i % 2 == 0).then(|| signal.frame()), &bloom);
        }
        assert!(host.engine_stats().population > 0);
        assert!(host.engine_stats().bursts > 0);

        let galaxy = settings(Theme::GalaxySpiral);
        host.frame(SIZE, None, &galaxy);
        assert_eq!(host.theme(), Some(Theme::GalaxySpiral));
        assert_eq!(host.engine_stats(), EngineStats { population: 300, bursts: 0 });

        host.frame(SIZE, None, &bloom);
        assert_eq!(host.theme(), Some(Theme::PixelShockwave));
        assert_eq!(host.engine_stats(), EngineStats::default());
    }

    #[test]
    fn frames_after_unmount_are_ignored() {
        let s = settings(Theme::WaveformRibbon);
        let mut host = CanvasHost::new();
        host.mount(s.theme);
        host.frame(SIZE, None, &s);
        assert_eq!(host.engine_stats().population, 1);

        host.unmount();
        host.frame(SIZE, None, &s);
        assert_eq!(host.theme(), None);
        let mut canvas = RecordingCanvas::new();
        host.paint(&mut canvas, &s);
        assert!(canvas.calls().is_empty());
    }

    #[test]
    fn cancelled_registration_stops_updates() {
        let s = settings(Theme::WaveformRibbon);
        let mut host = CanvasHost::new();
        host.mount(s.theme);
        host.frame(SIZE, None, &s);
        if let Some(token) = host.token() {
            token.cancel();
        }
        host.frame(SIZE, None, &s);
        host.frame(SIZE, None, &s);
        assert_eq!(host.engine_stats().population, 1);
    }

    #[test]
    fn run_loop_drives_the_host() {
        let s = settings(Theme::WaveformRibbon);
        let mut host = CanvasHost::new();
        host.mount(s.theme);
        let token = host.token().unwrap_or_default();
        let frames = run_loop(&mut FixedFrames::new(12), &token, |_| host.frame(SIZE, None, &s));
        assert_eq!(frames, 12);
        assert_eq!(host.engine_stats().population, 12);
        assert_eq!(host.size(), SIZE);
    }

    #[test]
    fn unmounted_host_never_paints() {
        let host = CanvasHost::new();
        let mut canvas = RecordingCanvas::new();
        host.paint(&mut canvas, &VisualizerSettings::default());
        assert!(canvas.calls().is_empty());
        assert_eq!(host.engine_stats(), EngineStats::default());
    }
}
