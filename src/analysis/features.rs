//! Scalar band features derived from the analyser's frequency bytes.
//!
//! Every render engine owns its own [`FeatureExtractor`]; the smoothing and
//! beat constants are part of each effect's look and are never shared.

use std::ops::Range;

/// Fixed bin ranges for the three bands. Ranges that run past the end of
/// the buffer are clipped; an empty range reads as 0.
#[derive(Clone, Debug, PartialEq)]
pub struct BandLayout {
    pub bass: Range<usize>,
    pub mid: Range<usize>,
    pub high: Range<usize>,
}

impl BandLayout {
    pub const fn new(bass: Range<usize>, mid: Range<usize>, high: Range<usize>) -> Self {
        Self { bass, mid, high }
    }
}

impl Default for BandLayout {
    fn default() -> Self {
        Self::new(0..10, 10..100, 100..256)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FeatureSnapshot {
    pub bass: f32,
    pub mid: f32,
    pub high: f32,
    pub average: f32,
}

impl FeatureSnapshot {
    //None means no source: all zero
    pub fn from_bins(layout: &BandLayout, bins: Option<&[u8]>, sensitivity: f32) -> Self {
        let Some(bins) = bins else {
            return Self::default();
        };
        Self {
            bass: band_mean(bins, &layout.bass) * sensitivity,
            mid: band_mean(bins, &layout.mid) * sensitivity,
            high: band_mean(bins, &layout.high) * sensitivity,
            average: band_mean(bins, &(0..bins.len())) * sensitivity,
        }
    }
}

pub fn band_mean(bins: &[u8], range: &Range<usize>) -> f32 {
    let end = range.end.min(bins.len());
    let start = range.start.min(end);
    let slice = &bins[start..end];
    if slice.is_empty() {
        return 0.0;
    }
    let sum: u32 = slice.iter().map(|&b| b as u32).sum();
    sum as f32 / slice.len() as f32 / 255.0
}

/// Exponential moving average: `value += (raw - value) * alpha`.
#[derive(Clone, Copy, Debug)]
pub struct Smoother {
    alpha: f32,
    value: f32,
}

impl Smoother {
    pub fn new(alpha: f32) -> Self {
        Self { alpha, value: 0.0 }
    }

    pub fn update(&mut self, raw: f32) -> f32 {
        self.value += (raw - self.value) * self.alpha;
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeatConfig {
    /// Minimum frame-to-frame bass rise that counts as a hit.
    pub threshold: f32,
    pub gain: f32,
    pub decay: f32,
}

/// Fast-attack, slow-release envelope driven by the bass rate of rise.
///
/// Each frame decays first and then adds `delta * gain` when the rise
/// exceeds the threshold, so the pulse can only grow in a trigger frame.
#[derive(Clone, Debug)]
pub struct BeatPulse {
    config: BeatConfig,
    prev_bass: f32,
    pulse: f32,
}

impl BeatPulse {
    pub fn new(config: BeatConfig) -> Self {
        Self {
            config,
            prev_bass: 0.0,
            pulse: 0.0,
        }
    }

    pub fn update(&mut self, bass: f32) -> bool {
        let delta = bass - self.prev_bass;
        self.prev_bass = bass;
        self.pulse *= self.config.decay;
        let triggered = delta > self.config.threshold;
        if triggered {
            self.pulse = (self.pulse + delta * self.config.gain).min(1.0);
        }
        triggered
    }

    pub fn value(&self) -> f32 {
        self.pulse
    }

    pub fn reset(&mut self) {
        self.prev_bass = 0.0;
        self.pulse = 0.0;
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Features {
    pub raw: FeatureSnapshot,
    pub smoothed: FeatureSnapshot,
    pub beat: f32,
    pub triggered: bool,
}

#[derive(Clone, Debug)]
pub struct FeatureExtractor {
    layout: BandLayout,
    bass: Smoother,
    mid: Smoother,
    high: Smoother,
    average: Smoother,
    beat: Option<BeatPulse>,
}

impl FeatureExtractor {
    pub fn new(layout: BandLayout, alpha: f32) -> Self {
        Self {
            layout,
            bass: Smoother::new(alpha),
            mid: Smoother::new(alpha),
            high: Smoother::new(alpha),
            average: Smoother::new(alpha),
            beat: None,
        }
    }

    pub fn with_beat(mut self, config: BeatConfig) -> Self {
        self.beat = Some(BeatPulse::new(config));
        self
    }

    pub fn layout(&self) -> &BandLayout {
        &self.layout
    }

    pub fn extract(&mut self, bins: Option<&[u8]>, sensitivity: f32) -> Features {
        let raw = FeatureSnapshot::from_bins(&self.layout, bins, sensitivity);
        let smoothed = FeatureSnapshot {
            bass: self.bass.update(raw.bass),
            mid: self.mid.update(raw.mid),
            high: self.high.update(raw.high),
            average: self.average.update(raw.average),
        };
        let (beat, triggered) = match self.beat.as_mut() {
            Some(b) => {
                let triggered = b.update(raw.bass);
                (b.value(), triggered)
            }
            None => (0.0, false),
        };
        Features {
            raw,
            smoothed,
            beat,
            triggered,
        }
    }

    pub fn reset(&mut self) {
        self.bass.reset();
        self.mid.reset();
        self.high.reset();
        self.average.reset();
        if let Some(b) = self.beat.as_mut() {
            b.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TEST_BEAT: BeatConfig = BeatConfig {
        threshold: 0.08,
        gain: 6.0,
        decay: 0.92,
    };

    fn bass_only_frame() -> Vec<u8> {
        let mut bins = vec![0u8; 1024];
        bins[..10].fill(255);
        bins
    }

    #[test]
    fn bass_only_frame_smooths_to_alpha() {
        let layout = BandLayout::new(0..10, 50..150, 150..256);
        let mut fx = FeatureExtractor::new(layout, 0.18);
        let bins = bass_only_frame();
        let f = fx.extract(Some(&bins), 1.0);
        assert!((f.raw.bass - 1.0).abs() < 1e-6);
        assert_eq!(f.raw.mid, 0.0);
        assert_eq!(f.raw.high, 0.0);
        assert!((f.smoothed.bass - 0.18).abs() < 1e-6);
    }

    #[test]
    fn missing_source_is_silent() {
        let mut fx = FeatureExtractor::new(BandLayout::default(), 0.2).with_beat(TEST_BEAT);
        let f = fx.extract(None, 3.0);
        assert_eq!(f.raw, FeatureSnapshot::default());
        assert_eq!(f.smoothed, FeatureSnapshot::default());
        assert_eq!(f.beat, 0.0);
        assert!(!f.triggered);
    }

    #[test]
    fn sensitivity_is_not_clamped() {
        let bins = bass_only_frame();
        let snap = FeatureSnapshot::from_bins(&BandLayout::default(), Some(&bins), 2.5);
        assert!((snap.bass - 2.5).abs() < 1e-5);
    }

    #[test]
    fn ranges_past_the_buffer_are_clipped() {
        let bins = vec![255u8; 64];
        let layout = BandLayout::new(0..8, 8..120, 120..256);
        let snap = FeatureSnapshot::from_bins(&layout, Some(&bins), 1.0);
        assert!((snap.mid - 1.0).abs() < 1e-6);
        assert_eq!(snap.high, 0.0);
        assert_eq!(FeatureSnapshot::from_bins(&layout, Some(&[]), 1.0), FeatureSnapshot::default());
    }

    #[test]
    fn beat_attack_then_decay() {
        let mut beat = BeatPulse::new(TEST_BEAT);
        beat.update(0.1);
        assert!(beat.update(0.3));
        assert!((beat.value() - 1.0).abs() < 1e-6);
        assert!(!beat.update(0.3));
        assert!((beat.value() - 0.92).abs() < 1e-6);
    }

    #[test]
    fn small_rises_do_not_trigger() {
        let mut beat = BeatPulse::new(TEST_BEAT);
        for i in 0..20 {
            assert!(!beat.update(i as f32 * 0.05));
        }
        assert_eq!(beat.value(), 0.0);
    }

    #[test]
    fn reset_clears_state() {
        let mut fx = FeatureExtractor::new(BandLayout::default(), 0.5).with_beat(TEST_BEAT);
        let bins = bass_only_frame();
        fx.extract(Some(&bins), 1.0);
        fx.reset();
        let f = fx.extract(None, 1.0);
        assert_eq!(f.smoothed.bass, 0.0);
        assert_eq!(f.beat, 0.0);
    }

    proptest! {
        #[test]
        fn bands_stay_within_sensitivity(
            bins in proptest::collection::vec(any::<u8>(), 1024),
            sensitivity in 0.1f32..3.0,
        ) {
            let snap = FeatureSnapshot::from_bins(&BandLayout::default(), Some(&bins), sensitivity);
            for v in [snap.bass, snap.mid, snap.high, snap.average] {
                prop_assert!(v >= 0.0);
                prop_assert!(v <= sensitivity + 1e-5);
            }
        }

        #[test]
        fn beat_only_rises_on_trigger(basses in proptest::collection::vec(0.0f32..3.0, 1..200)) {
            let mut beat = BeatPulse::new(TEST_BEAT);
            for bass in basses {
                let before = beat.value();
                let triggered = beat.update(bass);
                prop_assert!(beat.value() >= 0.0 && beat.value() <= 1.0);
                if !triggered {
                    prop_assert!(beat.value() <= before);
                }
            }
        }
    }
}
