use rustfft::{FftPlanner, num_complex::Complex32};

use crate::error::AnalyzerError;

#[derive(Clone, Debug, PartialEq)]
pub struct AnalyzerConfig {
    pub fft_size: usize,
    pub smoothing_time_constant: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<(), AnalyzerError> {
        let n = self.fft_size;
        if !n.is_power_of_two() || !(32..=32768).contains(&n) {
            return Err(AnalyzerError::InvalidFftSize(n));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FrequencyFrame<'a> {
    /// Magnitude per bin, 0..=255 mapped from `[min_decibels, max_decibels]`.
    pub frequency: &'a [u8],
    // 128 = silence
    pub time_domain: &'a [u8],
}

/// Turns windows of mono `f32` samples into the byte buffers the render
/// engines are tuned against: smoothed dB magnitudes and a 128-centred
/// waveform, both `fft_size / 2` long.
pub struct FrequencyAnalyzer {
    config: AnalyzerConfig,

    blackman: Vec<f32>,
    fft_buf: Vec<Complex32>,
    smoothed: Vec<f32>,

    frequency: Vec<u8>,
    time_domain: Vec<u8>,

    fft: std::sync::Arc<dyn rustfft::Fft<f32>>,
}

impl FrequencyAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self, AnalyzerError> {
        config.validate()?;
        let fft_size = config.fft_size;
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_size);

        // Blackman window, alpha = 0.16
        let blackman = (0..fft_size)
            .map(|n| {
                let x = std::f32::consts::TAU * n as f32 / fft_size as f32;
                0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
            })
            .collect();
        let bins = fft_size / 2;

        Ok(Self {
            config,
            blackman,
            fft_buf: vec![Complex32::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; bins],
            frequency: vec![0; bins],
            time_domain: vec![128; bins],
            fft,
        })
    }

    pub fn fft_size(&self) -> usize {
        self.config.fft_size
    }

    pub fn bin_count(&self) -> usize {
        self.config.fft_size / 2
    }

    pub fn frame(&self) -> FrequencyFrame<'_> {
        FrequencyFrame {
            frequency: &self.frequency,
            time_domain: &self.time_domain,
        }
    }

    /// Runs the FFT over `window` and refreshes the frequency bytes.
    /// Windows shorter than `fft_size` are zero-padded at the front so the
    /// newest samples stay aligned with the end of the window.
    pub fn process_frequency(&mut self, window: &[f32]) {
        let n = self.config.fft_size;
        let take = window.len().min(n);
        let pad = n - take;
        let recent = &window[window.len() - take..];

        for i in 0..n {
            let x = if i < pad { 0.0 } else { recent[i - pad] };
            self.fft_buf[i] = Complex32::new(x * self.blackman[i], 0.0);
        }
        self.fft.process(&mut self.fft_buf);

        let tau = self.config.smoothing_time_constant;
        let min_db = self.config.min_decibels;
        let range = (self.config.max_decibels - min_db).max(f32::EPSILON);
        let norm = 1.0 / n as f32;

        for (k, out) in self.frequency.iter_mut().enumerate() {
            let mag = self.fft_buf[k].norm() * norm;
            let s = tau * self.smoothed[k] + (1.0 - tau) * mag;
            self.smoothed[k] = s;

            let db = if s > 0.0 { 20.0 * s.log10() } else { f32::NEG_INFINITY };
            let scaled = (255.0 / range * (db - min_db)).floor();
            *out = scaled.clamp(0.0, 255.0) as u8;
        }
    }

    //newest bin_count samples; missing ones read as silence
    pub fn process_time_domain(&mut self, window: &[f32]) {
        let bins = self.time_domain.len();
        let take = window.len().min(bins);
        let pad = bins - take;
        let recent = &window[window.len() - take..];
        for (i, out) in self.time_domain.iter_mut().enumerate() {
            let x = if i < pad { 0.0 } else { recent[i - pad] };
            *out = (128.0 * (1.0 + x)).clamp(0.0, 255.0) as u8;
        }
    }

    pub fn reset(&mut self) {
        self.smoothed.iter_mut().for_each(|s| *s = 0.0);
        self.frequency.iter_mut().for_each(|b| *b = 0);
        self.time_domain.iter_mut().for_each(|b| *b = 128);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq_bin: usize, n: usize, amp: f32) -> Vec<f32> {
        (0..n)
            .map(|i| {
                amp * (std::f32::consts::TAU * freq_bin as f32 * i as f32 / n as f32).sin()
            })
            .collect()
    }

    #[test]
    fn rejects_bad_fft_sizes() {
        for n in [0, 16, 1000, 65536] {
            let cfg = AnalyzerConfig {
                fft_size: n,
                ..AnalyzerConfig::default()
            };
            assert_eq!(
                FrequencyAnalyzer::new(cfg).err(),
                Some(AnalyzerError::InvalidFftSize(n))
            );
        }
    }

    #[test]
    fn buffers_have_fixed_length() {
        let mut a = FrequencyAnalyzer::new(AnalyzerConfig::default()).unwrap();
        assert_eq!(a.bin_count(), 1024);
        a.process_frequency(&[0.5; 10]);
        a.process_time_domain(&[0.5; 4096]);
        assert_eq!(a.frame().frequency.len(), 1024);
        assert_eq!(a.frame().time_domain.len(), 1024);
    }

    #[test]
    fn silence_yields_zero_magnitudes_and_centred_waveform() {
        let mut a = FrequencyAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let window = vec![0.0; 2048];
        a.process_frequency(&window);
        a.process_time_domain(&window);
        assert!(a.frame().frequency.iter().all(|&b| b == 0));
        assert!(a.frame().time_domain.iter().all(|&b| b == 128));
    }

    #[test]
    fn sine_peaks_at_its_bin() {
        let mut a = FrequencyAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let window = sine(40, 2048, 0.05);
        for _ in 0..20 {
            a.process_frequency(&window);
        }
        let freq = a.frame().frequency;
        let peak = freq
            .iter()
            .enumerate()
            .max_by_key(|(_, v)| **v)
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 40);
        assert!(freq[40] > 200);
        assert!(freq[400] < freq[40] / 2);
    }

    #[test]
    fn time_domain_maps_full_scale() {
        let mut a = FrequencyAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let mut window = vec![0.0; 1024];
        window[1022] = 1.0;
        window[1023] = -1.0;
        a.process_time_domain(&window);
        let td = a.frame().time_domain;
        assert_eq!(td[0], 128);
        assert_eq!(td[1022], 255);
        assert_eq!(td[1023], 0);
    }

    #[test]
    fn smoothing_decays_after_signal_stops() {
        let mut a = FrequencyAnalyzer::new(AnalyzerConfig::default()).unwrap();
        let loud = sine(40, 2048, 0.05);
        for _ in 0..20 {
            a.process_frequency(&loud);
        }
        let before = a.frame().frequency[40];
        a.process_frequency(&vec![0.0; 2048]);
        let after = a.frame().frequency[40];
        assert!(after < before);
        assert!(after > 0, "one silent frame should not zero a smoothed bin");

        a.reset();
        assert!(a.frame().frequency.iter().all(|&b| b == 0));
    }
}
