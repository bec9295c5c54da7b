use hound::{SampleFormat, WavReader};
use rodio::{Decoder, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::SourceError;

/// Fully decoded mono track, kept in memory so the analyser can window it
/// at the current playback position.
#[derive(Clone)]
pub struct AudioData {
    pub sample_rate: u32,
    pub samples_mono: Vec<f32>,
    pub duration_sec: f32,
}

impl AudioData {
    //wav through hound, everything else through rodio's decoder
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let is_wav = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
        if is_wav {
            Self::load_wav(path)
        } else {
            Self::load_compressed(path)
        }
    }

    pub fn load_wav(path: &Path) -> Result<Self, SourceError> {
        let decode_err = |reason: String| SourceError::Decode {
            path: path.to_path_buf(),
            reason,
        };
        let mut reader = WavReader::open(path).map_err(|e| decode_err(e.to_string()))?;
        let spec = reader.spec();
        let channels = spec.channels as usize;
        if channels == 0 {
            return Err(decode_err("zero channels".into()));
        }

        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| decode_err(e.to_string()))?,
            SampleFormat::Int => {
                if !(8..=32).contains(&spec.bits_per_sample) {
                    return Err(decode_err(format!(
                        "unsupported {}-bit PCM",
                        spec.bits_per_sample
                    )));
                }
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| decode_err(e.to_string()))?
            }
        };

        Ok(Self::from_interleaved(&interleaved, channels, spec.sample_rate))
    }

    fn load_compressed(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let decoder = Decoder::new(BufReader::new(file)).map_err(|e| SourceError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let channels = decoder.channels().max(1) as usize;
        let sample_rate = decoder.sample_rate();
        let interleaved: Vec<f32> = decoder.map(|s| s as f32 / i16::MAX as f32).collect();
        if interleaved.is_empty() {
            return Err(SourceError::Decode {
                path: path.to_path_buf(),
                reason: "no audio frames".into(),
            });
        }
        Ok(Self::from_interleaved(&interleaved, channels, sample_rate))
    }

    pub fn from_interleaved(samples: &[f32], channels: usize, sample_rate: u32) -> Self {
        let channels = channels.max(1);
        let mono: Vec<f32> = samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();
        let duration_sec = mono.len() as f32 / sample_rate.max(1) as f32;
        Self {
            sample_rate,
            samples_mono: mono,
            duration_sec,
        }
    }

    //n samples ending at t_sec; outside the track is silence unless `wrap`
    pub fn window_at_time(&self, t_sec: f32, n: usize, wrap: bool, out: &mut Vec<f32>) {
        out.clear();
        out.reserve(n);

        let len = self.samples_mono.len() as isize;
        if len == 0 {
            out.resize(n, 0.0);
            return;
        }

        let t = if wrap {
            t_sec.rem_euclid(self.duration_sec.max(0.000_1))
        } else {
            t_sec
        };
        let end = (t * self.sample_rate as f32) as isize;
        let start = end - n as isize;

        for i in start..end {
            let sample = if wrap {
                self.samples_mono[i.rem_euclid(len) as usize]
            } else if (0..len).contains(&i) {
                self.samples_mono[i as usize]
            } else {
                0.0
            };
            out.push(sample);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> AudioData {
        let samples: Vec<f32> = (0..len).map(|i| i as f32).collect();
        AudioData::from_interleaved(&samples, 1, 10)
    }

    #[test]
    fn downmixes_stereo() {
        let data = AudioData::from_interleaved(&[1.0, 0.0, 0.5, 0.5, 0.2], 2, 4);
        assert_eq!(data.samples_mono, vec![0.5, 0.5]);
        assert!((data.duration_sec - 0.5).abs() < 1e-6);
    }

    #[test]
    fn window_ends_at_playhead() {
        let data = ramp(100);
        let mut out = Vec::new();
        data.window_at_time(5.0, 4, false, &mut out);
        assert_eq!(out, vec![46.0, 47.0, 48.0, 49.0]);
    }

    #[test]
    fn window_pads_outside_track_without_wrap() {
        let data = ramp(100);
        let mut out = Vec::new();
        data.window_at_time(0.2, 4, false, &mut out);
        assert_eq!(out, vec![0.0, 0.0, 0.0, 1.0]);
        data.window_at_time(50.0, 3, false, &mut out);
        assert_eq!(out, vec![0.0; 3]);
    }

    #[test]
    fn window_wraps_when_looping() {
        let data = ramp(100);
        let mut out = Vec::new();
        data.window_at_time(10.15, 3, true, &mut out);
        assert_eq!(out, vec![98.0, 99.0, 0.0]);
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let err = AudioData::load("definitely/not/here.wav").err();
        assert!(matches!(err, Some(SourceError::Decode { .. })));
        let err = AudioData::load("definitely/not/here.mp3").err();
        assert!(matches!(err, Some(SourceError::Io { .. })));
    }
}
