use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::{HeapConsumer, HeapProducer, HeapRb};
use std::collections::VecDeque;
use tracing::{info, warn};

use crate::error::SourceError;

/// Live capture from the default input device.
///
/// Dropping the capture drops the cpal stream, which releases the device.
pub struct MicCapture {
    _stream: cpal::Stream, // must stay alive or audio stops
    consumer: HeapConsumer<f32>,
    window: VecDeque<f32>, // sliding window of the latest `fft_size` samples
    pub sample_rate: u32,
}

impl MicCapture {
    pub fn start(fft_size: usize) -> Result<Self, SourceError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(SourceError::NoInputDevice)?;

        let supported = device
            .default_input_config()
            .map_err(|e| SourceError::Microphone(e.to_string()))?;
        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();

        // ring buffer: 8x fft_size so the callback never stalls
        let rb = HeapRb::<f32>::new(fft_size * 8);
        let (producer, consumer) = rb.split();

        let stream = build_stream(&device, &config, format, channels, producer)?;
        stream
            .play()
            .map_err(|e| SourceError::Microphone(e.to_string()))?;

        let name = device.name().unwrap_or_else(|_| "unknown".into());
        info!(device = %name, sample_rate, channels, "microphone capture started");

        Ok(Self {
            _stream: stream,
            consumer,
            window: VecDeque::from(vec![0.0f32; fft_size]),
            sample_rate,
        })
    }

    /// Drains new samples from the ring buffer into the sliding window,
    /// then copies the latest `size` samples into `out`.
    pub fn read_window(&mut self, out: &mut Vec<f32>, size: usize) {
        while let Some(s) = self.consumer.pop() {
            self.window.push_back(s);
            if self.window.len() > size {
                self.window.pop_front();
            }
        }
        out.clear();
        // pad with silence if not enough samples yet (startup)
        out.extend(std::iter::repeat_n(0.0, size.saturating_sub(self.window.len())));
        out.extend(self.window.iter().rev().take(size).rev().copied());
    }
}

fn mic_err(e: cpal::StreamError) {
    warn!("mic stream error: {e}");
}

/// Builds an input stream for the given sample format.
/// `producer` is moved into exactly one callback closure.
fn build_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    format: cpal::SampleFormat,
    channels: usize,
    mut producer: HeapProducer<f32>,
) -> Result<cpal::Stream, SourceError> {
    let built = match format {
        cpal::SampleFormat::F32 => device.build_input_stream(
            config,
            move |data: &[f32], _| {
                for chunk in data.chunks(channels) {
                    let mono = chunk.iter().sum::<f32>() / channels as f32;
                    let _ = producer.push(mono);
                }
            },
            mic_err,
            None,
        ),
        cpal::SampleFormat::I16 => device.build_input_stream(
            config,
            move |data: &[i16], _| {
                for chunk in data.chunks(channels) {
                    let mono = chunk
                        .iter()
                        .map(|&s| s as f32 / i16::MAX as f32)
                        .sum::<f32>()
                        / channels as f32;
                    let _ = producer.push(mono);
                }
            },
            mic_err,
            None,
        ),
        cpal::SampleFormat::U16 => device.build_input_stream(
            config,
            move |data: &[u16], _| {
                for chunk in data.chunks(channels) {
                    let mono = chunk
                        .iter()
                        .map(|&s| (s as f32 - 32768.0) / 32768.0)
                        .sum::<f32>()
                        / channels as f32;
                    let _ = producer.push(mono);
                }
            },
            mic_err,
            None,
        ),
        other => return Err(SourceError::UnsupportedSampleFormat(format!("{other:?}"))),
    };
    built.map_err(|e| SourceError::Microphone(e.to_string()))
}
