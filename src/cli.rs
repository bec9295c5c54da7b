//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::analysis::AnalyzerConfig;
use crate::error::AnalyzerError;
use crate::settings::{Rgb, Theme, VisualizerSettings};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "reactive-visualizer")]
#[command(about = "Audio-reactive visualizer for audio files and microphone input", long_about = None)]
pub struct Args {
    /// Audio file to play and visualize (wav, mp3, flac, ogg)
    #[arg(long, value_name = "PATH", conflicts_with = "mic")]
    pub file: Option<PathBuf>,

    /// Visualize the default microphone instead of a file
    #[arg(long)]
    pub mic: bool,

    /// Loop the audio file
    #[arg(long)]
    pub repeat: bool,

    /// Theme id; unknown ids fall back to the default theme
    #[arg(long, value_name = "ID", default_value = "dual-pulse-waves")]
    pub theme: String,

    /// Primary colour (#rgb or #rrggbb)
    #[arg(long, value_name = "HEX")]
    pub primary: Option<Rgb>,

    /// Secondary colour (#rgb or #rrggbb)
    #[arg(long, value_name = "HEX")]
    pub secondary: Option<Rgb>,

    /// Background colour (#rgb or #rrggbb)
    #[arg(long, value_name = "HEX")]
    pub background: Option<Rgb>,

    #[arg(long, default_value_t = 1.0)]
    pub intensity: f32,

    #[arg(long, default_value_t = 1.0)]
    pub speed: f32,

    #[arg(long, default_value_t = 1.0)]
    pub sensitivity: f32,

    /// FFT window size, a power of two
    #[arg(long, value_name = "N", default_value_t = 2048)]
    pub fft_size: usize,

    /// Render this many frames without a window, then exit
    #[arg(long, value_name = "FRAMES")]
    pub headless: Option<u64>,

    #[arg(long, default_value_t = 1024)]
    pub width: u32,

    #[arg(long, default_value_t = 768)]
    pub height: u32,

    /// Seed for the random star fields and sparks
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Which audio source to attach at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceRequest {
    None,
    File { path: PathBuf, repeat: bool },
    Microphone,
}

impl Args {
    pub fn settings(&self) -> VisualizerSettings {
        let defaults = VisualizerSettings::default();
        VisualizerSettings {
            theme: Theme::parse_or_default(&self.theme),
            primary_color: self.primary.unwrap_or(defaults.primary_color),
            secondary_color: self.secondary.unwrap_or(defaults.secondary_color),
            background_color: self.background.unwrap_or(defaults.background_color),
            intensity: self.intensity,
            speed: self.speed,
            sensitivity: self.sensitivity,
        }
    }

    pub fn analyzer_config(&self) -> Result<AnalyzerConfig, AnalyzerError> {
        let config = AnalyzerConfig {
            fft_size: self.fft_size,
            ..AnalyzerConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn source_request(&self) -> SourceRequest {
        match (&self.file, self.mic) {
            (Some(path), _) => SourceRequest::File {
                path: path.clone(),
                repeat: self.repeat,
            },
            (None, true) => SourceRequest::Microphone,
            (None, false) => SourceRequest::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("reactive-visualizer").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn defaults_match_visualizer_defaults() {
        let args = parse(&[]);
        assert_eq!(args.settings(), VisualizerSettings::default());
        assert_eq!(args.analyzer_config(), Ok(AnalyzerConfig::default()));
        assert_eq!(args.source_request(), SourceRequest::None);
    }

    #[test]
    fn colours_and_theme_are_parsed() {
        let args = parse(&["--theme", "Galaxy-Spiral", "--primary", "#f00", "--intensity", "2.5"]);
        let s = args.settings();
        assert_eq!(s.theme, Theme::GalaxySpiral);
        assert_eq!(s.primary_color, Rgb::new(255, 0, 0));
        assert_eq!(s.intensity, 2.5);
    }

    #[test]
    fn unknown_theme_falls_back() {
        let args = parse(&["--theme", "lava-lamp"]);
        assert_eq!(args.settings().theme, Theme::default());
    }

    #[test]
    fn bad_colour_is_rejected() {
        let err = Args::try_parse_from(["reactive-visualizer", "--primary", "teal"]);
        assert!(err.is_err());
    }

    #[test]
    fn file_and_mic_are_exclusive() {
        let err = Args::try_parse_from(["reactive-visualizer", "--file", "a.wav", "--mic"]);
        assert!(err.is_err());
        let args = parse(&["--file", "a.wav", "--repeat"]);
        assert_eq!(
            args.source_request(),
            SourceRequest::File {
                path: PathBuf::from("a.wav"),
                repeat: true
            }
        );
        assert_eq!(parse(&["--mic"]).source_request(), SourceRequest::Microphone);
    }

    #[test]
    fn fft_size_is_validated() {
        assert_eq!(
            parse(&["--fft-size", "1000"]).analyzer_config(),
            Err(AnalyzerError::InvalidFftSize(1000))
        );
        assert_eq!(parse(&["--fft-size", "512"]).analyzer_config().map(|c| c.fft_size), Ok(512));
    }
}
