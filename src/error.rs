//! Error types for audio acquisition, analysis setup and settings parsing.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to acquire or decode an audio source.
///
/// Every variant is recoverable: the caller logs it and keeps rendering
/// with no source attached.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no microphone input device found")]
    NoInputDevice,

    /// Covers permission denial as well as device/stream setup failures.
    #[error("microphone unavailable: {0}")]
    Microphone(String),

    #[error("unsupported microphone sample format {0}")]
    UnsupportedSampleFormat(String),

    #[error("failed to open audio output device: {0}")]
    Output(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum AnalyzerError {
    #[error("fft size must be a power of two between 32 and 32768, got {0}")]
    InvalidFftSize(usize),
}

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("invalid colour {0:?}, expected #rgb or #rrggbb")]
    InvalidColor(String),

    #[error("unknown theme {0:?}")]
    UnknownTheme(String),
}
