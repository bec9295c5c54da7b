use rodio::{Decoder, OutputStream, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;

use crate::error::SourceError;

/// Plays a file on the default output device.
///
/// The sink is owned rather than detached: dropping the player stops
/// playback and closes the output stream.
pub struct AudioPlayer {
    sink: Sink,
    _stream: OutputStream, // must stay alive for audio to keep playing
    start: Instant,
}

impl AudioPlayer {
    pub fn start(path: &Path, repeat: bool) -> Result<Self, SourceError> {
        let (_stream, handle) =
            OutputStream::try_default().map_err(|e| SourceError::Output(e.to_string()))?;
        let sink = Sink::try_new(&handle).map_err(|e| SourceError::Output(e.to_string()))?;
        let file = File::open(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source = Decoder::new(BufReader::new(file)).map_err(|e| SourceError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if repeat {
            sink.append(source.repeat_infinite());
        } else {
            sink.append(source);
        }
        Ok(Self {
            sink,
            _stream,
            start: Instant::now(),
        })
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    /// True once a non-repeating track has played to the end.
    pub fn finished(&self) -> bool {
        self.sink.empty()
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        self.sink.stop();
    }
}
