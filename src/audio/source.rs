//! The single active audio source and the rules for replacing it.

use std::path::{Path, PathBuf};

use crate::audio::mic::MicCapture;
use crate::audio::player::AudioPlayer;
use crate::audio::wav::AudioData;
use crate::error::SourceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    File,
    Microphone,
}

/// Anything that can hand the analyser a window of recent mono samples.
pub trait SampleSource {
    fn kind(&self) -> SourceKind;

    /// Replaces `out` with exactly `size` of the most recent samples.
    fn read_window(&mut self, out: &mut Vec<f32>, size: usize);

    fn exhausted(&self) -> bool {
        false
    }
}

//decoded track + the player producing audible output; window follows the player's clock
pub struct FileSource {
    audio: AudioData,
    player: AudioPlayer,
    repeat: bool,
    path: PathBuf,
}

impl FileSource {
    pub fn open(path: &Path, repeat: bool) -> Result<Self, SourceError> {
        let audio = AudioData::load(path)?;
        let player = AudioPlayer::start(path, repeat)?;
        Ok(Self {
            audio,
            player,
            repeat,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SampleSource for FileSource {
    fn kind(&self) -> SourceKind {
        SourceKind::File
    }

    fn read_window(&mut self, out: &mut Vec<f32>, size: usize) {
        let t = self.player.elapsed_secs();
        self.audio.window_at_time(t, size, self.repeat, out);
    }

    fn exhausted(&self) -> bool {
        !self.repeat && self.player.finished()
    }
}

impl SampleSource for MicCapture {
    fn kind(&self) -> SourceKind {
        SourceKind::Microphone
    }

    fn read_window(&mut self, out: &mut Vec<f32>, size: usize) {
        MicCapture::read_window(self, out, size);
    }
}

#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct AcquireTicket {
    generation: u64,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Acquired {
    Installed,
    // superseded; its source was dropped
    Stale,
}

/// Holds at most one source. Starting an acquisition releases the current
/// source before anything else happens, so a failed acquisition still
/// leaves nothing connected.
pub struct SourceSlot<S> {
    active: Option<S>,
    generation: u64,
}

impl<S> Default for SourceSlot<S> {
    fn default() -> Self {
        Self {
            active: None,
            generation: 0,
        }
    }
}

impl<S> SourceSlot<S> {
    pub fn begin_acquire(&mut self) -> AcquireTicket {
        self.release();
        self.generation += 1;
        AcquireTicket {
            generation: self.generation,
        }
    }

    /// Resolves an acquisition. Errors leave the slot empty; a stale
    /// ticket drops its source instead of installing it.
    pub fn complete<E>(
        &mut self,
        ticket: AcquireTicket,
        result: Result<S, E>,
    ) -> Result<Acquired, E> {
        let source = result?;
        if ticket.generation != self.generation {
            drop(source);
            return Ok(Acquired::Stale);
        }
        self.active = Some(source);
        Ok(Acquired::Installed)
    }

    // release first so two sources never hold a device at once
    pub fn acquire_with<E>(&mut self, open: impl FnOnce() -> Result<S, E>) -> Result<(), E> {
        self.release();
        self.active = Some(open()?);
        Ok(())
    }

    pub fn install(&mut self, source: S) {
        self.release();
        self.active = Some(source);
    }

    pub fn release(&mut self) -> bool {
        self.generation += 1;
        self.active.take().is_some()
    }

    pub fn active(&self) -> Option<&S> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut S> {
        self.active.as_mut()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}
