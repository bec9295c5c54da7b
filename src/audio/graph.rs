//! Routes the one active source into the shared analyser.

use std::path::Path;

use tracing::info;

use crate::analysis::{AnalyzerConfig, FrequencyAnalyzer, FrequencyFrame};
use crate::audio::mic::MicCapture;
use crate::audio::source::{FileSource, SampleSource, SourceKind, SourceSlot};
use crate::error::{AnalyzerError, SourceError};

pub struct AnalysisGraph {
    analyzer: FrequencyAnalyzer,
    slot: SourceSlot<Box<dyn SampleSource>>,
    scratch_window: Vec<f32>,
}

impl AnalysisGraph {
    pub fn new(config: AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let analyzer = FrequencyAnalyzer::new(config)?;
        let scratch_window = Vec::with_capacity(analyzer.fft_size());
        Ok(Self {
            analyzer,
            slot: SourceSlot::default(),
            scratch_window,
        })
    }

    pub fn bin_count(&self) -> usize {
        self.analyzer.bin_count()
    }

    pub fn source_kind(&self) -> Option<SourceKind> {
        self.slot.active().map(|s| s.kind())
    }

    pub fn is_active(&self) -> bool {
        self.slot.is_active()
    }

    pub fn load_file(&mut self, path: &Path, repeat: bool) -> Result<(), SourceError> {
        self.analyzer.reset();
        self.slot.acquire_with(|| {
            FileSource::open(path, repeat).map(|s| Box::new(s) as Box<dyn SampleSource>)
        })?;
        info!(path = %path.display(), repeat, "playing file");
        Ok(())
    }

    pub fn start_microphone(&mut self) -> Result<(), SourceError> {
        self.analyzer.reset();
        let fft_size = self.analyzer.fft_size();
        self.slot.acquire_with(|| {
            MicCapture::start(fft_size).map(|s| Box::new(s) as Box<dyn SampleSource>)
        })?;
        info!("listening to microphone");
        Ok(())
    }

    //for sources built outside the graph (synthetic signals)
    pub fn connect(&mut self, source: Box<dyn SampleSource>) {
        self.analyzer.reset();
        self.slot.install(source);
    }

    pub fn disconnect(&mut self) {
        if self.slot.release() {
            info!("audio source disconnected");
        }
        self.analyzer.reset();
    }

    pub fn refresh_frequency_data(&mut self) {
        if self.pull_window() {
            self.analyzer.process_frequency(&self.scratch_window);
        }
    }

    pub fn refresh_time_domain_data(&mut self) {
        if self.pull_window() {
            self.analyzer.process_time_domain(&self.scratch_window);
        }
    }

    /// Current buffers, or `None` when nothing is connected.
    pub fn frame(&self) -> Option<FrequencyFrame<'_>> {
        self.slot.is_active().then(|| self.analyzer.frame())
    }

    fn pull_window(&mut self) -> bool {
        if self.slot.active().is_some_and(|s| s.exhausted()) {
            info!("track finished");
            self.disconnect();
        }
        let size = self.analyzer.fft_size();
        match self.slot.active_mut() {
            Some(source) => {
                source.read_window(&mut self.scratch_window, size);
                true
            }
            None => false,
        }
    }
}
