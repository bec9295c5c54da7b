pub mod graph;
pub mod mic;
pub mod player;
pub mod source;
pub mod wav;

pub use graph::AnalysisGraph;
pub use mic::MicCapture;
pub use player::AudioPlayer;
pub use source::{Acquired, AcquireTicket, FileSource, SampleSource, SourceKind, SourceSlot};
pub use wav::AudioData;
