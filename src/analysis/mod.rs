pub mod analyzer;
pub mod features;

pub use analyzer::{AnalyzerConfig, FrequencyAnalyzer, FrequencyFrame};
pub use features::{BandLayout, BeatConfig, BeatPulse, FeatureExtractor, FeatureSnapshot, Features, Smoother};
