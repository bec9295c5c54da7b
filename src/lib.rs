//! Audio-reactive visualizer: spectrum analysis of a file or microphone
//! feeding a set of themed render engines.

pub mod analysis;
pub mod audio;
pub mod cli;
pub mod error;
pub mod host;
pub mod settings;
pub mod visual;
