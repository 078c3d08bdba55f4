//! OCTAVE structured text: lenient parsing, repair, validation, canonical
//! re-emission, projection, and sealing.

pub mod octave;

pub use octave::ast::{Document, Section, Value};
pub use octave::pipeline::{PipelineConfig, PipelineError, PipelineOutput};
