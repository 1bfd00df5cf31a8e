//! Seams to the generative models.
//!
//! Each service holds one of these traits behind an `Arc`. The models are
//! loaded once at startup and only read afterwards; calls are synchronous and
//! run on the blocking pool.

pub mod onnx;
pub mod text_to_audio;
pub mod text_to_speech;
pub mod voice_conversion;

use std::path::Path;

use crate::audio::{AudioError, Waveform};

pub use text_to_audio::{GenerationSettings, OnnxAudioGenerator};
pub use text_to_speech::{OnnxSpeechSynthesizer, SynthesizerConfig};
pub use voice_conversion::OnnxVoiceConverter;

#[derive(thiserror::Error, Debug)]
pub enum InferenceError {
    #[error("failed to load model: {0}")]
    Load(String),

    #[error("invalid model input: {0}")]
    Input(String),

    #[error("inference failed: {0}")]
    Runtime(String),

    #[error(transparent)]
    Audio(#[from] AudioError),
}

/// Speaker style vector computed from a reference recording
#[derive(Debug, Clone, PartialEq)]
pub struct Style(pub Vec<f32>);

/// Prompt to sound effect / ambient audio
pub trait AudioGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<Waveform, InferenceError>;
}

/// Text to speech in the style of a reference speaker
pub trait SpeechSynthesizer: Send + Sync {
    fn compute_style(&self, reference: &Path) -> Result<Style, InferenceError>;

    fn synthesize(&self, text: &str, style: &Style) -> Result<Waveform, InferenceError>;

    /// Rate of the waveforms `synthesize` returns
    fn sample_rate(&self) -> u32;
}

/// Re-voice a recording as the speaker of `target`
pub trait VoiceConverter: Send + Sync {
    fn convert(&self, source: &Path, target: &Path) -> Result<Waveform, InferenceError>;
}
