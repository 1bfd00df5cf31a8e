use std::path::Path;

use ort::value::Value;

use super::onnx::{extract_f32, OnnxModel};
use super::{InferenceError, VoiceConverter};
use crate::audio::{self, Waveform};

/// Rate the conversion graph consumes and produces
pub const VOICE_CONVERSION_SAMPLE_RATE: u32 = 22050;

/// Zero-shot voice conversion graph.
///
/// Inputs, in order: `source` f32 [1, T] and `target` f32 [1, T'], both mono
/// at the model rate. Output `audio` f32 at the same rate.
pub struct OnnxVoiceConverter {
    model: OnnxModel,
    sample_rate: u32,
}

impl OnnxVoiceConverter {
    pub fn load(model_path: &Path) -> Result<Self, InferenceError> {
        Ok(Self {
            model: OnnxModel::load(model_path)?,
            sample_rate: VOICE_CONVERSION_SAMPLE_RATE,
        })
    }

    fn load_input(&self, path: &Path, what: &str) -> Result<Vec<f32>, InferenceError> {
        let waveform = audio::resample(audio::read_wav(path)?, self.sample_rate)?;
        if waveform.samples.is_empty() {
            return Err(InferenceError::Input(format!("{} audio is empty", what)));
        }
        Ok(waveform.samples)
    }
}

impl VoiceConverter for OnnxVoiceConverter {
    fn convert(&self, source: &Path, target: &Path) -> Result<Waveform, InferenceError> {
        let source_samples = self.load_input(source, "source")?;
        let target_samples = self.load_input(target, "target")?;

        tracing::debug!(
            "Converting {:.1}s of audio towards {}",
            source_samples.len() as f32 / self.sample_rate as f32,
            target.display()
        );

        let samples = self.model.with_session(|session| {
            let source_len = source_samples.len();
            let target_len = target_samples.len();
            let source_value = Value::from_array((vec![1, source_len], source_samples))
                .map_err(|e| InferenceError::Runtime(format!("Failed to create source tensor: {}", e)))?;
            let target_value = Value::from_array((vec![1, target_len], target_samples))
                .map_err(|e| InferenceError::Runtime(format!("Failed to create target tensor: {}", e)))?;

            let outputs = session
                .run(ort::inputs![source_value, target_value])
                .map_err(|e| InferenceError::Runtime(format!("Conversion failed: {}", e)))?;

            extract_f32(
                outputs.get("audio").or_else(|| outputs.get("output")),
                "audio",
            )
        })?;

        Ok(Waveform::new(samples, self.sample_rate))
    }
}
