use std::path::Path;

use ort::value::Value;

use super::onnx::{extract_f32, OnnxModel};
use super::{AudioGenerator, InferenceError};
use crate::audio::Waveform;

/// Sampler knobs fed to the diffusion graph on every call
#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    pub guidance_scale: f32,
    pub duration_secs: f32,
    pub steps: i64,
    pub sample_rate: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            guidance_scale: 3.0,
            duration_secs: 10.0,
            steps: 100,
            sample_rate: 16000,
        }
    }
}

/// Text-conditioned diffusion sampler and vocoder exported as one graph.
///
/// Inputs, in order: `input_ids` i64 [1, N] (UTF-8 bytes of the prompt),
/// `guidance_scale` f32 [1], `duration` f32 [1], `steps` i64 [1].
/// Output `audio` (or `output`) f32, mono at `settings.sample_rate`.
pub struct OnnxAudioGenerator {
    model: OnnxModel,
    settings: GenerationSettings,
}

impl OnnxAudioGenerator {
    pub fn load(model_path: &Path, settings: GenerationSettings) -> Result<Self, InferenceError> {
        Ok(Self {
            model: OnnxModel::load(model_path)?,
            settings,
        })
    }
}

/// Byte-level prompt encoding expected by the exported text encoder
pub fn encode_prompt(prompt: &str) -> Vec<i64> {
    prompt.bytes().map(i64::from).collect()
}

impl AudioGenerator for OnnxAudioGenerator {
    fn generate(&self, prompt: &str) -> Result<Waveform, InferenceError> {
        let ids = encode_prompt(prompt.trim());
        if ids.is_empty() {
            return Err(InferenceError::Input("prompt is empty".to_string()));
        }

        let settings = self.settings;
        let samples = self.model.with_session(|session| {
            let input_len = ids.len();
            let ids_value = Value::from_array((vec![1, input_len], ids))
                .map_err(|e| InferenceError::Runtime(format!("Failed to create ids tensor: {}", e)))?;
            let scale_value = Value::from_array((vec![1], vec![settings.guidance_scale]))
                .map_err(|e| InferenceError::Runtime(format!("Failed to create scale tensor: {}", e)))?;
            let duration_value = Value::from_array((vec![1], vec![settings.duration_secs]))
                .map_err(|e| {
                    InferenceError::Runtime(format!("Failed to create duration tensor: {}", e))
                })?;
            let steps_value = Value::from_array((vec![1], vec![settings.steps]))
                .map_err(|e| InferenceError::Runtime(format!("Failed to create steps tensor: {}", e)))?;

            let outputs = session
                .run(ort::inputs![ids_value, scale_value, duration_value, steps_value])
                .map_err(|e| InferenceError::Runtime(format!("Sampling failed: {}", e)))?;

            extract_f32(
                outputs.get("audio").or_else(|| outputs.get("output")),
                "audio",
            )
        })?;

        tracing::debug!(
            "{} produced {} samples for prompt of {} bytes",
            self.model.name(),
            samples.len(),
            prompt.len()
        );

        Ok(Waveform::new(samples, settings.sample_rate))
    }
}
