use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use ort::value::Value;
use serde::Deserialize;

use super::onnx::{extract_f32, OnnxModel};
use super::{InferenceError, SpeechSynthesizer, Style};
use crate::audio::{self, Waveform};
use crate::text::phonemize::{phonemize, phonemes_to_ids};

#[derive(Debug, Clone, Deserialize)]
pub struct SynthesizerConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    pub espeak: Option<EspeakConfig>,
    #[serde(default)]
    pub phoneme_id_map: HashMap<String, Vec<i64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EspeakConfig {
    pub voice: String,
}

fn default_sample_rate() -> u32 {
    24000
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
        }
    }
}

impl SynthesizerConfig {
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        let file = File::open(path).map_err(|e| {
            InferenceError::Load(format!("cannot open config {}: {}", path.display(), e))
        })?;
        let config: SynthesizerConfig = serde_json::from_reader(file).map_err(|e| {
            InferenceError::Load(format!("invalid config {}: {}", path.display(), e))
        })?;

        if config.phoneme_id_map.is_empty() {
            return Err(InferenceError::Load(format!(
                "config {} has an empty phoneme_id_map",
                path.display()
            )));
        }

        Ok(config)
    }

    pub fn language(&self) -> &str {
        self.espeak
            .as_ref()
            .map(|e| e.voice.as_str())
            .unwrap_or("en-us")
    }
}

/// Style-transfer TTS split into two graphs.
///
/// The style encoder takes `audio` f32 [1, T] at the model rate and returns
/// the style vector [1, S]. The acoustic graph takes `tokens` i64 [1, N] and
/// `style` f32 [1, S] and returns `audio` f32.
pub struct OnnxSpeechSynthesizer {
    acoustic: OnnxModel,
    style_encoder: OnnxModel,
    config: SynthesizerConfig,
}

impl OnnxSpeechSynthesizer {
    pub fn load(
        model_path: &Path,
        style_encoder_path: &Path,
        config_path: &Path,
    ) -> Result<Self, InferenceError> {
        let config = SynthesizerConfig::load(config_path)?;
        Ok(Self {
            acoustic: OnnxModel::load(model_path)?,
            style_encoder: OnnxModel::load(style_encoder_path)?,
            config,
        })
    }
}

impl SpeechSynthesizer for OnnxSpeechSynthesizer {
    fn compute_style(&self, reference: &Path) -> Result<Style, InferenceError> {
        let sample_rate = self.config.audio.sample_rate;
        let waveform = audio::resample(audio::read_wav(reference)?, sample_rate)?;
        if waveform.samples.is_empty() {
            return Err(InferenceError::Input(format!(
                "reference audio {} is empty",
                reference.display()
            )));
        }

        let style = self.style_encoder.with_session(|session| {
            let len = waveform.samples.len();
            let audio_value = Value::from_array((vec![1, len], waveform.samples))
                .map_err(|e| InferenceError::Runtime(format!("Failed to create audio tensor: {}", e)))?;

            let outputs = session
                .run(ort::inputs![audio_value])
                .map_err(|e| InferenceError::Runtime(format!("Style encoding failed: {}", e)))?;

            extract_f32(
                outputs.get("style").or_else(|| outputs.get("output")),
                "style",
            )
        })?;

        tracing::debug!("Computed style of size {} from {}", style.len(), reference.display());
        Ok(Style(style))
    }

    fn synthesize(&self, text: &str, style: &Style) -> Result<Waveform, InferenceError> {
        let phonemes = phonemize(text, self.config.language())?;
        let ids = phonemes_to_ids(&phonemes, &self.config.phoneme_id_map);
        let style = style.0.clone();

        let samples = self.acoustic.with_session(|session| {
            let token_len = ids.len();
            let style_len = style.len();
            let tokens_value = Value::from_array((vec![1, token_len], ids))
                .map_err(|e| InferenceError::Runtime(format!("Failed to create tokens tensor: {}", e)))?;
            let style_value = Value::from_array((vec![1, style_len], style))
                .map_err(|e| InferenceError::Runtime(format!("Failed to create style tensor: {}", e)))?;

            let outputs = session
                .run(ort::inputs![tokens_value, style_value])
                .map_err(|e| InferenceError::Runtime(format!("Synthesis failed: {}", e)))?;

            extract_f32(
                outputs.get("audio").or_else(|| outputs.get("output")),
                "audio",
            )
        })?;

        Ok(Waveform::new(samples, self.config.audio.sample_rate))
    }

    fn sample_rate(&self) -> u32 {
        self.config.audio.sample_rate
    }
}
