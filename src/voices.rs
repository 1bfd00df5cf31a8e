use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Fixed mapping from voice name to the reference recording that conditions it.
///
/// Built once at startup and only read afterwards. Order is preserved so
/// `/voices` and error messages list names the way they were registered.
#[derive(Debug, Clone, Default)]
pub struct VoiceRegistry {
    voices: Vec<(String, PathBuf)>,
}

impl VoiceRegistry {
    pub fn new<N, P>(entries: impl IntoIterator<Item = (N, P)>) -> Self
    where
        N: Into<String>,
        P: Into<PathBuf>,
    {
        let mut voices: Vec<(String, PathBuf)> = Vec::new();
        for (name, path) in entries {
            let name = name.into();
            let path = path.into();
            match voices.iter_mut().find(|(n, _)| *n == name) {
                Some(existing) => existing.1 = path,
                None => voices.push((name, path)),
            }
        }
        Self { voices }
    }

    /// Resolve relative reference paths against `dir`
    pub fn rooted_at(self, dir: &Path) -> Self {
        let voices = self
            .voices
            .into_iter()
            .map(|(name, path)| {
                let path = if path.is_relative() {
                    dir.join(path)
                } else {
                    path
                };
                (name, path)
            })
            .collect();
        Self { voices }
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.voices.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn resolve(&self, name: &str) -> Result<&Path, AppError> {
        self.voices
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, path)| path.as_path())
            .ok_or_else(|| AppError::UnsupportedVoice {
                voice: name.to_string(),
                choices: self.names(),
            })
    }
}

/// Reference voices shipped with the style-transfer TTS model
pub fn text_to_speech_voices() -> VoiceRegistry {
    VoiceRegistry::new([
        ("andreas", "Models/LibriTTS/andreas1.wav"),
        ("woman", "Models/LibriTTS/woman1.wav"),
    ])
}

/// Target speakers available to voice conversion
pub fn voice_conversion_voices() -> VoiceRegistry {
    VoiceRegistry::new([
        ("andreas", "examples/reference/andreas1.wav"),
        ("woman", "examples/reference/s1p1.wav"),
        ("trump", "examples/reference/trump_0.wav"),
    ])
}
