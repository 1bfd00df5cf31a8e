#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use audiogen_server::api::routes::ServiceContext;
use audiogen_server::audio::Waveform;
use audiogen_server::auth::ApiKey;
use audiogen_server::inference::{
    AudioGenerator, InferenceError, SpeechSynthesizer, Style, VoiceConverter,
};
use audiogen_server::storage::{ObjectStore, StorageError};
use audiogen_server::voices::VoiceRegistry;

pub const SECRET: &str = "test-secret";
pub const BEARER: &str = "Bearer test-secret";

pub fn api_key() -> ApiKey {
    ApiKey::new(SECRET.to_string().into())
}

/// Bucket kept in memory, with switches to make each transfer fail
#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<HashMap<String, Vec<u8>>>,
    pub fail_downloads: bool,
    pub fail_uploads: bool,
    pub fail_presign: bool,
}

impl MemoryStore {
    pub fn with_object(key: &str, bytes: Vec<u8>) -> Self {
        let store = Self::default();
        store.objects.lock().unwrap().insert(key.to_string(), bytes);
        store
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn upload_file(&self, path: &Path, key: &str) -> Result<(), StorageError> {
        if self.fail_uploads {
            return Err(StorageError::Transfer {
                key: key.to_string(),
                reason: "AccessDenied on secret-bucket".to_string(),
            });
        }
        let bytes = tokio::fs::read(path).await?;
        self.objects.lock().unwrap().insert(key.to_string(), bytes);
        Ok(())
    }

    async fn download_file(&self, key: &str, dest: &Path) -> Result<(), StorageError> {
        if self.fail_downloads {
            return Err(StorageError::Transfer {
                key: key.to_string(),
                reason: "connection reset".to_string(),
            });
        }
        let bytes = self
            .get(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        tokio::fs::write(dest, bytes).await?;
        Ok(())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, StorageError> {
        if self.fail_presign {
            return Err(StorageError::Presign {
                key: key.to_string(),
                reason: "credentials expired for secret-bucket".to_string(),
            });
        }
        Ok(format!(
            "https://test-bucket.s3.amazonaws.com/{}?X-Amz-Expires={}",
            key,
            expires_in.as_secs()
        ))
    }
}

pub fn context(store: Arc<MemoryStore>, staging_dir: &Path, voices: VoiceRegistry) -> ServiceContext {
    ServiceContext {
        store,
        prefix: "test-outputs".to_string(),
        staging_dir: staging_dir.to_path_buf(),
        voices,
    }
}

pub struct FixedGenerator;

impl AudioGenerator for FixedGenerator {
    fn generate(&self, _prompt: &str) -> Result<Waveform, InferenceError> {
        Ok(Waveform::new(vec![0.25; 1600], 16000))
    }
}

pub struct FailingGenerator;

impl AudioGenerator for FailingGenerator {
    fn generate(&self, _prompt: &str) -> Result<Waveform, InferenceError> {
        Err(InferenceError::Runtime("CUDA out of memory at 0xdeadbeef".to_string()))
    }
}

/// One sample per character; remembers the references and chunks it saw
#[derive(Default)]
pub struct RecordingSynthesizer {
    pub references: Mutex<Vec<PathBuf>>,
    pub chunks: Mutex<Vec<String>>,
}

impl SpeechSynthesizer for RecordingSynthesizer {
    fn compute_style(&self, reference: &Path) -> Result<Style, InferenceError> {
        self.references.lock().unwrap().push(reference.to_path_buf());
        Ok(Style(vec![0.1; 8]))
    }

    fn synthesize(&self, text: &str, _style: &Style) -> Result<Waveform, InferenceError> {
        self.chunks.lock().unwrap().push(text.to_string());
        Ok(Waveform::new(vec![0.5; text.chars().count()], 24000))
    }

    fn sample_rate(&self) -> u32 {
        24000
    }
}

/// Returns a fixed clip; notes whether the source file existed during the call
#[derive(Default)]
pub struct RecordingConverter {
    pub sources: Mutex<Vec<(PathBuf, bool)>>,
    pub fail: bool,
}

impl VoiceConverter for RecordingConverter {
    fn convert(&self, source: &Path, _target: &Path) -> Result<Waveform, InferenceError> {
        self.sources
            .lock()
            .unwrap()
            .push((source.to_path_buf(), source.exists()));
        if self.fail {
            return Err(InferenceError::Runtime("diffusion diverged".to_string()));
        }
        Ok(Waveform::new(vec![0.1; 2205], 22050))
    }
}

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    authorization: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, json)
}

pub fn staged_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}
