mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use axum::Router;
use serde_json::json;

use audiogen_server::api::routes::{voice_conversion_router, VoiceConversionState};
use audiogen_server::inference::VoiceConverter;
use audiogen_server::voices::voice_conversion_voices;
use common::{send, staged_files, MemoryStore, RecordingConverter, BEARER};

const SOURCE_KEY: &str = "uploads/source.wav";

struct Harness {
    app: Router,
    store: Arc<MemoryStore>,
    converter: Arc<RecordingConverter>,
    staging: tempfile::TempDir,
}

fn harness(store: MemoryStore, converter: Option<RecordingConverter>) -> Harness {
    let store = Arc::new(store);
    let loaded = converter.is_some();
    let converter = Arc::new(converter.unwrap_or_default());
    let staging = tempfile::tempdir().unwrap();

    let state = Arc::new(VoiceConversionState {
        context: common::context(store.clone(), staging.path(), voice_conversion_voices()),
        converter: if loaded {
            Some(converter.clone() as Arc<dyn VoiceConverter>)
        } else {
            None
        },
    });

    Harness {
        app: voice_conversion_router(state, common::api_key()),
        store,
        converter,
        staging,
    }
}

fn source_store() -> MemoryStore {
    MemoryStore::with_object(SOURCE_KEY, b"RIFF....WAVE".to_vec())
}

async fn convert(h: &Harness, key: &str, voice: &str) -> (StatusCode, serde_json::Value) {
    send(
        h.app.clone(),
        Method::POST,
        "/convert",
        Some(BEARER),
        Some(json!({"source_audio_key": key, "target_voice": voice})),
    )
    .await
}

#[tokio::test]
async fn converts_downloaded_source() {
    let h = harness(source_store(), Some(RecordingConverter::default()));

    let (status, body) = convert(&h, SOURCE_KEY, "trump").await;

    assert_eq!(status, StatusCode::OK);
    let key = body["s3_key"].as_str().unwrap();
    assert!(key.starts_with("test-outputs/") && key.ends_with(".wav"));
    assert!(h.store.get(key).unwrap().starts_with(b"RIFF"));
    assert!(body["audio_url"].as_str().unwrap().contains(key));

    // the source copy existed during conversion and is gone afterwards
    let sources = h.converter.sources.lock().unwrap().clone();
    assert_eq!(sources.len(), 1);
    assert!(sources[0].1);
    assert!(!sources[0].0.exists());
    assert!(staged_files(h.staging.path()).is_empty());
}

#[tokio::test]
async fn missing_source_is_not_found() {
    let h = harness(MemoryStore::default(), Some(RecordingConverter::default()));

    let (status, body) = convert(&h, "uploads/missing.wav", "woman").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Source audio not found");
    assert!(h.converter.sources.lock().unwrap().is_empty());
    assert!(staged_files(h.staging.path()).is_empty());
}

#[tokio::test]
async fn transient_download_failure_is_server_error() {
    let store = MemoryStore {
        fail_downloads: true,
        ..source_store()
    };
    let h = harness(store, Some(RecordingConverter::default()));

    let (status, body) = convert(&h, SOURCE_KEY, "woman").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Error in voice conversion");
    assert!(!body.to_string().contains("connection reset"));
}

#[tokio::test]
async fn failed_conversion_still_removes_source() {
    let converter = RecordingConverter {
        fail: true,
        ..Default::default()
    };
    let h = harness(source_store(), Some(converter));

    let (status, body) = convert(&h, SOURCE_KEY, "andreas").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Error in voice conversion");
    assert!(!body.to_string().contains("diverged"));

    let sources = h.converter.sources.lock().unwrap().clone();
    assert!(!sources[0].0.exists());
    assert!(staged_files(h.staging.path()).is_empty());
    assert_eq!(h.store.keys(), vec![SOURCE_KEY.to_string()]);
}

#[tokio::test]
async fn unknown_target_voice_lists_choices() {
    let h = harness(source_store(), Some(RecordingConverter::default()));

    let (status, body) = convert(&h, SOURCE_KEY, "robot").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Target voice not supported. Choose from: andreas, woman, trump"
    );
}

#[tokio::test]
async fn model_not_loaded_is_server_error() {
    let h = harness(source_store(), None);

    let (status, body) = convert(&h, SOURCE_KEY, "woman").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Model not loaded");
}

#[tokio::test]
async fn lists_target_voices() {
    let h = harness(source_store(), Some(RecordingConverter::default()));

    let (status, body) = send(h.app.clone(), Method::GET, "/voices", Some(BEARER), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"voices": ["andreas", "woman", "trump"]}));
}

#[tokio::test]
async fn malformed_body_gets_json_error() {
    let h = harness(source_store(), Some(RecordingConverter::default()));

    let (status, body) = send(
        h.app.clone(),
        Method::POST,
        "/convert",
        Some(BEARER),
        Some(json!({"text": "hi"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(h.converter.sources.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_upload_removes_source_and_staged_files() {
    let store = MemoryStore {
        fail_uploads: true,
        ..source_store()
    };
    let h = harness(store, Some(RecordingConverter::default()));

    let (status, body) = convert(&h, SOURCE_KEY, "trump").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Error in voice conversion");
    assert!(!body.to_string().contains("secret-bucket"));
    assert!(staged_files(h.staging.path()).is_empty());
    assert_eq!(h.store.keys(), vec![SOURCE_KEY.to_string()]);
}
