use std::sync::Arc;

use anyhow::Context;

use audiogen_server::api::routes::{text_to_speech_router, ServiceContext, TextToSpeechState};
use audiogen_server::auth::ApiKey;
use audiogen_server::config::{ServiceConfig, ServiceDefaults};
use audiogen_server::inference::OnnxSpeechSynthesizer;
use audiogen_server::{init_tracing, serve, voices};

const DEFAULTS: ServiceDefaults = ServiceDefaults {
    name: "text-to-speech",
    port: 8000,
    s3_prefix: "styletts2-output",
    model_path: "Models/LibriTTS/styletts2.onnx",
    config_path: Some("Models/LibriTTS/config.json"),
    style_encoder_path: Some("Models/LibriTTS/style_encoder.onnx"),
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServiceConfig::from_env(DEFAULTS).context("invalid configuration")?;
    let addr = config.addr()?;

    tracing::info!("{} v{}", config.name, env!("CARGO_PKG_VERSION"));

    let mut voices = voices::text_to_speech_voices();
    if let Some(dir) = &config.voices_dir {
        tracing::info!("Voices directory: {}", dir.display());
        voices = voices.rooted_at(dir);
    }

    let config_path = config
        .models
        .config
        .as_deref()
        .context("CONFIG_PATH must be set")?;
    let style_encoder_path = config
        .models
        .style_encoder
        .as_deref()
        .context("STYLE_ENCODER_PATH must be set")?;

    tracing::info!("Loading text-to-speech model...");
    let synthesizer =
        OnnxSpeechSynthesizer::load(&config.models.model, style_encoder_path, config_path)
            .context("failed to load text-to-speech model")?;
    tracing::info!("Text-to-speech model loaded successfully");

    let context = ServiceContext::connect(&config, voices)
        .await
        .context("failed to prepare storage")?;

    let state = Arc::new(TextToSpeechState {
        context,
        synthesizer: Some(Arc::new(synthesizer)),
    });
    let app = text_to_speech_router(state, ApiKey::new(config.api_key.clone()));

    serve(addr, app).await.context("server error")?;

    tracing::info!("Shutting down text-to-speech service");
    Ok(())
}
