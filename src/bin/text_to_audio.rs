use std::sync::Arc;

use anyhow::Context;

use audiogen_server::api::routes::{text_to_audio_router, ServiceContext, TextToAudioState};
use audiogen_server::auth::ApiKey;
use audiogen_server::config::{ServiceConfig, ServiceDefaults};
use audiogen_server::inference::{GenerationSettings, OnnxAudioGenerator};
use audiogen_server::voices::VoiceRegistry;
use audiogen_server::{init_tracing, serve};

const DEFAULTS: ServiceDefaults = ServiceDefaults {
    name: "text-to-audio",
    port: 8000,
    s3_prefix: "make-an-audio-outputs",
    model_path: "useful_ckpts/maa1_full.onnx",
    config_path: None,
    style_encoder_path: None,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServiceConfig::from_env(DEFAULTS).context("invalid configuration")?;
    let addr = config.addr()?;

    tracing::info!("{} v{}", config.name, env!("CARGO_PKG_VERSION"));
    tracing::info!("Loading text-to-audio model from {}", config.models.model.display());

    let generator = OnnxAudioGenerator::load(&config.models.model, GenerationSettings::default())
        .context("failed to load text-to-audio model")?;
    tracing::info!("Text-to-audio model loaded successfully");

    // prompts only, no reference voices
    let context = ServiceContext::connect(&config, VoiceRegistry::default())
        .await
        .context("failed to prepare storage")?;

    let state = Arc::new(TextToAudioState {
        context,
        generator: Some(Arc::new(generator)),
    });
    let app = text_to_audio_router(state, ApiKey::new(config.api_key.clone()));

    serve(addr, app).await.context("server error")?;

    tracing::info!("Shutting down text-to-audio service");
    Ok(())
}
