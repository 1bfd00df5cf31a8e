use std::sync::Arc;

use anyhow::Context;

use audiogen_server::api::routes::{voice_conversion_router, ServiceContext, VoiceConversionState};
use audiogen_server::auth::ApiKey;
use audiogen_server::config::{ServiceConfig, ServiceDefaults};
use audiogen_server::inference::OnnxVoiceConverter;
use audiogen_server::{init_tracing, serve, voices};

const DEFAULTS: ServiceDefaults = ServiceDefaults {
    name: "voice-conversion",
    port: 8000,
    s3_prefix: "seedvc-outputs",
    model_path: "checkpoints/seed_vc.onnx",
    config_path: None,
    style_encoder_path: None,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServiceConfig::from_env(DEFAULTS).context("invalid configuration")?;
    let addr = config.addr()?;

    tracing::info!("{} v{}", config.name, env!("CARGO_PKG_VERSION"));

    let mut voices = voices::voice_conversion_voices();
    if let Some(dir) = &config.voices_dir {
        tracing::info!("Voices directory: {}", dir.display());
        voices = voices.rooted_at(dir);
    }

    tracing::info!("Loading voice conversion model from {}", config.models.model.display());
    let converter = OnnxVoiceConverter::load(&config.models.model)
        .context("failed to load voice conversion model")?;
    tracing::info!("Voice conversion model loaded successfully");

    let context = ServiceContext::connect(&config, voices)
        .await
        .context("failed to prepare storage")?;

    let state = Arc::new(VoiceConversionState {
        context,
        converter: Some(Arc::new(converter)),
    });
    let app = voice_conversion_router(state, ApiKey::new(config.api_key.clone()));

    serve(addr, app).await.context("server error")?;

    tracing::info!("Shutting down voice conversion service");
    Ok(())
}
