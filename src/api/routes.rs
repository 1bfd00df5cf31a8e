use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use crate::auth::{require_api_key, ApiKey};
use crate::config::ServiceConfig;
use crate::inference::{AudioGenerator, SpeechSynthesizer, VoiceConverter};
use crate::storage::{ObjectStore, S3Store};
use crate::voices::VoiceRegistry;

/// What every service needs besides its model
pub struct ServiceContext {
    pub store: Arc<dyn ObjectStore>,
    pub prefix: String,
    pub staging_dir: PathBuf,
    pub voices: VoiceRegistry,
}

impl ServiceContext {
    /// Connect to the configured bucket and prepare the staging directory
    pub async fn connect(config: &ServiceConfig, voices: VoiceRegistry) -> std::io::Result<Self> {
        std::fs::create_dir_all(&config.staging_dir)?;

        let store = S3Store::from_config(&config.storage).await;
        tracing::info!(
            "Storing results in s3://{}/{}",
            store.bucket(),
            config.storage.prefix
        );

        Ok(Self {
            store: Arc::new(store),
            prefix: config.storage.prefix.clone(),
            staging_dir: config.staging_dir.clone(),
            voices,
        })
    }
}

/// Shared, read-only state of one service
pub trait ServiceState: Send + Sync + 'static {
    fn context(&self) -> &ServiceContext;

    fn model_loaded(&self) -> bool;
}

pub struct TextToAudioState {
    pub context: ServiceContext,
    pub generator: Option<Arc<dyn AudioGenerator>>,
}

pub struct TextToSpeechState {
    pub context: ServiceContext,
    pub synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
}

pub struct VoiceConversionState {
    pub context: ServiceContext,
    pub converter: Option<Arc<dyn VoiceConverter>>,
}

impl ServiceState for TextToAudioState {
    fn context(&self) -> &ServiceContext {
        &self.context
    }

    fn model_loaded(&self) -> bool {
        self.generator.is_some()
    }
}

impl ServiceState for TextToSpeechState {
    fn context(&self) -> &ServiceContext {
        &self.context
    }

    fn model_loaded(&self) -> bool {
        self.synthesizer.is_some()
    }
}

impl ServiceState for VoiceConversionState {
    fn context(&self) -> &ServiceContext {
        &self.context
    }

    fn model_loaded(&self) -> bool {
        self.converter.is_some()
    }
}

pub fn text_to_audio_router(state: Arc<TextToAudioState>, api_key: ApiKey) -> Router {
    let routes = Router::new().route("/generate", post(handlers::generate_audio));
    finish(routes, state, api_key)
}

pub fn text_to_speech_router(state: Arc<TextToSpeechState>, api_key: ApiKey) -> Router {
    let routes = Router::new().route("/generate", post(handlers::generate_speech));
    finish(routes, state, api_key)
}

pub fn voice_conversion_router(state: Arc<VoiceConversionState>, api_key: ApiKey) -> Router {
    let routes = Router::new().route("/convert", post(handlers::convert_voice));
    finish(routes, state, api_key)
}

/// Add the shared routes, gate everything behind the API key
fn finish<S: ServiceState>(routes: Router<Arc<S>>, state: Arc<S>, api_key: ApiKey) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    routes
        .route("/voices", get(handlers::list_voices::<S>))
        .route("/health", get(handlers::health::<S>))
        .route_layer(middleware::from_fn_with_state(api_key, require_api_key))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
