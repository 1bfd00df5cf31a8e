pub mod handlers;
pub mod routes;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::AppError;

/// `Json` extractor whose rejections use the service's JSON error body
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateAudioRequest {
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateSpeechRequest {
    pub text: String,
    pub target_voice: String,
}

#[derive(Debug, Deserialize)]
pub struct ConvertVoiceRequest {
    pub source_audio_key: String,
    pub target_voice: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AudioResponse {
    pub audio_url: String,
    pub s3_key: String,
}

#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub voices: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: &'static str,
}
