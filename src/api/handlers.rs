use std::path::Path;
use std::sync::Arc;

use axum::{extract::State, Json};

use super::routes::{
    ServiceContext, ServiceState, TextToAudioState, TextToSpeechState, VoiceConversionState,
};
use super::{
    AudioResponse, ConvertVoiceRequest, GenerateAudioRequest, GenerateSpeechRequest,
    HealthResponse, JsonBody, VoicesResponse,
};
use crate::audio::{write_wav, Waveform};
use crate::error::{AppError, ExecutionError};
use crate::inference::{InferenceError, SpeechSynthesizer};
use crate::staging::StagedFile;
use crate::storage::{object_key, StorageError, PRESIGN_EXPIRY};
use crate::text::{split_into_chunks, DEFAULT_MAX_CHUNK_SIZE};

/// Longest text the speech endpoint accepts, in characters
pub const MAX_TEXT_LENGTH: usize = 5000;

/// Pause inserted between synthesized chunks
pub const CHUNK_GAP_SECS: f32 = 0.3;

const AUDIO_FAILED: &str = "Error generating audio";
const SPEECH_FAILED: &str = "Failed to generate speech";
const CONVERSION_FAILED: &str = "Error in voice conversion";

pub async fn generate_audio(
    State(state): State<Arc<TextToAudioState>>,
    JsonBody(request): JsonBody<GenerateAudioRequest>,
) -> Result<Json<AudioResponse>, AppError> {
    let generator = state
        .generator
        .clone()
        .ok_or(AppError::ModelNotReady("Models not loaded"))?;

    if request.prompt.trim().is_empty() {
        return Err(AppError::BadRequest("Prompt cannot be empty".into()));
    }

    tracing::info!("Generating audio for prompt of {} chars", request.prompt.chars().count());

    let prompt = request.prompt;
    let waveform = tokio::task::spawn_blocking(move || generator.generate(&prompt))
        .await
        .map_err(|e| AppError::internal(AUDIO_FAILED, e))?
        .map_err(|e| AppError::internal(AUDIO_FAILED, e))?;

    let response = publish(&state.context, waveform)
        .await
        .map_err(|e| AppError::internal(AUDIO_FAILED, e))?;

    Ok(Json(response))
}

pub async fn generate_speech(
    State(state): State<Arc<TextToSpeechState>>,
    JsonBody(request): JsonBody<GenerateSpeechRequest>,
) -> Result<Json<AudioResponse>, AppError> {
    if request.text.chars().count() > MAX_TEXT_LENGTH {
        return Err(AppError::TextTooLong(MAX_TEXT_LENGTH));
    }

    let synthesizer = state
        .synthesizer
        .clone()
        .ok_or(AppError::ModelNotReady("Model not loaded"))?;

    let reference = state
        .context
        .voices
        .resolve(&request.target_voice)?
        .to_path_buf();

    if request.text.trim().is_empty() {
        return Err(AppError::BadRequest("Text cannot be empty".into()));
    }

    tracing::info!(
        "Using voice {} from {}",
        request.target_voice,
        reference.display()
    );

    let chunks = split_into_chunks(&request.text, DEFAULT_MAX_CHUNK_SIZE);
    tracing::info!("Text split into {} chunks", chunks.len());

    let waveform = tokio::task::spawn_blocking(move || {
        synthesize_chunks(&*synthesizer, &reference, &chunks)
    })
    .await
    .map_err(|e| AppError::internal(SPEECH_FAILED, e))?
    .map_err(|e| AppError::internal(SPEECH_FAILED, e))?;

    let response = publish(&state.context, waveform)
        .await
        .map_err(|e| AppError::internal(SPEECH_FAILED, e))?;

    Ok(Json(response))
}

/// Synthesize chunks in order and join them with a short pause
pub fn synthesize_chunks(
    synthesizer: &dyn SpeechSynthesizer,
    reference: &Path,
    chunks: &[String],
) -> Result<Waveform, InferenceError> {
    let style = synthesizer.compute_style(reference)?;

    let mut segments = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        tracing::debug!("Processing chunk {}/{}", i + 1, chunks.len());
        segments.push(synthesizer.synthesize(chunk, &style)?);
    }

    let gap = Waveform::silence(CHUNK_GAP_SECS, synthesizer.sample_rate());
    Ok(Waveform::concat_with_gap(segments, &gap))
}

pub async fn convert_voice(
    State(state): State<Arc<VoiceConversionState>>,
    JsonBody(request): JsonBody<ConvertVoiceRequest>,
) -> Result<Json<AudioResponse>, AppError> {
    let converter = state
        .converter
        .clone()
        .ok_or(AppError::ModelNotReady("Model not loaded"))?;

    let target = state
        .context
        .voices
        .resolve(&request.target_voice)?
        .to_path_buf();

    if request.source_audio_key.trim().is_empty() {
        return Err(AppError::BadRequest("source_audio_key cannot be empty".into()));
    }

    tracing::info!(
        "Converting voice: {} to {}",
        request.source_audio_key,
        request.target_voice
    );

    let source = tempfile::Builder::new()
        .suffix(".wav")
        .tempfile_in(&state.context.staging_dir)
        .map_err(|e| AppError::internal(CONVERSION_FAILED, e))?;

    match state
        .context
        .store
        .download_file(&request.source_audio_key, source.path())
        .await
    {
        Ok(()) => {}
        Err(StorageError::NotFound(key)) => {
            tracing::warn!("Source audio {} not found", key);
            return Err(AppError::NotFound("Source audio not found"));
        }
        Err(e) => return Err(AppError::internal(CONVERSION_FAILED, e)),
    }

    let source_path = source.path().to_path_buf();
    let converted = tokio::task::spawn_blocking(move || converter.convert(&source_path, &target)).await;

    // the source copy goes away whether or not conversion worked
    drop(source);

    let waveform = converted
        .map_err(|e| AppError::internal(CONVERSION_FAILED, e))?
        .map_err(|e| AppError::internal(CONVERSION_FAILED, e))?;

    let response = publish(&state.context, waveform)
        .await
        .map_err(|e| AppError::internal(CONVERSION_FAILED, e))?;

    Ok(Json(response))
}

/// Stage the waveform locally, upload it and presign a download link.
///
/// The staged file is removed when this returns, on success or failure.
pub async fn publish(
    context: &ServiceContext,
    waveform: Waveform,
) -> Result<AudioResponse, ExecutionError> {
    let staged = StagedFile::new(&context.staging_dir, "wav");

    let path = staged.path().to_path_buf();
    tokio::task::spawn_blocking(move || write_wav(&path, &waveform)).await??;

    let key = object_key(&context.prefix, staged.id());
    context.store.upload_file(staged.path(), &key).await?;
    let audio_url = context.store.presign_get(&key, PRESIGN_EXPIRY).await?;

    tracing::info!("Uploaded generated audio to {}", key);

    Ok(AudioResponse {
        audio_url,
        s3_key: key,
    })
}

pub async fn list_voices<S: ServiceState>(State(state): State<Arc<S>>) -> Json<VoicesResponse> {
    Json(VoicesResponse {
        voices: state.context().voices.names(),
    })
}

pub async fn health<S: ServiceState>(State(state): State<Arc<S>>) -> Json<HealthResponse> {
    let response = if state.model_loaded() {
        HealthResponse {
            status: "healthy",
            model: "loaded",
        }
    } else {
        HealthResponse {
            status: "unhealthy",
            model: "not loaded",
        }
    };
    Json(response)
}
