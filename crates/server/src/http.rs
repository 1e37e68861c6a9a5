//! The HTTP surface: the superset of coordinator operations (ASR/TTS/Audio)
//! plus admin (provider defaults, donation edits, config writes, health).

use crate::error::{ok, ApiError};
use crate::state::AppState;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use vox_config::settings::CorsConfig;
use vox_core::donation::Donation;
use vox_core::provider::CapabilityKind;
use vox_core::{AudioFrame, Error, TranscribeOptions};

pub fn create_router(state: AppState) -> Router {
    let settings = state.config.snapshot();
    let cors = build_cors_layer(&settings.webapi.cors);
    drop(settings);

    Router::new()
        .route("/asr/transcribe", post(transcribe))
        .route("/asr/stream", get(crate::websocket::asr_stream))
        .route("/asr/providers", get(asr_providers))
        .route("/tts/speak", post(speak))
        .route("/tts/providers", get(tts_providers))
        .route("/audio/providers", get(audio_providers))
        .route("/:kind/configure", post(configure_provider))
        .route("/donations/:handler/:language", get(get_donation).put(put_donation))
        .route("/donations/:handler/:language/validate", post(validate_donation_route))
        .route("/donations/:handler/parity", get(parity_report))
        .route("/donations/:handler/sync", post(sync_parameters))
        .route("/config/:section", put(update_config_section))
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/metrics", get(render_metrics))
        .layer(axum::middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    if !config.enabled {
        return CorsLayer::permissive();
    }
    if config.allowed_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers(Any);
    }
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(origin = %origin, "invalid CORS origin, skipping");
                None
            })
        })
        .collect();
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers(Any);
    }
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(true)
}

/// Bearer-token check against `webapi.auth.api_keys`. A no-op when auth is
/// disabled in config. `/health` is always exempt.
async fn auth_middleware(
    State(state): State<AppState>,
    req: axum::extract::Request,
    next: Next,
) -> axum::response::Response {
    let settings = state.config.snapshot();
    if !settings.webapi.auth.enabled || matches!(req.uri().path(), "/health" | "/metrics") {
        return next.run(req).await;
    }
    let presented = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match presented {
        Some(key) if settings.webapi.auth.api_keys.iter().any(|k| k == key) => next.run(req).await,
        _ => ApiError::from(Error::ProviderUnavailable {
            kind: "auth".to_string(),
            name: "bearer".to_string(),
            reason: "missing or invalid API key".to_string(),
        })
        .into_response(),
    }
}

#[derive(Deserialize, Default)]
struct TranscribeQuery {
    provider: Option<String>,
    language: Option<String>,
    #[serde(default)]
    enhance: bool,
}

#[derive(Serialize)]
struct TranscribeResponse {
    text: String,
    provider: String,
    language: Option<String>,
}

async fn transcribe(
    State(state): State<AppState>,
    Query(query): Query<TranscribeQuery>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut audio_bytes = Vec::new();
    let mut provider = query.provider;
    let mut language = query.language;
    let mut enhance = query.enhance;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::SchemaMismatch(format!("malformed multipart body: {e}")))?
    {
        match field.name().unwrap_or("") {
            "audio" => {
                audio_bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::SchemaMismatch(format!("malformed audio field: {e}")))?
                    .to_vec()
            }
            "provider" => provider = field.text().await.ok(),
            "language" => language = field.text().await.ok(),
            "enhance" => enhance = field.text().await.ok().map(|v| v == "true").unwrap_or(enhance),
            _ => {}
        }
    }

    let audio = decode_pcm16_wav(&audio_bytes);
    if audio.is_empty() {
        return Ok(ok(TranscribeResponse {
            text: String::new(),
            provider: provider.unwrap_or_default(),
            language,
        }));
    }

    let opts = TranscribeOptions {
        language: language.clone(),
        enhance,
        strict_streaming: false,
    };
    let text = state.asr.transcribe(&audio, &opts, provider.as_deref()).await?;
    Ok(ok(TranscribeResponse {
        text,
        provider: provider.unwrap_or_else(|| "<default>".to_string()),
        language,
    }))
}

/// Tries a WAV container first; falls back to raw little-endian int16 PCM at
/// 16kHz mono, which is what the WebSocket audio_chunk path always sends.
fn decode_pcm16_wav(bytes: &[u8]) -> AudioFrame {
    if bytes.is_empty() {
        return AudioFrame::new(Vec::new(), 16_000, 1);
    }
    if let Ok(mut reader) = hound::WavReader::new(std::io::Cursor::new(bytes)) {
        let spec = reader.spec();
        let samples: Vec<f32> = reader
            .samples::<i16>()
            .filter_map(|s| s.ok())
            .map(|s| s as f32 / i16::MAX as f32)
            .collect();
        return AudioFrame::new(samples, spec.sample_rate, spec.channels);
    }
    let samples: Vec<f32> = bytes
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]) as f32 / i16::MAX as f32)
        .collect();
    AudioFrame::new(samples, 16_000, 1)
}

#[derive(Deserialize)]
struct SpeakRequest {
    text: String,
    provider: Option<String>,
    voice: Option<String>,
    #[serde(default = "default_true")]
    return_audio: bool,
}

fn default_true() -> bool {
    true
}

async fn speak(State(state): State<AppState>, Json(req): Json<SpeakRequest>) -> Result<impl IntoResponse, ApiError> {
    let frame = state
        .tts
        .synthesize(&req.text, req.voice.as_deref(), req.provider.as_deref())
        .await?;
    if req.return_audio {
        let pcm_bytes: Vec<u8> = frame
            .samples
            .iter()
            .flat_map(|s| ((s * i16::MAX as f32) as i16).to_le_bytes())
            .collect();
        return Ok(ok(serde_json::json!({
            "audio_base64": BASE64.encode(&pcm_bytes),
            "sample_rate": frame.sample_rate,
            "channels": frame.channels,
        })));
    }
    state
        .audio
        .play_stream(
            Box::pin(futures::stream::once(async move { frame })),
            &serde_json::Value::Null,
            None,
        )
        .await?;
    Ok(ok(serde_json::json!({ "played": true })))
}

#[derive(Serialize)]
struct ProviderInfo {
    name: String,
    available: bool,
    streaming: bool,
    realtime: bool,
    languages: Vec<String>,
}

impl From<vox_coordinators::ProviderSummary> for ProviderInfo {
    fn from(summary: vox_coordinators::ProviderSummary) -> Self {
        Self {
            name: summary.name,
            available: summary.available,
            streaming: summary.capabilities.streaming,
            realtime: summary.capabilities.realtime,
            languages: summary.capabilities.languages,
        }
    }
}

async fn asr_providers(State(state): State<AppState>) -> impl IntoResponse {
    let list: Vec<ProviderInfo> = state.asr.list_providers().into_iter().map(Into::into).collect();
    ok(list)
}

async fn tts_providers(State(state): State<AppState>) -> impl IntoResponse {
    let list: Vec<ProviderInfo> = state.tts.list_providers().into_iter().map(Into::into).collect();
    ok(list)
}

async fn audio_providers(State(state): State<AppState>) -> impl IntoResponse {
    let list: Vec<ProviderInfo> = state.audio.list_providers().into_iter().map(Into::into).collect();
    ok(list)
}

#[derive(Deserialize)]
struct ConfigureRequest {
    provider: String,
}

async fn configure_provider(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(req): Json<ConfigureRequest>,
) -> Result<impl IntoResponse, ApiError> {
    match kind.as_str() {
        "asr" => state.asr.set_default(&req.provider)?,
        "tts" => state.tts.set_default(&req.provider)?,
        "audio" => state.audio.set_default(&req.provider)?,
        "llm" => state.llm.set_default(&req.provider)?,
        other => {
            return Err(Error::ProviderNotFound {
                kind: other.to_string(),
                name: req.provider,
            }
            .into())
        }
    }
    Ok(ok(serde_json::json!({ "default": req.provider })))
}

async fn get_donation(
    State(state): State<AppState>,
    Path((handler, language)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let donation = state
        .donations
        .get(&handler, &language)
        .ok_or_else(|| Error::ProviderNotFound {
            kind: "donation".to_string(),
            name: format!("{handler}/{language}"),
        })?;
    Ok(ok((*donation).clone()))
}

async fn put_donation(
    State(state): State<AppState>,
    Path((handler, language)): Path<(String, String)>,
    Json(donation): Json<Donation>,
) -> Result<impl IntoResponse, ApiError> {
    let warnings = state.donations.stage_update(&handler, &language, donation)?;
    Ok(ok(serde_json::json!({ "warnings": warnings })))
}

async fn validate_donation_route(Json(donation): Json<Donation>) -> Result<impl IntoResponse, ApiError> {
    let warnings = vox_intents::validate_donation(&donation, None, false)?;
    Ok(ok(serde_json::json!({ "warnings": warnings })))
}

async fn parity_report(State(state): State<AppState>, Path(handler): Path<String>) -> impl IntoResponse {
    ok(state.donations.parity_report(&handler))
}

#[derive(Deserialize)]
struct SyncParametersRequest {
    source_language: String,
    target_languages: Vec<String>,
}

async fn sync_parameters(
    State(state): State<AppState>,
    Path(handler): Path<String>,
    Json(req): Json<SyncParametersRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state
        .donations
        .sync_parameters(&handler, &req.source_language, &req.target_languages)?;
    Ok(ok(serde_json::json!({ "created": created })))
}

async fn update_config_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
    Json(updates): Json<serde_json::Map<String, serde_json::Value>>,
) -> Result<impl IntoResponse, ApiError> {
    let section_path: Vec<&str> = section.split('.').collect();
    vox_config::admin_write::update_section(state.config.path(), &section_path, &updates)
        .map_err(vox_core::Error::from)?;
    state.config.poll_once().map_err(vox_core::Error::from)?;
    Ok(ok(serde_json::json!({ "section": section })))
}

#[derive(Serialize)]
struct ComponentCheck {
    status: &'static str,
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let mut checks = BTreeMap::new();
    let mut healthy = true;

    for (kind, coordinator_ok) in [
        ("asr", !state.asr.list_providers().is_empty()),
        ("tts", !state.tts.list_providers().is_empty()),
        ("audio", !state.audio.list_providers().is_empty()),
    ] {
        checks.insert(
            kind.to_string(),
            ComponentCheck {
                status: if coordinator_ok { "ok" } else { "degraded" },
            },
        );
        healthy &= coordinator_ok;
    }

    let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (
        status,
        Json(serde_json::json!({ "success": true, "data": { "healthy": healthy, "checks": checks } })),
    )
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.registry.snapshot();
    let mut matrix = BTreeMap::new();
    for kind in [
        CapabilityKind::Asr,
        CapabilityKind::Tts,
        CapabilityKind::Audio,
        CapabilityKind::Llm,
        CapabilityKind::WakeWord,
    ] {
        let providers: Vec<serde_json::Value> = snapshot
            .iter(kind)
            .map(|(name, instance)| serde_json::json!({ "name": name, "available": instance.is_available() }))
            .collect();
        matrix.insert(kind.as_str(), providers);
    }
    ok(matrix)
}

async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_pcm16_wav_falls_back_to_raw_pcm_when_not_a_wav_container() {
        let samples: Vec<i16> = vec![100, -100, 200];
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let frame = decode_pcm16_wav(&bytes);
        assert_eq!(frame.samples.len(), 3);
        assert_eq!(frame.sample_rate, 16_000);
    }

    #[test]
    fn decode_pcm16_wav_on_empty_input_returns_empty_frame() {
        let frame = decode_pcm16_wav(&[]);
        assert!(frame.is_empty());
    }
}
