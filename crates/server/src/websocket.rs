//! `/asr/stream`: a tagged-message protocol over a single WebSocket
//! connection. Each `audio_chunk` frame is transcribed independently through
//! the same coordinator fallback path `POST /asr/transcribe` uses; an
//! unrecognized message `type` always gets an explicit `error` frame back,
//! never a silent drop.

use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use vox_core::{AudioFrame, TranscribeOptions};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    AudioChunk {
        data: String,
        #[serde(default)]
        sample_rate: Option<u32>,
        #[serde(default)]
        language: Option<String>,
        #[serde(default)]
        enhance: bool,
        #[serde(default)]
        provider: Option<String>,
    },
    EndSession,
    Ping,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    TranscriptionResult { text: String, is_final: bool },
    Error { code: &'static str, message: String },
    Pong,
    SessionEnded,
}

pub async fn asr_stream(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    loop {
        let Some(Ok(message)) = socket.recv().await else {
            return;
        };
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => return,
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => continue,
        };

        let parsed: Result<ClientMessage, _> = serde_json::from_str(&text);
        let reply = match parsed {
            Ok(ClientMessage::Ping) => ServerMessage::Pong,
            Ok(ClientMessage::EndSession) => {
                let _ = send(&mut socket, &ServerMessage::SessionEnded).await;
                return;
            }
            Ok(ClientMessage::AudioChunk {
                data,
                sample_rate,
                language,
                enhance,
                provider,
            }) => match transcribe_chunk(&state, &data, sample_rate, language, enhance, provider.as_deref()).await {
                Ok(text) => ServerMessage::TranscriptionResult { text, is_final: true },
                Err(err) => ServerMessage::Error {
                    code: err.code(),
                    message: err.to_string(),
                },
            },
            Err(err) => ServerMessage::Error {
                code: "schema_mismatch",
                message: format!("unrecognized message: {err}"),
            },
        };

        if send(&mut socket, &reply).await.is_err() {
            return;
        }
    }
}

async fn transcribe_chunk(
    state: &AppState,
    data: &str,
    sample_rate: Option<u32>,
    language: Option<String>,
    enhance: bool,
    provider: Option<&str>,
) -> vox_core::Result<String> {
    let bytes = BASE64
        .decode(data)
        .map_err(|e| vox_core::Error::SchemaMismatch(format!("invalid base64 audio payload: {e}")))?;
    let samples: Vec<f32> = bytes
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]) as f32 / i16::MAX as f32)
        .collect();
    let frame = AudioFrame::new(samples, sample_rate.unwrap_or(16_000), 1);
    if frame.is_empty() {
        return Ok(String::new());
    }
    let opts = TranscribeOptions {
        language,
        enhance,
        strict_streaming: false,
    };
    state.asr.transcribe(&frame, &opts, provider).await
}

async fn send(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(message).expect("ServerMessage always serializes");
    socket.send(Message::Text(payload)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_message_type_produces_schema_mismatch_error() {
        let parsed: Result<ClientMessage, _> = serde_json::from_str(r#"{"type":"unsupported_thing"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn audio_chunk_round_trips_through_serde() {
        let json = r#"{"type":"audio_chunk","data":"AAA=","sample_rate":16000}"#;
        let parsed: ClientMessage = serde_json::from_str(json).unwrap();
        matches!(parsed, ClientMessage::AudioChunk { .. });
    }
}
