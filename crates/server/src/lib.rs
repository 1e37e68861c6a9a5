//! The HTTP/WebSocket surface: coordinator operations (ASR/TTS/Audio),
//! donation and config admin routes, and health/status endpoints.

pub mod error;
pub mod http;
pub mod state;
pub mod websocket;

pub use error::ApiError;
pub use http::create_router;
pub use state::AppState;
