//! Canonical HTTP error envelope. `vox_core::Error` already carries a stable
//! `code()`, an `http_status()`, and a `should_alert()` verdict, so this is a
//! thin `IntoResponse` wrapper rather than a second error-kind mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use vox_core::Error;

pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        if err.should_alert() {
            tracing::error!(error = %err, code = err.code(), "internal error");
        }
        ApiError(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

#[derive(Serialize)]
struct Envelope {
    success: bool,
    error: ErrorBody,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Envelope {
            success: false,
            error: ErrorBody {
                code: self.0.code(),
                message: self.0.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Wraps a successful payload in the `{success: true, data: ...}` envelope.
pub fn ok<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true, "data": data }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_not_found_renders_404() {
        let err: ApiError = Error::ProviderNotFound {
            kind: "asr".to_string(),
            name: "vosk".to_string(),
        }
        .into();
        assert_eq!(err.0.http_status(), 404);
    }

    #[test]
    fn intent_unresolved_renders_200_not_an_error_status() {
        let err: ApiError = Error::IntentUnresolved.into();
        assert_eq!(err.0.http_status(), 200);
    }
}
