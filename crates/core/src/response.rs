//! Response type. Routed by `response_type` to output targets whose
//! capability set includes it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Text,
    Tts,
    Error,
    Notification,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    pub response_type: ResponseType,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub priority: u8,
}

impl Response {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            response_type: ResponseType::Text,
            metadata: serde_json::Map::new(),
            priority: 0,
        }
    }

    pub fn tts(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            response_type: ResponseType::Tts,
            metadata: serde_json::Map::new(),
            priority: 0,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            response_type: ResponseType::Error,
            metadata: serde_json::Map::new(),
            priority: 10,
        }
    }

    pub fn not_understood() -> Self {
        Self::text("I did not understand that.")
    }
}
