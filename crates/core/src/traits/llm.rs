//! LLM capability interface: chat-completion and one-shot text enhancement
//! over a provider-agnostic message/role model.

use crate::error::Result;
use crate::provider::ProviderMetadata;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub task: Option<String>,
}

#[async_trait]
pub trait LanguageModel: ProviderMetadata {
    /// One-shot text enhancement (grammar fix, normalization hint, etc.).
    async fn enhance(&self, text: &str, task: &str, opts: &GenerationOptions) -> Result<String>;

    /// Multi-turn chat completion.
    async fn chat(&self, messages: &[ChatMessage], opts: &GenerationOptions) -> Result<String>;

    fn available_models(&self) -> Vec<String>;

    fn supported_tasks(&self) -> Vec<String>;
}
