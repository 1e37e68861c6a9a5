//! Ollama-backed `LanguageModel`: chat completion over `/api/chat` with
//! exponential-backoff retry on transient network/server errors.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use vox_core::provider::{Capabilities, ParameterSchema, ParameterSpec, ProviderMetadata};
use vox_core::{ChatMessage, Error, GenerationOptions, LanguageModel, Result, Role};

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub model: String,
    pub endpoint: String,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            model: "qwen2.5:3b-instruct".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            timeout: Duration::from_secs(30),
        }
    }
}

impl OllamaConfig {
    pub fn from_options(options: &toml::Table) -> Self {
        let mut config = Self::default();
        if let Some(model) = options.get("model").and_then(|v| v.as_str()) {
            config.model = model.to_string();
        }
        if let Some(endpoint) = options.get("endpoint").and_then(|v| v.as_str()) {
            config.endpoint = endpoint.to_string();
        }
        if let Some(retries) = options.get("max_retries").and_then(|v| v.as_integer()) {
            config.max_retries = retries.max(0) as u32;
        }
        config
    }
}

pub struct OllamaLlm {
    client: Client,
    config: OllamaConfig,
}

impl OllamaLlm {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::internal(format!("failed to build ollama http client: {e}")))?;
        Ok(Self { client, config })
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.endpoint)
    }

    async fn call(&self, messages: &[ChatMessage], opts: &GenerationOptions) -> Result<String> {
        let request = OllamaChatRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(OllamaMessage::from).collect(),
            stream: false,
            options: OllamaOptions {
                temperature: opts.temperature,
                num_predict: opts.max_tokens.map(|t| t as i64),
            },
        };

        let mut backoff = self.config.initial_backoff;
        let mut last_err = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::warn!(attempt, backoff_ms = backoff.as_millis(), "retrying ollama request");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            match self.execute(&request).await {
                Ok(text) => return Ok(text),
                Err(err) if is_retryable(&err) => last_err = Some(err),
                Err(err) => return Err(err),
            }
        }
        Err(last_err.unwrap_or_else(|| Error::ProviderFaulted {
            kind: "llm".to_string(),
            name: self.config.model.clone(),
            cause: "retries exhausted".to_string(),
        }))
    }

    async fn execute(&self, request: &OllamaChatRequest) -> Result<String> {
        let response = self
            .client
            .post(self.chat_url())
            .json(request)
            .send()
            .await
            .map_err(|e| fault(&self.config.model, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(fault(&self.config.model, format!("http {status}: {body}")));
        }

        let parsed: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| fault(&self.config.model, format!("invalid response body: {e}")))?;
        Ok(parsed.message.content)
    }
}

fn fault(name: &str, cause: String) -> Error {
    Error::ProviderFaulted {
        kind: "llm".to_string(),
        name: name.to_string(),
        cause,
    }
}

fn is_retryable(err: &Error) -> bool {
    matches!(err, Error::ProviderFaulted { .. })
}

impl ProviderMetadata for OllamaLlm {
    fn name(&self) -> &str {
        "ollama"
    }

    fn parameter_schema(&self) -> ParameterSchema {
        vec![
            ParameterSpec {
                name: "temperature".to_string(),
                kind: "number".to_string(),
                default: Some(serde_json::json!(0.7)),
                enum_values: None,
                range: Some((0.0, 2.0)),
                required: false,
            },
            ParameterSpec {
                name: "max_tokens".to_string(),
                kind: "integer".to_string(),
                default: Some(serde_json::json!(256)),
                enum_values: None,
                range: None,
                required: false,
            },
        ]
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            languages: vec!["en".to_string()],
            formats: Vec::new(),
            streaming: false,
            realtime: false,
            concurrent: true,
        }
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[async_trait]
impl LanguageModel for OllamaLlm {
    async fn enhance(&self, text: &str, task: &str, opts: &GenerationOptions) -> Result<String> {
        let messages = vec![
            ChatMessage::system(format!("Task: {task}. Respond with the transformed text only.")),
            ChatMessage::user(text),
        ];
        self.call(&messages, opts).await
    }

    async fn chat(&self, messages: &[ChatMessage], opts: &GenerationOptions) -> Result<String> {
        self.call(messages, opts).await
    }

    fn available_models(&self) -> Vec<String> {
        vec![self.config.model.clone()]
    }

    fn supported_tasks(&self) -> Vec<String> {
        vec!["chat".to_string(), "enhance".to_string()]
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for OllamaMessage {
    fn from(msg: &ChatMessage) -> Self {
        let role = match msg.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        Self {
            role: role.to_string(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_options_reads_model_and_endpoint() {
        let mut table = toml::Table::new();
        table.insert("model".to_string(), toml::Value::String("llama3:8b".to_string()));
        table.insert(
            "endpoint".to_string(),
            toml::Value::String("http://ollama.local:11434".to_string()),
        );
        let config = OllamaConfig::from_options(&table);
        assert_eq!(config.model, "llama3:8b");
        assert_eq!(config.endpoint, "http://ollama.local:11434");
    }

    #[test]
    fn from_options_falls_back_to_defaults() {
        let config = OllamaConfig::from_options(&toml::Table::new());
        assert_eq!(config.endpoint, "http://localhost:11434");
    }

    #[test]
    fn message_conversion_maps_roles() {
        let msg = ChatMessage::user("hi");
        let converted = OllamaMessage::from(&msg);
        assert_eq!(converted.role, "user");
        assert_eq!(converted.content, "hi");
    }
}
