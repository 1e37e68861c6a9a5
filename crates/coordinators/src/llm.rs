//! Universal LLM coordinator. `enhance`/`chat` share the same fallback loop;
//! unknown parameters in the options object are dropped (with a log) rather
//! than failing the call, since `GenerationOptions` deserializes permissively.

use crate::state::{is_fallback_trigger, CoordinatorState};
use std::sync::Arc;
use vox_core::provider::CapabilityKind;
use vox_core::{ChatMessage, Error, GenerationOptions, Result};
use vox_registry::Registry;

pub struct LlmCoordinator {
    state: CoordinatorState,
}

impl LlmCoordinator {
    pub fn new(registry: Arc<Registry>, default_name: impl Into<String>, fallback_order: Vec<String>) -> Self {
        Self {
            state: CoordinatorState::new(CapabilityKind::Llm, registry, default_name, fallback_order),
        }
    }

    /// Parses a raw options object into `GenerationOptions`, logging and
    /// dropping any keys the typed struct doesn't recognize.
    pub fn parse_options(raw: &serde_json::Value) -> GenerationOptions {
        const KNOWN: &[&str] = &["temperature", "max_tokens", "task"];
        if let serde_json::Value::Object(map) = raw {
            for key in map.keys() {
                if !KNOWN.contains(&key.as_str()) {
                    tracing::debug!(param = %key, "dropping unknown llm parameter");
                }
            }
        }
        serde_json::from_value(raw.clone()).unwrap_or_default()
    }

    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        opts: &GenerationOptions,
        provider: Option<&str>,
    ) -> Result<String> {
        let candidates = self.state.candidates(provider);
        if candidates.is_empty() {
            return Err(Error::ProviderNotFound {
                kind: "llm".to_string(),
                name: provider.unwrap_or("<default>").to_string(),
            });
        }
        let mut last_err = None;
        for candidate in &candidates {
            let Some(llm) = candidate.as_llm() else { continue };
            match llm.chat(messages, opts).await {
                Ok(text) => return Ok(text),
                Err(err) if is_fallback_trigger(&err) => {
                    tracing::warn!(provider = llm.name(), error = %err, "llm provider faulted, trying next");
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.unwrap_or_else(|| Error::internal("no llm candidate attempted")))
    }

    pub async fn enhance(
        &self,
        text: &str,
        task: &str,
        opts: &GenerationOptions,
        provider: Option<&str>,
    ) -> Result<String> {
        let candidates = self.state.candidates(provider);
        if candidates.is_empty() {
            return Err(Error::ProviderNotFound {
                kind: "llm".to_string(),
                name: provider.unwrap_or("<default>").to_string(),
            });
        }
        let mut last_err = None;
        for candidate in &candidates {
            let Some(llm) = candidate.as_llm() else { continue };
            match llm.enhance(text, task, opts).await {
                Ok(result) => return Ok(result),
                Err(err) if is_fallback_trigger(&err) => {
                    tracing::warn!(provider = llm.name(), error = %err, "llm provider faulted, trying next");
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.unwrap_or_else(|| Error::internal("no llm candidate attempted")))
    }

    pub fn list_providers(&self) -> Vec<crate::state::ProviderSummary> {
        self.state.list_providers()
    }

    pub fn set_default(&self, name: &str) -> Result<()> {
        self.state.set_default(name)
    }
}
