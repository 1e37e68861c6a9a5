//! Universal TTS coordinator: same fallback discipline as ASR, keyed by
//! voice/language support instead of ASR's language support.

use crate::state::{is_fallback_trigger, CoordinatorState};
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use vox_core::provider::CapabilityKind;
use vox_core::{AudioFrame, Error, Result};
use vox_registry::Registry;

pub struct TtsCoordinator {
    state: CoordinatorState,
}

impl TtsCoordinator {
    pub fn new(registry: Arc<Registry>, default_name: impl Into<String>, fallback_order: Vec<String>) -> Self {
        Self {
            state: CoordinatorState::new(CapabilityKind::Tts, registry, default_name, fallback_order),
        }
    }

    pub async fn synthesize(&self, text: &str, voice: Option<&str>, provider: Option<&str>) -> Result<AudioFrame> {
        let candidates = self.state.candidates(provider);
        if candidates.is_empty() {
            return Err(Error::ProviderNotFound {
                kind: "tts".to_string(),
                name: provider.unwrap_or("<default>").to_string(),
            });
        }

        let mut last_err = None;
        for candidate in &candidates {
            let Some(tts) = candidate.as_tts() else { continue };
            match tts.synthesize(text, voice).await {
                Ok(frame) => return Ok(frame),
                Err(err) if is_fallback_trigger(&err) => {
                    tracing::warn!(provider = tts.name(), error = %err, "tts provider faulted, trying next");
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.unwrap_or_else(|| Error::internal("no tts candidate attempted")))
    }

    pub fn synthesize_stream<'a>(
        &'a self,
        text: &'a str,
        voice: Option<&'a str>,
        provider: Option<&'a str>,
    ) -> Pin<Box<dyn Stream<Item = Result<AudioFrame>> + Send + 'a>> {
        let candidates = self.state.candidates(provider);
        Box::pin(async_stream::stream! {
            let Some(candidate) = candidates.iter().find_map(|c| c.as_tts()) else {
                yield Err(Error::ProviderNotFound {
                    kind: "tts".to_string(),
                    name: provider.unwrap_or("<default>").to_string(),
                });
                return;
            };
            let mut inner = candidate.synthesize_stream(text, voice);
            use futures::StreamExt;
            while let Some(item) = inner.next().await {
                yield item;
            }
        })
    }

    pub fn list_providers(&self) -> Vec<crate::state::ProviderSummary> {
        self.state.list_providers()
    }

    pub fn set_default(&self, name: &str) -> Result<()> {
        self.state.set_default(name)
    }
}
