//! Universal audio-output coordinator. Playback has no per-call language
//! selection, so fallback order reduces to a plain try-the-next-candidate
//! loop on fault.

use crate::state::{is_fallback_trigger, CoordinatorState};
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use vox_core::provider::CapabilityKind;
use vox_core::{AudioFrame, Error, Result};
use vox_registry::Registry;

pub struct AudioCoordinator {
    state: CoordinatorState,
}

impl AudioCoordinator {
    pub fn new(registry: Arc<Registry>, default_name: impl Into<String>, fallback_order: Vec<String>) -> Self {
        Self {
            state: CoordinatorState::new(CapabilityKind::Audio, registry, default_name, fallback_order),
        }
    }

    pub async fn play_file(&self, path: &str, opts: &serde_json::Value, provider: Option<&str>) -> Result<()> {
        let candidates = self.state.candidates(provider);
        if candidates.is_empty() {
            return Err(Error::ProviderNotFound {
                kind: "audio".to_string(),
                name: provider.unwrap_or("<default>").to_string(),
            });
        }
        let mut last_err = None;
        for candidate in &candidates {
            let Some(audio) = candidate.as_audio() else { continue };
            match audio.play_file(path, opts).await {
                Ok(()) => return Ok(()),
                Err(err) if is_fallback_trigger(&err) => {
                    tracing::warn!(provider = audio.name(), error = %err, "audio provider faulted, trying next");
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.unwrap_or_else(|| Error::internal("no audio candidate attempted")))
    }

    pub async fn play_stream(
        &self,
        chunks: Pin<Box<dyn Stream<Item = AudioFrame> + Send + '_>>,
        opts: &serde_json::Value,
        provider: Option<&str>,
    ) -> Result<()> {
        let candidate = self
            .state
            .candidates(provider)
            .into_iter()
            .find_map(|c| c.as_audio())
            .ok_or_else(|| Error::ProviderNotFound {
                kind: "audio".to_string(),
                name: provider.unwrap_or("<default>").to_string(),
            })?;
        candidate.play_stream(chunks, opts).await
    }

    pub async fn set_volume(&self, volume: f32, provider: Option<&str>) -> Result<()> {
        let candidate = self
            .state
            .candidates(provider)
            .into_iter()
            .find_map(|c| c.as_audio())
            .ok_or_else(|| Error::ProviderNotFound {
                kind: "audio".to_string(),
                name: provider.unwrap_or("<default>").to_string(),
            })?;
        candidate.set_volume(volume).await
    }

    pub async fn stop(&self, provider: Option<&str>) -> Result<()> {
        let candidate = self
            .state
            .candidates(provider)
            .into_iter()
            .find_map(|c| c.as_audio())
            .ok_or_else(|| Error::ProviderNotFound {
                kind: "audio".to_string(),
                name: provider.unwrap_or("<default>").to_string(),
            })?;
        candidate.stop().await
    }

    pub fn list_providers(&self) -> Vec<crate::state::ProviderSummary> {
        self.state.list_providers()
    }

    pub fn set_default(&self, name: &str) -> Result<()> {
        self.state.set_default(name)
    }
}
