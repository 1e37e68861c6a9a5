//! Universal ASR coordinator: tries providers in fallback order, skipping
//! candidates that don't support the requested language before ever calling
//! them, and falling back to a buffered non-streaming transcription when a
//! candidate can't stream and the caller hasn't demanded strict streaming.

use crate::state::{is_fallback_trigger, CoordinatorState};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use vox_core::provider::CapabilityKind;
use vox_core::{AudioFrame, Error, Result, TranscribeOptions, TranscriptFrame};
use vox_registry::{ProviderInstance, Registry};

pub struct AsrCoordinator {
    state: CoordinatorState,
}

impl AsrCoordinator {
    pub fn new(registry: Arc<Registry>, default_name: impl Into<String>, fallback_order: Vec<String>) -> Self {
        Self {
            state: CoordinatorState::new(CapabilityKind::Asr, registry, default_name, fallback_order),
        }
    }

    pub fn state(&self) -> &CoordinatorState {
        &self.state
    }

    fn ordered_candidates(&self, opts: &TranscribeOptions, provider: Option<&str>) -> Vec<Arc<ProviderInstance>> {
        let candidates = self.state.candidates(provider);
        let Some(language) = opts.language.as_deref() else {
            return candidates;
        };
        let (matching, other): (Vec<_>, Vec<_>) = candidates.into_iter().partition(|c| {
            c.as_asr()
                .map(|asr| asr.supports_language(language))
                .unwrap_or(false)
        });
        matching.into_iter().chain(other).collect()
    }

    pub async fn transcribe(
        &self,
        audio: &AudioFrame,
        opts: &TranscribeOptions,
        provider: Option<&str>,
    ) -> Result<TranscriptFrame> {
        let candidates = self.ordered_candidates(opts, provider);
        if candidates.is_empty() {
            return Err(Error::ProviderNotFound {
                kind: "asr".to_string(),
                name: provider.unwrap_or("<default>").to_string(),
            });
        }

        let mut last_err = None;
        for candidate in &candidates {
            let Some(asr) = candidate.as_asr() else { continue };
            match asr.transcribe(audio, opts).await {
                Ok(text) => return Ok(text),
                Err(err) if is_fallback_trigger(&err) => {
                    tracing::warn!(provider = asr.name(), error = %err, "asr provider faulted, trying next");
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.unwrap_or_else(|| Error::internal("no asr candidate attempted")))
    }

    /// Streams transcription from the first suitable candidate. A candidate
    /// that doesn't advertise streaming support is only used if
    /// `opts.strict_streaming` is false, in which case the whole input
    /// stream is buffered into one frame and run through `transcribe`.
    pub fn transcribe_stream<'a>(
        &'a self,
        mut audio_stream: Pin<Box<dyn Stream<Item = AudioFrame> + Send + 'a>>,
        opts: &'a TranscribeOptions,
        provider: Option<&'a str>,
    ) -> Pin<Box<dyn Stream<Item = Result<TranscriptFrame>> + Send + 'a>> {
        let candidates = self.ordered_candidates(opts, provider);
        Box::pin(async_stream::stream! {
            let Some(candidate) = candidates
                .iter()
                .find_map(|c| c.as_asr())
            else {
                yield Err(Error::ProviderNotFound {
                    kind: "asr".to_string(),
                    name: provider.unwrap_or("<default>").to_string(),
                });
                return;
            };

            if candidate.capabilities().streaming {
                let mut inner = candidate.transcribe_stream(audio_stream, opts);
                while let Some(item) = inner.next().await {
                    yield item;
                }
                return;
            }

            if opts.strict_streaming {
                yield Err(Error::ProviderUnavailable {
                    kind: "asr".to_string(),
                    name: candidate.name().to_string(),
                    reason: "provider does not support streaming".to_string(),
                });
                return;
            }

            let mut samples = Vec::new();
            let mut sample_rate = 16000;
            let mut channels = 1;
            while let Some(frame) = audio_stream.next().await {
                sample_rate = frame.sample_rate;
                channels = frame.channels;
                samples.extend(frame.samples);
            }
            let buffered = AudioFrame::new(samples, sample_rate, channels);
            yield candidate.transcribe(&buffered, opts).await;
        })
    }

    pub fn list_providers(&self) -> Vec<crate::state::ProviderSummary> {
        self.state.list_providers()
    }

    pub fn set_default(&self, name: &str) -> Result<()> {
        self.state.set_default(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use vox_core::provider::{Capabilities, ParameterSchema, ProviderMetadata};
    use vox_registry::{Manifest, ProviderFactoryEntry};

    struct FlakyAsr {
        name: String,
        fail: bool,
    }

    impl ProviderMetadata for FlakyAsr {
        fn name(&self) -> &str {
            &self.name
        }
        fn parameter_schema(&self) -> ParameterSchema {
            Vec::new()
        }
        fn capabilities(&self) -> Capabilities {
            Capabilities {
                languages: vec!["en".to_string()],
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl vox_core::SpeechToText for FlakyAsr {
        async fn transcribe(&self, _audio: &AudioFrame, _opts: &TranscribeOptions) -> Result<TranscriptFrame> {
            if self.fail {
                Err(Error::ProviderFaulted {
                    kind: "asr".to_string(),
                    name: self.name.clone(),
                    cause: "simulated fault".to_string(),
                })
            } else {
                Ok(format!("ok from {}", self.name))
            }
        }

        fn transcribe_stream<'a>(
            &'a self,
            _audio_stream: Pin<Box<dyn Stream<Item = AudioFrame> + Send + 'a>>,
            _opts: &'a TranscribeOptions,
        ) -> Pin<Box<dyn Stream<Item = Result<TranscriptFrame>> + Send + 'a>> {
            Box::pin(futures::stream::empty())
        }

        fn supported_languages(&self) -> Vec<String> {
            vec!["en".to_string()]
        }

        fn model_name(&self) -> &str {
            "flaky"
        }
    }

    fn build_registry() -> Arc<Registry> {
        let mut manifest = Manifest::new();
        for (name, fail) in [("primary", true), ("backup", false)] {
            manifest.register(ProviderFactoryEntry {
                namespace: "builtin".to_string(),
                name: name.to_string(),
                kind: CapabilityKind::Asr,
                native_dependencies: Vec::new(),
                credential_keys: Vec::new(),
                supported_platforms: Vec::new(),
                factory: Arc::new(move |_opts| {
                    Ok(ProviderInstance::Asr(Arc::new(FlakyAsr {
                        name: name.to_string(),
                        fail,
                    })))
                }),
            });
        }
        let mut config = vox_config::ProvidersConfig::new();
        let mut inner = std::collections::BTreeMap::new();
        for name in ["primary", "backup"] {
            inner.insert(
                name.to_string(),
                vox_config::ProviderEntry {
                    enabled: true,
                    options: toml::Table::new(),
                },
            );
        }
        config.insert("asr".to_string(), inner);
        Arc::new(Registry::build(manifest, &config))
    }

    #[tokio::test]
    async fn falls_back_to_next_provider_on_fault() {
        let registry = build_registry();
        let coordinator = AsrCoordinator::new(registry, "primary", vec!["backup".to_string()]);
        let frame = AudioFrame::new(vec![0.0; 100], 16000, 1);
        let result = coordinator
            .transcribe(&frame, &TranscribeOptions::default(), None)
            .await
            .unwrap();
        assert_eq!(result, "ok from backup");
    }

    #[tokio::test]
    async fn explicit_provider_request_does_not_fall_back() {
        let registry = build_registry();
        let coordinator = AsrCoordinator::new(registry, "primary", vec!["backup".to_string()]);
        let frame = AudioFrame::new(vec![0.0; 100], 16000, 1);
        let result = coordinator
            .transcribe(&frame, &TranscribeOptions::default(), Some("primary"))
            .await;
        assert!(result.is_err());
    }
}
