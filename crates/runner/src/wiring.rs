//! Assembles every crate into one running set of shared handles: registry,
//! the four coordinators, the donation store, the text processor, and the
//! pipeline engine. `build()` is the single place that decides how
//! `providers.<kind>.*` config turns into a coordinator's `default_name` /
//! `fallback_order`, since no config section names a default explicitly —
//! the first enabled provider (BTreeMap order, so deterministic) becomes
//! the default, the rest become fallbacks.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use vox_config::{ProvidersConfig, Settings};
use vox_coordinators::{register_builtin, AsrCoordinator, AudioCoordinator, LlmCoordinator, TtsCoordinator};
use vox_intents::DonationStore;
use vox_pipeline::{HandlerRegistry, PipelineEngine, SessionStore};
use vox_registry::{Manifest, Registry};
use vox_text::TextProcessor;

pub struct Wiring {
    pub registry: Arc<Registry>,
    pub asr: Arc<AsrCoordinator>,
    pub tts: Arc<TtsCoordinator>,
    pub audio: Arc<AudioCoordinator>,
    pub llm: Arc<LlmCoordinator>,
    pub donations: Arc<DonationStore>,
    pub engine: PipelineEngine,
}

pub fn build(settings: &Settings) -> anyhow::Result<Wiring> {
    let mut manifest = Manifest::new();
    register_builtin(&mut manifest);

    let registry = Arc::new(Registry::build(manifest, &settings.providers));

    let (asr_default, asr_fallback) = default_and_fallback(&settings.providers, "asr", "echo");
    let (tts_default, tts_fallback) = default_and_fallback(&settings.providers, "tts", "silence");
    let (audio_default, audio_fallback) = default_and_fallback(&settings.providers, "audio", "null");
    let (llm_default, llm_fallback) = default_and_fallback(&settings.providers, "llm", "unavailable");

    let asr = Arc::new(AsrCoordinator::new(registry.clone(), asr_default.clone(), asr_fallback.clone()));
    let tts = Arc::new(TtsCoordinator::new(registry.clone(), tts_default.clone(), tts_fallback.clone()));
    let audio = Arc::new(AudioCoordinator::new(registry.clone(), audio_default.clone(), audio_fallback.clone()));
    let llm = Arc::new(LlmCoordinator::new(registry.clone(), llm_default, llm_fallback));

    let donations = Arc::new(DonationStore::load(
        &settings.intents.donations_root,
        settings.intents.strict_mode,
        settings.intents.match_confidence_threshold,
    )?);

    let text = Arc::new(TextProcessor::from_config(&settings.text_processing)?);
    let handlers = Arc::new(HandlerRegistry::new());
    let sessions = Arc::new(SessionStore::new(
        Duration::from_secs(settings.intents.session_ttl_seconds),
        settings.intents.max_session_interactions,
    ));

    // The engine owns its own coordinator instances (`PipelineEngine::new` takes
    // them by value, not `Arc`), built from the same registry and default/fallback
    // choice as the HTTP-facing ones above. A provider-default change made through
    // the admin API updates the HTTP-facing coordinator only; picking up the same
    // change on the voice/CLI path requires a process restart today.
    let engine = PipelineEngine::new(
        AsrCoordinator::new(registry.clone(), asr_default, asr_fallback),
        TtsCoordinator::new(registry.clone(), tts_default, tts_fallback),
        AudioCoordinator::new(registry.clone(), audio_default, audio_fallback),
        text,
        donations.clone(),
        handlers,
        sessions,
        settings.core.stage_timeouts.clone(),
        settings.components.clone(),
    );

    Ok(Wiring {
        registry,
        asr,
        tts,
        audio,
        llm,
        donations,
        engine,
    })
}

fn default_and_fallback(providers: &ProvidersConfig, kind: &str, builtin_stub: &str) -> (String, Vec<String>) {
    let enabled: Vec<String> = providers
        .get(kind)
        .map(|entries: &BTreeMap<String, vox_config::ProviderEntry>| {
            entries.iter().filter(|(_, entry)| entry.enabled).map(|(name, _)| name.clone()).collect()
        })
        .unwrap_or_default();
    match enabled.split_first() {
        Some((default, rest)) => (default.clone(), rest.to_vec()),
        None => (builtin_stub.to_string(), Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_the_builtin_stub_when_nothing_is_configured() {
        let providers = ProvidersConfig::new();
        let (default, fallback) = default_and_fallback(&providers, "asr", "echo");
        assert_eq!(default, "echo");
        assert!(fallback.is_empty());
    }

    #[test]
    fn picks_the_first_enabled_provider_in_sorted_order() {
        let mut providers = ProvidersConfig::new();
        let mut inner = BTreeMap::new();
        inner.insert("zeta".to_string(), vox_config::ProviderEntry { enabled: true, options: toml::Table::new() });
        inner.insert("alpha".to_string(), vox_config::ProviderEntry { enabled: true, options: toml::Table::new() });
        providers.insert("tts".to_string(), inner);
        let (default, fallback) = default_and_fallback(&providers, "tts", "silence");
        assert_eq!(default, "alpha");
        assert_eq!(fallback, vec!["zeta".to_string()]);
    }

    #[test]
    fn disabled_providers_are_excluded_from_both_default_and_fallback() {
        let mut providers = ProvidersConfig::new();
        let mut inner = BTreeMap::new();
        inner.insert("off".to_string(), vox_config::ProviderEntry { enabled: false, options: toml::Table::new() });
        providers.insert("llm".to_string(), inner);
        let (default, fallback) = default_and_fallback(&providers, "llm", "unavailable");
        assert_eq!(default, "unavailable");
        assert!(fallback.is_empty());
    }
}
