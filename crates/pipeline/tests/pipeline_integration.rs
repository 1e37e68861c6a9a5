//! End-to-end tests for the workflow engine: voice and text requests driven
//! through real coordinators, a real donation-backed matcher, and real
//! handler dispatch, wired the same way a runner binary would wire them.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use vox_config::settings::{ComponentsConfig, StageTimeouts};
use vox_config::{ProviderEntry, ProvidersConfig, TextProcessingConfig};
use vox_core::donation::{Donation, MethodDonation, Quantifier, SchemaVersion, TokenMatcher, TokenPatternElement};
use vox_core::provider::{Capabilities, CapabilityKind, ParameterSchema, ProviderMetadata};
use vox_core::request::{InputSource, SessionContext};
use vox_core::traits::TranscribeOptions;
use vox_core::{AudioFrame, Error, Response, Result};
use vox_coordinators::{AsrCoordinator, AudioCoordinator, TtsCoordinator};
use vox_intents::DonationStore;
use vox_pipeline::{Handler, HandlerRegistry, PipelineEngine, PipelineEvent, SessionStore, Stage};
use vox_registry::{Manifest, ProviderFactoryEntry, ProviderInstance, Registry};
use vox_text::TextProcessor;

struct EchoAsr;
impl ProviderMetadata for EchoAsr {
    fn name(&self) -> &str {
        "echo-asr"
    }
    fn parameter_schema(&self) -> ParameterSchema {
        Vec::new()
    }
    fn capabilities(&self) -> Capabilities {
        Capabilities { languages: vec!["en".to_string()], ..Default::default() }
    }
}
#[async_trait]
impl vox_core::SpeechToText for EchoAsr {
    async fn transcribe(&self, _audio: &AudioFrame, _opts: &TranscribeOptions) -> Result<String> {
        Ok("turn on the light".to_string())
    }
    fn transcribe_stream<'a>(
        &'a self,
        _audio_stream: std::pin::Pin<Box<dyn futures::Stream<Item = AudioFrame> + Send + 'a>>,
        _opts: &'a TranscribeOptions,
    ) -> std::pin::Pin<Box<dyn futures::Stream<Item = Result<String>> + Send + 'a>> {
        Box::pin(futures::stream::empty())
    }
    fn supported_languages(&self) -> Vec<String> {
        vec!["en".to_string()]
    }
    fn model_name(&self) -> &str {
        "echo"
    }
}

struct SlowAsr;
impl ProviderMetadata for SlowAsr {
    fn name(&self) -> &str {
        "slow-asr"
    }
    fn parameter_schema(&self) -> ParameterSchema {
        Vec::new()
    }
    fn capabilities(&self) -> Capabilities {
        Capabilities { languages: vec!["en".to_string()], ..Default::default() }
    }
}
#[async_trait]
impl vox_core::SpeechToText for SlowAsr {
    async fn transcribe(&self, _audio: &AudioFrame, _opts: &TranscribeOptions) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok("unreachable".to_string())
    }
    fn transcribe_stream<'a>(
        &'a self,
        _audio_stream: std::pin::Pin<Box<dyn futures::Stream<Item = AudioFrame> + Send + 'a>>,
        _opts: &'a TranscribeOptions,
    ) -> std::pin::Pin<Box<dyn futures::Stream<Item = Result<String>> + Send + 'a>> {
        Box::pin(futures::stream::empty())
    }
    fn supported_languages(&self) -> Vec<String> {
        vec!["en".to_string()]
    }
    fn model_name(&self) -> &str {
        "slow"
    }
}

struct SilentTts;
impl ProviderMetadata for SilentTts {
    fn name(&self) -> &str {
        "silent-tts"
    }
    fn parameter_schema(&self) -> ParameterSchema {
        Vec::new()
    }
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }
}
#[async_trait]
impl vox_core::TextToSpeech for SilentTts {
    async fn synthesize(&self, _text: &str, _voice: Option<&str>) -> Result<AudioFrame> {
        Ok(AudioFrame::silence(16000, 1, 100))
    }
    fn synthesize_stream<'a>(
        &'a self,
        _text: &'a str,
        _voice: Option<&'a str>,
    ) -> std::pin::Pin<Box<dyn futures::Stream<Item = Result<AudioFrame>> + Send + 'a>> {
        Box::pin(futures::stream::empty())
    }
    fn available_voices(&self) -> Vec<vox_core::traits::Voice> {
        Vec::new()
    }
    fn model_name(&self) -> &str {
        "silent"
    }
}

struct NoopAudio;
impl ProviderMetadata for NoopAudio {
    fn name(&self) -> &str {
        "noop-audio"
    }
    fn parameter_schema(&self) -> ParameterSchema {
        Vec::new()
    }
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }
}
#[async_trait]
impl vox_core::AudioOutput for NoopAudio {
    async fn play_file(&self, _path: &str, _opts: &serde_json::Value) -> Result<()> {
        Ok(())
    }
    async fn play_stream(
        &self,
        _chunks: std::pin::Pin<Box<dyn futures::Stream<Item = AudioFrame> + Send + '_>>,
        _opts: &serde_json::Value,
    ) -> Result<()> {
        Ok(())
    }
    async fn set_volume(&self, _volume: f32) -> Result<()> {
        Ok(())
    }
    async fn stop(&self) -> Result<()> {
        Ok(())
    }
    fn supported_formats(&self) -> Vec<String> {
        vec!["pcm16".to_string()]
    }
}

struct LightsHandler {
    sessions_seen: Arc<std::sync::Mutex<Vec<String>>>,
}
#[async_trait]
impl Handler for LightsHandler {
    fn name(&self) -> &str {
        "lights"
    }
    async fn invoke(
        &self,
        method: &str,
        _slots: &BTreeMap<String, String>,
        session: &mut SessionContext,
    ) -> Result<Response> {
        self.sessions_seen.lock().unwrap().push(session.session_id.clone());
        Ok(Response::text(format!("ok:{method}")))
    }
}

struct SlowHandler;
#[async_trait]
impl Handler for SlowHandler {
    fn name(&self) -> &str {
        "lights"
    }
    async fn invoke(
        &self,
        _method: &str,
        _slots: &BTreeMap<String, String>,
        _session: &mut SessionContext,
    ) -> Result<Response> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Response::text("unreachable"))
    }
}

fn registry_with(kind: CapabilityKind, name: &str, instance: ProviderInstance) -> Arc<Registry> {
    let mut manifest = Manifest::new();
    manifest.register(ProviderFactoryEntry {
        namespace: "builtin".to_string(),
        name: name.to_string(),
        kind,
        native_dependencies: Vec::new(),
        credential_keys: Vec::new(),
        supported_platforms: Vec::new(),
        factory: Arc::new(move |_opts| Ok(instance.clone())),
    });
    let mut config = ProvidersConfig::new();
    let mut inner = BTreeMap::new();
    inner.insert(name.to_string(), ProviderEntry { enabled: true, options: toml::Table::new() });
    config.insert(kind.as_str().to_string(), inner);
    Arc::new(Registry::build(manifest, &config))
}

fn lights_donation() -> Donation {
    Donation {
        handler_domain: "lights".to_string(),
        description: String::new(),
        schema_version: SchemaVersion::CURRENT,
        donation_version: 1,
        language: "en".to_string(),
        method_donations: vec![MethodDonation {
            method_name: "turn_on".to_string(),
            intent_suffix: "turn_on".to_string(),
            description: String::new(),
            global_params: vec![],
            lemmas: vec!["turn".to_string(), "on".to_string(), "light".to_string()],
            token_patterns: vec![vec![
                TokenPatternElement { matcher: TokenMatcher::Lemma { lemma: "turn".to_string() }, op: Quantifier::One },
                TokenPatternElement { matcher: TokenMatcher::Lemma { lemma: "on".to_string() }, op: Quantifier::One },
            ]],
            slot_patterns: vec![],
            examples: vec![],
        }],
    }
}

fn donation_store() -> Arc<DonationStore> {
    let dir = tempfile::tempdir().unwrap();
    let handler_dir = dir.path().join("lights");
    std::fs::create_dir_all(&handler_dir).unwrap();
    std::fs::write(handler_dir.join("en.toml"), toml::to_string(&lights_donation()).unwrap()).unwrap();
    // DonationStore::load keeps the snapshot in memory; the temp dir can be
    // dropped once loading is done.
    Arc::new(DonationStore::load(dir.path(), false, 0.1).unwrap())
}

struct Harness {
    engine: PipelineEngine,
    sessions_seen: Arc<std::sync::Mutex<Vec<String>>>,
}

fn build_harness(asr_slow: bool, components: ComponentsConfig, handler_slow: bool) -> Harness {
    let sessions_seen = Arc::new(std::sync::Mutex::new(Vec::new()));

    let asr_registry = if asr_slow {
        registry_with(CapabilityKind::Asr, "slow", ProviderInstance::Asr(Arc::new(SlowAsr)))
    } else {
        registry_with(CapabilityKind::Asr, "echo", ProviderInstance::Asr(Arc::new(EchoAsr)))
    };
    let asr_name = if asr_slow { "slow" } else { "echo" };
    let tts_registry = registry_with(CapabilityKind::Tts, "silent", ProviderInstance::Tts(Arc::new(SilentTts)));
    let audio_registry = registry_with(CapabilityKind::Audio, "noop", ProviderInstance::Audio(Arc::new(NoopAudio)));

    let asr = AsrCoordinator::new(asr_registry, asr_name, Vec::new());
    let tts = TtsCoordinator::new(tts_registry, "silent", Vec::new());
    let audio = AudioCoordinator::new(audio_registry, "noop", Vec::new());
    let text = Arc::new(TextProcessor::from_config(&TextProcessingConfig::default()).unwrap());
    let donations = donation_store();

    let mut handlers = HandlerRegistry::new();
    if handler_slow {
        handlers.register(Arc::new(SlowHandler));
    } else {
        handlers.register(Arc::new(LightsHandler { sessions_seen: sessions_seen.clone() }));
    }

    let sessions = Arc::new(SessionStore::new(Duration::from_secs(900), 20));

    let engine = PipelineEngine::new(
        asr,
        tts,
        audio,
        text,
        donations,
        Arc::new(handlers),
        sessions,
        StageTimeouts::default(),
        components,
    );
    Harness { engine, sessions_seen }
}

#[tokio::test]
async fn voice_and_text_workflows_reach_the_same_handler() {
    let harness = build_harness(false, ComponentsConfig::default(), false);

    let audio = AudioFrame::new(vec![0.0; 1600], 16000, 1);
    let voice_response = harness
        .engine
        .run_voice(InputSource::Mic, "en", Some("voice-session".to_string()), audio)
        .await
        .unwrap();
    assert_eq!(voice_response.text, "ok:turn_on");

    let text_response = harness
        .engine
        .run_text(InputSource::Web, "en", Some("text-session".to_string()), "please turn on the light")
        .await
        .unwrap();
    assert_eq!(text_response.text, "ok:turn_on");
}

#[tokio::test]
async fn stage_events_are_emitted_in_workflow_order() {
    let harness = build_harness(false, ComponentsConfig::default(), false);
    let mut events = harness.engine.subscribe();

    harness
        .engine
        .run_text(InputSource::Cli, "en", Some("s1".to_string()), "turn on the light")
        .await
        .unwrap();

    let mut stages = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let PipelineEvent::StageCompleted { stage, .. } = event {
            stages.push(stage);
        }
    }
    assert_eq!(stages, vec![Stage::Ingest, Stage::NormalizeCommandInput, Stage::Intent, Stage::Handler]);
}

#[tokio::test]
async fn disabling_intent_system_short_circuits_every_utterance() {
    let components = ComponentsConfig { intent_system: false, ..ComponentsConfig::default() };
    let harness = build_harness(false, components, false);

    let response = harness
        .engine
        .run_text(InputSource::Web, "en", Some("s1".to_string()), "turn on the light")
        .await
        .unwrap();
    assert_eq!(response.text, Response::not_understood().text);
}

#[tokio::test(start_paused = true)]
async fn slow_asr_provider_surfaces_a_stage_timeout() {
    let harness = build_harness(true, ComponentsConfig::default(), false);
    let audio = AudioFrame::new(vec![0.0; 1600], 16000, 1);

    let err = harness
        .engine
        .run_voice(InputSource::Mic, "en", Some("s1".to_string()), audio)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::StageTimeout { stage, .. } if stage == "asr"));
}

#[tokio::test(start_paused = true)]
async fn slow_handler_surfaces_a_stage_timeout() {
    let harness = build_harness(false, ComponentsConfig::default(), true);

    let err = harness
        .engine
        .run_text(InputSource::Web, "en", Some("s1".to_string()), "turn on the light")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::StageTimeout { stage, .. } if stage == "handler"));
}

#[tokio::test]
async fn concurrent_sessions_are_dispatched_independently() {
    let harness = build_harness(false, ComponentsConfig::default(), false);
    let engine = Arc::new(harness.engine);
    let calls = AtomicUsize::new(0);

    let mut join_set = Vec::new();
    for i in 0..8 {
        let engine = engine.clone();
        let session_id = format!("session-{i}");
        join_set.push(tokio::spawn(async move {
            engine
                .run_text(InputSource::Web, "en", Some(session_id), "turn on the light")
                .await
                .unwrap()
        }));
    }
    for handle in join_set {
        let response = handle.await.unwrap();
        assert_eq!(response.text, "ok:turn_on");
        calls.fetch_add(1, Ordering::Relaxed);
    }
    assert_eq!(calls.load(Ordering::Relaxed), 8);

    let seen = harness.sessions_seen.lock().unwrap();
    let mut distinct: Vec<_> = seen.clone();
    distinct.sort();
    distinct.dedup();
    assert_eq!(distinct.len(), 8);
}
