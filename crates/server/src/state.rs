//! Shared application state: a config hot-reload handle, the provider
//! registry, one coordinator per capability, the donation store, and a
//! broadcast channel WebSocket clients subscribe to.

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use vox_config::ConfigWatcher;
use vox_coordinators::{AsrCoordinator, AudioCoordinator, LlmCoordinator, TtsCoordinator};
use vox_intents::DonationStore;
use vox_registry::Registry;

/// A message fanned out to every WebSocket client registered for
/// `session_id`, matching the "single WebSocket registry with
/// broadcast-to-interested-clients" requirement.
#[derive(Debug, Clone)]
pub struct WsBroadcast {
    pub session_id: String,
    pub payload: serde_json::Value,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConfigWatcher>,
    pub registry: Arc<Registry>,
    pub asr: Arc<AsrCoordinator>,
    pub tts: Arc<TtsCoordinator>,
    pub audio: Arc<AudioCoordinator>,
    pub llm: Arc<LlmCoordinator>,
    pub donations: Arc<DonationStore>,
    pub broadcast: tokio::sync::broadcast::Sender<WsBroadcast>,
    pub metrics: PrometheusHandle,
}

impl AppState {
    pub fn new(
        config: Arc<ConfigWatcher>,
        registry: Arc<Registry>,
        asr: Arc<AsrCoordinator>,
        tts: Arc<TtsCoordinator>,
        audio: Arc<AudioCoordinator>,
        llm: Arc<LlmCoordinator>,
        donations: Arc<DonationStore>,
        metrics: PrometheusHandle,
    ) -> Self {
        let (broadcast, _) = tokio::sync::broadcast::channel(256);
        Self {
            config,
            registry,
            asr,
            tts,
            audio,
            llm,
            donations,
            broadcast,
            metrics,
        }
    }
}
