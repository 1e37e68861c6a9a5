//! Exercises the HTTP surface end-to-end against real coordinators backed by
//! the workspace's built-in stub providers, a real `DonationStore`, and a
//! real `ConfigWatcher` reading a temp TOML file — wired the same way a
//! runner binary would wire them.

use std::io::Write;
use std::sync::Arc;
use tower::ServiceExt;
use vox_config::ConfigWatcher;
use vox_coordinators::{register_builtin, AsrCoordinator, AudioCoordinator, LlmCoordinator, TtsCoordinator};
use vox_intents::DonationStore;
use vox_registry::{Manifest, Registry};
use vox_server::{create_router, AppState};

fn build_state(config_path: &std::path::Path) -> AppState {
    let mut manifest = Manifest::new();
    register_builtin(&mut manifest);

    let mut providers = vox_config::ProvidersConfig::new();
    for (kind, name) in [("asr", "echo"), ("tts", "silence"), ("audio", "null"), ("llm", "unavailable")] {
        let mut inner = std::collections::BTreeMap::new();
        inner.insert(
            name.to_string(),
            vox_config::ProviderEntry {
                enabled: true,
                options: toml::Table::new(),
            },
        );
        providers.insert(kind.to_string(), inner);
    }

    let registry = Arc::new(Registry::build(manifest, &providers));
    let config = Arc::new(ConfigWatcher::new(config_path).unwrap());
    let donations = Arc::new(DonationStore::load(&std::env::temp_dir().join("vox-server-test-donations-missing"), false, 0.5).unwrap());
    // `build_recorder` (rather than `install_recorder`) avoids a global-recorder
    // conflict across the several tests in this file that each build their own state.
    let metrics = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder().handle();

    AppState::new(
        config,
        registry.clone(),
        Arc::new(AsrCoordinator::new(registry.clone(), "echo", Vec::new())),
        Arc::new(TtsCoordinator::new(registry.clone(), "silence", Vec::new())),
        Arc::new(AudioCoordinator::new(registry.clone(), "null", Vec::new())),
        Arc::new(LlmCoordinator::new(registry, "unavailable", Vec::new())),
        donations,
        metrics,
    )
}

fn write_temp_config() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[webapi]\nport = 8080\n").unwrap();
    file
}

#[tokio::test]
async fn health_reports_ok_when_every_coordinator_has_a_live_provider() {
    let config_file = write_temp_config();
    let state = build_state(config_file.path());
    let router = create_router(state);

    let response = router
        .oneshot(
            axum::http::Request::builder()
                .uri("/health")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);
}

#[tokio::test]
async fn asr_providers_lists_the_builtin_echo_provider() {
    let config_file = write_temp_config();
    let state = build_state(config_file.path());
    let router = create_router(state);

    let response = router
        .oneshot(
            axum::http::Request::builder()
                .uri("/asr/providers")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["data"][0]["name"], "echo");
}

#[tokio::test]
async fn speak_without_audio_playback_uses_the_null_audio_provider() {
    let config_file = write_temp_config();
    let state = build_state(config_file.path());
    let router = create_router(state);

    let response = router
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/tts/speak")
                .header("content-type", "application/json")
                .body(axum::body::Body::from(
                    serde_json::json!({ "text": "hello", "return_audio": false }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);
}

#[tokio::test]
async fn configure_provider_with_unknown_kind_renders_404_not_found() {
    let config_file = write_temp_config();
    let state = build_state(config_file.path());
    let router = create_router(state);

    let response = router
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/carrier-pigeon/configure")
                .header("content-type", "application/json")
                .body(axum::body::Body::from(
                    serde_json::json!({ "provider": "anything" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_donation_for_missing_handler_renders_404_not_found() {
    let config_file = write_temp_config();
    let state = build_state(config_file.path());
    let router = create_router(state);

    let response = router
        .oneshot(
            axum::http::Request::builder()
                .uri("/donations/lights/en")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
}
