//! Main settings tree: the typed configuration document loaded and validated
//! through `RuntimeEnvironment`, `Settings::validate`, and a `config::Config`
//! builder with File + Environment sources.

use crate::ConfigError;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Per-stage deadlines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTimeouts {
    #[serde(default = "default_asr_timeout_ms")]
    pub asr_ms: u64,
    #[serde(default = "default_llm_timeout_ms")]
    pub llm_ms: u64,
    #[serde(default = "default_tts_timeout_ms")]
    pub tts_ms: u64,
    #[serde(default = "default_handler_timeout_ms")]
    pub handler_ms: u64,
}

fn default_asr_timeout_ms() -> u64 {
    10_000
}
fn default_llm_timeout_ms() -> u64 {
    30_000
}
fn default_tts_timeout_ms() -> u64 {
    15_000
}
fn default_handler_timeout_ms() -> u64 {
    5_000
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            asr_ms: default_asr_timeout_ms(),
            llm_ms: default_llm_timeout_ms(),
            tts_ms: default_tts_timeout_ms(),
            handler_ms: default_handler_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub stage_timeouts: StageTimeouts,
    /// Bounded pre-wake-gate audio queue depth in frames.
    #[serde(default = "default_audio_prequeue_depth")]
    pub audio_prequeue_depth: usize,
}

fn default_audio_prequeue_depth() -> usize {
    100 // ~2s of 20ms frames
}

/// Top-level component toggles, orthogonal to per-provider `enabled` flags:
/// a component being off means its coordinator is never constructed at all,
/// matching end-to-end scenario 1 ("config enables intent_system only").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentsConfig {
    #[serde(default = "default_true")]
    pub intent_system: bool,
    #[serde(default)]
    pub wake_word: bool,
    #[serde(default = "default_true")]
    pub tts: bool,
    #[serde(default = "default_true")]
    pub audio_out: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ComponentsConfig {
    fn default() -> Self {
        Self {
            intent_system: true,
            wake_word: false,
            tts: true,
            audio_out: true,
        }
    }
}

/// `[providers.<kind>.<name>]` entry. `options` carries
/// provider-specific settings verbatim as a TOML table, deserialized by the
/// provider's own config type on instantiation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderEntry {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub options: toml::Table,
}

/// `kind -> name -> entry`. The config crate is the only authority on which
/// providers are instantiated: discovery alone never instantiates.
pub type ProvidersConfig = BTreeMap<String, BTreeMap<String, ProviderEntry>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    #[serde(default = "default_assets_root")]
    pub root: PathBuf,
}

fn default_assets_root() -> PathBuf {
    PathBuf::from("assets")
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: default_assets_root(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerEntry {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextProcessingConfig {
    /// Order is significant: normalizers apply in configuration order.
    #[serde(default = "default_normalizer_chain")]
    pub normalizers: Vec<NormalizerEntry>,
    /// Latin<->Cyrillic transliteration toggle consumed by `PrepareNormalizer`.
    #[serde(default)]
    pub transliterate: bool,
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_normalizer_chain() -> Vec<NormalizerEntry> {
    vec![
        NormalizerEntry {
            name: "number".to_string(),
            enabled: true,
        },
        NormalizerEntry {
            name: "prepare".to_string(),
            enabled: true,
        },
        NormalizerEntry {
            name: "advanced_locale".to_string(),
            enabled: true,
        },
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentsConfig {
    #[serde(default = "default_donations_root")]
    pub donations_root: PathBuf,
    #[serde(default)]
    pub strict_mode: bool,
    #[serde(default = "default_max_interactions")]
    pub max_session_interactions: usize,
    #[serde(default = "default_session_ttl_seconds")]
    pub session_ttl_seconds: u64,
    #[serde(default = "default_match_confidence_threshold")]
    pub match_confidence_threshold: f32,
}

fn default_donations_root() -> PathBuf {
    PathBuf::from("config/donations")
}
fn default_max_interactions() -> usize {
    20
}
fn default_session_ttl_seconds() -> u64 {
    900
}
fn default_match_confidence_threshold() -> f32 {
    0.55
}

impl Default for IntentsConfig {
    fn default() -> Self {
        Self {
            donations_root: default_donations_root(),
            strict_mode: false,
            max_session_interactions: default_max_interactions(),
            session_ttl_seconds: default_session_ttl_seconds(),
            match_confidence_threshold: default_match_confidence_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebApiConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default = "default_ws_queue_depth")]
    pub ws_audio_queue_depth: usize,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_ws_queue_depth() -> usize {
    256
}

impl Default for WebApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            cors: CorsConfig::default(),
            auth: AuthConfig::default(),
            ws_audio_queue_depth: default_ws_queue_depth(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WakeWordConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    #[serde(default = "default_trigger_duration_ms")]
    pub trigger_duration_ms: u64,
    #[serde(default = "default_inference_interval_ms")]
    pub inference_interval_ms: u64,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_ring_buffer_capacity")]
    pub ring_buffer_capacity_bytes: usize,
    #[serde(default = "default_vad_sensitivity")]
    pub vad_sensitivity: f32,
    #[serde(default = "default_vad_voice_decision_ms")]
    pub vad_voice_decision_ms: u64,
    #[serde(default = "default_vad_silence_decision_ms")]
    pub vad_silence_decision_ms: u64,
    #[serde(default = "default_tail_silence_ms")]
    pub tail_silence_ms: u64,
    #[serde(default = "default_max_utterance_ms")]
    pub max_utterance_ms: u64,
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("assets/models/wakeword.onnx")
}
fn default_threshold() -> f32 {
    0.6
}
fn default_trigger_duration_ms() -> u64 {
    200
}
fn default_inference_interval_ms() -> u64 {
    30
}
fn default_sample_rate() -> u32 {
    16_000
}
fn default_ring_buffer_capacity() -> usize {
    32_000 // 1s @ 16kHz mono int16
}
fn default_vad_sensitivity() -> f32 {
    1.0
}
fn default_vad_voice_decision_ms() -> u64 {
    60 // 3 frames @ 20ms
}
fn default_vad_silence_decision_ms() -> u64 {
    120 // 6 frames @ 20ms
}
fn default_tail_silence_ms() -> u64 {
    700
}
fn default_max_utterance_ms() -> u64 {
    8_000
}
fn default_cooldown_ms() -> u64 {
    500
}

impl Default for WakeWordConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model_path: default_model_path(),
            threshold: default_threshold(),
            trigger_duration_ms: default_trigger_duration_ms(),
            inference_interval_ms: default_inference_interval_ms(),
            sample_rate: default_sample_rate(),
            ring_buffer_capacity_bytes: default_ring_buffer_capacity(),
            vad_sensitivity: default_vad_sensitivity(),
            vad_voice_decision_ms: default_vad_voice_decision_ms(),
            vad_silence_decision_ms: default_vad_silence_decision_ms(),
            tail_silence_ms: default_tail_silence_ms(),
            max_utterance_ms: default_max_utterance_ms(),
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Root settings document. All sections have defaults so
/// an empty or partial TOML file still produces a usable `Settings`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,
    #[serde(default)]
    pub core: CoreConfig,
    #[serde(default)]
    pub components: ComponentsConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub text_processing: TextProcessingConfig,
    #[serde(default)]
    pub intents: IntentsConfig,
    #[serde(default)]
    pub webapi: WebApiConfig,
    #[serde(default)]
    pub wake_word: WakeWordConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the tree. Called once at startup and again after every
    /// hot-reload candidate before it is allowed to become the active
    /// snapshot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_stage_timeouts()?;
        self.validate_wake_word()?;
        self.validate_providers()?;
        Ok(())
    }

    fn validate_stage_timeouts(&self) -> Result<(), ConfigError> {
        let t = &self.core.stage_timeouts;
        for (field, value) in [
            ("core.stage_timeouts.asr_ms", t.asr_ms),
            ("core.stage_timeouts.llm_ms", t.llm_ms),
            ("core.stage_timeouts.tts_ms", t.tts_ms),
            ("core.stage_timeouts.handler_ms", t.handler_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
            if value > 120_000 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "exceeds maximum of 120000ms".to_string(),
                });
            }
        }
        Ok(())
    }

    fn validate_wake_word(&self) -> Result<(), ConfigError> {
        let w = &self.wake_word;
        if !(0.0..=1.0).contains(&w.threshold) {
            return Err(ConfigError::InvalidValue {
                field: "wake_word.threshold".to_string(),
                message: format!("must be between 0.0 and 1.0, got {}", w.threshold),
            });
        }
        if w.enabled && w.model_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("wake_word.model_path".to_string()));
        }
        if w.vad_voice_decision_ms == 0 || w.vad_silence_decision_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "wake_word.vad_voice_decision_ms".to_string(),
                message: "voice/silence decision windows must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    fn validate_providers(&self) -> Result<(), ConfigError> {
        for (kind, names) in &self.providers {
            for (name, entry) in names {
                if entry.enabled && name.trim().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: format!("providers.{kind}"),
                        message: "provider name must not be empty".to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Load settings from an optional TOML file overlaid with `PROJECT_<SECTION>__<KEY>`
/// environment variables.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(false));
    }
    builder = builder.add_source(Environment::with_prefix("PROJECT").separator("__"));
    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_cleanly() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut settings = Settings::default();
        settings.core.stage_timeouts.asr_ms = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn wake_word_threshold_out_of_range_is_rejected() {
        let mut settings = Settings::default();
        settings.wake_word.threshold = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn load_settings_from_missing_file_uses_defaults() {
        let settings = load_settings(Some(Path::new("/nonexistent/vox.toml"))).unwrap();
        assert_eq!(settings.webapi.port, 8080);
    }

    #[test]
    fn environment_strictness() {
        assert!(!RuntimeEnvironment::Development.is_strict());
        assert!(RuntimeEnvironment::Staging.is_strict());
        assert!(RuntimeEnvironment::Production.is_strict());
        assert!(RuntimeEnvironment::Production.is_production());
    }
}
