//! Provider descriptor and the per-interface metadata contract shared by
//! every capability kind. Descriptors are plain data consumed by the
//! registry without instantiating anything.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry per capability a coordinator exists for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    Asr,
    Tts,
    Audio,
    Llm,
    WakeWord,
}

impl CapabilityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityKind::Asr => "asr",
            CapabilityKind::Tts => "tts",
            CapabilityKind::Audio => "audio",
            CapabilityKind::Llm => "llm",
            CapabilityKind::WakeWord => "wake_word",
        }
    }
}

impl std::fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Embedded,
}

/// Description of one parameter a provider call accepts, for `get_parameter_schema`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: String,
    pub default: Option<serde_json::Value>,
    pub enum_values: Option<Vec<String>>,
    pub range: Option<(f64, f64)>,
    pub required: bool,
}

pub type ParameterSchema = Vec<ParameterSpec>;

/// Static capability map: languages, formats, streaming/realtime support.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capabilities {
    pub languages: Vec<String>,
    pub formats: Vec<String>,
    pub streaming: bool,
    pub realtime: bool,
    /// If false, the coordinator must serialize concurrent calls to this provider.
    pub concurrent: bool,
}

/// Class-level metadata every provider implementation exposes, consumed by
/// the registry without instantiating the provider.
pub trait ProviderMetadata: Send + Sync {
    /// Declared foreign-runtime dependencies probed for availability.
    ///
    /// Foreign-runtime dependency names, not tied to any particular host
    /// language, used only for capability-probing (`is_available`).
    fn native_dependencies(&self) -> &'static [&'static str] {
        &[]
    }

    fn platform_dependencies(&self, _platform: Platform) -> &'static [&'static str] {
        &[]
    }

    fn platform_support(&self) -> &'static [Platform] {
        &[Platform::Linux, Platform::MacOs, Platform::Windows]
    }

    fn default_credentials(&self) -> &'static [&'static str] {
        &[]
    }

    fn parameter_schema(&self) -> ParameterSchema {
        Vec::new()
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// Must be idempotent and complete in well under 100ms.
    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str;
}

/// Immutable record declared at discovery time. Never mutated after the
/// registry scan; dropped only on process exit.
#[derive(Clone)]
pub struct ProviderDescriptor<F> {
    pub namespace: String,
    pub name: String,
    pub kind: CapabilityKind,
    pub factory: F,
    pub native_dependencies: Vec<String>,
    pub platform_dependencies: BTreeMap<Platform, Vec<String>>,
    pub credential_keys: Vec<String>,
    pub supported_platforms: Vec<Platform>,
}

impl<F> std::fmt::Debug for ProviderDescriptor<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("supported_platforms", &self.supported_platforms)
            .finish()
    }
}
