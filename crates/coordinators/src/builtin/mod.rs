//! Built-in provider registration: wires the providers this workspace ships
//! with directly into a `Manifest`, the same surface a loadable plugin would
//! register through.

mod ollama;
mod stub;

pub use ollama::{OllamaConfig, OllamaLlm};
pub use stub::{EchoStt, NullAudioOutput, SilenceTts, UnavailableLlm};

use std::sync::Arc;
use vox_core::provider::CapabilityKind;
use vox_registry::{Manifest, ProviderFactoryEntry, ProviderInstance};

/// Registers every built-in provider (the Ollama LLM backend plus the
/// always-available ASR/TTS/Audio/LLM stubs) into `manifest`.
pub fn register_builtin(manifest: &mut Manifest) {
    manifest.register(ProviderFactoryEntry {
        namespace: "builtin".to_string(),
        name: "echo".to_string(),
        kind: CapabilityKind::Asr,
        native_dependencies: Vec::new(),
        credential_keys: Vec::new(),
        supported_platforms: Vec::new(),
        factory: Arc::new(|_opts| Ok(ProviderInstance::Asr(Arc::new(EchoStt)))),
    });

    manifest.register(ProviderFactoryEntry {
        namespace: "builtin".to_string(),
        name: "silence".to_string(),
        kind: CapabilityKind::Tts,
        native_dependencies: Vec::new(),
        credential_keys: Vec::new(),
        supported_platforms: Vec::new(),
        factory: Arc::new(|_opts| Ok(ProviderInstance::Tts(Arc::new(SilenceTts)))),
    });

    manifest.register(ProviderFactoryEntry {
        namespace: "builtin".to_string(),
        name: "null".to_string(),
        kind: CapabilityKind::Audio,
        native_dependencies: Vec::new(),
        credential_keys: Vec::new(),
        supported_platforms: Vec::new(),
        factory: Arc::new(|_opts| Ok(ProviderInstance::Audio(Arc::new(NullAudioOutput)))),
    });

    manifest.register(ProviderFactoryEntry {
        namespace: "builtin".to_string(),
        name: "unavailable".to_string(),
        kind: CapabilityKind::Llm,
        native_dependencies: Vec::new(),
        credential_keys: Vec::new(),
        supported_platforms: Vec::new(),
        factory: Arc::new(|_opts| Ok(ProviderInstance::Llm(Arc::new(UnavailableLlm)))),
    });

    manifest.register(ProviderFactoryEntry {
        namespace: "builtin".to_string(),
        name: "ollama".to_string(),
        kind: CapabilityKind::Llm,
        native_dependencies: Vec::new(),
        credential_keys: Vec::new(),
        supported_platforms: Vec::new(),
        factory: Arc::new(|opts| {
            let config = OllamaConfig::from_options(opts);
            Ok(ProviderInstance::Llm(Arc::new(OllamaLlm::new(config)?)))
        }),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_one_entry_per_builtin_provider() {
        let mut manifest = Manifest::new();
        register_builtin(&mut manifest);
        assert_eq!(manifest.entries_for(CapabilityKind::Asr).count(), 1);
        assert_eq!(manifest.entries_for(CapabilityKind::Tts).count(), 1);
        assert_eq!(manifest.entries_for(CapabilityKind::Audio).count(), 1);
        assert_eq!(manifest.entries_for(CapabilityKind::Llm).count(), 2);
    }
}
