//! Registry algorithm: for each kind, keep the intersection of
//! descriptor names and `config.providers.<kind>.<name>.enabled == true`,
//! instantiate, probe `is_available()`, and skip (never abort startup) on
//! failure. Hot-reload computes an (add, remove, keep) diff and applies it
//! under a write lock, copy-on-write.

use crate::instance::ProviderInstance;
use crate::manifest::Manifest;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use vox_config::ProvidersConfig;
use vox_core::error::Result;
use vox_core::provider::CapabilityKind;
use vox_core::Error;

pub type KindInstances = BTreeMap<String, Arc<ProviderInstance>>;

#[derive(Default, Clone)]
pub struct RegistrySnapshot {
    instances: BTreeMap<CapabilityKind, KindInstances>,
}

impl RegistrySnapshot {
    pub fn get(&self, kind: CapabilityKind, name: &str) -> Option<Arc<ProviderInstance>> {
        self.instances.get(&kind).and_then(|m| m.get(name)).cloned()
    }

    pub fn names(&self, kind: CapabilityKind) -> Vec<String> {
        self.instances
            .get(&kind)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn iter(&self, kind: CapabilityKind) -> impl Iterator<Item = (&String, &Arc<ProviderInstance>)> {
        self.instances.get(&kind).into_iter().flat_map(|m| m.iter())
    }
}

pub struct Registry {
    manifest: Manifest,
    snapshot: RwLock<Arc<RegistrySnapshot>>,
}

impl Registry {
    /// Scans the manifest, instantiating every provider whose kind/name pair
    /// is both declared and `enabled = true` in config. A single provider's
    /// construction failure (or a failed `is_available()`) is logged and
    /// the provider is omitted; startup never aborts because of it.
    pub fn build(manifest: Manifest, providers_config: &ProvidersConfig) -> Self {
        let snapshot = instantiate(&manifest, providers_config);
        Self {
            manifest,
            snapshot: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.snapshot.read().clone()
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Diff-and-swap reload: providers newly enabled are added, providers no
    /// longer enabled are dropped, and unaffected providers are kept as-is
    /// (not re-instantiated) rather than rebuilding everything from scratch.
    pub fn reload(&self, providers_config: &ProvidersConfig) {
        let old = self.snapshot();
        let mut new_instances: BTreeMap<CapabilityKind, KindInstances> = BTreeMap::new();

        for entry in self.manifest.entries() {
            let enabled = providers_config
                .get(entry.kind.as_str())
                .and_then(|m| m.get(&entry.name))
                .map(|e| e.enabled)
                .unwrap_or(false);
            if !enabled {
                continue;
            }
            let kept = old.get(entry.kind, &entry.name);
            let instance = match kept {
                Some(existing) => {
                    tracing::debug!(kind = %entry.kind, name = %entry.name, "keeping provider across reload");
                    Some(existing)
                }
                None => {
                    let options = providers_config
                        .get(entry.kind.as_str())
                        .and_then(|m| m.get(&entry.name))
                        .map(|e| e.options.clone())
                        .unwrap_or_default();
                    match instantiate_one(entry, &options) {
                        Some(instance) => {
                            tracing::info!(kind = %entry.kind, name = %entry.name, "added provider on reload");
                            Some(Arc::new(instance))
                        }
                        None => None,
                    }
                }
            };
            if let Some(instance) = instance {
                new_instances
                    .entry(entry.kind)
                    .or_default()
                    .insert(entry.name.clone(), instance);
            }
        }

        for kind in [
            CapabilityKind::Asr,
            CapabilityKind::Tts,
            CapabilityKind::Audio,
            CapabilityKind::Llm,
            CapabilityKind::WakeWord,
        ] {
            let old_names: BTreeSet<String> = old.names(kind).into_iter().collect();
            let new_names: BTreeSet<String> = new_instances
                .get(&kind)
                .map(|m| m.keys().cloned().collect())
                .unwrap_or_default();
            for removed in old_names.difference(&new_names) {
                tracing::info!(kind = %kind, name = %removed, "removed provider on reload");
            }
        }

        let new_snapshot = RegistrySnapshot {
            instances: new_instances,
        };
        *self.snapshot.write() = Arc::new(new_snapshot);
    }

    pub fn get(&self, kind: CapabilityKind, name: &str) -> Result<Arc<ProviderInstance>> {
        self.snapshot()
            .get(kind, name)
            .ok_or_else(|| Error::ProviderNotFound {
                kind: kind.to_string(),
                name: name.to_string(),
            })
    }
}

fn instantiate(manifest: &Manifest, providers_config: &ProvidersConfig) -> RegistrySnapshot {
    let mut instances: BTreeMap<CapabilityKind, KindInstances> = BTreeMap::new();
    for entry in manifest.entries() {
        let enabled = providers_config
            .get(entry.kind.as_str())
            .and_then(|m| m.get(&entry.name))
            .map(|e| e.enabled)
            .unwrap_or(false);
        if !enabled {
            continue;
        }
        let options = providers_config
            .get(entry.kind.as_str())
            .and_then(|m| m.get(&entry.name))
            .map(|e| e.options.clone())
            .unwrap_or_default();
        if let Some(instance) = instantiate_one(entry, &options) {
            instances
                .entry(entry.kind)
                .or_default()
                .insert(entry.name.clone(), Arc::new(instance));
        }
    }
    RegistrySnapshot { instances }
}

fn instantiate_one(
    entry: &crate::manifest::ProviderFactoryEntry,
    options: &toml::Table,
) -> Option<ProviderInstance> {
    let missing: Vec<String> = entry
        .credential_keys
        .iter()
        .filter(|key| std::env::var(key).is_err())
        .cloned()
        .collect();
    if !missing.is_empty() {
        tracing::warn!(
            kind = %entry.kind,
            name = %entry.name,
            missing = ?missing,
            "provider unavailable: missing credential environment variables"
        );
        return None;
    }

    match (entry.factory)(options) {
        Ok(instance) => {
            if !instance.is_available() {
                tracing::warn!(kind = %entry.kind, name = %entry.name, "provider reported unavailable, omitting");
                return None;
            }
            Some(instance)
        }
        Err(err) => {
            tracing::warn!(kind = %entry.kind, name = %entry.name, error = %err, "provider construction failed, omitting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ProviderFactoryEntry;
    use async_trait::async_trait;
    use vox_core::provider::{Capabilities, ParameterSchema, ProviderMetadata};
    use vox_core::traits::{
        ChatMessage, GenerationOptions, LanguageModel,
    };
    use vox_core::error::Result as CoreResult;

    struct StubLlm {
        name: String,
    }

    impl ProviderMetadata for StubLlm {
        fn name(&self) -> &str {
            &self.name
        }
        fn parameter_schema(&self) -> ParameterSchema {
            Vec::new()
        }
        fn capabilities(&self) -> Capabilities {
            Capabilities::default()
        }
    }

    #[async_trait]
    impl LanguageModel for StubLlm {
        async fn enhance(&self, text: &str, _task: &str, _opts: &GenerationOptions) -> CoreResult<String> {
            Ok(text.to_string())
        }
        async fn chat(&self, _messages: &[ChatMessage], _opts: &GenerationOptions) -> CoreResult<String> {
            Ok("stub".to_string())
        }
        fn available_models(&self) -> Vec<String> {
            vec!["stub-1".to_string()]
        }
        fn supported_tasks(&self) -> Vec<String> {
            vec!["chat".to_string()]
        }
    }

    fn stub_manifest() -> Manifest {
        let mut manifest = Manifest::new();
        manifest.register(ProviderFactoryEntry {
            namespace: "builtin".to_string(),
            name: "stub".to_string(),
            kind: CapabilityKind::Llm,
            native_dependencies: Vec::new(),
            credential_keys: Vec::new(),
            supported_platforms: Vec::new(),
            factory: Arc::new(|_opts| {
                Ok(ProviderInstance::Llm(Arc::new(StubLlm {
                    name: "stub".to_string(),
                })))
            }),
        });
        manifest
    }

    fn enabled_config(name: &str) -> ProvidersConfig {
        let mut config = ProvidersConfig::new();
        let mut inner = BTreeMap::new();
        inner.insert(
            name.to_string(),
            vox_config::ProviderEntry {
                enabled: true,
                options: toml::Table::new(),
            },
        );
        config.insert("llm".to_string(), inner);
        config
    }

    #[test]
    fn disabled_provider_is_not_instantiated() {
        let manifest = stub_manifest();
        let registry = Registry::build(manifest, &ProvidersConfig::new());
        assert!(registry.get(CapabilityKind::Llm, "stub").is_err());
    }

    #[test]
    fn enabled_provider_is_instantiated_and_available() {
        let manifest = stub_manifest();
        let config = enabled_config("stub");
        let registry = Registry::build(manifest, &config);
        let instance = registry.get(CapabilityKind::Llm, "stub").unwrap();
        assert_eq!(instance.name(), "stub");
    }

    #[test]
    fn reload_removes_disabled_and_adds_newly_enabled() {
        let manifest = stub_manifest();
        let config = enabled_config("stub");
        let registry = Registry::build(manifest, &config);
        assert!(registry.get(CapabilityKind::Llm, "stub").is_ok());

        registry.reload(&ProvidersConfig::new());
        assert!(registry.get(CapabilityKind::Llm, "stub").is_err());

        registry.reload(&config);
        assert!(registry.get(CapabilityKind::Llm, "stub").is_ok());
    }
}
