//! Discovery surface: a manifest of kind -> name -> factory. Built-in
//! providers register themselves here at process start as a plain
//! compile-time table rather than through a reflection/plugin-metadata scan.

use crate::instance::ProviderInstance;
use std::sync::Arc;
use vox_core::error::Result;
use vox_core::provider::{CapabilityKind, Platform};

pub type ProviderFactory = Arc<dyn Fn(&toml::Table) -> Result<ProviderInstance> + Send + Sync>;

#[derive(Clone)]
pub struct ProviderFactoryEntry {
    pub namespace: String,
    pub name: String,
    pub kind: CapabilityKind,
    pub native_dependencies: Vec<String>,
    pub credential_keys: Vec<String>,
    pub supported_platforms: Vec<Platform>,
    pub factory: ProviderFactory,
}

#[derive(Default, Clone)]
pub struct Manifest {
    entries: Vec<ProviderFactoryEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entry: ProviderFactoryEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ProviderFactoryEntry] {
        &self.entries
    }

    pub fn entries_for(&self, kind: CapabilityKind) -> impl Iterator<Item = &ProviderFactoryEntry> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }

    pub fn find(&self, kind: CapabilityKind, name: &str) -> Option<&ProviderFactoryEntry> {
        self.entries
            .iter()
            .find(|e| e.kind == kind && e.name == name)
    }

    /// Missing environment-variable credentials make a provider unavailable
    /// without ever instantiating it.
    pub fn missing_credentials(&self, entry: &ProviderFactoryEntry) -> Vec<String> {
        entry
            .credential_keys
            .iter()
            .filter(|key| std::env::var(key).is_err())
            .cloned()
            .collect()
    }
}
