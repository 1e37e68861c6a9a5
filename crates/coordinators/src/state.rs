//! Shared state behind every capability coordinator: a handle on the
//! registry, plus the mutable default/fallback ordering an admin can
//! rewrite at runtime without restarting the process.

use parking_lot::RwLock;
use std::sync::Arc;
use vox_core::provider::{Capabilities, CapabilityKind, ParameterSchema};
use vox_core::{Error, Result};
use vox_registry::{ProviderInstance, Registry};

#[derive(Debug, Clone)]
pub struct ProviderSummary {
    pub name: String,
    pub available: bool,
    pub capabilities: Capabilities,
    pub parameter_schema: ParameterSchema,
}

pub struct CoordinatorState {
    kind: CapabilityKind,
    registry: Arc<Registry>,
    default_name: RwLock<String>,
    fallback_order: RwLock<Vec<String>>,
}

impl CoordinatorState {
    pub fn new(
        kind: CapabilityKind,
        registry: Arc<Registry>,
        default_name: impl Into<String>,
        fallback_order: Vec<String>,
    ) -> Self {
        Self {
            kind,
            registry,
            default_name: RwLock::new(default_name.into()),
            fallback_order: RwLock::new(fallback_order),
        }
    }

    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }

    pub fn list_providers(&self) -> Vec<ProviderSummary> {
        let snapshot = self.registry.snapshot();
        snapshot
            .iter(self.kind)
            .map(|(name, instance)| ProviderSummary {
                name: name.clone(),
                available: instance.is_available(),
                capabilities: instance.capabilities(),
                parameter_schema: instance.parameter_schema(),
            })
            .collect()
    }

    /// Rejects names that aren't currently instantiated for this kind: an
    /// admin can't point the default at a provider that doesn't exist.
    pub fn set_default(&self, name: &str) -> Result<()> {
        let snapshot = self.registry.snapshot();
        if snapshot.get(self.kind, name).is_none() {
            return Err(Error::ProviderNotFound {
                kind: self.kind.to_string(),
                name: name.to_string(),
            });
        }
        *self.default_name.write() = name.to_string();
        Ok(())
    }

    pub fn default_name(&self) -> String {
        self.default_name.read().clone()
    }

    pub fn set_fallback_order(&self, order: Vec<String>) {
        *self.fallback_order.write() = order;
    }

    /// Ordered list of instances to try. An explicit `requested` provider is
    /// tried alone (the caller made an informed choice; silently redirecting
    /// it elsewhere would violate that choice). Otherwise the default is
    /// tried first, then the configured fallback order, skipping duplicates
    /// and names that no longer resolve to a live instance.
    pub fn candidates(&self, requested: Option<&str>) -> Vec<Arc<ProviderInstance>> {
        let snapshot = self.registry.snapshot();
        if let Some(name) = requested {
            return snapshot.get(self.kind, name).into_iter().collect();
        }
        let mut seen = std::collections::BTreeSet::new();
        let mut order = vec![self.default_name()];
        order.extend(self.fallback_order.read().iter().cloned());
        order
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .filter_map(|name| snapshot.get(self.kind, &name))
            .collect()
    }
}

/// True when `err` represents a transient, per-provider failure that the
/// fallback loop should recover from by trying the next candidate. Any
/// other error (cancellation, timeout, bad input) propagates immediately.
pub fn is_fallback_trigger(err: &Error) -> bool {
    matches!(err, Error::ProviderFaulted { .. } | Error::ProviderUnavailable { .. })
}
