//! Handler dispatch: turns an intent match (`handler` name, `method` name,
//! slots) into an invocation. Grounded on
//! `tools::registry::ToolRegistry::execute`'s name-keyed, per-call-timeout
//! dispatch, generalized from tool calls to the methods a donation's
//! `handler_domain` names.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use vox_core::request::SessionContext;
use vox_core::{Error, Response, Result};

/// One handler domain (the `handler_domain` a donation declares). A handler
/// owns its methods; the engine only ever calls `invoke` by name.
#[async_trait]
pub trait Handler: Send + Sync {
    fn name(&self) -> &str;

    async fn invoke(
        &self,
        method: &str,
        slots: &BTreeMap<String, String>,
        session: &mut SessionContext,
    ) -> Result<Response>;
}

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn Handler>) {
        self.handlers.insert(handler.name().to_string(), handler);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }

    /// Invokes the named handler's method under a hard deadline. A handler
    /// that doesn't exist is `ProviderNotFound`; one that blows past its
    /// deadline is `StageTimeout`, the same contract every other stage uses.
    pub async fn dispatch(
        &self,
        handler_name: &str,
        method: &str,
        slots: &BTreeMap<String, String>,
        session: &mut SessionContext,
        timeout: Duration,
    ) -> Result<Response> {
        let handler = self.get(handler_name).ok_or_else(|| Error::ProviderNotFound {
            kind: "handler".to_string(),
            name: handler_name.to_string(),
        })?;
        match tokio::time::timeout(timeout, handler.invoke(method, slots, session)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(Error::StageTimeout {
                stage: "handler".to_string(),
                elapsed_ms: timeout.as_millis() as u64,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    struct EchoHandler;

    #[async_trait]
    impl Handler for EchoHandler {
        fn name(&self) -> &str {
            "echo"
        }

        async fn invoke(
            &self,
            method: &str,
            slots: &BTreeMap<String, String>,
            _session: &mut SessionContext,
        ) -> Result<Response> {
            let value = slots.get("text").cloned().unwrap_or_default();
            Ok(Response::text(format!("{method}:{value}")))
        }
    }

    struct SlowHandler;

    #[async_trait]
    impl Handler for SlowHandler {
        fn name(&self) -> &str {
            "slow"
        }

        async fn invoke(
            &self,
            _method: &str,
            _slots: &BTreeMap<String, String>,
            _session: &mut SessionContext,
        ) -> Result<Response> {
            tokio::time::sleep(StdDuration::from_secs(10)).await;
            Ok(Response::text("too late"))
        }
    }

    fn session() -> SessionContext {
        SessionContext::new("s1", "en", 10)
    }

    #[tokio::test]
    async fn dispatches_to_registered_handler() {
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(EchoHandler));
        let mut slots = BTreeMap::new();
        slots.insert("text".to_string(), "hi".to_string());
        let mut sess = session();
        let response = registry
            .dispatch("echo", "say", &slots, &mut sess, StdDuration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(response.text, "say:hi");
    }

    #[tokio::test]
    async fn unknown_handler_is_provider_not_found() {
        let registry = HandlerRegistry::new();
        let mut sess = session();
        let err = registry
            .dispatch("missing", "say", &BTreeMap::new(), &mut sess, StdDuration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProviderNotFound { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn handler_exceeding_deadline_is_stage_timeout() {
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(SlowHandler));
        let mut sess = session();
        let err = registry
            .dispatch("slow", "go", &BTreeMap::new(), &mut sess, StdDuration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StageTimeout { stage, .. } if stage == "handler"));
    }
}
