//! Request and session context. A `RequestContext` is created on input,
//! moved stage-to-stage under single-owner discipline (never shared
//! read-write — see `vox-pipeline`), and destroyed after response fan-out.

use crate::cancellation::CancellationToken;
use crate::response::Response;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    Cli,
    Mic,
    Web,
    Ws,
}

/// Extracted intent + slot values, populated by the intent stage, consumed
/// by handler dispatch.
#[derive(Debug, Clone, Default)]
pub struct IntentResult {
    pub handler: Option<String>,
    pub method: Option<String>,
    pub confidence: f32,
    pub slots: BTreeMap<String, String>,
}

/// Per-request record. Not `Clone`: ownership moves
/// between pipeline stages, enforcing the single-writer-per-field rule at
/// the type level rather than by convention alone.
#[derive(Debug)]
pub struct RequestContext {
    pub request_id: String,
    pub source: InputSource,
    pub language: String,
    pub session_id: Option<String>,
    pub cancellation: CancellationToken,

    stage_timestamps: BTreeMap<String, Instant>,

    pub partial_text: Option<String>,
    pub final_text: Option<String>,
    pub intent: IntentResult,
    pub response: Option<Response>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl RequestContext {
    pub fn new(source: InputSource, language: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            source,
            language: language.into(),
            session_id: None,
            cancellation: CancellationToken::new(),
            stage_timestamps: BTreeMap::new(),
            partial_text: None,
            final_text: None,
            intent: IntentResult::default(),
            response: None,
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Stage entry hook: stamps the current instant under `stage` name. The
    /// pipeline engine calls this once per stage so latency can be derived
    /// between any two recorded stages without a dedicated timer per stage.
    pub fn mark_stage(&mut self, stage: &str) {
        self.stage_timestamps.insert(stage.to_string(), Instant::now());
    }

    pub fn stage_elapsed_ms(&self, from: &str, to: &str) -> Option<u64> {
        let start = self.stage_timestamps.get(from)?;
        let end = self.stage_timestamps.get(to)?;
        Some(end.saturating_duration_since(*start).as_millis() as u64)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// One turn retained in a session's bounded history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub request_id: String,
    pub text: String,
    pub response_text: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Bounded per-session state. Mutated only by the
/// handler dispatcher; evicted by TTL after inactivity (see `vox-pipeline`'s
/// session store).
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub locale: String,
    pub active_handler: Option<String>,
    pub handler_state: serde_json::Map<String, serde_json::Value>,
    last_interactions: VecDeque<Interaction>,
    max_interactions: usize,
    pub last_active: std::time::Instant,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, locale: impl Into<String>, max_interactions: usize) -> Self {
        Self {
            session_id: session_id.into(),
            locale: locale.into(),
            active_handler: None,
            handler_state: serde_json::Map::new(),
            last_interactions: VecDeque::with_capacity(max_interactions),
            max_interactions,
            last_active: std::time::Instant::now(),
        }
    }

    pub fn push_interaction(&mut self, interaction: Interaction) {
        if self.last_interactions.len() >= self.max_interactions {
            self.last_interactions.pop_front();
        }
        self.last_interactions.push_back(interaction);
        self.last_active = std::time::Instant::now();
    }

    pub fn history(&self) -> impl Iterator<Item = &Interaction> {
        self.last_interactions.iter()
    }

    pub fn is_stale(&self, ttl: std::time::Duration) -> bool {
        self.last_active.elapsed() > ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_history_is_bounded() {
        let mut session = SessionContext::new("s1", "en", 2);
        for i in 0..5 {
            session.push_interaction(Interaction {
                request_id: format!("r{i}"),
                text: format!("turn {i}"),
                response_text: None,
                timestamp: chrono::Utc::now(),
            });
        }
        assert_eq!(session.history().count(), 2);
        let texts: Vec<_> = session.history().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["turn 3", "turn 4"]);
    }

    #[test]
    fn stage_elapsed_requires_both_marks() {
        let mut ctx = RequestContext::new(InputSource::Web, "en");
        assert!(ctx.stage_elapsed_ms("asr", "tts").is_none());
        ctx.mark_stage("asr");
        ctx.mark_stage("tts");
        assert!(ctx.stage_elapsed_ms("asr", "tts").is_some());
    }
}
