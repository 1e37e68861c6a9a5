//! Per-capability coordinators: the layer between the registry (which only
//! knows how to instantiate and list providers) and callers (pipeline
//! stages, the HTTP/WS surface) that need one logical "the ASR provider"
//! handle with fallback, defaulting, and admin overrides baked in.

mod asr;
mod audio;
mod builtin;
mod llm;
mod state;
mod tts;

pub use asr::AsrCoordinator;
pub use audio::AudioCoordinator;
pub use builtin::register_builtin;
pub use llm::LlmCoordinator;
pub use state::{is_fallback_trigger, CoordinatorState, ProviderSummary};
pub use tts::TtsCoordinator;
