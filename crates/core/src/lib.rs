//! Shared types for the voice assistant core: error taxonomy, request/session
//! context, the capability interfaces each provider kind implements, and the
//! donation data model consumed by the intent layer.

pub mod cancellation;
pub mod donation;
pub mod error;
pub mod metrics;
pub mod provider;
pub mod request;
pub mod response;
pub mod traits;

pub use cancellation::CancellationToken;
pub use donation::{
    Donation, DonationExample, MethodDonation, SchemaVersion, SlotPattern, TokenMatcher,
};
pub use error::{Error, Result};
pub use provider::{CapabilityKind, ProviderDescriptor, ProviderMetadata};
pub use request::{InputSource, IntentResult, RequestContext, SessionContext};
pub use response::{Response, ResponseType};
pub use traits::{
    AudioFrame, AudioOutput, ChatMessage, GenerationOptions, LanguageModel, Role, SpeechToText,
    TextToSpeech, TranscribeOptions, TranscriptFrame, VadEvent, VadState, VoiceActivityDetector,
    Voice,
};
