//! Capability interfaces. Each provider kind is a trait here; a
//! coordinator in `vox-coordinators` holds `name -> Box<dyn Trait>` and never
//! exposes concrete provider identity past its own boundary.

mod audio;
mod llm;
mod speech;
mod vad;

pub use audio::{AudioFrame, AudioOutput};
pub use llm::{ChatMessage, GenerationOptions, LanguageModel, Role};
pub use speech::{SpeechToText, TextToSpeech, TranscribeOptions, TranscriptFrame, Voice};
pub use vad::{VadEvent, VadState, VoiceActivityDetector};
