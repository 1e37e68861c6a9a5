//! Type-erased provider instance: one variant per capability kind, since
//! the five capability traits have genuinely different method signatures
//! and don't share a single object-safe supertrait.

use std::sync::Arc;
use vox_core::provider::{Capabilities, ParameterSchema};
use vox_core::{AudioOutput, LanguageModel, SpeechToText, TextToSpeech, VoiceActivityDetector};

#[derive(Clone)]
pub enum ProviderInstance {
    Asr(Arc<dyn SpeechToText>),
    Tts(Arc<dyn TextToSpeech>),
    Audio(Arc<dyn AudioOutput>),
    Llm(Arc<dyn LanguageModel>),
    WakeWord(Arc<dyn VoiceActivityDetector>),
}

impl ProviderInstance {
    pub fn name(&self) -> &str {
        match self {
            ProviderInstance::Asr(p) => p.name(),
            ProviderInstance::Tts(p) => p.name(),
            ProviderInstance::Audio(p) => p.name(),
            ProviderInstance::Llm(p) => p.name(),
            ProviderInstance::WakeWord(p) => p.name(),
        }
    }

    pub fn is_available(&self) -> bool {
        match self {
            ProviderInstance::Asr(p) => p.is_available(),
            ProviderInstance::Tts(p) => p.is_available(),
            ProviderInstance::Audio(p) => p.is_available(),
            ProviderInstance::Llm(p) => p.is_available(),
            ProviderInstance::WakeWord(p) => p.is_available(),
        }
    }

    pub fn parameter_schema(&self) -> ParameterSchema {
        match self {
            ProviderInstance::Asr(p) => p.parameter_schema(),
            ProviderInstance::Tts(p) => p.parameter_schema(),
            ProviderInstance::Audio(p) => p.parameter_schema(),
            ProviderInstance::Llm(p) => p.parameter_schema(),
            ProviderInstance::WakeWord(p) => p.parameter_schema(),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            ProviderInstance::Asr(p) => p.capabilities(),
            ProviderInstance::Tts(p) => p.capabilities(),
            ProviderInstance::Audio(p) => p.capabilities(),
            ProviderInstance::Llm(p) => p.capabilities(),
            ProviderInstance::WakeWord(p) => p.capabilities(),
        }
    }

    pub fn as_asr(&self) -> Option<Arc<dyn SpeechToText>> {
        match self {
            ProviderInstance::Asr(p) => Some(p.clone()),
            _ => None,
        }
    }

    pub fn as_tts(&self) -> Option<Arc<dyn TextToSpeech>> {
        match self {
            ProviderInstance::Tts(p) => Some(p.clone()),
            _ => None,
        }
    }

    pub fn as_audio(&self) -> Option<Arc<dyn AudioOutput>> {
        match self {
            ProviderInstance::Audio(p) => Some(p.clone()),
            _ => None,
        }
    }

    pub fn as_llm(&self) -> Option<Arc<dyn LanguageModel>> {
        match self {
            ProviderInstance::Llm(p) => Some(p.clone()),
            _ => None,
        }
    }

    pub fn as_wake_word(&self) -> Option<Arc<dyn VoiceActivityDetector>> {
        match self {
            ProviderInstance::WakeWord(p) => Some(p.clone()),
            _ => None,
        }
    }
}
