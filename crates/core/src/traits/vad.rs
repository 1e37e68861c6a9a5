//! Voice-activity-detection capability. This is the upstream energy/ZCR
//! gate, distinct from and feeding into the neural wake-word detector
//! implemented in `vox-wakeword`.

use super::audio::AudioFrame;
use crate::error::Result;
use crate::provider::ProviderMetadata;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VadEvent {
    SpeechStart,
    SpeechContinue { probability: f32 },
    SpeechEnd,
    Silence,
}

impl VadEvent {
    pub fn is_speech(&self) -> bool {
        matches!(self, VadEvent::SpeechStart | VadEvent::SpeechContinue { .. })
    }

    pub fn probability(&self) -> f32 {
        match self {
            VadEvent::SpeechStart => 1.0,
            VadEvent::SpeechContinue { probability } => *probability,
            VadEvent::SpeechEnd | VadEvent::Silence => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VadState {
    #[default]
    Idle,
    PendingSpeech,
    InSpeech,
    PendingSilence,
}

#[async_trait]
pub trait VoiceActivityDetector: ProviderMetadata {
    async fn detect(&self, frame: &AudioFrame) -> Result<VadEvent>;

    fn speech_probability(&self) -> f32;

    fn reset(&self);

    fn current_state(&self) -> VadState;

    fn model_info(&self) -> &str;

    fn is_neural(&self) -> bool {
        true
    }

    /// Provider's preferred analysis frame size in samples, default 30ms @ 16kHz.
    fn recommended_frame_size(&self) -> usize {
        480
    }
}
