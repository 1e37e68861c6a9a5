//! ASR/TTS capability interfaces: `SpeechToText`/`TextToSpeech` traits,
//! streaming via `Pin<Box<dyn Stream<..>>>`, default `supports_language`.

use super::audio::AudioFrame;
use crate::error::Result;
use crate::provider::ProviderMetadata;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

pub type TranscriptFrame = String;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TranscribeOptions {
    pub language: Option<String>,
    pub enhance: bool,
    #[serde(default)]
    pub strict_streaming: bool,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Voice {
    pub id: String,
    pub language: String,
    pub is_neural: bool,
}

#[async_trait]
pub trait SpeechToText: ProviderMetadata {
    async fn transcribe(&self, audio: &AudioFrame, opts: &TranscribeOptions) -> Result<TranscriptFrame>;

    fn transcribe_stream<'a>(
        &'a self,
        audio_stream: Pin<Box<dyn Stream<Item = AudioFrame> + Send + 'a>>,
        opts: &'a TranscribeOptions,
    ) -> Pin<Box<dyn Stream<Item = Result<TranscriptFrame>> + Send + 'a>>;

    fn supported_languages(&self) -> Vec<String>;

    fn supported_formats(&self) -> Vec<String> {
        vec!["wav".to_string(), "pcm16".to_string()]
    }

    fn model_name(&self) -> &str;

    fn supports_language(&self, language: &str) -> bool {
        self.supported_languages()
            .iter()
            .any(|l| l.eq_ignore_ascii_case(language))
    }
}

#[async_trait]
pub trait TextToSpeech: ProviderMetadata {
    async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<AudioFrame>;

    fn synthesize_stream<'a>(
        &'a self,
        text: &'a str,
        voice: Option<&'a str>,
    ) -> Pin<Box<dyn Stream<Item = Result<AudioFrame>> + Send + 'a>>;

    fn available_voices(&self) -> Vec<Voice>;

    fn model_name(&self) -> &str;

    fn supports_language(&self, language: &str) -> bool {
        self.available_voices()
            .iter()
            .any(|v| v.language.eq_ignore_ascii_case(language))
    }

    fn default_voice(&self, language: &str) -> Option<Voice> {
        self.available_voices()
            .into_iter()
            .find(|v| v.language.eq_ignore_ascii_case(language))
    }
}
