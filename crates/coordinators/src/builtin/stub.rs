//! Always-available baseline providers. These back the default fallback
//! entry for each capability so a freshly configured assistant has
//! something to call even before a real ASR/TTS/LLM backend is wired up.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use vox_core::provider::{Capabilities, ParameterSchema, ProviderMetadata};
use vox_core::{
    AudioFrame, AudioOutput, Error, GenerationOptions, LanguageModel, Result, SpeechToText,
    TextToSpeech, TranscribeOptions, TranscriptFrame, Voice,
};

/// Transcribes nothing; returns an empty string. Useful as a harmless
/// default before a real speech-to-text backend is configured.
pub struct EchoStt;

impl ProviderMetadata for EchoStt {
    fn name(&self) -> &str {
        "echo"
    }
    fn parameter_schema(&self) -> ParameterSchema {
        Vec::new()
    }
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            languages: Vec::new(),
            formats: vec!["wav".to_string(), "pcm16".to_string()],
            streaming: false,
            realtime: false,
            concurrent: true,
        }
    }
}

#[async_trait]
impl SpeechToText for EchoStt {
    async fn transcribe(&self, _audio: &AudioFrame, _opts: &TranscribeOptions) -> Result<TranscriptFrame> {
        Ok(String::new())
    }

    fn transcribe_stream<'a>(
        &'a self,
        mut audio_stream: Pin<Box<dyn Stream<Item = AudioFrame> + Send + 'a>>,
        _opts: &'a TranscribeOptions,
    ) -> Pin<Box<dyn Stream<Item = Result<TranscriptFrame>> + Send + 'a>> {
        Box::pin(async_stream::stream! {
            while audio_stream.next().await.is_some() {}
            yield Ok(String::new());
        })
    }

    fn supported_languages(&self) -> Vec<String> {
        Vec::new()
    }

    fn model_name(&self) -> &str {
        "echo"
    }

    fn supports_language(&self, _language: &str) -> bool {
        true
    }
}

/// Synthesizes silence of roughly the length a real voice would take to
/// speak the text (a crude character-count estimate), so downstream audio
/// scheduling logic has a plausible duration to reason about.
pub struct SilenceTts;

impl ProviderMetadata for SilenceTts {
    fn name(&self) -> &str {
        "silence"
    }
    fn parameter_schema(&self) -> ParameterSchema {
        Vec::new()
    }
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            languages: Vec::new(),
            formats: vec!["pcm16".to_string()],
            streaming: false,
            realtime: false,
            concurrent: true,
        }
    }
}

#[async_trait]
impl TextToSpeech for SilenceTts {
    async fn synthesize(&self, text: &str, _voice: Option<&str>) -> Result<AudioFrame> {
        let sample_rate = 16000;
        let estimated_ms = (text.chars().count() as f64 * 60.0).max(200.0);
        let num_samples = ((sample_rate as f64) * estimated_ms / 1000.0) as usize;
        Ok(AudioFrame::silence(sample_rate, 1, num_samples))
    }

    fn synthesize_stream<'a>(
        &'a self,
        text: &'a str,
        voice: Option<&'a str>,
    ) -> Pin<Box<dyn Stream<Item = Result<AudioFrame>> + Send + 'a>> {
        Box::pin(async_stream::stream! {
            yield self.synthesize(text, voice).await;
        })
    }

    fn available_voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn model_name(&self) -> &str {
        "silence"
    }

    fn supports_language(&self, _language: &str) -> bool {
        true
    }
}

/// No-op audio sink: logs and succeeds without touching any device. Useful
/// in headless deployments (CI, server-only transcription pipelines).
pub struct NullAudioOutput;

impl ProviderMetadata for NullAudioOutput {
    fn name(&self) -> &str {
        "null"
    }
    fn parameter_schema(&self) -> ParameterSchema {
        Vec::new()
    }
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }
}

#[async_trait]
impl AudioOutput for NullAudioOutput {
    async fn play_file(&self, path: &str, _opts: &serde_json::Value) -> Result<()> {
        tracing::debug!(path, "null audio output: discarding play_file");
        Ok(())
    }

    async fn play_stream(
        &self,
        mut chunks: Pin<Box<dyn Stream<Item = AudioFrame> + Send + '_>>,
        _opts: &serde_json::Value,
    ) -> Result<()> {
        while chunks.next().await.is_some() {}
        Ok(())
    }

    async fn set_volume(&self, _volume: f32) -> Result<()> {
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }

    fn supported_formats(&self) -> Vec<String> {
        vec!["pcm16".to_string(), "wav".to_string()]
    }
}

/// A language model that always errors: used only so the `llm` capability
/// kind has a deterministic, dependency-free entry to exercise fallback
/// logic against in tests and in configurations with no real LLM wired up.
pub struct UnavailableLlm;

impl ProviderMetadata for UnavailableLlm {
    fn name(&self) -> &str {
        "unavailable"
    }
    fn parameter_schema(&self) -> ParameterSchema {
        Vec::new()
    }
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }
    fn is_available(&self) -> bool {
        false
    }
}

#[async_trait]
impl LanguageModel for UnavailableLlm {
    async fn enhance(&self, _text: &str, _task: &str, _opts: &GenerationOptions) -> Result<String> {
        Err(Error::ProviderUnavailable {
            kind: "llm".to_string(),
            name: "unavailable".to_string(),
            reason: "no language model configured".to_string(),
        })
    }

    async fn chat(&self, _messages: &[vox_core::ChatMessage], _opts: &GenerationOptions) -> Result<String> {
        Err(Error::ProviderUnavailable {
            kind: "llm".to_string(),
            name: "unavailable".to_string(),
            reason: "no language model configured".to_string(),
        })
    }

    fn available_models(&self) -> Vec<String> {
        Vec::new()
    }

    fn supported_tasks(&self) -> Vec<String> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echo_stt_returns_empty_transcript() {
        let stt = EchoStt;
        let frame = AudioFrame::new(vec![0.0; 10], 16000, 1);
        let text = stt.transcribe(&frame, &TranscribeOptions::default()).await.unwrap();
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn silence_tts_scales_with_text_length() {
        let tts = SilenceTts;
        let short = tts.synthesize("hi", None).await.unwrap();
        let long = tts.synthesize("a very much longer sentence than the short one", None).await.unwrap();
        assert!(long.duration_ms() > short.duration_ms());
    }

    #[tokio::test]
    async fn null_audio_output_accepts_any_playback() {
        let audio = NullAudioOutput;
        assert!(audio.play_file("unused.wav", &serde_json::Value::Null).await.is_ok());
        assert!(audio.set_volume(0.5).await.is_ok());
    }
}
