//! Audio-out capability: the playback surface providers implement.

use crate::error::Result;
use crate::provider::ProviderMetadata;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// A chunk of PCM audio moving through the system. Mono by convention; the
/// wake-word subsystem additionally assumes 16kHz int16-equivalent framing
/// (see `vox-wakeword`), but this type is the general currency used by
/// ASR/TTS/Audio providers, which may carry other rates.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioFrame {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn silence(sample_rate: u32, channels: u16, num_samples: usize) -> Self {
        Self {
            samples: vec![0.0; num_samples],
            sample_rate,
            channels,
        }
    }

    pub fn duration_ms(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        let frames = self.samples.len() / self.channels as usize;
        (frames as f64 / self.sample_rate as f64) * 1000.0
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[async_trait]
pub trait AudioOutput: ProviderMetadata {
    async fn play_file(&self, path: &str, opts: &serde_json::Value) -> Result<()>;

    async fn play_stream(
        &self,
        chunks: Pin<Box<dyn Stream<Item = AudioFrame> + Send + '_>>,
        opts: &serde_json::Value,
    ) -> Result<()>;

    async fn set_volume(&self, volume: f32) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    fn supported_formats(&self) -> Vec<String>;
}
