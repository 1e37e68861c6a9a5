//! Embedded wake-word detector: ring buffer intake, VAD gating, MFCC
//! feature extraction, INT8 ONNX inference, and the trigger/streaming/
//! cooldown state machine described for this subsystem.
//!
//! The detector is a self-contained leaf: audio-ingestion code can drive it
//! directly through [`WakeWordDetector::ingest`] without going through the
//! provider registry. It additionally implements
//! [`vox_core::traits::vad::VoiceActivityDetector`] so a deployment that
//! wants it discoverable through the registry under
//! [`vox_core::provider::CapabilityKind::WakeWord`] can register it like any
//! other provider; both are the same detector, just two doors into it.

use crate::error::{Result, WakeWordError};
use crate::mfcc::{MfccFrontend, INPUT_BUFFER_SIZE, N_MFCC};
use crate::ring_buffer::RingBuffer;
use crate::vad::{Frame, VoiceGate};
use async_trait::async_trait;
use ort::{GraphOptimizationLevel, Session};
use parking_lot::Mutex;
use std::path::Path;
use std::time::{Duration, Instant};
use vox_config::settings::WakeWordConfig;
use vox_core::error::Result as CoreResult;
use vox_core::provider::{Capabilities, ProviderMetadata};
use vox_core::traits::audio::AudioFrame;
use vox_core::traits::vad::{VadEvent, VadState, VoiceActivityDetector};

/// Phase of the trigger/streaming/cooldown state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorPhase {
    IdleListening,
    Streaming,
    Cooldown,
}

/// One confirmed wake-word trigger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub confidence: f32,
    pub latency_ms: u64,
}

struct MutableState {
    phase: DetectorPhase,
    gate: VoiceGate,
    last_inference: Option<Instant>,
    trigger_run_started: Option<Instant>,
    last_probability: f32,
    streaming_since: Option<Instant>,
    silence_since: Option<Instant>,
    cooldown_until: Option<Instant>,
}

pub struct WakeWordDetector {
    config: WakeWordConfig,
    ring: RingBuffer,
    mfcc: MfccFrontend,
    session: Option<Session>,
    load_error: Option<String>,
    state: Mutex<MutableState>,
}

impl WakeWordDetector {
    /// Loads the configured ONNX model. A load failure does not return
    /// `Err`: the detector comes back disabled with the error recorded, per
    /// the rule that wake-word unavailability must never take down audio
    /// ingestion.
    pub fn load(config: WakeWordConfig) -> Self {
        let (session, load_error) = if config.enabled {
            match Self::build_session(&config.model_path) {
                Ok(session) => (Some(session), None),
                Err(err) => (None, Some(err.to_string())),
            }
        } else {
            (None, None)
        };

        let ring = RingBuffer::new(config.ring_buffer_capacity_bytes);
        let gate = VoiceGate::new(&config);
        Self {
            mfcc: MfccFrontend::new(),
            state: Mutex::new(MutableState {
                phase: DetectorPhase::IdleListening,
                gate,
                last_inference: None,
                trigger_run_started: None,
                last_probability: 0.0,
                streaming_since: None,
                silence_since: None,
                cooldown_until: None,
            }),
            ring,
            session,
            load_error,
            config,
        }
    }

    fn build_session(model_path: &Path) -> Result<Session> {
        Session::builder()
            .map_err(|e| WakeWordError::ModelLoad(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| WakeWordError::ModelLoad(e.to_string()))?
            .with_intra_threads(1)
            .map_err(|e| WakeWordError::ModelLoad(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| WakeWordError::ModelLoad(e.to_string()))
    }

    pub fn is_enabled(&self) -> bool {
        self.session.is_some()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn phase(&self) -> DetectorPhase {
        self.state.lock().phase
    }

    pub fn last_probability(&self) -> f32 {
        self.state.lock().last_probability
    }

    /// Pushes raw little-endian int16 PCM bytes into the intake buffer.
    /// Never blocks and never fails: buffer overflow just evicts the
    /// oldest bytes, since audio ingestion must never stall on the
    /// detector falling behind.
    pub fn push_audio(&self, pcm_bytes: &[u8]) {
        self.ring.write(pcm_bytes);
    }

    /// Drives the gate/MFCC/inference/state-machine pipeline over whatever
    /// is currently buffered. Returns `Some(Detection)` the instant a
    /// trigger fires; otherwise `None`. Safe to call on every audio
    /// callback tick; internally rate-limited by `inference_interval_ms`.
    pub fn poll(&self) -> Option<Detection> {
        let Some(session) = self.session.as_ref() else {
            return None;
        };

        let required_bytes = INPUT_BUFFER_SIZE * 2; // i16 samples
        if self.ring.available() < required_bytes {
            return None;
        }

        let mut raw = vec![0u8; required_bytes];
        if self.ring.peek_latest(&mut raw) < required_bytes {
            return None;
        }
        let pcm: Vec<i16> = raw
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();

        let frame_len = {
            let mut state = self.state.lock();
            state.gate.frame_len()
        };
        let voiced = {
            let samples_f32: Vec<f32> = pcm
                .iter()
                .map(|&s| s as f32 / i16::MAX as f32)
                .collect();
            let mut state = self.state.lock();
            samples_f32
                .chunks(frame_len)
                .map(|chunk| state.gate.process(&Frame { samples: chunk }))
                .last()
                .unwrap_or(false)
        };

        let now = Instant::now();
        let interval = Duration::from_millis(self.config.inference_interval_ms);

        {
            let mut state = self.state.lock();
            if let DetectorPhase::Cooldown = state.phase {
                if let Some(until) = state.cooldown_until {
                    if now < until {
                        return None;
                    }
                }
                state.phase = DetectorPhase::IdleListening;
                state.cooldown_until = None;
            }
        }

        if !voiced {
            return self.advance_streaming_silence(now);
        }

        let should_infer = {
            let state = self.state.lock();
            state
                .last_inference
                .map(|t| now.duration_since(t) >= interval)
                .unwrap_or(true)
        };
        if !should_infer {
            return self.advance_streaming_silence(now);
        }

        let started = Instant::now();
        let confidence = match self.infer(session, &pcm) {
            Ok(c) => c,
            Err(_) => {
                // Per-inference faults are counted/logged upstream and must
                // not halt the audio pipeline.
                return self.advance_streaming_silence(now);
            }
        };
        let latency_ms = started.elapsed().as_millis() as u64;

        let mut state = self.state.lock();
        state.last_inference = Some(now);
        state.last_probability = confidence;

        if confidence < self.config.threshold {
            state.trigger_run_started = None;
            drop(state);
            return self.advance_streaming_silence(now);
        }

        let trigger_started = *state.trigger_run_started.get_or_insert(now);
        let sustained = now.duration_since(trigger_started).as_millis() as u64;

        if state.phase == DetectorPhase::IdleListening
            && sustained >= self.config.trigger_duration_ms
        {
            state.phase = DetectorPhase::Streaming;
            state.streaming_since = Some(now);
            state.silence_since = None;
            state.trigger_run_started = None;
            return Some(Detection {
                confidence,
                latency_ms,
            });
        }

        drop(state);
        self.advance_streaming_silence(now)
    }

    fn advance_streaming_silence(&self, now: Instant) -> Option<Detection> {
        let mut state = self.state.lock();
        if state.phase != DetectorPhase::Streaming {
            return None;
        }

        let tail_silence = Duration::from_millis(self.config.tail_silence_ms);
        let max_utterance = Duration::from_millis(self.config.max_utterance_ms);

        let silence_elapsed = state
            .silence_since
            .map(|since| now.duration_since(since))
            .unwrap_or(Duration::ZERO);
        let streaming_elapsed = state
            .streaming_since
            .map(|since| now.duration_since(since))
            .unwrap_or(Duration::ZERO);

        if silence_elapsed >= tail_silence || streaming_elapsed >= max_utterance {
            state.phase = DetectorPhase::Cooldown;
            state.cooldown_until = Some(now + Duration::from_millis(self.config.cooldown_ms));
            state.streaming_since = None;
            state.silence_since = None;
        } else if state.silence_since.is_none() {
            state.silence_since = Some(now);
        }
        None
    }

    fn infer(&self, session: &Session, pcm: &[i16]) -> Result<f32> {
        use ndarray::Array3;

        let frames = self.mfcc.compute(pcm);
        let flattened: Vec<f32> = frames.iter().flat_map(|f| f.iter().copied()).collect();
        let n_frames = frames.len();

        let input = Array3::from_shape_vec((1, n_frames, N_MFCC), flattened)
            .map_err(|e| WakeWordError::FeatureExtraction(e.to_string()))?;

        let outputs = session
            .run(ort::inputs!["mfcc_input" => input.view()].map_err(|e| {
                WakeWordError::Inference(e.to_string())
            })?)
            .map_err(|e| WakeWordError::Inference(e.to_string()))?;

        let confidence: f32 = outputs
            .get("confidence")
            .ok_or_else(|| WakeWordError::Inference("missing confidence output".to_string()))?
            .try_extract_tensor::<f32>()
            .map_err(|e| WakeWordError::Inference(e.to_string()))?
            .view()
            .iter()
            .next()
            .copied()
            .unwrap_or(0.0);

        Ok(confidence.clamp(0.0, 1.0))
    }
}

impl ProviderMetadata for WakeWordDetector {
    fn name(&self) -> &str {
        "embedded-wakeword"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            streaming: true,
            realtime: true,
            ..Default::default()
        }
    }

    fn is_available(&self) -> bool {
        self.is_enabled()
    }
}

#[async_trait]
impl VoiceActivityDetector for WakeWordDetector {
    async fn detect(&self, frame: &AudioFrame) -> CoreResult<VadEvent> {
        let bytes: Vec<u8> = frame
            .samples
            .iter()
            .flat_map(|&s| {
                let clamped = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                clamped.to_le_bytes()
            })
            .collect();
        self.push_audio(&bytes);

        match self.poll() {
            Some(detection) => Ok(VadEvent::SpeechContinue {
                probability: detection.confidence,
            }),
            None if self.phase() == DetectorPhase::Streaming => Ok(VadEvent::SpeechContinue {
                probability: self.last_probability(),
            }),
            None => Ok(VadEvent::Silence),
        }
    }

    fn speech_probability(&self) -> f32 {
        self.last_probability()
    }

    fn reset(&self) {
        let mut state = self.state.lock();
        state.phase = DetectorPhase::IdleListening;
        state.gate.reset();
        state.last_inference = None;
        state.trigger_run_started = None;
        state.last_probability = 0.0;
        state.streaming_since = None;
        state.silence_since = None;
        state.cooldown_until = None;
    }

    fn current_state(&self) -> VadState {
        match self.phase() {
            DetectorPhase::IdleListening => VadState::Idle,
            DetectorPhase::Streaming => VadState::InSpeech,
            DetectorPhase::Cooldown => VadState::PendingSilence,
        }
    }

    fn model_info(&self) -> &str {
        self.load_error.as_deref().unwrap_or("embedded-int8-onnx")
    }

    fn is_neural(&self) -> bool {
        true
    }

    fn recommended_frame_size(&self) -> usize {
        INPUT_BUFFER_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disabled_config() -> WakeWordConfig {
        WakeWordConfig {
            enabled: false,
            ..Default::default()
        }
    }

    #[test]
    fn disabled_config_loads_without_a_session() {
        let detector = WakeWordDetector::load(disabled_config());
        assert!(!detector.is_enabled());
        assert!(detector.load_error().is_none());
    }

    #[test]
    fn poll_on_disabled_detector_never_panics_and_returns_none() {
        let detector = WakeWordDetector::load(disabled_config());
        detector.push_audio(&vec![0u8; INPUT_BUFFER_SIZE * 2]);
        assert_eq!(detector.poll(), None);
    }

    #[test]
    fn push_audio_never_blocks_past_ring_capacity() {
        let mut config = disabled_config();
        config.ring_buffer_capacity_bytes = 16;
        let detector = WakeWordDetector::load(config);
        detector.push_audio(&vec![1u8; 1024]);
        assert_eq!(detector.ring.available(), detector.ring.capacity());
    }

    #[test]
    fn enabled_with_missing_model_file_records_a_load_error() {
        let mut config = disabled_config();
        config.enabled = true;
        config.model_path = "/nonexistent/path/model.onnx".into();
        let detector = WakeWordDetector::load(config);
        assert!(!detector.is_enabled());
        assert!(detector.load_error().is_some());
    }

    #[test]
    fn starts_in_idle_listening() {
        let detector = WakeWordDetector::load(disabled_config());
        assert_eq!(detector.phase(), DetectorPhase::IdleListening);
    }

    #[test]
    fn reset_restores_idle_listening_and_zero_probability() {
        let detector = WakeWordDetector::load(disabled_config());
        detector.reset();
        assert_eq!(detector.current_state(), VadState::Idle);
        assert_eq!(detector.speech_probability(), 0.0);
    }
}
