//! Embedded wake-word detector: ring buffer intake, an energy/ZCR VAD gate,
//! an MFCC feature frontend, INT8 ONNX inference, and the trigger/
//! streaming/cooldown state machine that turns a stream of confidences into
//! discrete detections.
//!
//! This crate is a self-contained leaf. It doesn't depend on
//! `vox-pipeline`, `vox-registry`, or `vox-coordinators`; audio-ingestion
//! code drives it directly. It also implements
//! `vox_core::traits::vad::VoiceActivityDetector`, so it can additionally
//! be registered into a provider registry when a deployment wants it
//! discoverable that way.

pub mod detector;
pub mod error;
pub mod mfcc;
pub mod ring_buffer;
pub mod vad;

pub use detector::{Detection, DetectorPhase, WakeWordDetector};
pub use error::{Result, WakeWordError};
pub use ring_buffer::RingBuffer;
pub use vad::VoiceGate;
