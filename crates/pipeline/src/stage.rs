//! Named steps of the two canonical workflows. Distinct from
//! `vox_text::Stage` (a text-normalization scope), this enum identifies a
//! workflow step for timestamping (`RequestContext::mark_stage`) and for
//! tagging `PipelineEvent`s and errors.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Capture,
    WakeGate,
    Asr,
    NormalizeAsrOutput,
    Intent,
    Handler,
    NormalizeTtsInput,
    Tts,
    AudioOut,
    Ingest,
    NormalizeCommandInput,
    Render,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Capture => "capture",
            Stage::WakeGate => "wake_gate",
            Stage::Asr => "asr",
            Stage::NormalizeAsrOutput => "normalize_asr_output",
            Stage::Intent => "intent",
            Stage::Handler => "handler",
            Stage::NormalizeTtsInput => "normalize_tts_input",
            Stage::Tts => "tts",
            Stage::AudioOut => "audio_out",
            Stage::Ingest => "ingest",
            Stage::NormalizeCommandInput => "normalize_command_input",
            Stage::Render => "render",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The two canonical workflows. `vox-server` picks one based on how the
/// request arrived (captured/streamed audio vs. typed/sent text).
pub const VOICE_WORKFLOW: &[Stage] = &[
    Stage::Capture,
    Stage::WakeGate,
    Stage::Asr,
    Stage::NormalizeAsrOutput,
    Stage::Intent,
    Stage::Handler,
    Stage::NormalizeTtsInput,
    Stage::Tts,
    Stage::AudioOut,
];

pub const TEXT_WORKFLOW: &[Stage] = &[
    Stage::Ingest,
    Stage::NormalizeCommandInput,
    Stage::Intent,
    Stage::Handler,
    Stage::Render,
];
