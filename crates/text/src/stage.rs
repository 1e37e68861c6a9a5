use serde::{Deserialize, Serialize};

/// Processing stage a normalizer can apply to. Also the scope tag
/// used to reason about idempotence: applying a stage twice must be a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    AsrOutput,
    TtsInput,
    CommandInput,
    General,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::AsrOutput => "asr_output",
            Stage::TtsInput => "tts_input",
            Stage::CommandInput => "command_input",
            Stage::General => "general",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
