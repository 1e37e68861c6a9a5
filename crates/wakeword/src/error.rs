//! Crate-local error enum bridging into the shared [`vox_core::Error`]
//! surface, matching the `thiserror`-plus-`From` bridge every other crate in
//! the workspace uses.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum WakeWordError {
    #[error("model load failed: {0}")]
    ModelLoad(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("feature extraction failed: {0}")]
    FeatureExtraction(String),
}

impl From<WakeWordError> for vox_core::Error {
    fn from(err: WakeWordError) -> Self {
        match err {
            WakeWordError::ModelLoad(msg) => vox_core::Error::ProviderUnavailable {
                kind: "wake_word".to_string(),
                name: "embedded".to_string(),
                reason: msg,
            },
            WakeWordError::Inference(msg) => vox_core::Error::ProviderFaulted {
                kind: "wake_word".to_string(),
                name: "embedded".to_string(),
                cause: msg,
            },
            WakeWordError::FeatureExtraction(msg) => vox_core::Error::internal(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, WakeWordError>;
