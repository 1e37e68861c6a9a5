//! Text-processing pipeline: a shared ordered chain of normalizers, each
//! declaring which stages it applies to, applied in configuration order.

pub mod advanced_locale;
pub mod normalizer;
pub mod number;
pub mod prepare;
pub mod processor;
pub mod stage;

pub use normalizer::Normalizer;
pub use processor::TextProcessor;
pub use stage::Stage;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum TextProcessingError {
    #[error("normalizer '{0}' is not known")]
    UnknownNormalizer(String),

    #[error("normalization failed in '{normalizer}': {message}")]
    NormalizationFailed { normalizer: String, message: String },
}

impl From<TextProcessingError> for vox_core::Error {
    fn from(err: TextProcessingError) -> Self {
        vox_core::Error::Internal {
            request_id: None,
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TextProcessingError>;
