//! Error taxonomy shared by every crate in the workspace.
//!
//! Every crate-local error type (`ConfigError`, `DonationError`, ...) bridges
//! into this one via `From` so coordinator, pipeline, and server code only
//! ever has to reason about a single error surface.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// One variant per distinct failure kind recognized across the workspace.
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("configuration invalid: {0}")]
    ConfigInvalid(String),

    #[error("provider not found: {kind}/{name}")]
    ProviderNotFound { kind: String, name: String },

    #[error("provider unavailable: {kind}/{name}: {reason}")]
    ProviderUnavailable {
        kind: String,
        name: String,
        reason: String,
    },

    #[error("provider faulted: {kind}/{name}: {cause}")]
    ProviderFaulted {
        kind: String,
        name: String,
        cause: String,
    },

    #[error("stage '{stage}' timed out after {elapsed_ms}ms")]
    StageTimeout { stage: String, elapsed_ms: u64 },

    #[error("cancelled")]
    Cancelled,

    #[error("intent unresolved")]
    IntentUnresolved,

    #[error("donation invalid: {0}")]
    DonationInvalid(String),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("dependency missing: {0}")]
    DependencyMissing(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("internal error (request_id={request_id:?}): {message}")]
    Internal {
        request_id: Option<String>,
        message: String,
    },
}

impl Error {
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            request_id: None,
            message: message.into(),
        }
    }

    pub fn internal_for(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Internal {
            request_id: Some(request_id.into()),
            message: message.into(),
        }
    }

    /// Stable machine-readable code for the HTTP envelope (see `vox-server`).
    pub fn code(&self) -> &'static str {
        match self {
            Error::ConfigInvalid(_) => "config_invalid",
            Error::ProviderNotFound { .. } => "provider_not_found",
            Error::ProviderUnavailable { .. } => "provider_unavailable",
            Error::ProviderFaulted { .. } => "provider_faulted",
            Error::StageTimeout { .. } => "stage_timeout",
            Error::Cancelled => "cancelled",
            Error::IntentUnresolved => "intent_unresolved",
            Error::DonationInvalid(_) => "donation_invalid",
            Error::SchemaMismatch(_) => "schema_mismatch",
            Error::ResourceExhausted(_) => "resource_exhausted",
            Error::DependencyMissing(_) => "dependency_missing",
            Error::Io(_) => "io_error",
            Error::Internal { .. } => "internal",
        }
    }

    /// HTTP status this error kind should render as.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::ConfigInvalid(_) | Error::DonationInvalid(_) | Error::SchemaMismatch(_) => 400,
            Error::ProviderNotFound { .. } => 404,
            Error::IntentUnresolved => 200, // never a transport error
            Error::Cancelled => 499,
            Error::StageTimeout { .. } => 504,
            Error::ProviderUnavailable { .. } | Error::DependencyMissing(_) => 503,
            Error::ProviderFaulted { .. } => 502,
            Error::ResourceExhausted(_) => 429,
            Error::Io(_) | Error::Internal { .. } => 500,
        }
    }

    /// `Internal` is the only kind that should page/alert.
    pub fn should_alert(&self) -> bool {
        matches!(self, Error::Internal { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}
