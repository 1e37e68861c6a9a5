//! Hierarchical configuration: a typed `Settings` tree loaded through the
//! `config` crate (TOML file + environment overlay), a `thiserror` error
//! enum bridging into `vox_core::Error`, and a `validate()` pass run once at
//! startup.

pub mod admin_write;
pub mod hot_reload;
pub mod settings;

pub use hot_reload::ConfigWatcher;
pub use settings::{
    AssetsConfig, ComponentsConfig, CoreConfig, IntentsConfig, LoggingConfig, ProviderEntry,
    ProvidersConfig, Settings, TextProcessingConfig, WakeWordConfig, WebApiConfig,
};

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for vox_core::Error {
    fn from(err: ConfigError) -> Self {
        vox_core::Error::ConfigInvalid(err.to_string())
    }
}
