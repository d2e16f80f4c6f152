//! Configuration parsing, validation and loading for curfew
//!
//! A configuration document (JSON, or TOML for `.toml` files) carries:
//! - A master `enabled` switch
//! - Weekly `unrestricted_times` windows
//! - Ordered restriction `rules`, first match wins
//!
//! Documents are validated as a whole; a document with any invalid span or
//! pattern is rejected so the caller can keep its last good snapshot.

mod policy;
mod schema;
mod source;
mod validation;

pub use policy::*;
pub use schema::*;
pub use source::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to fetch config: {0}")]
    FetchError(#[from] reqwest::Error),

    #[error("Config is not valid UTF-8: {0}")]
    EncodingError(#[from] std::str::Utf8Error),

    #[error("Failed to parse JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.errors))]
    ValidationFailed { errors: Vec<ValidationError> },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Load and validate configuration from a local file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<PolicyConfiguration> {
    let path = path.as_ref();
    let content = std::fs::read(path)?;
    parse_document(&content, DocumentFormat::from_path(path))
}

/// Parse and validate configuration from a JSON string
pub fn parse_config(content: &str) -> ConfigResult<PolicyConfiguration> {
    let raw: RawConfig = serde_json::from_str(content)?;
    validate(raw)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config_toml(content: &str) -> ConfigResult<PolicyConfiguration> {
    let raw: RawConfig = toml::from_str(content)?;
    validate(raw)
}

/// Parse and validate a raw document in the given format
pub fn parse_document(bytes: &[u8], format: DocumentFormat) -> ConfigResult<PolicyConfiguration> {
    match format {
        DocumentFormat::Json => {
            let raw: RawConfig = serde_json::from_slice(bytes)?;
            validate(raw)
        }
        DocumentFormat::Toml => parse_config_toml(std::str::from_utf8(bytes)?),
    }
}

fn validate(raw: RawConfig) -> ConfigResult<PolicyConfiguration> {
    let config = PolicyConfiguration::from_raw(raw)
        .map_err(|errors| ConfigError::ValidationFailed { errors })?;

    for skipped in &config.skipped_rules {
        tracing::debug!(rule = skipped.index, reason = %skipped.reason, "Rule skipped");
    }

    Ok(config)
}
