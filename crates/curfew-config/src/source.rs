//! Configuration sources and document loading

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{ConfigResult, PolicyConfiguration, parse_document};

/// Timeout applied to remote configuration fetches
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Client tag sent with remote configuration fetches
pub const USER_AGENT: &str = concat!("curfew/", env!("CARGO_PKG_VERSION"));

/// Where a configuration document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Local file; `.toml` files are parsed as TOML, everything else as JSON
    File(PathBuf),
    /// HTTP(S) location serving a JSON document
    Url(String),
}

impl ConfigSource {
    /// Remote sources are polled periodically, local files are read once
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Url(_))
    }

    pub fn format(&self) -> DocumentFormat {
        match self {
            Self::File(path) => DocumentFormat::from_path(path),
            Self::Url(_) => DocumentFormat::Json,
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// Serialization format of a configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Toml,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

/// Loads configuration snapshots from a [`ConfigSource`]
pub trait ConfigLoader: Send {
    fn load(&self, source: &ConfigSource) -> ConfigResult<PolicyConfiguration>;
}

/// Reads local files and fetches remote documents over HTTP
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    timeout: Duration,
}

impl DocumentLoader {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Raw document bytes
    pub fn fetch(&self, source: &ConfigSource) -> ConfigResult<Vec<u8>> {
        match source {
            ConfigSource::File(path) => Ok(std::fs::read(path)?),
            ConfigSource::Url(url) => {
                // Built per fetch so the client's internal runtime lives on the calling thread
                let client = reqwest::blocking::Client::builder()
                    .timeout(self.timeout)
                    .connect_timeout(self.timeout)
                    .user_agent(USER_AGENT)
                    .build()?;

                let response = client.get(url).send()?.error_for_status()?;
                Ok(response.bytes()?.to_vec())
            }
        }
    }
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader for DocumentLoader {
    fn load(&self, source: &ConfigSource) -> ConfigResult<PolicyConfiguration> {
        let bytes = self.fetch(source)?;
        parse_document(&bytes, source.format())
    }
}
