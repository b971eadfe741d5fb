use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

pub const API_URL_ENV: &str = "SWAPI_GRID_API_URL";
pub const TOKEN_ENV: &str = "SWAPI_GRID_TOKEN";

/// Where the remote CRUD service lives and how to talk to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default)]
    pub bearer_token: Option<String>,
    /// Stripped from the data key field name to get the resource path.
    #[serde(default = "default_key_suffix")]
    pub key_suffix: String,
    #[serde(default = "default_import_path")]
    pub import_path: String,
}

fn default_key_suffix() -> String {
    "_id".to_string()
}

fn default_import_path() -> String {
    "import/all".to_string()
}

impl ClientConfig {
    pub fn new(base_url: impl AsRef<str>) -> Self {
        ClientConfig {
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            bearer_token: None,
            key_suffix: default_key_suffix(),
            import_path: default_import_path(),
        }
    }

    pub fn with_token(mut self, token: impl AsRef<str>) -> Self {
        self.bearer_token = Some(token.as_ref().to_string());
        self
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigurationError> {
        let mut config: ClientConfig =
            toml::from_str(s).map_err(|e| ConfigurationError::InvalidConfig(e.to_string()))?;
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        if config.base_url.is_empty() {
            return Err(ConfigurationError::InvalidConfig("base_url is empty".into()));
        }
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).map_err(|e| {
            ConfigurationError::InvalidConfig(format!("{}: {e}", path.display()))
        })?;
        debug!("client config loaded from {}", path.display());
        Self::from_toml_str(&s)
    }

    /// `SWAPI_GRID_API_URL` is required, `SWAPI_GRID_TOKEN` optional.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let base_url = std::env::var(API_URL_ENV)
            .map_err(|_| ConfigurationError::InvalidConfig(format!("{API_URL_ENV} is not set")))?;
        let mut config = ClientConfig::new(base_url);
        config.bearer_token = std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty());
        Ok(config)
    }

    /// `starship_id` -> `starship`
    pub fn resource_for(&self, key_field: &str) -> String {
        key_field
            .strip_suffix(self.key_suffix.as_str())
            .unwrap_or(key_field)
            .to_string()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
