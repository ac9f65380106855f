//! Client configuration, passed in by the host page at construction time.

use std::str::FromStr;

use log::Level;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::highlight::HighlightConfig;
use crate::layout::LayoutConfig;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:4000";
pub const DEFAULT_ORG_NAME: &str = "test-org";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid backend url '{url}': {message}")]
    BackendUrl { url: String, message: String },

    #[error("organization name must not be empty")]
    EmptyOrgName,

    #[error("unknown log level '{0}'")]
    LogLevel(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Where the permission backend listens.
    pub backend_url: String,
    /// Organization loaded on start.
    pub org_name: String,
    pub layout: LayoutConfig,
    pub highlight: HighlightConfig,
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            org_name: DEFAULT_ORG_NAME.to_string(),
            layout: LayoutConfig::default(),
            highlight: HighlightConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    /// Parse and validate a JSON config. Blank input yields the defaults.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let cfg: Self = if input.trim().is_empty() {
            Self::default()
        } else {
            serde_json::from_str(input)?
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.org_name.trim().is_empty() {
            return Err(ConfigError::EmptyOrgName);
        }
        self.backend_base()?;
        self.level()?;
        Ok(())
    }

    /// Backend URL with a trailing `/` on its path, ready for endpoint joins.
    pub fn backend_base(&self) -> Result<Url, ConfigError> {
        let invalid = |message: String| ConfigError::BackendUrl {
            url: self.backend_url.clone(),
            message,
        };

        let mut url = Url::parse(&self.backend_url).map_err(|e| invalid(e.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(invalid("not a base url".to_string()));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    pub fn level(&self) -> Result<Level, ConfigError> {
        Level::from_str(&self.log_level).map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }
}
