use std::collections::HashMap;

use serde_json::Value;

use crate::error::{AdapterError, Result};

pub const DEFAULT_API_URL: &str = "https://api.dropboxapi.com";
pub const DEFAULT_CONTENT_URL: &str = "https://content.dropboxapi.com";
pub const DEFAULT_USER_AGENT: &str = "dropbox-fs-adapter/1.3";

/// Per-call options handed to write operations
///
/// The adapter passes these through untouched; only `mimetype` is read.
#[derive(Debug, Clone, Default)]
pub struct Config {
    settings: HashMap<String, Value>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy with `key` set to `value`
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        self.settings.contains_key(key)
    }
}

/// Connection settings for [`DropboxClient`](crate::DropboxClient)
#[derive(Debug, Clone)]
pub struct DropboxConfig {
    /// OAuth2 bearer token
    pub access_token: String,
    /// Base URL of the RPC endpoints
    pub api_url: String,
    /// Base URL of the upload/download endpoints
    pub content_url: String,
    pub user_agent: String,
}

impl DropboxConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            content_url: DEFAULT_CONTENT_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Build from `DROPBOX_ACCESS_TOKEN`, `DROPBOX_API_URL` and `DROPBOX_CONTENT_URL`
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("DROPBOX_ACCESS_TOKEN").unwrap_or_default();
        let mut config = Self::new(token);

        if let Ok(url) = std::env::var("DROPBOX_API_URL") {
            config.api_url = url;
        }
        if let Ok(url) = std::env::var("DROPBOX_CONTENT_URL") {
            config.content_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Point both endpoint families at one base URL (mock servers, proxies)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.api_url = url.clone();
        self.content_url = url;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.access_token.trim().is_empty() {
            return Err(AdapterError::InvalidConfig {
                message: "access token must not be empty".to_string(),
            });
        }
        for url in [&self.api_url, &self.content_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AdapterError::InvalidConfig {
                    message: format!("base URL must be http(s): {}", url),
                });
            }
        }
        Ok(())
    }
}
