//! Configuration loading from environment variables.

use anyhow::{bail, Result};

/// Backend used when `QUADERNO_API_URL` is not set
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";

/// Notebook used when `QUADERNO_NOTEBOOK` is not set
pub const DEFAULT_NOTEBOOK: &str = "notebook-1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the dashboard backend, without trailing slash
    pub api_url: String,
    pub notebook_id: String,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Reads `QUADERNO_API_URL` and `QUADERNO_NOTEBOOK`, either from the
    /// environment or from a `.env` file.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = lookup("QUADERNO_API_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            bail!("QUADERNO_API_URL must start with http:// or https://, got `{api_url}`");
        }

        let notebook_id = lookup("QUADERNO_NOTEBOOK")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_NOTEBOOK.to_string());

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            notebook_id,
        })
    }
}
