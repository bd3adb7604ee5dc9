//! Environment-driven backend configuration.
//!
//! Demo flows and applications embedding the crate read their credentials
//! from a `.env` file or the process environment. Nothing here is required:
//! [`HttpBackend`](crate::http::HttpBackend) constructors accept explicit
//! values too.

use std::env;
use std::error::Error;

/// Environment variable holding the remote service API key.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Environment variable overriding the remote service base URL.
pub const BASE_URL_VAR: &str = "CONVOKE_BASE_URL";

/// Credentials and endpoint for the remote conversational service.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub api_key: String,
    /// Custom base URL, `None` for the public endpoint.
    pub base_url: Option<String>,
}

impl BackendConfig {
    /// Load credentials from `.env` (if present) and the process
    /// environment. A missing API key is an error, not a panic.
    pub fn from_env() -> Result<Self, Box<dyn Error + Send + Sync>> {
        dotenvy::dotenv().ok();
        let api_key = env::var(API_KEY_VAR)
            .map_err(|_| format!("{} is not set", API_KEY_VAR))?;
        let base_url = env::var(BASE_URL_VAR).ok();
        Ok(BackendConfig { api_key, base_url })
    }

    /// Build an [`HttpBackend`](crate::http::HttpBackend) from this config.
    pub fn into_backend(self) -> crate::convoke::http::HttpBackend {
        match self.base_url {
            Some(url) => crate::convoke::http::HttpBackend::new_with_base_url(self.api_key, &url),
            None => crate::convoke::http::HttpBackend::new(self.api_key),
        }
    }
}
