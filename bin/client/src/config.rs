//! Client configuration
//!
//! Priority: command-line flags > environment variables > defaults

use crate::constants::{DEFAULT_SERVER_URL, MAX_UPLOAD_BYTES_ENV, SERVER_URL_ENV, TIMEOUT_SECS_ENV};
use anyhow::{Context, Result};
use common::file_utils::MAX_UPLOAD_BYTES;
use std::time::Duration;
use transport::TransportConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_url: String,
    pub timeout: Option<Duration>,
    pub max_upload_bytes: u64,
}

impl ClientConfig {
    /// Resolve against the process environment
    pub fn load(server: Option<String>, timeout_secs: Option<u64>) -> Result<Self> {
        Self::resolve(server, timeout_secs, |key| std::env::var(key).ok())
    }

    fn resolve(
        server: Option<String>,
        timeout_secs: Option<u64>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let server_url = server
            .or_else(|| env(SERVER_URL_ENV))
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        let timeout_secs = match timeout_secs {
            Some(secs) => Some(secs),
            None => env(TIMEOUT_SECS_ENV)
                .map(|raw| {
                    raw.trim()
                        .parse::<u64>()
                        .with_context(|| format!("Invalid {TIMEOUT_SECS_ENV}: {raw}"))
                })
                .transpose()?,
        };

        let max_upload_bytes = env(MAX_UPLOAD_BYTES_ENV)
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .with_context(|| format!("Invalid {MAX_UPLOAD_BYTES_ENV}: {raw}"))
            })
            .transpose()?
            .unwrap_or(MAX_UPLOAD_BYTES);

        Ok(Self {
            server_url,
            timeout: timeout_secs.map(Duration::from_secs),
            max_upload_bytes,
        })
    }

    pub fn transport_config(&self) -> TransportConfig {
        let config = TransportConfig::new(self.server_url.as_str());
        match self.timeout {
            Some(timeout) => config.with_timeout(timeout),
            None => config,
        }
    }
}
