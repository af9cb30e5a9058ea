//! HTTP client for the Mediascope analysis service.
//!
//! Provides the reqwest-backed [`HttpTransport`], the [`Transport`] seam it
//! implements, and the [`Orchestrator`] that sequences validation, deadline
//! estimation, upload and error classification for one submission.
//! The CLI uses this crate directly.

pub mod preview;
pub mod submission;
pub mod transport;

use anyhow::{Context, Result};
use mediascope_core::{ClientConfig, MediaKind};
use reqwest::Client;
use std::sync::Arc;

pub use preview::{LocalResource, PreviewFile};
pub use submission::{CancelHandle, Orchestrator, SubmitOptions};
pub use transport::{HttpTransport, Transport};

/// Path of the analysis endpoint for a media kind, relative to the base URL.
pub fn analyze_path(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => "/image/analyze",
        MediaKind::Video => "/video/analyze",
    }
}

/// HTTP client for the analysis service.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate().context("Invalid client configuration")?;

        // No total timeout here: each request carries its own deadline.
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// Create client from environment: MEDIASCOPE_API_URL (or API_BASE_URL).
    pub fn from_env() -> Result<Self> {
        let config = ClientConfig::from_env().context("Failed to load configuration")?;
        Self::new(config)
    }

    pub fn base_url(&self) -> &str {
        &self.config.api_base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    /// Raw client for custom requests.
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn transport(&self) -> HttpTransport {
        HttpTransport::new(self.clone())
    }

    /// A fresh orchestrator for one submission, backed by this client.
    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(
            Arc::new(self.transport()),
            self.config.constraints.clone(),
            self.config.timeouts,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_paths() {
        assert_eq!(analyze_path(MediaKind::Image), "/image/analyze");
        assert_eq!(analyze_path(MediaKind::Video), "/video/analyze");
    }

    #[test]
    fn test_build_url() {
        let client = ApiClient::new(ClientConfig::new("http://localhost:8000/api/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(
            client.build_url(analyze_path(MediaKind::Video)),
            "http://localhost:8000/api/video/analyze"
        );
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(ApiClient::new(ClientConfig::new("not-a-url")).is_err());
    }
}
