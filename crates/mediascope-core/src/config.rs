//! Configuration module
//!
//! Client configuration comes from the environment (optionally via a `.env`
//! file). Deadlines and media constraints are code-level constants that can be
//! overridden programmatically.

use std::env;
use std::time::Duration;

use crate::models::MediaConstraints;
use crate::timeout::TimeoutPolicy;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
const CONNECT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the analysis service, without trailing slash.
    pub api_base_url: String,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
    pub timeouts: TimeoutPolicy,
    pub constraints: MediaConstraints,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            user_agent: default_user_agent(),
            timeouts: TimeoutPolicy::default(),
            constraints: MediaConstraints::default(),
        }
    }
}

fn default_user_agent() -> String {
    format!("mediascope/{}", env!("CARGO_PKG_VERSION"))
}

impl ClientConfig {
    /// Config pointed at `api_base_url` with everything else defaulted.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Read MEDIASCOPE_API_URL (or API_BASE_URL), MEDIASCOPE_CONNECT_TIMEOUT_SECS
    /// and MEDIASCOPE_USER_AGENT.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let api_base_url = env::var("MEDIASCOPE_API_URL")
            .or_else(|_| env::var("API_BASE_URL"))
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());

        let connect_timeout_secs = match env::var("MEDIASCOPE_CONNECT_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse().map_err(|_| {
                anyhow::anyhow!(
                    "MEDIASCOPE_CONNECT_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                    raw
                )
            })?,
            Err(_) => CONNECT_TIMEOUT_SECS,
        };

        let config = Self {
            api_base_url: api_base_url.trim().trim_end_matches('/').to_string(),
            connect_timeout_secs,
            user_agent: env::var("MEDIASCOPE_USER_AGENT").unwrap_or_else(|_| default_user_agent()),
            timeouts: TimeoutPolicy::default(),
            constraints: MediaConstraints::default(),
        };

        config.validate()?;
        tracing::debug!(
            api_base_url = %config.api_base_url,
            connect_timeout_secs = config.connect_timeout_secs,
            "Loaded client configuration"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.api_base_url.is_empty() {
            return Err(anyhow::anyhow!("API base URL must not be empty"));
        }

        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(anyhow::anyhow!(
                "API base URL must start with http:// or https://, got '{}'",
                self.api_base_url
            ));
        }

        if self.connect_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Connect timeout must be greater than zero"));
        }

        if self.timeouts.video_cap.is_zero() || self.timeouts.image.is_zero() {
            return Err(anyhow::anyhow!("Request deadlines must be greater than zero"));
        }

        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn with_timeouts(mut self, timeouts: TimeoutPolicy) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_constraints(mut self, constraints: MediaConstraints) -> Self {
        self.constraints = constraints;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:8000/api");
        assert_eq!(config.connect_timeout(), Duration::from_secs(30));
        assert!(config.user_agent.starts_with("mediascope/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let config = ClientConfig::new("https://analysis.example.com/api/");
        assert_eq!(config.api_base_url, "https://analysis.example.com/api");
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        assert!(ClientConfig::new("").validate().is_err());
        assert!(ClientConfig::new("ftp://example.com").validate().is_err());
        assert!(ClientConfig::new("localhost:8000").validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let mut config = ClientConfig::default();
        config.connect_timeout_secs = 0;
        assert!(config.validate().is_err());

        let config = ClientConfig::default().with_timeouts(TimeoutPolicy {
            image: Duration::ZERO,
            ..TimeoutPolicy::default()
        });
        assert!(config.validate().is_err());
    }
}
