//! Remote API Config

use std::time::Duration;

use clap::Args;

/// Remote commerce API settings.
#[derive(Debug, Clone, Args)]
pub struct RemoteConfig {
    /// Base URL of the commerce API; runs offline when omitted
    #[arg(long, env = "API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "API_TIMEOUT_SECONDS", default_value_t = 10u64)]
    pub api_timeout_seconds: u64,
}

impl RemoteConfig {
    /// Whether no remote API is configured.
    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.api_base_url
            .as_deref()
            .is_none_or(|url| url.trim().is_empty())
    }

    /// Request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_seconds)
    }
}
