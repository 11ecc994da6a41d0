// Shared transport configuration for building reqwest::Client instances.
//
// HomeSeer's JSON API is plain HTTP with basic auth, so there is no TLS
// mode to negotiate -- this module only centralizes timeout and
// user-agent settings so every client is built the same way.

use std::time::Duration;

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout. A timed-out structured query aborts that
    /// single request only; session teardown is the core's decision.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("seerly/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(crate::error::Error::Transport)
    }
}
