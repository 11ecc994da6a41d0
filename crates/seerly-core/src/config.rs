// ── Session configuration ──

use std::time::Duration;

/// Configuration for a controller session.
///
/// Defaults match a stock controller install: HTTP on port 80, the
/// event channel on port 11000, and `default`/`default` credentials.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Controller hostname or IP address.
    pub host: String,
    /// Port of the JSON query interface.
    pub http_port: u16,
    /// Port of the line-oriented event interface.
    pub ascii_port: u16,
    pub username: String,
    pub password: String,
    /// Per-request timeout for JSON queries.
    pub request_timeout: Duration,
    pub keepalive: KeepaliveConfig,
    pub reconnect: ReconnectConfig,
}

impl SessionConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            http_port: 80,
            ascii_port: 11_000,
            username: "default".into(),
            password: "default".into(),
            request_timeout: Duration::from_secs(30),
            keepalive: KeepaliveConfig::default(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Keepalive probing on the event channel.
///
/// The controller never pushes traffic for idle devices, so silence is
/// ambiguous: a periodic ping plus an ack deadline distinguishes "idle"
/// from "dead peer".
#[derive(Debug, Clone)]
pub struct KeepaliveConfig {
    /// Interval between pings.
    pub interval: Duration,
    /// How long to wait for any inbound traffic after a ping.
    pub ack_timeout: Duration,
    /// Consecutive unanswered pings before the connection is declared dead.
    pub miss_threshold: u32,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            ack_timeout: Duration::from_secs(5),
            miss_threshold: 3,
        }
    }
}

/// Exponential backoff between reconnect attempts.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// `None` retries forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ports_match_stock_controller() {
        let config = SessionConfig::new("10.0.0.5");
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.http_port, 80);
        assert_eq!(config.ascii_port, 11_000);
        assert_eq!(config.username, "default");
        assert_eq!(config.password, "default");
    }
}
