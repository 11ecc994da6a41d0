use thiserror::Error;

/// Top-level error type for the `seerly-api` crate.
///
/// Covers every failure mode across both channels: the JSON HTTP API
/// (structured queries) and the ASCII event interface (change
/// notifications). `seerly-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected on either channel (wrong credentials).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── HTTP transport ──────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── ASCII interface ─────────────────────────────────────────────
    /// Opening the ASCII event connection failed.
    #[error("ASCII connection failed: {0}")]
    AsciiConnect(String),

    /// The ASCII event connection closed before the exchange completed.
    #[error("ASCII connection closed")]
    AsciiClosed,

    /// Framing or protocol error while reading the ASCII stream.
    #[error("ASCII protocol error: {0}")]
    AsciiProtocol(String),

    /// Raw socket I/O failure on the ASCII connection.
    #[error("ASCII I/O error: {0}")]
    AsciiIo(#[from] std::io::Error),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    /// HomeSeer answers some malformed requests with an HTML error page
    /// and HTTP 200, so the body is kept for diagnostics.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates bad credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::AsciiConnect(_) | Self::AsciiClosed => true,
            Self::AsciiIo(_) => true,
            _ => false,
        }
    }
}
