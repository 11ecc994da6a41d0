// ── Core error types ──
//
// User-facing errors from seerly-core. These are NOT wire-specific --
// consumers never see HTTP status codes or line-framing failures
// directly. The `From<seerly_api::Error>` impl translates transport
// errors into domain-appropriate variants.

use thiserror::Error;

use crate::model::{DeviceRef, Operation, Variant};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Controller disconnected")]
    Disconnected,

    #[error("Controller request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {device_ref}")]
    DeviceNotFound { device_ref: DeviceRef },

    /// A full inventory fetch came back with zero devices. Treated as a
    /// transient fetch anomaly, never as an intentional empty inventory.
    #[error("Controller reported an empty device inventory")]
    EmptyInventory,

    #[error("Automation event not found: {group}/{name}")]
    EventNotFound { group: String, name: String },

    // ── Operation errors ─────────────────────────────────────────────
    /// The device's derived variant does not support the operation.
    #[error("{operation} is not supported by a {variant} device")]
    CapabilityMismatch {
        operation: Operation,
        variant: Variant,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<seerly_api::Error> for CoreError {
    fn from(err: seerly_api::Error) -> Self {
        match err {
            seerly_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            seerly_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                    }
                }
            }
            seerly_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            seerly_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            seerly_api::Error::AsciiConnect(reason) => CoreError::ConnectionFailed { reason },
            seerly_api::Error::AsciiClosed => CoreError::Disconnected,
            seerly_api::Error::AsciiProtocol(msg) | seerly_api::Error::Deserialization { message: msg, .. } => {
                CoreError::Api { message: msg }
            }
            seerly_api::Error::AsciiIo(e) => CoreError::ConnectionFailed {
                reason: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_close_maps_to_disconnected() {
        let err: CoreError = seerly_api::Error::AsciiClosed.into();
        assert!(matches!(err, CoreError::Disconnected));
    }

    #[test]
    fn auth_error_carries_message() {
        let err: CoreError = seerly_api::Error::Authentication {
            message: "bad credentials".into(),
        }
        .into();
        match err {
            CoreError::AuthenticationFailed { message } => {
                assert_eq!(message, "bad credentials");
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn capability_mismatch_names_operation_and_variant() {
        let err = CoreError::CapabilityMismatch {
            operation: Operation::Lock,
            variant: Variant::Switchable,
        };
        let msg = err.to_string();
        assert!(msg.contains("lock"), "message was: {msg}");
        assert!(msg.contains("switchable"), "message was: {msg}");
    }
}
