//! # seerly-core
//!
//! Core domain logic for the seerly controller client: the session
//! state machine, device registry, capability classifier, and update
//! dispatcher, built on the raw transports from `seerly-api`.
//!
//! The entry point is [`Session`]: configure it, `start()` it, then
//! read device state from the registry snapshot and subscribe to
//! [`ClientEvent`]s. The session keeps itself connected, reloading the
//! full inventory after every (re)connect.
//!
//! ```no_run
//! use seerly_core::{Session, SessionConfig};
//!
//! # async fn run() -> Result<(), seerly_core::CoreError> {
//! let session = Session::from_config(SessionConfig::new("192.168.1.10"))?;
//! session.start().await;
//!
//! let mut events = session.subscribe();
//! while let Ok(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod registry;
pub mod session;
pub mod units;

mod dispatch;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{KeepaliveConfig, ReconnectConfig, SessionConfig};
pub use error::CoreError;
pub use model::{
    AutomationEvent, Capabilities, ChangedFields, ClientEvent, ControlPair, ControlUse,
    Device, DeviceRef, Location, Operation, Relationship, ValueRange, Variant,
};
pub use registry::{LoadDiff, Registry};
pub use session::{Session, SessionState};
pub use units::{parse_last_change, unit_from_status, Unit};
