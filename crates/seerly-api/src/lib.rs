//! Transport layer for HomeSeer controllers.
//!
//! Two channels, two modules:
//!
//! - **[`json`]** -- the structured-query channel. HomeSeer's JSON API
//!   (`GET /JSON?request=...`, basic auth) answers authoritative state
//!   requests: full inventory, per-device status, control pairs,
//!   automation events, and device control.
//! - **[`ascii`]** -- the event-notification channel. A line-oriented
//!   TCP connection that pushes lightweight `DC,{ref},...` change
//!   signals and carries the keepalive ping.
//!
//! [`channel`] defines the traits (`QueryChannel`, `EventChannelFactory`,
//! reader/writer halves) that `seerly-core` consumes, so sessions can be
//! driven by test doubles as easily as by a live controller.

pub mod ascii;
pub mod channel;
pub mod error;
pub mod json;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use ascii::AsciiChannel;
pub use channel::{
    AsciiMessage, DeviceChange, EventChannelFactory, EventReader, EventWriter, QueryChannel,
    RawRef,
};
pub use error::Error;
pub use json::models::{
    ControlPairRecord, ControlRecord, EventRecord, RangeRecord, StatusRecord,
};
pub use json::JsonClient;
pub use transport::TransportConfig;
