//! Channel contracts between the transport layer and `seerly-core`.
//!
//! The core treats both controller channels as opaque endpoints behind
//! these traits: the structured-query channel ([`QueryChannel`]) answers
//! authoritative state requests, and the event-notification channel
//! ([`EventChannelFactory`] + reader/writer halves) streams lightweight
//! change signals. Concrete HomeSeer implementations live in
//! [`crate::json`] and [`crate::ascii`]; tests inject doubles.

use async_trait::async_trait;

use crate::error::Error;
use crate::json::models::{ControlRecord, EventRecord, StatusRecord};

/// Raw device identifier on the wire (HomeSeer `ref`).
pub type RawRef = u32;

// ── Event-channel messages ───────────────────────────────────────────

/// A device-change notification from the ASCII interface.
///
/// Wire shape is `DC,{ref},{newval},{oldval}`. The values are carried as
/// hints only -- the core always re-fetches the authoritative state,
/// because some devices report status strings with no reliable mapping
/// to the raw value.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceChange {
    pub device_ref: RawRef,
    pub new_value: Option<f64>,
    pub old_value: Option<f64>,
}

/// A parsed line from the event-notification channel.
///
/// Every inbound line, `DC` or not, counts as liveness for keepalive
/// purposes: HomeSeer answers the `vr` ping with a plain version line
/// rather than a dedicated acknowledgment frame.
#[derive(Debug, Clone, PartialEq)]
pub enum AsciiMessage {
    DeviceChange(DeviceChange),
    /// Any non-`DC` payload (ping response, unhandled message type).
    Other(String),
}

// ── Channel traits ───────────────────────────────────────────────────

/// The structured-query channel: request/response exchanges keyed by a
/// device ref or "all devices".
#[async_trait]
pub trait QueryChannel: Send + Sync {
    /// Fetch status records for one device, or all devices when `None`.
    async fn get_status(&self, device_ref: Option<RawRef>) -> Result<Vec<StatusRecord>, Error>;

    /// Fetch control (capability-pair) records for one device, or all.
    async fn get_control(&self, device_ref: Option<RawRef>) -> Result<Vec<ControlRecord>, Error>;

    /// Fetch the controller's automation events.
    async fn get_events(&self) -> Result<Vec<EventRecord>, Error>;

    /// Set a device to a raw value.
    async fn control_by_value(&self, device_ref: RawRef, value: f64) -> Result<(), Error>;

    /// Run an automation event by group and name.
    async fn run_event(&self, group: &str, name: &str) -> Result<(), Error>;
}

/// Opens the event-notification channel.
///
/// `open` performs the full connect + login handshake and hands back
/// the split halves; the core owns their task lifecycles from there.
#[async_trait]
pub trait EventChannelFactory: Send + Sync {
    async fn open(&self) -> Result<(Box<dyn EventReader>, Box<dyn EventWriter>), Error>;
}

/// Read half of the event-notification channel.
#[async_trait]
pub trait EventReader: Send {
    /// Next parsed message. `Ok(None)` means the peer closed cleanly.
    async fn next_message(&mut self) -> Result<Option<AsciiMessage>, Error>;
}

/// Write half of the event-notification channel.
#[async_trait]
pub trait EventWriter: Send {
    /// Send a keepalive ping.
    async fn ping(&mut self) -> Result<(), Error>;
}
