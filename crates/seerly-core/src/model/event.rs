// ── Events ──

use serde::{Deserialize, Serialize};

use super::device::{ChangedFields, Device};
use crate::session::SessionState;

/// A named automation event configured on the controller, addressable
/// by group and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationEvent {
    pub group: String,
    pub name: String,
}

/// Events broadcast to session subscribers.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Session state transition.
    Connectivity(SessionState),
    /// A device appeared that was not previously in the registry.
    DeviceAdded(Device),
    /// An existing device changed; `changed` lists which fields.
    DeviceUpdated {
        device: Device,
        changed: ChangedFields,
    },
    /// A device disappeared from the inventory during a full reload.
    DeviceRemoved(Device),
}
