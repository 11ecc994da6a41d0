//! Domain model: devices, capabilities, and events.

mod capability;
mod device;
mod event;

pub use capability::{
    Capabilities, ControlPair, ControlUse, Operation, ValueRange, Variant,
};
pub use device::{ChangedFields, Device, DeviceRef, Location, Relationship};
pub use event::{AutomationEvent, ClientEvent};
