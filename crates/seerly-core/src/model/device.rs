// ── Device model ──

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::capability::{Capabilities, ControlPair};

/// Controller-assigned numeric device reference.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DeviceRef(pub u32);

impl fmt::Display for DeviceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u32> for DeviceRef {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl FromStr for DeviceRef {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Physical placement of a device, as configured on the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Primary location (typically a room).
    pub room: Option<String>,
    /// Secondary location (typically a floor or zone).
    pub floor: Option<String>,
}

/// Grouping relationship of a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relationship {
    #[default]
    Standalone,
    RootOfGroup,
    ChildOfGroup,
}

impl Relationship {
    pub fn from_code(code: Option<u8>) -> Self {
        match code {
            Some(2) => Self::RootOfGroup,
            Some(4) => Self::ChildOfGroup,
            _ => Self::Standalone,
        }
    }
}

/// A device as seen by consumers: current state plus derived capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub device_ref: DeviceRef,
    pub name: String,
    pub location: Location,
    /// Current numeric value.
    pub value: f64,
    /// Human-readable status string, e.g. "On" or "57 F".
    pub status: String,
    pub device_type: Option<String>,
    /// Last time the controller recorded a change, if known.
    pub last_change: Option<DateTime<Utc>>,
    pub relationship: Relationship,
    pub control_pairs: Vec<ControlPair>,
    pub capabilities: Capabilities,
}

/// Which fields differ between two snapshots of the same device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)] // a flag per diffable field
pub struct ChangedFields {
    pub value: bool,
    pub status: bool,
    pub name: bool,
    pub location: bool,
    pub capabilities: bool,
}

impl ChangedFields {
    // Exact inequality is intended: both sides are values the controller
    // reported verbatim, never results of arithmetic.
    #[allow(clippy::float_cmp)]
    pub fn diff(old: &Device, new: &Device) -> Self {
        Self {
            value: old.value != new.value,
            status: old.status != new.status,
            name: old.name != new.name,
            location: old.location != new.location,
            capabilities: old.capabilities != new.capabilities,
        }
    }

    pub fn any(&self) -> bool {
        self.value || self.status || self.name || self.location || self.capabilities
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_device() -> Device {
        Device {
            device_ref: DeviceRef(42),
            name: "Hall Light".into(),
            location: Location {
                room: Some("Hall".into()),
                floor: Some("Ground".into()),
            },
            value: 0.0,
            status: "Off".into(),
            device_type: Some("Z-Wave Switch".into()),
            last_change: None,
            relationship: Relationship::Standalone,
            control_pairs: Vec::new(),
            capabilities: Capabilities::Switchable {
                on_value: 255.0,
                off_value: 0.0,
            },
        }
    }

    #[test]
    fn relationship_codes() {
        assert_eq!(Relationship::from_code(Some(2)), Relationship::RootOfGroup);
        assert_eq!(Relationship::from_code(Some(4)), Relationship::ChildOfGroup);
        assert_eq!(Relationship::from_code(Some(3)), Relationship::Standalone);
        assert_eq!(Relationship::from_code(None), Relationship::Standalone);
    }

    #[test]
    fn diff_flags_only_changed_fields() {
        let old = sample_device();
        let mut new = old.clone();
        new.value = 255.0;
        new.status = "On".into();

        let changed = ChangedFields::diff(&old, &new);
        assert!(changed.value);
        assert!(changed.status);
        assert!(!changed.name);
        assert!(!changed.location);
        assert!(!changed.capabilities);
        assert!(changed.any());
    }

    #[test]
    fn diff_of_identical_snapshots_is_empty() {
        let device = sample_device();
        let changed = ChangedFields::diff(&device, &device.clone());
        assert!(!changed.any());
    }

    #[test]
    fn device_ref_parses_with_whitespace() {
        let parsed: DeviceRef = " 123 ".parse().unwrap();
        assert_eq!(parsed, DeviceRef(123));
    }
}
