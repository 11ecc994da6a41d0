// Raw wire records for the HomeSeer JSON API.
//
// Everything beyond `ref` is optional-tolerant: controllers and plug-ins
// omit fields freely, and a record with gaps must still yield a usable
// (status-only) device rather than abort the whole load.

use serde::{Deserialize, Serialize};

// ── getstatus ────────────────────────────────────────────────────────

/// Envelope for `request=getstatus`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    #[serde(rename = "Devices", default)]
    pub devices: Vec<StatusRecord>,
}

/// One device's status as the controller reports it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Stable integer key. Absent/unparsable means the record is skipped.
    #[serde(rename = "ref", default)]
    pub device_ref: Option<u32>,

    #[serde(default)]
    pub name: Option<String>,

    /// Room within the location hierarchy.
    #[serde(default)]
    pub location: Option<String>,

    /// Floor within the location hierarchy.
    #[serde(default)]
    pub location2: Option<String>,

    /// Raw numeric status value.
    #[serde(default)]
    pub value: Option<f64>,

    /// Raw status string (e.g. `"On"`, `"Dim 45%"`, `"1.2 kW"`).
    #[serde(default)]
    pub status: Option<String>,

    /// Vendor device-type string, for display only.
    #[serde(default)]
    pub device_type_string: Option<String>,

    /// HomeSeer timestamp, `/Date(ms)/` format.
    #[serde(default)]
    pub last_change: Option<String>,

    /// Grouping relationship code: 2 = root, 4 = child.
    #[serde(default)]
    pub relationship: Option<u8>,

    /// All remaining fields the controller sends.
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

// ── getcontrol ───────────────────────────────────────────────────────

/// Envelope for `request=getcontrol`.
#[derive(Debug, Clone, Deserialize)]
pub struct ControlResponse {
    #[serde(rename = "Devices", default)]
    pub devices: Vec<ControlRecord>,
}

/// One device's declared control affordances.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlRecord {
    #[serde(rename = "ref", default)]
    pub device_ref: Option<u32>,

    #[serde(rename = "ControlPairs", default)]
    pub control_pairs: Vec<ControlPairRecord>,
}

/// One control affordance paired with its status mapping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlPairRecord {
    /// Semantic code: 1 = on, 2 = off, 3 = dim, 18 = lock, 19 = unlock.
    #[serde(rename = "ControlUse", default)]
    pub control_use: Option<i64>,

    /// Human label; some plug-ins set `"Lock"`/`"Unlock"` here instead
    /// of the lock control-use codes.
    #[serde(rename = "Label", default)]
    pub label: Option<String>,

    /// The raw value this control sets.
    #[serde(rename = "ControlValue", default)]
    pub control_value: Option<f64>,

    /// Continuous range, when the control accepts a span of values.
    #[serde(rename = "Range", default)]
    pub range: Option<RangeRecord>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RangeRecord {
    #[serde(rename = "RangeStart")]
    pub start: f64,
    #[serde(rename = "RangeEnd")]
    pub end: f64,
}

// ── getevents ────────────────────────────────────────────────────────

/// Envelope for `request=getevents`.
#[derive(Debug, Clone, Deserialize)]
pub struct EventsResponse {
    #[serde(rename = "Events", default)]
    pub events: Vec<EventRecord>,
}

/// One controller automation event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "Group", default)]
    pub group: String,
    #[serde(rename = "Name", default)]
    pub name: String,
}

// ── Tests ────────────────────────────────────────────────────────────
