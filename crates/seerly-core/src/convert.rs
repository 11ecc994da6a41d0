// ── Wire record to domain model conversion ──
//
// Joins raw status records with their control records and produces
// classified `Device`s. Individual malformed records are skipped with
// a warning rather than failing the whole inventory.

use std::collections::HashMap;

use seerly_api::{ControlRecord, StatusRecord};
use tracing::{debug, warn};

use crate::classify::classify;
use crate::model::{ControlPair, ControlUse, Device, DeviceRef, Location, Relationship, ValueRange};
use crate::units::parse_last_change;

/// Join status and control records into classified devices.
pub fn build_inventory(
    status: Vec<StatusRecord>,
    control: Vec<ControlRecord>,
) -> Vec<Device> {
    let mut pairs_by_ref: HashMap<u32, Vec<ControlPair>> = control
        .into_iter()
        .filter_map(|rec| {
            let device_ref = rec.device_ref?;
            Some((device_ref, control_pairs_from_record(&rec)))
        })
        .collect();

    status
        .into_iter()
        .filter_map(|rec| {
            let Some(raw_ref) = rec.device_ref else {
                warn!(name = rec.name.as_deref(), "status record missing ref, skipping");
                return None;
            };
            let pairs = pairs_by_ref.remove(&raw_ref).unwrap_or_default();
            Some(device_from_status(raw_ref, rec, pairs))
        })
        .collect()
}

/// Build a single device from its status record and control pairs.
pub fn device_from_status(
    raw_ref: u32,
    rec: StatusRecord,
    pairs: Vec<ControlPair>,
) -> Device {
    let capabilities = classify(&pairs);
    if pairs.is_empty() {
        debug!(device_ref = raw_ref, "no control pairs, device is status-only");
    }

    Device {
        device_ref: DeviceRef(raw_ref),
        name: rec
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Device {raw_ref}")),
        location: Location {
            room: rec.location.filter(|s| !s.is_empty()),
            floor: rec.location2.filter(|s| !s.is_empty()),
        },
        value: rec.value.unwrap_or(0.0),
        status: rec.status.unwrap_or_default(),
        device_type: rec.device_type_string.filter(|s| !s.is_empty()),
        last_change: rec.last_change.as_deref().and_then(parse_last_change),
        relationship: Relationship::from_code(rec.relationship),
        control_pairs: pairs,
        capabilities,
    }
}

/// Decode a control record's pairs into domain control pairs.
pub fn control_pairs_from_record(rec: &ControlRecord) -> Vec<ControlPair> {
    rec.control_pairs
        .iter()
        .map(|p| ControlPair {
            use_kind: p.control_use.map_or(ControlUse::Unknown, ControlUse::from_code),
            label: p.label.clone(),
            control_value: p.control_value.unwrap_or(0.0),
            range: p.range.as_ref().map(|r| ValueRange {
                start: r.start,
                end: r.end,
            }),
        })
        .collect()
}
