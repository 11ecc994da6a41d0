// ── Device registry ──
//
// Concurrent map of devices keyed by ref, with a reactive snapshot for
// consumers. Writers are the session's sync and dispatch paths; readers
// take cheap Arc'd snapshots or subscribe to the version watch.
//
// Out-of-order protection: every applied update carries a per-connection
// sequence number, and a device only accepts updates with a higher
// sequence than the last one it applied. `load()` resets the sequence
// map because each connection numbers its updates from 1 again.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{ChangedFields, Device, DeviceRef};

/// Result of a full inventory load: what appeared, changed, and vanished
/// relative to the previous contents.
#[derive(Debug, Default)]
pub struct LoadDiff {
    pub added: Vec<Device>,
    pub changed: Vec<(Device, ChangedFields)>,
    pub removed: Vec<Device>,
}

pub struct Registry {
    devices: DashMap<DeviceRef, Arc<Device>>,
    applied_seq: DashMap<DeviceRef, u64>,
    snapshot: watch::Sender<Arc<Vec<Arc<Device>>>>,
    version: watch::Sender<u64>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            devices: DashMap::new(),
            applied_seq: DashMap::new(),
            snapshot: watch::Sender::new(Arc::new(Vec::new())),
            version: watch::Sender::new(0),
        }
    }

    /// Replace the registry contents with a freshly fetched inventory.
    ///
    /// Upserts every incoming device, prunes devices no longer present,
    /// and returns the diff. An empty inventory is rejected: a live
    /// controller always has at least its own system devices, so zero
    /// devices means the fetch went wrong, not that everything vanished.
    pub fn load(&self, inventory: Vec<Device>) -> Result<LoadDiff, CoreError> {
        if inventory.is_empty() {
            return Err(CoreError::EmptyInventory);
        }

        let mut diff = LoadDiff::default();
        let mut seen: Vec<DeviceRef> = Vec::with_capacity(inventory.len());

        for device in inventory {
            seen.push(device.device_ref);
            let incoming = Arc::new(device);
            match self.devices.insert(incoming.device_ref, Arc::clone(&incoming)) {
                None => diff.added.push((*incoming).clone()),
                Some(previous) => {
                    let changed = ChangedFields::diff(&previous, &incoming);
                    if changed.any() {
                        diff.changed.push(((*incoming).clone(), changed));
                    }
                }
            }
        }

        self.devices.retain(|device_ref, device| {
            if seen.contains(device_ref) {
                true
            } else {
                diff.removed.push((**device).clone());
                false
            }
        });

        // New connection, new sequence numbering.
        self.applied_seq.clear();
        self.rebuild_snapshot();

        debug!(
            added = diff.added.len(),
            changed = diff.changed.len(),
            removed = diff.removed.len(),
            total = self.devices.len(),
            "inventory loaded"
        );
        Ok(diff)
    }

    /// Apply a refetched device state for a change notification.
    ///
    /// Returns the changed fields, `Ok(None)` if the update was stale
    /// (an update with a higher sequence already applied), or
    /// `DeviceNotFound` if the device is not in the registry.
    pub fn apply_update(
        &self,
        device_ref: DeviceRef,
        device: Device,
        seq: u64,
    ) -> Result<Option<ChangedFields>, CoreError> {
        let Some(previous) = self.devices.get(&device_ref).map(|e| Arc::clone(e.value()))
        else {
            return Err(CoreError::DeviceNotFound { device_ref });
        };

        {
            let mut last = self.applied_seq.entry(device_ref).or_insert(0);
            if seq <= *last {
                debug!(%device_ref, seq, last = *last, "stale update dropped");
                return Ok(None);
            }
            *last = seq;
        }

        let changed = ChangedFields::diff(&previous, &device);
        self.devices.insert(device_ref, Arc::new(device));
        self.rebuild_snapshot();
        Ok(Some(changed))
    }

    pub fn get(&self, device_ref: DeviceRef) -> Option<Arc<Device>> {
        self.devices.get(&device_ref).map(|e| Arc::clone(e.value()))
    }

    /// Current snapshot of all devices, sorted by ref.
    pub fn snapshot(&self) -> Arc<Vec<Arc<Device>>> {
        self.snapshot.borrow().clone()
    }

    /// Watch that ticks on every registry mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    fn rebuild_snapshot(&self) {
        let mut devices: Vec<Arc<Device>> = self
            .devices
            .iter()
            .map(|e| Arc::clone(e.value()))
            .collect();
        devices.sort_by_key(|d| d.device_ref);
        self.snapshot.send_replace(Arc::new(devices));
        self.version.send_modify(|v| *v += 1);
    }
}
