// ── Update dispatcher ──
//
// Consumes sequenced change notifications and refreshes the affected
// device from the JSON interface. Notifications carry values, but those
// are never trusted as state: the raw channel offers no ordering or
// completeness guarantees, so every notification triggers a scoped
// refetch and only the fetched state is merged.

use std::sync::Arc;

use seerly_api::QueryChannel;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::convert::build_inventory;
use crate::error::CoreError;
use crate::model::{ClientEvent, DeviceRef};
use crate::registry::{LoadDiff, Registry};

/// A change notification stamped with its per-connection sequence number.
#[derive(Debug, Clone)]
pub(crate) struct SequencedChange {
    pub seq: u64,
    pub device_ref: DeviceRef,
}

pub(crate) struct Dispatcher {
    query: Arc<dyn QueryChannel>,
    registry: Arc<Registry>,
    event_tx: broadcast::Sender<Arc<ClientEvent>>,
}

impl Dispatcher {
    pub fn new(
        query: Arc<dyn QueryChannel>,
        registry: Arc<Registry>,
        event_tx: broadcast::Sender<Arc<ClientEvent>>,
    ) -> Self {
        Self {
            query,
            registry,
            event_tx,
        }
    }

    /// Drain change notifications until cancelled or the queue closes.
    pub async fn run(
        &self,
        mut changes: mpsc::Receiver<SequencedChange>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                next = changes.recv() => {
                    let Some(change) = next else { break };
                    self.handle(change).await;
                }
            }
        }
        debug!("dispatcher stopped");
    }

    async fn handle(&self, change: SequencedChange) {
        let device_ref = change.device_ref;
        let device = match self.fetch_device(device_ref).await {
            Ok(Some(device)) => device,
            Ok(None) => {
                // Ref we have never seen: the inventory grew. Resync
                // everything so group members added with it land too.
                debug!(%device_ref, "notification for unknown device, resyncing");
                if let Err(err) = self.resync_full().await {
                    warn!(%device_ref, %err, "full resync after unknown device failed");
                } else if self.registry.get(device_ref).is_none() {
                    warn!(%device_ref, "device still absent after resync, dropping notification");
                }
                return;
            }
            Err(err) => {
                warn!(%device_ref, %err, "device refetch failed, dropping notification");
                return;
            }
        };

        match self.registry.apply_update(device_ref, device.clone(), change.seq) {
            Ok(Some(changed)) => {
                // Emitted even when nothing differs: the refetch is a
                // fresh confirmed state and subscribers may rely on it.
                let _ = self.event_tx.send(Arc::new(ClientEvent::DeviceUpdated {
                    device,
                    changed,
                }));
            }
            Ok(None) => {} // stale sequence, newer state already applied
            Err(CoreError::DeviceNotFound { .. }) => {
                // Known ref on the wire but absent from the registry --
                // lost a race with a concurrent reload. Resync.
                if let Err(err) = self.resync_full().await {
                    warn!(%device_ref, %err, "full resync failed");
                }
            }
            Err(err) => warn!(%device_ref, %err, "update apply failed"),
        }
    }

    /// Fetch one device's current status and controls. `Ok(None)` means
    /// the controller no longer reports that ref.
    async fn fetch_device(
        &self,
        device_ref: DeviceRef,
    ) -> Result<Option<crate::model::Device>, CoreError> {
        let status = self.query.get_status(Some(device_ref.0)).await?;
        let control = self.query.get_control(Some(device_ref.0)).await?;
        let mut devices = build_inventory(status, control);
        Ok(devices
            .iter()
            .position(|d| d.device_ref == device_ref)
            .map(|i| devices.swap_remove(i)))
    }

    /// Fetch the complete inventory, load it into the registry, and
    /// broadcast the resulting diff. Shared between the initial sync and
    /// unknown-device recovery.
    pub async fn resync_full(&self) -> Result<(), CoreError> {
        let status = self.query.get_status(None).await?;
        let control = self.query.get_control(None).await?;
        let diff = self.registry.load(build_inventory(status, control))?;
        self.emit_diff(diff);
        Ok(())
    }

    fn emit_diff(&self, diff: LoadDiff) {
        for device in diff.added {
            let _ = self.event_tx.send(Arc::new(ClientEvent::DeviceAdded(device)));
        }
        for (device, changed) in diff.changed {
            let _ = self
                .event_tx
                .send(Arc::new(ClientEvent::DeviceUpdated { device, changed }));
        }
        for device in diff.removed {
            let _ = self
                .event_tx
                .send(Arc::new(ClientEvent::DeviceRemoved(device)));
        }
    }
}
