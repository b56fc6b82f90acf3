// ── Ordered device mirror ──
//
// Snapshots are `Arc<Vec<Arc<Device>>>` published through a `watch`
// channel, so readers never block the writer and never observe a
// half-applied change. Only the owning view mutates the mirror.

use std::sync::Arc;

use tokio::sync::watch;

use crate::model::{Device, DeviceId, DevicePatch};
use crate::stream::EntityStream;

/// One reconciliation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorChange {
    /// Append. Duplicated ids are tolerated.
    Insert(Device),
    /// Merge present fields into every device with this id.
    Update(DeviceId, DevicePatch),
    /// Remove every device with this id.
    Delete(DeviceId),
}

type Snapshot = Arc<Vec<Arc<Device>>>;

/// Ordered, observable sequence of devices.
pub struct DeviceMirror {
    tx: watch::Sender<Snapshot>,
}

impl DeviceMirror {
    pub fn new() -> Self {
        Self::from_devices(Vec::new())
    }

    pub fn from_devices(devices: Vec<Device>) -> Self {
        let (tx, _) = watch::channel(wrap(devices));
        Self { tx }
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    /// First device with `id`, if any.
    pub fn get(&self, id: DeviceId) -> Option<Arc<Device>> {
        self.tx.borrow().iter().find(|d| d.id == id).cloned()
    }

    pub fn subscribe(&self) -> EntityStream<Device> {
        EntityStream::new(self.tx.subscribe())
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Replace the whole contents (initial load, poll, reload-after-write).
    pub fn replace_all(&self, devices: Vec<Device>) {
        self.tx.send_replace(wrap(devices));
    }

    /// Apply one change. Subscribers are notified only when the contents
    /// actually changed; returns whether they did.
    pub fn apply(&self, change: MirrorChange) -> bool {
        match change {
            MirrorChange::Insert(device) => self.insert(device),
            MirrorChange::Update(id, patch) => self.update(id, &patch) > 0,
            MirrorChange::Delete(id) => self.delete(id) > 0,
        }
    }

    /// Append a device.
    pub fn insert(&self, device: Device) -> bool {
        self.tx.send_modify(|snap| {
            let mut next = Vec::with_capacity(snap.len() + 1);
            next.extend(snap.iter().cloned());
            next.push(Arc::new(device));
            *snap = Arc::new(next);
        });
        true
    }

    /// Merge `patch` into every device with `id`. Returns how many devices
    /// changed; an unknown id changes nothing.
    pub fn update(&self, id: DeviceId, patch: &DevicePatch) -> usize {
        let mut changed = 0;
        self.tx.send_if_modified(|snap| {
            let next: Vec<Arc<Device>> = snap
                .iter()
                .map(|d| {
                    if d.id != id {
                        return Arc::clone(d);
                    }
                    let mut merged = Device::clone(d);
                    merged.merge(patch);
                    if merged == **d {
                        Arc::clone(d)
                    } else {
                        changed += 1;
                        Arc::new(merged)
                    }
                })
                .collect();
            if changed > 0 {
                *snap = Arc::new(next);
            }
            changed > 0
        });
        changed
    }

    /// Remove every device with `id`. Returns how many were removed.
    pub fn delete(&self, id: DeviceId) -> usize {
        let mut removed = 0;
        self.tx.send_if_modified(|snap| {
            let before = snap.len();
            if !snap.iter().any(|d| d.id == id) {
                return false;
            }
            let next: Vec<Arc<Device>> = snap.iter().filter(|d| d.id != id).cloned().collect();
            removed = before - next.len();
            *snap = Arc::new(next);
            true
        });
        removed
    }
}

impl Default for DeviceMirror {
    fn default() -> Self {
        Self::new()
    }
}

fn wrap(devices: Vec<Device>) -> Snapshot {
    Arc::new(devices.into_iter().map(Arc::new).collect())
}
