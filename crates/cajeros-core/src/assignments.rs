// ── Assignment reconciliation ──
//
// An administrator's device set is replaced by deleting every existing row
// and then inserting the submitted set. The delete always completes before
// the insert starts. A failed insert after a successful delete leaves the
// administrator with no assignments and is reported as a partial failure;
// nothing is resubmitted automatically.

use std::future::Future;

use tracing::{info, warn};

use cajeros_api::{AssignmentRecord, TableClient};

use crate::error::CoreError;
use crate::model::{AdminId, DeviceId};

/// Storage for the administrator ↔ device relation.
pub trait AssignmentStore {
    /// Remove every assignment of `admin`.
    fn delete_all(&self, admin: AdminId) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Add one assignment per device. Called with a non-empty slice.
    fn insert_all(
        &self,
        admin: AdminId,
        devices: &[DeviceId],
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

impl AssignmentStore for TableClient {
    async fn delete_all(&self, admin: AdminId) -> Result<(), CoreError> {
        Ok(self.delete_assignments(admin.get()).await?)
    }

    async fn insert_all(&self, admin: AdminId, devices: &[DeviceId]) -> Result<(), CoreError> {
        let rows: Vec<AssignmentRecord> = devices
            .iter()
            .map(|d| AssignmentRecord {
                id_administrador: admin.get(),
                id_cajero: d.get(),
            })
            .collect();
        Ok(self.insert_assignments(&rows).await?)
    }
}

/// Make `admin`'s assignment set exactly `devices`. Duplicate ids in the
/// input collapse to one row.
pub async fn replace_assignments<S: AssignmentStore + Sync>(
    store: &S,
    admin: AdminId,
    devices: &[DeviceId],
) -> Result<(), CoreError> {
    let mut unique: Vec<DeviceId> = Vec::with_capacity(devices.len());
    for id in devices {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }

    store.delete_all(admin).await?;

    if unique.is_empty() {
        info!(admin = %admin, "cleared assignments");
        return Ok(());
    }

    if let Err(e) = store.insert_all(admin, &unique).await {
        warn!(admin = %admin, error = %e, "assignment insert failed after delete");
        return Err(CoreError::PartialFailure {
            completed: format!("previous assignments of administrator {admin} were removed"),
            message: e.to_string(),
        });
    }

    info!(admin = %admin, count = unique.len(), "replaced assignments");
    Ok(())
}
