// ── Wire-to-domain conversions ──
//
// Bridges raw `cajeros_api` records into canonical `cajeros_core::model`
// types and back. Reads accept either backend's spelling; writes are
// encoded for the backend they are sent to. Everything here is pure.

use secrecy::ExposeSecret;
use serde_json::{Map, Value, json};
use tracing::debug;

use cajeros_api::models::{AdminRecord, CajeroRecord, LineStatus, MacroRecord};
use cajeros_api::realtime::{ChangeKind, RowChange};

use crate::config::BackendKind;
use crate::error::CoreError;
use crate::model::{
    AdminId, AdminPatch, Administrator, Device, DeviceId, DevicePatch, DeviceStatus, MacroConfig,
    NewDevice,
};
use crate::store::MirrorChange;

// ── Helpers ────────────────────────────────────────────────────────

/// `true` / `"open"` are online; `false`, `"close"`, any other value and
/// absence are offline.
pub fn is_online(status: Option<&LineStatus>) -> bool {
    match status {
        Some(LineStatus::Flag(flag)) => *flag,
        Some(LineStatus::Text(text)) => text == "open",
        Some(LineStatus::Other(_)) | None => false,
    }
}

/// Daily count from either key, preferring `conteoDia`.
pub fn daily_count(record: &CajeroRecord) -> Option<i64> {
    record.conteo_dia.or(record.conteodia)
}

/// Group ids are text, occasionally sent as numbers.
fn group_id(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ── Device (read) ──────────────────────────────────────────────────

impl From<&CajeroRecord> for DevicePatch {
    fn from(r: &CajeroRecord) -> Self {
        DevicePatch {
            name: r.nombre.clone(),
            online: r.estadolinea.as_ref().map(|s| is_online(Some(s))),
            phone_number: r.numerotelefono.clone(),
            group_id: r.idgrupo.as_ref().map(|g| g.as_ref().and_then(group_id)),
            count: r.conteo,
            max_count: r.maxconteo,
            daily_count: daily_count(r),
        }
    }
}

impl TryFrom<&CajeroRecord> for Device {
    type Error = CoreError;

    fn try_from(r: &CajeroRecord) -> Result<Self, Self::Error> {
        let id = r
            .id
            .ok_or_else(|| CoreError::Internal("device row without an id".into()))?;
        let mut device = Device::new(DeviceId::new(id));
        device.merge(&DevicePatch::from(r));
        Ok(device)
    }
}

/// Normalize a list of rows, dropping rows that carry no id.
pub fn devices_from_records(records: &[CajeroRecord]) -> Vec<Device> {
    records
        .iter()
        .filter_map(|r| match Device::try_from(r) {
            Ok(d) => Some(d),
            Err(e) => {
                debug!(error = %e, "skipping device row");
                None
            }
        })
        .collect()
}

// ── Administrator / macro (read) ───────────────────────────────────

impl From<AdminRecord> for Administrator {
    fn from(r: AdminRecord) -> Self {
        Administrator {
            id: AdminId::new(r.id),
            name: r.nombre,
            password: r.contrasena.map(Into::into),
            is_privileged: r.permiso_admin.unwrap_or(false),
        }
    }
}

impl From<MacroRecord> for MacroConfig {
    fn from(r: MacroRecord) -> Self {
        MacroConfig {
            cbu90: r.cbu90.unwrap_or_default(),
            cbu100: r.cbu100.unwrap_or_default(),
        }
    }
}

// ── Device (write) ─────────────────────────────────────────────────

/// Encode a device edit for `backend`.
pub fn encode_device_patch(backend: BackendKind, patch: &DevicePatch) -> Map<String, Value> {
    match backend {
        BackendKind::Rest => rest_device_fields(patch),
        BackendKind::Table => table_device_fields(patch),
    }
}

fn common_device_fields(patch: &DevicePatch) -> Map<String, Value> {
    let mut m = Map::new();
    if let Some(ref name) = patch.name {
        m.insert("nombre".into(), json!(name));
    }
    // `Some(None)` encodes as `null`, clearing the column.
    if let Some(ref phone) = patch.phone_number {
        m.insert("numerotelefono".into(), json!(phone));
    }
    if let Some(ref group) = patch.group_id {
        m.insert("idgrupo".into(), json!(group));
    }
    if let Some(count) = patch.count {
        m.insert("conteo".into(), json!(count));
    }
    if let Some(max) = patch.max_count {
        m.insert("maxconteo".into(), json!(max));
    }
    m
}

/// REST spelling: boolean status, `conteoDia`.
pub fn rest_device_fields(patch: &DevicePatch) -> Map<String, Value> {
    let mut m = common_device_fields(patch);
    if let Some(online) = patch.online {
        m.insert("estadolinea".into(), json!(online));
    }
    if let Some(daily) = patch.daily_count {
        m.insert("conteoDia".into(), json!(daily));
    }
    m
}

/// Table spelling: `"open"`/`"close"` status, `conteodia` column.
pub fn table_device_fields(patch: &DevicePatch) -> Map<String, Value> {
    let mut m = common_device_fields(patch);
    if let Some(online) = patch.online {
        m.insert(
            "estadolinea".into(),
            json!(DeviceStatus::from(online).to_string()),
        );
    }
    if let Some(daily) = patch.daily_count {
        m.insert("conteodia".into(), json!(daily));
    }
    m
}

/// Row for a new device: offline with zeroed counters.
pub fn table_new_device_fields(device: &NewDevice) -> Map<String, Value> {
    let patch = DevicePatch {
        name: Some(device.name.clone()),
        online: Some(false),
        phone_number: device.phone_number.clone().map(Some),
        group_id: device.group_id.clone().map(Some),
        count: Some(0),
        max_count: Some(device.max_count),
        daily_count: Some(0),
    };
    table_device_fields(&patch)
}

// ── Administrator (write) ──────────────────────────────────────────

/// Both backends use the same administrator column names.
pub fn admin_fields(patch: &AdminPatch) -> Map<String, Value> {
    let mut m = Map::new();
    if let Some(ref name) = patch.name {
        m.insert("nombre".into(), json!(name));
    }
    if let Some(ref password) = patch.password {
        m.insert("contrasena".into(), json!(password.expose_secret()));
    }
    if let Some(privileged) = patch.is_privileged {
        m.insert("permisoAdmin".into(), json!(privileged));
    }
    m
}

// ── Realtime ───────────────────────────────────────────────────────

/// Translate a feed event into a mirror change. Payloads that cannot be
/// decoded or carry no id are dropped.
pub fn change_from_row(change: &RowChange) -> Option<MirrorChange> {
    let record: CajeroRecord = match serde_json::from_value(change.row().clone()) {
        Ok(r) => r,
        Err(e) => {
            debug!(error = %e, kind = ?change.kind, "undecodable change payload");
            return None;
        }
    };
    let id = DeviceId::new(record.id?);

    Some(match change.kind {
        ChangeKind::Insert => {
            let mut device = Device::new(id);
            device.merge(&DevicePatch::from(&record));
            MirrorChange::Insert(device)
        }
        ChangeKind::Update => MirrorChange::Update(id, DevicePatch::from(&record)),
        ChangeKind::Delete => MirrorChange::Delete(id),
    })
}
