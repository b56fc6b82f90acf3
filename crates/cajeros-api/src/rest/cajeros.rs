// REST backend device endpoints
//
// The REST service only exposes devices through their administrator, plus a
// by-id update and a name lookup. Creating devices and listing every device
// are not offered here.

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::envelope::{decode, decode_list};
use crate::error::Error;
use crate::models::{CajeroRecord, IdRecord};
use crate::rest::client::RestClient;

impl RestClient {
    /// List the devices assigned to an administrator.
    ///
    /// `POST /obtener_cajeros_por_administrador` with `{"id_administrador": N}`
    pub async fn list_cajeros_for_admin(&self, admin_id: i64) -> Result<Vec<CajeroRecord>, Error> {
        debug!(admin_id, "listing devices for administrator");
        let payload = self
            .post(
                "obtener_cajeros_por_administrador",
                &json!({ "id_administrador": admin_id }),
                Some("cajeros"),
            )
            .await?;
        decode_list(payload)
    }

    /// Partially update a device.
    ///
    /// `PUT /modificar_cajero_por_id` with `{"id_cajero": N, ...fields}`.
    /// `fields` must already use the REST encoding (boolean `estadolinea`,
    /// `conteoDia`).
    pub async fn update_cajero(&self, id: i64, fields: Map<String, Value>) -> Result<(), Error> {
        debug!(id, fields = fields.len(), "updating device");
        let mut body = fields;
        body.insert("id_cajero".into(), json!(id));
        let _ = self
            .put("modificar_cajero_por_id", &Value::Object(body), None)
            .await?;
        Ok(())
    }

    /// Resolve a device id by its name.
    ///
    /// `POST /obtener_id_cajero_por_nombre` with `{"nombre": "..."}`.
    /// Returns `None` when the service answers without an id.
    pub async fn cajero_id_by_name(&self, nombre: &str) -> Result<Option<i64>, Error> {
        let payload = self
            .post("obtener_id_cajero_por_nombre", &json!({ "nombre": nombre }), None)
            .await?;
        id_from_payload(payload)
    }
}

/// `{"id": N}` or a bare number; `null` means no match.
pub(crate) fn id_from_payload(payload: Value) -> Result<Option<i64>, Error> {
    match payload {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_i64()),
        other => decode::<IdRecord>(other).map(|r| Some(r.id)),
    }
}
