// REST backend administrator endpoints
//
// Login, listing, partial update and the name lookup. The login check is a
// plaintext comparison performed by the service; this client only carries
// the credential to it.

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::envelope::{decode, decode_list};
use crate::error::Error;
use crate::models::AdminRecord;
use crate::rest::cajeros::id_from_payload;
use crate::rest::client::RestClient;

impl RestClient {
    /// Check administrator credentials.
    ///
    /// `POST /iniciar_sesion_administrador` with `{"nombre", "contrasena"}`.
    /// A successful envelope without an administrator is reported as a
    /// backend failure.
    pub async fn sign_in(&self, nombre: &str, contrasena: &SecretString) -> Result<AdminRecord, Error> {
        debug!(nombre, "signing in");
        let payload = self
            .post(
                "iniciar_sesion_administrador",
                &json!({ "nombre": nombre, "contrasena": contrasena.expose_secret() }),
                Some("administrador"),
            )
            .await?;

        if payload.is_null() {
            return Err(Error::Backend {
                message: "Credenciales incorrectas".into(),
            });
        }
        decode(payload)
    }

    /// List every administrator.
    ///
    /// `GET /obtener_todos_administradores`
    pub async fn list_admins(&self) -> Result<Vec<AdminRecord>, Error> {
        let payload = self
            .get("obtener_todos_administradores", Some("administradores"))
            .await?;
        decode_list(payload)
    }

    /// Partially update an administrator.
    ///
    /// `PUT /modificar_administrador_por_id` with `{"id_admin": N, ...fields}`
    pub async fn update_admin(&self, id: i64, fields: Map<String, Value>) -> Result<(), Error> {
        debug!(id, fields = fields.len(), "updating administrator");
        let mut body = fields;
        body.insert("id_admin".into(), json!(id));
        let _ = self
            .put("modificar_administrador_por_id", &Value::Object(body), None)
            .await?;
        Ok(())
    }

    /// Resolve an administrator id by login name.
    ///
    /// `POST /obtener_id_administrador_por_nombre` with `{"nombre": "..."}`
    pub async fn admin_id_by_name(&self, nombre: &str) -> Result<Option<i64>, Error> {
        let payload = self
            .post(
                "obtener_id_administrador_por_nombre",
                &json!({ "nombre": nombre }),
                None,
            )
            .await?;
        id_from_payload(payload)
    }
}
