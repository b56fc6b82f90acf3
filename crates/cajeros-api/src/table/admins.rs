// Table backend administrator operations
//
// Sign-in is a filtered select on name and plaintext password; the service
// performs the comparison.

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use tracing::debug;

use crate::envelope::decode_list;
use crate::error::Error;
use crate::models::{AdminRecord, IdRecord};
use crate::table::client::TableClient;
use crate::table::filter::Filter;
use crate::table::ADMINISTRADORES;

impl TableClient {
    /// `GET administradores?nombre=eq.X&contrasena=eq.Y`, first row.
    pub async fn sign_in(&self, nombre: &str, contrasena: &SecretString) -> Result<AdminRecord, Error> {
        debug!(nombre, "signing in");
        let filter = Filter::new()
            .eq("nombre", nombre)
            .eq("contrasena", contrasena.expose_secret());
        let rows: Vec<AdminRecord> = decode_list(self.select(ADMINISTRADORES, &filter).await?)?;
        rows.into_iter().next().ok_or_else(|| Error::Backend {
            message: "Credenciales incorrectas".into(),
        })
    }

    /// `GET administradores?order=id.asc`
    pub async fn list_admins(&self) -> Result<Vec<AdminRecord>, Error> {
        let rows = self
            .select(ADMINISTRADORES, &Filter::new().order_asc("id"))
            .await?;
        decode_list(rows)
    }

    /// `PATCH administradores?id=eq.N`
    pub async fn update_admin(&self, id: i64, fields: Map<String, Value>) -> Result<(), Error> {
        debug!(id, fields = fields.len(), "updating administrator");
        let _ = self
            .update(ADMINISTRADORES, &Filter::new().eq("id", id), &Value::Object(fields))
            .await?;
        Ok(())
    }

    /// `GET administradores?nombre=eq.X&select=id`
    pub async fn admin_id_by_name(&self, nombre: &str) -> Result<Option<i64>, Error> {
        let rows = self
            .select(ADMINISTRADORES, &Filter::new().eq("nombre", nombre).select("id"))
            .await?;
        let ids: Vec<IdRecord> = decode_list(rows)?;
        Ok(ids.first().map(|r| r.id))
    }
}
