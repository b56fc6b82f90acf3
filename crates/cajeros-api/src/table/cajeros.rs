// Table backend device operations

use serde_json::{Map, Value};
use tracing::debug;

use crate::envelope::decode_list;
use crate::error::Error;
use crate::models::{CajeroRecord, IdRecord};
use crate::table::client::TableClient;
use crate::table::filter::Filter;
use crate::table::CAJEROS;

impl TableClient {
    /// `GET cajeros`
    pub async fn list_cajeros(&self) -> Result<Vec<CajeroRecord>, Error> {
        let rows = self.select(CAJEROS, &Filter::new()).await?;
        decode_list(rows)
    }

    /// `GET cajeros?id=in.(...)`. An empty id set answers locally with no rows.
    pub async fn list_cajeros_by_ids(&self, ids: &[i64]) -> Result<Vec<CajeroRecord>, Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .select(CAJEROS, &Filter::new().in_list("id", ids))
            .await?;
        decode_list(rows)
    }

    /// Insert a device row and return it as stored.
    ///
    /// `fields` must already use the table encoding (`"open"`/`"close"`,
    /// `conteodia`).
    pub async fn insert_cajero(&self, fields: Map<String, Value>) -> Result<CajeroRecord, Error> {
        debug!(fields = fields.len(), "inserting device");
        let rows = self.insert(CAJEROS, &Value::Object(fields)).await?;
        first_row(rows)
    }

    /// `PATCH cajeros?id=eq.N`
    pub async fn update_cajero(&self, id: i64, fields: Map<String, Value>) -> Result<(), Error> {
        debug!(id, fields = fields.len(), "updating device");
        let _ = self
            .update(CAJEROS, &Filter::new().eq("id", id), &Value::Object(fields))
            .await?;
        Ok(())
    }

    /// `GET cajeros?nombre=eq.X&select=id`
    pub async fn cajero_id_by_name(&self, nombre: &str) -> Result<Option<i64>, Error> {
        let rows = self
            .select(CAJEROS, &Filter::new().eq("nombre", nombre).select("id"))
            .await?;
        let ids: Vec<IdRecord> = decode_list(rows)?;
        Ok(ids.first().map(|r| r.id))
    }
}

/// First row of an insert answer; an empty answer is a backend failure.
pub(crate) fn first_row<T: serde::de::DeserializeOwned>(rows: Value) -> Result<T, Error> {
    decode_list::<T>(rows)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Backend {
            message: "no row returned".into(),
        })
}
