// Table backend assignment operations
//
// The administrator ↔ device relation is a plain join table. Replacing an
// administrator's set is two requests (delete, then insert); sequencing and
// partial-failure reporting live in `cajeros-core`.

use tracing::debug;

use crate::envelope::decode_list;
use crate::error::Error;
use crate::models::AssignmentRecord;
use crate::table::client::TableClient;
use crate::table::filter::Filter;
use crate::table::ADMINISTRADOR_CAJERO;

impl TableClient {
    /// `GET administrador_cajero?id_administrador=eq.N`, as device ids.
    pub async fn assigned_cajero_ids(&self, admin_id: i64) -> Result<Vec<i64>, Error> {
        let rows: Vec<AssignmentRecord> = decode_list(
            self.select(
                ADMINISTRADOR_CAJERO,
                &Filter::new().eq("id_administrador", admin_id),
            )
            .await?,
        )?;
        Ok(rows.into_iter().map(|r| r.id_cajero).collect())
    }

    /// `DELETE administrador_cajero?id_administrador=eq.N`
    pub async fn delete_assignments(&self, admin_id: i64) -> Result<(), Error> {
        debug!(admin_id, "deleting assignments");
        self.delete(
            ADMINISTRADOR_CAJERO,
            &Filter::new().eq("id_administrador", admin_id),
        )
        .await
    }

    /// Bulk `POST administrador_cajero`. An empty batch sends nothing.
    pub async fn insert_assignments(&self, rows: &[AssignmentRecord]) -> Result<(), Error> {
        if rows.is_empty() {
            return Ok(());
        }
        debug!(count = rows.len(), "inserting assignments");
        let _ = self.insert(ADMINISTRADOR_CAJERO, &rows).await?;
        Ok(())
    }
}
