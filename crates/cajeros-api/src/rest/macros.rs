// REST backend macro endpoints

use serde_json::json;
use tracing::debug;

use crate::envelope::decode;
use crate::error::Error;
use crate::models::MacroRecord;
use crate::rest::client::RestClient;

impl RestClient {
    /// Read the singleton macro record; `None` when the service has none.
    ///
    /// `GET /obtener_cbus_macro`
    pub async fn get_macro(&self) -> Result<Option<MacroRecord>, Error> {
        let payload = self.get("obtener_cbus_macro", Some("macro")).await?;
        if payload.is_null() {
            return Ok(None);
        }
        decode(payload).map(Some)
    }

    /// Replace the macro identifiers. Absent values are sent as `null`,
    /// which the service leaves untouched.
    ///
    /// `PUT /modificar_cbus_macro` with `{"cbu90_nuevo", "cbu100_nuevo"}`
    pub async fn update_macro(&self, cbu90: Option<&str>, cbu100: Option<&str>) -> Result<(), Error> {
        debug!(?cbu90, ?cbu100, "updating macro");
        let _ = self
            .put(
                "modificar_cbus_macro",
                &json!({ "cbu90_nuevo": cbu90, "cbu100_nuevo": cbu100 }),
                None,
            )
            .await?;
        Ok(())
    }
}
