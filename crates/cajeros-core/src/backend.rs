// ── Data-access adapter ──
//
// One request/response contract over the two backends. Every operation
// returns `Result<_, CoreError>`; operations a backend does not offer fail
// with `CoreError::Unsupported` instead of panicking.

use secrecy::SecretString;
use tracing::{debug, instrument};

use cajeros_api::realtime::{ChangeFilter, RealtimeConfig};
use cajeros_api::{RestClient, TableClient};

use crate::assignments;
use crate::config::{BackendKind, ConnectionConfig};
use crate::convert::{self, devices_from_records};
use crate::error::CoreError;
use crate::model::{
    AdminId, AdminPatch, Administrator, Device, DeviceId, DevicePatch, MacroConfig, NewDevice,
};

/// Realtime channel used for device views.
pub const DEVICE_CHANNEL: &str = "cajeros-realtime";
/// Only rows in one of these states are visible to the feed.
pub const DEVICE_CHANNEL_FILTER: &str = "estadolinea=in.(open,close)";

/// A connected backend.
#[derive(Debug, Clone)]
pub enum Backend {
    Rest(RestClient),
    Table(TableClient),
}

impl Backend {
    /// Build the HTTP client for `config.backend`.
    pub fn from_config(config: &ConnectionConfig) -> Result<Self, CoreError> {
        let transport = config.transport();
        match config.backend {
            BackendKind::Rest => Ok(Self::Rest(RestClient::new(config.url.clone(), &transport)?)),
            BackendKind::Table => {
                let key = config.api_key.clone().ok_or_else(|| CoreError::Config {
                    message: "the table backend requires an API key".into(),
                })?;
                Ok(Self::Table(TableClient::new(config.url.clone(), key, &transport)?))
            }
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Rest(_) => BackendKind::Rest,
            Self::Table(_) => BackendKind::Table,
        }
    }

    fn unsupported(&self, operation: &str) -> CoreError {
        CoreError::unsupported(operation, self.kind())
    }

    // ── Authentication ───────────────────────────────────────────────

    /// Check credentials against the backend. The comparison itself is
    /// performed remotely.
    #[instrument(skip(self, password), fields(backend = %self.kind()))]
    pub async fn authenticate(
        &self,
        name: &str,
        password: &SecretString,
    ) -> Result<Administrator, CoreError> {
        let record = match self {
            Self::Rest(c) => c.sign_in(name, password).await,
            Self::Table(c) => c.sign_in(name, password).await,
        }
        .map_err(|e| match CoreError::from(e) {
            CoreError::Rejected { message } => CoreError::AuthenticationFailed { message },
            other => other,
        })?;
        Ok(Administrator::from(record))
    }

    // ── Macro ────────────────────────────────────────────────────────

    /// The singleton macro record. A missing record is `NotFound`.
    pub async fn get_macro(&self) -> Result<MacroConfig, CoreError> {
        let record = match self {
            Self::Rest(c) => c.get_macro().await?,
            Self::Table(c) => c.get_macro().await?,
        };
        record.map(Into::into).ok_or_else(|| CoreError::NotFound {
            entity_type: "macro".into(),
            identifier: "1".into(),
        })
    }

    /// Update the singleton macro record. `None` leaves a value as is.
    pub async fn set_macro(&self, cbu90: Option<&str>, cbu100: Option<&str>) -> Result<(), CoreError> {
        match self {
            Self::Rest(c) => c.update_macro(cbu90, cbu100).await?,
            Self::Table(c) => c.update_macro(cbu90, cbu100).await?,
        }
        Ok(())
    }

    // ── Devices ──────────────────────────────────────────────────────

    /// Devices assigned to `admin`, in backend order.
    pub async fn list_devices_for_admin(&self, admin: AdminId) -> Result<Vec<Device>, CoreError> {
        let records = match self {
            Self::Rest(c) => c.list_cajeros_for_admin(admin.get()).await?,
            Self::Table(c) => {
                let ids = c.assigned_cajero_ids(admin.get()).await?;
                c.list_cajeros_by_ids(&ids).await?
            }
        };
        debug!(admin = %admin, count = records.len(), "loaded devices");
        Ok(devices_from_records(&records))
    }

    /// Every device regardless of assignment (table backend only).
    pub async fn list_all_devices(&self) -> Result<Vec<Device>, CoreError> {
        match self {
            Self::Rest(_) => Err(self.unsupported("list all devices")),
            Self::Table(c) => Ok(devices_from_records(&c.list_cajeros().await?)),
        }
    }

    pub async fn update_device(&self, id: DeviceId, patch: &DevicePatch) -> Result<(), CoreError> {
        if patch.is_empty() {
            return Ok(());
        }
        let fields = convert::encode_device_patch(self.kind(), patch);
        match self {
            Self::Rest(c) => c.update_cajero(id.get(), fields).await?,
            Self::Table(c) => c.update_cajero(id.get(), fields).await?,
        }
        Ok(())
    }

    /// Register a device, offline with zeroed counters (table backend only).
    pub async fn create_device(&self, device: &NewDevice) -> Result<Device, CoreError> {
        if device.name.trim().is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "device name must not be empty".into(),
            });
        }
        match self {
            Self::Rest(_) => Err(self.unsupported("create device")),
            Self::Table(c) => {
                let row = c
                    .insert_cajero(convert::table_new_device_fields(device))
                    .await?;
                Device::try_from(&row)
            }
        }
    }

    pub async fn device_id_by_name(&self, name: &str) -> Result<Option<DeviceId>, CoreError> {
        let id = match self {
            Self::Rest(c) => c.cajero_id_by_name(name).await?,
            Self::Table(c) => c.cajero_id_by_name(name).await?,
        };
        Ok(id.map(DeviceId::new))
    }

    // ── Administrators ───────────────────────────────────────────────

    pub async fn list_admins(&self) -> Result<Vec<Administrator>, CoreError> {
        let records = match self {
            Self::Rest(c) => c.list_admins().await?,
            Self::Table(c) => c.list_admins().await?,
        };
        Ok(records.into_iter().map(Administrator::from).collect())
    }

    pub async fn update_admin(&self, id: AdminId, patch: &AdminPatch) -> Result<(), CoreError> {
        if patch.is_empty() {
            return Ok(());
        }
        let fields = convert::admin_fields(patch);
        match self {
            Self::Rest(c) => c.update_admin(id.get(), fields).await?,
            Self::Table(c) => c.update_admin(id.get(), fields).await?,
        }
        Ok(())
    }

    pub async fn admin_id_by_name(&self, name: &str) -> Result<Option<AdminId>, CoreError> {
        let id = match self {
            Self::Rest(c) => c.admin_id_by_name(name).await?,
            Self::Table(c) => c.admin_id_by_name(name).await?,
        };
        Ok(id.map(AdminId::new))
    }

    // ── Assignments ──────────────────────────────────────────────────

    /// Ids of the devices assigned to `admin`.
    pub async fn assigned_device_ids(&self, admin: AdminId) -> Result<Vec<DeviceId>, CoreError> {
        match self {
            Self::Rest(_) => Ok(self
                .list_devices_for_admin(admin)
                .await?
                .into_iter()
                .map(|d| d.id)
                .collect()),
            Self::Table(c) => Ok(c
                .assigned_cajero_ids(admin.get())
                .await?
                .into_iter()
                .map(DeviceId::new)
                .collect()),
        }
    }

    /// Make `admin`'s assignment set exactly `devices` (table backend only).
    pub async fn replace_assignments(
        &self,
        admin: AdminId,
        devices: &[DeviceId],
    ) -> Result<(), CoreError> {
        match self {
            Self::Rest(_) => Err(self.unsupported("replace assignments")),
            Self::Table(c) => assignments::replace_assignments(c, admin, devices).await,
        }
    }

    // ── Realtime ─────────────────────────────────────────────────────

    /// Channel configuration for the device feed (table backend only).
    pub fn device_feed_config(&self) -> Result<RealtimeConfig, CoreError> {
        match self {
            Self::Rest(_) => Err(self.unsupported("realtime subscribe")),
            Self::Table(c) => Ok(RealtimeConfig::new(
                c.realtime_url()?,
                c.api_key().clone(),
                DEVICE_CHANNEL,
                ChangeFilter::table(cajeros_api::table::CAJEROS).with_filter(DEVICE_CHANNEL_FILTER),
            )),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn table_backend() -> (MockServer, Backend) {
        let server = MockServer::start().await;
        let mut cfg = ConnectionConfig::new(Url::parse(&server.uri()).unwrap(), BackendKind::Table);
        cfg.api_key = Some(SecretString::from("anon"));
        (server, Backend::from_config(&cfg).unwrap())
    }

    async fn rest_backend() -> (MockServer, Backend) {
        let server = MockServer::start().await;
        let cfg = ConnectionConfig::new(Url::parse(&server.uri()).unwrap(), BackendKind::Rest);
        (server, Backend::from_config(&cfg).unwrap())
    }

    #[tokio::test]
    async fn missing_macro_row_is_not_found() {
        let (server, backend) = table_backend().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/macros"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        assert!(matches!(
            backend.get_macro().await,
            Err(CoreError::NotFound { ref entity_type, .. }) if entity_type == "macro"
        ));
    }

    #[test]
    fn table_backend_requires_api_key() {
        let cfg = ConnectionConfig::new(Url::parse("https://p.example.co").unwrap(), BackendKind::Table);
        assert!(matches!(Backend::from_config(&cfg), Err(CoreError::Config { .. })));
    }

    #[tokio::test]
    async fn rest_backend_reports_unsupported_operations() {
        let (_server, backend) = rest_backend().await;

        assert!(matches!(backend.list_all_devices().await, Err(CoreError::Unsupported { .. })));
        assert!(matches!(
            backend.replace_assignments(AdminId::new(1), &[]).await,
            Err(CoreError::Unsupported { .. })
        ));
        let new = NewDevice {
            name: "Caja".into(),
            phone_number: None,
            group_id: None,
            max_count: 1,
        };
        assert!(matches!(backend.create_device(&new).await, Err(CoreError::Unsupported { .. })));
        assert!(matches!(backend.device_feed_config(), Err(CoreError::Unsupported { .. })));
    }

    #[tokio::test]
    async fn rest_failed_login_is_authentication_failure_with_message() {
        let (server, backend) = rest_backend().await;
        Mock::given(method("POST"))
            .and(path("/iniciar_sesion_administrador"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false, "message": "Credenciales incorrectas"
            })))
            .mount(&server)
            .await;

        let err = backend
            .authenticate("ana", &SecretString::from("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
        assert_eq!(err.to_string(), "Credenciales incorrectas");
    }

    #[tokio::test]
    async fn same_rows_normalize_identically_on_both_backends() {
        let (rest_server, rest) = rest_backend().await;
        let (table_server, table) = table_backend().await;

        Mock::given(method("POST"))
            .and(path("/obtener_cajeros_por_administrador"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{ "id": 3, "nombre": "Caja 3", "estadolinea": true, "conteo": 2, "maxconteo": 5, "conteoDia": 1 }]
            })))
            .mount(&rest_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/administrador_cajero"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id_administrador": 7, "id_cajero": 3 }
            ])))
            .mount(&table_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/cajeros"))
            .and(query_param("id", "in.(3)"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 3, "nombre": "Caja 3", "estadolinea": "open", "conteo": 2, "maxconteo": 5, "conteodia": 1 }
            ])))
            .mount(&table_server)
            .await;

        let a = rest.list_devices_for_admin(AdminId::new(7)).await.unwrap();
        let b = table.list_devices_for_admin(AdminId::new(7)).await.unwrap();
        assert_eq!(a, b);
        assert!(a[0].online);
        assert_eq!(a[0].daily_count, 1);
    }

    #[tokio::test]
    async fn table_update_sends_table_encoding() {
        let (server, backend) = table_backend().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/cajeros"))
            .and(query_param("id", "eq.2"))
            .and(body_json(json!({ "estadolinea": "close", "conteodia": 0 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let patch = DevicePatch {
            online: Some(false),
            daily_count: Some(0),
            ..DevicePatch::default()
        };
        backend.update_device(DeviceId::new(2), &patch).await.unwrap();
    }

    #[tokio::test]
    async fn http_failure_surfaces_status_message() {
        let (server, backend) = table_backend().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/administradores"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = backend.list_admins().await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP error! status: 500");
    }

    #[tokio::test]
    async fn device_feed_targets_filtered_channel() {
        let (_server, backend) = table_backend().await;
        let cfg = backend.device_feed_config().unwrap();
        assert_eq!(cfg.channel, DEVICE_CHANNEL);
        assert_eq!(cfg.filter.filter.as_deref(), Some(DEVICE_CHANNEL_FILTER));
        assert_eq!(cfg.url.scheme(), "ws");
    }
}
