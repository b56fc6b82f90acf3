// ── Dashboard facade ──
//
// Ties the backend, the connection configuration and the login session
// together, and mounts live device views. Operations that act on behalf of
// an administrator take the current session from here.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::config::{BackendKind, ConnectionConfig};
use crate::error::CoreError;
use crate::model::{
    AdminId, AdminPatch, Administrator, Device, DeviceId, DevicePatch, MacroConfig, NewDevice,
};
use crate::polling::{PollingHandle, start_polling};
use crate::realtime::RealtimeSubscription;
use crate::session::Session;
use crate::store::DeviceMirror;
use crate::stream::{DeviceFilter, EntityStream};
use cajeros_api::SubscriptionState;

// ── Dashboard ────────────────────────────────────────────────────

/// Main entry point for consumers.
///
/// Cheaply cloneable via `Arc<DashboardInner>`.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    config: ConnectionConfig,
    backend: Backend,
    session: watch::Sender<Option<Session>>,
}

impl Dashboard {
    /// Build the backend client for `config`. Does not contact the service.
    pub fn new(config: ConnectionConfig) -> Result<Self, CoreError> {
        let backend = Backend::from_config(&config)?;
        Ok(Self::with_backend(config, backend))
    }

    pub fn with_backend(config: ConnectionConfig, backend: Backend) -> Self {
        let (session, _) = watch::channel(None);
        Self {
            inner: Arc::new(DashboardInner {
                config,
                backend,
                session,
            }),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    // ── Session ──────────────────────────────────────────────────

    /// Authenticate and hold the resulting session.
    pub async fn login(&self, name: &str, password: &SecretString) -> Result<Session, CoreError> {
        let admin = self.inner.backend.authenticate(name, password).await?;
        info!(admin = %admin.id, privileged = admin.is_privileged, "logged in");
        let session = Session::new(admin);
        self.inner.session.send_replace(Some(session.clone()));
        Ok(session)
    }

    /// Adopt an administrator without authenticating (e.g. a session
    /// restored by the caller).
    pub fn resume(&self, admin: Administrator) -> Session {
        let session = Session::new(admin);
        self.inner.session.send_replace(Some(session.clone()));
        session
    }

    pub fn logout(&self) {
        if self.inner.session.send_replace(None).is_some() {
            info!("logged out");
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.inner.session.borrow().clone()
    }

    pub fn watch_session(&self) -> watch::Receiver<Option<Session>> {
        self.inner.session.subscribe()
    }

    fn require_session(&self) -> Result<Session, CoreError> {
        self.session().ok_or(CoreError::NotLoggedIn)
    }

    fn require_privilege(&self, action: &str) -> Result<Session, CoreError> {
        let session = self.require_session()?;
        session.require_privilege(action)?;
        Ok(session)
    }

    // ── Devices ──────────────────────────────────────────────────

    /// Devices assigned to the logged-in administrator.
    pub async fn my_devices(&self) -> Result<Vec<Device>, CoreError> {
        let session = self.require_session()?;
        self.inner.backend.list_devices_for_admin(session.admin_id()).await
    }

    pub async fn all_devices(&self) -> Result<Vec<Device>, CoreError> {
        self.require_privilege("list every device")?;
        self.inner.backend.list_all_devices().await
    }

    pub async fn update_device(&self, id: DeviceId, patch: &DevicePatch) -> Result<(), CoreError> {
        self.require_session()?;
        self.inner.backend.update_device(id, patch).await
    }

    pub async fn create_device(&self, device: &NewDevice) -> Result<Device, CoreError> {
        self.require_privilege("create devices")?;
        self.inner.backend.create_device(device).await
    }

    pub async fn device_id_by_name(&self, name: &str) -> Result<Option<DeviceId>, CoreError> {
        self.inner.backend.device_id_by_name(name).await
    }

    // ── Administrators ───────────────────────────────────────────

    pub async fn list_admins(&self) -> Result<Vec<Administrator>, CoreError> {
        self.require_privilege("list administrators")?;
        self.inner.backend.list_admins().await
    }

    pub async fn update_admin(&self, id: AdminId, patch: &AdminPatch) -> Result<(), CoreError> {
        self.require_privilege("update administrators")?;
        self.inner.backend.update_admin(id, patch).await
    }

    pub async fn admin_id_by_name(&self, name: &str) -> Result<Option<AdminId>, CoreError> {
        self.inner.backend.admin_id_by_name(name).await
    }

    /// Device ids assigned to `admin`. Anyone may read their own; other
    /// administrators' assignments need privilege.
    pub async fn assigned_devices(&self, admin: AdminId) -> Result<Vec<DeviceId>, CoreError> {
        let session = self.require_session()?;
        if admin != session.admin_id() {
            session.require_privilege("read other administrators' assignments")?;
        }
        self.inner.backend.assigned_device_ids(admin).await
    }

    /// Make `admin`'s assignment set exactly `devices`.
    pub async fn assign_devices(&self, admin: AdminId, devices: &[DeviceId]) -> Result<(), CoreError> {
        self.require_privilege("change device assignments")?;
        self.inner.backend.replace_assignments(admin, devices).await
    }

    // ── Macro ────────────────────────────────────────────────────

    pub async fn get_macro(&self) -> Result<MacroConfig, CoreError> {
        self.require_session()?;
        self.inner.backend.get_macro().await
    }

    pub async fn set_macro(&self, cbu90: Option<&str>, cbu100: Option<&str>) -> Result<(), CoreError> {
        self.require_privilege("update the macro")?;
        self.inner.backend.set_macro(cbu90, cbu100).await
    }

    // ── Live views ───────────────────────────────────────────────

    /// Mount a live device view: initial load, then realtime when the
    /// backend offers it and it is enabled, polling otherwise.
    pub async fn watch_devices(&self, scope: DeviceScope) -> Result<DeviceView, CoreError> {
        match scope {
            DeviceScope::Admin(_) => {
                self.require_session()?;
            }
            DeviceScope::All => {
                self.require_privilege("list every device")?;
            }
        }

        let mirror = Arc::new(DeviceMirror::from_devices(
            load(&self.inner.backend, scope).await?,
        ));
        debug!(count = mirror.len(), "device view loaded");

        let use_realtime =
            self.inner.config.backend == BackendKind::Table && self.inner.config.realtime_enabled;

        let live = if use_realtime {
            let feed = self.inner.backend.device_feed_config()?;
            Live::Realtime(RealtimeSubscription::start(feed, Arc::clone(&mirror)))
        } else {
            let backend = self.inner.backend.clone();
            let poll_mirror = Arc::clone(&mirror);
            Live::Polling(start_polling(
                move || {
                    let backend = backend.clone();
                    let mirror = Arc::clone(&poll_mirror);
                    async move {
                        match load(&backend, scope).await {
                            Ok(devices) => mirror.replace_all(devices),
                            Err(e) => warn!(error = %e, "poll refresh failed"),
                        }
                    }
                },
                self.inner.config.polling_interval,
            ))
        };

        Ok(DeviceView {
            dashboard: self.clone(),
            scope,
            mirror,
            live,
        })
    }
}

/// Which devices a view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceScope {
    /// Devices assigned to one administrator.
    Admin(AdminId),
    /// Every device (table backend, privileged).
    All,
}

async fn load(backend: &Backend, scope: DeviceScope) -> Result<Vec<Device>, CoreError> {
    match scope {
        DeviceScope::Admin(admin) => backend.list_devices_for_admin(admin).await,
        DeviceScope::All => backend.list_all_devices().await,
    }
}

// ── DeviceView ───────────────────────────────────────────────────

/// How a view is kept current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveMode {
    Realtime,
    Polling,
}

enum Live {
    Realtime(RealtimeSubscription),
    Polling(PollingHandle),
}

/// A mounted device view. Dropping it releases its feed or timer;
/// [`close`](Self::close) also waits for the background work to end.
pub struct DeviceView {
    dashboard: Dashboard,
    scope: DeviceScope,
    mirror: Arc<DeviceMirror>,
    live: Live,
}

impl DeviceView {
    pub fn scope(&self) -> DeviceScope {
        self.scope
    }

    pub fn mode(&self) -> LiveMode {
        match self.live {
            Live::Realtime(_) => LiveMode::Realtime,
            Live::Polling(_) => LiveMode::Polling,
        }
    }

    /// Realtime channel state; `None` for polling views.
    pub fn realtime_state(&self) -> Option<watch::Receiver<SubscriptionState>> {
        match &self.live {
            Live::Realtime(sub) => Some(sub.state()),
            Live::Polling(_) => None,
        }
    }

    pub fn devices(&self) -> Arc<Vec<Arc<Device>>> {
        self.mirror.snapshot()
    }

    /// Matching devices, sorted by name.
    pub fn filtered(&self, filter: &DeviceFilter) -> Vec<Arc<Device>> {
        filter.apply(&self.mirror.snapshot())
    }

    pub fn subscribe(&self) -> EntityStream<Device> {
        self.mirror.subscribe()
    }

    /// Refetch the whole set into the mirror.
    pub async fn reload(&self) -> Result<(), CoreError> {
        let devices = load(self.dashboard.backend(), self.scope).await?;
        self.mirror.replace_all(devices);
        Ok(())
    }

    /// Save an edit, then reload once the update has succeeded. A failed
    /// update leaves the mirror untouched.
    pub async fn save(&self, id: DeviceId, patch: &DevicePatch) -> Result<(), CoreError> {
        self.dashboard.update_device(id, patch).await?;
        self.reload().await
    }

    /// Release the feed or timer and wait for it to stop.
    pub async fn close(self) {
        match self.live {
            Live::Realtime(sub) => sub.close().await,
            Live::Polling(handle) => handle.shutdown().await,
        }
    }
}
