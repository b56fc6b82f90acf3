// cajeros-core: Data-access layer between cajeros-api and consumers (CLI).

pub mod assignments;
pub mod backend;
pub mod config;
pub mod convert;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod notice;
pub mod polling;
pub mod realtime;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::Backend;
pub use config::{BackendKind, ConnectionConfig, TlsVerification};
pub use dashboard::{Dashboard, DeviceScope, DeviceView, LiveMode};
pub use error::CoreError;
pub use notice::{Notice, NoticeBoard, NoticeKind};
pub use polling::{PollingHandle, start_polling, stop_polling};
pub use realtime::RealtimeSubscription;
pub use session::Session;
pub use store::{DeviceMirror, MirrorChange};
pub use stream::{DeviceFilter, EntityStream, StatusFilter};

pub use model::{
    AdminId, AdminPatch, Administrator, Device, DeviceId, DevicePatch, DeviceStatus, MacroConfig,
    NewDevice,
};

pub use cajeros_api::SubscriptionState;
