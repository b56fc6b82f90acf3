// ── Canonical domain model ──
//
// Every type here is the backend-independent representation of a
// dashboard entity. Wire records from either backend are normalized into
// these in `convert`; consumers (CLI) depend only on this module.

pub mod admin;
pub mod device;
pub mod entity_id;
pub mod macros;

pub use admin::{AdminPatch, Administrator};
pub use device::{Device, DevicePatch, DeviceStatus, NewDevice};
pub use entity_id::{AdminId, DeviceId};
pub use macros::MacroConfig;
